use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::headings::{HeadingRules, HeadingRulesBuilder};

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid config file: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("invalid heading pattern: {0}")]
    Pattern(#[from] regex::Error),
}

/// On-disk TOML configuration structure.
/// All fields are optional so partial configs work (merge with defaults).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConfigFile {
    pub storage: Option<StorageConfig>,
    pub extraction: Option<ExtractionConfig>,
    pub logging: Option<LoggingConfig>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageConfig {
    /// SQLite catalog path.
    pub database_path: Option<String>,
    /// Directory stored document names are relative to.
    pub document_root: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExtractionConfig {
    pub main_heading_pattern: Option<String>,
    pub sub_heading_pattern: Option<String>,
    /// Fraction of page height from the top to ignore (0.0 disables).
    pub header_exclusion: Option<f32>,
    /// Fraction of page height from the bottom to ignore (0.0 disables).
    pub footer_exclusion: Option<f32>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// `tracing_subscriber::EnvFilter` directive, e.g. `"info,lectern_core=debug"`.
    pub filter: Option<String>,
}

impl ConfigFile {
    pub fn database_path(&self) -> Option<&str> {
        self.storage.as_ref()?.database_path.as_deref()
    }

    pub fn document_root(&self) -> Option<&str> {
        self.storage.as_ref()?.document_root.as_deref()
    }

    pub fn log_filter(&self) -> Option<&str> {
        self.logging.as_ref()?.filter.as_deref()
    }

    pub fn header_exclusion(&self) -> f32 {
        self.extraction
            .as_ref()
            .and_then(|e| e.header_exclusion)
            .unwrap_or(0.0)
    }

    pub fn footer_exclusion(&self) -> f32 {
        self.extraction
            .as_ref()
            .and_then(|e| e.footer_exclusion)
            .unwrap_or(0.0)
    }

    /// Compile the configured heading patterns, falling back to the defaults.
    pub fn heading_rules(&self) -> Result<HeadingRules, ConfigError> {
        let mut builder = HeadingRulesBuilder::new();
        if let Some(extraction) = &self.extraction {
            if let Some(pattern) = &extraction.main_heading_pattern {
                builder = builder.main_pattern(pattern.clone());
            }
            if let Some(pattern) = &extraction.sub_heading_pattern {
                builder = builder.sub_pattern(pattern.clone());
            }
        }
        Ok(builder.build()?)
    }
}

/// Platform config directory path: `<config_dir>/lectern/config.toml`.
pub fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("lectern").join("config.toml"))
}

/// Load config by cascading CWD `.lectern.toml` over platform config.
/// CWD values override platform values.
pub fn load_config() -> ConfigFile {
    let platform = config_path().and_then(|p| load_from_path(&p));
    let cwd = load_from_path(Path::new(".lectern.toml"));

    match (platform, cwd) {
        (None, None) => ConfigFile::default(),
        (Some(p), None) => p,
        (None, Some(c)) => c,
        (Some(p), Some(c)) => merge(p, c),
    }
}

/// Load a config from a specific path. Returns `None` if the file doesn't
/// exist or can't be parsed; a parse failure is logged.
pub fn load_from_path(path: &Path) -> Option<ConfigFile> {
    if !path.exists() {
        return None;
    }
    match read_config(path) {
        Ok(config) => Some(config),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "ignoring unreadable config file");
            None
        }
    }
}

/// Strict variant of [`load_from_path`] for explicitly requested files.
pub fn read_config(path: &Path) -> Result<ConfigFile, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    Ok(toml::from_str(&content)?)
}

fn pick<S, T>(overlay: Option<&S>, base: Option<&S>, field: impl Fn(&S) -> Option<T>) -> Option<T> {
    overlay.and_then(&field).or_else(|| base.and_then(&field))
}

/// Merge two configs: `overlay` values take precedence over `base`.
pub fn merge(base: ConfigFile, overlay: ConfigFile) -> ConfigFile {
    let (bs, os) = (base.storage.as_ref(), overlay.storage.as_ref());
    let (be, oe) = (base.extraction.as_ref(), overlay.extraction.as_ref());
    let (bl, ol) = (base.logging.as_ref(), overlay.logging.as_ref());

    ConfigFile {
        storage: Some(StorageConfig {
            database_path: pick(os, bs, |s| s.database_path.clone()),
            document_root: pick(os, bs, |s| s.document_root.clone()),
        }),
        extraction: Some(ExtractionConfig {
            main_heading_pattern: pick(oe, be, |e| e.main_heading_pattern.clone()),
            sub_heading_pattern: pick(oe, be, |e| e.sub_heading_pattern.clone()),
            header_exclusion: pick(oe, be, |e| e.header_exclusion),
            footer_exclusion: pick(oe, be, |e| e.footer_exclusion),
        }),
        logging: Some(LoggingConfig {
            filter: pick(ol, bl, |l| l.filter.clone()),
        }),
    }
}
