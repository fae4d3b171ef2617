use std::path::PathBuf;

use lectern_core::ConfigFile;

pub const DATABASE_ENV: &str = "LECTERN_DATABASE";
pub const DOCUMENT_ROOT_ENV: &str = "LECTERN_DOCUMENT_ROOT";
const DEFAULT_LOG_FILTER: &str = "info";

/// Resolved runtime settings: CLI flags > env vars > config file > defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub database: PathBuf,
    pub document_root: PathBuf,
    pub log_filter: String,
}

/// Values given on the command line.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub database: Option<PathBuf>,
    pub document_root: Option<PathBuf>,
}

impl Settings {
    pub fn resolve(
        overrides: Overrides,
        config: &ConfigFile,
        env: impl Fn(&str) -> Option<String>,
    ) -> Self {
        let database = overrides
            .database
            .or_else(|| env(DATABASE_ENV).map(PathBuf::from))
            .or_else(|| config.database_path().map(PathBuf::from))
            .unwrap_or_else(default_database_path);
        let document_root = overrides
            .document_root
            .or_else(|| env(DOCUMENT_ROOT_ENV).map(PathBuf::from))
            .or_else(|| config.document_root().map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from("."));
        let log_filter = config
            .log_filter()
            .unwrap_or(DEFAULT_LOG_FILTER)
            .to_string();

        Self {
            database,
            document_root,
            log_filter,
        }
    }
}

/// `<data_dir>/lectern/catalog.db`, or `catalog.db` in the CWD when the
/// platform has no data directory.
fn default_database_path() -> PathBuf {
    dirs::data_dir()
        .map(|d| d.join("lectern").join("catalog.db"))
        .unwrap_or_else(|| PathBuf::from("catalog.db"))
}
