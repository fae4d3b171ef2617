use std::io::Write;
use std::path::PathBuf;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use lectern_core::{
    ConfigFile, CourseSync, MediaKind, SectionExtractor, SectionStore, config_file,
};
use lectern_pdf_mupdf::MupdfBackend;
use lectern_store::{CourseChanges, CourseStore, NewCategory, NewCourse};

mod output;
mod settings;

use output::ColorMode;
use settings::{Overrides, Settings};

/// Lectern - course catalog with PDF section extraction
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to the SQLite catalog
    #[arg(long, global = true)]
    database: Option<PathBuf>,

    /// Directory stored document paths are relative to
    #[arg(long, global = true)]
    document_root: Option<PathBuf>,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Extract sections from a local PDF without storing anything
    Extract {
        /// Path to the PDF file
        pdf: PathBuf,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Manage course categories
    #[command(subcommand)]
    Category(CategoryCommand),

    /// Manage courses and their derived sections
    #[command(subcommand)]
    Course(CourseCommand),
}

#[derive(Subcommand, Debug)]
enum CategoryCommand {
    /// Add a category
    Add {
        name: String,

        #[arg(long)]
        description: String,

        #[arg(long)]
        image: Option<String>,
    },
    /// List categories
    List,
}

#[derive(Subcommand, Debug)]
enum CourseCommand {
    /// Add a course; a pdf course is extracted immediately
    Add(CourseAddArgs),
    /// Update a course; sections follow the stored pdf
    Update(CourseUpdateArgs),
    /// List courses
    List {
        /// Only courses in this category
        #[arg(long)]
        category: Option<i64>,
    },
    /// Print a course's stored sections
    Sections {
        id: i64,

        #[arg(long)]
        json: bool,
    },
    /// Print a course's table of contents
    Toc {
        id: i64,

        #[arg(long)]
        json: bool,
    },
    /// Delete a course and its derived sections
    Delete { id: i64 },
}

#[derive(Args, Debug)]
struct CourseAddArgs {
    #[arg(long)]
    title: String,

    #[arg(long)]
    description: String,

    /// Category id
    #[arg(long)]
    category: i64,

    /// Professor id
    #[arg(long)]
    professor: i64,

    /// PDF path relative to the document root
    #[arg(long)]
    pdf: Option<String>,

    #[arg(long)]
    video: Option<String>,

    #[arg(long)]
    image: Option<String>,

    /// pdf or video (default: pdf when --pdf is given, otherwise video)
    #[arg(long)]
    kind: Option<MediaKind>,

    #[arg(long, default_value = "")]
    duration: String,
}

#[derive(Args, Debug)]
struct CourseUpdateArgs {
    id: i64,

    #[arg(long)]
    title: Option<String>,

    #[arg(long)]
    description: Option<String>,

    /// New PDF path relative to the document root
    #[arg(long)]
    pdf: Option<String>,

    /// Remove the stored PDF
    #[arg(long, conflicts_with = "pdf")]
    clear_pdf: bool,

    #[arg(long)]
    video: Option<String>,

    #[arg(long)]
    kind: Option<MediaKind>,

    #[arg(long)]
    duration: Option<String>,

    /// Move to another category
    #[arg(long)]
    category: Option<i64>,
}

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let config = config_file::load_config();
    let settings = Settings::resolve(
        Overrides {
            database: cli.database.clone(),
            document_root: cli.document_root.clone(),
        },
        &config,
        |key| std::env::var(key).ok(),
    );
    init_tracing(&settings.log_filter);
    tracing::debug!(
        database = %settings.database.display(),
        document_root = %settings.document_root.display(),
        "resolved settings"
    );

    let color = ColorMode(!cli.no_color);
    let mut stdout = std::io::stdout().lock();

    match cli.command {
        Command::Extract { pdf, json } => extract(&pdf, json, &config, &mut stdout, color),
        Command::Category(cmd) => {
            let store = open_store(&settings)?;
            category(cmd, &store, &mut stdout, color)
        }
        Command::Course(cmd) => {
            let store = open_store(&settings)?;
            let sync = CourseSync::new(build_extractor(&config, settings.document_root.clone())?);
            course(cmd, &store, &sync, &mut stdout, color)
        }
    }
}

/// Log to stderr. `RUST_LOG` wins over the configured filter.
fn init_tracing(configured: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(configured));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn open_store(settings: &Settings) -> anyhow::Result<CourseStore> {
    CourseStore::open(&settings.database)
        .with_context(|| format!("failed to open catalog at {}", settings.database.display()))
}

fn build_extractor(
    config: &ConfigFile,
    document_root: PathBuf,
) -> anyhow::Result<SectionExtractor<MupdfBackend>> {
    let backend = MupdfBackend::new()
        .with_header_exclusion(config.header_exclusion())
        .with_footer_exclusion(config.footer_exclusion());
    let rules = config.heading_rules()?;
    Ok(SectionExtractor::new(backend, document_root).with_rules(rules))
}

fn extract(
    pdf: &std::path::Path,
    json: bool,
    config: &ConfigFile,
    w: &mut dyn Write,
    color: ColorMode,
) -> anyhow::Result<()> {
    if !pdf.exists() {
        anyhow::bail!("PDF not found at {}", pdf.display());
    }
    let extractor = build_extractor(config, PathBuf::from("."))?;
    let result = extractor.extract_path(pdf);

    if json {
        writeln!(w, "{}", serde_json::to_string_pretty(&result)?)?;
    } else {
        output::print_sections(w, &result.sections, color)?;
    }
    Ok(())
}

fn category(
    cmd: CategoryCommand,
    store: &CourseStore,
    w: &mut dyn Write,
    color: ColorMode,
) -> anyhow::Result<()> {
    match cmd {
        CategoryCommand::Add {
            name,
            description,
            image,
        } => {
            let category = store.create_category(NewCategory {
                name,
                description,
                image,
            })?;
            writeln!(w, "Added category {}: {}", category.id, category.name)?;
        }
        CategoryCommand::List => {
            output::print_categories(w, &store.list_categories()?, color)?;
        }
    }
    Ok(())
}

fn course(
    cmd: CourseCommand,
    store: &CourseStore,
    sync: &CourseSync<MupdfBackend>,
    w: &mut dyn Write,
    color: ColorMode,
) -> anyhow::Result<()> {
    match cmd {
        CourseCommand::Add(args) => {
            let kind = args.kind.unwrap_or(if args.pdf.is_some() {
                MediaKind::Pdf
            } else {
                MediaKind::Video
            });
            let new = NewCourse {
                title: args.title,
                description: args.description,
                pdf_file: args.pdf,
                video_file: args.video,
                image: args.image,
                kind,
                duration: args.duration,
                professor_id: args.professor,
                category_id: args.category,
            };
            let (course, outcome) = store.create_course(new, sync)?;
            output::print_saved(w, "Added", &course, &outcome, color)?;
        }
        CourseCommand::Update(args) => {
            let pdf_file = if args.clear_pdf {
                Some(None)
            } else {
                args.pdf.map(Some)
            };
            let changes = CourseChanges {
                title: args.title,
                description: args.description,
                pdf_file,
                video_file: args.video.map(Some),
                kind: args.kind,
                duration: args.duration,
                category_id: args.category,
                ..Default::default()
            };
            let (course, outcome) = store.update_course(args.id, changes, sync)?;
            output::print_saved(w, "Updated", &course, &outcome, color)?;
        }
        CourseCommand::List { category } => {
            let courses = match category {
                Some(id) => store.courses_in_category(id)?,
                None => store.list_courses()?,
            };
            output::print_courses(w, &courses, color)?;
        }
        CourseCommand::Sections { id, json } => {
            store.course(id)?;
            let sections = store.sections(id)?;
            if json {
                writeln!(w, "{}", serde_json::to_string_pretty(&sections)?)?;
            } else {
                output::print_sections(w, &sections, color)?;
            }
        }
        CourseCommand::Toc { id, json } => {
            store.course(id)?;
            let toc = store.table_of_contents(id)?;
            if json {
                writeln!(w, "{}", serde_json::to_string_pretty(&toc)?)?;
            } else {
                output::print_toc(w, &toc, color)?;
            }
        }
        CourseCommand::Delete { id } => {
            if store.delete_course(id)? {
                writeln!(w, "Deleted course {}", id)?;
            } else {
                anyhow::bail!("course {} not found", id);
            }
        }
    }
    Ok(())
}
