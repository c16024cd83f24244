use std::fs::File;
use std::path::PathBuf;
use std::sync::Mutex;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::app::App;
use crate::config::{Config, EditMode, Overrides};

mod app;
mod config;
mod editor;
mod page;
mod store;
mod utils;

/// Interactive coding lessons in your terminal
#[derive(Debug, Parser)]
#[command(version, about)]
struct Cli {
    /// Directory holding `settings.toml`
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Directory holding the lesson files
    #[arg(long, value_name = "PATH")]
    lessons: Option<PathBuf>,

    /// Whose progress to load and save
    #[arg(long)]
    user: Option<String>,

    /// How keystrokes are validated
    #[arg(long, value_enum)]
    mode: Option<EditMode>,

    /// Open a lesson directly instead of the menu
    #[arg(long, value_name = "ID")]
    lesson: Option<String>,

    /// Where to write the log. Filtered with `CODEFORGE_LOG`.
    #[arg(long, value_name = "PATH")]
    log_file: Option<PathBuf>,
}

fn init_logging(path: Option<PathBuf>) -> std::io::Result<()> {
    let path = path
        .or_else(|| Config::project_dirs().map(|dirs| dirs.data_dir().join("codeforge.log")))
        .unwrap_or_else(|| PathBuf::from("codeforge.log"));

    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
    }

    let file = File::create(path)?;
    let filter = EnvFilter::try_from_env("CODEFORGE_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .init();

    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    init_logging(cli.log_file)?;

    let mut config = Config::get(Overrides {
        config_dir: cli.config,
        lessons_dir: cli.lessons,
        user_id: cli.user,
        mode: cli.mode,
    })?;
    config.settings.theme.resolve_terminal_colors();

    App::new(config, cli.lesson.as_deref()).run()?;

    Ok(())
}
