//! CLI for jmpdf: `jmpdf <album_id> [config_path] [start_chapter] [end_chapter]`.

mod default_config;

use clap::Parser;
use jmpdf_core::bridge::PythonBridge;
use jmpdf_core::config;
use jmpdf_core::orchestrator::{
    DownloadRequest, Orchestrator, RunSettings, DEFAULT_END_CHAPTER, DEFAULT_START_CHAPTER,
};
use std::io::{self, Write};
use std::path::PathBuf;

pub use default_config::{default_config_candidates, find_default_config, DEFAULT_CONFIG_NAME};

/// Download a chapter range of an album as per-chapter PDFs and print a JSON report.
#[derive(Debug, Parser)]
#[command(name = "jmpdf", version)]
#[command(about = "Download album chapters as PDFs and report them as one JSON line", long_about = None)]
pub struct Cli {
    /// Album identifier, passed to the library unchanged.
    pub album_id: String,

    /// Library option file (YAML) with an img2pdf plugin carrying pdf_dir.
    /// Defaults to jmcomic_config.yml next to the executable, then in the working directory.
    pub config_path: Option<PathBuf>,

    /// First chapter to download (1-based).
    #[arg(default_value_t = DEFAULT_START_CHAPTER, allow_negative_numbers = true)]
    pub start_chapter: i64,

    /// Last chapter to download (inclusive).
    #[arg(default_value_t = DEFAULT_END_CHAPTER, allow_negative_numbers = true)]
    pub end_chapter: i64,

    /// Python interpreter hosting the comic library (default: settings file, then auto-detect).
    #[arg(long, value_name = "CMD")]
    pub python: Option<String>,
}

/// Parse arguments, run, print the report. Returns the process exit code.
pub fn run_from_args() -> i32 {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            let code = if err.use_stderr() { 1 } else { 0 };
            let _ = err.print();
            return code;
        }
    };
    run(cli)
}

fn run(cli: Cli) -> i32 {
    let cfg = config::load_or_default();
    tracing::debug!("loaded settings: {:?}", cfg);

    let config_path = match cli.config_path {
        Some(path) => path,
        None => match find_default_config(&default_config_candidates()) {
            Some(path) => path,
            None => {
                tracing::error!("no option file given and no {} found", DEFAULT_CONFIG_NAME);
                return 1;
            }
        },
    };

    let bridge = PythonBridge::from_setting(cli.python.as_deref().or(cfg.python.as_deref()));
    let request = DownloadRequest::new(cli.album_id, Some(config_path))
        .with_range(cli.start_chapter, cli.end_chapter);
    let report = Orchestrator::new(bridge, RunSettings::from(&cfg)).execute(&request);

    let _ = io::stderr().flush();
    if let Err(err) = report.write_line(io::stdout().lock()) {
        tracing::error!("could not write report: {:#}", err);
        return 1;
    }
    report.exit_code()
}
