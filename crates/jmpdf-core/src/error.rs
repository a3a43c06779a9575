//! Failures the orchestrator raises itself.
//!
//! Anything else (YAML, I/O, child process) travels as a plain `anyhow::Error`
//! with context attached at the call site.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RunError {
    /// No config path was given, or the given path does not exist.
    #[error("a valid configuration file path is required (got {})", display_opt(.0))]
    Configuration(Option<PathBuf>),

    /// No `img2pdf` descriptor carries a usable `pdf_dir`.
    #[error("no img2pdf plugin with a pdf_dir found in {}", .0.display())]
    PluginConfig(PathBuf),

    /// Start chapter exceeds end chapter after clamping.
    #[error("start chapter ({start}) cannot be greater than end chapter ({end})")]
    Range { start: i64, end: i64 },

    /// No PDF was found in any candidate directory after the download loop.
    #[error("no generated PDF files found; checked: {}", join_paths(.0))]
    ArtifactNotFound(Vec<PathBuf>),
}

fn display_opt(path: &Option<PathBuf>) -> String {
    match path {
        Some(p) => p.display().to_string(),
        None => "nothing".to_string(),
    }
}

fn join_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn range_error_message_names_both_bounds() {
        let err = RunError::Range { start: 6, end: 3 };
        assert_eq!(
            err.to_string(),
            "start chapter (6) cannot be greater than end chapter (3)"
        );
    }

    #[test]
    fn configuration_error_without_path() {
        let err = RunError::Configuration(None);
        assert!(err.to_string().contains("nothing"));
    }

    #[test]
    fn artifact_error_lists_checked_locations() {
        let err = RunError::ArtifactNotFound(vec![
            PathBuf::from("/abs/pdf"),
            PathBuf::from("./pdf"),
        ]);
        let msg = err.to_string();
        assert!(msg.contains("/abs/pdf"));
        assert!(msg.contains("./pdf"));
    }
}
