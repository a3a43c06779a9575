//! Tool settings loaded from `~/.config/jmpdf/config.toml`.
//!
//! These are jmpdf's own knobs. The external library's YAML configuration is
//! handled separately by [`crate::option`].

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// Session budget: stop issuing chapter downloads once the PDFs on disk exceed this.
pub const DEFAULT_MAX_TOTAL_BYTES: u64 = 200 * 1024 * 1024;

/// Last-resort discovery directory, relative to the working directory.
pub const DEFAULT_FALLBACK_PDF_DIR: &str = "./pdf";

/// Global configuration loaded from `~/.config/jmpdf/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JmpdfConfig {
    /// Cumulative PDF size (bytes) after which no further chapters are downloaded.
    #[serde(default = "default_max_total_bytes")]
    pub max_total_bytes: u64,
    /// Third directory searched for PDFs when neither configured location has any.
    #[serde(default = "default_fallback_pdf_dir")]
    pub fallback_pdf_dir: PathBuf,
    /// Python interpreter that hosts the comic library. Auto-detected when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub python: Option<String>,
}

fn default_max_total_bytes() -> u64 {
    DEFAULT_MAX_TOTAL_BYTES
}

fn default_fallback_pdf_dir() -> PathBuf {
    PathBuf::from(DEFAULT_FALLBACK_PDF_DIR)
}

impl Default for JmpdfConfig {
    fn default() -> Self {
        Self {
            max_total_bytes: DEFAULT_MAX_TOTAL_BYTES,
            fallback_pdf_dir: default_fallback_pdf_dir(),
            python: None,
        }
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("jmpdf")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<JmpdfConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = JmpdfConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    let data = fs::read_to_string(&path)?;
    let cfg: JmpdfConfig = toml::from_str(&data)?;
    Ok(cfg)
}

/// Like [`load_or_init`], but a broken settings file only costs a warning.
pub fn load_or_default() -> JmpdfConfig {
    match load_or_init() {
        Ok(cfg) => cfg,
        Err(err) => {
            tracing::warn!("could not load settings, using defaults: {:#}", err);
            JmpdfConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_values() {
        let cfg = JmpdfConfig::default();
        assert_eq!(cfg.max_total_bytes, 209_715_200);
        assert_eq!(cfg.fallback_pdf_dir, PathBuf::from("./pdf"));
        assert!(cfg.python.is_none());
    }

    #[test]
    fn config_toml_roundtrip() {
        let cfg = JmpdfConfig::default();
        let toml = toml::to_string_pretty(&cfg).unwrap();
        let parsed: JmpdfConfig = toml::from_str(&toml).unwrap();
        assert_eq!(parsed.max_total_bytes, cfg.max_total_bytes);
        assert_eq!(parsed.fallback_pdf_dir, cfg.fallback_pdf_dir);
        assert_eq!(parsed.python, cfg.python);
    }

    #[test]
    fn config_toml_custom_values() {
        let toml = r#"
            max_total_bytes = 1_048_576
            fallback_pdf_dir = "/srv/pdf"
            python = "/usr/bin/python3.11"
        "#;
        let cfg: JmpdfConfig = toml::from_str(toml).unwrap();
        assert_eq!(cfg.max_total_bytes, 1_048_576);
        assert_eq!(cfg.fallback_pdf_dir, PathBuf::from("/srv/pdf"));
        assert_eq!(cfg.python.as_deref(), Some("/usr/bin/python3.11"));
    }

    #[test]
    fn config_toml_missing_fields_use_defaults() {
        let cfg: JmpdfConfig = toml::from_str("").unwrap();
        assert_eq!(cfg.max_total_bytes, DEFAULT_MAX_TOTAL_BYTES);
        assert_eq!(cfg.fallback_pdf_dir, PathBuf::from(DEFAULT_FALLBACK_PDF_DIR));
    }
}
