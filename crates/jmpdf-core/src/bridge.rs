//! [`ComicClient`] backed by the Python `jmcomic` package, run as a child process.
//!
//! Each call writes the (already rewritten) option document to a scratch YAML
//! file and hands its path to a short inline script. Metadata comes back as
//! one JSON line on the child's stdout; during chapter downloads the child's
//! stdout is wired to our stderr so library chatter never reaches the report
//! channel.

use anyhow::{bail, Context, Result};
use std::io;
use std::process::{Command, Stdio};
use tempfile::NamedTempFile;

use crate::album::Album;
use crate::client::ComicClient;
use crate::option::JmOption;

/// argv: option path, album id. Prints one JSON line on the real stdout.
const ALBUM_SCRIPT: &str = r#"
import json, sys
out = sys.stdout
sys.stdout = sys.stderr
import jmcomic
option = jmcomic.create_option(sys.argv[1])
album = option.new_jm_client().get_album_detail(sys.argv[2])
chapters = []
for photo in album:
    pages = getattr(photo, "page_arr", None)
    try:
        length = len(photo)
    except Exception:
        length = None
    chapters.append({
        "id": str(getattr(photo, "id", photo)),
        "name": str(photo.name),
        "index": int(photo.index),
        "page_count": len(pages) if pages is not None else None,
        "length": length,
    })
out.write(json.dumps({
    "id": str(album.id),
    "name": str(album.name),
    "author": str(album.author),
    "chapters": chapters,
}, ensure_ascii=False))
out.write("\n")
out.flush()
"#;

/// argv: option path, chapter id.
const DOWNLOAD_SCRIPT: &str = r#"
import sys
import jmcomic
option = jmcomic.create_option(sys.argv[1])
jmcomic.download_photo(sys.argv[2], option=option)
"#;

const CANDIDATE_INTERPRETERS: [&str; 2] = ["python3", "python"];

/// First interpreter in `python3`, `python` that answers `--version`; `python3` if neither does.
pub fn detect_python() -> String {
    for candidate in CANDIDATE_INTERPRETERS {
        let ok = Command::new(candidate)
            .arg("--version")
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map(|s| s.success())
            .unwrap_or(false);
        if ok {
            return candidate.to_string();
        }
    }
    tracing::warn!("no python interpreter answered --version, trying python3 anyway");
    CANDIDATE_INTERPRETERS[0].to_string()
}

#[derive(Debug, Clone)]
pub struct PythonBridge {
    python: String,
}

impl PythonBridge {
    pub fn new(python: impl Into<String>) -> Self {
        Self {
            python: python.into(),
        }
    }

    /// Use `python` if given, else auto-detect.
    pub fn from_setting(python: Option<&str>) -> Self {
        let python = match python {
            Some(p) => p.to_string(),
            None => detect_python(),
        };
        tracing::info!("using python interpreter: {}", python);
        Self::new(python)
    }

    fn command(&self, script: &str, option_file: &NamedTempFile, arg: &str) -> Command {
        let mut cmd = Command::new(&self.python);
        cmd.arg("-c")
            .arg(script)
            .arg(option_file.path())
            .arg(arg)
            .env("PYTHONIOENCODING", "utf-8")
            .stdin(Stdio::null());
        cmd
    }
}

/// Serialize the option document to a scratch file the library can load.
pub fn write_option_file(option: &JmOption) -> Result<NamedTempFile> {
    let file = tempfile::Builder::new()
        .prefix("jmpdf-option-")
        .suffix(".yml")
        .tempfile()
        .context("create scratch option file")?;
    option.write_to(file.path())?;
    Ok(file)
}

/// Parse the last non-empty stdout line of the album script.
pub fn parse_album_output(stdout: &[u8]) -> Result<Album> {
    let text = String::from_utf8_lossy(stdout);
    let line = text
        .lines()
        .rev()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .context("album metadata script printed nothing")?;
    serde_json::from_str(line).context("parse album metadata JSON")
}

impl ComicClient for PythonBridge {
    fn album_detail(&self, album_id: &str, option: &JmOption) -> Result<Album> {
        let option_file = write_option_file(option)?;
        tracing::debug!("{} -c <album script> {}", self.python, album_id);
        let output = self
            .command(ALBUM_SCRIPT, &option_file, album_id)
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .output()
            .with_context(|| format!("run {}", self.python))?;
        if !output.status.success() {
            bail!(
                "album metadata script exited with {} for album {}",
                output.status,
                album_id
            );
        }
        parse_album_output(&output.stdout)
    }

    fn download_chapter(&self, chapter_id: &str, option: &JmOption) -> Result<()> {
        let option_file = write_option_file(option)?;
        tracing::debug!("{} -c <download script> {}", self.python, chapter_id);
        let status = self
            .command(DOWNLOAD_SCRIPT, &option_file, chapter_id)
            .stdout(Stdio::from(io::stderr()))
            .stderr(Stdio::inherit())
            .status()
            .with_context(|| format!("run {}", self.python))?;
        if !status.success() {
            bail!(
                "chapter download exited with {} for chapter {}",
                status,
                chapter_id
            );
        }
        Ok(())
    }
}
