//! Finding the PDFs the library's plugin wrote.
//!
//! jmpdf never names the files itself; it scans an ordered list of candidate
//! directories and takes the first one that has any.

use anyhow::{Context, Result};
use std::ffi::OsStr;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

const PDF_EXTENSION: &[u8] = b".pdf";

/// Make `path` absolute against the current working directory without touching the filesystem.
pub fn absolutize(path: &Path) -> io::Result<PathBuf> {
    if path.is_absolute() {
        Ok(path.to_path_buf())
    } else {
        Ok(std::env::current_dir()?.join(path))
    }
}

/// One PDF on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PdfFile {
    pub path: PathBuf,
    pub size: u64,
    pub modified: SystemTime,
}

impl PdfFile {
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

/// Ordered search locations: resolved `pdf_dir`, `pdf_dir` as written, then the fallback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateDirs {
    dirs: Vec<PathBuf>,
}

impl CandidateDirs {
    /// Duplicates are dropped; the first occurrence keeps its place.
    pub fn new<I>(dirs: I) -> Self
    where
        I: IntoIterator<Item = PathBuf>,
    {
        let mut out: Vec<PathBuf> = Vec::new();
        for dir in dirs {
            if !out.contains(&dir) {
                out.push(dir);
            }
        }
        Self { dirs: out }
    }

    pub fn dirs(&self) -> &[PathBuf] {
        &self.dirs
    }

    /// PDFs from the first candidate that has any.
    pub fn discover(&self) -> Result<Option<Vec<PdfFile>>> {
        for (i, dir) in self.dirs.iter().enumerate() {
            let files = scan_dir(dir)?;
            if !files.is_empty() {
                if i > 0 {
                    tracing::info!("found PDF files in fallback location {}", dir.display());
                }
                return Ok(Some(files));
            }
            tracing::debug!("no PDF files in {}", dir.display());
        }
        Ok(None)
    }

    /// Combined size of the PDFs [`discover`](Self::discover) would return; 0 when none.
    pub fn current_total_bytes(&self) -> Result<u64> {
        Ok(self
            .discover()?
            .map(|files| total_bytes(&files))
            .unwrap_or(0))
    }
}

pub fn total_bytes(files: &[PdfFile]) -> u64 {
    files.iter().map(|f| f.size).sum()
}

/// Matches what a `*.pdf` shell glob would: lowercase extension, no dotfiles.
/// Compared on raw bytes so names that are not valid UTF-8 still count.
pub fn is_pdf_name(name: &OsStr) -> bool {
    let bytes = name.as_encoded_bytes();
    !bytes.starts_with(b".") && bytes.len() > PDF_EXTENSION.len() && bytes.ends_with(PDF_EXTENSION)
}

/// PDFs directly inside `dir`, absolute, sorted by modification time (oldest first).
/// A missing directory yields an empty list.
pub fn scan_dir(dir: &Path) -> Result<Vec<PdfFile>> {
    let abs = absolutize(dir).with_context(|| format!("resolve {}", dir.display()))?;
    let entries = match fs::read_dir(&abs) {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e).with_context(|| format!("read directory {}", abs.display())),
    };

    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.with_context(|| format!("read directory {}", abs.display()))?;
        let name = entry.file_name();
        if !is_pdf_name(&name) {
            continue;
        }
        let path = entry.path();
        // A file may vanish between listing and stat; skip it.
        let meta = match fs::metadata(&path) {
            Ok(meta) => meta,
            Err(e) if e.kind() == io::ErrorKind::NotFound => continue,
            Err(e) => return Err(e).with_context(|| format!("stat {}", path.display())),
        };
        if !meta.is_file() {
            continue;
        }
        files.push(PdfFile {
            path,
            size: meta.len(),
            modified: meta.modified().unwrap_or(SystemTime::UNIX_EPOCH),
        });
    }
    files.sort_by(|a, b| a.modified.cmp(&b.modified).then_with(|| a.path.cmp(&b.path)));
    Ok(files)
}
