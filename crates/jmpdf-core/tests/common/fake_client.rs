//! In-process stand-in for the comic library.
//!
//! `download_chapter` behaves like the `img2pdf` plugin: it reads `pdf_dir`
//! from the option it is handed and drops a (sparse) PDF there.

use anyhow::{bail, Result};
use jmpdf_core::album::{Album, Chapter};
use jmpdf_core::client::ComicClient;
use jmpdf_core::option::JmOption;
use std::cell::{Cell, RefCell};
use std::fs;
use std::path::PathBuf;
use std::time::{Duration, SystemTime};

pub const MIB: u64 = 1024 * 1024;

pub struct FakeClient {
    pub album: Album,
    /// Size of each PDF written per chapter.
    pub pdf_bytes: u64,
    /// Write PDFs here instead of the option's `pdf_dir`; `None` = follow the option.
    pub output_override: Option<PathBuf>,
    /// Skip writing PDFs entirely.
    pub write_pdfs: bool,
    /// Fail when asked for this chapter id.
    pub fail_on: Option<String>,
    pub album_calls: Cell<usize>,
    pub downloads: RefCell<Vec<String>>,
    pub seen_pdf_dirs: RefCell<Vec<String>>,
    /// Per download: whether fd 1 pointed at the same file as fd 2 at that moment.
    pub stdout_was_stderr: RefCell<Vec<bool>>,
}

/// True when stdout and stderr currently refer to the same open file.
#[cfg(unix)]
pub fn stdout_is_stderr() -> bool {
    fn identity(fd: libc::c_int) -> (u64, u64) {
        let mut st: libc::stat = unsafe { std::mem::zeroed() };
        let r = unsafe { libc::fstat(fd, &mut st) };
        assert_eq!(r, 0, "fstat({}) failed", fd);
        (st.st_dev as u64, st.st_ino as u64)
    }
    identity(libc::STDOUT_FILENO) == identity(libc::STDERR_FILENO)
}

#[cfg(not(unix))]
pub fn stdout_is_stderr() -> bool {
    true
}

pub fn album(chapters: u32) -> Album {
    Album {
        id: "422866".to_string(),
        name: "测试漫画".to_string(),
        author: "作者".to_string(),
        chapters: (1..=chapters)
            .map(|i| Chapter {
                id: format!("{}", 500 + i),
                name: format!("第{:02}话", i),
                index: i,
                page_count: Some(10 + i as usize),
                length: None,
            })
            .collect(),
    }
}

impl FakeClient {
    pub fn new(chapters: u32, pdf_bytes: u64) -> Self {
        Self {
            album: album(chapters),
            pdf_bytes,
            output_override: None,
            write_pdfs: true,
            fail_on: None,
            album_calls: Cell::new(0),
            downloads: RefCell::new(Vec::new()),
            seen_pdf_dirs: RefCell::new(Vec::new()),
            stdout_was_stderr: RefCell::new(Vec::new()),
        }
    }

    pub fn download_count(&self) -> usize {
        self.downloads.borrow().len()
    }
}

impl ComicClient for FakeClient {
    fn album_detail(&self, _album_id: &str, _option: &JmOption) -> Result<Album> {
        self.album_calls.set(self.album_calls.get() + 1);
        Ok(self.album.clone())
    }

    fn download_chapter(&self, chapter_id: &str, option: &JmOption) -> Result<()> {
        if self.fail_on.as_deref() == Some(chapter_id) {
            bail!("connection reset while fetching chapter {}", chapter_id);
        }
        self.downloads.borrow_mut().push(chapter_id.to_string());
        self.stdout_was_stderr.borrow_mut().push(stdout_is_stderr());

        let pdf_dir = option
            .plugin_entries()
            .iter()
            .filter(|e| e.is_img2pdf())
            .find_map(|e| e.pdf_dir().map(str::to_string))
            .expect("img2pdf pdf_dir in option");
        self.seen_pdf_dirs.borrow_mut().push(pdf_dir.clone());

        if !self.write_pdfs {
            return Ok(());
        }
        let dir = self
            .output_override
            .clone()
            .unwrap_or_else(|| PathBuf::from(&pdf_dir));
        fs::create_dir_all(&dir)?;
        let n = self.download_count() as u64;
        let path = dir.join(format!("chapter-{}.pdf", chapter_id));
        let f = fs::File::create(&path)?;
        f.set_len(self.pdf_bytes)?;
        f.set_modified(SystemTime::UNIX_EPOCH + Duration::from_secs(1_700_000_000 + n))?;
        Ok(())
    }
}
