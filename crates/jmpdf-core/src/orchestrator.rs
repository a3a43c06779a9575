//! The download loop: resolve the PDF directory, walk the chapter range under
//! the size budget, then collect what the library produced into a report.

use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;

use crate::album::{Album, Chapter};
use crate::client::ComicClient;
use crate::config::{JmpdfConfig, DEFAULT_FALLBACK_PDF_DIR, DEFAULT_MAX_TOTAL_BYTES};
use crate::discovery::{total_bytes, CandidateDirs, PdfFile};
use crate::error::RunError;
use crate::option::{resolve_pdf_dir, JmOption};
use crate::output_guard::StdoutGuard;
use crate::report::{PdfEntry, PhotoEntry, Report, SuccessReport, MODE_AFTER_PHOTO};
use crate::session::{mib, DownloadSession, Flow};

pub const DEFAULT_START_CHAPTER: i64 = 1;
pub const DEFAULT_END_CHAPTER: i64 = 5;

/// What to download: album, option file, and a 1-based inclusive chapter range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadRequest {
    pub album_id: String,
    pub config_path: Option<PathBuf>,
    pub start_chapter: i64,
    pub end_chapter: i64,
}

impl DownloadRequest {
    pub fn new(album_id: impl Into<String>, config_path: Option<PathBuf>) -> Self {
        Self {
            album_id: album_id.into(),
            config_path,
            start_chapter: DEFAULT_START_CHAPTER,
            end_chapter: DEFAULT_END_CHAPTER,
        }
    }

    pub fn with_range(mut self, start_chapter: i64, end_chapter: i64) -> Self {
        self.start_chapter = start_chapter;
        self.end_chapter = end_chapter;
        self
    }
}

/// Knobs that stay fixed for a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSettings {
    pub max_total_bytes: u64,
    pub fallback_pdf_dir: PathBuf,
}

impl Default for RunSettings {
    fn default() -> Self {
        Self {
            max_total_bytes: DEFAULT_MAX_TOTAL_BYTES,
            fallback_pdf_dir: PathBuf::from(DEFAULT_FALLBACK_PDF_DIR),
        }
    }
}

impl From<&JmpdfConfig> for RunSettings {
    fn from(cfg: &JmpdfConfig) -> Self {
        Self {
            max_total_bytes: cfg.max_total_bytes,
            fallback_pdf_dir: cfg.fallback_pdf_dir.clone(),
        }
    }
}

/// Clamp `start` up to 1 and `end` down to `total_chapters`, then require `start <= end`.
pub fn clamp_range(start: i64, end: i64, total_chapters: usize) -> Result<(i64, i64), RunError> {
    let total = i64::try_from(total_chapters).unwrap_or(i64::MAX);
    let start = start.max(1);
    let end = end.min(total);
    if start > end {
        return Err(RunError::Range { start, end });
    }
    Ok((start, end))
}

pub struct Orchestrator<C> {
    client: C,
    settings: RunSettings,
}

impl<C: ComicClient> Orchestrator<C> {
    pub fn new(client: C, settings: RunSettings) -> Self {
        Self { client, settings }
    }

    /// Run and convert any failure into a failure report. Never panics on error paths.
    pub fn execute(&self, request: &DownloadRequest) -> Report {
        match self.run(request) {
            Ok(report) => Report::Success(report),
            Err(err) => {
                tracing::error!("download failed: {:#}", err);
                Report::from_error(&request.album_id, &err)
            }
        }
    }

    pub fn run(&self, request: &DownloadRequest) -> Result<SuccessReport> {
        let config_path = match &request.config_path {
            Some(p) if p.exists() => p.clone(),
            other => return Err(RunError::Configuration(other.clone()).into()),
        };
        tracing::info!("using option file: {}", config_path.display());

        let mut option = JmOption::load(&config_path)?;

        let pdf_dir = option
            .img2pdf_dir()
            .ok_or_else(|| RunError::PluginConfig(config_path.clone()))?;
        let config_dir = option.config_dir()?;
        let pdf_dir_abs = resolve_pdf_dir(&config_dir, &pdf_dir);
        fs::create_dir_all(&pdf_dir_abs)
            .with_context(|| format!("create PDF directory {}", pdf_dir_abs.display()))?;
        tracing::info!("PDF directory: {}", pdf_dir_abs.display());

        let rewritten = option.set_img2pdf_dir(&pdf_dir_abs);
        tracing::info!(
            "set pdf_dir of {} img2pdf plugin(s) to {}",
            rewritten,
            pdf_dir_abs.display()
        );

        let candidates = CandidateDirs::new([
            pdf_dir_abs.clone(),
            PathBuf::from(&pdf_dir),
            self.settings.fallback_pdf_dir.clone(),
        ]);

        tracing::info!(
            "fetching album {}, requested chapters {}-{}",
            request.album_id,
            request.start_chapter,
            request.end_chapter
        );
        let album = self
            .client
            .album_detail(&request.album_id, &option)
            .with_context(|| format!("fetch album {}", request.album_id))?;
        let total_chapters = album.total_chapters();

        let (start, end) = clamp_range(request.start_chapter, request.end_chapter, total_chapters)?;
        // Both bounds are within 1..=total_chapters here.
        let selected = album.chapter_range(start as usize, end as usize);
        tracing::info!(
            "album has {} chapters, downloading {}-{} ({} chapters)",
            total_chapters,
            start,
            end,
            selected.len()
        );

        let session = self.download_chapters(&album, start, selected, &option, &candidates)?;

        tracing::info!("downloads finished, looking for generated PDFs");
        let files = match candidates.discover()? {
            Some(files) => files,
            None => {
                tracing::error!("no PDF files found; checked:");
                for (i, dir) in candidates.dirs().iter().enumerate() {
                    tracing::error!("  {}. {}", i + 1, dir.display());
                }
                return Err(RunError::ArtifactNotFound(candidates.dirs().to_vec()).into());
            }
        };
        tracing::info!("found {} PDF file(s)", files.len());

        tracing::info!("collecting chapter info for {}-{}", start, end);
        let photos: Vec<PhotoEntry> = selected
            .iter()
            .map(|chapter| PhotoEntry {
                title: chapter.name.clone(),
                index: chapter.index,
                image_count: chapter.image_count(),
            })
            .collect();
        let total_images = photos.iter().map(|p| p.image_count).sum();

        let total_size = total_bytes(&files);
        tracing::info!(
            "{} PDF file(s), {} MB in total",
            files.len(),
            mib(total_size)
        );
        let pdf_files = pdf_entries(&files);

        let downloaded = session.downloaded();
        Ok(SuccessReport {
            success: true,
            album_id: request.album_id.clone(),
            title: album.name.clone(),
            author: album.author.clone(),
            pdf_count: pdf_files.len(),
            pdf_files,
            total_chapters,
            start_chapter: start,
            end_chapter: start + i64::from(downloaded) - 1,
            requested_end_chapter: end,
            downloaded_chapters: downloaded,
            size_limit_reached: session.size_limit_reached(),
            total_images,
            photos,
            total_size,
            mode: MODE_AFTER_PHOTO.to_string(),
            pdf_dir: pdf_dir_abs.to_string_lossy().into_owned(),
        })
    }

    /// Download `selected` in order, stopping once the PDFs on disk exceed the budget.
    fn download_chapters(
        &self,
        album: &Album,
        start: i64,
        selected: &[Chapter],
        option: &JmOption,
        candidates: &CandidateDirs,
    ) -> Result<DownloadSession> {
        let mut session = DownloadSession::new(self.settings.max_total_bytes);
        let _guard = StdoutGuard::acquire().context("redirect stdout to stderr")?;

        for (i, chapter) in selected.iter().enumerate() {
            tracing::info!(
                "downloading chapter {} ({}/{}) of {}: {} (id {})",
                start + i as i64,
                i + 1,
                selected.len(),
                album.name,
                chapter.name,
                chapter.id
            );
            self.client
                .download_chapter(&chapter.id, option)
                .with_context(|| format!("download chapter {} (id {})", chapter.name, chapter.id))?;

            let on_disk = candidates.current_total_bytes()?;
            let flow = session.record_chapter(on_disk);
            tracing::info!(
                "{} chapter(s) downloaded, {} MB on disk",
                session.downloaded(),
                mib(on_disk)
            );
            if flow == Flow::Stop {
                tracing::warn!(
                    "PDF total ({} MB) exceeds the {} MB limit, skipping remaining chapters",
                    mib(on_disk),
                    mib(session.max_total_bytes())
                );
                break;
            }
        }

        Ok(session)
    }
}

fn pdf_entries(files: &[PdfFile]) -> Vec<PdfEntry> {
    files
        .iter()
        .enumerate()
        .map(|(i, f)| {
            let filename = f.file_name();
            tracing::info!("PDF {}: {} ({} MB)", i + 1, filename, mib(f.size));
            PdfEntry {
                path: f.path.to_string_lossy().into_owned(),
                filename,
                size: f.size,
                chapter_index: i + 1,
            }
        })
        .collect()
}
