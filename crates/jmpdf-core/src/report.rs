//! The single JSON line written to stdout at the end of a run.

use anyhow::{Context, Result};
use serde::Serialize;
use std::io::Write;

/// Plugin timing the produced PDFs correspond to (one PDF per chapter).
pub const MODE_AFTER_PHOTO: &str = "after_photo";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PdfEntry {
    pub path: String,
    pub filename: String,
    pub size: u64,
    /// 1-based position among discovered PDFs; not necessarily the chapter index.
    pub chapter_index: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PhotoEntry {
    pub title: String,
    pub index: u32,
    pub image_count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SuccessReport {
    pub success: bool,
    pub album_id: String,
    pub title: String,
    pub author: String,
    pub pdf_files: Vec<PdfEntry>,
    pub pdf_count: usize,
    pub total_chapters: usize,
    pub start_chapter: i64,
    /// Last chapter actually attempted.
    pub end_chapter: i64,
    pub requested_end_chapter: i64,
    pub downloaded_chapters: u32,
    pub size_limit_reached: bool,
    pub total_images: usize,
    pub photos: Vec<PhotoEntry>,
    pub total_size: u64,
    pub mode: String,
    pub pdf_dir: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailureReport {
    pub success: bool,
    pub error: String,
    pub traceback: String,
    pub album_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Report {
    Success(SuccessReport),
    Failure(FailureReport),
}

impl Report {
    /// `error` is the cause chain on one line; `traceback` is the multi-line
    /// chain (plus a backtrace when `RUST_BACKTRACE` is set).
    pub fn from_error(album_id: &str, err: &anyhow::Error) -> Self {
        Report::Failure(FailureReport {
            success: false,
            error: format!("{:#}", err),
            traceback: format!("{:?}", err),
            album_id: album_id.to_string(),
        })
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Report::Success(_))
    }

    pub fn exit_code(&self) -> i32 {
        if self.is_success() {
            0
        } else {
            1
        }
    }

    /// Write the report as one line of UTF-8 JSON (non-ASCII left unescaped) and flush.
    pub fn write_line<W: Write>(&self, mut w: W) -> Result<()> {
        serde_json::to_writer(&mut w, self).context("serialize report")?;
        w.write_all(b"\n").context("write report")?;
        w.flush().context("flush report")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RunError;

    #[test]
    fn failure_report_fields() {
        let err = anyhow::Error::new(RunError::Range { start: 6, end: 3 })
            .context("validate chapter range");
        let report = Report::from_error("422866", &err);
        assert_eq!(report.exit_code(), 1);

        let mut buf = Vec::new();
        report.write_line(&mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.ends_with('\n'));
        assert_eq!(text.lines().count(), 1);

        let v: serde_json::Value = serde_json::from_str(text.trim_end()).unwrap();
        assert_eq!(v["success"], false);
        assert_eq!(v["album_id"], "422866");
        assert_eq!(
            v["error"],
            "validate chapter range: start chapter (6) cannot be greater than end chapter (3)"
        );
        assert!(v["traceback"]
            .as_str()
            .unwrap()
            .contains("start chapter (6) cannot be greater than end chapter (3)"));
    }

    #[test]
    fn success_report_keeps_non_ascii_and_field_order() {
        let report = Report::Success(SuccessReport {
            success: true,
            album_id: "1".into(),
            title: "漫画".into(),
            author: "作者".into(),
            pdf_files: vec![PdfEntry {
                path: "/pdf/第1话.pdf".into(),
                filename: "第1话.pdf".into(),
                size: 3,
                chapter_index: 1,
            }],
            pdf_count: 1,
            total_chapters: 1,
            start_chapter: 1,
            end_chapter: 1,
            requested_end_chapter: 1,
            downloaded_chapters: 1,
            size_limit_reached: false,
            total_images: 2,
            photos: vec![PhotoEntry {
                title: "第1话".into(),
                index: 1,
                image_count: 2,
            }],
            total_size: 3,
            mode: MODE_AFTER_PHOTO.into(),
            pdf_dir: "/pdf".into(),
        });
        assert_eq!(report.exit_code(), 0);
        let mut buf = Vec::new();
        report.write_line(&mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.contains("\"title\":\"漫画\""));
        assert!(text.starts_with("{\"success\":true,\"album_id\":\"1\""));
        assert!(text.trim_end().ends_with("\"mode\":\"after_photo\",\"pdf_dir\":\"/pdf\"}"));
    }
}
