//! Seam between the orchestrator and the external comic library.
//!
//! The orchestrator only depends on this trait; metadata retrieval, image
//! download, retry, and PDF rendering all live behind it.

use anyhow::Result;

use crate::album::Album;
use crate::option::JmOption;

pub trait ComicClient {
    /// Fetch album metadata (name, author, ordered chapters).
    fn album_detail(&self, album_id: &str, option: &JmOption) -> Result<Album>;

    /// Download one chapter. Any PDF is written by the library's `img2pdf` plugin as a side effect.
    fn download_chapter(&self, chapter_id: &str, option: &JmOption) -> Result<()>;
}

impl<T: ComicClient + ?Sized> ComicClient for &T {
    fn album_detail(&self, album_id: &str, option: &JmOption) -> Result<Album> {
        (**self).album_detail(album_id, option)
    }

    fn download_chapter(&self, chapter_id: &str, option: &JmOption) -> Result<()> {
        (**self).download_chapter(chapter_id, option)
    }
}
