//! Per-run download counters and the cumulative size budget.

/// Whether the loop should issue the next chapter download.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Stop,
}

/// Mutable state of one download loop; folded into the report when the loop ends.
#[derive(Debug)]
pub struct DownloadSession {
    max_total_bytes: u64,
    downloaded: u32,
    size_limit_reached: bool,
}

impl DownloadSession {
    pub fn new(max_total_bytes: u64) -> Self {
        Self {
            max_total_bytes,
            downloaded: 0,
            size_limit_reached: false,
        }
    }

    /// Record a finished chapter and the PDF total measured right after it.
    /// Exceeding (not reaching) the budget stops the loop.
    pub fn record_chapter(&mut self, total_bytes_on_disk: u64) -> Flow {
        self.downloaded += 1;
        if total_bytes_on_disk > self.max_total_bytes {
            self.size_limit_reached = true;
            Flow::Stop
        } else {
            Flow::Continue
        }
    }

    pub fn downloaded(&self) -> u32 {
        self.downloaded
    }

    pub fn size_limit_reached(&self) -> bool {
        self.size_limit_reached
    }

    pub fn max_total_bytes(&self) -> u64 {
        self.max_total_bytes
    }
}

/// Bytes as MiB with two decimals, for log lines.
pub fn mib(bytes: u64) -> String {
    format!("{:.2}", bytes as f64 / 1024.0 / 1024.0)
}
