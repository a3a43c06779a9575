//! Where to look for the option file when none is given on the command line.

use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_NAME: &str = "jmcomic_config.yml";

/// `jmcomic_config.yml` next to the executable, then in the working directory.
pub fn default_config_candidates() -> Vec<PathBuf> {
    let exe_dir = std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf));
    let cwd = std::env::current_dir().ok();
    candidates_in(exe_dir.as_deref(), cwd.as_deref())
}

pub(super) fn candidates_in(exe_dir: Option<&Path>, cwd: Option<&Path>) -> Vec<PathBuf> {
    let mut out: Vec<PathBuf> = Vec::new();
    for dir in [exe_dir, cwd].into_iter().flatten() {
        let candidate = dir.join(DEFAULT_CONFIG_NAME);
        if !out.contains(&candidate) {
            out.push(candidate);
        }
    }
    out
}

pub fn find_default_config(candidates: &[PathBuf]) -> Option<PathBuf> {
    candidates.iter().find(|p| p.is_file()).cloned()
}
