//! The comic library's YAML option file.
//!
//! The document is kept as an opaque `serde_yaml::Value` so settings jmpdf does
//! not understand survive the round-trip to the library untouched. Only the
//! `plugins` section is given structure: each entry under a timing key becomes
//! a [`PluginEntry`], validated once here instead of at every lookup.

use anyhow::{Context, Result};
use serde_yaml::{Mapping, Value};
use std::fs;
use std::path::{Path, PathBuf};

use crate::discovery::absolutize;

/// Name of the library plugin that renders each chapter to a PDF.
pub const IMG2PDF: &str = "img2pdf";

const PLUGINS_KEY: &str = "plugins";
const PLUGIN_NAME_KEY: &str = "plugin";
const KWARGS_KEY: &str = "kwargs";
const PDF_DIR_KEY: &str = "pdf_dir";

/// Point in the library's download lifecycle at which a plugin runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PluginTiming {
    AfterPhoto,
    AfterAlbum,
    Other(String),
}

impl PluginTiming {
    pub fn parse(key: &str) -> Self {
        match key {
            "after_photo" => PluginTiming::AfterPhoto,
            "after_album" => PluginTiming::AfterAlbum,
            other => PluginTiming::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            PluginTiming::AfterPhoto => "after_photo",
            PluginTiming::AfterAlbum => "after_album",
            PluginTiming::Other(s) => s,
        }
    }

    /// Only these two timings are consulted when looking for `pdf_dir`.
    pub fn is_recognized(&self) -> bool {
        !matches!(self, PluginTiming::Other(_))
    }
}

/// One item of a `plugins.<timing>` list.
#[derive(Debug, Clone, PartialEq)]
pub enum PluginEntry {
    Descriptor {
        timing: PluginTiming,
        plugin_name: Option<String>,
        arguments: Mapping,
    },
    /// Not a mapping; skipped with a warning.
    Malformed {
        timing: PluginTiming,
        position: usize,
        raw: Value,
    },
}

impl PluginEntry {
    fn from_value(timing: PluginTiming, position: usize, value: &Value) -> Self {
        let Some(map) = value.as_mapping() else {
            return PluginEntry::Malformed {
                timing,
                position,
                raw: value.clone(),
            };
        };
        let plugin_name = map
            .get(PLUGIN_NAME_KEY)
            .and_then(Value::as_str)
            .map(str::to_string);
        let arguments = map
            .get(KWARGS_KEY)
            .and_then(Value::as_mapping)
            .cloned()
            .unwrap_or_default();
        PluginEntry::Descriptor {
            timing,
            plugin_name,
            arguments,
        }
    }

    pub fn timing(&self) -> &PluginTiming {
        match self {
            PluginEntry::Descriptor { timing, .. } | PluginEntry::Malformed { timing, .. } => {
                timing
            }
        }
    }

    pub fn is_img2pdf(&self) -> bool {
        matches!(
            self,
            PluginEntry::Descriptor { plugin_name: Some(name), .. } if name == IMG2PDF
        )
    }

    /// The `pdf_dir` argument, if this descriptor has a non-empty string one.
    pub fn pdf_dir(&self) -> Option<&str> {
        match self {
            PluginEntry::Descriptor { arguments, .. } => arguments
                .get(PDF_DIR_KEY)
                .and_then(Value::as_str)
                .filter(|s| !s.is_empty()),
            PluginEntry::Malformed { .. } => None,
        }
    }
}

/// Loaded library option file plus the path it came from.
#[derive(Debug, Clone)]
pub struct JmOption {
    path: PathBuf,
    root: Value,
}

impl JmOption {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("read option file: {}", path.display()))?;
        Self::from_yaml_str(path, &raw)
    }

    pub fn from_yaml_str(path: &Path, raw: &str) -> Result<Self> {
        let root: Value = serde_yaml::from_str(raw)
            .with_context(|| format!("parse option YAML: {}", path.display()))?;
        // An empty file parses as null; treat it like an empty mapping.
        let root = if root.is_null() {
            Value::Mapping(Mapping::new())
        } else {
            root
        };
        Ok(Self {
            path: path.to_path_buf(),
            root,
        })
    }

    /// Absolute directory containing the option file; relative `pdf_dir` values resolve here.
    pub fn config_dir(&self) -> Result<PathBuf> {
        let abs = absolutize(&self.path)
            .with_context(|| format!("resolve option path: {}", self.path.display()))?;
        Ok(abs
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("/")))
    }

    /// Every plugin entry, in file order, across all timings.
    pub fn plugin_entries(&self) -> Vec<PluginEntry> {
        let Some(plugins) = self.root.get(PLUGINS_KEY).and_then(Value::as_mapping) else {
            return Vec::new();
        };
        let mut entries = Vec::new();
        for (key, list) in plugins {
            let Some(key) = key.as_str() else { continue };
            let timing = PluginTiming::parse(key);
            let Some(list) = list.as_sequence() else {
                if timing.is_recognized() {
                    tracing::warn!("plugins.{} is not a list, ignoring it", key);
                }
                continue;
            };
            for (position, item) in list.iter().enumerate() {
                entries.push(PluginEntry::from_value(timing.clone(), position, item));
            }
        }
        entries
    }

    /// Locate the `pdf_dir` argument of the `img2pdf` plugin.
    ///
    /// Timings are visited in file order and only the first `img2pdf` of each
    /// counts; a later timing's value replaces an earlier one.
    pub fn img2pdf_dir(&self) -> Option<String> {
        let mut found: Option<String> = None;
        let mut seen_in: Option<PluginTiming> = None;
        for entry in self.plugin_entries() {
            if !entry.timing().is_recognized() {
                continue;
            }
            if let PluginEntry::Malformed {
                timing,
                position,
                raw,
            } = &entry
            {
                tracing::warn!(
                    "plugin entry {}[{}] is not a mapping, skipping: {:?}",
                    timing.as_str(),
                    position,
                    raw
                );
                continue;
            }
            if !entry.is_img2pdf() || seen_in.as_ref() == Some(entry.timing()) {
                continue;
            }
            seen_in = Some(entry.timing().clone());
            tracing::info!("found img2pdf plugin under {}", entry.timing().as_str());
            if let Some(dir) = entry.pdf_dir() {
                found = Some(dir.to_string());
            }
        }
        found
    }

    /// Set `pdf_dir` on every `img2pdf` descriptor under any timing. Returns how many were rewritten.
    pub fn set_img2pdf_dir(&mut self, dir: &Path) -> usize {
        let Some(plugins) = self
            .root
            .get_mut(PLUGINS_KEY)
            .and_then(Value::as_mapping_mut)
        else {
            return 0;
        };
        let new_value = Value::String(dir.to_string_lossy().into_owned());
        let mut rewritten = 0;
        for (_, list) in plugins.iter_mut() {
            let Some(list) = list.as_sequence_mut() else { continue };
            for item in list.iter_mut() {
                let Some(map) = item.as_mapping_mut() else { continue };
                if map.get(PLUGIN_NAME_KEY).and_then(Value::as_str) != Some(IMG2PDF) {
                    continue;
                }
                let kwargs = map
                    .entry(Value::String(KWARGS_KEY.to_string()))
                    .or_insert_with(|| Value::Mapping(Mapping::new()));
                if !kwargs.is_mapping() {
                    *kwargs = Value::Mapping(Mapping::new());
                }
                if let Some(kwargs) = kwargs.as_mapping_mut() {
                    kwargs.insert(Value::String(PDF_DIR_KEY.to_string()), new_value.clone());
                    rewritten += 1;
                }
            }
        }
        rewritten
    }

    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(&self.root).context("serialize option YAML")
    }

    pub fn write_to(&self, path: &Path) -> Result<()> {
        let yaml = self.to_yaml()?;
        fs::write(path, yaml).with_context(|| format!("write option file: {}", path.display()))
    }
}

/// Join a relative `pdf_dir` onto the option file's directory; absolute values pass through.
pub fn resolve_pdf_dir(config_dir: &Path, pdf_dir: &str) -> PathBuf {
    let p = Path::new(pdf_dir);
    if p.is_absolute() {
        p.to_path_buf()
    } else {
        config_dir.join(p)
    }
}
