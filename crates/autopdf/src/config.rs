//! Persistent configuration and history (`config.json`)
//!
//! The store is loaded once and written back after every mutation. A missing
//! or unreadable file yields the defaults; it is never fatal.

use crate::form::FormData;
use crate::schema::SUGGEST_FIELDS;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const CONFIG_FILE: &str = "config.json";

/// Most entries kept in each history list
pub const HISTORY_LIMIT: usize = 10;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

/// The persisted document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfigData {
    /// Last form submitted per template file name
    pub recent_inputs: BTreeMap<String, FormData>,
    /// Generated PDFs relative to the config directory, newest first
    pub recent_files: Vec<String>,
    /// Field -> previously used values, newest first
    pub common_values: BTreeMap<String, Vec<String>>,
    /// TrueType font used for PDF text
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pdf_font: Option<PathBuf>,
}

impl Default for ConfigData {
    fn default() -> Self {
        Self {
            recent_inputs: BTreeMap::new(),
            recent_files: Vec::new(),
            common_values: SUGGEST_FIELDS
                .iter()
                .map(|field| (field.to_string(), Vec::new()))
                .collect(),
            pdf_font: None,
        }
    }
}

/// Owned configuration store bound to one file
#[derive(Debug)]
pub struct ConfigStore {
    path: PathBuf,
    data: ConfigData,
}

impl ConfigStore {
    /// Load from `path`, falling back to defaults
    pub fn load<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref().to_path_buf();
        let data = match std::fs::read_to_string(&path) {
            Ok(text) => serde_json::from_str(&text).unwrap_or_else(|e| {
                log::warn!("ignoring unreadable {}: {}", path.display(), e);
                ConfigData::default()
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => ConfigData::default(),
            Err(e) => {
                log::warn!("cannot read {}: {}", path.display(), e);
                ConfigData::default()
            }
        };
        Self { path, data }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn data(&self) -> &ConfigData {
        &self.data
    }

    fn base_dir(&self) -> &Path {
        self.path.parent().unwrap_or_else(|| Path::new("."))
    }

    /// Write the store as pretty-printed UTF-8 JSON
    pub fn save(&self) -> Result<(), ConfigError> {
        if let Some(dir) = self.path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir)?;
        }
        let json = serde_json::to_string_pretty(&self.data)?;
        std::fs::write(&self.path, json)?;
        Ok(())
    }

    pub fn update_recent_inputs(&mut self, template: &str, form: &FormData) -> Result<(), ConfigError> {
        self.data
            .recent_inputs
            .insert(template.to_string(), form.clone());
        self.save()
    }

    pub fn recent_inputs(&self, template: &str) -> Option<&FormData> {
        self.data.recent_inputs.get(template)
    }

    /// Put a file at the front of the recent list
    pub fn add_recent_file(&mut self, file: &Path) -> Result<(), ConfigError> {
        let relative = file
            .strip_prefix(self.base_dir())
            .unwrap_or(file)
            .to_string_lossy()
            .into_owned();

        let files = &mut self.data.recent_files;
        files.retain(|existing| existing != &relative);
        files.insert(0, relative);
        files.truncate(HISTORY_LIMIT);
        self.save()
    }

    /// Recent files resolved against the config directory
    pub fn recent_files(&self) -> Vec<PathBuf> {
        self.data
            .recent_files
            .iter()
            .map(|file| self.base_dir().join(file))
            .collect()
    }

    /// Remember a value; `store_link` lists are split on commas
    pub fn update_common_values(&mut self, field: &str, value: &str) -> Result<(), ConfigError> {
        let entries: Vec<&str> = if field == "store_link" {
            value.split(',').map(str::trim).collect()
        } else {
            vec![value]
        };

        let values = self
            .data
            .common_values
            .entry(field.to_string())
            .or_default();
        for entry in entries {
            if !entry.is_empty() && !values.iter().any(|v| v == entry) {
                values.insert(0, entry.to_string());
                values.truncate(HISTORY_LIMIT);
            }
        }
        self.save()
    }

    pub fn common_values(&self, field: &str) -> &[String] {
        self.data
            .common_values
            .get(field)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Font path, resolved against the config directory
    pub fn pdf_font(&self) -> Option<PathBuf> {
        self.data
            .pdf_font
            .as_ref()
            .map(|font| self.base_dir().join(font))
    }
}

/// Label for a recent file: the text before the first `-` of its name
/// (the seller), or the file stem
pub fn recent_display_name(path: &Path) -> String {
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    match file_name.split_once('-') {
        Some((seller, _)) => seller.to_string(),
        None => path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or(file_name),
    }
}
