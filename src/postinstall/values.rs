//! Staged `install_values.txt` parsing.

use crate::error::PostInstallError;
use std::collections::BTreeMap;
use std::path::Path;

/// Flat key/value pairs handed over by the installer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstallValues {
    entries: BTreeMap<String, String>,
}

impl InstallValues {
    /// Parse line-oriented `key=value` text.
    ///
    /// Blank lines, `#` comments and lines without `=` are skipped. Keys and
    /// values are trimmed and one pair of matching quotes is removed from values.
    /// A repeated key keeps its last value.
    pub fn parse(text: &str) -> Self {
        let entries = text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .filter_map(|line| line.split_once('='))
            .map(|(key, value)| (key.trim().to_string(), strip_quotes(value.trim()).to_string()))
            .filter(|(key, _)| !key.is_empty())
            .collect();
        Self { entries }
    }

    /// Read and parse a staged file.
    pub fn load(path: &Path) -> Result<Self, PostInstallError> {
        let bytes = std::fs::read(path).map_err(|source| PostInstallError::ValuesUnreadable {
            path: path.to_path_buf(),
            source,
        })?;
        let text = String::from_utf8_lossy(&bytes);
        let text = text.strip_prefix('\u{feff}').unwrap_or(&text);
        Ok(Self::parse(text))
    }

    /// Value for `key`, if present.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when nothing was parsed.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

fn strip_quotes(value: &str) -> &str {
    for quote in ['"', '\''] {
        if value.len() >= 2 && value.starts_with(quote) && value.ends_with(quote) {
            return &value[1..value.len() - 1];
        }
    }
    value
}
