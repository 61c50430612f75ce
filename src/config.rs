//! Section -> key -> string store backing `.ini` style settings files
//!
//! Lookups of sections and keys are ASCII case-insensitive. The original
//! spelling and insertion order are kept so that a file survives a
//! read-modify-write cycle with only the touched line changed.

use crate::error::BridgeError;
use indexmap::IndexMap;
use log::debug;
use std::fmt::Write as _;
use std::fs;
use std::path::Path;

/// Section that receives pairs appearing before the first header
const DEFAULT_SECTION: &str = "unknown";

/// A single `[section]` of a settings file
#[derive(Debug, Clone, Default)]
pub struct ConfigSection {
    name: String,
    /// lowercase key -> (key as written, value)
    entries: IndexMap<String, (String, String)>,
}

impl ConfigSection {
    fn new(name: &str) -> Self {
        ConfigSection {
            name: name.to_string(),
            entries: IndexMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .get(&key.to_ascii_lowercase())
            .map(|(_, value)| value.as_str())
    }

    pub fn set(&mut self, key: &str, value: &str) {
        let slot = self
            .entries
            .entry(key.to_ascii_lowercase())
            .or_insert_with(|| (key.to_string(), String::new()));
        slot.1 = value.to_string();
    }

    /// Iterate `(key, value)` pairs in file order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .values()
            .map(|(key, value)| (key.as_str(), value.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// An in-memory settings file
#[derive(Debug, Clone, Default)]
pub struct Config {
    sections: IndexMap<String, ConfigSection>,
}

impl Config {
    pub fn new() -> Self {
        Config::default()
    }

    /// Load a settings file from disk
    pub fn read(path: &Path) -> Result<Self, BridgeError> {
        let text = fs::read_to_string(path).map_err(|e| {
            debug!("config: cannot read {}: {}", path.display(), e);
            BridgeError::StorageUnavailable(path.display().to_string())
        })?;
        Ok(Config::parse(&text))
    }

    /// Parse settings text. Malformed lines are skipped.
    pub fn parse(text: &str) -> Self {
        let mut config = Config::new();
        let mut current = DEFAULT_SECTION.to_string();

        for raw_line in text.lines() {
            let line = match raw_line.find(';') {
                Some(comment) => &raw_line[..comment],
                None => raw_line,
            };
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            if let Some(rest) = line.strip_prefix('[') {
                if let Some(end) = rest.find(']') {
                    current = rest[..end].trim().to_string();
                    config.section_mut(&current);
                }
                continue;
            }

            if let Some((key, value)) = line.split_once('=') {
                let key = key.trim();
                if key.is_empty() {
                    continue;
                }
                config.set_string(&current, key, value.trim());
            }
        }

        config
    }

    pub fn section(&self, name: &str) -> Option<&ConfigSection> {
        self.sections.get(&name.to_ascii_lowercase())
    }

    fn section_mut(&mut self, name: &str) -> &mut ConfigSection {
        self.sections
            .entry(name.to_ascii_lowercase())
            .or_insert_with(|| ConfigSection::new(name))
    }

    /// Section names in file order
    pub fn section_names(&self) -> impl Iterator<Item = &str> {
        self.sections.values().map(|section| section.name())
    }

    pub fn get_string(&self, section: &str, key: &str) -> Option<&str> {
        self.section(section).and_then(|s| s.get(key))
    }

    pub fn set_string(&mut self, section: &str, key: &str, value: &str) {
        self.section_mut(section).set(key, value);
    }

    /// Render back to settings text
    pub fn to_ini_string(&self) -> String {
        let mut out = String::new();
        for (index, section) in self.sections.values().enumerate() {
            if index > 0 {
                out.push('\n');
            }
            let _ = writeln!(out, "[{}]", section.name());
            for (key, value) in section.iter() {
                let _ = writeln!(out, "{}={}", key, value);
            }
        }
        out
    }

    /// Write the whole file back to disk
    pub fn write(&self, path: &Path) -> Result<(), BridgeError> {
        fs::write(path, self.to_ini_string())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
; global comment
[Main]
Value = 12 ; trailing comment
Name=Vault Dweller

[Debug]
Enable=1
";

    #[test]
    fn test_parse_sections_and_keys() {
        let config = Config::parse(SAMPLE);
        assert_eq!(config.get_string("Main", "Value"), Some("12"));
        assert_eq!(config.get_string("Main", "Name"), Some("Vault Dweller"));
        assert_eq!(config.get_string("Debug", "Enable"), Some("1"));
        assert_eq!(
            config.section_names().collect::<Vec<_>>(),
            vec!["Main", "Debug"]
        );
    }

    #[test]
    fn test_lookup_is_case_insensitive() {
        let config = Config::parse(SAMPLE);
        assert_eq!(config.get_string("main", "VALUE"), Some("12"));
        assert_eq!(config.get_string("DEBUG", "enable"), Some("1"));
        assert_eq!(config.get_string("Main", "Missing"), None);
    }

    #[test]
    fn test_pairs_before_header_go_to_default_section() {
        let config = Config::parse("orphan=yes\n[A]\nx=1\n");
        assert_eq!(config.get_string("unknown", "orphan"), Some("yes"));
    }

    #[test]
    fn test_set_preserves_spelling_and_order() {
        let mut config = Config::parse(SAMPLE);
        config.set_string("main", "value", "5");
        config.set_string("New", "Key", "v");
        let text = config.to_ini_string();
        assert!(text.contains("[Main]\nValue=5\nName=Vault Dweller\n"));
        assert!(text.ends_with("[New]\nKey=v\n"));
    }
}
