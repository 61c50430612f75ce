//! Settings access through `"file|section|key"` identifiers
//!
//! Scripts address a single setting with a compound identifier. The file
//! part is resolved against an optional base directory first and the current
//! working directory second; a few system files are never looked up under
//! the base directory.

use crate::config::Config;
use crate::error::BridgeError;
use crate::util::{eq_ignore_case, parse_c_int, truncate_at_boundary};
use log::{debug, warn};
use std::path::{Path, PathBuf};

/// The max length of the file name chunk in a triplet
pub const FILE_NAME_MAX_LEN: usize = 63;

/// The max length of the section chunk in a triplet
pub const SECTION_MAX_LEN: usize = 32;

/// Buffer used when a setting is read as an integer
const INT_BUFFER_SIZE: usize = 20;

/// Settings files which are accessed without the base path
const SYSTEM_FILE_NAMES: [&str; 2] = ["ddraw.ini", "f2_res.ini"];

/// A parsed `"file|section|key"` identifier
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IniTriplet<'a> {
    pub file_name: &'a str,
    pub section: &'a str,
    pub key: &'a str,
}

impl<'a> IniTriplet<'a> {
    /// Split on the first two `|`. The key keeps any further `|`.
    pub fn parse(triplet: &'a str) -> Result<Self, BridgeError> {
        let malformed = || BridgeError::MalformedTriplet(triplet.to_string());

        let (file_name, rest) = triplet.split_once('|').ok_or_else(malformed)?;
        if file_name.len() > FILE_NAME_MAX_LEN {
            return Err(malformed());
        }

        let (section, key) = rest.split_once('|').ok_or_else(malformed)?;
        if section.len() > SECTION_MAX_LEN {
            return Err(malformed());
        }

        Ok(IniTriplet {
            file_name,
            section,
            key,
        })
    }
}

/// Returns `true` if `file_name` is one of the system settings files
pub fn is_system_file_name(file_name: &str) -> bool {
    SYSTEM_FILE_NAMES
        .iter()
        .any(|system| eq_ignore_case(system, file_name))
}

/// Reads and writes individual settings
#[derive(Debug, Clone, Default)]
pub struct IniAccessor {
    base_path: Option<PathBuf>,
}

impl IniAccessor {
    /// `base_path` is fixed for the lifetime of the accessor. Empty means none.
    pub fn new(base_path: Option<&str>) -> Self {
        let base_path = base_path
            .map(|path| path.trim_end_matches(|c| c == '/' || c == '\\'))
            .filter(|path| !path.is_empty())
            .map(PathBuf::from);
        IniAccessor { base_path }
    }

    pub fn base_path(&self) -> Option<&Path> {
        self.base_path.as_deref()
    }

    /// Candidate locations for `file_name`, in lookup order
    fn candidate_paths(&self, file_name: &str) -> Vec<PathBuf> {
        let mut paths = Vec::with_capacity(2);
        if let Some(base) = &self.base_path {
            if !is_system_file_name(file_name) {
                paths.push(base.join(file_name));
            }
        }
        paths.push(PathBuf::from(file_name));
        paths
    }

    /// Load `file_name`, returning the config and the path it came from.
    ///
    /// When nothing loads the error names the last path tried, which is
    /// also where a setter writes.
    fn load_with_path(&self, file_name: &str) -> (Result<Config, BridgeError>, PathBuf) {
        let mut last_path = PathBuf::from(file_name);
        let mut last_error = BridgeError::StorageUnavailable(file_name.to_string());

        for path in self.candidate_paths(file_name) {
            match Config::read(&path) {
                Ok(config) => return (Ok(config), path),
                Err(e) => {
                    last_error = e;
                    last_path = path;
                }
            }
        }

        (Err(last_error), last_path)
    }

    /// Load a whole settings file by name, with base path resolution
    pub fn load_named(&self, file_name: &str) -> Result<Config, BridgeError> {
        self.load_with_path(file_name).0
    }

    /// Read a setting as a string of at most `size - 1` bytes.
    ///
    /// Only a malformed identifier is an error. A missing file or key reads
    /// as the empty string.
    pub fn get_string(&self, triplet: &str, size: usize) -> Result<String, BridgeError> {
        let parsed = IniTriplet::parse(triplet)?;

        let mut value = match self.load_named(parsed.file_name) {
            Ok(config) => config
                .get_string(parsed.section, parsed.key)
                .unwrap_or_default()
                .to_string(),
            Err(e) => {
                debug!("get_ini_string: {}", e);
                String::new()
            }
        };

        truncate_at_boundary(&mut value, size.saturating_sub(1));
        Ok(value)
    }

    /// Read a setting as an integer (`strtol` with base detection).
    ///
    /// Fails when the identifier is malformed, the file does not load or the
    /// key is absent, so that a stored 0 is distinguishable from a miss.
    pub fn get_int(&self, triplet: &str) -> Result<i32, BridgeError> {
        let parsed = IniTriplet::parse(triplet)?;
        let config = self.load_named(parsed.file_name)?;

        let mut raw = config
            .get_string(parsed.section, parsed.key)
            .ok_or_else(|| BridgeError::KeyNotFound(triplet.to_string()))?
            .to_string();
        truncate_at_boundary(&mut raw, INT_BUFFER_SIZE - 1);

        Ok(parse_c_int(&raw))
    }

    /// Write a string setting, creating the file if needed
    pub fn set_string(&self, triplet: &str, value: &str) -> Result<(), BridgeError> {
        let parsed = IniTriplet::parse(triplet)?;

        let (loaded, path) = self.load_with_path(parsed.file_name);
        let mut config = loaded.unwrap_or_else(|e| {
            debug!("set_ini_setting: starting a new file ({})", e);
            Config::new()
        });

        config.set_string(parsed.section, parsed.key, value);
        config.write(&path).map_err(|e| {
            warn!("set_ini_setting: cannot write {}: {}", path.display(), e);
            e
        })
    }

    pub fn set_int(&self, triplet: &str, value: i32) -> Result<(), BridgeError> {
        self.set_string(triplet, &value.to_string())
    }
}
