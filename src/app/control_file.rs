//! Control file parsing for subset request submission
//!
//! A control file is a user-authored text file of `key=value` lines. Lines
//! starting with `#` are comments and blank lines are skipped. The parsed
//! parameters become the JSON body of a `submit` call.

use std::path::{Path, PathBuf};

use serde_json::{Map, Value};
use tracing::debug;

use crate::constants::files;
use crate::errors::ControlFileError;

/// Parameters of a subset request, in file order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ControlFile {
    params: Map<String, Value>,
}

impl ControlFile {
    /// Read and parse a control file from disk
    pub fn load(path: &Path) -> Result<Self, ControlFileError> {
        let content = std::fs::read_to_string(path).map_err(|source| ControlFileError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let control = Self::parse(&content, path)?;
        debug!(
            "Parsed {} parameters from control file {}",
            control.len(),
            path.display()
        );
        Ok(control)
    }

    /// Parse control file content; `origin` is only used in error messages
    ///
    /// The first `=` separates key from value. When a key repeats, the last
    /// value wins and the key keeps its first position.
    pub fn parse(content: &str, origin: &Path) -> Result<Self, ControlFileError> {
        let mut params = Map::new();

        for (index, raw_line) in content.lines().enumerate() {
            if raw_line.starts_with(files::CONTROL_FILE_COMMENT) {
                continue;
            }
            let line = raw_line.trim_end();
            if line.trim().is_empty() {
                continue;
            }

            let (key, value) = line
                .split_once('=')
                .map(|(k, v)| (k.trim(), v.trim()))
                .filter(|(k, _)| !k.is_empty())
                .ok_or_else(|| ControlFileError::MalformedLine {
                    path: PathBuf::from(origin),
                    line: index + 1,
                    content: line.to_string(),
                })?;

            params.insert(key.to_string(), Value::String(value.to_string()));
        }

        Ok(Self { params })
    }

    /// Value of a parameter, if present
    pub fn get(&self, key: &str) -> Option<&str> {
        self.params.get(key).and_then(Value::as_str)
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// JSON request body for the submit endpoint
    pub fn to_json(&self) -> Value {
        Value::Object(self.params.clone())
    }
}
