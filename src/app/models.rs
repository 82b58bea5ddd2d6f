//! Data models for RDA identifiers, request manifests and API responses
//!
//! The models validate their input on construction so the rest of the
//! application never handles a dataset id or request index that would build
//! a malformed URL.

use std::fmt;

use serde_json::{Map, Value};

use crate::constants::dataset;
use crate::errors::{ApiError, ApiResult, DownloadError, DownloadResult, UsageError, UsageResult};

/// Canonical dataset identifier, e.g. `ds083.2`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DatasetId(String);

impl DatasetId {
    /// Normalize and validate a user supplied dataset id
    ///
    /// Surrounding whitespace is trimmed and `ds` is prefixed when missing.
    /// The result must have the canonical total length; anything else is
    /// rejected rather than silently corrected.
    ///
    /// # Examples
    ///
    /// ```
    /// use rdams_client::app::DatasetId;
    ///
    /// assert_eq!(DatasetId::parse("083.2").unwrap().as_str(), "ds083.2");
    /// assert!(DatasetId::parse("ds08").is_err());
    /// ```
    pub fn parse(input: &str) -> UsageResult<Self> {
        let trimmed = input.trim();
        let normalized = if trimmed.starts_with(dataset::PREFIX) {
            trimmed.to_string()
        } else {
            format!("{}{}", dataset::PREFIX, trimmed)
        };

        if normalized.chars().count() != dataset::ID_LENGTH {
            return Err(UsageError::InvalidDatasetId { id: normalized });
        }

        Ok(Self(normalized))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DatasetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier of a previously submitted subset request
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RequestIndex(String);

impl RequestIndex {
    /// Validate a request index; it is opaque but must be a single path segment
    pub fn parse(input: &str) -> UsageResult<Self> {
        let trimmed = input.trim();
        if trimmed.is_empty() || trimmed.contains('/') || trimmed == "." || trimmed == ".." {
            return Err(UsageError::InvalidRequestIndex {
                index: input.to_string(),
            });
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RequestIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Body of an API response, classified as JSON or a plain-text message
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseBody {
    /// Body opened with `{` and parsed as JSON
    Json(Value),
    /// Anything else; the server uses this for errors and notices
    Text(String),
}

impl ResponseBody {
    /// Classify a raw body
    ///
    /// A body is JSON when its first non-whitespace character is `{` and it
    /// parses. Everything else, including a `{` prefix that fails to parse,
    /// is a text message.
    pub fn classify(raw: &str) -> Self {
        if raw.trim_start().starts_with('{') {
            if let Ok(value) = serde_json::from_str::<Value>(raw) {
                return ResponseBody::Json(value);
            }
            tracing::debug!("Response starts with '{{' but is not valid JSON");
        }
        ResponseBody::Text(raw.to_string())
    }
}

/// One file of a completed request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestEntry {
    /// Remote URL of the file
    pub remote_path: String,
    /// Expected size in bytes; `None` when the server value is not a byte count
    pub expected_size: Option<u64>,
}

impl ManifestEntry {
    /// Local file name: the last `/` segment of the remote path
    pub fn file_name(&self) -> DownloadResult<&str> {
        let name = self
            .remote_path
            .rsplit('/')
            .next()
            .unwrap_or(self.remote_path.as_str());
        if name.is_empty() || name == "." || name == ".." {
            return Err(DownloadError::InvalidManifest {
                reason: format!("no file name in '{}'", self.remote_path),
            });
        }
        Ok(name)
    }
}

/// Remote file path to expected size, in server order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileManifest {
    entries: Vec<ManifestEntry>,
}

impl FileManifest {
    /// Build a manifest from the JSON object returned by the filelist endpoint
    ///
    /// Sizes may be JSON strings or integers. A size that is neither a
    /// non-negative integer nor a string holding one is kept as unknown.
    pub fn from_json(object: &Map<String, Value>) -> Self {
        let entries = object
            .iter()
            .map(|(path, size)| ManifestEntry {
                remote_path: path.clone(),
                expected_size: parse_size(size),
            })
            .collect();
        Self { entries }
    }

    /// Build a manifest from a classified response body
    ///
    /// A text body is the server telling us why there is no file list; it is
    /// surfaced verbatim as an error.
    pub fn from_response(body: ResponseBody) -> ApiResult<Self> {
        match body {
            ResponseBody::Json(Value::Object(object)) => Ok(Self::from_json(&object)),
            ResponseBody::Json(other) => Err(ApiError::ServerMessage(other.to_string())),
            ResponseBody::Text(message) => Err(ApiError::ServerMessage(message)),
        }
    }

    pub fn entries(&self) -> &[ManifestEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<ManifestEntry> for FileManifest {
    fn from_iter<I: IntoIterator<Item = ManifestEntry>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

fn parse_size(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_dataset_id_normalization() {
        let id = DatasetId::parse("083.2").unwrap();
        assert_eq!(id.as_str(), "ds083.2");
        assert_eq!(id.as_str().len(), 7);

        assert_eq!(DatasetId::parse(" ds627.0 ").unwrap().as_str(), "ds627.0");
    }

    #[test]
    fn test_dataset_id_rejects_wrong_length() {
        match DatasetId::parse("ds08") {
            Err(UsageError::InvalidDatasetId { id }) => assert_eq!(id, "ds08"),
            other => panic!("Expected InvalidDatasetId, got {:?}", other),
        }
        assert!(DatasetId::parse("ds083.21").is_err());
        assert!(DatasetId::parse("").is_err());
    }

    #[test]
    fn test_request_index_validation() {
        assert_eq!(RequestIndex::parse("123456").unwrap().as_str(), "123456");
        assert!(RequestIndex::parse("").is_err());
        assert!(RequestIndex::parse("  ").is_err());
        assert!(RequestIndex::parse("12/../34").is_err());
        assert!(RequestIndex::parse("..").is_err());
    }

    #[test]
    fn test_response_body_classification() {
        match ResponseBody::classify("{\"status\": \"ok\"}") {
            ResponseBody::Json(value) => assert_eq!(value["status"], "ok"),
            other => panic!("Expected JSON, got {:?}", other),
        }

        assert_eq!(
            ResponseBody::classify("Request 42 is still processing"),
            ResponseBody::Text("Request 42 is still processing".to_string())
        );

        // Leading whitespace does not hide JSON
        assert!(matches!(
            ResponseBody::classify("\n  {\"a\": 1}"),
            ResponseBody::Json(_)
        ));

        // A brace that does not parse is still a message
        assert!(matches!(
            ResponseBody::classify("{not json"),
            ResponseBody::Text(_)
        ));

        // JSON arrays are not the object form the client branches on
        assert!(matches!(ResponseBody::classify("[1, 2]"), ResponseBody::Text(_)));
    }

    #[test]
    fn test_manifest_from_json_keeps_order_and_sizes() {
        let value = json!({
            "https://rda.ucar.edu/data/a/b/file2.nc": "50",
            "https://rda.ucar.edu/data/a/b/file1.nc": 100,
            "https://rda.ucar.edu/data/a/b/file3.nc": "unknown"
        });
        let manifest = FileManifest::from_json(value.as_object().unwrap());

        assert_eq!(manifest.len(), 3);
        let entries = manifest.entries();
        assert_eq!(entries[0].file_name().unwrap(), "file2.nc");
        assert_eq!(entries[0].expected_size, Some(50));
        assert_eq!(entries[1].expected_size, Some(100));
        assert_eq!(entries[2].expected_size, None);
    }

    #[test]
    fn test_manifest_from_text_response_is_server_message() {
        let body = ResponseBody::Text("Request not yet complete".to_string());
        match FileManifest::from_response(body) {
            Err(ApiError::ServerMessage(message)) => {
                assert_eq!(message, "Request not yet complete")
            }
            other => panic!("Expected ServerMessage, got {:?}", other),
        }
    }

    #[test]
    fn test_entry_file_name() {
        let entry = ManifestEntry {
            remote_path: "plainfile.grb".to_string(),
            expected_size: None,
        };
        assert_eq!(entry.file_name().unwrap(), "plainfile.grb");

        let entry = ManifestEntry {
            remote_path: "https://host/dir/".to_string(),
            expected_size: None,
        };
        assert!(matches!(
            entry.file_name(),
            Err(DownloadError::InvalidManifest { .. })
        ));
    }
}
