//! Routing of CLI verbs to RDA REST endpoints
//!
//! Each [`ApiCommand`] maps to exactly one endpoint. Routing validates the
//! positional arguments, so a missing or malformed argument is reported with
//! the expected invocation before any credentials are read or any request is
//! made.

use std::fmt;
use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::debug;
use url::Url;

use crate::app::control_file::ControlFile;
use crate::app::models::{DatasetId, RequestIndex};
use crate::constants::{dataset, files, rda};
use crate::errors::{ApiError, Result, UsageError};

/// Full usage text listing every API verb
pub const USAGE: &str = "\
rdams get_summary <dsnnn.n>
rdams get_metadata <dsnnn.n> [-f]
rdams get_param_summary <dsnnn.n> [-f]
rdams submit [control_file_name]
rdams get_status <RequestIndex> [dsnnn.n]
rdams download [RequestIndex]
rdams globus_download [RequestIndex]
rdams purge [RequestIndex]
rdams get_control_file_template <dsnnn.n>
rdams help";

/// A parsed API verb with its raw positional arguments
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiCommand {
    Summary {
        dsid: Option<String>,
    },
    Metadata {
        dsid: Option<String>,
        formatted: bool,
    },
    ParamSummary {
        dsid: Option<String>,
        formatted: bool,
    },
    Submit {
        control_file: Option<PathBuf>,
    },
    Status {
        request_index: Option<String>,
        dsid: Option<String>,
    },
    Download {
        request_index: Option<String>,
    },
    GlobusDownload {
        request_index: Option<String>,
    },
    ControlFileTemplate {
        dsid: Option<String>,
    },
    Purge {
        request_index: Option<String>,
    },
    Help,
}

impl ApiCommand {
    /// Verb name as typed on the command line
    pub fn verb(&self) -> &'static str {
        match self {
            ApiCommand::Summary { .. } => "get_summary",
            ApiCommand::Metadata { .. } => "get_metadata",
            ApiCommand::ParamSummary { .. } => "get_param_summary",
            ApiCommand::Submit { .. } => "submit",
            ApiCommand::Status { .. } => "get_status",
            ApiCommand::Download { .. } => "download",
            ApiCommand::GlobusDownload { .. } => "globus_download",
            ApiCommand::ControlFileTemplate { .. } => "get_control_file_template",
            ApiCommand::Purge { .. } => "purge",
            ApiCommand::Help => "help",
        }
    }
}

/// HTTP methods used by the API
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Delete,
}

impl From<HttpMethod> for reqwest::Method {
    fn from(method: HttpMethod) -> Self {
        match method {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Post => reqwest::Method::POST,
            HttpMethod::Delete => reqwest::Method::DELETE,
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Delete => "DELETE",
        };
        f.write_str(name)
    }
}

/// One REST call ready to be executed
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: HttpMethod,
    pub url: Url,
    /// JSON body, sent with `Content-Type: application/json`
    pub body: Option<Value>,
}

/// What to do with a successful response
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponseAction {
    /// Print the body to stdout
    Print,
    /// Write the raw body to a control-file template
    WriteTemplate { path: PathBuf },
    /// Parse the body as a file manifest and download into `directory`
    DownloadFiles {
        request_index: RequestIndex,
        directory: PathBuf,
    },
}

/// A routed command: the request, how to handle its response, and an optional banner
#[derive(Debug, Clone, PartialEq)]
pub struct Route {
    pub request: ApiRequest,
    pub action: ResponseAction,
    pub banner: Option<&'static str>,
}

/// Maps API commands to endpoint URLs under a base URL
#[derive(Debug, Clone)]
pub struct Router {
    base_url: Url,
    download_root: PathBuf,
}

impl Router {
    /// Create a router for `base_url`, placing request directories under `download_root`
    pub fn new(mut base_url: Url, download_root: impl Into<PathBuf>) -> Self {
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        Self {
            base_url,
            download_root: download_root.into(),
        }
    }

    /// Validate a command's arguments and build its route
    ///
    /// # Errors
    ///
    /// Returns `UsageError` for missing or invalid arguments and
    /// `ControlFileError` when the submit control file cannot be parsed.
    pub fn route(&self, command: &ApiCommand) -> Result<Route> {
        let route = match command {
            ApiCommand::Summary { dsid } => {
                let mut segments = vec![rda::SUMMARY_PATH.to_string()];
                if let Some(dsid) = dsid {
                    segments.push(DatasetId::parse(dsid)?.to_string());
                }
                self.get(&segments, Some(SUMMARY_BANNER))?
            }
            ApiCommand::Metadata { dsid, formatted } => self.get(
                &dataset_segments(rda::METADATA_PATH, dsid.as_deref(), *formatted, command)?,
                Some(METADATA_BANNER),
            )?,
            ApiCommand::ParamSummary { dsid, formatted } => self.get(
                &dataset_segments(rda::PARAM_SUMMARY_PATH, dsid.as_deref(), *formatted, command)?,
                Some(PARAM_SUMMARY_BANNER),
            )?,
            ApiCommand::Submit { control_file } => {
                let path = control_file
                    .as_deref()
                    .ok_or_else(|| missing_argument("rdams submit [control_file_name]"))?;
                let control = ControlFile::load(path)?;
                Route {
                    request: ApiRequest {
                        method: HttpMethod::Post,
                        url: self.endpoint(&[rda::REQUEST_PATH.to_string()])?,
                        body: Some(control.to_json()),
                    },
                    action: ResponseAction::Print,
                    banner: Some(SUBMIT_BANNER),
                }
            }
            ApiCommand::Status {
                request_index,
                dsid,
            } => {
                let mut segments = vec![rda::REQUEST_PATH.to_string()];
                match (request_index, dsid) {
                    (Some(index), dsid) => {
                        segments.push(RequestIndex::parse(index)?.to_string());
                        if let Some(dsid) = dsid {
                            segments.push(DatasetId::parse(dsid)?.to_string());
                        }
                    }
                    (None, Some(_)) => {
                        return Err(missing_argument("rdams get_status <RequestIndex> [dsnnn.n]"))
                    }
                    (None, None) => {}
                }
                self.get(&segments, None)?
            }
            ApiCommand::Download { request_index } => {
                let index = required_index(request_index, "rdams download [RequestIndex]")?;
                let directory = self.request_directory(&index);
                Route {
                    request: ApiRequest {
                        method: HttpMethod::Get,
                        url: self.endpoint(&[
                            rda::REQUEST_PATH.to_string(),
                            index.to_string(),
                            rda::FILELIST_SUFFIX.to_string(),
                        ])?,
                        body: None,
                    },
                    action: ResponseAction::DownloadFiles {
                        request_index: index,
                        directory,
                    },
                    banner: None,
                }
            }
            ApiCommand::GlobusDownload { request_index } => {
                let index =
                    required_index(request_index, "rdams globus_download [RequestIndex]")?;
                self.get(
                    &[
                        rda::REQUEST_PATH.to_string(),
                        index.to_string(),
                        rda::GLOBUS_SUFFIX.to_string(),
                    ],
                    None,
                )?
            }
            ApiCommand::ControlFileTemplate { dsid } => {
                let mut segments = vec![rda::TEMPLATE_PATH.to_string()];
                let name = match dsid {
                    Some(dsid) => {
                        let dsid = DatasetId::parse(dsid)?;
                        segments.push(dsid.to_string());
                        dsid.to_string()
                    }
                    None => dataset::PLACEHOLDER.to_string(),
                };
                Route {
                    request: ApiRequest {
                        method: HttpMethod::Get,
                        url: self.endpoint(&segments)?,
                        body: None,
                    },
                    action: ResponseAction::WriteTemplate {
                        path: template_path(&name),
                    },
                    banner: None,
                }
            }
            ApiCommand::Purge { request_index } => {
                let index = required_index(request_index, "rdams purge [RequestIndex]")?;
                Route {
                    request: ApiRequest {
                        method: HttpMethod::Delete,
                        url: self.endpoint(&[rda::REQUEST_PATH.to_string(), index.to_string()])?,
                        body: None,
                    },
                    action: ResponseAction::Print,
                    banner: None,
                }
            }
            ApiCommand::Help => self.get(&[rda::HELP_PATH.to_string()], None)?,
        };

        debug!(
            "Routed {} to {} {}",
            command.verb(),
            route.request.method,
            route.request.url
        );
        Ok(route)
    }

    /// Directory a request's files are downloaded into
    pub fn request_directory(&self, index: &RequestIndex) -> PathBuf {
        self.download_root
            .join(format!("{}{}", files::REQUEST_DIR_PREFIX, index))
    }

    fn get(&self, segments: &[String], banner: Option<&'static str>) -> Result<Route> {
        Ok(Route {
            request: ApiRequest {
                method: HttpMethod::Get,
                url: self.endpoint(segments)?,
                body: None,
            },
            action: ResponseAction::Print,
            banner,
        })
    }

    fn endpoint(&self, segments: &[String]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ApiError::InvalidUrl {
                url: self.base_url.to_string(),
                error: "base URL cannot have path segments".to_string(),
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }
}

const SUMMARY_BANNER: &str = "Getting summary information.  Please wait as this may take awhile.";
const METADATA_BANNER: &str = "Getting metadata.  Please wait as this may take awhile.";
const PARAM_SUMMARY_BANNER: &str =
    "Getting parameter summary.  Please wait as this may take awhile.";
const SUBMIT_BANNER: &str = "Submitting request.  Please wait as this may take awhile.";

fn missing_argument(usage: &str) -> crate::errors::AppError {
    UsageError::MissingArgument {
        usage: usage.to_string(),
    }
    .into()
}

fn required_index(index: &Option<String>, usage: &str) -> Result<RequestIndex> {
    let index = index.as_deref().ok_or_else(|| missing_argument(usage))?;
    Ok(RequestIndex::parse(index)?)
}

/// `<root>[/<dsid>[/formatted]]`; `formatted` needs a dataset id
fn dataset_segments(
    root: &str,
    dsid: Option<&str>,
    formatted: bool,
    command: &ApiCommand,
) -> Result<Vec<String>> {
    let mut segments = vec![root.to_string()];
    match dsid {
        Some(dsid) => {
            segments.push(DatasetId::parse(dsid)?.to_string());
            if formatted {
                segments.push(rda::FORMATTED_SUFFIX.to_string());
            }
        }
        None if formatted => {
            return Err(missing_argument(&format!(
                "rdams {} <dsnnn.n> -f",
                command.verb()
            )))
        }
        None => {}
    }
    Ok(segments)
}

fn template_path(name: &str) -> PathBuf {
    Path::new(".").join(format!("{}{}", name, files::CONTROL_FILE_SUFFIX))
}
