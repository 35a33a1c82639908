//! Submission of bundles to a remote package server.
//!
//! A bundle is posted as one `multipart/form-data` request with two file
//! parts, `package_file` (the payload) and `pkginfo_file` (the pkginfo). The
//! response status code is the only thing the server reports back.

use std::io;
use std::path::{Path, PathBuf};

use reqwest::blocking::Client;
use reqwest::blocking::multipart::Form;
use thiserror::Error;
use tracing::{debug, info};

use crate::options::UploadConfig;

/// Multipart field carrying the payload.
pub const PACKAGE_FIELD: &str = "package_file";

/// Multipart field carrying the pkginfo.
pub const PKGINFO_FIELD: &str = "pkginfo_file";

#[derive(Debug, Error)]
pub enum UploadError {
  /// The HTTP client could not be constructed.
  #[error("failed to create HTTP client: {0}")]
  Client(#[source] reqwest::Error),

  /// A file to upload could not be opened.
  #[error("failed to open '{}' for upload: {source}", path.display())]
  OpenFile {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  /// The request did not produce a response.
  #[error("upload to '{endpoint}' failed: {source}")]
  Request {
    endpoint: String,
    #[source]
    source: reqwest::Error,
  },
}

/// Capability for submitting a payload/pkginfo pair.
pub trait Uploader {
  /// Submit both files and return the server's HTTP status code.
  fn upload(&self, payload: &Path, pkginfo: &Path) -> Result<u16, UploadError>;
}

/// Uploads over HTTP with a blocking client.
pub struct HttpUploader {
  client: Client,
  endpoint: String,
}

impl HttpUploader {
  pub fn new(config: &UploadConfig) -> Result<Self, UploadError> {
    let client = Client::builder()
      .user_agent(&config.user_agent)
      .timeout(config.timeout)
      .build()
      .map_err(UploadError::Client)?;

    Ok(Self {
      client,
      endpoint: config.endpoint.clone(),
    })
  }
}

impl Uploader for HttpUploader {
  fn upload(&self, payload: &Path, pkginfo: &Path) -> Result<u16, UploadError> {
    let form = Form::new()
      .file(PACKAGE_FIELD, payload)
      .map_err(|source| open_error(payload, source))?
      .file(PKGINFO_FIELD, pkginfo)
      .map_err(|source| open_error(pkginfo, source))?;

    debug!(
      endpoint = %self.endpoint,
      payload = %payload.display(),
      pkginfo = %pkginfo.display(),
      "uploading bundle"
    );

    let response = self
      .client
      .post(&self.endpoint)
      .multipart(form)
      .send()
      .map_err(|source| UploadError::Request {
        endpoint: self.endpoint.clone(),
        source,
      })?;

    let status = response.status().as_u16();
    info!(endpoint = %self.endpoint, status, "upload finished");
    Ok(status)
  }
}

fn open_error(path: &Path, source: io::Error) -> UploadError {
  UploadError::OpenFile {
    path: path.to_path_buf(),
    source,
  }
}
