//! Explicit run configuration.
//!
//! Every option is carried in a [`BundleOptions`] value passed down the call
//! chain; nothing is read from process-wide state.

use std::time::Duration;

use crate::consts::APP_NAME;

/// Toggles for manifest flattening.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResolveOptions {
  /// Append each manifest's `optional_installs`.
  pub process_optional: bool,
  /// Recurse into `included_manifests`.
  pub process_nested: bool,
}

/// How an explicit version pin in a requested item affects selection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PinPolicy {
  /// Pins only matter when a directory has exactly one candidate, in which case
  /// nothing is selected. With several candidates the highest version wins and
  /// the pin is ignored.
  #[default]
  Legacy,
  /// Only candidates whose version equals the pin are eligible.
  Exact,
}

/// Remote package server settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadConfig {
  pub endpoint: String,
  pub timeout: Duration,
  pub user_agent: String,
}

impl UploadConfig {
  pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

  pub fn new(endpoint: impl Into<String>) -> Self {
    Self {
      endpoint: endpoint.into(),
      timeout: Self::DEFAULT_TIMEOUT,
      user_agent: format!("{}/{}", APP_NAME, env!("CARGO_PKG_VERSION")),
    }
  }

  pub fn with_timeout(mut self, timeout: Duration) -> Self {
    self.timeout = timeout;
    self
  }
}

/// Complete configuration for one bundling run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BundleOptions {
  pub resolve: ResolveOptions,
  pub pin_policy: PinPolicy,
  /// Upload every bundle when set.
  pub upload: Option<UploadConfig>,
  /// Skip the upload of a bundle whose pkginfo or payload is missing on disk.
  /// Off by default: missing files are reported and the upload is still attempted.
  pub skip_missing_uploads: bool,
}
