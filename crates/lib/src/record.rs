//! Structured record access for manifests and pkginfo files.
//!
//! The bundler never parses the repository's file format directly; it reads
//! typed records through the [`RecordReader`] capability. [`PlistReader`] is the
//! production implementation for property-list repositories and
//! [`MemoryReader`] serves fixed records from memory.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::trace;

/// The keys of a manifest consumed by the resolver.
///
/// Every list is optional so callers can tell an absent key from an empty one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestRecord {
  #[serde(skip_serializing_if = "Option::is_none")]
  pub managed_installs: Option<Vec<String>>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub optional_installs: Option<Vec<String>>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub included_manifests: Option<Vec<String>>,
}

/// The keys of a pkginfo record consumed by the cross-referencer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PkginfoRecord {
  /// Payload path relative to the repository's `pkgs` directory.
  #[serde(skip_serializing_if = "Option::is_none")]
  pub installer_item_location: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub installer_type: Option<String>,
}

impl PkginfoRecord {
  /// Whether this record describes an install without a payload.
  pub fn is_nopkg(&self) -> bool {
    self.installer_type.as_deref() == Some(crate::consts::NOPKG_INSTALLER_TYPE)
  }
}

/// Errors returned when a record cannot be produced.
#[derive(Debug, Error)]
pub enum RecordError {
  /// No record exists at the path.
  #[error("record not found: {}", .0.display())]
  NotFound(PathBuf),

  /// The file exists but is not a readable record.
  #[error("malformed record '{}': {message}", path.display())]
  Malformed { path: PathBuf, message: String },
}

/// Capability for reading structured records from a path.
pub trait RecordReader {
  /// Read the manifest record stored at `path`.
  fn read_manifest(&self, path: &Path) -> Result<ManifestRecord, RecordError>;

  /// Read the pkginfo record stored at `path`.
  fn read_pkginfo(&self, path: &Path) -> Result<PkginfoRecord, RecordError>;
}

/// Reads records from property-list files (XML or binary).
#[derive(Debug, Clone, Copy, Default)]
pub struct PlistReader;

impl PlistReader {
  fn read<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, RecordError> {
    if !path.is_file() {
      return Err(RecordError::NotFound(path.to_path_buf()));
    }
    trace!(path = %path.display(), "reading plist");
    plist::from_file(path).map_err(|e| RecordError::Malformed {
      path: path.to_path_buf(),
      message: e.to_string(),
    })
  }
}

impl RecordReader for PlistReader {
  fn read_manifest(&self, path: &Path) -> Result<ManifestRecord, RecordError> {
    Self::read(path)
  }

  fn read_pkginfo(&self, path: &Path) -> Result<PkginfoRecord, RecordError> {
    Self::read(path)
  }
}

/// Serves records from memory, keyed by exact path.
#[derive(Debug, Clone, Default)]
pub struct MemoryReader {
  manifests: HashMap<PathBuf, ManifestRecord>,
  pkginfos: HashMap<PathBuf, PkginfoRecord>,
}

impl MemoryReader {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn with_manifest(mut self, path: impl Into<PathBuf>, record: ManifestRecord) -> Self {
    self.manifests.insert(path.into(), record);
    self
  }

  pub fn with_pkginfo(mut self, path: impl Into<PathBuf>, record: PkginfoRecord) -> Self {
    self.pkginfos.insert(path.into(), record);
    self
  }
}

impl RecordReader for MemoryReader {
  fn read_manifest(&self, path: &Path) -> Result<ManifestRecord, RecordError> {
    self
      .manifests
      .get(path)
      .cloned()
      .ok_or_else(|| RecordError::NotFound(path.to_path_buf()))
  }

  fn read_pkginfo(&self, path: &Path) -> Result<PkginfoRecord, RecordError> {
    self
      .pkginfos
      .get(path)
      .cloned()
      .ok_or_else(|| RecordError::NotFound(path.to_path_buf()))
  }
}
