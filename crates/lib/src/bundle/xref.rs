//! Pkginfo to payload cross-referencing.

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::record::{RecordError, RecordReader};

/// Paths resolved for one selected pkginfo, with independent existence checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrossReference {
  pub pkginfo: PathBuf,
  /// Installer payload; equal to `pkginfo` for `nopkg` installs.
  pub payload: PathBuf,
  pub nopkg: bool,
  pub pkginfo_exists: bool,
  pub payload_exists: bool,
}

#[derive(Debug, Error)]
pub enum CrossRefError {
  #[error(transparent)]
  Record(RecordError),

  /// The pkginfo is not `nopkg` and names no payload.
  #[error("pkginfo '{}' has no installer_item_location", .0.display())]
  NoInstallerLocation(PathBuf),
}

/// Resolve the payload for `file_name` in `dir`.
///
/// A `nopkg` record stands in as its own payload so every bundle is a pair of
/// files. Otherwise the payload is `installer_item_location` under `pkgs_dir`.
pub fn cross_reference(
  reader: &dyn RecordReader,
  pkgs_dir: &Path,
  dir: &Path,
  file_name: &str,
) -> Result<CrossReference, CrossRefError> {
  let pkginfo = dir.join(file_name);
  let record = reader.read_pkginfo(&pkginfo).map_err(CrossRefError::Record)?;

  let nopkg = record.is_nopkg();
  let payload = if nopkg {
    pkginfo.clone()
  } else {
    let location = record
      .installer_item_location
      .as_deref()
      .ok_or_else(|| CrossRefError::NoInstallerLocation(pkginfo.clone()))?;
    pkgs_dir.join(location)
  };

  Ok(CrossReference {
    pkginfo_exists: pkginfo.is_file(),
    payload_exists: payload.is_file(),
    pkginfo,
    payload,
    nopkg,
  })
}
