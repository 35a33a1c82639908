//! Turning requested items into payload/pkginfo bundles.
//!
//! [`Bundler`] scans the pkginfo tree once, selects at most one pkginfo per
//! item per directory, resolves each selection to its payload, and optionally
//! uploads the pair. Per-item problems never stop the run; they are collected
//! as [`BundleIssue`]s on the [`BundleReport`].

mod xref;

pub use xref::{CrossRefError, CrossReference, cross_reference};

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::item::ItemName;
use crate::layout::RepoLayout;
use crate::manifest::{ManifestError, Resolution, resolve_manifest};
use crate::options::BundleOptions;
use crate::record::{RecordError, RecordReader};
use crate::scan::{MetadataScan, ScanError, Selection};
use crate::upload::{UploadError, Uploader};

/// Errors that abort a run.
#[derive(Debug, Error)]
pub enum BundleError {
  #[error(transparent)]
  Manifest(#[from] ManifestError),

  #[error(transparent)]
  Scan(#[from] ScanError),
}

/// Per-item problems. The affected item may still produce a bundle.
#[derive(Debug, Error)]
pub enum BundleIssue {
  #[error("{item}: pkginfo not found: {}", path.display())]
  PkginfoMissing { item: String, path: PathBuf },

  #[error("{item}: payload not found: {}", path.display())]
  PayloadMissing { item: String, path: PathBuf },

  #[error("{item}: failed to read pkginfo '{}': {source}", path.display())]
  UnreadablePkginfo {
    item: String,
    path: PathBuf,
    #[source]
    source: RecordError,
  },

  #[error("{item}: pkginfo '{}' has no installer_item_location", path.display())]
  MissingInstallerLocation { item: String, path: PathBuf },

  #[error("{item}: no candidate in '{}' has version {pin}", dir.display())]
  PinUnmatched { item: String, pin: String, dir: PathBuf },

  #[error("{item}: upload rejected with HTTP {status}")]
  UploadRejected { item: String, status: u16 },

  #[error("{item}: {source}")]
  UploadFailed {
    item: String,
    #[source]
    source: UploadError,
  },
}

/// A selected pkginfo and the payload it installs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Bundle {
  /// The identifier as requested by the manifest.
  pub item: String,
  pub version: String,
  pub pkginfo: PathBuf,
  pub payload: PathBuf,
  pub nopkg: bool,
  pub pkginfo_exists: bool,
  pub payload_exists: bool,
}

impl Bundle {
  pub fn is_complete(&self) -> bool {
    self.pkginfo_exists && self.payload_exists
  }
}

/// Status returned for one upload attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UploadRecord {
  pub item: String,
  pub payload: PathBuf,
  pub status: u16,
}

impl UploadRecord {
  pub fn is_success(&self) -> bool {
    (200..300).contains(&self.status)
  }
}

#[derive(Debug, Default)]
pub struct BundleReport {
  pub bundles: Vec<Bundle>,
  pub uploads: Vec<UploadRecord>,
  pub issues: Vec<BundleIssue>,
}

impl BundleReport {
  fn note(&mut self, issue: BundleIssue) {
    warn!("{}", issue);
    self.issues.push(issue);
  }
}

/// Everything produced by [`bundle_manifest`].
#[derive(Debug)]
pub struct BundleRun {
  pub resolution: Resolution,
  pub report: BundleReport,
}

pub struct Bundler<'a> {
  reader: &'a dyn RecordReader,
  options: &'a BundleOptions,
  uploader: Option<&'a dyn Uploader>,
}

impl<'a> Bundler<'a> {
  pub fn new(reader: &'a dyn RecordReader, options: &'a BundleOptions) -> Self {
    Self {
      reader,
      options,
      uploader: None,
    }
  }

  /// Upload every bundle through `uploader` as it is produced.
  pub fn with_uploader(mut self, uploader: &'a dyn Uploader) -> Self {
    self.uploader = Some(uploader);
    self
  }

  /// Bundle `identifiers` against the repository at `layout`.
  ///
  /// Repeated identifiers are bundled once. Bundles are ordered by pkginfo
  /// directory, then by first request.
  ///
  /// # Errors
  ///
  /// Fails only when the pkginfo tree cannot be scanned.
  pub fn bundle(&self, layout: &RepoLayout, identifiers: &[String]) -> Result<BundleReport, BundleError> {
    let items = requested_items(identifiers);
    let scan = MetadataScan::scan(&absolute(&layout.pkgsinfo))?;
    let pkgs = absolute(&layout.pkgs);
    debug!(items = items.len(), files = scan.file_count(), "selecting pkginfo candidates");

    let mut report = BundleReport::default();
    for found in scan.select_all(&items, self.options.pin_policy) {
      let item = found.item.to_string();
      match found.selection {
        Selection::Selected { file, version } => {
          self.bundle_selected(&mut report, &pkgs, found.dir, item, file, version);
        }
        Selection::PinSuppressed { file } => {
          warn!(
            item = %item,
            file,
            dir = %found.dir.display(),
            "pinned item has a single candidate; skipping"
          );
        }
        Selection::PinUnmatched => report.note(BundleIssue::PinUnmatched {
          pin: found.item.pin.clone().unwrap_or_default(),
          dir: found.dir.to_path_buf(),
          item,
        }),
        Selection::NoWinner => {
          warn!(item = %item, dir = %found.dir.display(), "no candidate version above baseline; skipping");
        }
        Selection::NoCandidates => {}
      }
    }

    info!(
      bundles = report.bundles.len(),
      uploads = report.uploads.len(),
      issues = report.issues.len(),
      "bundling finished"
    );
    Ok(report)
  }

  fn bundle_selected(
    &self,
    report: &mut BundleReport,
    pkgs: &Path,
    dir: &Path,
    item: String,
    file: &str,
    version: String,
  ) {
    let xref = match cross_reference(self.reader, pkgs, dir, file) {
      Ok(xref) => xref,
      Err(CrossRefError::Record(RecordError::NotFound(path))) => {
        return report.note(BundleIssue::PkginfoMissing { item, path });
      }
      Err(CrossRefError::Record(source)) => {
        return report.note(BundleIssue::UnreadablePkginfo {
          item,
          path: dir.join(file),
          source,
        });
      }
      Err(CrossRefError::NoInstallerLocation(path)) => {
        return report.note(BundleIssue::MissingInstallerLocation { item, path });
      }
    };

    if !xref.pkginfo_exists {
      report.note(BundleIssue::PkginfoMissing {
        item: item.clone(),
        path: xref.pkginfo.clone(),
      });
    }
    if !xref.nopkg && !xref.payload_exists {
      report.note(BundleIssue::PayloadMissing {
        item: item.clone(),
        path: xref.payload.clone(),
      });
    }

    debug!(
      item = %item,
      version = %version,
      pkginfo = %xref.pkginfo.display(),
      payload = %xref.payload.display(),
      "bundle selected"
    );
    let bundle = Bundle {
      item,
      version,
      pkginfo: xref.pkginfo,
      payload: xref.payload,
      nopkg: xref.nopkg,
      pkginfo_exists: xref.pkginfo_exists,
      payload_exists: xref.payload_exists,
    };

    if let Some(uploader) = self.uploader {
      self.upload(uploader, report, &bundle);
    }
    report.bundles.push(bundle);
  }

  fn upload(&self, uploader: &dyn Uploader, report: &mut BundleReport, bundle: &Bundle) {
    if self.options.skip_missing_uploads && !bundle.is_complete() {
      info!(item = %bundle.item, "skipping upload of incomplete bundle");
      return;
    }

    match uploader.upload(&bundle.payload, &bundle.pkginfo) {
      Ok(status) => {
        let record = UploadRecord {
          item: bundle.item.clone(),
          payload: bundle.payload.clone(),
          status,
        };
        if !record.is_success() {
          report.note(BundleIssue::UploadRejected {
            item: bundle.item.clone(),
            status,
          });
        }
        report.uploads.push(record);
      }
      Err(source) => report.note(BundleIssue::UploadFailed {
        item: bundle.item.clone(),
        source,
      }),
    }
  }
}

/// Resolve `manifest` and bundle everything it requests.
///
/// # Errors
///
/// Returns [`BundleError`] if the root manifest cannot be resolved or the
/// pkginfo tree cannot be scanned.
pub fn bundle_manifest(
  manifest: &Path,
  layout: &RepoLayout,
  options: &BundleOptions,
  reader: &dyn RecordReader,
  uploader: Option<&dyn Uploader>,
) -> Result<BundleRun, BundleError> {
  let resolution = resolve_manifest(manifest, &options.resolve, reader)?;

  let mut bundler = Bundler::new(reader, options);
  if let Some(uploader) = uploader {
    bundler = bundler.with_uploader(uploader);
  }
  let report = bundler.bundle(layout, &resolution.items)?;

  Ok(BundleRun { resolution, report })
}

/// Parse identifiers, keeping the first occurrence of each.
fn requested_items(identifiers: &[String]) -> Vec<ItemName> {
  let mut seen = HashSet::new();
  identifiers
    .iter()
    .filter(|id| seen.insert(id.as_str()))
    .map(|id| ItemName::parse(id))
    .collect()
}

fn absolute(path: &Path) -> PathBuf {
  dunce::canonicalize(path)
    .or_else(|_| std::path::absolute(path))
    .unwrap_or_else(|_| path.to_path_buf())
}
