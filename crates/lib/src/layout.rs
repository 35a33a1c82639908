//! Repository directory layout.
//!
//! A repository is a root directory with `manifests/`, `pkgsinfo/` and `pkgs/`
//! beneath it. The root is normally found by walking a manifest's path up to
//! its first `manifests` segment.

use std::path::{Component, Path, PathBuf};

use thiserror::Error;

use crate::consts::{MANIFESTS_DIR, PKGS_DIR, PKGSINFO_DIR};

#[derive(Debug, Error)]
pub enum LayoutError {
  /// The manifest path has no `manifests` segment to anchor the repository root.
  #[error("cannot locate repository root: '{0}' is not inside a '{MANIFESTS_DIR}' directory")]
  NoManifestsDir(PathBuf),
}

/// Absolute or relative locations of the repository directories.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoLayout {
  pub root: PathBuf,
  pub pkgsinfo: PathBuf,
  pub pkgs: PathBuf,
}

impl RepoLayout {
  /// Layout rooted at `root`.
  pub fn new(root: impl Into<PathBuf>) -> Self {
    let root = root.into();
    Self {
      pkgsinfo: root.join(PKGSINFO_DIR),
      pkgs: root.join(PKGS_DIR),
      root,
    }
  }

  /// Derive the layout from a manifest path.
  ///
  /// The root is everything in the manifest's directory before the first
  /// component named exactly `manifests`. `repo/manifests/site/lab` yields
  /// `repo`; `repo/my-manifests/lab` is rejected.
  pub fn from_manifest_path(manifest: &Path) -> Result<Self, LayoutError> {
    let dir = manifest.parent().unwrap_or(Path::new(""));

    let mut root = PathBuf::new();
    for component in dir.components() {
      if matches!(component, Component::Normal(name) if name == MANIFESTS_DIR) {
        if root.as_os_str().is_empty() {
          root.push(".");
        }
        return Ok(Self::new(root));
      }
      root.push(component);
    }

    Err(LayoutError::NoManifestsDir(manifest.to_path_buf()))
  }
}
