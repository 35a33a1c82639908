//! Shared fixtures for library integration tests.

use std::fs;
use std::path::{Path, PathBuf};

use pkgbundle_lib::layout::RepoLayout;
use pkgbundle_lib::record::{ManifestRecord, PkginfoRecord};
use tempfile::TempDir;

/// A throwaway repository with `manifests`, `pkgsinfo` and `pkgs` directories.
pub struct RepoFixture {
  _temp: TempDir,
  pub root: PathBuf,
}

impl RepoFixture {
  pub fn new() -> Self {
    let temp = TempDir::new().unwrap();
    let root = dunce::canonicalize(temp.path()).unwrap();
    for dir in ["manifests", "pkgsinfo", "pkgs"] {
      fs::create_dir_all(root.join(dir)).unwrap();
    }
    Self { _temp: temp, root }
  }

  pub fn layout(&self) -> RepoLayout {
    RepoLayout::new(&self.root)
  }

  pub fn manifest_path(&self, name: &str) -> PathBuf {
    self.root.join("manifests").join(name)
  }

  /// Write a manifest under `manifests/`.
  pub fn manifest(&self, name: &str, managed: Option<&[&str]>, optional: Option<&[&str]>, included: &[&str]) -> PathBuf {
    let record = ManifestRecord {
      managed_installs: managed.map(strings),
      optional_installs: optional.map(strings),
      included_manifests: (!included.is_empty()).then(|| strings(included)),
    };
    let path = self.manifest_path(name);
    write_plist(&path, &record);
    path
  }

  /// Write a pkginfo under `pkgsinfo/` that points at `location` under `pkgs/`.
  pub fn pkginfo(&self, rel: &str, location: &str) -> PathBuf {
    let record = PkginfoRecord {
      installer_item_location: Some(location.to_string()),
      installer_type: None,
    };
    let path = self.root.join("pkgsinfo").join(rel);
    write_plist(&path, &record);
    path
  }

  pub fn nopkg(&self, rel: &str) -> PathBuf {
    let record = PkginfoRecord {
      installer_item_location: None,
      installer_type: Some("nopkg".to_string()),
    };
    let path = self.root.join("pkgsinfo").join(rel);
    write_plist(&path, &record);
    path
  }

  pub fn payload(&self, rel: &str) -> PathBuf {
    let path = self.root.join("pkgs").join(rel);
    write_file(&path, b"payload");
    path
  }

  /// Write arbitrary bytes relative to the repository root.
  pub fn raw(&self, rel: &str, contents: &str) -> PathBuf {
    let path = self.root.join(rel);
    write_file(&path, contents.as_bytes());
    path
  }
}

fn strings(values: &[&str]) -> Vec<String> {
  values.iter().map(|s| s.to_string()).collect()
}

fn write_plist<T: serde::Serialize>(path: &Path, value: &T) {
  fs::create_dir_all(path.parent().unwrap()).unwrap();
  plist::to_file_xml(path, value).unwrap();
}

fn write_file(path: &Path, contents: &[u8]) {
  fs::create_dir_all(path.parent().unwrap()).unwrap();
  fs::write(path, contents).unwrap();
}
