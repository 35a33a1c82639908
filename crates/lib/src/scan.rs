//! Candidate discovery and version selection over the pkginfo tree.
//!
//! The tree is walked once into a [`MetadataScan`] snapshot. For each
//! directory and requested item, every file named `<name>-...` is a candidate,
//! and [`select`] picks at most one of them.
//!
//! # Selection
//!
//! | candidates | pin     | [`PinPolicy::Legacy`]         | [`PinPolicy::Exact`]              |
//! |------------|---------|-------------------------------|-----------------------------------|
//! | 0          | any     | nothing                       | nothing                           |
//! | 1          | none    | the candidate                 | the candidate                     |
//! | 1          | present | nothing                       | the candidate if its version == pin |
//! | 2+         | none    | highest version               | highest version                   |
//! | 2+         | present | highest version, pin ignored  | first candidate whose version == pin |
//!
//! "Highest" is a running maximum seeded with [`BASELINE_VERSION`] that only
//! moves on a strictly greater version, so the first of several equal
//! versions wins and a set with nothing above the baseline selects nothing.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::consts::BASELINE_VERSION;
use crate::item::ItemName;
use crate::options::PinPolicy;
use crate::version::PkgVersion;

#[derive(Debug, Error)]
pub enum ScanError {
  /// The pkginfo root does not exist or is not a directory.
  #[error("pkginfo directory not found: {}", .0.display())]
  MissingRoot(PathBuf),

  /// The root itself could not be listed.
  #[error("failed to read pkginfo directory '{}': {source}", path.display())]
  Walk {
    path: PathBuf,
    #[source]
    source: walkdir::Error,
  },
}

/// Split a file stem into name and version using the repository convention.
///
/// `--` is tried before `-`; the split happens at the last occurrence and only
/// when the remainder starts with a digit. `Firefox-120.0` gives
/// `("Firefox", "120.0")`, `Office--2019-16.0` gives `("Office", "2019-16.0")`,
/// and `Firefox` gives `("Firefox", "")`.
pub fn split_name_version(stem: &str) -> (&str, &str) {
  for delim in ["--", "-"] {
    if let Some(idx) = stem.rfind(delim) {
      let version = &stem[idx + delim.len()..];
      if version.starts_with(|c: char| c.is_ascii_digit()) {
        return (&stem[..idx], version);
      }
    }
  }
  (stem, "")
}

/// Version encoded in a candidate file name, extension removed.
pub fn candidate_version(file_name: &str) -> &str {
  let stem = Path::new(file_name)
    .file_stem()
    .and_then(|s| s.to_str())
    .unwrap_or(file_name);
  split_name_version(stem).1
}

/// Files in `files` that are candidates for `item`, in listing order.
pub fn candidates<'a>(files: &'a [String], item: &ItemName) -> Vec<&'a str> {
  let prefix = item.candidate_prefix();
  files
    .iter()
    .filter(|f| f.starts_with(&prefix))
    .map(String::as_str)
    .collect()
}

/// Outcome of selecting among one directory's candidates for one item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection<'a> {
  Selected { file: &'a str, version: String },
  /// No file in the directory starts with the item's prefix.
  NoCandidates,
  /// A single candidate was skipped because the item carries a pin.
  PinSuppressed { file: &'a str },
  /// Candidates exist but none has the pinned version.
  PinUnmatched,
  /// Several candidates, none above the baseline version.
  NoWinner,
}

/// Choose at most one candidate for `item`.
pub fn select<'a>(candidates: &[&'a str], item: &ItemName, policy: PinPolicy) -> Selection<'a> {
  match (candidates, item.pin.as_deref(), policy) {
    ([], _, _) => Selection::NoCandidates,
    ([only], None, _) => Selection::Selected {
      file: *only,
      version: candidate_version(only).to_string(),
    },
    ([only], Some(_), PinPolicy::Legacy) => Selection::PinSuppressed { file: *only },
    (_, None, _) | (_, Some(_), PinPolicy::Legacy) => highest(candidates),
    (_, Some(pin), PinPolicy::Exact) => {
      let pin = PkgVersion::parse(pin);
      candidates
        .iter()
        .find(|f| PkgVersion::parse(candidate_version(f)) == pin)
        .map_or(Selection::PinUnmatched, |&file| Selection::Selected {
          file,
          version: candidate_version(file).to_string(),
        })
    }
  }
}

fn highest<'a>(candidates: &[&'a str]) -> Selection<'a> {
  let mut running = PkgVersion::parse(BASELINE_VERSION);
  let mut best = None;

  for &file in candidates {
    let version = PkgVersion::parse(candidate_version(file));
    if version > running {
      running = version;
      best = Some(file);
    }
  }

  match best {
    Some(file) => Selection::Selected {
      file,
      version: running.as_str().to_string(),
    },
    None => Selection::NoWinner,
  }
}

/// One directory of the pkginfo tree and the file names directly inside it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScannedDir {
  pub path: PathBuf,
  pub files: Vec<String>,
}

/// A non-empty selection outcome for one item in one directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirSelection<'a> {
  pub dir: &'a Path,
  pub item: &'a ItemName,
  pub selection: Selection<'a>,
}

/// Snapshot of the pkginfo tree taken by a single walk.
#[derive(Debug, Clone, Default)]
pub struct MetadataScan {
  pub dirs: Vec<ScannedDir>,
}

impl MetadataScan {
  /// Walk `root` once, recording every directory and the files it holds.
  ///
  /// Entries are visited in file-name order. Unreadable subdirectories are
  /// logged and skipped; only an unusable root is an error.
  pub fn scan(root: &Path) -> Result<Self, ScanError> {
    if !root.is_dir() {
      return Err(ScanError::MissingRoot(root.to_path_buf()));
    }

    let mut dirs: Vec<ScannedDir> = Vec::new();
    let mut index: HashMap<PathBuf, usize> = HashMap::new();

    for entry in WalkDir::new(root).sort_by_file_name() {
      let entry = match entry {
        Ok(entry) => entry,
        Err(e) if e.depth() == 0 => {
          return Err(ScanError::Walk {
            path: root.to_path_buf(),
            source: e,
          });
        }
        Err(e) => {
          warn!(error = %e, "skipping unreadable pkginfo entry");
          continue;
        }
      };

      if entry.file_type().is_dir() {
        index.insert(entry.path().to_path_buf(), dirs.len());
        dirs.push(ScannedDir {
          path: entry.path().to_path_buf(),
          files: Vec::new(),
        });
        continue;
      }

      if !entry.path().is_file() {
        continue;
      }
      let Some(name) = entry.file_name().to_str() else {
        debug!(path = %entry.path().display(), "skipping non UTF-8 file name");
        continue;
      };
      if let Some(&i) = entry.path().parent().and_then(|parent| index.get(parent)) {
        dirs[i].files.push(name.to_string());
      }
    }

    debug!(root = %root.display(), dirs = dirs.len(), "scanned pkginfo tree");
    Ok(Self { dirs })
  }

  /// Snapshot from already-known directory listings.
  pub fn from_dirs(dirs: Vec<ScannedDir>) -> Self {
    Self { dirs }
  }

  pub fn file_count(&self) -> usize {
    self.dirs.iter().map(|d| d.files.len()).sum()
  }

  /// Run [`select`] for every directory and item, directory-major.
  ///
  /// Pairs without candidates are omitted.
  pub fn select_all<'a>(&'a self, items: &'a [ItemName], policy: PinPolicy) -> Vec<DirSelection<'a>> {
    let mut out = Vec::new();
    for dir in &self.dirs {
      for item in items {
        let found = candidates(&dir.files, item);
        let selection = select(&found, item, policy);
        if selection != Selection::NoCandidates {
          out.push(DirSelection {
            dir: &dir.path,
            item,
            selection,
          });
        }
      }
    }
    out
  }
}
