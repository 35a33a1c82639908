//! Manifest flattening.
//!
//! A manifest names the items to install and may include other manifests.
//! [`resolve_manifest`] flattens a manifest tree into one ordered list of
//! requested item identifiers:
//!
//! 1. the manifest's `managed_installs`
//! 2. its `optional_installs`, when optional processing is on
//! 3. the flattened list of each `included_manifests` entry in listed order,
//!    when nested processing is on
//!
//! Included manifests resolve relative to the directory of the manifest that
//! lists them. A failure in an included manifest is collected as a diagnostic
//! and only drops that branch; a failure in the root manifest is returned as
//! an error.

mod graph;

use std::path::{Component, Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info, warn};

pub use graph::ManifestGraph;

use crate::options::ResolveOptions;
use crate::record::{RecordError, RecordReader};

/// Errors raised while resolving a single manifest.
#[derive(Debug, Error)]
pub enum ManifestError {
  /// The manifest path does not reference an existing file.
  #[error("manifest not found: {}", .0.display())]
  NotFound(PathBuf),

  /// The manifest exists but could not be read.
  #[error("failed to read manifest '{}': {source}", path.display())]
  Read {
    path: PathBuf,
    #[source]
    source: RecordError,
  },

  /// A key required by the active options is absent.
  #[error("manifest '{}' has no '{key}' key", path.display())]
  MissingKey { path: PathBuf, key: &'static str },

  /// Including this manifest would revisit a manifest already on the chain.
  #[error("circular manifest inclusion: {chain}")]
  Cycle { chain: String },
}

/// Output of a manifest resolution.
#[derive(Debug, Default)]
pub struct Resolution {
  /// Requested item identifiers in resolution order. Duplicates are kept.
  pub items: Vec<String>,
  /// Non-fatal problems found in the tree.
  pub diagnostics: Vec<ManifestError>,
  /// Every manifest referenced during resolution.
  pub graph: ManifestGraph,
}

/// Flatten the manifest at `path` into requested item identifiers.
///
/// # Errors
///
/// Returns [`ManifestError`] when the root manifest is missing, unreadable, or
/// lacks `managed_installs`. Problems in included manifests are reported in
/// [`Resolution::diagnostics`] instead.
pub fn resolve_manifest(
  path: &Path,
  options: &ResolveOptions,
  reader: &dyn RecordReader,
) -> Result<Resolution, ManifestError> {
  let mut resolver = Resolver {
    reader,
    options,
    chain: Vec::new(),
    graph: ManifestGraph::new(),
    diagnostics: Vec::new(),
  };

  info!(
    path = %path.display(),
    optional = options.process_optional,
    nested = options.process_nested,
    "resolving manifest"
  );
  let items = resolver.resolve(path)?;
  info!(count = items.len(), manifests = resolver.graph.manifest_count(), "manifest resolved");

  Ok(Resolution {
    items,
    diagnostics: resolver.diagnostics,
    graph: resolver.graph,
  })
}

struct Resolver<'a> {
  reader: &'a dyn RecordReader,
  options: &'a ResolveOptions,
  /// Manifests currently being resolved, outermost first.
  chain: Vec<PathBuf>,
  graph: ManifestGraph,
  diagnostics: Vec<ManifestError>,
}

impl Resolver<'_> {
  fn resolve(&mut self, path: &Path) -> Result<Vec<String>, ManifestError> {
    let path = manifest_key(path);

    if let Some(start) = self.chain.iter().position(|p| *p == path) {
      let chain = self.chain[start..]
        .iter()
        .chain(std::iter::once(&path))
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(" -> ");
      return Err(ManifestError::Cycle { chain });
    }

    let record = self.reader.read_manifest(&path).map_err(|e| match e {
      RecordError::NotFound(p) => ManifestError::NotFound(p),
      source => ManifestError::Read {
        path: path.clone(),
        source,
      },
    })?;
    self.graph.add_manifest(&path);

    let mut items = record.managed_installs.ok_or_else(|| ManifestError::MissingKey {
      path: path.clone(),
      key: "managed_installs",
    })?;
    debug!(path = %path.display(), count = items.len(), "managed installs");

    if self.options.process_optional {
      match record.optional_installs {
        Some(optional) => {
          debug!(path = %path.display(), count = optional.len(), "optional installs");
          items.extend(optional);
        }
        None => self.report(ManifestError::MissingKey {
          path: path.clone(),
          key: "optional_installs",
        }),
      }
    }

    if self.options.process_nested {
      let dir = path.parent().unwrap_or(Path::new("")).to_path_buf();
      self.chain.push(path.clone());

      for entry in record.included_manifests.unwrap_or_default() {
        let nested = manifest_key(&dir.join(&entry));
        self.graph.add_include(&path, &nested);
        debug!(from = %path.display(), manifest = %nested.display(), "resolving included manifest");

        match self.resolve(&nested) {
          Ok(nested_items) => items.extend(nested_items),
          Err(e) => self.report(e),
        }
      }

      self.chain.pop();
    }

    Ok(items)
  }

  fn report(&mut self, error: ManifestError) {
    warn!("{}", error);
    self.diagnostics.push(error);
  }
}

/// Path a manifest is read from and identified by.
///
/// Existing files are canonicalised so differently spelled references meet;
/// anything else is normalised lexically.
fn manifest_key(path: &Path) -> PathBuf {
  dunce::canonicalize(path).unwrap_or_else(|_| normalize_lexically(path))
}

fn normalize_lexically(path: &Path) -> PathBuf {
  let mut out = PathBuf::new();
  for component in path.components() {
    match component {
      Component::CurDir => {}
      Component::ParentDir => {
        if !out.pop() {
          out.push("..");
        }
      }
      other => out.push(other),
    }
  }
  out
}
