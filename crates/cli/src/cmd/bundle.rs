//! Implementation of the `pkgbundle` command.
//!
//! Resolves the manifest, bundles every requested item against the
//! repository, optionally uploads each bundle, and prints the outcome.

use std::path::Path;

use anyhow::{Context, Result, bail};

use pkgbundle_lib::bundle::{BundleRun, bundle_manifest};
use pkgbundle_lib::layout::RepoLayout;
use pkgbundle_lib::options::BundleOptions;
use pkgbundle_lib::record::PlistReader;
use pkgbundle_lib::upload::{HttpUploader, Uploader};

use crate::output::{self, OutputFormat, format_bytes, print_info, print_json, print_stat, print_success, print_warning};

pub fn cmd_bundle(manifest: &Path, repo: Option<&Path>, options: &BundleOptions, format: OutputFormat) -> Result<()> {
  if !manifest.is_file() {
    bail!("Manifest not found: {}", manifest.display());
  }
  let manifest =
    dunce::canonicalize(manifest).with_context(|| format!("Failed to resolve manifest path: {}", manifest.display()))?;

  let layout = match repo {
    Some(root) => RepoLayout::new(root),
    None => RepoLayout::from_manifest_path(&manifest).context("Failed to locate repository root")?,
  };

  let uploader = options
    .upload
    .as_ref()
    .map(HttpUploader::new)
    .transpose()
    .context("Failed to set up uploads")?;

  let run = bundle_manifest(
    &manifest,
    &layout,
    options,
    &PlistReader,
    uploader.as_ref().map(|u| u as &dyn Uploader),
  )
  .with_context(|| format!("Failed to bundle {}", manifest.display()))?;

  match format {
    OutputFormat::Json => print_json(&json_report(&manifest, &run))?,
    OutputFormat::Text => print_text(&run),
  }

  Ok(())
}

fn warnings(run: &BundleRun) -> Vec<String> {
  run
    .resolution
    .diagnostics
    .iter()
    .map(ToString::to_string)
    .chain(run.report.issues.iter().map(ToString::to_string))
    .collect()
}

fn json_report(manifest: &Path, run: &BundleRun) -> serde_json::Value {
  let manifests: Vec<_> = run.resolution.graph.manifests().collect();
  serde_json::json!({
    "manifest": manifest,
    "manifests": manifests,
    "items": run.resolution.items,
    "bundles": run.report.bundles,
    "uploads": run.report.uploads,
    "warnings": warnings(run),
  })
}

fn print_text(run: &BundleRun) {
  for bundle in &run.report.bundles {
    if bundle.version.is_empty() {
      print_success(&bundle.item);
    } else {
      print_success(&format!("{} {}", bundle.item, bundle.version));
    }
    print_stat("pkginfo", bundle.pkginfo.display());
    if bundle.nopkg {
      print_stat("payload", format_args!("{} (nopkg)", bundle.payload.display()));
    } else {
      let size = std::fs::metadata(&bundle.payload).map(|m| format!(" ({})", format_bytes(m.len())));
      print_stat("payload", format_args!("{}{}", bundle.payload.display(), size.unwrap_or_default()));
    }
  }

  for upload in run.report.uploads.iter().filter(|u| u.is_success()) {
    print_info(&format!("{} {} HTTP {}", upload.item, output::symbols::ARROW, upload.status));
  }

  let warnings = warnings(run);
  for warning in &warnings {
    print_warning(warning);
  }

  println!();
  print_info(&format!(
    "{} item(s) requested, {} bundle(s), {} upload(s), {} warning(s)",
    run.resolution.items.len(),
    run.report.bundles.len(),
    run.report.uploads.len(),
    warnings.len()
  ));
}
