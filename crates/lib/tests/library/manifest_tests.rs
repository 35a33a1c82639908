//! Manifest resolution against plist files.

use pkgbundle_lib::manifest::{ManifestError, resolve_manifest};
use pkgbundle_lib::options::ResolveOptions;
use pkgbundle_lib::record::{PlistReader, RecordError};

use super::common::RepoFixture;

fn options(process_optional: bool, process_nested: bool) -> ResolveOptions {
  ResolveOptions {
    process_optional,
    process_nested,
  }
}

#[test]
fn managed_only_by_default() {
  let repo = RepoFixture::new();
  let site = repo.manifest("site", Some(&["Chrome", "Firefox"]), Some(&["Slack"]), &["base"]);
  repo.manifest("base", Some(&["Munki"]), None, &[]);

  let resolution = resolve_manifest(&site, &ResolveOptions::default(), &PlistReader).unwrap();

  assert_eq!(resolution.items, vec!["Chrome", "Firefox"]);
  assert!(resolution.diagnostics.is_empty());
}

#[test]
fn optional_then_nested_in_order() {
  let repo = RepoFixture::new();
  let site = repo.manifest("site", Some(&["Chrome"]), Some(&["Slack"]), &["base", "extras"]);
  repo.manifest("base", Some(&["Munki"]), Some(&["Zoom"]), &[]);
  repo.manifest("extras", Some(&["VLC"]), Some(&[]), &[]);

  let resolution = resolve_manifest(&site, &options(true, true), &PlistReader).unwrap();

  assert_eq!(resolution.items, vec!["Chrome", "Slack", "Munki", "Zoom", "VLC"]);
  assert_eq!(resolution.graph.manifest_count(), 3);
}

#[test]
fn optional_items_are_a_superset() {
  let repo = RepoFixture::new();
  let site = repo.manifest("site", Some(&["Chrome", "Firefox"]), Some(&["Slack"]), &["base"]);
  repo.manifest("base", Some(&["Munki"]), Some(&["Zoom"]), &[]);

  for nested in [false, true] {
    let without = resolve_manifest(&site, &options(false, nested), &PlistReader).unwrap();
    let with = resolve_manifest(&site, &options(true, nested), &PlistReader).unwrap();
    assert!(without.items.iter().all(|item| with.items.contains(item)));
  }
}

#[test]
fn nested_references_resolve_from_the_including_manifest() {
  let repo = RepoFixture::new();
  let site = repo.manifest("site", Some(&["Chrome"]), None, &["groups/design"]);
  repo.manifest("groups/design", Some(&["Figma"]), None, &["../base"]);
  repo.manifest("base", Some(&["Munki"]), None, &[]);

  let resolution = resolve_manifest(&site, &options(false, true), &PlistReader).unwrap();

  assert_eq!(resolution.items, vec!["Chrome", "Figma", "Munki"]);
  assert!(resolution.diagnostics.is_empty());
}

#[test]
fn missing_optional_key_keeps_managed_items() {
  let repo = RepoFixture::new();
  let site = repo.manifest("site", Some(&["Chrome"]), None, &[]);

  let resolution = resolve_manifest(&site, &options(true, false), &PlistReader).unwrap();

  assert_eq!(resolution.items, vec!["Chrome"]);
  assert!(matches!(
    &resolution.diagnostics[..],
    [ManifestError::MissingKey {
      key: "optional_installs",
      ..
    }]
  ));
}

#[test]
fn broken_nested_manifest_is_skipped() {
  let repo = RepoFixture::new();
  let site = repo.manifest("site", Some(&["Chrome"]), None, &["absent", "broken", "base"]);
  repo.raw("manifests/broken", "this is not a plist");
  repo.manifest("base", Some(&["Munki"]), None, &[]);

  let resolution = resolve_manifest(&site, &options(false, true), &PlistReader).unwrap();

  assert_eq!(resolution.items, vec!["Chrome", "Munki"]);
  assert!(matches!(
    &resolution.diagnostics[..],
    [
      ManifestError::NotFound(_),
      ManifestError::Read {
        source: RecordError::Malformed { .. },
        ..
      }
    ]
  ));
}

#[test]
fn include_cycle_is_reported_once_and_terminates() {
  let repo = RepoFixture::new();
  let a = repo.manifest("a", Some(&["A"]), None, &["b"]);
  repo.manifest("b", Some(&["B"]), None, &["a"]);

  let resolution = resolve_manifest(&a, &options(false, true), &PlistReader).unwrap();

  assert_eq!(resolution.items, vec!["A", "B"]);
  assert!(matches!(&resolution.diagnostics[..], [ManifestError::Cycle { .. }]));
  assert!(resolution.graph.has_cycle());
}

#[test]
fn root_without_managed_installs_is_fatal() {
  let repo = RepoFixture::new();
  let site = repo.manifest("site", None, Some(&["Slack"]), &[]);

  let result = resolve_manifest(&site, &options(true, false), &PlistReader);

  assert!(matches!(
    result,
    Err(ManifestError::MissingKey {
      key: "managed_installs",
      ..
    })
  ));
}

#[test]
fn missing_root_manifest_is_fatal() {
  let repo = RepoFixture::new();

  let result = resolve_manifest(&repo.manifest_path("nope"), &ResolveOptions::default(), &PlistReader);

  assert!(matches!(result, Err(ManifestError::NotFound(_))));
}
