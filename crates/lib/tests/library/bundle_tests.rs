//! End-to-end bundling against plist repositories.

use mockito::Matcher;
use pkgbundle_lib::bundle::{BundleError, BundleIssue, bundle_manifest};
use pkgbundle_lib::layout::RepoLayout;
use pkgbundle_lib::options::{BundleOptions, ResolveOptions, UploadConfig};
use pkgbundle_lib::record::PlistReader;
use pkgbundle_lib::scan::ScanError;
use pkgbundle_lib::upload::HttpUploader;

use super::common::RepoFixture;

fn with_optional() -> BundleOptions {
  BundleOptions {
    resolve: ResolveOptions {
      process_optional: true,
      process_nested: false,
    },
    ..Default::default()
  }
}

/// A small repository with one standard install and one nopkg install.
fn office_repo() -> RepoFixture {
  let repo = RepoFixture::new();
  repo.manifest("site", Some(&["Firefox"]), Some(&["Printer"]), &[]);
  repo.pkginfo("apps/Firefox-119.0.plist", "apps/Firefox-119.0.dmg");
  repo.pkginfo("apps/Firefox-120.0.plist", "apps/Firefox-120.0.dmg");
  repo.payload("apps/Firefox-119.0.dmg");
  repo.payload("apps/Firefox-120.0.dmg");
  repo.nopkg("config/Printer-1.0.plist");
  repo
}

#[test]
fn layout_is_derived_from_the_manifest_path() {
  let repo = office_repo();
  let layout = RepoLayout::from_manifest_path(&repo.manifest_path("site")).unwrap();

  assert_eq!(layout.pkgsinfo, repo.root.join("pkgsinfo"));
  assert_eq!(layout.pkgs, repo.root.join("pkgs"));
}

#[test]
fn bundles_latest_payload_and_nopkg() {
  let repo = office_repo();

  let run = bundle_manifest(
    &repo.manifest_path("site"),
    &repo.layout(),
    &with_optional(),
    &PlistReader,
    None,
  )
  .unwrap();

  assert!(run.report.issues.is_empty());
  let pairs: Vec<_> = run
    .report
    .bundles
    .iter()
    .map(|b| (b.payload.clone(), b.pkginfo.clone()))
    .collect();
  assert_eq!(
    pairs,
    vec![
      (
        repo.root.join("pkgs/apps/Firefox-120.0.dmg"),
        repo.root.join("pkgsinfo/apps/Firefox-120.0.plist"),
      ),
      (
        repo.root.join("pkgsinfo/config/Printer-1.0.plist"),
        repo.root.join("pkgsinfo/config/Printer-1.0.plist"),
      ),
    ]
  );
}

#[test]
fn optional_bundles_are_a_superset() {
  let repo = office_repo();
  let manifest = repo.manifest_path("site");

  let managed = bundle_manifest(&manifest, &repo.layout(), &BundleOptions::default(), &PlistReader, None).unwrap();
  let all = bundle_manifest(&manifest, &repo.layout(), &with_optional(), &PlistReader, None).unwrap();

  assert_eq!(managed.report.bundles.len(), 1);
  assert!(managed.report.bundles.iter().all(|b| all.report.bundles.contains(b)));
}

#[test]
fn missing_payload_is_reported() {
  let repo = RepoFixture::new();
  repo.manifest("site", Some(&["Chrome"]), None, &[]);
  repo.pkginfo("Chrome-1.0.plist", "Chrome-1.0.dmg");

  let run = bundle_manifest(
    &repo.manifest_path("site"),
    &repo.layout(),
    &BundleOptions::default(),
    &PlistReader,
    None,
  )
  .unwrap();

  assert_eq!(run.report.bundles.len(), 1);
  assert!(matches!(&run.report.issues[..], [BundleIssue::PayloadMissing { .. }]));
}

#[test]
fn malformed_pkginfo_is_an_issue() {
  let repo = RepoFixture::new();
  repo.manifest("site", Some(&["Chrome"]), None, &[]);
  repo.raw("pkgsinfo/Chrome-1.0.plist", "garbage");

  let run = bundle_manifest(
    &repo.manifest_path("site"),
    &repo.layout(),
    &BundleOptions::default(),
    &PlistReader,
    None,
  )
  .unwrap();

  assert!(run.report.bundles.is_empty());
  assert!(matches!(&run.report.issues[..], [BundleIssue::UnreadablePkginfo { .. }]));
}

#[test]
fn missing_pkgsinfo_tree_is_fatal() {
  let repo = RepoFixture::new();
  repo.manifest("site", Some(&["Chrome"]), None, &[]);
  std::fs::remove_dir(repo.root.join("pkgsinfo")).unwrap();

  let result = bundle_manifest(
    &repo.manifest_path("site"),
    &repo.layout(),
    &BundleOptions::default(),
    &PlistReader,
    None,
  );

  assert!(matches!(result, Err(BundleError::Scan(ScanError::MissingRoot(_)))));
}

#[test]
fn uploads_every_bundle_over_http() {
  let repo = office_repo();
  let mut server = mockito::Server::new();
  let mock = server
    .mock("POST", "/upload")
    .match_body(Matcher::Regex(r#"name="pkginfo_file""#.to_string()))
    .with_status(200)
    .expect(2)
    .create();
  let uploader = HttpUploader::new(&UploadConfig::new(format!("{}/upload", server.url()))).unwrap();

  let run = bundle_manifest(
    &repo.manifest_path("site"),
    &repo.layout(),
    &with_optional(),
    &PlistReader,
    Some(&uploader),
  )
  .unwrap();

  mock.assert();
  assert_eq!(run.report.uploads.len(), 2);
  assert!(run.report.issues.is_empty());
}

#[test]
fn rejected_uploads_do_not_stop_the_run() {
  let repo = office_repo();
  let mut server = mockito::Server::new();
  let mock = server.mock("POST", "/upload").with_status(403).expect(2).create();
  let uploader = HttpUploader::new(&UploadConfig::new(format!("{}/upload", server.url()))).unwrap();

  let run = bundle_manifest(
    &repo.manifest_path("site"),
    &repo.layout(),
    &with_optional(),
    &PlistReader,
    Some(&uploader),
  )
  .unwrap();

  mock.assert();
  assert_eq!(run.report.bundles.len(), 2);
  assert_eq!(run.report.issues.len(), 2);
  assert!(
    run
      .report
      .issues
      .iter()
      .all(|i| matches!(i, BundleIssue::UploadRejected { status: 403, .. }))
  );
}
