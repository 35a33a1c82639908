//! pkgbundle-lib: bundle the installers a Munki manifest requests.
//!
//! The pipeline runs in three stages:
//! - [`manifest`]: flatten a manifest (and optionally its optional and
//!   included manifests) into requested item identifiers
//! - [`scan`]: walk the pkginfo tree once and pick at most one pkginfo per
//!   item per directory
//! - [`bundle`]: pair each selection with its payload and optionally upload
//!   both through an [`upload::Uploader`]
//!
//! [`bundle::bundle_manifest`] runs all three.

pub mod bundle;
pub mod consts;
pub mod item;
pub mod layout;
pub mod manifest;
pub mod options;
pub mod record;
pub mod scan;
pub mod upload;
pub mod version;
