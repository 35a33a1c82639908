/// Application name, used for the HTTP user agent.
pub const APP_NAME: &str = "pkgbundle";

/// Repository subdirectory holding manifests.
pub const MANIFESTS_DIR: &str = "manifests";

/// Repository subdirectory holding pkginfo (metadata) records.
pub const PKGSINFO_DIR: &str = "pkgsinfo";

/// Repository subdirectory holding installer payloads.
pub const PKGS_DIR: &str = "pkgs";

/// `installer_type` value for installs that carry no payload.
pub const NOPKG_INSTALLER_TYPE: &str = "nopkg";

/// Running-maximum seed for version selection.
pub const BASELINE_VERSION: &str = "0.0";
