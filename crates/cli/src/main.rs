use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, ValueEnum};
use tracing_subscriber::EnvFilter;

use pkgbundle_lib::options::{BundleOptions, PinPolicy, ResolveOptions, UploadConfig};

mod cmd;
mod output;

use output::{OutputFormat, print_error};

/// Collect the pkginfo and installer files a Munki manifest requests.
#[derive(Parser, Debug)]
#[command(name = "pkgbundle")]
#[command(author, version, about, long_about = None)]
struct Cli {
  /// Path to the root manifest, usually `<repo>/manifests/<name>`
  manifest: PathBuf,

  /// Also bundle each manifest's optional_installs
  #[arg(short = 'o', long)]
  optional_software: bool,

  /// Follow included_manifests
  #[arg(short = 'n', long)]
  nested_manifests: bool,

  /// Upload every bundle to this endpoint
  #[arg(short, long, value_name = "URL", env = "PKGBUNDLE_UPLOAD_URL")]
  upload: Option<String>,

  /// Repository root; derived from the manifest path when omitted
  #[arg(long, value_name = "DIR", env = "PKGBUNDLE_REPO")]
  repo: Option<PathBuf>,

  /// How an explicit `name-version` request is honoured
  #[arg(long, value_enum, default_value_t = PinMode::Legacy)]
  pin_policy: PinMode,

  /// Do not upload bundles whose payload or pkginfo is missing
  #[arg(long)]
  skip_missing_uploads: bool,

  /// Upload request timeout in seconds
  #[arg(long, value_name = "SECS")]
  timeout: Option<u64>,

  /// Output format
  #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
  format: OutputFormat,

  /// Enable debug logging
  #[arg(short, long)]
  verbose: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum PinMode {
  /// A pin suppresses a lone candidate and is ignored among several
  Legacy,
  /// Only a candidate whose version equals the pin is selected
  Exact,
}

impl From<PinMode> for PinPolicy {
  fn from(mode: PinMode) -> Self {
    match mode {
      PinMode::Legacy => PinPolicy::Legacy,
      PinMode::Exact => PinPolicy::Exact,
    }
  }
}

impl Cli {
  fn options(&self) -> BundleOptions {
    let upload = self.upload.as_ref().map(|endpoint| {
      let config = UploadConfig::new(endpoint.as_str());
      match self.timeout {
        Some(secs) => config.with_timeout(Duration::from_secs(secs)),
        None => config,
      }
    });

    BundleOptions {
      resolve: ResolveOptions {
        process_optional: self.optional_software,
        process_nested: self.nested_manifests,
      },
      pin_policy: self.pin_policy.into(),
      upload,
      skip_missing_uploads: self.skip_missing_uploads,
    }
  }
}

fn init_logging(verbose: bool) {
  let default = if verbose {
    "pkgbundle_lib=debug,pkgbundle=debug"
  } else {
    "warn"
  };
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(std::io::stderr)
    .without_time()
    .init();
}

fn main() {
  let cli = Cli::parse();
  init_logging(cli.verbose);

  let options = cli.options();
  if let Err(err) = cmd::cmd_bundle(&cli.manifest, cli.repo.as_deref(), &options, cli.format) {
    print_error(&format!("{:#}", err));
    std::process::exit(1);
  }
}
