mod bundle;

pub use bundle::cmd_bundle;
