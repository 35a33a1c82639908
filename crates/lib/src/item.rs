//! Requested item identifiers.
//!
//! Manifests list items either by bare name (`Firefox`) or by name with a
//! version pin appended after a hyphen (`Firefox-115.0`). The two cannot be
//! told apart when a real name contains a hyphen followed by a digit
//! (`Office-2019`): the identifier is split at the first hyphen that
//! precedes a digit regardless. [`ItemName::parse`] is the only place that
//! makes this call.

use std::fmt;

/// A requested item split into base name and optional version pin.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ItemName {
  pub name: String,
  pub pin: Option<String>,
}

impl ItemName {
  /// Split `identifier` at the first `-` that is immediately followed by an ASCII digit.
  ///
  /// Everything before the hyphen is the name, everything after it is the pin.
  /// Identifiers without such a hyphen are returned whole with no pin.
  pub fn parse(identifier: &str) -> Self {
    let split = identifier
      .char_indices()
      .find(|&(i, c)| c == '-' && identifier[i + 1..].starts_with(|d: char| d.is_ascii_digit()));

    match split {
      Some((i, _)) => Self {
        name: identifier[..i].to_string(),
        pin: Some(identifier[i + 1..].to_string()),
      },
      None => Self {
        name: identifier.to_string(),
        pin: None,
      },
    }
  }

  /// Prefix every candidate file for this item starts with.
  pub fn candidate_prefix(&self) -> String {
    format!("{}-", self.name)
  }
}

impl fmt::Display for ItemName {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match &self.pin {
      Some(pin) => write!(f, "{}-{}", self.name, pin),
      None => f.write_str(&self.name),
    }
  }
}
