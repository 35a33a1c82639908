//! Loose version ordering for pkginfo versions.
//!
//! Repository versions are rarely strict semver (`1.0`, `16.78.23081815`,
//! `2.0b1`), so parsing never fails. A version is split into:
//! - a release: the leading run of dot-separated integers, compared numerically
//!   with trailing zeros ignored (`1.0 == 1.0.0`)
//! - tags: an optional pre-release (`a`/`alpha`, `b`/`beta`, `rc`/`c`/`pre`),
//!   an optional post-release (`.post1`, `-1`) and an optional `.dev` marker,
//!   each carrying a number compared numerically
//!
//! For one release the order is `dev < a < b < rc < release < post`. Text that
//! does not fit that shape makes the version a legacy one, which sorts below
//! every well-formed version.

use std::cmp::Ordering;
use std::fmt;

/// A parsed, totally ordered version string.
#[derive(Debug, Clone)]
pub struct PkgVersion {
  raw: String,
  release: Vec<u64>,
  suffix: Suffix,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum PreTag {
  Alpha,
  Beta,
  Candidate,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct Tags {
  pre: Option<(PreTag, u64)>,
  post: Option<u64>,
  dev: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Suffix {
  Tagged(Tags),
  /// Unparseable trailing text, lowercased.
  Legacy(String),
}

/// Where a release sits among its own pre-releases.
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord)]
enum Phase {
  Dev,
  Pre(PreTag, u64),
  Final,
}

/// A `.devN` marker sorts before the same version without one.
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord)]
enum DevMarker {
  Dev(u64),
  None,
}

const PRE_TAGS: &[(&str, PreTag)] = &[
  ("alpha", PreTag::Alpha),
  ("a", PreTag::Alpha),
  ("beta", PreTag::Beta),
  ("b", PreTag::Beta),
  ("preview", PreTag::Candidate),
  ("pre", PreTag::Candidate),
  ("rc", PreTag::Candidate),
  ("c", PreTag::Candidate),
];

const POST_TAGS: &[(&str, ())] = &[("post", ()), ("rev", ()), ("r", ())];

const DEV_TAGS: &[(&str, ())] = &[("dev", ())];

impl PkgVersion {
  /// Parse a version string. Never fails; unrecognised text makes a legacy version.
  pub fn parse(raw: &str) -> Self {
    let trimmed = raw.trim();
    let body = match trimmed.strip_prefix(['v', 'V']) {
      Some(rest) if rest.starts_with(|c: char| c.is_ascii_digit()) => rest,
      _ => trimmed,
    };

    let (release, rest) = split_release(body);
    let rest = rest.to_ascii_lowercase();
    let suffix = match parse_tags(&rest) {
      Some(tags) => Suffix::Tagged(tags),
      None => Suffix::Legacy(rest),
    };

    Self {
      raw: raw.to_string(),
      release,
      suffix,
    }
  }

  /// The original string this version was parsed from.
  pub fn as_str(&self) -> &str {
    &self.raw
  }
}

impl Tags {
  fn phase(&self) -> Phase {
    match (self.pre, self.post, self.dev) {
      (Some((tag, n)), _, _) => Phase::Pre(tag, n),
      (None, None, Some(_)) => Phase::Dev,
      _ => Phase::Final,
    }
  }

  fn key(&self) -> (Phase, Option<u64>, DevMarker) {
    let dev = match self.dev {
      Some(n) => DevMarker::Dev(n),
      None => DevMarker::None,
    };
    (self.phase(), self.post, dev)
  }
}

/// Consume `digits(.digits)*` from the front of `s`.
fn split_release(s: &str) -> (Vec<u64>, &str) {
  let mut release = Vec::new();
  let mut rest = s;

  loop {
    let (Some(n), after) = take_number(rest) else {
      break;
    };
    release.push(n);
    rest = after;

    match rest.strip_prefix('.') {
      Some(after) if after.starts_with(|c: char| c.is_ascii_digit()) => rest = after,
      _ => break,
    }
  }

  (release, rest)
}

/// Leading decimal digits of `s`, saturating at `u64::MAX`.
fn take_number(s: &str) -> (Option<u64>, &str) {
  let end = s.find(|c: char| !c.is_ascii_digit()).unwrap_or(s.len());
  if end == 0 {
    return (None, s);
  }
  (Some(s[..end].parse().unwrap_or(u64::MAX)), &s[end..])
}

/// Match one `[sep]word[sep][digits]` tag from the front of `s`.
///
/// Longer spellings must precede their prefixes in `words`.
fn take_tag<'a, T: Copy>(s: &'a str, words: &[(&str, T)]) -> Option<(T, u64, &'a str)> {
  let body = s.strip_prefix(['.', '-', '_']).unwrap_or(s);
  words.iter().find_map(|&(word, value)| {
    let after = body.strip_prefix(word)?;
    let after = match after.strip_prefix(['.', '-', '_']) {
      Some(num) if num.starts_with(|c: char| c.is_ascii_digit()) => num,
      _ => after,
    };
    let (n, rest) = take_number(after);
    Some((value, n.unwrap_or(0), rest))
  })
}

/// Parse the text after the release. `None` when any of it is left over.
fn parse_tags(s: &str) -> Option<Tags> {
  // local labels (`+build.5`) do not affect ordering
  let mut rest = s.split_once('+').map_or(s, |(head, _)| head);
  let mut tags = Tags::default();

  if let Some((tag, n, after)) = take_tag(rest, PRE_TAGS) {
    tags.pre = Some((tag, n));
    rest = after;
  }

  if let Some(((), n, after)) = take_tag(rest, POST_TAGS) {
    tags.post = Some(n);
    rest = after;
  } else if let Some(after) = rest.strip_prefix('-')
    && let (Some(n), after) = take_number(after)
  {
    tags.post = Some(n);
    rest = after;
  }

  if let Some(((), n, after)) = take_tag(rest, DEV_TAGS) {
    tags.dev = Some(n);
    rest = after;
  }

  rest.is_empty().then_some(tags)
}

fn cmp_release(a: &[u64], b: &[u64]) -> Ordering {
  let len = a.len().max(b.len());
  (0..len)
    .map(|i| a.get(i).copied().unwrap_or(0).cmp(&b.get(i).copied().unwrap_or(0)))
    .find(|ord| ord.is_ne())
    .unwrap_or(Ordering::Equal)
}

impl PartialEq for PkgVersion {
  fn eq(&self, other: &Self) -> bool {
    self.cmp(other) == Ordering::Equal
  }
}

impl Eq for PkgVersion {}

impl PartialOrd for PkgVersion {
  fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
    Some(self.cmp(other))
  }
}

impl Ord for PkgVersion {
  fn cmp(&self, other: &Self) -> Ordering {
    match (&self.suffix, &other.suffix) {
      (Suffix::Legacy(_), Suffix::Tagged(_)) => Ordering::Less,
      (Suffix::Tagged(_), Suffix::Legacy(_)) => Ordering::Greater,
      (Suffix::Legacy(a), Suffix::Legacy(b)) => cmp_release(&self.release, &other.release).then_with(|| a.cmp(b)),
      (Suffix::Tagged(a), Suffix::Tagged(b)) => {
        cmp_release(&self.release, &other.release).then_with(|| a.key().cmp(&b.key()))
      }
    }
  }
}

impl fmt::Display for PkgVersion {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.raw)
  }
}
