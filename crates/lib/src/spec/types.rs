use std::fmt;
use std::str::FromStr;

use indexmap::IndexMap;
use indexmap::map::Entry;
use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::validate::validate_path;
use crate::consts::{DEFAULT_EXECUTABLE_MODE, DEFAULT_TEXT_MODE};
use crate::error::ComposeError;

/// A requested output tree: destination path -> production rule.
///
/// Iteration follows insertion (document) order. Parsing a JSON document
/// with the same destination twice is an error.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ArtifactSpec {
  entries: IndexMap<String, RawEntry>,
}

impl ArtifactSpec {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
    serde_json::from_str(json)
  }

  /// Add a text entry. An existing entry for `path` is replaced in place.
  pub fn text(mut self, path: &str, entry: TextEntry) -> Self {
    self.entries.insert(path.to_string(), EntrySpec::Text(entry).into());
    self
  }

  /// Add a link entry. An existing entry for `path` is replaced in place.
  pub fn link(mut self, path: &str, target: &str) -> Self {
    self.entries.insert(
      path.to_string(),
      EntrySpec::Link(LinkEntry {
        target: target.to_string(),
      })
      .into(),
    );
    self
  }

  /// Add a raw wire entry, as an external wrapper generating JSON would.
  pub fn raw(mut self, path: &str, entry: RawEntry) -> Self {
    self.entries.insert(path.to_string(), entry);
    self
  }

  pub fn iter(&self) -> impl Iterator<Item = (&str, &RawEntry)> {
    self.entries.iter().map(|(k, v)| (k.as_str(), v))
  }

  pub fn len(&self) -> usize {
    self.entries.len()
  }

  pub fn is_empty(&self) -> bool {
    self.entries.is_empty()
  }

  pub fn contains(&self, path: &str) -> bool {
    self.entries.contains_key(path)
  }
}

impl<'de> Deserialize<'de> for ArtifactSpec {
  fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
    struct SpecVisitor;

    impl<'de> Visitor<'de> for SpecVisitor {
      type Value = ArtifactSpec;

      fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a map from destination path to entry")
      }

      fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
        let mut entries = IndexMap::with_capacity(map.size_hint().unwrap_or(0));
        while let Some((path, entry)) = map.next_entry::<String, RawEntry>()? {
          match entries.entry(path) {
            Entry::Occupied(o) => {
              return Err(serde::de::Error::custom(format!(
                "duplicate destination path {:?}",
                o.key()
              )));
            }
            Entry::Vacant(v) => {
              v.insert(entry);
            }
          }
        }
        Ok(ArtifactSpec { entries })
      }
    }

    deserializer.deserialize_map(SpecVisitor)
  }
}

/// One entry as written in a spec document.
///
/// Every field is optional on the wire; exactly which combinations are legal
/// is decided by the validator, not by the parser.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawEntry {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub link: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub text: Option<String>,
  /// Kept untyped so a non-boolean is reported against its entry.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub executable: Option<serde_json::Value>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub mode: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub check: Option<String>,
}

impl RawEntry {
  /// Production-mode fields present on this entry.
  pub fn production_modes(&self) -> Vec<&'static str> {
    let mut found = Vec::new();
    if self.link.is_some() {
      found.push("link");
    }
    if self.text.is_some() {
      found.push("text");
    }
    found
  }

  /// Text-only option fields present on this entry.
  pub fn text_options(&self) -> Vec<&'static str> {
    let mut found = Vec::new();
    if self.executable.is_some() {
      found.push("executable");
    }
    if self.mode.is_some() {
      found.push("mode");
    }
    if self.check.is_some() {
      found.push("check");
    }
    found
  }
}

impl From<EntrySpec> for RawEntry {
  fn from(spec: EntrySpec) -> Self {
    match spec {
      EntrySpec::Link(link) => RawEntry {
        link: Some(link.target),
        ..Default::default()
      },
      EntrySpec::Text(text) => RawEntry {
        text: Some(text.content),
        executable: text.executable.then_some(serde_json::Value::Bool(true)),
        mode: text.mode.map(|m| m.to_string()),
        check: text.check,
        ..Default::default()
      },
    }
  }
}

/// How a single destination is produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntrySpec {
  Link(LinkEntry),
  Text(TextEntry),
}

/// Symlink to an existing artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkEntry {
  /// Artifact reference before validation; resolved filesystem path after.
  pub target: String,
}

/// Literal file content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextEntry {
  pub content: String,
  pub executable: bool,
  /// Explicit mode; when absent the mode follows `executable`.
  pub mode: Option<FileMode>,
  /// Command run as `<check> <staged-file>` before installing.
  pub check: Option<String>,
}

impl TextEntry {
  pub fn new(content: &str) -> Self {
    Self {
      content: content.to_string(),
      executable: false,
      mode: None,
      check: None,
    }
  }

  pub fn executable(mut self, executable: bool) -> Self {
    self.executable = executable;
    self
  }

  pub fn with_mode(mut self, mode: FileMode) -> Self {
    self.mode = Some(mode);
    self
  }

  pub fn with_check(mut self, check: &str) -> Self {
    self.check = Some(check.to_string());
    self
  }

  pub fn effective_mode(&self) -> FileMode {
    self.mode.unwrap_or(if self.executable {
      FileMode(DEFAULT_EXECUTABLE_MODE)
    } else {
      FileMode(DEFAULT_TEXT_MODE)
    })
  }
}

/// Permission bits of an installed file, written as four octal digits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FileMode(pub u32);

/// Error parsing a [`FileMode`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid file mode {0:?}: expected four octal digits")]
pub struct ParseModeError(pub String);

impl FromStr for FileMode {
  type Err = ParseModeError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    if s.len() != 4 || !s.bytes().all(|b| (b'0'..=b'7').contains(&b)) {
      return Err(ParseModeError(s.to_string()));
    }
    u32::from_str_radix(s, 8)
      .map(FileMode)
      .map_err(|_| ParseModeError(s.to_string()))
  }
}

impl fmt::Display for FileMode {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{:04o}", self.0)
  }
}

impl Serialize for FileMode {
  fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(self)
  }
}

impl<'de> Deserialize<'de> for FileMode {
  fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
    let s = String::deserialize(deserializer)?;
    s.parse().map_err(serde::de::Error::custom)
  }
}

/// A validated destination: the root (`""`) or an absolute portable path.
///
/// Deserializing runs the same grammar check as spec validation, so a plan
/// read back from JSON cannot name a path outside the output tree.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DestPath(pub(crate) String);

impl TryFrom<String> for DestPath {
  type Error = ComposeError;

  fn try_from(path: String) -> Result<Self, Self::Error> {
    validate_path(&path)
  }
}

impl From<DestPath> for String {
  fn from(path: DestPath) -> Self {
    path.0
  }
}

impl DestPath {
  pub fn as_str(&self) -> &str {
    &self.0
  }

  pub fn is_root(&self) -> bool {
    self.0.is_empty()
  }

  /// Path without the leading `/`; empty for the root.
  pub fn relative(&self) -> &str {
    self.0.strip_prefix('/').unwrap_or(&self.0)
  }

  /// Strict ancestors, shortest first: `/a/b/c` -> `["/a", "/a/b"]`.
  pub fn ancestors(&self) -> Vec<&str> {
    self
      .0
      .match_indices('/')
      .map(|(i, _)| &self.0[..i])
      .filter(|prefix| !prefix.is_empty())
      .collect()
  }
}

impl fmt::Display for DestPath {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    if self.is_root() {
      f.write_str("<root>")
    } else {
      f.write_str(&self.0)
    }
  }
}

/// An entry that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidEntry {
  pub path: DestPath,
  pub spec: EntrySpec,
}
