use std::borrow::Cow;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Symbolic value produced by a node execution, used to select the next link.
///
/// Codes compare by value. The common codes are predefined as constants;
/// any other string is a valid code as well.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExitCode(Cow<'static, str>);

impl ExitCode {
  pub const OK: ExitCode = ExitCode::from_static("Ok");
  pub const DONE: ExitCode = ExitCode::from_static("Done");
  pub const START: ExitCode = ExitCode::from_static("Start");
  pub const NEXT: ExitCode = ExitCode::from_static("Next");
  pub const FAILED: ExitCode = ExitCode::from_static("Failed");
  pub const CANCEL: ExitCode = ExitCode::from_static("Cancel");

  pub fn new(code: impl Into<String>) -> Self {
    Self(Cow::Owned(code.into()))
  }

  pub const fn from_static(code: &'static str) -> Self {
    Self(Cow::Borrowed(code))
  }

  pub fn as_str(&self) -> &str {
    &self.0
  }

  pub fn is_empty(&self) -> bool {
    self.0.is_empty()
  }
}

impl fmt::Display for ExitCode {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}

impl From<&'static str> for ExitCode {
  fn from(code: &'static str) -> Self {
    Self::from_static(code)
  }
}

impl From<String> for ExitCode {
  fn from(code: String) -> Self {
    Self::new(code)
  }
}

impl PartialEq<str> for ExitCode {
  fn eq(&self, other: &str) -> bool {
    self.as_str() == other
  }
}

impl PartialEq<&str> for ExitCode {
  fn eq(&self, other: &&str) -> bool {
    self.as_str() == *other
  }
}

/// Identifier of a node behavior variant.
///
/// A node definition only names its behavior; the runtime's node factory
/// maps the name to a constructor.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BehaviorType(Cow<'static, str>);

impl BehaviorType {
  pub fn new(name: impl Into<String>) -> Self {
    Self(Cow::Owned(name.into()))
  }

  pub const fn from_static(name: &'static str) -> Self {
    Self(Cow::Borrowed(name))
  }

  pub fn as_str(&self) -> &str {
    &self.0
  }
}

impl fmt::Display for BehaviorType {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}

impl From<&'static str> for BehaviorType {
  fn from(name: &'static str) -> Self {
    Self::from_static(name)
  }
}

impl From<String> for BehaviorType {
  fn from(name: String) -> Self {
    Self::new(name)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_codes_compare_by_value() {
    assert_eq!(ExitCode::OK, ExitCode::new("Ok"));
    assert_eq!(ExitCode::DONE, "Done");
    assert_ne!(ExitCode::START, ExitCode::NEXT);
  }

  #[test]
  fn test_code_serde_is_plain_string() {
    let json = serde_json::to_string(&ExitCode::START).unwrap();
    assert_eq!(json, "\"Start\"");

    let code: ExitCode = serde_json::from_str("\"Approve\"").unwrap();
    assert_eq!(code, ExitCode::new("Approve"));
  }
}
