//! Structured error model (`spec.md` §7 "Error handling design").
//!
//! The core never retries and never produces a partial result: every fallible
//! public operation returns `Result<T>`, and a single `Error` carries both a
//! `kind` and the module/operation that raised it.

use std::fmt;

/// The four error kinds from `spec.md` §7.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
  /// Fewer than 2 points, a non-finite coordinate, or duplicate `(x, y)` points.
  InputError,
  /// A predicate result violates a runtime invariant check (e.g. `in_circle`
  /// disagreeing with `orient` on a known CCW triangle). Indicates a
  /// predicate-robustness bug; never silently corrected.
  GeometryInconsistency,
  /// A post-operation quad-edge invariant (`spec.md` §3) failed. Indicates a
  /// splice/connect bug.
  TopologyViolation,
  /// A reduction message was truncated, malformed, or its peer disappeared.
  TransportError,
}

impl fmt::Display for ErrorKind {
  fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
    let s = match self {
      ErrorKind::InputError => "InputError",
      ErrorKind::GeometryInconsistency => "GeometryInconsistency",
      ErrorKind::TopologyViolation => "TopologyViolation",
      ErrorKind::TransportError => "TransportError",
    };
    fmt.write_str(s)
  }
}

/// A single structured failure: kind, message, and the location (module::op)
/// that raised it. All errors propagate to the top-level caller unchanged
/// (`spec.md` §7, "Policy").
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Error {
  pub kind: ErrorKind,
  pub message: String,
  pub location: &'static str,
}

impl Error {
  pub fn input(message: impl Into<String>, location: &'static str) -> Error {
    Error {
      kind: ErrorKind::InputError,
      message: message.into(),
      location,
    }
  }

  pub fn geometry_inconsistency(message: impl Into<String>, location: &'static str) -> Error {
    Error {
      kind: ErrorKind::GeometryInconsistency,
      message: message.into(),
      location,
    }
  }

  pub fn topology_violation(message: impl Into<String>, location: &'static str) -> Error {
    Error {
      kind: ErrorKind::TopologyViolation,
      message: message.into(),
      location,
    }
  }

  pub fn transport(message: impl Into<String>, location: &'static str) -> Error {
    Error {
      kind: ErrorKind::TransportError,
      message: message.into(),
      location,
    }
  }
}

impl fmt::Display for Error {
  fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(fmt, "{} at {}: {}", self.kind, self.location, self.message)
  }
}

impl std::error::Error for Error {}

pub type Result<T> = std::result::Result<T, Error>;
