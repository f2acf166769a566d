//! Decode errors and their source locations.
use std::fmt;

use saphyr_parser::{ScanError, Span};
use serde::de;

/// Row/column position within the source YAML document (1-indexed).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Location {
    pub(crate) line: u32,
    pub(crate) column: u32,
}

impl Location {
    /// Sentinel value meaning "location unknown".
    pub const UNKNOWN: Self = Self { line: 0, column: 0 };

    /// 1-indexed line number.
    pub fn line(&self) -> u64 {
        self.line as u64
    }

    /// 1-indexed column number.
    pub fn column(&self) -> u64 {
        self.column as u64
    }

    pub(crate) const fn new(line: usize, column: usize) -> Self {
        // u32 covers any document whose position is worth reporting.
        Self {
            line: line as u32,
            column: column as u32,
        }
    }
}

/// Convert a `saphyr_parser::Span` start marker to a 1-indexed `Location`.
pub(crate) fn location_from_span(span: &Span) -> Location {
    Location::new(span.start.line(), span.start.col() + 1)
}

/// Error type for the whole decode pipeline.
///
/// The variants split into two severities (see `is_fatal`): parse, anchor,
/// coercion and limit errors abort the decode, while mismatches and free-form
/// messages abort only the slot they occurred in; the surrounding container
/// completes as if that slot were absent.
#[derive(Debug)]
pub enum Error {
    /// Malformed YAML reported by the event parser.
    Parse { msg: String, line: usize },
    /// An alias references an anchor absent from the document's anchor table.
    UnknownAnchor { name: String },
    /// An alias expansion re-entered the anchor it is expanding.
    RecursiveAnchor { name: String },
    /// An explicitly tagged scalar cannot be parsed as the tagged type.
    TagCoercion { raw: String, tag: &'static str },
    /// Total alias expansions exceeded [`crate::AliasLimits::max_expansions`].
    AliasLimit { limit: usize },
    /// Duplicate mapping key under [`crate::DuplicateKeyPolicy::Error`].
    DuplicateKey {
        key: Option<String>,
        location: Location,
    },
    /// Nesting depth guard tripped while building the tree.
    Depth { location: Location },
    /// The node cannot be placed into the requested target shape.
    Mismatch {
        expected: &'static str,
        location: Location,
    },
    /// The event stream ended where a node was required.
    Eof { location: Location },
    /// Free-form message, including everything serde reports via `custom`.
    Message { msg: String, location: Location },
}

impl Error {
    /// Construct a `Message` error with no known location.
    pub(crate) fn msg<S: Into<String>>(s: S) -> Self {
        Error::Message {
            msg: s.into(),
            location: Location::UNKNOWN,
        }
    }

    pub(crate) fn mismatch(expected: &'static str, location: Location) -> Self {
        Error::Mismatch { expected, location }
    }

    /// Map a `saphyr_parser::ScanError` into a parse error carrying the
    /// problem line.
    pub(crate) fn from_scan_error(err: ScanError) -> Self {
        let mark = err.marker();
        let info = err.info();
        let msg = if info.is_empty() {
            "Unknown problem parsing YAML content".to_string()
        } else {
            info.to_string()
        };
        Error::Parse {
            msg,
            line: mark.line(),
        }
    }

    /// Attach a concrete location to this error and return it.
    pub(crate) fn with_location(mut self, set: Location) -> Self {
        match &mut self {
            Error::DuplicateKey { location, .. }
            | Error::Depth { location }
            | Error::Mismatch { location, .. }
            | Error::Eof { location }
            | Error::Message { location, .. } => {
                *location = set;
            }
            _ => {}
        }
        self
    }

    /// The source location, when one is known.
    pub fn location(&self) -> Option<Location> {
        match self {
            Error::Parse { line, .. } => {
                if *line != 0 {
                    Some(Location::new(*line, 1))
                } else {
                    None
                }
            }
            Error::DuplicateKey { location, .. }
            | Error::Depth { location }
            | Error::Mismatch { location, .. }
            | Error::Eof { location }
            | Error::Message { location, .. } => {
                if location != &Location::UNKNOWN {
                    Some(*location)
                } else {
                    None
                }
            }
            _ => None,
        }
    }

    /// True when the error must abort the whole decode call.
    pub(crate) fn is_fatal(&self) -> bool {
        !matches!(
            self,
            Error::Mismatch { .. } | Error::Eof { .. } | Error::Message { .. }
        )
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "YAML error: ")?;
        match self {
            Error::Parse { msg, line } => {
                if *line != 0 {
                    write!(f, "line {line}: {msg}")
                } else {
                    write!(f, "{msg}")
                }
            }
            Error::UnknownAnchor { name } => {
                write!(f, "Unknown anchor '{name}' referenced")
            }
            Error::RecursiveAnchor { name } => {
                write!(f, "Anchor '{name}' value contains itself")
            }
            Error::TagCoercion { raw, tag } => {
                write!(f, "Can't decode !!str '{raw}' as a {tag}")
            }
            Error::AliasLimit { limit } => {
                write!(f, "alias expansion limit exceeded ({limit})")
            }
            Error::DuplicateKey { key, location } => {
                match key {
                    Some(k) => write!(f, "duplicate mapping key: {k}")?,
                    None => write!(f, "duplicate mapping key")?,
                }
                fmt_location(f, location)
            }
            Error::Depth { location } => {
                write!(f, "nesting depth limit exceeded")?;
                fmt_location(f, location)
            }
            Error::Mismatch { expected, location } => {
                write!(f, "expected {expected}")?;
                fmt_location(f, location)
            }
            Error::Eof { location } => {
                write!(f, "unexpected end of input")?;
                fmt_location(f, location)
            }
            Error::Message { msg, location } => {
                write!(f, "{msg}")?;
                fmt_location(f, location)
            }
        }
    }
}

fn fmt_location(f: &mut fmt::Formatter<'_>, location: &Location) -> fmt::Result {
    if location != &Location::UNKNOWN {
        write!(f, " at line {}, column {}", location.line, location.column)
    } else {
        Ok(())
    }
}

impl std::error::Error for Error {}

impl de::Error for Error {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        Error::msg(msg.to_string())
    }
}
