//! Shared error taxonomy for the core domain and the parse boundary.

use core::fmt;

/// Errors raised while constructing or validating core domain types.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum CoreError {
    InvalidStableId,
    InvalidVersion,
    InvalidRampUp,
    InvalidLocale,
    InvalidPlatform,
    InvalidAxisId,
    EmptyFeatureId,
}

impl fmt::Display for CoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CoreError::InvalidStableId => write!(f, "invalid stable id"),
            CoreError::InvalidVersion => write!(f, "invalid version"),
            CoreError::InvalidRampUp => write!(f, "invalid ramp-up percentage"),
            CoreError::InvalidLocale => write!(f, "invalid locale"),
            CoreError::InvalidPlatform => write!(f, "invalid platform"),
            CoreError::InvalidAxisId => write!(f, "invalid axis id"),
            CoreError::EmptyFeatureId => write!(f, "empty feature id"),
        }
    }
}

impl std::error::Error for CoreError {}

/// The parse-boundary error taxonomy. Carried here (rather than in
/// `kdt_io`) so that `kdt_registry`'s deferred-value resolution can raise the
/// same variants without an I/O dependency.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ParseError {
    InvalidJson(String),
    InvalidSnapshot(String),
    FeatureNotFound(String),
    TypeMismatch { feature_id: String, expected: &'static str, found: &'static str },
    CycleDetected(String),
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::InvalidJson(msg) => write!(f, "invalid json: {msg}"),
            ParseError::InvalidSnapshot(msg) => write!(f, "invalid snapshot: {msg}"),
            ParseError::FeatureNotFound(id) => write!(f, "feature not found: {id}"),
            ParseError::TypeMismatch { feature_id, expected, found } => write!(
                f,
                "type mismatch for feature {feature_id}: expected {expected}, found {found}"
            ),
            ParseError::CycleDetected(id) => write!(f, "cycle detected at feature: {id}"),
        }
    }
}

impl std::error::Error for ParseError {}

pub type ParseResult<T> = Result<T, ParseError>;
