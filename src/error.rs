//! Error types for grammar construction and parsing.

use thiserror::Error;

use crate::token::{Token, TokenMatch};

/// Result type for parse operations.
///
/// A convenience alias for `Result<T, ParseError>` used throughout
/// the library.
pub type ParseResult<T> = Result<T, ParseError>;

/// A structured parse failure.
///
/// Every variant reports the byte offset at which the failure occurred,
/// available uniformly through [`ParseError::offset`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    /// The lexer found nothing at the offset and no specific token was
    /// expected.
    #[error("no token matches the input at offset {offset}")]
    NoMatchingToken { offset: usize },

    /// A specific token was required but the lexer produced a different
    /// match.
    #[error("expected {} at offset {}, found {}", .expected, .actual.offset(), .actual)]
    MismatchedToken { expected: Token, actual: TokenMatch },

    /// A specific token was required and nothing matched at all.
    #[error("expected {token} at offset {offset}, but nothing matched")]
    UnmatchedToken { token: Token, offset: usize },

    /// A repetition fell short of its lower bound.
    #[error("expected at least {expected} repetitions at offset {offset}, found only {actual}")]
    NotEnoughRepetition {
        offset: usize,
        expected: usize,
        actual: usize,
    },

    /// Every alternative of a choice failed. `causes` holds the individual
    /// branch failures; `offset` is the furthest any of them reached.
    #[error("no viable alternative at offset {offset}")]
    NoViableAlternative {
        offset: usize,
        causes: Vec<ParseError>,
    },
}

impl ParseError {
    /// Byte offset at which this failure occurred.
    pub fn offset(&self) -> usize {
        match self {
            ParseError::NoMatchingToken { offset }
            | ParseError::UnmatchedToken { offset, .. }
            | ParseError::NotEnoughRepetition { offset, .. }
            | ParseError::NoViableAlternative { offset, .. } => *offset,
            ParseError::MismatchedToken { actual, .. } => actual.offset(),
        }
    }

    /// The failure that made it furthest into the input.
    ///
    /// For [`ParseError::NoViableAlternative`] this is the cause with the
    /// greatest offset (the last such cause when several tie); for every
    /// other variant it is the error itself.
    pub fn principal(&self) -> &ParseError {
        match self {
            ParseError::NoViableAlternative { offset, causes } => causes
                .iter()
                .rev()
                .find(|cause| cause.offset() == *offset)
                .unwrap_or(self),
            other => other,
        }
    }

    /// Aggregate the failures of an exhausted choice.
    ///
    /// Causes that are themselves alternative aggregates are flattened so
    /// chained choices report one flat cause list.
    pub(crate) fn no_viable_alternative(causes: Vec<ParseError>) -> ParseError {
        let mut flat = Vec::with_capacity(causes.len());
        for cause in causes {
            match cause {
                ParseError::NoViableAlternative { causes: inner, .. } => flat.extend(inner),
                other => flat.push(other),
            }
        }
        let offset = flat.iter().map(ParseError::offset).max().unwrap_or(0);
        ParseError::NoViableAlternative {
            offset,
            causes: flat,
        }
    }
}

/// A failure while assembling a grammar.
#[derive(Debug, Error)]
pub enum GrammarError {
    /// A token pattern did not compile.
    #[error("invalid pattern for token `{name}`")]
    InvalidPattern {
        name: String,
        #[source]
        source: regex::Error,
    },

    /// Literal tokens must match at least one character.
    #[error("literal for token `{name}` must not be empty")]
    EmptyLiteral { name: String },

    /// A token with the same name is already registered.
    #[error("token `{name}` is already registered")]
    DuplicateToken { name: String },
}
