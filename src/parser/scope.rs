//! The capability set available inside a parser body.

use crate::error::{ParseError, ParseResult};
use crate::parser::session::Session;
use crate::parser::Parser;
use crate::token::{Token, TokenMatch};

/// Capabilities handed to [`Parser::from_fn`] bodies.
///
/// Only the engine constructs a scope, and the exclusive borrow confines it
/// to one body invocation: it cannot be stored away or carried into another
/// session.
pub struct ParsingScope<'s> {
    session: &'s mut Session,
}

impl<'s> ParsingScope<'s> {
    pub(crate) fn new(session: &'s mut Session) -> Self {
        ParsingScope { session }
    }

    /// Run a sub-parser from the current position.
    ///
    /// On success the position is left after the consumed input. On failure
    /// the position is restored to where it was at the call and the error
    /// comes back as a value: propagate it with `?` to fail the surrounding
    /// branch, or inspect it to try something else; this is the only
    /// recovery boundary.
    pub fn parse<R: 'static>(&mut self, parser: &Parser<R>) -> ParseResult<R> {
        self.session.run_parser(parser)
    }

    /// Expect a specific token at the current position.
    ///
    /// A pure lexer call: advances past the match on success, leaves the
    /// position untouched on failure, never suspends.
    pub fn expect(&mut self, token: &Token) -> ParseResult<TokenMatch> {
        self.session.expect_token(token)
    }

    /// Abandon the current branch with `error`.
    ///
    /// Shaped as a `ParseResult` so bodies read `return scope.fail(..)`.
    pub fn fail<R>(&self, error: ParseError) -> ParseResult<R> {
        Err(error)
    }

    /// Current position (byte offset). Read-only.
    pub fn offset(&self) -> usize {
        self.session.offset()
    }

    /// The match the lexer produces at the current position, without
    /// consuming it.
    pub fn current_token(&mut self) -> Option<TokenMatch> {
        self.session.current_token()
    }

    /// Run a sub-parser and discard its value.
    pub fn skip<R: 'static>(&mut self, parser: &Parser<R>) -> ParseResult<()> {
        self.parse(parser).map(|_| ())
    }

    /// `true` if `parser` matches here, consuming it when it does;
    /// positioned exactly like [`ParsingScope::parse`].
    pub fn check<R: 'static>(&mut self, parser: &Parser<R>) -> bool {
        self.parse(parser).is_ok()
    }
}
