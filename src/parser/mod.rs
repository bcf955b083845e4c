//! The parser carrier type and its primitive constructors.
//!
//! A [`Parser`] is an opaque, cheaply clonable unit of composition: run
//! against a session it consumes a prefix of the input and produces a value,
//! or fails. Composition lives in [`combinators`]; hand-written parser
//! bodies are built with [`Parser::from_fn`] and receive a
//! [`ParsingScope`].

mod combinators;
mod scope;
pub(crate) mod session;

pub use combinators::{
    any_token, at_least, left_associative, many, many1, one_of, optional, separated, token,
};
pub use scope::ParsingScope;

use std::rc::Rc;

use crate::error::{ParseError, ParseResult};
use session::{Resume, Session};

/// A composable parser producing values of type `R`.
///
/// Parsers carry no observable state: one instance is reusable across any
/// number of parse sessions, and cloning shares the underlying behavior.
pub struct Parser<R> {
    run: Rc<dyn Fn(&mut Session, Resume<R>)>,
}

impl<R> Clone for Parser<R> {
    fn clone(&self) -> Self {
        Parser {
            run: Rc::clone(&self.run),
        }
    }
}

impl<R: 'static> Parser<R> {
    pub(crate) fn from_run<F>(run: F) -> Self
    where
        F: Fn(&mut Session, Resume<R>) + 'static,
    {
        Parser { run: Rc::new(run) }
    }

    /// Schedule this parser as the session's next task, resuming `resume`
    /// with its value on success. Failure flows through the session's
    /// backtrack chain instead.
    pub(crate) fn start(&self, session: &mut Session, resume: Resume<R>) {
        let run = Rc::clone(&self.run);
        session.schedule(Box::new(move |session| run(session, resume)));
    }

    /// Build a parser from a direct-style body.
    ///
    /// The body receives the [`ParsingScope`], the capability set usable
    /// only for the duration of the body, and either returns a value or an
    /// error. A returned error fails the surrounding branch exactly like a
    /// failing sub-parser.
    pub fn from_fn<F>(body: F) -> Self
    where
        F: Fn(&mut ParsingScope<'_>) -> ParseResult<R> + 'static,
    {
        Parser::from_run(move |session, resume| {
            let result = body(&mut ParsingScope::new(session));
            match result {
                Ok(value) => session.deliver(resume, value),
                Err(error) => session.fail(error),
            }
        })
    }

    /// Defer construction of a parser until it runs.
    ///
    /// This is the knot-tying primitive for recursive grammars: the closure
    /// is called once per invocation, so a rule may refer back to itself
    /// without recursing at construction time.
    pub fn defer<F>(build: F) -> Self
    where
        F: Fn() -> Parser<R> + 'static,
    {
        Parser::from_run(move |session, resume| build().start(session, resume))
    }

    /// Succeed with a clone of `value` without consuming input.
    pub fn pure(value: R) -> Self
    where
        R: Clone,
    {
        Parser::from_run(move |session, resume| session.deliver(resume, value.clone()))
    }

    /// Fail with a clone of `error` without consuming input.
    pub fn failing(error: ParseError) -> Self {
        Parser::from_run(move |session, _resume| session.fail(error.clone()))
    }
}
