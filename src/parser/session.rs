//! # The backtracking execution engine
//!
//! This module provides the core infrastructure parsers run on:
//! - **Session**: one parse run: position, the pending task, the chain of
//!   backtrack points, and the furthest failure seen
//! - **The trampoline**: the loop that drives parser tasks without nesting
//!   native stack frames
//!
//! ## Why a trampoline
//!
//! A grammar `A = B C D` composes by sequencing; `A = B | C` composes by
//! alternation. Every sub-parser start and every value delivery goes through
//! the session's single continuation register instead of a native call, so a
//! chain of alternatives, however long, runs in constant native stack.
//! Heap usage is what grows: one constant-size backtrack point per live
//! attempt.
//!
//! ## Backtracking
//!
//! [`Session::attempt`] is the alternation primitive. It saves the current
//! position and installs a backtrack point in O(1):
//!
//! ```text
//! attempt(p, k):
//!     push point { saved position, deliver Err to k }
//!     start p with a success continuation that pops the point
//!         (position stays advanced) and delivers Ok to k
//! ```
//!
//! [`Session::fail`] pops the innermost point, restores its saved position
//! and runs its failure continuation. Exactly one of the two continuations
//! ever runs, so on either exit the previously installed point is current
//! again and the caller observes a single `ParseResult`.
//!
//! ## Failure bookkeeping
//!
//! Every failure passes through [`Session::fail`], which records the error
//! that made it furthest into the input. The top-level parse reports that
//! furthest failure when the run as a whole fails; in recursive descent the
//! real problem is usually at the deepest point reached, not wherever the
//! last alternative gave up.

use std::cell::Cell;
use std::rc::Rc;

use tracing::trace;

use crate::error::{ParseError, ParseResult};
use crate::lexer::Lexer;
use crate::parser::Parser;
use crate::token::{GrammarId, Token, TokenMatch};

/// A unit of scheduled work: the single pending task of the trampoline.
pub(crate) type Thunk = Box<dyn FnOnce(&mut Session)>;

/// Continuation resumed with a successfully parsed value.
pub(crate) type Resume<R> = Box<dyn FnOnce(&mut Session, R)>;

/// Continuation resumed with the outcome of an attempted parser.
pub(crate) type Outcome<R> = Box<dyn FnOnce(&mut Session, ParseResult<R>)>;

/// Continuation resumed when a branch fails.
type OnFail = Box<dyn FnOnce(&mut Session, ParseError)>;

/// A restorable alternative: where to rewind and what to run on failure.
struct BacktrackPoint {
    saved_pos: usize,
    on_fail: OnFail,
}

/// State of one parse run.
///
/// Created per parse call and destroyed when it returns; exactly one
/// consumer drives it at a time. Parsers never touch the session directly;
/// they reach it through the engine or a [`crate::ParsingScope`].
pub(crate) struct Session {
    grammar: GrammarId,
    lexer: Lexer,
    /// Byte offset of the next input to consume.
    position: usize,
    /// The next task to resume; `None` stops the drive loop.
    cont: Option<Thunk>,
    /// Innermost-last stack of live backtrack points.
    backtrack: Vec<BacktrackPoint>,
    /// Failure that made it furthest into the input.
    furthest: Option<ParseError>,
}

impl Session {
    pub(crate) fn new(grammar: GrammarId, lexer: Lexer) -> Self {
        Session {
            grammar,
            lexer,
            position: 0,
            cont: None,
            backtrack: Vec::new(),
            furthest: None,
        }
    }

    /// Current position (byte offset).
    pub(crate) fn offset(&self) -> usize {
        self.position
    }

    /// Install `thunk` as the next trampoline step.
    pub(crate) fn schedule(&mut self, thunk: Thunk) {
        debug_assert!(self.cont.is_none(), "a task is already scheduled");
        self.cont = Some(thunk);
    }

    /// Hand `value` to `resume` as the next trampoline step.
    pub(crate) fn deliver<R: 'static>(&mut self, resume: Resume<R>, value: R) {
        self.schedule(Box::new(move |session| resume(session, value)));
    }

    fn deliver_outcome<R: 'static>(&mut self, outcome: Outcome<R>, result: ParseResult<R>) {
        self.schedule(Box::new(move |session| outcome(session, result)));
    }

    /// Abandon the current branch.
    ///
    /// Records the failure for furthest-error reporting, pops the innermost
    /// backtrack point and schedules it: position is restored to the point's
    /// saved offset before its failure continuation runs.
    pub(crate) fn fail(&mut self, error: ParseError) {
        self.record_failure(&error);
        let point = self
            .backtrack
            .pop()
            .expect("fail with no backtrack point installed");
        trace!(
            at = self.position,
            restore_to = point.saved_pos,
            "backtracking"
        );
        self.schedule(Box::new(move |session| {
            session.position = point.saved_pos;
            (point.on_fail)(session, error);
        }));
    }

    fn record_failure(&mut self, error: &ParseError) {
        let replace = self
            .furthest
            .as_ref()
            .map_or(true, |recorded| error.offset() >= recorded.offset());
        if replace {
            self.furthest = Some(error.clone());
        }
    }

    pub(crate) fn take_furthest(&mut self) -> Option<ParseError> {
        self.furthest.take()
    }

    /// Attempt `parser`, delivering its `ParseResult` to `outcome` exactly
    /// once.
    ///
    /// On success the position is left advanced; on failure it is restored
    /// to the value at entry. Either way the previously installed backtrack
    /// point is current again by the time `outcome` runs, so attempts nest
    /// without leaking alternatives.
    ///
    /// The caller continuation is held in a take-once cell shared between
    /// the success and failure paths; exactly one of them runs.
    pub(crate) fn attempt<R: 'static>(&mut self, parser: &Parser<R>, outcome: Outcome<R>) {
        let saved_pos = self.position;
        let shared = Rc::new(Cell::new(Some(outcome)));
        let depth = self.backtrack.len() + 1;

        let on_fail = {
            let shared = Rc::clone(&shared);
            Box::new(move |session: &mut Session, error: ParseError| {
                let outcome = shared
                    .take()
                    .expect("attempt continuation already consumed");
                session.deliver_outcome(outcome, Err(error));
            })
        };
        self.backtrack.push(BacktrackPoint { saved_pos, on_fail });

        parser.start(
            self,
            Box::new(move |session: &mut Session, value: R| {
                debug_assert_eq!(
                    session.backtrack.len(),
                    depth,
                    "unbalanced backtrack points"
                );
                session.backtrack.pop();
                let outcome = shared
                    .take()
                    .expect("attempt continuation already consumed");
                session.deliver_outcome(outcome, Ok(value));
            }),
        );
    }

    /// Drive the trampoline until no task is pending.
    fn drive(&mut self) {
        while let Some(task) = self.cont.take() {
            task(self);
        }
    }

    /// Run `parser` to completion as a (sub-)session root.
    ///
    /// Re-entrant: parser bodies call back in through their scope, which
    /// spins an inner drive loop over the same session. The attempt's
    /// bottom backtrack point catches an otherwise unhandled failure, so
    /// the run always produces an outcome, with position restored to entry
    /// on failure.
    pub(crate) fn run_parser<R: 'static>(&mut self, parser: &Parser<R>) -> ParseResult<R> {
        let saved_cont = self.cont.take();
        let floor = self.backtrack.len();
        let slot: Rc<Cell<Option<ParseResult<R>>>> = Rc::new(Cell::new(None));

        let outcome = {
            let slot = Rc::clone(&slot);
            Box::new(move |_session: &mut Session, result: ParseResult<R>| {
                slot.set(Some(result));
            })
        };
        self.attempt(parser, outcome);
        self.drive();

        debug_assert_eq!(self.backtrack.len(), floor, "unbalanced backtrack points");
        self.cont = saved_cont;
        match slot.take() {
            Some(result) => result,
            None => unreachable!("parser run finished without delivering an outcome"),
        }
    }

    /// Synchronous token expectation: the lexer fast path. Advances on
    /// success, leaves the position untouched on failure, never suspends.
    pub(crate) fn expect_token(&mut self, token: &Token) -> ParseResult<TokenMatch> {
        assert!(
            token.grammar_id() == self.grammar,
            "token `{token}` is not registered in the grammar driving this session"
        );
        if token.is_end_of_input() {
            let at = self.lexer.skip_ignored(self.position);
            if at == self.lexer.input().len() {
                self.position = at;
                return Ok(TokenMatch::new(token.clone(), at, 0, String::new()));
            }
            return Err(match self.lexer.find_match(at) {
                Some(actual) => ParseError::MismatchedToken {
                    expected: token.clone(),
                    actual,
                },
                None => ParseError::UnmatchedToken {
                    token: token.clone(),
                    offset: at,
                },
            });
        }
        match self.lexer.find_match(self.position) {
            Some(found) if found.token() == token => {
                self.position = found.end();
                Ok(found)
            }
            Some(actual) => Err(ParseError::MismatchedToken {
                expected: token.clone(),
                actual,
            }),
            None => Err(ParseError::UnmatchedToken {
                token: token.clone(),
                offset: self.lexer.skip_ignored(self.position),
            }),
        }
    }

    /// Whatever token the lexer produces next, consumed.
    pub(crate) fn next_any_token(&mut self) -> ParseResult<TokenMatch> {
        match self.lexer.find_match(self.position) {
            Some(found) => {
                self.position = found.end();
                Ok(found)
            }
            None => Err(ParseError::NoMatchingToken {
                offset: self.lexer.skip_ignored(self.position),
            }),
        }
    }

    /// The match at the current position, without consuming it.
    pub(crate) fn current_token(&mut self) -> Option<TokenMatch> {
        self.lexer.find_match(self.position)
    }
}
