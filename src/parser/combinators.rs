use std::ops::{Add, BitOr, Mul, Shr, Sub};
use std::rc::Rc;

use crate::error::{ParseError, ParseResult};
use crate::parser::session::{Resume, Session};
use crate::parser::Parser;
use crate::token::{Token, TokenMatch};

// === Combinators as methods ===

impl<R: 'static> Parser<R> {
    /// Map: transform the parsed value.
    pub fn map<U: 'static, F: Fn(R) -> U + 'static>(self, f: F) -> Parser<U> {
        let f = Rc::new(f);
        Parser::from_run(move |session, resume| {
            let f = Rc::clone(&f);
            self.start(
                session,
                Box::new(move |session, value| session.deliver(resume, f(value))),
            );
        })
    }

    /// Sequence: parse self then `next`, yield both values.
    pub fn then<U: 'static>(self, next: Parser<U>) -> Parser<(R, U)> {
        Parser::from_run(move |session, resume| {
            let next = next.clone();
            self.start(
                session,
                Box::new(move |session, first| {
                    next.start(
                        session,
                        Box::new(move |session, second| {
                            session.deliver(resume, (first, second));
                        }),
                    );
                }),
            );
        })
    }

    /// Keep left: parse self then `next`, discard `next`'s value.
    pub fn then_skip<U: 'static>(self, next: Parser<U>) -> Parser<R> {
        self.then(next).map(|(value, _)| value)
    }

    /// Keep right: parse self then `next`, discard self's value.
    pub fn skip_then<U: 'static>(self, next: Parser<U>) -> Parser<U> {
        self.then(next).map(|(_, value)| value)
    }

    /// Choice: try self, if it fails try `alternative` from the same
    /// position.
    pub fn or(self, alternative: Parser<R>) -> Parser<R> {
        one_of(vec![self, alternative])
    }

    /// Catch failure at this boundary and yield the branch outcome as a
    /// value, with the position restored when the branch failed.
    pub fn attempt(self) -> Parser<ParseResult<R>> {
        Parser::from_run(move |session, resume| {
            session.attempt(
                &self,
                Box::new(move |session, result| session.deliver(resume, result)),
            );
        })
    }
}

// === Operator Overloading ===

/// `+` for sequence: A + B -> (A, B)
impl<T: 'static, U: 'static> Add<Parser<U>> for Parser<T> {
    type Output = Parser<(T, U)>;

    fn add(self, rhs: Parser<U>) -> Self::Output {
        self.then(rhs)
    }
}

/// `-` for keep left: A - B -> A (parse B, discard result)
impl<T: 'static, U: 'static> Sub<Parser<U>> for Parser<T> {
    type Output = Parser<T>;

    fn sub(self, rhs: Parser<U>) -> Self::Output {
        self.then_skip(rhs)
    }
}

/// `*` for keep right: A * B -> B (parse A, discard result)
impl<T: 'static, U: 'static> Mul<Parser<U>> for Parser<T> {
    type Output = Parser<U>;

    fn mul(self, rhs: Parser<U>) -> Self::Output {
        self.skip_then(rhs)
    }
}

/// `|` for choice: A | B -> A or B
impl<T: 'static> BitOr<Parser<T>> for Parser<T> {
    type Output = Parser<T>;

    fn bitor(self, rhs: Parser<T>) -> Self::Output {
        self.or(rhs)
    }
}

/// `>>` for map: A >> fn -> B
impl<T: 'static, U: 'static, F: Fn(T) -> U + 'static> Shr<F> for Parser<T> {
    type Output = Parser<U>;

    fn shr(self, f: F) -> Self::Output {
        self.map(f)
    }
}

// === Primitive Parsers ===

/// Expect a specific token: yields its match, fails otherwise.
pub fn token(token: &Token) -> Parser<TokenMatch> {
    let token = token.clone();
    Parser::from_run(move |session, resume| match session.expect_token(&token) {
        Ok(found) => session.deliver(resume, found),
        Err(error) => session.fail(error),
    })
}

/// Whatever token the lexer produces next; fails with `NoMatchingToken`
/// when the input is exhausted or unrecognizable.
pub fn any_token() -> Parser<TokenMatch> {
    Parser::from_run(|session, resume| match session.next_any_token() {
        Ok(found) => session.deliver(resume, found),
        Err(error) => session.fail(error),
    })
}

/// Ordered choice over any number of alternatives.
///
/// Alternatives are tried in order from the same position; the first success
/// commits. When all fail, the branch failures are aggregated into a single
/// [`ParseError::NoViableAlternative`].
pub fn one_of<R: 'static>(options: Vec<Parser<R>>) -> Parser<R> {
    assert!(!options.is_empty(), "one_of requires at least one alternative");
    let options: Rc<[Parser<R>]> = options.into();
    Parser::from_run(move |session, resume| {
        try_option(Rc::clone(&options), 0, Vec::new(), session, resume);
    })
}

fn try_option<R: 'static>(
    options: Rc<[Parser<R>]>,
    index: usize,
    mut causes: Vec<ParseError>,
    session: &mut Session,
    resume: Resume<R>,
) {
    if index == options.len() {
        session.fail(ParseError::no_viable_alternative(causes));
        return;
    }
    let option = options[index].clone();
    session.attempt(
        &option,
        Box::new(move |session, result| match result {
            Ok(value) => session.deliver(resume, value),
            Err(cause) => {
                causes.push(cause);
                try_option(options, index + 1, causes, session, resume);
            }
        }),
    );
}

/// Parse zero or more occurrences.
pub fn many<R: 'static>(parser: Parser<R>) -> Parser<Vec<R>> {
    at_least(0, parser)
}

/// Parse one or more occurrences.
pub fn many1<R: 'static>(parser: Parser<R>) -> Parser<Vec<R>> {
    at_least(1, parser)
}

/// Parse at least `min` occurrences; fewer fail with
/// [`ParseError::NotEnoughRepetition`].
pub fn at_least<R: 'static>(min: usize, parser: Parser<R>) -> Parser<Vec<R>> {
    Parser::from_run(move |session, resume| {
        next_repetition(parser.clone(), min, Vec::new(), session, resume);
    })
}

fn next_repetition<R: 'static>(
    parser: Parser<R>,
    min: usize,
    mut values: Vec<R>,
    session: &mut Session,
    resume: Resume<Vec<R>>,
) {
    let before = session.offset();
    let again = parser.clone();
    session.attempt(
        &parser,
        Box::new(move |session, result| match result {
            Ok(value) => {
                values.push(value);
                // a zero-width success cannot make progress; stop here
                if session.offset() == before {
                    if values.len() >= min {
                        session.deliver(resume, values);
                    } else {
                        session.fail(ParseError::NotEnoughRepetition {
                            offset: before,
                            expected: min,
                            actual: values.len(),
                        });
                    }
                } else {
                    next_repetition(again, min, values, session, resume);
                }
            }
            Err(cause) => {
                if values.len() >= min {
                    session.deliver(resume, values);
                } else {
                    session.fail(ParseError::NotEnoughRepetition {
                        offset: cause.offset(),
                        expected: min,
                        actual: values.len(),
                    });
                }
            }
        }),
    );
}

/// Optional: parse zero or one occurrence.
pub fn optional<R: 'static>(parser: Parser<R>) -> Parser<Option<R>> {
    parser.attempt().map(|result| result.ok())
}

/// `item (separator item)*`, yielding the items.
pub fn separated<R: 'static, S: 'static>(
    item: Parser<R>,
    separator: Parser<S>,
) -> Parser<Vec<R>> {
    item.clone()
        .then(many(separator.skip_then(item)))
        .map(|(first, rest)| {
            let mut values = vec![first];
            values.extend(rest);
            values
        })
}

/// Left-folded operator chain: `operand (operator operand)*`.
pub fn left_associative<R: 'static, O: 'static, F>(
    operand: Parser<R>,
    operator: Parser<O>,
    combine: F,
) -> Parser<R>
where
    F: Fn(R, O, R) -> R + 'static,
{
    let combine = Rc::new(combine);
    operand
        .clone()
        .then(many(operator.then(operand)))
        .map(move |(first, rest)| {
            rest.into_iter()
                .fold(first, |left, (operator, right)| combine(left, operator, right))
        })
}
