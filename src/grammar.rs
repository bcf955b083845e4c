//! Grammar assembly and parse entry points.

use std::collections::HashSet;
use std::rc::Rc;

use tracing::debug;

use crate::error::{GrammarError, ParseError, ParseResult};
use crate::lexer::Lexer;
use crate::parser::session::Session;
use crate::parser::{token, Parser};
use crate::token::{GrammarId, Token, TokenMatch, TokenSpec};

/// Token registration surface handed to [`Grammar::build`]'s closure.
///
/// Registration order is the lexer's priority order. The builder cannot
/// outlive the closure, so the token set is frozen by the time the grammar
/// exists.
pub struct GrammarBuilder {
    grammar: GrammarId,
    tokens: Vec<Token>,
    names: HashSet<String>,
    eof: Token,
}

impl GrammarBuilder {
    fn new(grammar: GrammarId) -> Self {
        GrammarBuilder {
            grammar,
            tokens: Vec::new(),
            names: HashSet::new(),
            eof: Token::end_of_input(grammar),
        }
    }

    /// Register a token from a full description and get its handle.
    pub fn register(&mut self, spec: TokenSpec) -> Result<Token, GrammarError> {
        if let Some(name) = spec.name() {
            if !self.names.insert(name.to_string()) {
                return Err(GrammarError::DuplicateToken {
                    name: name.to_string(),
                });
            }
        }
        let index = self.tokens.len() as u32;
        let data = spec.compile(self.grammar, index)?;
        let token = Token::new(data);
        self.tokens.push(token.clone());
        Ok(token)
    }

    /// Register an exact literal and get a parser for it.
    pub fn literal(&mut self, name: &str, text: &str) -> Result<Parser<TokenMatch>, GrammarError> {
        self.register(TokenSpec::literal(text).named(name))
            .map(|t| token(&t))
    }

    /// Register a case-insensitive literal and get a parser for it.
    pub fn literal_ci(
        &mut self,
        name: &str,
        text: &str,
    ) -> Result<Parser<TokenMatch>, GrammarError> {
        self.register(TokenSpec::literal(text).named(name).case_insensitive())
            .map(|t| token(&t))
    }

    /// Register an anchored regex token and get a parser for it.
    pub fn pattern(
        &mut self,
        name: &str,
        pattern: &str,
    ) -> Result<Parser<TokenMatch>, GrammarError> {
        self.register(TokenSpec::pattern(pattern).named(name))
            .map(|t| token(&t))
    }

    /// Register an ignored token: its matches are consumed by the lexer and
    /// never surfaced to parsers.
    pub fn ignore(&mut self, name: &str, pattern: &str) -> Result<(), GrammarError> {
        self.register(TokenSpec::pattern(pattern).named(name).ignored())
            .map(|_| ())
    }

    /// Handle to the end-of-input token.
    pub fn eof(&self) -> Token {
        self.eof.clone()
    }
}

/// A frozen grammar: the registered token set plus a root parser.
///
/// Each [`Grammar::parse`] call runs in a fresh session with its own lexer,
/// so one grammar serves any number of consecutive parses.
pub struct Grammar<V> {
    id: GrammarId,
    tokens: Rc<[Token]>,
    eof: Token,
    root: Parser<V>,
}

impl<V> std::fmt::Debug for Grammar<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Grammar")
            .field("id", &self.id)
            .field("tokens", &self.tokens)
            .field("eof", &self.eof)
            .finish_non_exhaustive()
    }
}

impl<V> Clone for Grammar<V> {
    fn clone(&self) -> Self {
        Grammar {
            id: self.id,
            tokens: Rc::clone(&self.tokens),
            eof: self.eof.clone(),
            root: self.root.clone(),
        }
    }
}

impl<V: 'static> Grammar<V> {
    /// Build a grammar in one shot.
    ///
    /// The closure registers tokens through the builder and returns the root
    /// parser; the token set is frozen when `build` returns.
    ///
    /// ```
    /// use retrace::{left_associative, Grammar};
    ///
    /// let sums = Grammar::build(|g| {
    ///     g.ignore("whitespace", r"\s+")?;
    ///     let int = g.pattern("int", r"\d+")?;
    ///     let plus = g.literal("plus", "+")?;
    ///     let number = int.map(|m| m.text().parse::<i64>().unwrap());
    ///     Ok(left_associative(number, plus, |l, _, r| l + r))
    /// })
    /// .unwrap();
    ///
    /// assert_eq!(sums.parse("1 + 4 + 2").unwrap(), 7);
    /// ```
    pub fn build<F>(define: F) -> Result<Grammar<V>, GrammarError>
    where
        F: FnOnce(&mut GrammarBuilder) -> Result<Parser<V>, GrammarError>,
    {
        let id = GrammarId::fresh();
        let mut builder = GrammarBuilder::new(id);
        let root = define(&mut builder)?;
        Ok(Grammar {
            id,
            tokens: builder.tokens.into(),
            eof: builder.eof,
            root,
        })
    }

    /// Parse `input` with the root parser, demanding end of input.
    pub fn parse(&self, input: &str) -> ParseResult<V> {
        self.parse_with(&self.root, input)
    }

    /// Parse `input` with an explicit parser (plus end of input).
    pub fn parse_with<T: 'static>(&self, parser: &Parser<T>, input: &str) -> ParseResult<T> {
        debug!(input_len = input.len(), "parse session started");
        let mut session = Session::new(self.id, Lexer::new(input, Rc::clone(&self.tokens)));
        let wrapped = parser.clone().then_skip(token(&self.eof));
        session.run_parser(&wrapped).map_err(|error| {
            // report the failure that made it furthest into the input
            match session.take_furthest() {
                Some(furthest) if furthest.offset() >= error.offset() => furthest,
                _ => error,
            }
        })
    }

    /// Parse, mapping failure to `None`.
    pub fn parse_opt(&self, input: &str) -> Option<V> {
        self.parse(input).ok()
    }

    /// Parse, substituting `default` on failure.
    pub fn parse_or(&self, input: &str, default: V) -> V {
        self.parse(input).unwrap_or(default)
    }

    /// Parse, computing a fallback from the error.
    pub fn parse_or_else<F: FnOnce(ParseError) -> V>(&self, input: &str, fallback: F) -> V {
        self.parse(input).unwrap_or_else(fallback)
    }

    /// The registered tokens, in registration order.
    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }
}
