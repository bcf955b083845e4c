//! Token identity, registration descriptions, and concrete matches.

use std::fmt;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use regex::{Regex, RegexBuilder};

use crate::error::GrammarError;

/// Process-unique identity of a grammar, used to tie tokens to the grammar
/// that registered them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct GrammarId(u64);

impl GrammarId {
    pub(crate) fn fresh() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        GrammarId(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

#[derive(Debug)]
pub(crate) enum Matcher {
    Literal {
        text: String,
        case_insensitive: bool,
    },
    Pattern {
        regex: Regex,
        source: String,
        allow_empty: bool,
    },
    EndOfInput,
}

#[derive(Debug)]
pub(crate) struct TokenData {
    grammar: GrammarId,
    index: u32,
    name: Option<String>,
    matcher: Matcher,
    ignored: bool,
    first_chars: Option<Vec<char>>,
}

/// A registered terminal recognizer with stable identity.
///
/// Identity is per registration: two tokens registered from identical
/// descriptions are distinct. Cloning the handle is cheap and preserves
/// identity.
#[derive(Clone)]
pub struct Token(Rc<TokenData>);

impl Token {
    pub(crate) fn new(data: TokenData) -> Self {
        Token(Rc::new(data))
    }

    pub(crate) fn end_of_input(grammar: GrammarId) -> Self {
        Token::new(TokenData {
            grammar,
            index: u32::MAX,
            name: Some("end of input".to_string()),
            matcher: Matcher::EndOfInput,
            ignored: false,
            first_chars: None,
        })
    }

    /// The human name given at registration, if any.
    pub fn name(&self) -> Option<&str> {
        self.0.name.as_deref()
    }

    /// Whether matches of this token are consumed without being surfaced.
    pub fn is_ignored(&self) -> bool {
        self.0.ignored
    }

    pub(crate) fn is_end_of_input(&self) -> bool {
        matches!(self.0.matcher, Matcher::EndOfInput)
    }

    pub(crate) fn grammar_id(&self) -> GrammarId {
        self.0.grammar
    }

    /// Length of this token's match at `offset`, or `None` when it does not
    /// match there.
    pub(crate) fn match_len(&self, input: &str, offset: usize) -> Option<usize> {
        let data = &*self.0;
        if let Some(first) = &data.first_chars {
            let next = input[offset..].chars().next()?;
            if !first.contains(&next) {
                return None;
            }
        }
        match &data.matcher {
            Matcher::Literal {
                text,
                case_insensitive: false,
            } => input[offset..].starts_with(text.as_str()).then(|| text.len()),
            Matcher::Literal {
                text,
                case_insensitive: true,
            } => {
                let candidate = input.get(offset..offset + text.len())?;
                candidate.eq_ignore_ascii_case(text).then(|| text.len())
            }
            Matcher::Pattern {
                regex, allow_empty, ..
            } => {
                let found = regex.find(&input[offset..])?;
                debug_assert_eq!(found.start(), 0, "token patterns are anchored");
                (found.end() > 0 || *allow_empty).then(|| found.end())
            }
            Matcher::EndOfInput => (offset == input.len()).then_some(0),
        }
    }
}

impl PartialEq for Token {
    fn eq(&self, other: &Self) -> bool {
        self.0.grammar == other.0.grammar && self.0.index == other.0.index
    }
}

impl Eq for Token {}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(name) = &self.0.name {
            return write!(f, "{name}");
        }
        match &self.0.matcher {
            Matcher::Literal { text, .. } => write!(f, "\"{}\"", text.escape_debug()),
            Matcher::Pattern { source, .. } => write!(f, "/{source}/"),
            Matcher::EndOfInput => write!(f, "end of input"),
        }
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Token({self})")
    }
}

/// Description of a token to register with a grammar builder.
///
/// Starts from [`TokenSpec::literal`] or [`TokenSpec::pattern`] and is
/// refined with the builder-style methods. Case-insensitive literal matching
/// is ASCII-only; for patterns the flag is forwarded to the regex engine.
#[derive(Debug, Clone)]
pub struct TokenSpec {
    name: Option<String>,
    kind: SpecKind,
    ignored: bool,
    case_insensitive: bool,
    allow_empty: bool,
    first_chars: Option<Vec<char>>,
}

#[derive(Debug, Clone)]
enum SpecKind {
    Literal(String),
    Pattern(String),
}

impl TokenSpec {
    /// A token matching `text` exactly.
    pub fn literal(text: impl Into<String>) -> Self {
        TokenSpec {
            name: None,
            kind: SpecKind::Literal(text.into()),
            ignored: false,
            case_insensitive: false,
            allow_empty: false,
            first_chars: None,
        }
    }

    /// A token matching a regex `pattern` anchored at the current offset.
    pub fn pattern(pattern: impl Into<String>) -> Self {
        TokenSpec {
            name: None,
            kind: SpecKind::Pattern(pattern.into()),
            ignored: false,
            case_insensitive: false,
            allow_empty: false,
            first_chars: None,
        }
    }

    /// Human name used in error messages and duplicate detection.
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Consume matches without surfacing them to parsers.
    pub fn ignored(mut self) -> Self {
        self.ignored = true;
        self
    }

    /// Match case-insensitively (ASCII for literals).
    pub fn case_insensitive(mut self) -> Self {
        self.case_insensitive = true;
        self
    }

    /// Allow a pattern token to match the empty string.
    pub fn allow_empty(mut self) -> Self {
        self.allow_empty = true;
        self
    }

    /// Quick-rejection hint: the token can only match where the input starts
    /// with one of `chars`. Derived automatically for literals.
    pub fn first_chars(mut self, chars: &str) -> Self {
        self.first_chars = Some(chars.chars().collect());
        self
    }

    fn label(&self) -> String {
        match (&self.name, &self.kind) {
            (Some(name), _) => name.clone(),
            (None, SpecKind::Literal(text)) => text.clone(),
            (None, SpecKind::Pattern(pattern)) => pattern.clone(),
        }
    }

    pub(crate) fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub(crate) fn compile(self, grammar: GrammarId, index: u32) -> Result<TokenData, GrammarError> {
        let label = self.label();
        let matcher = match self.kind {
            SpecKind::Literal(text) => {
                if text.is_empty() {
                    return Err(GrammarError::EmptyLiteral { name: label });
                }
                Matcher::Literal {
                    text,
                    case_insensitive: self.case_insensitive,
                }
            }
            SpecKind::Pattern(source) => {
                let regex = RegexBuilder::new(&format!(r"\A(?:{source})"))
                    .case_insensitive(self.case_insensitive)
                    .build()
                    .map_err(|err| GrammarError::InvalidPattern {
                        name: label,
                        source: err,
                    })?;
                Matcher::Pattern {
                    regex,
                    source,
                    allow_empty: self.allow_empty,
                }
            }
        };
        let first_chars = self.first_chars.or_else(|| match &matcher {
            Matcher::Literal {
                text,
                case_insensitive,
            } => {
                let first = text.chars().next()?;
                let mut hints = vec![first];
                if *case_insensitive {
                    for variant in [first.to_ascii_lowercase(), first.to_ascii_uppercase()] {
                        if !hints.contains(&variant) {
                            hints.push(variant);
                        }
                    }
                }
                Some(hints)
            }
            _ => None,
        });
        Ok(TokenData {
            grammar,
            index,
            name: self.name,
            matcher,
            ignored: self.ignored,
            first_chars,
        })
    }
}

/// A concrete occurrence of a token at a specific offset.
#[derive(Debug, Clone, PartialEq)]
pub struct TokenMatch {
    token: Token,
    offset: usize,
    length: usize,
    text: String,
}

impl TokenMatch {
    pub(crate) fn new(token: Token, offset: usize, length: usize, text: String) -> Self {
        debug_assert_eq!(text.len(), length);
        TokenMatch {
            token,
            offset,
            length,
            text,
        }
    }

    /// The token this is a match of.
    pub fn token(&self) -> &Token {
        &self.token
    }

    /// Byte offset of the match in the input.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Byte length of the match.
    pub fn len(&self) -> usize {
        self.length
    }

    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    /// Offset just past the match.
    pub fn end(&self) -> usize {
        self.offset + self.length
    }

    /// The matched input slice.
    pub fn text(&self) -> &str {
        &self.text
    }
}

impl fmt::Display for TokenMatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.text.is_empty() {
            write!(f, "{}", self.token)
        } else {
            write!(f, "{} \"{}\"", self.token, self.text.escape_debug())
        }
    }
}
