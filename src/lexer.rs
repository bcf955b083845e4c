//! The lexer: ignored-token skipping and priority-ordered matching.
//!
//! The lexer owns the input and the frozen, registration-ordered token list.
//! It is stateless with respect to parsing position: the engine asks for
//! the match at an offset and decides itself whether to consume it. Lookups
//! are memoized per session, keyed on post-skip offsets, so backtracking
//! over the same region never re-runs the matchers.

use std::collections::HashMap;
use std::rc::Rc;

use crate::token::{Token, TokenMatch};

pub(crate) struct Lexer {
    input: Rc<str>,
    tokens: Rc<[Token]>,
    skip_memo: HashMap<usize, usize>,
    match_memo: HashMap<usize, Option<TokenMatch>>,
}

impl Lexer {
    pub(crate) fn new(input: impl Into<Rc<str>>, tokens: Rc<[Token]>) -> Self {
        Lexer {
            input: input.into(),
            tokens,
            skip_memo: HashMap::new(),
            match_memo: HashMap::new(),
        }
    }

    pub(crate) fn input(&self) -> &str {
        &self.input
    }

    /// Advance `offset` past every ignored match.
    ///
    /// While any ignored token matches with nonzero length, skip past the
    /// longest such match; equal lengths are broken by registration order.
    pub(crate) fn skip_ignored(&mut self, offset: usize) -> usize {
        if let Some(&skipped) = self.skip_memo.get(&offset) {
            return skipped;
        }
        let mut current = offset;
        loop {
            let mut longest = None;
            for token in self.tokens.iter().filter(|token| token.is_ignored()) {
                if let Some(len) = token.match_len(&self.input, current) {
                    // a zero-length ignored match cannot advance the offset
                    if len > 0 && longest.map_or(true, |best| len > best) {
                        longest = Some(len);
                    }
                }
            }
            match longest {
                Some(len) => current += len,
                None => break,
            }
        }
        self.skip_memo.insert(offset, current);
        current
    }

    /// The single match the grammar should consume at `offset`, if any.
    ///
    /// Ignored tokens are skipped first; the surfaced candidates are then
    /// tried in registration order and the first that matches wins, so the
    /// grammar author controls priority.
    pub(crate) fn find_match(&mut self, offset: usize) -> Option<TokenMatch> {
        let offset = self.skip_ignored(offset);
        if let Some(memoized) = self.match_memo.get(&offset) {
            return memoized.clone();
        }
        let found = self
            .tokens
            .iter()
            .filter(|token| !token.is_ignored())
            .find_map(|token| {
                token.match_len(&self.input, offset).map(|len| {
                    let text = self.input[offset..offset + len].to_string();
                    TokenMatch::new(token.clone(), offset, len, text)
                })
            });
        self.match_memo.insert(offset, found.clone());
        found
    }
}
