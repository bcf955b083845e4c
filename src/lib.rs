//! retrace - a backtracking parser-combinator library
//!
//! A grammar is declared as a set of tokens plus composable parsers and run
//! against a string, yielding either a parsed value or a structured
//! [`ParseError`]. Parsers execute on a trampolined engine: alternation
//! installs a constant-size backtrack point, failure hops to the innermost
//! one and restores the lexer position, and chained alternatives run without
//! growing the native stack.
//!
//! ```
//! use retrace::{left_associative, Grammar};
//!
//! let sums = Grammar::build(|g| {
//!     g.ignore("whitespace", r"\s+")?;
//!     let int = g.pattern("int", r"\d+")?;
//!     let plus = g.literal("plus", "+")?;
//!     let number = int.map(|m| m.text().parse::<i64>().unwrap());
//!     Ok(left_associative(number, plus, |l, _, r| l + r))
//! })
//! .unwrap();
//!
//! assert_eq!(sums.parse("1 + 4 + 2").unwrap(), 7);
//! assert!(sums.parse("1 +").is_err());
//! ```

pub mod error;
pub mod grammar;
mod lexer;
pub mod parser;
pub mod token;

pub use error::{GrammarError, ParseError, ParseResult};
pub use grammar::{Grammar, GrammarBuilder};
pub use parser::{
    any_token, at_least, left_associative, many, many1, one_of, optional, separated, token,
    Parser, ParsingScope,
};
pub use token::{Token, TokenMatch, TokenSpec};
