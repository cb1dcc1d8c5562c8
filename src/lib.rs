//! A monadic parser combinator library in the Parsec tradition.
//!
//! Parsers are built by composing small, reusable pieces — [`token::token`] and [`token::tokens`]
//! at the bottom, character- and string-level combinators in [`char`], generic repetition and
//! sequencing in [`combinator`], and a lexeme/language layer in [`lexeme`]/[`language`] for
//! building a tokenizer out of a [`lexeme::LanguageDef`] — rather than by writing a single
//! hand-rolled recursive-descent function. Every parser implements [`parser::Parser`]; running one
//! against input is always `parser.run(name, input, initial_user_state)`.
//!
//! The reply algebra a parser invocation produces ([`core::Consumed`] × [`core::Reply`]) is the
//! thing that makes predictive choice ([`Parser::alt`]) and focused error messages possible: a
//! parser that has consumed input before failing commits to that failure, and [`Parser::attempt`]
//! is the explicit way to opt back into backtracking across a consumed prefix.
//!
//! ```
//! use trestle::char::digit;
//! use trestle::combinator::many1;
//! use trestle::parser::Parser;
//!
//! let mut digits = many1(digit::<&str, ()>());
//! let (value, _) = digits.run("input", "123abc", ()).unwrap();
//! assert_eq!(value, vec!['1', '2', '3']);
//! ```

#![warn(rust_2018_idioms, unreachable_pub, unused_lifetimes)]

pub mod char;
pub mod combinator;
pub mod core;
pub mod error;
pub mod language;
pub mod lexeme;
pub mod parser;
pub mod state;
pub mod token;

#[cfg(feature = "debug")]
pub mod trace;

/// Re-exports covering the common case: build a grammar without hunting through modules.
pub mod prelude {
    pub use crate::char::{
        alpha_num, any_token, character, crlf, digit, end_of_line, hex_digit, letter, lower,
        newline, none_of, oct_digit, one_of, space, string, symbol_char, unicode_space, upper,
    };
    pub use crate::combinator::{
        between, build_expression_parser, chain_l, chain_l1, chain_r, chain_r1, choice, count,
        many, many1, many_till, no_occurence, option, optional, recursive, sep_by, sep_by1,
        sep_end_by, sep_end_by1, skip_many, skip_many1, Assoc, Operator, OperatorTable,
    };
    pub use crate::error::{Message, ParseError, SourcePos};
    pub use crate::language::{empty_def, java_style, json_def, swift_def};
    pub use crate::lexeme::{EscapeStyle, LanguageDef, Number, TokenParser};
    pub use crate::parser::{empty, fail, pure, unexpected, update_user_state, FinishParse, Parser};
    pub use crate::state::{ParserState, Stream};
    pub use crate::token::eof;
}
