//! Character parsers and predicates, built on the single-token primitive.
//!
//! Every parser here is specialized to streams whose item type is `char` and uses
//! [`SourcePos::advance`]'s newline/tab/other rule for position bookkeeping.

use crate::core::{Consumed, Reply};
use crate::error::{Message, ParseError, SourcePos};
use crate::parser::Parser;
use crate::state::{ParserState, Stream};
use crate::token::{quote, token, tokens};

fn char_advance(pos: &mut SourcePos, c: &char) {
    pos.advance(*c);
}

fn char_describe(c: &char) -> String {
    quote(&c.to_string())
}

/// Succeed with the current character if `pred` holds, consuming it; otherwise fail `Empty`
/// without consuming.
pub fn satisfy<I, U>(pred: impl Fn(char) -> bool + Copy) -> impl Parser<I, U, char>
where
    I: Stream<Item = char>,
{
    token(
        move |c: &char| pred(*c).then_some(*c),
        char_describe,
        char_advance,
    )
}

/// Match one specific character exactly.
pub fn character<I, U>(expected: char) -> impl Parser<I, U, char>
where
    I: Stream<Item = char>,
{
    satisfy(move |c| c == expected)
}

/// Succeed with whatever character is next, failing only at end of input.
pub fn any_token<I, U>() -> impl Parser<I, U, char>
where
    I: Stream<Item = char>,
{
    satisfy(|_| true)
}

/// Succeed if the current character is one of `set`, returning it.
pub fn one_of<I, U>(set: impl AsRef<str> + 'static) -> impl Parser<I, U, char>
where
    I: Stream<Item = char>,
{
    let set = set.as_ref().to_string();
    satisfy_owned(move |c| set.contains(c))
}

/// Succeed if the current character is *not* one of `set`, returning it.
pub fn none_of<I, U>(set: impl AsRef<str> + 'static) -> impl Parser<I, U, char>
where
    I: Stream<Item = char>,
{
    let set = set.as_ref().to_string();
    satisfy_owned(move |c| !set.contains(c))
}

// `satisfy` requires `Copy` predicates so it can be reused by value across the many callers that
// build parsers out of it; `one_of`/`none_of` close over an owned `String`, so they go through
// this `Rc`-free equivalent that only needs `Fn`.
fn satisfy_owned<I, U>(pred: impl Fn(char) -> bool + 'static) -> impl Parser<I, U, char>
where
    I: Stream<Item = char>,
{
    token(
        move |c: &char| pred(*c).then_some(*c),
        char_describe,
        char_advance,
    )
}

/// Match an exact string, character by character. Fails `Empty` if the first character disagrees,
/// `Consumed` if a later one does.
pub fn string<I, U>(expected: impl AsRef<str>) -> impl Parser<I, U, String>
where
    I: Stream<Item = char>,
{
    let wanted: Vec<char> = expected.as_ref().chars().collect();
    let rendered = expected.as_ref().to_string();
    tokens::<I, U>(
        wanted,
        char_describe,
        move |_seq| quote(&rendered),
        char_advance,
    )
    .map(|chars| chars.into_iter().collect())
}

/// ASCII decimal digit.
pub fn digit<I, U>() -> impl Parser<I, U, char>
where
    I: Stream<Item = char>,
{
    satisfy(|c| c.is_ascii_digit())
}

/// ASCII hexadecimal digit.
pub fn hex_digit<I, U>() -> impl Parser<I, U, char>
where
    I: Stream<Item = char>,
{
    satisfy(|c| c.is_ascii_hexdigit())
}

/// ASCII octal digit.
pub fn oct_digit<I, U>() -> impl Parser<I, U, char>
where
    I: Stream<Item = char>,
{
    satisfy(|c| ('0'..='7').contains(&c))
}

/// A Unicode letter (`char::is_alphabetic`).
pub fn letter<I, U>() -> impl Parser<I, U, char>
where
    I: Stream<Item = char>,
{
    satisfy(|c| c.is_alphabetic())
}

/// A Unicode letter or digit.
pub fn alpha_num<I, U>() -> impl Parser<I, U, char>
where
    I: Stream<Item = char>,
{
    satisfy(|c| c.is_alphanumeric())
}

/// A Unicode symbol (punctuation/symbol categories, approximated with `char::is_ascii_punctuation`
/// union the general `is_alphanumeric`/`is_whitespace`-complement test for non-ASCII symbols).
pub fn symbol_char<I, U>() -> impl Parser<I, U, char>
where
    I: Stream<Item = char>,
{
    satisfy(|c| !c.is_alphanumeric() && !c.is_whitespace() && !c.is_control())
}

/// A Unicode uppercase letter.
pub fn upper<I, U>() -> impl Parser<I, U, char>
where
    I: Stream<Item = char>,
{
    satisfy(|c| c.is_uppercase())
}

/// A Unicode lowercase letter.
pub fn lower<I, U>() -> impl Parser<I, U, char>
where
    I: Stream<Item = char>,
{
    satisfy(|c| c.is_lowercase())
}

/// The "ASCII + control" whitespace set: space, tab, `\n`, `\r`, form feed, vertical tab.
pub fn is_ascii_space(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\n' | '\r' | '\u{000C}' | '\u{000B}')
}

/// The full Unicode space set: everything [`is_ascii_space`] accepts, plus NEL, NBSP, the
/// U+2000..=U+200D block, line/paragraph separators, narrow NBSP, medium mathematical space, word
/// joiner, ideographic space, and the BOM.
pub fn is_unicode_space(c: char) -> bool {
    is_ascii_space(c)
        || matches!(
            c,
            '\u{0085}'
                | '\u{00A0}'
                | '\u{2000}'..='\u{200D}'
                | '\u{2028}'
                | '\u{2029}'
                | '\u{202F}'
                | '\u{205F}'
                | '\u{2060}'
                | '\u{3000}'
                | '\u{FEFF}'
        )
}

/// Match one character from the ASCII + control whitespace set.
pub fn space<I, U>() -> impl Parser<I, U, char>
where
    I: Stream<Item = char>,
{
    satisfy(is_ascii_space)
}

/// Match one character from the full Unicode whitespace set.
pub fn unicode_space<I, U>() -> impl Parser<I, U, char>
where
    I: Stream<Item = char>,
{
    satisfy(is_unicode_space)
}

/// Match a single line feed, yielding `'\n'`.
pub fn newline<I, U>() -> impl Parser<I, U, char>
where
    I: Stream<Item = char>,
{
    character('\n')
}

/// Match `"\r\n"` (as a composed grapheme, if the input represents one that way, or as the
/// literal two-character sequence), yielding `'\n'`.
pub fn crlf<I, U>() -> impl Parser<I, U, char>
where
    I: Stream<Item = char>,
{
    move |state: ParserState<I, U>| {
        // A single input element that already compares equal to the composed "\r\n" grapheme
        // counts as a line ending too; this mirrors the source's treatment of `"\r\n"` as one
        // space-class token when the input representation makes that reachable.
        match crlf_composed::<I, U>().parse(state.clone()) {
            Consumed::Empty(Reply::Err(_)) => crlf_split::<I, U>().parse(state),
            other => other,
        }
    }
}

fn crlf_composed<I, U>() -> impl Parser<I, U, char>
where
    I: Stream<Item = char>,
{
    string::<I, U>("\r\n").map(|_| '\n')
}

fn crlf_split<I, U>() -> impl Parser<I, U, char>
where
    I: Stream<Item = char>,
{
    character('\r').bind(|_| character('\n'))
}

/// [`newline`] or [`crlf`].
pub fn end_of_line<I, U>() -> impl Parser<I, U, char>
where
    I: Stream<Item = char>,
{
    newline().alt(crlf())
}

/// Consume an exact sequence of characters, failing `Empty` on the first disagreement,
/// `Consumed` on a later one.
pub fn string_match<I, U>(expected: impl AsRef<str>) -> impl Parser<I, U, String>
where
    I: Stream<Item = char>,
{
    string(expected)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn any_token_matches_anything_but_not_eof() {
        let mut p = any_token::<&str, ()>();
        assert_eq!(p.run("t", "z", ()).unwrap().0, 'z');
        assert!(any_token::<&str, ()>().run("t", "", ()).is_err());
    }

    #[test]
    fn one_of_matches_set() {
        let mut p = one_of::<&str, ()>("aeiou");
        assert_eq!(p.run("t", "a", ()).unwrap().0, 'a');
        assert!(one_of::<&str, ()>("aeiou").run("t", "z", ()).is_err());
    }

    #[test]
    fn crlf_accepts_split_sequence() {
        let mut p = crlf::<&str, ()>();
        let (value, user) = p.run("t", "\r\nx", ()).unwrap();
        assert_eq!(value, '\n');
        let _ = user;
    }

    #[test]
    fn tab_advances_to_next_multiple_of_eight() {
        let mut pos = SourcePos::new("t");
        pos.advance('\t');
        assert_eq!(pos.column(), 9);
        pos.advance('\t');
        assert_eq!(pos.column(), 17);

        let mut pos2 = SourcePos::new("t");
        pos2.advance('a');
        pos2.advance('a');
        pos2.advance('\t');
        assert_eq!(pos2.column(), 9);
    }

    #[test]
    fn mismatch_renders_oneof_error() {
        let err = one_of::<&str, ()>("aeiou").run("test", "z", ()).unwrap_err();
        assert_eq!(format!("{}", err), "\"test\" (line 1, column 1):\nunexpected \"z\"\n");
    }
}
