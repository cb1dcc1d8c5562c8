//! Single-token and multi-token consumers: the primitives every higher parser is built from.
//!
//! These are the only two places in the crate that ever pop an element off the input stream.
//! Everything else — `satisfy`, `char`, `string`, the lexeme layer — is composition on top.

use crate::core::{Consumed, ParseResult};
use crate::error::{Message, ParseError, SourcePos};
use crate::parser::Parser;
use crate::state::{ParserState, Stream};

/// Render a piece of text the way error payloads are rendered throughout this crate: a
/// double-quoted string, e.g. `"z"` or `"allo"`.
pub fn quote(s: &str) -> String {
    format!("{:?}", s)
}

/// The single-token primitive.
///
/// Pops the first element of the input. On an empty input, fails `Empty` with
/// `SysUnexpected("")` (end of input). On a present-but-rejected element, fails `Empty` with
/// `SysUnexpected(describe(tok))`, consuming nothing. On a match, succeeds `Consumed`, with the
/// position advanced by `advance`.
///
/// `advance` and `describe` are supplied by the caller so the same primitive works across
/// character streams, pre-lexed token streams, or anything else implementing [`Stream`].
pub fn token<I, U, O>(
    mut matches: impl FnMut(&I::Item) -> Option<O>,
    describe: impl Fn(&I::Item) -> String,
    advance: impl Fn(&mut SourcePos, &I::Item),
) -> impl Parser<I, U, O>
where
    I: Stream,
{
    move |state: ParserState<I, U>| -> ParseResult<O, I, U> {
        match state.input.uncons() {
            None => Consumed::Empty(crate::core::Reply::Err(ParseError::new(
                state.pos.clone(),
                Message::SysUnexpected(String::new()),
            ))),
            Some((tok, rest)) => match matches(&tok) {
                Some(value) => {
                    let mut pos = state.pos.clone();
                    advance(&mut pos, &tok);
                    let new_state = ParserState {
                        input: rest,
                        pos: pos.clone(),
                        user: state.user,
                    };
                    Consumed::Consumed(crate::core::Reply::Ok(
                        value,
                        new_state,
                        ParseError::unknown(pos),
                    ))
                }
                None => Consumed::Empty(crate::core::Reply::Err(ParseError::new(
                    state.pos.clone(),
                    Message::SysUnexpected(describe(&tok)),
                ))),
            },
        }
    }
}

/// The multi-token ("string-like") primitive: drain `expected` from the input one element at a
/// time.
///
/// On the first mismatch or premature end of input, the error's envelope is `Empty` iff no
/// element has been consumed yet, `Consumed` otherwise. Its position is the position at which
/// this call *started* — not where the mismatch was detected, matching the classic Parsec
/// `tokens` primitive (the position only ever advances on total success). The error carries
/// `SysUnexpected(describe_one(seen))` (or the empty string on end of input) plus
/// `Expected(describe_seq(expected))`.
///
/// On a full match, returns `Consumed(Ok(expected, new_state, unknown))` with the position
/// advanced past every matched element.
pub fn tokens<I, U>(
    expected: Vec<I::Item>,
    describe_one: impl Fn(&I::Item) -> String,
    describe_seq: impl Fn(&[I::Item]) -> String,
    advance: impl Fn(&mut SourcePos, &I::Item),
) -> impl Parser<I, U, Vec<I::Item>>
where
    I: Stream,
    I::Item: PartialEq,
{
    move |state: ParserState<I, U>| -> ParseResult<Vec<I::Item>, I, U> {
        if expected.is_empty() {
            let pos = state.pos.clone();
            return Consumed::Empty(crate::core::Reply::Ok(Vec::new(), state, ParseError::unknown(pos)));
        }

        let start_pos = state.pos.clone();
        let mut input = state.input.clone();
        let mut pos = state.pos.clone();
        let mut consumed_any = false;

        for want in &expected {
            match input.uncons() {
                Some((got, rest)) if &got == want => {
                    advance(&mut pos, &got);
                    input = rest;
                    consumed_any = true;
                }
                Some((got, _)) => {
                    let mut e = ParseError::new(
                        start_pos.clone(),
                        Message::SysUnexpected(describe_one(&got)),
                    );
                    e.add_message(Message::Expected(describe_seq(&expected)));
                    return if consumed_any {
                        Consumed::Consumed(crate::core::Reply::Err(e))
                    } else {
                        Consumed::Empty(crate::core::Reply::Err(e))
                    };
                }
                None => {
                    let mut e = ParseError::new(
                        start_pos.clone(),
                        Message::SysUnexpected(String::new()),
                    );
                    e.add_message(Message::Expected(describe_seq(&expected)));
                    return if consumed_any {
                        Consumed::Consumed(crate::core::Reply::Err(e))
                    } else {
                        Consumed::Empty(crate::core::Reply::Err(e))
                    };
                }
            }
        }

        let new_state = ParserState {
            input,
            pos: pos.clone(),
            user: state.user,
        };
        Consumed::Consumed(crate::core::Reply::Ok(expected.clone(), new_state, ParseError::unknown(pos)))
    }
}

/// Succeed with `()`, consuming nothing, only when the input is exhausted. Fails `Empty`,
/// reporting `Expected("end of input")`, otherwise.
pub fn eof<I, U>() -> impl Parser<I, U, ()>
where
    I: Stream,
{
    move |state: ParserState<I, U>| -> ParseResult<(), I, U> {
        if state.input.is_empty() {
            let pos = state.pos.clone();
            Consumed::Empty(crate::core::Reply::Ok((), state, ParseError::unknown(pos)))
        } else {
            Consumed::Empty(crate::core::Reply::Err(ParseError::new(
                state.pos.clone(),
                Message::Expected("end of input".to_string()),
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Message;

    #[test]
    fn empty_input_is_system_unexpected_eof() {
        let mut p = token::<&str, (), char>(
            |c: &char| Some(*c),
            |c| quote(&c.to_string()),
            |pos, c| pos.advance(*c),
        );
        let err = p.run("t", "", ()).unwrap_err();
        assert!(err
            .messages()
            .iter()
            .any(|m| matches!(m, Message::SysUnexpected(s) if s.is_empty())));
    }

    #[test]
    fn mismatch_is_empty_failure() {
        let mut p = token::<&str, (), char>(
            |c: &char| (*c == 'a').then_some(*c),
            |c| quote(&c.to_string()),
            |pos, c| pos.advance(*c),
        );
        let err = p.run("t", "z", ()).unwrap_err();
        assert!(err
            .messages()
            .iter()
            .any(|m| matches!(m, Message::SysUnexpected(s) if s == "\"z\"")));
    }

    #[test]
    fn eof_succeeds_only_at_end_of_input() {
        assert!(eof::<&str, ()>().run("t", "", ()).is_ok());
        assert!(eof::<&str, ()>().run("t", "x", ()).is_err());
    }

    #[test]
    fn eof_reports_the_initial_position() {
        let err = eof::<&str, ()>().run("t", "x", ()).unwrap_err();
        assert_eq!(err.position().line(), 1);
        assert_eq!(err.position().column(), 1);
    }

    #[test]
    fn tokens_error_anchors_start_position_not_mismatch() {
        let mut p = tokens::<&str, ()>(
            "allo".chars().collect(),
            |c| quote(&c.to_string()),
            |_seq| quote("allo"),
            |pos, c| pos.advance(*c),
        );
        let err = p.run("test", "all", ()).unwrap_err();
        assert_eq!(err.position().line(), 1);
        assert_eq!(err.position().column(), 1);
        assert!(err
            .messages()
            .iter()
            .any(|m| matches!(m, Message::SysUnexpected(s) if s.is_empty())));
        assert!(err
            .messages()
            .iter()
            .any(|m| matches!(m, Message::Expected(s) if s == "\"allo\"")));
    }
}
