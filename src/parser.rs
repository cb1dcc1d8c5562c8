//! The `Parser` trait and the handful of combinators that are direct consequences of the reply
//! algebra: `map`, `apply`, `bind`, `alt`, `attempt`, `look_ahead`, and `label`.

use crate::core::{Consumed, ParseResult, Reply};
use crate::error::{Message, ParseError};
use crate::state::{ParserState, Stream};

/// Every parser in this crate implements this trait: given a function from state to a
/// `Consumed`-wrapped [`Reply`], it is a parser.
///
/// Parsers are immutable descriptions, created once and reused; `&mut self` is only needed
/// because some parsers (built with [`crate::combinator::recursive`] or carrying `FnMut` cores)
/// have interior call state.
pub trait Parser<I, U, O>
where
    I: Stream,
{
    /// Run this parser against `state`, producing a consumed-or-not reply.
    fn parse(&mut self, state: ParserState<I, U>) -> ParseResult<O, I, U>;

    /// Run this parser as the sole entry point against freshly constructed input.
    ///
    /// Builds `(input, (name, 1, 1), initial_user)`, invokes the parser, and either returns the
    /// value and final user state or the structured [`ParseError`]. There is no partial result on
    /// failure.
    fn run(
        &mut self,
        name: impl Into<std::rc::Rc<str>>,
        input: I,
        initial_user: U,
    ) -> Result<(O, U), ParseError> {
        let state = ParserState::new(name, input, initial_user);
        match self.parse(state).into_reply() {
            Reply::Ok(o, s, _) => Ok((o, s.user)),
            Reply::Err(e) => Err(e),
        }
    }

    /// Functorial map: apply `f` inside the success arm, preserving envelope and error.
    fn map<O2, F>(self, f: F) -> Map<Self, F>
    where
        Self: Sized,
        F: FnMut(O) -> O2,
    {
        Map { parser: self, f }
    }

    /// Applicative: run `self` to get a function, then `p2` to get its argument, applying one to
    /// the other. Unlike [`Parser::bind`], `p2` cannot depend on `self`'s value — only on the
    /// advanced state — so it composes in cases where the continuation is known up front.
    fn apply<O2, R, P2>(self, p2: P2) -> Apply<Self, P2>
    where
        Self: Sized,
        O: FnOnce(O2) -> R,
        P2: Parser<I, U, O2>,
    {
        Apply { parser: self, p2 }
    }

    /// Monadic bind: run `self`; on success, run `k(value)` on the advanced state, merging
    /// accumulated hints when both steps were `Empty` (i.e. at the same position).
    fn bind<O2, K, P2>(self, k: K) -> Bind<Self, K>
    where
        Self: Sized,
        K: FnMut(O) -> P2,
        P2: Parser<I, U, O2>,
    {
        Bind { parser: self, k }
    }

    /// Predictive choice: try `self`; if it returned `Empty(Err(_))`, try `other`, merging the
    /// errors. A `Consumed` failure from `self` short-circuits without trying `other` — this is
    /// the rule that makes error messages focused. Compose with [`attempt`] for full
    /// backtracking across a consumed prefix.
    fn alt<P2>(self, other: P2) -> Alt<Self, P2>
    where
        Self: Sized,
        P2: Parser<I, U, O>,
    {
        Alt { left: self, right: other }
    }

    /// Demote a `Consumed(Err(_))` reply to `Empty(Err(_))`, enabling arbitrary lookahead at the
    /// cost of error specificity on the swallowed prefix. All other replies pass through
    /// unchanged.
    fn attempt(self) -> Attempt<Self>
    where
        Self: Sized,
    {
        Attempt { parser: self }
    }

    /// Run `self`; on success, rewrite the reply to refer to the *original* state, discarding any
    /// consumption. Failure (including its consumed-ness) passes through unchanged — wrap with
    /// [`Parser::attempt`] for non-consuming failure too.
    fn look_ahead(self) -> LookAhead<Self>
    where
        Self: Sized,
    {
        LookAhead { parser: self }
    }

    /// Replace the `Expected` messages of an `Empty` reply (success or failure) with `label`.
    /// Leaves `Consumed` replies and `SysUnexpected`/`Unexpected` messages untouched.
    fn label(self, label: impl Into<String>) -> Label<Self>
    where
        Self: Sized,
    {
        Label { parser: self, label: label.into() }
    }

    /// Infix alias for [`Parser::label`], matching the Parsec `<?>` operator in spirit.
    fn labelled(self, label: impl Into<String>) -> Label<Self>
    where
        Self: Sized,
    {
        self.label(label)
    }

    /// Fallible map: `f` can reject the value, turning a success into a failure anchored at the
    /// post-value position. A `Consumed` success stays `Consumed` on rejection — the input
    /// already moved past the accepted token, so there's no alternative left to try.
    fn map_res<O2, E, F>(self, f: F) -> MapRes<Self, F>
    where
        Self: Sized,
        F: FnMut(O) -> Result<O2, E>,
        E: std::fmt::Display,
    {
        MapRes { parser: self, f }
    }

    /// Alias for [`Parser::map_res`], matching nom/winnow's naming.
    fn try_map<O2, E, F>(self, f: F) -> MapRes<Self, F>
    where
        Self: Sized,
        F: FnMut(O) -> Result<O2, E>,
        E: std::fmt::Display,
    {
        self.map_res(f)
    }

    /// Fallible map via `Option`: `None` rejects the value with a generic message.
    fn map_opt<O2, F>(self, f: F) -> MapOpt<Self, F>
    where
        Self: Sized,
        F: FnMut(O) -> Option<O2>,
    {
        MapOpt { parser: self, f }
    }

    /// Keep the value only if `pred` holds; otherwise reject it the same way [`Parser::map_opt`]
    /// does.
    fn verify<F>(self, f: F) -> Verify<Self, F>
    where
        Self: Sized,
        F: FnMut(&O) -> bool,
    {
        Verify { parser: self, f }
    }

    /// Alias for [`Parser::bind`] under the name common outside the Parsec lineage.
    fn and_then<O2, K, P2>(self, k: K) -> Bind<Self, K>
    where
        Self: Sized,
        K: FnMut(O) -> P2,
        P2: Parser<I, U, O2>,
    {
        self.bind(k)
    }

    /// Alias for [`Parser::bind`] under the name common outside the Parsec lineage.
    fn flat_map<O2, K, P2>(self, k: K) -> Bind<Self, K>
    where
        Self: Sized,
        K: FnMut(O) -> P2,
        P2: Parser<I, U, O2>,
    {
        self.bind(k)
    }

    /// Borrow `self` mutably as a `Parser`, so it can be passed to a combinator that takes one by
    /// value without giving up ownership — the original stays usable at other call sites.
    fn by_ref(&mut self) -> &mut Self
    where
        Self: Sized,
    {
        self
    }

    /// Alias for [`Parser::by_ref`], matching winnow's naming.
    fn as_mut_parser(&mut self) -> &mut Self
    where
        Self: Sized,
    {
        self.by_ref()
    }
}

/// Implementation of [`Parser::map_res`]/[`Parser::try_map`].
pub struct MapRes<P, F> {
    parser: P,
    f: F,
}

impl<I, U, O, O2, E, P, F> Parser<I, U, O2> for MapRes<P, F>
where
    I: Stream,
    P: Parser<I, U, O>,
    F: FnMut(O) -> Result<O2, E>,
    E: std::fmt::Display,
{
    fn parse(&mut self, state: ParserState<I, U>) -> ParseResult<O2, I, U> {
        match self.parser.parse(state) {
            Consumed::Empty(Reply::Ok(o, s, e1)) => match (self.f)(o) {
                Ok(o2) => Consumed::Empty(Reply::Ok(o2, s, e1)),
                Err(e) => {
                    let pos = s.pos.clone();
                    Consumed::Empty(Reply::Err(ParseError::new(pos, Message::Generic(e.to_string()))))
                }
            },
            Consumed::Consumed(Reply::Ok(o, s, _)) => match (self.f)(o) {
                Ok(o2) => {
                    let pos = s.pos.clone();
                    Consumed::Consumed(Reply::Ok(o2, s, ParseError::unknown(pos)))
                }
                Err(e) => {
                    let pos = s.pos.clone();
                    Consumed::Consumed(Reply::Err(ParseError::new(pos, Message::Generic(e.to_string()))))
                }
            },
            Consumed::Empty(Reply::Err(e)) => Consumed::Empty(Reply::Err(e)),
            Consumed::Consumed(Reply::Err(e)) => Consumed::Consumed(Reply::Err(e)),
        }
    }
}

/// Implementation of [`Parser::map_opt`].
pub struct MapOpt<P, F> {
    parser: P,
    f: F,
}

impl<I, U, O, O2, P, F> Parser<I, U, O2> for MapOpt<P, F>
where
    I: Stream,
    P: Parser<I, U, O>,
    F: FnMut(O) -> Option<O2>,
{
    fn parse(&mut self, state: ParserState<I, U>) -> ParseResult<O2, I, U> {
        match self.parser.parse(state) {
            Consumed::Empty(Reply::Ok(o, s, e1)) => match (self.f)(o) {
                Some(o2) => Consumed::Empty(Reply::Ok(o2, s, e1)),
                None => {
                    let pos = s.pos.clone();
                    Consumed::Empty(Reply::Err(ParseError::new(pos, Message::Generic("value rejected".to_string()))))
                }
            },
            Consumed::Consumed(Reply::Ok(o, s, _)) => match (self.f)(o) {
                Some(o2) => {
                    let pos = s.pos.clone();
                    Consumed::Consumed(Reply::Ok(o2, s, ParseError::unknown(pos)))
                }
                None => {
                    let pos = s.pos.clone();
                    Consumed::Consumed(Reply::Err(ParseError::new(pos, Message::Generic("value rejected".to_string()))))
                }
            },
            Consumed::Empty(Reply::Err(e)) => Consumed::Empty(Reply::Err(e)),
            Consumed::Consumed(Reply::Err(e)) => Consumed::Consumed(Reply::Err(e)),
        }
    }
}

/// Implementation of [`Parser::verify`].
pub struct Verify<P, F> {
    parser: P,
    f: F,
}

impl<I, U, O, P, F> Parser<I, U, O> for Verify<P, F>
where
    I: Stream,
    P: Parser<I, U, O>,
    F: FnMut(&O) -> bool,
{
    fn parse(&mut self, state: ParserState<I, U>) -> ParseResult<O, I, U> {
        match self.parser.parse(state) {
            Consumed::Empty(Reply::Ok(o, s, e1)) => {
                if (self.f)(&o) {
                    Consumed::Empty(Reply::Ok(o, s, e1))
                } else {
                    let pos = s.pos.clone();
                    Consumed::Empty(Reply::Err(ParseError::new(pos, Message::Generic("value rejected".to_string()))))
                }
            }
            Consumed::Consumed(Reply::Ok(o, s, _)) => {
                if (self.f)(&o) {
                    let pos = s.pos.clone();
                    Consumed::Consumed(Reply::Ok(o, s, ParseError::unknown(pos)))
                } else {
                    let pos = s.pos.clone();
                    Consumed::Consumed(Reply::Err(ParseError::new(pos, Message::Generic("value rejected".to_string()))))
                }
            }
            Consumed::Empty(Reply::Err(e)) => Consumed::Empty(Reply::Err(e)),
            Consumed::Consumed(Reply::Err(e)) => Consumed::Consumed(Reply::Err(e)),
        }
    }
}

impl<I, U, O, F> Parser<I, U, O> for F
where
    I: Stream,
    F: FnMut(ParserState<I, U>) -> ParseResult<O, I, U>,
{
    fn parse(&mut self, state: ParserState<I, U>) -> ParseResult<O, I, U> {
        self(state)
    }
}

/// Lets a boxed parser — concrete or `dyn` — be used anywhere a `Parser` is expected, e.g. in a
/// heterogeneous `Vec` passed to [`crate::combinator::choice`].
impl<I, U, O, P> Parser<I, U, O> for Box<P>
where
    I: Stream,
    P: Parser<I, U, O> + ?Sized,
{
    fn parse(&mut self, state: ParserState<I, U>) -> ParseResult<O, I, U> {
        (**self).parse(state)
    }
}

/// Lets [`Parser::by_ref`]/[`Parser::as_mut_parser`] hand out a `&mut P` that is itself usable
/// anywhere a `Parser` is expected.
impl<I, U, O, P> Parser<I, U, O> for &mut P
where
    I: Stream,
    P: Parser<I, U, O> + ?Sized,
{
    fn parse(&mut self, state: ParserState<I, U>) -> ParseResult<O, I, U> {
        (**self).parse(state)
    }
}

/// Implementation of [`Parser::map`].
pub struct Map<P, F> {
    parser: P,
    f: F,
}

impl<I, U, O, O2, P, F> Parser<I, U, O2> for Map<P, F>
where
    I: Stream,
    P: Parser<I, U, O>,
    F: FnMut(O) -> O2,
{
    fn parse(&mut self, state: ParserState<I, U>) -> ParseResult<O2, I, U> {
        self.parser.parse(state).map(|r| r.map(&mut self.f))
    }
}

/// Implementation of [`Parser::apply`].
pub struct Apply<P, P2> {
    parser: P,
    p2: P2,
}

impl<I, U, O, O2, R, P, P2> Parser<I, U, R> for Apply<P, P2>
where
    I: Stream,
    P: Parser<I, U, O>,
    O: FnOnce(O2) -> R,
    P2: Parser<I, U, O2>,
{
    fn parse(&mut self, state: ParserState<I, U>) -> ParseResult<R, I, U> {
        match self.parser.parse(state) {
            Consumed::Empty(Reply::Ok(f, s1, e1)) => match self.p2.parse(s1) {
                Consumed::Empty(Reply::Ok(b, s2, e2)) => {
                    Consumed::Empty(Reply::Ok(f(b), s2, e1.merge(e2)))
                }
                Consumed::Empty(Reply::Err(e2)) => Consumed::Empty(Reply::Err(e1.merge(e2))),
                Consumed::Consumed(Reply::Ok(b, s2, e2)) => {
                    Consumed::Consumed(Reply::Ok(f(b), s2, e2))
                }
                Consumed::Consumed(Reply::Err(e2)) => Consumed::Consumed(Reply::Err(e2)),
            },
            Consumed::Empty(Reply::Err(e)) => Consumed::Empty(Reply::Err(e)),
            Consumed::Consumed(Reply::Ok(f, s1, _)) => match self.p2.parse(s1) {
                Consumed::Empty(Reply::Ok(b, s2, _)) => {
                    let pos = s2.pos.clone();
                    Consumed::Consumed(Reply::Ok(f(b), s2, ParseError::unknown(pos)))
                }
                Consumed::Consumed(Reply::Ok(b, s2, e2)) => {
                    Consumed::Consumed(Reply::Ok(f(b), s2, e2))
                }
                Consumed::Empty(Reply::Err(e2)) | Consumed::Consumed(Reply::Err(e2)) => {
                    Consumed::Consumed(Reply::Err(e2))
                }
            },
            Consumed::Consumed(Reply::Err(e)) => Consumed::Consumed(Reply::Err(e)),
        }
    }
}

/// Implementation of [`Parser::bind`].
pub struct Bind<P, K> {
    parser: P,
    k: K,
}

impl<I, U, O, O2, P, K, P2> Parser<I, U, O2> for Bind<P, K>
where
    I: Stream,
    P: Parser<I, U, O>,
    K: FnMut(O) -> P2,
    P2: Parser<I, U, O2>,
{
    fn parse(&mut self, state: ParserState<I, U>) -> ParseResult<O2, I, U> {
        match self.parser.parse(state) {
            Consumed::Empty(Reply::Ok(a, s1, e1)) => {
                match (self.k)(a).parse(s1) {
                    Consumed::Empty(Reply::Ok(b, s2, e2)) => {
                        Consumed::Empty(Reply::Ok(b, s2, e1.merge(e2)))
                    }
                    Consumed::Empty(Reply::Err(e2)) => Consumed::Empty(Reply::Err(e1.merge(e2))),
                    consumed => consumed,
                }
            }
            Consumed::Empty(Reply::Err(e)) => Consumed::Empty(Reply::Err(e)),
            Consumed::Consumed(Reply::Ok(a, s1, _)) => {
                // The whole sequence has consumed regardless of whether `k(a)` does.
                (self.k)(a).parse(s1).consumed_if(true)
            }
            Consumed::Consumed(Reply::Err(e)) => Consumed::Consumed(Reply::Err(e)),
        }
    }
}

/// Implementation of [`Parser::alt`].
pub struct Alt<P, Q> {
    left: P,
    right: Q,
}

impl<I, U, O, P, Q> Parser<I, U, O> for Alt<P, Q>
where
    I: Stream,
    P: Parser<I, U, O>,
    Q: Parser<I, U, O>,
{
    fn parse(&mut self, state: ParserState<I, U>) -> ParseResult<O, I, U> {
        match self.left.parse(state.clone()) {
            Consumed::Empty(Reply::Err(e1)) => match self.right.parse(state) {
                Consumed::Empty(Reply::Err(e2)) => Consumed::Empty(Reply::Err(e1.merge(e2))),
                Consumed::Empty(Reply::Ok(o, s, e2)) => {
                    Consumed::Empty(Reply::Ok(o, s, e1.merge(e2)))
                }
                consumed => consumed,
            },
            result => result,
        }
    }
}

/// Implementation of [`Parser::attempt`].
pub struct Attempt<P> {
    parser: P,
}

impl<I, U, O, P> Parser<I, U, O> for Attempt<P>
where
    I: Stream,
    P: Parser<I, U, O>,
{
    fn parse(&mut self, state: ParserState<I, U>) -> ParseResult<O, I, U> {
        match self.parser.parse(state) {
            Consumed::Consumed(Reply::Err(e)) => Consumed::Empty(Reply::Err(e)),
            other => other,
        }
    }
}

/// Implementation of [`Parser::look_ahead`].
pub struct LookAhead<P> {
    parser: P,
}

impl<I, U, O, P> Parser<I, U, O> for LookAhead<P>
where
    I: Stream,
    P: Parser<I, U, O>,
{
    fn parse(&mut self, state: ParserState<I, U>) -> ParseResult<O, I, U> {
        let original = state.clone();
        match self.parser.parse(state) {
            Consumed::Consumed(Reply::Ok(o, _, _)) | Consumed::Empty(Reply::Ok(o, _, _)) => {
                let pos = original.pos.clone();
                Consumed::Empty(Reply::Ok(o, original, ParseError::unknown(pos)))
            }
            failure => failure,
        }
    }
}

/// Implementation of [`Parser::label`].
pub struct Label<P> {
    parser: P,
    label: String,
}

impl<I, U, O, P> Parser<I, U, O> for Label<P>
where
    I: Stream,
    P: Parser<I, U, O>,
{
    fn parse(&mut self, state: ParserState<I, U>) -> ParseResult<O, I, U> {
        match self.parser.parse(state) {
            Consumed::Empty(Reply::Ok(o, s, e)) => {
                Consumed::Empty(Reply::Ok(o, s, e.relabel(vec![self.label.clone()])))
            }
            Consumed::Empty(Reply::Err(e)) => {
                Consumed::Empty(Reply::Err(e.relabel(vec![self.label.clone()])))
            }
            consumed => consumed,
        }
    }
}

/// Inject a value without consuming input: the identity for sequencing via [`Parser::bind`].
pub fn pure<I, U, O>(value: O) -> impl Parser<I, U, O>
where
    I: Stream,
    O: Clone,
{
    move |state: ParserState<I, U>| {
        let pos = state.pos.clone();
        Consumed::Empty(Reply::Ok(value.clone(), state, ParseError::unknown(pos)))
    }
}

/// The always-failing parser: `Empty(Err(unknown))`. The identity element for [`Parser::alt`].
pub fn empty<I, U, O>() -> impl Parser<I, U, O>
where
    I: Stream,
{
    move |state: ParserState<I, U>| Consumed::<Reply<O, I, U>>::unknown_error(&state)
}

/// Fail unconditionally with a free-text message, at the current position, without consuming.
pub fn fail<I, U, O>(message: impl Into<String>) -> impl Parser<I, U, O>
where
    I: Stream,
{
    let message = message.into();
    move |state: ParserState<I, U>| {
        Consumed::Empty(Reply::Err(ParseError::new(
            state.pos.clone(),
            Message::Generic(message.clone()),
        )))
    }
}

/// Fail unconditionally reporting `what` as unexpected, at the current position, without
/// consuming.
pub fn unexpected<I, U, O>(what: impl Into<String>) -> impl Parser<I, U, O>
where
    I: Stream,
{
    let what = what.into();
    move |state: ParserState<I, U>| {
        Consumed::Empty(Reply::Err(ParseError::new(
            state.pos.clone(),
            Message::Unexpected(what.clone()),
        )))
    }
}

/// Replace the user state by applying `f`, producing `()`, without consuming.
pub fn update_user_state<I, U>(mut f: impl FnMut(U) -> U) -> impl Parser<I, U, ()>
where
    I: Stream,
{
    move |mut state: ParserState<I, U>| {
        state.user = f(state.user);
        let pos = state.pos.clone();
        Consumed::Empty(Reply::Ok((), state, ParseError::unknown(pos)))
    }
}

/// Turns a parser into a plain `Result`, additionally requiring the whole input be consumed —
/// for grammars where leftover input is itself an error, unlike the partial-parse [`Parser::run`].
pub trait FinishParse<I, U, O>: Parser<I, U, O>
where
    I: Stream,
{
    fn finish(
        &mut self,
        name: impl Into<std::rc::Rc<str>>,
        input: I,
        initial_user: U,
    ) -> Result<(O, U), ParseError> {
        let state = ParserState::new(name, input, initial_user);
        match self.parse(state).into_reply() {
            Reply::Ok(o, s, _) => {
                if s.input.is_empty() {
                    Ok((o, s.user))
                } else {
                    Err(ParseError::new(
                        s.pos.clone(),
                        Message::Expected("end of input".to_string()),
                    ))
                }
            }
            Reply::Err(e) => Err(e),
        }
    }
}

impl<I, U, O, P> FinishParse<I, U, O> for P
where
    I: Stream,
    P: Parser<I, U, O>,
{
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::token;

    fn letter(c: char) -> bool {
        c.is_ascii_lowercase()
    }

    #[test]
    fn map_preserves_envelope() {
        let mut p = token(|c: &char| letter(*c).then_some(*c), |c| format!("{:?}", c))
            .map(|c| c.to_ascii_uppercase());
        let (value, _) = p.run("t", "ab", ()).unwrap();
        assert_eq!(value, 'A');
    }

    #[test]
    fn apply_runs_function_then_argument() {
        let mut p = pure::<&str, (), _>(|c: char| c.to_ascii_uppercase())
            .apply(token(|c: &char| letter(*c).then_some(*c), |c| format!("{:?}", c)));
        let (value, _) = p.run("t", "ab", ()).unwrap();
        assert_eq!(value, 'A');
    }

    #[test]
    fn bind_merges_hints_at_same_position() {
        let mut p = pure::<&str, (), char>('x')
            .label("seed")
            .bind(|_| fail::<&str, (), char>("boom"));
        let err = p.run("t", "abc", ()).unwrap_err();
        // `pure` + `label` never consume, and `fail` doesn't either, so both halves are `Empty`
        // at the same position and their messages are unioned.
        assert!(err.messages().iter().any(|m| matches!(m, Message::Generic(s) if s == "boom")));
    }

    #[test]
    fn alt_tries_right_only_on_empty_failure() {
        let mut p = empty::<&str, (), char>().alt(pure('y'));
        let (value, _) = p.run("t", "abc", ()).unwrap();
        assert_eq!(value, 'y');
    }

    #[test]
    fn attempt_demotes_consumed_failure() {
        let mut p = token(|c: &char| letter(*c).then_some(*c), |c| format!("{:?}", c))
            .bind(|_| fail::<&str, (), char>("nope"))
            .attempt()
            .alt(pure('z'));
        let (value, _) = p.run("t", "abc", ()).unwrap();
        assert_eq!(value, 'z');
    }

    #[test]
    fn look_ahead_does_not_consume() {
        let mut p = token(|c: &char| letter(*c).then_some(*c), |c| format!("{:?}", c)).look_ahead();
        let (value, user) = p.run("t", "abc", ()).unwrap();
        assert_eq!(value, 'a');
        let _ = user;
    }

    #[test]
    fn map_res_rejects_with_the_error_message() {
        let mut p = crate::char::digit::<&str, ()>()
            .map_res(|c: char| if c == '0' { Err("no leading zero") } else { Ok(c) });
        assert!(p.run("t", "0", ()).is_err());
        let mut p2 = crate::char::digit::<&str, ()>()
            .map_res(|c: char| if c == '0' { Err("no leading zero") } else { Ok(c) });
        assert_eq!(p2.run("t", "1", ()).unwrap().0, '1');
    }

    #[test]
    fn map_opt_and_verify_reject_without_a_custom_message() {
        let mut p = crate::char::digit::<&str, ()>().map_opt(|c: char| c.to_digit(10));
        assert_eq!(p.run("t", "5", ()).unwrap().0, 5);

        let mut v = crate::char::digit::<&str, ()>().verify(|c: &char| *c != '0');
        assert!(v.run("t", "0", ()).is_err());
    }

    #[test]
    fn and_then_and_flat_map_behave_like_bind() {
        let mut p = crate::char::digit::<&str, ()>().and_then(|c| pure::<&str, (), char>(c));
        assert_eq!(p.run("t", "3", ()).unwrap().0, '3');
        let mut q = crate::char::digit::<&str, ()>().flat_map(|c| pure::<&str, (), char>(c));
        assert_eq!(q.run("t", "3", ()).unwrap().0, '3');
    }

    #[test]
    fn by_ref_lets_a_parser_run_again_afterward() {
        let mut p = crate::char::digit::<&str, ()>();
        assert_eq!(p.by_ref().run("t", "1", ()).unwrap().0, '1');
        assert_eq!(p.run("t", "2", ()).unwrap().0, '2');
    }

    #[test]
    fn finish_requires_the_whole_input_consumed() {
        let mut p = crate::char::digit::<&str, ()>();
        assert!(p.finish("t", "1", ()).is_ok());
        let mut p2 = crate::char::digit::<&str, ()>();
        assert!(p2.finish("t", "12", ()).is_err());
    }
}
