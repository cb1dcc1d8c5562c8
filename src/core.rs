//! The `consumed / not-consumed` × `ok / error` reply algebra.
//!
//! Every combinator in this crate bottoms out in these two types. [`Consumed`] records whether a
//! parser invocation advanced the input cursor; [`Reply`] records whether it succeeded. The two
//! compose as `Consumed<Reply<...>>`, never the other way around, because whether a parser
//! consumed input is a property of the call, independent of whether that call ultimately
//! succeeded or failed.

use crate::error::ParseError;
use crate::state::ParserState;

/// The result of a single parser invocation: either a value plus the advanced state and any
/// accumulated "expected" hints, or a structured failure.
#[derive(Debug, Clone)]
pub enum Reply<O, I, U> {
    /// Success. The carried [`ParseError`] is never a real failure — it holds hints accumulated
    /// at the terminal position, used by `<?>` relabeling and by `alt`'s error merging.
    Ok(O, ParserState<I, U>, ParseError),
    /// Failure.
    Err(ParseError),
}

impl<O, I, U> Reply<O, I, U> {
    /// Transform the success value, leaving the state and accumulated error untouched.
    pub fn map<O2>(self, f: impl FnOnce(O) -> O2) -> Reply<O2, I, U> {
        match self {
            Reply::Ok(o, s, e) => Reply::Ok(f(o), s, e),
            Reply::Err(e) => Reply::Err(e),
        }
    }
}

/// Whether a parser invocation advanced the input cursor before returning.
///
/// The choice combinator (`<|>`) inspects only this envelope on its left operand: the right
/// alternative is tried *iff* the left returned `Empty(Err(_))`. A `Consumed` failure commits —
/// this is the rule that makes error messages focused and is the reason `attempt` exists.
#[derive(Debug, Clone)]
pub enum Consumed<R> {
    /// The parser advanced past at least one input element.
    Consumed(R),
    /// The parser did not advance the input.
    Empty(R),
}

/// The full result type threaded through every combinator: an envelope around a reply.
pub type ParseResult<O, I, U> = Consumed<Reply<O, I, U>>;

impl<R> Consumed<R> {
    /// `true` for the `Consumed` variant.
    pub fn is_consumed(&self) -> bool {
        matches!(self, Consumed::Consumed(_))
    }

    /// The wrapped reply, discarding whether it consumed.
    pub fn into_reply(self) -> R {
        match self {
            Consumed::Consumed(r) | Consumed::Empty(r) => r,
        }
    }

    /// Apply `f` to the wrapped reply, preserving the envelope.
    pub fn map<R2>(self, f: impl FnOnce(R) -> R2) -> Consumed<R2> {
        match self {
            Consumed::Consumed(r) => Consumed::Consumed(f(r)),
            Consumed::Empty(r) => Consumed::Empty(f(r)),
        }
    }

    /// Upgrade an `Empty` envelope to `Consumed` if `did_consume` is `true`. Used by `bind` and
    /// `many` to propagate consumption from an earlier step.
    pub fn consumed_if(self, did_consume: bool) -> Self {
        if did_consume {
            Consumed::Consumed(self.into_reply())
        } else {
            self
        }
    }
}

impl<O, I, U> Consumed<Reply<O, I, U>> {
    /// Build the always-failing identity reply at `state`'s position: `Empty(Err(unknown))`.
    pub fn unknown_error(state: &ParserState<I, U>) -> Self {
        Consumed::Empty(Reply::Err(ParseError::unknown(state.pos.clone())))
    }
}
