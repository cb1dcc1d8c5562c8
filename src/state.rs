//! The input abstraction and the value-threaded parser state.

use crate::error::SourcePos;

/// A finite sequence of tokens supporting a single operation: remove and return the first
/// element, or report emptiness.
///
/// Implemented for `&str` (yielding `char`) and `&[T]` (yielding `T`) out of the box, which covers
/// both the "character parsers" and "generic token primitives" use cases.
pub trait Stream: Clone {
    /// The element type this stream yields one at a time.
    type Item: Clone;

    /// Remove and return the first element, along with the remaining stream.
    fn uncons(&self) -> Option<(Self::Item, Self)>;

    /// `true` if no elements remain.
    fn is_empty(&self) -> bool {
        self.uncons().is_none()
    }
}

impl<'a> Stream for &'a str {
    type Item = char;

    fn uncons(&self) -> Option<(char, Self)> {
        let mut chars = self.chars();
        let c = chars.next()?;
        Some((c, chars.as_str()))
    }

    fn is_empty(&self) -> bool {
        str::is_empty(self)
    }
}

impl<'a, T: Clone> Stream for &'a [T] {
    type Item = T;

    fn uncons(&self) -> Option<(T, Self)> {
        match self.split_first() {
            Some((first, rest)) => Some((first.clone(), rest)),
            None => None,
        }
    }

    fn is_empty(&self) -> bool {
        <[T]>::is_empty(self)
    }
}

/// The value-threaded parser state: input cursor, position, and caller-owned user state.
///
/// Every combinator receives a state by value and returns a reply referring either to this same
/// state (no consumption) or to an advanced one. No in-place mutation of a `ParserState` is ever
/// observable outside of a single parser invocation.
#[derive(Debug, Clone)]
pub struct ParserState<I, U> {
    /// The remaining input.
    pub input: I,
    /// The current source position.
    pub pos: SourcePos,
    /// Caller-owned state, opaque to the engine, threaded alongside the input.
    pub user: U,
}

impl<I, U> ParserState<I, U> {
    /// A fresh state for `input` at the start of `name`, carrying `user`.
    pub fn new(name: impl Into<std::rc::Rc<str>>, input: I, user: U) -> Self {
        ParserState {
            input,
            pos: SourcePos::new(name),
            user,
        }
    }
}
