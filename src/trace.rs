//! Optional call tracing for interactive grammar debugging, gated behind the `debug` feature.
//!
//! Disabled builds compile this down to nothing: [`trace`] just calls through to its parser with
//! zero overhead.

use crate::parser::Parser;
use crate::state::{ParserState, Stream};

/// Wrap `p` so every call into it prints its name, the input remaining beforehand, and whether it
/// consumed input and succeeded afterward.
///
/// A no-op unless the `debug` feature is enabled, in which case it's the primary way to watch a
/// grammar's control flow without a debugger.
pub fn trace<I, U, O>(name: impl Into<String>, p: impl Parser<I, U, O>) -> impl Parser<I, U, O>
where
    I: Stream,
{
    #[cfg(feature = "debug")]
    {
        Traced { name: name.into(), parser: p }
    }
    #[cfg(not(feature = "debug"))]
    {
        let _ = name;
        p
    }
}

#[cfg(feature = "debug")]
struct Traced<P> {
    name: String,
    parser: P,
}

#[cfg(feature = "debug")]
impl<I, U, O, P> Parser<I, U, O> for Traced<P>
where
    I: Stream,
    P: Parser<I, U, O>,
{
    fn parse(&mut self, state: ParserState<I, U>) -> crate::core::ParseResult<O, I, U> {
        use anstyle::{AnsiColor, Style};

        let dim = Style::new().fg_color(Some(AnsiColor::BrightBlack.into()));
        let ok = Style::new().fg_color(Some(AnsiColor::Green.into()));
        let err = Style::new().fg_color(Some(AnsiColor::Red.into()));

        eprintln!(
            "{dim}-> {}{dim:#} at {}",
            self.name,
            state.pos,
        );
        let result = self.parser.parse(state);
        match &result {
            crate::core::Consumed::Consumed(crate::core::Reply::Ok(_, s, _)) => {
                eprintln!("{ok}<- {} ok (consumed), now at {}{ok:#}", self.name, s.pos);
            }
            crate::core::Consumed::Empty(crate::core::Reply::Ok(_, s, _)) => {
                eprintln!("{ok}<- {} ok (empty), still at {}{ok:#}", self.name, s.pos);
            }
            crate::core::Consumed::Consumed(crate::core::Reply::Err(e)) => {
                eprintln!("{err}<- {} failed (consumed) at {}{err:#}", self.name, e.position());
            }
            crate::core::Consumed::Empty(crate::core::Reply::Err(e)) => {
                eprintln!("{err}<- {} failed (empty) at {}{err:#}", self.name, e.position());
            }
        }
        result
    }
}

#[cfg(all(test, feature = "debug"))]
mod tests {
    use super::*;
    use crate::char::character;

    #[test]
    fn trace_passes_through_results() {
        let mut p = trace("char_a", character::<&str, ()>('a'));
        let (v, _) = p.run("t", "a", ()).unwrap();
        assert_eq!(v, 'a');
    }
}
