//! Sequencing combinators that don't repeat: `between`, `choice`, `option`, `optional`.

use crate::core::{Consumed, Reply};
use crate::parser::{pure, Parser};
use crate::state::{ParserState, Stream};

/// `open *> p <* close`, keeping only `p`'s value.
pub fn between<I, U, OO, OC, O, Open, P, Close>(
    mut open: Open,
    mut p: P,
    mut close: Close,
) -> impl Parser<I, U, O>
where
    I: Stream,
    Open: Parser<I, U, OO>,
    P: Parser<I, U, O>,
    Close: Parser<I, U, OC>,
{
    move |state: ParserState<I, U>| {
        let (open_consumed, open_reply) = split_consumed(open.parse(state));
        let (_, s1, e_open) = match open_reply {
            Reply::Err(e) => {
                return if open_consumed {
                    Consumed::Consumed(Reply::Err(e))
                } else {
                    Consumed::Empty(Reply::Err(e))
                };
            }
            Reply::Ok(o, s, e) => (o, s, e),
        };

        let (p_consumed, p_reply) = split_consumed(p.parse(s1));
        let consumed_so_far = open_consumed || p_consumed;
        let (value, s2, e_val) = match p_reply {
            Reply::Err(e) => {
                return if consumed_so_far {
                    Consumed::Consumed(Reply::Err(e))
                } else {
                    Consumed::Empty(Reply::Err(e))
                };
            }
            Reply::Ok(v, s, e) => (v, s, e),
        };

        let (close_consumed, close_reply) = split_consumed(close.parse(s2));
        let consumed_so_far = consumed_so_far || close_consumed;
        match close_reply {
            Reply::Err(e) => {
                if consumed_so_far {
                    Consumed::Consumed(Reply::Err(e))
                } else {
                    Consumed::Empty(Reply::Err(e))
                }
            }
            Reply::Ok(_, s3, e_close) => {
                let merged = e_open.merge(e_val).merge(e_close);
                if consumed_so_far {
                    Consumed::Consumed(Reply::Ok(value, s3, merged))
                } else {
                    Consumed::Empty(Reply::Ok(value, s3, merged))
                }
            }
        }
    }
}

fn split_consumed<R>(c: Consumed<R>) -> (bool, R) {
    match c {
        Consumed::Consumed(r) => (true, r),
        Consumed::Empty(r) => (false, r),
    }
}

/// Try each parser in order, in the manner of a chain of `alt` calls: the first alternative that
/// makes progress or succeeds wins, and a later alternative is only attempted after an `Empty`
/// failure from an earlier one.
pub fn choice<I, U, O, P>(mut parsers: Vec<P>) -> impl Parser<I, U, O>
where
    I: Stream,
    P: Parser<I, U, O>,
{
    move |state: ParserState<I, U>| {
        let mut iter = parsers.iter_mut();
        let first = match iter.next() {
            Some(p) => p,
            None => return Consumed::<Reply<O, I, U>>::unknown_error(&state),
        };
        let mut result = first.parse(state.clone());
        for p in iter {
            match result {
                Consumed::Empty(Reply::Err(e1)) => {
                    result = match p.parse(state.clone()) {
                        Consumed::Empty(Reply::Err(e2)) => Consumed::Empty(Reply::Err(e1.merge(e2))),
                        Consumed::Empty(Reply::Ok(o, s, e2)) => {
                            Consumed::Empty(Reply::Ok(o, s, e1.merge(e2)))
                        }
                        consumed => consumed,
                    };
                }
                done => {
                    result = done;
                    break;
                }
            }
        }
        result
    }
}

/// `p`'s value, or `default` without consuming if `p` fails `Empty`.
pub fn option<I, U, O, P>(default: O, p: P) -> impl Parser<I, U, O>
where
    I: Stream,
    O: Clone + 'static,
    P: Parser<I, U, O>,
{
    p.alt(pure(default))
}

/// Like [`option`] but discards the value, succeeding with `()` either way.
pub fn optional<I, U, O, P>(mut p: P) -> impl Parser<I, U, ()>
where
    I: Stream,
    P: Parser<I, U, O>,
{
    move |state: ParserState<I, U>| match p.parse(state.clone()) {
        Consumed::Consumed(Reply::Ok(_, s, e)) => Consumed::Consumed(Reply::Ok((), s, e)),
        Consumed::Consumed(Reply::Err(e)) => Consumed::Consumed(Reply::Err(e)),
        Consumed::Empty(Reply::Ok(_, s, e)) => Consumed::Empty(Reply::Ok((), s, e)),
        Consumed::Empty(Reply::Err(e)) => Consumed::Empty(Reply::Ok((), state, e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::char::character;

    #[test]
    fn between_keeps_inner_value() {
        let mut p = between(
            character::<&str, ()>('('),
            character::<&str, ()>('x'),
            character::<&str, ()>(')'),
        );
        let (v, _) = p.run("t", "(x)", ()).unwrap();
        assert_eq!(v, 'x');
    }

    #[test]
    fn choice_tries_in_order() {
        let mut p = choice(vec![
            Box::new(character::<&str, ()>('a')) as Box<dyn Parser<&str, (), char>>,
            Box::new(character::<&str, ()>('b')),
        ]);
        assert_eq!(p.run("t", "b", ()).unwrap().0, 'b');
        assert!(p.run("t", "c", ()).is_err());
    }

    #[test]
    fn optional_never_fails() {
        let mut p = optional(character::<&str, ()>('x'));
        assert!(p.run("t", "y", ()).is_ok());
        assert!(p.run("t", "x", ()).is_ok());
    }
}
