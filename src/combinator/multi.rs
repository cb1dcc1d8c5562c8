//! Combinators that apply a child parser a variable or bounded number of times.
//!
//! All repetition here is implemented with an explicit loop rather than recursion, so these
//! combinators don't grow the host stack for long inputs — recursion is reserved for the grammar
//! tree itself (see [`recursive`]).

use crate::core::{Consumed, ParseResult, Reply};
use crate::error::ParseError;
use crate::parser::{pure, Parser};
use crate::state::{ParserState, Stream};

enum RepeatEnd {
    /// The last attempt was an `Empty` failure: stop gracefully, these hints are still useful.
    Graceful(ParseError),
    /// The last attempt was a `Consumed` failure: this must propagate, not be swallowed.
    Fatal(ParseError),
}

/// Apply `p` in a loop until it fails, folding into `acc` via `push`. Panics if `p` ever succeeds
/// without consuming input (an infinite loop would otherwise follow) — this is a grammar bug, not
/// a parse error.
fn repeat<I, U, O>(
    p: &mut impl Parser<I, U, O>,
    mut state: ParserState<I, U>,
) -> (Vec<O>, ParserState<I, U>, bool, RepeatEnd)
where
    I: Stream,
{
    let mut acc = Vec::new();
    let mut consumed_overall = false;
    loop {
        match p.parse(state.clone()) {
            Consumed::Consumed(Reply::Ok(v, s2, _)) => {
                acc.push(v);
                state = s2;
                consumed_overall = true;
            }
            Consumed::Empty(Reply::Ok(..)) => {
                panic!("many: parser accepted empty input inside a repetition combinator")
            }
            Consumed::Consumed(Reply::Err(e)) => {
                return (acc, state, consumed_overall, RepeatEnd::Fatal(e));
            }
            Consumed::Empty(Reply::Err(e)) => {
                return (acc, state, consumed_overall, RepeatEnd::Graceful(e));
            }
        }
    }
}

/// Apply `p` zero or more times, collecting the results. Never fails: zero matches still
/// succeeds, `Empty`, carrying whatever hints the failed first attempt produced.
pub fn many<I, U, O, P>(mut p: P) -> impl Parser<I, U, Vec<O>>
where
    I: Stream,
    P: Parser<I, U, O>,
{
    move |state: ParserState<I, U>| {
        let (acc, state, consumed, end) = repeat(&mut p, state);
        match end {
            RepeatEnd::Fatal(e) => Consumed::Consumed(Reply::Err(e)),
            RepeatEnd::Graceful(e) => {
                if consumed {
                    let pos = state.pos.clone();
                    Consumed::Consumed(Reply::Ok(acc, state, ParseError::unknown(pos)))
                } else {
                    Consumed::Empty(Reply::Ok(acc, state, e))
                }
            }
        }
    }
}

/// Like [`many`] but discards the accumulated results.
pub fn skip_many<I, U, O, P>(p: P) -> impl Parser<I, U, ()>
where
    I: Stream,
    P: Parser<I, U, O>,
{
    many(p).map(|_| ())
}

/// Apply `p` one or more times, collecting the results: `p : many(p)`.
pub fn many1<I, U, O, P>(mut p: P) -> impl Parser<I, U, Vec<O>>
where
    I: Stream,
    P: Parser<I, U, O>,
{
    move |state: ParserState<I, U>| match p.parse(state) {
        Consumed::Empty(Reply::Err(e)) => Consumed::Empty(Reply::Err(e)),
        Consumed::Empty(Reply::Ok(..)) => {
            panic!("many1: parser accepted empty input inside a repetition combinator")
        }
        Consumed::Consumed(Reply::Err(e)) => Consumed::Consumed(Reply::Err(e)),
        Consumed::Consumed(Reply::Ok(first, s1, _)) => {
            let (mut rest, state, _consumed, end) = repeat(&mut p, s1);
            let mut acc = Vec::with_capacity(rest.len() + 1);
            acc.push(first);
            acc.append(&mut rest);
            match end {
                RepeatEnd::Fatal(e) => Consumed::Consumed(Reply::Err(e)),
                RepeatEnd::Graceful(_) => {
                    let pos = state.pos.clone();
                    Consumed::Consumed(Reply::Ok(acc, state, ParseError::unknown(pos)))
                }
            }
        }
    }
}

/// Like [`many1`] but discards the accumulated results.
pub fn skip_many1<I, U, O, P>(p: P) -> impl Parser<I, U, ()>
where
    I: Stream,
    P: Parser<I, U, O>,
{
    many1(p).map(|_| ())
}

/// Apply `p` exactly `n` times. Returns an empty `Vec` without running `p` at all when `n == 0`.
pub fn count<I, U, O, P>(n: usize, mut p: P) -> impl Parser<I, U, Vec<O>>
where
    I: Stream,
    P: Parser<I, U, O>,
{
    move |mut state: ParserState<I, U>| {
        if n == 0 {
            let pos = state.pos.clone();
            return Consumed::Empty(Reply::Ok(Vec::new(), state, ParseError::unknown(pos)));
        }
        let mut acc = Vec::with_capacity(n);
        let mut consumed_overall = false;
        for i in 0..n {
            match p.parse(state.clone()) {
                Consumed::Consumed(Reply::Ok(v, s2, _)) => {
                    acc.push(v);
                    state = s2;
                    consumed_overall = true;
                }
                Consumed::Empty(Reply::Ok(v, s2, e)) => {
                    acc.push(v);
                    state = s2;
                    if i == n - 1 {
                        return if consumed_overall {
                            let pos = state.pos.clone();
                            Consumed::Consumed(Reply::Ok(acc, state, ParseError::unknown(pos)))
                        } else {
                            Consumed::Empty(Reply::Ok(acc, state, e))
                        };
                    }
                }
                Consumed::Consumed(Reply::Err(e)) => return Consumed::Consumed(Reply::Err(e)),
                Consumed::Empty(Reply::Err(e)) => {
                    return if consumed_overall {
                        Consumed::Consumed(Reply::Err(e))
                    } else {
                        Consumed::Empty(Reply::Err(e))
                    };
                }
            }
        }
        let pos = state.pos.clone();
        Consumed::Consumed(Reply::Ok(acc, state, ParseError::unknown(pos)))
    }
}

/// `p` followed by zero or more `sep *> p`: `p : many(sep *> p)`.
pub fn sep_by1<I, U, O, OS, P, S>(mut p: P, mut sep: S) -> impl Parser<I, U, Vec<O>>
where
    I: Stream,
    P: Parser<I, U, O>,
    S: Parser<I, U, OS>,
{
    move |state: ParserState<I, U>| match p.parse(state) {
        Consumed::Empty(Reply::Err(e)) => Consumed::Empty(Reply::Err(e)),
        Consumed::Empty(Reply::Ok(..)) => {
            panic!("sepBy1: item parser accepted empty input")
        }
        Consumed::Consumed(Reply::Err(e)) => Consumed::Consumed(Reply::Err(e)),
        Consumed::Consumed(Reply::Ok(first, mut state, _)) => {
            let mut acc = vec![first];
            loop {
                match sep.parse(state.clone()) {
                    Consumed::Empty(Reply::Err(_)) => break,
                    Consumed::Consumed(Reply::Err(e)) => return Consumed::Consumed(Reply::Err(e)),
                    Consumed::Empty(Reply::Ok(_, s_sep, _))
                    | Consumed::Consumed(Reply::Ok(_, s_sep, _)) => match p.parse(s_sep) {
                        Consumed::Consumed(Reply::Ok(v, s2, _)) => {
                            acc.push(v);
                            state = s2;
                        }
                        Consumed::Empty(Reply::Ok(..)) => {
                            panic!("sepBy1: item parser accepted empty input")
                        }
                        Consumed::Consumed(Reply::Err(e)) | Consumed::Empty(Reply::Err(e)) => {
                            return Consumed::Consumed(Reply::Err(e));
                        }
                    },
                }
            }
            let pos = state.pos.clone();
            Consumed::Consumed(Reply::Ok(acc, state, ParseError::unknown(pos)))
        }
    }
}

/// [`sep_by1`], or an empty `Vec` if `p` doesn't match at all.
pub fn sep_by<I, U, O, OS, P, S>(p: P, sep: S) -> impl Parser<I, U, Vec<O>>
where
    I: Stream,
    O: Clone + 'static,
    P: Parser<I, U, O>,
    S: Parser<I, U, OS>,
{
    sep_by1(p, sep).alt(pure(Vec::new()))
}

/// `sepEndBy(p, sep, end_required)`: if `end_required`, every item must be followed by `sep`
/// (`many(p <* sep)`); otherwise the separator is optional per item, with a graceful tail.
pub fn sep_end_by<I, U, O, OS, P, S>(
    mut p: P,
    mut sep: S,
    end_required: bool,
) -> impl Parser<I, U, Vec<O>>
where
    I: Stream,
    P: Parser<I, U, O>,
    S: Parser<I, U, OS>,
{
    move |mut state: ParserState<I, U>| {
        let mut acc = Vec::new();
        let mut consumed_overall = false;
        loop {
            match p.parse(state.clone()) {
                Consumed::Empty(Reply::Ok(..)) => {
                    panic!("sepEndBy: item parser accepted empty input")
                }
                Consumed::Empty(Reply::Err(e)) => {
                    return if consumed_overall {
                        let pos = state.pos.clone();
                        Consumed::Consumed(Reply::Ok(acc, state, ParseError::unknown(pos)))
                    } else {
                        Consumed::Empty(Reply::Ok(acc, state, e))
                    };
                }
                Consumed::Consumed(Reply::Err(e)) => return Consumed::Consumed(Reply::Err(e)),
                Consumed::Consumed(Reply::Ok(v, s1, _)) => {
                    acc.push(v);
                    consumed_overall = true;
                    match sep.parse(s1.clone()) {
                        Consumed::Consumed(Reply::Ok(_, s2, _)) => state = s2,
                        Consumed::Empty(Reply::Ok(_, s2, _)) => state = s2,
                        Consumed::Consumed(Reply::Err(e)) => return Consumed::Consumed(Reply::Err(e)),
                        Consumed::Empty(Reply::Err(e)) => {
                            if end_required {
                                return Consumed::Consumed(Reply::Err(e));
                            }
                            let pos = s1.pos.clone();
                            return Consumed::Consumed(Reply::Ok(acc, s1, ParseError::unknown(pos)));
                        }
                    }
                }
            }
        }
    }
}

/// [`sep_end_by`] requiring at least one item.
pub fn sep_end_by1<I, U, O, OS, P, S>(
    mut p: P,
    mut sep: S,
    end_required: bool,
) -> impl Parser<I, U, Vec<O>>
where
    I: Stream,
    P: Parser<I, U, O>,
    S: Parser<I, U, OS>,
{
    move |state: ParserState<I, U>| match p.parse(state) {
        Consumed::Empty(Reply::Err(e)) => Consumed::Empty(Reply::Err(e)),
        Consumed::Empty(Reply::Ok(..)) => {
            panic!("sepEndBy1: item parser accepted empty input")
        }
        Consumed::Consumed(Reply::Err(e)) => Consumed::Consumed(Reply::Err(e)),
        Consumed::Consumed(Reply::Ok(first, s1, _)) => {
            let mut acc = vec![first];
            let mut state = s1;
            loop {
                match sep.parse(state.clone()) {
                    Consumed::Empty(Reply::Err(_)) => break,
                    Consumed::Consumed(Reply::Err(e)) => {
                        if end_required {
                            return Consumed::Consumed(Reply::Err(e));
                        }
                        break;
                    }
                    Consumed::Consumed(Reply::Ok(_, s_sep, _))
                    | Consumed::Empty(Reply::Ok(_, s_sep, _)) => match p.parse(s_sep.clone()) {
                        Consumed::Consumed(Reply::Ok(v, s2, _)) => {
                            acc.push(v);
                            state = s2;
                        }
                        Consumed::Empty(Reply::Ok(..)) => {
                            panic!("sepEndBy1: item parser accepted empty input")
                        }
                        Consumed::Consumed(Reply::Err(e)) => {
                            return Consumed::Consumed(Reply::Err(e));
                        }
                        Consumed::Empty(Reply::Err(e)) => {
                            if end_required {
                                return Consumed::Consumed(Reply::Err(e));
                            }
                            state = s_sep;
                            break;
                        }
                    },
                }
            }
            let pos = state.pos.clone();
            Consumed::Consumed(Reply::Ok(acc, state, ParseError::unknown(pos)))
        }
    }
}

fn split_consumed<R>(c: Consumed<R>) -> (bool, R) {
    match c {
        Consumed::Consumed(r) => (true, r),
        Consumed::Empty(r) => (false, r),
    }
}

/// Parse `p (op p)*`, folding left-associatively: the idiomatic way to write a grammar that
/// would otherwise be left-recursive.
pub fn chain_l1<I, U, O, P, Op, F>(mut p: P, mut op: Op) -> impl Parser<I, U, O>
where
    I: Stream,
    P: Parser<I, U, O>,
    Op: Parser<I, U, F>,
    F: FnOnce(O, O) -> O,
{
    move |state: ParserState<I, U>| {
        let (first_consumed, first_reply) = split_consumed(p.parse(state));
        let (mut acc, mut state, mut consumed_any, mut pending_err) = match first_reply {
            Reply::Err(e) => {
                return if first_consumed {
                    Consumed::Consumed(Reply::Err(e))
                } else {
                    Consumed::Empty(Reply::Err(e))
                };
            }
            Reply::Ok(v, s, e) => (v, s, first_consumed, e),
        };

        loop {
            let (op_consumed, op_reply) = split_consumed(op.parse(state.clone()));
            let (f, s_op, e_op) = match op_reply {
                Reply::Err(e) => {
                    if op_consumed {
                        return Consumed::Consumed(Reply::Err(e));
                    }
                    pending_err = pending_err.merge(e);
                    break;
                }
                Reply::Ok(f, s, e) => (f, s, e),
            };
            let (rhs_consumed, rhs_reply) = split_consumed(p.parse(s_op));
            match rhs_reply {
                Reply::Err(e) => {
                    if op_consumed || rhs_consumed {
                        return Consumed::Consumed(Reply::Err(e));
                    }
                    pending_err = pending_err.merge(e_op).merge(e);
                    break;
                }
                Reply::Ok(rhs, s2, _) => {
                    acc = f(acc, rhs);
                    state = s2;
                    consumed_any = consumed_any || op_consumed || rhs_consumed;
                }
            }
        }

        if consumed_any {
            let pos = state.pos.clone();
            Consumed::Consumed(Reply::Ok(acc, state, ParseError::unknown(pos)))
        } else {
            Consumed::Empty(Reply::Ok(acc, state, pending_err))
        }
    }
}

/// [`chain_l1`] with a default value returned when `p` doesn't match at all.
pub fn chain_l<I, U, O, P, Op, F>(p: P, op: Op, default: O) -> impl Parser<I, U, O>
where
    I: Stream,
    O: Clone + 'static,
    P: Parser<I, U, O>,
    Op: Parser<I, U, F>,
    F: FnOnce(O, O) -> O,
{
    chain_l1(p, op).alt(pure(default))
}

/// Parse the same shape as [`chain_l1`] but fold right-associatively.
pub fn chain_r1<I, U, O, P, Op, F>(mut p: P, mut op: Op) -> impl Parser<I, U, O>
where
    I: Stream,
    P: Parser<I, U, O>,
    Op: Parser<I, U, F>,
    F: FnOnce(O, O) -> O,
{
    move |state: ParserState<I, U>| {
        let (first_consumed, first_reply) = split_consumed(p.parse(state));
        let (first, mut state, mut consumed_any, mut pending_err) = match first_reply {
            Reply::Err(e) => {
                return if first_consumed {
                    Consumed::Consumed(Reply::Err(e))
                } else {
                    Consumed::Empty(Reply::Err(e))
                };
            }
            Reply::Ok(v, s, e) => (v, s, first_consumed, e),
        };

        let mut operands = vec![first];
        let mut funcs: Vec<F> = Vec::new();

        loop {
            let (op_consumed, op_reply) = split_consumed(op.parse(state.clone()));
            let (f, s_op, e_op) = match op_reply {
                Reply::Err(e) => {
                    if op_consumed {
                        return Consumed::Consumed(Reply::Err(e));
                    }
                    pending_err = pending_err.merge(e);
                    break;
                }
                Reply::Ok(f, s, e) => (f, s, e),
            };
            let (rhs_consumed, rhs_reply) = split_consumed(p.parse(s_op));
            match rhs_reply {
                Reply::Err(e) => {
                    if op_consumed || rhs_consumed {
                        return Consumed::Consumed(Reply::Err(e));
                    }
                    pending_err = pending_err.merge(e_op).merge(e);
                    break;
                }
                Reply::Ok(rhs, s2, _) => {
                    funcs.push(f);
                    operands.push(rhs);
                    state = s2;
                    consumed_any = consumed_any || op_consumed || rhs_consumed;
                }
            }
        }

        let mut acc = operands.pop().expect("at least one operand parsed");
        while let Some(f) = funcs.pop() {
            let lhs = operands.pop().expect("one operand per fold function");
            acc = f(lhs, acc);
        }

        if consumed_any {
            let pos = state.pos.clone();
            Consumed::Consumed(Reply::Ok(acc, state, ParseError::unknown(pos)))
        } else {
            Consumed::Empty(Reply::Ok(acc, state, pending_err))
        }
    }
}

/// [`chain_r1`] with a default value returned when `p` doesn't match at all.
pub fn chain_r<I, U, O, P, Op, F>(p: P, op: Op, default: O) -> impl Parser<I, U, O>
where
    I: Stream,
    O: Clone + 'static,
    P: Parser<I, U, O>,
    Op: Parser<I, U, F>,
    F: FnOnce(O, O) -> O,
{
    chain_r1(p, op).alt(pure(default))
}

/// Repeatedly attempt `end` (success exits with the accumulated list) or `p` (appends and
/// continues). `end` typically needs to be wrapped in [`Parser::attempt`] when it overlaps with
/// `p`, so that a failed peek at `end` doesn't commit the whole combinator to failure.
pub fn many_till<I, U, O, OE, P, E>(mut p: P, mut end: E) -> impl Parser<I, U, Vec<O>>
where
    I: Stream,
    P: Parser<I, U, O>,
    E: Parser<I, U, OE>,
{
    move |mut state: ParserState<I, U>| {
        let mut acc = Vec::new();
        let mut consumed_overall = false;
        loop {
            match end.parse(state.clone()) {
                Consumed::Consumed(Reply::Ok(_, s, _)) => {
                    let pos = s.pos.clone();
                    return Consumed::Consumed(Reply::Ok(acc, s, ParseError::unknown(pos)));
                }
                Consumed::Empty(Reply::Ok(_, s, _)) => {
                    let pos = s.pos.clone();
                    return if consumed_overall {
                        Consumed::Consumed(Reply::Ok(acc, s, ParseError::unknown(pos)))
                    } else {
                        Consumed::Empty(Reply::Ok(acc, s, ParseError::unknown(pos)))
                    };
                }
                Consumed::Consumed(Reply::Err(e)) => return Consumed::Consumed(Reply::Err(e)),
                Consumed::Empty(Reply::Err(_)) => match p.parse(state) {
                    Consumed::Consumed(Reply::Ok(v, s, _)) => {
                        acc.push(v);
                        state = s;
                        consumed_overall = true;
                    }
                    Consumed::Empty(Reply::Ok(v, s, _)) => {
                        acc.push(v);
                        state = s;
                    }
                    Consumed::Consumed(Reply::Err(e)) => return Consumed::Consumed(Reply::Err(e)),
                    Consumed::Empty(Reply::Err(e)) => {
                        return if consumed_overall {
                            Consumed::Consumed(Reply::Err(e))
                        } else {
                            Consumed::Empty(Reply::Err(e))
                        };
                    }
                },
            }
        }
    }
}

/// Succeed with `()` iff `p` fails at the current position; never consumes.
///
/// Built, per the source this is grounded on, as `attempt(attempt(p) >>= |v| unexpected(show(v)))
/// <|> return(())`: the inner `attempt` lets a consuming `p` still be inspected by `bind` without
/// poisoning the outer alternative, and the outer `attempt` demotes the `Consumed(Err(_))` that
/// `bind` produces when `p` succeeds back down to `Empty`, so failure here never looks like a
/// commitment to callers.
pub fn no_occurence<I, U, O, P>(p: P) -> impl Parser<I, U, ()>
where
    I: Stream,
    O: std::fmt::Debug,
    P: Parser<I, U, O>,
{
    p.attempt()
        .bind(|v: O| crate::parser::unexpected::<I, U, ()>(format!("{:?}", v)))
        .alt(pure(()))
        .attempt()
}

/// Tie the knot for a self-referential grammar.
///
/// Given `f: Parser -> Parser`, allocate a late-bound cell, build `f`'s result referring to that
/// cell through a thin indirection, then store the result back into the cell. Each call re-enters
/// `f`'s returned parser through the cell, so the recursion is driven by ordinary function calls
/// rather than a pre-built infinite structure.
pub fn recursive<I, U, O>(
    f: impl Fn(Recur<I, U, O>) -> Box<dyn Parser<I, U, O>>,
) -> impl Parser<I, U, O>
where
    I: Stream + 'static,
    U: 'static,
    O: 'static,
{
    use std::cell::RefCell;
    use std::rc::Rc;

    let cell: Rc<RefCell<Option<Box<dyn Parser<I, U, O>>>>> = Rc::new(RefCell::new(None));
    let handle = Recur { cell: cell.clone() };
    let built = f(handle);
    *cell.borrow_mut() = Some(built);

    move |state: ParserState<I, U>| {
        cell.borrow_mut()
            .as_mut()
            .expect("recursive: parser not yet tied")
            .parse(state)
    }
}

/// A weak, late-bound reference to a parser under construction by [`recursive`].
pub struct Recur<I, U, O> {
    cell: std::rc::Rc<std::cell::RefCell<Option<Box<dyn Parser<I, U, O>>>>>,
}

impl<I, U, O> Clone for Recur<I, U, O> {
    fn clone(&self) -> Self {
        Recur { cell: self.cell.clone() }
    }
}

impl<I, U, O> Parser<I, U, O> for Recur<I, U, O>
where
    I: Stream,
{
    fn parse(&mut self, state: ParserState<I, U>) -> ParseResult<O, I, U> {
        self.cell
            .borrow_mut()
            .as_mut()
            .expect("recursive: parser not yet tied")
            .parse(state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::char::{character, digit};

    #[test]
    fn many_collects_zero_or_more() {
        let mut p = many(digit::<&str, ()>());
        let (v, _) = p.run("t", "123abc", ()).unwrap();
        assert_eq!(v, vec!['1', '2', '3']);
        let (v2, _) = many(digit::<&str, ()>()).run("t", "abc", ()).unwrap();
        assert_eq!(v2, Vec::<char>::new());
    }

    #[test]
    fn many1_requires_at_least_one() {
        assert!(many1(digit::<&str, ()>()).run("t", "abc", ()).is_err());
        let (v, _) = many1(digit::<&str, ()>()).run("t", "1abc", ()).unwrap();
        assert_eq!(v, vec!['1']);
    }

    #[test]
    #[should_panic(expected = "accepted empty input")]
    fn many_panics_on_empty_accepting_parser() {
        let _ = many(pure::<&str, (), char>('a')).run("t", "abc", ());
    }

    #[test]
    fn count_runs_exactly_n_times() {
        let (v, _) = count(3, digit::<&str, ()>()).run("t", "1234", ()).unwrap();
        assert_eq!(v, vec!['1', '2', '3']);
        assert!(count::<_, _, _, _>(3, digit::<&str, ()>()).run("t", "12", ()).is_err());
    }

    #[test]
    fn sep_by1_collects_items() {
        let (v, _) = sep_by1(digit::<&str, ()>(), character::<&str, ()>(','))
            .run("t", "1,2,3", ())
            .unwrap();
        assert_eq!(v, vec!['1', '2', '3']);
    }

    #[test]
    fn chain_l1_folds_left() {
        let op = character::<&str, ()>('-').map(|_| |a: i64, b: i64| a - b);
        let num = digit::<&str, ()>().map(|c| c.to_digit(10).unwrap() as i64);
        let (v, _) = chain_l1(num, op).run("t", "9-3-2", ()).unwrap();
        assert_eq!(v, 4); // (9-3)-2
    }

    #[test]
    fn chain_r1_folds_right() {
        let op = character::<&str, ()>('^').map(|_| |a: i64, b: i64| a.pow(b as u32));
        let num = digit::<&str, ()>().map(|c| c.to_digit(10).unwrap() as i64);
        let (v, _) = chain_r1(num, op).run("t", "2^2^3", ()).unwrap();
        assert_eq!(v, 256); // 2^(2^3)
    }
}
