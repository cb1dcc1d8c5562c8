//! The classic row-table expression-parser builder (`buildExpressionParser` in the Parsec
//! tradition): given term rows ordered from loosest to tightest binding, produces a parser for
//! the whole precedence climb, including detection of genuinely ambiguous mixed-associativity
//! input at a single row.

use std::cell::RefCell;
use std::rc::Rc;

use crate::core::{Consumed, ParseResult, Reply};
use crate::error::{Message, ParseError};
use crate::parser::{empty, Parser};
use crate::state::{ParserState, Stream};

/// A binary fold function produced by an infix operator's parser.
pub type BinOp<O> = Box<dyn FnOnce(O, O) -> O>;
/// A unary fold function produced by a prefix or postfix operator's parser.
pub type UnOp<O> = Box<dyn FnOnce(O) -> O>;

/// How repeated applications of an infix operator at the same precedence associate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Assoc {
    Left,
    Right,
    None,
}

/// One operator entry in a precedence row.
pub enum Operator<I, U, O> {
    Infix(Box<dyn Parser<I, U, BinOp<O>>>, Assoc),
    Prefix(Box<dyn Parser<I, U, UnOp<O>>>),
    Postfix(Box<dyn Parser<I, U, UnOp<O>>>),
}

/// Rows ordered from the loosest-binding operators (folded last, outermost in the overall
/// expression parser) to the tightest-binding (folded first, closest to the raw term).
pub type OperatorTable<I, U, O> = Vec<Vec<Operator<I, U, O>>>;

fn split_consumed<R>(c: Consumed<R>) -> (bool, R) {
    match c {
        Consumed::Consumed(r) => (true, r),
        Consumed::Empty(r) => (false, r),
    }
}

fn peeks<I, U, T>(p: &mut dyn Parser<I, U, T>, state: &ParserState<I, U>) -> bool
where
    I: Stream,
{
    matches!(
        p.parse(state.clone()),
        Consumed::Consumed(Reply::Ok(..)) | Consumed::Empty(Reply::Ok(..))
    )
}

fn choice_or_empty<I, U, T>(mut ops: Vec<Box<dyn Parser<I, U, T>>>) -> Box<dyn Parser<I, U, T>>
where
    I: Stream + 'static,
    U: 'static,
    T: 'static,
{
    if ops.len() == 1 {
        ops.pop().expect("len checked")
    } else if ops.is_empty() {
        Box::new(empty::<I, U, T>())
    } else {
        Box::new(crate::combinator::choice(ops))
    }
}

struct Row<I, U, O> {
    term: Box<dyn Parser<I, U, O>>,
    prefix: Box<dyn Parser<I, U, UnOp<O>>>,
    postfix: Box<dyn Parser<I, U, UnOp<O>>>,
    rassoc: Box<dyn Parser<I, U, BinOp<O>>>,
    lassoc: Box<dyn Parser<I, U, BinOp<O>>>,
    nassoc: Box<dyn Parser<I, U, BinOp<O>>>,
}

impl<I, U, O> Row<I, U, O>
where
    I: Stream + 'static,
    U: 'static,
    O: 'static,
{
    fn new(term: Box<dyn Parser<I, U, O>>, ops: Vec<Operator<I, U, O>>) -> Self {
        let mut rassoc = Vec::new();
        let mut lassoc = Vec::new();
        let mut nassoc = Vec::new();
        let mut prefix = Vec::new();
        let mut postfix = Vec::new();
        for op in ops {
            match op {
                Operator::Infix(p, Assoc::Right) => rassoc.push(p),
                Operator::Infix(p, Assoc::Left) => lassoc.push(p),
                Operator::Infix(p, Assoc::None) => nassoc.push(p),
                Operator::Prefix(p) => prefix.push(p),
                Operator::Postfix(p) => postfix.push(p),
            }
        }
        Row {
            term,
            prefix: choice_or_empty(prefix),
            postfix: choice_or_empty(postfix),
            rassoc: choice_or_empty(rassoc),
            lassoc: choice_or_empty(lassoc),
            nassoc: choice_or_empty(nassoc),
        }
    }

    /// `prefixOp? term postfixOp?`, applying whichever fold functions matched.
    fn term_p(&mut self, state: ParserState<I, U>) -> ParseResult<O, I, U> {
        let (pre_consumed, pre_reply) = split_consumed(self.prefix.parse(state.clone()));
        let (pre_fn, s1) = match pre_reply {
            Reply::Err(e) => {
                if pre_consumed {
                    return Consumed::Consumed(Reply::Err(e));
                }
                (None, state)
            }
            Reply::Ok(f, s, _) => (Some(f), s),
        };

        let (t_consumed, t_reply) = split_consumed(self.term.parse(s1));
        let consumed_so_far = pre_consumed || t_consumed;
        let (value, s2) = match t_reply {
            Reply::Err(e) => {
                return if consumed_so_far {
                    Consumed::Consumed(Reply::Err(e))
                } else {
                    Consumed::Empty(Reply::Err(e))
                };
            }
            Reply::Ok(v, s, _) => (v, s),
        };

        let (post_consumed, post_reply) = split_consumed(self.postfix.parse(s2.clone()));
        let (post_fn, s3) = match post_reply {
            Reply::Err(e) => {
                if post_consumed {
                    return Consumed::Consumed(Reply::Err(e));
                }
                (None, s2)
            }
            Reply::Ok(f, s, _) => (Some(f), s),
        };
        let consumed_so_far = consumed_so_far || post_consumed;

        let mut value = value;
        if let Some(f) = pre_fn {
            value = f(value);
        }
        if let Some(f) = post_fn {
            value = f(value);
        }

        let pos = s3.pos.clone();
        if consumed_so_far {
            Consumed::Consumed(Reply::Ok(value, s3, ParseError::unknown(pos)))
        } else {
            Consumed::Empty(Reply::Ok(value, s3, ParseError::unknown(pos)))
        }
    }

    fn ambiguous_after(&mut self, state: &ParserState<I, U>, kind: &str) -> ParseError {
        let trailing = peeks(&mut *self.rassoc, state)
            || peeks(&mut *self.lassoc, state)
            || peeks(&mut *self.nassoc, state);
        if trailing {
            ParseError::new(
                state.pos.clone(),
                Message::Generic(format!(
                    "ambiguous use of a {kind} associative operator with a differently associative one"
                )),
            )
        } else {
            ParseError::unknown(state.pos.clone())
        }
    }

    fn parse(&mut self, state: ParserState<I, U>) -> ParseResult<O, I, U> {
        match self.term_p(state) {
            Consumed::Empty(Reply::Err(e)) => Consumed::Empty(Reply::Err(e)),
            Consumed::Consumed(Reply::Err(e)) => Consumed::Consumed(Reply::Err(e)),
            Consumed::Empty(Reply::Ok(x, s, _)) => self.continue_row(x, s, false),
            Consumed::Consumed(Reply::Ok(x, s, _)) => self.continue_row(x, s, true),
        }
    }

    fn continue_row(&mut self, x: O, state: ParserState<I, U>, consumed_so_far: bool) -> ParseResult<O, I, U> {
        let (n_consumed, n_reply) = split_consumed(self.nassoc.parse(state.clone()));
        match n_reply {
            Reply::Err(e) => {
                if n_consumed {
                    return Consumed::Consumed(Reply::Err(e));
                }
            }
            Reply::Ok(f, s1, _) => {
                return match self.term_p(s1) {
                    Consumed::Empty(Reply::Err(e)) | Consumed::Consumed(Reply::Err(e)) => {
                        Consumed::Consumed(Reply::Err(e))
                    }
                    Consumed::Consumed(Reply::Ok(y, s2, _)) | Consumed::Empty(Reply::Ok(y, s2, _)) => {
                        let combined = f(x, y);
                        let ambiguity = self.ambiguous_after(&s2, "non");
                        if !ambiguity.is_unknown() {
                            Consumed::Consumed(Reply::Err(ambiguity))
                        } else {
                            let pos = s2.pos.clone();
                            Consumed::Consumed(Reply::Ok(combined, s2, ParseError::unknown(pos)))
                        }
                    }
                };
            }
        }

        let (l_consumed, l_reply) = split_consumed(self.lassoc.parse(state.clone()));
        match l_reply {
            Reply::Err(e) => {
                if l_consumed {
                    return Consumed::Consumed(Reply::Err(e));
                }
            }
            Reply::Ok(first_fn, s1, _) => {
                let mut acc = x;
                let mut f = first_fn;
                let mut state = s1;
                loop {
                    match self.term_p(state) {
                        Consumed::Empty(Reply::Err(e)) | Consumed::Consumed(Reply::Err(e)) => {
                            return Consumed::Consumed(Reply::Err(e));
                        }
                        Consumed::Consumed(Reply::Ok(y, s2, _)) | Consumed::Empty(Reply::Ok(y, s2, _)) => {
                            acc = f(acc, y);
                            state = s2;
                        }
                    }
                    match self.lassoc.parse(state.clone()) {
                        Consumed::Empty(Reply::Err(_)) => break,
                        Consumed::Consumed(Reply::Err(e)) => return Consumed::Consumed(Reply::Err(e)),
                        Consumed::Consumed(Reply::Ok(next_fn, s_op, _))
                        | Consumed::Empty(Reply::Ok(next_fn, s_op, _)) => {
                            f = next_fn;
                            state = s_op;
                        }
                    }
                }
                let ambiguity = self.ambiguous_after(&state, "left");
                return if !ambiguity.is_unknown() {
                    Consumed::Consumed(Reply::Err(ambiguity))
                } else {
                    let pos = state.pos.clone();
                    Consumed::Consumed(Reply::Ok(acc, state, ParseError::unknown(pos)))
                };
            }
        }

        let (r_consumed, r_reply) = split_consumed(self.rassoc.parse(state.clone()));
        match r_reply {
            Reply::Err(e) => {
                if r_consumed {
                    return Consumed::Consumed(Reply::Err(e));
                }
            }
            Reply::Ok(first_fn, s1, _) => {
                let mut operands = vec![x];
                let mut funcs = vec![first_fn];
                let mut state = s1;
                loop {
                    match self.term_p(state) {
                        Consumed::Empty(Reply::Err(e)) | Consumed::Consumed(Reply::Err(e)) => {
                            return Consumed::Consumed(Reply::Err(e));
                        }
                        Consumed::Consumed(Reply::Ok(y, s2, _)) | Consumed::Empty(Reply::Ok(y, s2, _)) => {
                            operands.push(y);
                            state = s2;
                        }
                    }
                    match self.rassoc.parse(state.clone()) {
                        Consumed::Empty(Reply::Err(_)) => break,
                        Consumed::Consumed(Reply::Err(e)) => return Consumed::Consumed(Reply::Err(e)),
                        Consumed::Consumed(Reply::Ok(next_fn, s_op, _))
                        | Consumed::Empty(Reply::Ok(next_fn, s_op, _)) => {
                            funcs.push(next_fn);
                            state = s_op;
                        }
                    }
                }
                let ambiguity = self.ambiguous_after(&state, "right");
                if !ambiguity.is_unknown() {
                    return Consumed::Consumed(Reply::Err(ambiguity));
                }
                let mut acc = operands.pop().expect("at least one operand parsed");
                while let Some(f) = funcs.pop() {
                    let lhs = operands.pop().expect("one operand per fold function");
                    acc = f(lhs, acc);
                }
                let pos = state.pos.clone();
                return Consumed::Consumed(Reply::Ok(acc, state, ParseError::unknown(pos)));
            }
        }

        let pos = state.pos.clone();
        if consumed_so_far {
            Consumed::Consumed(Reply::Ok(x, state, ParseError::unknown(pos)))
        } else {
            Consumed::Empty(Reply::Ok(x, state, ParseError::unknown(pos)))
        }
    }
}

/// A `Row` wrapped for reuse as the `term` of the next (looser-binding) row.
struct Shared<I, U, O> {
    inner: Rc<RefCell<Row<I, U, O>>>,
}

impl<I, U, O> Shared<I, U, O> {
    fn new(row: Row<I, U, O>) -> Self {
        Shared { inner: Rc::new(RefCell::new(row)) }
    }
}

impl<I, U, O> Parser<I, U, O> for Shared<I, U, O>
where
    I: Stream + 'static,
    U: 'static,
    O: 'static,
{
    fn parse(&mut self, state: ParserState<I, U>) -> ParseResult<O, I, U> {
        self.inner.borrow_mut().parse(state)
    }
}

/// Build the whole precedence climb from `table` (loosest-binding row first) over `term`.
///
/// Rows fold from the tightest-binding (the last row in `table`, applied closest to `term`) to
/// the loosest (the first row, producing the outermost parser) — so the fold itself runs over
/// `table` in reverse.
pub fn build_expression_parser<I, U, O, P>(
    table: OperatorTable<I, U, O>,
    term: P,
) -> impl Parser<I, U, O>
where
    I: Stream + 'static,
    U: 'static,
    O: 'static,
    P: Parser<I, U, O> + 'static,
{
    let mut acc: Box<dyn Parser<I, U, O>> = Box::new(term);
    for row in table.into_iter().rev() {
        let built = Row::new(acc, row);
        acc = Box::new(Shared::new(built));
    }
    acc
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::char::{character, digit};
    use crate::parser::Parser;

    fn num() -> impl Parser<&'static str, (), i64> {
        digit::<&str, ()>().map(|c| c.to_digit(10).unwrap() as i64)
    }

    fn infix_left(c: char, f: fn(i64, i64) -> i64) -> Operator<&'static str, (), i64> {
        Operator::Infix(
            Box::new(character::<&str, ()>(c).map(move |_| Box::new(f) as BinOp<i64>)),
            Assoc::Left,
        )
    }

    #[test]
    fn precedence_climbs_tightest_last_listed_first_applied() {
        let table: OperatorTable<&'static str, (), i64> = vec![
            vec![infix_left('+', |a, b| a + b)],
            vec![infix_left('*', |a, b| a * b)],
        ];
        let mut p = build_expression_parser(table, num());
        let (v, _) = p.run("t", "2+3*4", ()).unwrap();
        assert_eq!(v, 14);
    }

    #[test]
    fn mixed_assoc_same_row_is_ambiguous() {
        let table: OperatorTable<&'static str, (), i64> = vec![vec![
            infix_left('-', |a, b| a - b),
            Operator::Infix(
                Box::new(
                    character::<&str, ()>('^').map(|_| Box::new(|a: i64, b: i64| a + b) as BinOp<i64>),
                ),
                Assoc::Right,
            ),
        ]];
        let mut p = build_expression_parser(table, num());
        assert!(p.run("t", "9-3^2", ()).is_err());
    }
}
