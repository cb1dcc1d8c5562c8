//! Property-based checks of the engine's algebraic laws: bind/return as a monad, `<|>` as an
//! idempotent-identity monoid modulo merged errors, `attempt`'s backtracking behavior, and
//! `look_ahead`'s non-consumption guarantee.

use proptest::prelude::*;

use trestle::char::{character, digit, string};
use trestle::combinator::many;
use trestle::parser::{empty, pure, Parser};

fn run_digit(input: &str) -> Result<(char, ()), trestle::error::ParseError> {
    digit::<&str, ()>().run("t", input, ())
}

proptest! {
    #[test]
    fn left_identity_return_bind(v in any::<i32>(), input in "[a-z]{0,4}") {
        let mut lhs = pure::<&str, (), i32>(v).bind(move |x| pure::<&str, (), i32>(x * 2));
        let mut rhs = pure::<&str, (), i32>(v * 2);
        prop_assert_eq!(lhs.run("t", input.as_str(), ()).ok(), rhs.run("t", input.as_str(), ()).ok());
    }

    #[test]
    fn right_identity_bind_return(input in "[0-9]{0,3}") {
        let mut lhs = digit::<&str, ()>().bind(|c| pure::<&str, (), char>(c));
        let mut rhs = digit::<&str, ()>();
        prop_assert_eq!(lhs.run("t", input.as_str(), ()).ok(), rhs.run("t", input.as_str(), ()).ok());
    }

    #[test]
    fn bind_is_associative(input in "[0-9]{0,3}") {
        let f = |c: char| pure::<&str, (), i32>(c.to_digit(10).unwrap_or(0) as i32);
        let g = |n: i32| pure::<&str, (), i32>(n + 1);

        let mut lhs = digit::<&str, ()>().bind(f).bind(g);
        let mut rhs = digit::<&str, ()>().bind(move |c| f(c).bind(g));
        prop_assert_eq!(lhs.run("t", input.as_str(), ()).ok(), rhs.run("t", input.as_str(), ()).ok());
    }

    #[test]
    fn alt_empty_is_right_identity(input in "[0-9]{0,3}") {
        let mut lhs = digit::<&str, ()>().alt(empty());
        let mut rhs = digit::<&str, ()>();
        prop_assert_eq!(lhs.run("t", input.as_str(), ()).ok(), rhs.run("t", input.as_str(), ()).ok());
    }

    #[test]
    fn empty_alt_is_left_identity(input in "[0-9]{0,3}") {
        let mut lhs = empty::<&str, (), char>().alt(digit());
        let mut rhs = digit::<&str, ()>();
        prop_assert_eq!(lhs.run("t", input.as_str(), ()).ok(), rhs.run("t", input.as_str(), ()).ok());
    }

    #[test]
    fn alt_is_associative(input in "[0-9a-c]{0,3}") {
        let mut lhs = character::<&str, ()>('a')
            .alt(character::<&str, ()>('b'))
            .alt(character::<&str, ()>('c'));
        let mut rhs = character::<&str, ()>('a')
            .alt(character::<&str, ()>('b').alt(character::<&str, ()>('c')));
        prop_assert_eq!(lhs.run("t", input.as_str(), ()).ok(), rhs.run("t", input.as_str(), ()).ok());
    }
}

#[test]
fn attempt_reopens_the_right_alternative_after_consumption() {
    let mut without_attempt = string::<&str, ()>("ab").bind(|_| string::<&str, ()>("zzz")).alt(string("ac"));
    assert!(without_attempt.run("t", "ac", ()).is_err());

    let mut with_attempt =
        string::<&str, ()>("ab").bind(|_| string::<&str, ()>("zzz")).attempt().alt(string("ac"));
    assert_eq!(with_attempt.run("t", "ac", ()).unwrap().0, "ac".to_string());
}

#[test]
fn look_ahead_restores_original_state_on_success() {
    let mut p = string::<&str, ()>("allo").look_ahead().bind(|_| string::<&str, ()>("allo"));
    let (value, _) = p.run("t", "allo", ()).unwrap();
    assert_eq!(value, "allo");
}

#[test]
#[should_panic(expected = "many: parser accepted empty input")]
fn many_panics_on_an_empty_accepting_parser() {
    let mut p = many(pure::<&str, (), ()>(()));
    let _ = p.run("t", "abc", ());
}

#[test]
fn satisfy_fails_with_system_unexpected_on_empty_input() {
    let err = run_digit("").unwrap_err();
    assert!(err
        .messages()
        .iter()
        .any(|m| matches!(m, trestle::error::Message::SysUnexpected(s) if s.is_empty())));
}
