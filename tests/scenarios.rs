//! End-to-end scenarios exercising the whole engine together: expression tables, comment scanning,
//! JSON/Swift language defs, and exact error rendering.

use trestle::char::{character, digit, satisfy, string};
use trestle::combinator::{
    between, build_expression_parser, many1, many_till, recursive, Assoc, BinOp, Operator,
    OperatorTable, Recur, UnOp,
};
use trestle::language::swift_def;
use trestle::lexeme::TokenParser;
use trestle::parser::Parser;

fn natural() -> impl Parser<&'static str, (), f64> {
    many1(digit::<&'static str, ()>())
        .map(|ds: Vec<char>| ds.iter().fold(0f64, |acc, c| acc * 10.0 + c.to_digit(10).unwrap() as f64))
}

fn infix_left(c: char, f: fn(f64, f64) -> f64) -> Operator<&'static str, (), f64> {
    Operator::Infix(
        Box::new(character::<&'static str, ()>(c).map(move |_| Box::new(f) as BinOp<f64>)),
        Assoc::Left,
    )
}

fn shift_expr() -> impl Parser<&'static str, (), f64> {
    recursive(|expr: Recur<&'static str, (), f64>| {
        let term = natural().alt(between(character('('), expr.clone(), character(')')));

        let table: OperatorTable<&'static str, (), f64> = vec![
            vec![
                Operator::Infix(
                    Box::new(string::<&'static str, ()>(">>").map(|_| {
                        Box::new(|a: f64, b: f64| ((a as i64) >> (b as i64)) as f64) as BinOp<f64>
                    })),
                    Assoc::None,
                ),
                Operator::Infix(
                    Box::new(string::<&'static str, ()>("<<").map(|_| {
                        Box::new(|a: f64, b: f64| ((a as i64) << (b as i64)) as f64) as BinOp<f64>
                    })),
                    Assoc::None,
                ),
            ],
            vec![infix_left('+', |a, b| a + b), infix_left('-', |a, b| a - b)],
            vec![infix_left('*', |a, b| a * b), infix_left('/', |a, b| a / b)],
            vec![Operator::Infix(
                Box::new(character::<&'static str, ()>('^').map(|_| Box::new(|a: f64, b: f64| a.powf(b)) as BinOp<f64>)),
                Assoc::Right,
            )],
            vec![
                Operator::Prefix(Box::new(character::<&'static str, ()>('-').map(|_| Box::new(|a: f64| -a) as UnOp<f64>))),
                Operator::Prefix(Box::new(character::<&'static str, ()>('+').map(|_| Box::new(|a: f64| a) as UnOp<f64>))),
                Operator::Postfix(Box::new(
                    string::<&'static str, ()>("++").attempt().map(|_| Box::new(|a: f64| a + 1.0) as UnOp<f64>),
                )),
            ],
        ];
        Box::new(build_expression_parser(table, term))
    })
}

#[test]
fn arithmetic_expression_precedence() {
    let mut p = shift_expr();
    let (value, _) = p.run("t", "1+2*4-8+((3-12)/8)+(-71)+2^2^3", ()).unwrap();
    // 1 + (2*4) - 8 + ((3-12)/8) + (-71) + pow(2, pow(2, 3))
    let expected = 1.0 + 8.0 - 8.0 + (-9.0 / 8.0) + (-71.0) + 256.0;
    assert!((value - expected).abs() < 1e-9);
}

#[test]
fn arithmetic_expression_shift_operators() {
    let mut p = shift_expr();
    assert_eq!(p.run("t", "4>>2", ()).unwrap().0, 1.0);
    let mut p = shift_expr();
    assert_eq!(p.run("t", "4<<2", ()).unwrap().0, 16.0);
}

fn html_comment() -> impl Parser<&'static str, (), String> {
    string::<&'static str, ()>("<!--").bind(|_| {
        many_till(satisfy::<&'static str, ()>(|_: char| true), string::<&'static str, ()>("-->").attempt())
            .map(|chars: Vec<char>| chars.into_iter().collect::<String>())
    })
}

#[test]
fn comment_scanning() {
    let mut p = html_comment();
    let (text, state) = p.run("t", "<!-- A comment -->", ()).unwrap();
    assert_eq!(text, " A comment ");
    let _ = state;

    let mut p = html_comment();
    let (text, _) = p.run("t", "<!---->", ()).unwrap();
    assert_eq!(text, "");

    let mut p = html_comment();
    assert!(p.run("t", "<!-- A comment ->", ()).is_err());
}

#[test]
fn json_string_literal_surrogate_pairs() {
    let tp: TokenParser<&str, ()> = TokenParser::new(trestle::language::json_def());

    let (s, _) = tp.string_literal().run("t", "\"\\uD834\\uDD1E\"", ()).unwrap();
    assert_eq!(s, "\u{1D11E}");

    assert!(tp.string_literal().run("t", "\"\\uD834\"", ()).is_err());

    let (s, _) = tp.string_literal().run("t", "\"\\u0061\"", ()).unwrap();
    assert_eq!(s, "a");
}

#[test]
fn swift_identifier_rules() {
    let tp: TokenParser<&str, ()> = TokenParser::new(swift_def());

    assert_eq!(tp.identifier().run("t", "$0", ()).unwrap().0, "$0");
    assert!(tp.identifier().run("t", "$a", ()).is_err());
    assert!(tp.identifier().run("t", "let", ()).is_err());
    assert_eq!(tp.identifier().run("t", "lets", ()).unwrap().0, "lets");
}

#[test]
fn error_rendering_exact_format() {
    use trestle::char::one_of;

    let mut p = one_of::<&str, ()>("aeiou");
    let err = p.run("test", "z", ()).unwrap_err();
    assert_eq!(format!("{err}"), "\"test\" (line 1, column 1):\nunexpected \"z\"\n");

    let mut p2 = string::<&str, ()>("allo");
    let err2 = p2.run("test", "all", ()).unwrap_err();
    assert_eq!(
        format!("{err2}"),
        "\"test\" (line 1, column 1):\nunexpected end of input\nexpecting \"allo\"\n",
    );
}

#[test]
fn position_tracking_across_choice_reports_furthest_progress() {
    use trestle::combinator::many;
    use trestle::char::space;

    let mut p = many(space::<&str, ()>()).bind(|_| string::<&str, ()>("allo"));
    let err = p.run("test", "\n\nall", ()).unwrap_err();
    assert_eq!(err.position().line(), 3);
    assert_eq!(err.position().column(), 1);
}
