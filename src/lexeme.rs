//! The lexeme layer: identifiers, reserved words/operators, numeric and textual literals,
//! whitespace and comment skipping, all parameterized by a [`LanguageDef`].
//!
//! A lexeme wraps a raw parser with trailing whitespace: `lexeme(p) = p <* whiteSpace`. Every
//! named token below is built that way; callers are responsible for consuming leading whitespace
//! once, at the top of their grammar, with [`TokenParser::white_space`].

use std::rc::Rc;

use crate::char::{character, digit, hex_digit, oct_digit, satisfy, string, unicode_space};
use crate::combinator::{
    between, choice, count, many, many1, no_occurence, sep_by, sep_by1, skip_many, skip_many1,
};
use crate::core::{Consumed, ParseResult, Reply};
use crate::error::{Message, ParseError};
use crate::parser::{fail, pure, Parser};
use crate::state::{ParserState, Stream};

/// Which escape grammar a string/character literal uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EscapeStyle {
    /// Named (`\n`), numeric (`\DDD`/`\xHH`/`\oOO`), ASCII mnemonic (`\NUL`..`\DEL`), and caret
    /// (`\^A`) escapes.
    Default,
    /// `\" \\ \/ \b \f \n \r \t`, plus `\uHHHH` with surrogate-pair combining.
    Json,
    /// `\n \r \t \\ \" \' \0`, plus `\u{H…}`.
    Swift,
}

/// The configuration that drives the lexeme layer: comment syntax, identifier and operator
/// character classes, reserved sets, escape rules, case sensitivity.
#[derive(Clone)]
pub struct LanguageDef {
    /// Opening block-comment delimiter. Empty disables block comments.
    pub comment_start: String,
    /// Closing block-comment delimiter.
    pub comment_end: String,
    /// Line-comment prefix. Empty disables line comments.
    pub comment_line: String,
    /// Whether block comments may nest.
    pub nested_comments: bool,
    /// Predicate for an identifier's first character.
    pub ident_start: Rc<dyn Fn(char) -> bool>,
    /// Predicate for an identifier's remaining characters, parameterized by the first character
    /// (so e.g. an implicit-parameter identifier's tail class can depend on how it started).
    pub ident_letter: Rc<dyn Fn(char, char) -> bool>,
    /// Given an identifier's first character, whether at least one `ident_letter` character must
    /// follow (e.g. Swift's `$0` implicit-parameter names require a digit after the `$`).
    pub ident_cont_required: Rc<dyn Fn(char) -> bool>,
    /// Predicate for an operator's first character.
    pub op_start: Rc<dyn Fn(char) -> bool>,
    /// Predicate for an operator's remaining characters.
    pub op_letter: Rc<dyn Fn(char) -> bool>,
    /// Identifiers that are reserved words rather than ordinary identifiers.
    pub reserved_names: Vec<String>,
    /// Operator spellings that are reserved rather than ordinary operators.
    pub reserved_op_names: Vec<String>,
    /// Whether identifier reservation is checked case-sensitively.
    pub case_sensitive: bool,
    /// The escape grammar for character and string literals.
    pub escape: EscapeStyle,
}

/// The result of [`TokenParser::number`]: an integer or a float, tagged by which literal shape
/// matched.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Number {
    Integer(i64),
    Float(f64),
}

#[derive(Debug, Clone, Copy)]
enum Sign {
    Pos,
    Neg,
}

fn sign<I, U>() -> impl Parser<I, U, Sign>
where
    I: Stream<Item = char>,
{
    character('-')
        .map(|_| Sign::Neg)
        .alt(character('+').map(|_| Sign::Pos))
        .alt(pure(Sign::Pos))
}

fn apply_sign_i64(s: Sign, n: u64) -> i64 {
    match s {
        Sign::Pos => n as i64,
        Sign::Neg => -(n as i64),
    }
}

fn apply_sign_f64(s: Sign, n: f64) -> f64 {
    match s {
        Sign::Pos => n,
        Sign::Neg => -n,
    }
}

fn split_consumed<R>(c: Consumed<R>) -> (bool, R) {
    match c {
        Consumed::Consumed(r) => (true, r),
        Consumed::Empty(r) => (false, r),
    }
}

/// The tokenizer built from a [`LanguageDef`]: one instance is created once per grammar and its
/// methods reused wherever that lexeme is needed.
pub struct TokenParser<I, U> {
    def: Rc<LanguageDef>,
    marker: std::marker::PhantomData<fn() -> (I, U)>,
}

impl<I, U> Clone for TokenParser<I, U> {
    fn clone(&self) -> Self {
        TokenParser { def: self.def.clone(), marker: std::marker::PhantomData }
    }
}

impl<I, U> TokenParser<I, U>
where
    I: Stream<Item = char>,
{
    pub fn new(def: LanguageDef) -> Self {
        TokenParser { def: Rc::new(def), marker: std::marker::PhantomData }
    }

    /// `p <* whiteSpace`: wrap a raw parser so its trailing whitespace (and comments) disappear.
    pub fn lexeme<O>(&self, mut p: impl Parser<I, U, O>) -> impl Parser<I, U, O> {
        let def = self.def.clone();
        move |state: ParserState<I, U>| -> ParseResult<O, I, U> {
            let (p_consumed, p_reply) = split_consumed(p.parse(state));
            let (value, s1, e1) = match p_reply {
                Reply::Err(e) => {
                    return if p_consumed {
                        Consumed::Consumed(Reply::Err(e))
                    } else {
                        Consumed::Empty(Reply::Err(e))
                    };
                }
                Reply::Ok(v, s, e) => (v, s, e),
            };
            let (ws_consumed, ws_reply) = split_consumed(white_space_raw::<I, U>(def.clone()).parse(s1));
            let consumed = p_consumed || ws_consumed;
            match ws_reply {
                Reply::Err(e) => {
                    if consumed {
                        Consumed::Consumed(Reply::Err(e))
                    } else {
                        Consumed::Empty(Reply::Err(e))
                    }
                }
                Reply::Ok(_, s2, e2) => {
                    let merged = e1.merge(e2);
                    if consumed {
                        Consumed::Consumed(Reply::Ok(value, s2, merged))
                    } else {
                        Consumed::Empty(Reply::Ok(value, s2, merged))
                    }
                }
            }
        }
    }

    /// Skip zero or more simple spaces, line comments, and block comments.
    pub fn white_space(&self) -> impl Parser<I, U, ()> {
        white_space_raw(self.def.clone())
    }

    /// A literal string, followed by whitespace.
    pub fn symbol(&self, s: impl AsRef<str>) -> impl Parser<I, U, String> {
        self.lexeme(string(s.as_ref().to_string()))
    }

    pub fn parens<O>(&self, p: impl Parser<I, U, O>) -> impl Parser<I, U, O> {
        between(self.symbol("("), p, self.symbol(")"))
    }

    pub fn braces<O>(&self, p: impl Parser<I, U, O>) -> impl Parser<I, U, O> {
        between(self.symbol("{"), p, self.symbol("}"))
    }

    pub fn angles<O>(&self, p: impl Parser<I, U, O>) -> impl Parser<I, U, O> {
        between(self.symbol("<"), p, self.symbol(">"))
    }

    pub fn brackets<O>(&self, p: impl Parser<I, U, O>) -> impl Parser<I, U, O> {
        between(self.symbol("["), p, self.symbol("]"))
    }

    pub fn semi(&self) -> impl Parser<I, U, String> {
        self.symbol(";")
    }

    pub fn comma(&self) -> impl Parser<I, U, String> {
        self.symbol(",")
    }

    pub fn colon(&self) -> impl Parser<I, U, String> {
        self.symbol(":")
    }

    pub fn dot(&self) -> impl Parser<I, U, String> {
        self.symbol(".")
    }

    pub fn semi_sep<O>(&self, p: impl Parser<I, U, O>) -> impl Parser<I, U, Vec<O>>
    where
        O: Clone + 'static,
    {
        sep_by(p, self.semi())
    }

    pub fn semi_sep1<O>(&self, p: impl Parser<I, U, O>) -> impl Parser<I, U, Vec<O>> {
        sep_by1(p, self.semi())
    }

    pub fn comma_sep<O>(&self, p: impl Parser<I, U, O>) -> impl Parser<I, U, Vec<O>>
    where
        O: Clone + 'static,
    {
        sep_by(p, self.comma())
    }

    pub fn comma_sep1<O>(&self, p: impl Parser<I, U, O>) -> impl Parser<I, U, Vec<O>> {
        sep_by1(p, self.comma())
    }

    /// An identifier: `identStart identCont*`, rejecting reserved names.
    pub fn identifier(&self) -> impl Parser<I, U, String> {
        self.lexeme(ident_raw(self.def.clone())).label("identifier")
    }

    /// `name`, provided it is spelled exactly (modulo case sensitivity) and not immediately
    /// followed by another identifier character.
    pub fn reserved_name(&self, name: impl AsRef<str>) -> impl Parser<I, U, ()> {
        self.lexeme(reserved_name_raw(self.def.clone(), name.as_ref().to_string()))
            .label(format!("reserved word {:?}", name.as_ref()))
    }

    /// An operator: `opStart opLetter*`, rejecting reserved operators.
    pub fn legal_operator(&self) -> impl Parser<I, U, String> {
        self.lexeme(op_raw(self.def.clone())).label("operator")
    }

    /// `name`, provided it is spelled exactly and not immediately followed by another operator
    /// character.
    pub fn reserved_operator(&self, name: impl AsRef<str>) -> impl Parser<I, U, ()> {
        self.lexeme(reserved_op_raw(self.def.clone(), name.as_ref().to_string()))
            .label(format!("reserved operator {:?}", name.as_ref()))
    }

    pub fn decimal(&self) -> impl Parser<I, U, u64> {
        self.lexeme(decimal_raw())
    }

    pub fn hexadecimal(&self) -> impl Parser<I, U, u64> {
        self.lexeme(hex_raw())
    }

    pub fn octal(&self) -> impl Parser<I, U, u64> {
        self.lexeme(oct_raw())
    }

    /// A natural number, with an optional `0x`/`0o` base prefix.
    pub fn natural(&self) -> impl Parser<I, U, u64> {
        self.lexeme(nat_raw()).label("natural")
    }

    /// A natural number with an optional leading sign.
    pub fn integer(&self) -> impl Parser<I, U, i64> {
        self.lexeme(sign().bind(|s| nat_raw().map(move |n| apply_sign_i64(s, n))))
            .label("integer")
    }

    /// An optionally signed integer literal, returned as `f64` — useful for exponent-only forms
    /// like `1e10` that never reach a decimal point.
    pub fn integer_as_float(&self) -> impl Parser<I, U, f64> {
        self.lexeme(sign().bind(|s| {
            nat_raw().bind(move |n| exponent_opt().map(move |exp| apply_sign_f64(s, n as f64) * pow10_signed(exp)))
        }))
        .label("number")
    }

    /// A float: an integer part, a mandatory `.`-introduced fraction, and an optional exponent.
    pub fn float(&self) -> impl Parser<I, U, f64> {
        self.lexeme(sign().bind(|s| float_raw().map(move |f| apply_sign_f64(s, f))))
            .label("float")
    }

    /// `attempt(float) <|> integer`, tagged by which one matched. The `attempt` is required
    /// because a bare digit run is a valid prefix of both until a `.` or exponent marker appears.
    pub fn number(&self) -> impl Parser<I, U, Number> {
        self.float()
            .map(Number::Float)
            .attempt()
            .alt(self.integer().map(Number::Integer))
            .label("number")
    }

    pub fn character_literal(&self) -> impl Parser<I, U, char> {
        let style = self.def.escape;
        self.lexeme(between(
            character('\''),
            char_char(style),
            character('\'').label("end of character literal"),
        ))
        .label("character")
    }

    pub fn string_literal(&self) -> impl Parser<I, U, String> {
        let style = self.def.escape;
        self.lexeme(
            between(
                character('"'),
                many(string_char(style)),
                character('"').label("end of string literal"),
            )
            .map(|chars: Vec<Option<char>>| chars.into_iter().flatten().collect()),
        )
        .label("literal string")
    }
}

fn white_space_raw<I, U>(def: Rc<LanguageDef>) -> impl Parser<I, U, ()>
where
    I: Stream<Item = char>,
{
    move |mut state: ParserState<I, U>| -> ParseResult<(), I, U> {
        let mut consumed_overall = false;
        loop {
            if let Consumed::Consumed(Reply::Ok(_, s, _)) = simple_space::<I, U>().parse(state.clone()) {
                state = s;
                consumed_overall = true;
                continue;
            }
            if !def.comment_line.is_empty() {
                if let Consumed::Consumed(Reply::Ok(_, s, _)) =
                    line_comment::<I, U>(def.comment_line.clone()).parse(state.clone())
                {
                    state = s;
                    consumed_overall = true;
                    continue;
                }
            }
            if !def.comment_start.is_empty() {
                match block_comment::<I, U>(def.clone()).parse(state.clone()) {
                    Consumed::Consumed(Reply::Ok(_, s, _)) => {
                        state = s;
                        consumed_overall = true;
                        continue;
                    }
                    Consumed::Consumed(Reply::Err(e)) => return Consumed::Consumed(Reply::Err(e)),
                    _ => {}
                }
            }
            break;
        }
        let pos = state.pos.clone();
        if consumed_overall {
            Consumed::Consumed(Reply::Ok((), state, ParseError::unknown(pos)))
        } else {
            Consumed::Empty(Reply::Ok((), state, ParseError::unknown(pos)))
        }
    }
}

fn simple_space<I, U>() -> impl Parser<I, U, ()>
where
    I: Stream<Item = char>,
{
    skip_many1(unicode_space())
}

fn line_comment<I, U>(prefix: String) -> impl Parser<I, U, ()>
where
    I: Stream<Item = char>,
{
    string(prefix).bind(|_| skip_many(satisfy(|c: char| c != '\n')))
}

fn block_comment<I, U>(def: Rc<LanguageDef>) -> impl Parser<I, U, ()>
where
    I: Stream<Item = char>,
{
    let start = def.comment_start.clone();
    let end = def.comment_end.clone();
    let nested = def.nested_comments;
    string(start.clone()).bind(move |_| in_comment::<I, U>(start.clone(), end.clone(), nested))
}

/// Consume up to and including the matching close delimiter. In nested mode, an inner open
/// delimiter increases the depth instead of being treated as ordinary text.
fn in_comment<I, U>(start: String, end: String, nested: bool) -> impl Parser<I, U, ()>
where
    I: Stream<Item = char>,
{
    move |mut state: ParserState<I, U>| -> ParseResult<(), I, U> {
        let mut depth: u32 = 1;
        loop {
            if let Consumed::Consumed(Reply::Ok(_, s, _)) | Consumed::Empty(Reply::Ok(_, s, _)) =
                string::<I, U>(end.clone()).attempt().parse(state.clone())
            {
                depth -= 1;
                state = s;
                if depth == 0 {
                    let pos = state.pos.clone();
                    return Consumed::Consumed(Reply::Ok((), state, ParseError::unknown(pos)));
                }
                continue;
            }
            if nested {
                if let Consumed::Consumed(Reply::Ok(_, s, _)) | Consumed::Empty(Reply::Ok(_, s, _)) =
                    string::<I, U>(start.clone()).attempt().parse(state.clone())
                {
                    depth += 1;
                    state = s;
                    continue;
                }
            }
            match state.input.uncons() {
                Some((c, rest)) => {
                    let mut pos = state.pos.clone();
                    pos.advance(c);
                    state = ParserState { input: rest, pos, user: state.user };
                }
                None => {
                    let pos = state.pos.clone();
                    return Consumed::Consumed(Reply::Err(ParseError::new(
                        pos,
                        Message::Generic("unterminated comment".to_string()),
                    )));
                }
            }
        }
    }
}

fn ident_raw<I, U>(def: Rc<LanguageDef>) -> impl Parser<I, U, String>
where
    I: Stream<Item = char>,
{
    let start_pred = def.ident_start.clone();
    let cont_pred = def.ident_letter.clone();
    let cont_required = def.ident_cont_required.clone();
    let def2 = def.clone();
    satisfy(move |c: char| start_pred(c))
        .bind(move |first: char| {
            let cont_pred = cont_pred.clone();
            let tail: Box<dyn Parser<I, U, Vec<char>>> = if cont_required(first) {
                Box::new(many1(satisfy(move |c: char| cont_pred(first, c))))
            } else {
                Box::new(many(satisfy(move |c: char| cont_pred(first, c))))
            };
            tail.map(move |rest| {
                let mut name = String::with_capacity(rest.len() + 1);
                name.push(first);
                name.extend(rest);
                name
            })
        })
        .bind(move |name: String| check_reserved_name(def2.clone(), name))
        .attempt()
}

fn check_reserved_name<I, U>(def: Rc<LanguageDef>, name: String) -> impl Parser<I, U, String>
where
    I: Stream<Item = char>,
{
    move |state: ParserState<I, U>| -> ParseResult<String, I, U> {
        let reserved = if def.case_sensitive {
            def.reserved_names.iter().any(|r| *r == name)
        } else {
            def.reserved_names.iter().any(|r| r.eq_ignore_ascii_case(&name))
        };
        let pos = state.pos.clone();
        if reserved {
            Consumed::Empty(Reply::Err(ParseError::new(
                pos,
                Message::Unexpected(format!("reserved word {:?}", name)),
            )))
        } else {
            Consumed::Empty(Reply::Ok(name.clone(), state, ParseError::unknown(pos)))
        }
    }
}

fn reserved_name_raw<I, U>(def: Rc<LanguageDef>, name: String) -> impl Parser<I, U, ()>
where
    I: Stream<Item = char>,
{
    let cont = def.ident_letter.clone();
    let last_char = name.chars().next_back().unwrap_or(' ');
    case_string(name, def.case_sensitive).bind(move |_| no_occurence(satisfy(move |c: char| cont(last_char, c))))
}

fn case_string<I, U>(name: String, case_sensitive: bool) -> Box<dyn Parser<I, U, String>>
where
    I: Stream<Item = char>,
{
    if case_sensitive {
        Box::new(string(name))
    } else {
        Box::new(case_insensitive_string(name))
    }
}

fn case_insensitive_string<I, U>(name: String) -> impl Parser<I, U, String>
where
    I: Stream<Item = char>,
{
    move |mut state: ParserState<I, U>| -> ParseResult<String, I, U> {
        let mut consumed_overall = false;
        for expected in name.chars() {
            match satisfy(move |c: char| c.to_ascii_lowercase() == expected.to_ascii_lowercase()).parse(state.clone())
            {
                Consumed::Consumed(Reply::Ok(_, s, _)) => {
                    state = s;
                    consumed_overall = true;
                }
                Consumed::Empty(Reply::Err(e)) => {
                    return if consumed_overall {
                        Consumed::Consumed(Reply::Err(e))
                    } else {
                        Consumed::Empty(Reply::Err(e))
                    };
                }
                _ => unreachable!("satisfy only ever replies Consumed(Ok) or Empty(Err)"),
            }
        }
        let pos = state.pos.clone();
        Consumed::Consumed(Reply::Ok(name.clone(), state, ParseError::unknown(pos)))
    }
}

fn op_raw<I, U>(def: Rc<LanguageDef>) -> impl Parser<I, U, String>
where
    I: Stream<Item = char>,
{
    let start_pred = def.op_start.clone();
    let cont_pred = def.op_letter.clone();
    let def2 = def.clone();
    satisfy(move |c: char| start_pred(c))
        .bind(move |first: char| {
            let cont_pred = cont_pred.clone();
            many(satisfy(move |c: char| cont_pred(c))).map(move |rest| {
                let mut name = String::with_capacity(rest.len() + 1);
                name.push(first);
                name.extend(rest);
                name
            })
        })
        .bind(move |name: String| check_reserved_op(def2.clone(), name))
        .attempt()
}

fn check_reserved_op<I, U>(def: Rc<LanguageDef>, name: String) -> impl Parser<I, U, String>
where
    I: Stream<Item = char>,
{
    move |state: ParserState<I, U>| -> ParseResult<String, I, U> {
        let reserved = def.reserved_op_names.iter().any(|r| *r == name);
        let pos = state.pos.clone();
        if reserved {
            Consumed::Empty(Reply::Err(ParseError::new(
                pos,
                Message::Unexpected(format!("reserved operator {:?}", name)),
            )))
        } else {
            Consumed::Empty(Reply::Ok(name.clone(), state, ParseError::unknown(pos)))
        }
    }
}

fn reserved_op_raw<I, U>(def: Rc<LanguageDef>, name: String) -> impl Parser<I, U, ()>
where
    I: Stream<Item = char>,
{
    let cont = def.op_letter.clone();
    string(name).bind(move |_| no_occurence(satisfy(move |c: char| cont(c))))
}

fn number_base<I, U>(base: u64, digit_parser: impl Parser<I, U, char>) -> impl Parser<I, U, u64>
where
    I: Stream<Item = char>,
{
    many1(digit_parser).bind(move |digits: Vec<char>| {
        move |state: ParserState<I, U>| -> ParseResult<u64, I, U> {
            let mut acc: u64 = 0;
            let mut overflow = false;
            for d in &digits {
                let value = d.to_digit(36).expect("digit parser only yields base digits") as u64;
                match acc.checked_mul(base).and_then(|v| v.checked_add(value)) {
                    Some(v) => acc = v,
                    None => overflow = true,
                }
            }
            if overflow {
                fail::<I, U, u64>("integer overflow").parse(state)
            } else {
                pure(acc).parse(state)
            }
        }
    })
}

fn decimal_raw<I, U>() -> impl Parser<I, U, u64>
where
    I: Stream<Item = char>,
{
    number_base(10, digit())
}

fn hex_raw<I, U>() -> impl Parser<I, U, u64>
where
    I: Stream<Item = char>,
{
    crate::char::one_of("xX").bind(|_| number_base(16, hex_digit()))
}

fn oct_raw<I, U>() -> impl Parser<I, U, u64>
where
    I: Stream<Item = char>,
{
    crate::char::one_of("oO").bind(|_| number_base(8, oct_digit()))
}

fn zero_number<I, U>() -> impl Parser<I, U, u64>
where
    I: Stream<Item = char>,
{
    character('0').bind(|_| hex_raw().alt(oct_raw()).alt(decimal_raw()).alt(pure(0u64)))
}

fn nat_raw<I, U>() -> impl Parser<I, U, u64>
where
    I: Stream<Item = char>,
{
    zero_number().alt(decimal_raw())
}

fn exponent<I, U>() -> impl Parser<I, U, i32>
where
    I: Stream<Item = char>,
{
    crate::char::one_of("eE").bind(|_| sign().bind(|s| decimal_raw().map(move |n| apply_sign_i32(s, n))))
}

fn exponent_opt<I, U>() -> impl Parser<I, U, i32>
where
    I: Stream<Item = char>,
{
    exponent().alt(pure(0))
}

fn apply_sign_i32(s: Sign, n: u64) -> i32 {
    match s {
        Sign::Pos => n as i32,
        Sign::Neg => -(n as i32),
    }
}

/// `10^exp`, taking the reciprocal of the positive power rather than calling `powi` with a
/// negative argument directly.
fn pow10_signed(exp: i32) -> f64 {
    if exp < 0 {
        1.0 / 10f64.powi(-exp)
    } else {
        10f64.powi(exp)
    }
}

/// Folds right-associatively: `(d0 + (d1 + (d2 + ...) / 10) / 10) / 10`.
fn frac_value(digits: &[char]) -> f64 {
    digits
        .iter()
        .rev()
        .fold(0.0, |acc, c| (acc + c.to_digit(10).unwrap_or(0) as f64) / 10.0)
}

fn float_raw<I, U>() -> impl Parser<I, U, f64>
where
    I: Stream<Item = char>,
{
    decimal_raw().bind(|int_part: u64| {
        character('.').bind(move |_| {
            many1(digit()).bind(move |frac_digits: Vec<char>| {
                let mantissa = int_part as f64 + frac_value(&frac_digits);
                exponent_opt().map(move |exp| mantissa * pow10_signed(exp))
            })
        })
    })
}

fn char_char<I, U>(style: EscapeStyle) -> impl Parser<I, U, char>
where
    I: Stream<Item = char>,
{
    character('\\')
        .bind(move |_| escape_parser(style))
        .alt(crate::char::none_of("'\\"))
}

fn string_char<I, U>(style: EscapeStyle) -> impl Parser<I, U, Option<char>>
where
    I: Stream<Item = char>,
{
    string_letter().map(Some).alt(string_escape(style))
}

fn string_letter<I, U>() -> impl Parser<I, U, char>
where
    I: Stream<Item = char>,
{
    satisfy(|c: char| c != '"' && c != '\\' && (c as u32) > 26)
}

fn string_escape<I, U>(style: EscapeStyle) -> impl Parser<I, U, Option<char>>
where
    I: Stream<Item = char>,
{
    character('\\').bind(move |_| {
        string_gap()
            .map(|_| None)
            .alt(string_zero_width().map(|_| None))
            .alt(escape_parser(style).map(Some))
    })
}

/// A backslash, one or more whitespace characters, and a closing backslash, all discarded: lets a
/// string literal be broken across lines without embedding the newline.
fn string_gap<I, U>() -> impl Parser<I, U, ()>
where
    I: Stream<Item = char>,
{
    skip_many1(unicode_space()).bind(|_| character('\\').label("end of string gap")).map(|_| ())
}

/// `\&`: the zero-width escape, used to disambiguate adjacent numeric escapes from following
/// digits.
fn string_zero_width<I, U>() -> impl Parser<I, U, ()>
where
    I: Stream<Item = char>,
{
    character('&').map(|_| ())
}

fn escape_parser<I, U>(style: EscapeStyle) -> Box<dyn Parser<I, U, char>>
where
    I: Stream<Item = char>,
{
    match style {
        EscapeStyle::Default => Box::new(default_escape()),
        EscapeStyle::Json => Box::new(json_escape()),
        EscapeStyle::Swift => Box::new(swift_escape()),
    }
}

fn default_escape<I, U>() -> impl Parser<I, U, char>
where
    I: Stream<Item = char>,
{
    choice(vec![
        Box::new(escape_named()) as Box<dyn Parser<I, U, char>>,
        Box::new(escape_numeric()),
        Box::new(escape_mnemonic()),
        Box::new(escape_control()),
    ])
}

fn escape_named<I, U>() -> impl Parser<I, U, char>
where
    I: Stream<Item = char>,
{
    crate::char::one_of("nrt\\\"'abfv0").map(|c| match c {
        'n' => '\n',
        'r' => '\r',
        't' => '\t',
        '\\' => '\\',
        '"' => '"',
        '\'' => '\'',
        'a' => '\u{7}',
        'b' => '\u{8}',
        'f' => '\u{c}',
        'v' => '\u{b}',
        '0' => '\0',
        _ => unreachable!("one_of only yields characters from its own set"),
    })
}

fn escape_numeric<I, U>() -> impl Parser<I, U, char>
where
    I: Stream<Item = char>,
{
    let hex = character('x').bind(|_| many1(hex_digit()).bind(|ds| code_point_from_digits(ds, 16)));
    let oct = character('o').bind(|_| many1(oct_digit()).bind(|ds| code_point_from_digits(ds, 8)));
    let dec = many1(digit()).bind(|ds| code_point_from_digits(ds, 10));
    hex.alt(oct).alt(dec)
}

fn code_point_from_digits<I, U>(digits: Vec<char>, base: u32) -> impl Parser<I, U, char>
where
    I: Stream<Item = char>,
{
    move |state: ParserState<I, U>| -> ParseResult<char, I, U> {
        let text: String = digits.iter().collect();
        let code = u32::from_str_radix(&text, base).ok();
        match code.and_then(char::from_u32) {
            Some(c) if !(0xD800..=0xDFFF).contains(&(c as u32)) => pure(c).parse(state),
            _ => fail::<I, U, char>("invalid character code").parse(state),
        }
    }
}

const ASCII_CONTROL_NAMES: &[(&str, u32)] = &[
    ("NUL", 0),
    ("SOH", 1),
    ("STX", 2),
    ("ETX", 3),
    ("EOT", 4),
    ("ENQ", 5),
    ("ACK", 6),
    ("BEL", 7),
    ("BS", 8),
    ("HT", 9),
    ("LF", 10),
    ("VT", 11),
    ("FF", 12),
    ("CR", 13),
    ("SO", 14),
    ("SI", 15),
    ("DLE", 16),
    ("DC1", 17),
    ("DC2", 18),
    ("DC3", 19),
    ("DC4", 20),
    ("NAK", 21),
    ("SYN", 22),
    ("ETB", 23),
    ("CAN", 24),
    ("EM", 25),
    ("SUB", 26),
    ("ESC", 27),
    ("FS", 28),
    ("GS", 29),
    ("RS", 30),
    ("US", 31),
    ("SP", 32),
    ("DEL", 127),
];

/// Tried longest-name-first, so `SOH` is never shadowed by a successful-but-wrong match on `SO`.
fn escape_mnemonic<I, U>() -> impl Parser<I, U, char>
where
    I: Stream<Item = char>,
{
    let mut names: Vec<(&'static str, u32)> = ASCII_CONTROL_NAMES.to_vec();
    names.sort_by_key(|(name, _)| std::cmp::Reverse(name.len()));
    let parsers: Vec<Box<dyn Parser<I, U, char>>> = names
        .into_iter()
        .map(|(name, code)| {
            Box::new(string(name).map(move |_| char::from_u32(code).expect("table codes are valid scalars")))
                as Box<dyn Parser<I, U, char>>
        })
        .collect();
    choice(parsers)
}

/// `\^@ \^A..\^Z \^[ \^\ \^] \^^ \^_`: the C0 caret-control notation.
fn escape_control<I, U>() -> impl Parser<I, U, char>
where
    I: Stream<Item = char>,
{
    character('^').bind(|_| {
        crate::char::one_of("@ABCDEFGHIJKLMNOPQRSTUVWXYZ[\\]^_").map(|c| {
            let code = match c {
                '@' => 0,
                'A'..='Z' => (c as u32 - 'A' as u32) + 1,
                '[' => 27,
                '\\' => 28,
                ']' => 29,
                '^' => 30,
                '_' => 31,
                _ => unreachable!("one_of only yields characters from its own set"),
            };
            char::from_u32(code).expect("caret-control codes are all valid scalars")
        })
    })
}

fn json_escape<I, U>() -> impl Parser<I, U, char>
where
    I: Stream<Item = char>,
{
    crate::char::one_of("\"\\/bfnrt")
        .map(|c| match c {
            '"' => '"',
            '\\' => '\\',
            '/' => '/',
            'b' => '\u{8}',
            'f' => '\u{c}',
            'n' => '\n',
            'r' => '\r',
            't' => '\t',
            _ => unreachable!("one_of only yields characters from its own set"),
        })
        .alt(json_unicode_escape())
}

fn json_unicode_escape<I, U>() -> impl Parser<I, U, char>
where
    I: Stream<Item = char>,
{
    character('u')
        .bind(|_| count(4, hex_digit()))
        .bind(|digits: Vec<char>| {
            let hi = u32::from_str_radix(&digits.iter().collect::<String>(), 16).unwrap_or(0);
            json_combine_surrogate::<I, U>(hi)
        })
}

fn json_combine_surrogate<I, U>(hi: u32) -> impl Parser<I, U, char>
where
    I: Stream<Item = char>,
{
    move |state: ParserState<I, U>| -> ParseResult<char, I, U> {
        if (0xDC00..=0xDFFF).contains(&hi) {
            return fail::<I, U, char>("unexpected low surrogate").parse(state);
        }
        if !(0xD800..=0xDBFF).contains(&hi) {
            return match char::from_u32(hi) {
                Some(c) => pure(c).parse(state),
                None => fail::<I, U, char>("invalid unicode escape").parse(state),
            };
        }

        let mut low_surrogate = string::<I, U>("\\u").attempt().bind(|_| count(4, hex_digit()));
        match low_surrogate.parse(state.clone()) {
            Consumed::Consumed(Reply::Ok(lo_digits, s, _)) | Consumed::Empty(Reply::Ok(lo_digits, s, _)) => {
                let lo = u32::from_str_radix(&lo_digits.iter().collect::<String>(), 16).unwrap_or(0);
                if !(0xDC00..=0xDFFF).contains(&lo) {
                    return fail::<I, U, char>("unpaired high surrogate").parse(state);
                }
                let code = 0x10000 + (hi - 0xD800) * 0x400 + (lo - 0xDC00);
                match char::from_u32(code) {
                    Some(c) => pure(c).parse(s),
                    None => fail::<I, U, char>("invalid surrogate pair").parse(s),
                }
            }
            _ => fail::<I, U, char>("unpaired high surrogate").parse(state),
        }
    }
}

fn swift_escape<I, U>() -> impl Parser<I, U, char>
where
    I: Stream<Item = char>,
{
    crate::char::one_of("nrt\\\"'0")
        .map(|c| match c {
            'n' => '\n',
            'r' => '\r',
            't' => '\t',
            '\\' => '\\',
            '"' => '"',
            '\'' => '\'',
            '0' => '\0',
            _ => unreachable!("one_of only yields characters from its own set"),
        })
        .alt(swift_unicode_escape())
}

fn swift_unicode_escape<I, U>() -> impl Parser<I, U, char>
where
    I: Stream<Item = char>,
{
    character('u').bind(|_| between(character('{'), many1(hex_digit()), character('}'))).bind(|digits: Vec<char>| {
        move |state: ParserState<I, U>| -> ParseResult<char, I, U> {
            let text: String = digits.iter().collect();
            match u32::from_str_radix(&text, 16).ok().and_then(char::from_u32) {
                Some(c) => pure(c).parse(state),
                None => fail::<I, U, char>("invalid unicode scalar").parse(state),
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_def() -> LanguageDef {
        LanguageDef {
            comment_start: "/*".into(),
            comment_end: "*/".into(),
            comment_line: "//".into(),
            nested_comments: true,
            ident_start: Rc::new(|c: char| c.is_alphabetic() || c == '_'),
            ident_letter: Rc::new(|_first: char, c: char| c.is_alphanumeric() || c == '_'),
            ident_cont_required: Rc::new(|_first: char| false),
            op_start: Rc::new(|c: char| "+-*/<>=".contains(c)),
            op_letter: Rc::new(|c: char| "+-*/<>=".contains(c)),
            reserved_names: vec!["let".into(), "in".into()],
            reserved_op_names: vec!["=".into()],
            case_sensitive: true,
            escape: EscapeStyle::Default,
        }
    }

    fn tp() -> TokenParser<&'static str, ()> {
        TokenParser::new(test_def())
    }

    #[test]
    fn identifier_skips_trailing_whitespace_and_rejects_reserved() {
        let mut p = tp().identifier();
        let (v, _) = p.run("t", "foo   bar", ()).unwrap();
        assert_eq!(v, "foo");
        assert!(tp().identifier().run("t", "let", ()).is_err());
        let (v2, _) = tp().identifier().run("t", "lets", ()).unwrap();
        assert_eq!(v2, "lets");
    }

    #[test]
    fn reserved_name_rejects_a_longer_identifier_prefix() {
        assert!(tp().reserved_name("let").run("t", "lets", ()).is_err());
        assert!(tp().reserved_name("let").run("t", "let ", ()).is_ok());
    }

    #[test]
    fn natural_parses_bases() {
        assert_eq!(tp().natural().run("t", "0x1F", ()).unwrap().0, 31);
        assert_eq!(tp().natural().run("t", "0o17", ()).unwrap().0, 15);
        assert_eq!(tp().natural().run("t", "017", ()).unwrap().0, 17);
        assert_eq!(tp().natural().run("t", "42", ()).unwrap().0, 42);
        assert_eq!(tp().natural().run("t", "0", ()).unwrap().0, 0);
    }

    #[test]
    fn integer_accepts_sign_natural_does_not() {
        assert_eq!(tp().integer().run("t", "-5", ()).unwrap().0, -5);
        assert!(tp().natural().run("t", "-5", ()).is_err());
    }

    #[test]
    fn float_requires_fraction() {
        assert_eq!(tp().float().run("t", "3.14", ()).unwrap().0, 3.14);
        assert!(tp().float().run("t", "3", ()).is_err());
        assert_eq!(tp().float().run("t", "1.5e2", ()).unwrap().0, 150.0);
    }

    #[test]
    fn nested_block_comment_terminates_correctly() {
        let mut p = tp().white_space();
        let (_, _) = p.run("t", "/*/* a */*/", ()).unwrap();
    }

    #[test]
    fn string_literal_decodes_escapes_and_gaps() {
        let (v, _) = tp().string_literal().run("t", "\"a\\tb\"", ()).unwrap();
        assert_eq!(v, "a\tb");
        let (v2, _) = tp().string_literal().run("t", "\"a\\   \\b\"", ()).unwrap();
        assert_eq!(v2, "ab");
    }

    #[test]
    fn character_literal_decodes_caret_control() {
        let (v, _) = tp().character_literal().run("t", "'\\^A'", ()).unwrap();
        assert_eq!(v, '\u{1}');
    }

    #[test]
    fn json_surrogate_pair_combines() {
        let mut def = test_def();
        def.escape = EscapeStyle::Json;
        let mut p = TokenParser::<&str, ()>::new(def).string_literal();
        let (v, _) = p.run("t", "\"\\uD834\\uDD1E\"", ()).unwrap();
        assert_eq!(v, "\u{1D11E}");
    }

    #[test]
    fn json_unpaired_high_surrogate_fails() {
        let mut def = test_def();
        def.escape = EscapeStyle::Json;
        let mut p = TokenParser::<&str, ()>::new(def).string_literal();
        assert!(p.run("t", "\"\\uD834\"", ()).is_err());
    }
}
