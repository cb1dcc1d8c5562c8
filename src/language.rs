//! Predefined [`LanguageDef`]s for common lexical conventions, in the style of `Text.Parsec.Token`'s
//! `haskellDef`/`javaStyle`/etc. bundles: a starting point to adapt rather than a one-size-fits-all.

use std::rc::Rc;

use crate::lexeme::{EscapeStyle, LanguageDef};

const EMPTY_OP_CHARS: &str = ":!$%&*+./<=>?^|-~";

fn empty_ident_start(c: char) -> bool {
    c.is_alphabetic() || c == '_'
}

fn empty_ident_letter(_first: char, c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// No comments, case-sensitive, C-like identifiers, no reserved names or operators. The base every
/// other definition here starts from.
pub fn empty_def() -> LanguageDef {
    LanguageDef {
        comment_start: String::new(),
        comment_end: String::new(),
        comment_line: String::new(),
        nested_comments: true,
        ident_start: Rc::new(empty_ident_start),
        ident_letter: Rc::new(empty_ident_letter),
        ident_cont_required: Rc::new(|_first: char| false),
        op_start: Rc::new(|c: char| EMPTY_OP_CHARS.contains(c)),
        op_letter: Rc::new(|c: char| EMPTY_OP_CHARS.contains(c)),
        reserved_names: Vec::new(),
        reserved_op_names: Vec::new(),
        case_sensitive: true,
        escape: EscapeStyle::Default,
    }
}

/// [`empty_def`] plus nested `/* */` block comments and `//` line comments, the way most C-family
/// languages (and this crate's own doc examples) scan comments.
pub fn java_style() -> LanguageDef {
    LanguageDef {
        comment_start: "/*".to_string(),
        comment_end: "*/".to_string(),
        comment_line: "//".to_string(),
        nested_comments: true,
        ..empty_def()
    }
}

/// [`empty_def`] configured for JSON's string-escape grammar. JSON has no identifiers or operators
/// of its own; the inherited character classes are only there so [`crate::lexeme::TokenParser`]'s
/// generic surface stays usable (e.g. for JSON5-flavored extensions built on top of this).
pub fn json_def() -> LanguageDef {
    LanguageDef { escape: EscapeStyle::Json, ..empty_def() }
}

fn swift_ident_start(c: char) -> bool {
    c.is_alphabetic() || c == '_' || c == '$'
}

fn swift_ident_letter(first: char, c: char) -> bool {
    if first == '$' {
        c.is_ascii_digit()
    } else {
        c.is_alphanumeric() || c == '_'
    }
}

const SWIFT_OP_CHARS: &str = "/=-+!*%<>&|^~?.";

const SWIFT_RESERVED_NAMES: &[&str] = &[
    "class", "deinit", "enum", "extension", "func", "import", "init", "internal", "let", "operator",
    "private", "protocol", "public", "static", "struct", "subscript", "typealias", "var", "break",
    "case", "continue", "default", "defer", "do", "else", "fallthrough", "for", "guard", "if", "in",
    "repeat", "return", "switch", "where", "while", "as", "catch", "dynamicType", "false", "is",
    "nil", "rethrows", "super", "self", "Self", "throw", "throws", "true", "try", "__COLUMN__",
    "__FILE__", "__FUNCTION__", "__LINE__",
];

const SWIFT_RESERVED_OPS: &[&str] =
    &["=", "->", ".", ",", ":", "@", "#", "<", "&", "`", "?", ">", "!"];

/// Swift 2.x's identifier, operator, reserved-word, and escape conventions: `$<digits>`
/// implicit-parameter names, the `/* */`-and-`//` comment syntax, and [`EscapeStyle::Swift`].
pub fn swift_def() -> LanguageDef {
    LanguageDef {
        comment_start: "/*".to_string(),
        comment_end: "*/".to_string(),
        comment_line: "//".to_string(),
        nested_comments: true,
        ident_start: Rc::new(swift_ident_start),
        ident_letter: Rc::new(swift_ident_letter),
        ident_cont_required: Rc::new(|first: char| first == '$'),
        op_start: Rc::new(|c: char| SWIFT_OP_CHARS.contains(c)),
        op_letter: Rc::new(|c: char| SWIFT_OP_CHARS.contains(c)),
        reserved_names: SWIFT_RESERVED_NAMES.iter().map(|s| s.to_string()).collect(),
        reserved_op_names: SWIFT_RESERVED_OPS.iter().map(|s| s.to_string()).collect(),
        case_sensitive: true,
        escape: EscapeStyle::Swift,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexeme::TokenParser;
    use crate::parser::Parser;

    #[test]
    fn swift_implicit_parameter_identifier() {
        let tp: TokenParser<&str, ()> = TokenParser::new(swift_def());
        assert_eq!(tp.identifier().run("t", "$0", ()).unwrap().0, "$0");
        assert!(tp.identifier().run("t", "$a", ()).is_err());
    }

    #[test]
    fn swift_reserved_name_rejected_but_longer_ident_kept() {
        let tp: TokenParser<&str, ()> = TokenParser::new(swift_def());
        assert!(tp.identifier().run("t", "let", ()).is_err());
        assert_eq!(tp.identifier().run("t", "lets", ()).unwrap().0, "lets");
    }

    #[test]
    fn java_style_skips_nested_block_comment() {
        let tp: TokenParser<&str, ()> = TokenParser::new(java_style());
        let mut p = tp.white_space().bind(|_| crate::char::character('x'));
        let (c, _) = p.run("t", "/* outer /* inner */ still */x", ()).unwrap();
        assert_eq!(c, 'x');
    }

    #[test]
    fn json_def_decodes_surrogate_pair() {
        let tp: TokenParser<&str, ()> = TokenParser::new(json_def());
        let (s, _) = tp.string_literal().run("t", "\"\\uD834\\uDD1E\"", ()).unwrap();
        assert_eq!(s, "\u{1D11E}");
    }
}
