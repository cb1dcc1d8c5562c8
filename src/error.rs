//! Source positions and structured parse errors.
//!
//! Errors are designed with a few needs in mind:
//! - Accumulate "expecting ..." hints as alternatives are tried, without losing the one that made
//!   the furthest progress.
//! - Stay cheap to build and merge, since most of them are discarded (e.g. by `alt`/`many`).
//! - Render to the exact multi-line format described in the library's external interface.

use std::cmp::Ordering;
use std::fmt;
use std::rc::Rc;

/// A `(name, line, column)` triple tracking where a parser currently is in its input.
///
/// Lines and columns are both 1-based. `name` is informational only (it never participates in
/// ordering) and is typically the name of the source the input came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourcePos {
    name: Rc<str>,
    line: u32,
    column: u32,
}

impl SourcePos {
    /// The initial position for a source named `name`: line 1, column 1.
    pub fn new(name: impl Into<Rc<str>>) -> Self {
        SourcePos {
            name: name.into(),
            line: 1,
            column: 1,
        }
    }

    /// The source name this position belongs to.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The 1-based line number.
    pub fn line(&self) -> u32 {
        self.line
    }

    /// The 1-based column number.
    pub fn column(&self) -> u32 {
        self.column
    }

    /// Advance past one consumed character.
    ///
    /// A newline moves to the next line, column 1. A tab advances the column to the next
    /// multiple of 8 offset from 1 (column 1 -> 9, column 9 -> 17, column 3 -> 9). Anything else
    /// advances the column by one.
    pub fn advance(&mut self, c: char) {
        match c {
            '\n' => {
                self.line += 1;
                self.column = 1;
            }
            '\t' => {
                self.column += 8 - ((self.column - 1) % 8);
            }
            _ => {
                self.column += 1;
            }
        }
    }

    /// Advance past a whole consumed string, character by character.
    pub fn advance_str(&mut self, s: &str) {
        for c in s.chars() {
            self.advance(c);
        }
    }
}

impl PartialOrd for SourcePos {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for SourcePos {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.line, self.column).cmp(&(other.line, other.column))
    }
}

impl fmt::Display for SourcePos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(line {}, column {})", self.line, self.column)
    }
}

/// A single, taggable piece of error information.
///
/// Within a [`ParseError`] these deduplicate by tag *and* payload: pushing the same message twice
/// is a no-op.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    /// Emitted by the engine itself on a mismatched token. The empty string denotes end of input.
    SysUnexpected(String),
    /// Emitted by user code (`unexpected(...)`).
    Unexpected(String),
    /// A label installed by `<?>`/`label`.
    Expected(String),
    /// Free-form text, as produced by `fail(...)`.
    Generic(String),
}

impl Message {
    fn sort_key(&self) -> u8 {
        match self {
            Message::SysUnexpected(_) => 0,
            Message::Unexpected(_) => 0,
            Message::Expected(_) => 1,
            Message::Generic(_) => 2,
        }
    }
}

/// A structured parse error: a position plus the set of messages accumulated there.
///
/// The "unknown" error (no messages) is the identity element for [`ParseError::merge`] and is
/// what bare combinators like [`crate::combinator::empty`] report before anything more specific
/// is known.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseError {
    pos: SourcePos,
    messages: Vec<Message>,
}

impl ParseError {
    /// The identity error at `pos`: no messages.
    pub fn unknown(pos: SourcePos) -> Self {
        ParseError {
            pos,
            messages: Vec::new(),
        }
    }

    /// A single-message error at `pos`.
    pub fn new(pos: SourcePos, message: Message) -> Self {
        let mut e = ParseError::unknown(pos);
        e.add_message(message);
        e
    }

    /// The position this error is anchored to.
    pub fn position(&self) -> &SourcePos {
        &self.pos
    }

    /// `true` if this carries no messages (the identity error).
    pub fn is_unknown(&self) -> bool {
        self.messages.is_empty()
    }

    /// The messages carried by this error, in the order they were first observed.
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Insert a message if an equal one isn't already present.
    pub fn add_message(&mut self, message: Message) {
        if !self.messages.contains(&message) {
            self.messages.push(message);
        }
    }

    /// Union this error's messages with `other`'s when they share a position; otherwise keep
    /// only the error anchored at the later (greater) position, discarding the other's messages.
    /// This is the "furthest progress" rule: an error from deeper in the input always wins over
    /// a shallower one, and the unknown error is the identity on both sides.
    pub fn merge(self, other: Self) -> Self {
        if self.is_unknown() {
            return other;
        }
        if other.is_unknown() {
            return self;
        }
        match self.pos.cmp(&other.pos) {
            Ordering::Equal => {
                let mut merged = self;
                for m in other.messages {
                    merged.add_message(m);
                }
                merged
            }
            Ordering::Less => other,
            Ordering::Greater => self,
        }
    }

    /// Replace the `Expected` messages with `labels`, leaving `SysUnexpected`/`Unexpected`/
    /// `Generic` untouched. Used by `label`/`<?>`.
    pub fn relabel(mut self, labels: Vec<String>) -> Self {
        self.messages.retain(|m| !matches!(m, Message::Expected(_)));
        for label in labels {
            self.add_message(Message::Expected(label));
        }
        self
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut sorted: Vec<&Message> = self.messages.iter().collect();
        sorted.sort_by_key(|m| m.sort_key());

        let unexpected = sorted.iter().find_map(|m| match m {
            Message::SysUnexpected(s) | Message::Unexpected(s) => Some(s.as_str()),
            _ => None,
        });
        let expected: Vec<&str> = sorted
            .iter()
            .filter_map(|m| match m {
                Message::Expected(s) => Some(s.as_str()),
                _ => None,
            })
            .collect();
        let generic: Vec<&str> = sorted
            .iter()
            .filter_map(|m| match m {
                Message::Generic(s) => Some(s.as_str()),
                _ => None,
            })
            .collect();

        if self.pos.name().is_empty() {
            writeln!(f, "{}:", self.pos)?;
        } else {
            writeln!(f, "{:?} {}:", self.pos.name(), self.pos)?;
        }

        if let Some(unexpected) = unexpected {
            if unexpected.is_empty() {
                writeln!(f, "unexpected end of input")?;
            } else {
                writeln!(f, "unexpected {}", unexpected)?;
            }
        }

        if !expected.is_empty() {
            writeln!(f, "expecting {}", join_or(&expected))?;
        }

        for line in generic {
            writeln!(f, "{}", line)?;
        }

        Ok(())
    }
}

fn join_or(items: &[&str]) -> String {
    match items {
        [] => String::new(),
        [only] => (*only).to_string(),
        _ => {
            let (last, rest) = items.split_last().expect("non-empty");
            format!("{} or {}", rest.join(", "), last)
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for ParseError {}

#[cfg(test)]
mod tests {
    use super::*;

    fn pos() -> SourcePos {
        SourcePos::new("test")
    }

    #[test]
    fn unknown_is_merge_identity() {
        let e = ParseError::new(pos(), Message::Generic("x".into()));
        assert_eq!(
            ParseError::unknown(pos()).merge(e.clone()),
            e.clone()
        );
        assert_eq!(e.clone().merge(ParseError::unknown(pos())), e);
    }

    #[test]
    fn merge_unions_same_position() {
        let a = ParseError::new(pos(), Message::Expected("a".into()));
        let b = ParseError::new(pos(), Message::Expected("b".into()));
        let merged = a.merge(b);
        assert_eq!(merged.messages().len(), 2);
    }

    #[test]
    fn merge_prefers_furthest_position() {
        let mut deep_pos = pos();
        deep_pos.advance('x');
        let shallow = ParseError::new(pos(), Message::Expected("shallow".into()));
        let deep = ParseError::new(deep_pos, Message::Expected("deep".into()));
        let merged = shallow.clone().merge(deep.clone());
        assert_eq!(merged, deep);
        let merged2 = deep.merge(shallow);
        assert_eq!(merged2.messages()[0], Message::Expected("deep".into()));
    }

    #[test]
    fn relabel_only_touches_expected() {
        let mut e = ParseError::new(pos(), Message::SysUnexpected("z".into()));
        e.add_message(Message::Expected("old".into()));
        let e = e.relabel(vec!["new".into()]);
        assert!(e.messages().contains(&Message::SysUnexpected("z".into())));
        assert!(e.messages().contains(&Message::Expected("new".into())));
        assert!(!e.messages().contains(&Message::Expected("old".into())));
    }

    #[test]
    fn render_exact_format() {
        let e = ParseError::new(SourcePos::new("test"), Message::SysUnexpected("\"z\"".into()));
        assert_eq!(format!("{}", e), "\"test\" (line 1, column 1):\nunexpected \"z\"\n");
    }

    #[test]
    fn render_omits_absent_sections() {
        let mut e = ParseError::unknown(SourcePos::new("test"));
        e.add_message(Message::SysUnexpected(String::new()));
        e.add_message(Message::Expected("\"allo\"".into()));
        assert_eq!(
            format!("{}", e),
            "\"test\" (line 1, column 1):\nunexpected end of input\nexpecting \"allo\"\n"
        );
    }

    #[test]
    fn join_or_formats_lists() {
        assert_eq!(join_or(&["a"]), "a");
        assert_eq!(join_or(&["a", "b"]), "a or b");
        assert_eq!(join_or(&["a", "b", "c"]), "a, b or c");
    }
}
