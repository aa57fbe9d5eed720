use serde::{Deserialize, Serialize};

/// Half-open byte range into the source text.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Default, Serialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn join(self, other: Span) -> Span {
        Span {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    pub fn contains(&self, offset: usize) -> bool {
        self.start <= offset && offset < self.end
    }
}

/// Converts a byte offset into a 1-based line and a 1-based column counted in chars.
pub fn line_col(source: &str, offset: usize) -> (usize, usize) {
    let mut offset = offset.min(source.len());
    while !source.is_char_boundary(offset) {
        offset -= 1;
    }
    let prefix = &source[..offset];
    let line = prefix.matches('\n').count() + 1;
    let line_start = prefix.rfind('\n').map(|i| i + 1).unwrap_or(0);
    let column = prefix[line_start..].chars().count() + 1;
    (line, column)
}

#[derive(Debug, PartialEq, Eq, Clone, Copy, Serialize)]
pub enum TriviaKind {
    Whitespace,
    LineComment,  // // comment
    BlockComment, // /* comment */
    RemComment,   // REM comment;
    Skipped,      // text no token rule accepted
}

#[derive(Debug, PartialEq, Eq, Clone, Serialize)]
pub struct Trivia {
    pub kind: TriviaKind,
    pub text: String,
    pub span: Span,
}

impl Trivia {
    pub fn is_comment(&self) -> bool {
        matches!(
            self.kind,
            TriviaKind::LineComment | TriviaKind::BlockComment | TriviaKind::RemComment
        )
    }
}

/// Functional category of a keyword, deciding which statement shape it can lead.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Control,
    Script,
    Logical,
}

/// Position a keyword may take inside a statement.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Leader,
    #[default]
    Clause,
    HeaderEnd,
}

#[derive(Debug, PartialEq, Eq, Clone, Copy, Serialize)]
pub enum Quote {
    Single,
    Double,
}

#[derive(Debug, PartialEq, Eq, Clone, Copy, Serialize)]
pub enum NumberKind {
    Integer,
    Float,
}

#[derive(Debug, PartialEq, Eq, Clone, Copy, Serialize)]
pub enum OperatorKind {
    Comparison, // <>, <=, >=, <<, >>, <, >, =
    Arithmetic, // &, +, -, *, /
    Logical,    // and, or, not, like, ...
}

#[derive(Debug, PartialEq, Eq, Clone, Copy, Serialize)]
pub enum Kind {
    Identifier,
    Keyword(Tier, Role),

    // Literals
    StringLiteral(Quote),
    BracketField, // [Field Name]
    Number(NumberKind),
    Macro,        // $(vName)

    Operator(OperatorKind),

    // Punctuation
    Semicolon, // ;
    Comma,     // ,
    Colon,     // :
    LParen,    // (
    RParen,    // )
}

impl Kind {
    pub fn is_literal(&self) -> bool {
        matches!(
            self,
            Kind::StringLiteral(_) | Kind::BracketField | Kind::Number(_) | Kind::Macro
        )
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Serialize)]
pub struct Token {
    pub kind: Kind,
    pub text: String,
    pub span: Span,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub leading: Vec<Trivia>,
    /// Comments between the words of a multi-word keyword, e.g. `LEFT /* x */ JOIN`.
    /// They are part of `text` and lie inside `span`.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub inner: Vec<Trivia>,
    /// Vocabulary spelling for keywords and logical operators, e.g. `LEFT JOIN`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub canonical: Option<String>,
}

impl Token {
    pub fn role(&self) -> Option<Role> {
        match self.kind {
            Kind::Keyword(_, role) => Some(role),
            _ => None,
        }
    }

    /// Leading and inner comments, in source order.
    pub fn comments(&self) -> impl Iterator<Item = &Trivia> {
        self.leading
            .iter()
            .chain(self.inner.iter())
            .filter(|trivia| trivia.is_comment())
    }

    pub(crate) fn write_source(&self, out: &mut String) {
        for trivia in &self.leading {
            out.push_str(&trivia.text);
        }
        out.push_str(&self.text);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn join_covers_both_spans() {
        let span = Span::new(4, 7).join(Span::new(1, 3));
        assert_eq!(span, Span::new(1, 7));
        assert_eq!(span.len(), 6);
        assert!(span.contains(1));
        assert!(!span.contains(7));
    }

    #[test]
    fn line_col_counts_chars_not_bytes() {
        let source = "LET a = 1;\nLET ÿ = 2;";
        assert_eq!(line_col(source, 0), (1, 1));
        assert_eq!(line_col(source, 11), (2, 1));
        let after_y = source.find(" = 2").unwrap();
        assert_eq!(line_col(source, after_y), (2, 6));
    }

    #[test]
    fn line_col_clamps_past_the_end() {
        assert_eq!(line_col("ab", 99), (1, 3));
    }
}
