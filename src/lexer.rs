use std::mem;

use lazy_static::lazy_static;
use log::{debug, trace};
use regex::Regex;

use crate::chars::{is_arithmetic_symbol, is_comparison_symbol, is_digit, is_word_start};
use crate::error::{LiteralKind, ParseError};
use crate::keywords::Vocabulary;
use crate::resolver::resolve;
use crate::token::{Kind, NumberKind, OperatorKind, Quote, Span, Token, Trivia, TriviaKind};

lazy_static! {
    static ref FLOAT: Regex = Regex::new(r"^[0-9]+\.[0-9]+(?:[eE][+-]?[0-9]+)?").unwrap();
    static ref INTEGER: Regex = Regex::new(r"^[0-9]+").unwrap();
}

/// Two-character comparison operators, tried before their one-character prefixes.
const LONG_COMPARISONS: [&str; 5] = ["<>", "<=", ">=", "<<", ">>"];

#[derive(Debug, PartialEq, Clone, Default)]
pub struct LexOutput {
    pub tokens: Vec<Token>,
    /// Trivia after the last token.
    pub trailing: Vec<Trivia>,
    pub errors: Vec<ParseError>,
}

impl LexOutput {
    /// Concatenates all trivia and token text, reproducing the scanned input.
    pub fn to_source(&self) -> String {
        let mut out = String::new();
        for token in &self.tokens {
            token.write_source(&mut out);
        }
        for trivia in &self.trailing {
            out.push_str(&trivia.text);
        }
        out
    }
}

pub struct Lexer<'a> {
    source_code: &'a str,
    vocabulary: &'a Vocabulary,
    start: usize,
    current: usize,
    leading: Vec<Trivia>,
    tokens: Vec<Token>,
    errors: Vec<ParseError>,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str, vocabulary: &'a Vocabulary) -> Self {
        Self {
            source_code: input,
            vocabulary,
            start: 0,
            current: 0,
            leading: Vec::new(),
            tokens: Vec::new(),
            errors: Vec::new(),
        }
    }

    fn rest(&self) -> &'a str {
        &self.source_code[self.current..]
    }

    fn at(&self) -> char {
        self.rest().chars().next().unwrap_or('\0')
    }

    fn peek(&self) -> char {
        self.rest().chars().nth(1).unwrap_or('\0')
    }

    fn advance(&mut self, len: usize) {
        self.current += len;
    }

    fn is_eof(&self) -> bool {
        self.current >= self.source_code.len()
    }

    fn span(&self) -> Span {
        Span::new(self.start, self.current)
    }

    fn push_trivia(&mut self, kind: TriviaKind) {
        self.leading.push(Trivia {
            kind,
            text: self.source_code[self.start..self.current].to_string(),
            span: self.span(),
        });
    }

    fn push_token(&mut self, kind: Kind, canonical: Option<String>) {
        self.push_word(kind, canonical, Vec::new());
    }

    fn push_word(&mut self, kind: Kind, canonical: Option<String>, inner: Vec<Trivia>) {
        let token = Token {
            kind,
            text: self.source_code[self.start..self.current].to_string(),
            span: self.span(),
            leading: mem::take(&mut self.leading),
            inner,
            canonical,
        };
        self.tokens.push(token);
    }

    pub fn tokenize(&mut self) -> LexOutput {
        while !self.is_eof() {
            self.start = self.current;
            if let Err(literal) = self.scan_next() {
                self.unterminated(literal);
                break;
            }
        }

        trace!(
            "scanned {} tokens, {} errors",
            self.tokens.len(),
            self.errors.len()
        );

        LexOutput {
            tokens: mem::take(&mut self.tokens),
            trailing: mem::take(&mut self.leading),
            errors: mem::take(&mut self.errors),
        }
    }

    /// Scans one token or one piece of trivia. `Err` carries the kind of literal
    /// left open at end of input.
    fn scan_next(&mut self) -> Result<(), LiteralKind> {
        let ch = self.at();
        match ch {
            c if c.is_whitespace() => {
                let rest = self.rest();
                let len = rest.len() - rest.trim_start().len();
                self.advance(len);
                self.push_trivia(TriviaKind::Whitespace);
            }
            '/' if self.peek() == '/' => {
                let rest = self.rest();
                self.advance(rest.find('\n').unwrap_or(rest.len()));
                self.push_trivia(TriviaKind::LineComment);
            }
            '/' if self.peek() == '*' => {
                let close = self.rest()[2..]
                    .find("*/")
                    .ok_or(LiteralKind::BlockComment)?;
                self.advance(close + 4);
                self.push_trivia(TriviaKind::BlockComment);
            }
            '\'' => self.delimited(1, '\'', Kind::StringLiteral(Quote::Single), LiteralKind::SingleQuotedString)?,
            '"' => self.delimited(1, '"', Kind::StringLiteral(Quote::Double), LiteralKind::DoubleQuotedString)?,
            '[' => self.delimited(1, ']', Kind::BracketField, LiteralKind::BracketField)?,
            '$' if self.peek() == '(' => self.delimited(2, ')', Kind::Macro, LiteralKind::Macro)?,
            c if is_digit(c) => self.number(),
            c if is_comparison_symbol(c) => {
                let rest = self.rest();
                let len = match LONG_COMPARISONS.iter().find(|op| rest.starts_with(**op)) {
                    Some(op) => op.len(),
                    None => 1,
                };
                self.advance(len);
                self.push_token(Kind::Operator(OperatorKind::Comparison), None);
            }
            c if is_arithmetic_symbol(c) => self.single(Kind::Operator(OperatorKind::Arithmetic)),
            ';' => self.single(Kind::Semicolon),
            ',' => self.single(Kind::Comma),
            ':' => self.single(Kind::Colon),
            '(' => self.single(Kind::LParen),
            ')' => self.single(Kind::RParen),
            c if is_word_start(c) => {
                if self.at_rem_comment() {
                    let close = self.rest().find(';').ok_or(LiteralKind::RemComment)?;
                    self.advance(close + 1);
                    self.push_trivia(TriviaKind::RemComment);
                } else {
                    let resolved = resolve(self.source_code, self.start, self.vocabulary);
                    self.current = resolved.end;
                    self.push_word(resolved.kind, resolved.canonical, resolved.inner);
                }
            }
            c => {
                debug!("unknown character {:?} at offset {}", c, self.start);
                self.errors.push(ParseError::UnknownCharacter {
                    ch: c,
                    offset: self.start,
                });
                self.advance(c.len_utf8());
                self.push_trivia(TriviaKind::Skipped);
            }
        }
        Ok(())
    }

    fn single(&mut self, kind: Kind) {
        self.advance(1);
        self.push_token(kind, None);
    }

    /// Opening delimiter of `open_len` bytes, a body without `close`, then `close`.
    fn delimited(
        &mut self,
        open_len: usize,
        close: char,
        kind: Kind,
        literal: LiteralKind,
    ) -> Result<(), LiteralKind> {
        let body = self.rest()[open_len..].find(close).ok_or(literal)?;
        self.advance(open_len + body + close.len_utf8());
        self.push_token(kind, None);
        Ok(())
    }

    fn number(&mut self) {
        let rest = self.rest();
        let (len, kind) = match FLOAT.find(rest) {
            Some(found) => (found.end(), NumberKind::Float),
            None => (
                INTEGER.find(rest).map_or(1, |found| found.end()),
                NumberKind::Integer,
            ),
        };
        self.advance(len);
        self.push_token(Kind::Number(kind), None);
    }

    /// `REM` in any case, directly followed by whitespace.
    fn at_rem_comment(&self) -> bool {
        let rest = self.rest();
        rest.get(..3)
            .map_or(false, |word| word.eq_ignore_ascii_case("rem"))
            && rest[3..].chars().next().map_or(false, char::is_whitespace)
    }

    /// Records the error and keeps the rest of the input as skipped trivia.
    fn unterminated(&mut self, literal: LiteralKind) {
        debug!("unterminated {} at offset {}", literal, self.start);
        self.errors.push(ParseError::UnterminatedLiteral {
            literal,
            offset: self.start,
        });
        self.current = self.source_code.len();
        self.push_trivia(TriviaKind::Skipped);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::{Role, Tier};

    fn lex(source: &str) -> LexOutput {
        Lexer::new(source, Vocabulary::standard()).tokenize()
    }

    fn kinds(source: &str) -> Vec<Kind> {
        lex(source).tokens.iter().map(|token| token.kind).collect()
    }

    fn texts(source: &str) -> Vec<String> {
        lex(source).tokens.into_iter().map(|token| token.text).collect()
    }

    #[test]
    fn load_statement_tokens() {
        assert_eq!(
            texts("LOAD Name, Age FROM [Customers.csv];"),
            vec!["LOAD", "Name", ",", "Age", "FROM", "[Customers.csv]", ";"]
        );
        assert_eq!(
            kinds("LOAD Name FROM [x];"),
            vec![
                Kind::Keyword(Tier::Script, Role::Leader),
                Kind::Identifier,
                Kind::Keyword(Tier::Script, Role::Clause),
                Kind::BracketField,
                Kind::Semicolon,
            ]
        );
    }

    #[test]
    fn floats_are_not_split() {
        assert_eq!(
            kinds("3.14 42 1.5e-3 2E"),
            vec![
                Kind::Number(NumberKind::Float),
                Kind::Number(NumberKind::Integer),
                Kind::Number(NumberKind::Float),
                Kind::Number(NumberKind::Integer),
                Kind::Identifier,
            ]
        );
        assert_eq!(texts("1.5e-3"), vec!["1.5e-3"]);
    }

    #[test]
    fn comparison_operators_prefer_two_characters() {
        assert_eq!(
            texts("a<>b<=c>=d<<e>>f<g>h=i"),
            vec![
                "a", "<>", "b", "<=", "c", ">=", "d", "<<", "e", ">>", "f", "<", "g", ">", "h",
                "=", "i"
            ]
        );
    }

    #[test]
    fn arithmetic_operators_are_single_tokens() {
        let output = lex("a & 'x' + 1 - 2 * 3 / 4");
        let operators: Vec<&str> = output
            .tokens
            .iter()
            .filter(|token| token.kind == Kind::Operator(OperatorKind::Arithmetic))
            .map(|token| token.text.as_str())
            .collect();
        assert_eq!(operators, vec!["&", "+", "-", "*", "/"]);
    }

    #[test]
    fn comments_become_leading_trivia() {
        let output = lex("// first\n/* second */ SET x = 1;");
        let set = &output.tokens[0];
        assert_eq!(set.text, "SET");
        let trivia: Vec<TriviaKind> = set.leading.iter().map(|t| t.kind).collect();
        assert_eq!(
            trivia,
            vec![
                TriviaKind::LineComment,
                TriviaKind::Whitespace,
                TriviaKind::BlockComment,
                TriviaKind::Whitespace,
            ]
        );
        assert_eq!(set.leading[0].text, "// first");
    }

    #[test]
    fn comments_inside_multi_word_keywords_are_inner_trivia() {
        let output = lex("LEFT /* why */ JOIN (A)");
        let join = &output.tokens[0];
        assert_eq!(join.text, "LEFT /* why */ JOIN");
        assert!(join.leading.is_empty());
        assert_eq!(join.inner.len(), 1);
        assert_eq!(join.inner[0].kind, TriviaKind::BlockComment);
        assert_eq!(join.inner[0].span, Span::new(5, 14));
        assert_eq!(join.comments().count(), 1);
        assert!(output.tokens[1..].iter().all(|token| token.inner.is_empty()));
    }

    #[test]
    fn block_comments_do_not_nest() {
        let output = lex("/* a /* b */ x */");
        assert_eq!(output.tokens[0].text, "x");
        assert_eq!(output.tokens[0].leading[0].text, "/* a /* b */");
        assert_eq!(output.tokens[1].text, "*");
    }

    #[test]
    fn rem_comment_swallows_tokens_up_to_semicolon() {
        let output = lex("Rem LOAD 'x' [y] $(z);\nLET a = 1;");
        assert_eq!(output.tokens[0].text, "LET");
        assert_eq!(output.tokens[0].leading[0].kind, TriviaKind::RemComment);
        assert_eq!(output.tokens[0].leading[0].text, "Rem LOAD 'x' [y] $(z);");
        assert!(output.errors.is_empty());
    }

    #[test]
    fn rem_needs_whitespace_after_it() {
        assert_eq!(texts("Remark, rem,x"), vec!["Remark", ",", "rem", ",", "x"]);
    }

    #[test]
    fn literals_are_atomic() {
        assert_eq!(
            texts("[Field; With, Punct] \"a//b\" 'c /* d' $(Include=lib://x.qvs)"),
            vec![
                "[Field; With, Punct]",
                "\"a//b\"",
                "'c /* d'",
                "$(Include=lib://x.qvs)"
            ]
        );
    }

    #[test]
    fn doubled_quotes_make_two_adjacent_strings() {
        assert_eq!(texts("'it''s'"), vec!["'it'", "'s'"]);
    }

    #[test]
    fn unterminated_string_stops_scanning() {
        let source = "LOAD * FROM 'unterminated;";
        let output = lex(source);
        assert_eq!(
            output.errors,
            vec![ParseError::UnterminatedLiteral {
                literal: LiteralKind::SingleQuotedString,
                offset: 12,
            }]
        );
        assert_eq!(texts(source), vec!["LOAD", "*", "FROM"]);
        assert_eq!(output.trailing.last().unwrap().kind, TriviaKind::Skipped);
        assert_eq!(output.to_source(), source);
    }

    #[test]
    fn every_unterminated_literal_is_reported_at_its_opening() {
        let cases = [
            ("x \"abc", LiteralKind::DoubleQuotedString, 2),
            ("x [abc", LiteralKind::BracketField, 2),
            ("x /* abc", LiteralKind::BlockComment, 2),
            ("x REM abc", LiteralKind::RemComment, 2),
            ("x $(abc", LiteralKind::Macro, 2),
        ];
        for (source, literal, offset) in cases {
            assert_eq!(
                lex(source).errors,
                vec![ParseError::UnterminatedLiteral { literal, offset }],
                "{}",
                source
            );
        }
    }

    #[test]
    fn unknown_characters_are_skipped_and_reported() {
        let source = "LET a = 1 ? 2 @;";
        let output = lex(source);
        assert_eq!(
            output.errors,
            vec![
                ParseError::UnknownCharacter { ch: '?', offset: 10 },
                ParseError::UnknownCharacter { ch: '@', offset: 14 },
            ]
        );
        assert_eq!(texts(source), vec!["LET", "a", "=", "1", "2", ";"]);
        assert_eq!(output.to_source(), source);
    }

    #[test]
    fn lone_dollar_is_unknown() {
        let output = lex("$x");
        assert_eq!(
            output.errors,
            vec![ParseError::UnknownCharacter { ch: '$', offset: 0 }]
        );
    }

    #[test]
    fn spans_tile_the_input() {
        let source = "T1:\n  LOAD  %Key, Имя  // tail\n  RESIDENT T0 WHERE x<>1;  ";
        let output = lex(source);
        let mut cursor = 0;
        for token in &output.tokens {
            for trivia in &token.leading {
                assert_eq!(trivia.span.start, cursor);
                cursor = trivia.span.end;
            }
            assert_eq!(token.span.start, cursor);
            assert_eq!(&source[token.span.start..token.span.end], token.text);
            cursor = token.span.end;
        }
        for trivia in &output.trailing {
            assert_eq!(trivia.span.start, cursor);
            cursor = trivia.span.end;
        }
        assert_eq!(cursor, source.len());
    }
}
