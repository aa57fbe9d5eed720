use std::fmt;
use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;

use crate::token::line_col;

#[derive(Debug, PartialEq, Eq, Clone, Copy, Serialize)]
pub enum LiteralKind {
    SingleQuotedString,
    DoubleQuotedString,
    BracketField,
    BlockComment,
    RemComment,
    Macro,
}

impl fmt::Display for LiteralKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            LiteralKind::SingleQuotedString => "single-quoted string",
            LiteralKind::DoubleQuotedString => "double-quoted string",
            LiteralKind::BracketField => "bracket field",
            LiteralKind::BlockComment => "block comment",
            LiteralKind::RemComment => "REM comment",
            LiteralKind::Macro => "macro",
        };
        f.write_str(name)
    }
}

/// Lexical and structural problems found while parsing one document.
///
/// None of these abort the parse: they are collected next to the best-effort tree.
#[derive(Error, Debug, PartialEq, Eq, Clone, Serialize)]
#[serde(tag = "error", rename_all = "snake_case")]
pub enum ParseError {
    #[error("unterminated {literal} starting at offset {offset}")]
    UnterminatedLiteral { literal: LiteralKind, offset: usize },

    #[error("unknown character {ch:?} at offset {offset}")]
    UnknownCharacter { ch: char, offset: usize },

    #[error("unmatched '(' at offset {offset}")]
    UnmatchedOpenParen { offset: usize },

    #[error("unmatched ')' at offset {offset}")]
    UnmatchedCloseParen { offset: usize },

    #[error("parentheses nested deeper than {limit} at offset {offset}")]
    NestingTooDeep { offset: usize, limit: usize },
}

impl ParseError {
    pub fn offset(&self) -> usize {
        match self {
            ParseError::UnterminatedLiteral { offset, .. }
            | ParseError::UnknownCharacter { offset, .. }
            | ParseError::UnmatchedOpenParen { offset }
            | ParseError::UnmatchedCloseParen { offset }
            | ParseError::NestingTooDeep { offset, .. } => *offset,
        }
    }

    /// Formats the error as `path:line:column: message`.
    pub fn render(&self, path: &str, source: &str) -> String {
        let (line, column) = line_col(source, self.offset());
        format!("{}:{}:{}: {}", path, line, column, self)
    }
}

#[derive(Error, Debug)]
pub enum VocabularyError {
    #[error("keyword spelling is empty")]
    EmptySpelling,

    #[error("keyword {spelling:?} contains {word:?}, which is not a single word")]
    InvalidWord { spelling: String, word: String },

    #[error("logical operator {0:?} must be a single word")]
    MultiWordOperator(String),

    #[error("keyword {0:?} is listed more than once")]
    Duplicate(String),

    #[error("invalid vocabulary table: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Error, Debug)]
pub enum CliError {
    #[error("cannot read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("IOError: {0}")]
    IO(#[from] std::io::Error),

    #[error("invalid config file {}: {source}", path.display())]
    Config {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("invalid setting {name}={value:?}")]
    Setting { name: String, value: String },

    #[error("vocabulary {}: {source}", path.display())]
    Vocabulary {
        path: PathBuf,
        source: VocabularyError,
    },

    #[error("JSON output failed: {0}")]
    Json(#[from] serde_json::Error),
}
