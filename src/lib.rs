//! Tokenizer and concrete syntax tree for Qlik load scripts (`.qvs`).
//!
//! ```text
//! scanner (+ keyword resolver) -> tokens -> statement assembler -> SyntaxTree
//! ```
//!
//! Parsing never fails outright: [`parse`] always returns a tree, together with
//! the lexical and structural errors it ran into. Concatenating every token and
//! trivia of the tree reproduces the input exactly.

pub mod chars;
pub mod config;
pub mod error;
pub mod keywords;
pub mod lexer;
pub mod parser;
pub mod resolver;
pub mod token;
pub mod tree;

pub use error::{CliError, LiteralKind, ParseError, VocabularyError};
pub use keywords::{KeywordEntry, Vocabulary, VocabularyTable};
pub use lexer::{LexOutput, Lexer};
pub use parser::{Call, Expr, Group, Item, Statement, StatementClass, TableLabel, MAX_DEPTH_CEILING};
pub use token::{Kind, Role, Span, Tier, Token, Trivia, TriviaKind};
pub use tree::{Parse, SyntaxTree, TreeBuilder};

/// Parentheses nested deeper than this are kept flat and reported.
pub const DEFAULT_MAX_DEPTH: usize = 128;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseOptions {
    pub max_depth: usize,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

/// Parses `source` with the built-in vocabulary.
pub fn parse(source: &str) -> Parse {
    parse_with(source, Vocabulary::standard(), &ParseOptions::default())
}

pub fn parse_with(source: &str, vocabulary: &Vocabulary, options: &ParseOptions) -> Parse {
    TreeBuilder::new(vocabulary)
        .max_depth(options.max_depth)
        .build(source)
}

/// Scans `source` with the built-in vocabulary, without building statements.
pub fn tokenize(source: &str) -> LexOutput {
    Lexer::new(source, Vocabulary::standard()).tokenize()
}
