//! Document root of the concrete syntax tree.

use std::fmt::Write;

use log::debug;
use serde::Serialize;

use crate::error::ParseError;
use crate::keywords::Vocabulary;
use crate::lexer::Lexer;
use crate::parser::{Expr, Item, Parser, Statement, TableLabel};
use crate::token::{Span, Token, Trivia};
use crate::DEFAULT_MAX_DEPTH;

#[derive(Debug, PartialEq, Eq, Clone, Serialize)]
pub struct SyntaxTree {
    pub items: Vec<Item>,
    /// Whitespace and comments after the last token.
    pub trailing: Vec<Trivia>,
    pub span: Span,
}

/// A tree together with every error found while building it.
#[derive(Debug, PartialEq, Eq, Clone, Serialize)]
pub struct Parse {
    pub tree: SyntaxTree,
    pub errors: Vec<ParseError>,
}

impl Parse {
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }
}

impl SyntaxTree {
    pub fn statements(&self) -> impl Iterator<Item = &Statement> {
        self.items.iter().filter_map(|item| match item {
            Item::Statement(statement) => Some(statement),
            Item::Label(_) => None,
        })
    }

    pub fn labels(&self) -> impl Iterator<Item = &TableLabel> {
        self.items.iter().filter_map(|item| match item {
            Item::Label(label) => Some(label),
            Item::Statement(_) => None,
        })
    }

    /// Every token in source order.
    pub fn tokens(&self) -> Vec<&Token> {
        let mut tokens = Vec::new();
        for item in &self.items {
            item.collect_tokens(&mut tokens);
        }
        tokens
    }

    /// Every comment in source order, including trailing ones and those inside
    /// multi-word keywords.
    pub fn comments(&self) -> Vec<&Trivia> {
        self.tokens()
            .into_iter()
            .flat_map(Token::comments)
            .chain(self.trailing.iter().filter(|trivia| trivia.is_comment()))
            .collect()
    }

    /// Rebuilds the source text from tokens and trivia.
    pub fn to_source(&self) -> String {
        let mut out = String::with_capacity(self.span.len());
        for token in self.tokens() {
            token.write_source(&mut out);
        }
        for trivia in &self.trailing {
            out.push_str(&trivia.text);
        }
        out
    }

    /// Innermost expression node covering `offset`.
    pub fn node_at(&self, offset: usize) -> Option<&Expr> {
        self.statements()
            .filter(|statement| statement.span.contains(offset))
            .flat_map(|statement| statement.children.iter())
            .find_map(|child| child.find(offset))
    }

    /// Indented, one node per line, for people reading the tree.
    pub fn outline(&self) -> String {
        let mut out = String::new();
        for item in &self.items {
            match item {
                Item::Label(label) => {
                    let _ = writeln!(out, "Label {:?} {}", label.name.text, fmt_span(label.span));
                }
                Item::Statement(statement) => {
                    let keyword = statement.keyword_name().unwrap_or("-");
                    let _ = writeln!(
                        out,
                        "{:?} {} {}",
                        statement.class,
                        keyword,
                        fmt_span(statement.span)
                    );
                    for child in &statement.children {
                        outline_expr(child, 1, &mut out);
                    }
                }
            }
        }
        out
    }
}

fn fmt_span(span: Span) -> String {
    format!("{}..{}", span.start, span.end)
}

fn outline_expr(expr: &Expr, depth: usize, out: &mut String) {
    let indent = "  ".repeat(depth);
    let _ = match expr {
        Expr::Group(group) => writeln!(out, "{}Group {}", indent, fmt_span(group.span)),
        Expr::Call(call) => writeln!(out, "{}Call {:?} {}", indent, call.name.text, fmt_span(call.span)),
        leaf => {
            let (name, token) = match leaf {
                Expr::Literal(token) => ("Literal", token),
                Expr::Identifier(token) => ("Identifier", token),
                Expr::Keyword(token) => ("Keyword", token),
                Expr::Operator(token) => ("Operator", token),
                Expr::Punctuation(token) => ("Punctuation", token),
                Expr::Group(_) | Expr::Call(_) => return,
            };
            writeln!(out, "{}{} {:?} {}", indent, name, token.text, fmt_span(token.span))
        }
    };
    for child in expr.children() {
        outline_expr(child, depth + 1, out);
    }
}

/// Runs the scanner and the statement assembler over one document.
pub struct TreeBuilder<'a> {
    vocabulary: &'a Vocabulary,
    max_depth: usize,
}

impl<'a> TreeBuilder<'a> {
    pub fn new(vocabulary: &'a Vocabulary) -> Self {
        Self {
            vocabulary,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    pub fn max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn build(&self, source: &str) -> Parse {
        let output = Lexer::new(source, self.vocabulary).tokenize();
        let (items, parse_errors) = Parser::new(output.tokens, self.max_depth).parse();

        let mut errors = output.errors;
        errors.extend(parse_errors);
        errors.sort_by_key(ParseError::offset);
        if !errors.is_empty() {
            debug!("{} errors in {} bytes of source", errors.len(), source.len());
        }

        Parse {
            tree: SyntaxTree {
                items,
                trailing: output.trailing,
                span: Span::new(0, source.len()),
            },
            errors,
        }
    }
}
