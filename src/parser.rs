use std::collections::VecDeque;

use log::{debug, warn};
use serde::Serialize;

use crate::error::ParseError;
use crate::token::{Kind, Role, Span, Tier, Token};

/// Hard limit on nested groups and calls, whatever depth is configured.
pub const MAX_DEPTH_CEILING: usize = 256;

#[derive(Debug, PartialEq, Eq, Clone, Copy, Serialize)]
pub enum StatementClass {
    Control,    // IF, FOR, DO, SUB, SWITCH, EXIT ...
    Script,     // LOAD, SELECT, SET, LET, DROP TABLE ...
    Expression, // anything else, including the empty statement
}

#[derive(Debug, PartialEq, Eq, Clone, Serialize)]
pub enum Expr {
    Literal(Token),
    Identifier(Token),
    Keyword(Token),
    Operator(Token),
    Punctuation(Token),
    Group(Group),
    Call(Call),
}

/// `( ... )` with no function name in front.
#[derive(Debug, PartialEq, Eq, Clone, Serialize)]
pub struct Group {
    pub open: Token,
    pub children: Vec<Expr>,
    /// `None` when the group was closed implicitly at the end of its statement.
    pub close: Option<Token>,
    pub span: Span,
}

/// `name( ... )`. Commas between arguments stay in `args` as punctuation.
#[derive(Debug, PartialEq, Eq, Clone, Serialize)]
pub struct Call {
    pub name: Token,
    pub open: Token,
    pub args: Vec<Expr>,
    pub close: Option<Token>,
    pub span: Span,
}

/// `Name:` or `[Table Name]:` in front of a LOAD or SELECT.
#[derive(Debug, PartialEq, Eq, Clone, Serialize)]
pub struct TableLabel {
    pub name: Token,
    pub colon: Token,
    pub span: Span,
}

#[derive(Debug, PartialEq, Eq, Clone, Serialize)]
pub struct Statement {
    pub class: StatementClass,
    pub keyword: Option<Token>,
    pub children: Vec<Expr>,
    pub terminator: Option<Token>,
    pub span: Span,
}

#[derive(Debug, PartialEq, Eq, Clone, Serialize)]
pub enum Item {
    Statement(Statement),
    Label(TableLabel),
}

impl Expr {
    pub fn span(&self) -> Span {
        match self {
            Expr::Literal(token)
            | Expr::Identifier(token)
            | Expr::Keyword(token)
            | Expr::Operator(token)
            | Expr::Punctuation(token) => token.span,
            Expr::Group(group) => group.span,
            Expr::Call(call) => call.span,
        }
    }

    /// The single token of a leaf node.
    pub fn token(&self) -> Option<&Token> {
        match self {
            Expr::Literal(token)
            | Expr::Identifier(token)
            | Expr::Keyword(token)
            | Expr::Operator(token)
            | Expr::Punctuation(token) => Some(token),
            Expr::Group(_) | Expr::Call(_) => None,
        }
    }

    /// Nested nodes of a group or call.
    pub fn children(&self) -> &[Expr] {
        match self {
            Expr::Group(group) => &group.children,
            Expr::Call(call) => &call.args,
            _ => &[],
        }
    }

    pub(crate) fn collect_tokens<'t>(&'t self, out: &mut Vec<&'t Token>) {
        match self {
            Expr::Group(group) => {
                out.push(&group.open);
                group.children.iter().for_each(|child| child.collect_tokens(out));
                out.extend(group.close.as_ref());
            }
            Expr::Call(call) => {
                out.push(&call.name);
                out.push(&call.open);
                call.args.iter().for_each(|arg| arg.collect_tokens(out));
                out.extend(call.close.as_ref());
            }
            leaf => out.extend(leaf.token()),
        }
    }

    /// Innermost node whose span contains `offset`.
    pub fn find(&self, offset: usize) -> Option<&Expr> {
        if !self.span().contains(offset) {
            return None;
        }
        self.children()
            .iter()
            .find_map(|child| child.find(offset))
            .or(Some(self))
    }

    fn leaf(token: Token) -> Expr {
        match token.kind {
            Kind::Identifier => Expr::Identifier(token),
            Kind::Keyword(..) => Expr::Keyword(token),
            Kind::Operator(_) => Expr::Operator(token),
            kind if kind.is_literal() => Expr::Literal(token),
            _ => Expr::Punctuation(token),
        }
    }
}

impl Statement {
    pub fn span(&self) -> Span {
        self.span
    }

    /// Canonical spelling of the leading keyword, e.g. `EXIT SCRIPT`.
    pub fn keyword_name(&self) -> Option<&str> {
        self.keyword.as_ref().and_then(|token| token.canonical.as_deref())
    }

    pub fn is_empty(&self) -> bool {
        self.keyword.is_none() && self.children.is_empty()
    }

    pub(crate) fn collect_tokens<'t>(&'t self, out: &mut Vec<&'t Token>) {
        out.extend(self.keyword.as_ref());
        self.children.iter().for_each(|child| child.collect_tokens(out));
        out.extend(self.terminator.as_ref());
    }
}

impl Item {
    pub fn span(&self) -> Span {
        match self {
            Item::Statement(statement) => statement.span,
            Item::Label(label) => label.span,
        }
    }

    pub(crate) fn collect_tokens<'t>(&'t self, out: &mut Vec<&'t Token>) {
        match self {
            Item::Statement(statement) => statement.collect_tokens(out),
            Item::Label(label) => {
                out.push(&label.name);
                out.push(&label.colon);
            }
        }
    }
}

fn children_span(first: Span, children: &[Expr], close: Option<&Token>) -> Span {
    let last = close
        .map(|token| token.span)
        .or_else(|| children.last().map(Expr::span))
        .unwrap_or(first);
    first.join(last)
}

/// Groups a token stream into top-level items.
///
/// The grammar below statement level is flat: operands, operators and punctuation
/// are siblings in source order, and only parentheses nest.
pub struct Parser {
    tokens: VecDeque<Token>,
    max_depth: usize,
    errors: Vec<ParseError>,
}

impl Parser {
    /// `max_depth` is clamped to [`MAX_DEPTH_CEILING`].
    pub fn new(tokens: Vec<Token>, max_depth: usize) -> Self {
        if max_depth > MAX_DEPTH_CEILING {
            warn!(
                "max depth {} lowered to {}",
                max_depth, MAX_DEPTH_CEILING
            );
        }
        Self {
            tokens: tokens.into(),
            max_depth: max_depth.min(MAX_DEPTH_CEILING),
            errors: Vec::new(),
        }
    }

    pub fn parse(mut self) -> (Vec<Item>, Vec<ParseError>) {
        let mut items = Vec::new();

        while let Some(first) = self.tokens.pop_front() {
            if matches!(first.kind, Kind::Identifier | Kind::BracketField) {
                if let Some(colon) = self.eat(Kind::Colon) {
                    let span = first.span.join(colon.span);
                    items.push(Item::Label(TableLabel {
                        name: first,
                        colon,
                        span,
                    }));
                    continue;
                }
            }
            items.push(Item::Statement(self.parse_statement(first)));
        }

        (items, self.errors)
    }

    fn eat(&mut self, expecting: Kind) -> Option<Token> {
        match self.tokens.front() {
            Some(token) if token.kind == expecting => self.tokens.pop_front(),
            _ => None,
        }
    }

    /// Next token of the current statement; never crosses a `;`.
    fn next_in_statement(&mut self) -> Option<Token> {
        match self.tokens.front() {
            Some(token) if token.kind != Kind::Semicolon => self.tokens.pop_front(),
            _ => None,
        }
    }

    fn parse_statement(&mut self, first: Token) -> Statement {
        let class = match first.kind {
            Kind::Keyword(Tier::Control, _) => StatementClass::Control,
            Kind::Keyword(Tier::Script, _) => StatementClass::Script,
            _ => StatementClass::Expression,
        };
        let start = first.span;

        let (keyword, children) = match class {
            StatementClass::Expression if first.kind == Kind::Semicolon => {
                return Statement {
                    class,
                    keyword: None,
                    children: Vec::new(),
                    terminator: Some(first),
                    span: start,
                };
            }
            StatementClass::Expression => {
                self.tokens.push_front(first);
                (None, self.parse_body(class))
            }
            _ if first.role() == Some(Role::HeaderEnd) => (Some(first), Vec::new()),
            _ => (Some(first), self.parse_body(class)),
        };

        let terminator = self.eat(Kind::Semicolon);
        let span = children_span(start, &children, terminator.as_ref());
        Statement {
            class,
            keyword,
            children,
            terminator,
            span,
        }
    }

    /// True when the next token starts a new item instead of extending a statement
    /// of `class`. Script and expression statements only end at `;`.
    fn at_boundary(&self, class: StatementClass) -> bool {
        let Some(token) = self.tokens.front() else {
            return true;
        };
        match (token.kind, class) {
            (Kind::Semicolon, _) => true,
            (_, StatementClass::Script | StatementClass::Expression) => false,
            (Kind::Keyword(_, Role::Leader), StatementClass::Control) => true,
            (Kind::Identifier | Kind::BracketField, StatementClass::Control) => {
                self.tokens.get(1).map(|next| next.kind) == Some(Kind::Colon)
            }
            _ => false,
        }
    }

    fn parse_body(&mut self, class: StatementClass) -> Vec<Expr> {
        let mut children = Vec::new();

        while !self.at_boundary(class) {
            let Some(token) = self.tokens.pop_front() else {
                break;
            };
            let ends_header =
                class == StatementClass::Control && token.role() == Some(Role::HeaderEnd);

            if token.kind == Kind::RParen {
                debug!("unmatched ')' at offset {}", token.span.start);
                self.errors.push(ParseError::UnmatchedCloseParen {
                    offset: token.span.start,
                });
                children.push(Expr::Punctuation(token));
            } else {
                self.parse_operand(token, 0, &mut children);
            }

            if ends_header {
                break;
            }
        }

        children
    }

    fn parse_operand(&mut self, token: Token, depth: usize, out: &mut Vec<Expr>) {
        match token.kind {
            Kind::LParen if depth >= self.max_depth => self.flatten_too_deep(token, out),
            Kind::LParen => {
                let (children, close) = self.parse_nested(&token, depth + 1);
                let span = children_span(token.span, &children, close.as_ref());
                out.push(Expr::Group(Group {
                    open: token,
                    children,
                    close,
                    span,
                }));
            }
            Kind::Identifier if self.tokens.front().map(|t| t.kind) == Some(Kind::LParen) => {
                let Some(open) = self.tokens.pop_front() else {
                    return;
                };
                if depth >= self.max_depth {
                    out.push(Expr::Identifier(token));
                    self.flatten_too_deep(open, out);
                    return;
                }
                let (args, close) = self.parse_nested(&open, depth + 1);
                let span = children_span(token.span, &args, close.as_ref()).join(open.span);
                out.push(Expr::Call(Call {
                    name: token,
                    open,
                    args,
                    close,
                    span,
                }));
            }
            _ => out.push(Expr::leaf(token)),
        }
    }

    /// Contents after `open` up to its matching `)`. Unclosed groups end before
    /// the statement's `;` or at end of input.
    fn parse_nested(&mut self, open: &Token, depth: usize) -> (Vec<Expr>, Option<Token>) {
        let mut children = Vec::new();

        while let Some(token) = self.next_in_statement() {
            if token.kind == Kind::RParen {
                return (children, Some(token));
            }
            self.parse_operand(token, depth, &mut children);
        }

        debug!("unmatched '(' at offset {}", open.span.start);
        self.errors.push(ParseError::UnmatchedOpenParen {
            offset: open.span.start,
        });
        (children, None)
    }

    /// Keeps a group nested past `max_depth` as flat leaves up to its matching `)`.
    fn flatten_too_deep(&mut self, open: Token, out: &mut Vec<Expr>) {
        let offset = open.span.start;
        debug!("nesting deeper than {} at offset {}", self.max_depth, offset);
        self.errors.push(ParseError::NestingTooDeep {
            offset,
            limit: self.max_depth,
        });
        out.push(Expr::Punctuation(open));

        let mut balance = 1usize;
        while balance > 0 {
            let Some(token) = self.next_in_statement() else {
                self.errors.push(ParseError::UnmatchedOpenParen { offset });
                return;
            };
            match token.kind {
                Kind::LParen => balance += 1,
                Kind::RParen => balance -= 1,
                _ => {}
            }
            out.push(Expr::leaf(token));
        }
    }
}
