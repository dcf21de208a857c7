//! Parser for the brace-delimited boot configuration format.
//!
//! ```text
//! /* comment */
//! interfaces {
//!     ethernet eth0 {
//!         address dhcp
//!         description "WAN link"
//!         hw-id 00:11:22:33:44:55
//!     }
//! }
//! // vyos-config-version: "..."
//! ```
//!
//! Newlines terminate leaves, so the lexer keeps them as tokens.

use std::iter::Peekable;
use std::str::Chars;

use generational_arena::Index;
use tracing::{debug, instrument, trace};

use crate::domain::arena::{ConfigTree, NodeKind, NodeValue};
use crate::domain::error::{ParseError, ParseErrorKind};

#[derive(Debug, Clone, PartialEq, Eq)]
enum TokenKind {
    Word(String),
    Quoted(String),
    LBrace,
    RBrace,
    Newline,
    Comment(String),
    LineComment(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Token {
    kind: TokenKind,
    line: usize,
}

struct Lexer<'a> {
    chars: Peekable<Chars<'a>>,
    line: usize,
}

impl<'a> Lexer<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            chars: input.chars().peekable(),
            line: 1,
        }
    }

    fn tokenize(mut self) -> Result<Vec<Token>, ParseError> {
        let mut tokens = Vec::new();
        while let Some(&c) = self.chars.peek() {
            let line = self.line;
            let kind = match c {
                '\n' => {
                    self.chars.next();
                    self.line += 1;
                    TokenKind::Newline
                }
                c if c.is_whitespace() => {
                    self.chars.next();
                    continue;
                }
                '{' => {
                    self.chars.next();
                    TokenKind::LBrace
                }
                '}' => {
                    self.chars.next();
                    TokenKind::RBrace
                }
                '"' => {
                    self.chars.next();
                    TokenKind::Quoted(self.quoted(line)?)
                }
                '/' => self.slash(line)?,
                _ => TokenKind::Word(self.word()),
            };
            tokens.push(Token { kind, line });
        }
        Ok(tokens)
    }

    fn quoted(&mut self, start: usize) -> Result<String, ParseError> {
        let mut value = String::new();
        while let Some(c) = self.chars.next() {
            match c {
                '"' => return Ok(value),
                '\\' => match self.chars.next() {
                    Some(escaped @ ('"' | '\\')) => value.push(escaped),
                    Some(other) => {
                        value.push('\\');
                        value.push(other);
                    }
                    None => break,
                },
                '\n' => {
                    self.line += 1;
                    value.push(c);
                }
                _ => value.push(c),
            }
        }
        Err(ParseError::new(start, ParseErrorKind::UnterminatedString))
    }

    /// `/* ... */`, `// ...`, or a bare word starting with `/` such as a file path.
    fn slash(&mut self, start: usize) -> Result<TokenKind, ParseError> {
        let mut lookahead = self.chars.clone();
        lookahead.next();
        match lookahead.peek() {
            Some('*') => {
                self.chars.next();
                self.chars.next();
                let mut text = String::new();
                loop {
                    match self.chars.next() {
                        Some('*') if self.chars.peek() == Some(&'/') => {
                            self.chars.next();
                            return Ok(TokenKind::Comment(text.trim().to_string()));
                        }
                        Some(c) => {
                            if c == '\n' {
                                self.line += 1;
                            }
                            text.push(c);
                        }
                        None => {
                            return Err(ParseError::new(
                                start,
                                ParseErrorKind::UnterminatedComment,
                            ))
                        }
                    }
                }
            }
            Some('/') => {
                let mut text = String::new();
                while let Some(&c) = self.chars.peek() {
                    if c == '\n' {
                        break;
                    }
                    text.push(c);
                    self.chars.next();
                }
                Ok(TokenKind::LineComment(text.trim_end().to_string()))
            }
            _ => Ok(TokenKind::Word(self.word())),
        }
    }

    fn word(&mut self) -> String {
        let mut word = String::new();
        while let Some(&c) = self.chars.peek() {
            if c.is_whitespace() || matches!(c, '{' | '}' | '"') {
                break;
            }
            word.push(c);
            self.chars.next();
        }
        word
    }
}

/// Parse configuration text into a [`ConfigTree`].
#[instrument(level = "debug", skip(input), fields(len = input.len()))]
pub fn parse(input: &str) -> Result<ConfigTree, ParseError> {
    let tokens = Lexer::new(input).tokenize()?;
    trace!("lexed {} tokens", tokens.len());

    let mut tree = ConfigTree::new();
    let mut stack: Vec<Index> = vec![tree.root()];
    let mut pending_comment: Option<String> = None;
    let mut tokens = tokens.into_iter().peekable();
    let mut last_line = 1;

    while let Some(token) = tokens.next() {
        last_line = token.line;
        let parent = *stack.last().unwrap_or(&tree.root());
        match token.kind {
            TokenKind::Newline => {}
            TokenKind::Comment(text) => pending_comment = Some(text),
            TokenKind::LineComment(text) => {
                if stack.len() > 1 {
                    return Err(ParseError::new(
                        token.line,
                        ParseErrorKind::InvalidToken(text),
                    ));
                }
                tree.push_footer(text);
            }
            TokenKind::RBrace => {
                if stack.len() == 1 {
                    return Err(ParseError::new(token.line, ParseErrorKind::UnbalancedBrace));
                }
                // A comment only attaches to a node in its own block
                pending_comment = None;
                stack.pop();
            }
            TokenKind::LBrace => {
                return Err(ParseError::new(
                    token.line,
                    ParseErrorKind::InvalidToken("{".to_string()),
                ))
            }
            TokenKind::Quoted(text) => {
                return Err(ParseError::new(
                    token.line,
                    ParseErrorKind::InvalidToken(format!("\"{}\"", text)),
                ))
            }
            TokenKind::Word(name) => {
                let mut args = Vec::new();
                while let Some(next) = tokens.peek() {
                    match &next.kind {
                        TokenKind::Word(arg) | TokenKind::Quoted(arg) => {
                            args.push(arg.clone());
                            tokens.next();
                        }
                        _ => break,
                    }
                }
                if args.len() > 1 {
                    return Err(ParseError::new(
                        token.line,
                        ParseErrorKind::InvalidToken(args[1].clone()),
                    ));
                }
                let arg = args.pop();
                let comment = pending_comment.take();

                let opens_block = matches!(
                    tokens.peek(),
                    Some(Token {
                        kind: TokenKind::LBrace,
                        ..
                    })
                );
                if opens_block {
                    tokens.next();
                    let node = open_block(&mut tree, parent, name, arg, token.line)?;
                    set_comment(&mut tree, node, comment);
                    stack.push(node);
                } else {
                    let leaf = add_leaf(&mut tree, parent, name, arg, token.line)?;
                    set_comment(&mut tree, leaf, comment);
                }
            }
        }
    }

    if stack.len() > 1 {
        return Err(ParseError::new(
            last_line,
            ParseErrorKind::UnexpectedEof(stack.len() - 1),
        ));
    }
    debug!("parsed {} nodes", tree.node_count());
    Ok(tree)
}

/// `name {` opens a plain node, `name tag {` opens `tag` under the tag node `name`.
fn open_block(
    tree: &mut ConfigTree,
    parent: Index,
    name: String,
    tag: Option<String>,
    line: usize,
) -> Result<Index, ParseError> {
    let duplicate = |name: &str| ParseError::new(line, ParseErrorKind::DuplicateNode(name.to_string()));

    let Some(tag) = tag else {
        if tree.child_by_name(parent, &name).is_some() {
            return Err(duplicate(&name));
        }
        return Ok(tree.insert_node(parent, name, NodeKind::Node));
    };

    let tag_node = match tree.child_by_name(parent, &name) {
        Some(existing) => {
            let is_tag = tree
                .get_node(existing)
                .is_some_and(|node| node.kind == NodeKind::Tag);
            if !is_tag {
                return Err(duplicate(&name));
            }
            existing
        }
        None => tree.insert_node(parent, name.clone(), NodeKind::Tag),
    };
    if tree.child_by_name(tag_node, &tag).is_some() {
        return Err(duplicate(&format!("{} {}", name, tag)));
    }
    Ok(tree.insert_node(tag_node, tag, NodeKind::Node))
}

/// Repeated `name value` lines accumulate into a list leaf.
fn add_leaf(
    tree: &mut ConfigTree,
    parent: Index,
    name: String,
    value: Option<String>,
    line: usize,
) -> Result<Index, ParseError> {
    let duplicate = || ParseError::new(line, ParseErrorKind::DuplicateNode(name.clone()));

    if let Some(existing) = tree.child_by_name(parent, &name) {
        let node = tree.get_node_mut(existing).ok_or_else(duplicate)?;
        return match (node.kind, node.value.as_mut(), value) {
            (NodeKind::Leaf, Some(values), Some(value)) => {
                values.push(value);
                Ok(existing)
            }
            _ => Err(duplicate()),
        };
    }

    let leaf = tree.insert_node(parent, name, NodeKind::Leaf);
    if let Some(node) = tree.get_node_mut(leaf) {
        node.value = value.map(NodeValue::Scalar);
    }
    Ok(leaf)
}

fn set_comment(tree: &mut ConfigTree, idx: Index, comment: Option<String>) {
    if let (Some(node), Some(comment)) = (tree.get_node_mut(idx), comment) {
        node.comment = Some(comment);
    }
}
