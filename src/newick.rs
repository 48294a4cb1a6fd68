//! Newick reading and writing.
//!
//! # Grammar
//! ```text
//! tree     := subtree ';'
//! subtree  := '(' subtree (',' subtree)* ')' [label] [':' length]
//!           | label [':' length]
//! ```
//!
//! A parenthesized group of k children becomes an internal node with k
//! children in reading order. Tips must be labeled; internal nodes may carry
//! a label (typically a support value). Labels are either bare or
//! single-quoted (`'A thaliana'`, with `''` for a literal quote). Whitespace
//! between tokens and `[...]` comments are skipped, so BEAST style
//! annotations (`[&rate=0.1]`) are tolerated.

use crate::tree::{NodeId, Tree};
use std::collections::HashSet;

/// Bytes that end a bare label.
const LABEL_DELIMITERS: &[u8] = b"(),:;[";

/// Bytes that force a label to be quoted on output.
const QUOTE_TRIGGERS: &[char] = &['(', ')', ',', ':', ';', '[', ']', '\'', ' ', '\t', '\n', '\r'];

/// What went wrong while reading a Newick string.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ParseErrorKind {
    #[error("unexpected end of input")]
    UnexpectedEof,
    #[error("expected {expected} but found {found:?}")]
    Unexpected { expected: &'static str, found: char },
    #[error("tip without label")]
    EmptyLabel,
    #[error("invalid branch length {0:?}")]
    InvalidBranchLength(String),
    #[error("unclosed comment")]
    UnclosedComment,
    #[error("unclosed quoted label")]
    UnclosedQuote,
    #[error("trailing content after ';'")]
    TrailingContent,
    #[error("duplicate tip label {0:?}")]
    DuplicateLabel(String),
}

/// Malformed Newick input, with the byte offset of the offending token.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("invalid Newick at byte {position}: {kind}")]
pub struct ParseError {
    pub position: usize,
    pub kind: ParseErrorKind,
}

/// Parses exactly one `;`-terminated tree.
///
/// Anything but whitespace or comments after the terminator is an error.
///
/// # Example
/// ```
/// # use locus_topology::newick::parse_newick;
/// let tree = parse_newick("(Es_1:0.3,(Bs_1:0.1,(Cr_1:0.2,At_1:0.2)95:0.05):0.1);").unwrap();
/// assert_eq!(tree.tip_labels(), vec!["Es_1", "Bs_1", "Cr_1", "At_1"]);
/// ```
pub fn parse_newick(text: &str) -> Result<Tree, ParseError> {
    let mut parser = NewickParser::new(text);
    let tree = parser.parse_tree()?;
    parser.skip_comment_and_whitespace()?;
    if !parser.is_eof() {
        return Err(parser.error(ParseErrorKind::TrailingContent));
    }
    Ok(tree)
}

/// Splits `text` into the source of its individual trees, each including its
/// terminating `;`. Separators inside quoted labels and comments are ignored.
///
/// A trailing fragment without `;` is returned as-is so that parsing it later
/// reports the problem for that tree only. Stray text after the last tree
/// that does not open a group is kept with that tree instead, where parsing
/// reports it as trailing content.
pub fn split_trees(text: &str) -> Vec<&str> {
    let bytes = text.as_bytes();
    let mut trees = Vec::new();
    let mut start = 0;
    let mut last_start = 0;
    let mut in_quote = false;
    let mut in_comment = false;
    for (i, &b) in bytes.iter().enumerate() {
        match b {
            b'\'' if !in_comment => in_quote = !in_quote,
            b'[' if !in_quote => in_comment = true,
            b']' if !in_quote => in_comment = false,
            b';' if !in_quote && !in_comment => {
                trees.push(text[start..=i].trim());
                last_start = start;
                start = i + 1;
            }
            _ => {}
        }
    }
    let rest = text[start..].trim();
    if !rest.is_empty() {
        match trees.last_mut() {
            Some(last) if !rest.contains('(') => *last = text[last_start..].trim(),
            _ => trees.push(rest),
        }
    }
    trees
}

/// Serializes `tree` as Newick, keeping labels and branch lengths.
pub fn write_newick(tree: &Tree) -> String {
    enum Step {
        Open(NodeId),
        Close(NodeId),
        Comma,
    }

    let mut out = String::new();
    let mut steps = vec![Step::Open(tree.root())];
    while let Some(step) = steps.pop() {
        match step {
            Step::Open(id) => {
                let children = tree.children(id);
                if children.is_empty() {
                    push_node_suffix(tree, id, &mut out);
                    continue;
                }
                out.push('(');
                steps.push(Step::Close(id));
                for (k, &child) in children.iter().enumerate().rev() {
                    steps.push(Step::Open(child));
                    if k > 0 {
                        steps.push(Step::Comma);
                    }
                }
            }
            Step::Close(id) => {
                out.push(')');
                push_node_suffix(tree, id, &mut out);
            }
            Step::Comma => out.push(','),
        }
    }
    out.push(';');
    out
}

fn push_node_suffix(tree: &Tree, id: NodeId, out: &mut String) {
    if let Some(label) = tree.label(id) {
        push_label(label, out);
    }
    if let Some(length) = tree.branch_length(id) {
        out.push(':');
        out.push_str(&length.to_string());
    }
}

fn push_label(label: &str, out: &mut String) {
    if label.is_empty() || label.contains(QUOTE_TRIGGERS) {
        out.push('\'');
        out.push_str(&label.replace('\'', "''"));
        out.push('\'');
    } else {
        out.push_str(label);
    }
}

/// Reader over the bytes of one Newick string.
struct NewickParser<'a> {
    text: &'a str,
    bytes: &'a [u8],
    pos: usize,
    seen_tips: HashSet<String>,
}

impl<'a> NewickParser<'a> {
    fn new(text: &'a str) -> Self {
        NewickParser { text, bytes: text.as_bytes(), pos: 0, seen_tips: HashSet::new() }
    }

    fn error(&self, kind: ParseErrorKind) -> ParseError {
        ParseError { position: self.pos, kind }
    }

    fn is_eof(&self) -> bool {
        self.pos >= self.bytes.len()
    }

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn consume_if(&mut self, b: u8) -> bool {
        if self.peek() == Some(b) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn unexpected(&self, expected: &'static str) -> ParseError {
        match self.text[self.pos..].chars().next() {
            Some(found) => self.error(ParseErrorKind::Unexpected { expected, found }),
            None => self.error(ParseErrorKind::UnexpectedEof),
        }
    }

    fn skip_comment_and_whitespace(&mut self) -> Result<(), ParseError> {
        while let Some(b) = self.peek() {
            if b.is_ascii_whitespace() {
                self.pos += 1;
            } else if b == b'[' {
                let start = self.pos;
                match self.bytes[start..].iter().position(|&c| c == b']') {
                    Some(offset) => self.pos = start + offset + 1,
                    None => return Err(self.error(ParseErrorKind::UnclosedComment)),
                }
            } else {
                break;
            }
        }
        Ok(())
    }

    /// Parses one tree up to and including its `;`.
    ///
    /// Groups still waiting for their `)` are kept on an explicit stack, so
    /// nesting depth is bounded by memory only.
    fn parse_tree(&mut self) -> Result<Tree, ParseError> {
        self.seen_tips.clear();
        let mut tree = Tree::new();
        self.skip_comment_and_whitespace()?;
        if self.is_eof() {
            return Err(self.error(ParseErrorKind::UnexpectedEof));
        }

        let mut open: Vec<NodeId> = Vec::new();
        let mut current = tree.root();
        'subtree: loop {
            self.skip_comment_and_whitespace()?;
            if self.consume_if(b'(') {
                open.push(current);
                current = tree.add_child(current, None, None);
                continue;
            }
            self.parse_node_suffix(&mut tree, current, false)?;

            // climb out of every group this tip closes
            while let Some(&parent) = open.last() {
                self.skip_comment_and_whitespace()?;
                if self.consume_if(b',') {
                    current = tree.add_child(parent, None, None);
                    continue 'subtree;
                }
                if !self.consume_if(b')') {
                    return Err(self.unexpected("',' or ')'"));
                }
                open.pop();
                self.parse_node_suffix(&mut tree, parent, true)?;
            }
            break;
        }

        self.skip_comment_and_whitespace()?;
        if !self.consume_if(b';') {
            return Err(self.unexpected("';'"));
        }
        Ok(tree)
    }

    /// Reads the optional label and branch length that follow a tip or a
    /// closed group, and stores them on node `id`.
    fn parse_node_suffix(&mut self, tree: &mut Tree, id: NodeId, is_internal: bool) -> Result<(), ParseError> {
        self.skip_comment_and_whitespace()?;
        let label_start = self.pos;
        // a quoted '' is as empty as a missing label
        let label = self.parse_label()?.filter(|l| !l.is_empty());
        if !is_internal {
            let Some(label) = label.as_ref() else {
                return Err(ParseError { position: label_start, kind: ParseErrorKind::EmptyLabel });
            };
            if !self.seen_tips.insert(label.clone()) {
                return Err(ParseError {
                    position: label_start,
                    kind: ParseErrorKind::DuplicateLabel(label.clone()),
                });
            }
        }
        tree.set_label(id, label);
        let length = self.parse_branch_length()?;
        tree.set_branch_length(id, length);
        Ok(())
    }

    /// Reads an optional bare or quoted label.
    fn parse_label(&mut self) -> Result<Option<String>, ParseError> {
        if self.consume_if(b'\'') {
            let mut label = String::new();
            loop {
                let rest = &self.text[self.pos..];
                let Some(offset) = rest.find('\'') else {
                    return Err(self.error(ParseErrorKind::UnclosedQuote));
                };
                label.push_str(&rest[..offset]);
                self.pos += offset + 1;
                // '' is an escaped quote inside a quoted label
                if self.consume_if(b'\'') {
                    label.push('\'');
                } else {
                    break;
                }
            }
            return Ok(Some(label));
        }

        let start = self.pos;
        while let Some(b) = self.peek() {
            if LABEL_DELIMITERS.contains(&b) || b.is_ascii_whitespace() {
                break;
            }
            self.pos += 1;
        }
        let label = &self.text[start..self.pos];
        Ok((!label.is_empty()).then(|| label.to_string()))
    }

    /// Reads an optional `:length`, allowing scientific notation.
    fn parse_branch_length(&mut self) -> Result<Option<f64>, ParseError> {
        self.skip_comment_and_whitespace()?;
        if !self.consume_if(b':') {
            return Ok(None);
        }
        self.skip_comment_and_whitespace()?;

        let start = self.pos;
        while let Some(b) = self.peek() {
            if b.is_ascii_digit() || matches!(b, b'.' | b'-' | b'+' | b'e' | b'E') {
                self.pos += 1;
            } else {
                break;
            }
        }
        let raw = &self.text[start..self.pos];
        raw.parse::<f64>().map(Some).map_err(|_| ParseError {
            position: start,
            kind: ParseErrorKind::InvalidBranchLength(raw.to_string()),
        })
    }
}
