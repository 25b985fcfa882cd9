//! Resumable S-expression parsing.
//!
//! Raw text is converted directly into [`Node`] trees — there is no
//! separate token stream. The parser is a small state machine whose state
//! is an explicit stack of open frames (unclosed lists and pending quotes),
//! which is what makes it resumable: when a feed chunk ends mid-expression
//! the frames simply stay open, and the next [`Parser::feed`] continues the
//! same in-progress node. A REPL uses this to prompt for continuation lines
//! until [`Parser::is_complete`] reports that all parentheses balance.
//!
//! An atom always terminates at the end of a feed chunk: resuming never
//! concatenates new input onto a previous bare token, so feeding `"(fo"`
//! then `"o)"` yields `(fo o)`.

use crate::ast::Node;
use crate::{Error, MAX_PARSE_DEPTH, ParseError, ParseErrorKind};

/// An open construct awaiting more input.
#[derive(Debug, Clone)]
enum Frame {
    /// An unclosed `(` with the children parsed so far
    List(Vec<Node>),
    /// A `'` still waiting for its single operand
    Quote,
}

/// Incremental parser over one or more feed chunks.
///
/// ```
/// use primlisp::parser::Parser;
///
/// let mut parser = Parser::new();
/// parser.feed("(cons 'a\n").unwrap();
/// assert!(!parser.is_complete());
/// parser.feed("'(b c))").unwrap();
/// assert!(parser.is_complete());
/// let forms = parser.finish().unwrap();
/// assert_eq!(forms[0].to_string(), "(cons 'a '(b c))");
/// ```
#[derive(Debug, Clone, Default)]
pub struct Parser {
    frames: Vec<Frame>,
    forms: Vec<Node>,
    consumed: usize,
    in_comment: bool,
}

impl Parser {
    pub fn new() -> Self {
        Parser::default()
    }

    /// True when no list or quote is left open. A parser that has consumed
    /// no input at all is complete (zero forms is a valid program).
    pub fn is_complete(&self) -> bool {
        self.frames.is_empty()
    }

    /// Total characters consumed across all feeds.
    pub fn consumed(&self) -> usize {
        self.consumed
    }

    /// Consume a chunk of input, extending the partial parse.
    ///
    /// On error the parser state is indeterminate and the parser should be
    /// dropped.
    pub fn feed(&mut self, text: &str) -> Result<(), Error> {
        let bytes = text.as_bytes();
        let mut pos = 0;

        while pos < bytes.len() {
            if self.in_comment {
                match bytes[pos..].iter().position(|&b| b == b'\n') {
                    Some(nl) => {
                        pos += nl + 1;
                        self.in_comment = false;
                        continue;
                    }
                    None => {
                        pos = bytes.len();
                        break;
                    }
                }
            }

            match bytes[pos] {
                b' ' | b'\t' | b'\r' | b'\n' => pos += 1,
                b';' => {
                    self.in_comment = true;
                }
                b'(' => {
                    self.open(Frame::List(Vec::new()), text, pos)?;
                    pos += 1;
                }
                b')' => {
                    match self.frames.pop() {
                        Some(Frame::List(elements)) => self.emit(Node::List(elements)),
                        Some(Frame::Quote) => {
                            return Err(syntax_error(
                                "quote must be followed by an expression",
                                text,
                                pos,
                            ));
                        }
                        None => {
                            return Err(syntax_error("unmatched closing parenthesis", text, pos));
                        }
                    }
                    pos += 1;
                }
                b'\'' => {
                    self.open(Frame::Quote, text, pos)?;
                    pos += 1;
                }
                _ => {
                    // Greedy atom: everything up to the next delimiter. The
                    // delimiters are all ASCII, so slicing here stays on
                    // char boundaries even for multi-byte input.
                    let start = pos;
                    while pos < bytes.len() && !is_delimiter(bytes[pos]) {
                        pos += 1;
                    }
                    self.emit(Node::Atom(text[start..pos].to_owned()));
                }
            }
        }

        self.consumed += text.chars().count();
        Ok(())
    }

    /// Finish parsing, returning the sequence of top-level forms.
    ///
    /// Reports an [`ParseErrorKind::Incomplete`] error if any list or quote
    /// is still open.
    pub fn finish(self) -> Result<Vec<Node>, Error> {
        match self.frames.last() {
            None => Ok(self.forms),
            Some(Frame::Quote) => Err(Error::ParseError(ParseError::from_message(
                ParseErrorKind::Incomplete,
                "input ended with a quote awaiting its expression",
            ))),
            Some(Frame::List(_)) => Err(Error::ParseError(ParseError::from_message(
                ParseErrorKind::Incomplete,
                "input ended inside an unclosed list",
            ))),
        }
    }

    /// Attach a completed node: wrap it in any pending quotes, then append
    /// it to the innermost open list, or to the top-level forms.
    fn emit(&mut self, node: Node) {
        let mut node = node;
        loop {
            match self.frames.pop() {
                Some(Frame::Quote) => {
                    node = Node::Quote(Box::new(node));
                }
                Some(Frame::List(mut elements)) => {
                    elements.push(node);
                    self.frames.push(Frame::List(elements));
                    return;
                }
                None => {
                    self.forms.push(node);
                    return;
                }
            }
        }
    }

    fn open(&mut self, frame: Frame, chunk: &str, pos: usize) -> Result<(), Error> {
        if self.frames.len() >= MAX_PARSE_DEPTH {
            return Err(Error::ParseError(ParseError::with_context(
                ParseErrorKind::TooDeeplyNested,
                format!("expression too deeply nested (max depth: {MAX_PARSE_DEPTH})"),
                chunk,
                pos,
            )));
        }
        self.frames.push(frame);
        Ok(())
    }
}

fn syntax_error(message: &str, chunk: &str, pos: usize) -> Error {
    Error::ParseError(ParseError::with_context(
        ParseErrorKind::InvalidSyntax,
        message,
        chunk,
        pos,
    ))
}

/// Characters that end an atom.
fn is_delimiter(byte: u8) -> bool {
    matches!(byte, b' ' | b'\t' | b'\r' | b'\n' | b'(' | b')' | b'\'' | b';')
}

/// Parse a complete program in one call: any number of whitespace-separated
/// top-level forms.
pub fn parse_program(input: &str) -> Result<Vec<Node>, Error> {
    let mut parser = Parser::new();
    parser.feed(input)?;
    parser.finish()
}
