//! primlisp - a minimal McCarthy-style Lisp
//!
//! This crate provides the two halves of a tiny Lisp: an incremental
//! S-expression parser that can be resumed across input boundaries (so a
//! REPL can keep prompting for continuation lines while parentheses are
//! unbalanced), and a recursive evaluator implementing McCarthy's seven
//! primitives (`quote`, `atom`, `eq`, `car`, `cdr`, `cons`, `cond`)
//! together with `lambda`/`label` closures, `defun`, `setq` and `list`.
//!
//! On construction a prelude written in the language itself is evaluated
//! against the global environment, defining the derived utilities (`subst`,
//! `null`, `and`, `or`, `not`, `concat`, `zip`, `assoc`) and a complete
//! meta-circular `eval`/`evcon`/`evlis` triple reproducing McCarthy's
//! universal function on top of the host evaluator.
//!
//! ```scheme
//! (cons 'a '(b c))                 ; (a b c)
//! ((lambda (x) (cons x '(b))) 'a)  ; (a b)
//! (cadr '((a b) (c d) e))          ; (c d)
//! (eval '(eq 'a 'a) '())           ; #t  -- the Lisp-level eval
//! ```
//!
//! ## Modules
//!
//! - `parser`: resumable S-expression parsing from text
//! - `ast`: the node model shared by expressions and values
//! - `literal`: lexical grammar for self-evaluating number/string atoms
//! - `evaluator`: special-form dispatch, accessors, function application
//! - `prelude`: the self-hosted bootstrap program

use std::collections::HashMap;
use std::fmt;

/// Maximum nesting depth of open lists/quotes the parser will accept.
pub const MAX_PARSE_DEPTH: usize = 64;

/// Maximum host recursion depth during evaluation. Lisp-level recursion has
/// no tail-call elimination, so runaway recursion is reported as an error
/// instead of overflowing the host stack. Each data-level reduction of the
/// prelude's meta-circular `eval` costs several host frames, hence the
/// generous limit.
pub const MAX_EVAL_DEPTH: usize = 512;

/// Categorizes the different kinds of parsing errors.
#[derive(Debug, PartialEq, Clone)]
pub enum ParseErrorKind {
    /// Invalid or unexpected syntax (unmatched `)`, quote with no operand)
    InvalidSyntax,
    /// Input ended before the expression was complete (unclosed list or quote)
    Incomplete,
    /// Expression nesting exceeded the maximum parse depth
    TooDeeplyNested,
}

/// A structured error describing a parsing failure.
#[derive(Debug, PartialEq, Clone)]
pub struct ParseError {
    pub kind: ParseErrorKind,
    pub message: String,
    /// Snippet of the input around the failure offset, if available
    pub context: Option<String>,
}

impl ParseError {
    pub fn from_message(kind: ParseErrorKind, message: impl Into<String>) -> Self {
        ParseError {
            kind,
            message: message.into(),
            context: None,
        }
    }

    /// Create a ParseError with a context snippet extracted from the current
    /// input chunk around `error_offset`.
    pub fn with_context(
        kind: ParseErrorKind,
        message: impl Into<String>,
        input: &str,
        error_offset: usize,
    ) -> Self {
        const MAX_CONTEXT: usize = 60;

        let start = error_offset.saturating_sub(20);
        let snippet: String = input.chars().skip(start).take(MAX_CONTEXT).collect();

        let mut context = String::new();
        if start > 0 {
            context.push_str("[...]");
        }
        context.push_str(&snippet);
        if start + snippet.len() < input.len() {
            context.push_str("[...]");
        }
        let context = context.replace('\n', "\\n").replace('\r', "");

        ParseError {
            kind,
            message: message.into(),
            context: Some(context),
        }
    }
}

/// Error types for the interpreter.
///
/// All variants are recoverable by the caller: an error aborts the current
/// top-level evaluation but leaves global bindings committed by earlier
/// forms intact. The only fatal case is a prelude bootstrap failure, which
/// [`Lisp::new`] surfaces to the embedder.
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    ParseError(ParseError),
    /// Malformed special-form shape discovered during evaluation
    /// (e.g. a `cond` clause that is not a two-element pair)
    SyntaxError(String),
    UnboundSymbol(String),
    TypeError(String),
    ArityError {
        expected: usize,
        got: usize,
        expression: Option<String>,
    },
    EvalError(String),
}

impl Error {
    /// Create an ArityError without expression context
    pub fn arity_error(expected: usize, got: usize) -> Self {
        Error::ArityError {
            expected,
            got,
            expression: None,
        }
    }

    /// Create an ArityError carrying the offending expression's text
    pub fn arity_error_with_expr(expected: usize, got: usize, expression: String) -> Self {
        Error::ArityError {
            expected,
            got,
            expression: Some(expression),
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::ParseError(e) => {
                write!(f, "ParseError: {}", e.message)?;
                if let Some(context) = &e.context {
                    write!(f, "\nContext: {context}")?;
                }
                Ok(())
            }
            Error::SyntaxError(msg) => write!(f, "SyntaxError: {msg}"),
            Error::UnboundSymbol(name) => write!(f, "Unbound symbol: {name}"),
            Error::TypeError(msg) => write!(f, "Type error: {msg}"),
            Error::ArityError {
                expected,
                got,
                expression,
            } => match expression {
                Some(expr) => write!(
                    f,
                    "ArityError: expression {expr}: expected {expected} arguments, got {got}"
                ),
                None => write!(
                    f,
                    "ArityError: expected {expected} arguments, got {got}"
                ),
            },
            Error::EvalError(msg) => write!(f, "EvaluationError: {msg}"),
        }
    }
}

pub mod ast;
pub mod evaluator;
pub mod literal;
pub mod parser;
pub mod prelude;

use ast::Node;
use evaluator::Environment;

/// An interpreter instance: a global environment with the prelude loaded.
///
/// This is the embedding surface. Construction bootstraps the self-hosted
/// prelude; a bootstrap failure indicates a defect in the evaluator core and
/// is surfaced as the underlying error.
///
/// ```
/// use primlisp::Lisp;
///
/// let mut lisp = Lisp::new().expect("prelude must bootstrap");
/// let results = lisp.eval_source("(cons 'a '(b c))").unwrap();
/// assert_eq!(results.last().unwrap().to_string(), "(a b c)");
/// ```
#[derive(Debug, Clone)]
pub struct Lisp {
    env: Environment,
}

impl Lisp {
    /// Create an interpreter with a fresh global environment and load the
    /// prelude into it.
    pub fn new() -> Result<Self, Error> {
        Self::with_globals(HashMap::new())
    }

    /// Create an interpreter whose global environment starts from the given
    /// bindings (the `#t`/`#f` constants are always present), then load the
    /// prelude.
    pub fn with_globals(globals: HashMap<String, Node>) -> Result<Self, Error> {
        let mut env = Environment::with_globals(globals);
        prelude::bootstrap(&mut env)?;
        Ok(Lisp { env })
    }

    /// Parse `source` as a sequence of top-level forms and evaluate them in
    /// order, returning the ordered results.
    ///
    /// Evaluation stops at the first error; global bindings committed by
    /// earlier forms in the batch remain in effect.
    pub fn eval_source(&mut self, source: &str) -> Result<Vec<Node>, Error> {
        let forms = parser::parse_program(source)?;
        forms
            .iter()
            .map(|form| evaluator::eval(form, &mut self.env))
            .collect()
    }

    /// Evaluate a single already-parsed form.
    pub fn eval_form(&mut self, form: &Node) -> Result<Node, Error> {
        evaluator::eval(form, &mut self.env)
    }

    /// Read a global binding.
    pub fn global(&self, name: &str) -> Option<&Node> {
        self.env.get_global(name)
    }

    /// Write a global binding.
    pub fn set_global(&mut self, name: impl Into<String>, value: Node) {
        self.env.set_global(name, value);
    }

    /// Access the underlying environment (e.g. to list bindings).
    pub fn environment(&self) -> &Environment {
        &self.env
    }
}
