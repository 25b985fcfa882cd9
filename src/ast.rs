//! The node model shared by expressions and values.
//!
//! Everything the parser produces and everything evaluation returns is a
//! [`Node`]: an atom, a list, a quote wrapper, or a function. Values and
//! expressions are the same type, which is what makes the prelude's
//! meta-circular `eval` possible — code is handed around as data and fed
//! back to the evaluator.
//!
//! Equality follows the language rather than the representation: atoms
//! compare by text, lists element-wise, and a [`Node::Quote`] equals the
//! equivalent `(quote x)` list in either direction, recursively.

/// Core node type: Lisp expressions and Lisp values.
#[derive(Debug, Clone)]
pub enum Node {
    /// A maximal run of characters excluding whitespace, `(`, `)`, `'`
    /// and `;`. Symbols, numbers and string literals are all atoms; which
    /// of those an atom is gets decided at evaluation time.
    Atom(String),
    /// Ordered, possibly empty sequence of child nodes. The empty list is
    /// also the canonical falsy/"nil" value.
    List(Vec<Node>),
    /// `'x` — marks its single child as data rather than an expression.
    Quote(Box<Node>),
    /// A `lambda`/`label`/`defun` product. Functions can only be applied;
    /// they have no direct value as an expression.
    Function(Function),
}

/// A closure: formal parameters, an unevaluated body, and an optional name
/// under which the body can call the function itself.
///
/// The self-reference introduced by `label`/`defun` is held by name and
/// materialized into the local scope at application time, so no cyclic
/// object graph is ever built. The field is set at construction and never
/// mutated afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct Function {
    pub(crate) params: Vec<String>,
    pub(crate) body: Box<Node>,
    pub(crate) self_name: Option<String>,
}

impl Node {
    /// The canonical truth atoms.
    pub(crate) fn truth(value: bool) -> Node {
        Node::Atom(if value { "#t" } else { "#f" }.to_owned())
    }

    /// `atom` semantics: true for any atom and for the empty list. A quote
    /// delegates to its child; a function is never atomic.
    pub fn is_atomic(&self) -> bool {
        match self {
            Node::Atom(_) => true,
            Node::List(elements) => elements.is_empty(),
            Node::Quote(child) => child.is_atomic(),
            Node::Function(_) => false,
        }
    }

    /// View a value as list elements for `car`/`cdr`/`cons`.
    ///
    /// A quote is interchangeable with its `(quote x)` list form, so
    /// `(car ''a)` is the symbol `quote`. Returns `None` for atoms and
    /// functions.
    pub(crate) fn list_elements(&self) -> Option<Vec<Node>> {
        match self {
            Node::List(elements) => Some(elements.clone()),
            Node::Quote(child) => Some(vec![Node::Atom("quote".to_owned()), (**child).clone()]),
            _ => None,
        }
    }
}

/// Does `(quote <child>)` match the given list elements?
fn quote_form_matches(child: &Node, elements: &[Node]) -> bool {
    matches!(elements, [Node::Atom(head), body] if head == "quote" && body == child)
}

impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Node::Atom(a), Node::Atom(b)) => a == b,
            (Node::List(a), Node::List(b)) => a == b,
            (Node::Quote(a), Node::Quote(b)) => a == b,
            // '(x) and (quote (x)) are interchangeable for equality.
            (Node::Quote(child), Node::List(elements))
            | (Node::List(elements), Node::Quote(child)) => quote_form_matches(child, elements),
            (Node::Function(a), Node::Function(b)) => a == b,
            _ => false,
        }
    }
}

impl std::fmt::Display for Node {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Node::Atom(text) => write!(f, "{text}"),
            Node::List(elements) => {
                write!(f, "(")?;
                for (i, element) in elements.iter().enumerate() {
                    if i > 0 {
                        write!(f, " ")?;
                    }
                    write!(f, "{element}")?;
                }
                write!(f, ")")
            }
            Node::Quote(child) => write!(f, "'{child}"),
            Node::Function(_) => write!(f, "#<function>"),
        }
    }
}

/// Helper for creating atoms in tests and embedding code.
#[cfg_attr(not(test), expect(dead_code))]
pub(crate) fn atom<S: AsRef<str>>(text: S) -> Node {
    Node::Atom(text.as_ref().to_owned())
}

/// Helper for creating lists.
#[cfg_attr(not(test), expect(dead_code))]
pub(crate) fn list(elements: Vec<Node>) -> Node {
    Node::List(elements)
}

/// Helper for creating quotes.
#[cfg_attr(not(test), expect(dead_code))]
pub(crate) fn quote(child: Node) -> Node {
    Node::Quote(Box::new(child))
}

/// Helper for the empty list (nil).
#[cfg_attr(not(test), expect(dead_code))]
pub(crate) fn nil() -> Node {
    Node::List(vec![])
}
