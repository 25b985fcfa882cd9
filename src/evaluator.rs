//! Expression evaluation.
//!
//! Evaluation is synchronous recursive descent over [`Node`] trees. A list
//! whose head is an atom is dispatched in order against: the closed set of
//! special forms, the derived `c[ad]{2,4}r` accessor family, and finally
//! ordinary symbol resolution yielding a function to apply. Special forms
//! receive their arguments unevaluated and decide per-form what to reduce.
//!
//! Variable scoping is three explicit layers:
//!
//! - **global**: one mapping owned by [`Environment`], mutated only by
//!   `defun`/`setq`, pre-populated with the `#t`/`#f` constants;
//! - **local**: the parameter substitutions of the active call, built fresh
//!   per application and passed down by shared read-only reference;
//! - **function-scoped**: the self-binding a `label`/`defun` function
//!   carries so its body can call it by name; merged into the local scope
//!   at application time.
//!
//! Lookup order for a free atom: local scope, then self-evaluating
//! literals, then globals, then an unbound-symbol error.

use crate::ast::{Function, Node};
use crate::{Error, MAX_EVAL_DEPTH, literal};
use std::collections::HashMap;

/// A local scope: formal parameter (and self-reference) substitutions.
pub(crate) type Scope = HashMap<String, Node>;

/// Global variable bindings.
#[derive(Debug, Clone, PartialEq)]
pub struct Environment {
    globals: HashMap<String, Node>,
}

impl Environment {
    /// An environment holding only the boolean constants.
    pub fn new() -> Self {
        Self::with_globals(HashMap::new())
    }

    /// An environment seeded with the supplied bindings. The `#t`/`#f`
    /// constants are always (re)bound.
    pub fn with_globals(mut globals: HashMap<String, Node>) -> Self {
        globals.insert("#t".to_owned(), Node::truth(true));
        globals.insert("#f".to_owned(), Node::truth(false));
        Environment { globals }
    }

    pub fn get_global(&self, name: &str) -> Option<&Node> {
        self.globals.get(name)
    }

    pub fn set_global(&mut self, name: impl Into<String>, value: Node) {
        self.globals.insert(name.into(), value);
    }

    /// All global bindings sorted by name (used by interactive frontends).
    pub fn bindings(&self) -> Vec<(&str, &Node)> {
        let mut bindings: Vec<_> = self
            .globals
            .iter()
            .map(|(name, value)| (name.as_str(), value))
            .collect();
        bindings.sort_by_key(|(name, _)| *name);
        bindings
    }
}

impl Default for Environment {
    fn default() -> Self {
        Environment::new()
    }
}

/// The closed set of special forms. Dispatch is an exhaustive match; any
/// head symbol outside this set falls through to accessor and function
/// application handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SpecialForm {
    Quote,
    Atom,
    Eq,
    Car,
    Cdr,
    Cons,
    Cond,
    Lambda,
    Label,
    Defun,
    Setq,
    List,
}

impl SpecialForm {
    fn lookup(name: &str) -> Option<SpecialForm> {
        use SpecialForm::*;
        Some(match name {
            "quote" => Quote,
            "atom" => Atom,
            "eq" => Eq,
            "car" => Car,
            "cdr" => Cdr,
            "cons" => Cons,
            "cond" => Cond,
            "lambda" => Lambda,
            "label" => Label,
            "defun" => Defun,
            "setq" => Setq,
            "list" => List,
            _ => return None,
        })
    }
}

/// Evaluate a top-level expression (public API).
pub fn eval(expr: &Node, env: &mut Environment) -> Result<Node, Error> {
    eval_in(expr, env, None, 0)
}

fn eval_in(
    expr: &Node,
    env: &mut Environment,
    locals: Option<&Scope>,
    depth: usize,
) -> Result<Node, Error> {
    if depth >= MAX_EVAL_DEPTH {
        return Err(Error::EvalError(format!(
            "evaluation depth limit exceeded (max: {MAX_EVAL_DEPTH})"
        )));
    }
    match expr {
        Node::Atom(name) => eval_symbol(name, env, locals),
        // A quote yields its child as data, descendants untouched.
        Node::Quote(child) => Ok((**child).clone()),
        Node::Function(_) => Err(Error::TypeError(
            "a function has no direct value as an expression".to_owned(),
        )),
        Node::List(elements) => {
            eval_call(elements, env, locals, depth).map_err(|err| add_context(err, expr))
        }
    }
}

/// Attach the offending sub-expression's text to an error once — the
/// innermost list being evaluated when the failure occurred.
fn add_context(error: Error, expr: &Node) -> Error {
    match error {
        Error::EvalError(msg) if !msg.contains("\n  while evaluating:") => {
            Error::EvalError(format!("{msg}\n  while evaluating: {expr}"))
        }
        Error::TypeError(msg) if !msg.contains("\n  while evaluating:") => {
            Error::TypeError(format!("{msg}\n  while evaluating: {expr}"))
        }
        other => other,
    }
}

/// Resolve a free atom: local scope, self-evaluating literals, globals.
fn eval_symbol(name: &str, env: &Environment, locals: Option<&Scope>) -> Result<Node, Error> {
    if let Some(scope) = locals
        && let Some(value) = scope.get(name)
    {
        return Ok(value.clone());
    }
    if literal::is_literal(name) {
        return Ok(Node::Atom(name.to_owned()));
    }
    env.get_global(name)
        .cloned()
        .ok_or_else(|| Error::UnboundSymbol(name.to_owned()))
}

/// Evaluate a non-atomic expression: special form, accessor, or application.
fn eval_call(
    elements: &[Node],
    env: &mut Environment,
    locals: Option<&Scope>,
    depth: usize,
) -> Result<Node, Error> {
    match elements {
        // The empty list is a value, not a call.
        [] => Err(Error::EvalError("cannot evaluate the empty list".to_owned())),

        [Node::Atom(op), args @ ..] => {
            if let Some(form) = SpecialForm::lookup(op) {
                return eval_special_form(form, args, env, locals, depth);
            }
            if let Some(steps) = accessor_steps(op) {
                return eval_accessor(op, &steps, args, env, locals, depth);
            }

            let resolved = match locals.and_then(|scope| scope.get(op)) {
                Some(value) => value.clone(),
                None => env
                    .get_global(op)
                    .cloned()
                    .ok_or_else(|| Error::UnboundSymbol(op.clone()))?,
            };
            match resolved {
                Node::Function(func) => apply(&func, args, env, locals, depth),
                // A symbol bound to quoted (lambda ...) data becomes callable
                // after one evaluation step.
                value @ Node::List(_) => {
                    match eval_in(&value, env, locals, depth + 1)? {
                        Node::Function(func) => apply(&func, args, env, locals, depth),
                        other => Err(Error::TypeError(format!(
                            "cannot apply non-function: {other}"
                        ))),
                    }
                }
                other => Err(Error::TypeError(format!(
                    "cannot apply non-function: {other}"
                ))),
            }
        }

        // Head is itself a compound expression: reduce it to a function.
        [head, args @ ..] => match eval_in(head, env, locals, depth + 1)? {
            Node::Function(func) => apply(&func, args, env, locals, depth),
            other => Err(Error::TypeError(format!(
                "cannot apply non-function: {other}"
            ))),
        },
    }
}

fn eval_special_form(
    form: SpecialForm,
    args: &[Node],
    env: &mut Environment,
    locals: Option<&Scope>,
    depth: usize,
) -> Result<Node, Error> {
    match form {
        SpecialForm::Quote => eval_quote(args),
        SpecialForm::Atom => eval_atom(args, env, locals, depth),
        SpecialForm::Eq => eval_eq(args, env, locals, depth),
        SpecialForm::Car => eval_car(args, env, locals, depth),
        SpecialForm::Cdr => eval_cdr(args, env, locals, depth),
        SpecialForm::Cons => eval_cons(args, env, locals, depth),
        SpecialForm::Cond => eval_cond(args, env, locals, depth),
        SpecialForm::Lambda => eval_lambda(args),
        SpecialForm::Label => eval_label(args, env, locals, depth),
        SpecialForm::Defun => eval_defun(args, env),
        SpecialForm::Setq => eval_setq(args, env, locals, depth),
        SpecialForm::List => eval_list(args, env, locals, depth),
    }
}

fn eval_quote(args: &[Node]) -> Result<Node, Error> {
    match args {
        [expr] => Ok(expr.clone()),
        _ => Err(Error::arity_error(1, args.len())),
    }
}

fn eval_atom(
    args: &[Node],
    env: &mut Environment,
    locals: Option<&Scope>,
    depth: usize,
) -> Result<Node, Error> {
    match args {
        [expr] => {
            let value = eval_in(expr, env, locals, depth + 1)?;
            Ok(Node::truth(value.is_atomic()))
        }
        _ => Err(Error::arity_error(1, args.len())),
    }
}

fn eval_eq(
    args: &[Node],
    env: &mut Environment,
    locals: Option<&Scope>,
    depth: usize,
) -> Result<Node, Error> {
    match args {
        [a, b] => {
            let left = eval_in(a, env, locals, depth + 1)?;
            let right = eval_in(b, env, locals, depth + 1)?;
            Ok(Node::truth(left == right))
        }
        _ => Err(Error::arity_error(2, args.len())),
    }
}

fn eval_car(
    args: &[Node],
    env: &mut Environment,
    locals: Option<&Scope>,
    depth: usize,
) -> Result<Node, Error> {
    match args {
        [expr] => {
            let value = eval_in(expr, env, locals, depth + 1)?;
            take_car(&value, "car")
        }
        _ => Err(Error::arity_error(1, args.len())),
    }
}

fn eval_cdr(
    args: &[Node],
    env: &mut Environment,
    locals: Option<&Scope>,
    depth: usize,
) -> Result<Node, Error> {
    match args {
        [expr] => {
            let value = eval_in(expr, env, locals, depth + 1)?;
            take_cdr(&value, "cdr")
        }
        _ => Err(Error::arity_error(1, args.len())),
    }
}

fn eval_cons(
    args: &[Node],
    env: &mut Environment,
    locals: Option<&Scope>,
    depth: usize,
) -> Result<Node, Error> {
    match args {
        [head_expr, tail_expr] => {
            let head = eval_in(head_expr, env, locals, depth + 1)?;
            let tail = eval_in(tail_expr, env, locals, depth + 1)?;
            // Dotted pairs are unsupported: the tail must be list-like.
            let tail_elements = tail.list_elements().ok_or_else(|| {
                Error::TypeError(format!("cons requires a list as second argument, got: {tail}"))
            })?;

            let mut elements = Vec::with_capacity(tail_elements.len() + 1);
            elements.push(head);
            elements.extend(tail_elements);
            Ok(Node::List(elements))
        }
        _ => Err(Error::arity_error(2, args.len())),
    }
}

fn eval_cond(
    args: &[Node],
    env: &mut Environment,
    locals: Option<&Scope>,
    depth: usize,
) -> Result<Node, Error> {
    for clause in args {
        let Node::List(pair) = clause else {
            return Err(Error::SyntaxError(format!(
                "cond clause must be a (predicate expression) pair, got: {clause}"
            )));
        };
        let [predicate, expression] = pair.as_slice() else {
            return Err(Error::SyntaxError(format!(
                "cond clause must be a (predicate expression) pair, got: {clause}"
            )));
        };

        // Anything but #f selects the clause.
        let value = eval_in(predicate, env, locals, depth + 1)?;
        if value != Node::truth(false) {
            return eval_in(expression, env, locals, depth + 1);
        }
    }
    // No clause matched: the empty list, not an error.
    Ok(Node::List(vec![]))
}

fn eval_lambda(args: &[Node]) -> Result<Node, Error> {
    match args {
        [Node::List(param_list), body] => Ok(Node::Function(Function {
            params: param_names(param_list)?,
            body: Box::new(body.clone()),
            self_name: None,
        })),
        [_, _] => Err(Error::SyntaxError(
            "lambda parameter list must be a list of symbols".to_owned(),
        )),
        _ => Err(Error::arity_error(2, args.len())),
    }
}

fn eval_label(
    args: &[Node],
    env: &mut Environment,
    locals: Option<&Scope>,
    depth: usize,
) -> Result<Node, Error> {
    match args {
        [Node::Atom(name), func_expr] => {
            match eval_in(func_expr, env, locals, depth + 1)? {
                // A fresh function identical to the inner one, except it can
                // call itself under `name`.
                Node::Function(func) => Ok(Node::Function(Function {
                    self_name: Some(name.clone()),
                    ..func
                })),
                other => Err(Error::TypeError(format!(
                    "label requires a function, got: {other}"
                ))),
            }
        }
        [_, _] => Err(Error::SyntaxError(
            "label requires a symbol name".to_owned(),
        )),
        _ => Err(Error::arity_error(2, args.len())),
    }
}

fn eval_defun(args: &[Node], env: &mut Environment) -> Result<Node, Error> {
    match args {
        [Node::Atom(name), Node::List(param_list), body] => {
            let node = Node::Function(Function {
                params: param_names(param_list)?,
                body: Box::new(body.clone()),
                self_name: Some(name.clone()),
            });
            env.set_global(name.clone(), node.clone());
            Ok(node)
        }
        [_, _, _] => Err(Error::SyntaxError(
            "defun requires a symbol name and a parameter list".to_owned(),
        )),
        _ => Err(Error::arity_error(3, args.len())),
    }
}

fn eval_setq(
    args: &[Node],
    env: &mut Environment,
    locals: Option<&Scope>,
    depth: usize,
) -> Result<Node, Error> {
    match args {
        [Node::Atom(name), expr] => {
            let value = eval_in(expr, env, locals, depth + 1)?;
            env.set_global(name.clone(), value.clone());
            Ok(value)
        }
        [_, _] => Err(Error::SyntaxError("setq requires a symbol name".to_owned())),
        _ => Err(Error::arity_error(2, args.len())),
    }
}

fn eval_list(
    args: &[Node],
    env: &mut Environment,
    locals: Option<&Scope>,
    depth: usize,
) -> Result<Node, Error> {
    let mut elements = Vec::with_capacity(args.len());
    for arg in args {
        elements.push(eval_in(arg, env, locals, depth + 1)?);
    }
    Ok(Node::List(elements))
}

fn param_names(param_list: &[Node]) -> Result<Vec<String>, Error> {
    param_list
        .iter()
        .map(|param| match param {
            Node::Atom(name) => Ok(name.clone()),
            other => Err(Error::SyntaxError(format!(
                "function parameters must be symbols, got: {other}"
            ))),
        })
        .collect()
}

/// One step of a derived accessor.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Step {
    Car,
    Cdr,
}

/// Parse a `c[ad]{2,4}r` accessor name into its steps, ordered for
/// application: the letter closest to the trailing `r` applies first.
/// `car` and `cdr` themselves are special forms and never reach this.
fn accessor_steps(name: &str) -> Option<Vec<Step>> {
    let inner = name.strip_prefix('c')?.strip_suffix('r')?;
    if !(2..=4).contains(&inner.len()) {
        return None;
    }
    inner
        .chars()
        .rev()
        .map(|letter| match letter {
            'a' => Some(Step::Car),
            'd' => Some(Step::Cdr),
            _ => None,
        })
        .collect()
}

fn eval_accessor(
    name: &str,
    steps: &[Step],
    args: &[Node],
    env: &mut Environment,
    locals: Option<&Scope>,
    depth: usize,
) -> Result<Node, Error> {
    let [arg] = args else {
        return Err(Error::arity_error_with_expr(1, args.len(), name.to_owned()));
    };

    // The argument evaluates once; the steps then walk the structure.
    let mut value = eval_in(arg, env, locals, depth + 1)?;
    for step in steps {
        value = match step {
            Step::Car => take_car(&value, name)?,
            Step::Cdr => take_cdr(&value, name)?,
        };
    }
    Ok(value)
}

/// First element of a list-like value; quotes count as their `(quote x)`
/// list form, so the car of `''a` is the symbol `quote`.
fn take_car(value: &Node, who: &str) -> Result<Node, Error> {
    let elements = value
        .list_elements()
        .ok_or_else(|| Error::TypeError(format!("{who} requires a list argument, got: {value}")))?;
    elements
        .into_iter()
        .next()
        .ok_or_else(|| Error::EvalError(format!("{who} of empty list")))
}

/// All elements after the first, as a new list. The cdr of the empty list
/// is the empty list.
fn take_cdr(value: &Node, who: &str) -> Result<Node, Error> {
    let elements = value
        .list_elements()
        .ok_or_else(|| Error::TypeError(format!("{who} requires a list argument, got: {value}")))?;
    Ok(Node::List(elements.into_iter().skip(1).collect()))
}

/// Apply a function to unevaluated argument expressions.
///
/// Arguments evaluate left to right in the caller's scope. The body then
/// runs in a fresh scope composed of: the caller's locals as fallback,
/// the function's self-binding (so `label`/`defun` recursion resolves),
/// and the parameter substitutions.
fn apply(
    func: &Function,
    arg_exprs: &[Node],
    env: &mut Environment,
    locals: Option<&Scope>,
    depth: usize,
) -> Result<Node, Error> {
    if arg_exprs.len() < func.params.len() {
        return Err(Error::arity_error(func.params.len(), arg_exprs.len()));
    }

    let mut values = Vec::with_capacity(arg_exprs.len());
    for arg in arg_exprs {
        values.push(eval_in(arg, env, locals, depth + 1)?);
    }

    let mut scope: Scope = locals.cloned().unwrap_or_default();
    if let Some(name) = &func.self_name {
        scope.insert(name.clone(), Node::Function(func.clone()));
    }
    // Extra arguments beyond the parameter list are ignored.
    for (param, value) in func.params.iter().zip(values) {
        scope.insert(param.clone(), value);
    }

    eval_in(&func.body, env, Some(&scope), depth + 1)
}
