//! The self-hosted prelude.
//!
//! A fixed program written in the language itself, evaluated once against
//! the global environment before any user input is accepted. It defines the
//! derived utilities (`subst`, `null`, `and`, `or`, `not`, `concat`, `zip`,
//! `assoc`) and a complete meta-circular `eval`/`evcon`/`evlis` triple:
//! McCarthy's universal function, interpreting expressions held as data on
//! top of the host evaluator.
//!
//! Two deliberate quirks, preserved from the classic formulation:
//!
//! - `and`/`or`/`not` are ordinary two-argument functions, so both
//!   arguments are always evaluated (no short-circuiting);
//! - `assoc` returns the key itself when the table has no match, which is
//!   exactly what lets the data-level `eval` pass unbound quoted atoms
//!   through unchanged.

use crate::Error;
use crate::evaluator::{self, Environment};
use crate::parser;

/// The bootstrap program.
pub const PRELUDE: &str = r#"
(defun subst (x y z)
  (cond ((atom z)
         (cond ((eq z y) x)
               ('#t z)))
        ('#t (cons (subst x y (car z))
                   (subst x y (cdr z))))))

(defun null (x)
  (eq x '()))

(defun and (x y)
  (cond (x (cond (y '#t) ('#t '#f)))
        ('#t '#f)))

(defun or (x y)
  (cond ((not x) (cond ((not y) '#f) ('#t '#t)))
        ('#t '#t)))

(defun not (x)
  (cond (x '#f) ('#t '#t)))

(defun concat (x y)
  (cond ((null x) y)
        ('#t (cons (car x) (concat (cdr x) y)))))

(defun zip (x y)
  (cond ((and (null x) (null y)) '())
        ((and (not (atom x)) (not (atom y)))
         (cons (list (car x) (car y))
               (zip (cdr x) (cdr y))))))

(defun assoc (x y)
  (cond ((atom y) x)
        ((eq (caar y) x) (cadar y))
        ('#t (assoc x (cdr y)))))

(defun eval (e a)
  (cond
    ((atom e) (assoc e a))
    ((atom (car e))
     (cond
       ((eq (car e) 'quote) (cadr e))
       ((eq (car e) 'atom) (atom (eval (cadr e) a)))
       ((eq (car e) 'eq) (eq (eval (cadr e) a)
                             (eval (caddr e) a)))
       ((eq (car e) 'car) (car (eval (cadr e) a)))
       ((eq (car e) 'cdr) (cdr (eval (cadr e) a)))
       ((eq (car e) 'cons) (cons (eval (cadr e) a)
                                 (eval (caddr e) a)))
       ((eq (car e) 'cond) (evcon (cdr e) a))
       ('#t (eval (cons (assoc (car e) a)
                        (cdr e))
                  a))))
    ((eq (caar e) 'label)
     (eval (cons (caddar e) (cdr e))
           (cons (list (cadar e) (car e)) a)))
    ((eq (caar e) 'lambda)
     (eval (caddar e)
           (concat (zip (cadar e) (evlis (cdr e) a))
                   a)))))

(defun evcon (c a)
  (cond ((eval (caar c) a)
         (eval (cadar c) a))
        ('#t (evcon (cdr c) a))))

(defun evlis (m a)
  (cond ((null m) '())
        ('#t (cons (eval (car m) a)
                   (evlis (cdr m) a)))))
"#;

/// Parse and evaluate the prelude against `env`.
///
/// This must run to completion before user input is processed; a failure
/// here indicates a defect in the parser or evaluator core, so callers
/// treat it as fatal.
pub fn bootstrap(env: &mut Environment) -> Result<(), Error> {
    for form in parser::parse_program(PRELUDE)? {
        evaluator::eval(&form, env)?;
    }
    Ok(())
}

#[cfg(test)]
#[expect(clippy::unwrap_used)] // test code OK
mod tests {
    use crate::Lisp;

    /// Evaluate a batch in a fresh interpreter and render the last value.
    fn eval_last(lisp: &mut Lisp, source: &str) -> String {
        let results = lisp
            .eval_source(source)
            .unwrap_or_else(|e| panic!("evaluation failed for '{source}': {e}"));
        results
            .last()
            .unwrap_or_else(|| panic!("no forms in '{source}'"))
            .to_string()
    }

    fn run_prelude_tests(test_cases: Vec<(&str, &str)>) {
        let mut lisp = Lisp::new().unwrap();
        for (i, (input, expected)) in test_cases.iter().enumerate() {
            let actual = eval_last(&mut lisp, input);
            assert_eq!(
                &actual,
                expected,
                "Prelude test #{} mismatch for '{}'",
                i + 1,
                input
            );
        }
    }

    #[test]
    fn test_bootstrap_defines_utilities() {
        let lisp = Lisp::new().unwrap();
        for name in [
            "subst", "null", "and", "or", "not", "concat", "zip", "assoc", "eval", "evcon",
            "evlis",
        ] {
            assert!(
                lisp.global(name).is_some(),
                "prelude should define '{name}'"
            );
        }
    }

    #[test]
    fn test_derived_utilities() {
        run_prelude_tests(vec![
            // subst: structural substitution over a tree
            ("(subst 'm 'b '(a b (a b c) d))", "(a m (a m c) d)"),
            ("(subst 'm 'b 'b)", "m"),
            ("(subst 'm 'b '())", "()"),
            // null
            ("(null 'a)", "#f"),
            ("(null '())", "#t"),
            ("(null '(a))", "#f"),
            // and / or / not
            ("(and (atom 'a) (eq 'a 'a))", "#t"),
            ("(and (atom 'a) (eq 'a 'b))", "#f"),
            ("(and (eq 'a 'b) (eq 'a 'a))", "#f"),
            ("(or (eq 'a 'b) (eq 'a 'a))", "#t"),
            ("(or (eq 'a 'b) (eq 'b 'c))", "#f"),
            ("(or (eq 'a 'a) (eq 'b 'c))", "#t"),
            ("(not (eq 'a 'a))", "#f"),
            ("(not (eq 'a 'b))", "#t"),
            // concat: list append
            ("(concat '(a b) '(c d))", "(a b c d)"),
            ("(concat '() '(c d))", "(c d)"),
            ("(concat '(a b) '())", "(a b)"),
            // zip: pairwise combination
            ("(zip '(x y z) '(a b c))", "((x a) (y b) (z c))"),
            ("(zip '() '())", "()"),
            // assoc: first match wins
            ("(assoc 'x '((x a) (y b)))", "a"),
            ("(assoc 'x '((x new) (x a) (y b)))", "new"),
            ("(assoc 'y '((x a) (y b)))", "b"),
            // assoc on a miss yields the key itself, not an error
            ("(assoc 'q '((x a) (y b)))", "q"),
            ("(assoc 'q '())", "q"),
        ]);
    }

    /// `and`/`or`/`not` are plain functions: both arguments always
    /// evaluate, so an erroring second argument fails the whole call even
    /// when the first already decides the answer.
    #[test]
    fn test_boolean_combinators_do_not_short_circuit() {
        let mut lisp = Lisp::new().unwrap();
        let err = lisp
            .eval_source("(and (eq 'a 'b) (car '()))")
            .unwrap_err();
        assert!(
            format!("{err}").contains("car of empty list"),
            "got: {err}"
        );
    }

    #[test]
    fn test_metacircular_eval() {
        run_prelude_tests(vec![
            // Symbol lookup through the association list
            ("(eval 'x '((x a) (y b)))", "a"),
            // Primitives as data
            ("(eval '(eq 'a 'a) '())", "#t"),
            ("(eval '(cons x '(b c)) '((x a) (y b)))", "(a b c)"),
            // An unmatched quoted atom passes through assoc as itself,
            // quote and all
            (
                "(eval '(cond ((atom x) 'atom) ('t 'list)) '((x '(a b))))",
                "'list",
            ),
            // A lambda held as data in the association list
            (
                "(eval '(f '(b c)) '((f (lambda (x) (cons 'a x)))))",
                "('a b c)",
            ),
            // label recursion at the data level
            (
                "(eval '((label firstatom (lambda (x)
                    (cond ((atom x) x)
                          ('t (firstatom (car x))))))
                  y)
                 '((y ((a b) (c d)))))",
                "a",
            ),
            // Direct lambda application at the data level
            (
                "(eval '((lambda (x y) (cons x (cdr y)))
                    'a
                    '(b c d))
                  '())",
                "('a c d)",
            ),
        ]);
    }

    /// For closed expressions whose leaves are quoted lists (so the
    /// data-level `assoc` fallback never manufactures a different value),
    /// the prelude's `eval` agrees with the host evaluator.
    #[test]
    fn test_metacircular_agrees_with_host() {
        let expressions = vec![
            "(eq 'a 'a)",
            "(eq 'a 'b)",
            "(eq '() '())",
            "(atom 'a)",
            "(atom '(a b c))",
            "(atom '())",
            "(car '(a b c))",
            "(cdr '(a b c))",
            "(car '((a b) c))",
            "(cdr '((a b) c))",
            "(cond ((eq 'a 'b) '(first)) ((atom 'a) '(second)))",
        ];

        let mut lisp = Lisp::new().unwrap();
        for expression in expressions {
            let direct = lisp.eval_source(expression).unwrap().pop().unwrap();
            let meta = lisp
                .eval_source(&format!("(eval '{expression} '())"))
                .unwrap()
                .pop()
                .unwrap();
            assert_eq!(
                direct, meta,
                "host and meta-circular eval disagree on {expression}"
            );
        }
    }
}
