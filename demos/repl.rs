use primlisp::ast::Node;
use primlisp::parser::Parser;
use primlisp::{Error, Lisp};
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use std::process;

fn main() {
    let lisp = match Lisp::new() {
        Ok(lisp) => lisp,
        Err(e) => {
            // A prelude failure means the interpreter core is broken.
            eprintln!("Fatal: prelude bootstrap failed: {e}");
            process::exit(1);
        }
    };

    run_repl(lisp);
}

fn run_repl(mut lisp: Lisp) {
    println!("primlisp - a minimal McCarthy-style Lisp");
    println!("Enter S-expressions like: (cons 'a '(b c))");
    println!("Unbalanced lines continue on the next prompt.");
    println!("Type :help for commands, or Ctrl+C to exit.");
    println!();

    let mut rl = DefaultEditor::new().expect("could not initialize line editor");

    loop {
        let first_line = match rl.readline("lisp> ") {
            Ok(line) => line,
            Err(ReadlineError::Eof) | Err(ReadlineError::Interrupted) => {
                println!("Goodbye!");
                break;
            }
            Err(err) => {
                println!("Error: {err:?}");
                break;
            }
        };

        let line = first_line.trim();
        if line.is_empty() {
            continue;
        }
        let _ = rl.add_history_entry(line);

        match line {
            ":help" => {
                print_help();
                continue;
            }
            ":env" => {
                print_environment(&lisp);
                continue;
            }
            ":quit" | ":exit" => {
                println!("Goodbye!");
                break;
            }
            _ => {}
        }

        match read_forms(&mut rl, line) {
            Ok(Some(forms)) => {
                for form in &forms {
                    match lisp.eval_form(form) {
                        Ok(value) => println!("= {value}"),
                        Err(e) => {
                            println!("Error: {e}");
                            break;
                        }
                    }
                }
            }
            Ok(None) => {
                // Interrupted mid-expression: discard the partial input.
                println!("(cancelled)");
            }
            Err(e) => println!("Error: {e}"),
        }
    }
}

/// Feed the first line into a fresh parser, then keep prompting for
/// continuation lines until every parenthesis and quote is closed.
/// Returns `None` when the user interrupts a continuation prompt.
fn read_forms(rl: &mut DefaultEditor, first_line: &str) -> Result<Option<Vec<Node>>, Error> {
    let mut parser = Parser::new();
    // The newline matters: it terminates a trailing line comment.
    parser.feed(first_line)?;
    parser.feed("\n")?;

    while !parser.is_complete() {
        let next_line = match rl.readline("...> ") {
            Ok(line) => line,
            Err(ReadlineError::Eof) | Err(ReadlineError::Interrupted) => return Ok(None),
            Err(_) => return Ok(None),
        };
        let _ = rl.add_history_entry(next_line.as_str());
        parser.feed(&next_line)?;
        parser.feed("\n")?;
    }

    parser.finish().map(Some)
}

fn print_help() {
    println!("Commands:");
    println!("  :help  - show this help message");
    println!("  :env   - show current global bindings");
    println!("  :quit  - exit the interpreter (also :exit, Ctrl+C, Ctrl+D)");
    println!();
    println!("Language:");
    println!("  Primitives: quote atom eq car cdr cons cond");
    println!("  Definition: (defun name (args) body), (setq name expr)");
    println!("  Closures:   (lambda (args) body), (label name (lambda ...))");
    println!("  Derived:    cadr caddr ... plus the prelude:");
    println!("              subst null and or not concat zip assoc eval");
    println!();
    println!("Examples:");
    println!("  (cons 'a '(b c))");
    println!("  (defun firstatom (x) (cond ((atom x) x) ('#t (firstatom (car x)))))");
    println!("  (eval '(eq 'a 'a) '())");
    println!();
}

fn print_environment(lisp: &Lisp) {
    let bindings = lisp.environment().bindings();

    let mut functions = Vec::new();
    let mut values = Vec::new();
    for (name, value) in bindings {
        match value {
            Node::Function(_) => functions.push(name),
            _ => values.push((name, value)),
        }
    }

    if !functions.is_empty() {
        println!("Functions ({}):", functions.len());
        let mut col = 0;
        for name in functions {
            print!("  {name:<12}");
            col += 1;
            if col % 4 == 0 {
                println!();
            }
        }
        if col % 4 != 0 {
            println!();
        }
        println!();
    }

    if !values.is_empty() {
        println!("Values ({}):", values.len());
        for (name, value) in values {
            println!("  {name} = {value}");
        }
    }
}
