//! Lexical grammar for self-evaluating atoms.
//!
//! Atoms whose text spells an integer, a floating-point number, or a
//! double-quoted string evaluate to themselves instead of being looked up
//! as symbols. The grammar here is the crate's own — no host-language
//! literal parsing is involved — and classification is total: an atom
//! either matches one of these productions in full or it is a symbol.
//!
//! Note that atoms can never contain whitespace, so string literals are
//! single-token (`"hello"` works, `"hello world"` splits into two atoms at
//! parse time).

use nom::{
    IResult, Parser,
    branch::alt,
    bytes::complete::{escaped, take_while1},
    character::complete::{char, one_of},
    combinator::{all_consuming, opt, recognize},
    sequence::pair,
};

/// One or more ASCII digits.
fn digits(input: &str) -> IResult<&str, &str> {
    take_while1(|c: char| c.is_ascii_digit()).parse(input)
}

/// Exponent suffix: `e`/`E`, optional sign, digits.
fn exponent(input: &str) -> IResult<&str, &str> {
    recognize((one_of("eE"), opt(one_of("+-")), digits)).parse(input)
}

/// Integer literal: optional sign, digits.
fn parse_integer(input: &str) -> IResult<&str, &str> {
    recognize(pair(opt(one_of("+-")), digits)).parse(input)
}

/// Float literal: requires a decimal point or an exponent so that plain
/// integers stay integers.
fn parse_float(input: &str) -> IResult<&str, &str> {
    recognize(pair(
        opt(one_of("+-")),
        alt((
            recognize((digits, char('.'), opt(digits), opt(exponent))),
            recognize((char('.'), digits, opt(exponent))),
            recognize((digits, exponent)),
        )),
    ))
    .parse(input)
}

/// String literal: double quotes around a possibly empty body with
/// `\"`, `\\`, `\n`, `\t`, `\r` escapes.
fn parse_string(input: &str) -> IResult<&str, &str> {
    recognize((
        char('"'),
        opt(escaped(
            take_while1(|c: char| c != '"' && c != '\\'),
            '\\',
            one_of("\"\\ntr"),
        )),
        char('"'),
    ))
    .parse(input)
}

/// True if the whole of `text` is an integer, float, or string literal.
pub(crate) fn is_literal(text: &str) -> bool {
    all_consuming(alt((parse_float, parse_integer, parse_string)))
        .parse(text)
        .is_ok()
}
