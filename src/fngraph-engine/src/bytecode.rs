// Copyright 2026 The Simlin Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

use std::fmt;

use crate::builtins::BuiltinFn;
use crate::common::Result;
use crate::syntax_err;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OutputKind {
    Number,
    Operator,
    Function,
}

impl fmt::Display for OutputKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OutputKind::Number => "OUTPUT_NUMBER",
            OutputKind::Operator => "OUTPUT_OPERATOR",
            OutputKind::Function => "OUTPUT_FUNCTION",
        };
        write!(f, "{name}")
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Op1 {
    Neg,
    Pos,
    Factorial,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Op2 {
    Add,
    Sub,
    Mul,
    Div,
    Exp,
}

/// What an RPN entry does when the evaluator reaches it. Dispatch happens
/// on this enum; the textual symbol only exists for display and the text
/// form.
#[derive(Clone, Debug, PartialEq)]
pub enum Symbol {
    Literal(f64),
    Variable(String),
    Op1(Op1),
    Op2(Op2),
    Builtin(BuiltinFn),
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Symbol::Literal(n) => write!(f, "{n}"),
            Symbol::Variable(name) => write!(f, "{name}"),
            Symbol::Op1(op) => {
                let s = match op {
                    Op1::Neg => "NEG",
                    Op1::Pos => "POS",
                    Op1::Factorial => "!",
                };
                write!(f, "{s}")
            }
            Symbol::Op2(op) => {
                let s = match op {
                    Op2::Add => "+",
                    Op2::Sub => "-",
                    Op2::Mul => "*",
                    Op2::Div => "/",
                    Op2::Exp => "^",
                };
                write!(f, "{s}")
            }
            Symbol::Builtin(func) => write!(f, "{func}"),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct OutputToken {
    pub kind: OutputKind,
    pub arity: u8,
    pub symbol: Symbol,
}

impl OutputToken {
    pub fn literal(value: f64) -> Self {
        OutputToken {
            kind: OutputKind::Number,
            arity: 0,
            symbol: Symbol::Literal(value),
        }
    }

    /// A placeholder for the free parameter; its value is supplied per
    /// evaluation.
    pub fn variable(name: &str) -> Self {
        OutputToken {
            kind: OutputKind::Number,
            arity: 0,
            symbol: Symbol::Variable(name.to_owned()),
        }
    }

    pub fn op1(op: Op1) -> Self {
        // factorial is written after its operand and is emitted like a function call
        let kind = match op {
            Op1::Factorial => OutputKind::Function,
            Op1::Neg | Op1::Pos => OutputKind::Operator,
        };
        OutputToken {
            kind,
            arity: 1,
            symbol: Symbol::Op1(op),
        }
    }

    pub fn op2(op: Op2) -> Self {
        OutputToken {
            kind: OutputKind::Operator,
            arity: 2,
            symbol: Symbol::Op2(op),
        }
    }

    pub fn builtin(func: BuiltinFn) -> Self {
        OutputToken {
            kind: OutputKind::Function,
            arity: 1,
            symbol: Symbol::Builtin(func),
        }
    }

    /// The numeric payload: the literal for numbers, 0 for everything
    /// else including variable placeholders.
    pub fn value(&self) -> f64 {
        match self.symbol {
            Symbol::Literal(n) => n,
            _ => 0.0,
        }
    }
}

impl fmt::Display for OutputToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol)
    }
}

/// Render an RPN program as whitespace-separated symbols, e.g. `2 x * NEG`.
pub fn format_rpn(rpn: &[OutputToken]) -> String {
    rpn.iter()
        .map(|tok| tok.to_string())
        .collect::<Vec<_>>()
        .join(" ")
}

fn parse_symbol(word: &str) -> Result<OutputToken> {
    let tok = match word {
        "+" => OutputToken::op2(Op2::Add),
        "-" => OutputToken::op2(Op2::Sub),
        "*" => OutputToken::op2(Op2::Mul),
        "/" => OutputToken::op2(Op2::Div),
        "^" => OutputToken::op2(Op2::Exp),
        "!" => OutputToken::op1(Op1::Factorial),
        "NEG" => OutputToken::op1(Op1::Neg),
        "POS" => OutputToken::op1(Op1::Pos),
        _ => {
            if let Some(func) = BuiltinFn::from_name(word) {
                OutputToken::builtin(func)
            } else if word.starts_with(|c: char| c.is_ascii_digit()) {
                match word.parse::<f64>() {
                    Ok(n) => OutputToken::literal(n),
                    Err(_) => return syntax_err!(InvalidOperator, format!("bad number '{word}'")),
                }
            } else if word.chars().all(|c| c.is_ascii_alphabetic()) {
                OutputToken::variable(word)
            } else {
                return syntax_err!(InvalidOperator, format!("unknown symbol '{word}'"));
            }
        }
    };
    Ok(tok)
}

/// Parse the text form produced by [`format_rpn`]. No structural check is
/// made here; arity and stack errors surface when the program is evaluated.
pub fn parse_rpn(text: &str) -> Result<Vec<OutputToken>> {
    text.split_whitespace().map(parse_symbol).collect()
}

#[test]
fn test_format_rpn() {
    let rpn = vec![
        OutputToken::literal(2.0),
        OutputToken::variable("x"),
        OutputToken::op2(Op2::Mul),
        OutputToken::op1(Op1::Neg),
        OutputToken::literal(0.5),
        OutputToken::builtin(BuiltinFn::Sin),
        OutputToken::op1(Op1::Factorial),
        OutputToken::op2(Op2::Add),
    ];
    assert_eq!("2 x * NEG 0.5 sin ! +", format_rpn(&rpn));
    assert_eq!(rpn, parse_rpn("2 x * NEG 0.5 sin ! +").unwrap());
    assert_eq!(rpn, parse_rpn("  2\tx *  NEG\n0.5 sin ! + ").unwrap());
}

#[test]
fn test_parse_rpn_errors() {
    use crate::common::{ErrorCode, ErrorKind};

    let err = parse_rpn("1 2 %").unwrap_err();
    assert_eq!(ErrorCode::InvalidOperator, err.code);
    assert_eq!(ErrorKind::Syntax, err.kind);
    assert_eq!(Some("unknown symbol '%'".to_owned()), err.details);

    let err = parse_rpn("1.2.3").unwrap_err();
    assert_eq!(ErrorCode::InvalidOperator, err.code);

    assert!(parse_rpn("").unwrap().is_empty());
}

#[test]
fn test_output_token_fields() {
    let tok = OutputToken::literal(3.5);
    assert_eq!(OutputKind::Number, tok.kind);
    assert_eq!(0, tok.arity);
    assert_eq!(3.5, tok.value());

    let tok = OutputToken::variable("t");
    assert_eq!(OutputKind::Number, tok.kind);
    assert_eq!(0.0, tok.value());
    assert_eq!("t", tok.to_string());

    let tok = OutputToken::op1(Op1::Factorial);
    assert_eq!(OutputKind::Function, tok.kind);
    assert_eq!(1, tok.arity);
    assert_eq!("OUTPUT_FUNCTION", tok.kind.to_string());

    assert_eq!(2, OutputToken::op2(Op2::Exp).arity);
    assert_eq!(OutputKind::Operator, OutputToken::op1(Op1::Neg).kind);
}
