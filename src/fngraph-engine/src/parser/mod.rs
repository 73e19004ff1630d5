// Copyright 2026 The Simlin Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

//! Infix token streams to RPN.
//!
//! A body goes through three passes before it can be evaluated:
//! [`insert_implicit_multiplication`] makes juxtaposed factors explicit
//! (`4x` becomes `4 * x`), [`mark_unary`] reclassifies prefix `+`/`-`, and
//! [`to_postfix`] runs Dijkstra's shunting-yard over the result.

use smallvec::SmallVec;

use crate::builtins::BuiltinFn;
use crate::bytecode::{Op1, Op2, OutputToken};
use crate::common::{Error, ErrorCode, ErrorKind, Result};
use crate::token::{Token, TokenKind, tokenize};
use crate::{capacity_err, input_err, syntax_err};


/// Binding strength of an operator kind; higher binds tighter.
pub fn precedence(kind: TokenKind) -> Option<u8> {
    use TokenKind::*;
    match kind {
        Plus | Minus => Some(1),
        Multiply | Divide => Some(2),
        Power => Some(3),
        UnaryMinus | UnaryPlus => Some(4),
        Factorial => Some(5),
        Function => Some(6),
        _ => None,
    }
}

/// Number of operands a token kind consumes once it reaches the output.
pub fn arity(kind: TokenKind) -> u8 {
    use TokenKind::*;
    match kind {
        UnaryPlus | UnaryMinus | Factorial | Identifier | Function => 1,
        Plus | Minus | Multiply | Divide | Power => 2,
        _ => 0,
    }
}

pub fn is_right_assoc(kind: TokenKind) -> bool {
    matches!(
        kind,
        TokenKind::Power | TokenKind::UnaryMinus | TokenKind::UnaryPlus
    )
}

/// Reclassify `+` and `-` as prefix operators when they open the body,
/// follow `(`, or follow another operator.
pub fn mark_unary(tokens: &mut [Token]) {
    use TokenKind::*;

    let mut prev: Option<TokenKind> = None;
    for tok in tokens.iter_mut() {
        let is_prefix_position = match prev {
            None | Some(ParenOpen) => true,
            Some(kind) => matches!(
                kind,
                Plus | Minus | Multiply | Divide | Power | Factorial | UnaryMinus | UnaryPlus
            ),
        };
        if is_prefix_position {
            match tok.kind {
                Plus => tok.kind = UnaryPlus,
                Minus => tok.kind = UnaryMinus,
                _ => {}
            }
        }
        prev = Some(tok.kind);
    }
}

fn is_left_factor(tok: &Token) -> bool {
    match tok.kind {
        TokenKind::Number | TokenKind::ParenClose => true,
        // `sin(x)` is a call, not `sin * (x)`
        TokenKind::Identifier => BuiltinFn::from_name(&tok.text).is_none(),
        _ => false,
    }
}

fn is_right_factor(tok: &Token) -> bool {
    matches!(
        tok.kind,
        TokenKind::Number | TokenKind::Identifier | TokenKind::Function | TokenKind::ParenOpen
    )
}

/// Make room for one more token, growing the buffer to 8 and doubling
/// from there.
fn reserve_one(tokens: &mut Vec<Token>) -> Result<()> {
    if tokens.len() < tokens.capacity() {
        return Ok(());
    }
    let new_capacity = (tokens.capacity() * 2).max(8);
    match tokens.try_reserve_exact(new_capacity - tokens.len()) {
        Ok(()) => Ok(()),
        Err(err) => capacity_err!(
            OutOfMemory,
            format!("growing token buffer to {new_capacity}: {err}")
        ),
    }
}

/// Insert an explicit `*` between every pair of adjacent factors, returning
/// the number of insertions. Running it on its own output inserts nothing.
pub fn insert_implicit_multiplication(tokens: &mut Vec<Token>) -> Result<usize> {
    let mut inserted = 0;
    let mut i = 0;
    while i + 1 < tokens.len() {
        if is_left_factor(&tokens[i]) && is_right_factor(&tokens[i + 1]) {
            reserve_one(tokens)?;
            let at = tokens[i].loc.end;
            tokens.insert(i + 1, Token::implicit_multiply(at));
            inserted += 1;
            // continue with the right-hand factor
            i += 2;
        } else {
            i += 1;
        }
    }
    Ok(inserted)
}

fn operator_output(kind: TokenKind) -> Option<OutputToken> {
    use TokenKind::*;
    let out = match kind {
        Plus => OutputToken::op2(Op2::Add),
        Minus => OutputToken::op2(Op2::Sub),
        Multiply => OutputToken::op2(Op2::Mul),
        Divide => OutputToken::op2(Op2::Div),
        Power => OutputToken::op2(Op2::Exp),
        UnaryMinus => OutputToken::op1(Op1::Neg),
        UnaryPlus => OutputToken::op1(Op1::Pos),
        _ => return None,
    };
    Some(out)
}

enum Pending {
    Paren,
    Function(BuiltinFn),
    Operator {
        precedence: u8,
        output: OutputToken,
    },
}

/// Convert an infix body to RPN. `parameter` is the only identifier
/// allowed besides the builtin function names.
pub fn to_postfix(tokens: &[Token], parameter: &str) -> Result<Vec<OutputToken>> {
    let mut output: Vec<OutputToken> = Vec::with_capacity(tokens.len());
    let mut stack: SmallVec<[Pending; 16]> = SmallVec::new();

    for tok in tokens.iter() {
        match tok.kind {
            TokenKind::Number => match tok.text.parse::<f64>() {
                Ok(n) => output.push(OutputToken::literal(n)),
                Err(_) => {
                    return input_err!(
                        InputTokenInvalid,
                        format!("malformed number '{}' at {}", tok.text, tok.loc)
                    );
                }
            },
            TokenKind::Identifier | TokenKind::Function => {
                if let Some(func) = BuiltinFn::from_name(&tok.text) {
                    stack.push(Pending::Function(func));
                } else if tok.text == parameter {
                    output.push(OutputToken::variable(&tok.text));
                } else {
                    return syntax_err!(
                        UnknownIdentifier,
                        format!("unknown identifier '{}' at {}", tok.text, tok.loc)
                    );
                }
            }
            TokenKind::ParenOpen => stack.push(Pending::Paren),
            TokenKind::ParenClose => {
                let mut matched = false;
                while let Some(top) = stack.pop() {
                    match top {
                        Pending::Paren => {
                            matched = true;
                            break;
                        }
                        Pending::Function(func) => output.push(OutputToken::builtin(func)),
                        Pending::Operator { output: op, .. } => output.push(op),
                    }
                }
                if !matched {
                    return syntax_err!(MismatchedParentheses, "extra ')'".to_owned());
                }
                if let Some(&Pending::Function(func)) = stack.last() {
                    stack.pop();
                    output.push(OutputToken::builtin(func));
                }
            }
            // postfix and tightest-binding: its operand is already complete
            TokenKind::Factorial => output.push(OutputToken::op1(Op1::Factorial)),
            kind => {
                let (Some(current), Some(op)) = (precedence(kind), operator_output(kind)) else {
                    return input_err!(
                        InputTokenInvalid,
                        format!("unexpected {} '{}' at {}", kind, tok.text, tok.loc)
                    );
                };
                let right_assoc = is_right_assoc(kind);
                while let Some(Pending::Operator { precedence: top, .. }) = stack.last() {
                    let top = *top;
                    if top > current || (top == current && !right_assoc) {
                        if let Some(Pending::Operator { output: popped, .. }) = stack.pop() {
                            output.push(popped);
                        }
                    } else {
                        break;
                    }
                }
                stack.push(Pending::Operator {
                    precedence: current,
                    output: op,
                });
            }
        }
    }

    while let Some(top) = stack.pop() {
        match top {
            Pending::Paren => {
                return Err(Error::new(
                    ErrorKind::Syntax,
                    ErrorCode::InvalidInput,
                    Some("extra '('".to_owned()),
                ));
            }
            Pending::Function(func) => output.push(OutputToken::builtin(func)),
            Pending::Operator { output: op, .. } => output.push(op),
        }
    }

    check_stack_depth(&output)?;
    Ok(output)
}

/// Walk an RPN program without evaluating it: every operator must find its
/// operands on the stack, and exactly one value must be left at the end.
pub fn check_stack_depth(rpn: &[OutputToken]) -> Result<()> {
    let mut depth: usize = 0;
    for (i, tok) in rpn.iter().enumerate() {
        let arity = tok.arity as usize;
        if depth < arity {
            return syntax_err!(
                InvalidMemoryAccess,
                format!("'{}' at RPN position {i} is missing an operand", tok.symbol)
            );
        }
        depth = depth - arity + 1;
    }
    if depth != 1 {
        return syntax_err!(
            InvalidStackState,
            format!("expression leaves {depth} values, expected 1")
        );
    }
    Ok(())
}

/// Lex and compile a bare expression (no `f(x) =` header) with `parameter`
/// as its free variable.
pub fn parse_expression(text: &str, parameter: &str) -> Result<Vec<OutputToken>> {
    let mut tokens = tokenize(text)?;
    insert_implicit_multiplication(&mut tokens)?;
    mark_unary(&mut tokens);
    to_postfix(&tokens, parameter)
}
