// Copyright 2026 The Simlin Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

// derived from the equation lexer: a single forward-only cursor with one
// character of lookahead, no backtracking

use std::fmt;
use std::str::CharIndices;

use lazy_static::lazy_static;

use crate::builtins::Loc;
use crate::common::{EquationError, EquationResult, Error, Result};
use crate::{eqn_err, input_err};


/// Longest definition `tokenize` accepts; token spans are `u16` offsets.
pub const MAX_DEFINITION_LEN: usize = u16::MAX as usize;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TokenKind {
    Number,
    Identifier,
    Function,
    /// generic operator; the lexer and parser only produce the concrete kinds below
    Operator,
    Plus,
    Minus,
    Multiply,
    Divide,
    Power,
    Factorial,
    UnaryMinus,
    UnaryPlus,
    ParenOpen,
    ParenClose,
    Comma,
    Variable,
    Equals,
    Illegal,
    Eof,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use TokenKind::*;
        let name = match self {
            Number => "TOKEN_NUMBER",
            Identifier => "TOKEN_IDENTIFIER",
            Function => "TOKEN_FUNCTION",
            Operator => "TOKEN_OPERATOR",
            Plus => "TOKEN_PLUS",
            Minus => "TOKEN_MINUS",
            Multiply => "TOKEN_MULTIPLY",
            Divide => "TOKEN_DIVIDE",
            Power => "TOKEN_POWER",
            Factorial => "TOKEN_FACTORIAL",
            UnaryMinus => "TOKEN_UNARY_MINUS",
            UnaryPlus => "TOKEN_UNARY_PLUS",
            ParenOpen => "TOKEN_PAREN_OPEN",
            ParenClose => "TOKEN_PAREN_CLOSE",
            Comma => "TOKEN_COMMA",
            Variable => "TOKEN_VARIABLE",
            Equals => "TOKEN_EQUALS",
            Illegal => "TOKEN_ILLEGAL",
            Eof => "TOKEN_EOF",
        };
        write!(f, "{name}")
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub loc: Loc,
}

impl Token {
    pub fn new(kind: TokenKind, text: &str, loc: Loc) -> Self {
        Token {
            kind,
            text: text.to_owned(),
            loc,
        }
    }

    /// A `*` that doesn't appear in the source, placed at the boundary
    /// between two adjacent factors.
    pub fn implicit_multiply(at: u16) -> Self {
        Token {
            kind: TokenKind::Multiply,
            text: "*".to_owned(),
            loc: Loc { start: at, end: at },
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.kind, self.text)
    }
}

fn error<T>(start: usize, end: usize) -> EquationResult<T> {
    eqn_err!(InputTokenInvalid, start, end)
}

pub struct Lexer<'input> {
    text: &'input str,
    chars: CharIndices<'input>,
    lookahead: Option<(usize, char)>,
}

impl<'input> Lexer<'input> {
    pub fn new(input: &'input str) -> Self {
        let mut t = Lexer {
            text: input,
            chars: input.char_indices(),
            lookahead: None,
        };
        t.bump();
        t
    }

    fn bump(&mut self) -> Option<(usize, char)> {
        self.lookahead = self.chars.next();
        self.lookahead
    }

    fn bump_to(&mut self, end: usize) {
        while let Some((i, _)) = self.lookahead {
            if i >= end {
                break;
            }
            self.bump();
        }
    }

    fn take_while<F>(&mut self, mut keep_going: F) -> usize
    where
        F: FnMut(char) -> bool,
    {
        loop {
            match self.lookahead {
                Some((idx, c)) if !keep_going(c) => return idx,
                Some(_) => {
                    self.bump();
                }
                None => return self.text.len(),
            }
        }
    }

    fn identifier(&mut self, idx0: usize) -> Token {
        let end = self.take_while(|c| c.is_ascii_alphabetic());
        Token::new(TokenKind::Identifier, &self.text[idx0..end], Loc::new(idx0, end))
    }

    fn number(&mut self, idx0: usize) -> Token {
        use regex::Regex;

        lazy_static! {
            static ref NUMBER_RE: Regex = Regex::new(r"^\d+(\.\d+)?").unwrap();
        }

        // the caller has already seen a digit, so the match is never empty
        let len = NUMBER_RE
            .find(&self.text[idx0..])
            .map_or(1, |m| m.end());
        let end = idx0 + len;
        self.bump_to(end);

        Token::new(TokenKind::Number, &self.text[idx0..end], Loc::new(idx0, end))
    }

    fn consume(&mut self, i: usize, kind: TokenKind) -> Option<EquationResult<Token>> {
        self.bump();
        Some(Ok(Token::new(kind, &self.text[i..i + 1], Loc::new(i, i + 1))))
    }
}

impl Iterator for Lexer<'_> {
    type Item = EquationResult<Token>;

    fn next(&mut self) -> Option<Self::Item> {
        use TokenKind::*;
        loop {
            return match self.lookahead {
                Some((_, ' ' | '\t' | '\n' | '\r')) => {
                    self.bump();
                    continue;
                }
                Some((i, '+')) => self.consume(i, Plus),
                Some((i, '-')) => self.consume(i, Minus),
                Some((i, '*')) => self.consume(i, Multiply),
                Some((i, '/')) => self.consume(i, Divide),
                Some((i, '=')) => self.consume(i, Equals),
                Some((i, '^')) => self.consume(i, Power),
                Some((i, '!')) => self.consume(i, Factorial),
                Some((i, '(')) => self.consume(i, ParenOpen),
                Some((i, ')')) => self.consume(i, ParenClose),
                Some((i, c)) if c.is_ascii_digit() => Some(Ok(self.number(i))),
                Some((i, c)) if c.is_ascii_alphabetic() => Some(Ok(self.identifier(i))),
                Some((i, _)) => {
                    self.bump(); // eat whatever is killing us
                    let end = match self.lookahead {
                        Some((end, _)) => end,
                        None => self.text.len(),
                    };
                    Some(error(i, end))
                }
                None => None,
            };
        }
    }
}

/// Number of tokens in `text`, used to size the token buffer before the
/// real lexing pass.
pub fn count_tokens(text: &str) -> EquationResult<usize> {
    Lexer::new(text).try_fold(0, |n, tok| tok.map(|_| n + 1))
}

fn illegal_character(text: &str, err: EquationError) -> Error {
    let offending = text
        .get(err.start as usize..err.end as usize)
        .unwrap_or_default()
        .to_owned();
    Error::from(err).context(format!("illegal character '{offending}'"))
}

/// Lex `text` into tokens. Empty input is rejected up front; input made
/// only of whitespace produces no tokens.
pub fn tokenize(text: &str) -> Result<Vec<Token>> {
    if text.is_empty() {
        return input_err!(InvalidInput, "empty expression".to_owned());
    }
    if text.len() > MAX_DEFINITION_LEN {
        return input_err!(
            InvalidInput,
            format!(
                "definition is {} bytes long, at most {MAX_DEFINITION_LEN} are supported",
                text.len()
            )
        );
    }

    let count = count_tokens(text).map_err(|err| illegal_character(text, err))?;
    let mut tokens = Vec::with_capacity(count);
    for tok in Lexer::new(text) {
        tokens.push(tok.map_err(|err| illegal_character(text, err))?);
    }

    Ok(tokens)
}
