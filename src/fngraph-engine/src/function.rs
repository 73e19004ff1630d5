// Copyright 2026 The Simlin Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

use std::fmt::{self, Write};

use serde::Serialize;

use crate::bytecode::{OutputToken, format_rpn};
use crate::common::{Result, ResultExt};
use crate::manager::FunctionManager;
use crate::parser::{insert_implicit_multiplication, mark_unary, to_postfix};
use crate::results::{Samples, Specs, sample};
use crate::syntax_err;
use crate::token::{Token, TokenKind, tokenize};
use crate::vm::{Variable, evaluate};

pub const MAX_FN_NAME_LEN: usize = 1;
pub const MAX_PARAM_NAME_LEN: usize = 1;

/// `y = ...` definitions bind this parameter.
pub const DEFAULT_PARAMETER: &str = "x";

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Rgb {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Rgb {
    pub const WHITE: Rgb = Rgb::new(1.0, 1.0, 1.0);
    pub const RED: Rgb = Rgb::new(1.0, 0.0, 0.0);
    pub const ORANGE: Rgb = Rgb::new(1.0, 0.647, 0.0);
    pub const YELLOW: Rgb = Rgb::new(1.0, 1.0, 0.0);
    pub const GREEN: Rgb = Rgb::new(0.0, 1.0, 0.0);
    pub const BLUE: Rgb = Rgb::new(0.0, 0.0, 1.0);
    pub const PURPLE: Rgb = Rgb::new(0.5, 0.0, 0.5);
    pub const PINK: Rgb = Rgb::new(1.0, 0.41, 0.71);
    pub const GRAY: Rgb = Rgb::new(0.5, 0.5, 0.5);

    /// Colors handed out to functions registered without one, by
    /// registration index.
    pub const PALETTE: [Rgb; 9] = [
        Rgb::RED,
        Rgb::ORANGE,
        Rgb::YELLOW,
        Rgb::GREEN,
        Rgb::BLUE,
        Rgb::PURPLE,
        Rgb::PINK,
        Rgb::GRAY,
        Rgb::WHITE,
    ];

    pub const fn new(r: f32, g: f32, b: f32) -> Self {
        Rgb { r, g, b }
    }

    pub fn from_palette(index: usize) -> Self {
        Rgb::PALETTE[index % Rgb::PALETTE.len()]
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rgb({:.3}, {:.3}, {:.3})", self.r, self.g, self.b)
    }
}

/// A parsed single-parameter function. `tokens` holds the body only, with
/// implicit multiplications made explicit and unary operators marked;
/// `rpn` is its postfix form.
#[derive(Clone, Debug, PartialEq)]
pub struct Function {
    pub name: String,
    pub parameter: String,
    pub tokens: Vec<Token>,
    pub rpn: Vec<OutputToken>,
    pub is_visible: bool,
    pub color: Rgb,
}

fn header_err<T>(details: String) -> Result<T> {
    syntax_err!(InvalidInput, details)
}

fn expect(tokens: &[Token], i: usize, kind: TokenKind, what: &str) -> Result<()> {
    match tokens.get(i) {
        Some(tok) if tok.kind == kind => Ok(()),
        Some(tok) => header_err(format!("expected {what} at {}, found '{}'", tok.loc, tok.text)),
        None => header_err("incomplete function definition".to_owned()),
    }
}

/// Parse `name(param) = body` or `y = body` into a [`Function`]. `registry`
/// is only consulted for duplicate names and to pick a default color.
pub fn parse_function(
    definition: &str,
    registry: &FunctionManager,
    color: Option<Rgb>,
) -> Result<Function> {
    let tokens = tokenize(definition)?;

    let Some(first) = tokens.first() else {
        return header_err("incomplete function definition".to_owned());
    };
    if first.kind != TokenKind::Identifier {
        return header_err(format!("expected a function name, found '{}'", first.text));
    }
    let name = first.text.clone();
    let is_y_style = name == "y";
    if !is_y_style && name.len() > MAX_FN_NAME_LEN {
        return header_err(format!(
            "function name '{name}' is longer than {MAX_FN_NAME_LEN} character"
        ));
    }
    if registry.contains(&name) {
        return header_err(format!("function '{name}' already exists"));
    }

    let (parameter, header_len) = if is_y_style {
        expect(&tokens, 1, TokenKind::Equals, "'='")?;
        (DEFAULT_PARAMETER.to_owned(), 2)
    } else {
        expect(&tokens, 1, TokenKind::ParenOpen, "'('")?;
        expect(&tokens, 2, TokenKind::Identifier, "a parameter name")?;
        let parameter = tokens[2].text.clone();
        if parameter.len() > MAX_PARAM_NAME_LEN {
            return header_err(format!(
                "parameter '{parameter}' is longer than {MAX_PARAM_NAME_LEN} character"
            ));
        }
        if parameter == name {
            return header_err(format!(
                "parameter '{parameter}' has the same name as its function"
            ));
        }
        expect(&tokens, 3, TokenKind::ParenClose, "')'")?;
        expect(&tokens, 4, TokenKind::Equals, "'='")?;
        (parameter, 5)
    };

    let mut body = tokens[header_len..].to_vec();
    if body.is_empty() {
        return header_err(format!("empty function body for '{name}'"));
    }

    insert_implicit_multiplication(&mut body).context("failed to insert implicit multiplication")?;
    mark_unary(&mut body);
    let rpn = to_postfix(&body, &parameter).context("failed to parse tokens into RPN")?;

    log::debug!(
        "parsed {name}({parameter}): {} body tokens, {} RPN tokens",
        body.len(),
        rpn.len()
    );

    Ok(Function {
        name,
        parameter,
        tokens: body,
        rpn,
        is_visible: true,
        color: color.unwrap_or_else(|| Rgb::from_palette(registry.len())),
    })
}

impl Function {
    /// The value of the function with its parameter bound to `x`.
    pub fn evaluate(&self, x: f64) -> Result<f64> {
        evaluate(&self.rpn, &[Variable::new(&self.parameter, x)])
    }

    pub fn sample(&self, specs: &Specs) -> Result<Samples> {
        sample(&self.rpn, &self.parameter, specs)
    }

    /// A human-readable dump of the function's tokens and RPN.
    pub fn describe(&self) -> String {
        let mut out = String::new();
        // writing to a String can't fail
        let _ = self.write_description(&mut out);
        out
    }

    fn write_description(&self, out: &mut String) -> fmt::Result {
        let visibility = if self.is_visible { "visible" } else { "hidden" };
        writeln!(
            out,
            "{}({}): {visibility}, {}",
            self.name, self.parameter, self.color
        )?;
        writeln!(out, "  tokens ({}):", self.tokens.len())?;
        for tok in self.tokens.iter() {
            writeln!(out, "    {:<18} {}", tok.kind.to_string(), tok.text)?;
        }
        writeln!(out, "  rpn ({}): {}", self.rpn.len(), format_rpn(&self.rpn))?;
        for tok in self.rpn.iter() {
            writeln!(
                out,
                "    {:<16} {:<4} arity {} value {}",
                tok.kind.to_string(),
                tok.symbol.to_string(),
                tok.arity,
                tok.value()
            )?;
        }
        Ok(())
    }
}
