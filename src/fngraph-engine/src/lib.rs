// Copyright 2026 The Simlin Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

//! Expression engine for plotting single-parameter functions.
//!
//! Definitions such as `f(x) = 2sin(x)` or `y = x^2` are lexed
//! ([`token`]), rewritten and converted to RPN ([`parser`]), and
//! evaluated on a float stack ([`vm`]). A [`FunctionManager`] holds up to
//! [`MAX_FUNCTIONS`] of them, and [`results`] samples them over an x-range
//! for a renderer.

#![forbid(unsafe_code)]

pub mod common;

pub mod builtins;
pub mod bytecode;
pub mod function;
pub mod manager;
pub mod parser;
pub mod results;
pub mod token;
pub mod vm;

#[cfg(test)]
mod eval_proptest;

pub use self::builtins::{BuiltinFn, Loc, factorial, gamma};
pub use self::bytecode::{OutputKind, OutputToken, Symbol, format_rpn, parse_rpn};
pub use self::common::{Error, ErrorCode, ErrorKind, Result};
pub use self::function::{Function, MAX_FN_NAME_LEN, MAX_PARAM_NAME_LEN, Rgb, parse_function};
pub use self::manager::{FunctionManager, MAX_FUNCTIONS};
pub use self::parser::parse_expression;
pub use self::results::{MAX_SAMPLES, Samples, Specs, sample};
pub use self::token::{MAX_DEFINITION_LEN, Token, TokenKind, tokenize};
pub use self::vm::{Variable, evaluate};
