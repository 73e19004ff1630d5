// Copyright 2026 The Simlin Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

use smallvec::SmallVec;

use crate::builtins::{BuiltinFn, factorial};
use crate::bytecode::{Op1, Op2, OutputToken, Symbol};
use crate::common::Result;
use crate::{domain_err, eval_err, input_err};

/// Divisors and cosines smaller than this are treated as zero.
pub const EPSILON: f64 = f64::EPSILON;

/// A value for a named free variable at one evaluation point.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Variable<'a> {
    pub name: &'a str,
    pub value: f64,
}

impl<'a> Variable<'a> {
    pub fn new(name: &'a str, value: f64) -> Self {
        Variable { name, value }
    }
}

struct Stack {
    stack: SmallVec<[f64; 16]>,
}

impl Stack {
    fn with_capacity(capacity: usize) -> Self {
        Stack {
            stack: SmallVec::with_capacity(capacity),
        }
    }

    #[inline(always)]
    fn push(&mut self, value: f64) {
        self.stack.push(value)
    }

    #[inline(always)]
    fn pop(&mut self) -> Result<f64> {
        match self.stack.pop() {
            Some(value) => Ok(value),
            None => eval_err!(
                InvalidMemoryAccess,
                "operator is missing an operand".to_owned()
            ),
        }
    }

    fn len(&self) -> usize {
        self.stack.len()
    }
}

fn lookup(name: &str, vars: &[Variable<'_>]) -> Result<f64> {
    if vars.is_empty() {
        return input_err!(
            InvalidInput,
            format!("no variables provided to resolve '{name}'")
        );
    }
    match vars.iter().find(|var| var.name == name) {
        Some(var) => Ok(var.value),
        None => input_err!(
            InvalidInput,
            format!("no value provided for variable '{name}'")
        ),
    }
}

fn apply1(op: Op1, a: f64) -> f64 {
    match op {
        Op1::Neg => -a,
        Op1::Pos => a,
        Op1::Factorial => factorial(a),
    }
}

fn apply2(op: Op2, l: f64, r: f64) -> Result<f64> {
    let result = match op {
        Op2::Add => l + r,
        Op2::Sub => l - r,
        Op2::Mul => l * r,
        Op2::Div => {
            if r.abs() < EPSILON {
                return domain_err!(DivisionByZero, "attempted to divide by zero".to_owned());
            }
            l / r
        }
        Op2::Exp => l.powf(r),
    };
    Ok(result)
}

fn apply(func: BuiltinFn, a: f64) -> Result<f64> {
    let result = match func {
        BuiltinFn::Sin => a.sin(),
        BuiltinFn::Cos => a.cos(),
        BuiltinFn::Tan => {
            if a.cos().abs() < EPSILON {
                return domain_err!(TanOutOfDomain, format!("tan is undefined at {a}"));
            }
            a.tan()
        }
        BuiltinFn::Sqrt => {
            if a < 0.0 {
                return domain_err!(InvalidSqrt, format!("square root of negative number {a}"));
            }
            a.sqrt()
        }
        BuiltinFn::Abs => a.abs(),
        BuiltinFn::Ln => {
            if a <= 0.0 {
                return domain_err!(LnOutOfDomain, format!("ln of non-positive number {a}"));
            }
            a.ln()
        }
        BuiltinFn::Log => {
            if a <= 0.0 {
                return domain_err!(LogOutOfDomain, format!("log of non-positive number {a}"));
            }
            a.log10()
        }
    };
    Ok(result)
}

/// Run an RPN program, substituting `vars` for variable placeholders.
/// Exactly one value must be left on the stack at the end.
pub fn evaluate(rpn: &[OutputToken], vars: &[Variable<'_>]) -> Result<f64> {
    if rpn.is_empty() {
        return input_err!(InvalidInput, "empty RPN program".to_owned());
    }

    let mut stack = Stack::with_capacity(rpn.len());
    for tok in rpn.iter() {
        match tok.symbol {
            Symbol::Literal(n) => stack.push(n),
            Symbol::Variable(ref name) => stack.push(lookup(name, vars)?),
            Symbol::Op1(op) => {
                let a = stack.pop()?;
                stack.push(apply1(op, a));
            }
            Symbol::Op2(op) => {
                let r = stack.pop()?;
                let l = stack.pop()?;
                stack.push(apply2(op, l, r)?);
            }
            Symbol::Builtin(func) => {
                let a = stack.pop()?;
                stack.push(apply(func, a)?);
            }
        }
    }

    if stack.len() != 1 {
        return eval_err!(
            InvalidStackState,
            format!("{} values left on the stack, expected 1", stack.len())
        );
    }
    stack.pop()
}

#[cfg(test)]
mod tests {
    use float_cmp::approx_eq;

    use super::*;
    use crate::bytecode::parse_rpn;
    use crate::common::{ErrorCode, ErrorKind};
    use crate::parser::parse_expression;

    fn eval(input: &str) -> Result<f64> {
        evaluate(&parse_expression(input, "x")?, &[])
    }

    fn eval_at(input: &str, x: f64) -> Result<f64> {
        evaluate(&parse_expression(input, "x")?, &[Variable::new("x", x)])
    }

    fn eval_rpn(text: &str) -> Result<f64> {
        evaluate(&parse_rpn(text)?, &[Variable::new("x", 2.0)])
    }

    #[test]
    fn arithmetic() {
        assert_eq!(14.0, eval("2+3*4").unwrap());
        assert_eq!(20.0, eval("(2+3)*4").unwrap());
        assert_eq!(512.0, eval("2^3^2").unwrap());
        assert_eq!(1.0, eval("8/4/2").unwrap());
        assert_eq!(4.0, eval("-2^2").unwrap());
        assert_eq!(-3.0, eval("-3").unwrap());
        assert_eq!(3.0, eval("+3").unwrap());
        assert_eq!(0.5, eval("2^-1").unwrap());
        assert!(approx_eq!(f64, 6.0, eval("3!").unwrap(), epsilon = 1e-10));
        assert_eq!(2.5, eval("1.25 * 2").unwrap());
        assert!(approx_eq!(f64, 5.0, eval("(3!) - 1").unwrap(), epsilon = 1e-10));
    }

    #[test]
    fn substitution() {
        assert_eq!(12.0, eval_at("4x", 3.0).unwrap());
        assert_eq!(25.0, eval_at("x^2 + 2x + 1", 4.0).unwrap());
        assert_eq!(-9.0, eval_at("-x*3", 3.0).unwrap());
        assert!(approx_eq!(
            f64,
            2.0,
            eval_at("2sin(x)", std::f64::consts::FRAC_PI_2).unwrap(),
            ulps = 2
        ));
        assert_eq!(1.0, eval_at("log(x)", 10.0).unwrap());
        assert_eq!(3.0, eval_at("abs(x)", -3.0).unwrap());
    }

    #[test]
    fn missing_variables() {
        let err = eval("x + 1").unwrap_err();
        assert_eq!(ErrorCode::InvalidInput, err.code);
        assert_eq!(ErrorKind::Input, err.kind);

        let rpn = parse_expression("x + 1", "x").unwrap();
        let err = evaluate(&rpn, &[Variable::new("t", 1.0)]).unwrap_err();
        assert_eq!(ErrorCode::InvalidInput, err.code);
        assert_eq!(
            Some("no value provided for variable 'x'".to_owned()),
            err.details
        );
    }

    #[test]
    fn domain_errors() {
        let cases: &[(&str, f64, ErrorCode)] = &[
            ("1/x", 0.0, ErrorCode::DivisionByZero),
            ("1/(x-x)", 5.0, ErrorCode::DivisionByZero),
            ("sqrt(x)", -1.0, ErrorCode::InvalidSqrt),
            ("ln(x)", 0.0, ErrorCode::LnOutOfDomain),
            ("ln(x)", -2.0, ErrorCode::LnOutOfDomain),
            ("log(x)", 0.0, ErrorCode::LogOutOfDomain),
            ("tan(x)", std::f64::consts::FRAC_PI_2, ErrorCode::TanOutOfDomain),
        ];
        for (input, x, code) in cases {
            let err = eval_at(input, *x).unwrap_err();
            assert_eq!(*code, err.code, "{input} at {x}");
            assert_eq!(ErrorKind::Domain, err.kind, "{input} at {x}");
            assert!(err.is_domain());
        }

        assert_eq!(0.0, eval_at("sqrt(x)", 0.0).unwrap());
        assert!(approx_eq!(
            f64,
            1.0,
            eval_at("tan(x)", std::f64::consts::FRAC_PI_4).unwrap(),
            epsilon = 1e-12
        ));
    }

    #[test]
    fn malformed_programs() {
        let err = evaluate(&[], &[]).unwrap_err();
        assert_eq!(ErrorCode::InvalidInput, err.code);

        let err = eval_rpn("1 +").unwrap_err();
        assert_eq!(ErrorCode::InvalidMemoryAccess, err.code);
        assert_eq!(ErrorKind::Evaluation, err.kind);

        let err = eval_rpn("sin").unwrap_err();
        assert_eq!(ErrorCode::InvalidMemoryAccess, err.code);

        let err = eval_rpn("1 2").unwrap_err();
        assert_eq!(ErrorCode::InvalidStackState, err.code);
        assert_eq!(Some("2 values left on the stack, expected 1".to_owned()), err.details);

        assert_eq!(6.0, eval_rpn("x 3 *").unwrap());
        assert_eq!(-2.0, eval_rpn("x NEG").unwrap());
        assert_eq!(2.0, eval_rpn("x POS").unwrap());
    }

    #[test]
    fn factorial_generalizes() {
        assert!(approx_eq!(f64, 1.0, eval("0!").unwrap(), epsilon = 1e-10));
        assert!(approx_eq!(f64, 24.0, eval("4!").unwrap(), epsilon = 1e-9));
        assert!(approx_eq!(
            f64,
            0.886_226_925_452_758,
            eval_at("x!", 0.5).unwrap(),
            epsilon = 1e-10
        ));
    }
}
