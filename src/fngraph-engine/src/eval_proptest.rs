// Copyright 2026 The Simlin Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

//! Property-based tests for the expression pipeline.
//!
//! These tests verify that:
//! 1. Random arithmetic expressions evaluate to the same value as a direct
//!    recursive evaluation of the tree they were rendered from
//! 2. Implicit multiplication inserts nothing on a second pass
//! 3. Sampling visits every x exactly once, as a point or as undefined
//! 4. Parser output survives a trip through the text RPN form

use float_cmp::approx_eq;
use proptest::prelude::*;

use crate::bytecode::{format_rpn, parse_rpn};
use crate::parser::{insert_implicit_multiplication, parse_expression};
use crate::results::{Specs, sample};
use crate::token::tokenize;
use crate::vm::{Variable, evaluate};

#[derive(Clone, Debug)]
enum Expr {
    Num(u32),
    X,
    Neg(Box<Expr>),
    Bin(char, Box<Expr>, Box<Expr>),
}

impl Expr {
    fn render(&self) -> String {
        match self {
            Expr::Num(n) => n.to_string(),
            Expr::X => "x".to_owned(),
            Expr::Neg(e) => format!("(-{})", e.render()),
            Expr::Bin(op, l, r) => format!("({} {} {})", l.render(), op, r.render()),
        }
    }

    fn eval(&self, x: f64) -> f64 {
        match self {
            Expr::Num(n) => *n as f64,
            Expr::X => x,
            Expr::Neg(e) => -e.eval(x),
            Expr::Bin(op, l, r) => {
                let (l, r) = (l.eval(x), r.eval(x));
                match op {
                    '+' => l + r,
                    '-' => l - r,
                    _ => l * r,
                }
            }
        }
    }
}

fn expr_strategy() -> impl Strategy<Value = Expr> {
    let leaf = prop_oneof![(0u32..20).prop_map(Expr::Num), Just(Expr::X)];
    leaf.prop_recursive(4, 32, 2, |inner| {
        prop_oneof![
            inner.clone().prop_map(|e| Expr::Neg(Box::new(e))),
            (inner.clone(), prop::sample::select(vec!['+', '-', '*']), inner)
                .prop_map(|(l, op, r)| Expr::Bin(op, Box::new(l), Box::new(r))),
        ]
    })
}

fn sampled_body_strategy() -> impl Strategy<Value = &'static str> {
    prop::sample::select(vec![
        "1/x",
        "sqrt(x)",
        "ln(x)",
        "log(x - 1)",
        "tan(x)",
        "x^2 - 3x",
        "10^x",
        "x!",
    ])
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn evaluation_matches_reference(expr in expr_strategy(), x in -10i32..10) {
        let x = x as f64;
        let rpn = parse_expression(&expr.render(), "x").unwrap();
        let actual = evaluate(&rpn, &[Variable::new("x", x)]).unwrap();
        let expected = expr.eval(x);
        prop_assert!(
            approx_eq!(f64, expected, actual, ulps = 4),
            "{} at x = {}: expected {}, got {}", expr.render(), x, expected, actual
        );
    }

    #[test]
    fn implicit_multiplication_idempotent(input in "[0-9x()+*^ -]{1,24}") {
        let mut tokens = tokenize(&input).unwrap();
        insert_implicit_multiplication(&mut tokens).unwrap();
        let once = tokens.clone();
        prop_assert_eq!(0, insert_implicit_multiplication(&mut tokens).unwrap());
        prop_assert_eq!(once, tokens);
    }

    #[test]
    fn sampling_partitions_the_range(
        body in sampled_body_strategy(),
        start in -50i32..50,
        width in 0u32..20,
        step in prop::sample::select(vec![0.1, 0.25, 0.5, 1.0]),
    ) {
        let start = start as f64;
        let specs = Specs::new(start, start + width as f64, step).unwrap();
        let rpn = parse_expression(body, "x").unwrap();
        let samples = sample(&rpn, "x", &specs).unwrap();

        prop_assert_eq!(specs.sample_count(), samples.len());
        for pair in samples.points.windows(2) {
            prop_assert!(pair[0].0 < pair[1].0);
        }
        for &(_, y) in samples.points.iter() {
            prop_assert!(y.is_finite());
            prop_assert!((y as f64).abs() <= specs.max_magnitude);
        }
    }

    #[test]
    fn text_rpn_roundtrip(expr in expr_strategy()) {
        let rpn = parse_expression(&expr.render(), "x").unwrap();
        let text = format_rpn(&rpn);
        prop_assert_eq!(rpn, parse_rpn(&text).unwrap());
    }
}
