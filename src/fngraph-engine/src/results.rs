// Copyright 2026 The Simlin Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

use serde::Serialize;

use crate::bytecode::OutputToken;
use crate::common::Result;
use crate::contract_err;
use crate::vm::{Variable, evaluate};

/// Most x values a single sampling pass visits.
pub const MAX_SAMPLES: usize = 1 << 20;

/// Relative slack when dividing the range by the step, so a stop that is a
/// whole number of steps away is still sampled despite rounding.
const STEP_TOLERANCE: f64 = 1.0e-9;

/// The x-range a function is sampled over, plus the largest |y| that
/// still counts as a plottable value.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Specs {
    pub start: f64,
    pub stop: f64,
    pub step: f64,
    pub max_magnitude: f64,
}

impl Default for Specs {
    fn default() -> Self {
        Specs {
            start: -10.0,
            stop: 10.0,
            step: 0.02,
            max_magnitude: 1.0e6,
        }
    }
}

impl Specs {
    pub fn new(start: f64, stop: f64, step: f64) -> Result<Self> {
        let specs = Specs {
            start,
            stop,
            step,
            ..Specs::default()
        };
        specs.validate()?;
        Ok(specs)
    }

    pub fn with_max_magnitude(self, max_magnitude: f64) -> Result<Self> {
        let specs = Specs {
            max_magnitude,
            ..self
        };
        specs.validate()?;
        Ok(specs)
    }

    /// The fields are public, so anything that consumes a `Specs` checks it
    /// again before trusting `sample_count`.
    pub fn validate(&self) -> Result<()> {
        let (start, stop, step) = (self.start, self.stop, self.step);
        if !start.is_finite() || !stop.is_finite() {
            return contract_err!(
                InvalidInput,
                format!("sampling range [{start}, {stop}] must be finite")
            );
        }
        if start > stop {
            return contract_err!(
                InvalidInput,
                format!("sampling range start {start} is after its end {stop}")
            );
        }
        if !(step.is_finite() && step > 0.0) {
            return contract_err!(
                InvalidInput,
                format!("sampling step must be positive, not {step}")
            );
        }
        if self.max_magnitude.is_nan() || self.max_magnitude <= 0.0 {
            return contract_err!(
                InvalidInput,
                format!("max magnitude must be positive, not {}", self.max_magnitude)
            );
        }
        if self.intervals().is_none() {
            return contract_err!(
                InvalidInput,
                format!(
                    "sampling [{start}, {stop}] by {step} visits more than {MAX_SAMPLES} points"
                )
            );
        }
        Ok(())
    }

    /// Whole steps between start and stop, or None when that is negative,
    /// not finite, or would exceed `MAX_SAMPLES` points.
    fn intervals(&self) -> Option<usize> {
        let steps = (self.stop - self.start) / self.step;
        let steps = (steps + steps.abs() * STEP_TOLERANCE).floor();
        if !(0.0..MAX_SAMPLES as f64).contains(&steps) {
            return None;
        }
        Some(steps as usize)
    }

    /// Number of x values visited; 0 for specs that don't validate.
    pub fn sample_count(&self) -> usize {
        self.intervals().and_then(|n| n.checked_add(1)).unwrap_or(0)
    }

    /// The x values to sample, computed from the index so rounding error
    /// doesn't accumulate across the range.
    pub fn xs(&self) -> impl Iterator<Item = f64> + '_ {
        (0..self.sample_count()).map(move |i| self.start + i as f64 * self.step)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Class {
    Finite,
    Nan,
    PosInfinity,
    NegInfinity,
    /// finite, but larger in magnitude than the renderer should draw
    OutOfRange,
}

pub fn classify(y: f64, max_magnitude: f64) -> Class {
    if y.is_nan() {
        Class::Nan
    } else if y == f64::INFINITY {
        Class::PosInfinity
    } else if y == f64::NEG_INFINITY {
        Class::NegInfinity
    } else if y.abs() > max_magnitude || !(y as f32).is_finite() {
        Class::OutOfRange
    } else {
        Class::Finite
    }
}

/// A sampled curve: the defined points in increasing x order, and the x
/// values where the function had no plottable value. The renderer breaks
/// the line at each undefined x.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Samples {
    pub points: Vec<(f32, f32)>,
    pub undefined_xs: Vec<f32>,
}

impl Samples {
    pub fn with_capacity(capacity: usize) -> Self {
        Samples {
            points: Vec::with_capacity(capacity),
            undefined_xs: Vec::new(),
        }
    }

    /// Total number of x values visited.
    pub fn len(&self) -> usize {
        self.points.len() + self.undefined_xs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Evaluate `rpn` at every x in `specs`, binding x to `parameter`. Domain
/// errors and unplottable values mark the point undefined; any other error
/// aborts the pass.
pub fn sample(rpn: &[OutputToken], parameter: &str, specs: &Specs) -> Result<Samples> {
    specs.validate()?;
    let mut samples = Samples::with_capacity(specs.sample_count());

    for x in specs.xs() {
        let y = match evaluate(rpn, &[Variable::new(parameter, x)]) {
            Ok(y) => y,
            Err(err) if err.is_domain() => {
                log::trace!("{parameter} = {x}: {err}");
                samples.undefined_xs.push(x as f32);
                continue;
            }
            Err(err) => return Err(err.context("failed to evaluate RPN")),
        };

        match classify(y, specs.max_magnitude) {
            Class::Finite => samples.points.push((x as f32, y as f32)),
            class => {
                log::trace!("{parameter} = {x}: dropping {y} ({class:?})");
                samples.undefined_xs.push(x as f32);
            }
        }
    }

    Ok(samples)
}

#[cfg(test)]
mod tests {
    use float_cmp::approx_eq;

    use super::*;
    use crate::common::{ErrorCode, ErrorKind};
    use crate::parser::parse_expression;

    fn sample_expr(input: &str, specs: &Specs) -> Result<Samples> {
        sample(&parse_expression(input, "x")?, "x", specs)
    }

    #[test]
    fn specs_validation() {
        let specs = Specs::new(-1.0, 1.0, 0.5).unwrap();
        assert_eq!(5, specs.sample_count());
        assert_eq!(vec![-1.0, -0.5, 0.0, 0.5, 1.0], specs.xs().collect::<Vec<_>>());
        assert_eq!(1.0e6, specs.max_magnitude);

        let single = Specs::new(2.0, 2.0, 1.0).unwrap();
        assert_eq!(1, single.sample_count());

        for (start, stop, step) in [
            (1.0, -1.0, 0.1),
            (-1.0, 1.0, 0.0),
            (-1.0, 1.0, -0.5),
            (f64::NAN, 1.0, 0.1),
            (-1.0, f64::INFINITY, 0.1),
            (-1.0, 1.0, f64::NAN),
        ] {
            let err = Specs::new(start, stop, step).unwrap_err();
            assert_eq!(ErrorKind::Contract, err.kind);
            assert_eq!(ErrorCode::InvalidInput, err.code);
        }

        for (start, stop, step) in [
            (-10.0, 10.0, 1e-300),
            (0.0, 1.0, f64::MIN_POSITIVE),
            (-1e308, 1e308, 1.0),
        ] {
            let err = Specs::new(start, stop, step).unwrap_err();
            assert_eq!(ErrorKind::Contract, err.kind);
            assert_eq!(ErrorCode::InvalidInput, err.code);
        }
        let widest = Specs::new(0.0, (MAX_SAMPLES - 1) as f64, 1.0).unwrap();
        assert_eq!(MAX_SAMPLES, widest.sample_count());
        assert!(Specs::new(0.0, MAX_SAMPLES as f64, 1.0).is_err());

        assert!(specs.with_max_magnitude(0.0).is_err());
        assert!(specs.with_max_magnitude(f64::NAN).is_err());

        let unchecked = Specs {
            step: 0.0,
            ..Specs::default()
        };
        let err = sample(&[], "x", &unchecked).unwrap_err();
        assert_eq!(ErrorKind::Contract, err.kind);
        assert_eq!(0, unchecked.sample_count());

        let tiny_step = Specs {
            step: 1e-300,
            ..Specs::default()
        };
        assert_eq!(0, tiny_step.sample_count());
        let rpn = parse_expression("x", "x").unwrap();
        let err = sample(&rpn, "x", &tiny_step).unwrap_err();
        assert_eq!(ErrorKind::Contract, err.kind);
        assert_eq!(ErrorCode::InvalidInput, err.code);
        assert_eq!(10.0, specs.with_max_magnitude(10.0).unwrap().max_magnitude);
    }

    #[test]
    fn stop_is_sampled_despite_rounding() {
        let specs = Specs::new(0.0, 0.3, 0.1).unwrap();
        assert_eq!(4, specs.sample_count());
        let xs: Vec<f64> = specs.xs().collect();
        assert!(approx_eq!(f64, 0.3, xs[3], ulps = 4));

        let specs = Specs::new(0.0, 1.0, 0.1).unwrap();
        assert_eq!(11, specs.sample_count());
        assert_eq!(1001, Specs::default().sample_count());
        assert_eq!(3, Specs::new(0.0, 0.25, 0.1).unwrap().sample_count());
    }

    #[test]
    fn default_window() {
        let specs = Specs::default();
        assert_eq!(-10.0, specs.start);
        assert_eq!(10.0, specs.stop);
        assert!(specs.sample_count() >= 1000);
    }

    #[test]
    fn classification() {
        assert_eq!(Class::Finite, classify(1.0, 10.0));
        assert_eq!(Class::Finite, classify(-10.0, 10.0));
        assert_eq!(Class::OutOfRange, classify(10.5, 10.0));
        assert_eq!(Class::OutOfRange, classify(1.0e300, f64::INFINITY));
        assert_eq!(Class::Nan, classify(f64::NAN, 10.0));
        assert_eq!(Class::PosInfinity, classify(f64::INFINITY, 10.0));
        assert_eq!(Class::NegInfinity, classify(f64::NEG_INFINITY, 10.0));
    }

    #[test]
    fn reciprocal_is_undefined_at_zero() {
        let specs = Specs::new(-2.0, 2.0, 1.0).unwrap();
        let samples = sample_expr("1/x", &specs).unwrap();
        assert_eq!(vec![0.0], samples.undefined_xs);
        assert_eq!(
            vec![(-2.0, -0.5), (-1.0, -1.0), (1.0, 1.0), (2.0, 0.5)],
            samples.points
        );
        assert_eq!(specs.sample_count(), samples.len());
    }

    #[test]
    fn large_values_are_undefined() {
        let specs = Specs::new(0.0, 3.0, 1.0)
            .unwrap()
            .with_max_magnitude(100.0)
            .unwrap();
        let samples = sample_expr("10^(x+1)", &specs).unwrap();
        assert_eq!(vec![(0.0, 10.0), (1.0, 100.0)], samples.points);
        assert_eq!(vec![2.0, 3.0], samples.undefined_xs);
    }

    #[test]
    fn non_domain_errors_propagate() {
        let rpn = parse_expression("x + 1", "x").unwrap();
        let specs = Specs::new(0.0, 1.0, 1.0).unwrap();
        // bound to the wrong name: every lookup fails
        let err = sample(&rpn, "t", &specs).unwrap_err();
        assert_eq!(ErrorCode::InvalidInput, err.code);
        assert_eq!(Some("failed to evaluate RPN".to_owned()), err.details);
        assert_eq!(
            Some("no value provided for variable 'x'".to_owned()),
            err.root_cause().details
        );
    }

    #[test]
    fn serializes_for_the_renderer() {
        let samples = Samples {
            points: vec![(1.0, 2.0)],
            undefined_xs: vec![0.0],
        };
        assert_eq!(
            r#"{"points":[[1.0,2.0]],"undefinedXs":[0.0]}"#,
            serde_json::to_string(&samples).unwrap()
        );
    }
}
