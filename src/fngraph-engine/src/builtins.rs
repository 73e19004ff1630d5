// Copyright 2026 The Simlin Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

use std::fmt;

/// Loc describes a location in a definition by the starting point and ending point.
/// Definitions are single lines typed by humans -- u16 is long enough.
#[derive(PartialEq, Eq, Clone, Copy, Debug, Default, Hash)]
pub struct Loc {
    pub start: u16,
    pub end: u16,
}

impl fmt::Display for Loc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.start, self.end)
    }
}

impl Loc {
    /// Offsets past `u16::MAX` saturate; `tokenize` rejects definitions that
    /// long before any `Loc` is built.
    pub fn new(start: usize, end: usize) -> Self {
        Loc {
            start: u16::try_from(start).unwrap_or(u16::MAX),
            end: u16::try_from(end).unwrap_or(u16::MAX),
        }
    }
}

#[test]
fn test_loc_saturates() {
    assert_eq!(Loc { start: 3, end: 7 }, Loc::new(3, 7));
    assert_eq!("3:7", Loc::new(3, 7).to_string());
    assert_eq!(Loc { start: 65_535, end: 65_535 }, Loc::new(70_000, 1 << 20));
}

/// The single-argument functions a definition body may call.
#[derive(PartialEq, Eq, Clone, Copy, Debug, Hash)]
pub enum BuiltinFn {
    Sin,
    Cos,
    Tan,
    Sqrt,
    Abs,
    Ln,
    Log,
}

pub const BUILTIN_FNS: &[BuiltinFn] = &[
    BuiltinFn::Sin,
    BuiltinFn::Cos,
    BuiltinFn::Tan,
    BuiltinFn::Sqrt,
    BuiltinFn::Abs,
    BuiltinFn::Ln,
    BuiltinFn::Log,
];

impl BuiltinFn {
    pub fn name(&self) -> &'static str {
        use BuiltinFn::*;
        match self {
            Sin => "sin",
            Cos => "cos",
            Tan => "tan",
            Sqrt => "sqrt",
            Abs => "abs",
            Ln => "ln",
            Log => "log",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        BUILTIN_FNS.iter().copied().find(|f| f.name() == name)
    }
}

impl fmt::Display for BuiltinFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[test]
fn test_builtin_names() {
    for f in BUILTIN_FNS {
        assert_eq!(Some(*f), BuiltinFn::from_name(f.name()));
    }
    assert_eq!(None, BuiltinFn::from_name("x"));
    assert_eq!(None, BuiltinFn::from_name("sinx"));
    assert_eq!(None, BuiltinFn::from_name("exp"));
}

/// Γ(z) via the Lanczos approximation (g = 7, 9 coefficients), using the
/// reflection formula Γ(z) = π / (sin(πz) Γ(1 − z)) below 0.5. Poles at zero
/// and the negative integers come back as ±inf or huge values rather than
/// errors.
pub fn gamma(z: f64) -> f64 {
    const COEFFS: [f64; 9] = [
        0.999_999_999_999_809_9,
        676.520_368_121_885_1,
        -1_259.139_216_722_402_8,
        771.323_428_777_653_1,
        -176.615_029_162_140_6,
        12.507_343_278_686_905,
        -0.138_571_095_265_720_12,
        9.984_369_578_019_572e-6,
        1.505_632_735_149_311_6e-7,
    ];
    const G: f64 = 7.0;

    if z < 0.5 {
        return std::f64::consts::PI / ((std::f64::consts::PI * z).sin() * gamma(1.0 - z));
    }

    let z = z - 1.0;
    let mut x = COEFFS[0];
    for (i, &c) in COEFFS.iter().enumerate().skip(1) {
        x += c / (z + i as f64);
    }

    let t = z + G + 0.5;
    std::f64::consts::TAU.sqrt() * t.powf(z + 0.5) * (-t).exp() * x
}

/// factorial generalized to the reals: z! = Γ(z + 1).
pub fn factorial(z: f64) -> f64 {
    let result = gamma(z + 1.0);
    if !result.is_finite() {
        log::warn!("result of {z}! exceeded the float range");
    }
    result
}

#[test]
fn test_factorial() {
    use float_cmp::approx_eq;

    assert!(approx_eq!(f64, 1.0, factorial(0.0), epsilon = 1e-10));
    assert!(approx_eq!(f64, 1.0, factorial(1.0), epsilon = 1e-10));
    assert!(approx_eq!(f64, 24.0, factorial(4.0), epsilon = 1e-9));
    assert!(approx_eq!(f64, 3_628_800.0, factorial(10.0), epsilon = 1e-3));
    // 0.5! = Γ(1.5) = √π / 2
    assert!(approx_eq!(
        f64,
        std::f64::consts::PI.sqrt() / 2.0,
        factorial(0.5),
        epsilon = 1e-10
    ));
    // (-0.5)! = Γ(0.5) = √π, through the reflection formula
    assert!(approx_eq!(
        f64,
        std::f64::consts::PI.sqrt(),
        factorial(-0.5),
        epsilon = 1e-10
    ));
    assert!(!factorial(200.0).is_finite());
}
