// Copyright 2026 The Simlin Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

// Re-export all common types from fngraph-core
pub use fngraph_core::common::*;

// Macros for error creation - these need to stay in fngraph-engine
// as they use crate-local paths

#[macro_export]
macro_rules! eqn_err(
    ($code:tt, $start:expr, $end:expr) => {{
        use $crate::common::{EquationError, ErrorCode};
        Err(EquationError{ start: $start as u16, end: $end as u16, code: ErrorCode::$code})
    }}
);

#[macro_export]
macro_rules! input_err {
    ($code:tt, $str:expr) => {{
        use $crate::common::{Error, ErrorCode, ErrorKind};
        Err(Error::new(ErrorKind::Input, ErrorCode::$code, Some($str)))
    }};
}

#[macro_export]
macro_rules! syntax_err {
    ($code:tt, $str:expr) => {{
        use $crate::common::{Error, ErrorCode, ErrorKind};
        Err(Error::new(ErrorKind::Syntax, ErrorCode::$code, Some($str)))
    }};
}

#[macro_export]
macro_rules! eval_err {
    ($code:tt, $str:expr) => {{
        use $crate::common::{Error, ErrorCode, ErrorKind};
        Err(Error::new(ErrorKind::Evaluation, ErrorCode::$code, Some($str)))
    }};
}

#[macro_export]
macro_rules! domain_err {
    ($code:tt, $str:expr) => {{
        use $crate::common::{Error, ErrorCode, ErrorKind};
        Err(Error::new(ErrorKind::Domain, ErrorCode::$code, Some($str)))
    }};
}

#[macro_export]
macro_rules! capacity_err {
    ($code:tt, $str:expr) => {{
        use $crate::common::{Error, ErrorCode, ErrorKind};
        Err(Error::new(ErrorKind::Capacity, ErrorCode::$code, Some($str)))
    }};
}

#[macro_export]
macro_rules! contract_err {
    ($code:tt, $str:expr) => {{
        use $crate::common::{Error, ErrorCode, ErrorKind};
        Err(Error::new(ErrorKind::Contract, ErrorCode::$code, Some($str)))
    }};
}
