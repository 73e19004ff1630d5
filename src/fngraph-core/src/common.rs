// Copyright 2026 The Simlin Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

use std::fmt;
use std::{error, result};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // memory
    OutOfMemory,
    InvalidMemoryAccess,
    // math domain, produced per-sample during evaluation
    DivisionByZero,
    InvalidSqrt,
    TanOutOfDomain,
    LnOutOfDomain,
    LogOutOfDomain,
    // expression engine
    InputTokenInvalid,
    InvalidOperator,
    UnknownIdentifier,
    MismatchedParentheses,
    InvalidStackState,
    // generic
    InvalidInput,
    Generic,
}

impl ErrorCode {
    /// Stable numeric code, grouped by hundreds: 2xx memory, 7xx math,
    /// 8xx expression and 9xx generic.
    pub fn number(self) -> u16 {
        use ErrorCode::*;
        match self {
            OutOfMemory => 200,
            InvalidMemoryAccess => 203,
            DivisionByZero => 700,
            InvalidSqrt => 701,
            TanOutOfDomain => 706,
            LnOutOfDomain => 707,
            LogOutOfDomain => 708,
            InputTokenInvalid => 800,
            InvalidOperator => 801,
            UnknownIdentifier => 802,
            MismatchedParentheses => 803,
            InvalidStackState => 804,
            InvalidInput => 900,
            Generic => 999,
        }
    }

    /// Domain errors are routine while sampling (`1/x` at `x = 0`) and
    /// turn into undefined points rather than failures.
    pub fn is_domain(self) -> bool {
        matches!(
            self,
            ErrorCode::DivisionByZero
                | ErrorCode::InvalidSqrt
                | ErrorCode::TanOutOfDomain
                | ErrorCode::LnOutOfDomain
                | ErrorCode::LogOutOfDomain
        )
    }

    /// The kind an error with this code is reported under when no more
    /// specific kind is known (e.g. converting a positional `EquationError`).
    pub fn default_kind(self) -> ErrorKind {
        use ErrorCode::*;
        match self {
            OutOfMemory => ErrorKind::Capacity,
            InvalidMemoryAccess | InvalidStackState => ErrorKind::Evaluation,
            DivisionByZero | InvalidSqrt | TanOutOfDomain | LnOutOfDomain | LogOutOfDomain => {
                ErrorKind::Domain
            }
            InvalidOperator | UnknownIdentifier | MismatchedParentheses => ErrorKind::Syntax,
            InputTokenInvalid | InvalidInput | Generic => ErrorKind::Input,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        use ErrorCode::*;
        let name = match self {
            OutOfMemory => "out_of_memory",
            InvalidMemoryAccess => "invalid_memory_access",
            DivisionByZero => "division_by_zero",
            InvalidSqrt => "invalid_sqrt",
            TanOutOfDomain => "tan_out_of_domain",
            LnOutOfDomain => "ln_out_of_domain",
            LogOutOfDomain => "log_out_of_domain",
            InputTokenInvalid => "input_token_invalid",
            InvalidOperator => "invalid_operator",
            UnknownIdentifier => "unknown_identifier",
            MismatchedParentheses => "mismatched_parentheses",
            InvalidStackState => "invalid_stack_state",
            InvalidInput => "invalid_input",
            Generic => "generic",
        };

        write!(f, "{name}")
    }
}

/// A positional error from the lexer or the postfix parser. Offsets are
/// byte offsets into the definition text; definitions are a single line
/// typed by a human, so u16 is plenty.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct EquationError {
    pub start: u16,
    pub end: u16,
    pub code: ErrorCode,
}

impl fmt::Display for EquationError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}:{}:{}", self.start, self.end, self.code)
    }
}

impl From<EquationError> for Error {
    fn from(err: EquationError) -> Self {
        Error::new(
            err.code.default_kind(),
            err.code,
            Some(format!("at {}:{}", err.start, err.end)),
        )
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// illegal characters or empty input
    Input,
    /// malformed headers, parentheses, identifiers and operators
    Syntax,
    /// an RPN program that doesn't leave exactly one value behind
    Evaluation,
    /// math domain violations at a specific input
    Domain,
    /// full registry or failed allocation
    Capacity,
    /// caller bugs, e.g. an inverted sampling range
    Contract,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Error {
    pub kind: ErrorKind,
    pub code: ErrorCode,
    pub details: Option<String>,
    pub cause: Option<Box<Error>>,
}

impl Error {
    pub fn new(kind: ErrorKind, code: ErrorCode, details: Option<String>) -> Self {
        Error {
            kind,
            code,
            details,
            cause: None,
        }
    }

    /// Wrap this error under a higher-level message. The kind and code are
    /// kept so callers can still branch on what originally went wrong.
    pub fn context<S: Into<String>>(self, details: S) -> Self {
        Error {
            kind: self.kind,
            code: self.code,
            details: Some(details.into()),
            cause: Some(Box::new(self)),
        }
    }

    /// The innermost error of a context chain.
    pub fn root_cause(&self) -> &Error {
        let mut err = self;
        while let Some(ref cause) = err.cause {
            err = cause;
        }
        err
    }

    pub fn is_domain(&self) -> bool {
        self.code.is_domain()
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let kind = match self.kind {
            ErrorKind::Input => "InputError",
            ErrorKind::Syntax => "SyntaxError",
            ErrorKind::Evaluation => "EvaluationError",
            ErrorKind::Domain => "DomainError",
            ErrorKind::Capacity => "CapacityError",
            ErrorKind::Contract => "ContractError",
        };
        match self.details {
            Some(ref details) => write!(f, "{}{{{}: {}}}", kind, self.code, details)?,
            None => write!(f, "{}{{{}}}", kind, self.code)?,
        }
        if let Some(ref cause) = self.cause {
            write!(f, ": caused by {cause}")?;
        }
        Ok(())
    }
}

impl error::Error for Error {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        self.cause.as_deref().map(|cause| cause as &(dyn error::Error + 'static))
    }
}

pub type Result<T> = result::Result<T, Error>;
pub type EquationResult<T> = result::Result<T, EquationError>;

pub trait ResultExt<T> {
    fn context<S: Into<String>>(self, details: S) -> Result<T>;
}

impl<T, E: Into<Error>> ResultExt<T> for result::Result<T, E> {
    fn context<S: Into<String>>(self, details: S) -> Result<T> {
        self.map_err(|err| err.into().context(details))
    }
}

#[test]
fn test_error_display() {
    let err = Error::new(
        ErrorKind::Syntax,
        ErrorCode::MismatchedParentheses,
        Some("extra ')'".to_owned()),
    );
    assert_eq!("SyntaxError{mismatched_parentheses: extra ')'}", err.to_string());

    let err = Error::new(ErrorKind::Capacity, ErrorCode::OutOfMemory, None);
    assert_eq!("CapacityError{out_of_memory}", err.to_string());
}

#[test]
fn test_error_context_chain() {
    use std::error::Error as _;

    let inner = Error::new(
        ErrorKind::Domain,
        ErrorCode::DivisionByZero,
        Some("attempted to divide by zero".to_owned()),
    );
    let outer = inner.clone().context("failed to evaluate RPN");

    assert_eq!(ErrorCode::DivisionByZero, outer.code);
    assert_eq!(ErrorKind::Domain, outer.kind);
    assert!(outer.is_domain());
    assert_eq!(&inner, outer.root_cause());
    assert!(outer.source().is_some());
    assert!(inner.source().is_none());

    let display = outer.to_string();
    assert!(display.starts_with("DomainError{division_by_zero: failed to evaluate RPN}"));
    assert!(display.contains("caused by DomainError{division_by_zero: attempted"));
}

#[test]
fn test_equation_error_conversion() {
    let err: Error = EquationError {
        start: 3,
        end: 4,
        code: ErrorCode::InputTokenInvalid,
    }
    .into();
    assert_eq!(ErrorKind::Input, err.kind);
    assert_eq!(ErrorCode::InputTokenInvalid, err.code);
    assert_eq!(Some("at 3:4".to_owned()), err.details);

    let res: result::Result<(), EquationError> = Err(EquationError {
        start: 0,
        end: 1,
        code: ErrorCode::MismatchedParentheses,
    });
    let err = res.context("failed to parse tokens into RPN").unwrap_err();
    assert_eq!(ErrorKind::Syntax, err.kind);
    assert_eq!(Some("at 0:1".to_owned()), err.root_cause().details);
}

#[test]
fn test_error_code_numbers() {
    assert_eq!(700, ErrorCode::DivisionByZero.number());
    assert_eq!(803, ErrorCode::MismatchedParentheses.number());
    assert_eq!(900, ErrorCode::InvalidInput.number());
    assert!(ErrorCode::LogOutOfDomain.is_domain());
    assert!(!ErrorCode::InvalidStackState.is_domain());
}
