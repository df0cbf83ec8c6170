//! Error types for the reference evaluators.

use std::fmt;

/// Evaluation error: malformed target text, unknown names, type mismatches.
#[derive(Debug, Clone, PartialEq)]
pub enum EvalError {
    /// Target text could not be tokenized or parsed.
    Parse { line: u32, message: String },
    /// Unknown variable
    UndefinedVariable(String),
    /// Unknown builtin or lambda
    UnknownFunction(String),
    /// Wrong argument count for a call
    Arity {
        function: String,
        expected: usize,
        found: usize,
    },
    /// Type mismatch at runtime
    TypeMismatch(String),
    /// Array index out of bounds
    IndexOutOfRange { array: String, index: usize },
    /// The graph contains something the evaluator cannot interpret.
    InvalidGraph(String),
    /// The program never assigned its result variable.
    MissingResult(String),
}

impl fmt::Display for EvalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Parse { line, message } => write!(f, "parse error at line {line}: {message}"),
            Self::UndefinedVariable(name) => write!(f, "undefined variable: {name}"),
            Self::UnknownFunction(name) => write!(f, "unknown function: {name}"),
            Self::Arity {
                function,
                expected,
                found,
            } => write!(
                f,
                "{function} expects {expected} arguments, got {found}"
            ),
            Self::TypeMismatch(msg) => write!(f, "type mismatch: {msg}"),
            Self::IndexOutOfRange { array, index } => {
                write!(f, "index {index} out of range for {array}")
            }
            Self::InvalidGraph(msg) => write!(f, "invalid graph: {msg}"),
            Self::MissingResult(name) => write!(f, "result variable {name} was never assigned"),
        }
    }
}

impl std::error::Error for EvalError {}

/// Result alias for evaluator operations.
pub type EvalResult<T> = Result<T, EvalError>;
