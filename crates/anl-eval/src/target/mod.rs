//! Interpreter for emitted C++ evaluation-function bodies.
//!
//! Accepts exactly the statement and expression forms the code generator
//! produces, and runs them with the same point and basis semantics as
//! [`GraphEvaluator`](crate::GraphEvaluator). Agreement between the two is
//! the end-to-end check that generated text means what the graph means.

pub mod env;
pub mod interp;
pub mod lexer;
pub mod parser;

use crate::basis::NoiseBasis;
use crate::error::{EvalError, EvalResult};
use crate::point::Point;

use interp::{Interpreter, Value};
use lexer::Lexer;
use parser::{Parser, Stmt};

/// Name the generated body reads the sample point from.
pub const EVAL_POINT: &str = "EvalPoint";

/// Name of the variable holding the kernel's value after the body runs.
pub const FINAL_RESULT: &str = "FinalResult";

/// A parsed evaluation-function body.
#[derive(Debug, Clone, PartialEq)]
pub struct TargetProgram {
    statements: Vec<Stmt>,
}

impl TargetProgram {
    /// Parse the text of an evaluation-function body.
    pub fn parse(text: &str) -> EvalResult<Self> {
        let tokens = Lexer::new(text).lex()?;
        let statements = Parser::new(tokens).parse()?;
        Ok(Self { statements })
    }

    pub fn statements(&self) -> &[Stmt] {
        &self.statements
    }

    /// Run the body at `point` and return `FinalResult`.
    ///
    /// Every run starts from fresh state, so cache arrays never carry values
    /// between samples.
    pub fn run(&self, point: Point, basis: &dyn NoiseBasis) -> EvalResult<f64> {
        let mut interp = Interpreter::new(basis);
        interp.define(EVAL_POINT, Value::Point(point));
        for stmt in &self.statements {
            interp.exec(stmt)?;
        }
        match interp.lookup(FINAL_RESULT) {
            Some(Value::Number(n)) => Ok(*n),
            Some(_) => Err(EvalError::TypeMismatch(format!(
                "{FINAL_RESULT} is not a double"
            ))),
            None => Err(EvalError::MissingResult(FINAL_RESULT.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::basis::AnalyticBasis;

    fn run(text: &str) -> EvalResult<f64> {
        TargetProgram::parse(text)?.run(Point::new_2d(0.5, 0.25), &AnalyticBasis)
    }

    #[test]
    fn test_final_result() {
        assert_eq!(run("\tdouble FinalResult = (2.0 + 3.0);\n"), Ok(5.0));
    }

    #[test]
    fn test_missing_result() {
        assert_eq!(
            run("\tdouble Other = 1.0;\n"),
            Err(EvalError::MissingResult("FinalResult".into()))
        );
    }

    #[test]
    fn test_eval_point_fields() {
        assert_eq!(
            run("\tdouble FinalResult = (Point(EvalPoint).x) + (Point(EvalPoint).y);\n"),
            Ok(0.75)
        );
    }

    #[test]
    fn test_memo_guard_runs_once() {
        let text = concat!(
            "\tstd::array<bool, 1> CacheIsValidStorage{};\n",
            "\tstd::array<double, 1> CacheStorage{};\n",
            "\tbool* CacheIsValid = CacheIsValidStorage.data();\n",
            "\tdouble* Cache = CacheStorage.data();\n",
            "\tfor (std::size_t i = 0; i < 1; ++i)\n",
            "\t\tCacheIsValid[i] = false;\n",
            "\tdouble First = (CacheIsValid[0] ? Cache[0] : (Cache[0] = (4.0), CacheIsValid[0] = true, Cache[0]));\n",
            "\tdouble FinalResult = (CacheIsValid[0] ? Cache[0] : (Cache[0] = (9.0), CacheIsValid[0] = true, Cache[0]));\n",
        );
        assert_eq!(run(text), Ok(4.0));
    }

    #[test]
    fn test_lambda_call() {
        let text = concat!(
            "\tconst auto ANL_Function_3 = [&](const Point& EvalPoint, const auto& NamedInput, bool* CacheIsValid, double* Cache) -> double\n",
            "\t{\n\t\treturn (Point(EvalPoint).x) * NamedInput.Gain;\n\t};\n",
            "\tstruct\n\t{\n\t\tdouble Gain = 4.0;\n\t} NamedInput;\n",
            "\tdouble FinalResult = ANL_Function_3((Point(EvalPoint).Scale(2.0)), NamedInput, CacheIsValid, Cache);\n",
        );
        // Unused pointer arguments still have to resolve.
        assert_eq!(run(text), Err(EvalError::UndefinedVariable("CacheIsValid".into())));

        let with_arrays = format!(
            "{}{}",
            "\tstd::array<bool, 1> S{};\n\tbool* CacheIsValid = S.data();\n\tdouble* Cache = S.data();\n",
            text
        );
        assert_eq!(run(&with_arrays), Ok(4.0));
    }
}
