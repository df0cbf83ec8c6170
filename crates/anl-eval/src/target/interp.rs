//! Tree-walking interpreter for parsed target statements.
//!
//! Values follow C++ semantics for the emitted subset: `double` arithmetic,
//! truncating integer casts, `bool` conditions, and `Point` values with the
//! skeleton's member functions. Arrays and the named-input struct are stored
//! once and referred to by name, so pointer aliases (`Cache`) and lambda
//! parameters observe the same storage.

use std::collections::HashMap;

use anl_types::Axis;

use crate::basis::NoiseBasis;
use crate::error::{EvalError, EvalResult};
use crate::math::{self, cpp_max, cpp_min, to_int, to_uint};
use crate::point::Point;
use crate::target::env::Environment;
use crate::target::parser::{BinOp, CastType, ElemType, Expr, Lambda, Stmt};

/// Upper bound on `for` iterations, guarding against runaway loops.
const MAX_LOOP_ITERATIONS: usize = 1 << 24;

/// A runtime value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Number(f64),
    Bool(bool),
    Point(Point),
    /// Reference to array storage by name.
    Array(String),
    /// Reference to a struct by name.
    Record(String),
}

impl Value {
    fn describe(&self) -> &'static str {
        match self {
            Value::Number(_) => "double",
            Value::Bool(_) => "bool",
            Value::Point(_) => "Point",
            Value::Array(_) => "array",
            Value::Record(_) => "struct",
        }
    }

    fn as_number(&self) -> EvalResult<f64> {
        match self {
            Value::Number(n) => Ok(*n),
            Value::Bool(b) => Ok(if *b { 1.0 } else { 0.0 }),
            other => Err(EvalError::TypeMismatch(format!(
                "expected a number, found {}",
                other.describe()
            ))),
        }
    }

    fn as_point(&self) -> EvalResult<Point> {
        match self {
            Value::Point(p) => Ok(*p),
            other => Err(EvalError::TypeMismatch(format!(
                "expected a Point, found {}",
                other.describe()
            ))),
        }
    }

    fn truthy(&self) -> EvalResult<bool> {
        match self {
            Value::Bool(b) => Ok(*b),
            Value::Number(n) => Ok(*n != 0.0),
            other => Err(EvalError::TypeMismatch(format!(
                "{} used as a condition",
                other.describe()
            ))),
        }
    }
}

/// Interpreter state for one evaluation.
pub struct Interpreter<'a> {
    basis: &'a dyn NoiseBasis,
    env: Environment,
    arrays: HashMap<String, Vec<Value>>,
    records: HashMap<String, HashMap<String, f64>>,
    lambdas: HashMap<String, Lambda>,
}

impl<'a> Interpreter<'a> {
    pub fn new(basis: &'a dyn NoiseBasis) -> Self {
        Self {
            basis,
            env: Environment::new(),
            arrays: HashMap::new(),
            records: HashMap::new(),
            lambdas: HashMap::new(),
        }
    }

    /// Bind a global variable.
    pub fn define(&mut self, name: &str, value: Value) {
        self.env.define(name, value);
    }

    pub fn lookup(&self, name: &str) -> Option<&Value> {
        self.env.get(name)
    }

    // ══════════════════════════════════════════════════════════════════════
    // Statements
    // ══════════════════════════════════════════════════════════════════════

    pub fn exec(&mut self, stmt: &Stmt) -> EvalResult<()> {
        match stmt {
            Stmt::Lambda { name, lambda } => {
                self.lambdas.insert(name.clone(), lambda.clone());
            }
            Stmt::Array { name, elem, len } => {
                let fill = match elem {
                    ElemType::Bool => Value::Bool(false),
                    ElemType::Double => Value::Number(0.0),
                };
                self.arrays.insert(name.clone(), vec![fill; *len]);
                self.env.define(name, Value::Array(name.clone()));
            }
            Stmt::Let { name, value } => {
                let v = self.eval(value)?;
                self.env.define(name, v);
            }
            Stmt::For {
                var,
                init,
                cond,
                body,
            } => {
                let start = self.eval(init)?.as_number()?;
                self.env.push_scope();
                self.env.define(var, Value::Number(start));
                let result = self.run_loop(var, cond, body);
                self.env.pop_scope();
                result?;
            }
            Stmt::Record { name, fields } => {
                let mut record = HashMap::new();
                for (field, value) in fields {
                    record.insert(field.clone(), self.eval(value)?.as_number()?);
                }
                self.records.insert(name.clone(), record);
                self.env.define(name, Value::Record(name.clone()));
            }
            Stmt::Expr(expr) => {
                self.eval(expr)?;
            }
        }
        Ok(())
    }

    fn run_loop(&mut self, var: &str, cond: &Expr, body: &Stmt) -> EvalResult<()> {
        for _ in 0..MAX_LOOP_ITERATIONS {
            if !self.eval(cond)?.truthy()? {
                return Ok(());
            }
            self.exec(body)?;
            let next = self.var(var)?.as_number()? + 1.0;
            self.env.set(var, Value::Number(next));
        }
        Err(EvalError::TypeMismatch(format!(
            "loop over '{var}' did not terminate"
        )))
    }

    // ══════════════════════════════════════════════════════════════════════
    // Expressions
    // ══════════════════════════════════════════════════════════════════════

    pub fn eval(&mut self, expr: &Expr) -> EvalResult<Value> {
        match expr {
            Expr::Number(n) => Ok(Value::Number(*n)),
            Expr::Bool(b) => Ok(Value::Bool(*b)),
            Expr::Ident(name) => self.var(name).cloned(),
            Expr::Neg(operand) => Ok(Value::Number(-self.eval(operand)?.as_number()?)),
            Expr::Cast { ty, operand } => {
                let n = self.eval(operand)?.as_number()?;
                Ok(Value::Number(match ty {
                    CastType::Int => f64::from(to_int(n)),
                    CastType::UnsignedInt => f64::from(to_uint(n)),
                    CastType::Double => n,
                }))
            }
            Expr::Binary { left, op, right } => {
                let l = self.eval(left)?;
                let r = self.eval(right)?;
                binary(&l, *op, &r)
            }
            Expr::Assign { target, value } => {
                let v = self.eval(value)?;
                self.assign(target, v.clone())?;
                Ok(v)
            }
            Expr::Conditional {
                cond,
                then,
                otherwise,
            } => {
                if self.eval(cond)?.truthy()? {
                    self.eval(then)
                } else {
                    self.eval(otherwise)
                }
            }
            Expr::Comma(left, right) => {
                self.eval(left)?;
                self.eval(right)
            }
            Expr::Call { callee, args } => {
                let values = args
                    .iter()
                    .map(|a| self.eval(a))
                    .collect::<EvalResult<Vec<_>>>()?;
                self.call(callee, values)
            }
            Expr::Field { object, field } => match self.eval(object)? {
                Value::Point(p) => point_field(&p, field),
                Value::Record(name) => self
                    .records
                    .get(&name)
                    .and_then(|r| r.get(field))
                    .map(|v| Value::Number(*v))
                    .ok_or_else(|| EvalError::UndefinedVariable(format!("{name}.{field}"))),
                other => Err(EvalError::TypeMismatch(format!(
                    "field '{field}' on {}",
                    other.describe()
                ))),
            },
            Expr::Method {
                object,
                method,
                args,
            } => {
                let receiver = self.eval(object)?;
                let values = args
                    .iter()
                    .map(|a| self.eval(a))
                    .collect::<EvalResult<Vec<_>>>()?;
                call_method(receiver, method, &values)
            }
            Expr::Index { object, index } => {
                let array = self.array_name(object)?;
                let i = self.index(index)?;
                self.arrays
                    .get(&array)
                    .and_then(|a| a.get(i))
                    .cloned()
                    .ok_or(EvalError::IndexOutOfRange { array, index: i })
            }
        }
    }

    fn var(&self, name: &str) -> EvalResult<&Value> {
        self.env
            .get(name)
            .ok_or_else(|| EvalError::UndefinedVariable(name.to_string()))
    }

    fn array_name(&mut self, object: &Expr) -> EvalResult<String> {
        match self.eval(object)? {
            Value::Array(name) => Ok(name),
            other => Err(EvalError::TypeMismatch(format!(
                "indexing into {}",
                other.describe()
            ))),
        }
    }

    fn index(&mut self, index: &Expr) -> EvalResult<usize> {
        let n = self.eval(index)?.as_number()?;
        if n < 0.0 || n.fract() != 0.0 {
            return Err(EvalError::TypeMismatch(format!("invalid index {n}")));
        }
        Ok(n as usize)
    }

    fn assign(&mut self, target: &Expr, value: Value) -> EvalResult<()> {
        match target {
            Expr::Ident(name) => {
                if self.env.set(name, value) {
                    Ok(())
                } else {
                    Err(EvalError::UndefinedVariable(name.clone()))
                }
            }
            Expr::Index { object, index } => {
                let array = self.array_name(object)?;
                let i = self.index(index)?;
                match self.arrays.get_mut(&array).and_then(|a| a.get_mut(i)) {
                    Some(slot) => {
                        *slot = value;
                        Ok(())
                    }
                    None => Err(EvalError::IndexOutOfRange { array, index: i }),
                }
            }
            _ => Err(EvalError::TypeMismatch(
                "assignment to a non-lvalue".to_string(),
            )),
        }
    }

    // ══════════════════════════════════════════════════════════════════════
    // Calls
    // ══════════════════════════════════════════════════════════════════════

    fn call(&mut self, callee: &str, args: Vec<Value>) -> EvalResult<Value> {
        if let Some(lambda) = self.lambdas.get(callee).cloned() {
            return self.call_lambda(callee, &lambda, args);
        }
        self.call_builtin(callee, &args)
    }

    fn call_lambda(&mut self, name: &str, lambda: &Lambda, args: Vec<Value>) -> EvalResult<Value> {
        if args.len() != lambda.params.len() {
            return Err(EvalError::Arity {
                function: name.to_string(),
                expected: lambda.params.len(),
                found: args.len(),
            });
        }
        self.env.push_scope();
        for (param, arg) in lambda.params.iter().zip(args) {
            self.env.define(param, arg);
        }
        let result = self.eval(&lambda.body);
        self.env.pop_scope();
        Ok(Value::Number(result?.as_number()?))
    }

    fn call_builtin(&mut self, name: &str, args: &[Value]) -> EvalResult<Value> {
        let arity = |expected: usize| {
            if args.len() == expected {
                Ok(())
            } else {
                Err(EvalError::Arity {
                    function: name.to_string(),
                    expected,
                    found: args.len(),
                })
            }
        };
        let num = |i: usize| args[i].as_number();
        let point = |i: usize| args[i].as_point();

        let value = match name {
            // ── <cmath> ──
            "std::max" => {
                arity(2)?;
                cpp_max(num(0)?, num(1)?)
            }
            "std::min" => {
                arity(2)?;
                cpp_min(num(0)?, num(1)?)
            }
            "std::pow" => {
                arity(2)?;
                num(0)?.powf(num(1)?)
            }
            "std::abs" | "std::cos" | "std::sin" | "std::tan" | "std::acos" | "std::asin"
            | "std::atan" | "std::floor" | "std::exp" | "std::sqrt" => {
                arity(1)?;
                let x = num(0)?;
                match name {
                    "std::abs" => x.abs(),
                    "std::cos" => x.cos(),
                    "std::sin" => x.sin(),
                    "std::tan" => x.tan(),
                    "std::acos" => x.acos(),
                    "std::asin" => x.asin(),
                    "std::atan" => x.atan(),
                    "std::floor" => x.floor(),
                    "std::exp" => x.exp(),
                    _ => x.sqrt(),
                }
            }
            "std::numeric_limits<double>::quiet_NaN" => {
                arity(0)?;
                f64::NAN
            }
            "std::numeric_limits<double>::infinity" => {
                arity(0)?;
                f64::INFINITY
            }

            // ── noise library helpers ──
            "bias" => {
                arity(2)?;
                math::bias(num(0)?, num(1)?)
            }
            "gain" => {
                arity(2)?;
                math::gain(num(0)?, num(1)?)
            }
            "quintic_blend" => {
                arity(1)?;
                math::quintic_blend(num(0)?)
            }

            // ── skeleton functions ──
            "SmoothTiers" => {
                arity(2)?;
                math::smooth_tiers(num(0)?, to_int(num(1)?))
            }
            "Select_Blend" => {
                arity(5)?;
                math::select_blend(num(0)?, num(1)?, num(2)?, num(3)?, num(4)?)
            }
            "Point" => {
                return match args.len() {
                    1 => Ok(Value::Point(point(0)?)),
                    6 => Ok(Value::Point(Point::new(
                        num(0)?,
                        num(1)?,
                        num(2)?,
                        num(3)?,
                        num(4)?,
                        num(5)?,
                    ))),
                    found => Err(EvalError::Arity {
                        function: name.to_string(),
                        expected: 6,
                        found,
                    }),
                };
            }
            "RotateDomain" => {
                arity(5)?;
                let rotated = point(0)?.rotate(num(1)?, num(2)?, num(3)?, num(4)?);
                return Ok(Value::Point(rotated));
            }
            "ValueBasis" => {
                arity(3)?;
                self.basis
                    .value(&point(0)?, to_int(num(1)?), to_uint(num(2)?))
            }
            "GradientBasis" => {
                arity(3)?;
                self.basis
                    .gradient(&point(0)?, to_int(num(1)?), to_uint(num(2)?))
            }
            "SimplexBasis" => {
                arity(2)?;
                self.basis.simplex(&point(0)?, to_uint(num(1)?))
            }
            "CellularBasis" => {
                arity(11)?;
                let f = [num(2)?, num(3)?, num(4)?, num(5)?];
                let d = [num(6)?, num(7)?, num(8)?, num(9)?];
                self.basis
                    .cellular(&point(0)?, to_uint(num(1)?), f, d, to_uint(num(10)?))
            }
            "HexTile" => {
                arity(2)?;
                self.basis.hex_tile(&point(0)?, to_uint(num(1)?))
            }
            "HexBump" => {
                arity(1)?;
                self.basis.hex_bump(&point(0)?)
            }
            _ => return Err(EvalError::UnknownFunction(name.to_string())),
        };
        Ok(Value::Number(value))
    }
}

// ── Point members ────────────────────────────────────────────────────────────

fn point_field(p: &Point, field: &str) -> EvalResult<Value> {
    let axis = Axis::ALL
        .into_iter()
        .find(|a| a.field() == field)
        .ok_or_else(|| EvalError::UndefinedVariable(format!("Point::{field}")))?;
    Ok(Value::Number(p.get(axis)))
}

fn call_method(receiver: Value, method: &str, args: &[Value]) -> EvalResult<Value> {
    if let Value::Array(name) = &receiver {
        return match (method, args.len()) {
            ("data", 0) => Ok(Value::Array(name.clone())),
            _ => Err(EvalError::UnknownFunction(format!("array::{method}"))),
        };
    }
    let p = receiver.as_point()?;
    if method == "Length" {
        return Ok(Value::Number(p.length()));
    }
    let [arg] = args else {
        return Err(EvalError::Arity {
            function: format!("Point::{method}"),
            expected: 1,
            found: args.len(),
        });
    };
    let d = arg.as_number()?;
    let axis_for = |suffix: &str| Axis::ALL.into_iter().find(|a| a.suffix() == suffix);
    let scaled = method.strip_prefix("Scale").and_then(axis_for);
    let translated = method.strip_prefix("Translate").and_then(axis_for);
    let result = match (method, scaled, translated) {
        ("Scale", _, _) => p.scale(d),
        ("Translate", _, _) => p.translate(d),
        (_, Some(axis), _) => p.scale_axis(axis, d),
        (_, _, Some(axis)) => p.translate_axis(axis, d),
        _ => return Err(EvalError::UnknownFunction(format!("Point::{method}"))),
    };
    Ok(Value::Point(result))
}

fn binary(l: &Value, op: BinOp, r: &Value) -> EvalResult<Value> {
    if let (Value::Point(a), BinOp::Add, Value::Point(b)) = (l, op, r) {
        return Ok(Value::Point(*a + *b));
    }
    let a = l.as_number()?;
    let b = r.as_number()?;
    Ok(match op {
        BinOp::Add => Value::Number(a + b),
        BinOp::Sub => Value::Number(a - b),
        BinOp::Mul => Value::Number(a * b),
        BinOp::Div => Value::Number(a / b),
        BinOp::Lt => Value::Bool(a < b),
        BinOp::Gt => Value::Bool(a > b),
        BinOp::Le => Value::Bool(a <= b),
        BinOp::Ge => Value::Bool(a >= b),
        BinOp::Eq => Value::Bool(a == b),
        BinOp::Ne => Value::Bool(a != b),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::basis::AnalyticBasis;

    #[test]
    fn test_point_methods() {
        let p = Value::Point(Point::new_2d(1.0, 2.0));
        let scaled = call_method(p.clone(), "ScaleY", &[Value::Number(3.0)]).unwrap();
        assert_eq!(scaled.as_point().unwrap().y, 6.0);
        let moved = call_method(p.clone(), "Translate", &[Value::Number(1.0)]).unwrap();
        assert_eq!(moved.as_point().unwrap().x, 2.0);
        assert!(call_method(p, "ScaleQ", &[Value::Number(1.0)]).is_err());
    }

    #[test]
    fn test_point_addition() {
        let sum = binary(
            &Value::Point(Point::new_2d(1.0, 1.0)),
            BinOp::Add,
            &Value::Point(Point::offset(Axis::X, 0.5)),
        )
        .unwrap();
        assert_eq!(sum.as_point().unwrap().x, 1.5);
    }

    #[test]
    fn test_unknown_builtin() {
        let mut interp = Interpreter::new(&AnalyticBasis);
        assert_eq!(
            interp.call_builtin("std::lgamma", &[Value::Number(1.0)]),
            Err(EvalError::UnknownFunction("std::lgamma".into()))
        );
    }

    #[test]
    fn test_builtin_arity() {
        let mut interp = Interpreter::new(&AnalyticBasis);
        assert!(matches!(
            interp.call_builtin("std::pow", &[Value::Number(1.0)]),
            Err(EvalError::Arity { expected: 2, found: 1, .. })
        ));
    }
}
