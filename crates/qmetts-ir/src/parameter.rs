//! Parameter expressions for parameterized circuits.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use std::fmt;

use crate::error::{IrError, IrResult};

/// Concrete values for the symbols of a circuit, keyed by symbol name.
pub type ParameterValues = FxHashMap<String, f64>;

/// Zip parameter names with values into a [`ParameterValues`] map.
///
/// Extra names or values are ignored; callers check lengths first.
pub fn bind_values(names: &[String], values: &[f64]) -> ParameterValues {
    names
        .iter()
        .cloned()
        .zip(values.iter().copied())
        .collect()
}

/// A symbolic or concrete parameter expression.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ParameterExpression {
    /// A constant numeric value.
    Constant(f64),
    /// A symbolic parameter.
    Symbol(String),
    /// The constant π.
    Pi,
    /// Negation.
    Neg(Box<ParameterExpression>),
    /// Addition.
    Add(Box<ParameterExpression>, Box<ParameterExpression>),
    /// Subtraction.
    Sub(Box<ParameterExpression>, Box<ParameterExpression>),
    /// Multiplication.
    Mul(Box<ParameterExpression>, Box<ParameterExpression>),
    /// Division.
    Div(Box<ParameterExpression>, Box<ParameterExpression>),
}

impl ParameterExpression {
    /// Create a constant parameter.
    pub fn constant(value: f64) -> Self {
        ParameterExpression::Constant(value)
    }

    /// Create a symbolic parameter.
    pub fn symbol(name: impl Into<String>) -> Self {
        ParameterExpression::Symbol(name.into())
    }

    /// Create a π constant.
    pub fn pi() -> Self {
        ParameterExpression::Pi
    }

    /// Check if this expression contains any symbols.
    pub fn is_symbolic(&self) -> bool {
        match self {
            ParameterExpression::Symbol(_) => true,
            ParameterExpression::Constant(_) | ParameterExpression::Pi => false,
            ParameterExpression::Neg(e) => e.is_symbolic(),
            ParameterExpression::Add(a, b)
            | ParameterExpression::Sub(a, b)
            | ParameterExpression::Mul(a, b)
            | ParameterExpression::Div(a, b) => a.is_symbolic() || b.is_symbolic(),
        }
    }

    /// Try to evaluate as a concrete f64 value.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ParameterExpression::Constant(v) => Some(*v),
            ParameterExpression::Symbol(_) => None,
            ParameterExpression::Pi => Some(PI),
            ParameterExpression::Neg(e) => e.as_f64().map(|v| -v),
            ParameterExpression::Add(a, b) => Some(a.as_f64()? + b.as_f64()?),
            ParameterExpression::Sub(a, b) => Some(a.as_f64()? - b.as_f64()?),
            ParameterExpression::Mul(a, b) => Some(a.as_f64()? * b.as_f64()?),
            ParameterExpression::Div(a, b) => {
                let divisor = b.as_f64()?;
                if divisor == 0.0 {
                    return None;
                }
                Some(a.as_f64()? / divisor)
            }
        }
    }

    /// Evaluate the expression with every symbol looked up in `values`.
    pub fn evaluate(&self, values: &ParameterValues) -> IrResult<f64> {
        let value = self.eval_inner(values)?;
        if value.is_finite() {
            Ok(value)
        } else {
            Err(IrError::NonFiniteParameter(self.to_string()))
        }
    }

    fn eval_inner(&self, values: &ParameterValues) -> IrResult<f64> {
        Ok(match self {
            ParameterExpression::Constant(v) => *v,
            ParameterExpression::Symbol(name) => *values
                .get(name)
                .ok_or_else(|| IrError::UnboundParameter(name.clone()))?,
            ParameterExpression::Pi => PI,
            ParameterExpression::Neg(e) => -e.eval_inner(values)?,
            ParameterExpression::Add(a, b) => a.eval_inner(values)? + b.eval_inner(values)?,
            ParameterExpression::Sub(a, b) => a.eval_inner(values)? - b.eval_inner(values)?,
            ParameterExpression::Mul(a, b) => a.eval_inner(values)? * b.eval_inner(values)?,
            ParameterExpression::Div(a, b) => a.eval_inner(values)? / b.eval_inner(values)?,
        })
    }

    /// Symbol names in this expression, in order of first appearance.
    pub fn symbols(&self) -> Vec<String> {
        let mut out = Vec::new();
        self.collect_symbols(&mut out);
        out
    }

    pub(crate) fn collect_symbols(&self, out: &mut Vec<String>) {
        match self {
            ParameterExpression::Constant(_) | ParameterExpression::Pi => {}
            ParameterExpression::Symbol(name) => {
                if !out.contains(name) {
                    out.push(name.clone());
                }
            }
            ParameterExpression::Neg(e) => e.collect_symbols(out),
            ParameterExpression::Add(a, b)
            | ParameterExpression::Sub(a, b)
            | ParameterExpression::Mul(a, b)
            | ParameterExpression::Div(a, b) => {
                a.collect_symbols(out);
                b.collect_symbols(out);
            }
        }
    }

    /// Bind a symbol to a value, returning a new expression.
    pub fn bind(&self, name: &str, value: f64) -> Self {
        self.map_symbols(&|n: &str| (n == name).then_some(ParameterExpression::Constant(value)))
    }

    /// Rename every occurrence of the symbol `from` to `to`.
    pub fn rename(&self, from: &str, to: &str) -> Self {
        self.map_symbols(&|n: &str| (n == from).then(|| ParameterExpression::Symbol(to.to_string())))
    }

    fn map_symbols(&self, f: &dyn Fn(&str) -> Option<ParameterExpression>) -> Self {
        match self {
            ParameterExpression::Symbol(n) => f(n).unwrap_or_else(|| self.clone()),
            ParameterExpression::Constant(_) | ParameterExpression::Pi => self.clone(),
            ParameterExpression::Neg(e) => ParameterExpression::Neg(Box::new(e.map_symbols(f))),
            ParameterExpression::Add(a, b) => {
                ParameterExpression::Add(Box::new(a.map_symbols(f)), Box::new(b.map_symbols(f)))
            }
            ParameterExpression::Sub(a, b) => {
                ParameterExpression::Sub(Box::new(a.map_symbols(f)), Box::new(b.map_symbols(f)))
            }
            ParameterExpression::Mul(a, b) => {
                ParameterExpression::Mul(Box::new(a.map_symbols(f)), Box::new(b.map_symbols(f)))
            }
            ParameterExpression::Div(a, b) => {
                ParameterExpression::Div(Box::new(a.map_symbols(f)), Box::new(b.map_symbols(f)))
            }
        }
    }

    /// Symbolic partial derivative with respect to `name`, simplified.
    ///
    /// Gate angles are usually a bare symbol, so the common result is a
    /// constant 1 or 0; scaled or shared parameters go through the chain rule.
    pub fn derivative(&self, name: &str) -> Self {
        self.diff(name).simplify()
    }

    fn diff(&self, name: &str) -> Self {
        use ParameterExpression as P;
        match self {
            P::Constant(_) | P::Pi => P::Constant(0.0),
            P::Symbol(n) => P::Constant(if n == name { 1.0 } else { 0.0 }),
            P::Neg(e) => P::Neg(Box::new(e.diff(name))),
            P::Add(a, b) => P::Add(Box::new(a.diff(name)), Box::new(b.diff(name))),
            P::Sub(a, b) => P::Sub(Box::new(a.diff(name)), Box::new(b.diff(name))),
            P::Mul(a, b) => P::Add(
                Box::new(P::Mul(Box::new(a.diff(name)), b.clone())),
                Box::new(P::Mul(a.clone(), Box::new(b.diff(name)))),
            ),
            P::Div(a, b) => P::Div(
                Box::new(P::Sub(
                    Box::new(P::Mul(Box::new(a.diff(name)), b.clone())),
                    Box::new(P::Mul(a.clone(), Box::new(b.diff(name)))),
                )),
                Box::new(P::Mul(b.clone(), b.clone())),
            ),
        }
    }

    /// Simplify the expression by evaluating constant subexpressions.
    pub fn simplify(&self) -> Self {
        if let Some(v) = self.as_f64() {
            return ParameterExpression::Constant(v);
        }
        match self {
            ParameterExpression::Neg(e) => {
                let e = e.simplify();
                if let Some(v) = e.as_f64() {
                    ParameterExpression::Constant(-v)
                } else {
                    ParameterExpression::Neg(Box::new(e))
                }
            }
            ParameterExpression::Add(a, b) => {
                let a = a.simplify();
                let b = b.simplify();
                match (a.as_f64(), b.as_f64()) {
                    (Some(av), Some(bv)) => ParameterExpression::Constant(av + bv),
                    (Some(z), _) if z == 0.0 => b,
                    (_, Some(z)) if z == 0.0 => a,
                    _ => ParameterExpression::Add(Box::new(a), Box::new(b)),
                }
            }
            ParameterExpression::Sub(a, b) => {
                let a = a.simplify();
                let b = b.simplify();
                match (a.as_f64(), b.as_f64()) {
                    (Some(av), Some(bv)) => ParameterExpression::Constant(av - bv),
                    (_, Some(z)) if z == 0.0 => a,
                    _ => ParameterExpression::Sub(Box::new(a), Box::new(b)),
                }
            }
            ParameterExpression::Mul(a, b) => {
                let a = a.simplify();
                let b = b.simplify();
                match (a.as_f64(), b.as_f64()) {
                    (Some(av), Some(bv)) => ParameterExpression::Constant(av * bv),
                    (Some(z), _) | (_, Some(z)) if z == 0.0 => ParameterExpression::Constant(0.0),
                    (Some(o), _) if o == 1.0 => b,
                    (_, Some(o)) if o == 1.0 => a,
                    _ => ParameterExpression::Mul(Box::new(a), Box::new(b)),
                }
            }
            ParameterExpression::Div(a, b) => {
                let a = a.simplify();
                let b = b.simplify();
                match (a.as_f64(), b.as_f64()) {
                    (Some(av), Some(bv)) if bv != 0.0 => {
                        ParameterExpression::Constant(av / bv)
                    }
                    _ => ParameterExpression::Div(Box::new(a), Box::new(b)),
                }
            }
            _ => self.clone(),
        }
    }
}

impl fmt::Display for ParameterExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParameterExpression::Constant(v) => write!(f, "{v}"),
            ParameterExpression::Symbol(name) => write!(f, "{name}"),
            ParameterExpression::Pi => write!(f, "π"),
            ParameterExpression::Neg(e) => write!(f, "-({e})"),
            ParameterExpression::Add(a, b) => write!(f, "({a} + {b})"),
            ParameterExpression::Sub(a, b) => write!(f, "({a} - {b})"),
            ParameterExpression::Mul(a, b) => write!(f, "({a} * {b})"),
            ParameterExpression::Div(a, b) => write!(f, "({a} / {b})"),
        }
    }
}

impl From<f64> for ParameterExpression {
    fn from(value: f64) -> Self {
        ParameterExpression::Constant(value)
    }
}

impl From<&str> for ParameterExpression {
    fn from(name: &str) -> Self {
        ParameterExpression::Symbol(name.to_string())
    }
}

impl std::ops::Add for ParameterExpression {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        ParameterExpression::Add(Box::new(self), Box::new(rhs))
    }
}

impl std::ops::Sub for ParameterExpression {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        ParameterExpression::Sub(Box::new(self), Box::new(rhs))
    }
}

impl std::ops::Mul for ParameterExpression {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self::Output {
        ParameterExpression::Mul(Box::new(self), Box::new(rhs))
    }
}

impl std::ops::Div for ParameterExpression {
    type Output = Self;

    fn div(self, rhs: Self) -> Self::Output {
        ParameterExpression::Div(Box::new(self), Box::new(rhs))
    }
}

impl std::ops::Neg for ParameterExpression {
    type Output = Self;

    fn neg(self) -> Self::Output {
        ParameterExpression::Neg(Box::new(self))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constant() {
        let p = ParameterExpression::constant(1.5);
        assert!(!p.is_symbolic());
        assert_eq!(p.as_f64(), Some(1.5));
    }

    #[test]
    fn test_symbol() {
        let p = ParameterExpression::symbol("theta");
        assert!(p.is_symbolic());
        assert_eq!(p.as_f64(), None);
        assert_eq!(p.symbols(), vec!["theta".to_string()]);
    }

    #[test]
    fn test_bind() {
        let p = ParameterExpression::symbol("theta");
        let bound = p.bind("theta", PI / 2.0);
        assert!(!bound.is_symbolic());
        assert!((bound.as_f64().unwrap() - PI / 2.0).abs() < 1e-10);
    }

    #[test]
    fn test_evaluate_with_values() {
        let expr = ParameterExpression::symbol("a") * ParameterExpression::constant(2.0)
            + ParameterExpression::pi();
        let values = bind_values(&["a".to_string()], &[0.25]);
        assert!((expr.evaluate(&values).unwrap() - (0.5 + PI)).abs() < 1e-12);
    }

    #[test]
    fn test_evaluate_unbound() {
        let expr = ParameterExpression::symbol("missing");
        let err = expr.evaluate(&ParameterValues::default()).unwrap_err();
        assert!(matches!(err, IrError::UnboundParameter(name) if name == "missing"));
    }

    #[test]
    fn test_evaluate_division_by_zero() {
        let expr = ParameterExpression::constant(1.0) / ParameterExpression::symbol("z");
        let values = bind_values(&["z".to_string()], &[0.0]);
        assert!(matches!(
            expr.evaluate(&values),
            Err(IrError::NonFiniteParameter(_))
        ));
    }

    #[test]
    fn test_derivative_of_bare_symbol() {
        let p = ParameterExpression::symbol("x_0");
        assert_eq!(p.derivative("x_0").as_f64(), Some(1.0));
        assert_eq!(p.derivative("x_1").as_f64(), Some(0.0));
    }

    #[test]
    fn test_derivative_chain_rule() {
        // d/dx (3x * x) = 6x
        let x = ParameterExpression::symbol("x");
        let expr = ParameterExpression::constant(3.0) * x.clone() * x;
        let d = expr.derivative("x");
        let values = bind_values(&["x".to_string()], &[0.5]);
        assert!((d.evaluate(&values).unwrap() - 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_rename() {
        let expr = ParameterExpression::symbol("x_0") + ParameterExpression::symbol("x_1");
        let renamed = expr.rename("x_0", "y_0");
        assert_eq!(renamed.symbols(), vec!["y_0".to_string(), "x_1".to_string()]);
    }

    #[test]
    fn test_arithmetic() {
        let a = ParameterExpression::constant(2.0);
        let b = ParameterExpression::constant(3.0);

        let sum = (a.clone() + b.clone()).simplify();
        assert_eq!(sum.as_f64(), Some(5.0));

        let prod = (a * b).simplify();
        assert_eq!(prod.as_f64(), Some(6.0));
    }
}
