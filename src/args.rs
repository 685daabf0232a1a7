// SPDX-License-Identifier: Apache-2.0

//! Argument binding for the mysql() call.
//!
//! Takes the host engine's already-parsed function-call node, folds each
//! argument to a literal through the pluggable evaluator, and validates
//! arity, per-position types, and the replace/on-duplicate exclusion.

use sqlparser::ast::{
    Expr, Function, FunctionArg, FunctionArgExpr, FunctionArguments, UnaryOperator, Value,
};

use crate::error::{TableFuncError, TableFuncResult};

/// A constant-folded argument value.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    String(String),
    UInt(u64),
    Int(i64),
    Float(f64),
    Bool(bool),
    Null,
}

impl Literal {
    /// Human-readable type name, used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Literal::String(_) => "a string",
            Literal::UInt(_) => "an unsigned integer",
            Literal::Int(_) => "an integer",
            Literal::Float(_) => "a float",
            Literal::Bool(_) => "a boolean",
            Literal::Null => "NULL",
        }
    }
}

/// Folds one raw argument expression into a literal.
///
/// The host engine plugs its own constant-expression evaluator in here;
/// the `Err` string is the reason the expression could not be folded and
/// ends up in the `ArgumentNotConstant` message.
pub trait LiteralEvaluator: Send + Sync {
    fn evaluate_as_literal(&self, expr: &Expr) -> Result<Literal, String>;
}

/// Default syntactic folder.
///
/// Handles plain literals, negated numeric literals, parenthesised
/// expressions, and bare identifiers (an unquoted identifier argument is
/// taken as its string value, so `mysql(host, db, tbl, ...)` works without
/// quoting). Anything requiring actual evaluation is rejected.
pub struct ConstantFolder;

impl LiteralEvaluator for ConstantFolder {
    fn evaluate_as_literal(&self, expr: &Expr) -> Result<Literal, String> {
        match expr {
            Expr::Value(v) => literal_from_value(&v.value),
            Expr::Identifier(ident) => Ok(Literal::String(ident.value.clone())),
            Expr::Nested(inner) => self.evaluate_as_literal(inner),
            Expr::UnaryOp {
                op: UnaryOperator::Minus,
                expr: inner,
            } => match self.evaluate_as_literal(inner)? {
                Literal::UInt(v) if v <= i64::MAX as u64 => Ok(Literal::Int(-(v as i64))),
                Literal::Int(v) => Ok(Literal::Int(-v)),
                Literal::Float(v) => Ok(Literal::Float(-v)),
                other => Err(format!("cannot negate {}", other.type_name())),
            },
            Expr::UnaryOp {
                op: UnaryOperator::Plus,
                expr: inner,
            } => self.evaluate_as_literal(inner),
            other => Err(format!("'{other}' does not fold to a literal")),
        }
    }
}

fn literal_from_value(value: &Value) -> Result<Literal, String> {
    match value {
        Value::SingleQuotedString(s) | Value::DoubleQuotedString(s) => {
            Ok(Literal::String(s.clone()))
        }
        Value::Number(text, _) => {
            if let Ok(v) = text.parse::<u64>() {
                Ok(Literal::UInt(v))
            } else if let Ok(v) = text.parse::<i64>() {
                Ok(Literal::Int(v))
            } else if let Ok(v) = text.parse::<f64>() {
                Ok(Literal::Float(v))
            } else {
                Err(format!("unparseable numeric literal '{text}'"))
            }
        }
        Value::Boolean(b) => Ok(Literal::Bool(*b)),
        Value::Null => Ok(Literal::Null),
        other => Err(format!("unsupported literal '{other}'")),
    }
}

/// Validated, typed arguments of one mysql() call.
#[derive(Debug, Clone)]
pub struct TableFuncArgs {
    pub host_spec: String,
    pub database: String,
    pub table: String,
    pub user: String,
    pub password: String,
    pub replace_query: bool,
    pub on_duplicate_clause: String,
}

/// Unwraps a parsed `mysql(...)` call node into its plain argument
/// expressions.
///
/// Named arguments, wildcards, DISTINCT, and trailing clauses have no
/// meaning for a table function and are rejected.
pub fn extract_call_arguments(func: &Function) -> TableFuncResult<Vec<Expr>> {
    let list = match &func.args {
        FunctionArguments::List(list) => list,
        FunctionArguments::None => return Err(TableFuncError::arity(0)),
        FunctionArguments::Subquery(_) => {
            return Err(TableFuncError::invalid_argument(
                1,
                "a literal argument list",
                "a subquery",
            ))
        }
    };

    if list.duplicate_treatment.is_some() || !list.clauses.is_empty() {
        return Err(TableFuncError::invalid_argument(
            1,
            "a plain argument list",
            "a list with set quantifiers or clauses",
        ));
    }

    let mut exprs = Vec::with_capacity(list.args.len());
    for (idx, arg) in list.args.iter().enumerate() {
        match arg {
            FunctionArg::Unnamed(FunctionArgExpr::Expr(expr)) => exprs.push(expr.clone()),
            FunctionArg::Unnamed(_) => {
                return Err(TableFuncError::invalid_argument(
                    idx + 1,
                    "a plain expression",
                    "a wildcard",
                ))
            }
            _ => {
                return Err(TableFuncError::invalid_argument(
                    idx + 1,
                    "a plain expression",
                    "a named argument",
                ))
            }
        }
    }

    Ok(exprs)
}

/// Binds the mysql() argument list into a validated struct.
///
/// Positions are 1-based in every error:
/// `mysql(host_spec, database, table, user, password[, replace_query]
/// [, on_duplicate_clause])`.
pub fn bind_args(
    exprs: &[Expr],
    evaluator: &dyn LiteralEvaluator,
) -> TableFuncResult<TableFuncArgs> {
    if exprs.len() < 5 || exprs.len() > 7 {
        return Err(TableFuncError::arity(exprs.len()));
    }

    let mut literals = Vec::with_capacity(exprs.len());
    for (idx, expr) in exprs.iter().enumerate() {
        let literal = evaluator
            .evaluate_as_literal(expr)
            .map_err(|detail| TableFuncError::not_constant(idx + 1, detail))?;
        literals.push(literal);
    }

    let host_spec = expect_string(&literals[0], 1)?;
    let database = expect_string(&literals[1], 2)?;
    let table = expect_string(&literals[2], 3)?;
    let user = expect_string(&literals[3], 4)?;
    let password = expect_string(&literals[4], 5)?;

    let replace_query = match literals.get(5) {
        Some(lit) => expect_uint(lit, 6)? > 0,
        None => false,
    };

    let on_duplicate_clause = match literals.get(6) {
        Some(lit) => expect_string(lit, 7)?,
        None => String::new(),
    };

    if replace_query && !on_duplicate_clause.is_empty() {
        return Err(TableFuncError::ConflictingOptions);
    }

    Ok(TableFuncArgs {
        host_spec,
        database,
        table,
        user,
        password,
        replace_query,
        on_duplicate_clause,
    })
}

fn expect_string(literal: &Literal, position: usize) -> TableFuncResult<String> {
    match literal {
        Literal::String(s) => Ok(s.clone()),
        other => Err(TableFuncError::invalid_argument(
            position,
            "a string",
            other.type_name(),
        )),
    }
}

fn expect_uint(literal: &Literal, position: usize) -> TableFuncResult<u64> {
    match literal {
        Literal::UInt(v) => Ok(*v),
        Literal::Int(v) if *v >= 0 => Ok(*v as u64),
        other => Err(TableFuncError::invalid_argument(
            position,
            "an unsigned integer",
            other.type_name(),
        )),
    }
}
