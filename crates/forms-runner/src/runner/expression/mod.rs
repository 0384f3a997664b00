//! Sandboxed evaluation of author-supplied expressions.
//!
//! Expressions see exactly one root, `data`, bound to the flattened answers of
//! the application. Nothing else is reachable: there are no globals, no function
//! calls beyond a fixed set of string/array methods, and every evaluation is
//! bounded by a wall-clock deadline and a step budget.

mod interpreter;
mod lexer;
mod parser;

use std::sync::OnceLock;
use std::time::{Duration, Instant};

use regex::Regex;
use serde_json::Value;
use thiserror::Error;

use crate::config::EngineConfig;

use interpreter::Interpreter;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EvalError {
    #[error("Unsafe keywords detected in expression")]
    UnsafeExpression,
    #[error("invalid expression `{expression}`: {message}")]
    Syntax { expression: String, message: String },
    #[error("expression `{expression}` exceeded its evaluation budget")]
    Timeout { expression: String },
    #[error("unknown identifier `{0}` in expression")]
    UnknownIdentifier(String),
    #[error("unsupported method `{0}` in expression")]
    UnsupportedMethod(String),
}

/// Evaluates expressions against a JSON context.
pub trait ExpressionEvaluator: Send + Sync {
    /// Result of the expression exactly as computed.
    fn evaluate_raw(&self, expression: &str, context: &Value) -> Result<Value, EvalError>;

    /// Result of the expression, or `default` (null when absent) if the result is falsy.
    fn evaluate(
        &self,
        expression: &str,
        context: &Value,
        default: Option<Value>,
    ) -> Result<Value, EvalError> {
        let value = self.evaluate_raw(expression, context)?;
        if is_truthy(&value) {
            Ok(value)
        } else {
            Ok(default.unwrap_or(Value::Null))
        }
    }

    fn is_satisfied(&self, expression: &str, context: &Value) -> Result<bool, EvalError> {
        self.evaluate_raw(expression, context)
            .map(|value| is_truthy(&value))
    }
}

/// Truthiness of a JSON value: null, false, 0, NaN and "" are falsy.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(number) => number.as_f64().map(|n| n != 0.0 && !n.is_nan()).unwrap_or(false),
        Value::String(text) => !text.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn unsafe_keywords() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| {
            Regex::new(
                r"\b(eval|require|process|global|globalThis|window|import|function|prototype|module|constructor|__proto__)\b",
            )
            .ok()
        })
        .as_ref()
}

/// An expression is treated as unsafe if the screen itself is unavailable.
pub fn contains_unsafe_keywords(expression: &str) -> bool {
    unsafe_keywords().map_or(true, |pattern| pattern.is_match(expression))
}

#[derive(Debug, Clone)]
pub struct SandboxedEvaluator {
    timeout: Duration,
    max_steps: u64,
}

impl SandboxedEvaluator {
    pub fn new(timeout: Duration, max_steps: u64) -> Self {
        Self { timeout, max_steps }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(config.expression_timeout, config.max_expression_steps)
    }
}

impl Default for SandboxedEvaluator {
    fn default() -> Self {
        Self::from_config(&EngineConfig::default())
    }
}

impl ExpressionEvaluator for SandboxedEvaluator {
    fn evaluate_raw(&self, expression: &str, context: &Value) -> Result<Value, EvalError> {
        if contains_unsafe_keywords(expression) {
            tracing::warn!(expression, "rejected expression containing unsafe keywords");
            return Err(EvalError::UnsafeExpression);
        }
        let started = Instant::now();
        let ast = parser::parse(expression)?;
        let deadline = started + self.timeout;
        let mut interpreter = Interpreter::new(context, expression, deadline, self.max_steps);
        let value = interpreter.eval(&ast)?.into_owned();
        tracing::trace!(
            expression,
            elapsed_us = started.elapsed().as_micros() as u64,
            "evaluated expression"
        );
        Ok(value)
    }
}
