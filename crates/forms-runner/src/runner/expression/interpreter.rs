use std::borrow::Cow;
use std::time::Instant;

use serde_json::{Number, Value};

use super::parser::{BinaryOp, Expr, LogicalOp, UnaryOp};
use super::{is_truthy, EvalError};

const ROOT_IDENTIFIER: &str = "data";
const DEADLINE_CHECK_INTERVAL: u64 = 32;

/// Tree-walking evaluator over a single `data` root. Every node visit costs one step.
pub(crate) struct Interpreter<'a> {
    context: &'a Value,
    expression: &'a str,
    deadline: Instant,
    max_steps: u64,
    steps: u64,
}

impl<'a> Interpreter<'a> {
    pub(crate) fn new(
        context: &'a Value,
        expression: &'a str,
        deadline: Instant,
        max_steps: u64,
    ) -> Self {
        Self {
            context,
            expression,
            deadline,
            max_steps,
            steps: 0,
        }
    }

    fn tick(&mut self) -> Result<(), EvalError> {
        self.steps += 1;
        let over_budget = self.steps > self.max_steps;
        let past_deadline =
            self.steps % DEADLINE_CHECK_INTERVAL == 1 && Instant::now() >= self.deadline;
        if over_budget || past_deadline {
            return Err(EvalError::Timeout {
                expression: self.expression.to_string(),
            });
        }
        Ok(())
    }

    pub(crate) fn eval(&mut self, expr: &Expr) -> Result<Cow<'a, Value>, EvalError> {
        self.tick()?;
        match expr {
            Expr::Literal(value) => Ok(Cow::Owned(value.clone())),
            Expr::Identifier(name) if name == ROOT_IDENTIFIER => Ok(Cow::Borrowed(self.context)),
            Expr::Identifier(name) => Err(EvalError::UnknownIdentifier(name.clone())),
            Expr::Array(items) => {
                let mut values = Vec::with_capacity(items.len());
                for item in items {
                    values.push(self.eval(item)?.into_owned());
                }
                Ok(Cow::Owned(Value::Array(values)))
            }
            Expr::Member { object, property } => {
                let object = self.eval(object)?;
                Ok(member(object, property))
            }
            Expr::Index { object, index } => {
                let object = self.eval(object)?;
                let key = self.eval(index)?;
                Ok(match property_key(&key) {
                    Some(key) => member(object, &key),
                    None => Cow::Owned(Value::Null),
                })
            }
            Expr::Call {
                receiver,
                method,
                args,
            } => {
                let receiver = self.eval(receiver)?;
                let mut values = Vec::with_capacity(args.len());
                for arg in args {
                    values.push(self.eval(arg)?.into_owned());
                }
                call_method(&receiver, method, &values).map(Cow::Owned)
            }
            Expr::Unary { op, operand } => {
                let value = self.eval(operand)?;
                Ok(Cow::Owned(match op {
                    UnaryOp::Not => Value::Bool(!is_truthy(&value)),
                    UnaryOp::Negate => number(-to_number(&value)),
                    UnaryOp::Plus => number(to_number(&value)),
                }))
            }
            Expr::Binary { op, left, right } => {
                let left = self.eval(left)?;
                let right = self.eval(right)?;
                Ok(Cow::Owned(binary(*op, &left, &right)))
            }
            Expr::Logical { op, left, right } => {
                let left = self.eval(left)?;
                let short_circuit = match op {
                    LogicalOp::And => !is_truthy(&left),
                    LogicalOp::Or => is_truthy(&left),
                };
                if short_circuit {
                    Ok(left)
                } else {
                    self.eval(right)
                }
            }
            Expr::Conditional {
                test,
                consequent,
                alternate,
            } => {
                let test = self.eval(test)?;
                if is_truthy(&test) {
                    self.eval(consequent)
                } else {
                    self.eval(alternate)
                }
            }
        }
    }
}

fn member<'a>(value: Cow<'a, Value>, property: &str) -> Cow<'a, Value> {
    if property == "length" {
        if let Some(length) = length_of(&value) {
            return Cow::Owned(number(length as f64));
        }
    }
    match value {
        Cow::Borrowed(Value::Object(map)) => map
            .get(property)
            .map(Cow::Borrowed)
            .unwrap_or(Cow::Owned(Value::Null)),
        Cow::Borrowed(Value::Array(items)) => array_index(property)
            .and_then(|idx| items.get(idx))
            .map(Cow::Borrowed)
            .unwrap_or(Cow::Owned(Value::Null)),
        Cow::Owned(Value::Object(mut map)) => {
            Cow::Owned(map.remove(property).unwrap_or(Value::Null))
        }
        Cow::Owned(Value::Array(mut items)) => Cow::Owned(
            array_index(property)
                .filter(|idx| *idx < items.len())
                .map(|idx| items.swap_remove(idx))
                .unwrap_or(Value::Null),
        ),
        other => Cow::Owned(
            match (&*other, array_index(property)) {
                (Value::String(text), Some(idx)) => text
                    .chars()
                    .nth(idx)
                    .map(|ch| Value::String(ch.to_string()))
                    .unwrap_or(Value::Null),
                _ => Value::Null,
            },
        ),
    }
}

fn length_of(value: &Value) -> Option<usize> {
    match value {
        Value::String(text) => Some(text.chars().count()),
        Value::Array(items) => Some(items.len()),
        _ => None,
    }
}

fn array_index(property: &str) -> Option<usize> {
    if property.is_empty() || !property.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    property.parse().ok()
}

fn property_key(key: &Value) -> Option<String> {
    match key {
        Value::String(text) => Some(text.clone()),
        Value::Number(_) | Value::Bool(_) => Some(to_display_string(key)),
        _ => None,
    }
}

fn call_method(receiver: &Value, method: &str, args: &[Value]) -> Result<Value, EvalError> {
    let first = args.first().unwrap_or(&Value::Null);
    let needle = to_display_string(first);
    match (receiver, method) {
        (Value::String(text), "includes") => Ok(Value::Bool(text.contains(needle.as_str()))),
        (Value::String(text), "startsWith") => Ok(Value::Bool(text.starts_with(needle.as_str()))),
        (Value::String(text), "endsWith") => Ok(Value::Bool(text.ends_with(needle.as_str()))),
        (Value::String(text), "trim") => Ok(Value::String(text.trim().to_string())),
        (Value::String(text), "toLowerCase") => Ok(Value::String(text.to_lowercase())),
        (Value::String(text), "toUpperCase") => Ok(Value::String(text.to_uppercase())),
        (Value::Array(items), "includes") => {
            Ok(Value::Bool(items.iter().any(|item| strict_equals(item, first))))
        }
        (_, "includes" | "startsWith" | "endsWith" | "trim" | "toLowerCase" | "toUpperCase") => {
            Ok(Value::Null)
        }
        (_, other) => Err(EvalError::UnsupportedMethod(other.to_string())),
    }
}

fn binary(op: BinaryOp, left: &Value, right: &Value) -> Value {
    match op {
        BinaryOp::Add => add(left, right),
        BinaryOp::Subtract => number(to_number(left) - to_number(right)),
        BinaryOp::Multiply => number(to_number(left) * to_number(right)),
        BinaryOp::Divide => number(to_number(left) / to_number(right)),
        BinaryOp::Remainder => number(to_number(left) % to_number(right)),
        BinaryOp::Less => Value::Bool(compare(left, right, |ord| ord.is_lt())),
        BinaryOp::LessEqual => Value::Bool(compare(left, right, |ord| ord.is_le())),
        BinaryOp::Greater => Value::Bool(compare(left, right, |ord| ord.is_gt())),
        BinaryOp::GreaterEqual => Value::Bool(compare(left, right, |ord| ord.is_ge())),
        BinaryOp::LooseEqual => Value::Bool(loose_equals(left, right)),
        BinaryOp::LooseNotEqual => Value::Bool(!loose_equals(left, right)),
        BinaryOp::StrictEqual => Value::Bool(strict_equals(left, right)),
        BinaryOp::StrictNotEqual => Value::Bool(!strict_equals(left, right)),
    }
}

fn add(left: &Value, right: &Value) -> Value {
    let concatenates =
        |value: &Value| matches!(value, Value::String(_) | Value::Array(_) | Value::Object(_));
    if concatenates(left) || concatenates(right) {
        Value::String(format!("{}{}", to_display_string(left), to_display_string(right)))
    } else {
        number(to_number(left) + to_number(right))
    }
}

fn compare(left: &Value, right: &Value, accept: impl Fn(std::cmp::Ordering) -> bool) -> bool {
    if let (Value::String(a), Value::String(b)) = (left, right) {
        return accept(a.cmp(b));
    }
    to_number(left)
        .partial_cmp(&to_number(right))
        .map(accept)
        .unwrap_or(false)
}

fn strict_equals(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => a.as_f64() == b.as_f64(),
        _ => left == right,
    }
}

fn loose_equals(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Null, Value::Null) => true,
        (Value::Null, _) | (_, Value::Null) => false,
        (Value::String(_), Value::String(_)) => left == right,
        (
            Value::Number(_) | Value::String(_) | Value::Bool(_),
            Value::Number(_) | Value::String(_) | Value::Bool(_),
        ) => to_number(left) == to_number(right),
        _ => strict_equals(left, right),
    }
}

pub(crate) fn to_number(value: &Value) -> f64 {
    match value {
        Value::Null => 0.0,
        Value::Bool(flag) => f64::from(u8::from(*flag)),
        Value::Number(number) => number.as_f64().unwrap_or(f64::NAN),
        Value::String(text) => {
            let trimmed = text.trim();
            if trimmed.is_empty() {
                0.0
            } else {
                trimmed.parse().unwrap_or(f64::NAN)
            }
        }
        Value::Array(_) | Value::Object(_) => f64::NAN,
    }
}

pub(crate) fn to_display_string(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(flag) => flag.to_string(),
        Value::Number(number) => match (number.as_i64(), number.as_f64()) {
            (Some(int), _) => int.to_string(),
            (None, Some(float)) if float.fract() == 0.0 && float.abs() < 1e15 => {
                format!("{}", float as i64)
            }
            _ => number.to_string(),
        },
        Value::String(text) => text.clone(),
        Value::Array(items) => items.iter().map(to_display_string).collect::<Vec<_>>().join(","),
        Value::Object(_) => "[object Object]".to_string(),
    }
}

/// Integral results stay integers so they compare equal to authored JSON numbers.
/// Non-finite results have no JSON form and collapse to null.
pub(crate) fn number(value: f64) -> Value {
    if !value.is_finite() {
        return Value::Null;
    }
    if value.fract() == 0.0 && value.abs() < 9.0e15 {
        return Value::Number(Number::from(value as i64));
    }
    Number::from_f64(value).map(Value::Number).unwrap_or(Value::Null)
}
