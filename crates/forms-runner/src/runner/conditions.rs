use serde_json::Value;

use super::domain::{Condition, Page};
use super::error::RunnerError;
use super::expression::ExpressionEvaluator;

/// First condition on the page whose expression is truthy, in authored order.
pub fn first_matching_condition<'p>(
    page: &'p Page,
    context: &Value,
    evaluator: &dyn ExpressionEvaluator,
) -> Result<Option<&'p Condition>, RunnerError> {
    for condition in &page.conditions {
        if evaluator.is_satisfied(&condition.expression, context)? {
            tracing::debug!(
                page_id = %page.page_id,
                condition = %condition.expression,
                "page condition met"
            );
            return Ok(Some(condition));
        }
    }
    Ok(None)
}
