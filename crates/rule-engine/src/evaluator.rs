//! 条件评估器
//!
//! 实现内置关系比较符的评估逻辑。不做隐式类型转换：
//! 数值只与数值比较（整数与浮点数可以混合），字符串只与字符串比较，其余组合视为类型不匹配。

use crate::error::{EvalResult, EvaluationError};
use crate::models::value_type_name;
use crate::operators::Relational;
use serde_json::{Number, Value};
use std::cmp::Ordering;

/// 条件评估器
pub struct ConditionEvaluator;

impl ConditionEvaluator {
    /// 评估关系比较
    ///
    /// # Arguments
    /// * `field_value` - 从记录中取出的属性值
    /// * `operator` - 关系比较符
    /// * `expected_value` - 规则中定义的比较值
    pub fn compare(
        field_value: &Value,
        operator: Relational,
        expected_value: &Value,
    ) -> EvalResult<bool> {
        match operator {
            Relational::Eq => Self::eq(field_value, expected_value),
            Relational::Ne => Self::eq(field_value, expected_value).map(|r| !r),
            Relational::Gt => Self::ordering(field_value, expected_value).map(Ordering::is_gt),
            Relational::Ge => Self::ordering(field_value, expected_value).map(Ordering::is_ge),
            Relational::Lt => Self::ordering(field_value, expected_value).map(Ordering::is_lt),
            Relational::Le => Self::ordering(field_value, expected_value).map(Ordering::is_le),
        }
    }

    /// 相等比较，两侧必须是同一种类型
    fn eq(field: &Value, expected: &Value) -> EvalResult<bool> {
        match (field, expected) {
            (Value::Number(a), Value::Number(b)) => Ok(compare_numbers(a, b).is_eq()),
            (Value::String(a), Value::String(b)) => Ok(a == b),
            (Value::Bool(a), Value::Bool(b)) => Ok(a == b),
            (Value::Null, Value::Null) => Ok(true),
            (Value::Array(_), Value::Array(_)) | (Value::Object(_), Value::Object(_)) => {
                Ok(field == expected)
            }
            _ => Err(mismatch(value_type_name(expected), field)),
        }
    }

    /// 大小比较，支持数值和字符串
    pub(crate) fn ordering(field: &Value, expected: &Value) -> EvalResult<Ordering> {
        match (field, expected) {
            (Value::Number(a), Value::Number(b)) => Ok(compare_numbers(a, b)),
            (Value::String(a), Value::String(b)) => Ok(a.cmp(b)),
            (_, Value::Number(_) | Value::String(_)) => {
                Err(mismatch(value_type_name(expected), field))
            }
            _ => Err(mismatch("number or string", expected)),
        }
    }
}

/// 比较两个 JSON 数值，整数优先精确比较
fn compare_numbers(a: &Number, b: &Number) -> Ordering {
    if let (Some(x), Some(y)) = (a.as_i64(), b.as_i64()) {
        return x.cmp(&y);
    }
    if let (Some(x), Some(y)) = (a.as_u64(), b.as_u64()) {
        return x.cmp(&y);
    }
    match (a.as_f64(), b.as_f64()) {
        (Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
        _ => Ordering::Equal,
    }
}

/// 要求值为数值
pub(crate) fn expect_number(value: &Value) -> EvalResult<&Number> {
    match value {
        Value::Number(n) => Ok(n),
        other => Err(mismatch("number", other)),
    }
}

pub(crate) fn mismatch(expected: &str, actual: &Value) -> EvaluationError {
    EvaluationError::TypeMismatch {
        expected: expected.to_string(),
        actual: value_type_name(actual).to_string(),
    }
}
