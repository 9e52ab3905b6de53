//! 规则编译器
//!
//! 先用 [`RuleValidator`] 校验整份交换文档，再把它构建成内存中的语法树。
//! 载荷按原样拷贝，不做任何转换。

use crate::error::{Result, RuleError};
use crate::models::{Condition, Node};
use crate::operators::{Comparator, Connective};
use crate::validator::{RuleValidator, comparator_field};
use serde_json::Value;

/// 规则编译器
pub struct RuleCompiler;

impl RuleCompiler {
    /// 从 JSON 字符串编译规则
    pub fn compile_from_json(json: &str) -> Result<Node> {
        let document: Value = serde_json::from_str(json)
            .map_err(|e| RuleError::InvalidRuleFormat(format!("无法解析 JSON: {}", e)))?;
        Self::compile(&document)
    }

    /// 校验并构建规则
    pub fn compile(document: &Value) -> Result<Node> {
        RuleValidator::validate(document)?;
        Self::build(document, "root")
    }

    /// 构建已校验过的文档
    ///
    /// 不会重新校验子节点；未经校验的畸形文档在这里以 `InvalidRuleFormat` 失败。
    pub fn build(document: &Value, path: &str) -> Result<Node> {
        let value = document.get("value").unwrap_or(&Value::Null);

        match document.get("type").and_then(Value::as_str) {
            Some("operator") => {
                let connective = value
                    .as_str()
                    .map(Connective::parse)
                    .ok_or_else(|| malformed(path, "运算符载荷不是字符串"))?;
                let left = Self::build_child(document, "left", path)?;
                let right = Self::build_child(document, "right", path)?;
                Ok(Node::operator(connective, left, right))
            }
            Some("operand") => Ok(Node::Operand(Self::build_condition(value, path)?)),
            _ => Err(malformed(path, "节点类型无效")),
        }
    }

    /// 从操作数载荷构建条件
    pub fn build_condition(value: &Value, path: &str) -> Result<Condition> {
        let payload = value
            .as_object()
            .ok_or_else(|| malformed(path, "操作数载荷不是对象"))?;

        let attribute = payload
            .get("attribute")
            .and_then(Value::as_str)
            .ok_or_else(|| malformed(path, "缺少 attribute"))?;
        let comparator = comparator_field(payload)
            .and_then(Value::as_str)
            .ok_or_else(|| malformed(path, "缺少 comparator"))?;
        let operand = payload.get("value").cloned().unwrap_or(Value::Null);

        Ok(Condition {
            attribute: attribute.to_string(),
            comparator: Comparator::parse(comparator),
            value: operand,
        })
    }

    fn build_child(document: &Value, side: &str, path: &str) -> Result<Node> {
        match document.get(side) {
            Some(child) if !child.is_null() => Self::build(child, &format!("{}.{}", path, side)),
            _ => Err(malformed(path, format!("缺少 {} 子节点", side))),
        }
    }
}

fn malformed(path: &str, reason: impl std::fmt::Display) -> RuleError {
    RuleError::InvalidRuleFormat(format!("{}: 文档未经校验 ({})", path, reason))
}
