//! 规则修改器
//!
//! 把部分、可嵌套的修改描述合并进已有的语法树。修改采用写时复制：
//! 成功时返回新树，失败时原树保持不变，不会出现只改了一半的规则。

use crate::compiler::RuleCompiler;
use crate::error::{Result, RuleError};
use crate::models::{Node, NodeKind};
use crate::operators::Connective;
use crate::validator::RuleValidator;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// 修改描述
///
/// ```json
/// {"operator": "OR", "left": {"value": {"attribute": "age", "comparator": ">", "value": 40}}}
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Modification {
    /// 替换节点类型
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<NodeKind>,
    /// 替换操作数载荷
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    /// 替换逻辑连接词
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operator: Option<Connective>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub left: Option<Box<Modification>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub right: Option<Box<Modification>>,
}

impl Modification {
    /// 从 JSON 值解析，`null` 视为空修改
    pub fn from_value(value: &Value) -> Result<Self> {
        if value.is_null() {
            return Ok(Self::default());
        }
        Self::deserialize(value).map_err(|e| RuleError::InvalidModification(e.to_string()))
    }

    pub fn is_empty(&self) -> bool {
        self.kind.is_none()
            && self.value.is_none()
            && self.operator.is_none()
            && self.left.is_none()
            && self.right.is_none()
    }

    fn touches_operator_fields(&self) -> bool {
        self.operator.is_some() || self.left.is_some() || self.right.is_some()
    }
}

/// 规则修改器
pub struct RuleMutator;

impl RuleMutator {
    /// 应用修改，返回新的语法树
    pub fn apply(node: &Node, modification: &Modification) -> Result<Node> {
        Self::apply_at(node, modification, "root")
    }

    fn apply_at(node: &Node, modification: &Modification, path: &str) -> Result<Node> {
        if modification.is_empty() {
            return Ok(node.clone());
        }

        let target = modification.kind.unwrap_or(node.kind());

        match (node, target) {
            (Node::Operand(condition), NodeKind::Operand) => {
                if modification.touches_operator_fields() {
                    return Err(rejected(path, "操作数节点不接受 'operator'、'left' 或 'right'"));
                }
                match &modification.value {
                    Some(value) => Ok(Node::Operand(Self::replacement(value, path)?)),
                    None => Ok(Node::Operand(condition.clone())),
                }
            }
            (Node::Operand(_), NodeKind::Operator) => Err(rejected(
                path,
                "操作数节点不能改为运算符节点, 修改不会创建子节点",
            )),
            (Node::Operator { .. }, NodeKind::Operand) => {
                if modification.touches_operator_fields() {
                    return Err(rejected(path, "改为操作数节点时不能同时修改 'operator'、'left' 或 'right'"));
                }
                let value = modification
                    .value
                    .as_ref()
                    .ok_or_else(|| rejected(path, "改为操作数节点时必须同时提供 'value'"))?;
                Ok(Node::Operand(Self::replacement(value, path)?))
            }
            (
                Node::Operator {
                    connective,
                    left,
                    right,
                },
                NodeKind::Operator,
            ) => {
                if modification.value.is_some() {
                    return Err(rejected(path, "运算符节点请使用 'operator' 修改逻辑连接词"));
                }

                let connective = modification
                    .operator
                    .clone()
                    .unwrap_or_else(|| connective.clone());
                let left = match &modification.left {
                    Some(child) => Self::apply_at(left, child, &format!("{}.left", path))?,
                    None => (**left).clone(),
                };
                let right = match &modification.right {
                    Some(child) => Self::apply_at(right, child, &format!("{}.right", path))?,
                    None => (**right).clone(),
                };

                Ok(Node::operator(connective, left, right))
            }
        }
    }

    /// 校验并构建替换用的操作数载荷
    fn replacement(value: &Value, path: &str) -> Result<crate::models::Condition> {
        RuleValidator::validate_condition(value, path).map_err(|e| match e {
            RuleError::InvalidRuleFormat(reason) => RuleError::InvalidModification(reason),
            other => other,
        })?;
        RuleCompiler::build_condition(value, path)
    }
}

fn rejected(path: &str, reason: &str) -> RuleError {
    RuleError::InvalidModification(format!("{}: {}", path, reason))
}
