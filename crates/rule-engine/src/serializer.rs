//! 规则序列化
//!
//! 把语法树写回交换文档 `{type, value, left, right}`，缺失的子节点输出为 `null`。
//! 与 [`RuleCompiler`] 互逆：`compile(to_document(t)) == t`。

use crate::compiler::RuleCompiler;
use crate::error::Result;
use crate::models::{Condition, Node, NodeKind};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Value, json};

/// 规则序列化器
pub struct RuleSerializer;

impl RuleSerializer {
    /// 转换为交换文档
    pub fn to_document(node: &Node) -> Value {
        match node {
            Node::Operator {
                connective,
                left,
                right,
            } => json!({
                "type": NodeKind::Operator,
                "value": connective,
                "left": Self::to_document(left),
                "right": Self::to_document(right),
            }),
            Node::Operand(condition) => json!({
                "type": NodeKind::Operand,
                "value": Self::condition_document(condition),
                "left": Value::Null,
                "right": Value::Null,
            }),
        }
    }

    /// 操作数载荷 `{attribute, comparator, value}`
    pub fn condition_document(condition: &Condition) -> Value {
        json!({
            "attribute": condition.attribute,
            "comparator": condition.comparator,
            "value": condition.value,
        })
    }

    pub fn to_json(node: &Node) -> Result<String> {
        Ok(serde_json::to_string(&Self::to_document(node))?)
    }

    pub fn to_json_pretty(node: &Node) -> Result<String> {
        Ok(serde_json::to_string_pretty(&Self::to_document(node))?)
    }
}

impl Serialize for Node {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        RuleSerializer::to_document(self).serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Node {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let document = Value::deserialize(deserializer)?;
        RuleCompiler::compile(&document).map_err(D::Error::custom)
    }
}
