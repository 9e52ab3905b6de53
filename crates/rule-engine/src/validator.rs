//! 规则文档校验器
//!
//! 在构建语法树之前检查交换文档的结构。整棵文档一次性递归校验，
//! 任何一层不合法都会拒绝整个规则，错误信息附带节点路径（如 `root.left.right`）。

use crate::error::{Result, RuleError};
use crate::models::value_type_name;
use serde_json::{Map, Value};

/// 规则文档校验器
pub struct RuleValidator;

impl RuleValidator {
    /// 校验完整的规则文档
    pub fn validate(document: &Value) -> Result<()> {
        Self::validate_node(document, "root")
    }

    /// 校验某个路径下的节点文档及其所有后代
    pub fn validate_node(document: &Value, path: &str) -> Result<()> {
        let node = document.as_object().ok_or_else(|| {
            invalid(
                path,
                format!("节点必须是对象, 实际为 {}", value_type_name(document)),
            )
        })?;

        let (Some(kind), Some(value)) = (node.get("type"), node.get("value")) else {
            return Err(invalid(path, "缺少 'type' 或 'value'"));
        };

        match kind.as_str() {
            Some("operator") => Self::validate_operator(node, value, path),
            Some("operand") => Self::validate_operand(node, value, path),
            _ => Err(invalid(path, format!("未知的节点类型: {}", kind))),
        }
    }

    /// 校验操作数载荷 `{attribute, comparator, value}`
    pub fn validate_condition(value: &Value, path: &str) -> Result<()> {
        let payload = value
            .as_object()
            .ok_or_else(|| invalid(path, "操作数节点的 'value' 必须是对象"))?;

        let attribute = payload
            .get("attribute")
            .ok_or_else(|| invalid(path, "操作数节点的 'value' 缺少 'attribute'"))?;
        match attribute.as_str() {
            Some(name) if !name.is_empty() => {}
            _ => return Err(invalid(path, "'attribute' 必须是非空字符串")),
        }

        let comparator = comparator_field(payload)
            .ok_or_else(|| invalid(path, "操作数节点的 'value' 缺少 'comparator'"))?;
        if !comparator.is_string() {
            return Err(invalid(path, "'comparator' 必须是字符串"));
        }

        Ok(())
    }

    fn validate_operator(node: &Map<String, Value>, value: &Value, path: &str) -> Result<()> {
        if !value.is_string() {
            return Err(invalid(path, "运算符节点的 'value' 必须是逻辑连接词字符串"));
        }

        for side in ["left", "right"] {
            match node.get(side) {
                None | Some(Value::Null) => {
                    return Err(invalid(path, format!("运算符节点缺少 '{}' 子节点", side)));
                }
                Some(child) => Self::validate_node(child, &format!("{}.{}", path, side))?,
            }
        }

        Ok(())
    }

    fn validate_operand(node: &Map<String, Value>, value: &Value, path: &str) -> Result<()> {
        for side in ["left", "right"] {
            if node.get(side).is_some_and(|child| !child.is_null()) {
                return Err(invalid(path, format!("操作数节点不能有 '{}' 子节点", side)));
            }
        }

        Self::validate_condition(value, path)
    }
}

/// 比较符字段，兼容旧文档中使用的 `operator` 键
pub(crate) fn comparator_field(payload: &Map<String, Value>) -> Option<&Value> {
    payload.get("comparator").or_else(|| payload.get("operator"))
}

fn invalid(path: &str, reason: impl std::fmt::Display) -> RuleError {
    RuleError::InvalidRuleFormat(format!("{}: {}", path, reason))
}
