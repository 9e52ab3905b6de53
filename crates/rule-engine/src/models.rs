//! 规则引擎领域模型
//!
//! 规则是一棵二叉语法树：运算符节点用逻辑连接词组合左右两棵子树，操作数节点比较记录中的一个属性。
//! 子树由父节点独占持有，不存在共享或环。

use crate::error::{Result, RuleError};
use crate::operators::{Comparator, Connective};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeSet;
use std::fmt;

/// 节点类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Operator,
    Operand,
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Operator => write!(f, "operator"),
            Self::Operand => write!(f, "operand"),
        }
    }
}

/// 规则节点
///
/// 运算符节点总是同时持有左右子树，操作数节点没有子树。
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Operator {
        connective: Connective,
        left: Box<Node>,
        right: Box<Node>,
    },
    Operand(Condition),
}

impl Node {
    pub fn operator(connective: Connective, left: Node, right: Node) -> Self {
        Self::Operator {
            connective,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn and(left: Node, right: Node) -> Self {
        Self::operator(Connective::And, left, right)
    }

    pub fn or(left: Node, right: Node) -> Self {
        Self::operator(Connective::Or, left, right)
    }

    pub fn operand(condition: Condition) -> Self {
        Self::Operand(condition)
    }

    pub fn kind(&self) -> NodeKind {
        match self {
            Self::Operator { .. } => NodeKind::Operator,
            Self::Operand(_) => NodeKind::Operand,
        }
    }

    pub fn left(&self) -> Option<&Node> {
        match self {
            Self::Operator { left, .. } => Some(left),
            Self::Operand(_) => None,
        }
    }

    pub fn right(&self) -> Option<&Node> {
        match self {
            Self::Operator { right, .. } => Some(right),
            Self::Operand(_) => None,
        }
    }

    pub fn connective(&self) -> Option<&Connective> {
        match self {
            Self::Operator { connective, .. } => Some(connective),
            Self::Operand(_) => None,
        }
    }

    pub fn condition(&self) -> Option<&Condition> {
        match self {
            Self::Operand(condition) => Some(condition),
            Self::Operator { .. } => None,
        }
    }

    /// 节点总数
    pub fn node_count(&self) -> usize {
        match self {
            Self::Operator { left, right, .. } => 1 + left.node_count() + right.node_count(),
            Self::Operand(_) => 1,
        }
    }

    pub fn depth(&self) -> usize {
        match self {
            Self::Operator { left, right, .. } => 1 + left.depth().max(right.depth()),
            Self::Operand(_) => 1,
        }
    }

    /// 规则引用的所有属性名
    pub fn attributes(&self) -> BTreeSet<&str> {
        let mut attributes = BTreeSet::new();
        self.collect_attributes(&mut attributes);
        attributes
    }

    fn collect_attributes<'a>(&'a self, attributes: &mut BTreeSet<&'a str>) {
        match self {
            Self::Operator { left, right, .. } => {
                left.collect_attributes(attributes);
                right.collect_attributes(attributes);
            }
            Self::Operand(condition) => {
                attributes.insert(condition.attribute.as_str());
            }
        }
    }
}

/// 操作数节点的载荷
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    pub attribute: String,
    pub comparator: Comparator,
    /// 比较值；命名谓词使用 `{"params": [...]}` 形式携带参数
    pub value: Value,
}

impl Condition {
    pub fn new(
        attribute: impl Into<String>,
        comparator: impl Into<Comparator>,
        value: impl Into<Value>,
    ) -> Self {
        Self {
            attribute: attribute.into(),
            comparator: comparator.into(),
            value: value.into(),
        }
    }

    /// 构造引用命名谓词的条件
    ///
    /// 名称按文档中的比较符解析，关系符号得到的是关系比较符。
    pub fn predicate(attribute: impl Into<String>, name: &str, params: Vec<Value>) -> Self {
        let mut value = Map::new();
        value.insert("params".to_string(), Value::Array(params));
        Self {
            attribute: attribute.into(),
            comparator: Comparator::parse(name),
            value: Value::Object(value),
        }
    }

    /// 谓词参数列表：值为对象且 `params` 是数组时返回，其余键忽略
    pub fn params(&self) -> Option<&[Value]> {
        match self.value.get("params") {
            Some(Value::Array(params)) => Some(params),
            _ => None,
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.attribute, self.comparator, self.value)
    }
}

/// 评估输入记录：属性名到标量值的扁平映射
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    fields: Map<String, Value>,
}

impl Record {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self { fields }
    }

    /// 从 JSON 值创建，值必须是对象
    pub fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Object(fields) => Ok(Self { fields }),
            other => Err(RuleError::InvalidRecord(format!(
                "记录必须是 JSON 对象, 实际为 {}",
                value_type_name(&other)
            ))),
        }
    }

    /// 从 JSON 字符串创建
    pub fn from_json(json: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(json)?;
        Self::from_value(value)
    }

    pub fn get(&self, attribute: &str) -> Option<&Value> {
        self.fields.get(attribute)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl From<Map<String, Value>> for Record {
    fn from(fields: Map<String, Value>) -> Self {
        Self::new(fields)
    }
}

/// 评估报告
#[derive(Debug, Clone, Default, Serialize)]
pub struct EvaluationReport {
    pub matched: bool,
    pub matched_conditions: Vec<String>,
    pub evaluation_trace: Vec<String>,
    pub evaluation_time_us: u64,
}

/// 获取值的类型名称
pub(crate) fn value_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
