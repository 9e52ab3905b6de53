//! 规则操作符定义
//!
//! 内置关系比较符和逻辑连接词都是封闭枚举；不认识的比较符名称交给谓词注册表解析。

use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};

/// 内置关系比较符
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Relational {
    Eq,
    Ne,
    Gt,
    Ge,
    Lt,
    Le,
}

impl Relational {
    /// 从文档中的符号解析
    pub fn from_symbol(symbol: &str) -> Option<Self> {
        match symbol {
            "=" => Some(Self::Eq),
            "!=" => Some(Self::Ne),
            ">" => Some(Self::Gt),
            ">=" => Some(Self::Ge),
            "<" => Some(Self::Lt),
            "<=" => Some(Self::Le),
            _ => None,
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::Ne => "!=",
            Self::Gt => ">",
            Self::Ge => ">=",
            Self::Lt => "<",
            Self::Le => "<=",
        }
    }
}

impl fmt::Display for Relational {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// 操作数节点的比较符
///
/// `Named` 在评估时才到谓词注册表中查找，注册表内容可以在规则创建之后变化。
///
/// 相等与哈希按符号计算：`Named(">")` 与 `Relational(Gt)` 视为同一个比较符，
/// 评估时也按关系比较符处理。
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Comparator {
    Relational(Relational),
    Named(String),
}

impl Comparator {
    pub fn parse(symbol: &str) -> Self {
        match Relational::from_symbol(symbol) {
            Some(op) => Self::Relational(op),
            None => Self::Named(symbol.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Relational(op) => op.symbol(),
            Self::Named(name) => name,
        }
    }

    /// 规范化后的关系比较符，命名谓词返回 `None`
    pub fn relational(&self) -> Option<Relational> {
        match self {
            Self::Relational(op) => Some(*op),
            Self::Named(name) => Relational::from_symbol(name),
        }
    }
}

impl PartialEq for Comparator {
    fn eq(&self, other: &Self) -> bool {
        self.as_str() == other.as_str()
    }
}

impl Eq for Comparator {}

impl Hash for Comparator {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.as_str().hash(state);
    }
}

impl From<String> for Comparator {
    fn from(symbol: String) -> Self {
        match Relational::from_symbol(&symbol) {
            Some(op) => Self::Relational(op),
            None => Self::Named(symbol),
        }
    }
}

impl From<&str> for Comparator {
    fn from(symbol: &str) -> Self {
        Self::parse(symbol)
    }
}

impl From<Relational> for Comparator {
    fn from(op: Relational) -> Self {
        Self::Relational(op)
    }
}

impl From<Comparator> for String {
    fn from(comparator: Comparator) -> Self {
        match comparator {
            Comparator::Relational(op) => op.symbol().to_string(),
            Comparator::Named(name) => name,
        }
    }
}

impl fmt::Display for Comparator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 逻辑连接词
///
/// 构建阶段原样保留不认识的符号，由评估器按分派策略处理。
/// 与 [`Comparator`] 一样按符号比较，`Unrecognized("AND")` 等同于 `And`。
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Connective {
    And,
    Or,
    Unrecognized(String),
}

impl Connective {
    pub fn parse(symbol: &str) -> Self {
        match symbol {
            "AND" => Self::And,
            "OR" => Self::Or,
            other => Self::Unrecognized(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::And => "AND",
            Self::Or => "OR",
            Self::Unrecognized(symbol) => symbol,
        }
    }

    /// 规范化形式，把写成 `Unrecognized` 的 `AND`/`OR` 还原为已知连接词
    pub fn normalized(&self) -> Self {
        Self::parse(self.as_str())
    }
}

impl PartialEq for Connective {
    fn eq(&self, other: &Self) -> bool {
        self.as_str() == other.as_str()
    }
}

impl Eq for Connective {}

impl Hash for Connective {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.as_str().hash(state);
    }
}

impl From<String> for Connective {
    fn from(symbol: String) -> Self {
        Self::parse(&symbol)
    }
}

impl From<Connective> for String {
    fn from(connective: Connective) -> Self {
        match connective {
            Connective::Unrecognized(symbol) => symbol,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for Connective {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
