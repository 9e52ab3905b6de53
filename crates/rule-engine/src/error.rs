//! 规则引擎错误类型

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RuleError {
    #[error("规则格式无效: {0}")]
    InvalidRuleFormat(String),

    #[error("规则评估失败: {0}")]
    Evaluation(#[from] EvaluationError),

    #[error("修改描述无效: {0}")]
    InvalidModification(String),

    #[error("规则未找到: {0}")]
    RuleNotFound(String),

    #[error("谓词已注册: {0}")]
    PredicateAlreadyRegistered(String),

    #[error("谓词名称与内置比较符冲突: {0}")]
    ReservedPredicateName(String),

    #[error("输入记录无效: {0}")]
    InvalidRecord(String),

    #[error("JSON 序列化错误: {0}")]
    Json(#[from] serde_json::Error),
}

/// 评估期错误：结构完好的规则无法针对给定记录求值
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvaluationError {
    #[error("字段不存在: {0}")]
    MissingAttribute(String),

    #[error("类型不匹配: 期望 {expected}, 实际 {actual}")]
    TypeMismatch { expected: String, actual: String },

    #[error("谓词 {predicate} 使用方式无效: {reason}")]
    InvalidPredicateUsage { predicate: String, reason: String },

    #[error("未知的比较符: {0}")]
    UnknownComparator(String),

    #[error("未知的逻辑连接词: {0}")]
    UnknownConnective(String),

    #[error("除数为零: {0}")]
    DivisionByZero(String),
}

pub type Result<T> = std::result::Result<T, RuleError>;

pub type EvalResult<T> = std::result::Result<T, EvaluationError>;
