//! 规则语法树引擎
//!
//! 把布尔决策规则作为数据而不是代码来处理：
//! - JSON 交换文档的校验与语法树构建
//! - 可扩展的命名谓词注册表
//! - 不短路的递归求值
//! - 增量修改与序列化回文档

pub mod compiler;
pub mod engine;
pub mod error;
pub mod evaluator;
pub mod executor;
pub mod models;
pub mod mutator;
pub mod operators;
pub mod predicates;
pub mod serializer;
pub mod store;
pub mod validator;

pub use compiler::RuleCompiler;
pub use engine::RuleEngine;
pub use error::{EvalResult, EvaluationError, Result, RuleError};
pub use evaluator::ConditionEvaluator;
pub use executor::{DispatchPolicy, RuleExecutor};
pub use models::{Condition, EvaluationReport, Node, NodeKind, Record};
pub use mutator::{Modification, RuleMutator};
pub use operators::{Comparator, Connective, Relational};
pub use predicates::{Predicate, PredicateFn, PredicateRegistry, SharedRegistry};
pub use serializer::RuleSerializer;
pub use store::{MemoryRuleStore, RuleRepository, StoredRule};
pub use validator::RuleValidator;
