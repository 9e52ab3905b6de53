//! 规则执行器
//!
//! 递归遍历语法树并针对输入记录求值。运算符节点总是先后求值左右两侧，不做短路，
//! 因此任一侧缺失属性都会以错误返回。遍历是只读的，不会修改语法树。

use crate::error::{EvalResult, EvaluationError, Result};
use crate::evaluator::ConditionEvaluator;
use crate::models::{Condition, EvaluationReport, Node, Record};
use crate::operators::Connective;
use crate::predicates::PredicateRegistry;
use std::time::Instant;
use tracing::debug;

/// 未知比较符或连接词的分派策略
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DispatchPolicy {
    /// 未知的比较符或连接词求值为 `false`
    #[default]
    Lenient,
    /// 未知的比较符或连接词返回评估错误
    Strict,
}

impl DispatchPolicy {
    pub fn from_strict(strict: bool) -> Self {
        if strict { Self::Strict } else { Self::Lenient }
    }
}

/// 规则执行器
pub struct RuleExecutor<'r> {
    registry: &'r PredicateRegistry,
    policy: DispatchPolicy,
    /// 是否记录详细评估追踪
    trace_enabled: bool,
}

impl<'r> RuleExecutor<'r> {
    pub fn new(registry: &'r PredicateRegistry) -> Self {
        Self {
            registry,
            policy: DispatchPolicy::default(),
            trace_enabled: false,
        }
    }

    pub fn with_policy(mut self, policy: DispatchPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// 启用评估追踪
    pub fn with_trace(mut self) -> Self {
        self.trace_enabled = true;
        self
    }

    /// 求值，只返回匹配结果
    pub fn evaluate(&self, node: &Node, record: &Record) -> Result<bool> {
        Ok(self.execute(node, record)?.matched)
    }

    /// 求值并返回评估报告
    pub fn execute(&self, node: &Node, record: &Record) -> Result<EvaluationReport> {
        let start = Instant::now();
        let mut report = EvaluationReport::default();

        let matched = self.evaluate_node(node, record, &mut report, "root")?;
        report.matched = matched;
        report.evaluation_time_us = start.elapsed().as_micros() as u64;

        Ok(report)
    }

    fn evaluate_node(
        &self,
        node: &Node,
        record: &Record,
        report: &mut EvaluationReport,
        path: &str,
    ) -> EvalResult<bool> {
        match node {
            Node::Operand(condition) => self.evaluate_condition(condition, record, report, path),
            Node::Operator {
                connective,
                left,
                right,
            } => self.evaluate_operator(connective, left, right, record, report, path),
        }
    }

    /// 评估操作数节点
    fn evaluate_condition(
        &self,
        condition: &Condition,
        record: &Record,
        report: &mut EvaluationReport,
        path: &str,
    ) -> EvalResult<bool> {
        let matched = match condition.comparator.relational() {
            Some(op) => {
                let field = Self::lookup(record, condition)?;
                ConditionEvaluator::compare(field, op, &condition.value)?
            }
            None => match self.registry.get(condition.comparator.as_str()) {
                Some(predicate) => {
                    let params = condition.params().ok_or_else(|| {
                        EvaluationError::InvalidPredicateUsage {
                            predicate: predicate.name().to_string(),
                            reason: "操作数的值必须携带 params 数组".to_string(),
                        }
                    })?;
                    let field = Self::lookup(record, condition)?;
                    predicate.call(field, params)?
                }
                None => match self.policy {
                    DispatchPolicy::Lenient => {
                        debug!(
                            path,
                            comparator = %condition.comparator,
                            "未知的比较符, 按 false 处理"
                        );
                        false
                    }
                    DispatchPolicy::Strict => {
                        return Err(EvaluationError::UnknownComparator(
                            condition.comparator.to_string(),
                        ));
                    }
                },
            },
        };

        if self.trace_enabled {
            report
                .evaluation_trace
                .push(format!("{}: {} => {}", path, condition, matched));
        }

        if matched {
            report
                .matched_conditions
                .push(format!("{}: {}", path, condition));
        }

        Ok(matched)
    }

    /// 评估运算符节点（两侧都求值，不短路）
    fn evaluate_operator(
        &self,
        connective: &Connective,
        left: &Node,
        right: &Node,
        record: &Record,
        report: &mut EvaluationReport,
        path: &str,
    ) -> EvalResult<bool> {
        let left_path = format!("{}.left", path);
        let right_path = format!("{}.right", path);
        let left_matched = self.evaluate_node(left, record, report, &left_path)?;
        let right_matched = self.evaluate_node(right, record, report, &right_path)?;

        let matched = match connective.normalized() {
            Connective::And => left_matched && right_matched,
            Connective::Or => left_matched || right_matched,
            Connective::Unrecognized(symbol) => match self.policy {
                DispatchPolicy::Lenient => {
                    debug!(
                        path,
                        connective = %symbol,
                        "未知的逻辑连接词, 按 false 处理"
                    );
                    false
                }
                DispatchPolicy::Strict => {
                    return Err(EvaluationError::UnknownConnective(symbol));
                }
            },
        };

        if self.trace_enabled {
            report
                .evaluation_trace
                .push(format!("{}: {} => {}", path, connective, matched));
        }

        Ok(matched)
    }

    fn lookup<'a>(record: &'a Record, condition: &Condition) -> EvalResult<&'a serde_json::Value> {
        record
            .get(&condition.attribute)
            .ok_or_else(|| EvaluationError::MissingAttribute(condition.attribute.clone()))
    }
}
