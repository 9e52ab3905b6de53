//! 规则引擎服务
//!
//! 把存储、编译、评估和修改串成完整的规则生命周期：
//! 文档 → 校验 → 构建 → {评估 | 修改 → 序列化 → 存储}。

use crate::compiler::RuleCompiler;
use crate::error::{Result, RuleError};
use crate::executor::{DispatchPolicy, RuleExecutor};
use crate::models::{EvaluationReport, Node, Record};
use crate::mutator::{Modification, RuleMutator};
use crate::operators::Connective;
use crate::predicates::{Predicate, PredicateRegistry, SharedRegistry};
use crate::serializer::RuleSerializer;
use crate::store::RuleRepository;
use rule_shared::config::EngineConfig;
use serde_json::Value;
use tracing::{debug, info, instrument, warn};

/// 规则引擎
pub struct RuleEngine<R> {
    repository: R,
    registry: SharedRegistry,
    policy: DispatchPolicy,
    trace_enabled: bool,
}

impl<R: RuleRepository> RuleEngine<R> {
    /// 使用内置谓词创建引擎
    pub fn new(repository: R) -> Self {
        Self {
            repository,
            registry: PredicateRegistry::with_builtins().into_shared(),
            policy: DispatchPolicy::default(),
            trace_enabled: false,
        }
    }

    /// 按配置创建引擎
    pub fn from_config(repository: R, config: &EngineConfig) -> Self {
        let mut engine =
            Self::new(repository).with_policy(DispatchPolicy::from_strict(config.strict_dispatch));
        engine.trace_enabled = config.trace_evaluation;
        engine
    }

    /// 与其他引擎共享同一个谓词注册表
    pub fn with_registry(mut self, registry: SharedRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn with_policy(mut self, policy: DispatchPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn registry(&self) -> &SharedRegistry {
        &self.registry
    }

    pub fn repository(&self) -> &R {
        &self.repository
    }

    /// 注册命名谓词
    pub fn register_predicate(&self, predicate: Predicate) -> Result<()> {
        self.registry.write().register(predicate)
    }

    /// 创建规则：解析、校验、构建后保存规范化的文档
    #[instrument(skip(self, rule_json))]
    pub fn create_rule(&self, rule_json: &str) -> Result<String> {
        let node = RuleCompiler::compile_from_json(rule_json).inspect_err(|e| {
            warn!(error = %e, "规则创建失败");
        })?;
        self.save_rule(&node)
    }

    /// 保存已构建的语法树
    #[instrument(skip(self, node))]
    pub fn save_rule(&self, node: &Node) -> Result<String> {
        let rule_id = self.repository.put(RuleSerializer::to_document(node))?;
        info!(
            rule_id = %rule_id,
            nodes = node.node_count(),
            attributes = ?node.attributes(),
            "规则已创建"
        );
        Ok(rule_id)
    }

    /// 读取并构建规则
    pub fn get_rule(&self, rule_id: &str) -> Result<Node> {
        let document = self.repository.get(rule_id)?.ok_or_else(|| {
            warn!(rule_id, "规则不存在");
            RuleError::RuleNotFound(rule_id.to_string())
        })?;
        RuleCompiler::compile(&document)
    }

    /// 针对记录评估已存储的规则
    #[instrument(skip(self, record))]
    pub fn evaluate_rule(&self, rule_id: &str, record: &Record) -> Result<bool> {
        let node = self.get_rule(rule_id)?;
        let matched = self.evaluate(&node, record).inspect_err(|e| {
            warn!(rule_id, error = %e, "规则评估失败");
        })?;
        debug!(rule_id, matched, "规则评估完成");
        Ok(matched)
    }

    /// 评估已存储的规则并返回报告
    #[instrument(skip(self, record))]
    pub fn execute_rule(&self, rule_id: &str, record: &Record) -> Result<EvaluationReport> {
        let node = self.get_rule(rule_id)?;
        self.execute(&node, record)
    }

    /// 直接评估语法树
    pub fn evaluate(&self, node: &Node, record: &Record) -> Result<bool> {
        Ok(self.execute(node, record)?.matched)
    }

    /// 直接评估语法树并返回报告
    pub fn execute(&self, node: &Node, record: &Record) -> Result<EvaluationReport> {
        let registry = self.registry.read();
        let mut executor = RuleExecutor::new(&registry).with_policy(self.policy);
        if self.trace_enabled {
            executor = executor.with_trace();
        }

        let report = executor.execute(node, record)?;
        for line in &report.evaluation_trace {
            debug!(trace = %line, "评估追踪");
        }
        Ok(report)
    }

    /// 修改已存储的规则
    ///
    /// 修改失败时存储中的规则保持原样。
    #[instrument(skip(self, modification))]
    pub fn modify_rule(&self, rule_id: &str, modification: &Value) -> Result<Node> {
        let node = self.get_rule(rule_id)?;
        let modification = Modification::from_value(modification)?;

        let modified = RuleMutator::apply(&node, &modification).inspect_err(|e| {
            warn!(rule_id, error = %e, "规则修改失败");
        })?;

        self.repository
            .replace(rule_id, RuleSerializer::to_document(&modified))?;
        info!(rule_id, "规则已修改");
        Ok(modified)
    }

    /// 用逻辑连接词把多条已存储的规则合并成一棵树（左深）
    #[instrument(skip(self, rule_ids), fields(count = rule_ids.len()))]
    pub fn combine_rules<S: AsRef<str>>(
        &self,
        rule_ids: &[S],
        connective: Connective,
    ) -> Result<Node> {
        let mut nodes = rule_ids.iter().map(|id| self.get_rule(id.as_ref()));

        let mut combined = match nodes.next() {
            Some(first) => first?,
            None => {
                return Err(RuleError::InvalidRuleFormat(
                    "合并规则至少需要一条规则".to_string(),
                ));
            }
        };
        for node in nodes {
            combined = Node::operator(connective.clone(), combined, node?);
        }

        Ok(combined)
    }

    /// 删除规则
    pub fn delete_rule(&self, rule_id: &str) -> Result<()> {
        self.repository.remove(rule_id)
    }
}
