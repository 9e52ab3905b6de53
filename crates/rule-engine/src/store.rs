//! 规则存储
//!
//! 引擎只和序列化后的规则文档打交道，规则 ID 由存储分配。
//! [`MemoryRuleStore`] 使用 DashMap 提供线程安全的内存实现。

use crate::error::{Result, RuleError};
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

/// 规则存储接口
#[cfg_attr(test, mockall::automock)]
pub trait RuleRepository: Send + Sync {
    /// 保存新规则文档，返回分配的规则 ID
    fn put(&self, document: Value) -> Result<String>;

    /// 读取规则文档，不存在时返回 `None`
    fn get(&self, rule_id: &str) -> Result<Option<Value>>;

    /// 替换已有规则文档
    fn replace(&self, rule_id: &str, document: Value) -> Result<()>;

    /// 删除规则
    fn remove(&self, rule_id: &str) -> Result<()>;

    /// 所有规则 ID
    fn ids(&self) -> Vec<String>;
}

/// 已存储的规则
#[derive(Debug, Clone)]
pub struct StoredRule {
    pub document: Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// 内存规则存储
#[derive(Clone, Default)]
pub struct MemoryRuleStore {
    rules: Arc<DashMap<String, StoredRule>>,
}

impl MemoryRuleStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 获取当前存储的规则数量
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// 读取规则及其时间戳
    pub fn entry(&self, rule_id: &str) -> Option<StoredRule> {
        self.rules.get(rule_id).map(|r| r.clone())
    }

    /// 清空所有规则
    #[instrument(skip(self))]
    pub fn clear(&self) {
        let count = self.rules.len();
        self.rules.clear();
        info!("已清空 {} 条规则", count);
    }
}

impl RuleRepository for MemoryRuleStore {
    #[instrument(skip(self, document))]
    fn put(&self, document: Value) -> Result<String> {
        let rule_id = Uuid::new_v4().to_string();
        let now = Utc::now();

        self.rules.insert(
            rule_id.clone(),
            StoredRule {
                document,
                created_at: now,
                updated_at: now,
            },
        );

        debug!(rule_id = %rule_id, "规则已保存");
        Ok(rule_id)
    }

    fn get(&self, rule_id: &str) -> Result<Option<Value>> {
        Ok(self.rules.get(rule_id).map(|r| r.document.clone()))
    }

    #[instrument(skip(self, document))]
    fn replace(&self, rule_id: &str, document: Value) -> Result<()> {
        match self.rules.get_mut(rule_id) {
            Some(mut stored) => {
                stored.document = document;
                stored.updated_at = Utc::now();
                debug!(rule_id, "规则已更新");
                Ok(())
            }
            None => {
                warn!("更新不存在的规则: {}", rule_id);
                Err(RuleError::RuleNotFound(rule_id.to_string()))
            }
        }
    }

    #[instrument(skip(self))]
    fn remove(&self, rule_id: &str) -> Result<()> {
        if self.rules.remove(rule_id).is_some() {
            info!("规则已删除: {}", rule_id);
            Ok(())
        } else {
            warn!("删除不存在的规则: {}", rule_id);
            Err(RuleError::RuleNotFound(rule_id.to_string()))
        }
    }

    fn ids(&self) -> Vec<String> {
        self.rules.iter().map(|r| r.key().clone()).collect()
    }
}
