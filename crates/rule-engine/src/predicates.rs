//! 谓词注册表
//!
//! 操作数节点的比较符如果不是内置关系符，就按名称在注册表中查找谓词。
//! 谓词接收记录中的属性值以及规则里 `{"params": [...]}` 携带的有序参数。
//!
//! 注册表是读多写少的共享状态，通过 [`SharedRegistry`] 在评估调用之间共享；
//! 覆盖已有名称必须显式调用 [`PredicateRegistry::replace`]。

use crate::error::{EvalResult, EvaluationError, Result, RuleError};
use crate::evaluator::{ConditionEvaluator, expect_number, mismatch};
use crate::operators::Relational;
use parking_lot::RwLock;
use regex::Regex;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info};

/// 谓词函数：`(属性值, 参数列表) -> bool`
pub type PredicateFn = Arc<dyn Fn(&Value, &[Value]) -> EvalResult<bool> + Send + Sync>;

/// 跨评估调用共享的注册表
pub type SharedRegistry = Arc<RwLock<PredicateRegistry>>;

/// 命名谓词
#[derive(Clone)]
pub struct Predicate {
    name: String,
    /// 参数个数（不含属性值本身），`None` 表示不限
    arity: Option<usize>,
    func: PredicateFn,
}

impl Predicate {
    /// 创建固定参数个数的谓词
    pub fn new<F>(name: impl Into<String>, arity: usize, func: F) -> Self
    where
        F: Fn(&Value, &[Value]) -> EvalResult<bool> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            arity: Some(arity),
            func: Arc::new(func),
        }
    }

    /// 创建参数个数不限的谓词
    pub fn variadic<F>(name: impl Into<String>, func: F) -> Self
    where
        F: Fn(&Value, &[Value]) -> EvalResult<bool> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            arity: None,
            func: Arc::new(func),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn arity(&self) -> Option<usize> {
        self.arity
    }

    /// 调用谓词，先检查参数个数
    pub fn call(&self, subject: &Value, params: &[Value]) -> EvalResult<bool> {
        if let Some(arity) = self.arity {
            if params.len() != arity {
                return Err(EvaluationError::InvalidPredicateUsage {
                    predicate: self.name.clone(),
                    reason: format!("需要 {} 个参数, 实际 {} 个", arity, params.len()),
                });
            }
        }
        (self.func)(subject, params)
    }
}

impl fmt::Debug for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Predicate")
            .field("name", &self.name)
            .field("arity", &self.arity)
            .finish()
    }
}

/// 谓词注册表
#[derive(Debug, Clone, Default)]
pub struct PredicateRegistry {
    predicates: HashMap<String, Predicate>,
}

impl PredicateRegistry {
    /// 创建空注册表
    pub fn new() -> Self {
        Self::default()
    }

    /// 创建预置内置谓词的注册表：`within_range`、`multiple_of`、`matches`
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        for predicate in builtins::all() {
            registry
                .predicates
                .insert(predicate.name().to_string(), predicate);
        }
        registry
    }

    /// 转换为共享注册表
    pub fn into_shared(self) -> SharedRegistry {
        Arc::new(RwLock::new(self))
    }

    /// 注册新谓词，名称已存在时失败
    pub fn register(&mut self, predicate: Predicate) -> Result<()> {
        Self::ensure_not_reserved(predicate.name())?;

        if self.predicates.contains_key(predicate.name()) {
            return Err(RuleError::PredicateAlreadyRegistered(
                predicate.name().to_string(),
            ));
        }

        debug!(predicate = %predicate.name(), arity = ?predicate.arity(), "谓词已注册");
        self.predicates
            .insert(predicate.name().to_string(), predicate);
        Ok(())
    }

    /// 显式覆盖同名谓词，返回被替换的旧谓词
    pub fn replace(&mut self, predicate: Predicate) -> Result<Option<Predicate>> {
        Self::ensure_not_reserved(predicate.name())?;

        let name = predicate.name().to_string();
        let previous = self.predicates.insert(name.clone(), predicate);
        if previous.is_some() {
            info!(predicate = %name, "谓词已被覆盖");
        }
        Ok(previous)
    }

    /// 移除谓词
    pub fn unregister(&mut self, name: &str) -> Option<Predicate> {
        self.predicates.remove(name)
    }

    pub fn get(&self, name: &str) -> Option<&Predicate> {
        self.predicates.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.predicates.contains_key(name)
    }

    /// 所有谓词名称（已排序）
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.predicates.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.predicates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.predicates.is_empty()
    }

    fn ensure_not_reserved(name: &str) -> Result<()> {
        if name.is_empty() || Relational::from_symbol(name).is_some() {
            return Err(RuleError::ReservedPredicateName(name.to_string()));
        }
        Ok(())
    }
}

/// 内置谓词
mod builtins {
    use super::*;

    pub(super) fn all() -> Vec<Predicate> {
        vec![
            Predicate::new("within_range", 2, within_range),
            Predicate::new("multiple_of", 1, multiple_of),
            Predicate::new("matches", 1, matches),
        ]
    }

    /// `low <= x <= high`，与关系比较符一样支持数值和字符串
    fn within_range(subject: &Value, params: &[Value]) -> EvalResult<bool> {
        let above_low = ConditionEvaluator::ordering(subject, &params[0])?.is_ge();
        let below_high = ConditionEvaluator::ordering(subject, &params[1])?.is_le();

        Ok(above_low && below_high)
    }

    /// `x mod factor == 0`
    fn multiple_of(subject: &Value, params: &[Value]) -> EvalResult<bool> {
        let x = expect_number(subject)?;
        let factor = expect_number(&params[0])?;

        if let (Some(x), Some(factor)) = (x.as_i64(), factor.as_i64()) {
            if factor == 0 {
                return Err(EvaluationError::DivisionByZero("multiple_of".to_string()));
            }
            return Ok(x.wrapping_rem(factor) == 0);
        }

        match (x.as_f64(), factor.as_f64()) {
            (Some(_), Some(f)) if f == 0.0 => {
                Err(EvaluationError::DivisionByZero("multiple_of".to_string()))
            }
            (Some(x), Some(f)) => Ok(x % f == 0.0),
            _ => Err(mismatch("number", subject)),
        }
    }

    /// 正则匹配
    fn matches(subject: &Value, params: &[Value]) -> EvalResult<bool> {
        let text = subject.as_str().ok_or_else(|| mismatch("string", subject))?;
        let pattern = params[0]
            .as_str()
            .ok_or_else(|| EvaluationError::InvalidPredicateUsage {
                predicate: "matches".to_string(),
                reason: "参数必须是正则表达式字符串".to_string(),
            })?;

        let regex = Regex::new(pattern).map_err(|e| EvaluationError::InvalidPredicateUsage {
            predicate: "matches".to_string(),
            reason: format!("无效的正则表达式 '{}': {}", pattern, e),
        })?;

        Ok(regex.is_match(text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn call(
        registry: &PredicateRegistry,
        name: &str,
        subject: Value,
        params: &[Value],
    ) -> EvalResult<bool> {
        registry.get(name).unwrap().call(&subject, params)
    }

    #[test]
    fn test_builtins_seeded() {
        let registry = PredicateRegistry::with_builtins();
        assert_eq!(registry.names(), vec!["matches", "multiple_of", "within_range"]);
        assert!(PredicateRegistry::new().is_empty());
    }

    #[test]
    fn test_within_range() {
        let registry = PredicateRegistry::with_builtins();
        let bounds = [json!(18), json!(65)];

        assert!(call(&registry, "within_range", json!(40), &bounds).unwrap());
        assert!(call(&registry, "within_range", json!(18), &bounds).unwrap());
        assert!(call(&registry, "within_range", json!(65), &bounds).unwrap());
        assert!(!call(&registry, "within_range", json!(70), &bounds).unwrap());
        assert!(!call(&registry, "within_range", json!(17.5), &bounds).unwrap());
    }

    #[test]
    fn test_multiple_of() {
        let registry = PredicateRegistry::with_builtins();

        assert!(call(&registry, "multiple_of", json!(25), &[json!(5)]).unwrap());
        assert!(!call(&registry, "multiple_of", json!(23), &[json!(5)]).unwrap());
        assert!(call(&registry, "multiple_of", json!(7.5), &[json!(2.5)]).unwrap());
        assert!(call(&registry, "multiple_of", json!(i64::MIN), &[json!(-1)]).unwrap());
        assert_eq!(
            call(&registry, "multiple_of", json!(10), &[json!(0)]).unwrap_err(),
            EvaluationError::DivisionByZero("multiple_of".to_string())
        );
    }

    #[test]
    fn test_matches() {
        let registry = PredicateRegistry::with_builtins();

        let email = [json!(r"^[\w.-]+@[\w.-]+\.\w+$")];
        assert!(call(&registry, "matches", json!("user@example.com"), &email).unwrap());
        assert!(!call(&registry, "matches", json!("nope"), &[json!(r"^\d+$")]).unwrap());
        assert!(matches!(
            call(&registry, "matches", json!("x"), &[json!("[invalid")]),
            Err(EvaluationError::InvalidPredicateUsage { .. })
        ));
    }

    #[test]
    fn test_arity_checked() {
        let registry = PredicateRegistry::with_builtins();
        let err = call(&registry, "within_range", json!(40), &[json!(18)]).unwrap_err();

        assert!(matches!(err, EvaluationError::InvalidPredicateUsage { .. }));
        assert!(err.to_string().starts_with("谓词 within_range"));
    }

    #[test]
    fn test_within_range_strings() {
        let registry = PredicateRegistry::with_builtins();
        let bounds = [json!("a"), json!("m")];

        assert!(call(&registry, "within_range", json!("bob"), &bounds).unwrap());
        assert!(call(&registry, "within_range", json!("m"), &bounds).unwrap());
        assert!(!call(&registry, "within_range", json!("zoe"), &bounds).unwrap());
    }

    #[test]
    fn test_type_mismatch() {
        let registry = PredicateRegistry::with_builtins();

        let err = call(&registry, "within_range", json!("40"), &[json!(18), json!(65)])
            .unwrap_err();
        assert!(matches!(err, EvaluationError::TypeMismatch { .. }));

        let mixed_bounds = [json!("a"), json!(65)];
        let err = call(&registry, "within_range", json!("bob"), &mixed_bounds).unwrap_err();
        assert!(matches!(err, EvaluationError::TypeMismatch { .. }));
    }

    #[test]
    fn test_register_is_explicit() {
        let mut registry = PredicateRegistry::with_builtins();

        let is_even = Predicate::new("is_even", 0, |x, _| {
            Ok(x.as_i64().is_some_and(|n| n % 2 == 0))
        });
        registry.register(is_even.clone()).unwrap();
        assert!(registry.contains("is_even"));

        let err = registry.register(is_even).unwrap_err();
        assert!(matches!(err, RuleError::PredicateAlreadyRegistered(name) if name == "is_even"));

        let always = Predicate::variadic("is_even", |_, _| Ok(true));
        let previous = registry.replace(always).unwrap();
        assert!(previous.is_some());
        assert!(call(&registry, "is_even", json!(3), &[json!(1), json!(2)]).unwrap());

        assert!(registry.unregister("is_even").is_some());
        assert!(!registry.contains("is_even"));
    }

    #[test]
    fn test_reserved_names() {
        let mut registry = PredicateRegistry::new();

        let err = registry
            .register(Predicate::variadic(">", |_, _| Ok(true)))
            .unwrap_err();
        assert!(matches!(err, RuleError::ReservedPredicateName(_)));

        assert!(registry.replace(Predicate::variadic("", |_, _| Ok(true))).is_err());
    }

    #[test]
    fn test_shared_registry() {
        let shared = PredicateRegistry::with_builtins().into_shared();
        let reader = Arc::clone(&shared);

        shared
            .write()
            .register(Predicate::new("positive", 0, |x, _| Ok(x.as_f64().is_some_and(|n| n > 0.0))))
            .unwrap();

        assert!(reader.read().contains("positive"));
    }
}
