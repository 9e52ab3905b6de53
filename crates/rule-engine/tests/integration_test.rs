//! 规则引擎集成测试
//!
//! 测试完整的规则创建、评估、修改、序列化工作流。

use rule_engine::{
    Comparator, Condition, Connective, DispatchPolicy, EvaluationError, MemoryRuleStore, Node,
    Predicate, PredicateRegistry, Record, RuleCompiler, RuleEngine, RuleError, RuleExecutor,
    RuleRepository, RuleSerializer,
};
use serde_json::{Value, json};

/// AND(age > 30, salary > 50000)
const AGE_AND_SALARY: &str = r#"
{
    "type": "operator",
    "value": "AND",
    "left": {
        "type": "operand",
        "value": {"attribute": "age", "comparator": ">", "value": 30}
    },
    "right": {
        "type": "operand",
        "value": {"attribute": "salary", "comparator": ">", "value": 50000}
    }
}
"#;

/// 创建测试记录：模拟一名员工
fn employee(age: i64, salary: i64) -> Record {
    Record::from_value(json!({
        "age": age,
        "salary": salary,
        "department": "Sales",
        "experience": 3
    }))
    .unwrap()
}

fn record(value: Value) -> Record {
    Record::from_value(value).unwrap()
}

/// 单个操作数节点的规则文档
fn operand_rule(payload: Value) -> String {
    json!({"type": "operand", "value": payload}).to_string()
}

// ==================== 完整工作流测试 ====================

#[test]
fn test_full_workflow() {
    // 1. 创建规则
    let engine = RuleEngine::new(MemoryRuleStore::new());
    let rule_id = engine.create_rule(AGE_AND_SALARY).unwrap();

    // 2. 评估
    assert!(engine.evaluate_rule(&rule_id, &employee(35, 60000)).unwrap());
    assert!(!engine.evaluate_rule(&rule_id, &employee(25, 60000)).unwrap());

    // 3. 修改：根连接词改为 OR，左侧阈值改为 40
    let modified = engine
        .modify_rule(
            &rule_id,
            &json!({
                "operator": "OR",
                "left": {"value": {"attribute": "age", "comparator": ">", "value": 40}}
            }),
        )
        .unwrap();

    assert_eq!(modified.connective(), Some(&Connective::Or));
    assert_eq!(
        modified.left().and_then(Node::condition),
        Some(&Condition::new("age", ">", 40))
    );
    assert_eq!(
        modified.right().and_then(Node::condition),
        Some(&Condition::new("salary", ">", 50000))
    );

    // 4. 再次评估：左侧 age > 40 不满足，右侧 salary > 50000 满足
    let report = engine.execute_rule(&rule_id, &employee(35, 60000)).unwrap();
    assert!(report.matched);
    assert_eq!(report.matched_conditions, vec!["root.right: salary > 50000".to_string()]);
}

#[test]
fn test_stored_document_is_canonical() {
    let store = MemoryRuleStore::new();
    let engine = RuleEngine::new(store.clone());

    let rule_id = engine
        .create_rule(&operand_rule(
            json!({"attribute": "age", "operator": ">", "value": 18}),
        ))
        .unwrap();

    assert_eq!(
        store.get(&rule_id).unwrap(),
        Some(json!({
            "type": "operand",
            "value": {"attribute": "age", "comparator": ">", "value": 18},
            "left": null,
            "right": null
        }))
    );
}

// ==================== 校验测试 ====================

#[test]
fn test_validator_rejects_malformed_documents() {
    let cases = [
        json!({"value": "AND"}),
        json!({"type": "operand"}),
        json!({
            "type": "operator",
            "value": "AND",
            "left": {
                "type": "operand",
                "value": {"attribute": "a", "comparator": "=", "value": 1}
            }
        }),
        json!({"type": "operand", "value": {"comparator": "=", "value": 1}}),
        json!({"type": "operand", "value": {"attribute": "a", "value": 1}}),
    ];

    let engine = RuleEngine::new(MemoryRuleStore::new());
    for case in cases {
        let err = engine.create_rule(&case.to_string()).unwrap_err();
        assert!(
            matches!(err, RuleError::InvalidRuleFormat(_)),
            "{} should be rejected, got {:?}",
            case,
            err
        );
    }
    assert!(engine.repository().is_empty());
}

// ==================== 谓词测试 ====================

#[test]
fn test_within_range_predicate() {
    let tree = RuleCompiler::compile_from_json(&operand_rule(json!({
        "attribute": "age",
        "comparator": "within_range",
        "value": {"params": [18, 65]}
    })))
    .unwrap();
    let registry = PredicateRegistry::with_builtins();
    let executor = RuleExecutor::new(&registry);

    assert!(!executor.evaluate(&tree, &record(json!({"age": 70}))).unwrap());
    assert!(executor.evaluate(&tree, &record(json!({"age": 40}))).unwrap());
}

#[test]
fn test_predicate_params_with_annotations() {
    let engine = RuleEngine::new(MemoryRuleStore::new());
    let rule_id = engine
        .create_rule(&operand_rule(json!({
            "attribute": "age",
            "comparator": "within_range",
            "value": {"params": [18, 65], "note": "working age"}
        })))
        .unwrap();

    assert!(engine.evaluate_rule(&rule_id, &record(json!({"age": 40}))).unwrap());
}

#[test]
fn test_within_range_on_strings() {
    let tree = Node::operand(Condition::predicate(
        "name",
        "within_range",
        vec![json!("a"), json!("m")],
    ));
    let engine = RuleEngine::new(MemoryRuleStore::new());

    assert!(engine.evaluate(&tree, &record(json!({"name": "bob"}))).unwrap());
    assert!(!engine.evaluate(&tree, &record(json!({"name": "zoe"}))).unwrap());
}

#[test]
fn test_multiple_of_predicate() {
    let tree = Node::operand(Condition::predicate("score", "multiple_of", vec![json!(5)]));
    let registry = PredicateRegistry::with_builtins();
    let executor = RuleExecutor::new(&registry);

    assert!(executor.evaluate(&tree, &record(json!({"score": 25}))).unwrap());
    assert!(!executor.evaluate(&tree, &record(json!({"score": 23}))).unwrap());
}

#[test]
fn test_shared_registry_between_engines() {
    let registry = PredicateRegistry::with_builtins().into_shared();
    let first = RuleEngine::new(MemoryRuleStore::new()).with_registry(registry.clone());
    let second = RuleEngine::new(MemoryRuleStore::new()).with_registry(registry);

    first
        .register_predicate(Predicate::new("is_senior", 0, |x, _| {
            Ok(x.as_i64().is_some_and(|age| age >= 60))
        }))
        .unwrap();

    let tree = Node::operand(Condition::predicate("age", "is_senior", vec![]));
    assert!(second.evaluate(&tree, &record(json!({"age": 61}))).unwrap());
}

// ==================== 错误传播测试 ====================

#[test]
fn test_no_short_circuit_on_or() {
    let tree = Node::or(
        Node::operand(Condition::new("salary", ">", 50000)),
        Node::operand(Condition::new("age", ">", 30)),
    );
    let engine = RuleEngine::new(MemoryRuleStore::new());

    let err = engine.evaluate(&tree, &record(json!({"salary": 60000}))).unwrap_err();
    assert!(matches!(
        err,
        RuleError::Evaluation(EvaluationError::MissingAttribute(ref attr)) if attr == "age"
    ));
}

#[test]
fn test_missing_attribute() {
    let engine = RuleEngine::new(MemoryRuleStore::new());
    let rule_id = engine.create_rule(AGE_AND_SALARY).unwrap();

    let err = engine
        .evaluate_rule(&rule_id, &record(json!({"salary": 60000})))
        .unwrap_err();
    assert!(matches!(err, RuleError::Evaluation(EvaluationError::MissingAttribute(_))));
}

#[test]
fn test_dispatch_policies() {
    let tree = Node::operand(Condition::new("age", "like", 30));
    let input = record(json!({"age": 30}));
    let registry = PredicateRegistry::with_builtins();

    assert!(!RuleExecutor::new(&registry).evaluate(&tree, &input).unwrap());
    assert!(
        RuleExecutor::new(&registry)
            .with_policy(DispatchPolicy::Strict)
            .evaluate(&tree, &input)
            .is_err()
    );
}

#[test]
fn test_unknown_rule_id() {
    let engine = RuleEngine::new(MemoryRuleStore::new());

    assert!(matches!(
        engine.evaluate_rule("does-not-exist", &employee(35, 60000)),
        Err(RuleError::RuleNotFound(_))
    ));
    assert!(matches!(
        engine.delete_rule("does-not-exist"),
        Err(RuleError::RuleNotFound(_))
    ));
}

// ==================== 序列化测试 ====================

#[test]
fn test_round_trip_nested_tree() {
    let tree = Node::and(
        Node::or(
            Node::operand(Condition::new("department", "=", "Sales")),
            Node::operand(Condition::new("experience", ">=", 5)),
        ),
        Node::and(
            Node::operand(Condition::predicate("age", "within_range", vec![json!(18), json!(65)])),
            Node::operand(Condition::new("salary", "<", 120000.5)),
        ),
    );

    let document = RuleSerializer::to_document(&tree);
    assert_eq!(RuleCompiler::compile(&document).unwrap(), tree);
}

#[test]
fn test_persisted_rule_keeps_its_result() {
    let engine = RuleEngine::new(MemoryRuleStore::new());
    let tree = Node::operator(
        Connective::Unrecognized("AND".to_string()),
        Node::operand(Condition::new("age", Comparator::Named(">".to_string()), 30)),
        Node::operand(Condition::new(
            "salary",
            Comparator::Named(">".to_string()),
            50000,
        )),
    );
    let user = record(json!({"age": 35, "salary": 60000}));

    assert!(engine.evaluate(&tree, &user).unwrap());

    let rule_id = engine.save_rule(&tree).unwrap();
    let rebuilt = engine.get_rule(&rule_id).unwrap();

    assert_eq!(rebuilt, tree);
    assert!(engine.evaluate(&rebuilt, &user).unwrap());
}

#[test]
fn test_modify_unknown_rule_reports_missing_rule() {
    let engine = RuleEngine::new(MemoryRuleStore::new());

    assert!(matches!(
        engine.modify_rule("does-not-exist", &json!({"colour": "red"})),
        Err(RuleError::RuleNotFound(_))
    ));
}

#[test]
fn test_combined_rule_evaluation() {
    let engine = RuleEngine::new(MemoryRuleStore::new());
    let adult = engine
        .create_rule(&operand_rule(
            json!({"attribute": "age", "comparator": ">", "value": 18}),
        ))
        .unwrap();
    let income = engine
        .create_rule(&operand_rule(
            json!({"attribute": "income", "comparator": ">", "value": 50000}),
        ))
        .unwrap();

    let combined = engine.combine_rules(&[adult, income], Connective::And).unwrap();
    let user = record(json!({"age": 25, "country": "USA", "income": 60000}));

    assert!(engine.evaluate(&combined, &user).unwrap());

    let rule_id = engine.save_rule(&combined).unwrap();
    assert_eq!(engine.get_rule(&rule_id).unwrap(), combined);
}
