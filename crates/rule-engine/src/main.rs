//! 规则引擎演示程序
//!
//! 创建规则、针对用户数据评估、修改规则后再次评估。

use anyhow::Result;
use rule_engine::{MemoryRuleStore, Record, RuleEngine, RuleSerializer};
use rule_shared::config::AppConfig;
use rule_shared::observability;
use serde_json::json;
use tracing::{error, info};

const SAMPLE_RULE: &str = r#"
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

fn main() -> Result<()> {
    let config = AppConfig::load("rule-engine").unwrap_or_else(|e| {
        eprintln!("Failed to load config, using defaults: {}", e);
        AppConfig::default()
    });

    let obs_config = config
        .observability
        .clone()
        .with_service_name(&config.service_name);
    let _guard = observability::init(&obs_config)?;

    info!("Starting rule-engine demo...");

    let engine = RuleEngine::from_config(MemoryRuleStore::new(), &config.engine);

    let rule_id = engine.create_rule(SAMPLE_RULE)?;
    info!(rule_id = %rule_id, "Created rule");

    let user_data = Record::from_value(json!({
        "age": 35,
        "salary": 60000,
        "department": "Sales",
        "experience": 3
    }))?;

    match engine.evaluate_rule(&rule_id, &user_data) {
        Ok(matched) => info!(matched, "Rule evaluation result"),
        Err(e) => error!(error = %e, "Failed to evaluate rule"),
    }

    let modifications = json!({
        "operator": "OR",
        "left": {"value": {"attribute": "age", "comparator": ">", "value": 40}}
    });
    let modified = engine.modify_rule(&rule_id, &modifications)?;
    info!(rule = %RuleSerializer::to_json(&modified)?, "Rule modified");

    match engine.evaluate_rule(&rule_id, &user_data) {
        Ok(matched) => info!(matched, "Modified rule evaluation result"),
        Err(e) => error!(error = %e, "Failed to evaluate modified rule"),
    }

    info!("Demo complete");
    Ok(())
}
