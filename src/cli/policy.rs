use anyhow::{Context, Result};
use serde::Serialize;
use toolgate_config::ToolgateConfig;
use toolgate_core::PolicySet;

#[derive(Debug, Serialize)]
struct PolicyReport<'a> {
    key: &'a str,
    matched_prefix: Option<&'a str>,
    capacity: f64,
    refill_per_second: f64,
}

/// Print the policy a new bucket for `key` would receive.
pub fn handle_policy_command(config: &ToolgateConfig, key: &str, json: bool) -> Result<()> {
    let policies = PolicySet::from_config(&config.rate_limit)
        .context("Failed to build rate-limit policies from configuration")?;
    let policy = policies.resolve(key);
    let report = PolicyReport {
        key,
        matched_prefix: policies.matching_prefix(key),
        capacity: policy.capacity(),
        refill_per_second: policy.refill_rate(),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("key:               {}", report.key);
    match report.matched_prefix {
        Some(prefix) => println!("source:            override \"{prefix}\""),
        None => println!("source:            default"),
    }
    println!("capacity:          {}", report.capacity);
    if report.refill_per_second > 0.0 {
        println!("refill_per_second: {}", report.refill_per_second);
    } else {
        println!("refill_per_second: 0 (fixed allowance)");
    }
    Ok(())
}
