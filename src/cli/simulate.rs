use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Serialize;
use serde_json::{Value, json};
use std::sync::Arc;
use std::time::Duration;
use toolgate_config::ToolgateConfig;
use toolgate_core::{
    CallerIdentity, RateLimiter, Tool, ToolInvoker, limiter_key, spawn_idle_sweeper,
};

/// Simulate command options
#[derive(Debug, Clone)]
pub struct SimulateOptions {
    pub tool: String,
    pub identity: String,
    pub calls: u32,
    pub cost: f64,
    pub interval: Duration,
    pub json: bool,
}

/// Stand-in tool that charges a fixed cost and always answers from its mock.
struct SimulatedTool {
    name: String,
    cost: f64,
}

#[async_trait]
impl Tool for SimulatedTool {
    fn name(&self) -> &str {
        &self.name
    }

    fn cost(&self, _args: &Value) -> f64 {
        self.cost
    }

    fn mock_response(&self, args: &Value) -> Value {
        json!({ "call": args["call"] })
    }

    async fn process(&self, args: Value) -> Result<Value> {
        Ok(args)
    }
}

#[derive(Debug, Serialize)]
struct SimulationReport {
    key: String,
    capacity: f64,
    refill_per_second: f64,
    calls: u32,
    admitted: u32,
    denied: u32,
    last_retry_after_secs: Option<f64>,
    remaining_tokens: Option<f64>,
}

/// Push `calls` invocations through a fresh limiter built from `config`.
pub async fn handle_simulate_command(
    config: &ToolgateConfig,
    options: SimulateOptions,
) -> Result<()> {
    let limiter = Arc::new(
        RateLimiter::from_config(&config.rate_limit)
            .context("Failed to build rate limiter from configuration")?,
    );
    let _sweeper = config
        .rate_limit
        .sweep_interval()
        .map(|interval| {
            spawn_idle_sweeper(Arc::clone(&limiter), interval, config.rate_limit.idle_ttl())
        })
        .transpose()
        .context("Failed to start idle bucket sweeper")?;
    let invoker = ToolInvoker::new(Arc::clone(&limiter)).with_mock_mode(true);

    let tool = SimulatedTool {
        name: options.tool,
        cost: options.cost,
    };
    let identity = CallerIdentity::new(options.identity);
    let key = limiter_key(tool.name(), &identity);
    let policy = limiter.policy_for(&key);

    let mut admitted = 0u32;
    let mut denied = 0u32;
    let mut last_retry_after = None;

    for call in 0..options.calls {
        if call > 0 && !options.interval.is_zero() {
            tokio::time::sleep(options.interval).await;
        }

        match invoker
            .try_execute(&tool, &identity, json!({ "call": call }))
            .await
        {
            Ok(_) => admitted += 1,
            Err(err) if err.is_rate_limited() => {
                denied += 1;
                last_retry_after = err.retry_after();
            }
            Err(err) => {
                let call = call + 1;
                return Err(anyhow::Error::new(err)
                    .context(format!("Simulation aborted at call {call}")));
            }
        }
    }

    let report = SimulationReport {
        remaining_tokens: limiter.snapshot(&key).map(|snapshot| snapshot.tokens),
        key,
        capacity: policy.capacity(),
        refill_per_second: policy.refill_rate(),
        calls: options.calls,
        admitted,
        denied,
        last_retry_after_secs: last_retry_after.map(|wait| wait.as_secs_f64()),
    };

    if options.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("key:        {}", report.key);
    println!(
        "policy:     capacity {} refilling {}/s",
        report.capacity, report.refill_per_second
    );
    println!("admitted:   {}", report.admitted);
    println!("denied:     {}", report.denied);
    match report.last_retry_after_secs {
        Some(wait) => println!("retry hint: {wait:.3}s"),
        None if report.denied > 0 => println!("retry hint: none (reset required)"),
        None => {}
    }
    Ok(())
}
