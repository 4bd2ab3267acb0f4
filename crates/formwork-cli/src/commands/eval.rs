use std::sync::Arc;

use anyhow::{Context, Result};
use serde_json::Value;

use formwork_runtime::{EvaluationContext, FunctionRegistry, RequestInfo, StepEngine};

use super::{compile_file, pick_step};

pub fn run(file: &str, step: Option<&str>, answers: Vec<String>) -> Result<()> {
    let compiled = compile_file(file)?;
    let artifact = pick_step(&compiled, step)?.clone();
    let step_path = artifact.step_path.clone();

    let engine = StepEngine::compile(artifact, Arc::new(FunctionRegistry::with_builtins()));
    let mut ctx = EvaluationContext::new(RequestInfo::new(step_path));
    for pair in answers {
        let (code, raw) = pair
            .split_once('=')
            .with_context(|| format!("expected CODE=VALUE, got `{pair}`"))?;
        let value = serde_json::from_str(raw).unwrap_or(Value::String(raw.to_owned()));
        ctx.seed_answer(code, value);
    }

    let load = pollster::block_on(engine.run_load(&mut ctx));
    if !load.is_continue() {
        println!("{}", serde_json::to_string_pretty(&load)?);
        return Ok(());
    }
    let evaluated = pollster::block_on(engine.evaluate_step(&mut ctx));
    if let Some(error) = evaluated.error {
        anyhow::bail!("evaluation failed: {error}");
    }
    println!(
        "{}",
        serde_json::to_string_pretty(&evaluated.value.unwrap_or(Value::Null))?
    );
    Ok(())
}
