pub mod check;
pub mod eval;
pub mod graph;
pub mod topo;

use anyhow::{Context, Result, bail};

use formwork_compiler::{CompiledJourney, StepArtifact, compile_journey};

/// Load and compile a journey file, printing any diagnostics.
pub fn compile_file(path: &str) -> Result<CompiledJourney> {
    let content =
        std::fs::read_to_string(path).with_context(|| format!("failed to read {path}"))?;
    let definition: serde_json::Value =
        serde_json::from_str(&content).with_context(|| format!("{path} is not valid JSON"))?;
    match compile_journey(definition) {
        Ok(compiled) => {
            for diagnostic in &compiled.diagnostics {
                eprintln!("{diagnostic}");
            }
            Ok(compiled)
        }
        Err(diagnostics) => {
            for diagnostic in &diagnostics {
                eprintln!("{diagnostic}");
            }
            bail!("compilation failed with {} error(s)", diagnostics.error_count());
        }
    }
}

/// Pick a step artifact by path, or the first one.
pub fn pick_step<'a>(
    compiled: &'a CompiledJourney,
    step: Option<&str>,
) -> Result<&'a StepArtifact> {
    match step {
        Some(path) => compiled
            .step_artifact(path)
            .with_context(|| format!("no step at path {path}")),
        None => compiled
            .steps
            .values()
            .next()
            .context("journey has no steps"),
    }
}
