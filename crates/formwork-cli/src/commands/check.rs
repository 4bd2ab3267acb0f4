use anyhow::Result;

use super::compile_file;

pub fn run(file: &str) -> Result<()> {
    let compiled = compile_file(file)?;
    println!(
        "ok: {} step(s): {}",
        compiled.steps.len(),
        compiled
            .step_paths()
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(", ")
    );
    Ok(())
}
