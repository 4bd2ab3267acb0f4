use anyhow::Result;

use super::{compile_file, pick_step};

pub fn run(file: &str, step: Option<&str>) -> Result<()> {
    let compiled = compile_file(file)?;
    let artifact = pick_step(&compiled, step)?;
    for id in &artifact.topo {
        match artifact.nodes.get(id) {
            Some(node) => println!("{id}\t{:?}", node.node_type()),
            None => println!("{id}"),
        }
    }
    Ok(())
}
