use super::Invocation;
use anyhow::Context;
use melange_core::{
    config::Config, paths, phase::ProgramPhase, program::Program, store::Registry,
    types::ProgramKind,
};
use std::path::Path;

pub fn run(
    root: &Path,
    key: &str,
    name: &str,
    kind: &str,
    phase: Option<&str>,
    inv: &Invocation,
) -> anyhow::Result<()> {
    let kind: ProgramKind = kind.parse()?;
    let mut program = Program::new(key, name, kind)?;
    if let Some(phase) = phase {
        let phase: ProgramPhase = phase.parse()?;
        phase.apply(&mut program.timeline, kind, inv.now)?;
    }

    println!("Initializing {name} in: {}", root.display());

    if Config::create_default(root).context("failed to write config.yaml")? {
        println!("  created: {}", paths::CONFIG_FILE);
    } else {
        println!("  exists:  {}", paths::CONFIG_FILE);
    }

    let state_path = paths::state_path(root);
    if !state_path.exists() {
        Registry::new(program)
            .save(root)
            .context("failed to write state.yaml")?;
        println!("  created: {}", paths::STATE_FILE);
    } else {
        println!("  exists:  {}", paths::STATE_FILE);
    }

    Ok(())
}
