//! Implementation of the `cfgen compile` command.

use crate::project::Project;
use crate::{CompileArgs, GlobalArgs};

/// Runs the `cfgen compile` command.
///
/// Compiles each subject according to the configured strategy and flushes
/// the registry.
pub fn run(args: &CompileArgs, global: &GlobalArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let project = Project::load(global)?;
    let mut cache = project.open_cache()?;

    for subject in &args.subjects {
        let name = cache.compile_artifact(subject)?;
        if !global.quiet {
            println!("{subject} -> {name}");
        }
    }
    cache.flush()?;
    Ok(0)
}
