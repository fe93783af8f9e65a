//! Implementation of the `cfgen gc` command.

use crate::project::Project;
use crate::GlobalArgs;

/// Runs the `cfgen gc` command, deleting artifact files the registry no
/// longer refers to.
pub fn run(global: &GlobalArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let project = Project::load(global)?;
    let cache = project.open_cache()?;
    let removed = cache.gc()?;
    if !global.quiet {
        println!("removed {removed} unreferenced artifact(s)");
    }
    Ok(0)
}
