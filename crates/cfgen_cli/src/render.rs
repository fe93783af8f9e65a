//! Implementation of the `cfgen render` command.
//!
//! Prints the Rust accessor source of every artifact of a subject, root
//! first, as the cache currently holds them.

use std::path::Path;

use cfgen_cache::ConfigCache;
use cfgen_compiler::render_rust;

use crate::project::Project;
use crate::{GlobalArgs, RenderArgs};

/// Runs the `cfgen render` command.
pub fn run(args: &RenderArgs, global: &GlobalArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let project = Project::load(global)?;
    let mut cache = project.open_cache()?;
    let source = render_subject(&mut cache, &args.subject)?;

    match &args.output {
        Some(path) => {
            std::fs::write(Path::new(path), &source)?;
            if !global.quiet {
                println!("wrote {path}");
            }
        }
        None => print!("{source}"),
    }
    Ok(0)
}

/// Renders every artifact of `subject` in pre-order.
pub fn render_subject(
    cache: &mut ConfigCache,
    subject: &str,
) -> Result<String, cfgen_cache::CacheError> {
    let root = cache.compile_artifact(subject)?;
    let mut pending = vec![root];
    let mut out = String::new();
    while let Some(name) = pending.pop() {
        let layout = cache.layout(&name)?;
        let spec = layout.spec();
        if !out.is_empty() {
            out.push('\n');
        }
        out.push_str(&render_rust(spec));
        // reversed so the first child is rendered next
        let children: Vec<String> = spec.children().map(str::to_string).collect();
        pending.extend(children.into_iter().rev());
    }
    Ok(out)
}
