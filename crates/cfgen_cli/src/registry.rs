//! Implementation of the `cfgen registry` command.

use cfgen_cache::Registry;

use crate::project::Project;
use crate::{GlobalArgs, RegistryArgs, ReportFormat};

/// Runs the `cfgen registry` command, listing every registered artifact.
pub fn run(args: &RegistryArgs, global: &GlobalArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let project = Project::load(global)?;
    let root = project.config.cache_root(&project.dir);
    let Some(registry) = Registry::load(&root) else {
        if !global.quiet {
            println!("no registry at {}", root.display());
        }
        return Ok(0);
    };

    match args.format {
        ReportFormat::Json => println!("{}", serde_json::to_string_pretty(&registry)?),
        ReportFormat::Text => print!("{}", format_text(&registry)),
    }
    Ok(0)
}

/// One line per artifact: canonical name, fingerprint, subject and path.
fn format_text(registry: &Registry) -> String {
    let width = registry
        .entries
        .keys()
        .map(String::len)
        .max()
        .unwrap_or(0);
    let mut out = String::new();
    for (name, entry) in &registry.entries {
        out.push_str(&format!(
            "{name:<width$}  {}  {}  {}\n",
            entry.fingerprint,
            entry.subject,
            entry.path.display()
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::project::tests::fixture;

    #[test]
    fn text_lists_every_artifact() {
        let dir = fixture();
        let project = Project::from_dir(dir.path()).unwrap();
        {
            let mut cache = project.open_cache().unwrap();
            cache.compile_artifact("app::Settings").unwrap();
        }
        let registry = Registry::load(&project.config.cache_root(&project.dir)).unwrap();
        let text = format_text(&registry);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("cfgen::cache::app::Settings "));
        assert!(lines[1].contains("xxh3:"));
        assert!(lines[1].ends_with("Settings_1.cfga"));
    }

    #[test]
    fn empty_registry_prints_nothing() {
        assert_eq!(format_text(&Registry::new("0.1.0")), "");
    }
}
