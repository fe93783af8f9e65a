//! Implementation of the `cfgen show` command.

use crate::project::Project;
use crate::{GlobalArgs, ShowArgs};

/// Runs the `cfgen show` command.
///
/// Prints a fresh instance of the subject as JSON: defaults where declared,
/// `null` elsewhere, nested configurations inline.
pub fn run(args: &ShowArgs, global: &GlobalArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let project = Project::load(global)?;
    let mut cache = project.open_cache()?;
    let instance = cache.create_instance(&args.subject)?;

    let snapshot = instance.snapshot();
    let text = if args.compact {
        serde_json::to_string(&snapshot)?
    } else {
        serde_json::to_string_pretty(&snapshot)?
    };
    println!("{text}");
    Ok(0)
}

#[cfg(test)]
mod tests {
    use crate::project::tests::fixture;
    use crate::project::Project;

    #[test]
    fn snapshot_of_fixture() {
        let dir = fixture();
        let project = Project::from_dir(dir.path()).unwrap();
        let mut cache = project.open_cache().unwrap();
        let instance = cache.create_instance("app::Settings").unwrap();
        assert_eq!(
            instance.snapshot(),
            serde_json::json!({
                "count": 3,
                "tags": null,
                "inner": { "flag": true },
            })
        );
    }
}
