//! The `probebake status` command.

use crate::project::Project;
use crate::{GlobalArgs, StatusArgs};

/// Prints what the next bake would do.
///
/// With `--check`, returns exit code 1 when anything is stale.
pub fn run(args: &StatusArgs, global: &GlobalArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let project = Project::load(global)?;
    let scheduler = project.scheduler()?;
    let diff = scheduler.pending(&scheduler.entities().state_hash());
    let store = scheduler.store();

    if !global.quiet {
        println!("project:  {}", project.config.project.name);
        println!("baked:    {} probe(s)", store.len());
        println!("to bake:  {}", diff.add_indices.len());
        println!("to prune: {}", diff.remove_indices.len());
        println!("state:    {}", store.combined_hash());
    }

    if args.check && !diff.is_empty() {
        return Ok(1);
    }
    Ok(0)
}
