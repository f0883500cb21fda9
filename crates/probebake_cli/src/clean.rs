//! The `probebake clean` command.

use probebake_cache::{BakeManifest, TextureStore};

use crate::project::{Project, PROBEBAKE_VERSION};
use crate::GlobalArgs;

/// Deletes texture artifacts no baked record refers to.
pub fn run(global: &GlobalArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let project = Project::load(global)?;
    let removed = clean_project(&project)?;
    if !global.quiet {
        println!("removed {removed} orphaned texture(s)");
    }
    Ok(0)
}

/// Garbage-collects the project's texture directory. Returns the number of files removed.
pub fn clean_project(project: &Project) -> Result<usize, Box<dyn std::error::Error>> {
    let cache_dir = project.cache_dir();
    let store = BakeManifest::load_or_new(&cache_dir, PROBEBAKE_VERSION).into_store();
    let textures = TextureStore::new(&cache_dir, &project.config.cache.texture_ext);
    let removed = textures.gc(&store.output_hashes())?;
    tracing::debug!(removed, live = store.len(), "cleaned texture cache");
    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bake::bake_project;
    use crate::project::test_support;
    use probebake_common::Hash128;

    #[test]
    fn clean_keeps_live_textures() {
        let dir = tempfile::tempdir().unwrap();
        test_support::write_project(dir.path());
        let project = Project::load(&GlobalArgs {
            quiet: true,
            verbose: false,
            color: false,
            config: Some(dir.path().display().to_string()),
        })
        .unwrap();
        bake_project(&project, 50).unwrap();

        let textures = TextureStore::new(&project.cache_dir(), "bake");
        textures.write(Hash128::of(b"orphan"), b"stale").unwrap();

        assert_eq!(clean_project(&project).unwrap(), 1);
        assert_eq!(clean_project(&project).unwrap(), 0);
        let remaining = std::fs::read_dir(textures.root()).unwrap().count();
        assert_eq!(remaining, 2);
    }
}
