//! The `probebake bake` command.
//!
//! Ticks the scheduler until the baked state matches the scene or the tick
//! limit is reached, then persists the manifest. Progress is logged through
//! `tracing`; the final summary goes to stdout.

use std::path::Path;

use probebake_cache::BakeManifest;
use probebake_core::{
    BakeScheduler, EntityEnumerator, Renderer, SceneStateHash, TextureCache, TickReport,
};

use crate::project::{Project, PROBEBAKE_VERSION};
use crate::{BakeArgs, GlobalArgs};

/// Totals accumulated over a bake run.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct BakeRunSummary {
    /// Ticks executed.
    pub ticks: u32,
    /// Records committed.
    pub added: usize,
    /// Records pruned.
    pub removed: usize,
    /// Adds still deferred at the last commit.
    pub deferred: usize,
    /// Whether the bake reached an up-to-date state.
    pub converged: bool,
}

/// Runs the bake command. Returns exit code 0 on convergence, 1 otherwise.
pub fn run(args: &BakeArgs, global: &GlobalArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let project = Project::load(global)?;
    let summary = bake_project(&project, args.max_ticks)?;

    if !global.quiet {
        println!(
            "{}: baked {} probe(s), pruned {} in {} tick(s)",
            project.config.project.name, summary.added, summary.removed, summary.ticks
        );
    }
    if summary.converged {
        Ok(0)
    } else {
        eprintln!(
            "warning: bake did not converge within {} ticks ({} probe(s) deferred)",
            args.max_ticks, summary.deferred
        );
        Ok(1)
    }
}

/// Bakes a loaded project and saves the resulting manifest.
pub fn bake_project(
    project: &Project,
    max_ticks: u32,
) -> Result<BakeRunSummary, Box<dyn std::error::Error>> {
    let mut scheduler = project.scheduler()?;
    let scene = scheduler.entities().state_hash();
    bake_with(&mut scheduler, &scene, max_ticks, &project.cache_dir())
}

/// Ticks `scheduler` until it is up to date or `max_ticks` runs out.
///
/// The manifest is saved even when a tick fails, so records committed earlier
/// in the run are kept; the tick error is returned afterwards.
fn bake_with<E, R, C>(
    scheduler: &mut BakeScheduler<E, R, C>,
    scene: &SceneStateHash,
    max_ticks: u32,
    cache_dir: &Path,
) -> Result<BakeRunSummary, Box<dyn std::error::Error>>
where
    E: EntityEnumerator<Handle = C::Handle>,
    R: Renderer,
    C: TextureCache<Texture = R::Texture>,
{
    let mut summary = BakeRunSummary::default();
    let mut failure = None;

    while summary.ticks < max_ticks {
        summary.ticks += 1;
        let report = match scheduler.tick(scene) {
            Ok(report) => report,
            Err(e) => {
                failure = Some(e);
                break;
            }
        };
        match report {
            TickReport::UpToDate => {
                summary.converged = true;
                break;
            }
            TickReport::Baking(progress) => {
                tracing::info!(
                    "baking {}/{} ({:.0}%)",
                    progress.completed,
                    progress.total,
                    progress.fraction() * 100.0
                );
            }
            TickReport::Committed(commit) => {
                summary.added += commit.added;
                summary.removed += commit.removed;
                summary.deferred = commit.deferred;
            }
            TickReport::Cancelled => {}
        }
    }

    BakeManifest::from_store(PROBEBAKE_VERSION, scheduler.store()).save(cache_dir)?;
    match failure {
        Some(e) => Err(e.into()),
        None => Ok(summary),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::project::test_support;
    use crate::renderer::HeadlessRenderer;
    use crate::scene::SceneFile;
    use probebake_cache::{BakedRecord, BakedStateStore, CacheError};
    use probebake_common::{EntityId, Hash128};
    use probebake_core::{BakeSettings, DiskTextureCache, ImportedTexture};
    use std::path::PathBuf;

    fn load(dir: &std::path::Path) -> Project {
        Project::load(&GlobalArgs {
            quiet: true,
            verbose: false,
            color: false,
            config: Some(dir.display().to_string()),
        })
        .unwrap()
    }

    #[test]
    fn bake_converges_and_persists() {
        let dir = tempfile::tempdir().unwrap();
        test_support::write_project(dir.path());
        let project = load(dir.path());

        let first = bake_project(&project, 50).unwrap();
        assert!(first.converged);
        assert_eq!(first.added, 2);
        assert_eq!(first.removed, 0);
        assert!(dir.path().join(".probebake-cache/bake-state.json").exists());

        let second = bake_project(&project, 50).unwrap();
        assert_eq!(
            second,
            BakeRunSummary {
                ticks: 1,
                converged: true,
                ..BakeRunSummary::default()
            }
        );
    }

    #[test]
    fn sky_change_replaces_every_texture() {
        let dir = tempfile::tempdir().unwrap();
        test_support::write_project(dir.path());
        let project = load(dir.path());
        bake_project(&project, 50).unwrap();

        test_support::write_scene(dir.path(), "sunset");
        let summary = bake_project(&project, 50).unwrap();
        assert!(summary.converged);
        assert_eq!(summary.added, 2);
        assert_eq!(summary.removed, 2);

        let textures = std::fs::read_dir(dir.path().join(".probebake-cache/textures"))
            .unwrap()
            .count();
        assert_eq!(textures, 2, "stale textures are deleted on commit");
    }

    /// Loses the second write and fails every write after it.
    struct FailingCache {
        inner: DiskTextureCache,
        writes: usize,
    }

    impl TextureCache for FailingCache {
        type Texture = Vec<u8>;
        type Handle = ImportedTexture;

        fn cache_path(&self, id: EntityId, output_hash: Hash128) -> PathBuf {
            self.inner.cache_path(id, output_hash)
        }

        fn write_baked_texture(&mut self, texture: &Vec<u8>, path: &Path) -> Result<(), CacheError> {
            self.writes += 1;
            match self.writes {
                1 => self.inner.write_baked_texture(texture, path),
                2 => Ok(()),
                _ => Err(CacheError::Io {
                    path: path.to_path_buf(),
                    source: std::io::Error::new(std::io::ErrorKind::Other, "disk full"),
                }),
            }
        }

        fn contains(&self, path: &Path) -> bool {
            self.inner.contains(path)
        }

        fn import_from_cache(&mut self, path: &Path) -> Result<ImportedTexture, CacheError> {
            self.inner.import_from_cache(path)
        }

        fn delete_asset(&mut self, record: &BakedRecord) -> Result<(), CacheError> {
            self.inner.delete_asset(record)
        }
    }

    #[test]
    fn write_failure_still_saves_committed_records() {
        let dir = tempfile::tempdir().unwrap();
        let cache_dir = dir.path().join(".probebake-cache");
        let scene = SceneFile::parse(
            r#"
[environment]
scene = "atrium-v1"
sky = "overcast"

[[probes]]
id = 1
kind = "reflection"
position = [0.0, 1.5, 0.0]
resolution = 8

[[probes]]
id = 2
kind = "reflection"
position = [4.0, 1.5, 0.0]
resolution = 8
"#,
        )
        .unwrap();
        let state = scene.state_hash();
        let mut scheduler = BakeScheduler::new(
            scene,
            HeadlessRenderer::new(),
            FailingCache {
                inner: DiskTextureCache::new(&cache_dir, "bake"),
                writes: 0,
            },
            BakeSettings::default(),
            BakedStateStore::new(),
        );

        let err = bake_with(&mut scheduler, &state, 50, &cache_dir).unwrap_err();
        assert!(err.to_string().contains("disk full"));
        assert_eq!(scheduler.store().len(), 1);

        let saved = BakeManifest::load(&cache_dir).expect("manifest saved despite the error");
        assert_eq!(saved.records, scheduler.store().records());
    }

    #[test]
    fn tick_limit_reports_non_convergence() {
        let dir = tempfile::tempdir().unwrap();
        test_support::write_project(dir.path());
        let project = load(dir.path());
        let summary = bake_project(&project, 1).unwrap();
        assert!(!summary.converged);
        assert_eq!(summary.ticks, 1);
    }
}
