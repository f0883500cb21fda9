//! Tick-driven incremental bake orchestration.
//!
//! Every call to [`BakeScheduler::tick`] recomputes the required output hashes,
//! diffs them against the baked state, and then does a bounded amount of work:
//! render one probe, or commit a finished job, or nothing at all. The host
//! calls it repeatedly (typically once per editor update) until it reports
//! [`TickReport::UpToDate`].
//!
//! At most one render job is in flight. A job is identified by the combined
//! hash of its add list; if the required add list changes between ticks the
//! running job is cancelled and a new one started.

use probebake_cache::{BakedRecord, BakedStateStore};
use probebake_common::{EntityId, Hash128};

use crate::collab::{EntityEnumerator, Renderer, TextureCache};
use crate::entity::{BakeableEntity, SceneStateHash};
use crate::error::BakeError;
use crate::fingerprint::{self, Fingerprinter};
use crate::reconcile::{self, BakeDiff};

/// Where the scheduler stands between two ticks.
///
/// Diffing runs at the start of every tick and is never observable from
/// outside.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BakePhase {
    /// Nothing in flight.
    Idle,
    /// A render job still has probes to render.
    Baking,
    /// Every probe in the job was submitted; the job commits on the first tick
    /// after the renderer reports completion.
    Committing,
}

/// Progress of the in-flight render job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BakeProgress {
    /// Probes processed so far, including failed ones.
    pub completed: usize,
    /// Probes whose render or write failed in this job.
    pub failed: usize,
    /// Probes in the job.
    pub total: usize,
}

impl BakeProgress {
    /// Fraction of the job processed, in `0.0..=1.0`.
    pub fn fraction(&self) -> f32 {
        if self.total == 0 {
            1.0
        } else {
            self.completed as f32 / self.total as f32
        }
    }
}

/// What a commit changed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CommitSummary {
    /// Records inserted into the baked state.
    pub added: usize,
    /// Records removed from the baked state.
    pub removed: usize,
    /// Adds skipped because their texture was missing or unreadable.
    pub deferred: usize,
}

/// Result of one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickReport {
    /// The baked state already matches the scene.
    UpToDate,
    /// A render job is in flight.
    Baking(BakeProgress),
    /// A job finished and was applied.
    Committed(CommitSummary),
    /// A pending cancel was honored; nothing was committed.
    Cancelled,
}

/// Settings that shape every fingerprint.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BakeSettings {
    /// Light bounces; above one, probes depend on each other.
    pub bounces: u32,
    /// Float quantization scale for state hashes.
    pub quantization: f32,
}

impl Default for BakeSettings {
    fn default() -> Self {
        Self {
            bounces: 1,
            quantization: 1000.0,
        }
    }
}

/// One distinct required output and the probes that produce it.
#[derive(Debug, Clone)]
struct BakeTarget {
    output_hash: Hash128,
    state_hash: Hash128,
    /// Lowest-id probe producing this output; it owns the baked record.
    entity: BakeableEntity,
    /// Every probe producing this output, ascending by id.
    owners: Vec<EntityId>,
}

/// Required outputs, sorted and deduplicated, and their diff against the store.
struct Plan {
    targets: Vec<BakeTarget>,
    diff: BakeDiff,
}

struct RenderJob {
    /// Combined hash of the job's output hashes.
    target_hash: Hash128,
    queue: Vec<BakeTarget>,
    cursor: usize,
    failed: usize,
}

impl RenderJob {
    fn new(target_hash: Hash128, queue: Vec<BakeTarget>) -> Self {
        Self {
            target_hash,
            queue,
            cursor: 0,
            failed: 0,
        }
    }

    fn is_exhausted(&self) -> bool {
        self.cursor >= self.queue.len()
    }

    fn progress(&self) -> BakeProgress {
        BakeProgress {
            completed: self.cursor,
            failed: self.failed,
            total: self.queue.len(),
        }
    }

    /// Renders the next probe in the queue, if any.
    fn step<R, C>(&mut self, renderer: &mut R, cache: &mut C) -> Result<(), BakeError>
    where
        R: Renderer,
        C: TextureCache<Texture = R::Texture>,
    {
        let Some(target) = self.queue.get(self.cursor) else {
            return Ok(());
        };
        self.cursor += 1;
        let id = target.entity.id;

        match renderer.render(&target.entity) {
            Ok(texture) => {
                let path = cache.cache_path(id, target.output_hash);
                if let Err(e) = cache.write_baked_texture(&texture, &path) {
                    self.failed += 1;
                    return Err(e.into());
                }
                tracing::debug!(
                    entity = %id,
                    kind = target.entity.kind.name(),
                    output = %target.output_hash,
                    "rendered probe"
                );
            }
            Err(e) => {
                self.failed += 1;
                tracing::warn!(entity = %id, error = %e, "probe render failed, will retry");
            }
        }
        Ok(())
    }
}

/// Incremental bake driver.
///
/// Owns the baked state and the collaborators it was constructed with. The
/// host is expected to serialize access; a multi-threaded host should wrap the
/// whole scheduler in one mutex.
pub struct BakeScheduler<E, R, C> {
    entities: E,
    renderer: R,
    cache: C,
    fingerprinter: Fingerprinter,
    bounces: u32,
    store: BakedStateStore,
    job: Option<RenderJob>,
    phase: BakePhase,
    cancel_requested: bool,
}

impl<E, R, C> BakeScheduler<E, R, C>
where
    E: EntityEnumerator<Handle = C::Handle>,
    R: Renderer,
    C: TextureCache<Texture = R::Texture>,
{
    /// Creates a scheduler over previously baked state.
    pub fn new(entities: E, renderer: R, cache: C, settings: BakeSettings, store: BakedStateStore) -> Self {
        Self {
            entities,
            renderer,
            cache,
            fingerprinter: Fingerprinter::new(settings.quantization),
            bounces: settings.bounces,
            store,
            job: None,
            phase: BakePhase::Idle,
            cancel_requested: false,
        }
    }

    /// Runs one bounded step of the bake.
    pub fn tick(&mut self, scene: &SceneStateHash) -> Result<TickReport, BakeError> {
        if self.cancel_requested {
            self.cancel_requested = false;
            self.abort_job();
            self.phase = BakePhase::Idle;
            tracing::info!("bake cancelled");
            return Ok(TickReport::Cancelled);
        }

        let plan = self.plan(scene);
        self.sync_baked_owners(&plan);
        tracing::debug!(
            adds = plan.diff.add_indices.len(),
            removes = plan.diff.remove_indices.len(),
            baked = self.store.len(),
            "diffed baked state"
        );

        if plan.diff.is_empty() {
            self.abort_job();
            self.phase = BakePhase::Idle;
            return Ok(TickReport::UpToDate);
        }

        if plan.diff.add_indices.is_empty() {
            self.abort_job();
        } else {
            let add_set_hash =
                Hash128::combine(plan.diff.add_indices.iter().map(|&j| plan.targets[j].output_hash));

            let stale = self
                .job
                .as_ref()
                .map_or(true, |job| job.target_hash != add_set_hash);
            if stale {
                if self.job.is_some() {
                    tracing::debug!("required probes changed, restarting render job");
                }
                self.abort_job();
                let queue = plan
                    .diff
                    .add_indices
                    .iter()
                    .map(|&j| plan.targets[j].clone())
                    .collect();
                self.job = Some(RenderJob::new(add_set_hash, queue));
            }

            if let Some(job) = self.job.as_mut() {
                if !(job.is_exhausted() && self.renderer.is_complete()) {
                    let stepped = job.step(&mut self.renderer, &mut self.cache);
                    self.phase = if job.is_exhausted() {
                        BakePhase::Committing
                    } else {
                        BakePhase::Baking
                    };
                    stepped?;
                    return Ok(TickReport::Baking(job.progress()));
                }
            }
        }

        let summary = self.commit(&plan);
        self.job = None;
        self.phase = BakePhase::Idle;
        tracing::info!(
            added = summary.added,
            removed = summary.removed,
            deferred = summary.deferred,
            "committed bake"
        );
        Ok(TickReport::Committed(summary))
    }

    /// Requests that the in-flight job be abandoned at the next tick.
    ///
    /// Already committed records are unaffected.
    pub fn cancel(&mut self) {
        self.cancel_requested = true;
    }

    /// Computes what the next tick would have to do, without doing it.
    pub fn pending(&self, scene: &SceneStateHash) -> BakeDiff {
        self.plan(scene).diff
    }

    /// Progress of the in-flight job, if any.
    pub fn progress(&self) -> Option<BakeProgress> {
        self.job.as_ref().map(RenderJob::progress)
    }

    /// Current phase.
    pub fn phase(&self) -> BakePhase {
        self.phase
    }

    /// Changes the bounce count used by later ticks.
    pub fn set_bounces(&mut self, bounces: u32) {
        self.bounces = bounces;
    }

    /// The baked state.
    pub fn store(&self) -> &BakedStateStore {
        &self.store
    }

    /// Consumes the scheduler and returns the baked state for persistence.
    pub fn into_store(self) -> BakedStateStore {
        self.store
    }

    /// The entity source.
    pub fn entities(&self) -> &E {
        &self.entities
    }

    /// Mutable access to the entity source, for hosts that edit the scene in place.
    pub fn entities_mut(&mut self) -> &mut E {
        &mut self.entities
    }

    /// The renderer.
    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    /// The texture cache.
    pub fn cache(&self) -> &C {
        &self.cache
    }

    fn abort_job(&mut self) {
        if self.job.take().is_some() {
            self.renderer.cancel();
        }
    }

    fn plan(&self, scene: &SceneStateHash) -> Plan {
        let probes = self.entities.active_probes();
        let custom = self.entities.custom_textures();

        let states: Vec<(EntityId, Hash128)> = probes
            .iter()
            .map(|p| (p.id, self.fingerprinter.state_hash(p)))
            .collect();
        let aggregate = fingerprint::aggregate_hash(&states, self.bounces, &custom, scene);

        let mut candidates: Vec<BakeTarget> = probes
            .into_iter()
            .zip(states)
            .map(|(entity, (_, state_hash))| BakeTarget {
                output_hash: fingerprint::output_hash(state_hash, aggregate),
                state_hash,
                entity,
                owners: Vec::new(),
            })
            .collect();
        candidates.sort_by(|a, b| {
            a.output_hash
                .cmp(&b.output_hash)
                .then(a.entity.id.cmp(&b.entity.id))
        });

        // Identical outputs collapse into one target so the required list is a set.
        let mut targets: Vec<BakeTarget> = Vec::with_capacity(candidates.len());
        for mut candidate in candidates {
            match targets.last_mut() {
                Some(last) if last.output_hash == candidate.output_hash => {
                    last.owners.push(candidate.entity.id);
                }
                _ => {
                    candidate.owners.push(candidate.entity.id);
                    targets.push(candidate);
                }
            }
        }

        let required: Vec<Hash128> = targets.iter().map(|t| t.output_hash).collect();
        let baked = self.store.output_hashes();
        let diff = reconcile::compare(&baked, &required);
        Plan { targets, diff }
    }

    /// Brings already-baked outputs in line with the probes producing them.
    ///
    /// A probe that starts sharing a baked output never appears as an add, so
    /// it is handed the existing texture here. Each record is also moved to
    /// the lowest id that still produces its output.
    fn sync_baked_owners(&mut self, plan: &Plan) {
        for target in &plan.targets {
            let Some(index) = self.store.find_by_output(target.output_hash) else {
                continue;
            };
            let Some(&record) = self.store.get(index) else {
                continue;
            };
            let owner = target.entity.id;
            if record.id != owner {
                tracing::debug!(from = %record.id, to = %owner, output = %target.output_hash, "reassigned baked record");
                self.store.set_id(index, owner);
            }

            let unattached: Vec<EntityId> = target
                .owners
                .iter()
                .copied()
                .filter(|&id| !self.entities.has_baked_texture(id))
                .collect();
            if unattached.is_empty() {
                continue;
            }
            let path = self.cache.cache_path(record.id, target.output_hash);
            match self.cache.import_from_cache(&path) {
                Ok(handle) => {
                    for id in unattached {
                        tracing::debug!(entity = %id, output = %target.output_hash, "attached existing baked texture");
                        self.entities.attach_baked_texture(id, handle.clone());
                    }
                }
                Err(e) => {
                    tracing::warn!(entity = %owner, error = %e, "failed to import existing baked texture");
                }
            }
        }
    }

    fn commit(&mut self, plan: &Plan) -> CommitSummary {
        let mut summary = CommitSummary::default();

        let removed: Vec<BakedRecord> = self.store.remove_at(&plan.diff.remove_indices);
        for record in &removed {
            if let Err(e) = self.cache.delete_asset(record) {
                tracing::warn!(
                    entity = %record.id,
                    output = %record.output_hash,
                    error = %e,
                    "failed to delete stale baked texture"
                );
            }
        }
        summary.removed = removed.len();

        for &j in &plan.diff.add_indices {
            let target = &plan.targets[j];
            let id = target.entity.id;
            let path = self.cache.cache_path(id, target.output_hash);
            if !self.cache.contains(&path) {
                tracing::warn!(entity = %id, path = %path.display(), "baked texture missing, deferring");
                summary.deferred += 1;
                continue;
            }
            match self.cache.import_from_cache(&path) {
                Ok(handle) => {
                    for &owner in &target.owners {
                        self.entities.attach_baked_texture(owner, handle.clone());
                    }
                    self.store.insert(id, target.state_hash, target.output_hash);
                    summary.added += 1;
                }
                Err(e) => {
                    tracing::warn!(entity = %id, error = %e, "failed to import baked texture, deferring");
                    summary.deferred += 1;
                }
            }
        }
        summary
    }
}
