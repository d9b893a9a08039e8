use std::collections::{HashMap, HashSet};
use std::task::Poll;
use std::time::{Duration, Instant};

use dunes_assets::{AssetError, AssetProvider};
use dunes_common::NodeId;
use dunes_scene::{SceneGraph, SceneNode};
use glam::Vec3;

use crate::StreamError;
use crate::builder::{ChunkContentBuilder, PlacedObjectSpec, PoolSizes, TemplatePools};
use crate::config::StreamConfig;
use crate::grid::{self, ChunkCoord};
use crate::sampler::FieldSampler;

/// One live cell of the world and the object graph built for it.
#[derive(Debug)]
pub struct Chunk {
    pub coord: ChunkCoord,
    pub content: SceneNode,
}

impl Chunk {
    pub fn root_id(&self) -> NodeId {
        self.content.id
    }

    pub fn mesh_count(&self) -> usize {
        self.content.mesh_count()
    }
}

/// Whether the template pools chunks are built from are available.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Readiness {
    /// Still loading; chunks are not realized yet.
    #[default]
    Pending,
    Ready,
    /// A template failed to load. Chunks stay unrealized for the session.
    Failed,
}

/// What one `advance` call changed.
#[derive(Debug, Clone, Default)]
pub struct AdvanceReport {
    pub center: ChunkCoord,
    pub created: Vec<ChunkCoord>,
    pub evicted: Vec<ChunkCoord>,
    pub released_geometry: usize,
    pub released_material: usize,
    pub readiness: Readiness,
}

impl AdvanceReport {
    pub fn is_noop(&self) -> bool {
        self.created.is_empty() && self.evicted.is_empty()
    }
}

/// Per-frame and cumulative streaming statistics.
#[derive(Debug, Clone, Default)]
pub struct StreamStats {
    pub chunks_created_this_frame: usize,
    pub chunks_evicted_this_frame: usize,
    pub total_live_chunks: usize,
    pub total_live_meshes: usize,
    pub chunks_created_total: usize,
    pub chunks_evicted_total: usize,
    pub resources_released_total: usize,
    pub frame_time: Duration,
}

/// Keeps the chunks around the player materialized.
///
/// Owns the active-chunk table. Each `advance` evicts out-of-range chunks
/// (detach, then release every mesh node's geometry and material), polls the
/// template pools, and builds any missing chunk in the required window. A
/// call either fully realizes a chunk or leaves it absent.
pub struct ChunkStreamer {
    config: StreamConfig,
    builder: ChunkContentBuilder,
    container: NodeId,
    chunks: HashMap<ChunkCoord, Chunk>,
    required: HashSet<ChunkCoord>,
    center: Option<ChunkCoord>,
    pools: Option<TemplatePools>,
    readiness: Readiness,
    stats: StreamStats,
}

impl ChunkStreamer {
    pub fn new(config: StreamConfig) -> Result<Self, StreamError> {
        config.validate()?;
        let builder = ChunkContentBuilder::new(
            config.chunk_size,
            config.props.clone(),
            FieldSampler::new(config.seed),
        );
        let required = match config.bounds {
            Some(size) => grid::bounded_window(size, config.chunk_size),
            None => HashSet::new(),
        };
        Ok(Self {
            config,
            builder,
            container: NodeId::new(),
            chunks: HashMap::new(),
            required,
            center: None,
            pools: None,
            readiness: Readiness::Pending,
            stats: StreamStats::default(),
        })
    }

    pub fn config(&self) -> &StreamConfig {
        &self.config
    }

    /// Parent node every chunk graph is attached under.
    pub fn container(&self) -> NodeId {
        self.container
    }

    pub fn readiness(&self) -> Readiness {
        self.readiness
    }

    pub fn center(&self) -> Option<ChunkCoord> {
        self.center
    }

    pub fn is_bounded(&self) -> bool {
        self.config.bounds.is_some()
    }

    /// Bring the active-chunk table in line with the player's position.
    pub fn advance(
        &mut self,
        player: Vec3,
        assets: &mut impl AssetProvider,
        scene: &mut impl SceneGraph,
    ) -> AdvanceReport {
        let _span = tracing::info_span!("stream_advance").entered();
        let frame_start = Instant::now();

        let center = ChunkCoord::from_position(player, self.config.chunk_size);
        let mut report = AdvanceReport {
            center,
            ..AdvanceReport::default()
        };

        let moved = self.center != Some(center);
        if !moved && self.is_settled() {
            report.readiness = self.readiness;
            self.record(&report, frame_start.elapsed());
            return report;
        }
        if moved {
            tracing::debug!(%center, "player entered chunk");
            self.center = Some(center);
            if !self.is_bounded() {
                self.required = grid::window(center, self.config.render_distance);
            }
        }

        // Evictions land before any creation so no coordinate is ever held twice.
        if !self.is_bounded() {
            self.evict_out_of_range(scene, &mut report);
        }

        self.poll_templates(assets);
        report.readiness = self.readiness;

        if let Some(pools) = &self.pools {
            let mut missing: Vec<ChunkCoord> = self
                .required
                .iter()
                .filter(|c| !self.chunks.contains_key(c))
                .copied()
                .collect();
            missing.sort();
            for coord in missing {
                let content = self.builder.build(coord, pools);
                tracing::debug!(%coord, meshes = content.mesh_count(), "creating chunk");
                scene.attach(self.container, &content);
                self.chunks.insert(coord, Chunk { coord, content });
                report.created.push(coord);
            }
        }

        self.record(&report, frame_start.elapsed());
        tracing::trace!(
            created = report.created.len(),
            evicted = report.evicted.len(),
            total = self.chunks.len(),
            "stream advance complete"
        );
        report
    }

    fn is_settled(&self) -> bool {
        match self.readiness {
            Readiness::Pending => false,
            Readiness::Ready => self.chunks.len() == self.required.len(),
            Readiness::Failed => true,
        }
    }

    fn evict_out_of_range(&mut self, scene: &mut impl SceneGraph, report: &mut AdvanceReport) {
        let mut stale: Vec<ChunkCoord> = self
            .chunks
            .keys()
            .filter(|c| !self.required.contains(c))
            .copied()
            .collect();
        stale.sort();
        for coord in stale {
            let Some(chunk) = self.chunks.remove(&coord) else {
                continue;
            };
            let (geometry, material) = self.release(chunk, scene);
            tracing::debug!(%coord, geometry, material, "evicted chunk");
            report.released_geometry += geometry;
            report.released_material += material;
            report.evicted.push(coord);
        }
    }

    /// Detach a chunk and release the resources of every mesh node in it.
    fn release(&self, chunk: Chunk, scene: &mut impl SceneGraph) -> (usize, usize) {
        scene.detach(self.container, chunk.content.id);
        let mut released = 0;
        chunk.content.traverse(&mut |node| {
            if node.mesh.is_some() {
                scene.release_geometry(node);
                scene.release_material(node);
                released += 1;
            }
        });
        (released, released)
    }

    fn poll_templates(&mut self, assets: &mut impl AssetProvider) {
        if self.readiness != Readiness::Pending {
            return;
        }
        let props = &self.config.props;
        let polls = [
            assets.resolve_many(&props.ground.models),
            assets.resolve_many(&props.rocks.models),
            assets.resolve_many(&props.cacti.models),
            assets.resolve_many(&props.trees.models),
        ];

        let mut pending = false;
        let mut failure: Option<AssetError> = None;
        let mut ready = Vec::with_capacity(polls.len());
        for poll in polls {
            match poll {
                Poll::Ready(Ok(handles)) => ready.push(handles),
                Poll::Ready(Err(e)) => {
                    failure.get_or_insert(e);
                }
                Poll::Pending => pending = true,
            }
        }

        if let Some(e) = failure {
            tracing::error!("terrain templates unavailable, chunks stay unrealized: {e}");
            self.readiness = Readiness::Failed;
            return;
        }
        if pending {
            return;
        }
        let mut ready = ready.into_iter();
        let mut next = || ready.next().unwrap_or_default();
        let pools = TemplatePools {
            ground: next(),
            rocks: next(),
            cacti: next(),
            trees: next(),
        };
        tracing::info!(sizes = ?pools.sizes(), "terrain templates ready");
        self.pools = Some(pools);
        self.readiness = Readiness::Ready;
    }

    fn record(&mut self, report: &AdvanceReport, frame_time: Duration) {
        let stats = &mut self.stats;
        stats.chunks_created_this_frame = report.created.len();
        stats.chunks_evicted_this_frame = report.evicted.len();
        stats.total_live_chunks = self.chunks.len();
        stats.total_live_meshes = self.chunks.values().map(Chunk::mesh_count).sum();
        stats.chunks_created_total += report.created.len();
        stats.chunks_evicted_total += report.evicted.len();
        stats.resources_released_total += report.released_geometry + report.released_material;
        stats.frame_time = frame_time;
    }

    /// Coordinates that must be materialized for the last known position.
    pub fn required(&self) -> &HashSet<ChunkCoord> {
        &self.required
    }

    pub fn chunk(&self, coord: ChunkCoord) -> Option<&Chunk> {
        self.chunks.get(&coord)
    }

    pub fn chunks(&self) -> impl Iterator<Item = &Chunk> {
        self.chunks.values()
    }

    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    /// Placement specs a chunk at `coord` has (or would have) once templates are ready.
    pub fn specs_for(&self, coord: ChunkCoord) -> Vec<PlacedObjectSpec> {
        let sizes = match &self.pools {
            Some(pools) => pools.sizes(),
            None => PoolSizes::from(&self.config.props),
        };
        self.builder.specs(coord, sizes)
    }

    pub fn stats(&self) -> &StreamStats {
        &self.stats
    }

    /// Check the active-chunk table against the required window.
    pub fn check_invariants(&self) -> Result<(), StreamError> {
        for (coord, chunk) in &self.chunks {
            if chunk.coord != *coord {
                return Err(StreamError::InvariantViolation(format!(
                    "chunk {} stored under {coord}",
                    chunk.coord
                )));
            }
            if !self.required.contains(coord) {
                return Err(StreamError::InvariantViolation(format!(
                    "chunk {coord} outside the required window"
                )));
            }
        }
        if self.readiness == Readiness::Ready && self.chunks.len() != self.required.len() {
            return Err(StreamError::InvariantViolation(format!(
                "{} chunks live but {} required",
                self.chunks.len(),
                self.required.len()
            )));
        }
        Ok(())
    }

    /// Evict every chunk. Used on shutdown and teleport-style resets.
    pub fn clear(&mut self, scene: &mut impl SceneGraph) -> AdvanceReport {
        let mut report = AdvanceReport {
            center: self.center.unwrap_or_default(),
            readiness: self.readiness,
            ..AdvanceReport::default()
        };
        let mut coords: Vec<ChunkCoord> = self.chunks.keys().copied().collect();
        coords.sort();
        for coord in coords {
            if let Some(chunk) = self.chunks.remove(&coord) {
                let (geometry, material) = self.release(chunk, scene);
                report.released_geometry += geometry;
                report.released_material += material;
                report.evicted.push(coord);
            }
        }
        self.center = None;
        self.record(&report, Duration::ZERO);
        tracing::debug!(evicted = report.evicted.len(), "cleared all chunks");
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dunes_assets::{MemorySource, ModelCache, ProceduralSource};
    use dunes_scene::RecordingScene;

    fn config(chunk_size: f32, render_distance: i32) -> StreamConfig {
        StreamConfig {
            chunk_size,
            render_distance,
            ..StreamConfig::default()
        }
    }

    fn cache() -> ModelCache {
        ModelCache::new(ProceduralSource::new())
    }

    /// Streamer whose templates are loaded and whose window around `start` is built.
    fn warmed(
        config: StreamConfig,
        start: Vec3,
    ) -> (ChunkStreamer, ModelCache, RecordingScene) {
        let mut streamer = ChunkStreamer::new(config).unwrap();
        let mut assets = cache();
        let mut scene = RecordingScene::new();
        let first = streamer.advance(start, &mut assets, &mut scene);
        assert_eq!(first.readiness, Readiness::Pending);
        assert!(first.created.is_empty());
        assets.pump();
        let second = streamer.advance(start, &mut assets, &mut scene);
        assert_eq!(second.readiness, Readiness::Ready);
        (streamer, assets, scene)
    }

    fn coords(xs: std::ops::RangeInclusive<i32>, zs: std::ops::RangeInclusive<i32>) -> HashSet<ChunkCoord> {
        xs.flat_map(|x| zs.clone().map(move |z| ChunkCoord::new(x, z)))
            .collect()
    }

    fn live(streamer: &ChunkStreamer) -> HashSet<ChunkCoord> {
        streamer.chunks().map(|c| c.coord).collect()
    }

    #[test]
    fn rejects_invalid_config() {
        assert!(matches!(
            ChunkStreamer::new(config(-1.0, 1)),
            Err(StreamError::InvalidConfig(_))
        ));
    }

    #[test]
    fn initial_window_is_nine_chunks() {
        let (streamer, _, scene) = warmed(config(50.0, 1), Vec3::ZERO);
        assert_eq!(live(&streamer), coords(-1..=1, -1..=1));
        assert_eq!(scene.children_of(streamer.container()), 9);
        assert!(streamer.check_invariants().is_ok());
    }

    #[test]
    fn moving_one_chunk_shifts_the_window() {
        let (mut streamer, mut assets, mut scene) = warmed(config(50.0, 1), Vec3::ZERO);
        let kept: HashMap<ChunkCoord, NodeId> = streamer
            .chunks()
            .filter(|c| c.coord.x >= 0)
            .map(|c| (c.coord, c.root_id()))
            .collect();

        let report = streamer.advance(Vec3::new(60.0, 0.0, 0.0), &mut assets, &mut scene);

        assert_eq!(report.center, ChunkCoord::new(1, 0));
        assert_eq!(live(&streamer), coords(0..=2, -1..=1));
        let evicted: HashSet<ChunkCoord> = report.evicted.iter().copied().collect();
        let created: HashSet<ChunkCoord> = report.created.iter().copied().collect();
        assert_eq!(evicted, coords(-1..=-1, -1..=1));
        assert_eq!(created, coords(2..=2, -1..=1));

        // untouched rows are the same instances, not rebuilt
        for (coord, id) in kept {
            assert_eq!(streamer.chunk(coord).map(Chunk::root_id), Some(id));
        }
        assert_eq!(scene.attached_count(), 9);
        assert_eq!(scene.leaked(), 0);
    }

    #[test]
    fn teleport_converges_in_one_call() {
        let (mut streamer, mut assets, mut scene) = warmed(config(50.0, 1), Vec3::ZERO);
        let report = streamer.advance(Vec3::new(10000.0, 0.0, 10000.0), &mut assets, &mut scene);

        assert_eq!(report.center, ChunkCoord::new(200, 200));
        assert_eq!(report.evicted.len(), 9);
        assert_eq!(report.created.len(), 9);
        assert_eq!(live(&streamer), coords(199..=201, 199..=201));
        assert!(streamer.check_invariants().is_ok());
        assert_eq!(scene.leaked(), 0);
    }

    #[test]
    fn distant_position_saturates_instead_of_overflowing() {
        let (mut streamer, mut assets, mut scene) = warmed(config(50.0, 1), Vec3::ZERO);
        let report = streamer.advance(Vec3::new(1.0e12, 0.0, 0.0), &mut assets, &mut scene);

        assert_eq!(report.center, ChunkCoord::new(i32::MAX, 0));
        assert_eq!(report.evicted.len(), 9);
        assert_eq!(live(&streamer), coords(i32::MAX - 1..=i32::MAX, -1..=1));
        assert!(streamer.check_invariants().is_ok());

        streamer.advance(Vec3::ZERO, &mut assets, &mut scene);
        assert_eq!(live(&streamer), coords(-1..=1, -1..=1));
        assert_eq!(scene.attached_count(), 9);
        assert_eq!(scene.leaked(), 0);
    }

    #[test]
    fn eviction_releases_every_mesh() {
        let (mut streamer, mut assets, mut scene) = warmed(config(50.0, 1), Vec3::ZERO);
        let doomed: usize = streamer
            .chunks()
            .filter(|c| c.coord.x == -1)
            .map(Chunk::mesh_count)
            .sum();
        assert!(doomed > 3);

        let before = scene.geometry_releases();
        let report = streamer.advance(Vec3::new(60.0, 0.0, 0.0), &mut assets, &mut scene);

        assert_eq!(report.released_geometry, doomed);
        assert_eq!(report.released_material, doomed);
        assert_eq!(scene.geometry_releases() - before, doomed);
        assert_eq!(scene.material_releases(), doomed);
        assert_eq!(scene.double_releases(), 0);
    }

    #[test]
    fn long_flight_never_leaks() {
        let (mut streamer, mut assets, mut scene) = warmed(config(50.0, 2), Vec3::ZERO);
        for step in 0..400 {
            let t = step as f32;
            let pos = Vec3::new(t * 7.5, 20.0, (t * 0.05).sin() * 300.0);
            streamer.advance(pos, &mut assets, &mut scene);
            assert!(streamer.chunk_count() <= 25);
            assert!(streamer.check_invariants().is_ok());
        }
        assert_eq!(scene.leaked(), 0);
        assert_eq!(scene.attached_count(), 25);
        let stats = streamer.stats();
        assert_eq!(
            stats.chunks_created_total - stats.chunks_evicted_total,
            stats.total_live_chunks
        );
    }

    #[test]
    fn pending_templates_realize_nothing() {
        let mut streamer = ChunkStreamer::new(config(50.0, 1)).unwrap();
        let mut assets = cache().with_loads_per_pump(1);
        let mut scene = RecordingScene::new();

        for _ in 0..3 {
            let report = streamer.advance(Vec3::ZERO, &mut assets, &mut scene);
            assert_eq!(report.readiness, Readiness::Pending);
            assert_eq!(streamer.chunk_count(), 0);
            assert_eq!(scene.attach_calls(), 0);
            assets.pump();
        }
        while !assets.is_idle() {
            assets.pump();
        }
        let report = streamer.advance(Vec3::ZERO, &mut assets, &mut scene);
        assert_eq!(report.readiness, Readiness::Ready);
        assert_eq!(report.created.len(), 9);
    }

    #[test]
    fn moving_while_pending_has_nothing_to_evict() {
        let mut streamer = ChunkStreamer::new(config(50.0, 1)).unwrap();
        let mut assets = cache();
        let mut scene = RecordingScene::new();
        streamer.advance(Vec3::ZERO, &mut assets, &mut scene);
        let report = streamer.advance(Vec3::new(500.0, 0.0, 0.0), &mut assets, &mut scene);
        assert!(report.evicted.is_empty());
        assert_eq!(scene.detach_calls(), 0);
    }

    #[test]
    fn failed_template_leaves_world_unrealized() {
        let cfg = config(50.0, 1);
        let source = MemorySource::new().with_failure("/desert/Ground_01.gltf", "bad buffer");
        let mut assets = ModelCache::new(source);
        let mut streamer = ChunkStreamer::new(cfg).unwrap();
        let mut scene = RecordingScene::new();

        streamer.advance(Vec3::ZERO, &mut assets, &mut scene);
        assets.pump();
        let report = streamer.advance(Vec3::ZERO, &mut assets, &mut scene);
        assert_eq!(report.readiness, Readiness::Failed);
        assert_eq!(streamer.chunk_count(), 0);

        // no retry: nothing new is queued on later frames
        let report = streamer.advance(Vec3::new(200.0, 0.0, 0.0), &mut assets, &mut scene);
        assert_eq!(report.readiness, Readiness::Failed);
        assert!(assets.is_idle());
        assert_eq!(scene.attach_calls(), 0);
        assert!(streamer.check_invariants().is_ok());
    }

    #[test]
    fn revisiting_rebuilds_identical_content() {
        let (mut streamer, mut assets, mut scene) = warmed(config(50.0, 1), Vec3::ZERO);
        let origin = ChunkCoord::new(0, 0);
        let first = streamer.chunk(origin).map(|c| c.content.clone()).unwrap();

        streamer.advance(Vec3::new(1000.0, 0.0, 0.0), &mut assets, &mut scene);
        assert!(streamer.chunk(origin).is_none());
        streamer.advance(Vec3::ZERO, &mut assets, &mut scene);
        let second = streamer.chunk(origin).unwrap();

        assert_ne!(first.id, second.content.id);
        assert_eq!(first.children.len(), second.content.children.len());
        for (a, b) in first.children.iter().zip(&second.content.children) {
            assert_eq!(a.transform, b.transform);
            assert_eq!(a.mesh_count(), b.mesh_count());
        }
    }

    #[test]
    fn no_coordinate_is_attached_twice() {
        let (mut streamer, mut assets, mut scene) = warmed(config(50.0, 1), Vec3::ZERO);
        for x in [0.0, 60.0, -10.0, 60.0, 130.0, 0.0] {
            streamer.advance(Vec3::new(x, 0.0, 0.0), &mut assets, &mut scene);
            assert_eq!(scene.children_of(streamer.container()), streamer.chunk_count());
        }
        assert_eq!(
            scene.attach_calls() - scene.detach_calls(),
            streamer.chunk_count()
        );
    }

    #[test]
    fn same_cell_is_a_noop() {
        let (mut streamer, mut assets, mut scene) = warmed(config(50.0, 1), Vec3::ZERO);
        let attaches = scene.attach_calls();
        let report = streamer.advance(Vec3::new(49.0, 10.0, 49.0), &mut assets, &mut scene);
        assert!(report.is_noop());
        assert_eq!(scene.attach_calls(), attaches);
    }

    #[test]
    fn bounded_world_builds_once_and_never_evicts() {
        let cfg = StreamConfig {
            bounds: Some(500.0),
            ..config(50.0, 1)
        };
        let (mut streamer, mut assets, mut scene) = warmed(cfg, Vec3::ZERO);
        assert_eq!(streamer.chunk_count(), 121);

        let report = streamer.advance(Vec3::new(5000.0, 0.0, -5000.0), &mut assets, &mut scene);
        assert!(report.is_noop());
        assert_eq!(streamer.chunk_count(), 121);
        assert_eq!(scene.detach_calls(), 0);
        assert!(streamer.check_invariants().is_ok());
    }

    #[test]
    fn specs_match_built_content() {
        let (streamer, _, _) = warmed(config(50.0, 1), Vec3::ZERO);
        let coord = ChunkCoord::new(1, -1);
        let chunk = streamer.chunk(coord).unwrap();
        let specs = streamer.specs_for(coord);
        assert_eq!(specs.len(), chunk.content.children.len());
        let origin = coord.origin(50.0);
        for (spec, child) in specs.iter().zip(&chunk.content.children) {
            let world = spec.world_position(coord, 50.0);
            assert_eq!(world, origin + child.transform.position);
        }
    }

    #[test]
    fn clear_releases_everything() {
        let (mut streamer, _, mut scene) = warmed(config(50.0, 1), Vec3::ZERO);
        let report = streamer.clear(&mut scene);
        assert_eq!(report.evicted.len(), 9);
        assert_eq!(streamer.chunk_count(), 0);
        assert_eq!(scene.attached_count(), 0);
        assert_eq!(scene.leaked(), 0);
        assert_eq!(scene.live_geometry(), 0);
    }
}
