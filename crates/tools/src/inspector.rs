use std::fmt;
use std::time::Duration;

use dunes_common::NodeId;
use dunes_kernel::Game;
use dunes_stream::{ChunkCoord, PropCategory, Readiness};
use glam::Vec3;

/// Game inspector for developer tooling.
pub struct GameInspector;

impl GameInspector {
    /// Produce a summary of the game state.
    pub fn summary(game: &Game) -> GameSummary {
        let streamer = game.streamer();
        let stats = streamer.stats();
        let report = game.last_report();
        GameSummary {
            tick: game.tick(),
            paused: game.is_paused(),
            player: game.airplane().position(),
            center: streamer.center(),
            active_chunks: streamer.chunk_count(),
            live_meshes: stats.total_live_meshes,
            readiness: streamer.readiness(),
            created_last: report.created.len(),
            evicted_last: report.evicted.len(),
            created_total: stats.chunks_created_total,
            evicted_total: stats.chunks_evicted_total,
            released_total: stats.resources_released_total,
            avg_frame: game.tick_timer().average(),
            max_frame: game.tick_timer().max(),
        }
    }

    /// Details of one live chunk.
    pub fn inspect_chunk(game: &Game, coord: ChunkCoord) -> Option<ChunkInfo> {
        let streamer = game.streamer();
        streamer.chunk(coord).map(|chunk| {
            let specs = streamer.specs_for(coord);
            let count = |c: PropCategory| specs.iter().filter(|s| s.category == c).count();
            ChunkInfo {
                coord,
                root: chunk.root_id(),
                origin: coord.origin(streamer.config().chunk_size),
                objects: chunk.content.children.len(),
                meshes: chunk.mesh_count(),
                rocks: count(PropCategory::Rocks),
                cacti: count(PropCategory::Cacti),
                trees: count(PropCategory::Trees),
            }
        })
    }

    /// Live chunk coordinates, sorted.
    pub fn list_chunks(game: &Game) -> Vec<ChunkCoord> {
        let mut coords: Vec<ChunkCoord> = game.streamer().chunks().map(|c| c.coord).collect();
        coords.sort();
        coords
    }
}

/// Summary of game state for the inspector.
#[derive(Debug, Clone)]
pub struct GameSummary {
    pub tick: u64,
    pub paused: bool,
    pub player: Vec3,
    pub center: Option<ChunkCoord>,
    pub active_chunks: usize,
    pub live_meshes: usize,
    pub readiness: Readiness,
    pub created_last: usize,
    pub evicted_last: usize,
    pub created_total: usize,
    pub evicted_total: usize,
    pub released_total: usize,
    pub avg_frame: Duration,
    pub max_frame: Duration,
}

impl fmt::Display for GameSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let center = self
            .center
            .map(|c| c.to_string())
            .unwrap_or_else(|| "-".into());
        writeln!(
            f,
            "Game: tick={} paused={} player=({:.2}, {:.2}, {:.2}) chunk={}",
            self.tick, self.paused, self.player.x, self.player.y, self.player.z, center
        )?;
        writeln!(
            f,
            "Terrain: {:?} chunks={} meshes={} last(+{} -{}) total(+{} -{}) released={}",
            self.readiness,
            self.active_chunks,
            self.live_meshes,
            self.created_last,
            self.evicted_last,
            self.created_total,
            self.evicted_total,
            self.released_total
        )?;
        write!(f, "Frame: avg={:?} max={:?}", self.avg_frame, self.max_frame)
    }
}

/// Detailed info about a single chunk.
#[derive(Debug, Clone)]
pub struct ChunkInfo {
    pub coord: ChunkCoord,
    pub root: NodeId,
    pub origin: Vec3,
    pub objects: usize,
    pub meshes: usize,
    pub rocks: usize,
    pub cacti: usize,
    pub trees: usize,
}

impl fmt::Display for ChunkInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Chunk {} [{}] origin=({:.1}, {:.1}) objects={} meshes={} rocks={} cacti={} trees={}",
            self.coord,
            self.root.short(),
            self.origin.x,
            self.origin.z,
            self.objects,
            self.meshes,
            self.rocks,
            self.cacti,
            self.trees
        )
    }
}
