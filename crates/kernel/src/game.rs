use std::time::Instant;

use dunes_assets::{AssetProvider, GltfSource, ModelCache, ProceduralSource, content_id};
use dunes_common::{GeometryId, MaterialId, NodeId, Transform};
use dunes_input::{Action, InputState};
use dunes_scene::{MeshData, SceneGraph, SceneNode};
use dunes_stream::{AdvanceReport, ChunkStreamer};
use glam::{Quat, Vec3};

use crate::KernelError;
use crate::airplane::Airplane;
use crate::camera::OrbitCamera;
use crate::canyon::CanyonWalls;
use crate::settings::Settings;
use crate::timer::TickTimer;

const TICK_HISTORY: usize = 120;

/// The whole demo: airplane, camera, canyon ring, and streamed terrain.
///
/// Single-threaded and tick-driven. Asset loads complete only inside `step`,
/// so everything that depends on them observes progress by polling.
pub struct Game {
    settings: Settings,
    assets: ModelCache,
    airplane: Airplane,
    plane_node: SceneNode,
    plane_attached: bool,
    camera: OrbitCamera,
    canyon: CanyonWalls,
    streamer: ChunkStreamer,
    world_root: NodeId,
    tick: u64,
    paused: bool,
    last_report: AdvanceReport,
    timer: TickTimer,
}

impl Game {
    pub fn new(settings: Settings) -> Result<Self, KernelError> {
        settings.validate()?;
        let mut assets = match &settings.assets.root {
            Some(root) => ModelCache::new(GltfSource::new(root.clone())),
            None => ModelCache::new(ProceduralSource::new()),
        }
        .with_loads_per_pump(settings.assets.loads_per_pump);
        let streamer = ChunkStreamer::new(settings.stream.clone())?;

        // Queue every model up front so the first pump starts loading them.
        let mut models = settings.stream.props.all_models();
        models.extend(settings.canyon.model_paths());
        if assets.resolve_many(&models).is_pending() {
            tracing::debug!(models = assets.queued_count(), "models queued");
        }

        tracing::info!(
            chunk_size = settings.stream.chunk_size,
            render_distance = settings.stream.render_distance,
            bounded = settings.stream.bounds.is_some(),
            "game created"
        );
        Ok(Self {
            assets,
            airplane: Airplane::new(settings.airplane.clone()),
            plane_node: airplane_graph(),
            plane_attached: false,
            camera: OrbitCamera::new(settings.camera.clone()),
            canyon: CanyonWalls::new(settings.canyon.clone()),
            streamer,
            world_root: NodeId::new(),
            tick: 0,
            paused: false,
            last_report: AdvanceReport::default(),
            timer: TickTimer::new(TICK_HISTORY),
            settings,
        })
    }

    /// Run one simulation tick.
    ///
    /// Order: input actions, pause gate, asset pump, airplane, terrain,
    /// canyon ring, camera.
    pub fn step(&mut self, input: &mut InputState, scene: &mut impl SceneGraph) {
        let _span = tracing::debug_span!("game_step", tick = self.tick).entered();
        let start = Instant::now();

        for action in input.take_actions() {
            self.apply(action);
        }
        if self.paused {
            return;
        }

        self.assets.pump();

        self.airplane.update(input.controls());
        self.plane_node.transform = self.airplane.transform();
        if let Some(propeller) = self.plane_node.children.get_mut(PROPELLER) {
            propeller.transform.rotation = Quat::from_rotation_z(self.airplane.propeller_angle());
        }
        if self.plane_attached {
            scene.update_transform(&self.plane_node);
        } else {
            scene.attach(self.world_root, &self.plane_node);
            self.plane_attached = true;
        }

        let player = self.airplane.position();
        self.last_report = self.streamer.advance(player, &mut self.assets, scene);
        self.canyon.poll(self.world_root, &mut self.assets, scene);
        self.canyon.follow(player, scene);
        self.camera.follow(player, self.airplane.orientation());

        self.tick += 1;
        self.timer.record(start.elapsed(), &self.last_report);
    }

    fn apply(&mut self, action: Action) {
        match action {
            Action::TogglePause => self.toggle_pause(),
            Action::Orbit(delta) => self.camera.orbit(delta),
            Action::Zoom(dy) => self.camera.zoom(dy),
            Action::ResetCamera => self.camera.reset(),
        }
    }

    pub fn toggle_pause(&mut self) {
        self.paused = !self.paused;
        tracing::info!(paused = self.paused, "pause toggled");
    }

    /// Move the airplane and converge the terrain window in the same call.
    pub fn teleport(&mut self, position: Vec3, scene: &mut impl SceneGraph) -> AdvanceReport {
        self.airplane.set_position(position);
        let player = self.airplane.position();
        tracing::info!(?player, "teleport");
        self.last_report = self.streamer.advance(player, &mut self.assets, scene);
        self.canyon.follow(player, scene);
        self.camera.follow(player, self.airplane.orientation());
        self.last_report.clone()
    }

    /// Detach everything and release every resource the game attached.
    pub fn shutdown(&mut self, scene: &mut impl SceneGraph) {
        let report = self.streamer.clear(scene);
        self.canyon.teardown(self.world_root, scene);
        if self.plane_attached {
            scene.detach(self.world_root, self.plane_node.id);
            self.plane_node.traverse(&mut |node| {
                if node.mesh.is_some() {
                    scene.release_geometry(node);
                    scene.release_material(node);
                }
            });
            self.plane_attached = false;
        }
        tracing::info!(chunks = report.evicted.len(), "game shut down");
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn airplane(&self) -> &Airplane {
        &self.airplane
    }

    pub fn camera(&self) -> &OrbitCamera {
        &self.camera
    }

    pub fn canyon(&self) -> &CanyonWalls {
        &self.canyon
    }

    pub fn streamer(&self) -> &ChunkStreamer {
        &self.streamer
    }

    pub fn assets(&self) -> &ModelCache {
        &self.assets
    }

    pub fn last_report(&self) -> &AdvanceReport {
        &self.last_report
    }

    pub fn tick_timer(&self) -> &TickTimer {
        &self.timer
    }
}

/// Index of the propeller among the airplane's parts.
const PROPELLER: usize = 4;

/// Body, cockpit, wings, tail and propeller. The propeller spins about its
/// own z axis and casts no shadow.
fn airplane_graph() -> SceneNode {
    let parts = [
        ("body", Vec3::ZERO, Vec3::ONE),
        ("cockpit", Vec3::new(0.0, 0.5, 0.5), Vec3::new(1.0, 0.7, 1.2)),
        ("wings", Vec3::ZERO, Vec3::ONE),
        ("tail", Vec3::new(0.0, 1.0, -2.5), Vec3::ONE),
        ("propeller", Vec3::new(0.0, 0.0, 2.2), Vec3::ONE),
    ];
    let mut root = SceneNode::group("airplane");
    for (index, (part, position, scale)) in parts.into_iter().enumerate() {
        let id = |kind: &str| content_id(&["airplane".as_bytes(), part.as_bytes(), kind.as_bytes()]);
        let mut data = MeshData::new(GeometryId(id("geometry")), MaterialId(id("material")));
        data.cast_shadow = index != PROPELLER;
        let mesh = SceneNode::mesh(part, data).with_transform(Transform {
            position,
            scale,
            ..Transform::default()
        });
        root.add_child(mesh);
    }
    root
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canyon::CanyonState;
    use dunes_input::Key;
    use dunes_scene::RecordingScene;
    use dunes_stream::Readiness;
    use glam::Vec2;
    use std::collections::HashSet;

    fn game(render_distance: i32) -> Game {
        let mut settings = Settings::default();
        settings.stream.render_distance = render_distance;
        settings.assets.loads_per_pump = 100;
        Game::new(settings).unwrap()
    }

    #[test]
    fn first_ticks_load_then_stream() {
        let mut game = game(1);
        let mut input = InputState::new();
        let mut scene = RecordingScene::new();

        // construction queues every model; the first pump loads them
        game.step(&mut input, &mut scene);
        assert_eq!(game.streamer().readiness(), Readiness::Ready);
        assert_eq!(game.streamer().chunk_count(), 9);
        assert_eq!(game.canyon().state(), CanyonState::Attached);
        assert_eq!(game.tick(), 1);
        assert!(game.streamer().check_invariants().is_ok());
    }

    #[test]
    fn construction_queues_every_configured_model() {
        let game = game(1);
        let settings = game.settings();
        let mut expected: HashSet<String> = settings.stream.props.all_models().into_iter().collect();
        expected.extend(settings.canyon.model_paths());
        assert_eq!(expected.len(), 11);
        assert_eq!(game.assets().queued_count(), expected.len());
        assert_eq!(game.assets().ready_count(), 0);
    }

    #[test]
    fn slow_pump_keeps_world_pending() {
        let mut settings = Settings::default();
        settings.stream.render_distance = 1;
        settings.assets.loads_per_pump = 1;
        let mut game = Game::new(settings).unwrap();
        let mut input = InputState::new();
        let mut scene = RecordingScene::new();

        game.step(&mut input, &mut scene);
        assert_eq!(game.streamer().readiness(), Readiness::Pending);
        assert_eq!(game.streamer().chunk_count(), 0);
        for _ in 0..11 {
            game.step(&mut input, &mut scene);
        }
        assert_eq!(game.streamer().readiness(), Readiness::Ready);
        assert_eq!(game.streamer().chunk_count(), 9);
    }

    #[test]
    fn pause_freezes_simulation() {
        let mut game = game(1);
        let mut input = InputState::new();
        let mut scene = RecordingScene::new();
        game.step(&mut input, &mut scene);
        let pos = game.airplane().position();

        input.press(Key::P);
        game.step(&mut input, &mut scene);
        game.step(&mut input, &mut scene);
        assert!(game.is_paused());
        assert_eq!(game.airplane().position(), pos);
        assert_eq!(game.tick(), 1);

        input.release(Key::P);
        input.press(Key::P);
        game.step(&mut input, &mut scene);
        assert!(!game.is_paused());
        assert_eq!(game.tick(), 2);
    }

    #[test]
    fn camera_actions_apply() {
        let mut game = game(1);
        let mut input = InputState::new();
        let mut scene = RecordingScene::new();
        input.scroll(1000.0);
        input.pointer_down();
        input.pointer_moved(Vec2::new(0.0, 100.0));
        game.step(&mut input, &mut scene);
        assert!((game.camera().distance() - 40.0).abs() < 1e-4);
        assert!(game.camera().pitch() < 0.0);

        input.reset_camera();
        game.step(&mut input, &mut scene);
        assert_eq!(game.camera().distance(), 30.0);
    }

    #[test]
    fn propeller_spin_reaches_the_scene_graph() {
        let mut game = game(1);
        let mut input = InputState::new();
        let mut scene = RecordingScene::new();
        for _ in 0..4 {
            game.step(&mut input, &mut scene);
        }

        let plane = &game.plane_node;
        let names: Vec<&str> = plane.children.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, ["body", "cockpit", "wings", "tail", "propeller"]);
        assert_eq!(plane.mesh_count(), 5);

        let propeller = &plane.children[PROPELLER];
        assert_eq!(propeller.transform.position, Vec3::new(0.0, 0.0, 2.2));
        let expected = Quat::from_rotation_z(game.airplane().propeller_angle());
        assert!((game.airplane().propeller_angle() - 2.0).abs() < 1e-6);
        assert!(propeller.transform.rotation.abs_diff_eq(expected, 1e-6));
        assert!(!propeller.transform.rotation.abs_diff_eq(Quat::IDENTITY, 1e-3));
        assert!(scene.transform_updates() >= 3);

        let shadows: Vec<bool> = plane
            .children
            .iter()
            .filter_map(|c| c.mesh.map(|m| m.cast_shadow))
            .collect();
        assert_eq!(shadows, [true, true, true, true, false]);
    }

    #[test]
    fn teleport_converges_and_ring_follows() {
        let mut game = game(1);
        let mut input = InputState::new();
        let mut scene = RecordingScene::new();
        game.step(&mut input, &mut scene);
        game.step(&mut input, &mut scene);

        let report = game.teleport(Vec3::new(10000.0, 20.0, 10000.0), &mut scene);
        assert_eq!(report.evicted.len(), 9);
        assert_eq!(report.created.len(), 9);
        let ring = game.canyon().ring().unwrap();
        assert_eq!(ring.transform.position, Vec3::new(10000.0, 0.0, 10000.0));
        assert_eq!(scene.leaked(), 0);
    }

    #[test]
    fn shutdown_leaves_no_resources() {
        let mut game = game(2);
        let mut input = InputState::new();
        input.press(Key::A);
        let mut scene = RecordingScene::new();
        for _ in 0..300 {
            game.step(&mut input, &mut scene);
        }
        game.shutdown(&mut scene);
        assert_eq!(scene.attached_count(), 0);
        assert_eq!(scene.live_geometry(), 0);
        assert_eq!(scene.live_material(), 0);
        assert_eq!(scene.double_releases(), 0);
    }

    #[test]
    fn tick_timer_tracks_ticks() {
        let mut game = game(1);
        let mut input = InputState::new();
        let mut scene = RecordingScene::new();
        for _ in 0..5 {
            game.step(&mut input, &mut scene);
        }
        let timer = game.tick_timer();
        assert_eq!(timer.len(), 5);
        assert_eq!(timer.churn(), (9, 0));
        assert!(timer.slowest_streaming().is_some_and(|s| s.created == 9));
    }
}
