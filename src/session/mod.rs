//! The scene session: single owner of the scene graph, the camera rig, and
//! all synchronization with remote persistence.
//!
//! Lifecycle is explicit: [`SceneSession::start`] performs the initial load
//! (run to completion before the autosave timer is armed, so an in-flight
//! load can never race an autosave of default-built state) and returns the
//! session handle; [`SceneSession::stop`] consumes it and tears down the
//! timer and the background runtime. The winit side drives [`tick`] once per
//! display refresh.
//!
//! [`tick`]: SceneSession::tick

pub mod autosave;
pub mod controls;

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use log::{debug, info, warn};
use winit::keyboard::KeyCode;
use winit::window::Window;

use crate::assets::{fetch_texture, TextureArrival, TextureData, TextureInbox};
use crate::gfx::render_engine::RenderEngine;
use crate::gfx::scene_adapter::SceneAdapter;
use crate::persist::PersistenceClient;
use crate::scene::{Cuboid, Entity, EntityId, EntityKind, Light, Planet, SceneGraph};

use autosave::AutosaveTimer;
use controls::PointerLockControls;

const EARTH_TEXTURE_URL: &str =
    "https://raw.githubusercontent.com/dahfazz/Solar/master/textures/earth.jpg";
const MOON_TEXTURE_URL: &str =
    "https://upload.wikimedia.org/wikipedia/commons/7/74/Moon_texture.jpg";
const DEATH_STAR_TEXTURE_URL: &str =
    "https://raw.githubusercontent.com/dahfazz/Solar/master/textures/deathstar.jpg";

/// Attempts per save before giving up until the next autosave tick.
const SAVE_ATTEMPTS: u32 = 3;
const SAVE_RETRY_BASE: Duration = Duration::from_millis(250);

/// Upper bound on a single animation step; a debugger pause or a long stall
/// otherwise teleports every planet.
const MAX_TICK_DT: f32 = 0.25;

#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Full URL of the singleton scene resource.
    pub api_url: String,
    /// Autosave period; `None` disables autosave entirely.
    pub autosave_interval: Option<Duration>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            api_url: "http://127.0.0.1:8081/api/scene".to_string(),
            autosave_interval: Some(Duration::from_secs(10)),
        }
    }
}

impl SessionConfig {
    /// Reads `ORRERY_API_URL` and `ORRERY_AUTOSAVE_SECS` (0 disables) over
    /// the defaults.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(url) = std::env::var("ORRERY_API_URL") {
            config.api_url = url;
        }
        if let Ok(secs) = std::env::var("ORRERY_AUTOSAVE_SECS") {
            match secs.parse::<u64>() {
                Ok(0) => config.autosave_interval = None,
                Ok(secs) => config.autosave_interval = Some(Duration::from_secs(secs)),
                Err(_) => warn!("ignoring unparseable ORRERY_AUTOSAVE_SECS={secs:?}"),
            }
        }
        config
    }
}

struct RenderTarget {
    engine: RenderEngine,
    adapter: SceneAdapter,
}

pub struct SceneSession {
    graph: SceneGraph,
    controls: PointerLockControls,
    client: Arc<PersistenceClient>,
    runtime: tokio::runtime::Runtime,
    assets_http: reqwest::Client,
    textures: TextureInbox,
    /// Decoded textures waiting for a GPU object to attach to.
    ready_textures: HashMap<EntityId, TextureData>,
    autosave: Option<AutosaveTimer>,
    save_in_flight: Arc<AtomicBool>,
    render: Option<RenderTarget>,
    last_tick: Option<Instant>,
}

impl SceneSession {
    /// Builds the session: constructs the persistence client, runs the
    /// initial load to completion, falls back to the default scene when
    /// nothing is stored (or the stored document is unreadable), then arms
    /// the autosave timer.
    pub fn start(config: SessionConfig) -> anyhow::Result<Self> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .enable_all()
            .build()?;

        let mut session = Self {
            graph: SceneGraph::new(),
            controls: PointerLockControls::new(),
            client: Arc::new(PersistenceClient::new(config.api_url.clone())),
            runtime,
            assets_http: reqwest::Client::new(),
            textures: TextureInbox::new(),
            ready_textures: HashMap::new(),
            autosave: None,
            save_in_flight: Arc::new(AtomicBool::new(false)),
            render: None,
            last_tick: None,
        };

        match session.load_state() {
            Ok(true) => info!("restored saved scene ({} entities)", session.graph.len()),
            Ok(false) => {
                info!("no saved scene, building defaults");
                session.build_default_scene();
            }
            Err(err) => {
                warn!("could not load saved scene, building defaults: {err}");
                session.build_default_scene();
            }
        }

        // Armed only after the initial load settled; see module docs.
        if let Some(interval) = config.autosave_interval {
            session.autosave = Some(AutosaveTimer::new(interval, Instant::now()));
        }

        Ok(session)
    }

    /// Binds the session to a rendering surface. Must complete before the
    /// first tick is scheduled.
    pub fn bind_surface(&mut self, window: Arc<Window>, width: u32, height: u32) {
        let engine = pollster::block_on(RenderEngine::new(window, width, height));
        let adapter = SceneAdapter::new(&engine);
        self.graph.camera.resize_projection(width, height);
        self.render = Some(RenderTarget { engine, adapter });
    }

    /// One animation tick: applies finished texture loads, advances every
    /// entity exactly once, polls the autosave deadline, and issues exactly
    /// one draw call. Runs headless (no draw) while no surface is bound.
    pub fn tick(&mut self) {
        let now = Instant::now();
        let dt = self
            .last_tick
            .map(|last| (now - last).as_secs_f32().min(MAX_TICK_DT))
            .unwrap_or(0.0);
        self.last_tick = Some(now);

        self.collect_texture_arrivals();
        self.graph.animate_all(dt);

        let autosave_due = self
            .autosave
            .as_mut()
            .map(|timer| timer.poll(now))
            .unwrap_or(false);
        if autosave_due {
            self.save_state();
        }

        if let Some(render) = &mut self.render {
            render
                .adapter
                .sync(render.engine.device(), render.engine.queue(), &self.graph);
            for (id, data) in self.ready_textures.drain() {
                render
                    .adapter
                    .apply_texture(render.engine.device(), render.engine.queue(), id, &data);
            }
            render.engine.update_globals(&self.graph);
            render.engine.render_frame(&render.adapter);
        }
    }

    /// Recomputes the camera aspect and resizes the render target.
    /// Idempotent for repeated identical dimensions.
    pub fn on_resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.graph.camera.resize_projection(width, height);
        if let Some(render) = &mut self.render {
            render.engine.resize(width, height);
        }
    }

    /// Serializes the current graph and pushes it to the store in the
    /// background. Fire-and-forget: the render loop never waits on a save,
    /// failures are logged after bounded retries, and the in-memory graph is
    /// untouched. Overlapping saves are prevented by the in-flight flag
    /// (the backend has no compare-and-swap to catch them).
    pub fn save_state(&self) {
        if self.save_in_flight.swap(true, Ordering::AcqRel) {
            debug!("autosave skipped, previous save still in flight");
            return;
        }

        let document = self.graph.to_document();
        let client = self.client.clone();
        let in_flight = self.save_in_flight.clone();
        self.runtime.spawn(async move {
            let entity_count = document.entities.len();
            let mut delay = SAVE_RETRY_BASE;
            for attempt in 1..=SAVE_ATTEMPTS {
                match client.put(&document).await {
                    Ok(()) => {
                        debug!("scene saved ({entity_count} entities)");
                        break;
                    }
                    Err(err) if attempt < SAVE_ATTEMPTS => {
                        warn!("scene save attempt {attempt} failed, retrying: {err}");
                        tokio::time::sleep(delay).await;
                        delay *= 2;
                    }
                    Err(err) => {
                        warn!("scene save failed after {attempt} attempts: {err}");
                    }
                }
            }
            in_flight.store(false, Ordering::Release);
        });
    }

    /// Fetches the stored scene and, when present, atomically replaces the
    /// graph and rebuilds the camera rig as one unit. `Ok(false)` is the
    /// explicit "nothing loaded" signal; the caller decides about defaults.
    /// On failure the previous graph keeps rendering.
    pub fn load_state(&mut self) -> anyhow::Result<bool> {
        let stored = self.runtime.block_on(self.client.get())?;
        let Some(document) = stored else {
            return Ok(false);
        };
        let graph = SceneGraph::from_document(document)?;
        self.replace_graph(graph);
        Ok(true)
    }

    /// Removes the persisted scene document in the background; the in-memory
    /// scene is unaffected.
    pub fn clear_saved(&self) {
        let client = self.client.clone();
        self.runtime.spawn(async move {
            match client.delete().await {
                Ok(()) => info!("deleted saved scene"),
                Err(err) => warn!("failed to delete saved scene: {err}"),
            }
        });
    }

    /// Deterministic starter entity set, used when no document is stored:
    /// three textured planets and one decorative box, plus the classic
    /// ambient + directional light pair.
    pub fn build_default_scene(&mut self) {
        let mut graph = SceneGraph::new();
        graph.lights.push(Light::soft_ambient());
        graph.lights.push(Light::default_directional());

        graph.insert(Entity::new(
            "Earth",
            [0.0, 0.0, 0.0],
            EntityKind::Planet(Planet {
                radius: 6.371,
                quality: 32,
                texture_url: EARTH_TEXTURE_URL.to_string(),
                rotation_speed: 0.3,
            }),
        ));
        graph.insert(Entity::new(
            "Moon",
            [6.0, 10.0, 0.0],
            EntityKind::Planet(Planet {
                radius: 1.737,
                quality: 32,
                texture_url: MOON_TEXTURE_URL.to_string(),
                rotation_speed: 0.3,
            }),
        ));
        graph.insert(Entity::new(
            "Death Star",
            [12.0, 0.0, -4.0],
            EntityKind::Planet(Planet {
                radius: 1.0,
                quality: 32,
                texture_url: DEATH_STAR_TEXTURE_URL.to_string(),
                rotation_speed: 0.3,
            }),
        ));
        graph.insert(Entity::new(
            "Marker Cube",
            [6.0, 6.0, 0.0],
            EntityKind::Cuboid(Cuboid {
                size: 2.0,
                color: [0.0, 1.0, 0.0],
                rotation_speed: 0.0,
            }),
        ));

        self.replace_graph(graph);
    }

    /// Inserts an entity into the live graph and kicks off its texture load.
    pub fn add_entity(&mut self, mut entity: Entity) -> EntityId {
        entity.name = self.graph.ensure_unique_name(&entity.name);
        let id = self.graph.insert(entity);
        self.spawn_texture_load(id);
        id
    }

    pub fn remove_entity(&mut self, id: EntityId) -> Option<Entity> {
        self.ready_textures.remove(&id);
        self.graph.remove(id)
    }

    /// The whole graph and the camera rig swap in one assignment; a frame is
    /// never rendered with a stale camera and new entities or vice versa.
    /// The controller is rebuilt, not mutated, because it belongs to the
    /// replaced camera.
    fn replace_graph(&mut self, mut graph: SceneGraph) {
        if let Some(render) = &self.render {
            let (width, height) = render.engine.surface_size();
            graph.camera.resize_projection(width, height);
        }
        self.graph = graph;
        self.controls = PointerLockControls::new();
        self.ready_textures.clear();
        if let Some(render) = &mut self.render {
            render.adapter.invalidate();
        }
        let ids: Vec<EntityId> = self.graph.iter().map(|(id, _)| id).collect();
        for id in ids {
            self.spawn_texture_load(id);
        }
    }

    /// Single-shot fetch for the entity's texture, if it wants one. The
    /// entity is already visible with its placeholder material; pixels swap
    /// in whenever the load resolves.
    fn spawn_texture_load(&self, id: EntityId) {
        let Some(entity) = self.graph.get(id) else {
            return;
        };
        let Some(url) = entity.kind.texture_url() else {
            return;
        };

        let url = url.to_string();
        let http = self.assets_http.clone();
        let tx = self.textures.sender();
        self.runtime.spawn(async move {
            let result = fetch_texture(&http, &url).await;
            // The session may already be gone; a dead channel is fine.
            let _ = tx.send(TextureArrival {
                entity: id,
                url,
                result,
            });
        });
    }

    fn collect_texture_arrivals(&mut self) {
        for arrival in self.textures.drain() {
            // A load spawned before a graph swap can resolve for a recycled
            // id; the URL check pins the arrival to the entity that actually
            // asked for it.
            let wanted = self
                .graph
                .get(arrival.entity)
                .and_then(|e| e.kind.texture_url())
                .map(|url| url == arrival.url)
                .unwrap_or(false);
            if !wanted {
                debug!("dropping texture arrival for a replaced entity: {}", arrival.url);
                continue;
            }

            match arrival.result {
                Ok(data) => {
                    self.ready_textures.insert(arrival.entity, data);
                }
                Err(err) => {
                    let name = self
                        .graph
                        .get(arrival.entity)
                        .map(|e| e.name.as_str())
                        .unwrap_or("?");
                    warn!("texture load for {name:?} failed, keeping placeholder: {err}");
                }
            }
        }
    }

    // --- pointer-lock control surface ---

    pub fn request_lock(&mut self) -> bool {
        self.controls.lock()
    }

    pub fn release_lock(&mut self) -> bool {
        self.controls.unlock()
    }

    pub fn is_locked(&self) -> bool {
        self.controls.is_locked()
    }

    pub fn affordance_visible(&self) -> bool {
        self.controls.affordance_visible()
    }

    /// Routes a key press to the controls; displacement only happens while
    /// locked. Returns whether the key was consumed.
    pub fn handle_key(&mut self, key: KeyCode) -> bool {
        self.controls.process_key(key, &mut self.graph.camera)
    }

    pub fn graph(&self) -> &SceneGraph {
        &self.graph
    }

    /// Tears the session down. Three independent obligations: the caller
    /// stops re-arming redraws (by exiting its event loop), the autosave
    /// timer disarms here, and the background runtime is shut down without
    /// blocking on in-flight tasks.
    pub fn stop(mut self) {
        self.autosave = None;
        self.render = None;
        self.runtime.shutdown_background();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headless_session() -> SceneSession {
        // Nothing listens on the port, so the initial load fails over to the
        // default scene, which is exactly what these tests exercise.
        SceneSession::start(SessionConfig {
            api_url: "http://127.0.0.1:1/api/scene".to_string(),
            autosave_interval: None,
        })
        .expect("session should start without a reachable store")
    }

    #[test]
    fn default_scene_has_four_named_entities() {
        let session = headless_session();
        let names: Vec<_> = session
            .graph()
            .iter()
            .map(|(_, e)| e.name.clone())
            .collect();
        assert_eq!(names.len(), 4);
        for name in ["Earth", "Moon", "Death Star", "Marker Cube"] {
            assert!(names.iter().any(|n| n == name), "missing {name}");
        }
        assert_eq!(session.graph().lights.len(), 2);
    }

    #[test]
    fn default_scene_is_deterministic() {
        let mut a = headless_session();
        let b = headless_session();
        a.build_default_scene(); // rebuilding yields the identical set
        assert_eq!(a.graph().to_document(), b.graph().to_document());
    }

    #[test]
    fn ticking_headless_advances_animation() {
        let mut session = headless_session();
        session.tick(); // first tick establishes the clock
        std::thread::sleep(Duration::from_millis(30));
        session.tick();
        let spinning = session
            .graph()
            .iter()
            .filter(|(_, e)| e.kind.rotation_speed() > 0.0)
            .all(|(_, e)| e.spin > 0.0);
        assert!(spinning);
    }

    #[test]
    fn keys_only_move_the_camera_while_locked() {
        let mut session = headless_session();
        let start = session.graph().camera.position;

        assert!(!session.handle_key(KeyCode::KeyW));
        assert_eq!(session.graph().camera.position, start);

        assert!(session.request_lock());
        assert!(!session.affordance_visible());
        assert!(session.handle_key(KeyCode::KeyW));
        assert!(session.graph().camera.position != start);

        assert!(session.release_lock());
        assert!(session.affordance_visible());
    }

    #[test]
    fn add_entity_deduplicates_names() {
        let mut session = headless_session();
        let id = session.add_entity(Entity::new(
            "Moon",
            [0.0, 0.0, 0.0],
            EntityKind::Cuboid(Cuboid {
                size: 1.0,
                color: [1.0, 0.0, 0.0],
                rotation_speed: 0.0,
            }),
        ));
        assert_eq!(session.graph().get(id).unwrap().name, "Moon (1)");
        assert!(session.remove_entity(id).is_some());
    }
}
