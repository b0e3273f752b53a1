//! End-to-end persistence tests over a real TCP socket: the axum server on
//! one side, the session's client on the other.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use orrery::persist::PersistenceClient;
use orrery::scene::{Cuboid, Entity, EntityKind, Planet, SceneDocument, SceneGraph};
use orrery::server::{items_router, scene_router, ItemStore, SceneStore};
use orrery::session::{SceneSession, SessionConfig};

async fn spawn_scene_server(store: Arc<SceneStore>) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let router = scene_router(store);
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    addr
}

async fn spawn_items_server(store: Arc<ItemStore>) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let router = items_router(store);
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    addr
}

fn sample_document() -> SceneDocument {
    let mut graph = SceneGraph::new();
    graph.insert(Entity::new(
        "Earth",
        [0.0, 0.0, 0.0],
        EntityKind::Planet(Planet {
            radius: 6.371,
            quality: 32,
            texture_url: "http://example.invalid/earth.jpg".into(),
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
    graph.to_document()
}

#[tokio::test]
async fn get_on_an_empty_store_is_absent() {
    let addr = spawn_scene_server(Arc::new(SceneStore::in_memory())).await;
    let client = PersistenceClient::new(format!("http://{addr}/api/scene"));

    assert!(client.get().await.unwrap().is_none());
}

#[tokio::test]
async fn put_round_trips_and_is_idempotent() {
    let addr = spawn_scene_server(Arc::new(SceneStore::in_memory())).await;
    let client = PersistenceClient::new(format!("http://{addr}/api/scene"));

    let document = sample_document();
    client.put(&document).await.unwrap();
    client.put(&document).await.unwrap(); // identical put, same stored state

    let stored = client.get().await.unwrap().expect("document should exist");
    assert_eq!(stored, document);
}

#[tokio::test]
async fn put_overwrites_rather_than_appends() {
    let store = Arc::new(SceneStore::in_memory());
    let addr = spawn_scene_server(store.clone()).await;
    let client = PersistenceClient::new(format!("http://{addr}/api/scene"));

    let mut document = sample_document();
    client.put(&document).await.unwrap();
    document.entities.pop();
    client.put(&document).await.unwrap();

    // Exactly one logical document, holding the latest contents.
    let stored = client.get().await.unwrap().unwrap();
    assert_eq!(stored.entities.len(), document.entities.len());
}

#[tokio::test]
async fn delete_is_a_noop_when_absent() {
    let addr = spawn_scene_server(Arc::new(SceneStore::in_memory())).await;
    let client = PersistenceClient::new(format!("http://{addr}/api/scene"));

    client.delete().await.unwrap(); // nothing stored, still succeeds

    client.put(&sample_document()).await.unwrap();
    client.delete().await.unwrap();
    assert!(client.get().await.unwrap().is_none());
    client.delete().await.unwrap();
}

#[tokio::test]
async fn malformed_item_id_is_rejected_before_the_store() {
    let store = Arc::new(ItemStore::new());
    let addr = spawn_items_server(store.clone()).await;
    let http = reqwest::Client::new();

    let created: serde_json::Value = http
        .post(format!("http://{addr}/api/items"))
        .json(&serde_json::json!({"label": "keep me"}))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let id = created["_id"].as_str().unwrap().to_string();

    // A 3-char identifier is rejected synchronously with a 400 naming the
    // 24-character/12-byte requirement, and the store is untouched.
    let response = http
        .delete(format!("http://{addr}/api/items/abc"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);
    let body: serde_json::Value = response.json().await.unwrap();
    let message = body["error"].as_str().unwrap();
    assert!(message.contains("24 character"), "message was: {message}");
    assert!(message.contains("12 bytes"), "message was: {message}");
    assert_eq!(store.len(), 1);

    // Well-formed ids go through to the store.
    let response = http
        .delete(format!("http://{addr}/api/items/{id}"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    assert_eq!(store.len(), 0);

    let response = http
        .delete(format!("http://{addr}/api/items/{id}"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 404);
}

/// The autosave scenario: no prior document, the session builds the default
/// four-entity scene, and the first put arrives at or after one interval
/// containing exactly those entities. Runs on plain threads because the
/// session owns its own runtime.
#[test]
fn autosave_persists_the_default_scene() {
    let server_runtime = tokio::runtime::Runtime::new().unwrap();
    let store = Arc::new(SceneStore::in_memory());
    let addr = server_runtime.block_on(spawn_scene_server(store.clone()));

    let interval = Duration::from_millis(100);
    let mut session = SceneSession::start(SessionConfig {
        api_url: format!("http://{addr}/api/scene"),
        autosave_interval: Some(interval),
    })
    .unwrap();

    // Nothing stored, so the session reported absent and built defaults.
    assert_eq!(session.graph().len(), 4);

    // No save happens before the interval elapses.
    session.tick();
    assert!(store.get().is_none());

    let deadline = Instant::now() + Duration::from_secs(5);
    while store.get().is_none() && Instant::now() < deadline {
        session.tick();
        std::thread::sleep(Duration::from_millis(20));
    }

    let stored = store.get().expect("autosave should have fired");
    let document: SceneDocument = serde_json::from_value(stored).unwrap();
    assert_eq!(document.entities.len(), 4);
    for name in ["Earth", "Moon", "Death Star", "Marker Cube"] {
        assert!(
            document.entities.iter().any(|e| e.name == name),
            "missing {name}"
        );
    }

    session.stop();
}

/// A second session started against the same store restores the saved scene
/// instead of building defaults.
#[test]
fn a_new_session_restores_the_saved_scene() {
    let server_runtime = tokio::runtime::Runtime::new().unwrap();
    let store = Arc::new(SceneStore::in_memory());
    let addr = server_runtime.block_on(spawn_scene_server(store.clone()));
    let api_url = format!("http://{addr}/api/scene");

    let first = SceneSession::start(SessionConfig {
        api_url: api_url.clone(),
        autosave_interval: None,
    })
    .unwrap();
    first.save_state();

    let deadline = Instant::now() + Duration::from_secs(5);
    while store.get().is_none() && Instant::now() < deadline {
        std::thread::sleep(Duration::from_millis(20));
    }
    let saved = first.graph().to_document();
    first.stop();

    let second = SceneSession::start(SessionConfig {
        api_url,
        autosave_interval: None,
    })
    .unwrap();
    assert_eq!(second.graph().to_document(), saved);
    second.stop();
}
