//! Socket-level tests: scene + room client against the fake room server.

use std::time::Duration;

use grind_client::{
    input::{Key, KeyboardState},
    GameScene, Room, RoomClient,
};
use grind_shared::{
    config::ClientConfig,
    math::Vec2,
    net::{PlayerState, ResourceId, ResourceState, RoomMsg, SessionId, COMMAND_MESSAGE},
    render::HeadlessRenderer,
};
use grind_tests::FakeRoomServer;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("debug")
        .with_test_writer()
        .try_init();
}

fn player_at(x: f32, y: f32) -> PlayerState {
    PlayerState {
        x,
        y,
        ..PlayerState::default()
    }
}

fn tree(id: &str) -> ResourceState {
    ResourceState {
        id: ResourceId(id.to_string()),
        x: 40.0,
        y: 40.0,
        image: "tree".to_string(),
        health: 10,
    }
}

fn new_scene() -> GameScene<HeadlessRenderer> {
    GameScene::new(ClientConfig::default(), HeadlessRenderer::default())
}

/// Applies room events until `done` holds, or fails after two seconds.
async fn pump_until(
    scene: &mut GameScene<HeadlessRenderer>,
    room: &mut Room,
    done: impl Fn(&GameScene<HeadlessRenderer>) -> bool,
) -> anyhow::Result<()> {
    tokio::time::timeout(Duration::from_secs(2), async {
        loop {
            scene.apply_room_events(room);
            if done(scene) {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await?;
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn join_predict_and_send_command() -> anyhow::Result<()> {
    init_tracing();

    let server = FakeRoomServer::bind("room-42").await?;
    let client = RoomClient::new(server.addr()?.to_string());

    let server_task = tokio::spawn(async move {
        let mut session = server.accept("s-1").await?;
        let room_name = session.room_name.clone();
        let me = session.session_id.clone();
        session
            .push(RoomMsg::PlayerAdded {
                session_id: me.clone(),
                state: player_at(0.0, 0.0),
            })
            .await?;
        session
            .push(RoomMsg::PlayerChanged {
                session_id: me,
                state: player_at(100.0, 0.0),
            })
            .await?;
        session.push(RoomMsg::ResourceAdded(tree("tree-1"))).await?;
        let command = session.recv_command().await?;
        Ok::<_, anyhow::Error>((room_name, command))
    });

    let mut scene = new_scene();
    let mut room = scene.connect(&client).await.expect("join should succeed");
    assert_eq!(scene.status(), "");
    assert_eq!(scene.room_label(), "Room: room-42");
    assert_eq!(scene.client_label(), "Client: s-1");

    pump_until(&mut scene, &mut room, |s| s.resources().len() == 1).await?;
    assert_eq!(
        scene.local_player().map(|p| p.server.position),
        Some(Vec2::new(100.0, 0.0))
    );

    let mut keys = KeyboardState::default();
    keys.press(Key::Right);
    keys.press(Key::Space);
    scene.fixed_tick(&keys);

    // predicted 0 + 2, then 20% of the way to 100
    let local = scene.local_player().expect("local player");
    assert!((local.position.x - 21.6).abs() < 1e-4);

    let (room_name, (kind, command)) = server_task.await??;
    assert_eq!(room_name, "main_room_grind");
    assert_eq!(kind, COMMAND_MESSAGE);
    assert!(command.move_right);
    assert!(command.action_triggered);
    assert!(!command.move_left);
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn rejected_join_reports_error() -> anyhow::Result<()> {
    init_tracing();

    let server = FakeRoomServer::bind("room-1").await?;
    let client = RoomClient::new(server.addr()?.to_string());
    let server_task = tokio::spawn(async move { server.reject("room is full").await });

    let mut scene = new_scene();
    assert!(scene.connect(&client).await.is_none());
    server_task.await??;

    assert_eq!(scene.status(), "Error");
    let reason = scene.events_mut().last_join_failure().unwrap_or_default();
    assert!(reason.contains("room is full"));
    assert!(!scene.has_local_player());
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn add_then_remove_over_the_wire_leaves_nothing() -> anyhow::Result<()> {
    init_tracing();

    let server = FakeRoomServer::bind("room-7").await?;
    let client = RoomClient::new(server.addr()?.to_string());

    let server_task = tokio::spawn(async move {
        let mut session = server.accept("me").await?;
        let other = SessionId("other".to_string());
        session
            .push(RoomMsg::PlayerAdded {
                session_id: other.clone(),
                state: player_at(5.0, 5.0),
            })
            .await?;
        session
            .push(RoomMsg::PlayerRemoved { session_id: other })
            .await?;
        session.push(RoomMsg::ResourceAdded(tree("rock"))).await?;
        session
            .push(RoomMsg::ResourceRemoved {
                id: ResourceId("rock".to_string()),
            })
            .await?;
        session
            .push(RoomMsg::ResourceRemoved {
                id: ResourceId("never-existed".to_string()),
            })
            .await?;
        // sentinel: everything above has been applied once this shows up
        session.push(RoomMsg::ResourceAdded(tree("marker"))).await?;
        Ok::<_, anyhow::Error>(session)
    });

    let mut scene = new_scene();
    let mut room = scene.connect(&client).await.expect("join should succeed");
    let _session = server_task.await??;

    pump_until(&mut scene, &mut room, |s| {
        s.resources().contains(&ResourceId("marker".to_string()))
    })
    .await?;

    assert!(scene.players().is_empty());
    assert_eq!(scene.resources().len(), 1);
    assert_eq!(scene.host().sprite_count(), 1);
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn server_close_is_observed() -> anyhow::Result<()> {
    init_tracing();

    let server = FakeRoomServer::bind("room-9").await?;
    let client = RoomClient::new(server.addr()?.to_string());
    let server_task = tokio::spawn(async move {
        let session = server.accept("me").await?;
        drop(session);
        Ok::<_, anyhow::Error>(())
    });

    let mut scene = new_scene();
    let mut room = scene.connect(&client).await.expect("join should succeed");
    server_task.await??;

    tokio::time::timeout(Duration::from_secs(2), async {
        while room.next_event().await.is_some() {}
    })
    .await?;
    assert!(room.is_closed());
    Ok(())
}
