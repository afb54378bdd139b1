//! Headless client binary.
//!
//! Usage:
//!   cargo run -p grind_client -- [--addr 127.0.0.1:2567] [--room main_room_grind] [--config client.json]
//!
//! Joins the room, then drives the scene at the configured frame rate with
//! keyboard state fed from stdin.
//!
//! Console commands:
//!   press <key>    - Hold a key (a, d, w, s, left, right, up, down, space)
//!   release <key>  - Release a key
//!   tap <key>      - Press until the next fixed tick has run
//!   inventory      - Toggle the inventory panel
//!   status         - Show scene status
//!   quit           - Exit client

use std::env;
use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use grind_client::{
    console::ConsoleCommand,
    input::{Key, KeyboardState},
    GameScene, RoomClient,
};
use grind_shared::{config::ClientConfig, event::SceneEvent, render::HeadlessRenderer};
use tokio::{sync::mpsc, time::Instant};
use tracing::info;

fn parse_args() -> anyhow::Result<ClientConfig> {
    let args: Vec<String> = env::args().collect();

    let config_path = args
        .windows(2)
        .find(|w| w[0] == "--config")
        .map(|w| PathBuf::from(&w[1]));
    let mut cfg = match config_path {
        Some(path) => ClientConfig::load(&path)?,
        None => ClientConfig::default(),
    };

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--addr" if i + 1 < args.len() => {
                cfg.server_addr = args[i + 1].clone();
                i += 2;
            }
            "--room" if i + 1 < args.len() => {
                cfg.room_name = args[i + 1].clone();
                i += 2;
            }
            _ => i += 1,
        }
    }
    Ok(cfg)
}

fn log_scene_events(scene: &mut GameScene<HeadlessRenderer>) {
    for event in scene.events_mut().drain() {
        match event {
            SceneEvent::Ready { scene } => info!(scene, "Scene ready"),
            SceneEvent::Joined {
                room_id,
                session_id,
            } => info!(room = %room_id, session = %session_id, "Scene joined room"),
            SceneEvent::JoinFailed { reason } => info!(%reason, "Scene failed to join"),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let cfg = parse_args().context("load config")?;
    info!(server = %cfg.server_addr, room = %cfg.room_name, tick_hz = cfg.tick_hz, "Starting client");

    let client = RoomClient::new(cfg.server_addr.clone());
    let frame_interval = Duration::from_secs_f64(1.0 / f64::from(cfg.frame_hz.max(1)));
    let mut scene = GameScene::new(cfg, HeadlessRenderer::default());
    log_scene_events(&mut scene);

    let Some(mut room) = scene.connect(&client).await else {
        log_scene_events(&mut scene);
        println!("Status: {}", scene.status());
        return Ok(());
    };
    log_scene_events(&mut scene);

    // Set up console input channel.
    let (console_tx, mut console_rx) = mpsc::channel::<String>(32);

    // Spawn stdin reader thread.
    std::thread::spawn(move || {
        let stdin = std::io::stdin();
        let mut stdout = std::io::stdout();
        loop {
            print!("] ");
            let _ = stdout.flush();
            let mut line = String::new();
            match stdin.lock().read_line(&mut line) {
                Ok(0) | Err(_) => break,
                Ok(_) => {}
            }
            let line = line.trim().to_string();
            if !line.is_empty() && console_tx.blocking_send(line).is_err() {
                break;
            }
        }
    });

    println!("Joined. Type 'status' for info, 'quit' to exit.");
    println!();

    let mut keys = KeyboardState::default();
    let mut taps: Vec<Key> = Vec::new();
    let mut ticker = tokio::time::interval(frame_interval);
    let mut last_frame = Instant::now();

    loop {
        ticker.tick().await;

        while let Ok(line) = console_rx.try_recv() {
            match ConsoleCommand::parse(&line) {
                Ok(Some(ConsoleCommand::Press(key))) => keys.press(key),
                Ok(Some(ConsoleCommand::Release(key))) => keys.release(key),
                Ok(Some(ConsoleCommand::Tap(key))) => {
                    keys.press(key);
                    taps.push(key);
                }
                Ok(Some(ConsoleCommand::ToggleInventory)) => scene.toggle_inventory_display(),
                Ok(Some(ConsoleCommand::Status)) => {
                    for line in scene.status_lines() {
                        println!("{line}");
                    }
                    if let Some(inventory) = scene.inventory_text() {
                        println!("{inventory}");
                    }
                }
                Ok(Some(ConsoleCommand::Quit)) => return Ok(()),
                Ok(None) => {}
                Err(usage) => println!("{usage}"),
            }
        }

        scene.apply_room_events(&mut room);
        if room.is_closed() {
            println!("Disconnected from room.");
            break;
        }

        let now = Instant::now();
        let delta_ms = now.duration_since(last_frame).as_secs_f64() * 1000.0;
        last_frame = now;
        // A tap has to be seen by at least one fixed tick.
        if scene.update(delta_ms, &keys) > 0 {
            for key in taps.drain(..) {
                keys.release(key);
            }
        }
    }

    Ok(())
}
