//! Game scene.
//!
//! The scene owns the local entity registries, the HUD and the fixed-tick
//! loop. The host calls [`GameScene::update`] once per rendered frame; room
//! notifications are applied through the [`RoomListener`] hooks between
//! frames, so all state is touched from one logical thread.
//!
//! Per fixed tick:
//! - sample input and, if anything is pressed, send it to the room;
//! - move the local player immediately (prediction), then pull it toward
//!   its authoritative position;
//! - pull every other entity toward its last server position.

use std::collections::BTreeMap;

use grind_shared::{
    config::ClientConfig,
    event::{EventBus, SceneEvent},
    math::Vec2,
    net::{Command, PlayerState, ResourceId, ResourceState, SessionId, COMMAND_MESSAGE},
    render::{RenderHost, TextHandle, TextStyle},
};
use tracing::{debug, info, warn};

use crate::{
    entities::{EntityRegistry, LocalEntity, PlayerEntity, ResourceEntity, ServerSnapshot},
    input::{InputSampler, KeyboardState},
    interp::{blend_toward, FixedTimestep},
    room::{dispatch, CommandSink, Room, RoomClient, RoomListener},
};

/// Scene key used in lifecycle events.
pub const SCENE_NAME: &str = "Game";

/// Health labels sit this far above their resource.
pub const RESOURCE_LABEL_OFFSET: f32 = 16.0;

/// Texture of the authoritative-position marker drawn for the local player.
pub const SERVER_REFERENCE_TEXTURE: &str = "server_reference";

/// A HUD label plus the text currently shown in it.
#[derive(Debug)]
struct HudText {
    handle: TextHandle,
    content: String,
}

impl HudText {
    fn new<R: RenderHost>(host: &mut R, position: Vec2, content: &str, style: TextStyle) -> Self {
        Self {
            handle: host.add_text(position, content, style),
            content: content.to_string(),
        }
    }

    fn set<R: RenderHost>(&mut self, host: &mut R, content: String) {
        host.set_text(self.handle, &content);
        self.content = content;
    }
}

struct Hud {
    status: HudText,
    room: HudText,
    client: HudText,
    inventory: Option<HudText>,
    inventory_visible: bool,
}

/// Renders `"Inventory"` followed by one `item: count` line per entry.
pub fn format_inventory(inventory: &BTreeMap<String, u32>) -> String {
    let mut text = String::from("Inventory");
    for (item, count) in inventory {
        text.push_str(&format!("\n{item}: {count}"));
    }
    text
}

pub struct GameScene<R: RenderHost> {
    config: ClientConfig,
    host: R,
    events: EventBus,
    timestep: FixedTimestep,
    sampler: InputSampler,
    sink: Option<Box<dyn CommandSink>>,
    session_id: Option<SessionId>,
    players: EntityRegistry<SessionId, PlayerEntity>,
    resources: EntityRegistry<ResourceId, ResourceEntity>,
    hud: Hud,
}

impl<R: RenderHost> GameScene<R> {
    /// Builds the HUD on `host` and announces the scene.
    pub fn new(config: ClientConfig, mut host: R) -> Self {
        let status = HudText::new(
            &mut host,
            Vec2::new(320.0, 180.0),
            "",
            TextStyle {
                font_size: 30,
                origin: (0.5, 0.5),
                depth: 100,
            },
        );
        let corner = TextStyle {
            font_size: 12,
            origin: (1.0, 1.0),
            depth: 100,
        };
        let room = HudText::new(&mut host, Vec2::new(636.0, 20.0), "Room", corner);
        let client = HudText::new(&mut host, Vec2::new(636.0, 36.0), "Client", corner);

        let mut events = EventBus::default();
        events.emit(SceneEvent::Ready { scene: SCENE_NAME });

        Self {
            timestep: FixedTimestep::new(config.fixed_step()),
            config,
            host,
            events,
            sampler: InputSampler::default(),
            sink: None,
            session_id: None,
            players: EntityRegistry::default(),
            resources: EntityRegistry::default(),
            hud: Hud {
                status,
                room,
                client,
                inventory: None,
                inventory_visible: true,
            },
        }
    }

    /// Joins the configured room and wires it into the scene.
    ///
    /// On failure the status line reads `Error` and `None` is returned; there
    /// is no retry.
    pub async fn connect(&mut self, client: &RoomClient) -> Option<Room> {
        self.begin_connect();
        match client.join_or_create(&self.config.room_name).await {
            Ok(room) => {
                let sink = Box::new(room.sender());
                self.on_joined(room.room_id.clone(), room.session_id.clone(), sink);
                Some(room)
            }
            Err(e) => {
                self.on_join_failed(&e);
                None
            }
        }
    }

    pub fn begin_connect(&mut self) {
        self.hud.status.set(&mut self.host, "Connecting...".to_string());
    }

    pub fn on_joined(&mut self, room_id: String, session_id: SessionId, sink: Box<dyn CommandSink>) {
        self.hud
            .room
            .set(&mut self.host, format!("Room: {room_id}"));
        self.hud
            .client
            .set(&mut self.host, format!("Client: {session_id}"));
        self.hud.status.set(&mut self.host, String::new());
        self.update_inventory_display(&BTreeMap::new());

        self.sink = Some(sink);
        self.session_id = Some(session_id.clone());
        self.events.emit(SceneEvent::Joined {
            room_id,
            session_id,
        });
    }

    pub fn on_join_failed(&mut self, error: &anyhow::Error) {
        warn!(error = %error, "Join error");
        self.hud.status.set(&mut self.host, "Error".to_string());
        self.events.emit(SceneEvent::JoinFailed {
            reason: format!("{error:#}"),
        });
    }

    /// Applies every notification the room delivered since the last call.
    pub fn apply_room_events(&mut self, room: &mut Room) -> usize {
        let events = room.drain_events();
        let n = events.len();
        for event in events {
            dispatch(&mut *self, event);
        }
        n
    }

    /// Per-frame entry point. Returns the number of fixed ticks run.
    pub fn update(&mut self, delta_ms: f64, keys: &KeyboardState) -> u32 {
        if !self.has_local_player() {
            return 0;
        }
        let steps = self.timestep.advance(delta_ms);
        for _ in 0..steps {
            self.fixed_tick(keys);
        }
        steps
    }

    /// One simulation step. A no-op until the local player exists.
    pub fn fixed_tick(&mut self, keys: &KeyboardState) {
        let Some(local_id) = self.local_session().cloned() else {
            return;
        };

        let cmd = self.sampler.sample(keys);
        if cmd.any() {
            if let Some(sink) = &self.sink {
                sink.send(COMMAND_MESSAGE, cmd);
            }
            self.sampler.clear_action();
        }

        let factor = self.config.blend_factor;
        let speed = self.config.move_speed;

        for (id, player) in self.players.iter_mut() {
            let entity = &mut player.entity;
            let current = if *id == local_id {
                predict(entity.position, &cmd, speed)
            } else {
                entity.position
            };
            entity.position = blend_toward(current, entity.server.position, factor);
            self.host.set_sprite_position(entity.sprite, entity.position);
        }

        for (_, resource) in self.resources.iter_mut() {
            let entity = &mut resource.entity;
            entity.position = blend_toward(entity.position, entity.server.position, factor);
            self.host.set_sprite_position(entity.sprite, entity.position);
            self.host
                .set_text_position(resource.label, label_position(entity.position));
        }
    }

    /// Shows or hides the inventory panel.
    pub fn toggle_inventory_display(&mut self) {
        if let Some(inventory) = &self.hud.inventory {
            self.hud.inventory_visible = !self.hud.inventory_visible;
            self.host
                .set_text_visible(inventory.handle, self.hud.inventory_visible);
        }
    }

    fn update_inventory_display(&mut self, inventory: &BTreeMap<String, u32>) {
        let text = format_inventory(inventory);
        match &mut self.hud.inventory {
            Some(display) => display.set(&mut self.host, text),
            None => {
                let style = TextStyle {
                    font_size: 10,
                    origin: (0.0, 0.0),
                    depth: 100,
                };
                self.hud.inventory = Some(HudText::new(
                    &mut self.host,
                    Vec2::new(4.0, 4.0),
                    &text,
                    style,
                ));
            }
        }
    }

    fn local_session(&self) -> Option<&SessionId> {
        self.session_id
            .as_ref()
            .filter(|id| self.players.contains(id))
    }

    pub fn has_local_player(&self) -> bool {
        self.local_session().is_some()
    }

    pub fn local_player(&self) -> Option<&LocalEntity> {
        self.local_session()
            .and_then(|id| self.players.get(id))
            .map(|p| &p.entity)
    }

    pub fn session_id(&self) -> Option<&SessionId> {
        self.session_id.as_ref()
    }

    pub fn players(&self) -> &EntityRegistry<SessionId, PlayerEntity> {
        &self.players
    }

    pub fn resources(&self) -> &EntityRegistry<ResourceId, ResourceEntity> {
        &self.resources
    }

    pub fn status(&self) -> &str {
        &self.hud.status.content
    }

    pub fn room_label(&self) -> &str {
        &self.hud.room.content
    }

    pub fn client_label(&self) -> &str {
        &self.hud.client.content
    }

    pub fn inventory_text(&self) -> Option<&str> {
        self.hud.inventory.as_ref().map(|t| t.content.as_str())
    }

    pub fn inventory_visible(&self) -> bool {
        self.hud.inventory.is_some() && self.hud.inventory_visible
    }

    pub fn host(&self) -> &R {
        &self.host
    }

    pub fn events_mut(&mut self) -> &mut EventBus {
        &mut self.events
    }

    /// Human-readable summary for the console `status` command.
    pub fn status_lines(&self) -> Vec<String> {
        let mut out = vec![
            format!("Status: {:?}", self.status()),
            self.room_label().to_string(),
            self.client_label().to_string(),
            format!("Players: {}", self.players.len()),
            format!("Resources: {}", self.resources.len()),
        ];
        if let Some(local) = self.local_player() {
            out.push(format!(
                "Local: ({:.1}, {:.1}) server ({:.1}, {:.1})",
                local.position.x, local.position.y, local.server.position.x, local.server.position.y
            ));
        }
        out
    }

    fn is_local(&self, session_id: &SessionId) -> bool {
        self.session_id.as_ref() == Some(session_id)
    }

    fn destroy_player(&mut self, player: PlayerEntity) {
        self.host.destroy_sprite(player.entity.sprite);
        if let Some(marker) = player.reference_marker {
            self.host.destroy_sprite(marker);
        }
    }

    fn destroy_resource(&mut self, resource: ResourceEntity) {
        self.host.destroy_sprite(resource.entity.sprite);
        self.host.destroy_text(resource.label);
    }
}

/// Dead reckoning: left wins over right, up over down.
fn predict(position: Vec2, cmd: &Command, speed: f32) -> Vec2 {
    let mut next = position;
    if cmd.move_left {
        next.x -= speed;
    } else if cmd.move_right {
        next.x += speed;
    }
    if cmd.move_up {
        next.y -= speed;
    } else if cmd.move_down {
        next.y += speed;
    }
    next
}

fn label_position(resource: Vec2) -> Vec2 {
    resource.offset(0.0, -RESOURCE_LABEL_OFFSET)
}

impl<R: RenderHost> RoomListener for GameScene<R> {
    fn on_player_added(&mut self, session_id: SessionId, state: PlayerState) {
        let position = Vec2::new(state.x, state.y);
        let local = self.is_local(&session_id);
        info!(session = %session_id, local, "Player joined");

        let sprite = self.host.add_sprite(&self.config.player_texture, position);
        let reference_marker =
            local.then(|| self.host.add_sprite(SERVER_REFERENCE_TEXTURE, position));
        let player = PlayerEntity {
            entity: LocalEntity::spawned(sprite, ServerSnapshot::at(position)),
            reference_marker,
        };
        if let Some(previous) = self.players.insert(session_id, player) {
            self.destroy_player(previous);
        }

        if local {
            self.timestep.reset();
            self.update_inventory_display(&state.inventory);
        }
    }

    fn on_player_changed(&mut self, session_id: &SessionId, state: PlayerState) {
        let local = self.is_local(session_id);
        let Some(player) = self.players.get_mut(session_id) else {
            debug!(session = %session_id, "Change for unknown player ignored");
            return;
        };
        let position = Vec2::new(state.x, state.y);
        player.entity.server.position = position;
        if let Some(marker) = player.reference_marker {
            self.host.set_sprite_position(marker, position);
        }
        if local {
            self.update_inventory_display(&state.inventory);
        }
    }

    fn on_player_removed(&mut self, session_id: &SessionId) {
        match self.players.remove(session_id) {
            Some(player) => {
                info!(session = %session_id, "Player left");
                self.destroy_player(player);
            }
            None => debug!(session = %session_id, "Removal of unknown player ignored"),
        }
    }

    fn on_resource_added(&mut self, state: ResourceState) {
        let position = Vec2::new(state.x, state.y);
        debug!(resource = %state.id, image = %state.image, "Resource spawned");

        let sprite = self.host.add_sprite(&state.image, position);
        let label = self.host.add_text(
            label_position(position),
            &state.health.to_string(),
            TextStyle::default(),
        );
        let resource = ResourceEntity {
            entity: LocalEntity::spawned(
                sprite,
                ServerSnapshot {
                    position,
                    health: Some(state.health),
                },
            ),
            label,
            health: state.health,
        };
        if let Some(previous) = self.resources.insert(state.id, resource) {
            self.destroy_resource(previous);
        }
    }

    fn on_resource_changed(&mut self, state: ResourceState) {
        let Some(resource) = self.resources.get_mut(&state.id) else {
            debug!(resource = %state.id, "Change for unknown resource ignored");
            return;
        };
        resource.entity.server = ServerSnapshot {
            position: Vec2::new(state.x, state.y),
            health: Some(state.health),
        };
        resource.health = state.health;
        self.host
            .set_text(resource.label, &state.health.to_string());
    }

    fn on_resource_removed(&mut self, id: &ResourceId) {
        match self.resources.remove(id) {
            Some(resource) => {
                debug!(resource = %id, "Resource despawned");
                self.destroy_resource(resource);
            }
            None => debug!(resource = %id, "Removal of unknown resource ignored"),
        }
    }
}
