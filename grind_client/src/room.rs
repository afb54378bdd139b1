//! Room client.
//!
//! Joining is one async handshake over a [`ReliableConn`]. After that the
//! connection is split: a reader task turns server frames into
//! [`RoomEvent`]s on a channel the frame loop drains, and a writer task
//! forwards outgoing commands. The scene itself never touches a socket.

use std::net::SocketAddr;

use anyhow::Context;
use grind_shared::net::{
    Command, FrameReader, FrameWriter, PlayerState, ReliableConn, ResourceId, ResourceState,
    RoomMsg, SessionId,
};
use tokio::{
    sync::mpsc::{self, error::TryRecvError, UnboundedReceiver, UnboundedSender},
    task::JoinHandle,
};
use tracing::{debug, info, warn};

/// Server-side state change delivered to the scene.
#[derive(Debug, Clone, PartialEq)]
pub enum RoomEvent {
    PlayerAdded {
        session_id: SessionId,
        state: PlayerState,
    },
    PlayerChanged {
        session_id: SessionId,
        state: PlayerState,
    },
    PlayerRemoved {
        session_id: SessionId,
    },
    ResourceAdded(ResourceState),
    ResourceChanged(ResourceState),
    ResourceRemoved {
        id: ResourceId,
    },
}

impl RoomEvent {
    /// Maps a server frame to an event; handshake and client frames yield `None`.
    pub fn from_msg(msg: RoomMsg) -> Option<Self> {
        let event = match msg {
            RoomMsg::PlayerAdded { session_id, state } => Self::PlayerAdded { session_id, state },
            RoomMsg::PlayerChanged { session_id, state } => {
                Self::PlayerChanged { session_id, state }
            }
            RoomMsg::PlayerRemoved { session_id } => Self::PlayerRemoved { session_id },
            RoomMsg::ResourceAdded(state) => Self::ResourceAdded(state),
            RoomMsg::ResourceChanged(state) => Self::ResourceChanged(state),
            RoomMsg::ResourceRemoved { id } => Self::ResourceRemoved { id },
            RoomMsg::JoinOrCreate { .. }
            | RoomMsg::Joined { .. }
            | RoomMsg::JoinError { .. }
            | RoomMsg::Message { .. } => return None,
        };
        Some(event)
    }
}

/// Typed add/change/remove hooks for room state.
pub trait RoomListener {
    fn on_player_added(&mut self, session_id: SessionId, state: PlayerState);
    fn on_player_changed(&mut self, session_id: &SessionId, state: PlayerState);
    fn on_player_removed(&mut self, session_id: &SessionId);
    fn on_resource_added(&mut self, state: ResourceState);
    fn on_resource_changed(&mut self, state: ResourceState);
    fn on_resource_removed(&mut self, id: &ResourceId);
}

/// Routes one event to the matching hook.
pub fn dispatch<L: RoomListener + ?Sized>(listener: &mut L, event: RoomEvent) {
    match event {
        RoomEvent::PlayerAdded { session_id, state } => listener.on_player_added(session_id, state),
        RoomEvent::PlayerChanged { session_id, state } => {
            listener.on_player_changed(&session_id, state)
        }
        RoomEvent::PlayerRemoved { session_id } => listener.on_player_removed(&session_id),
        RoomEvent::ResourceAdded(state) => listener.on_resource_added(state),
        RoomEvent::ResourceChanged(state) => listener.on_resource_changed(state),
        RoomEvent::ResourceRemoved { id } => listener.on_resource_removed(&id),
    }
}

/// Outgoing side of a room: fire-and-forget, never blocks the caller.
pub trait CommandSink {
    fn send(&self, kind: u8, command: Command);
}

/// Channel-backed [`CommandSink`] feeding the writer task.
#[derive(Debug, Clone)]
pub struct RoomSender {
    tx: UnboundedSender<RoomMsg>,
}

impl RoomSender {
    /// Creates a sender plus the receiver a writer drains.
    pub fn channel() -> (Self, UnboundedReceiver<RoomMsg>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl CommandSink for RoomSender {
    fn send(&self, kind: u8, command: Command) {
        if let Err(e) = self.tx.send(RoomMsg::Message { kind, command }) {
            debug!(error = %e, "Room writer gone, command dropped");
        }
    }
}

/// A joined room.
#[derive(Debug)]
pub struct Room {
    pub room_id: String,
    pub session_id: SessionId,
    events: UnboundedReceiver<RoomEvent>,
    sender: RoomSender,
    closed: bool,
    reader: JoinHandle<()>,
    writer: JoinHandle<()>,
}

impl Room {
    pub fn sender(&self) -> RoomSender {
        self.sender.clone()
    }

    /// Takes every event received so far.
    pub fn drain_events(&mut self) -> Vec<RoomEvent> {
        let mut out = Vec::new();
        loop {
            match self.events.try_recv() {
                Ok(event) => out.push(event),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    self.closed = true;
                    break;
                }
            }
        }
        out
    }

    /// Waits for the next event; `None` once the connection is gone.
    pub async fn next_event(&mut self) -> Option<RoomEvent> {
        let event = self.events.recv().await;
        if event.is_none() {
            self.closed = true;
        }
        event
    }

    /// True once the server side has gone away and every event was taken.
    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

impl Drop for Room {
    fn drop(&mut self) {
        self.reader.abort();
        self.writer.abort();
    }
}

/// Connects to a room server.
#[derive(Debug, Clone)]
pub struct RoomClient {
    server_addr: String,
}

impl RoomClient {
    pub fn new(server_addr: impl Into<String>) -> Self {
        Self {
            server_addr: server_addr.into(),
        }
    }

    /// Joins `room_name`, creating it server-side if needed.
    pub async fn join_or_create(&self, room_name: &str) -> anyhow::Result<Room> {
        let addr: SocketAddr = self.server_addr.parse().context("parse server_addr")?;
        info!(server = %addr, room = %room_name, "Joining room");

        let mut conn = ReliableConn::connect(addr).await?;
        conn.send(&RoomMsg::JoinOrCreate {
            room_name: room_name.to_string(),
        })
        .await?;

        let (room_id, session_id) = match conn.recv().await.context("await join reply")? {
            RoomMsg::Joined {
                room_id,
                session_id,
            } => (room_id, session_id),
            RoomMsg::JoinError { reason } => anyhow::bail!("join rejected: {reason}"),
            other => anyhow::bail!("expected Joined, got {other:?}"),
        };
        info!(session = %session_id, room = %room_id, "Joined room");

        let (reader, writer) = conn.into_split();
        let (event_tx, events) = mpsc::unbounded_channel();
        let (sender, outgoing) = RoomSender::channel();

        Ok(Room {
            room_id,
            session_id,
            events,
            sender,
            closed: false,
            reader: tokio::spawn(read_loop(reader, event_tx)),
            writer: tokio::spawn(write_loop(writer, outgoing)),
        })
    }
}

async fn read_loop(mut reader: FrameReader, events: UnboundedSender<RoomEvent>) {
    loop {
        match reader.recv().await {
            Ok(Some(msg)) => match RoomEvent::from_msg(msg) {
                Some(event) => {
                    if events.send(event).is_err() {
                        break;
                    }
                }
                None => debug!("Ignoring non-state frame from room"),
            },
            Ok(None) => {
                info!("Room connection closed");
                break;
            }
            Err(e) => {
                warn!(error = %e, "Room connection error");
                break;
            }
        }
    }
}

async fn write_loop(mut writer: FrameWriter, mut outgoing: UnboundedReceiver<RoomMsg>) {
    while let Some(msg) = outgoing.recv().await {
        if let Err(e) = writer.send(&msg).await {
            warn!(error = %e, "Room send failed");
            break;
        }
    }
}
