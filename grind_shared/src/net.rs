//! Room wire protocol.
//!
//! Goals:
//! - Keep the client/room exchange explicit: one enum, one frame per message.
//! - Frames are a big-endian `u32` length followed by a JSON payload.
//!
//! The room server owns all state; this module only carries notifications in
//! and commands out.

use std::collections::BTreeMap;
use std::fmt;
use std::net::SocketAddr;

use anyhow::Context;
use bytes::{BufMut, BytesMut};
use serde::{Deserialize, Serialize};
use tokio::{
    io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt},
    net::{
        tcp::{OwnedReadHalf, OwnedWriteHalf},
        TcpListener, TcpStream,
    },
};
use tracing::debug;

/// Message type tag for movement/action commands.
pub const COMMAND_MESSAGE: u8 = 0;

/// Upper bound on a single frame, guards against garbage length prefixes.
pub const MAX_FRAME_LEN: usize = 1024 * 1024;

/// Session id the room assigns to each joined client.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SessionId(pub String);

/// Server-assigned id of a world resource.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ResourceId(pub String);

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Input for one fixed tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Command {
    #[serde(rename = "left")]
    pub move_left: bool,
    #[serde(rename = "right")]
    pub move_right: bool,
    #[serde(rename = "up")]
    pub move_up: bool,
    #[serde(rename = "down")]
    pub move_down: bool,
    #[serde(rename = "action")]
    pub action_triggered: bool,
}

impl Command {
    /// True when at least one field is set, i.e. the command is worth sending.
    pub fn any(&self) -> bool {
        self.move_left || self.move_right || self.move_up || self.move_down || self.action_triggered
    }
}

/// Authoritative player fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlayerState {
    pub x: f32,
    pub y: f32,
    #[serde(default)]
    pub inventory: BTreeMap<String, u32>,
}

/// Authoritative resource fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceState {
    pub id: ResourceId,
    pub x: f32,
    pub y: f32,
    pub image: String,
    pub health: u32,
}

/// Message envelope for both directions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RoomMsg {
    // ─── Handshake ───
    JoinOrCreate {
        room_name: String,
    },
    Joined {
        room_id: String,
        session_id: SessionId,
    },
    JoinError {
        reason: String,
    },

    // ─── Players ───
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

    // ─── Resources ───
    ResourceAdded(ResourceState),
    ResourceChanged(ResourceState),
    ResourceRemoved {
        id: ResourceId,
    },

    // ─── Client -> room ───
    Message {
        kind: u8,
        command: Command,
    },
}

async fn write_frame<W: AsyncWrite + Unpin>(w: &mut W, msg: &RoomMsg) -> anyhow::Result<()> {
    let payload = serde_json::to_vec(msg).context("serialize msg")?;
    anyhow::ensure!(
        payload.len() <= MAX_FRAME_LEN,
        "frame of {} bytes exceeds limit",
        payload.len()
    );
    let mut buf = BytesMut::with_capacity(4 + payload.len());
    buf.put_u32(payload.len() as u32);
    buf.extend_from_slice(&payload);
    w.write_all(&buf).await.context("tcp write")?;
    Ok(())
}

/// Reads one frame; `Ok(None)` on a clean close between frames.
///
/// A stream that ends inside the length prefix or the payload is an error.
async fn read_frame<R: AsyncRead + Unpin>(r: &mut R) -> anyhow::Result<Option<RoomMsg>> {
    let mut len_buf = [0u8; 4];
    if r.read(&mut len_buf[..1]).await.context("tcp read len")? == 0 {
        return Ok(None);
    }
    r.read_exact(&mut len_buf[1..])
        .await
        .context("tcp read len: stream ended inside length prefix")?;
    let len = u32::from_be_bytes(len_buf) as usize;
    if len > MAX_FRAME_LEN {
        anyhow::bail!("frame of {len} bytes exceeds limit");
    }
    let mut payload = vec![0u8; len];
    r.read_exact(&mut payload)
        .await
        .context("tcp read payload")?;
    let msg = serde_json::from_slice(&payload).context("deserialize msg")?;
    Ok(Some(msg))
}

/// Reliable connection over TCP with length-prefixed frames.
#[derive(Debug)]
pub struct ReliableConn {
    stream: TcpStream,
}

impl ReliableConn {
    pub fn new(stream: TcpStream) -> Self {
        Self { stream }
    }

    pub async fn connect(addr: SocketAddr) -> anyhow::Result<Self> {
        let stream = TcpStream::connect(addr).await.context("tcp connect")?;
        Ok(Self::new(stream))
    }

    pub async fn send(&mut self, msg: &RoomMsg) -> anyhow::Result<()> {
        write_frame(&mut self.stream, msg).await
    }

    /// Receives the next message, failing if the peer closed the stream.
    pub async fn recv(&mut self) -> anyhow::Result<RoomMsg> {
        read_frame(&mut self.stream)
            .await?
            .context("connection closed")
    }

    /// Splits into independently owned halves for reader/writer tasks.
    pub fn into_split(self) -> (FrameReader, FrameWriter) {
        let (read, write) = self.stream.into_split();
        (FrameReader { read }, FrameWriter { write })
    }
}

/// Receiving half of a [`ReliableConn`].
#[derive(Debug)]
pub struct FrameReader {
    read: OwnedReadHalf,
}

impl FrameReader {
    pub async fn recv(&mut self) -> anyhow::Result<Option<RoomMsg>> {
        read_frame(&mut self.read).await
    }
}

/// Sending half of a [`ReliableConn`].
#[derive(Debug)]
pub struct FrameWriter {
    write: OwnedWriteHalf,
}

impl FrameWriter {
    pub async fn send(&mut self, msg: &RoomMsg) -> anyhow::Result<()> {
        write_frame(&mut self.write, msg).await
    }
}

/// TCP listener, used by room servers and test harnesses.
pub struct ReliableListener {
    listener: TcpListener,
}

impl ReliableListener {
    pub async fn bind(addr: SocketAddr) -> anyhow::Result<Self> {
        let listener = TcpListener::bind(addr).await.context("tcp bind")?;
        Ok(Self { listener })
    }

    pub async fn accept(&self) -> anyhow::Result<(ReliableConn, SocketAddr)> {
        let (stream, addr) = self.listener.accept().await.context("tcp accept")?;
        debug!(peer = %addr, "Accepted connection");
        Ok((ReliableConn::new(stream), addr))
    }

    pub fn local_addr(&self) -> anyhow::Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_uses_short_wire_names() {
        let cmd = Command {
            move_left: true,
            action_triggered: true,
            ..Command::default()
        };
        let json = serde_json::to_value(cmd).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "left": true, "right": false, "up": false, "down": false, "action": true
            })
        );
    }

    #[test]
    fn empty_command_is_not_sent() {
        assert!(!Command::default().any());
        let cmd = Command {
            move_down: true,
            ..Command::default()
        };
        assert!(cmd.any());
    }

    #[test]
    fn player_state_without_inventory_decodes() {
        let state: PlayerState = serde_json::from_str(r#"{ "x": 1.0, "y": 2.0 }"#).unwrap();
        assert!(state.inventory.is_empty());
    }

    #[tokio::test]
    async fn frames_survive_a_duplex_pipe() -> anyhow::Result<()> {
        let (mut a, mut b) = tokio::io::duplex(256);
        let msg = RoomMsg::Message {
            kind: COMMAND_MESSAGE,
            command: Command {
                move_up: true,
                ..Command::default()
            },
        };
        write_frame(&mut a, &msg).await?;
        drop(a);
        assert_eq!(read_frame(&mut b).await?, Some(msg));
        assert_eq!(read_frame(&mut b).await?, None);
        Ok(())
    }

    #[tokio::test]
    async fn oversized_frame_is_rejected() {
        let (mut a, mut b) = tokio::io::duplex(64);
        a.write_all(&(u32::MAX).to_be_bytes()).await.unwrap();
        assert!(read_frame(&mut b).await.is_err());
    }

    #[tokio::test]
    async fn stream_cut_inside_length_prefix_is_an_error() {
        let (mut a, mut b) = tokio::io::duplex(64);
        a.write_all(&[0, 0]).await.unwrap();
        drop(a);
        let err = read_frame(&mut b).await.unwrap_err();
        assert!(format!("{err:#}").contains("length prefix"));
    }

    #[tokio::test]
    async fn garbage_payload_is_an_error() {
        let (mut a, mut b) = tokio::io::duplex(64);
        a.write_all(&8u32.to_be_bytes()).await.unwrap();
        a.write_all(b"not json").await.unwrap();
        assert!(read_frame(&mut b).await.is_err());
    }

    #[tokio::test]
    async fn writer_refuses_frames_the_reader_would_reject() {
        let (mut a, mut b) = tokio::io::duplex(64);
        let huge = RoomMsg::JoinOrCreate {
            room_name: "x".repeat(MAX_FRAME_LEN),
        };
        assert!(write_frame(&mut a, &huge).await.is_err());
        drop(a);
        assert_eq!(read_frame(&mut b).await.unwrap(), None);
    }
}
