//! `grind_tests`
//!
//! Test harness: an in-process fake room server speaking the room wire
//! protocol, so the client can be exercised over real sockets.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use anyhow::Context;
use grind_shared::net::{Command, ReliableConn, ReliableListener, RoomMsg, SessionId};
use tracing::debug;

/// Listens on an ephemeral localhost port.
pub struct FakeRoomServer {
    listener: ReliableListener,
    room_id: String,
}

impl FakeRoomServer {
    pub async fn bind(room_id: &str) -> anyhow::Result<Self> {
        let addr = SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 0);
        Ok(Self {
            listener: ReliableListener::bind(addr).await?,
            room_id: room_id.to_string(),
        })
    }

    pub fn addr(&self) -> anyhow::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Accepts one client and completes its join as `session_id`.
    pub async fn accept(&self, session_id: &str) -> anyhow::Result<FakeSession> {
        let (mut conn, peer) = self.listener.accept().await?;
        let room_name = expect_join(&mut conn).await?;
        debug!(%peer, room = %room_name, "Fake room accepted join");

        let session_id = SessionId(session_id.to_string());
        conn.send(&RoomMsg::Joined {
            room_id: self.room_id.clone(),
            session_id: session_id.clone(),
        })
        .await?;
        Ok(FakeSession {
            conn,
            room_name,
            session_id,
        })
    }

    /// Accepts one client and turns its join down.
    pub async fn reject(&self, reason: &str) -> anyhow::Result<()> {
        let (mut conn, _) = self.listener.accept().await?;
        expect_join(&mut conn).await?;
        conn.send(&RoomMsg::JoinError {
            reason: reason.to_string(),
        })
        .await
    }
}

async fn expect_join(conn: &mut ReliableConn) -> anyhow::Result<String> {
    match conn.recv().await.context("await join")? {
        RoomMsg::JoinOrCreate { room_name } => Ok(room_name),
        other => anyhow::bail!("expected JoinOrCreate, got {other:?}"),
    }
}

/// Server side of one joined client.
pub struct FakeSession {
    conn: ReliableConn,
    pub room_name: String,
    pub session_id: SessionId,
}

impl FakeSession {
    pub async fn push(&mut self, msg: RoomMsg) -> anyhow::Result<()> {
        self.conn.send(&msg).await
    }

    /// Waits for the next command message from the client.
    pub async fn recv_command(&mut self) -> anyhow::Result<(u8, Command)> {
        match self.conn.recv().await? {
            RoomMsg::Message { kind, command } => Ok((kind, command)),
            other => anyhow::bail!("expected Message, got {other:?}"),
        }
    }
}
