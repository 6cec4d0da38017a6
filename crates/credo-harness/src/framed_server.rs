//! Minimal game server speaking the framed wire protocol.
//!
//! Serves one connection: answers login, join and card requests, and after
//! `EnterGame` plays a fixed script of stream messages, then keeps reading
//! submissions until the client hangs up. Used to run the real
//! [`FramedTransport`](credo_client::FramedTransport) end to end, in memory
//! or over a simulated network.

use std::{collections::BTreeMap, io, time::Duration};

use bytes::BytesMut;
use credo_proto::{CardId, CardPrototype, ClientMessage, GameEvent, ServerMessage, frame};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::sim_server::Submission;

/// One scripted stream step.
#[derive(Debug, Clone)]
pub enum ScriptStep {
    /// Send a stream message.
    Send(GameEvent),
    /// Wait before the next step.
    Pause(Duration),
}

/// What the server observed on its connection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServerLog {
    /// Usernames that logged in.
    pub logins: Vec<String>,
    /// Room names joined.
    pub joins: Vec<String>,
    /// Submissions, in arrival order.
    pub submissions: Vec<Submission>,
}

/// Framed server for one connection.
#[derive(Debug, Clone, Default)]
pub struct FramedGameServer {
    script: Vec<ScriptStep>,
    prototypes: BTreeMap<CardId, CardPrototype>,
}

impl FramedGameServer {
    /// Server that plays `script` after `EnterGame`.
    pub fn new(script: Vec<ScriptStep>) -> Self {
        Self { script, prototypes: BTreeMap::new() }
    }

    /// Serve these card prototypes.
    #[must_use]
    pub fn with_prototypes(mut self, prototypes: BTreeMap<CardId, CardPrototype>) -> Self {
        self.prototypes = prototypes;
        self
    }

    /// Serve `stream` until the client disconnects. Returns what was seen.
    pub async fn serve<S>(&self, mut stream: S) -> io::Result<ServerLog>
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        let mut buf = BytesMut::new();
        let mut log = ServerLog::default();

        while let Some(message) = read_message(&mut stream, &mut buf).await? {
            match message {
                ClientMessage::Login { username } => {
                    let reply = ServerMessage::LoginReply {
                        message: format!("Hello, {username}!"),
                        token: format!("token:{username}"),
                    };
                    log.logins.push(username);
                    write_message(&mut stream, &reply).await?;
                },
                ClientMessage::JoinRoom { room_name, .. } => {
                    let reply = ServerMessage::JoinRoomReply {
                        success: true,
                        message: format!("joined {room_name}"),
                        room_id: format!("room:{room_name}"),
                    };
                    log.joins.push(room_name);
                    write_message(&mut stream, &reply).await?;
                },
                ClientMessage::GetCardPrototypes => {
                    let reply = ServerMessage::CardPrototypes { prototypes: self.prototypes.clone() };
                    write_message(&mut stream, &reply).await?;
                },
                ClientMessage::EnterGame { .. } => {
                    for step in &self.script {
                        match step {
                            ScriptStep::Send(event) => {
                                write_message(&mut stream, &ServerMessage::Event(event.clone()))
                                    .await?;
                            },
                            ScriptStep::Pause(duration) => tokio::time::sleep(*duration).await,
                        }
                    }
                },
                ClientMessage::SubmitUserEvent { room_id, seqnum, event, .. } => {
                    tracing::debug!(seqnum, event = event.name(), "server received submission");
                    log.submissions.push(Submission { room_id, seqnum, event });
                },
            }
        }

        Ok(log)
    }
}

async fn read_message<S>(stream: &mut S, buf: &mut BytesMut) -> io::Result<Option<ClientMessage>>
where
    S: AsyncRead + Unpin,
{
    loop {
        if let Some(message) = frame::decode(buf).map_err(io::Error::other)? {
            return Ok(Some(message));
        }
        if stream.read_buf(buf).await? == 0 {
            return Ok(None);
        }
    }
}

async fn write_message<S>(stream: &mut S, message: &ServerMessage) -> io::Result<()>
where
    S: AsyncWrite + Unpin,
{
    let mut bytes = Vec::new();
    frame::encode(message, &mut bytes).map_err(io::Error::other)?;
    stream.write_all(&bytes).await?;
    stream.flush().await
}
