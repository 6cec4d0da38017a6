//! Framed transport over a single async byte stream.
//!
//! Request/reply calls write one [`ClientMessage`] frame and read one
//! [`ServerMessage`] frame. Concurrent calls take turns. `enter_game` hands
//! the read half to a pump task that forwards `Event` frames to the
//! [`Subscription`]; while that stream is open the connection only accepts
//! submissions, and request/reply calls fail with [`TransportError::Busy`].
//!
//! A call dropped after its request went out still owes a reply. The next
//! reader discards it before reading its own.

use std::{collections::BTreeMap, io, sync::Arc};

use async_trait::async_trait;
use bytes::BytesMut;
use credo_proto::{
    CardId, CardPrototype, ClientMessage, FrameError, HEADER_LEN, ServerMessage, UserEvent, frame,
};
use tokio::{
    io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, ReadHalf, WriteHalf},
    sync::Mutex,
};

use crate::{
    config::TransportConfig,
    error::TransportError,
    session::{AuthToken, RoomId, Session},
    transport::{CardService, GameTransport, RoomService, StreamItem, Subscription},
};

struct Inbound<S> {
    reader: ReadHalf<S>,
    buf: BytesMut,
    max_frame_len: usize,
    /// Requests sent whose reply has not been read.
    unanswered: usize,
}

impl<S: AsyncRead> Inbound<S> {
    /// Read the next message. `Ok(None)` on a clean end of stream.
    async fn read_message(&mut self) -> Result<Option<ServerMessage>, TransportError> {
        loop {
            if self.buf.len() >= HEADER_LEN {
                let mut header = [0u8; HEADER_LEN];
                header.copy_from_slice(&self.buf[..HEADER_LEN]);
                let len = frame::payload_len(header)?;
                if len > self.max_frame_len {
                    let max = self.max_frame_len;
                    return Err(FrameError::TooLarge { len, max }.into());
                }
            }

            if let Some(message) = frame::decode(&mut self.buf)? {
                return Ok(Some(message));
            }

            if self.reader.read_buf(&mut self.buf).await? == 0 {
                if self.buf.is_empty() {
                    return Ok(None);
                }
                return Err(io::Error::from(io::ErrorKind::UnexpectedEof).into());
            }
        }
    }

    /// Drop replies owed to cancelled calls.
    async fn discard_unanswered(&mut self) -> Result<(), TransportError> {
        while self.unanswered > 0 {
            match self.read_message().await? {
                Some(reply) => {
                    tracing::debug!("discarding reply to a cancelled call: {reply:?}");
                    self.unanswered -= 1;
                },
                None => return Err(TransportError::Closed),
            }
        }
        Ok(())
    }
}

/// [`RoomService`], [`CardService`] and [`GameTransport`] over one
/// connection.
pub struct FramedTransport<S> {
    /// Serializes request/reply calls and `enter_game`.
    turn: Mutex<()>,
    inbound: Arc<Mutex<Inbound<S>>>,
    outbound: Mutex<WriteHalf<S>>,
    config: TransportConfig,
}

impl<S> FramedTransport<S>
where
    S: AsyncRead + AsyncWrite + Send + Unpin + 'static,
{
    /// Wrap a connected stream with default limits.
    pub fn new(stream: S) -> Self {
        Self::with_config(stream, TransportConfig::default())
    }

    /// Wrap a connected stream.
    pub fn with_config(stream: S, config: TransportConfig) -> Self {
        let (reader, writer) = tokio::io::split(stream);
        let max_frame_len = config.max_frame_len.min(credo_proto::MAX_FRAME_LEN);
        Self {
            turn: Mutex::new(()),
            inbound: Arc::new(Mutex::new(Inbound {
                reader,
                buf: BytesMut::with_capacity(8 * 1024),
                max_frame_len,
                unanswered: 0,
            })),
            outbound: Mutex::new(writer),
            config,
        }
    }

    async fn send(&self, message: &ClientMessage) -> Result<(), TransportError> {
        let mut bytes = Vec::new();
        frame::encode(message, &mut bytes)?;

        let mut writer = self.outbound.lock().await;
        writer.write_all(&bytes).await?;
        writer.flush().await?;
        Ok(())
    }

    async fn call(&self, message: &ClientMessage) -> Result<ServerMessage, TransportError> {
        let _turn = self.turn.lock().await;
        // Only the stream pump holds the read half past a turn.
        let mut inbound = self.inbound.try_lock().map_err(|_| TransportError::Busy)?;
        inbound.discard_unanswered().await?;

        self.send(message).await?;
        inbound.unanswered += 1;
        let reply = inbound.read_message().await;
        inbound.unanswered -= 1;

        match reply? {
            Some(ServerMessage::Error { message }) => Err(TransportError::Rejected { message }),
            Some(reply) => Ok(reply),
            None => Err(TransportError::Closed),
        }
    }
}

fn unexpected(expected: &'static str, actual: &ServerMessage) -> TransportError {
    TransportError::UnexpectedReply { expected, actual: format!("{actual:?}") }
}

#[async_trait]
impl<S> RoomService for FramedTransport<S>
where
    S: AsyncRead + AsyncWrite + Send + Unpin + 'static,
{
    async fn login(&self, username: &str) -> Result<AuthToken, TransportError> {
        let reply = self.call(&ClientMessage::Login { username: username.to_string() }).await?;
        match reply {
            ServerMessage::LoginReply { message, token } => {
                tracing::debug!("login: {message}");
                Ok(AuthToken::new(token))
            },
            other => Err(unexpected("login_reply", &other)),
        }
    }

    async fn join_room(
        &self,
        token: &AuthToken,
        room_name: &str,
    ) -> Result<RoomId, TransportError> {
        let reply = self
            .call(&ClientMessage::JoinRoom {
                token: token.as_str().to_string(),
                room_name: room_name.to_string(),
            })
            .await?;

        match reply {
            ServerMessage::JoinRoomReply { success: true, room_id, .. } => Ok(RoomId::new(room_id)),
            ServerMessage::JoinRoomReply { success: false, message, .. } => {
                Err(TransportError::Rejected { message })
            },
            other => Err(unexpected("join_room_reply", &other)),
        }
    }
}

#[async_trait]
impl<S> CardService for FramedTransport<S>
where
    S: AsyncRead + AsyncWrite + Send + Unpin + 'static,
{
    async fn card_prototypes(&self) -> Result<BTreeMap<CardId, CardPrototype>, TransportError> {
        match self.call(&ClientMessage::GetCardPrototypes).await? {
            ServerMessage::CardPrototypes { prototypes } => Ok(prototypes),
            other => Err(unexpected("card_prototypes", &other)),
        }
    }
}

#[async_trait]
impl<S> GameTransport for FramedTransport<S>
where
    S: AsyncRead + AsyncWrite + Send + Unpin + 'static,
{
    async fn enter_game(&self, session: &Session) -> Result<Subscription, TransportError> {
        let _turn = self.turn.lock().await;
        let mut inbound =
            Arc::clone(&self.inbound).try_lock_owned().map_err(|_| TransportError::Busy)?;
        inbound.discard_unanswered().await?;

        self.send(&ClientMessage::EnterGame {
            token: session.token().as_str().to_string(),
            room_id: session.room_id().as_str().to_string(),
        })
        .await?;

        let (events, subscription) = Subscription::channel(self.config.event_buffer);
        let pump = tokio::spawn(async move {
            loop {
                let item: StreamItem = match inbound.read_message().await {
                    Ok(Some(ServerMessage::Event(event))) => Ok(event),
                    Ok(Some(ServerMessage::Error { message })) => {
                        Err(TransportError::Rejected { message })
                    },
                    Ok(Some(other)) => Err(unexpected("event", &other)),
                    Ok(None) => break,
                    Err(error) => Err(error),
                };

                let failed = item.is_err();
                if events.send(item).await.is_err() || failed {
                    break;
                }
            }
        });

        Ok(subscription.with_pump(pump))
    }

    async fn submit_user_event(
        &self,
        session: &Session,
        seqnum: u64,
        event: UserEvent,
    ) -> Result<(), TransportError> {
        self.send(&ClientMessage::SubmitUserEvent {
            token: session.token().as_str().to_string(),
            room_id: session.room_id().as_str().to_string(),
            seqnum,
            event,
        })
        .await
    }
}
