//! Connection session: handshake completion, control stream, message loop.
//!
//! One connection owns one transport and is served by one logical sequence
//! of steps: handshake, control-stream creation, then the receive loop.
//! The loop suspends only on the read of the next framed message and on
//! the writes of queued outbound messages; there is no other interleaving
//! within a connection.
//!
//! # Lifecycle
//!
//! | State                | Meaning                                      |
//! |----------------------|----------------------------------------------|
//! | `Created`            | Constructed around an open transport         |
//! | `Handshaking`        | Four-packet exchange in progress             |
//! | `ControlStreamActive`| Control stream registered, nothing read yet  |
//! | `Serving`            | Message loop running                         |
//! | `Closed`             | Transport released; terminal                 |
//!
//! The first three transitions happen once, synchronously, before any
//! message is read. Closing is idempotent: the framing collaborator is
//! released exactly once and later operations fail with
//! [`RtmpError::ConnectionClosed`].

use async_trait::async_trait;
use tokio::sync::mpsc;

use super::registry::StreamRegistry;
use super::stream::{Outbound, Stream, StreamState, StreamWriter};
use super::CONTROL_STREAM_ID;
use crate::codec::{AmfCodec, EncodingType, Frame, FrameIo, Message, Value};
use crate::command::{Command, StatusCode, StatusInfo};
use crate::error::{Result, RtmpError};
use crate::handshake::{
    handshake_client, handshake_server, ClientHandshakeKind, HandshakeMode, Transport,
};

/// Which side of the connection this session is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// Accepting side.
    Server,
    /// Dialing side.
    Client,
}

/// Connection lifecycle states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// Constructed around an open transport.
    Created,
    /// Four-packet handshake exchange in progress.
    Handshaking,
    /// Control stream registered; serving has not begun.
    ControlStreamActive,
    /// Message loop running.
    Serving,
    /// Torn down; the transport has been released.
    Closed,
}

/// Application callbacks invoked at defined lifecycle points.
#[async_trait]
pub trait SessionHandler: Send {
    /// The control stream is active and nothing has been read yet. A client
    /// handler typically queues its `connect` command here.
    async fn on_serve(&mut self, control: &StreamWriter) -> Result<()> {
        let _ = control;
        Ok(())
    }

    /// A typed command arrived on `stream` and passed state validation.
    async fn on_command(&mut self, stream: &mut Stream, command: &Command) -> Result<()>;

    /// An opaque media message arrived on `stream`.
    async fn on_media(&mut self, stream: &mut Stream, timestamp: u32, message: &Message)
        -> Result<()> {
        let _ = (stream, timestamp, message);
        Ok(())
    }

    /// The serving loop failed. Return `Ok(())` to report the session as
    /// finished anyway, or an error to surface it to the caller of `serve`.
    fn on_error(&mut self, error: &RtmpError) -> Result<()>;
}

/// One connection session: transport, stream registry, negotiated mode.
pub struct Connection<F: FrameIo, H: SessionHandler> {
    role: Role,
    state: ConnectionState,
    mode: HandshakeMode,
    framer: Option<F>,
    codec: Box<dyn AmfCodec>,
    handler: H,
    streams: StreamRegistry,
    outbound: Option<mpsc::UnboundedReceiver<Outbound>>,
    next_stream_id: u32,
}

impl<F: FrameIo, H: SessionHandler> Connection<F, H> {
    /// Wrap an already-handshaken framed transport.
    pub fn new(
        role: Role,
        mode: HandshakeMode,
        framer: F,
        codec: Box<dyn AmfCodec>,
        handler: H,
    ) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            role,
            state: ConnectionState::Created,
            mode,
            framer: Some(framer),
            codec,
            handler,
            streams: StreamRegistry::new(tx),
            outbound: Some(rx),
            next_stream_id: 1,
        }
    }

    /// Accept a server-side session: run the handshake on `transport`, hand
    /// the transport to the framing collaborator, and register the control
    /// stream.
    pub async fn accept<T, B>(
        mut transport: T,
        build_framer: B,
        codec: Box<dyn AmfCodec>,
        handler: H,
    ) -> Result<Self>
    where
        T: Transport,
        B: FnOnce(T) -> F,
    {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut conn = Self {
            role: Role::Server,
            state: ConnectionState::Created,
            mode: HandshakeMode::Simple,
            framer: None,
            codec,
            handler,
            streams: StreamRegistry::new(tx),
            outbound: Some(rx),
            next_stream_id: 1,
        };

        conn.state = ConnectionState::Handshaking;
        conn.mode = handshake_server(&mut transport)
            .await
            .map_err(|e| RtmpError::HandshakeFailed(Box::new(e)))?;
        conn.framer = Some(build_framer(transport));
        conn.activate_control_stream()?;
        Ok(conn)
    }

    /// Establish a client-side session: run the handshake flavor selected
    /// by `kind`, hand the transport to the framing collaborator, and
    /// register the control stream.
    pub async fn connect<T, B>(
        mut transport: T,
        kind: ClientHandshakeKind,
        build_framer: B,
        codec: Box<dyn AmfCodec>,
        handler: H,
    ) -> Result<Self>
    where
        T: Transport,
        B: FnOnce(T) -> F,
    {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut conn = Self {
            role: Role::Client,
            state: ConnectionState::Created,
            mode: HandshakeMode::Simple,
            framer: None,
            codec,
            handler,
            streams: StreamRegistry::new(tx),
            outbound: Some(rx),
            next_stream_id: 1,
        };

        conn.state = ConnectionState::Handshaking;
        let mut strategy = kind.strategy();
        conn.mode = handshake_client(&mut transport, strategy.as_mut())
            .await
            .map_err(|e| RtmpError::HandshakeFailed(Box::new(e)))?;
        conn.framer = Some(build_framer(transport));
        conn.activate_control_stream()?;
        Ok(conn)
    }

    /// Side of the connection.
    pub fn role(&self) -> Role {
        self.role
    }

    /// Current lifecycle state.
    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Negotiated handshake mode.
    pub fn mode(&self) -> HandshakeMode {
        self.mode
    }

    /// The stream registry (read-only view).
    pub fn streams(&self) -> &StreamRegistry {
        &self.streams
    }

    /// Send capability for a stream, if it exists.
    pub fn writer(&self, stream_id: u32) -> Option<StreamWriter> {
        self.streams.get(stream_id).map(|s| s.writer().clone())
    }

    /// Run the session: announce the control stream to the handler, then
    /// read and dispatch messages until the transport closes or an error
    /// ends the loop. Loop errors are routed through
    /// [`SessionHandler::on_error`], which decides what `serve` returns.
    pub async fn serve(&mut self) -> Result<()> {
        if self.state == ConnectionState::Created {
            self.activate_control_stream()?;
        }
        if self.state != ConnectionState::ControlStreamActive {
            return Err(RtmpError::ConnectionClosed);
        }

        let control = self
            .streams
            .get(CONTROL_STREAM_ID)
            .map(|s| s.writer().clone())
            .ok_or(RtmpError::StreamNotFound(CONTROL_STREAM_ID))?;
        if let Err(err) = self.handler.on_serve(&control).await {
            self.close_quietly().await;
            return Err(err);
        }
        // A client handler queues its connect here; push it out before the
        // first read.
        if let Err(err) = self.flush_outbound().await {
            self.close_quietly().await;
            return Err(err);
        }

        self.state = ConnectionState::Serving;
        tracing::debug!(role = ?self.role, mode = ?self.mode, "session serving");

        let result = self.message_loop().await;
        self.close_quietly().await;
        match result {
            Ok(()) => Ok(()),
            Err(err) => {
                tracing::warn!(error = %err, "serving loop failed");
                self.handler.on_error(&err)
            }
        }
    }

    /// Close the connection, releasing the transport.
    ///
    /// Idempotent: the framing collaborator is closed exactly once, no
    /// matter how many internal paths get here. Pending stream writers fail
    /// with [`RtmpError::ConnectionClosed`] afterwards.
    pub async fn close(&mut self) -> Result<()> {
        self.outbound = None;
        if let Some(mut framer) = self.framer.take() {
            self.state = ConnectionState::Closed;
            framer.close().await?;
            tracing::debug!("connection closed");
        }
        Ok(())
    }

    async fn close_quietly(&mut self) {
        if let Err(err) = self.close().await {
            tracing::debug!(error = %err, "transport close failed");
        }
    }

    fn activate_control_stream(&mut self) -> Result<()> {
        self.streams
            .create(CONTROL_STREAM_ID, StreamState::NotConnected)?;
        self.state = ConnectionState::ControlStreamActive;
        tracing::debug!(role = ?self.role, mode = ?self.mode, "control stream active");
        Ok(())
    }

    async fn message_loop(&mut self) -> Result<()> {
        loop {
            let frame = self
                .framer
                .as_mut()
                .ok_or(RtmpError::ConnectionClosed)?
                .read_frame()
                .await?;
            let Some(frame) = frame else {
                tracing::debug!("transport closed by peer");
                return Ok(());
            };
            tracing::trace!(
                stream_id = frame.stream_id,
                kind = frame.message.kind(),
                "frame received"
            );
            self.dispatch(frame).await?;
            self.flush_outbound().await?;
        }
    }

    async fn dispatch(&mut self, frame: Frame) -> Result<()> {
        let Frame {
            stream_id,
            timestamp,
            message,
        } = frame;

        match &message {
            Message::Audio(_) | Message::Video(_) => {
                let stream = self
                    .streams
                    .get_mut(stream_id)
                    .ok_or(RtmpError::StreamNotFound(stream_id))?;
                self.handler.on_media(&mut *stream, timestamp, &message).await
            }
            Message::Command { encoding, payload } => {
                let (name, transaction_id, args) = self.decode_command(payload)?;
                let command = Command::from_args(&name, &args)?;
                self.handle_command(stream_id, transaction_id, *encoding, command)
                    .await
            }
            Message::Data { payload, .. } => {
                let mut values = self.decode_values(payload)?.into_iter();
                let name = match values.next() {
                    Some(Value::String(s)) => s,
                    _ => {
                        return Err(RtmpError::ProtocolViolation(
                            "data message missing event name".to_string(),
                        ))
                    }
                };
                let args: Vec<Value> = values.collect();
                let command = Command::from_args(&name, &args)?;
                let stream = self
                    .streams
                    .get_mut(stream_id)
                    .ok_or(RtmpError::StreamNotFound(stream_id))?;
                self.handler.on_command(&mut *stream, &command).await
            }
        }
    }

    async fn handle_command(
        &mut self,
        stream_id: u32,
        transaction_id: f64,
        encoding: EncodingType,
        command: Command,
    ) -> Result<()> {
        tracing::debug!(stream_id, command = command.name(), "command received");
        match self.role {
            Role::Server => {
                self.handle_server_command(stream_id, transaction_id, encoding, command)
                    .await
            }
            Role::Client => {
                self.handle_client_command(stream_id, transaction_id, encoding, command)
                    .await
            }
        }
    }

    async fn handle_server_command(
        &mut self,
        stream_id: u32,
        transaction_id: f64,
        encoding: EncodingType,
        command: Command,
    ) -> Result<()> {
        match &command {
            Command::Connect { .. } => {
                if stream_id != CONTROL_STREAM_ID {
                    return Err(RtmpError::ProtocolViolation(format!(
                        "connect on stream {stream_id} instead of the control stream"
                    )));
                }
                let stream = self
                    .streams
                    .get_mut(CONTROL_STREAM_ID)
                    .ok_or(RtmpError::StreamNotFound(CONTROL_STREAM_ID))?;
                stream.transition(StreamState::Connected)?;
                self.handler.on_command(&mut *stream, &command).await?;
                stream.writer().send_command(
                    transaction_id,
                    encoding,
                    Command::ConnectResult {
                        properties: Value::Object(vec![
                            ("fmsVer".to_string(), Value::from("FMS/3,0,1,123")),
                            ("capabilities".to_string(), Value::Number(31.0)),
                        ]),
                        information: StatusInfo::status(
                            StatusCode::ConnectSuccess,
                            "Connection succeeded.",
                        )
                        .to_value(),
                    },
                )
            }
            Command::CreateStream => {
                if stream_id != CONTROL_STREAM_ID {
                    return Err(RtmpError::ProtocolViolation(format!(
                        "createStream on stream {stream_id} instead of the control stream"
                    )));
                }
                let control = self
                    .streams
                    .get_mut(CONTROL_STREAM_ID)
                    .ok_or(RtmpError::StreamNotFound(CONTROL_STREAM_ID))?;
                if control.state() != StreamState::Connected {
                    return Err(RtmpError::ProtocolViolation(
                        "createStream before connect".to_string(),
                    ));
                }
                self.handler.on_command(&mut *control, &command).await?;
                let writer = control.writer().clone();

                let id = self.next_stream_id;
                self.next_stream_id += 1;
                self.streams.create(id, StreamState::Created)?;
                writer.send_command(
                    transaction_id,
                    encoding,
                    Command::CreateStreamResult { stream_id: id },
                )
            }
            Command::Publish {
                publishing_name, ..
            } => {
                self.require_connected("publish")?;
                let stream = self
                    .streams
                    .get_mut(stream_id)
                    .ok_or(RtmpError::StreamNotFound(stream_id))?;
                stream.transition(StreamState::Publishing)?;
                match self.handler.on_command(&mut *stream, &command).await {
                    Ok(()) => stream.writer().send_status(StatusInfo::status(
                        StatusCode::PublishStart,
                        format!("Publishing {publishing_name}."),
                    )),
                    Err(err) => {
                        stream.writer().send_status(StatusInfo::error(
                            StatusCode::PublishFailed,
                            err.to_string(),
                        ))?;
                        Err(err)
                    }
                }
            }
            Command::Play { stream_name, .. } => {
                self.require_connected("play")?;
                let stream = self
                    .streams
                    .get_mut(stream_id)
                    .ok_or(RtmpError::StreamNotFound(stream_id))?;
                stream.transition(StreamState::Playing)?;
                match self.handler.on_command(&mut *stream, &command).await {
                    Ok(()) => stream.writer().send_status(StatusInfo::status(
                        StatusCode::PlayStart,
                        format!("Playing {stream_name}."),
                    )),
                    Err(err) => {
                        stream.writer().send_status(StatusInfo::error(
                            StatusCode::PlayFailed,
                            err.to_string(),
                        ))?;
                        Err(err)
                    }
                }
            }
            Command::DeleteStream { stream_id: target } => {
                let target = *target;
                if let Some(stream) = self.streams.get_mut(target) {
                    self.handler.on_command(&mut *stream, &command).await?;
                }
                self.streams.delete(target)
            }
            Command::CloseStream => {
                let stream = self
                    .streams
                    .get_mut(stream_id)
                    .ok_or(RtmpError::StreamNotFound(stream_id))?;
                stream.transition(StreamState::Closed)?;
                self.handler.on_command(&mut *stream, &command).await
            }
            Command::ConnectResult { .. }
            | Command::CreateStreamResult { .. }
            | Command::OnStatus(_)
            | Command::FcPublish { .. }
            | Command::FcUnpublish { .. }
            | Command::ReleaseStream { .. }
            | Command::SetDataFrame { .. }
            | Command::GetStreamLength { .. }
            | Command::Ping => {
                // No built-in behavior; the application decides.
                let stream = self
                    .streams
                    .get_mut(stream_id)
                    .ok_or(RtmpError::StreamNotFound(stream_id))?;
                self.handler.on_command(&mut *stream, &command).await
            }
        }
    }

    async fn handle_client_command(
        &mut self,
        stream_id: u32,
        _transaction_id: f64,
        _encoding: EncodingType,
        command: Command,
    ) -> Result<()> {
        match &command {
            Command::ConnectResult { .. } => {
                let control = self
                    .streams
                    .get_mut(CONTROL_STREAM_ID)
                    .ok_or(RtmpError::StreamNotFound(CONTROL_STREAM_ID))?;
                control.transition(StreamState::Connected)?;
                self.handler.on_command(&mut *control, &command).await
            }
            Command::CreateStreamResult { stream_id: new_id } => {
                let stream = self.streams.create(*new_id, StreamState::Created)?;
                self.handler.on_command(&mut *stream, &command).await
            }
            Command::OnStatus(info) => {
                let stream = self
                    .streams
                    .get_mut(stream_id)
                    .ok_or(RtmpError::StreamNotFound(stream_id))?;
                match info.code {
                    StatusCode::PublishStart if stream.state() == StreamState::Created => {
                        stream.transition(StreamState::Publishing)?;
                    }
                    StatusCode::PlayStart if stream.state() == StreamState::Created => {
                        stream.transition(StreamState::Playing)?;
                    }
                    _ => {}
                }
                self.handler.on_command(&mut *stream, &command).await
            }
            _ => {
                let stream = self
                    .streams
                    .get_mut(stream_id)
                    .ok_or(RtmpError::StreamNotFound(stream_id))?;
                self.handler.on_command(&mut *stream, &command).await
            }
        }
    }

    fn require_connected(&self, command: &str) -> Result<()> {
        let connected = self
            .streams
            .get(CONTROL_STREAM_ID)
            .map(|s| s.state() == StreamState::Connected)
            .unwrap_or(false);
        if connected {
            Ok(())
        } else {
            Err(RtmpError::ProtocolViolation(format!(
                "{command} before connect"
            )))
        }
    }

    async fn flush_outbound(&mut self) -> Result<()> {
        loop {
            let item = match self.outbound.as_mut() {
                Some(rx) => match rx.try_recv() {
                    Ok(item) => item,
                    Err(_) => return Ok(()),
                },
                None => return Ok(()),
            };
            let frame = self.encode_outbound(item)?;
            self.framer
                .as_mut()
                .ok_or(RtmpError::ConnectionClosed)?
                .write_frame(frame)
                .await?;
        }
    }

    fn encode_outbound(&self, item: Outbound) -> Result<Frame> {
        match item {
            Outbound::Message {
                stream_id,
                timestamp,
                message,
            } => Ok(Frame {
                stream_id,
                timestamp,
                message,
            }),
            Outbound::Command {
                stream_id,
                timestamp,
                transaction_id,
                encoding,
                command,
            } => {
                let mut values = vec![Value::from(command.name())];
                if !command.is_data() {
                    values.push(Value::Number(transaction_id));
                }
                values.extend(command.to_args(encoding)?);

                let mut body = Vec::new();
                self.codec.encode(&mut body, &values)?;
                let payload = bytes::Bytes::from(body);
                let message = if command.is_data() {
                    Message::Data { encoding, payload }
                } else {
                    Message::Command { encoding, payload }
                };
                tracing::trace!(stream_id, command = command.name(), "command written");
                Ok(Frame {
                    stream_id,
                    timestamp,
                    message,
                })
            }
        }
    }

    fn decode_values(&self, payload: &[u8]) -> Result<Vec<Value>> {
        let mut reader = payload;
        self.codec.decode(&mut reader)
    }

    fn decode_command(&self, payload: &[u8]) -> Result<(String, f64, Vec<Value>)> {
        let mut values = self.decode_values(payload)?.into_iter();
        let name = match values.next() {
            Some(Value::String(s)) => s,
            _ => {
                return Err(RtmpError::ProtocolViolation(
                    "command body missing name".to_string(),
                ))
            }
        };
        let transaction_id = match values.next() {
            Some(Value::Number(n)) => n,
            _ => {
                return Err(RtmpError::ProtocolViolation(format!(
                    "command {name} missing transaction id"
                )))
            }
        };
        Ok((name, transaction_id, values.collect()))
    }
}

/// Accept and serve one server-side session over `transport`.
pub async fn serve_server_session<T, F, H, B>(
    transport: T,
    build_framer: B,
    codec: Box<dyn AmfCodec>,
    handler: H,
) -> Result<()>
where
    T: Transport,
    F: FrameIo,
    H: SessionHandler,
    B: FnOnce(T) -> F,
{
    let mut conn = Connection::accept(transport, build_framer, codec, handler).await?;
    conn.serve().await
}

/// Establish and serve one client-side session over `transport`.
pub async fn connect_client_session<T, F, H, B>(
    transport: T,
    kind: ClientHandshakeKind,
    build_framer: B,
    codec: Box<dyn AmfCodec>,
    handler: H,
) -> Result<()>
where
    T: Transport,
    F: FrameIo,
    H: SessionHandler,
    B: FnOnce(T) -> F,
{
    let mut conn = Connection::connect(transport, kind, build_framer, codec, handler).await?;
    conn.serve().await
}
