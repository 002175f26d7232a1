use std::io;
use std::net::TcpStream;
use std::time::Instant;

use thiserror::Error;
use tracing::{info, warn};
use tungstenite::{Message, WebSocket};
use url::Url;

use crate::protocol::{decode_server_message, DecodeError, OutboundFrame, ServerMessage};
use crate::throttle::WarnThrottle;

const DEFAULT_WS_PORT: u16 = 80;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundFrame {
    Text(String),
    Binary(Vec<u8>),
}

impl InboundFrame {
    fn len(&self) -> usize {
        match self {
            InboundFrame::Text(text) => text.len(),
            InboundFrame::Binary(bytes) => bytes.len(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportStatus {
    Open,
    Closed,
}

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("channel is closed")]
    Closed,
    #[error("write buffer is full")]
    WriteBufferFull,
    #[error("websocket error: {0}")]
    Socket(#[source] Box<tungstenite::Error>),
}

#[derive(Debug, Error)]
pub enum ConnectError {
    #[error("unsupported url scheme '{0}' (only ws:// is supported)")]
    UnsupportedScheme(String),
    #[error("failed to resolve server address: {0}")]
    Resolve(#[source] io::Error),
    #[error("failed to open tcp connection: {0}")]
    Tcp(#[source] io::Error),
    #[error("websocket handshake failed: {0}")]
    Handshake(String),
}

/// Message-oriented duplex channel polled from the frame loop. Implementations must
/// never block.
pub trait Transport {
    /// Appends every frame that has arrived since the last poll.
    fn poll_frames(&mut self, out: &mut Vec<InboundFrame>) -> TransportStatus;
    fn send_text(&mut self, text: String) -> Result<(), TransportError>;
    fn close(&mut self) {}
}

/// WebSocket over a non-blocking `TcpStream`. The handshake runs blocking, before the
/// window opens.
#[derive(Debug)]
pub struct WsTransport {
    socket: WebSocket<TcpStream>,
}

impl WsTransport {
    pub fn connect(url: &Url) -> Result<Self, ConnectError> {
        if url.scheme() != "ws" {
            return Err(ConnectError::UnsupportedScheme(url.scheme().to_string()));
        }
        let addrs = url
            .socket_addrs(|| Some(DEFAULT_WS_PORT))
            .map_err(ConnectError::Resolve)?;
        let stream = TcpStream::connect(&*addrs).map_err(ConnectError::Tcp)?;
        if let Err(err) = stream.set_nodelay(true) {
            warn!(error = %err, "websocket_nodelay_failed");
        }

        let (mut socket, response) = tungstenite::client(url.as_str(), stream)
            .map_err(|err| ConnectError::Handshake(err.to_string()))?;
        socket
            .get_mut()
            .set_nonblocking(true)
            .map_err(ConnectError::Tcp)?;

        info!(url = %url, status = response.status().as_u16(), "connected");
        Ok(Self { socket })
    }
}

fn is_would_block(err: &tungstenite::Error) -> bool {
    matches!(err, tungstenite::Error::Io(io_err) if io_err.kind() == io::ErrorKind::WouldBlock)
}

fn is_closed(err: &tungstenite::Error) -> bool {
    matches!(
        err,
        tungstenite::Error::ConnectionClosed | tungstenite::Error::AlreadyClosed
    )
}

impl Transport for WsTransport {
    fn poll_frames(&mut self, out: &mut Vec<InboundFrame>) -> TransportStatus {
        loop {
            match self.socket.read() {
                Ok(Message::Text(text)) => out.push(InboundFrame::Text(text.as_str().to_owned())),
                Ok(Message::Binary(bytes)) => out.push(InboundFrame::Binary(bytes.to_vec())),
                Ok(Message::Close(frame)) => {
                    info!(frame = ?frame, "close_frame_received");
                    return TransportStatus::Closed;
                }
                Ok(Message::Ping(_) | Message::Pong(_) | Message::Frame(_)) => {}
                Err(err) if is_would_block(&err) => break,
                Err(err) if is_closed(&err) => return TransportStatus::Closed,
                Err(err) => {
                    warn!(error = %err, "websocket_read_failed");
                    return TransportStatus::Closed;
                }
            }
        }

        // Pong replies and partially written frames sit in the write buffer until flushed.
        match self.socket.flush() {
            Ok(()) => TransportStatus::Open,
            Err(err) if is_would_block(&err) => TransportStatus::Open,
            Err(err) if is_closed(&err) => TransportStatus::Closed,
            Err(err) => {
                warn!(error = %err, "websocket_flush_failed");
                TransportStatus::Closed
            }
        }
    }

    fn send_text(&mut self, text: String) -> Result<(), TransportError> {
        match self.socket.send(Message::text(text)) {
            Ok(()) => Ok(()),
            // Queued; the next flush pushes it out.
            Err(err) if is_would_block(&err) => Ok(()),
            Err(tungstenite::Error::WriteBufferFull(_)) => Err(TransportError::WriteBufferFull),
            Err(err) if is_closed(&err) => Err(TransportError::Closed),
            Err(err) => Err(TransportError::Socket(Box::new(err))),
        }
    }

    fn close(&mut self) {
        if let Err(err) = self.socket.close(None) {
            if !is_closed(&err) && !is_would_block(&err) {
                warn!(error = %err, "websocket_close_failed");
            }
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConnectionStats {
    pub messages_in: u64,
    pub bytes_in: u64,
    pub messages_out: u64,
    pub bytes_out: u64,
    pub malformed_dropped: u64,
    pub write_buffer_drops: u64,
}

/// Owns the channel: decodes inbound frames for the session's handler and sends
/// outbound frames until the channel closes. Closing is terminal.
#[derive(Debug)]
pub struct ConnectionManager<T: Transport> {
    transport: T,
    open: bool,
    stats: ConnectionStats,
    inbound: Vec<InboundFrame>,
    decode_warnings: WarnThrottle,
    write_full_warnings: WarnThrottle,
}

impl<T: Transport> ConnectionManager<T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            open: true,
            stats: ConnectionStats::default(),
            inbound: Vec::new(),
            decode_warnings: WarnThrottle::default(),
            write_full_warnings: WarnThrottle::default(),
        }
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn stats(&self) -> ConnectionStats {
        self.stats
    }

    /// Hands every decoded message to `handler` in arrival order. Malformed frames are
    /// counted and dropped.
    pub fn drain<F: FnMut(ServerMessage)>(&mut self, mut handler: F) {
        if !self.open {
            return;
        }

        let status = self.transport.poll_frames(&mut self.inbound);
        let mut frames = std::mem::take(&mut self.inbound);
        for frame in frames.drain(..) {
            self.stats.messages_in = self.stats.messages_in.saturating_add(1);
            self.stats.bytes_in = self.stats.bytes_in.saturating_add(frame.len() as u64);
            match decode_frame(frame) {
                Ok(message) => handler(message),
                Err(error) => {
                    self.stats.malformed_dropped = self.stats.malformed_dropped.saturating_add(1);
                    if let Some(suppressed) = self.decode_warnings.check(Instant::now()) {
                        warn!(error = %error, suppressed, "inbound_message_dropped");
                    }
                }
            }
        }
        self.inbound = frames;

        if status == TransportStatus::Closed {
            self.mark_closed("remote");
        }
    }

    /// Fire-and-forget. A no-op once the channel is closed; returns whether the frame
    /// was handed to the transport.
    pub fn send(&mut self, frame: &OutboundFrame) -> bool {
        if !self.open {
            return false;
        }
        let text = match serde_json::to_string(frame) {
            Ok(text) => text,
            Err(error) => {
                warn!(error = %error, "outbound_encode_failed");
                return false;
            }
        };
        let bytes = text.len() as u64;

        match self.transport.send_text(text) {
            Ok(()) => {
                self.stats.messages_out = self.stats.messages_out.saturating_add(1);
                self.stats.bytes_out = self.stats.bytes_out.saturating_add(bytes);
                true
            }
            Err(TransportError::WriteBufferFull) => {
                self.stats.write_buffer_drops = self.stats.write_buffer_drops.saturating_add(1);
                if let Some(suppressed) = self.write_full_warnings.check(Instant::now()) {
                    warn!(suppressed, "outbound_frame_dropped_write_buffer_full");
                }
                false
            }
            Err(TransportError::Closed) => {
                self.mark_closed("remote");
                false
            }
            Err(error) => {
                warn!(error = %error, "outbound_send_failed");
                self.mark_closed("send_error");
                false
            }
        }
    }

    pub fn close(&mut self) {
        if self.open {
            self.transport.close();
            self.mark_closed("local_shutdown");
        }
    }

    fn mark_closed(&mut self, reason: &'static str) {
        self.open = false;
        let stats = self.stats;
        info!(
            reason,
            messages_in = stats.messages_in,
            bytes_in = stats.bytes_in,
            messages_out = stats.messages_out,
            bytes_out = stats.bytes_out,
            malformed_dropped = stats.malformed_dropped,
            write_buffer_drops = stats.write_buffer_drops,
            "connection_closed"
        );
    }
}

fn decode_frame(frame: InboundFrame) -> Result<ServerMessage, DecodeError> {
    match frame {
        InboundFrame::Text(text) => decode_server_message(&text),
        InboundFrame::Binary(bytes) => {
            let text = String::from_utf8(bytes).map_err(|_| DecodeError::NonUtf8Binary)?;
            decode_server_message(&text)
        }
    }
}
