use std::{
    io::ErrorKind,
    net::TcpStream,
    thread::{self, JoinHandle},
    time::{Duration, Instant},
};

use tracing::{debug, info, warn};
use tungstenite::{Error, Message, WebSocket, stream::MaybeTlsStream};

type Socket = WebSocket<MaybeTlsStream<TcpStream>>;

/// How long a close-waiter keeps polling for the peer's half of the close
/// handshake before giving up and dropping the socket.
const CLOSE_GRACE: Duration = Duration::from_secs(5);
/// Close-waiter poll interval.
const CLOSE_TICK: Duration = Duration::from_millis(5);

/// Client link to the remote game server. At most one exists per chip;
/// `Down` covers both "never dialled" and "closed or failed".
pub(crate) enum Link {
    Down,
    Up(Socket),
}

impl Link {
    /// Dial `url`, then switch the transport to non-blocking so poll ticks
    /// return immediately. Failure logs and yields `Down`.
    pub fn open(url: &str) -> Self {
        let (socket, _response) = match tungstenite::connect(url) {
            Ok(ok) => ok,
            Err(err) => {
                warn!(%url, %err, "server dial failed");
                return Self::Down;
            }
        };
        match socket.get_ref() {
            MaybeTlsStream::Plain(stream) => {
                if let Err(err) = stream.set_nonblocking(true) {
                    warn!(%err, "could not make server socket non-blocking");
                    return Self::Down;
                }
            }
            // Poll ticks run under the engine lock, so a transport that
            // cannot be switched to non-blocking reads must not be kept.
            _ => {
                warn!(%url, "unsupported server transport, only plain ws:// links are driven");
                return Self::Down;
            }
        }
        info!(%url, "server link up");
        Self::Up(socket)
    }

    #[inline]
    pub fn is_up(&self) -> bool {
        matches!(self, Self::Up(_))
    }

    /// Forward one game message to the server as a binary frame. Dropped
    /// silently when the link is down; transport failures drop the link.
    pub fn send_binary(&mut self, payload: &[u8]) {
        let Self::Up(socket) = self else {
            debug!(len = payload.len(), "link down, dropping outbound message");
            return;
        };
        if let Err(err) = socket.write(Message::binary(payload.to_vec())) {
            warn!(%err, "server send failed");
            *self = Self::Down;
            return;
        }
        match socket.flush() {
            Ok(()) => {}
            // Remaining bytes go out on later poll ticks.
            Err(Error::Io(err)) if err.kind() == ErrorKind::WouldBlock => {}
            Err(err) => {
                warn!(%err, "server flush failed");
                *self = Self::Down;
            }
        }
    }

    /// One poll tick: hand every complete inbound binary message to
    /// `on_message`. Stops when the transport would block; hard errors drop
    /// the link.
    pub fn pump(&mut self, mut on_message: impl FnMut(&[u8])) {
        let Self::Up(socket) = self else { return };
        loop {
            match socket.read() {
                Ok(Message::Binary(data)) => on_message(&data),
                // Text, ping and pong are not part of the game protocol.
                Ok(_) => {}
                Err(Error::Io(err)) if err.kind() == ErrorKind::WouldBlock => return,
                Err(Error::ConnectionClosed | Error::AlreadyClosed) => {
                    info!("server link closed");
                    *self = Self::Down;
                    return;
                }
                Err(err) => {
                    warn!(%err, "server read failed");
                    *self = Self::Down;
                    return;
                }
            }
        }
    }

    /// Start the close handshake and hand the socket to a waiter thread that
    /// polls it until the transport reports closed. The link is `Down` as
    /// soon as this returns; the caller keeps the handle for joining.
    pub fn begin_close(&mut self) -> Option<JoinHandle<()>> {
        let Self::Up(mut socket) = std::mem::replace(self, Self::Down) else {
            return None;
        };
        if let Err(err) = socket.close(None) {
            debug!(%err, "close request");
        }
        Some(thread::spawn(move || drain_until_closed(socket)))
    }
}

/// Close-waiter body. Bounded by [`CLOSE_GRACE`] so an unresponsive peer
/// cannot hang engine shutdown.
fn drain_until_closed(mut socket: Socket) {
    let deadline = Instant::now() + CLOSE_GRACE;
    loop {
        match socket.read() {
            Ok(_) => {}
            Err(Error::Io(err)) if err.kind() == ErrorKind::WouldBlock => {
                if Instant::now() >= deadline {
                    debug!("close handshake timed out");
                    return;
                }
                thread::sleep(CLOSE_TICK);
            }
            Err(Error::ConnectionClosed | Error::AlreadyClosed) => return,
            Err(err) => {
                debug!(%err, "close-waiter read");
                return;
            }
        }
    }
}
