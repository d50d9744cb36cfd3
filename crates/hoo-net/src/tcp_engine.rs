//! Blocking TCP implementation of [`SocketEngine`].
//!
//! `connect` establishes the stream and assigns a local session id. `launch`
//! starts a reader thread that decodes frames into a channel drained by
//! [`poll_message`](SocketEngine::poll_message). When the stream ends the
//! reader enqueues a synthetic `CloseSession` so the session sees the loss on
//! its next tick.

use std::net::{Shutdown, TcpStream, ToSocketAddrs};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::thread::JoinHandle;

use crossbeam_channel::{Receiver, Sender, unbounded};

use crate::engine::{SocketEngine, TransportError};
use crate::framing::{FrameConfig, FrameError, read_frame, write_frame};
use crate::platform::{SocketConfig, connect_stream};
use crate::wire::{SessionId, WireKind, WireMessage};

/// Configuration for [`TcpSocketEngine`].
#[derive(Debug, Clone, Default)]
pub struct EngineConfig {
    pub socket: SocketConfig,
    pub frame: FrameConfig,
}

/// The live connection.
struct Link {
    session: SessionId,
    writer: TcpStream,
    /// Read half, moved into the reader thread by `launch`.
    reader: Option<TcpStream>,
    reader_thread: Option<JoinHandle<()>>,
}

/// TCP socket engine with a background reader thread.
pub struct TcpSocketEngine {
    config: EngineConfig,
    link: Mutex<Option<Link>>,
    next_session: AtomicU32,
    inbound_tx: Sender<WireMessage>,
    inbound_rx: Receiver<WireMessage>,
}

impl TcpSocketEngine {
    pub fn new(config: EngineConfig) -> Self {
        let (inbound_tx, inbound_rx) = unbounded();
        Self {
            config,
            link: Mutex::new(None),
            next_session: AtomicU32::new(0),
            inbound_tx,
            inbound_rx,
        }
    }

    /// Session id of the current connection, if any.
    pub fn session(&self) -> Option<SessionId> {
        self.lock_link().as_ref().map(|link| link.session)
    }

    /// Next local session id, wrapping within the wire-representable range.
    fn next_session_id(&self) -> SessionId {
        let previous = self
            .next_session
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |id| {
                Some(if id >= SessionId::MAX { 0 } else { id + 1 })
            })
            .unwrap_or_else(|id| id);
        SessionId(previous.min(SessionId::MAX))
    }

    fn lock_link(&self) -> MutexGuard<'_, Option<Link>> {
        self.link.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Close the current connection, join its reader, and drop undelivered messages.
    fn teardown(&self) {
        let Some(mut link) = self.lock_link().take() else {
            return;
        };

        let _ = link.writer.shutdown(Shutdown::Both);
        if let Some(handle) = link.reader_thread.take()
            && handle.join().is_err()
        {
            tracing::error!("Reader thread for session {} panicked", link.session);
        }

        while self.inbound_rx.try_recv().is_ok() {}
        tracing::debug!("Session {} torn down", link.session);
    }

    fn read_loop(
        mut stream: TcpStream,
        session: SessionId,
        frame: FrameConfig,
        inbound: Sender<WireMessage>,
    ) {
        loop {
            match read_frame(&mut stream, &frame) {
                Ok(bytes) => match WireMessage::decode(&bytes) {
                    Ok(message) => {
                        if inbound.send(message).is_err() {
                            break;
                        }
                    }
                    Err(e) => tracing::warn!("Dropping undecodable frame: {e}"),
                },
                Err(FrameError::ConnectionClosed) => {
                    tracing::info!("Session {session} closed by peer");
                    let _ = inbound.send(WireMessage::control(WireKind::CloseSession, Some(session)));
                    break;
                }
                Err(e) => {
                    tracing::info!("Session {session} read failed: {e}");
                    let _ = inbound.send(WireMessage::control(WireKind::CloseSession, Some(session)));
                    break;
                }
            }
        }
    }
}

impl SocketEngine for TcpSocketEngine {
    fn connect(&self, address: &str, port: u16) -> Result<SessionId, TransportError> {
        let addrs: Vec<_> = (address, port)
            .to_socket_addrs()
            .map_err(|_| TransportError::Resolve {
                address: address.to_string(),
            })?
            .collect();
        if addrs.is_empty() {
            return Err(TransportError::Resolve {
                address: address.to_string(),
            });
        }

        let stream = connect_stream(&addrs, &self.config.socket)?;
        let reader = stream.try_clone()?;

        self.teardown();

        let session = self.next_session_id();
        *self.lock_link() = Some(Link {
            session,
            writer: stream,
            reader: Some(reader),
            reader_thread: None,
        });

        tracing::debug!("Connected to {address}:{port} as session {session}");
        Ok(session)
    }

    fn launch(&self) {
        let mut guard = self.lock_link();
        let Some(link) = guard.as_mut() else {
            tracing::warn!("launch() without a connection");
            return;
        };
        let Some(reader) = link.reader.take() else {
            return;
        };

        let session = link.session;
        let frame = self.config.frame.clone();
        let inbound = self.inbound_tx.clone();
        let spawned = std::thread::Builder::new()
            .name("hoo-net-reader".into())
            .spawn(move || Self::read_loop(reader, session, frame, inbound));

        match spawned {
            Ok(handle) => link.reader_thread = Some(handle),
            Err(e) => {
                tracing::error!("Failed to spawn reader thread: {e}");
                let _ = self
                    .inbound_tx
                    .send(WireMessage::control(WireKind::CloseSession, Some(session)));
            }
        }
    }

    fn poll_message(&self) -> Option<WireMessage> {
        self.inbound_rx.try_recv().ok()
    }

    fn send_message(&self, message: &WireMessage) -> Result<(), TransportError> {
        if message.kind() == WireKind::CloseSession {
            self.teardown();
            return Ok(());
        }

        let mut guard = self.lock_link();
        let link = guard.as_mut().ok_or(TransportError::NotConnected)?;
        write_frame(&mut link.writer, &message.encode(), &self.config.frame)?;
        Ok(())
    }
}

impl Drop for TcpSocketEngine {
    fn drop(&mut self) {
        self.teardown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::*;
    use std::net::{SocketAddr, TcpListener};
    use std::time::{Duration, Instant};

    fn engine() -> TcpSocketEngine {
        TcpSocketEngine::new(EngineConfig::default())
    }

    fn listener() -> (TcpListener, SocketAddr) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        (listener, addr)
    }

    fn wait_for_message(engine: &TcpSocketEngine) -> WireMessage {
        let deadline = Instant::now() + Duration::from_secs(5);
        loop {
            if let Some(message) = engine.poll_message() {
                return message;
            }
            assert!(Instant::now() < deadline, "no inbound message within 5s");
            std::thread::sleep(Duration::from_millis(5));
        }
    }

    #[test]
    fn test_connect_assigns_increasing_sessions() {
        let (_listener, addr) = listener();
        let engine = engine();

        let first = engine.connect("127.0.0.1", addr.port()).unwrap();
        let second = engine.connect("127.0.0.1", addr.port()).unwrap();
        assert!(second.0 > first.0);
        assert_eq!(engine.session(), Some(second));
    }

    #[test]
    fn test_session_ids_wrap_within_wire_range() {
        let engine = engine();
        engine.next_session.store(SessionId::MAX, Ordering::Relaxed);

        assert_eq!(engine.next_session_id(), SessionId(SessionId::MAX));
        assert_eq!(engine.next_session_id(), SessionId(0));
        assert_eq!(engine.next_session_id(), SessionId(1));
    }

    #[test]
    fn test_connect_to_closed_port_fails() {
        let (listener, addr) = listener();
        drop(listener);

        let result = engine().connect("127.0.0.1", addr.port());
        assert!(matches!(result, Err(TransportError::Io(_))));
    }

    #[test]
    fn test_send_without_connection_fails() {
        let msg = WireMessage::application(None, vec![1, 2, 3, 4]);
        assert!(matches!(
            engine().send_message(&msg),
            Err(TransportError::NotConnected)
        ));
    }

    #[test]
    fn test_sent_message_reaches_server_framed() {
        let (listener, addr) = listener();
        let engine = engine();
        let session = engine.connect("127.0.0.1", addr.port()).unwrap();
        let (mut server, _) = listener.accept().unwrap();

        let payload = Request::from(ChatMessageRequest {
            text: "hello".to_string(),
        })
        .encode()
        .unwrap();
        let msg = WireMessage::application(Some(session), payload);
        engine.send_message(&msg).unwrap();

        let frame = read_frame(&mut server, &FrameConfig::default()).unwrap();
        assert_eq!(WireMessage::decode(&frame).unwrap(), msg);
    }

    #[test]
    fn test_launched_engine_receives_server_messages() {
        let (listener, addr) = listener();
        let engine = engine();
        engine.connect("127.0.0.1", addr.port()).unwrap();
        let (mut server, _) = listener.accept().unwrap();
        engine.launch();

        let answer = TypedAnswer::from(ConnectAnswer {
            status: ConnectStatus::Ok,
            server_version: 1,
        });
        let msg = WireMessage::application(Some(SessionId(0)), answer.encode().unwrap());
        write_frame(&mut server, &msg.encode(), &FrameConfig::default()).unwrap();

        assert_eq!(wait_for_message(&engine), msg);
    }

    #[test]
    fn test_peer_close_yields_close_session() {
        let (listener, addr) = listener();
        let engine = engine();
        let session = engine.connect("127.0.0.1", addr.port()).unwrap();
        let (server, _) = listener.accept().unwrap();
        engine.launch();
        drop(server);

        let msg = wait_for_message(&engine);
        assert_eq!(msg.kind(), WireKind::CloseSession);
        assert_eq!(msg.session(), Some(session));
    }

    #[test]
    fn test_undecodable_frame_is_skipped() {
        let (listener, addr) = listener();
        let engine = engine();
        engine.connect("127.0.0.1", addr.port()).unwrap();
        let (mut server, _) = listener.accept().unwrap();
        engine.launch();

        let config = FrameConfig::default();
        write_frame(&mut server, &[250, 0, 0, 0, 0], &config).unwrap();
        let full = WireMessage::control(WireKind::MaxConnectionsReached, None);
        write_frame(&mut server, &full.encode(), &config).unwrap();

        assert_eq!(wait_for_message(&engine), full);
    }

    #[test]
    fn test_close_session_tears_down_link() {
        let (listener, addr) = listener();
        let engine = engine();
        let session = engine.connect("127.0.0.1", addr.port()).unwrap();
        let (_server, _) = listener.accept().unwrap();
        engine.launch();

        engine
            .send_message(&WireMessage::control(WireKind::CloseSession, Some(session)))
            .unwrap();

        assert_eq!(engine.session(), None);
        assert!(engine.poll_message().is_none(), "teardown drains the reader's close notice");
        assert!(matches!(
            engine.send_message(&WireMessage::application(Some(session), vec![0; 4])),
            Err(TransportError::NotConnected)
        ));
    }
}
