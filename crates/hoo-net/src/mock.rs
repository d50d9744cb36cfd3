//! Scripted [`SocketEngine`] for session tests.

use std::collections::VecDeque;
use std::io;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crossbeam_channel::{Receiver, Sender, unbounded};

use crate::engine::{SocketEngine, TransportError};
use crate::wire::{SessionId, WireMessage};

/// Engine whose connect blocks until the test calls [`complete_connect`](Self::complete_connect).
pub(crate) struct ScriptedEngine {
    connect_tx: Sender<Option<SessionId>>,
    connect_rx: Receiver<Option<SessionId>>,
    connects: AtomicUsize,
    launches: AtomicUsize,
    inbound: Mutex<VecDeque<WireMessage>>,
    sent: Mutex<Vec<WireMessage>>,
    fail_sends: AtomicBool,
}

impl ScriptedEngine {
    pub(crate) fn new() -> Arc<Self> {
        let (connect_tx, connect_rx) = unbounded();
        Arc::new(Self {
            connect_tx,
            connect_rx,
            connects: AtomicUsize::new(0),
            launches: AtomicUsize::new(0),
            inbound: Mutex::new(VecDeque::new()),
            sent: Mutex::new(Vec::new()),
            fail_sends: AtomicBool::new(false),
        })
    }

    /// Unblock the pending (or next) connect with this outcome.
    pub(crate) fn complete_connect(&self, session: Option<SessionId>) {
        self.connect_tx.send(session).unwrap();
    }

    pub(crate) fn push_inbound(&self, message: WireMessage) {
        self.inbound.lock().unwrap().push_back(message);
    }

    pub(crate) fn sent(&self) -> Vec<WireMessage> {
        self.sent.lock().unwrap().clone()
    }

    pub(crate) fn fail_sends(&self, fail: bool) {
        self.fail_sends.store(fail, Ordering::SeqCst);
    }

    pub(crate) fn connects(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }

    pub(crate) fn launches(&self) -> usize {
        self.launches.load(Ordering::SeqCst)
    }
}

impl SocketEngine for ScriptedEngine {
    fn connect(&self, _address: &str, _port: u16) -> Result<SessionId, TransportError> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        match self.connect_rx.recv().unwrap() {
            Some(session) => Ok(session),
            None => Err(TransportError::Io(io::Error::from(
                io::ErrorKind::ConnectionRefused,
            ))),
        }
    }

    fn launch(&self) {
        self.launches.fetch_add(1, Ordering::SeqCst);
    }

    fn poll_message(&self) -> Option<WireMessage> {
        self.inbound.lock().unwrap().pop_front()
    }

    fn send_message(&self, message: &WireMessage) -> Result<(), TransportError> {
        if self.fail_sends.load(Ordering::SeqCst) {
            return Err(TransportError::Io(io::Error::from(io::ErrorKind::BrokenPipe)));
        }
        self.sent.lock().unwrap().push(message.clone());
        Ok(())
    }
}
