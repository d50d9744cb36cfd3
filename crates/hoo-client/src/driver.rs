//! Connect-and-login flow driven one tick at a time.

use hoo_config::NetworkConfig;
use hoo_net::protocol::{
    AccountInfo, ConnectRequest, ConnectStatus, LoginRequest, LoginStatus, TypedAnswer,
};
use hoo_net::{
    AnswerKind, ClientSession, EngineConfig, FrameConfig, SessionError, SessionState,
    SocketConfig, SocketEngine,
};
use tracing::{info, warn};

/// Build the socket engine settings from the network config.
pub fn engine_config(network: &NetworkConfig) -> EngineConfig {
    let defaults = SocketConfig::default();
    let keepalive = network.keepalive();
    EngineConfig {
        socket: SocketConfig {
            connect_timeout: network.connect_timeout(),
            tcp_nodelay: network.tcp_nodelay,
            keepalive_enabled: keepalive.is_some(),
            keepalive_idle: keepalive.unwrap_or(defaults.keepalive_idle),
            ..defaults
        },
        frame: FrameConfig {
            max_payload_size: network.max_payload_size,
        },
    }
}

/// Where the handshake stands.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Phase {
    AwaitingConnect,
    AwaitingLogin,
    Done,
    Rejected(String),
}

/// Outcome of one [`ClientDriver::step`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Progress {
    Running,
    /// Connected, and logged in when credentials were given.
    Done,
    /// The server answered but refused.
    Rejected(String),
    /// The session ended in a terminal state.
    Disconnected(SessionState),
}

/// Runs the connect handshake, then the optional login, over a session.
pub struct ClientDriver<E: SocketEngine> {
    session: ClientSession<E>,
    credentials: Option<(String, String)>,
    last_state: SessionState,
    phase: Phase,
}

impl<E: SocketEngine> ClientDriver<E> {
    /// Open the session and queue the connect request.
    pub fn start(
        mut session: ClientSession<E>,
        address: &str,
        port: u16,
        credentials: Option<(String, String)>,
    ) -> Result<Self, SessionError> {
        session.send(ConnectRequest::default());
        session.open(address, port)?;

        Ok(Self {
            last_state: session.state(),
            session,
            credentials,
            phase: Phase::AwaitingConnect,
        })
    }

    /// Advance the session by one tick and react to whatever arrived.
    pub fn step(&mut self) -> Progress {
        self.session.process_messages();

        let state = self.session.state();
        if state != self.last_state {
            info!("Session {} -> {}", self.last_state, state);
            self.last_state = state;
        }

        while let Some(answer) = self.session.pop_message(&AnswerKind::ALL) {
            self.handle(answer);
        }

        match &self.phase {
            Phase::Done => Progress::Done,
            Phase::Rejected(reason) => Progress::Rejected(reason.clone()),
            Phase::AwaitingConnect | Phase::AwaitingLogin if state.is_terminal() => {
                Progress::Disconnected(state)
            }
            Phase::AwaitingConnect | Phase::AwaitingLogin => Progress::Running,
        }
    }

    pub fn session(&self) -> &ClientSession<E> {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut ClientSession<E> {
        &mut self.session
    }

    fn handle(&mut self, answer: TypedAnswer) {
        match answer {
            TypedAnswer::Connect(connect) => {
                if connect.status != ConnectStatus::Ok {
                    self.phase = Phase::Rejected(format!("connect refused: {:?}", connect.status));
                    return;
                }
                info!("Connected to server version {}", connect.server_version);
                match self.credentials.take() {
                    Some((login, password)) => {
                        info!("Logging in as {login}");
                        self.session.send(LoginRequest { login, password });
                        self.phase = Phase::AwaitingLogin;
                    }
                    None => self.phase = Phase::Done,
                }
            }
            TypedAnswer::Login(login) => self.logged_in(login.status, login.account),
            TypedAnswer::LoginWithActivation(login) => self.logged_in(login.status, login.account),
            TypedAnswer::AdminMessage(admin) => warn!("Admin: {}", admin.message),
            TypedAnswer::MaintenanceMessage(notice) => warn!(
                "Maintenance in {}s: {}",
                notice.seconds_before_shutdown, notice.message
            ),
            other => info!("Received {}", other.kind()),
        }
    }

    fn logged_in(&mut self, status: LoginStatus, account: Option<AccountInfo>) {
        if status != LoginStatus::Ok {
            self.phase = Phase::Rejected(format!("login refused: {status:?}"));
            return;
        }

        self.session.set_app_connected(true);
        if let Some(account) = account {
            info!(
                "Logged in as {} ({} characters)",
                account.login,
                account.characters.len()
            );
        }
        self.phase = Phase::Done;
    }
}
