//! Server answers: the closed set of typed messages the client can receive.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::encode_tagged;

// ---------------------------------------------------------------------------
// AnswerKind
// ---------------------------------------------------------------------------

/// Wire type tag of a server answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum AnswerKind {
    Connect = 0,
    Login = 1,
    CheckLoginAvailable = 2,
    CreateAccount = 3,
    SelectCharacter = 4,
    QuickMatch = 5,
    CancelQuickMatch = 6,
    LaunchMatch = 7,
    Loading = 8,
    AdminMessage = 9,
    MaintenanceMessage = 10,
    ChatMessage = 11,
    GameCommand = 12,
    SendActivationCode = 13,
    LoginWithActivation = 14,
}

impl AnswerKind {
    /// Every answer kind, in tag order.
    pub const ALL: [AnswerKind; 15] = [
        AnswerKind::Connect,
        AnswerKind::Login,
        AnswerKind::CheckLoginAvailable,
        AnswerKind::CreateAccount,
        AnswerKind::SelectCharacter,
        AnswerKind::QuickMatch,
        AnswerKind::CancelQuickMatch,
        AnswerKind::LaunchMatch,
        AnswerKind::Loading,
        AnswerKind::AdminMessage,
        AnswerKind::MaintenanceMessage,
        AnswerKind::ChatMessage,
        AnswerKind::GameCommand,
        AnswerKind::SendActivationCode,
        AnswerKind::LoginWithActivation,
    ];

    pub fn tag(self) -> u32 {
        self as u32
    }

    /// Look up the kind for a wire tag.
    pub fn from_tag(tag: u32) -> Option<Self> {
        Self::ALL.get(tag as usize).copied()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Connect => "USER_CONNECT_ANSWER",
            Self::Login => "USER_LOGIN_ANSWER",
            Self::CheckLoginAvailable => "USER_CHECK_LOGIN_AVAILABLE_ANSWER",
            Self::CreateAccount => "USER_CREATE_ACCOUNT_ANSWER",
            Self::SelectCharacter => "USER_SELECT_CHARACTER_ANSWER",
            Self::QuickMatch => "USER_QUICK_MATCH_ANSWER",
            Self::CancelQuickMatch => "USER_CANCEL_QUICK_MATCH_ANSWER",
            Self::LaunchMatch => "USER_LAUNCH_MATCH_ANSWER",
            Self::Loading => "USER_LOADING_ANSWER",
            Self::AdminMessage => "USER_ADMIN_MESSAGE_ANSWER",
            Self::MaintenanceMessage => "USER_MAINTENANCE_MESSAGE_ANSWER",
            Self::ChatMessage => "USER_CHAT_MESSAGE_ANSWER",
            Self::GameCommand => "USER_GAME_COMMAND_ANSWER",
            Self::SendActivationCode => "USER_SEND_ACTIVATION_CODE_ANSWER",
            Self::LoginWithActivation => "USER_LOGIN_WITH_ACTIVATION_ANSWER",
        }
    }
}

impl fmt::Display for AnswerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Shared value types
// ---------------------------------------------------------------------------

/// Result of the initial connect handshake.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConnectStatus {
    Ok,
    /// Client and server protocol versions differ.
    VersionError,
    /// Server is in maintenance and refuses new players.
    Maintenance,
}

/// Result of a login attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LoginStatus {
    Ok,
    Failed,
    PasswordFailed,
    AlreadyLogged,
    Forbidden,
    AccountLocked,
    AccountBanned,
    /// Account exists but was never activated.
    NotActivated,
}

/// A playable character attached to an account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CharacterInfo {
    pub id: u64,
    pub name: String,
    pub level: u32,
}

/// Account summary sent after a successful login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountInfo {
    pub login: String,
    pub characters: Vec<CharacterInfo>,
}

/// Availability of a login name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LoginAvailability {
    Available,
    NotAvailable,
    /// The name does not satisfy the server's naming rules.
    Incorrect,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CreateAccountStatus {
    AccountCreated,
    LoginNotAvailable,
    InvalidMail,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchmakingStatus {
    Ok,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LoadingStatus {
    /// Every player finished loading, the match starts.
    Finished,
    /// An opponent left while loading.
    OpponentLeft,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActivationCodeStatus {
    CodeSent,
    UnknownAccount,
    AlreadyActivated,
}

/// Public information about a match opponent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpponentInfo {
    pub name: String,
    pub level: u32,
}

// ---------------------------------------------------------------------------
// Answer payloads
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectAnswer {
    pub status: ConnectStatus,
    pub server_version: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginAnswer {
    pub status: LoginStatus,
    /// Present only when `status` is [`LoginStatus::Ok`].
    pub account: Option<AccountInfo>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckLoginAvailableAnswer {
    pub login: String,
    pub availability: LoginAvailability,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateAccountAnswer {
    pub status: CreateAccountStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectCharacterAnswer {
    pub status: MatchmakingStatus,
    pub character_id: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuickMatchAnswer {
    pub status: MatchmakingStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CancelQuickMatchAnswer {
    pub status: MatchmakingStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LaunchMatchAnswer {
    pub status: MatchmakingStatus,
    pub level_id: u32,
    /// Slot of the local player in the match.
    pub player_id: u32,
    pub opponents: Vec<OpponentInfo>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadingAnswer {
    pub status: LoadingStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminMessageAnswer {
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaintenanceMessageAnswer {
    pub message: String,
    /// Seconds left before the server goes down.
    pub seconds_before_shutdown: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessageAnswer {
    pub sender: String,
    pub text: String,
}

/// Opaque in-game command stream for one simulation turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameCommandAnswer {
    pub turn: u32,
    pub command_data: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendActivationCodeAnswer {
    pub status: ActivationCodeStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginWithActivationAnswer {
    pub status: LoginStatus,
    pub account: Option<AccountInfo>,
}

// ---------------------------------------------------------------------------
// TypedAnswer
// ---------------------------------------------------------------------------

/// A decoded server answer, one variant per [`AnswerKind`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypedAnswer {
    Connect(ConnectAnswer),
    Login(LoginAnswer),
    CheckLoginAvailable(CheckLoginAvailableAnswer),
    CreateAccount(CreateAccountAnswer),
    SelectCharacter(SelectCharacterAnswer),
    QuickMatch(QuickMatchAnswer),
    CancelQuickMatch(CancelQuickMatchAnswer),
    LaunchMatch(LaunchMatchAnswer),
    Loading(LoadingAnswer),
    AdminMessage(AdminMessageAnswer),
    MaintenanceMessage(MaintenanceMessageAnswer),
    ChatMessage(ChatMessageAnswer),
    GameCommand(GameCommandAnswer),
    SendActivationCode(SendActivationCodeAnswer),
    LoginWithActivation(LoginWithActivationAnswer),
}

variant_from!(TypedAnswer {
    Connect(ConnectAnswer),
    Login(LoginAnswer),
    CheckLoginAvailable(CheckLoginAvailableAnswer),
    CreateAccount(CreateAccountAnswer),
    SelectCharacter(SelectCharacterAnswer),
    QuickMatch(QuickMatchAnswer),
    CancelQuickMatch(CancelQuickMatchAnswer),
    LaunchMatch(LaunchMatchAnswer),
    Loading(LoadingAnswer),
    AdminMessage(AdminMessageAnswer),
    MaintenanceMessage(MaintenanceMessageAnswer),
    ChatMessage(ChatMessageAnswer),
    GameCommand(GameCommandAnswer),
    SendActivationCode(SendActivationCodeAnswer),
    LoginWithActivation(LoginWithActivationAnswer),
});

impl TypedAnswer {
    pub fn kind(&self) -> AnswerKind {
        match self {
            Self::Connect(_) => AnswerKind::Connect,
            Self::Login(_) => AnswerKind::Login,
            Self::CheckLoginAvailable(_) => AnswerKind::CheckLoginAvailable,
            Self::CreateAccount(_) => AnswerKind::CreateAccount,
            Self::SelectCharacter(_) => AnswerKind::SelectCharacter,
            Self::QuickMatch(_) => AnswerKind::QuickMatch,
            Self::CancelQuickMatch(_) => AnswerKind::CancelQuickMatch,
            Self::LaunchMatch(_) => AnswerKind::LaunchMatch,
            Self::Loading(_) => AnswerKind::Loading,
            Self::AdminMessage(_) => AnswerKind::AdminMessage,
            Self::MaintenanceMessage(_) => AnswerKind::MaintenanceMessage,
            Self::ChatMessage(_) => AnswerKind::ChatMessage,
            Self::GameCommand(_) => AnswerKind::GameCommand,
            Self::SendActivationCode(_) => AnswerKind::SendActivationCode,
            Self::LoginWithActivation(_) => AnswerKind::LoginWithActivation,
        }
    }

    /// Whether this answer's kind is one of `filter`.
    pub fn matches(&self, filter: &[AnswerKind]) -> bool {
        filter.contains(&self.kind())
    }

    /// Encode as an application payload (`[tag][body]`), the way a server sends it.
    pub fn encode(&self) -> Result<Vec<u8>, postcard::Error> {
        let tag = self.kind().tag();
        match self {
            Self::Connect(a) => encode_tagged(tag, a),
            Self::Login(a) => encode_tagged(tag, a),
            Self::CheckLoginAvailable(a) => encode_tagged(tag, a),
            Self::CreateAccount(a) => encode_tagged(tag, a),
            Self::SelectCharacter(a) => encode_tagged(tag, a),
            Self::QuickMatch(a) => encode_tagged(tag, a),
            Self::CancelQuickMatch(a) => encode_tagged(tag, a),
            Self::LaunchMatch(a) => encode_tagged(tag, a),
            Self::Loading(a) => encode_tagged(tag, a),
            Self::AdminMessage(a) => encode_tagged(tag, a),
            Self::MaintenanceMessage(a) => encode_tagged(tag, a),
            Self::ChatMessage(a) => encode_tagged(tag, a),
            Self::GameCommand(a) => encode_tagged(tag, a),
            Self::SendActivationCode(a) => encode_tagged(tag, a),
            Self::LoginWithActivation(a) => encode_tagged(tag, a),
        }
    }
}
