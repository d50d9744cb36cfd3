//! Client requests: everything the application can queue with
//! [`ClientSession::send`](crate::ClientSession::send).

use serde::{Deserialize, Serialize};

use super::encode_tagged;

/// Version of the user protocol announced in [`ConnectRequest`].
pub const USER_PROTOCOL_VERSION: u32 = 1;

/// Wire type tag of a client request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum RequestKind {
    Connect = 0,
    Login = 1,
    Logout = 2,
    CheckLoginAvailable = 3,
    CreateAccount = 4,
    SelectCharacter = 5,
    QuickMatch = 6,
    CancelQuickMatch = 7,
    Loading = 8,
    ChatMessage = 9,
    GameCommand = 10,
    SendActivationCode = 11,
    LoginWithActivationCode = 12,
}

impl RequestKind {
    pub fn tag(self) -> u32 {
        self as u32
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectRequest {
    pub protocol_version: u32,
}

impl Default for ConnectRequest {
    fn default() -> Self {
        Self {
            protocol_version: USER_PROTOCOL_VERSION,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginRequest {
    pub login: String,
    pub password: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogoutRequest;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckLoginAvailableRequest {
    pub login: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateAccountRequest {
    pub login: String,
    pub password: String,
    pub mail: String,
    pub newsletter: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectCharacterRequest {
    pub character_id: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuickMatchRequest;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CancelQuickMatchRequest;

/// Sent when the local match assets finished loading.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadingRequest;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessageRequest {
    pub text: String,
}

/// Opaque in-game command. The byte layout belongs to the game simulation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameCommandRequest {
    pub command_data: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendActivationCodeRequest {
    pub login: String,
    pub mail: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginWithActivationCodeRequest {
    pub login: String,
    pub password: String,
    pub code: String,
}

/// A request queued for delivery to the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    Connect(ConnectRequest),
    Login(LoginRequest),
    Logout(LogoutRequest),
    CheckLoginAvailable(CheckLoginAvailableRequest),
    CreateAccount(CreateAccountRequest),
    SelectCharacter(SelectCharacterRequest),
    QuickMatch(QuickMatchRequest),
    CancelQuickMatch(CancelQuickMatchRequest),
    Loading(LoadingRequest),
    ChatMessage(ChatMessageRequest),
    GameCommand(GameCommandRequest),
    SendActivationCode(SendActivationCodeRequest),
    LoginWithActivationCode(LoginWithActivationCodeRequest),
}

variant_from!(Request {
    Connect(ConnectRequest),
    Login(LoginRequest),
    Logout(LogoutRequest),
    CheckLoginAvailable(CheckLoginAvailableRequest),
    CreateAccount(CreateAccountRequest),
    SelectCharacter(SelectCharacterRequest),
    QuickMatch(QuickMatchRequest),
    CancelQuickMatch(CancelQuickMatchRequest),
    Loading(LoadingRequest),
    ChatMessage(ChatMessageRequest),
    GameCommand(GameCommandRequest),
    SendActivationCode(SendActivationCodeRequest),
    LoginWithActivationCode(LoginWithActivationCodeRequest),
});

impl Request {
    pub fn kind(&self) -> RequestKind {
        match self {
            Self::Connect(_) => RequestKind::Connect,
            Self::Login(_) => RequestKind::Login,
            Self::Logout(_) => RequestKind::Logout,
            Self::CheckLoginAvailable(_) => RequestKind::CheckLoginAvailable,
            Self::CreateAccount(_) => RequestKind::CreateAccount,
            Self::SelectCharacter(_) => RequestKind::SelectCharacter,
            Self::QuickMatch(_) => RequestKind::QuickMatch,
            Self::CancelQuickMatch(_) => RequestKind::CancelQuickMatch,
            Self::Loading(_) => RequestKind::Loading,
            Self::ChatMessage(_) => RequestKind::ChatMessage,
            Self::GameCommand(_) => RequestKind::GameCommand,
            Self::SendActivationCode(_) => RequestKind::SendActivationCode,
            Self::LoginWithActivationCode(_) => RequestKind::LoginWithActivationCode,
        }
    }

    /// Encode as an application payload (`[tag][body]`).
    pub fn encode(&self) -> Result<Vec<u8>, postcard::Error> {
        let tag = self.kind().tag();
        match self {
            Self::Connect(r) => encode_tagged(tag, r),
            Self::Login(r) => encode_tagged(tag, r),
            Self::Logout(r) => encode_tagged(tag, r),
            Self::CheckLoginAvailable(r) => encode_tagged(tag, r),
            Self::CreateAccount(r) => encode_tagged(tag, r),
            Self::SelectCharacter(r) => encode_tagged(tag, r),
            Self::QuickMatch(r) => encode_tagged(tag, r),
            Self::CancelQuickMatch(r) => encode_tagged(tag, r),
            Self::Loading(r) => encode_tagged(tag, r),
            Self::ChatMessage(r) => encode_tagged(tag, r),
            Self::GameCommand(r) => encode_tagged(tag, r),
            Self::SendActivationCode(r) => encode_tagged(tag, r),
            Self::LoginWithActivationCode(r) => encode_tagged(tag, r),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::split_tag;

    #[test]
    fn test_login_request_payload_layout() {
        let request = Request::from(LoginRequest {
            login: "alice".to_string(),
            password: "hunter2".to_string(),
        });
        let bytes = request.encode().unwrap();

        let (tag, body) = split_tag(&bytes).unwrap();
        assert_eq!(tag, RequestKind::Login.tag());
        let decoded: LoginRequest = postcard::from_bytes(body).unwrap();
        assert_eq!(decoded.login, "alice");
        assert_eq!(decoded.password, "hunter2");
    }

    #[test]
    fn test_unit_requests_encode_to_bare_tag() {
        let bytes = Request::from(LogoutRequest).encode().unwrap();
        assert_eq!(bytes, RequestKind::Logout.tag().to_le_bytes());
    }

    #[test]
    fn test_connect_request_announces_protocol_version() {
        let bytes = Request::from(ConnectRequest::default()).encode().unwrap();
        let (tag, body) = split_tag(&bytes).unwrap();
        assert_eq!(tag, RequestKind::Connect.tag());
        let decoded: ConnectRequest = postcard::from_bytes(body).unwrap();
        assert_eq!(decoded.protocol_version, USER_PROTOCOL_VERSION);
    }
}
