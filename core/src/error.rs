use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failures that end a session. The user has to relaunch the app from the
/// host (or re-create their profile) before anything else can happen.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    /// The host bridge never exposed a user id within the attempt budget
    #[error("no user id from the host bridge after {attempts} attempts")]
    IdentityTimeout { attempts: u32 },
    /// Profile lookup failed. 404 and 5xx are intentionally not distinguished.
    #[error("profile for user {user_id} not found")]
    ProfileNotFound { user_id: i64 },
    /// Profile lookup succeeded but the body is not a usable profile
    #[error("profile for user {user_id} is malformed: {reason}")]
    ProfileMalformed { user_id: i64, reason: String },
}

impl SessionError {
    /// Machine-readable code, see [`codes`].
    pub fn code(&self) -> &'static str {
        match self {
            SessionError::IdentityTimeout { .. } => codes::IDENTITY_TIMEOUT,
            SessionError::ProfileNotFound { .. } => codes::PROFILE_NOT_FOUND,
            SessionError::ProfileMalformed { .. } => codes::PROFILE_MALFORMED,
        }
    }

    /// What the user should do to recover.
    pub fn docs_hint(&self) -> &'static str {
        match self {
            SessionError::IdentityTimeout { .. } => {
                "Could not read your user id from the host. Restart the app from the bot's menu button."
            }
            SessionError::ProfileNotFound { .. } | SessionError::ProfileMalformed { .. } => {
                "Profile not found. Create it in the bot with /start, then reopen the app."
            }
        }
    }
}

/// Failures of a single chat turn. Never terminal: the turn is answered with
/// an in-chat error message and the next send starts clean.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChatError {
    /// No usable response (connect failure, timeout, unreadable body)
    #[error("chat transport failure: {0}")]
    Transport(String),
    /// The chat endpoint answered non-success with a structured error
    #[error("assistant error: {0}")]
    Server(String),
}

/// Body of a non-success reply from the chat endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatErrorBody {
    pub error: String,
}

/// Error codes reported by the client
pub mod codes {
    pub const IDENTITY_TIMEOUT: &str = "identity_timeout";
    pub const PROFILE_NOT_FOUND: &str = "profile_not_found";
    pub const PROFILE_MALFORMED: &str = "profile_malformed";
    pub const CLI_ERROR: &str = "cli_error";
}

#[cfg(test)]
mod tests {
    use super::{ChatErrorBody, SessionError, codes};

    #[test]
    fn session_errors_map_to_stable_codes() {
        assert_eq!(
            SessionError::IdentityTimeout { attempts: 20 }.code(),
            codes::IDENTITY_TIMEOUT
        );
        assert_eq!(
            SessionError::ProfileNotFound { user_id: 7 }.code(),
            codes::PROFILE_NOT_FOUND
        );
        assert_eq!(
            SessionError::ProfileMalformed {
                user_id: 7,
                reason: "missing field `goal`".to_string()
            }
            .code(),
            codes::PROFILE_MALFORMED
        );
    }

    #[test]
    fn profile_errors_share_the_same_remediation() {
        let not_found = SessionError::ProfileNotFound { user_id: 1 };
        let malformed = SessionError::ProfileMalformed {
            user_id: 1,
            reason: "bad".to_string(),
        };
        assert_eq!(not_found.docs_hint(), malformed.docs_hint());
        assert!(not_found.docs_hint().contains("/start"));
    }

    #[test]
    fn chat_error_body_parses_server_payload() {
        let body: ChatErrorBody =
            serde_json::from_str(r#"{"error":"rate limited"}"#).expect("error body");
        assert_eq!(body.error, "rate limited");
    }
}
