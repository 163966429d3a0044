use crate::error::SessionError;

/// Lifecycle of one client session. Decides which view may render.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SessionState {
    #[default]
    ResolvingIdentity,
    LoadingProfile,
    /// Profile loaded, chat usable. Moves to `Error` if a reload fails.
    Ready,
    /// Terminal; needs a relaunch from the host.
    Error(SessionError),
}

impl SessionState {
    pub fn name(&self) -> &'static str {
        match self {
            SessionState::ResolvingIdentity => "resolving_identity",
            SessionState::LoadingProfile => "loading_profile",
            SessionState::Ready => "ready",
            SessionState::Error(_) => "error",
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, SessionState::Ready)
    }

    pub fn error(&self) -> Option<&SessionError> {
        match self {
            SessionState::Error(err) => Some(err),
            _ => None,
        }
    }
}
