use std::future::Future;

use macrocoach_core::chat::{ChatReply, ChatTurnRequest, HistoryEntry, Message, MessageLog, Sender};
use macrocoach_core::error::ChatError;
use macrocoach_core::profile::{UserProfile, context_for};

/// Banner shown before the coach's first questions.
pub const WELCOME_BANNER: &str = "Starting the chat. Your coach asks the first questions:";

/// System-triggered first turn sent once a profile is available.
pub const ONBOARDING_TRIGGER: &str = "Ask the user three opening questions: about their food \
     preferences, allergies and disliked foods, using the context of their goal.";

/// Reply shown when the chat endpoint could not be reached.
pub const NETWORK_ERROR_REPLY: &str = "❌ Network or server error. Please try again.";

pub fn server_error_reply(error: &str) -> String {
    format!("❌ Assistant error: {error}")
}

/// The assistant endpoint.
pub trait ChatBackend {
    fn send_turn(
        &self,
        request: ChatTurnRequest,
    ) -> impl Future<Output = Result<ChatReply, ChatError>>;
}

/// Owns the chat log and mediates every turn with the assistant.
///
/// A turn is `begin_turn` (validate, optimistic append, build the request)
/// followed by `finish_turn` (append the reply). Only one turn may be open
/// at a time; sends while one is open are dropped, not queued.
#[derive(Debug, Default)]
pub struct ChatSession {
    log: MessageLog,
    input: String,
    in_flight: bool,
    profile: Option<UserProfile>,
    has_sent_welcome: bool,
}

impl ChatSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> &[Message] {
        self.log.messages()
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn set_input(&mut self, text: impl Into<String>) {
        self.input = text.into();
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight
    }

    pub fn profile(&self) -> Option<&UserProfile> {
        self.profile.as_ref()
    }

    pub fn has_sent_welcome(&self) -> bool {
        self.has_sent_welcome
    }

    /// Install a freshly loaded profile, replacing any previous one.
    ///
    /// The first time a profile arrives on an empty log this appends the
    /// welcome banner and returns the onboarding turn to send. It never
    /// fires again for this session.
    pub fn attach_profile(&mut self, profile: UserProfile) -> Option<ChatTurnRequest> {
        self.profile = Some(profile);
        if self.has_sent_welcome || !self.log.is_empty() || self.in_flight {
            return None;
        }

        self.has_sent_welcome = true;
        let history = self.log.history();
        self.log.push(WELCOME_BANNER, Sender::Assistant);
        tracing::info!("sending onboarding turn");
        Some(self.open_turn(ONBOARDING_TRIGGER.to_string(), history))
    }

    /// Open a turn. With `trigger` the trigger text is sent as a system turn;
    /// otherwise the trimmed input buffer is sent as a user turn.
    ///
    /// Returns `None` and changes nothing when there is nothing to send, no
    /// profile, or a turn already open.
    pub fn begin_turn(&mut self, trigger: Option<&str>) -> Option<ChatTurnRequest> {
        // A trigger is sent verbatim; blank ones fall back to the input.
        let trigger = trigger.filter(|text| !text.trim().is_empty());
        let text = match trigger {
            Some(text) => text.to_string(),
            None => self.input.trim().to_string(),
        };

        if text.is_empty() {
            return None;
        }
        if self.profile.is_none() {
            tracing::debug!("send ignored: no profile loaded");
            return None;
        }
        if self.in_flight {
            tracing::info!("send dropped: a chat turn is already in flight");
            return None;
        }

        // History is the log as it was before this turn touched it.
        let history = self.log.history();
        if trigger.is_none() {
            self.log.push(text.clone(), Sender::User);
        }
        self.input.clear();
        Some(self.open_turn(text, history))
    }

    fn open_turn(&mut self, message: String, chat_history: Vec<HistoryEntry>) -> ChatTurnRequest {
        self.in_flight = true;
        tracing::debug!(history = chat_history.len(), "chat turn started");
        ChatTurnRequest {
            message,
            context: context_for(self.profile.as_ref()),
            chat_history,
        }
    }

    /// Settle the open turn and append the assistant's answer (or an error
    /// in its place).
    pub fn finish_turn(&mut self, outcome: Result<ChatReply, ChatError>) -> &Message {
        self.in_flight = false;
        let text = match outcome {
            Ok(reply) => reply.text,
            Err(ChatError::Server(error)) => {
                tracing::warn!(%error, "assistant returned an error");
                server_error_reply(&error)
            }
            Err(ChatError::Transport(cause)) => {
                tracing::warn!(%cause, "chat request failed");
                NETWORK_ERROR_REPLY.to_string()
            }
        };
        self.log.push(text, Sender::Assistant)
    }

    /// Run a whole turn against `backend`. Returns whether a request was sent.
    pub async fn send<B: ChatBackend>(&mut self, backend: &B, trigger: Option<&str>) -> bool {
        let Some(request) = self.begin_turn(trigger) else {
            return false;
        };
        self.complete(backend, request).await;
        true
    }

    /// Send an already opened turn (e.g. the onboarding turn) and settle it.
    pub async fn complete<B: ChatBackend>(&mut self, backend: &B, request: ChatTurnRequest) {
        let guard = OpenTurn(self);
        let outcome = backend.send_turn(request).await;
        guard.0.finish_turn(outcome);
    }
}

/// Clears the in-flight flag if the turn is abandoned before it settles.
struct OpenTurn<'a>(&'a mut ChatSession);

impl Drop for OpenTurn<'_> {
    fn drop(&mut self) {
        self.0.in_flight = false;
    }
}
