use std::borrow::Cow;
use std::path::PathBuf;
use std::time::Duration;

use macrocoach_core::error::SessionError;
use serde::Deserialize;
use tokio::time::{Instant, Interval, MissedTickBehavior, interval_at};

/// User id used in development mode instead of asking the host.
pub const DEV_STUB_USER_ID: i64 = 1_056_878_733;
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(100);
pub const DEFAULT_MAX_ATTEMPTS: u32 = 20;
/// Shortest poll interval the resolver will run with.
pub const MIN_POLL_INTERVAL: Duration = Duration::from_millis(1);

/// Capability to read the running user's id from the embedding host.
pub trait IdentityProvider {
    /// `None` while the host has not exposed an id (or never will).
    fn current_user_id(&self) -> Option<i64>;
}

/// `initDataUnsafe` as handed over by the host. Only the user id matters here.
#[derive(Debug, Deserialize)]
struct InitData {
    #[serde(default)]
    user: Option<InitDataUser>,
}

#[derive(Debug, Deserialize)]
struct InitDataUser {
    id: i64,
}

/// Host bridge backed by the host's init data JSON.
///
/// The file variant is re-read on every call, so a host that writes its
/// init data after the client started is picked up by the next poll.
#[derive(Debug, Clone)]
pub enum HostBridge {
    Unavailable,
    Inline(String),
    File(PathBuf),
}

impl HostBridge {
    /// Inline data wins over a file when both are configured.
    pub fn from_sources(inline: Option<String>, file: Option<PathBuf>) -> Self {
        match (inline, file) {
            (Some(raw), _) => HostBridge::Inline(raw),
            (None, Some(path)) => HostBridge::File(path),
            (None, None) => HostBridge::Unavailable,
        }
    }
}

impl IdentityProvider for HostBridge {
    fn current_user_id(&self) -> Option<i64> {
        let raw: Cow<'_, str> = match self {
            HostBridge::Unavailable => return None,
            HostBridge::Inline(raw) => Cow::Borrowed(raw.as_str()),
            HostBridge::File(path) => Cow::Owned(std::fs::read_to_string(path).ok()?),
        };
        parse_user_id(&raw)
    }
}

fn parse_user_id(raw: &str) -> Option<i64> {
    let init_data: InitData = serde_json::from_str(raw).ok()?;
    // The host reports a missing user as id 0 on some platforms.
    init_data.user.map(|user| user.id).filter(|id| *id > 0)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolverConfig {
    pub poll_interval: Duration,
    pub max_attempts: u32,
    /// Skip the host entirely and resolve to `stub_user_id`
    pub development: bool,
    pub stub_user_id: i64,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            development: false,
            stub_user_id: DEV_STUB_USER_ID,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolverState {
    Idle,
    /// `attempt` failed polls so far
    Polling { attempt: u32 },
    Resolved(i64),
    TimedOut,
}

/// Polls an [`IdentityProvider`] until it yields a user id or the attempt
/// budget runs out.
///
/// `Resolved` and `TimedOut` are sticky. A run whose future is dropped
/// mid-poll takes its timer with it and the next call starts over.
#[derive(Debug)]
pub struct IdentityResolver {
    config: ResolverConfig,
    state: ResolverState,
}

impl IdentityResolver {
    pub fn new(config: ResolverConfig) -> Self {
        Self {
            config,
            state: ResolverState::Idle,
        }
    }

    pub fn state(&self) -> ResolverState {
        self.state
    }

    pub async fn resolve<P>(&mut self, provider: &P) -> Result<i64, SessionError>
    where
        P: IdentityProvider + ?Sized,
    {
        match self.state {
            ResolverState::Resolved(user_id) => return Ok(user_id),
            ResolverState::TimedOut => return Err(self.timeout_error()),
            ResolverState::Polling { attempt } => {
                tracing::debug!(attempt, "previous identity resolution was cancelled, restarting");
            }
            ResolverState::Idle => {}
        }

        if self.config.development {
            let user_id = self.config.stub_user_id;
            tracing::info!(user_id, "development mode: using stub user id");
            self.state = ResolverState::Resolved(user_id);
            return Ok(user_id);
        }

        let period = self.config.poll_interval.max(MIN_POLL_INTERVAL);
        if period != self.config.poll_interval {
            tracing::warn!(
                configured_ms = self.config.poll_interval.as_millis() as u64,
                "poll interval below minimum, using 1ms"
            );
        }
        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        self.state = ResolverState::Polling { attempt: 0 };
        tracing::debug!(
            interval_ms = period.as_millis() as u64,
            max_attempts = self.config.max_attempts,
            "polling host bridge for user id"
        );

        loop {
            ticker.tick().await;

            if let Some(user_id) = provider.current_user_id() {
                self.finish(ticker, ResolverState::Resolved(user_id));
                tracing::info!(user_id, "user id resolved");
                return Ok(user_id);
            }

            let attempt = match self.state {
                ResolverState::Polling { attempt } => attempt + 1,
                _ => 1,
            };
            if attempt >= self.config.max_attempts {
                self.finish(ticker, ResolverState::TimedOut);
                tracing::warn!(attempts = attempt, "host bridge never exposed a user id");
                return Err(self.timeout_error());
            }
            self.state = ResolverState::Polling { attempt };
        }
    }

    /// Every exit transition goes through here so the timer is released
    /// before the outcome is reported.
    fn finish(&mut self, ticker: Interval, next: ResolverState) {
        drop(ticker);
        self.state = next;
    }

    fn timeout_error(&self) -> SessionError {
        SessionError::IdentityTimeout {
            attempts: self.config.max_attempts,
        }
    }
}
