use macrocoach_core::chat::ChatTurnRequest;
use macrocoach_core::error::SessionError;
use macrocoach_core::profile::UserProfile;
use macrocoach_core::session::SessionState;

use crate::chat::ChatSession;
use crate::identity::{IdentityProvider, IdentityResolver, ResolverConfig};
use crate::profile::{ProfileApi, ProfileLoader};
use crate::view::ViewRouter;

/// One client session: identity, profile, chat log and the active view.
#[derive(Debug)]
pub struct Session {
    state: SessionState,
    resolver: IdentityResolver,
    loader: ProfileLoader,
    chat: ChatSession,
    router: ViewRouter,
    user_id: Option<i64>,
}

impl Session {
    pub fn new(config: ResolverConfig) -> Self {
        Self {
            state: SessionState::default(),
            resolver: IdentityResolver::new(config),
            loader: ProfileLoader::new(),
            chat: ChatSession::new(),
            router: ViewRouter::new(),
            user_id: None,
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn user_id(&self) -> Option<i64> {
        self.user_id
    }

    pub fn profile(&self) -> Option<&UserProfile> {
        self.chat.profile()
    }

    pub fn chat(&self) -> &ChatSession {
        &self.chat
    }

    pub fn chat_mut(&mut self) -> &mut ChatSession {
        &mut self.chat
    }

    pub fn router(&self) -> &ViewRouter {
        &self.router
    }

    pub fn router_mut(&mut self) -> &mut ViewRouter {
        &mut self.router
    }

    /// Resolve the user, load their profile and hand it to the chat.
    ///
    /// Returns the onboarding turn when this is the first profile of the
    /// session. An identity failure ends the session before any profile
    /// request is made.
    pub async fn bootstrap<P, A>(
        &mut self,
        provider: &P,
        api: &A,
    ) -> Result<Option<ChatTurnRequest>, SessionError>
    where
        P: IdentityProvider + ?Sized,
        A: ProfileApi,
    {
        if let SessionState::Error(err) = &self.state {
            return Err(err.clone());
        }

        self.transition(SessionState::ResolvingIdentity);
        let user_id = match self.resolver.resolve(provider).await {
            Ok(user_id) => user_id,
            Err(err) => return Err(self.fail(err)),
        };
        self.user_id = Some(user_id);

        self.load(api, user_id).await
    }

    /// Fetch the profile again and replace it wholesale. A failure ends
    /// the session.
    pub async fn reload_profile<A: ProfileApi>(
        &mut self,
        api: &A,
    ) -> Result<Option<ChatTurnRequest>, SessionError> {
        if let SessionState::Error(err) = &self.state {
            return Err(err.clone());
        }
        let Some(user_id) = self.user_id else {
            tracing::debug!("profile reload skipped: user id not resolved yet");
            return Ok(None);
        };
        self.load(api, user_id).await
    }

    async fn load<A: ProfileApi>(
        &mut self,
        api: &A,
        user_id: i64,
    ) -> Result<Option<ChatTurnRequest>, SessionError> {
        self.transition(SessionState::LoadingProfile);
        match self.loader.load(api, user_id).await {
            Ok(profile) => {
                self.transition(SessionState::Ready);
                Ok(self.chat.attach_profile(profile))
            }
            Err(err) => Err(self.fail(err)),
        }
    }

    fn fail(&mut self, err: SessionError) -> SessionError {
        tracing::error!(code = err.code(), error = %err, "session failed");
        self.transition(SessionState::Error(err.clone()));
        err
    }

    fn transition(&mut self, next: SessionState) {
        tracing::debug!(from = self.state.name(), to = next.name(), "session state");
        self.state = next;
    }

    /// Text for the screen the session is currently allowed to show.
    pub fn render(&self) -> String {
        match (&self.state, self.chat.profile()) {
            (SessionState::Ready, Some(profile)) => self.router.render(profile, &self.chat),
            (SessionState::Error(err), _) => {
                format!("Loading failed!\n{err}\n{}\n", err.docs_hint())
            }
            _ if self.loader.is_loading() => "Loading your profile...\n".to_string(),
            _ => "Loading data...\n".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use macrocoach_core::chat::ChatReply;
    use macrocoach_core::error::{ChatError, SessionError};
    use macrocoach_core::profile::Goal;
    use macrocoach_core::session::SessionState;

    use super::Session;
    use crate::chat::tests::ScriptedAssistant;
    use crate::chat::{ONBOARDING_TRIGGER, WELCOME_BANNER};
    use crate::identity::{DEV_STUB_USER_ID, IdentityProvider, ResolverConfig};
    use crate::profile::tests::{StubProfileApi, sample_profile};

    struct FixedBridge(Option<i64>, Cell<u32>);

    impl IdentityProvider for FixedBridge {
        fn current_user_id(&self) -> Option<i64> {
            self.1.set(self.1.get() + 1);
            self.0
        }
    }

    #[tokio::test(start_paused = true)]
    async fn bootstrap_loads_profile_and_opens_onboarding_turn() {
        let bridge = FixedBridge(Some(77), Cell::new(0));
        let api = StubProfileApi::serving(Ok(sample_profile(77, Goal::Loss)));
        let mut session = Session::new(ResolverConfig::default());

        let welcome = session
            .bootstrap(&bridge, &api)
            .await
            .expect("bootstrap succeeds")
            .expect("first profile opens the onboarding turn");

        assert_eq!(session.state(), &SessionState::Ready);
        assert_eq!(session.user_id(), Some(77));
        assert_eq!(*api.requested.borrow(), vec![77]);
        assert_eq!(welcome.message, ONBOARDING_TRIGGER);
        assert!(welcome.context.contains("loss") && welcome.context.contains("1800"));
        assert_eq!(session.chat().messages()[0].text, WELCOME_BANNER);

        let assistant = ScriptedAssistant::replying(vec![Ok(ChatReply {
            text: "1) What do you like to eat?".to_string(),
        })]);
        session.chat_mut().complete(&assistant, welcome).await;
        assert_eq!(session.chat().messages().len(), 2);
        assert!(session.render().contains("coach> 1) What do you like to eat?"));
    }

    #[tokio::test(start_paused = true)]
    async fn identity_timeout_ends_session_without_profile_fetch() {
        let bridge = FixedBridge(None, Cell::new(0));
        let api = StubProfileApi::serving(Ok(sample_profile(1, Goal::Gain)));
        let mut session = Session::new(ResolverConfig::default());

        let err = session
            .bootstrap(&bridge, &api)
            .await
            .expect_err("no id means timeout");

        assert_eq!(err, SessionError::IdentityTimeout { attempts: 20 });
        assert_eq!(bridge.1.get(), 20);
        assert!(api.requested.borrow().is_empty());
        assert_eq!(session.state(), &SessionState::Error(err));
        assert!(session.render().contains("Restart the app"));
    }

    #[tokio::test]
    async fn development_mode_loads_the_stub_profile() {
        let bridge = FixedBridge(Some(5), Cell::new(0));
        let api = StubProfileApi::serving(Ok(sample_profile(DEV_STUB_USER_ID, Goal::Loss)));
        let mut session = Session::new(ResolverConfig {
            development: true,
            ..ResolverConfig::default()
        });

        session.bootstrap(&bridge, &api).await.expect("bootstrap");

        assert_eq!(bridge.1.get(), 0);
        assert_eq!(*api.requested.borrow(), vec![DEV_STUB_USER_ID]);
    }

    #[tokio::test(start_paused = true)]
    async fn missing_profile_ends_session() {
        let bridge = FixedBridge(Some(3), Cell::new(0));
        let api = StubProfileApi::serving(Err(SessionError::ProfileNotFound { user_id: 3 }));
        let mut session = Session::new(ResolverConfig::default());

        let err = session.bootstrap(&bridge, &api).await.expect_err("not found");

        assert_eq!(err, SessionError::ProfileNotFound { user_id: 3 });
        assert!(session.profile().is_none());
        assert!(session.render().contains("/start"));

        let again = session.bootstrap(&bridge, &api).await.expect_err("error is terminal");
        assert_eq!(again, err);
        assert_eq!(api.requested.borrow().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn reload_replaces_profile_without_refiring_welcome() {
        let bridge = FixedBridge(Some(3), Cell::new(0));
        let api = StubProfileApi::serving(Ok(sample_profile(3, Goal::Gain)));
        api.results
            .borrow_mut()
            .push(Ok(sample_profile(3, Goal::Maintain)));
        let mut session = Session::new(ResolverConfig::default());
        let welcome = session.bootstrap(&bridge, &api).await.expect("bootstrap");
        let assistant = ScriptedAssistant::replying(vec![Err(ChatError::Transport(
            "down".to_string(),
        ))]);
        session
            .chat_mut()
            .complete(&assistant, welcome.expect("welcome"))
            .await;

        let refired = session.reload_profile(&api).await.expect("reload");

        assert!(refired.is_none());
        assert_eq!(session.profile().map(|p| p.goal), Some(Goal::Maintain));
        assert_eq!(session.state(), &SessionState::Ready);
    }

    #[tokio::test(start_paused = true)]
    async fn failed_reload_moves_ready_session_to_error() {
        let bridge = FixedBridge(Some(3), Cell::new(0));
        let api = StubProfileApi::serving(Ok(sample_profile(3, Goal::Gain)));
        let mut session = Session::new(ResolverConfig::default());
        session.bootstrap(&bridge, &api).await.expect("bootstrap");
        assert!(session.state().is_ready());

        let err = session.reload_profile(&api).await.expect_err("reload fails");

        assert_eq!(err, SessionError::ProfileNotFound { user_id: 3 });
        assert_eq!(session.state().error(), Some(&err));
    }
}
