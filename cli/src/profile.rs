use std::cell::Cell;
use std::future::Future;

use macrocoach_core::error::SessionError;
use macrocoach_core::profile::UserProfile;

/// Backend lookup of a stored profile.
pub trait ProfileApi {
    /// Non-success responses map to `ProfileNotFound`, unusable bodies to
    /// `ProfileMalformed`.
    fn fetch_profile(
        &self,
        user_id: i64,
    ) -> impl Future<Output = Result<UserProfile, SessionError>>;
}

/// Loads the profile for a resolved user id and tracks whether a load is
/// running. The flag stays readable while a load is pending.
#[derive(Debug, Default)]
pub struct ProfileLoader {
    loading: Cell<bool>,
}

/// Lowers the loading flag when dropped, so a cancelled load does not leave
/// it raised.
struct LoadingFlag<'a>(&'a Cell<bool>);

impl<'a> LoadingFlag<'a> {
    fn raise(flag: &'a Cell<bool>) -> Self {
        flag.set(true);
        Self(flag)
    }
}

impl Drop for LoadingFlag<'_> {
    fn drop(&mut self) {
        self.0.set(false);
    }
}

impl ProfileLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_loading(&self) -> bool {
        self.loading.get()
    }

    pub async fn load<A: ProfileApi>(
        &self,
        api: &A,
        user_id: i64,
    ) -> Result<UserProfile, SessionError> {
        let _loading = LoadingFlag::raise(&self.loading);
        tracing::info!(user_id, "loading profile");

        match api.fetch_profile(user_id).await {
            Ok(profile) => {
                tracing::info!(user_id, goal = %profile.goal, "profile loaded");
                Ok(profile)
            }
            Err(err) => {
                tracing::warn!(user_id, code = err.code(), error = %err, "profile load failed");
                Err(err)
            }
        }
    }
}
