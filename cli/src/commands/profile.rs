use crate::api::ApiClient;
use crate::identity::{HostBridge, ResolverConfig};
use crate::session::Session;
use crate::util::{exit_error, report_session_error};

/// Resolve the user and print their stored profile as JSON. No chat turn
/// is sent.
pub async fn run(api: &ApiClient, bridge: &HostBridge, config: ResolverConfig) -> i32 {
    let mut session = Session::new(config);
    if let Err(err) = session.bootstrap(bridge, api).await {
        return report_session_error(&err);
    }

    let Some(profile) = session.profile() else {
        exit_error("Profile missing after a successful load", None);
    };
    tracing::debug!(user_id = ?session.user_id(), "printing profile");
    match serde_json::to_string_pretty(profile) {
        Ok(body) => {
            println!("{body}");
            0
        }
        Err(e) => exit_error(&format!("Failed to encode profile: {e}"), None),
    }
}
