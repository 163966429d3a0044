use macrocoach_core::error::{SessionError, codes};
use serde_json::json;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Logs go to stderr so they never interleave with the chat on stdout.
/// `MACROCOACH_LOG_FORMAT=json` switches to structured JSON lines.
pub fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| "macrocoach_cli=warn".into());
    let json = std::env::var("MACROCOACH_LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);
    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(layer.json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(layer)
            .init();
    }
}

fn error_json(error: &str, message: &str, docs_hint: Option<&str>) -> serde_json::Value {
    let mut err = json!({
        "error": error,
        "message": message
    });
    if let Some(hint) = docs_hint {
        err["docs_hint"] = json!(hint);
    }
    err
}

pub fn exit_error(message: &str, docs_hint: Option<&str>) -> ! {
    eprintln!("{:#}", error_json(codes::CLI_ERROR, message, docs_hint));
    std::process::exit(1);
}

/// Print a terminal session error and return the exit code to use.
pub fn report_session_error(err: &SessionError) -> i32 {
    eprintln!(
        "{:#}",
        error_json(err.code(), &err.to_string(), Some(err.docs_hint()))
    );
    1
}

#[cfg(test)]
mod tests {
    use macrocoach_core::error::SessionError;

    use super::error_json;

    #[test]
    fn session_error_json_carries_code_and_hint() {
        let err = SessionError::IdentityTimeout { attempts: 20 };
        let value = error_json(err.code(), &err.to_string(), Some(err.docs_hint()));

        assert_eq!(value["error"], "identity_timeout");
        assert!(value["message"].as_str().unwrap_or_default().contains("20"));
        assert!(value["docs_hint"].is_string());
    }

    #[test]
    fn docs_hint_is_optional() {
        let value = error_json("cli_error", "boom", None);
        assert!(value.get("docs_hint").is_none());
    }
}
