use std::future::Future;
use std::pin::Pin;

use macrocoach_core::chat::ChatReply;
use macrocoach_core::error::ChatError;
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::api::ApiClient;
use crate::chat::ChatBackend;
use crate::identity::{HostBridge, ResolverConfig};
use crate::session::Session;
use crate::util::report_session_error;
use crate::view::{ViewMode, render_message};

type TurnFuture<'a> = Pin<Box<dyn Future<Output = Result<ChatReply, ChatError>> + 'a>>;

#[derive(Debug, PartialEq, Eq)]
enum Line {
    Quit,
    Show(ViewMode),
    Toggle,
    Reload,
    Unknown(String),
    Text(String),
}

fn parse_line(line: &str) -> Line {
    let trimmed = line.trim();
    match trimmed {
        "/quit" | "/exit" => Line::Quit,
        "/profile" => Line::Show(ViewMode::Profile),
        "/chat" => Line::Show(ViewMode::Chat),
        "/toggle" => Line::Toggle,
        "/reload" => Line::Reload,
        cmd if cmd.starts_with('/') => Line::Unknown(cmd.to_string()),
        _ => Line::Text(line.to_string()),
    }
}

async fn settle(pending: &mut Option<TurnFuture<'_>>) -> Result<ChatReply, ChatError> {
    match pending.as_mut() {
        Some(turn) => turn.await,
        None => std::future::pending().await,
    }
}

/// Interactive chat. Reads stdin line by line while at most one turn is
/// outstanding; lines typed during a turn are dropped.
pub async fn run(api: &ApiClient, bridge: &HostBridge, config: ResolverConfig) -> i32 {
    let mut session = Session::new(config);
    print!("{}", session.render());

    let welcome = match session.bootstrap(bridge, api).await {
        Ok(welcome) => welcome,
        Err(err) => {
            print!("{}", session.render());
            return report_session_error(&err);
        }
    };
    print!("{}", session.render());

    let mut pending: Option<TurnFuture<'_>> =
        welcome.map(|request| Box::pin(api.send_turn(request)) as TurnFuture<'_>);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            outcome = settle(&mut pending) => {
                pending = None;
                let message = session.chat_mut().finish_turn(outcome);
                let line = render_message(message);
                if session.router().mode() == ViewMode::Chat {
                    println!("{line}");
                }
            }
            line = lines.next_line() => {
                let line = match line {
                    Ok(Some(line)) => line,
                    Ok(None) => break,
                    Err(e) => {
                        tracing::error!(error = %e, "failed to read stdin");
                        return 1;
                    }
                };

                match parse_line(&line) {
                    Line::Quit => break,
                    Line::Show(mode) => {
                        session.router_mut().set_mode(mode);
                        print!("{}", session.render());
                    }
                    Line::Toggle => {
                        session.router_mut().toggle();
                        print!("{}", session.render());
                    }
                    Line::Reload => {
                        if pending.is_some() {
                            println!("(wait for the coach to finish before reloading)");
                            continue;
                        }
                        match session.reload_profile(api).await {
                            Ok(_) => print!("{}", session.render()),
                            Err(err) => {
                                print!("{}", session.render());
                                return report_session_error(&err);
                            }
                        }
                    }
                    Line::Unknown(cmd) => {
                        println!("unknown command {cmd} (try /profile, /chat, /toggle, /reload, /quit)");
                    }
                    Line::Text(text) => {
                        let chat = session.chat_mut();
                        chat.set_input(text);
                        match chat.begin_turn(None) {
                            Some(request) => {
                                pending = Some(Box::pin(api.send_turn(request)) as TurnFuture<'_>);
                            }
                            None if chat.is_in_flight() => {
                                println!("(coach is still typing; message not sent)");
                            }
                            None => {}
                        }
                    }
                }
            }
        }
    }

    // Let an answer that is already on its way land before leaving.
    if let Some(turn) = pending.take() {
        let outcome = turn.await;
        println!("{}", render_message(session.chat_mut().finish_turn(outcome)));
    }
    0
}
