//! # pawlink
//!
//! Headless chat sync monitor for the Pawlink platform.
//!
//! Wires the real REST client and WebSocket connector into the session
//! engine, refreshes the conversation list, and logs every session event
//! until Ctrl+C. Useful for smoke-testing a backend instance and as a
//! reference for embedding the engine in a UI shell.

use std::sync::Arc;

use tracing::info;
use tracing_subscriber::EnvFilter;

use pawlink_client::{spawn_session, ClientConfig, SessionCommand, SessionEvent};
use pawlink_net::{RestClient, WsConnector};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,pawlink_client=debug")),
        )
        .init();

    info!("Starting Pawlink chat sync v{}", env!("CARGO_PKG_VERSION"));

    let config = ClientConfig::from_env();
    info!(
        api = %config.api_url,
        ws = %config.ws_url,
        authenticated = config.access_token.is_some(),
        "Loaded configuration"
    );

    let token = config.access_token.clone().unwrap_or_default();
    let api = Arc::new(RestClient::new(&config.api_url, token)?);
    let connector = Arc::new(WsConnector::new(&config.ws_url));

    let (commands, mut events) = spawn_session(config, api, connector);
    commands.send(SessionCommand::Refresh).await?;

    loop {
        tokio::select! {
            event = events.recv() => match event {
                Some(event) => report(&event),
                None => break,
            },
            _ = tokio::signal::ctrl_c() => {
                info!("Received Ctrl+C, shutting down");
                let _ = commands.send(SessionCommand::Shutdown).await;
                break;
            }
        }
    }

    Ok(())
}

fn report(event: &SessionEvent) {
    match event {
        SessionEvent::ConversationsUpdated(list) => {
            info!(count = list.len(), "Conversation list updated");
        }
        SessionEvent::MessagesLoaded {
            conversation,
            messages,
        } => info!(%conversation, count = messages.len(), "History loaded"),
        SessionEvent::OlderMessagesLoaded {
            conversation,
            messages,
        } => info!(%conversation, count = messages.len(), "Older history loaded"),
        SessionEvent::MessageAppended(msg) => {
            info!(conversation = %msg.conversation_id, sender = %msg.sender_id, "Message appended");
        }
        SessionEvent::UnreadCleared(conversation) => info!(%conversation, "Unread cleared"),
        SessionEvent::LinkChanged(link) => info!(?link, "Push link state changed"),
        SessionEvent::ConversationStarted(conv) => {
            info!(conversation = %conv.id, "Conversation started");
        }
        SessionEvent::SendFinished(outcome) => info!(?outcome, "Send finished"),
        SessionEvent::Notice { level, text } => info!(?level, %text, "Notice"),
    }
}
