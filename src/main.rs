//! Estate Concierge - interactive terminal chat against the completion endpoint.
//!
//! Usage: `estate-concierge [caller-id]`. With a caller id the conversation
//! is recorded in the in-memory store; without one the session is anonymous.

use std::io::Write;
use std::sync::Arc;

use estate_concierge::adapters::{InMemoryConversationStore, OpenAIConfig, OpenAIProvider};
use estate_concierge::application::{ChatSession, TurnStatus};
use estate_concierge::config::AppConfig;
use estate_concierge::domain::conversation::{Message, MessageRole, MessageStatus, SessionContext};
use estate_concierge::domain::foundation::UserId;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = AppConfig::load()?;
    config.validate()?;

    let context = match std::env::args().nth(1) {
        Some(caller) => SessionContext::for_caller(UserId::new(caller)?),
        None => SessionContext::anonymous(),
    };

    let provider = OpenAIProvider::new(
        OpenAIConfig::from(&config.ai).with_max_line_bytes(config.session.max_line_bytes),
    )?;
    let store = Arc::new(InMemoryConversationStore::new());
    let session = ChatSession::new(Arc::new(provider), store.clone(), context, &config.session);

    tracing::info!(endpoint = %config.ai.endpoint_url, "Estate Concierge ready");
    tokio::spawn(render_updates(session.subscribe()));

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    prompt()?;
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            prompt()?;
            continue;
        }
        match session.submit(line).await {
            Ok(outcome) => {
                if let TurnStatus::Failed(kind) = outcome.status {
                    tracing::debug!(?kind, "Turn failed");
                }
            }
            Err(err) => eprintln!("{}", err),
        }
        tokio::task::yield_now().await;
        prompt()?;
    }

    if let Some(id) = session.conversation_id() {
        tracing::info!(
            conversation_id = %id,
            stored = store.messages().await.len(),
            "Session closed"
        );
    }
    Ok(())
}

fn prompt() -> std::io::Result<()> {
    print!("> ");
    std::io::stdout().flush()
}

/// Prints each assistant message as it grows, then any handoff offer.
async fn render_updates(mut updates: tokio::sync::watch::Receiver<Vec<Message>>) {
    // First message not yet fully rendered, and how many of its bytes are out.
    let mut cursor = 0;
    let mut printed = 0;

    while updates.changed().await.is_ok() {
        let messages = updates.borrow_and_update().clone();
        while let Some(message) = messages.get(cursor) {
            if message.role == MessageRole::Assistant {
                if let Some(reason) = message.handoff {
                    println!("[Would you like to talk to one of our agents? ({})]", reason.as_str());
                } else if message.status == MessageStatus::Failed {
                    if printed > 0 {
                        println!();
                    }
                    print!("{}", message.content);
                } else if let Some(fresh) = message.content.get(printed..) {
                    print!("{}", fresh);
                    printed = message.content.len();
                }
                if message.handoff.is_none() && message.status.is_frozen() {
                    println!();
                }
                if let Err(err) = std::io::stdout().flush() {
                    tracing::debug!(error = %err, "Failed to flush stdout");
                }
            }
            if !message.status.is_frozen() {
                break;
            }
            cursor += 1;
            printed = 0;
        }
    }
}
