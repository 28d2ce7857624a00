//! Terminal inbox watcher.
//!
//! Restores the last mailbox (or creates one), prints its address, and prints
//! each message as it arrives. Pass `--new` to replace the mailbox first.

use std::collections::HashSet;
use std::env;

use mail_session::{Session, SessionConfig};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let force_new = env::args().skip(1).any(|arg| arg == "--new");

    let config = SessionConfig::from_env()?;
    info!(relay = %config.relay_url, version = mail_session::version(), "Starting inbox watcher");
    let session = Session::from_config(&config)?;

    let credential = if force_new {
        session.new_address().await?
    } else {
        session.start().await?
    };
    println!("Address: {}", credential.address);
    println!("Waiting for mail (Ctrl-C to quit)...");

    let mut printed: HashSet<String> = HashSet::new();
    let mut ticker = tokio::time::interval(config.poll_interval);
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = &mut shutdown => break,
            _ = ticker.tick() => {}
        }

        for message in session.messages().await {
            if !printed.insert(message.id.clone()) {
                continue;
            }

            println!();
            println!("   from: {} <{}>", message.from.name, message.from.address);
            println!("subject: {}", message.subject);
            println!("   date: {}", message.created_at);

            if let Some(detail) = session.open_message(&message.id).await {
                println!();
                println!("{}", detail.text.trim_end());
            }
        }
    }

    session.stop_polling();
    Ok(())
}
