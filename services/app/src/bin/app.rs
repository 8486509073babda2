//! services/app/src/bin/app.rs

use std::io::{self, BufRead, Write};
use std::sync::Arc;

use app_lib::{
    adapters::{BackendClient, NotebookApiClient},
    config::Config,
    error::AppError,
};
use learner_core::{
    auth,
    catalog::CatalogManager,
    chat::ChatSessionManager,
    domain::{ChatRole, SessionKey},
    ports::{ContentService, PersistenceService},
};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), AppError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let config = Config::from_env()?;
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer())
        .init();
    info!("Configuration loaded.");

    // --- 2. Initialize Service Adapters ---
    let http = reqwest::Client::new();
    let content: Arc<dyn ContentService> = Arc::new(NotebookApiClient::new(
        http.clone(),
        config.content_api_url.clone(),
        config.content_api_key.clone(),
    ));
    let backend = Arc::new(BackendClient::new(http, config.backend_url.clone()));
    let store: Arc<dyn PersistenceService> = backend.clone();

    // --- 3. Log In ---
    let user_name = prompt_line("Your name: ")?;
    let user_name = auth::login(backend.as_ref(), &user_name).await?;
    info!(user = %user_name, "logged in");

    // --- 4. Pick a Topic ---
    let catalog = CatalogManager::new(content.clone(), store.clone());
    let topics = catalog.topics().await?;
    if topics.is_empty() {
        println!("No topics are available yet. Ask an administrator to add one.");
        return Ok(());
    }
    for (index, topic) in topics.iter().enumerate() {
        println!("  {}. {}", index + 1, topic.title);
    }
    let topic = loop {
        let choice = prompt_line("Topic number: ")?;
        match choice.trim().parse::<usize>() {
            Ok(n) if (1..=topics.len()).contains(&n) => break &topics[n - 1],
            _ => println!("Please enter a number between 1 and {}.", topics.len()),
        }
    };
    println!("Chatting about \"{}\". /clear resets, /quit exits.", topic.title);

    // --- 5. Run the Chat Session ---
    let key = SessionKey::new(user_name, topic.notebook_id.clone());
    let mut session = ChatSessionManager::new(content, store, key);
    match session.load().await {
        Ok(history) => {
            if !history.is_empty() {
                println!("(restored {} earlier messages)", history.len());
            }
        }
        Err(e) => println!("(could not load history: {e})"),
    }

    loop {
        let line = prompt_line("> ")?;
        let line = line.trim();
        match line {
            "" => continue,
            "/quit" => break,
            "/clear" => {
                session.clear();
                println!("(chat cleared)");
                continue;
            }
            prompt => {
                let appended = session.send(prompt).await?;
                match appended.role {
                    ChatRole::Error => println!("! {}", appended.content),
                    _ => {
                        println!("{}", appended.content);
                        if appended.was_enhanced {
                            println!("(enhanced; original answer kept alongside)");
                        }
                    }
                }
            }
        }
    }

    Ok(())
}

fn prompt_line(prompt: &str) -> io::Result<String> {
    print!("{prompt}");
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line)
}
