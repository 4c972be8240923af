//! Lookout - Search a Gmail mailbox from the terminal
//!
//! Each line read from stdin becomes the new search query. Commands:
//! `:show N`, `:open N`, `:signout`, `:quit`.

use chrono::Local;
use log::{error, info, warn};
use mailsearch::{
    AuthSession, ClientConfig, FileCredentialStorage, GmailCredentials, LoopbackConsent,
    MailApiClient, SearchCoordinator, SearchEvent, SearchSettings, SearchState, TokenStore,
    Transport, UreqTransport,
};
use std::io::{self, BufRead};
use std::sync::Arc;
use std::thread;

mod render;

fn main() -> anyhow::Result<()> {
    // Initialize logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    // Bootstrap config directory
    if let Err(e) = config::init() {
        error!("Failed to initialize config directory: {}", e);
    }

    let credentials = match GmailCredentials::load() {
        Ok(creds) => creds,
        Err(e) => {
            warn!("Gmail credentials not found: {}", e);
            if let Some(path) = GmailCredentials::default_credentials_path() {
                warn!(
                    "To configure Gmail access, either:\n\
                     1. Place your Google OAuth credentials at: {}\n\
                     2. Or set environment variables: GMAIL_CLIENT_ID and GMAIL_CLIENT_SECRET",
                    path.display()
                );
            }
            return Err(e);
        }
    };

    let settings = SearchSettings::load().unwrap_or_else(|e| {
        warn!("Ignoring unreadable settings: {}", e);
        SearchSettings::default()
    });

    let config = ClientConfig::gmail(credentials);
    let store = TokenStore::open(Box::new(FileCredentialStorage::open_default()?))?;
    let transport: Arc<dyn Transport> = Arc::new(UreqTransport::new());
    let auth = Arc::new(AuthSession::new(
        config.clone(),
        store,
        transport.clone(),
        Box::new(LoopbackConsent::new()),
    ));
    let client = Arc::new(MailApiClient::new(&config, auth.clone(), transport));
    let coordinator = SearchCoordinator::new(client, settings);

    let events = coordinator.subscribe();
    thread::Builder::new()
        .name("printer".into())
        .spawn(move || print_events(events))?;

    info!("Lookout started");
    coordinator.search("");

    for line in io::stdin().lock().lines() {
        let line = line?;
        let input = line.trim();

        match input.split_once(' ').unwrap_or((input, "")) {
            (":quit" | ":q", _) => break,
            (":signout", _) => {
                coordinator.cancel();
                auth.sign_out()?;
                println!("Signed out");
            }
            (":show", arg) => {
                if let Some(message) = pick(&coordinator.snapshot(), arg) {
                    println!("{}", render::format_details(&message));
                }
            }
            (":open", arg) => {
                if let Some(message) = pick(&coordinator.snapshot(), arg)
                    && let Err(e) = open::that(message.web_url())
                {
                    error!("Failed to open browser: {}", e);
                }
            }
            _ => {
                coordinator.search(input);
            }
        }
    }

    coordinator.cancel();
    Ok(())
}

/// Result at the 1-based position given on the command line
fn pick(state: &SearchState, arg: &str) -> Option<mailsearch::MessageSummary> {
    let position: usize = match arg.trim().parse() {
        Ok(n) if n >= 1 => n,
        _ => {
            println!("Expected a result number");
            return None;
        }
    };
    match state.results.get(position - 1) {
        Some(message) if message.is_loaded => Some(message.clone()),
        Some(_) => {
            println!("Result {} is still loading", position);
            None
        }
        None => {
            println!("No result {}", position);
            None
        }
    }
}

fn print_events(events: std::sync::mpsc::Receiver<SearchEvent>) {
    let mut previous = SearchState::default();

    for event in events {
        match event {
            SearchEvent::State(state) => {
                let now = Local::now();
                if state.is_loading {
                    if !previous.is_loading {
                        println!("Searching ...");
                    }
                } else if state.generation != previous.generation || previous.is_loading {
                    println!("{}", render::format_header(&state));
                    for (index, message) in state.results.iter().enumerate() {
                        println!("{}", render::format_row(index + 1, message, now));
                    }
                } else {
                    for index in render::newly_loaded(&previous, &state) {
                        println!("{}", render::format_row(index + 1, &state.results[index], now));
                    }
                }
                previous = state;
            }
            SearchEvent::Failed { message, .. } => {
                println!("Could not perform search: {}", message);
            }
        }
    }
}
