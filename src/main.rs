//! Starling binary entry point

use futures::StreamExt;
use starling::api::MastodonClient;
use starling::config::LoggingConfig;
use starling::service::Completion;
use starling::{AppState, config, metrics, render};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Application entry point
///
/// # Setup
/// 1. Load configuration from file and environment
/// 2. Initialize tracing/logging
/// 3. Initialize AppState
/// 4. Load the emoji catalog and seed the views
/// 5. Follow the user stream until interrupted
#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Load configuration
    let config = config::AppConfig::load()?;

    // 2. Initialize tracing/logging
    init_tracing(&config.logging);
    tracing::info!(accounts = config.accounts.len(), "Starting Starling...");

    metrics::init_metrics();

    // 3. Initialize application state
    let state = AppState::new(config).await?;
    let Some(client) = state.compose.client() else {
        tracing::warn!("No active account; nothing to do");
        return Ok(());
    };
    if let Some(handle) = state.compose.selected_handle() {
        tracing::info!(account = %handle, "Active account");
    }

    // 4. Emoji catalog and views load side by side
    let (emojis, _) = tokio::join!(
        state.compose.load_emojis(),
        state
            .views
            .load(client.as_ref(), state.config.timeline.page_size)
    );
    match emojis {
        Ok(Completion::Applied(count)) => tracing::info!(count, "Emoji catalog ready"),
        Ok(Completion::Stale) => {}
        Err(error) => tracing::warn!(%error, "Emoji catalog unavailable"),
    }

    let rows = render::notification_rows(
        &state.views.notifications.notifications(),
        state.messages.as_ref(),
    );
    tracing::info!(
        home = state.views.home.statuses().len(),
        notifications = rows.len(),
        "Views ready"
    );

    // 5. Follow the user stream
    if state.config.streaming.enabled {
        tokio::select! {
            result = follow_stream(&state) => {
                if let Err(error) = result {
                    error.record("stream");
                    tracing::error!(%error, "User stream ended");
                }
            }
            _ = tokio::signal::ctrl_c() => tracing::info!("Interrupted"),
        }
    }

    tracing::debug!(metrics = %metrics::gather(), "Final metrics");
    Ok(())
}

fn init_tracing(logging: &LoggingConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("starling={}", logging.level).into());

    if logging.format == "json" {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().pretty())
            .init();
    }
}

/// Apply user stream events to the open views until the stream closes
async fn follow_stream(state: &AppState) -> Result<(), starling::error::AppError> {
    let Some((account, server)) = state.compose.selected() else {
        return Ok(());
    };
    let token = account.access_token.as_deref().unwrap_or_default();
    // The shared client carries a request timeout, which would cut the stream.
    let http = reqwest::Client::builder()
        .user_agent(state.config.http.user_agent.as_str())
        .build()?;
    let client = MastodonClient::new(http, &server.base_url, token)?;

    let mut events = client.stream_user().await?;
    while let Some(event) = events.next().await {
        match event {
            Ok(event) => state.views.apply_stream_event(event),
            Err(error) => {
                error.record("stream.decode");
                tracing::warn!(%error, "Skipping undecodable stream event");
            }
        }
    }
    Ok(())
}
