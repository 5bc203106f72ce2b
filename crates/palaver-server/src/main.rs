use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use palaver_api::{AppState, AppStateInner, conversations, messages};
use palaver_core::{ConversationService, IngestionWorker, SearchService};
use palaver_index::MemoryIndex;
use palaver_queue::ChannelBroker;
use palaver_store::SqliteStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "palaver=debug,tower_http=debug".into()),
        )
        .init();

    // Config
    let db_path = std::env::var("PALAVER_DB_PATH").unwrap_or_else(|_| "palaver.db".into());
    let host = std::env::var("PALAVER_HOST").unwrap_or_else(|_| "0.0.0.0".into());
    let port: u16 = std::env::var("PALAVER_PORT")
        .unwrap_or_else(|_| "3000".into())
        .parse()?;

    // Shared gateway handles: long-lived, safe for concurrent use.
    let store = Arc::new(SqliteStore::open(&PathBuf::from(&db_path))?);
    let index = Arc::new(MemoryIndex::new());
    let queue = Arc::new(ChannelBroker::new());

    // The ingestion worker drains the pending queue for the life of the
    // process.
    let worker = IngestionWorker::new(store.clone(), index.clone(), queue.clone());
    tokio::spawn(async move { worker.run().await });

    let state: AppState = Arc::new(AppStateInner {
        conversations: ConversationService::new(store.clone(), index.clone()),
        search: SearchService::new(store, index),
        queue,
    });

    // Routes
    let app = Router::new()
        .route("/conversations", post(conversations::create_conversation))
        .route("/conversations/search", get(conversations::search_conversations))
        .route("/conversations/{conversation_id}", get(conversations::find_conversation))
        .route(
            "/conversations/{conversation_id}/messages",
            post(messages::create_chat_message).get(messages::get_chat_messages),
        )
        .route("/messages/search", get(messages::search_chat_messages))
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    info!("Palaver server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
