use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::error;
use uuid::Uuid;

use palaver_core::{MessageHistoryQuery, MessageSearch};
use palaver_queue::topics::PENDING_MESSAGE_TOPIC;
use palaver_types::api::{ChatMessageResponse, CreateChatMessageAck, CreateChatMessageRequest};
use palaver_types::envelopes::PendingMessage;

use crate::{AppState, error_status};

/// Accepts a message for ingestion. Returns 202 with a correlation id as
/// soon as the envelope is on the queue — durability is confirmed later
/// via the ack stream, or by re-querying message history.
pub async fn create_chat_message(
    State(state): State<AppState>,
    Path(conversation_id): Path<Uuid>,
    Json(req): Json<CreateChatMessageRequest>,
) -> Result<impl IntoResponse, StatusCode> {
    let from_user_id: Uuid = req
        .from_user_id
        .parse()
        .map_err(|_| StatusCode::BAD_REQUEST)?;

    let envelope = PendingMessage {
        correlation_id: Uuid::new_v4(),
        conversation_id,
        from_user_id,
        content: req.content,
        sent_time: req.sent_time.unwrap_or_else(Utc::now),
    };

    let payload =
        serde_json::to_vec(&envelope).map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    state
        .queue
        .publish(
            PENDING_MESSAGE_TOPIC,
            &conversation_id.to_string(),
            payload,
        )
        .await
        .map_err(|e| {
            error!("pending message publish failed: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        })?;

    Ok((
        StatusCode::ACCEPTED,
        Json(CreateChatMessageAck {
            correlation_id: envelope.correlation_id,
        }),
    ))
}

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub before: Option<DateTime<Utc>>,
    pub after: Option<DateTime<Utc>>,
    #[serde(default = "default_limit")]
    pub limit: usize,
}

fn default_limit() -> usize {
    50
}

pub async fn get_chat_messages(
    State(state): State<AppState>,
    Path(conversation_id): Path<Uuid>,
    Query(query): Query<HistoryQuery>,
) -> Result<impl IntoResponse, StatusCode> {
    let messages = state
        .search
        .get_chat_messages(MessageHistoryQuery {
            conversation_id,
            before: query.before,
            after: query.after,
            limit: query.limit.min(200),
        })
        .await
        .map_err(error_status)?;

    let body: Vec<ChatMessageResponse> =
        messages.into_iter().map(ChatMessageResponse::from).collect();
    Ok(Json(body))
}

#[derive(Debug, Deserialize)]
pub struct MessageSearchQuery {
    pub term: String,
    pub conversation_id: Option<Uuid>,
    pub before: Option<DateTime<Utc>>,
    pub after: Option<DateTime<Utc>>,
    #[serde(default = "default_limit")]
    pub limit: usize,
}

pub async fn search_chat_messages(
    State(state): State<AppState>,
    Query(query): Query<MessageSearchQuery>,
) -> Result<impl IntoResponse, StatusCode> {
    let messages = state
        .search
        .search_chat_messages(MessageSearch {
            term: query.term,
            conversation_id: query.conversation_id,
            before: query.before,
            after: query.after,
            limit: query.limit.min(200),
        })
        .await
        .map_err(error_status)?;

    let body: Vec<ChatMessageResponse> =
        messages.into_iter().map(ChatMessageResponse::from).collect();
    Ok(Json(body))
}
