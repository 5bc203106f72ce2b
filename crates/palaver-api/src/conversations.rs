use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use uuid::Uuid;

use palaver_core::{ConversationSearch, CreateConversation};
use palaver_types::api::{ConversationResponse, CreateConversationRequest};
use palaver_types::models::ConversationKind;

use crate::{AppState, error_status};

pub async fn create_conversation(
    State(state): State<AppState>,
    Json(req): Json<CreateConversationRequest>,
) -> Result<impl IntoResponse, StatusCode> {
    let conversation = state
        .conversations
        .create(CreateConversation {
            kind: req.kind,
            name: req.name,
            owner_id: req.owner_id,
            member_ids: req.member_ids,
        })
        .await
        .map_err(error_status)?;

    Ok((
        StatusCode::CREATED,
        Json(ConversationResponse::from(conversation)),
    ))
}

pub async fn find_conversation(
    State(state): State<AppState>,
    Path(conversation_id): Path<Uuid>,
) -> Result<impl IntoResponse, StatusCode> {
    let conversation = state
        .conversations
        .find(conversation_id)
        .await
        .map_err(error_status)?;

    Ok(Json(ConversationResponse::from(conversation)))
}

#[derive(Debug, Deserialize)]
pub struct SearchConversationsQuery {
    pub kind: Option<ConversationKind>,
    pub term: Option<String>,
    #[serde(default)]
    pub page_number: usize,
    #[serde(default = "default_page_size")]
    pub page_size: usize,
}

fn default_page_size() -> usize {
    20
}

pub async fn search_conversations(
    State(state): State<AppState>,
    Query(query): Query<SearchConversationsQuery>,
) -> Result<impl IntoResponse, StatusCode> {
    let conversations = state
        .search
        .search_conversations(ConversationSearch {
            kind: query.kind,
            term: query.term,
            page_number: query.page_number,
            page_size: query.page_size.min(100),
        })
        .await
        .map_err(error_status)?;

    let body: Vec<ConversationResponse> = conversations
        .into_iter()
        .map(ConversationResponse::from)
        .collect();
    Ok(Json(body))
}
