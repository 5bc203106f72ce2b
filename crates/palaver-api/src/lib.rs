pub mod conversations;
pub mod messages;

use std::sync::Arc;

use axum::http::StatusCode;
use tracing::error;

use palaver_core::{ConversationService, SearchService};
use palaver_queue::MessageQueue;
use palaver_types::ChatError;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub conversations: ConversationService,
    pub search: SearchService,
    pub queue: Arc<dyn MessageQueue>,
}

/// Domain errors to status codes: caller mistakes are 400, absent records
/// 404, everything infrastructural 500.
pub(crate) fn error_status(err: ChatError) -> StatusCode {
    match err {
        ChatError::InvalidArgument(_) => StatusCode::BAD_REQUEST,
        ChatError::NotFound(_) => StatusCode::NOT_FOUND,
        ChatError::Internal(msg) => {
            error!("internal error: {}", msg);
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_argument_maps_to_bad_request() {
        assert_eq!(
            error_status(ChatError::invalid("bad ownerId")),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn not_found_maps_to_404() {
        assert_eq!(
            error_status(ChatError::not_found("conversation x")),
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn internal_maps_to_500() {
        assert_eq!(
            error_status(ChatError::internal("store down")),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
