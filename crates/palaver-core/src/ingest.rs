use std::sync::Arc;

use chrono::Utc;
use tracing::{error, warn};
use uuid::Uuid;

use palaver_index::SearchIndex;
use palaver_queue::topics::{INGEST_CONSUMER_GROUP, NEW_MESSAGE_TOPIC, PENDING_MESSAGE_TOPIC};
use palaver_queue::{MessageQueue, QueueResult};
use palaver_store::RecordStore;
use palaver_types::documents::{CHAT_MESSAGE_INDEX, ChatMessageDocument};
use palaver_types::envelopes::{IngestionAck, PendingMessage};
use palaver_types::models::ChatMessage;

use crate::upsert_advisory;

/// The single consumer loop that turns pending envelopes into durable
/// chat messages: receive, validate, persist, mirror, acknowledge.
///
/// Per-envelope failures never stop the loop. A malformed payload or a
/// record-store failure drops that one message (logged, no ack); an index
/// or ack-publish failure is logged and ignored, since the record store
/// already holds the durable copy.
///
/// The queue may redeliver. No dedup by correlation id happens here, so a
/// redelivered envelope produces a second ChatMessage with a fresh id; a
/// producer that needs certainty must query the record store instead of
/// assuming failure on a missing ack.
#[derive(Clone)]
pub struct IngestionWorker {
    store: Arc<dyn RecordStore>,
    index: Arc<dyn SearchIndex>,
    queue: Arc<dyn MessageQueue>,
}

impl IngestionWorker {
    pub fn new(
        store: Arc<dyn RecordStore>,
        index: Arc<dyn SearchIndex>,
        queue: Arc<dyn MessageQueue>,
    ) -> Self {
        Self {
            store,
            index,
            queue,
        }
    }

    /// Drains the pending queue until the broker goes away.
    pub async fn run(&self) {
        loop {
            if let Err(e) = self.run_once().await {
                error!("pending queue receive failed, stopping worker: {}", e);
                break;
            }
        }
    }

    /// Receives and processes exactly one envelope.
    pub async fn run_once(&self) -> QueueResult<()> {
        let delivery = self
            .queue
            .receive(PENDING_MESSAGE_TOPIC, INGEST_CONSUMER_GROUP)
            .await?;
        self.ingest(&delivery.payload).await;
        Ok(())
    }

    async fn ingest(&self, payload: &[u8]) {
        let pending: PendingMessage = match serde_json::from_slice(payload) {
            Ok(pending) => pending,
            Err(e) => {
                warn!("dropping malformed pending envelope: {}", e);
                return;
            }
        };

        let message = ChatMessage {
            id: Uuid::new_v4(),
            conversation_id: pending.conversation_id,
            from_user_id: pending.from_user_id,
            content: pending.content,
            sent_time: pending.sent_time,
            created_at: Utc::now(),
        };

        if let Err(e) = self.store.insert_message(&message).await {
            error!(
                correlation_id = %pending.correlation_id,
                "failed to persist chat message, dropping without ack: {}", e
            );
            return;
        }

        upsert_advisory(
            self.index.as_ref(),
            CHAT_MESSAGE_INDEX,
            &message.id.to_string(),
            &ChatMessageDocument::from(&message),
        )
        .await;

        self.publish_ack(pending.correlation_id, &message).await;
    }

    async fn publish_ack(&self, correlation_id: Uuid, message: &ChatMessage) {
        let ack = IngestionAck::persisted(correlation_id, message);
        let payload = match serde_json::to_vec(&ack) {
            Ok(payload) => payload,
            Err(e) => {
                warn!(%correlation_id, "could not serialize ack: {}", e);
                return;
            }
        };

        let key = message.conversation_id.to_string();
        if let Err(e) = self.queue.publish(NEW_MESSAGE_TOPIC, &key, payload).await {
            warn!(%correlation_id, "ack publish failed (ignored): {}", e);
        }
    }
}
