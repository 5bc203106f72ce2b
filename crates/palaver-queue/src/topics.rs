/// Internal queue carrying pending-message envelopes from the front door
/// to the ingestion worker.
pub const PENDING_MESSAGE_TOPIC: &str = "chat-sys-internal-pending-queue";

/// Fact topic carrying ingestion acks back toward producers.
pub const NEW_MESSAGE_TOPIC: &str = "chat-fct-new-message";

/// Consumer group identifying the ingestion worker's logical instance.
pub const INGEST_CONSUMER_GROUP: &str = "palaver-ingest";

/// Broker-enforced payload ceiling (10 MB).
pub const MAX_PAYLOAD_BYTES: usize = 10 * 1024 * 1024;
