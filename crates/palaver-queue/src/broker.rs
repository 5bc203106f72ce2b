use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{Mutex, RwLock, mpsc};
use tracing::debug;

use crate::topics::MAX_PAYLOAD_BYTES;
use crate::{Delivery, MessageQueue, QueueError, QueueResult};

/// In-process broker backed by one unbounded channel per topic. Publish
/// order is delivery order, which makes per-key FIFO trivial. Each topic
/// serves a single logical consumer group: receivers take turns on one
/// shared handle, so every delivery reaches exactly one of them. The
/// group name is carried for parity with the external broker contract
/// and to tag logs.
///
/// Stands in for the external broker in tests and single-process
/// deployments. The at-least-once contract is the interface; this
/// implementation happens never to redeliver, which consumers must not
/// rely on.
#[derive(Clone, Default)]
pub struct ChannelBroker {
    inner: Arc<BrokerInner>,
}

#[derive(Default)]
struct BrokerInner {
    topics: RwLock<HashMap<String, TopicChannel>>,
}

struct TopicChannel {
    tx: mpsc::UnboundedSender<Delivery>,
    rx: Arc<Mutex<mpsc::UnboundedReceiver<Delivery>>>,
}

impl ChannelBroker {
    pub fn new() -> Self {
        Self::default()
    }

    async fn topic_channel(&self, topic: &str) -> (mpsc::UnboundedSender<Delivery>, Arc<Mutex<mpsc::UnboundedReceiver<Delivery>>>) {
        if let Some(channel) = self.inner.topics.read().await.get(topic) {
            return (channel.tx.clone(), channel.rx.clone());
        }

        let mut topics = self.inner.topics.write().await;
        let channel = topics.entry(topic.to_string()).or_insert_with(|| {
            let (tx, rx) = mpsc::unbounded_channel();
            TopicChannel {
                tx,
                rx: Arc::new(Mutex::new(rx)),
            }
        });
        (channel.tx.clone(), channel.rx.clone())
    }
}

#[async_trait]
impl MessageQueue for ChannelBroker {
    async fn publish(&self, topic: &str, key: &str, payload: Vec<u8>) -> QueueResult<()> {
        if payload.len() > MAX_PAYLOAD_BYTES {
            return Err(QueueError::PayloadTooLarge {
                size: payload.len(),
                limit: MAX_PAYLOAD_BYTES,
            });
        }

        let (tx, _) = self.topic_channel(topic).await;
        tx.send(Delivery {
            key: key.to_string(),
            payload,
        })
        .map_err(|_| QueueError::Unavailable(format!("topic {} closed", topic)))?;

        debug!(topic, key, "published envelope");
        Ok(())
    }

    async fn receive(&self, topic: &str, group: &str) -> QueueResult<Delivery> {
        let (_, rx) = self.topic_channel(topic).await;
        let mut rx = rx.lock().await;
        let delivery = rx
            .recv()
            .await
            .ok_or_else(|| QueueError::Unavailable(format!("topic {} closed", topic)))?;
        debug!(topic, group, key = %delivery.key, "delivered envelope");
        Ok(delivery)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::topics::INGEST_CONSUMER_GROUP;

    #[tokio::test]
    async fn preserves_publish_order_per_key() {
        let broker = ChannelBroker::new();

        for i in 0..3u8 {
            broker.publish("t", "conv-1", vec![i]).await.unwrap();
        }

        for i in 0..3u8 {
            let d = broker.receive("t", INGEST_CONSUMER_GROUP).await.unwrap();
            assert_eq!(d.key, "conv-1");
            assert_eq!(d.payload, vec![i]);
        }
    }

    #[tokio::test]
    async fn buffers_publishes_before_first_receive() {
        let broker = ChannelBroker::new();
        broker.publish("t", "k", b"early".to_vec()).await.unwrap();

        let d = broker.receive("t", INGEST_CONSUMER_GROUP).await.unwrap();
        assert_eq!(d.payload, b"early");
    }

    #[tokio::test]
    async fn rejects_oversized_payloads() {
        let broker = ChannelBroker::new();
        let oversized = vec![0u8; MAX_PAYLOAD_BYTES + 1];

        let err = broker.publish("t", "k", oversized).await.unwrap_err();
        assert!(matches!(err, QueueError::PayloadTooLarge { .. }));
    }

    #[tokio::test]
    async fn each_delivery_reaches_one_consumer() {
        let broker = ChannelBroker::new();
        broker.publish("t", "k", b"one".to_vec()).await.unwrap();
        broker.publish("t", "k", b"two".to_vec()).await.unwrap();

        let first = broker.receive("t", INGEST_CONSUMER_GROUP).await.unwrap();
        let second = broker.receive("t", INGEST_CONSUMER_GROUP).await.unwrap();

        assert_ne!(first.payload, second.payload);
    }

    #[tokio::test]
    async fn topics_are_independent() {
        let broker = ChannelBroker::new();
        broker.publish("a", "k", b"for-a".to_vec()).await.unwrap();
        broker.publish("b", "k", b"for-b".to_vec()).await.unwrap();

        let d = broker.receive("b", INGEST_CONSUMER_GROUP).await.unwrap();
        assert_eq!(d.payload, b"for-b");
    }
}
