//! Kafka record source (`kafka` feature).
//!
//! The consumer is assigned one topic partition directly; no group
//! rebalancing and no broker-side commits. The offset file stays the only
//! resume position.

use std::fmt;
use std::time::Duration;

use rdkafka::config::ClientConfig;
use rdkafka::consumer::{Consumer, StreamConsumer};
use rdkafka::message::Message;
use rdkafka::{Offset, TopicPartitionList};

use crate::source::{RecordSource, SourceError, StreamRecord};

#[derive(Clone)]
pub struct KafkaSourceConfig {
    pub brokers: Vec<String>,
    pub topic: String,
    pub partition: i32,
    pub group_id: String,
    pub username: String,
    pub password: String,
    /// Broker-side long-poll bound.
    pub max_wait: Duration,
}

impl fmt::Debug for KafkaSourceConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KafkaSourceConfig")
            .field("brokers", &self.brokers)
            .field("topic", &self.topic)
            .field("partition", &self.partition)
            .field("group_id", &self.group_id)
            .field("username", &self.username)
            .field("password", &"<REDACTED>")
            .finish()
    }
}

pub struct KafkaSource {
    consumer: StreamConsumer,
    topic: String,
    partition: i32,
    next_position: Option<i64>,
}

impl KafkaSource {
    pub fn new(cfg: &KafkaSourceConfig) -> Result<Self, SourceError> {
        let brokers = cfg.brokers.join(",");
        let consumer: StreamConsumer = ClientConfig::new()
            .set("bootstrap.servers", &brokers)
            .set("group.id", &cfg.group_id)
            .set("enable.auto.commit", "false")
            .set("enable.auto.offset.store", "false")
            .set("auto.offset.reset", "earliest")
            .set("security.protocol", "SASL_SSL")
            .set("sasl.mechanism", "PLAIN")
            .set("sasl.username", &cfg.username)
            .set("sasl.password", &cfg.password)
            .set("fetch.wait.max.ms", cfg.max_wait.as_millis().to_string())
            .create()
            .map_err(|e| SourceError::Read(format!("kafka consumer for {brokers}: {e}")))?;

        tracing::info!(
            brokers = %brokers,
            topic = %cfg.topic,
            partition = cfg.partition,
            "kafka source created"
        );

        Ok(Self {
            consumer,
            topic: cfg.topic.clone(),
            partition: cfg.partition,
            next_position: None,
        })
    }
}

#[async_trait::async_trait]
impl RecordSource for KafkaSource {
    async fn seek(&mut self, position: i64) -> Result<(), SourceError> {
        if self.next_position == Some(position) {
            return Ok(());
        }
        let mut tpl = TopicPartitionList::new();
        tpl.add_partition_offset(&self.topic, self.partition, Offset::Offset(position))
            .map_err(|e| SourceError::Seek {
                position,
                message: e.to_string(),
            })?;
        self.consumer.assign(&tpl).map_err(|e| SourceError::Seek {
            position,
            message: e.to_string(),
        })?;
        self.next_position = Some(position);
        tracing::debug!(topic = %self.topic, partition = self.partition, position, "kafka partition assigned");
        Ok(())
    }

    async fn next_record(&mut self) -> Result<Option<StreamRecord>, SourceError> {
        let msg = self
            .consumer
            .recv()
            .await
            .map_err(|e| SourceError::Read(e.to_string()))?;
        let offset = msg.offset();
        let payload = msg.payload().map(<[u8]>::to_vec).unwrap_or_default();
        self.next_position = Some(offset + 1);
        Ok(Some(StreamRecord { offset, payload }))
    }
}
