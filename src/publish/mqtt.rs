use anyhow::{Context, Result};
use async_trait::async_trait;
use rumqttc::{AsyncClient, Event, MqttOptions, Packet, QoS};
use std::time::Duration;
use tracing::{debug, warn};

use crate::stats::PublishFact;

/// Transport seam: deliver one fact to a pub/sub endpoint. The engine and
/// mapper only ever need this single operation.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Publisher: Send + Sync {
    async fn publish(&self, fact: &PublishFact) -> Result<()>;
}

/// MQTT client publisher. The connection event loop runs on a spawned
/// task for the lifetime of the client; connection errors are logged and
/// retried there, never surfaced through `publish`.
pub struct MqttPublisher {
    client: AsyncClient,
}

impl MqttPublisher {
    /// Must be called from within a tokio runtime.
    pub fn connect(host: &str, port: u16, client_id: &str) -> Self {
        let mut options = MqttOptions::new(client_id, host, port);
        options.set_keep_alive(Duration::from_secs(30));
        let (client, mut eventloop) = AsyncClient::new(options, 64);

        let broker = format!("{host}:{port}");
        tokio::spawn(async move {
            loop {
                match eventloop.poll().await {
                    Ok(Event::Incoming(Packet::ConnAck(_))) => {
                        debug!(%broker, "mqtt connected");
                    }
                    Ok(_) => {}
                    Err(e) => {
                        warn!(%broker, error = %e, "mqtt connection error");
                        tokio::time::sleep(Duration::from_secs(5)).await;
                    }
                }
            }
        });

        Self { client }
    }
}

#[async_trait]
impl Publisher for MqttPublisher {
    async fn publish(&self, fact: &PublishFact) -> Result<()> {
        let qos = match fact.qos {
            0 => QoS::AtMostOnce,
            1 => QoS::AtLeastOnce,
            _ => QoS::ExactlyOnce,
        };
        self.client
            .publish(fact.topic.clone(), qos, fact.retain, fact.payload.clone())
            .await
            .context("mqtt publish failed")
    }
}
