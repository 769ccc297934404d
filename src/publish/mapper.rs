use std::sync::Arc;
use tracing::{debug, warn};

use super::Publisher;
use crate::stats::PublishFact;

/// Drives a cycle's fact sequence through the publish collaborator
/// strictly in the order produced, one awaited publish at a time.
pub struct PublicationMapper {
    primary: Arc<dyn Publisher>,
    forwarder: Option<Arc<dyn Publisher>>,
    root_topic: String,
}

impl PublicationMapper {
    pub fn new(
        primary: Arc<dyn Publisher>,
        forwarder: Option<Arc<dyn Publisher>>,
        root_topic: String,
    ) -> Self {
        Self {
            primary,
            forwarder,
            root_topic,
        }
    }

    /// Publishes every fact in order and returns how many the primary
    /// accepted. A failed fact is logged and the remainder continues.
    /// Each fact is also mirrored to the forwarder when one is
    /// configured, independent of the primary outcome; forwarder errors
    /// never affect the primary sequence.
    pub async fn publish_all(&self, facts: Vec<PublishFact>) -> usize {
        let mut published = 0;
        for fact in facts {
            let fact = self.rooted(fact);
            match self.primary.publish(&fact).await {
                Ok(()) => {
                    published += 1;
                    debug!(topic = %fact.topic, payload = %fact.payload, "published");
                }
                Err(e) => warn!(topic = %fact.topic, error = %e, "publish failed"),
            }
            if let Some(forwarder) = &self.forwarder {
                if let Err(e) = forwarder.publish(&fact).await {
                    debug!(topic = %fact.topic, error = %e, "forward failed");
                }
            }
        }
        published
    }

    fn rooted(&self, mut fact: PublishFact) -> PublishFact {
        if !self.root_topic.is_empty() {
            fact.topic = format!("{}{}", self.root_topic, fact.topic);
        }
        fact
    }
}
