use anyhow::anyhow;
use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use tracing::info;

use crate::error::CycleError;
use crate::forecast::GsiProvider;
use crate::publish::PublicationMapper;
use crate::stats;

/// One fetch → compute → publish pass. The scheduler decides when to run
/// it; a cycle always runs to completion or fails outright on fetch.
#[async_trait]
pub trait Cycle: Send + Sync {
    async fn run(&self) -> Result<(), CycleError>;
}

pub struct PublicationCycle {
    provider: Arc<dyn GsiProvider>,
    mapper: PublicationMapper,
}

impl PublicationCycle {
    pub fn new(provider: Arc<dyn GsiProvider>, mapper: PublicationMapper) -> Self {
        Self { provider, mapper }
    }
}

#[async_trait]
impl Cycle for PublicationCycle {
    async fn run(&self) -> Result<(), CycleError> {
        let series = self.provider.fetch().await.map_err(CycleError::Fetch)?;
        let facts = stats::compute(&series, Utc::now().timestamp_millis());
        let total = facts.len();
        let published = self.mapper.publish_all(facts).await;
        if total > 0 && published == 0 {
            return Err(CycleError::Publish(anyhow!(
                "transport accepted none of {total} facts"
            )));
        }
        info!(points = series.len(), published, total, "cycle published");
        Ok(())
    }
}
