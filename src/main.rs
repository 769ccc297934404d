use anyhow::Result;
use green_signal_publisher::{config, cycle, forecast, publish, scheduler, telemetry};

use config::Config;
use cycle::PublicationCycle;
use forecast::CorrentlyGsiProvider;
use publish::{MqttPublisher, PublicationMapper, Publisher};
use scheduler::RefreshScheduler;
use std::sync::Arc;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    telemetry::init_tracing();

    let cfg = Config::load()?;

    let provider = Arc::new(CorrentlyGsiProvider::new(
        cfg.gsi.base_url.clone(),
        cfg.gsi.zip.clone(),
        cfg.gsi.http_timeout(),
        cfg.gsi.cache_ttl(),
    )?);

    let primary: Arc<dyn Publisher> = Arc::new(MqttPublisher::connect(
        &cfg.mqtt.host,
        cfg.mqtt.port,
        &cfg.mqtt.client_id,
    ));
    let forwarder: Option<Arc<dyn Publisher>> = cfg.forward.as_ref().map(|f| {
        info!(host = %f.host, port = f.port, "forwarding side-channel enabled");
        Arc::new(MqttPublisher::connect(&f.host, f.port, &f.client_id)) as Arc<dyn Publisher>
    });

    let mapper = PublicationMapper::new(primary, forwarder, cfg.mqtt.root_topic.clone());
    let cycle = Arc::new(PublicationCycle::new(provider, mapper));
    let scheduler = Arc::new(RefreshScheduler::new(cycle, cfg.refresh.period()));

    info!(
        zip = %cfg.gsi.zip,
        broker = %format!("{}:{}", cfg.mqtt.host, cfg.mqtt.port),
        period_minutes = cfg.refresh.period_minutes,
        "starting green signal publisher"
    );
    info!("sample topic: /now - current index value");
    info!("sample topic: /forHoursIn24/3 - end of the best 3 hours in a row within the next 24");
    info!("sample topic: /relativeHours/5 - index value in 5 hours");

    let runner = scheduler.clone();
    tokio::spawn(async move { runner.run().await });

    telemetry::shutdown_signal().await;
    warn!("shutdown complete");
    Ok(())
}
