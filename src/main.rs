//! VeloBridge - Virtual Trainer Bridge
//!
//! Service entry point: loads configuration and the track library, then
//! wires the broadcast loop, the mode controller, and the event publisher.
//! The radio and the bus client are external collaborators; this binary
//! runs against trace-logging stand-ins until they are attached.

use std::sync::Arc;

use anyhow::Context;
use tokio::sync::{mpsc, watch};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use velobridge::ant::{FecBroadcaster, Page, PageTransport, TransportError};
use velobridge::bus::{BusError, EventPublisher, PublishSink};
use velobridge::control::{controller, ModeController};
use velobridge::{AppConfig, TrackLibrary};

/// Stand-in radio: logs outbound pages, receives nothing.
struct LogTransport;

impl PageTransport for LogTransport {
    fn send_broadcast(&mut self, page: Page) -> Result<(), TransportError> {
        tracing::trace!(page = ?page, "broadcast");
        Ok(())
    }

    fn poll_inbound(&mut self) -> Result<Option<Page>, TransportError> {
        Ok(None)
    }
}

/// Stand-in bus client: logs every publish.
struct LogSink;

impl PublishSink for LogSink {
    fn publish(&self, topic: &str, payload: &str, retain: bool) -> Result<(), BusError> {
        tracing::debug!(topic, payload, retain, "publish");
        Ok(())
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting VeloBridge v{}", env!("CARGO_PKG_VERSION"));

    let config = AppConfig::load(None).context("loading configuration")?;

    let library = match TrackLibrary::from_gpx_dir(&config.tracks.path) {
        Ok(library) => library,
        Err(err) => {
            tracing::warn!(%err, path = %config.tracks.path.display(), "no track library");
            TrackLibrary::default()
        }
    };
    tracing::info!(tracks = library.len(), "track library ready");
    let library = Arc::new(library);

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    // decoded control commands: broadcaster -> controller
    let (command_tx, command_rx) = mpsc::channel(32);
    // telemetry fans out to the broadcast state and to arbitration; the
    // ergometer feed plugs into these senders
    let (broadcast_telemetry_tx, broadcast_telemetry_rx) = mpsc::channel(32);
    let (control_telemetry_tx, control_telemetry_rx) = mpsc::channel(32);
    // mode selection requests arrive from the bus frontend
    let (mode_tx, mode_rx) = mpsc::channel(8);

    let mode_controller = ModeController::new(
        Arc::clone(&library),
        config.power.band(),
        config.power.limits(),
    );
    let events = mode_controller.subscribe();

    let publisher = EventPublisher::new(LogSink, config.bus.base_topic.clone());
    publisher.publish_track_list(&library.summaries());
    let publisher_task = tokio::spawn(publisher.run(events, shutdown_rx.clone()));

    let broadcaster = FecBroadcaster::new(command_tx);
    let broadcast_task = tokio::spawn(broadcaster.run(
        Box::new(LogTransport),
        broadcast_telemetry_rx,
        shutdown_rx.clone(),
    ));

    let controller_task = tokio::spawn(controller::run(
        mode_controller,
        mode_rx,
        control_telemetry_rx,
        command_rx,
        shutdown_rx,
    ));

    // keep the input seams open until shutdown
    let _inputs = (broadcast_telemetry_tx, control_telemetry_tx, mode_tx);

    tokio::signal::ctrl_c().await.context("waiting for ctrl-c")?;
    tracing::info!("Goodbye...");
    let _ = shutdown_tx.send(true);

    let _ = tokio::join!(publisher_task, broadcast_task, controller_task);
    Ok(())
}
