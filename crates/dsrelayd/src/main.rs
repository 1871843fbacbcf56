//! dsrelayd — node presence relay daemon.

use anyhow::Result;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;

use dsrelay_core::config::RelayConfig;
use dsrelay_services::{
    GossipRelay, NodeRegistry, NodeTtl, OutboundReport, SnapshotCache, WatchScheduler,
};

mod irc;
mod tasks;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    // Load config
    if let Err(e) = RelayConfig::write_default_if_missing() {
        tracing::warn!(error = %e, "failed to write default config");
    }
    let config = RelayConfig::load().unwrap_or_else(|e| {
        tracing::warn!(error = %e, "failed to load config, using defaults");
        RelayConfig::default()
    });
    tracing::info!(port = config.network.port, irc = config.irc.enabled, "dsrelayd starting");

    if config.gossip.suppression_window() >= config.registry.extended_ttl() {
        tracing::warn!(
            window_secs = config.gossip.suppression_window_secs,
            extended_ttl_secs = config.registry.extended_ttl_secs,
            "suppression window is not shorter than the node TTL; gossip may let nodes lapse"
        );
    }

    // Shared state
    let registry = NodeRegistry::new(NodeTtl {
        basic: config.registry.basic_ttl(),
        extended: config.registry.extended_ttl(),
    });
    let cache = SnapshotCache::gzip_json(registry.clone(), config.cache.ttl());
    let watch = WatchScheduler::new(registry.clone(), config.registry.online_ttl());
    let (outbound_tx, outbound_rx) =
        mpsc::channel::<OutboundReport>(config.gossip.outbound_queue_len());
    let relay = GossipRelay::new(
        registry.clone(),
        outbound_tx,
        config.gossip.suppression_window(),
    );

    // ── Shutdown channel ─────────────────────────────────────────────────────
    let (shutdown_tx, _) = broadcast::channel::<()>(1);

    {
        let shutdown = shutdown_tx.clone();
        tokio::spawn(async move {
            tokio::signal::ctrl_c().await.ok();
            tracing::info!("shutdown signal received");
            let _ = shutdown.send(());
        });
    }

    // ── Spawn tasks ──────────────────────────────────────────────────────────

    let expiry_task = tokio::spawn(tasks::expiry_loop(
        registry.clone(),
        watch.clone(),
        relay.clone(),
        config.registry.expiry_interval(),
        shutdown_tx.subscribe(),
    ));

    let watch_task = tokio::spawn(tasks::watch_loop(
        watch.clone(),
        config.watch.warmup(),
        config.watch.rebuild_interval(),
        shutdown_tx.subscribe(),
    ));

    let (irc_task, publish_task) = if config.irc.enabled {
        let irc_task = tokio::spawn(
            irc::IrcClient::new(
                config.irc.clone(),
                relay.clone(),
                outbound_rx,
                shutdown_tx.subscribe(),
            )
            .run(),
        );
        let publish_task = tokio::spawn(tasks::publish_loop(
            registry.clone(),
            relay.clone(),
            config.gossip.publish_interval(),
            shutdown_tx.subscribe(),
        ));
        (Some(irc_task), Some(publish_task))
    } else {
        tracing::warn!("irc disabled, running as an isolated relay");
        (None, None)
    };

    let api_task = {
        let state = dsrelay_api::ApiState {
            registry: registry.clone(),
            cache,
            relay: relay.clone(),
            watch: watch.clone(),
            version_header: config.api.version_header.clone(),
            legacy_version: config.api.legacy_version.clone(),
        };
        let listen_addr = config.network.listen_addr.clone();
        let port = config.network.port;
        tokio::spawn(async move {
            if let Err(e) = dsrelay_api::serve(state, &listen_addr, port).await {
                tracing::error!(error = %e, "API server failed");
            }
        })
    };

    // ── Wait for exit ────────────────────────────────────────────────────────

    let mut shutdown_rx = shutdown_tx.subscribe();

    tokio::select! {
        _ = shutdown_rx.recv()      => tracing::info!("shutting down"),
        r = api_task                => tracing::error!("API server exited: {:?}", r),
        r = expiry_task             => tracing::error!("expiry task exited: {:?}", r),
        r = watch_task              => tracing::error!("watch task exited: {:?}", r),
        r = optional(irc_task)      => tracing::error!("irc client exited: {:?}", r),
        r = optional(publish_task)  => tracing::error!("publish task exited: {:?}", r),
    }

    Ok(())
}

/// Await a task that may not have been spawned; never resolves if absent.
async fn optional(task: Option<JoinHandle<()>>) -> Result<(), tokio::task::JoinError> {
    match task {
        Some(handle) => handle.await,
        None => std::future::pending().await,
    }
}
