//! Application entry point: Mode S receiver.
//!
//! # Startup sequence
//!
//! 1. Initialise logging.
//! 2. Parse the command line and resolve [`AppConfig`] (file, then overrides).
//! 3. Configure the pipeline stage and the output registry.
//! 4. Start the pipeline runner thread.
//! 5. Run the dispatch loop on a current-thread tokio runtime until the
//!    pipeline finishes or Ctrl-C is pressed.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use modes_rx::{
    cli::Args,
    config::AppConfig,
    output::{BroadcastSink, ConsoleSink, OutputRegistry, StoreSink},
    pipeline::{Dispatcher, PipelineRunner, Shutdown, StopReason},
    queue::FrameQueue,
    stage,
};

/// Register the sinks selected in `config.outputs`.
///
/// Order is broadcast, store, console: network clients see a frame before
/// the slower local outputs handle it.
fn build_registry(config: &AppConfig) -> Result<OutputRegistry> {
    let outputs = &config.outputs;
    let mut registry = OutputRegistry::new();

    if outputs.broadcast {
        let sink = BroadcastSink::bind(outputs.broadcast_port)
            .with_context(|| format!("binding broadcast port {}", outputs.broadcast_port))?;
        let id = registry.add(sink);
        registry.register_emit(id)?;
        registry.register_poll(id)?;
    }

    if outputs.database {
        let path = outputs.store_path();
        let sink = StoreSink::open(&path)
            .with_context(|| format!("opening frame store {}", path.display()))?;
        let id = registry.add(sink);
        registry.register_emit(id)?;
        registry.register_poll(id)?;
    }

    if outputs.console {
        let id = registry.add(ConsoleSink::stdout());
        registry.register_emit(id)?;
    }

    Ok(registry)
}

fn main() -> Result<()> {
    // 1. Logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    // 2. Configuration
    let args = Args::parse();
    let settings_file = args.settings_file();

    if args.save_config {
        args.save_settings(&settings_file)?;
        log::info!("Settings written to {}", settings_file.display());
        return Ok(());
    }
    let config = args.resolve_config(&settings_file)?;

    // 3. Stage and sinks
    let queue = Arc::new(FrameQueue::with_capacity(config.dispatch.queue_capacity));
    let stage = stage::configure(&config, Arc::clone(&queue)).context("configuring pipeline")?;
    let registry = build_registry(&config)?;

    // 4. Runner
    let runner = PipelineRunner::start(stage)?;

    // 5. Dispatch loop
    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("creating tokio runtime")?;

    let report = rt.block_on(async {
        let shutdown = Shutdown::new();

        let on_interrupt = shutdown.clone();
        tokio::spawn(async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => on_interrupt.trigger(),
                Err(e) => log::warn!("Ctrl-C handler unavailable: {e}"),
            }
        });

        Dispatcher::new(queue, registry, runner, &config.dispatch)
            .run(shutdown)
            .await
    });

    match report.reason {
        StopReason::PipelineFinished => log::info!("Pipeline finished"),
        StopReason::Interrupted => log::info!("Interrupted"),
    }
    if !report.runner_joined {
        log::warn!("Pipeline thread still running at exit");
    }
    Ok(())
}
