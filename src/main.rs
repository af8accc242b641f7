use std::path::Path;
use std::sync::mpsc;
use std::time::Instant;

use anyhow::Context;
use log::{info, warn};
use rock_migrate::progress::display::ProgressDisplay;
use rock_migrate::{
    ChannelObserver, ImportConfig, ImportOrchestrator, MemoryRepository, source_from_config,
};

fn main() -> anyhow::Result<()> {
    // Setup logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    // First argument is the config file; without one, run the bundled
    // example dataset against the in-memory repository.
    let config = match std::env::args().nth(1) {
        Some(path) => ImportConfig::from_file(Path::new(&path))
            .with_context(|| format!("loading config {path}"))?,
        None => {
            warn!("no config file given, running the example dataset");
            ImportConfig {
                source_format: "example".to_string(),
                ..ImportConfig::default()
            }
        }
    };

    let (source, map) = source_from_config(&config)?;
    let repository = MemoryRepository::new();

    let (sender, receiver) = mpsc::channel();
    let orchestrator = ImportOrchestrator::new(config, source, map, repository)
        .with_observer(Box::new(ChannelObserver::new(sender)));

    info!("starting import");
    let start = Instant::now();
    let handle = orchestrator.run_in_background();

    // Drive the terminal progress bars from the worker's events; the
    // channel closes when the run ends.
    let mut display = ProgressDisplay::new();
    for event in receiver {
        display.handle(&event);
    }
    display.finish();

    let (orchestrator, result) = handle
        .join()
        .map_err(|_| anyhow::anyhow!("import worker panicked"))?;
    let summary = result.context("import failed")?;

    info!("{} in {:?}", summary.message, start.elapsed());
    for table in &summary.tables {
        info!(
            "  {}: {:?}, {} completed, {} skipped",
            table.name, table.state, table.completed, table.skipped
        );
    }

    let repository = orchestrator.into_repository();
    info!(
        "repository now holds {} families, {} people, {} transactions",
        repository.families().len(),
        repository.people().len(),
        repository.transactions().len()
    );

    Ok(())
}
