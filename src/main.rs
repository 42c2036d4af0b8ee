use std::time::Duration;

use color_eyre::Result;
use gamedeck::catalog::{load_catalog, CatalogStore, FileSource};
use gamedeck::config::LauncherConfig;
use gamedeck::input::{InputDispatcher, MenuCommand};
use gamedeck::menu::MenuSelection;
use gamedeck::topology::{DeviceHandle, DeviceTopology, GilrsSubsystem, LinkProbe};
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    setup()?;

    let config = match LauncherConfig::load() {
        Ok(config) => config,
        Err(e) => {
            warn!("Unusable configuration, falling back to defaults: {}", e);
            LauncherConfig::default()
        }
    };

    let mut store = CatalogStore::new();
    if let Err(e) = load_catalog(&FileSource::new(&config.catalog_path), &mut store) {
        error!("Catalog not fully loaded: {}", e);
    }
    if store.is_empty() {
        warn!("No games available in {}", config.catalog_path.display());
    }

    let mut topology = DeviceTopology::new(
        config.connectors(),
        config.players,
        LinkProbe,
        GilrsSubsystem::new(),
    )?;
    if let Err(e) = topology.reset() {
        error!("Initial controller detection failed: {}", e);
    }

    let dispatcher = InputDispatcher::new(config.select_button, config.start_button);
    let mut menu = MenuSelection::new(store.count());

    let mut frames = tokio::time::interval(Duration::from_secs(1) / config.frame_rate);
    frames.set_missed_tick_behavior(MissedTickBehavior::Skip);

    info!("Menu running at {} frames per second", config.frame_rate);
    loop {
        tokio::select! {
            _ = frames.tick() => {}
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted, leaving menu");
                return Ok(());
            }
        }

        let mut launch = false;
        while let Some(event) = topology.subsystem_mut().next_event() {
            let player = topology
                .subsystem()
                .device_index(event.id)
                .and_then(|index| topology.player_for_device(DeviceHandle(index)));
            match dispatcher.dispatch(player, &event.event) {
                Some(MenuCommand::Hold(direction)) => menu.hold(direction),
                Some(MenuCommand::Launch) => launch = true,
                None => {}
            }
        }
        menu.tick();

        if launch {
            match menu.selected(&store) {
                Some(game) => {
                    info!("Launching '{}'", game.title);
                    println!("{}", game.rom);
                    return Ok(());
                }
                None => debug!("Launch requested with no game selected"),
            }
        }

        match topology.poll_once() {
            Ok(report) if report.changed() => {
                for transition in &report.transitions {
                    info!(
                        "Player {} controller {} at {}",
                        transition.player + 1,
                        if transition.plugged { "connected" } else { "removed" },
                        transition.timestamp.format("%H:%M:%S")
                    );
                }
            }
            Ok(_) => {}
            Err(e) => error!("Controller detection failed: {}", e),
        }
    }
}

fn setup() -> Result<()> {
    if std::env::var("RUST_LIB_BACKTRACE").is_err() {
        std::env::set_var("RUST_LIB_BACKTRACE", "0")
    }
    color_eyre::install()?;
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "info")
    }
    setup_logging_env();
    Ok(())
}

/// Logs go to stderr; stdout carries only the launched ROM path
fn setup_logging_env() {
    FmtSubscriber::builder()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .init();
}
