//! keyforge-sim: runs the firmware controller on the host.
//!
//! Loads the board configuration, then replays its simulation script through
//! a snapshot scanner, one step per scan tick, writing every keyboard report
//! to stdout as a JSON line.  Logs go to stderr.
//!
//! # Architecture
//!
//! ```text
//! main()
//!  └─ load_config()          -- board, keymap, remap table, script
//!  └─ Controller::new()      -- layered keymap + JSON-lines transmitter
//!  └─ scan loop (Tokio interval)
//!       ├─ apply script step to SnapshotScanner
//!       └─ Controller::run_cycle()
//! ```
//!
//! Usage: `keyforge-sim [CONFIG]` (default `keyforge.toml`).

use std::{path::PathBuf, time::Duration};

use anyhow::Context;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use keyforge_core::KeyAddr;
use keyforge_firmware::{
    application::controller::Controller,
    infrastructure::{
        clock::{Clock, SystemClock},
        scan::SnapshotScanner,
        storage::config::{load_config, ScanStep},
        transmit::JsonLinesTransmitter,
    },
};

const DEFAULT_CONFIG_PATH: &str = "keyforge.toml";

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let config_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH));

    let config = load_config(&config_path)
        .with_context(|| format!("loading {}", config_path.display()))?;

    // Level is overridden by `RUST_LOG`.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.controller.log_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    info!("keyforge-sim starting with {}", config_path.display());

    let keymap = config.build_keymap().context("building keymap")?;
    let mut controller = Controller::new(
        config.settings(),
        keymap,
        JsonLinesTransmitter::new(std::io::stdout()),
    );
    if let Some(remap) = config.build_remap().context("building remap table")? {
        info!("remap plugin installed with {} entries", remap.len());
        controller = controller.with_plugin(remap);
    }

    let mut scanner = SnapshotScanner::new(config.controller.total_keys);
    let clock = SystemClock::new();
    let mut interval =
        tokio::time::interval(Duration::from_millis(config.simulation.scan_interval_ms.max(1)));
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    let mut steps = config.simulation.steps.iter();
    let (mut events, mut reports, mut errors) = (0usize, 0usize, 0usize);

    info!("keyforge-sim ready.  Press Ctrl-C to exit.");
    loop {
        tokio::select! {
            _ = interval.tick() => {
                let Some(step) = steps.next() else { break };
                apply_step(&mut scanner, step);
                let summary = controller.run_cycle(&mut scanner, clock.now_ms());
                debug!("cycle: {summary:?}");
                events += summary.events;
                reports += summary.reports_sent;
                errors += summary.errors;
            }
            _ = &mut shutdown => {
                info!("shutdown signal received");
                break;
            }
        }
    }

    info!("keyforge-sim stopped: {events} events, {reports} reports, {errors} errors");
    Ok(())
}

fn apply_step(scanner: &mut SnapshotScanner, step: &ScanStep) {
    let presses = step.press.iter().map(|&addr| (addr, true));
    let releases = step.release.iter().map(|&addr| (addr, false));
    for (addr, pressed) in presses.chain(releases) {
        let addr = KeyAddr(addr);
        let result = if pressed {
            scanner.press(addr)
        } else {
            scanner.release(addr)
        };
        if let Err(e) = result {
            warn!("ignoring script step: {e}");
        }
    }
}
