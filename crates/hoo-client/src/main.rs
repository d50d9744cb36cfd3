//! Headless HOO client: connects to the game server, optionally logs in, and
//! reports the outcome.

mod driver;
mod tick;

use std::process::ExitCode;
use std::sync::Arc;
use std::time::{Duration, Instant};

use clap::Parser;
use hoo_config::{CliArgs, Config, default_config_dir};
use hoo_net::{ClientSession, TcpSocketEngine};
use tracing::{error, info};

use crate::driver::{ClientDriver, Progress, engine_config};
use crate::tick::TickLoop;

/// Give up if the handshake has not finished by then.
const HANDSHAKE_DEADLINE: Duration = Duration::from_secs(30);

fn main() -> ExitCode {
    let args = CliArgs::parse();

    let config_dir = match args.config.clone().map_or_else(default_config_dir, Ok) {
        Ok(dir) => dir,
        Err(e) => {
            eprintln!("{e}; pass --config <dir>");
            return ExitCode::FAILURE;
        }
    };

    // Load or create config, then apply CLI overrides
    let mut config = Config::load_or_create(&config_dir).unwrap_or_else(|e| {
        eprintln!("Failed to load config: {e}, using defaults");
        Config::default()
    });
    config.apply_cli_overrides(&args);

    let log_dir = config_dir.join("logs");
    hoo_log::init_logging(Some(&log_dir), config.debug.file_logging, Some(&config));

    let network = &config.network;
    let engine = Arc::new(TcpSocketEngine::new(engine_config(network)));
    let session = ClientSession::new(engine).with_stale_after(network.stale_after());
    let credentials = args
        .credentials()
        .map(|(login, password)| (login.to_string(), password.to_string()));

    let mut driver = match ClientDriver::start(
        session,
        &network.server_address,
        network.server_port,
        credentials,
    ) {
        Ok(driver) => driver,
        Err(e) => {
            error!("Could not start session: {e}");
            return ExitCode::FAILURE;
        }
    };

    let mut ticks = TickLoop::new(network.tick_interval());
    info!(
        "Driving session to {}:{} every {:?}",
        network.server_address,
        network.server_port,
        ticks.interval()
    );
    let deadline = Instant::now() + HANDSHAKE_DEADLINE;
    let progress = loop {
        ticks.wait();
        let progress = driver.step();
        if progress != Progress::Running {
            break progress;
        }
        if Instant::now() >= deadline {
            break Progress::Rejected(format!(
                "no answer within {}s",
                HANDSHAKE_DEADLINE.as_secs()
            ));
        }
    };

    info!(
        "Stopped in state {} after {} ticks ({} skipped)",
        driver.session().state(),
        ticks.tick_count(),
        ticks.skipped()
    );
    driver.session_mut().close();

    match progress {
        Progress::Done => {
            info!("Handshake complete");
            ExitCode::SUCCESS
        }
        Progress::Rejected(reason) => {
            error!("Handshake failed: {reason}");
            ExitCode::FAILURE
        }
        Progress::Disconnected(state) => {
            error!("Session ended: {state}");
            ExitCode::FAILURE
        }
        Progress::Running => ExitCode::FAILURE,
    }
}
