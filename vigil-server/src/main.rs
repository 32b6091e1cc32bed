// Copyright (C) 2024 Vigil Contributors
// All rights reserved.
//
// This software may be modified and distributed under the terms
// of the included license.  See the LICENSE file for details.

use clap::Parser;

use vigil::{
    driver::{Scene, SimVehicle, TelloVehicle, Vehicle, World},
    observer::{FrameDump, LogObserver, TraceObserver},
    runtime::{Session, Tracker},
    vision::{FrameSource, RemoteVision, Upstream},
    Config, Shutdown,
};

#[derive(Parser)]
#[command(version, propagate_version = true)]
#[command(about = "Vigil face tracking daemon", long_about = None)]
struct Args {
    /// Configuration file.
    #[arg(
        short = 'c',
        long = "config",
        alias = "conf",
        default_value = vigil::consts::DEFAULT_CONFIG_PATH,
        value_name = "FILE"
    )]
    config: std::path::PathBuf,
    /// Enable simulation mode.
    #[arg(long, default_value_t = false)]
    simulation: bool,
    /// Track from the ground, do not take off.
    #[arg(long, default_value_t = false)]
    no_takeoff: bool,
    /// Quiet output (no logging).
    #[arg(long)]
    quiet: bool,
    /// Daemonize the service.
    #[arg(short = 'D', long)]
    daemon: bool,
    /// Level of verbosity.
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    use log::LevelFilter;

    let args = Args::parse();

    let log_level = if args.daemon {
        LevelFilter::Info
    } else if args.quiet {
        LevelFilter::Off
    } else {
        match args.verbose {
            0 => LevelFilter::Info,
            1 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    };

    if args.daemon {
        vigil::logger::SystemdLogger::init(log_level)?;

        log::debug!("Running service as daemon");
    } else {
        let mut log_config = simplelog::ConfigBuilder::new();
        log_config.set_target_level(LevelFilter::Off);
        log_config.set_location_level(LevelFilter::Off);
        log_config.add_filter_ignore_str("mio");

        simplelog::TermLogger::init(
            log_level,
            log_config.build(),
            simplelog::TerminalMode::Mixed,
            simplelog::ColorChoice::Auto,
        )?;
    }

    let mut config: Config = if args.config.exists() {
        vigil::from_file(&args.config)?
    } else {
        log::warn!(
            "Configuration file {} not found, using defaults",
            args.config.display()
        );
        Config::default()
    };

    if args.simulation {
        config.simulation.enabled = true;
    }
    if args.no_takeoff {
        config.vehicle.takeoff = false;
    }

    config.validate()?;

    log::trace!("{:#?}", config);

    run(config).await
}

async fn run(config: Config) -> anyhow::Result<()> {
    let bin_name = env!("CARGO_BIN_NAME");

    log::info!("Starting {}", bin_name);
    log::debug!("Runtime version: {}", vigil::consts::VERSION);

    let shutdown = Shutdown::new();
    shutdown.trigger_on_ctrl_c();

    if config.simulation.enabled {
        log::info!("Running in simulation mode");

        let center = (
            config.tracker.frame_width as f32 / 2.0,
            config.tracker.frame_height as f32 / 2.0,
        );
        let world = std::sync::Arc::new(std::sync::Mutex::new(World::new(
            (center.0 + 100.0, center.1 + 60.0),
            20_000.0,
        )));

        let scene = Scene::new(
            world.clone(),
            config.tracker.frame_width,
            config.tracker.frame_height,
        )
        .with_jitter(config.simulation.jitter)
        .with_render(config.simulation.render);

        match (config.simulation.render, &config.trace.frames) {
            (true, None) => log::warn!("Rendering frames without a frame directory configured"),
            (false, Some(_)) => log::warn!("Frame rendering is disabled, no frames will be written"),
            _ => {}
        }

        track(SimVehicle::new(world), scene, &config, &shutdown).await?;
    } else {
        let vehicle = TelloVehicle::from_config(&config.vehicle).await?;

        log::debug!("Vehicle command link bound to {}", config.vehicle.address);

        let vision = RemoteVision::bind(config.vision.listen.as_str()).await?;

        if config.trace.frames.is_some() {
            log::warn!("Frame reports carry no pixel data, no frames will be written");
        }

        track(vehicle, vision, &config, &shutdown).await?;
    }

    log::debug!("{} was shutdown gracefully", bin_name);

    Ok(())
}

async fn track<V, S>(vehicle: V, source: S, config: &Config, shutdown: &Shutdown) -> anyhow::Result<()>
where
    V: Vehicle,
    S: FrameSource + 'static,
{
    let estimator = Upstream::new(config.vision.min_score);

    let mut tracker = Tracker::from_config(config, Box::new(source), Box::new(estimator))?;
    tracker.add_observer(LogObserver);

    if let Some(path) = &config.trace.path {
        tracker.add_observer(TraceObserver::create(path)?);
    }
    if let Some(dir) = &config.trace.frames {
        tracker.add_observer(FrameDump::create(dir)?);
    }

    Session::new(vehicle, tracker, config.vehicle.clone())
        .run(shutdown)
        .await?;

    Ok(())
}
