// Copyright (C) 2024 Vigil Contributors
// All rights reserved.
//
// This software may be modified and distributed under the terms
// of the included license.  See the LICENSE file for details.

use clap::Parser;

use vigil_tello::Tello;

#[derive(Parser)]
#[command(version, propagate_version = true)]
#[command(about = "Vigil vehicle control", long_about = None)]
struct Args {
    /// Vehicle command address.
    #[arg(short, long, default_value = vigil_tello::DEFAULT_ADDRESS)]
    address: String,
    /// Local command socket address.
    #[arg(short, long, default_value = vigil_tello::DEFAULT_BIND)]
    bind: String,
    /// Command reply timeout in milliseconds.
    #[arg(short, long, default_value_t = 7_000)]
    timeout: u64,
    /// Level of verbosity.
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
    /// Commands.
    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Subcommand)]
enum Command {
    /// Show battery level.
    Battery,
    /// Take off.
    Takeoff,
    /// Land.
    Land,
    /// Hover in place.
    Stop,
    /// Stop all motors immediately.
    Emergency,
    /// Ascend.
    Up {
        /// Distance in centimeters.
        distance: u16,
    },
    /// Send a raw SDK command.
    Raw {
        /// Command text.
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        command: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    use log::LevelFilter;

    let args = Args::parse();

    let mut log_config = simplelog::ConfigBuilder::new();
    log_config.set_time_level(LevelFilter::Off);
    log_config.set_thread_level(LevelFilter::Off);
    log_config.set_target_level(LevelFilter::Off);
    log_config.set_location_level(LevelFilter::Off);
    log_config.add_filter_ignore_str("mio");

    let log_level = match args.verbose {
        0 => LevelFilter::Error,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };

    simplelog::TermLogger::init(
        log_level,
        log_config.build(),
        simplelog::TerminalMode::Mixed,
        simplelog::ColorChoice::Auto,
    )?;

    run(args).await
}

async fn run(args: Args) -> anyhow::Result<()> {
    let mut tello = Tello::bind(args.bind.as_str(), args.address.as_str()).await?;
    tello.set_timeout(std::time::Duration::from_millis(args.timeout));

    tello.connect().await?;

    log::debug!("Connected to {}", args.address);

    match args.command {
        Command::Battery => {
            let level = tello.battery().await?;
            println!("Battery: {}%", level);
        }
        Command::Takeoff => {
            log::info!("Taking off");

            tello.takeoff().await?;
        }
        Command::Land => {
            log::info!("Landing");

            tello.land().await?;
        }
        Command::Stop => {
            log::info!("Hovering in place");

            tello.stop().await?;
        }
        Command::Emergency => {
            log::info!("Emergency stop");

            tello.emergency().await?;
        }
        Command::Up { distance } => {
            if !vigil_tello::MOVE_RANGE.contains(&distance) {
                return Err(anyhow::anyhow!(
                    "Distance must be between {} and {} cm",
                    vigil_tello::MOVE_RANGE.start(),
                    vigil_tello::MOVE_RANGE.end()
                ));
            }

            log::info!("Ascending {} cm", distance);

            tello.up(distance).await?;
        }
        Command::Raw { command } => {
            let command = command.join(" ");
            if command.is_empty() {
                return Err(anyhow::anyhow!("Empty command"));
            }

            println!("{}", tello.command(&command).await?);
        }
    }

    Ok(())
}
