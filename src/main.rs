// Copyright (C) 2024 Laixer Equipment B.V.
// All rights reserved.
//
// This software may be modified and distributed under the terms
// of the included license.  See the LICENSE file for details.

use clap::Parser;

use servod::bus::EventBus;
use servod::driver::{self, Pca9685Device, SimPwmDevice};
use servod::service::{ActuatorService, EstimatorService};

#[derive(Parser)]
#[command(author = "Copyright (C) 2024 Laixer Equipment B.V.")]
#[command(version, propagate_version = true)]
#[command(about = "RC servo controller daemon", long_about = None)]
struct Args {
    /// Configuration file.
    #[arg(
        short = 'c',
        long = "config",
        alias = "conf",
        default_value = "/etc/servod.conf",
        value_name = "FILE"
    )]
    config: std::path::PathBuf,
    /// Enable simulation mode.
    #[arg(long, default_value_t = false)]
    simulation: bool,
    /// Quiet output (no logging).
    #[arg(long)]
    quiet: bool,
    /// Daemonize the service.
    #[arg(short = 'D', long)]
    daemon: bool,
    /// Log to the systemd journal.
    #[arg(long)]
    systemd: bool,
    /// Level of verbosity.
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    use log::LevelFilter;

    let args = Args::parse();

    let mut config = servod::from_file(&args.config)?;

    if args.simulation {
        config.simulation.enabled = true;
    }

    let log_level = if args.daemon || args.systemd {
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

    if args.systemd {
        servod::logger::SystemdLogger::init(log_level)?;
    } else {
        let mut log_config = simplelog::ConfigBuilder::new();
        if args.daemon {
            log_config.set_time_level(LevelFilter::Off);
            log_config.set_thread_level(LevelFilter::Off);
        }

        log_config.set_target_level(LevelFilter::Off);
        log_config.set_location_level(LevelFilter::Off);
        log_config.add_filter_ignore_str("mio");

        let color_choice = if args.daemon {
            simplelog::ColorChoice::Never
        } else {
            simplelog::ColorChoice::Auto
        };

        simplelog::TermLogger::init(
            log_level,
            log_config.build(),
            simplelog::TerminalMode::Mixed,
            color_choice,
        )?;
    }

    if args.daemon {
        log::debug!("Running service as daemon");
    }

    log::trace!("{:#?}", config);

    servod::log_system();

    log::info!("Starting {} {}", env!("CARGO_BIN_NAME"), servod::consts::VERSION);

    let device: driver::SharedPwmDevice = if config.simulation.enabled {
        log::info!("Running in simulation mode");

        driver::shared(SimPwmDevice::new())
    } else {
        driver::shared(Pca9685Device::open(&config.device)?)
    };

    let bus = EventBus::new();
    let runtime = servod::RuntimeContext::new();

    runtime.shutdown_on_signal();

    let mut services = Vec::new();

    for actuator_config in &config.actuators {
        let joint = config.joint(&actuator_config.joint)?;

        let (service, _handle) =
            ActuatorService::new(actuator_config, joint, device.clone(), &bus)?;

        services.push(runtime.spawn_service(service.run(runtime.shutdown_signal())));
    }

    for estimator_config in &config.estimators {
        // The joint must exist even though the estimator only reads the bus.
        config.joint(&estimator_config.joint)?;

        let service = EstimatorService::new(estimator_config, &bus);

        services.push(runtime.spawn_service(service.run(runtime.shutdown_signal())));
    }

    runtime.wait_for_shutdown().await;

    // The actuator services disarm their channels on the way out.
    for service in services {
        service.await.ok();
    }

    log::debug!("{} was shutdown gracefully", env!("CARGO_BIN_NAME"));

    Ok(())
}
