// Copyright (C) 2024 Laixer Equipment B.V.
// All rights reserved.
//
// This software may be modified and distributed under the terms
// of the included license.  See the LICENSE file for details.

/// The `servod` library drives hobby RC servos on a PCA9685 PWM chip and
/// publishes an open-loop estimate of every servo's position.
///
/// Two services form the core. The actuator service accepts position
/// commands, clamps them to the joint limits, converts the angle to a pulse
/// width and writes it to the PWM device. Every accepted command is announced
/// on the event bus as a motion event carrying the expected arrival time.
/// The estimator service consumes these announcements and publishes a
/// rate-limited, time-interpolated joint state signal. There is no sensor
/// feedback anywhere; the estimate is derived purely from the commanded
/// trajectory and the elapsed time.
///
/// The remaining modules are plumbing: `driver` talks to the PWM chip,
/// `bus` carries typed events between services, `config` supplies the
/// validated joint and actuator parameters, and `runtime` owns task
/// spawning and graceful shutdown.
pub mod bus;
pub mod core;
pub mod driver;
pub mod logger;
pub mod math;
pub mod service;

#[macro_use]
extern crate log;

mod config;

pub use self::config::*;

pub mod runtime;
pub use self::runtime::Error;
pub use self::runtime::RuntimeContext;

/// Servod runtime module containing various constants.
pub mod consts {
    /// Servod runtime version.
    ///
    /// # Example
    ///
    /// ```
    /// use servod::consts::VERSION;
    ///
    /// println!("Servod runtime version: {}", VERSION);
    /// ```
    pub const VERSION: &str = env!("CARGO_PKG_VERSION");

    /// Default queue size for actuator commands.
    pub const QUEUE_SIZE_COMMAND: usize = 16;

    /// Default queue size for bus signals.
    pub const QUEUE_SIZE_SIGNAL: usize = 16;

    /// Number of PWM channels on the device.
    pub const PWM_CHANNEL_COUNT: u8 = 16;

    /// Default servo pulse width at the lower joint bound, in microseconds.
    pub const DEFAULT_MIN_PULSE: u16 = 500;

    /// Default servo pulse width at the upper joint bound, in microseconds.
    pub const DEFAULT_MAX_PULSE: u16 = 2_500;

    /// Default joint state publish rate in hertz.
    pub const DEFAULT_PUBLISH_RATE: u64 = 50;

    /// Default maximum silence between joint state publishes, in milliseconds.
    pub const DEFAULT_MAX_SILENCE: u64 = 5_000;
}

/// Read configuration from a TOML file.
pub fn from_file<P: AsRef<std::path::Path>>(path: P) -> Result<Config, ConfigError> {
    let contents = std::fs::read_to_string(path).map_err(ConfigError::Read)?;

    toml::from_str(&contents).map_err(ConfigError::Parse)
}

/// Log system information.
///
/// This function logs system information including the system name, kernel version,
/// OS version, and host name.
pub fn log_system() {
    use sysinfo::System;

    log::debug!("System name: {}", System::name().unwrap_or_default());
    log::debug!(
        "System kernel version: {}",
        System::kernel_version().unwrap_or_default()
    );
    log::debug!(
        "System OS version: {}",
        System::os_version().unwrap_or_default()
    );
    log::debug!(
        "System host name: {}",
        System::host_name().unwrap_or_default()
    );
}
