use crate::core::Joint;

#[derive(Clone, Debug, serde_derive::Deserialize, PartialEq, Eq)]
pub struct DeviceConfig {
    /// I2C bus device node.
    #[serde(default = "DeviceConfig::default_bus")]
    pub bus: String,
    /// I2C address of the PWM chip.
    #[serde(default = "DeviceConfig::default_address")]
    pub address: u8,
    /// PWM frequency in hertz.
    #[serde(default = "DeviceConfig::default_frequency")]
    pub frequency: u16,
    /// Output enable GPIO pin, active low.
    pub oe_pin: Option<u64>,
}

impl DeviceConfig {
    fn default_bus() -> String {
        "/dev/i2c-1".to_owned()
    }

    fn default_address() -> u8 {
        0x40
    }

    fn default_frequency() -> u16 {
        50
    }
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            bus: Self::default_bus(),
            address: Self::default_address(),
            frequency: Self::default_frequency(),
            oe_pin: None,
        }
    }
}

#[derive(Clone, Debug, serde_derive::Deserialize, PartialEq)]
pub struct ActuatorConfig {
    /// Joint driven by this actuator.
    pub joint: String,
    /// PWM channel on the device.
    pub channel: u8,
    /// Pulse width at the lower joint bound, in microseconds.
    #[serde(default = "ActuatorConfig::default_min_pulse")]
    pub min_pulse: u16,
    /// Pulse width at the upper joint bound, in microseconds.
    #[serde(default = "ActuatorConfig::default_max_pulse")]
    pub max_pulse: u16,
    /// Swap the pulse direction across the joint range.
    #[serde(default)]
    pub reverse: bool,
}

impl ActuatorConfig {
    fn default_min_pulse() -> u16 {
        crate::consts::DEFAULT_MIN_PULSE
    }

    fn default_max_pulse() -> u16 {
        crate::consts::DEFAULT_MAX_PULSE
    }
}

#[derive(Clone, Debug, serde_derive::Deserialize, PartialEq, Eq)]
pub struct EstimatorConfig {
    /// Joint whose position is estimated.
    pub joint: String,
    /// Publish rate in hertz.
    #[serde(default = "EstimatorConfig::default_rate")]
    pub rate: u64,
    /// Maximum silence between publishes, in milliseconds.
    #[serde(default = "EstimatorConfig::default_max_silence")]
    pub max_silence: u64,
}

impl EstimatorConfig {
    fn default_rate() -> u64 {
        crate::consts::DEFAULT_PUBLISH_RATE
    }

    fn default_max_silence() -> u64 {
        crate::consts::DEFAULT_MAX_SILENCE
    }

    /// Tick period derived from the publish rate.
    pub fn publish_interval(&self) -> std::time::Duration {
        std::time::Duration::from_secs_f64(1.0 / self.rate.max(1) as f64)
    }
}

#[derive(Clone, Debug, Default, serde_derive::Deserialize, PartialEq, Eq)]
pub struct SimulationConfig {
    /// Enable simulation mode.
    #[serde(default)]
    pub enabled: bool,
}

/// Servod daemon configuration.
#[derive(Clone, Debug, serde_derive::Deserialize)]
pub struct Config {
    /// PWM device configuration.
    #[serde(default)]
    pub device: DeviceConfig,
    /// Joint definitions.
    #[serde(rename = "joint", default)]
    pub joints: Vec<Joint>,
    /// Actuator configuration, one per servo.
    #[serde(rename = "actuator", default)]
    pub actuators: Vec<ActuatorConfig>,
    /// Estimator configuration, one per tracked joint.
    #[serde(rename = "estimator", default)]
    pub estimators: Vec<EstimatorConfig>,
    /// Simulation configuration.
    #[serde(default)]
    pub simulation: SimulationConfig,
}

impl Config {
    /// Look up a joint by name.
    pub fn joint(&self, name: &str) -> Result<&Joint, ConfigError> {
        self.joints
            .iter()
            .find(|joint| joint.name == name)
            .ok_or_else(|| ConfigError::JointNotFound(name.to_owned()))
    }
}

#[derive(Debug)]
pub enum ConfigError {
    /// Configuration file could not be read.
    Read(std::io::Error),
    /// Configuration file could not be parsed.
    Parse(toml::de::Error),
    /// Referenced joint is not defined.
    JointNotFound(String),
    /// Joint type does not support bounded position control.
    UnsupportedJointType(String, crate::core::JointType),
    /// Joint has no limits object.
    MissingLimits(String),
    /// Joint limits lack a finite bound.
    MissingBound(String, &'static str),
    /// Joint limits are not a proper interval.
    InvalidLimits(String),
    /// Joint velocity limit is absent, zero or negative.
    InvalidVelocity(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Read(e) => write!(f, "read configuration: {}", e),
            ConfigError::Parse(e) => write!(f, "parse configuration: {}", e),
            ConfigError::JointNotFound(joint) => write!(f, "joint not found: {}", joint),
            ConfigError::UnsupportedJointType(joint, kind) => {
                write!(f, "joint {}: type {} has no position bounds", joint, kind)
            }
            ConfigError::MissingLimits(joint) => write!(f, "joint {}: no limits object", joint),
            ConfigError::MissingBound(joint, bound) => {
                write!(f, "joint {}: no finite {} bound", joint, bound)
            }
            ConfigError::InvalidLimits(joint) => {
                write!(f, "joint {}: lower bound is not below upper bound", joint)
            }
            ConfigError::InvalidVelocity(joint) => {
                write!(f, "joint {}: velocity limit must be positive", joint)
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Read(e) => Some(e),
            ConfigError::Parse(e) => Some(e),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONFIG: &str = r#"
        [device]
        bus = "/dev/i2c-3"
        oe_pin = 17

        [[joint]]
        name = "base"
        type = "revolute"
        limits = { lower = -1.0, upper = 1.0, velocity = 2.0 }

        [[actuator]]
        joint = "base"
        channel = 0

        [[estimator]]
        joint = "base"
    "#;

    #[test]
    fn parse_config() {
        let config: Config = toml::from_str(CONFIG).unwrap();

        assert_eq!(config.device.bus, "/dev/i2c-3");
        assert_eq!(config.device.address, 0x40);
        assert_eq!(config.device.frequency, 50);
        assert_eq!(config.device.oe_pin, Some(17));
        assert!(!config.simulation.enabled);

        let actuator = &config.actuators[0];
        assert_eq!(actuator.channel, 0);
        assert_eq!(actuator.min_pulse, 500);
        assert_eq!(actuator.max_pulse, 2_500);
        assert!(!actuator.reverse);

        let estimator = &config.estimators[0];
        assert_eq!(estimator.rate, 50);
        assert_eq!(estimator.max_silence, 5_000);
        assert_eq!(
            estimator.publish_interval(),
            std::time::Duration::from_millis(20)
        );
    }

    #[test]
    fn publish_interval_from_rate() {
        let estimator = EstimatorConfig {
            joint: "base".to_owned(),
            rate: 60,
            max_silence: 5_000,
        };

        // Rates that do not divide a second evenly keep their fractional period.
        assert_eq!(
            estimator.publish_interval(),
            std::time::Duration::from_nanos(16_666_667)
        );

        let estimator = EstimatorConfig {
            rate: 2_000,
            ..estimator
        };
        assert!(estimator.publish_interval() > std::time::Duration::ZERO);

        let estimator = EstimatorConfig {
            rate: 0,
            ..estimator
        };
        assert_eq!(
            estimator.publish_interval(),
            std::time::Duration::from_secs(1)
        );
    }

    #[test]
    fn joint_lookup() {
        let config: Config = toml::from_str(CONFIG).unwrap();

        assert!(config.joint("base").is_ok());
        assert!(matches!(
            config.joint("shoulder"),
            Err(ConfigError::JointNotFound(_))
        ));
    }
}
