pub use self::pca9685::Pca9685Device;
pub use self::sim::SimPwmDevice;

mod pca9685;
mod sim;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceError {
    /// I2C transaction failed.
    I2c(String),
    /// Output enable GPIO operation failed.
    Gpio(String),
    /// Channel outside the device range.
    InvalidChannel(u8),
    /// PWM frequency outside the device range.
    InvalidFrequency(u16),
    /// No output enable pin configured.
    NotConfigured,
}

impl std::fmt::Display for DeviceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DeviceError::I2c(e) => write!(f, "I2C error: {}", e),
            DeviceError::Gpio(e) => write!(f, "GPIO error: {}", e),
            DeviceError::InvalidChannel(channel) => write!(f, "invalid channel: {}", channel),
            DeviceError::InvalidFrequency(frequency) => {
                write!(f, "unsupported PWM frequency: {}Hz", frequency)
            }
            DeviceError::NotConfigured => write!(f, "output enable pin not configured"),
        }
    }
}

impl std::error::Error for DeviceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        None
    }
}

/// PWM device contract.
///
/// One device carries up to sixteen channels. Writes are independent and
/// idempotent per channel; callers sharing a device serialize access
/// through the shared handle.
pub trait PwmDevice {
    /// Write a pulse width in microseconds to a channel.
    ///
    /// A width of zero turns the channel fully off.
    fn write_pulse(&mut self, channel: u8, microseconds: u16) -> Result<(), DeviceError>;

    /// Drive the output enable pin to enable all channel outputs.
    fn enable_outputs(&mut self) -> Result<(), DeviceError>;

    /// Drive the output enable pin to disable all channel outputs.
    fn disable_outputs(&mut self) -> Result<(), DeviceError>;
}

/// Shared handle to a PWM device.
///
/// Multiple actuator services may address different channels of one chip;
/// the mutex serializes their writes.
pub type SharedPwmDevice = std::sync::Arc<std::sync::Mutex<dyn PwmDevice + Send>>;

/// Wrap a device into a shared handle.
pub fn shared<T: PwmDevice + Send + 'static>(device: T) -> SharedPwmDevice {
    std::sync::Arc::new(std::sync::Mutex::new(device))
}
