use linux_embedded_hal::sysfs_gpio::{Direction, Pin};
use linux_embedded_hal::I2cdev;
use pwm_pca9685::{Address, Channel, Pca9685};

use crate::DeviceConfig;

use super::{DeviceError, PwmDevice};

/// Internal oscillator frequency of the PCA9685, in hertz.
const OSCILLATOR_HZ: f32 = 25_000_000.0;

/// Lowest PWM frequency the prescale register can express, in hertz.
const FREQUENCY_HZ_MIN: u16 = 24;
/// Highest PWM frequency the prescale register can express, in hertz.
const FREQUENCY_HZ_MAX: u16 = 1_526;

/// PCA9685 16-channel PWM chip on a Linux I2C bus.
///
/// The optional output enable pin is active low: driving it low enables
/// all channel outputs.
pub struct Pca9685Device {
    pwm: Pca9685<I2cdev>,
    /// PWM frequency in hertz.
    frequency: u16,
    oe_pin: Option<Pin>,
}

impl Pca9685Device {
    /// Open the chip and bring it out of sleep at the configured frequency.
    ///
    /// When an output enable pin is configured it is exported, set to
    /// output and driven low, enabling the channel outputs.
    pub fn open(config: &DeviceConfig) -> Result<Self, DeviceError> {
        log::debug!(
            "Opening PCA9685 on {} at 0x{:X?}, {}Hz",
            config.bus,
            config.address,
            config.frequency
        );

        let prescale = prescale(config.frequency)?;

        let i2c = I2cdev::new(&config.bus).map_err(|e| DeviceError::I2c(e.to_string()))?;

        let mut pwm = Pca9685::new(i2c, Address::from(config.address)).map_err(pwm_error)?;

        pwm.set_prescale(prescale).map_err(pwm_error)?;
        pwm.enable().map_err(pwm_error)?;

        let oe_pin = match config.oe_pin {
            Some(number) => {
                let pin = Pin::new(number);
                pin.export().map_err(gpio_error)?;
                pin.set_direction(Direction::Out).map_err(gpio_error)?;
                pin.set_value(0).map_err(gpio_error)?;
                Some(pin)
            }
            None => None,
        };

        Ok(Self {
            pwm,
            frequency: config.frequency,
            oe_pin,
        })
    }

    /// Pulse width in microseconds to a 12-bit off count at the device frequency.
    fn counts(&self, microseconds: u16) -> u16 {
        let period_us = 1_000_000.0 / self.frequency as f32;

        ((microseconds as f32 / period_us) * 4_096.0).round() as u16
    }
}

impl PwmDevice for Pca9685Device {
    fn write_pulse(&mut self, channel: u8, microseconds: u16) -> Result<(), DeviceError> {
        let channel = pwm_channel(channel)?;

        if microseconds == 0 {
            return self.pwm.set_channel_full_off(channel).map_err(pwm_error);
        }

        self.pwm.set_channel_on(channel, 0).map_err(pwm_error)?;
        self.pwm
            .set_channel_off(channel, self.counts(microseconds))
            .map_err(pwm_error)
    }

    fn enable_outputs(&mut self) -> Result<(), DeviceError> {
        match &self.oe_pin {
            Some(pin) => pin.set_value(0).map_err(gpio_error),
            None => Err(DeviceError::NotConfigured),
        }
    }

    fn disable_outputs(&mut self) -> Result<(), DeviceError> {
        match &self.oe_pin {
            Some(pin) => pin.set_value(1).map_err(gpio_error),
            None => Err(DeviceError::NotConfigured),
        }
    }
}

/// Prescale register value for a PWM frequency.
///
/// The register only covers 24Hz through 1526Hz; anything outside that
/// range is rejected before the chip is touched.
fn prescale(frequency: u16) -> Result<u8, DeviceError> {
    if !(FREQUENCY_HZ_MIN..=FREQUENCY_HZ_MAX).contains(&frequency) {
        return Err(DeviceError::InvalidFrequency(frequency));
    }

    Ok((OSCILLATOR_HZ / (4_096.0 * frequency as f32)).round() as u8 - 1)
}

fn pwm_channel(channel: u8) -> Result<Channel, DeviceError> {
    match channel {
        0 => Ok(Channel::C0),
        1 => Ok(Channel::C1),
        2 => Ok(Channel::C2),
        3 => Ok(Channel::C3),
        4 => Ok(Channel::C4),
        5 => Ok(Channel::C5),
        6 => Ok(Channel::C6),
        7 => Ok(Channel::C7),
        8 => Ok(Channel::C8),
        9 => Ok(Channel::C9),
        10 => Ok(Channel::C10),
        11 => Ok(Channel::C11),
        12 => Ok(Channel::C12),
        13 => Ok(Channel::C13),
        14 => Ok(Channel::C14),
        15 => Ok(Channel::C15),
        channel => Err(DeviceError::InvalidChannel(channel)),
    }
}

fn pwm_error<E: std::fmt::Debug>(error: pwm_pca9685::Error<E>) -> DeviceError {
    match error {
        pwm_pca9685::Error::I2C(e) => DeviceError::I2c(format!("{:?}", e)),
        pwm_pca9685::Error::InvalidInputData => DeviceError::I2c("invalid input data".to_owned()),
    }
}

fn gpio_error(error: linux_embedded_hal::sysfs_gpio::Error) -> DeviceError {
    DeviceError::Gpio(error.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prescale_from_frequency() {
        assert_eq!(prescale(50).unwrap(), 121);
        assert_eq!(prescale(FREQUENCY_HZ_MIN).unwrap(), 253);
        assert_eq!(prescale(FREQUENCY_HZ_MAX).unwrap(), 3);
    }

    #[test]
    fn prescale_rejects_out_of_range_frequency() {
        assert_eq!(prescale(0), Err(DeviceError::InvalidFrequency(0)));
        assert_eq!(prescale(23), Err(DeviceError::InvalidFrequency(23)));
        assert_eq!(prescale(1_527), Err(DeviceError::InvalidFrequency(1_527)));
        assert_eq!(prescale(12_208), Err(DeviceError::InvalidFrequency(12_208)));
    }
}
