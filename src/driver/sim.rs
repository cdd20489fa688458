use std::sync::{Arc, Mutex};

use super::{DeviceError, PwmDevice};

#[derive(Default)]
struct SimState {
    /// Last pulse width written per channel.
    pulse: [Option<u16>; 16],
    /// Total number of accepted writes.
    writes: usize,
    /// Fail every write until cleared.
    fail_writes: bool,
    outputs_enabled: bool,
    oe_configured: bool,
}

/// Simulated PWM device.
///
/// Records the last pulse width per channel instead of touching hardware.
/// Used in simulation mode and by the service tests; clones share state so
/// a test can hold one clone for inspection while the services own another
/// through the shared device handle.
#[derive(Clone, Default)]
pub struct SimPwmDevice {
    state: Arc<Mutex<SimState>>,
}

impl SimPwmDevice {
    pub fn new() -> Self {
        log::debug!("Starting simulated PWM device");

        Self::default()
    }

    /// Simulated device with an output enable pin.
    pub fn with_output_enable() -> Self {
        let device = Self::new();
        device.state.lock().unwrap().oe_configured = true;
        device
    }

    /// Fail every subsequent write until cleared.
    pub fn fail_writes(&self, fail: bool) {
        self.state.lock().unwrap().fail_writes = fail;
    }

    /// Last pulse width written to a channel.
    pub fn last_pulse(&self, channel: u8) -> Option<u16> {
        self.state.lock().unwrap().pulse[channel as usize]
    }

    /// Total number of accepted writes.
    pub fn write_count(&self) -> usize {
        self.state.lock().unwrap().writes
    }

    pub fn outputs_enabled(&self) -> bool {
        self.state.lock().unwrap().outputs_enabled
    }
}

impl PwmDevice for SimPwmDevice {
    fn write_pulse(&mut self, channel: u8, microseconds: u16) -> Result<(), DeviceError> {
        if channel >= crate::consts::PWM_CHANNEL_COUNT {
            return Err(DeviceError::InvalidChannel(channel));
        }

        let mut state = self.state.lock().unwrap();

        if state.fail_writes {
            return Err(DeviceError::I2c("simulated write failure".to_owned()));
        }

        log::trace!("Channel {} pulse width: {}µs", channel, microseconds);

        state.pulse[channel as usize] = Some(microseconds);
        state.writes += 1;

        Ok(())
    }

    fn enable_outputs(&mut self) -> Result<(), DeviceError> {
        let mut state = self.state.lock().unwrap();

        if !state.oe_configured {
            return Err(DeviceError::NotConfigured);
        }

        state.outputs_enabled = true;
        Ok(())
    }

    fn disable_outputs(&mut self) -> Result<(), DeviceError> {
        let mut state = self.state.lock().unwrap();

        if !state.oe_configured {
            return Err(DeviceError::NotConfigured);
        }

        state.outputs_enabled = false;
        Ok(())
    }
}
