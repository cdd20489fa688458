use std::time::{Duration, Instant};

use tokio::sync::{broadcast, mpsc, oneshot};
use uuid::Uuid;

use crate::bus::{EventBus, Topic};
use crate::core::{CommandType, Joint, MotionBegin, Object};
use crate::driver::{DeviceError, SharedPwmDevice};
use crate::math::PulseMap;
use crate::ActuatorConfig;

/// Mailbox message for the actuator service.
pub enum ActuatorRequest {
    /// Position command with an optional acknowledgement channel.
    Position {
        position: f32,
        correlation_id: Option<Uuid>,
        reply: Option<oneshot::Sender<Result<(), DeviceError>>>,
    },
    /// Set the pulse width to zero, bypassing the command flow.
    Disarm,
}

#[derive(Debug)]
pub enum CommandError {
    /// Pulse dispatch failed; the command was dropped.
    Device(DeviceError),
    /// Actuator service is gone.
    Closed,
}

impl std::fmt::Display for CommandError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CommandError::Device(e) => write!(f, "{}", e),
            CommandError::Closed => write!(f, "actuator service closed"),
        }
    }
}

impl std::error::Error for CommandError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CommandError::Device(e) => Some(e),
            CommandError::Closed => None,
        }
    }
}

/// Single servo actuator.
///
/// Owns the committed angle and the pulse map for one PWM channel. Every
/// accepted command runs the same pipeline: clamp, convert, dispatch to
/// the device, announce the motion. A dispatch failure drops the command
/// without touching the committed angle and without announcing anything;
/// there are no retries.
pub struct Actuator {
    name: String,
    channel: u8,
    map: PulseMap,
    /// Joint velocity limit in radians per second.
    velocity_limit: f32,
    /// Last committed angle.
    current_angle: f32,
    device: SharedPwmDevice,
    bus: EventBus,
    motion_topic: Topic,
}

impl Actuator {
    /// Construct the actuator and dispatch the initial center pose.
    ///
    /// The center of the joint range is written to the device right away
    /// so the servo holds a known pose. No motion is announced for it;
    /// there is no previous position to interpolate from. A dispatch
    /// failure here is fatal.
    pub fn new(
        config: &ActuatorConfig,
        joint: &Joint,
        device: SharedPwmDevice,
        bus: EventBus,
    ) -> crate::runtime::Result<Self> {
        let limits = joint.position_limits()?;

        let map = PulseMap::new(
            limits.lower,
            limits.upper,
            config.min_pulse,
            config.max_pulse,
            config.reverse,
        );

        let center = map.center();

        device
            .lock()
            .unwrap()
            .write_pulse(config.channel, map.pulse(center))?;

        log::debug!(
            "Actuator {} initial pose: {:>6.2}rad on channel {}",
            joint.name,
            center,
            config.channel
        );

        Ok(Self {
            name: joint.name.clone(),
            channel: config.channel,
            map,
            velocity_limit: limits.velocity,
            current_angle: center,
            device,
            bus,
            motion_topic: Topic::motion(&joint.name),
        })
    }

    /// Last committed angle.
    pub fn current_angle(&self) -> f32 {
        self.current_angle
    }

    /// Accept a position command.
    ///
    /// Out-of-range requests saturate silently to the nearest joint bound.
    /// The expected arrival is derived from the travel distance and the
    /// joint velocity limit, rounded to whole milliseconds.
    pub fn submit(
        &mut self,
        position: f32,
        correlation_id: Option<Uuid>,
        command_type: CommandType,
    ) -> Result<(), DeviceError> {
        let target = self.map.clamp(position);
        let pulse = self.map.pulse(target);

        self.device.lock().unwrap().write_pulse(self.channel, pulse)?;

        let travel_ms =
            ((self.current_angle - target).abs() / self.velocity_limit * 1_000.0).round() as u64;

        let motion = MotionBegin {
            initial_position: self.current_angle,
            target_position: target,
            expected_arrival: Instant::now() + Duration::from_millis(travel_ms),
            command_type,
            correlation_id,
        };

        log::trace!("Actuator {}: {}", self.name, motion);

        self.bus.publish(&self.motion_topic, Object::Motion(motion));

        self.current_angle = target;

        Ok(())
    }

    /// Set the pulse width to zero, releasing the servo.
    ///
    /// Bypasses clamp and conversion and announces nothing.
    pub fn disarm(&mut self) -> Result<(), DeviceError> {
        self.device.lock().unwrap().write_pulse(self.channel, 0)
    }
}

/// Handle to a running actuator service.
#[derive(Clone)]
pub struct ActuatorHandle {
    command: mpsc::Sender<ActuatorRequest>,
}

impl ActuatorHandle {
    /// Send a position command without waiting for acceptance.
    pub async fn send_position(&self, position: f32, correlation_id: Option<Uuid>) {
        self.command
            .send(ActuatorRequest::Position {
                position,
                correlation_id,
                reply: None,
            })
            .await
            .ok();
    }

    /// Send a position command and wait for the dispatch result.
    pub async fn command_position(
        &self,
        position: f32,
        correlation_id: Option<Uuid>,
    ) -> Result<(), CommandError> {
        let (reply, result) = oneshot::channel();

        self.command
            .send(ActuatorRequest::Position {
                position,
                correlation_id,
                reply: Some(reply),
            })
            .await
            .map_err(|_| CommandError::Closed)?;

        result
            .await
            .map_err(|_| CommandError::Closed)?
            .map_err(CommandError::Device)
    }

    /// Release the servo.
    pub async fn disarm(&self) {
        self.command.send(ActuatorRequest::Disarm).await.ok();
    }
}

/// Actuator service task.
///
/// Commands arrive over the mailbox or over the actuator's command topic;
/// all surfaces run the same submit pipeline. Messages are processed one
/// at a time in arrival order.
pub struct ActuatorService {
    actuator: Actuator,
    mailbox: mpsc::Receiver<ActuatorRequest>,
    commands: broadcast::Receiver<Object>,
}

impl ActuatorService {
    pub fn new(
        config: &ActuatorConfig,
        joint: &Joint,
        device: SharedPwmDevice,
        bus: &EventBus,
    ) -> crate::runtime::Result<(Self, ActuatorHandle)> {
        let commands = bus.subscribe(&Topic::command(&joint.name));

        let actuator = Actuator::new(config, joint, device, bus.clone())?;

        let (sender, mailbox) = mpsc::channel(crate::consts::QUEUE_SIZE_COMMAND);

        Ok((
            Self {
                actuator,
                mailbox,
                commands,
            },
            ActuatorHandle { command: sender },
        ))
    }

    fn handle_submit(
        &mut self,
        position: f32,
        correlation_id: Option<Uuid>,
        command_type: CommandType,
    ) -> Result<(), DeviceError> {
        let result = self.actuator.submit(position, correlation_id, command_type);

        if let Err(ref e) = result {
            log::warn!("Actuator {}: command dropped: {}", self.actuator.name, e);
        }

        result
    }

    pub async fn run(mut self, mut shutdown: broadcast::Receiver<()>) {
        log::debug!("Starting actuator service: {}", self.actuator.name);

        let mut mailbox_open = true;

        loop {
            tokio::select! {
                request = self.mailbox.recv(), if mailbox_open => match request {
                    Some(ActuatorRequest::Position { position, correlation_id, reply }) => {
                        let command_type = if reply.is_some() {
                            CommandType::Acknowledged
                        } else {
                            CommandType::Direct
                        };

                        let result = self.handle_submit(position, correlation_id, command_type);

                        if let Some(reply) = reply {
                            reply.send(result).ok();
                        }
                    }
                    Some(ActuatorRequest::Disarm) => {
                        if let Err(e) = self.actuator.disarm() {
                            log::warn!("Actuator {}: disarm failed: {}", self.actuator.name, e);
                        }
                    }
                    None => mailbox_open = false,
                },
                object = self.commands.recv() => match object {
                    Ok(Object::Command(command)) => {
                        let _ = self.handle_submit(
                            command.position,
                            command.correlation_id,
                            CommandType::Broadcast,
                        );
                    }
                    Ok(_) => {}
                    Err(broadcast::error::RecvError::Lagged(count)) => {
                        log::warn!(
                            "Actuator {}: dropped {} commands",
                            self.actuator.name,
                            count
                        );
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                },
                _ = shutdown.recv() => break,
            }
        }

        if let Err(e) = self.actuator.disarm() {
            log::warn!("Actuator {}: disarm failed: {}", self.actuator.name, e);
        } else {
            log::debug!("Actuator {} disarmed", self.actuator.name);
        }
    }
}
