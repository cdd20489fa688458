pub use self::joint::{Joint, JointType, Limits, PositionLimits};
pub use self::trajectory::Trajectory;

mod joint;
mod trajectory;

/// How a position command reached the actuator.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum CommandType {
    /// Fire-and-forget mailbox message.
    Direct,
    /// Mailbox message with a synchronous acknowledgement.
    Acknowledged,
    /// Command topic subscription.
    Broadcast,
}

impl std::fmt::Display for CommandType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CommandType::Direct => write!(f, "direct"),
            CommandType::Acknowledged => write!(f, "acknowledged"),
            CommandType::Broadcast => write!(f, "broadcast"),
        }
    }
}

/// Position request for a single actuator.
#[derive(Copy, Clone, Debug)]
pub struct PositionCommand {
    /// Requested angle in radians.
    pub position: f32,
    /// Caller-supplied correlation id.
    pub correlation_id: Option<uuid::Uuid>,
}

impl std::fmt::Display for PositionCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Position: {:>6.2}rad", self.position)
    }
}

/// Announcement of an accepted position command.
///
/// Emitted by the actuator service after the pulse width was written to the
/// device. The expected arrival instant is derived from the travel distance
/// and the joint velocity limit.
#[derive(Copy, Clone, Debug)]
pub struct MotionBegin {
    /// Angle the actuator was at when the command was accepted.
    pub initial_position: f32,
    /// Clamped angle the actuator is moving towards.
    pub target_position: f32,
    /// Instant the motion should complete.
    pub expected_arrival: std::time::Instant,
    /// Delivery surface the command arrived on.
    pub command_type: CommandType,
    /// Correlation id carried over from the command, if any.
    pub correlation_id: Option<uuid::Uuid>,
}

impl std::fmt::Display for MotionBegin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Motion: {:>6.2}rad -> {:>6.2}rad via {}",
            self.initial_position, self.target_position, self.command_type
        )
    }
}

/// Estimated joint positions at a point in time.
#[derive(Clone, Debug)]
pub struct JointState {
    /// Joint name.
    pub name: String,
    /// Estimated positions in radians.
    pub positions: Vec<f32>,
    /// Wall clock time of the estimate.
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

impl JointState {
    pub fn new(name: String, positions: Vec<f32>) -> Self {
        Self {
            name,
            positions,
            timestamp: chrono::Utc::now(),
        }
    }
}

impl std::fmt::Display for JointState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Joint: {}; Position: {}",
            self.name,
            self.positions
                .iter()
                .map(|position| format!("{:>6.2}rad {:>7.2}°", position, position.to_degrees()))
                .collect::<String>()
        )
    }
}

/// Bus payload.
#[derive(Clone, Debug)]
pub enum Object {
    /// Position command for an actuator.
    Command(PositionCommand),
    /// Motion announcement from an actuator.
    Motion(MotionBegin),
    /// Estimated joint state.
    Joint(JointState),
}
