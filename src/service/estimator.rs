use std::time::{Duration, Instant};

use tokio::sync::broadcast;

use crate::bus::{EventBus, Topic};
use crate::core::{JointState, MotionBegin, Object, Trajectory};
use crate::EstimatorConfig;

/// Open-loop position estimator for one joint.
///
/// Holds the trajectory of the last announced motion and a publish gate.
/// The gate passes an estimate through when it differs from the last
/// published value or when the maximum silence elapsed, whichever comes
/// first. The change test is exact float inequality; during continuous
/// motion every tick differs and passes. A tolerance could become a
/// configuration knob, for now subscribers are expected to handle
/// tick-rate updates.
pub struct Estimator {
    trajectory: Option<Trajectory>,
    /// Last position value that passed the gate.
    last_published: Option<f32>,
    /// When the last value passed the gate.
    last_publish_time: Option<Instant>,
    /// Maximum allowed gap between publishes.
    max_silence: Duration,
}

impl Estimator {
    pub fn new(max_silence: Duration) -> Self {
        Self {
            trajectory: None,
            last_published: None,
            last_publish_time: None,
            max_silence,
        }
    }

    /// Record a motion announcement.
    ///
    /// The new trajectory fully supersedes the current one. Interpolation
    /// restarts from the superseded target, or from the new target when no
    /// trajectory existed yet.
    pub fn record(&mut self, motion: &MotionBegin, now: Instant) {
        self.trajectory = Some(match &self.trajectory {
            Some(trajectory) => {
                trajectory.replace(motion.target_position, now, motion.expected_arrival)
            }
            None => Trajectory::new(motion.target_position, now, motion.expected_arrival),
        });
    }

    /// Estimate the position at the given instant, if a trajectory exists.
    pub fn estimate(&self, now: Instant) -> Option<f32> {
        self.trajectory
            .as_ref()
            .map(|trajectory| trajectory.estimate(now))
    }

    /// Run the publish gate for one tick.
    ///
    /// Returns the position to publish, or nothing when the gate holds it
    /// back. The gate state only advances on a passed value.
    pub fn tick(&mut self, now: Instant) -> Option<f32> {
        let position = self.estimate(now)?;

        let changed = Some(position) != self.last_published;
        let stale = self
            .last_publish_time
            .is_some_and(|last| now.duration_since(last) >= self.max_silence);

        if changed || stale {
            self.last_published = Some(position);
            self.last_publish_time = Some(now);

            Some(position)
        } else {
            None
        }
    }
}

/// Estimator service task.
///
/// Subscribes to the actuator's motion topic and publishes gated joint
/// state estimates at a fixed rate. The next tick is scheduled one period
/// after the previous one fired; drift across ticks is acceptable.
pub struct EstimatorService {
    name: String,
    estimator: Estimator,
    publish_interval: Duration,
    motion: broadcast::Receiver<Object>,
    bus: EventBus,
    state_topic: Topic,
}

impl EstimatorService {
    pub fn new(config: &EstimatorConfig, bus: &EventBus) -> Self {
        let motion = bus.subscribe(&Topic::motion(&config.joint));

        Self {
            name: config.joint.clone(),
            estimator: Estimator::new(Duration::from_millis(config.max_silence)),
            publish_interval: config.publish_interval(),
            motion,
            bus: bus.clone(),
            state_topic: Topic::joint_state(&config.joint),
        }
    }

    fn tick(&mut self) {
        if let Some(position) = self.estimator.tick(Instant::now()) {
            let state = JointState::new(self.name.clone(), vec![position]);

            log::trace!("{}", state);

            self.bus.publish(&self.state_topic, Object::Joint(state));
        }
    }

    pub async fn run(mut self, mut shutdown: broadcast::Receiver<()>) {
        log::debug!("Starting estimator service: {}", self.name);

        let mut next_tick = Instant::now() + self.publish_interval;

        loop {
            tokio::select! {
                _ = tokio::time::sleep_until(tokio::time::Instant::from_std(next_tick)) => {
                    self.tick();

                    next_tick = Instant::now() + self.publish_interval;
                }
                object = self.motion.recv() => match object {
                    Ok(Object::Motion(motion)) => {
                        self.estimator.record(&motion, Instant::now());
                    }
                    Ok(_) => {}
                    Err(broadcast::error::RecvError::Lagged(count)) => {
                        log::warn!("Estimator {}: dropped {} motion events", self.name, count);
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                },
                _ = shutdown.recv() => break,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::core::CommandType;

    fn motion(target: f32, command_time: Instant, travel: Duration) -> MotionBegin {
        MotionBegin {
            initial_position: 0.0,
            target_position: target,
            expected_arrival: command_time + travel,
            command_type: CommandType::Direct,
            correlation_id: None,
        }
    }

    #[test]
    fn no_trajectory_no_publish() {
        let mut estimator = Estimator::new(Duration::from_millis(5_000));

        let t0 = Instant::now();
        assert_eq!(estimator.tick(t0), None);
        assert_eq!(estimator.tick(t0 + Duration::from_millis(20)), None);
    }

    #[test]
    fn gate_suppresses_unchanged_position() {
        let mut estimator = Estimator::new(Duration::from_millis(5_000));

        let t0 = Instant::now();
        estimator.record(&motion(1.0, t0, Duration::ZERO), t0);

        // Already arrived; the value never changes after the first publish.
        assert_eq!(estimator.tick(t0 + Duration::from_millis(20)), Some(1.0));
        assert_eq!(estimator.tick(t0 + Duration::from_millis(40)), None);
        assert_eq!(estimator.tick(t0 + Duration::from_millis(60)), None);
    }

    #[test]
    fn gate_passes_heartbeat_after_max_silence() {
        let mut estimator = Estimator::new(Duration::from_millis(10));

        let t0 = Instant::now();
        estimator.record(&motion(1.0, t0, Duration::ZERO), t0);

        assert_eq!(estimator.tick(t0), Some(1.0));
        assert_eq!(estimator.tick(t0 + Duration::from_millis(5)), None);
        assert_eq!(estimator.tick(t0 + Duration::from_millis(12)), Some(1.0));
    }

    #[test]
    fn gate_passes_every_change() {
        let mut estimator = Estimator::new(Duration::from_millis(5_000));

        let t0 = Instant::now();
        estimator.record(&motion(1.0, t0, Duration::from_millis(1_000)), t0);

        // In-flight interpolation differs on every tick.
        let first = estimator.tick(t0 + Duration::from_millis(20)).unwrap();
        let second = estimator.tick(t0 + Duration::from_millis(40)).unwrap();

        assert!(first < second);
        assert!(second < 1.0);
    }

    #[test]
    fn replacement_restarts_from_old_target() {
        let mut estimator = Estimator::new(Duration::from_millis(5_000));

        let t0 = Instant::now();
        estimator.record(&motion(1.0, t0, Duration::from_millis(1_000)), t0);

        // Halfway through, a new command supersedes the motion. The new
        // interpolation starts from the old target, not from the estimate.
        let t1 = t0 + Duration::from_millis(500);
        estimator.record(&motion(-1.0, t1, Duration::from_millis(1_000)), t1);

        assert_eq!(estimator.estimate(t1), Some(1.0));
    }

    #[tokio::test]
    async fn service_publishes_joint_state() {
        let bus = EventBus::new();

        let config = EstimatorConfig {
            joint: "base".to_owned(),
            rate: 100,
            max_silence: 5_000,
        };

        let service = EstimatorService::new(&config, &bus);
        let mut state = bus.subscribe(&Topic::joint_state("base"));

        let (_shutdown, shutdown_rx) = broadcast::channel(1);
        tokio::spawn(service.run(shutdown_rx));

        let now = Instant::now();
        bus.publish(
            &Topic::motion("base"),
            Object::Motion(MotionBegin {
                initial_position: 0.0,
                target_position: 1.0,
                expected_arrival: now + Duration::from_millis(50),
                command_type: CommandType::Direct,
                correlation_id: None,
            }),
        );

        let object = tokio::time::timeout(Duration::from_millis(500), state.recv())
            .await
            .expect("no joint state within timeout")
            .unwrap();

        match object {
            Object::Joint(state) => {
                assert_eq!(state.name, "base");
                assert_eq!(state.positions.len(), 1);
            }
            object => panic!("unexpected object: {:?}", object),
        }
    }
}
