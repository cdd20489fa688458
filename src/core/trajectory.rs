use std::time::Instant;

/// One interpolation span of a commanded motion.
///
/// The trajectory is replaced wholesale on every motion announcement. The
/// newest command fully supersedes an in-flight interpolation; the previous
/// target becomes the new interpolation start, never the instantaneous
/// interpolated value.
#[derive(Copy, Clone, Debug)]
pub struct Trajectory {
    /// Interpolation start angle.
    pub previous_position: f32,
    /// Interpolation end angle.
    pub target_position: f32,
    /// Instant the command was recorded.
    pub command_time: Instant,
    /// Instant the motion should complete.
    pub expected_arrival: Instant,
}

impl Trajectory {
    /// First trajectory, starting already arrived at the target.
    pub fn new(target_position: f32, command_time: Instant, expected_arrival: Instant) -> Self {
        Self {
            previous_position: target_position,
            target_position,
            command_time,
            expected_arrival,
        }
    }

    /// Supersede this trajectory with a new target.
    ///
    /// Interpolation restarts from the old target, even if the old motion
    /// had not nominally arrived yet.
    pub fn replace(
        &self,
        target_position: f32,
        command_time: Instant,
        expected_arrival: Instant,
    ) -> Self {
        Self {
            previous_position: self.target_position,
            target_position,
            command_time,
            expected_arrival,
        }
    }

    /// Estimate the position at the given instant.
    ///
    /// At or after the expected arrival the target is returned exactly,
    /// which keeps the signal free of floating point drift once the motion
    /// nominally completed. A zero or negative span is treated as an
    /// instantaneous move. Progress is not clamped; an instant before the
    /// command time extrapolates backward past the interpolation start.
    pub fn estimate(&self, now: Instant) -> f32 {
        if now >= self.expected_arrival {
            return self.target_position;
        }

        let span = match self.expected_arrival.checked_duration_since(self.command_time) {
            Some(span) if !span.is_zero() => span.as_secs_f32(),
            _ => return self.target_position,
        };

        let elapsed = match now.checked_duration_since(self.command_time) {
            Some(elapsed) => elapsed.as_secs_f32(),
            None => -self.command_time.duration_since(now).as_secs_f32(),
        };

        let progress = elapsed / span;

        self.previous_position + progress * (self.target_position - self.previous_position)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::time::Duration;

    #[test]
    fn estimate_within_span() {
        let t0 = Instant::now();
        let trajectory = Trajectory {
            previous_position: 0.0,
            target_position: 1.0,
            command_time: t0,
            expected_arrival: t0 + Duration::from_millis(1_000),
        };

        let estimate = trajectory.estimate(t0 + Duration::from_millis(100));

        assert!(estimate > 0.0 && estimate < 1.0);

        let tolerance = 0.001;
        assert!((estimate - 0.1).abs() < tolerance);
    }

    #[test]
    fn estimate_at_arrival_is_exact() {
        let t0 = Instant::now();
        let trajectory = Trajectory {
            previous_position: 0.0,
            target_position: 1.0,
            command_time: t0,
            expected_arrival: t0 + Duration::from_millis(1_000),
        };

        assert_eq!(trajectory.estimate(t0 + Duration::from_millis(1_000)), 1.0);
        assert_eq!(trajectory.estimate(t0 + Duration::from_millis(5_000)), 1.0);
    }

    #[test]
    fn degenerate_span_is_instantaneous() {
        let t0 = Instant::now();
        let trajectory = Trajectory {
            previous_position: 0.0,
            target_position: 1.0,
            command_time: t0,
            expected_arrival: t0,
        };

        assert_eq!(trajectory.estimate(t0), 1.0);
    }

    #[test]
    fn first_trajectory_starts_arrived() {
        let t0 = Instant::now();
        let trajectory = Trajectory::new(0.5, t0, t0 + Duration::from_millis(1_000));

        assert_eq!(trajectory.estimate(t0 + Duration::from_millis(100)), 0.5);
    }

    #[test]
    fn replace_restarts_from_old_target() {
        let t0 = Instant::now();
        let trajectory = Trajectory {
            previous_position: 0.0,
            target_position: 1.0,
            command_time: t0,
            expected_arrival: t0 + Duration::from_millis(1_000),
        };

        // Halfway through the motion the interpolated value is near 0.5,
        // but the superseding trajectory starts from the old target.
        let t1 = t0 + Duration::from_millis(500);
        let trajectory = trajectory.replace(-1.0, t1, t1 + Duration::from_millis(1_000));

        assert_eq!(trajectory.previous_position, 1.0);
        assert_eq!(trajectory.target_position, -1.0);
        assert_eq!(trajectory.estimate(t1), 1.0);
    }

    #[test]
    fn estimate_before_command_time_extrapolates() {
        let now = Instant::now();
        let trajectory = Trajectory {
            previous_position: 0.0,
            target_position: 1.0,
            command_time: now + Duration::from_millis(500),
            expected_arrival: now + Duration::from_millis(1_500),
        };

        // Progress is deliberately unclamped: a command time in the future
        // extrapolates backward past the interpolation start.
        let estimate = trajectory.estimate(now);

        let tolerance = 0.001;
        assert!((estimate + 0.5).abs() < tolerance);
    }
}
