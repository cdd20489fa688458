/// Linear angle to pulse width map for one servo channel.
///
/// The joint range maps onto the pulse range; the reverse flag swaps the
/// pulse direction across the joint range.
#[derive(Copy, Clone, Debug)]
pub struct PulseMap {
    /// Lower joint bound in radians.
    lower: f32,
    /// Upper joint bound in radians.
    upper: f32,
    /// Pulse width at the lower bound, in microseconds.
    min_pulse: u16,
    /// Pulse width at the upper bound, in microseconds.
    max_pulse: u16,
    /// Swap the pulse direction.
    reverse: bool,
}

impl PulseMap {
    /// Constructor to create a new pulse map.
    pub fn new(lower: f32, upper: f32, min_pulse: u16, max_pulse: u16, reverse: bool) -> Self {
        Self {
            lower,
            upper,
            min_pulse,
            max_pulse,
            reverse,
        }
    }

    /// Saturate an angle to the joint bounds.
    pub fn clamp(&self, angle: f32) -> f32 {
        angle.clamp(self.lower, self.upper)
    }

    /// Center angle of the joint range.
    pub fn center(&self) -> f32 {
        (self.lower + self.upper) / 2.0
    }

    /// Map an angle to a pulse width, rounded to the nearest microsecond.
    pub fn pulse(&self, angle: f32) -> u16 {
        let normalized = (self.clamp(angle) - self.lower) / (self.upper - self.lower);
        let range = self.max_pulse as f32 - self.min_pulse as f32;

        let pulse = if self.reverse {
            self.max_pulse as f32 - normalized * range
        } else {
            self.min_pulse as f32 + normalized * range
        };

        pulse.round() as u16
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pulse_round_trip() {
        let map = PulseMap::new(-1.0, 1.0, 500, 2_500, false);

        assert_eq!(map.pulse(-1.0), 500);
        assert_eq!(map.pulse(0.0), 1_500);
        assert_eq!(map.pulse(1.0), 2_500);
    }

    #[test]
    fn pulse_reversed() {
        let map = PulseMap::new(-1.0, 1.0, 500, 2_500, true);

        assert_eq!(map.pulse(-1.0), 2_500);
        assert_eq!(map.pulse(1.0), 500);
    }

    #[test]
    fn clamp_saturates() {
        let map = PulseMap::new(-1.0, 1.0, 500, 2_500, false);

        assert_eq!(map.clamp(5.0), 1.0);
        assert_eq!(map.clamp(-5.0), -1.0);
        assert_eq!(map.pulse(5.0), map.pulse(1.0));
        assert_eq!(map.pulse(-5.0), map.pulse(-1.0));
    }

    #[test]
    fn center_angle() {
        let map = PulseMap::new(0.0, 3.0, 500, 2_500, false);

        assert_eq!(map.center(), 1.5);
        assert_eq!(map.pulse(map.center()), 1_500);
    }
}
