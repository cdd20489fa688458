use crate::ConfigError;

#[derive(Copy, Clone, Debug, PartialEq, Eq, serde_derive::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JointType {
    /// Rotational joint with finite bounds.
    Revolute,
    /// Linear joint with finite bounds.
    Prismatic,
    /// Rotational joint without bounds.
    Continuous,
    /// Rigid joint.
    Fixed,
}

impl std::fmt::Display for JointType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JointType::Revolute => write!(f, "revolute"),
            JointType::Prismatic => write!(f, "prismatic"),
            JointType::Continuous => write!(f, "continuous"),
            JointType::Fixed => write!(f, "fixed"),
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, serde_derive::Deserialize)]
pub struct Limits {
    /// Lower position bound in radians.
    pub lower: Option<f32>,
    /// Upper position bound in radians.
    pub upper: Option<f32>,
    /// Velocity limit in radians per second.
    pub velocity: Option<f32>,
}

#[derive(Clone, Debug, serde_derive::Deserialize)]
pub struct Joint {
    /// Joint name.
    pub name: String,
    /// Joint type.
    #[serde(rename = "type")]
    pub joint_type: JointType,
    /// Joint limits.
    pub limits: Option<Limits>,
}

/// Validated position limits for bounded position control.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct PositionLimits {
    pub lower: f32,
    pub upper: f32,
    pub velocity: f32,
}

impl Joint {
    /// Resolve the joint limits for bounded position control.
    ///
    /// Position control requires a revolute or prismatic joint with finite
    /// lower and upper bounds and a positive velocity limit. Every missing
    /// or invalid field is a distinct configuration error, raised here once
    /// at service construction.
    pub fn position_limits(&self) -> Result<PositionLimits, ConfigError> {
        match self.joint_type {
            JointType::Revolute | JointType::Prismatic => {}
            joint_type => {
                return Err(ConfigError::UnsupportedJointType(
                    self.name.clone(),
                    joint_type,
                ))
            }
        }

        let limits = self
            .limits
            .ok_or_else(|| ConfigError::MissingLimits(self.name.clone()))?;

        let lower = limits
            .lower
            .filter(|bound| bound.is_finite())
            .ok_or_else(|| ConfigError::MissingBound(self.name.clone(), "lower"))?;
        let upper = limits
            .upper
            .filter(|bound| bound.is_finite())
            .ok_or_else(|| ConfigError::MissingBound(self.name.clone(), "upper"))?;

        if lower >= upper {
            return Err(ConfigError::InvalidLimits(self.name.clone()));
        }

        let velocity = limits
            .velocity
            .filter(|velocity| velocity.is_finite() && *velocity > 0.0)
            .ok_or_else(|| ConfigError::InvalidVelocity(self.name.clone()))?;

        Ok(PositionLimits {
            lower,
            upper,
            velocity,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn joint(joint_type: JointType, limits: Option<Limits>) -> Joint {
        Joint {
            name: "base".to_owned(),
            joint_type,
            limits,
        }
    }

    #[test]
    fn bounded_position_joint() {
        let joint = joint(
            JointType::Revolute,
            Some(Limits {
                lower: Some(-1.0),
                upper: Some(1.0),
                velocity: Some(2.0),
            }),
        );

        let limits = joint.position_limits().unwrap();
        assert_eq!(limits.lower, -1.0);
        assert_eq!(limits.upper, 1.0);
        assert_eq!(limits.velocity, 2.0);
    }

    #[test]
    fn fixed_joint_rejected() {
        let joint = joint(JointType::Fixed, None);

        assert!(matches!(
            joint.position_limits(),
            Err(ConfigError::UnsupportedJointType(_, JointType::Fixed))
        ));
    }

    #[test]
    fn missing_limits_rejected() {
        let joint = joint(JointType::Revolute, None);

        assert!(matches!(
            joint.position_limits(),
            Err(ConfigError::MissingLimits(_))
        ));
    }

    #[test]
    fn missing_bound_rejected() {
        let joint = joint(
            JointType::Revolute,
            Some(Limits {
                lower: Some(-1.0),
                upper: None,
                velocity: Some(2.0),
            }),
        );

        assert!(matches!(
            joint.position_limits(),
            Err(ConfigError::MissingBound(_, "upper"))
        ));
    }

    #[test]
    fn infinite_bound_rejected() {
        let joint = joint(
            JointType::Revolute,
            Some(Limits {
                lower: Some(f32::NEG_INFINITY),
                upper: Some(1.0),
                velocity: Some(2.0),
            }),
        );

        assert!(matches!(
            joint.position_limits(),
            Err(ConfigError::MissingBound(_, "lower"))
        ));
    }

    #[test]
    fn zero_velocity_rejected() {
        let joint = joint(
            JointType::Revolute,
            Some(Limits {
                lower: Some(-1.0),
                upper: Some(1.0),
                velocity: Some(0.0),
            }),
        );

        assert!(matches!(
            joint.position_limits(),
            Err(ConfigError::InvalidVelocity(_))
        ));
    }
}
