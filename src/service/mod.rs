pub use actuator::{Actuator, ActuatorHandle, ActuatorRequest, ActuatorService, CommandError};
pub use estimator::{Estimator, EstimatorService};

mod actuator;
mod estimator;
