// Domain layer: tutor models and the ports to external services.

pub mod model;
pub mod ports;
