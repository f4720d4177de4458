// Domain layer: stream value types and the traits the core and app layers plug into.

pub mod model;
pub mod ports;
