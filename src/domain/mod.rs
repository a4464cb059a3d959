// Domain layer: process model and the ports the provider depends on.

pub mod model;
pub mod ports;
