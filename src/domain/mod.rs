// Domain layer: rows, mapping definitions and the ports the pipeline is built on.

pub mod mapping;
pub mod model;
pub mod ports;
