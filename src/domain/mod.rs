// Domain layer: probe models and the network port. Concrete network code lives in adapters.

pub mod model;
pub mod ports;
