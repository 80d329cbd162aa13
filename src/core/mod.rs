pub mod aggregator;
pub mod checker;
pub mod guard;
pub mod probe;
pub mod source;

pub use crate::domain::model::{HostResult, Outcome, PortResult, ProbeResult, Record};
pub use crate::domain::ports::NetworkProbe;
pub use crate::utils::error::Result;
