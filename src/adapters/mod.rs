// Adapters layer: concrete implementations of the domain ports.

pub mod hosts;
pub mod network;

pub use hosts::HostsFile;
pub use network::SystemNetwork;
