//! Delivery layer: the network servers that expose the core tracker.
pub mod rpc;
pub mod signals;
