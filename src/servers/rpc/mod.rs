//! The tracker RPC server.
//!
//! Requests and responses travel over TCP, one request per connection. The
//! framing is deliberately minimal: a request is a single line of
//! tab-separated fields (method name first, parameters in contract order),
//! and a response is a single line of tab-separated strings whose first
//! element is the outcome tag. The contract (operations, parameter order,
//! response shapes and tags) lives in [`wire`]; the framing itself is an
//! implementation detail the contract does not depend on.
pub mod launcher;
pub mod processor;
pub mod validation;
pub mod wire;

/// Log target for the tracker RPC server.
pub const RPC_LOG_TARGET: &str = "RPC TRACKER";
