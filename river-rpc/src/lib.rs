//! River RPC
//!
//! Client side of the node `StreamService`:
//! - `service`: the RPC trait and its tonic implementation (binary or JSON wire)
//! - `client`: retry, request logging and call histogram around a service
//! - `config`: retry parameters, node url selection, wire format flag

pub mod client;
pub mod codec;
pub mod config;
pub mod error;
pub mod retry;
pub mod service;
pub mod telemetry;

pub use client::{OnTokenExpired, StreamRpcClient};
pub use config::{select_node_url, RetryParams, TransportConfig, WireFormat};
pub use error::RpcError;
pub use retry::RefreshNodeUrl;
pub use service::{GrpcStreamService, StreamService, SyncStreamsStream};
pub use telemetry::{CallHistogram, CallStats};
