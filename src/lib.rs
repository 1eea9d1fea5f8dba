pub mod macros;

pub mod batch;
pub mod chains;
pub mod codec;
pub mod config;
pub mod contract;
pub mod deposit;
pub mod error;
pub mod helpers;
pub mod indexer;
pub mod logger;
pub mod markers;
pub mod rpc;
pub mod submit;
