/**
* filename : lib
* author : HAMA
* date: 2025. 4. 6.
* description: Monero daemon RPC adapter. Wire records from monerod are mapped
*              into typed blocks, transactions and outputs.
**/
pub mod coin;
pub mod config;
pub mod fetcher;
pub mod mapper;
pub mod merge;
pub mod reconcile;
pub mod router;
pub mod shutdown;
pub mod tasks;
pub mod types;
pub mod unpack;
pub mod utils;

pub use coin::coin_trait::{BinaryCodec, DaemonTransport};
pub use coin::monero::client::HttpTransport;
pub use coin::monero::daemon::MoneroDaemon;
pub use types::{DaemonError, Result, WireRecord};
