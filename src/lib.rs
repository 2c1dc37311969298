pub mod audit;
pub mod broadcast;
pub mod config;
pub mod error;
pub mod ledger;
pub mod protocol;
pub mod scheduler;
pub mod server;
pub mod session;
pub mod state;
pub mod types;
