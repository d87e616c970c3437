//! Optional read-only REST API (`rest-api` feature): health check plus
//! list/get over the two reconciled CRDs, for dashboards and humans who
//! don't want to shell out to `kubectl` for a quick status check.

pub mod dto;
mod handlers;
pub mod server;

pub use server::run_server;
