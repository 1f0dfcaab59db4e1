pub mod runner;
pub mod fetcher;
pub mod monero_fetcher;
