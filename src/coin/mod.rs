pub mod coin_trait;
pub mod monero;
