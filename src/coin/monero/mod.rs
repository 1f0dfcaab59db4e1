pub mod client;
pub mod daemon;
pub mod model;
