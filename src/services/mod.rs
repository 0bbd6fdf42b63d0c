pub mod classifier;
pub mod client;
pub mod collection;
pub mod preview;
pub mod progress;
