pub mod config;
pub mod history;
pub mod matcher;
pub mod monitor;
pub mod queue;
pub mod spread;
pub mod stats;
pub mod sweeper;
