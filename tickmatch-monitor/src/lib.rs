pub mod data;
pub mod mock_data;
pub mod server;
pub mod spread_monitor;
