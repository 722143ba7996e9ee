//! Concrete adapter implementations of the port traits.

pub mod binance_adapter;
pub mod csv_cache_adapter;
pub mod file_config_adapter;
pub mod text_report_adapter;
