pub mod aggregate;
pub mod cache;
pub mod chart;
pub mod config;
pub mod fetch;
pub mod logging;
pub mod pipeline;
pub mod record;
pub mod render;
pub mod source;
pub mod static_data;
