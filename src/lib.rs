pub mod charts;
pub mod config;
pub mod demo;
pub mod error;
pub mod heart_rate;
pub mod heatmap;
pub mod ingest;
pub mod metrics;
pub mod pitch;
pub mod positions;
pub mod render;
pub mod report;
pub mod router;
pub mod state;
