pub mod config;
pub mod error;
pub mod geometry;
pub mod live;
pub mod pose;
pub mod protocol;
pub mod rig;
pub mod scene;
pub mod sink;
pub mod telemetry;
pub mod tracker;
