pub mod catalog;
pub mod cluster;
pub mod detector;
pub mod event;
pub mod gate;
pub mod scoring;
pub mod session;
pub mod signals;
pub mod telemetry;
