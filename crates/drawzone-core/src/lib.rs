// Library root: zone definitions, the classifier, draw loading and the
// supporting config, access and persistence layers.

pub mod access;
pub mod classify;
pub mod config;
pub mod db;
pub mod draw;
pub mod ingest;
pub mod loader;
pub mod period;
pub mod source;
pub mod zones;
