pub mod config;
pub mod logging;

pub mod job;
pub mod report;
pub mod scheduler;
pub mod storage;
