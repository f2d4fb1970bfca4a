pub mod config;
pub mod diagnostics;
pub mod errors;
pub mod query;
pub mod store;
pub mod submitter;
pub mod telemetry;
pub mod ui;
pub mod util;
pub mod worker;
