pub mod format;
pub mod icons;

pub use format::{format_duration, format_question, format_stats, format_status};
