//! Terminal output: the final report and the progress spinner

pub mod report;
pub mod spinner;

pub use report::{format_bytes, format_duration, ColorScheme, LogNote, ReportRenderer};
pub use spinner::Spinner;
