pub mod data;
pub mod format;
pub mod reporting;
pub mod session;
