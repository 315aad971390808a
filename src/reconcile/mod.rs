//! Rules that turn sheet punches and approved leave into per-day attendance.

pub mod classifier;
pub mod ledger;
pub mod sheet;
pub mod summary;
