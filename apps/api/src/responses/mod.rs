//! Answer submission and attempt history.

pub mod handlers;
pub mod ledger;
pub mod submission;
