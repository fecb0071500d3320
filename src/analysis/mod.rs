//! Analysis modules.
//!
//! `aggregator` rolls up uploaded files for the strategy flow; `insights`
//! and `recommender` back the read-side dashboard routes.

pub mod aggregator;
pub mod insights;
pub mod recommender;

pub use aggregator::*;
