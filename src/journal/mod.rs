//! The journal core: time buckets, navigation, and cached insights.

pub mod aggregate;
pub mod insight;
pub mod navigator;
pub mod orchestrator;
pub mod session;
pub mod store;
pub mod timekey;
pub mod types;
