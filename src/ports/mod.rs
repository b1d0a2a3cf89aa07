//! Port traits for the collaborators around the decision core.

pub mod action_sink;
pub mod config_port;
pub mod price_feed;
pub mod price_log;
pub mod summary_port;
