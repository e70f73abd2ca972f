//! fleettop library: dashboard API types, availability timeline math, the
//! polling view-model and the HTTP client. The binary adds the terminal UI.

pub mod api;
pub mod availability;
pub mod clock;
pub mod config;
pub mod fleet;
pub mod history;
pub mod logging;
pub mod metrics;
pub mod poller;
pub mod profiles;
pub mod types;
