//! Server core: control surface, configuration, and lifecycle plumbing.
//!
//! The public API from this module is [`Server`] (built with
//! [`ServerBuilder`]), [`Config`], and [`IdAllocator`].
//!
//! Internal modules:
//! - [`server`]: listener launch sequence, job control, shutdown;
//! - [`builder`]: wires registry, broker and subscriber workers;
//! - [`ids`]: monotonic identifier allocation;
//! - [`shutdown`]: OS termination signal handling.

mod builder;
mod config;
mod ids;
mod server;
mod shutdown;

pub use builder::ServerBuilder;
pub use config::Config;
pub use ids::IdAllocator;
pub use server::Server;
