//! Infrastructure for the Molta bakery website.
//!
//! [`stack::MoltaInfraStack`] describes the resources, [`validate`] checks
//! a synthesized template against what the site needs.

pub mod config;
pub mod context;
pub mod logging;
pub mod stack;
pub mod validate;

pub use config::SiteConfig;
pub use stack::{MoltaInfraStack, StackProps};
