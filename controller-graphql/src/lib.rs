//! GraphQL query surface over the controller's entities and its event log.
//!
//! Events are resolved polymorphically: the discriminator of each event picks
//! the concrete object it is exposed as, and its payload is only decoded when
//! a query selects it.

#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
#![warn(unreachable_pub)]

pub mod configuration;
pub mod error;
pub mod event;
pub mod logging;
pub mod memory;
pub mod model;
pub mod query;
pub mod repository;
pub mod schema;
pub mod server;
pub mod service;

pub use configuration::Configuration;
pub use memory::MemoryStore;
pub use repository::Repositories;
pub use schema::build_schema;
pub use service::GraphqlService;
