//! The GraphQL schema of the controller.
//!
//! Every type is declared as a field table (see [`Fields`]) and registered with
//! a [`registry::Registry`], which checks that the result is closed before the
//! executable schema is built. The schema is built once and shared.

pub(crate) mod args;
mod entities;
mod events;
mod field;
mod field_type;
mod payloads;
pub(crate) mod registry;
mod root;
mod scalars;
mod value;

use async_graphql::dynamic::Schema;

pub use self::field::Args;
pub use self::field::Entity;
pub use self::field::Fields;
pub use self::field::Node;
pub(crate) use self::field_type::FieldType;
pub use self::root::Mutation;
pub use self::root::Query;
use crate::error::RegistryError;

pub(crate) fn register_all(registry: &mut registry::Registry) {
    scalars::register(registry);
    entities::register(registry);
    payloads::register(registry);
    events::register(registry);
    root::register(registry);
}

/// Builds the executable schema.
///
/// Fails when a discriminator has no event object, an event object exposes two
/// payload types, or a field refers to a type that was never registered.
pub fn build_schema() -> Result<Schema, RegistryError> {
    let mut registry = registry::Registry::default();
    register_all(&mut registry);
    registry.finish(root::QUERY, root::MUTATION)
}
