//! Domain records exposed through the query surface.
//!
//! These are plain serde records. Relationships are carried as foreign ids and
//! only followed when a query selects them.

mod app;
mod job;
mod payload;
mod resource;
mod route;

use std::collections::BTreeMap;

pub use app::*;
pub use job::*;
pub use payload::*;
pub use resource::*;
pub use route::*;

/// Free-form string metadata attached to most records.
pub type Meta = BTreeMap<String, String>;

/// Process name to instance count.
pub type ProcessCounts = BTreeMap<String, i32>;

/// Process name to scheduling tags.
pub type ProcessTags = BTreeMap<String, Meta>;
