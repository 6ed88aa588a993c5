//! Relationships Module - self-referential many-to-many relations
//!
//! - [`canonical`]: ordered storage of undirected edges
//! - [`siblings`]: per-instance neighbor cache and the relation descriptor
//! - [`registry`]: declared relations per model
//! - [`schema`]: join table migration

pub mod canonical;
pub mod registry;
pub mod schema;
pub mod siblings;

pub use canonical::{canonicalize, CanonicalPair};
pub use registry::{RelationBinding, RelationRegistry};
pub use schema::SiblingsSchema;
pub use siblings::{Siblings, SiblingsRelation, SiblingsState};
