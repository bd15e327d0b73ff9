//! Typed resource definitions: kinds, attribute values, schemas, and the
//! node builder.
//!
//! A [`ResourceNode`] is the unit a [`Stack`](crate::stack::Stack) is made
//! of. Nodes point at each other through [`Reference`] values; the builder
//! turns every reference into a dependency edge.
pub mod cidr;
mod kind;
mod node;
pub mod rules;
pub mod schema;
mod value;

pub use kind::ResourceKind;
pub use node::{NodeBuilder, ResourceNode};
pub(crate) use node::identifier_problem;
pub use rules::SecurityRuleSpec;
pub use value::{Reference, Value};
