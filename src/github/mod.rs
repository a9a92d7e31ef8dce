mod client;
mod project;

pub use client::{DEFAULT_GRAPHQL_URL, GraphqlClient, GraphqlError};
pub use project::{FieldValueInput, ProjectApi, ResolveTarget, resolve_ids};
