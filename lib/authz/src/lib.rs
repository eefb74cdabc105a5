//! Relationship-based authorization facade for palisade.
//!
//! Application code asks "may this user perform this action on this resource?"
//! through [`AccessPolicy`] values without knowing whether the answer is a
//! fixed policy decision or a relationship-graph lookup against the backend.
//! Resources carry no owner columns of their own; authorization flows through
//! relationships stored in SpiceDB.

mod backend;
mod config;
mod error;
mod grants;
mod policy;
mod types;

pub use backend::{MockBackend, RelationshipBackend, RelationshipClient};
pub use config::BackendConfig;
pub use error::AuthzError;
pub use grants::{TeamRole, grant_team_role, revoke_team_role};
pub use policy::{AccessPolicy, CheckOutcome, DenialContext, TeamPolicies};
pub use types::{
    ObjectType, Permission, Permissionship, Relationship, RelationshipOp, Resource, Subject,
};
