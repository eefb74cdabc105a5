//! Naming types for the authorization model.
//!
//! Every request to the relationship backend is built from these values, so
//! the rest of the workspace never touches the wire format directly.

use palisade_core::{TeamId, UserId};
use std::fmt;

/// Kinds of entities in the relationship graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectType {
    /// An acting user.
    User,
    /// A team resource.
    Team,
}

impl ObjectType {
    /// Returns the backend type name.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Team => "team",
        }
    }
}

impl fmt::Display for ObjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A typed resource reference in the authorization model.
///
/// Two references built from equal `(type, id)` pairs compare equal; the
/// adapter and any caching rely on this for deduplication.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Resource {
    /// The kind of resource.
    pub object_type: ObjectType,
    /// The opaque resource ID.
    pub id: String,
}

impl Resource {
    /// Creates a new resource reference.
    #[must_use]
    pub fn new(object_type: ObjectType, id: impl Into<String>) -> Self {
        Self {
            object_type,
            id: id.into(),
        }
    }

    /// Creates a team resource reference.
    #[must_use]
    pub fn team(id: &TeamId) -> Self {
        Self::new(ObjectType::Team, id.as_str())
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.object_type, self.id)
    }
}

/// The acting identity in the authorization model.
///
/// Subjects are always users in this core; the adapter fills in the backend
/// type name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Subject {
    /// The opaque user ID.
    pub id: String,
}

impl Subject {
    /// Creates a user subject.
    #[must_use]
    pub fn user(id: &UserId) -> Self {
        Self {
            id: id.as_str().to_string(),
        }
    }
}

impl fmt::Display for Subject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", ObjectType::User, self.id)
    }
}

/// A permission name evaluated by the backend (e.g., `"read"`).
///
/// Names are not validated locally; the backend is authoritative on whether a
/// name is meaningful for a given resource type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Permission(&'static str);

impl Permission {
    /// Create a resource of this type.
    pub const CREATE: Self = Self("create");
    /// Read a resource.
    pub const READ: Self = Self("read");
    /// Edit a resource.
    pub const EDIT: Self = Self("edit");
    /// Delete a resource.
    pub const DELETE: Self = Self("delete");

    /// Creates a permission from a static action name.
    #[must_use]
    pub const fn from_static(name: &'static str) -> Self {
        Self(name)
    }

    /// Returns the backend permission name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        self.0
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The backend's answer to a permission check.
///
/// A transport failure is *not* a `Permissionship`; the adapter surfaces it as
/// an error so callers can never mistake "unknown" for "denied".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Permissionship {
    /// The subject holds the permission.
    HasPermission,
    /// The subject does not hold the permission.
    NoPermission,
    /// The answer depends on caveat context this core does not supply.
    Conditional,
}

impl Permissionship {
    /// Returns true only for an affirmative answer.
    #[must_use]
    pub fn is_permitted(&self) -> bool {
        matches!(self, Self::HasPermission)
    }
}

/// A relationship tuple between a resource and a subject.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relationship {
    /// The resource.
    pub resource: Resource,
    /// The relation name (e.g., `"member"`, `"owner"`).
    pub relation: String,
    /// The subject.
    pub subject: Subject,
}

impl Relationship {
    /// Creates a new relationship tuple.
    #[must_use]
    pub fn new(resource: Resource, relation: impl Into<String>, subject: Subject) -> Self {
        Self {
            resource,
            relation: relation.into(),
            subject,
        }
    }
}

/// Mutation operation for a relationship write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelationshipOp {
    /// Create the tuple; the backend owns duplicate handling.
    Create,
    /// Create the tuple if absent, leave it untouched otherwise.
    Touch,
    /// Delete the tuple.
    Delete,
}
