//! Permission checkers and the authorization gate.
//!
//! An [`AccessPolicy`] answers one question: may this user perform this
//! action on this resource? The two variants keep policy that is fixed at
//! startup and policy that depends on mutable backend state behind the same
//! contract, so call sites never branch on which kind of check they perform.
//!
//! Policies are immutable after construction and safe for unbounded
//! concurrent use; the intended shape is one policy per protected action,
//! built once at startup (see [`TeamPolicies`]) and reused for the life of
//! the process.

use crate::backend::RelationshipBackend;
use crate::error::AuthzError;
use crate::types::{ObjectType, Permission, Resource, Subject};
use palisade_core::UserId;
use rootcause::prelude::Report;
use std::sync::Arc;
use tracing::debug;

/// The context a denial carries for audit and user-facing messages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DenialContext {
    /// The user that requested access.
    pub user_id: UserId,
    /// The resource that was accessed.
    pub resource_id: String,
    /// The kind of resource.
    pub resource_type: ObjectType,
    /// The action that was requested.
    pub action: Permission,
}

impl From<DenialContext> for AuthzError {
    fn from(context: DenialContext) -> Self {
        Self::PermissionDenied {
            user_id: context.user_id,
            resource_id: context.resource_id,
            resource_type: context.resource_type,
            action: context.action,
        }
    }
}

/// The result of evaluating a policy. Exactly one arm holds; an evaluation
/// that fails produces an error report instead, never a partial outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckOutcome {
    /// Access is permitted.
    Permitted,
    /// Access is denied, with the context of the refused request.
    Denied(DenialContext),
}

impl CheckOutcome {
    /// Returns true if access was permitted.
    #[must_use]
    pub fn is_permitted(&self) -> bool {
        matches!(self, Self::Permitted)
    }
}

/// A policy unit producing one access decision per `(user, resource)` pair.
pub enum AccessPolicy {
    /// The outcome is fixed at construction and never touches the backend.
    Static {
        /// The kind of resource this policy protects.
        resource_type: ObjectType,
        /// The action this policy decides, kept for denial context.
        action: Permission,
        /// The fixed outcome.
        allowed: bool,
    },
    /// The outcome is decided by the relationship backend on every call and
    /// may change between calls.
    Declarative {
        /// The kind of resource this policy protects.
        resource_type: ObjectType,
        /// The permission name the backend evaluates.
        action: Permission,
        /// The shared backend handle, injected at construction.
        backend: Arc<dyn RelationshipBackend>,
    },
}

impl AccessPolicy {
    /// Creates a policy that permits every request.
    #[must_use]
    pub fn allow_all(resource_type: ObjectType, action: Permission) -> Self {
        Self::Static {
            resource_type,
            action,
            allowed: true,
        }
    }

    /// Creates a policy that denies every request.
    #[must_use]
    pub fn deny_all(resource_type: ObjectType, action: Permission) -> Self {
        Self::Static {
            resource_type,
            action,
            allowed: false,
        }
    }

    /// Creates a policy whose outcome the backend decides per call.
    #[must_use]
    pub fn via_backend(
        resource_type: ObjectType,
        action: Permission,
        backend: Arc<dyn RelationshipBackend>,
    ) -> Self {
        Self::Declarative {
            resource_type,
            action,
            backend,
        }
    }

    /// The kind of resource this policy protects.
    #[must_use]
    pub fn resource_type(&self) -> ObjectType {
        match self {
            Self::Static { resource_type, .. } | Self::Declarative { resource_type, .. } => {
                *resource_type
            }
        }
    }

    /// The action this policy decides.
    #[must_use]
    pub fn action(&self) -> Permission {
        match self {
            Self::Static { action, .. } | Self::Declarative { action, .. } => *action,
        }
    }

    /// Evaluates the policy for `(user_id, resource_id)`.
    ///
    /// Returns the normalized outcome. A backend that cannot be reached is an
    /// error report, never a denial: "unknown" and "no" stay distinguishable
    /// all the way up.
    pub async fn evaluate(
        &self,
        user_id: &UserId,
        resource_id: &str,
    ) -> Result<CheckOutcome, Report<AuthzError>> {
        match self {
            Self::Static {
                resource_type,
                action,
                allowed,
            } => {
                let outcome = if *allowed {
                    CheckOutcome::Permitted
                } else {
                    CheckOutcome::Denied(DenialContext {
                        user_id: user_id.clone(),
                        resource_id: resource_id.to_string(),
                        resource_type: *resource_type,
                        action: *action,
                    })
                };
                Ok(outcome)
            }
            Self::Declarative {
                resource_type,
                action,
                backend,
            } => {
                let subject = Subject::user(user_id);
                let resource = Resource::new(*resource_type, resource_id);
                let answer = backend
                    .check_permission(&subject, *action, &resource)
                    .await?;

                debug!(
                    user_id = %user_id,
                    resource = %resource,
                    action = %action,
                    ?answer,
                    "declarative policy evaluated"
                );

                if answer.is_permitted() {
                    Ok(CheckOutcome::Permitted)
                } else {
                    Ok(CheckOutcome::Denied(DenialContext {
                        user_id: user_id.clone(),
                        resource_id: resource_id.to_string(),
                        resource_type: *resource_type,
                        action: *action,
                    }))
                }
            }
        }
    }

    /// The gate: evaluates the policy and turns a denial into a typed error.
    ///
    /// Returns `Ok(())` on a permitted outcome; no value, no side effects. A
    /// denial becomes [`AuthzError::PermissionDenied`] carrying the full
    /// denial context. An evaluation failure propagates unchanged as
    /// [`AuthzError::Unavailable`]: fail closed, but never disguised as a
    /// denial.
    pub async fn enforce(
        &self,
        user_id: &UserId,
        resource_id: &str,
    ) -> Result<(), Report<AuthzError>> {
        match self.evaluate(user_id, resource_id).await? {
            CheckOutcome::Permitted => Ok(()),
            CheckOutcome::Denied(context) => Err(AuthzError::from(context).into()),
        }
    }
}

/// The named checkers for protected team operations.
///
/// Built once at startup from the shared backend handle and reused for the
/// life of the process. Team creation is open to every authenticated user;
/// the remaining operations are decided by team relationships.
pub struct TeamPolicies {
    /// Any authenticated user may create a team.
    pub create_team: AccessPolicy,
    /// Reading a team requires a relationship granting `read`.
    pub read_team: AccessPolicy,
    /// Editing a team requires a relationship granting `edit`.
    pub edit_team: AccessPolicy,
    /// Deleting a team requires a relationship granting `delete`.
    pub delete_team: AccessPolicy,
}

impl TeamPolicies {
    /// Builds the team policy set on top of `backend`.
    #[must_use]
    pub fn new(backend: Arc<dyn RelationshipBackend>) -> Self {
        Self {
            create_team: AccessPolicy::allow_all(ObjectType::Team, Permission::CREATE),
            read_team: AccessPolicy::via_backend(
                ObjectType::Team,
                Permission::READ,
                Arc::clone(&backend),
            ),
            edit_team: AccessPolicy::via_backend(
                ObjectType::Team,
                Permission::EDIT,
                Arc::clone(&backend),
            ),
            delete_team: AccessPolicy::via_backend(ObjectType::Team, Permission::DELETE, backend),
        }
    }
}
