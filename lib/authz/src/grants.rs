//! Relationship mutation helpers.
//!
//! Grant and revoke are thin pass-throughs to the adapter's relationship
//! write; they are kept apart from checking because writes and reads carry
//! different consistency and error implications. No helper verifies that a
//! write became visible; the backend defers write visibility, so callers
//! needing confirmation issue a later check.

use crate::backend::RelationshipBackend;
use crate::error::AuthzError;
use crate::types::{Relationship, RelationshipOp, Resource, Subject};
use palisade_core::{TeamId, UserId};
use rootcause::prelude::Report;
use std::fmt;

/// Roles a user can hold on a team, i.e. the relation names the backend's
/// team permissions are expressed over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TeamRole {
    /// A regular team member.
    Member,
    /// A team owner.
    Owner,
}

impl TeamRole {
    /// Returns the backend relation name.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Member => "member",
            Self::Owner => "owner",
        }
    }
}

impl fmt::Display for TeamRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Grants `role` on `team_id` to `user_id`.
///
/// Creating the same grant twice leaves a single grant; retries after a
/// [`AuthzError::WriteFailed`] report are safe. The grant is not guaranteed
/// to be visible to an immediately following check.
pub async fn grant_team_role(
    backend: &dyn RelationshipBackend,
    team_id: &TeamId,
    role: TeamRole,
    user_id: &UserId,
) -> Result<(), Report<AuthzError>> {
    let relationship = Relationship::new(
        Resource::team(team_id),
        role.as_str(),
        Subject::user(user_id),
    );
    backend
        .write_relationship(&relationship, RelationshipOp::Create)
        .await
}

/// Revokes `role` on `team_id` from `user_id`.
///
/// Deleting an absent grant is a no-op at the backend; retries are safe.
pub async fn revoke_team_role(
    backend: &dyn RelationshipBackend,
    team_id: &TeamId,
    role: TeamRole,
    user_id: &UserId,
) -> Result<(), Report<AuthzError>> {
    let relationship = Relationship::new(
        Resource::team(team_id),
        role.as_str(),
        Subject::user(user_id),
    );
    backend
        .write_relationship(&relationship, RelationshipOp::Delete)
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{InMemoryBackend, MockBackend};
    use crate::types::{Permission, Permissionship};

    fn alice() -> UserId {
        UserId::new("alice")
    }

    fn t1() -> TeamId {
        TeamId::new("t1")
    }

    #[test]
    fn team_role_relation_names() {
        assert_eq!(TeamRole::Member.as_str(), "member");
        assert_eq!(TeamRole::Owner.to_string(), "owner");
    }

    #[tokio::test]
    async fn granting_twice_leaves_a_single_grant() {
        let backend = InMemoryBackend::new();

        grant_team_role(&backend, &t1(), TeamRole::Member, &alice())
            .await
            .expect("first grant");
        grant_team_role(&backend, &t1(), TeamRole::Member, &alice())
            .await
            .expect("repeated grant");

        let resource = Resource::team(&t1());
        let subject = Subject::user(&alice());
        assert_eq!(
            backend.relations(&resource, &subject),
            vec!["member".to_string()]
        );

        // A check after either call answers the same.
        let answer = backend
            .check_permission(&subject, Permission::READ, &resource)
            .await
            .expect("check should succeed");
        assert_eq!(answer, Permissionship::HasPermission);
    }

    #[tokio::test]
    async fn revoke_removes_the_grant() {
        let backend = InMemoryBackend::new();

        grant_team_role(&backend, &t1(), TeamRole::Owner, &alice())
            .await
            .expect("grant");
        revoke_team_role(&backend, &t1(), TeamRole::Owner, &alice())
            .await
            .expect("revoke");

        let answer = backend
            .check_permission(
                &Subject::user(&alice()),
                Permission::READ,
                &Resource::team(&t1()),
            )
            .await
            .expect("check should succeed");
        assert_eq!(answer, Permissionship::NoPermission);
    }

    #[tokio::test]
    async fn revoking_an_absent_grant_is_a_no_op() {
        let backend = InMemoryBackend::new();
        revoke_team_role(&backend, &t1(), TeamRole::Member, &alice())
            .await
            .expect("revoke of an absent grant succeeds");
    }

    #[tokio::test]
    async fn write_failure_propagates_unchanged() {
        let backend = MockBackend::unreachable();
        let err = grant_team_role(&backend, &t1(), TeamRole::Member, &alice())
            .await
            .expect_err("backend is unreachable");
        assert!(err.to_string().contains("write failed"));
    }
}
