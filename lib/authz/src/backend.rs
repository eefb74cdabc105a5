//! Relationship-backend client adapter.
//!
//! Wraps the backend's two semantic operations, check-permission and
//! write-relationship, behind the minimal [`RelationshipBackend`] seam so
//! checkers and grant helpers never see the wire format. The production
//! implementation is [`RelationshipClient`]; [`MockBackend`] and a
//! crate-internal in-memory store substitute for it in tests.

use crate::config::BackendConfig;
use crate::error::AuthzError;
use crate::types::{
    ObjectType, Permission, Permissionship, Relationship, RelationshipOp, Resource, Subject,
};
use async_trait::async_trait;
use rootcause::prelude::Report;
use spicedb_client::SpicedbClient;
use spicedb_grpc::authzed::api::v1::{
    CheckPermissionRequest, Consistency, LookupResourcesRequest, ObjectReference,
    RelationshipUpdate, SubjectReference, WriteRelationshipsRequest,
    check_permission_response::Permissionship as WirePermissionship, relationship_update,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, instrument};

/// The minimal backend interface the rest of the crate depends on.
///
/// Exactly one production implementation exists; the trait is the seam that
/// lets tests substitute an in-process fake for the remote service. A
/// transport failure surfaces as an error report, never as a
/// [`Permissionship`] answer.
#[async_trait]
pub trait RelationshipBackend: Send + Sync {
    /// Asks the backend whether `subject` holds `permission` on `resource`.
    async fn check_permission(
        &self,
        subject: &Subject,
        permission: Permission,
        resource: &Resource,
    ) -> Result<Permissionship, Report<AuthzError>>;

    /// Applies `op` to a relationship tuple in the backend's graph.
    ///
    /// Create and delete are idempotent from the caller's perspective; the
    /// exact semantics are owned by the backend. A write that returns `Ok` is
    /// acknowledged but not necessarily visible to an immediately following
    /// check.
    async fn write_relationship(
        &self,
        relationship: &Relationship,
        op: RelationshipOp,
    ) -> Result<(), Report<AuthzError>>;
}

/// SpiceDB-backed relationship client.
///
/// This wrapper handles the lifetime constraints of the underlying SpiceDB
/// client by maintaining one persistent connection protected by a mutex; the
/// connection is opened once at process start and shared by all concurrent
/// checks. Every round trip is bounded by the configured request timeout so a
/// permission check cannot hang a request indefinitely.
#[derive(Clone)]
pub struct RelationshipClient {
    inner: Arc<Mutex<SpicedbClient>>,
    request_timeout: Duration,
}

impl RelationshipClient {
    /// Connects to the backend described by `config`.
    ///
    /// Note: the endpoint and preshared key are leaked to satisfy the
    /// `'static` lifetime requirements of the underlying gRPC client. The
    /// client is expected to live for the duration of the process.
    pub async fn connect(config: &BackendConfig) -> Result<Self, Report<AuthzError>> {
        let endpoint: &'static str = Box::leak(config.endpoint.clone().into_boxed_str());
        let preshared_key: &'static str = Box::leak(config.preshared_key.clone().into_boxed_str());

        let client = SpicedbClient::from_url_and_preshared_key(endpoint, preshared_key)
            .await
            .map_err(|e| AuthzError::ConnectionFailed {
                details: e.to_string(),
            })?;

        Ok(Self {
            inner: Arc::new(Mutex::new(client)),
            request_timeout: config.request_timeout(),
        })
    }

    /// Writes the authorization schema to the backend.
    ///
    /// Called once on process startup so checks evaluate against the expected
    /// permission expressions.
    #[instrument(skip(self, schema))]
    pub async fn write_schema(&self, schema: &str) -> Result<(), Report<AuthzError>> {
        let mut client = self.inner.lock().await;
        tokio::time::timeout(self.request_timeout, client.write_schema(schema))
            .await
            .map_err(|_| AuthzError::Unavailable {
                details: format!("schema write timed out after {:?}", self.request_timeout),
            })?
            .map_err(|e| AuthzError::Unavailable {
                details: e.to_string(),
            })?;

        debug!("schema written");
        Ok(())
    }

    /// Looks up the IDs of all resources of `object_type` on which `subject`
    /// holds `permission`.
    #[instrument(skip(self), fields(object_type = %object_type, permission = %permission))]
    pub async fn lookup_resources(
        &self,
        object_type: ObjectType,
        permission: Permission,
        subject: &Subject,
    ) -> Result<Vec<String>, Report<AuthzError>> {
        use tokio_stream::StreamExt;

        let request = LookupResourcesRequest {
            resource_object_type: object_type.as_str().to_string(),
            permission: permission.as_str().to_string(),
            subject: Some(subject_reference(subject)),
            consistency: Some(check_consistency()),
            ..Default::default()
        };

        let mut client = self.inner.lock().await;
        let mut response = tokio::time::timeout(self.request_timeout, client.lookup_resources(request))
            .await
            .map_err(|_| AuthzError::Unavailable {
                details: format!("lookup timed out after {:?}", self.request_timeout),
            })?
            .map_err(|e| AuthzError::Unavailable {
                details: e.to_string(),
            })?;

        let mut ids = Vec::new();
        while let Some(result) = response.next().await {
            match result {
                Ok(r) => ids.push(r.resource_object_id),
                Err(e) => {
                    return Err(AuthzError::Unavailable {
                        details: e.to_string(),
                    }
                    .into());
                }
            }
        }

        debug!(count = ids.len(), "lookup resources result");
        Ok(ids)
    }
}

#[async_trait]
impl RelationshipBackend for RelationshipClient {
    #[instrument(skip(self), fields(resource = %resource, permission = %permission))]
    async fn check_permission(
        &self,
        subject: &Subject,
        permission: Permission,
        resource: &Resource,
    ) -> Result<Permissionship, Report<AuthzError>> {
        let request = CheckPermissionRequest {
            resource: Some(object_reference(resource)),
            permission: permission.as_str().to_string(),
            subject: Some(subject_reference(subject)),
            consistency: Some(check_consistency()),
            ..Default::default()
        };

        let mut client = self.inner.lock().await;
        let response = tokio::time::timeout(self.request_timeout, client.check_permission(request))
            .await
            .map_err(|_| AuthzError::Unavailable {
                details: format!("check timed out after {:?}", self.request_timeout),
            })?
            .map_err(|e| AuthzError::Unavailable {
                details: e.to_string(),
            })?;

        let permissionship = match response.permissionship() {
            WirePermissionship::HasPermission => Permissionship::HasPermission,
            WirePermissionship::NoPermission => Permissionship::NoPermission,
            WirePermissionship::ConditionalPermission => Permissionship::Conditional,
            WirePermissionship::Unspecified => {
                return Err(AuthzError::Unavailable {
                    details: "backend returned an unspecified permissionship".to_string(),
                }
                .into());
            }
        };

        debug!(?permissionship, "permission check result");
        Ok(permissionship)
    }

    #[instrument(skip(self), fields(resource = %relationship.resource, relation = %relationship.relation))]
    async fn write_relationship(
        &self,
        relationship: &Relationship,
        op: RelationshipOp,
    ) -> Result<(), Report<AuthzError>> {
        let operation = match op {
            RelationshipOp::Create => relationship_update::Operation::Create,
            RelationshipOp::Touch => relationship_update::Operation::Touch,
            RelationshipOp::Delete => relationship_update::Operation::Delete,
        };

        let update = RelationshipUpdate {
            operation: operation as i32,
            relationship: Some(spicedb_grpc::authzed::api::v1::Relationship {
                resource: Some(object_reference(&relationship.resource)),
                relation: relationship.relation.clone(),
                subject: Some(subject_reference(&relationship.subject)),
                optional_caveat: None,
            }),
        };

        let request = WriteRelationshipsRequest {
            updates: vec![update],
            ..Default::default()
        };

        let mut client = self.inner.lock().await;
        tokio::time::timeout(self.request_timeout, client.write_relationships(request))
            .await
            .map_err(|_| AuthzError::WriteFailed {
                details: format!("write timed out after {:?}", self.request_timeout),
            })?
            .map_err(|e| AuthzError::WriteFailed {
                details: e.to_string(),
            })?;

        debug!("relationship written");
        Ok(())
    }
}

fn object_reference(resource: &Resource) -> ObjectReference {
    ObjectReference {
        object_type: resource.object_type.as_str().to_string(),
        object_id: resource.id.clone(),
    }
}

fn subject_reference(subject: &Subject) -> SubjectReference {
    SubjectReference {
        object: Some(ObjectReference {
            object_type: ObjectType::User.as_str().to_string(),
            object_id: subject.id.clone(),
        }),
        optional_relation: String::new(),
    }
}

/// Checks run at minimize-latency consistency: a write followed immediately
/// by a check for the same tuple is not guaranteed to observe the write.
fn check_consistency() -> Consistency {
    Consistency {
        requirement: Some(
            spicedb_grpc::authzed::api::v1::consistency::Requirement::MinimizeLatency(true),
        ),
    }
}

/// A backend double that returns a fixed answer or fails every call.
pub struct MockBackend {
    /// If set, all calls fail with these details.
    pub fail_with: Option<String>,
    /// The answer to return from checks on success.
    pub answer: Permissionship,
}

impl MockBackend {
    /// Creates a mock backend that answers every check with `answer`.
    #[must_use]
    pub fn answering(answer: Permissionship) -> Self {
        Self {
            fail_with: None,
            answer,
        }
    }

    /// Creates a mock backend whose every call fails as unreachable.
    #[must_use]
    pub fn unreachable() -> Self {
        Self {
            fail_with: Some("connection refused".to_string()),
            answer: Permissionship::NoPermission,
        }
    }
}

#[async_trait]
impl RelationshipBackend for MockBackend {
    async fn check_permission(
        &self,
        _subject: &Subject,
        _permission: Permission,
        _resource: &Resource,
    ) -> Result<Permissionship, Report<AuthzError>> {
        match &self.fail_with {
            Some(details) => Err(AuthzError::Unavailable {
                details: details.clone(),
            }
            .into()),
            None => Ok(self.answer),
        }
    }

    async fn write_relationship(
        &self,
        _relationship: &Relationship,
        _op: RelationshipOp,
    ) -> Result<(), Report<AuthzError>> {
        match &self.fail_with {
            Some(details) => Err(AuthzError::WriteFailed {
                details: details.clone(),
            }
            .into()),
            None => Ok(()),
        }
    }
}

/// An in-memory relationship store implementing [`RelationshipBackend`].
///
/// Grants are a set keyed by `(resource, subject)`, so repeated creates of the
/// same tuple collapse to one grant, mirroring backend-level idempotence. Any
/// stored relation satisfies any permission check for that pair; evaluating
/// real permission expressions is the remote backend's job and is not modeled
/// here.
#[cfg(test)]
#[derive(Default)]
pub(crate) struct InMemoryBackend {
    grants: std::sync::Mutex<
        std::collections::HashMap<(String, String), std::collections::HashSet<String>>,
    >,
}

#[cfg(test)]
impl InMemoryBackend {
    /// Creates an empty store.
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Returns the relations stored for `(resource, subject)`, sorted.
    pub(crate) fn relations(&self, resource: &Resource, subject: &Subject) -> Vec<String> {
        let grants = self.grants.lock().unwrap();
        let mut relations: Vec<String> = grants
            .get(&(resource.to_string(), subject.id.clone()))
            .map(|set| set.iter().cloned().collect())
            .unwrap_or_default();
        relations.sort();
        relations
    }
}

#[cfg(test)]
#[async_trait]
impl RelationshipBackend for InMemoryBackend {
    async fn check_permission(
        &self,
        subject: &Subject,
        _permission: Permission,
        resource: &Resource,
    ) -> Result<Permissionship, Report<AuthzError>> {
        let grants = self.grants.lock().unwrap();
        let permitted = grants
            .get(&(resource.to_string(), subject.id.clone()))
            .is_some_and(|relations| !relations.is_empty());

        Ok(if permitted {
            Permissionship::HasPermission
        } else {
            Permissionship::NoPermission
        })
    }

    async fn write_relationship(
        &self,
        relationship: &Relationship,
        op: RelationshipOp,
    ) -> Result<(), Report<AuthzError>> {
        let key = (
            relationship.resource.to_string(),
            relationship.subject.id.clone(),
        );
        let mut grants = self.grants.lock().unwrap();
        match op {
            RelationshipOp::Create | RelationshipOp::Touch => {
                grants
                    .entry(key)
                    .or_default()
                    .insert(relationship.relation.clone());
            }
            RelationshipOp::Delete => {
                if let Some(relations) = grants.get_mut(&key) {
                    relations.remove(&relationship.relation);
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use palisade_core::{TeamId, UserId};

    fn member_of_t1() -> Relationship {
        Relationship::new(
            Resource::team(&TeamId::new("t1")),
            "member",
            Subject::user(&UserId::new("alice")),
        )
    }

    #[tokio::test]
    async fn in_memory_check_without_tuple_is_no_permission() {
        let backend = InMemoryBackend::new();
        let answer = backend
            .check_permission(
                &Subject::user(&UserId::new("bob")),
                Permission::READ,
                &Resource::team(&TeamId::new("t1")),
            )
            .await
            .expect("check should succeed");
        assert_eq!(answer, Permissionship::NoPermission);
    }

    #[tokio::test]
    async fn in_memory_check_after_create_is_has_permission() {
        let backend = InMemoryBackend::new();
        let rel = member_of_t1();
        backend
            .write_relationship(&rel, RelationshipOp::Create)
            .await
            .expect("write should succeed");

        let answer = backend
            .check_permission(&rel.subject, Permission::READ, &rel.resource)
            .await
            .expect("check should succeed");
        assert_eq!(answer, Permissionship::HasPermission);
    }

    #[tokio::test]
    async fn in_memory_repeated_create_keeps_one_grant() {
        let backend = InMemoryBackend::new();
        let rel = member_of_t1();
        backend
            .write_relationship(&rel, RelationshipOp::Create)
            .await
            .expect("first write");
        backend
            .write_relationship(&rel, RelationshipOp::Create)
            .await
            .expect("second write");

        assert_eq!(
            backend.relations(&rel.resource, &rel.subject),
            vec!["member".to_string()]
        );
    }

    #[tokio::test]
    async fn in_memory_delete_removes_the_grant() {
        let backend = InMemoryBackend::new();
        let rel = member_of_t1();
        backend
            .write_relationship(&rel, RelationshipOp::Create)
            .await
            .expect("write");
        backend
            .write_relationship(&rel, RelationshipOp::Delete)
            .await
            .expect("delete");

        let answer = backend
            .check_permission(&rel.subject, Permission::READ, &rel.resource)
            .await
            .expect("check should succeed");
        assert_eq!(answer, Permissionship::NoPermission);
    }

    #[tokio::test]
    async fn mock_backend_returns_its_fixed_answer() {
        let backend = MockBackend::answering(Permissionship::Conditional);
        let answer = backend
            .check_permission(
                &Subject::user(&UserId::new("alice")),
                Permission::READ,
                &Resource::team(&TeamId::new("t1")),
            )
            .await
            .expect("check should succeed");
        assert_eq!(answer, Permissionship::Conditional);
    }

    #[tokio::test]
    async fn unreachable_mock_fails_checks_and_writes() {
        let backend = MockBackend::unreachable();

        let check = backend
            .check_permission(
                &Subject::user(&UserId::new("alice")),
                Permission::READ,
                &Resource::team(&TeamId::new("t1")),
            )
            .await;
        assert!(check.is_err());
        assert!(
            check
                .expect_err("check should fail")
                .to_string()
                .contains("unavailable")
        );

        let write = backend
            .write_relationship(&member_of_t1(), RelationshipOp::Create)
            .await;
        assert!(write.is_err());
        assert!(
            write
                .expect_err("write should fail")
                .to_string()
                .contains("write failed")
        );
    }
}
