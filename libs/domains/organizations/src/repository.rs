use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};
use tokio::sync::RwLock;

use crate::error::{OrganizationError, OrganizationResult};
use crate::models::{NewOrganization, Organization, OrganizationId, OrganizationStatus};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait OrganizationRepository: Send + Sync {
    async fn create(&self, input: NewOrganization) -> OrganizationResult<Organization>;

    async fn get_by_id(&self, id: OrganizationId) -> OrganizationResult<Option<Organization>>;

    /// Record a moderation decision
    async fn set_status(
        &self,
        id: OrganizationId,
        status: OrganizationStatus,
    ) -> OrganizationResult<Organization>;
}

/// In-memory implementation of OrganizationRepository (for development/testing)
#[derive(Debug, Clone)]
pub struct InMemoryOrganizationRepository {
    organizations: Arc<RwLock<HashMap<OrganizationId, Organization>>>,
    next_id: Arc<AtomicI64>,
}

impl Default for InMemoryOrganizationRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryOrganizationRepository {
    pub fn new() -> Self {
        Self {
            organizations: Arc::new(RwLock::new(HashMap::new())),
            next_id: Arc::new(AtomicI64::new(1)),
        }
    }
}

#[async_trait]
impl OrganizationRepository for InMemoryOrganizationRepository {
    async fn create(&self, input: NewOrganization) -> OrganizationResult<Organization> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let org = Organization::new(id, input);
        self.organizations.write().await.insert(id, org.clone());

        tracing::info!(organization_id = id, "Created organization");
        Ok(org)
    }

    async fn get_by_id(&self, id: OrganizationId) -> OrganizationResult<Option<Organization>> {
        Ok(self.organizations.read().await.get(&id).cloned())
    }

    async fn set_status(
        &self,
        id: OrganizationId,
        status: OrganizationStatus,
    ) -> OrganizationResult<Organization> {
        let mut organizations = self.organizations.write().await;
        let org = organizations.get_mut(&id).ok_or(OrganizationError::NotFound(id))?;
        org.status = status;
        org.updated_at = Utc::now();

        tracing::info!(organization_id = id, status = %status, "Organization status changed");
        Ok(org.clone())
    }
}
