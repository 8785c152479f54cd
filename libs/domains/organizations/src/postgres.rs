use async_trait::async_trait;
use chrono::Utc;
use sea_orm::ActiveValue::Set;
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait};

use crate::{
    entity,
    error::{OrganizationError, OrganizationResult},
    models::{NewOrganization, Organization, OrganizationId, OrganizationStatus},
    repository::OrganizationRepository,
};

pub struct PgOrganizationRepository {
    db: DatabaseConnection,
}

impl PgOrganizationRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl OrganizationRepository for PgOrganizationRepository {
    async fn create(&self, input: NewOrganization) -> OrganizationResult<Organization> {
        let active: entity::ActiveModel = input.into();
        let model = active.insert(&self.db).await?;

        tracing::info!(organization_id = model.id, "Created organization");
        Ok(model.into())
    }

    async fn get_by_id(&self, id: OrganizationId) -> OrganizationResult<Option<Organization>> {
        let model = entity::Entity::find_by_id(id).one(&self.db).await?;
        Ok(model.map(Into::into))
    }

    async fn set_status(
        &self,
        id: OrganizationId,
        status: OrganizationStatus,
    ) -> OrganizationResult<Organization> {
        let model = entity::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or(OrganizationError::NotFound(id))?;

        let mut active: entity::ActiveModel = model.into();
        active.status = Set(status);
        active.updated_at = Set(Utc::now().into());
        let updated = active.update(&self.db).await?;

        tracing::info!(organization_id = id, status = %status, "Organization status changed");
        Ok(updated.into())
    }
}
