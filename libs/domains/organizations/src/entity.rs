use sea_orm::ActiveValue::{NotSet, Set};
use sea_orm::entity::prelude::*;

use crate::models::{NewOrganization, Organization, OrganizationStatus};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "organizations")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub name: String,
    pub email: Option<String>,
    pub status: OrganizationStatus,
    pub admin_user_id: Option<i64>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for Organization {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            email: model.email,
            status: model.status,
            admin_user_id: model.admin_user_id,
            created_at: model.created_at.into(),
            updated_at: model.updated_at.into(),
        }
    }
}

impl From<NewOrganization> for ActiveModel {
    fn from(input: NewOrganization) -> Self {
        let now = chrono::Utc::now();
        ActiveModel {
            id: NotSet,
            name: Set(input.name),
            email: Set(input.email),
            status: Set(OrganizationStatus::Pending),
            admin_user_id: Set(input.admin_user_id),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        }
    }
}
