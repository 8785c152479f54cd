use sea_orm::ActiveValue::{NotSet, Set};
use sea_orm::entity::prelude::*;

use crate::models::{NewUser, Role, User};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    #[sea_orm(unique)]
    pub email: String,
    pub name: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub password_hash: Option<String>,
    pub role: Role,
    pub is_verified: bool,
    pub google_id: Option<String>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
    pub last_login: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for User {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            email: model.email,
            name: model.name,
            password_hash: model.password_hash,
            role: model.role,
            is_verified: model.is_verified,
            google_id: model.google_id,
            created_at: model.created_at.into(),
            updated_at: model.updated_at.into(),
            last_login: model.last_login.map(Into::into),
        }
    }
}

impl From<NewUser> for ActiveModel {
    fn from(input: NewUser) -> Self {
        let now = chrono::Utc::now();
        ActiveModel {
            id: NotSet,
            email: Set(input.email),
            name: Set(input.name),
            password_hash: Set(input.password_hash),
            role: Set(input.role),
            is_verified: Set(input.is_verified),
            google_id: Set(input.google_id),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
            last_login: Set(None),
        }
    }
}
