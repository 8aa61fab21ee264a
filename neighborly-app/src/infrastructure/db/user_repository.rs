use super::db_err;
use super::entities::{user, User};
use crate::domain::{self, Role};
use neighborly_errors::AppError;
use sea_orm::{entity::*, DatabaseConnection};
use uuid::Uuid;

#[derive(Clone)]
pub struct UserRepository {
    db: DatabaseConnection,
}

impl UserRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<domain::User>, AppError> {
        User::find_by_id(id)
            .one(&self.db)
            .await
            .map(|m| m.map(to_domain))
            .map_err(db_err)
    }

    pub async fn upsert(&self, user_data: &domain::User) -> Result<domain::User, AppError> {
        let existing = User::find_by_id(user_data.id).one(&self.db).await.map_err(db_err)?;

        let model = if let Some(existing) = existing {
            let mut active: user::ActiveModel = existing.into();
            active.full_name = Set(user_data.full_name.clone());
            active.avatar_url = Set(user_data.avatar_url.clone());
            active.role = Set(user_data.role.as_str().to_string());
            active.update(&self.db).await
        } else {
            let active = user::ActiveModel {
                id: Set(user_data.id),
                full_name: Set(user_data.full_name.clone()),
                avatar_url: Set(user_data.avatar_url.clone()),
                role: Set(user_data.role.as_str().to_string()),
                created_at: Set(Some(chrono::Utc::now())),
            };
            active.insert(&self.db).await
        };

        model.map(to_domain).map_err(db_err)
    }
}

fn to_domain(m: user::Model) -> domain::User {
    domain::User {
        id: m.id,
        full_name: m.full_name,
        avatar_url: m.avatar_url,
        role: Role::parse(&m.role),
        created_at: m.created_at,
    }
}
