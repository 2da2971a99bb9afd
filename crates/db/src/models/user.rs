use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, QueryOrder,
    Set, SqlErr,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;
use validator::Validate;

use crate::entities::user;

#[derive(Debug, Error)]
pub enum UserError {
    #[error(transparent)]
    Database(#[from] DbErr),
    #[error("User not found")]
    UserNotFound,
    #[error("A user with this email already exists")]
    EmailTaken,
    #[error("Validation failed: {0}")]
    Validation(String),
}

/// Account record. The password is stored exactly as given; hashing is a
/// policy decision deferred to the callers of this store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub fullname: String,
    pub email: String,
    pub password: String,
    pub role: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PartialEq for User {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for User {}

impl std::hash::Hash for User {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateUser {
    #[validate(length(min = 3, max = 50, message = "fullname must be between 3 and 50 characters"))]
    pub fullname: String,
    #[validate(email(message = "email must be a valid address"))]
    pub email: String,
    #[validate(length(min = 6, max = 100, message = "password must be between 6 and 100 characters"))]
    pub password: String,
    pub role: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateUser {
    #[validate(length(min = 3, max = 50, message = "fullname must be between 3 and 50 characters"))]
    pub fullname: Option<String>,
    #[validate(email(message = "email must be a valid address"))]
    pub email: Option<String>,
    #[validate(length(min = 6, max = 100, message = "password must be between 6 and 100 characters"))]
    pub password: Option<String>,
    pub role: Option<String>,
    pub is_active: Option<bool>,
}

fn map_insert_err(err: DbErr) -> UserError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => UserError::EmailTaken,
        _ => UserError::Database(err),
    }
}

impl User {
    fn from_model(model: user::Model) -> Self {
        Self {
            id: model.uuid,
            fullname: model.fullname,
            email: model.email,
            password: model.password,
            role: model.role,
            is_active: model.is_active,
            created_at: model.created_at.into(),
            updated_at: model.updated_at.into(),
        }
    }

    pub async fn find_all<C: ConnectionTrait>(db: &C) -> Result<Vec<Self>, UserError> {
        let records = user::Entity::find()
            .order_by_desc(user::Column::CreatedAt)
            .all(db)
            .await?;
        Ok(records.into_iter().map(Self::from_model).collect())
    }

    pub async fn find_by_id<C: ConnectionTrait>(
        db: &C,
        id: Uuid,
    ) -> Result<Option<Self>, DbErr> {
        let record = user::Entity::find()
            .filter(user::Column::Uuid.eq(id))
            .one(db)
            .await?;
        Ok(record.map(Self::from_model))
    }

    pub async fn find_by_email<C: ConnectionTrait>(
        db: &C,
        email: &str,
    ) -> Result<Option<Self>, DbErr> {
        let record = user::Entity::find()
            .filter(user::Column::Email.eq(email))
            .one(db)
            .await?;
        Ok(record.map(Self::from_model))
    }

    pub async fn create<C: ConnectionTrait>(
        db: &C,
        data: &CreateUser,
        user_id: Uuid,
    ) -> Result<Self, UserError> {
        data.validate()
            .map_err(|err| UserError::Validation(err.to_string()))?;

        let now = Utc::now();
        let active = user::ActiveModel {
            uuid: Set(user_id),
            fullname: Set(data.fullname.clone()),
            email: Set(data.email.clone()),
            password: Set(data.password.clone()),
            role: Set(data.role.clone().unwrap_or_else(|| "user".to_string())),
            is_active: Set(true),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
            ..Default::default()
        };

        let model = active.insert(db).await.map_err(map_insert_err)?;
        Ok(Self::from_model(model))
    }

    pub async fn update<C: ConnectionTrait>(
        db: &C,
        id: Uuid,
        payload: &UpdateUser,
    ) -> Result<Self, UserError> {
        payload
            .validate()
            .map_err(|err| UserError::Validation(err.to_string()))?;

        let record = user::Entity::find()
            .filter(user::Column::Uuid.eq(id))
            .one(db)
            .await?
            .ok_or(UserError::UserNotFound)?;

        let mut active: user::ActiveModel = record.into();
        if let Some(fullname) = payload.fullname.clone() {
            active.fullname = Set(fullname);
        }
        if let Some(email) = payload.email.clone() {
            active.email = Set(email);
        }
        if let Some(password) = payload.password.clone() {
            active.password = Set(password);
        }
        if let Some(role) = payload.role.clone() {
            active.role = Set(role);
        }
        if let Some(is_active) = payload.is_active {
            active.is_active = Set(is_active);
        }
        active.updated_at = Set(Utc::now().into());

        let updated = active.update(db).await.map_err(map_insert_err)?;
        Ok(Self::from_model(updated))
    }

    pub async fn delete<C: ConnectionTrait>(db: &C, id: Uuid) -> Result<u64, DbErr> {
        let result = user::Entity::delete_many()
            .filter(user::Column::Uuid.eq(id))
            .exec(db)
            .await?;
        Ok(result.rows_affected)
    }
}

#[cfg(test)]
mod tests {
    use sea_orm::Database;
    use sea_orm_migration::MigratorTrait;

    use super::*;

    async fn setup_db() -> sea_orm::DatabaseConnection {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        db_migration::Migrator::up(&db, None).await.unwrap();
        db
    }

    fn ada() -> CreateUser {
        CreateUser {
            fullname: "Ada Lovelace".to_string(),
            email: "ada@example.com".to_string(),
            password: "secret1".to_string(),
            role: None,
        }
    }

    #[tokio::test]
    async fn create_applies_defaults() {
        let db = setup_db().await;
        let user = User::create(&db, &ada(), Uuid::new_v4()).await.unwrap();

        assert_eq!(user.role, "user");
        assert!(user.is_active);
        assert_eq!(user.password, "secret1");
        assert!(user.updated_at >= user.created_at);
    }

    #[tokio::test]
    async fn duplicate_email_is_rejected_and_first_record_survives() {
        let db = setup_db().await;
        let first = User::create(&db, &ada(), Uuid::new_v4()).await.unwrap();

        let second = CreateUser {
            fullname: "Ada Byron".to_string(),
            ..ada()
        };
        let err = User::create(&db, &second, Uuid::new_v4())
            .await
            .unwrap_err();
        assert!(matches!(err, UserError::EmailTaken));

        let survivor = User::find_by_email(&db, "ada@example.com")
            .await
            .unwrap()
            .expect("first user intact");
        assert_eq!(survivor.id, first.id);
        assert_eq!(survivor.fullname, "Ada Lovelace");
    }

    #[tokio::test]
    async fn field_constraints_are_enforced_before_persistence() {
        let db = setup_db().await;

        let short_name = CreateUser {
            fullname: "Al".to_string(),
            ..ada()
        };
        assert!(matches!(
            User::create(&db, &short_name, Uuid::new_v4()).await,
            Err(UserError::Validation(_))
        ));

        let bad_email = CreateUser {
            email: "not-an-email".to_string(),
            ..ada()
        };
        assert!(matches!(
            User::create(&db, &bad_email, Uuid::new_v4()).await,
            Err(UserError::Validation(_))
        ));

        let short_password = CreateUser {
            password: "12345".to_string(),
            ..ada()
        };
        assert!(matches!(
            User::create(&db, &short_password, Uuid::new_v4()).await,
            Err(UserError::Validation(_))
        ));

        assert!(User::find_all(&db).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn update_moves_updated_at_but_never_created_at() {
        let db = setup_db().await;
        let user_id = Uuid::new_v4();
        let created = User::create(&db, &ada(), user_id).await.unwrap();

        tokio::time::sleep(std::time::Duration::from_millis(10)).await;

        let updated = User::update(
            &db,
            user_id,
            &UpdateUser {
                fullname: Some("Ada King".to_string()),
                email: None,
                password: None,
                role: None,
                is_active: Some(false),
            },
        )
        .await
        .unwrap();

        assert_eq!(updated.created_at, created.created_at);
        assert!(updated.updated_at > created.updated_at);
        assert_eq!(updated.fullname, "Ada King");
        assert!(!updated.is_active);
    }

    #[tokio::test]
    async fn equality_is_identity_based() {
        let db = setup_db().await;
        let user_id = Uuid::new_v4();
        let created = User::create(&db, &ada(), user_id).await.unwrap();
        let renamed = User::update(
            &db,
            user_id,
            &UpdateUser {
                fullname: Some("Ada King".to_string()),
                email: None,
                password: None,
                role: None,
                is_active: None,
            },
        )
        .await
        .unwrap();

        assert_eq!(created, renamed);
    }
}
