use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;
use validator::Validate;

use crate::{
    entities::{category, task},
    models::{ids, task::Task},
};

#[derive(Debug, Error)]
pub enum CategoryError {
    #[error(transparent)]
    Database(#[from] DbErr),
    #[error("Category not found")]
    CategoryNotFound,
    #[error("User not found")]
    UserNotFound,
    #[error("Validation failed: {0}")]
    Validation(String),
}

/// Named grouping of tasks, optionally owned by a user. The task collection
/// is a view over `tasks.category_id`, never stored on the category itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub color: Option<String>,
    pub user_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PartialEq for Category {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Category {}

impl std::hash::Hash for Category {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

/// Derived aggregates over a category's tasks, recomputed on every call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskCounts {
    pub total: u64,
    pub completed: u64,
    pub pending: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateCategory {
    #[validate(length(min = 1, max = 100, message = "name must be between 1 and 100 characters"))]
    pub name: String,
    pub description: Option<String>,
    pub color: Option<String>,
    pub user_id: Option<Uuid>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateCategory {
    #[validate(length(min = 1, max = 100, message = "name must be between 1 and 100 characters"))]
    pub name: Option<String>,
    pub description: Option<String>,
    pub color: Option<String>,
}

impl Category {
    async fn from_model<C: ConnectionTrait>(
        db: &C,
        model: category::Model,
    ) -> Result<Self, DbErr> {
        let user_id = match model.user_id {
            Some(id) => ids::user_uuid_by_id(db, id)
                .await?
                .ok_or(DbErr::RecordNotFound("User not found".to_string()))
                .map(Some)?,
            None => None,
        };

        Ok(Self {
            id: model.uuid,
            name: model.name,
            description: model.description,
            color: model.color,
            user_id,
            created_at: model.created_at.into(),
            updated_at: model.updated_at.into(),
        })
    }

    pub async fn find_all<C: ConnectionTrait>(db: &C) -> Result<Vec<Self>, CategoryError> {
        let records = category::Entity::find()
            .order_by_desc(category::Column::CreatedAt)
            .all(db)
            .await?;

        let mut categories = Vec::with_capacity(records.len());
        for record in records {
            categories.push(Self::from_model(db, record).await?);
        }
        Ok(categories)
    }

    pub async fn find_by_id<C: ConnectionTrait>(
        db: &C,
        id: Uuid,
    ) -> Result<Option<Self>, DbErr> {
        let record = category::Entity::find()
            .filter(category::Column::Uuid.eq(id))
            .one(db)
            .await?;

        match record {
            Some(model) => Ok(Some(Self::from_model(db, model).await?)),
            None => Ok(None),
        }
    }

    pub async fn find_by_user_id<C: ConnectionTrait>(
        db: &C,
        user_id: Uuid,
    ) -> Result<Vec<Self>, CategoryError> {
        let user_row_id = ids::user_id_by_uuid(db, user_id)
            .await?
            .ok_or(CategoryError::UserNotFound)?;
        let records = category::Entity::find()
            .filter(category::Column::UserId.eq(user_row_id))
            .order_by_desc(category::Column::CreatedAt)
            .all(db)
            .await?;

        let mut categories = Vec::with_capacity(records.len());
        for record in records {
            categories.push(Self::from_model(db, record).await?);
        }
        Ok(categories)
    }

    pub async fn create<C: ConnectionTrait>(
        db: &C,
        data: &CreateCategory,
        category_id: Uuid,
    ) -> Result<Self, CategoryError> {
        data.validate()
            .map_err(|err| CategoryError::Validation(err.to_string()))?;

        let user_row_id = match data.user_id {
            Some(user_id) => ids::user_id_by_uuid(db, user_id)
                .await?
                .ok_or(CategoryError::UserNotFound)
                .map(Some)?,
            None => None,
        };

        let now = Utc::now();
        let active = category::ActiveModel {
            uuid: Set(category_id),
            name: Set(data.name.clone()),
            description: Set(data.description.clone()),
            color: Set(data.color.clone()),
            user_id: Set(user_row_id),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
            ..Default::default()
        };

        let model = active.insert(db).await?;
        Ok(Self::from_model(db, model).await?)
    }

    pub async fn update<C: ConnectionTrait>(
        db: &C,
        id: Uuid,
        payload: &UpdateCategory,
    ) -> Result<Self, CategoryError> {
        payload
            .validate()
            .map_err(|err| CategoryError::Validation(err.to_string()))?;

        let record = category::Entity::find()
            .filter(category::Column::Uuid.eq(id))
            .one(db)
            .await?
            .ok_or(CategoryError::CategoryNotFound)?;

        let mut active: category::ActiveModel = record.into();
        if let Some(name) = payload.name.clone() {
            active.name = Set(name);
        }
        if payload.description.is_some() {
            active.description = Set(payload.description.clone());
        }
        if payload.color.is_some() {
            active.color = Set(payload.color.clone());
        }
        active.updated_at = Set(Utc::now().into());

        let updated = active.update(db).await?;
        Ok(Self::from_model(db, updated).await?)
    }

    /// The category's task collection, derived from the task table.
    pub async fn find_tasks<C: ConnectionTrait>(
        db: &C,
        id: Uuid,
    ) -> Result<Vec<Task>, CategoryError> {
        let category_row_id = ids::category_id_by_uuid(db, id)
            .await?
            .ok_or(CategoryError::CategoryNotFound)?;
        let models = task::Entity::find()
            .filter(task::Column::CategoryId.eq(category_row_id))
            .order_by_desc(task::Column::CreatedAt)
            .all(db)
            .await?;

        let mut tasks = Vec::with_capacity(models.len());
        for model in models {
            tasks.push(Task::from_model(db, model).await?);
        }
        Ok(tasks)
    }

    pub async fn task_counts<C: ConnectionTrait>(
        db: &C,
        id: Uuid,
    ) -> Result<TaskCounts, CategoryError> {
        let category_row_id = ids::category_id_by_uuid(db, id)
            .await?
            .ok_or(CategoryError::CategoryNotFound)?;

        let total = task::Entity::find()
            .filter(task::Column::CategoryId.eq(category_row_id))
            .count(db)
            .await?;
        let completed = task::Entity::find()
            .filter(task::Column::CategoryId.eq(category_row_id))
            .filter(task::Column::Completed.eq(true))
            .count(db)
            .await?;
        let pending = task::Entity::find()
            .filter(task::Column::CategoryId.eq(category_row_id))
            .filter(task::Column::Completed.eq(false))
            .count(db)
            .await?;

        Ok(TaskCounts {
            total,
            completed,
            pending,
        })
    }

    /// Delete the category; the store cascades away every owned task and,
    /// through the task FK, their reminders.
    pub async fn delete<C: ConnectionTrait>(db: &C, id: Uuid) -> Result<u64, DbErr> {
        let result = category::Entity::delete_many()
            .filter(category::Column::Uuid.eq(id))
            .exec(db)
            .await?;
        Ok(result.rows_affected)
    }
}
