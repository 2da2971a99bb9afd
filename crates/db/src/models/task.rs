use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, QueryOrder,
    Set,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;
use validator::Validate;

pub use crate::types::Priority;

use crate::{entities::task, models::ids};

#[derive(Debug, Error)]
pub enum TaskError {
    #[error(transparent)]
    Database(#[from] DbErr),
    #[error("Task not found")]
    TaskNotFound,
    #[error("User not found")]
    UserNotFound,
    #[error("Category not found")]
    CategoryNotFound,
    #[error("Validation failed: {0}")]
    Validation(String),
}

/// A work item. Always linked to exactly one user and one category; the
/// status label is caller-defined free text, orthogonal to `completed`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub status: String,
    pub due_date: DateTime<Utc>,
    pub priority: Priority,
    pub user_id: Uuid,
    pub category_id: Uuid,
    pub completed: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PartialEq for Task {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Task {}

impl std::hash::Hash for Task {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateTask {
    #[validate(length(min = 1, max = 100, message = "title must be between 1 and 100 characters"))]
    pub title: String,
    pub description: Option<String>,
    #[validate(length(min = 1, max = 20, message = "status must be between 1 and 20 characters"))]
    pub status: String,
    pub due_date: DateTime<Utc>,
    pub priority: Priority,
    pub user_id: Uuid,
    pub category_id: Uuid,
    pub completed: Option<bool>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateTask {
    #[validate(length(min = 1, max = 100, message = "title must be between 1 and 100 characters"))]
    pub title: Option<String>,
    pub description: Option<String>,
    #[validate(length(min = 1, max = 20, message = "status must be between 1 and 20 characters"))]
    pub status: Option<String>,
    pub due_date: Option<DateTime<Utc>>,
    pub priority: Option<Priority>,
    pub completed: Option<bool>,
}

impl Task {
    pub(crate) async fn from_model<C: ConnectionTrait>(
        db: &C,
        model: task::Model,
    ) -> Result<Self, DbErr> {
        let user_id = ids::user_uuid_by_id(db, model.user_id)
            .await?
            .ok_or(DbErr::RecordNotFound("User not found".to_string()))?;
        let category_id = ids::category_uuid_by_id(db, model.category_id)
            .await?
            .ok_or(DbErr::RecordNotFound("Category not found".to_string()))?;

        Ok(Self {
            id: model.uuid,
            title: model.title,
            description: model.description,
            status: model.status,
            due_date: model.due_date.into(),
            priority: model.priority,
            user_id,
            category_id,
            completed: model.completed,
            created_at: model.created_at.into(),
            updated_at: model.updated_at.into(),
        })
    }

    async fn collect<C: ConnectionTrait>(
        db: &C,
        models: Vec<task::Model>,
    ) -> Result<Vec<Self>, DbErr> {
        let mut tasks = Vec::with_capacity(models.len());
        for model in models {
            tasks.push(Self::from_model(db, model).await?);
        }
        Ok(tasks)
    }

    pub async fn find_all<C: ConnectionTrait>(db: &C) -> Result<Vec<Self>, TaskError> {
        let models = task::Entity::find()
            .order_by_desc(task::Column::CreatedAt)
            .all(db)
            .await?;
        Ok(Self::collect(db, models).await?)
    }

    pub async fn find_by_id<C: ConnectionTrait>(
        db: &C,
        id: Uuid,
    ) -> Result<Option<Self>, DbErr> {
        let record = task::Entity::find()
            .filter(task::Column::Uuid.eq(id))
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
    ) -> Result<Vec<Self>, TaskError> {
        let user_row_id = ids::user_id_by_uuid(db, user_id)
            .await?
            .ok_or(TaskError::UserNotFound)?;
        let models = task::Entity::find()
            .filter(task::Column::UserId.eq(user_row_id))
            .order_by_desc(task::Column::CreatedAt)
            .all(db)
            .await?;
        Ok(Self::collect(db, models).await?)
    }

    pub async fn find_by_category_id<C: ConnectionTrait>(
        db: &C,
        category_id: Uuid,
    ) -> Result<Vec<Self>, TaskError> {
        let category_row_id = ids::category_id_by_uuid(db, category_id)
            .await?
            .ok_or(TaskError::CategoryNotFound)?;
        let models = task::Entity::find()
            .filter(task::Column::CategoryId.eq(category_row_id))
            .order_by_desc(task::Column::CreatedAt)
            .all(db)
            .await?;
        Ok(Self::collect(db, models).await?)
    }

    pub async fn create<C: ConnectionTrait>(
        db: &C,
        data: &CreateTask,
        task_id: Uuid,
    ) -> Result<Self, TaskError> {
        data.validate()
            .map_err(|err| TaskError::Validation(err.to_string()))?;

        let user_row_id = ids::user_id_by_uuid(db, data.user_id)
            .await?
            .ok_or(TaskError::UserNotFound)?;
        let category_row_id = ids::category_id_by_uuid(db, data.category_id)
            .await?
            .ok_or(TaskError::CategoryNotFound)?;

        let now = Utc::now();
        let active = task::ActiveModel {
            uuid: Set(task_id),
            title: Set(data.title.clone()),
            description: Set(data.description.clone()),
            status: Set(data.status.clone()),
            due_date: Set(data.due_date.into()),
            priority: Set(data.priority.clone()),
            user_id: Set(user_row_id),
            category_id: Set(category_row_id),
            completed: Set(data.completed.unwrap_or(false)),
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
        payload: &UpdateTask,
    ) -> Result<Self, TaskError> {
        payload
            .validate()
            .map_err(|err| TaskError::Validation(err.to_string()))?;

        let record = task::Entity::find()
            .filter(task::Column::Uuid.eq(id))
            .one(db)
            .await?
            .ok_or(TaskError::TaskNotFound)?;

        let mut active: task::ActiveModel = record.into();
        if let Some(title) = payload.title.clone() {
            active.title = Set(title);
        }
        if payload.description.is_some() {
            active.description = Set(payload.description.clone());
        }
        if let Some(status) = payload.status.clone() {
            active.status = Set(status);
        }
        if let Some(due_date) = payload.due_date {
            active.due_date = Set(due_date.into());
        }
        if let Some(priority) = payload.priority.clone() {
            active.priority = Set(priority);
        }
        if let Some(completed) = payload.completed {
            active.completed = Set(completed);
        }
        active.updated_at = Set(Utc::now().into());

        let updated = active.update(db).await?;
        Ok(Self::from_model(db, updated).await?)
    }

    pub async fn set_completed<C: ConnectionTrait>(
        db: &C,
        id: Uuid,
        completed: bool,
    ) -> Result<Self, TaskError> {
        let record = task::Entity::find()
            .filter(task::Column::Uuid.eq(id))
            .one(db)
            .await?
            .ok_or(TaskError::TaskNotFound)?;

        let mut active: task::ActiveModel = record.into();
        active.completed = Set(completed);
        active.updated_at = Set(Utc::now().into());

        let updated = active.update(db).await?;
        Ok(Self::from_model(db, updated).await?)
    }

    /// Move a task to another category in one update, so the old category's
    /// task collection and the task's own reference can never disagree.
    pub async fn set_category<C: ConnectionTrait>(
        db: &C,
        id: Uuid,
        category_id: Uuid,
    ) -> Result<Self, TaskError> {
        let category_row_id = ids::category_id_by_uuid(db, category_id)
            .await?
            .ok_or(TaskError::CategoryNotFound)?;

        let record = task::Entity::find()
            .filter(task::Column::Uuid.eq(id))
            .one(db)
            .await?
            .ok_or(TaskError::TaskNotFound)?;

        let mut active: task::ActiveModel = record.into();
        active.category_id = Set(category_row_id);
        active.updated_at = Set(Utc::now().into());

        let updated = active.update(db).await?;
        Ok(Self::from_model(db, updated).await?)
    }

    pub async fn delete<C: ConnectionTrait>(db: &C, id: Uuid) -> Result<u64, DbErr> {
        let result = task::Entity::delete_many()
            .filter(task::Column::Uuid.eq(id))
            .exec(db)
            .await?;
        Ok(result.rows_affected)
    }
}

#[cfg(test)]
mod tests {
    use sea_orm::Database;
    use sea_orm_migration::MigratorTrait;

    use crate::models::{
        category::{Category, CreateCategory},
        user::{CreateUser, User},
    };

    use super::*;

    async fn setup_db() -> sea_orm::DatabaseConnection {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        db_migration::Migrator::up(&db, None).await.unwrap();
        db
    }

    async fn seed_user_and_category(
        db: &sea_orm::DatabaseConnection,
    ) -> (Uuid, Uuid) {
        let user_id = Uuid::new_v4();
        User::create(
            db,
            &CreateUser {
                fullname: "Ada Lovelace".to_string(),
                email: "ada@example.com".to_string(),
                password: "secret1".to_string(),
                role: None,
            },
            user_id,
        )
        .await
        .unwrap();

        let category_id = Uuid::new_v4();
        Category::create(
            db,
            &CreateCategory {
                name: "Work".to_string(),
                description: None,
                color: None,
                user_id: Some(user_id),
            },
            category_id,
        )
        .await
        .unwrap();

        (user_id, category_id)
    }

    fn write_report(user_id: Uuid, category_id: Uuid) -> CreateTask {
        CreateTask {
            title: "Write report".to_string(),
            description: None,
            status: "pending".to_string(),
            due_date: Utc::now() + chrono::Duration::days(7),
            priority: Priority::High,
            user_id,
            category_id,
            completed: None,
        }
    }

    #[tokio::test]
    async fn create_links_user_and_category() {
        let db = setup_db().await;
        let (user_id, category_id) = seed_user_and_category(&db).await;

        let task_id = Uuid::new_v4();
        let task = Task::create(&db, &write_report(user_id, category_id), task_id)
            .await
            .unwrap();

        assert_eq!(task.id, task_id);
        assert_eq!(task.user_id, user_id);
        assert_eq!(task.category_id, category_id);
        assert_eq!(task.status, "pending");
        assert!(!task.completed);
    }

    #[tokio::test]
    async fn create_requires_existing_user_and_category() {
        let db = setup_db().await;
        let (user_id, category_id) = seed_user_and_category(&db).await;

        let missing_user = Task::create(
            &db,
            &write_report(Uuid::new_v4(), category_id),
            Uuid::new_v4(),
        )
        .await
        .unwrap_err();
        assert!(matches!(missing_user, TaskError::UserNotFound));

        let missing_category =
            Task::create(&db, &write_report(user_id, Uuid::new_v4()), Uuid::new_v4())
                .await
                .unwrap_err();
        assert!(matches!(missing_category, TaskError::CategoryNotFound));
    }

    #[tokio::test]
    async fn any_status_string_up_to_twenty_chars_is_accepted() {
        let db = setup_db().await;
        let (user_id, category_id) = seed_user_and_category(&db).await;

        let mut data = write_report(user_id, category_id);
        data.status = "waiting-on-legal".to_string();
        let task = Task::create(&db, &data, Uuid::new_v4()).await.unwrap();
        assert_eq!(task.status, "waiting-on-legal");

        let mut too_long = write_report(user_id, category_id);
        too_long.status = "a".repeat(21);
        assert!(matches!(
            Task::create(&db, &too_long, Uuid::new_v4()).await,
            Err(TaskError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn set_category_moves_the_task_atomically() {
        let db = setup_db().await;
        let (user_id, first_category) = seed_user_and_category(&db).await;
        let second_category = Uuid::new_v4();
        Category::create(
            &db,
            &CreateCategory {
                name: "Home".to_string(),
                description: None,
                color: None,
                user_id: Some(user_id),
            },
            second_category,
        )
        .await
        .unwrap();

        let task_id = Uuid::new_v4();
        Task::create(&db, &write_report(user_id, first_category), task_id)
            .await
            .unwrap();

        let moved = Task::set_category(&db, task_id, second_category)
            .await
            .unwrap();
        assert_eq!(moved.category_id, second_category);

        let old_tasks = Category::find_tasks(&db, first_category).await.unwrap();
        assert!(old_tasks.iter().all(|t| t.id != task_id));
        let new_tasks = Category::find_tasks(&db, second_category).await.unwrap();
        assert!(new_tasks.iter().any(|t| t.id == task_id));
    }

    #[tokio::test]
    async fn update_preserves_created_at() {
        let db = setup_db().await;
        let (user_id, category_id) = seed_user_and_category(&db).await;
        let task_id = Uuid::new_v4();
        let created = Task::create(&db, &write_report(user_id, category_id), task_id)
            .await
            .unwrap();

        tokio::time::sleep(std::time::Duration::from_millis(10)).await;

        let updated = Task::update(
            &db,
            task_id,
            &UpdateTask {
                title: None,
                description: Some("quarterly numbers".to_string()),
                status: Some("done".to_string()),
                due_date: None,
                priority: Some(Priority::Low),
                completed: Some(true),
            },
        )
        .await
        .unwrap();

        assert_eq!(updated.created_at, created.created_at);
        assert!(updated.updated_at > created.updated_at);
        assert_eq!(updated.status, "done");
        assert_eq!(updated.priority, Priority::Low);
        assert!(updated.completed);
    }
}
