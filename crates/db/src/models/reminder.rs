use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, QueryOrder,
    Set,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::{entities::reminder, models::ids};

#[derive(Debug, Error)]
pub enum ReminderError {
    #[error(transparent)]
    Database(#[from] DbErr),
    #[error("Reminder not found")]
    ReminderNotFound,
    #[error("Task not found")]
    TaskNotFound,
}

/// A scheduled notification for a task. Delivery itself is an external
/// collaborator; this record only tracks whether it happened.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reminder {
    pub id: Uuid,
    pub task_id: Uuid,
    pub reminder_time: DateTime<Utc>,
    pub message: Option<String>,
    pub sent: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PartialEq for Reminder {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Reminder {}

impl std::hash::Hash for Reminder {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateReminder {
    pub task_id: Uuid,
    pub reminder_time: DateTime<Utc>,
    pub message: Option<String>,
}

impl Reminder {
    async fn from_model<C: ConnectionTrait>(
        db: &C,
        model: reminder::Model,
    ) -> Result<Self, DbErr> {
        let task_id = ids::task_uuid_by_id(db, model.task_id)
            .await?
            .ok_or(DbErr::RecordNotFound("Task not found".to_string()))?;

        Ok(Self {
            id: model.uuid,
            task_id,
            reminder_time: model.reminder_time.into(),
            message: model.message,
            sent: model.sent,
            created_at: model.created_at.into(),
            updated_at: model.updated_at.into(),
        })
    }

    async fn collect<C: ConnectionTrait>(
        db: &C,
        models: Vec<reminder::Model>,
    ) -> Result<Vec<Self>, DbErr> {
        let mut reminders = Vec::with_capacity(models.len());
        for model in models {
            reminders.push(Self::from_model(db, model).await?);
        }
        Ok(reminders)
    }

    pub async fn find_all<C: ConnectionTrait>(db: &C) -> Result<Vec<Self>, ReminderError> {
        let models = reminder::Entity::find()
            .order_by_asc(reminder::Column::ReminderTime)
            .all(db)
            .await?;
        Ok(Self::collect(db, models).await?)
    }

    pub async fn find_by_id<C: ConnectionTrait>(
        db: &C,
        id: Uuid,
    ) -> Result<Option<Self>, DbErr> {
        let record = reminder::Entity::find()
            .filter(reminder::Column::Uuid.eq(id))
            .one(db)
            .await?;

        match record {
            Some(model) => Ok(Some(Self::from_model(db, model).await?)),
            None => Ok(None),
        }
    }

    pub async fn find_by_task_id<C: ConnectionTrait>(
        db: &C,
        task_id: Uuid,
    ) -> Result<Vec<Self>, ReminderError> {
        let task_row_id = ids::task_id_by_uuid(db, task_id)
            .await?
            .ok_or(ReminderError::TaskNotFound)?;
        let models = reminder::Entity::find()
            .filter(reminder::Column::TaskId.eq(task_row_id))
            .order_by_asc(reminder::Column::ReminderTime)
            .all(db)
            .await?;
        Ok(Self::collect(db, models).await?)
    }

    /// Reminders due for delivery: unsent, with a reminder time at or before
    /// `before`.
    pub async fn find_unsent<C: ConnectionTrait>(
        db: &C,
        before: DateTime<Utc>,
    ) -> Result<Vec<Self>, ReminderError> {
        let models = reminder::Entity::find()
            .filter(reminder::Column::Sent.eq(false))
            .filter(reminder::Column::ReminderTime.lte(before))
            .order_by_asc(reminder::Column::ReminderTime)
            .all(db)
            .await?;
        Ok(Self::collect(db, models).await?)
    }

    pub async fn create<C: ConnectionTrait>(
        db: &C,
        data: &CreateReminder,
        reminder_id: Uuid,
    ) -> Result<Self, ReminderError> {
        let task_row_id = ids::task_id_by_uuid(db, data.task_id)
            .await?
            .ok_or(ReminderError::TaskNotFound)?;

        let now = Utc::now();
        let active = reminder::ActiveModel {
            uuid: Set(reminder_id),
            task_id: Set(task_row_id),
            reminder_time: Set(data.reminder_time.into()),
            message: Set(data.message.clone()),
            sent: Set(false),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
            ..Default::default()
        };

        let model = active.insert(db).await?;
        Ok(Self::from_model(db, model).await?)
    }

    /// Flip `sent` to true. Already-sent reminders are returned unchanged,
    /// so the transition happens at most once.
    pub async fn mark_sent<C: ConnectionTrait>(
        db: &C,
        id: Uuid,
    ) -> Result<Self, ReminderError> {
        let record = reminder::Entity::find()
            .filter(reminder::Column::Uuid.eq(id))
            .one(db)
            .await?
            .ok_or(ReminderError::ReminderNotFound)?;

        if record.sent {
            return Ok(Self::from_model(db, record).await?);
        }

        let mut active: reminder::ActiveModel = record.into();
        active.sent = Set(true);
        active.updated_at = Set(Utc::now().into());

        let updated = active.update(db).await?;
        Ok(Self::from_model(db, updated).await?)
    }

    pub async fn delete<C: ConnectionTrait>(db: &C, id: Uuid) -> Result<u64, DbErr> {
        let result = reminder::Entity::delete_many()
            .filter(reminder::Column::Uuid.eq(id))
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
        task::{CreateTask, Priority, Task},
        user::{CreateUser, User},
    };

    use super::*;

    async fn setup_db() -> sea_orm::DatabaseConnection {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        db_migration::Migrator::up(&db, None).await.unwrap();
        db
    }

    async fn seed_task(db: &sea_orm::DatabaseConnection) -> Uuid {
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

        let task_id = Uuid::new_v4();
        Task::create(
            db,
            &CreateTask {
                title: "Write report".to_string(),
                description: None,
                status: "pending".to_string(),
                due_date: Utc::now() + chrono::Duration::days(7),
                priority: Priority::High,
                user_id,
                category_id,
                completed: None,
            },
            task_id,
        )
        .await
        .unwrap();
        task_id
    }

    #[tokio::test]
    async fn create_requires_an_existing_task() {
        let db = setup_db().await;
        let err = Reminder::create(
            &db,
            &CreateReminder {
                task_id: Uuid::new_v4(),
                reminder_time: Utc::now(),
                message: None,
            },
            Uuid::new_v4(),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ReminderError::TaskNotFound));
    }

    #[tokio::test]
    async fn mark_sent_transitions_at_most_once() {
        let db = setup_db().await;
        let task_id = seed_task(&db).await;

        let reminder_id = Uuid::new_v4();
        let created = Reminder::create(
            &db,
            &CreateReminder {
                task_id,
                reminder_time: Utc::now(),
                message: Some("ping".to_string()),
            },
            reminder_id,
        )
        .await
        .unwrap();
        assert!(!created.sent);

        let sent = Reminder::mark_sent(&db, reminder_id).await.unwrap();
        assert!(sent.sent);

        tokio::time::sleep(std::time::Duration::from_millis(10)).await;

        let again = Reminder::mark_sent(&db, reminder_id).await.unwrap();
        assert!(again.sent);
        assert_eq!(again.updated_at, sent.updated_at);
    }

    #[tokio::test]
    async fn find_unsent_filters_delivered_and_future_reminders() {
        let db = setup_db().await;
        let task_id = seed_task(&db).await;
        let now = Utc::now();

        let due = Reminder::create(
            &db,
            &CreateReminder {
                task_id,
                reminder_time: now - chrono::Duration::minutes(5),
                message: None,
            },
            Uuid::new_v4(),
        )
        .await
        .unwrap();
        let delivered = Reminder::create(
            &db,
            &CreateReminder {
                task_id,
                reminder_time: now - chrono::Duration::minutes(10),
                message: None,
            },
            Uuid::new_v4(),
        )
        .await
        .unwrap();
        Reminder::mark_sent(&db, delivered.id).await.unwrap();
        Reminder::create(
            &db,
            &CreateReminder {
                task_id,
                reminder_time: now + chrono::Duration::hours(1),
                message: None,
            },
            Uuid::new_v4(),
        )
        .await
        .unwrap();

        let unsent = Reminder::find_unsent(&db, now).await.unwrap();
        assert_eq!(unsent.len(), 1);
        assert_eq!(unsent[0].id, due.id);
    }

    #[tokio::test]
    async fn deleting_a_task_cascades_to_its_reminders() {
        let db = setup_db().await;
        let task_id = seed_task(&db).await;

        let reminder = Reminder::create(
            &db,
            &CreateReminder {
                task_id,
                reminder_time: Utc::now(),
                message: None,
            },
            Uuid::new_v4(),
        )
        .await
        .unwrap();

        Task::delete(&db, task_id).await.unwrap();
        assert!(
            Reminder::find_by_id(&db, reminder.id)
                .await
                .unwrap()
                .is_none()
        );
    }
}
