use async_trait::async_trait;
use chrono::{DateTime, Utc};
use osmium_common::{
    error::Error,
    state::TaskStore,
    task::{Task, TaskStatus},
};
use sea_orm::{
    prelude::DateTimeWithTimeZone, sea_query::OnConflict, ColumnTrait, EntityTrait, QueryFilter,
    QueryOrder,
};
use tracing::warn;
use uuid::Uuid;

use crate::{
    db::PgStateDb,
    entities::tasks,
    mapping::{db_error_to_domain, domain_task_status_to_db, task_status_as_expr, task_to_active_model, task_to_domain},
};

impl PgStateDb {
    /// Decode a page of task rows, dropping rows whose type is unknown or
    /// whose body does not decode.
    fn decode_models(&self, models: Vec<tasks::Model>) -> Vec<Task> {
        let mut decoded = Vec::with_capacity(models.len());
        for model in models {
            let id = model.id;
            match task_to_domain(model, &self.registry) {
                Ok(task) => decoded.push(task),
                Err(e) => warn!("Skipping task {}: {}", id, e),
            }
        }
        decoded
    }
}

#[async_trait]
impl TaskStore for PgStateDb {
    async fn find_runnable(
        &self,
        max_attempts: i32,
        now: DateTime<Utc>,
    ) -> Result<Vec<Task>, Error> {
        let now: DateTimeWithTimeZone = now.into();

        let models = tasks::Entity::find()
            .filter(tasks::Column::Status.eq(domain_task_status_to_db(TaskStatus::Pending)))
            .filter(tasks::Column::Attempts.lt(max_attempts))
            .filter(tasks::Column::NextRunAt.lte(now))
            .order_by_asc(tasks::Column::NextRunAt)
            .order_by_asc(tasks::Column::Id)
            .all(&self.conn)
            .await
            .map_err(db_error_to_domain)?;

        Ok(self.decode_models(models))
    }

    async fn find_by_ids(&self, ids: &[Uuid]) -> Result<Vec<Task>, Error> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let models = tasks::Entity::find()
            .filter(tasks::Column::Id.is_in(ids.iter().copied()))
            .all(&self.conn)
            .await
            .map_err(db_error_to_domain)?;

        Ok(self.decode_models(models))
    }

    async fn upsert(&self, task: &Task) -> Result<(), Error> {
        let model = task_to_active_model(task)?;

        tasks::Entity::insert(model)
            .on_conflict(
                OnConflict::column(tasks::Column::Id)
                    .update_columns([
                        tasks::Column::ClientId,
                        tasks::Column::RequestId,
                        tasks::Column::Depends,
                        tasks::Column::Locks,
                        tasks::Column::TaskType,
                        tasks::Column::Body,
                        tasks::Column::CreatedAt,
                        tasks::Column::Status,
                        tasks::Column::Attempts,
                        tasks::Column::LastRunAt,
                        tasks::Column::NextRunAt,
                        tasks::Column::Log,
                    ])
                    .to_owned(),
            )
            .exec(&self.conn)
            .await
            .map_err(db_error_to_domain)?;

        Ok(())
    }

    async fn set_status(&self, task_id: Uuid, status: TaskStatus) -> Result<(), Error> {
        let res = tasks::Entity::update_many()
            .col_expr(tasks::Column::Status, task_status_as_expr(status))
            .filter(tasks::Column::Id.eq(task_id))
            .exec(&self.conn)
            .await
            .map_err(db_error_to_domain)?;

        if res.rows_affected == 0 {
            return Err(Error::NotFound {
                resource_type: "Task".to_string(),
                resource_id: task_id.to_string(),
            });
        }

        Ok(())
    }
}
