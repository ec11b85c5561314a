use osmium_common::{
    error::Error,
    registry::TaskRegistry,
    task::{Task, TaskBody, TaskHistoryRecord, TaskStatus},
};
use sea_orm::{
    prelude::Expr,
    sea_query::{Alias, SimpleExpr},
    DbErr, Set,
};

use crate::entities::{sea_orm_active_enums, tasks};

const TASK_STATUS_DB_ENUM_NAME: &str = "task_status";

pub(crate) fn db_error_to_domain(e: DbErr) -> Error {
    Error::Database(e.to_string())
}

pub(crate) fn task_to_domain(model: tasks::Model, registry: &TaskRegistry) -> Result<Task, Error> {
    let log: Vec<TaskHistoryRecord> = serde_json::from_value(model.log)?;

    let mut task = Task {
        id: model.id,
        client_id: model.client_id,
        request_id: model.request_id,
        depends: model.depends,
        locks: model.locks,
        task_type: model.task_type,
        body: TaskBody::from_raw(model.body),
        created_at: model.created_at.into(),
        status: task_status_to_domain(model.status),
        attempts: model.attempts,
        last_run_at: model.last_run_at.map(|t| t.into()),
        next_run_at: model.next_run_at.map(|t| t.into()),
        log,
    };

    registry.decode_body(&mut task)?;

    Ok(task)
}

pub(crate) fn task_to_active_model(task: &Task) -> Result<tasks::ActiveModel, Error> {
    Ok(tasks::ActiveModel {
        id: Set(task.id),
        client_id: Set(task.client_id),
        request_id: Set(task.request_id),
        depends: Set(task.depends.clone()),
        locks: Set(task.locks.clone()),
        task_type: Set(task.task_type.clone()),
        body: Set(task.body.raw().clone()),
        created_at: Set(task.created_at.into()),
        status: Set(domain_task_status_to_db(task.status)),
        attempts: Set(task.attempts),
        last_run_at: Set(task.last_run_at.map(Into::into)),
        next_run_at: Set(task.next_run_at.map(Into::into)),
        log: Set(serde_json::to_value(&task.log)?),
    })
}

pub(crate) fn task_status_to_domain(model: sea_orm_active_enums::TaskStatus) -> TaskStatus {
    match model {
        sea_orm_active_enums::TaskStatus::Cancelled => TaskStatus::Cancelled,
        sea_orm_active_enums::TaskStatus::Failed => TaskStatus::Failed,
        sea_orm_active_enums::TaskStatus::Pending => TaskStatus::Pending,
        sea_orm_active_enums::TaskStatus::Complete => TaskStatus::Complete,
        sea_orm_active_enums::TaskStatus::Paused => TaskStatus::Paused,
        sea_orm_active_enums::TaskStatus::Running => TaskStatus::Running,
    }
}

pub(crate) fn domain_task_status_to_db(model: TaskStatus) -> sea_orm_active_enums::TaskStatus {
    match model {
        TaskStatus::Cancelled => sea_orm_active_enums::TaskStatus::Cancelled,
        TaskStatus::Failed => sea_orm_active_enums::TaskStatus::Failed,
        TaskStatus::Pending => sea_orm_active_enums::TaskStatus::Pending,
        TaskStatus::Complete => sea_orm_active_enums::TaskStatus::Complete,
        TaskStatus::Paused => sea_orm_active_enums::TaskStatus::Paused,
        TaskStatus::Running => sea_orm_active_enums::TaskStatus::Running,
    }
}

pub(crate) fn task_status_as_expr(model: TaskStatus) -> SimpleExpr {
    Expr::val(model.to_string()).cast_as(Alias::new(TASK_STATUS_DB_ENUM_NAME))
}
