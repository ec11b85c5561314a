use sea_orm_migration::prelude::*;
use sea_orm_migration::sea_orm::{DeriveActiveEnum, EnumIter};

#[derive(Iden)]
#[iden = "tasks"]
pub enum Task {
    Table,
    #[iden = "id"]
    Id,
    #[iden = "client_id"]
    ClientId,
    #[iden = "request_id"]
    RequestId,
    #[iden = "depends"]
    Depends,
    #[iden = "locks"]
    Locks,
    #[iden = "task_type"]
    TaskType,
    #[iden = "body"]
    Body,
    #[iden = "created_at"]
    CreatedAt,
    #[iden = "status"]
    Status,
    #[iden = "attempts"]
    Attempts,
    #[iden = "last_run_at"]
    LastRunAt,
    #[iden = "next_run_at"]
    NextRunAt,
    #[iden = "log"]
    Log,
}

#[derive(EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "task_status")]
pub enum DbTaskStatus {
    #[sea_orm(string_value = "CANCELLED")]
    Cancelled,
    #[sea_orm(string_value = "FAILED")]
    Failed,
    #[sea_orm(string_value = "PENDING")]
    Pending,
    #[sea_orm(string_value = "COMPLETE")]
    Complete,
    #[sea_orm(string_value = "PAUSED")]
    Paused,
    #[sea_orm(string_value = "RUNNING")]
    Running,
}
