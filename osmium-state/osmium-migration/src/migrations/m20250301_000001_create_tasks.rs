use sea_orm_migration::{
    prelude::{extension::postgres::Type, *},
    sea_orm::{ActiveEnum, DbBackend, Schema},
};

use crate::db_entities::{DbTaskStatus, Task};

const IDX_TASKS_STATUS_NEXT_RUN_AT: &str = "idx_tasks_status_next_run_at";
const IDX_TASKS_NEXT_RUN_AT_ID: &str = "idx_tasks_next_run_at_id";

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db_backend = manager.get_database_backend();

        if db_backend == DbBackend::Postgres {
            let schema = Schema::new(DbBackend::Postgres);

            manager
                .create_type(schema.create_enum_from_active_enum::<DbTaskStatus>())
                .await?;
        }

        manager
            .create_table(
                Table::create()
                    .table(Task::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Task::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Task::ClientId).uuid().not_null())
                    .col(ColumnDef::new(Task::RequestId).uuid())
                    .col(
                        ColumnDef::new(Task::Depends)
                            .array(ColumnType::Uuid)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Task::Locks)
                            .array(ColumnType::Uuid)
                            .not_null(),
                    )
                    .col(ColumnDef::new(Task::TaskType).text().not_null())
                    .col(ColumnDef::new(Task::Body).json_binary().not_null())
                    .col(
                        ColumnDef::new(Task::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Task::Status)
                            .custom(DbTaskStatus::name())
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Task::Attempts)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(Task::LastRunAt).timestamp_with_time_zone())
                    .col(ColumnDef::new(Task::NextRunAt).timestamp_with_time_zone())
                    .col(ColumnDef::new(Task::Log).json_binary().not_null())
                    .to_owned(),
            )
            .await?;

        // Serves the runnable-task query's filter.
        manager
            .create_index(
                Index::create()
                    .name(IDX_TASKS_STATUS_NEXT_RUN_AT)
                    .table(Task::Table)
                    .col(Task::Status)
                    .col(Task::NextRunAt)
                    .to_owned(),
            )
            .await?;

        // Serves the runnable-task query's ordering.
        manager
            .create_index(
                Index::create()
                    .name(IDX_TASKS_NEXT_RUN_AT_ID)
                    .table(Task::Table)
                    .col(Task::NextRunAt)
                    .col(Task::Id)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(Index::drop().name(IDX_TASKS_NEXT_RUN_AT_ID).to_owned())
            .await?;

        manager
            .drop_index(Index::drop().name(IDX_TASKS_STATUS_NEXT_RUN_AT).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Task::Table).to_owned())
            .await?;

        if manager.get_database_backend() == DbBackend::Postgres {
            manager
                .drop_type(Type::drop().name(DbTaskStatus::name()).to_owned())
                .await?;
        }

        Ok(())
    }
}
