use sea_orm_migration::prelude::*;

/// Tables holding the hourly operational-compliance rows.
const OPERATION_TABLES: [&str; 2] = ["fact_soda_operation", "fact_ice_cream_operation"];

/// Tables holding the hourly mean temperature rows.
const TEMPERATURE_TABLES: [&str; 2] = [
    "fact_freezing_temperature",
    "fact_conservation_temperature",
];

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // ========== PIPELINE RUNS ==========
        manager
            .create_table(
                Table::create()
                    .table(PipelineRuns::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(PipelineRuns::Id)
                            .uuid()
                            .not_null()
                            .primary_key()
                            .extra("DEFAULT gen_random_uuid()"),
                    )
                    .col(ColumnDef::new(PipelineRuns::TargetDate).date().not_null())
                    .col(ColumnDef::new(PipelineRuns::Trigger).string_len(16).not_null())
                    .col(ColumnDef::new(PipelineRuns::Status).string_len(16).not_null())
                    .col(
                        ColumnDef::new(PipelineRuns::StartedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .extra("DEFAULT NOW()"),
                    )
                    .col(ColumnDef::new(PipelineRuns::FinishedAt).timestamp_with_time_zone())
                    .col(ColumnDef::new(PipelineRuns::ReadingsCount).integer())
                    .col(ColumnDef::new(PipelineRuns::UnmatchedCount).integer())
                    .col(ColumnDef::new(PipelineRuns::UnknownRoleCount).integer())
                    .col(ColumnDef::new(PipelineRuns::SodaRows).integer())
                    .col(ColumnDef::new(PipelineRuns::IceCreamRows).integer())
                    .col(ColumnDef::new(PipelineRuns::FreezingRows).integer())
                    .col(ColumnDef::new(PipelineRuns::ConservationRows).integer())
                    .col(ColumnDef::new(PipelineRuns::DefrostRows).integer())
                    .col(ColumnDef::new(PipelineRuns::ErrorMessage).text())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_pipeline_runs_started_at")
                    .table(PipelineRuns::Table)
                    .col(PipelineRuns::StartedAt)
                    .to_owned(),
            )
            .await?;

        // ========== OPERATION FACTS (soda, ice cream) ==========
        for table in OPERATION_TABLES {
            manager
                .create_table(
                    Table::create()
                        .table(Alias::new(table))
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Fact::Id)
                                .uuid()
                                .not_null()
                                .primary_key()
                                .extra("DEFAULT gen_random_uuid()"),
                        )
                        .col(ColumnDef::new(Fact::RunId).uuid().not_null())
                        .col(ColumnDef::new(Fact::Date).date().not_null())
                        .col(ColumnDef::new(Fact::Hour).time().not_null())
                        .col(ColumnDef::new(Fact::LocationId).string_len(64).not_null())
                        .col(ColumnDef::new(Fact::InRangeCount).integer().not_null())
                        .col(ColumnDef::new(Fact::OutOfRangeCount).integer().not_null())
                        .col(ColumnDef::new(Fact::OperationalRatio).double().not_null())
                        .foreign_key(&mut run_foreign_key(table))
                        .to_owned(),
                )
                .await?;

            manager.create_index(date_location_index(table)).await?;
        }

        // ========== TEMPERATURE FACTS (freezing, conservation) ==========
        for table in TEMPERATURE_TABLES {
            manager
                .create_table(
                    Table::create()
                        .table(Alias::new(table))
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Fact::Id)
                                .uuid()
                                .not_null()
                                .primary_key()
                                .extra("DEFAULT gen_random_uuid()"),
                        )
                        .col(ColumnDef::new(Fact::RunId).uuid().not_null())
                        .col(ColumnDef::new(Fact::Date).date().not_null())
                        .col(ColumnDef::new(Fact::Hour).time().not_null())
                        .col(ColumnDef::new(Fact::LocationId).string_len(64).not_null())
                        .col(ColumnDef::new(Fact::MeanTemperature).double().not_null())
                        .foreign_key(&mut run_foreign_key(table))
                        .to_owned(),
                )
                .await?;

            manager.create_index(date_location_index(table)).await?;
        }

        // ========== DEFROST RESISTANCE LOG ==========
        let defrost = "fact_defrost_resistance";
        manager
            .create_table(
                Table::create()
                    .table(Alias::new(defrost))
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Fact::Id)
                            .uuid()
                            .not_null()
                            .primary_key()
                            .extra("DEFAULT gen_random_uuid()"),
                    )
                    .col(ColumnDef::new(Fact::RunId).uuid().not_null())
                    .col(ColumnDef::new(Fact::LocalTime).timestamp().not_null())
                    .col(ColumnDef::new(Fact::Date).date().not_null())
                    .col(ColumnDef::new(Fact::Hour).time().not_null())
                    .col(ColumnDef::new(Fact::LocationId).string_len(64).not_null())
                    .col(ColumnDef::new(Fact::DeviceName).string_len(128).not_null())
                    .col(ColumnDef::new(Fact::SensorName).string_len(128).not_null())
                    .col(ColumnDef::new(Fact::Value).double().not_null())
                    .foreign_key(&mut run_foreign_key(defrost))
                    .to_owned(),
            )
            .await?;

        manager.create_index(date_location_index(defrost)).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        for table in OPERATION_TABLES
            .into_iter()
            .chain(TEMPERATURE_TABLES)
            .chain(["fact_defrost_resistance"])
        {
            manager
                .drop_table(Table::drop().table(Alias::new(table)).if_exists().to_owned())
                .await?;
        }

        manager
            .drop_table(Table::drop().table(PipelineRuns::Table).if_exists().to_owned())
            .await?;

        Ok(())
    }
}

fn run_foreign_key(table: &str) -> ForeignKeyCreateStatement {
    ForeignKey::create()
        .name(format!("fk_{table}_run"))
        .from(Alias::new(table), Fact::RunId)
        .to(PipelineRuns::Table, PipelineRuns::Id)
        .to_owned()
}

fn date_location_index(table: &str) -> IndexCreateStatement {
    Index::create()
        .name(format!("idx_{table}_date_location"))
        .table(Alias::new(table))
        .col(Fact::Date)
        .col(Fact::LocationId)
        .to_owned()
}

#[derive(DeriveIden)]
enum PipelineRuns {
    Table,
    Id,
    TargetDate,
    Trigger,
    Status,
    StartedAt,
    FinishedAt,
    ReadingsCount,
    UnmatchedCount,
    UnknownRoleCount,
    SodaRows,
    IceCreamRows,
    FreezingRows,
    ConservationRows,
    DefrostRows,
    ErrorMessage,
}

/// Columns shared by the fact tables.
#[derive(DeriveIden)]
enum Fact {
    Id,
    RunId,
    Date,
    Hour,
    LocationId,
    InRangeCount,
    OutOfRangeCount,
    OperationalRatio,
    MeanTemperature,
    LocalTime,
    DeviceName,
    SensorName,
    Value,
}
