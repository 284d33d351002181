use async_trait::async_trait;
use sea_orm::{ActiveModelTrait, ConnectionTrait, DbErr, EntityTrait, IntoActiveModel, Set};
use uuid::Uuid;

use crate::entity::{
    fact_conservation_temperature, fact_defrost_resistance, fact_freezing_temperature,
    fact_ice_cream_operation, fact_soda_operation,
};
use crate::error::AppResult;
use crate::load::MetricSink;
use crate::pipeline::{AverageRow, DefrostRow, MetricRow};

/// Batch size for bulk inserts
const BATCH_SIZE: usize = 1000;

/// Appends metric rows to the fact tables, tagged with the run that produced them.
///
/// Generic over the connection so a run can write through a transaction.
pub struct DbSink<'a, C> {
    conn: &'a C,
    run_id: Uuid,
}

impl<'a, C> DbSink<'a, C> {
    pub fn new(conn: &'a C, run_id: Uuid) -> Self {
        Self { conn, run_id }
    }
}

fn count(value: u32) -> i32 {
    i32::try_from(value).unwrap_or(i32::MAX)
}

async fn insert_batches<C, A>(conn: &C, models: Vec<A>) -> Result<u64, DbErr>
where
    C: ConnectionTrait,
    A: ActiveModelTrait + Clone + Send + Sync,
    <A::Entity as EntityTrait>::Model: IntoActiveModel<A>,
{
    let mut written = 0;
    for chunk in models.chunks(BATCH_SIZE) {
        written += <A::Entity as EntityTrait>::insert_many(chunk.to_vec())
            .exec_without_returning(conn)
            .await?;
    }
    Ok(written)
}

#[async_trait]
impl<C> MetricSink for DbSink<'_, C>
where
    C: ConnectionTrait + Send + Sync,
{
    async fn write_soda(&self, rows: &[MetricRow]) -> AppResult<u64> {
        let models: Vec<fact_soda_operation::ActiveModel> = rows
            .iter()
            .map(|r| fact_soda_operation::ActiveModel {
                id: Set(Uuid::new_v4()),
                run_id: Set(self.run_id),
                date: Set(r.date),
                hour: Set(r.hour),
                location_id: Set(r.location_id.clone()),
                in_range_count: Set(count(r.in_range_count)),
                out_of_range_count: Set(count(r.out_of_range_count)),
                operational_ratio: Set(r.operational_ratio),
            })
            .collect();
        Ok(insert_batches(self.conn, models).await?)
    }

    async fn write_ice_cream(&self, rows: &[MetricRow]) -> AppResult<u64> {
        let models: Vec<fact_ice_cream_operation::ActiveModel> = rows
            .iter()
            .map(|r| fact_ice_cream_operation::ActiveModel {
                id: Set(Uuid::new_v4()),
                run_id: Set(self.run_id),
                date: Set(r.date),
                hour: Set(r.hour),
                location_id: Set(r.location_id.clone()),
                in_range_count: Set(count(r.in_range_count)),
                out_of_range_count: Set(count(r.out_of_range_count)),
                operational_ratio: Set(r.operational_ratio),
            })
            .collect();
        Ok(insert_batches(self.conn, models).await?)
    }

    async fn write_freezing(&self, rows: &[AverageRow]) -> AppResult<u64> {
        let models: Vec<fact_freezing_temperature::ActiveModel> = rows
            .iter()
            .map(|r| fact_freezing_temperature::ActiveModel {
                id: Set(Uuid::new_v4()),
                run_id: Set(self.run_id),
                date: Set(r.date),
                hour: Set(r.hour),
                location_id: Set(r.location_id.clone()),
                mean_temperature: Set(r.mean_value),
            })
            .collect();
        Ok(insert_batches(self.conn, models).await?)
    }

    async fn write_conservation(&self, rows: &[AverageRow]) -> AppResult<u64> {
        let models: Vec<fact_conservation_temperature::ActiveModel> = rows
            .iter()
            .map(|r| fact_conservation_temperature::ActiveModel {
                id: Set(Uuid::new_v4()),
                run_id: Set(self.run_id),
                date: Set(r.date),
                hour: Set(r.hour),
                location_id: Set(r.location_id.clone()),
                mean_temperature: Set(r.mean_value),
            })
            .collect();
        Ok(insert_batches(self.conn, models).await?)
    }

    async fn write_defrost_resistance(&self, rows: &[DefrostRow]) -> AppResult<u64> {
        let models: Vec<fact_defrost_resistance::ActiveModel> = rows
            .iter()
            .map(|r| fact_defrost_resistance::ActiveModel {
                id: Set(Uuid::new_v4()),
                run_id: Set(self.run_id),
                local_time: Set(r.local_timestamp),
                date: Set(r.date),
                hour: Set(r.hour),
                location_id: Set(r.location_id.clone()),
                device_name: Set(r.device_name.clone()),
                sensor_name: Set(r.sensor_name.clone()),
                value: Set(r.value),
            })
            .collect();
        Ok(insert_batches(self.conn, models).await?)
    }
}
