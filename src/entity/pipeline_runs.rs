use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// One execution of the daily pipeline, scheduled or manual.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "pipeline_runs")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub target_date: Date,
    pub trigger: String,
    pub status: String,
    pub started_at: DateTimeWithTimeZone,
    pub finished_at: Option<DateTimeWithTimeZone>,
    pub readings_count: Option<i32>,
    pub unmatched_count: Option<i32>,
    pub unknown_role_count: Option<i32>,
    pub soda_rows: Option<i32>,
    pub ice_cream_rows: Option<i32>,
    pub freezing_rows: Option<i32>,
    pub conservation_rows: Option<i32>,
    pub defrost_rows: Option<i32>,
    pub error_message: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::fact_soda_operation::Entity")]
    SodaOperation,
    #[sea_orm(has_many = "super::fact_ice_cream_operation::Entity")]
    IceCreamOperation,
    #[sea_orm(has_many = "super::fact_freezing_temperature::Entity")]
    FreezingTemperature,
    #[sea_orm(has_many = "super::fact_conservation_temperature::Entity")]
    ConservationTemperature,
    #[sea_orm(has_many = "super::fact_defrost_resistance::Entity")]
    DefrostResistance,
}

impl Related<super::fact_soda_operation::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::SodaOperation.def()
    }
}

impl Related<super::fact_ice_cream_operation::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::IceCreamOperation.def()
    }
}

impl Related<super::fact_freezing_temperature::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::FreezingTemperature.def()
    }
}

impl Related<super::fact_conservation_temperature::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ConservationTemperature.def()
    }
}

impl Related<super::fact_defrost_resistance::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::DefrostResistance.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
