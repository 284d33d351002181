pub mod fact_conservation_temperature;
pub mod fact_defrost_resistance;
pub mod fact_freezing_temperature;
pub mod fact_ice_cream_operation;
pub mod fact_soda_operation;
pub mod pipeline_runs;
