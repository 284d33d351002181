use std::sync::Arc;

use async_trait::async_trait;
use sea_orm::{DatabaseConnection, DbBackend, FromQueryResult, Statement, Value};

use crate::error::{AppError, AppResult};
use crate::pipeline::CatalogEntry;
use crate::pipeline::roles::DeviceType;
use crate::sources::CatalogSource;
use crate::sources::models::CatalogRow;

/// Location → sub-location → device → sensor hierarchy.
///
/// Room devices ("cuarto ...") only expose their temperature and resistance sensors.
const CATALOG_QUERY: &str = r"
SELECT
    CAST(l.location_id AS TEXT) AS location_id,
    CAST(sl.sub_location_id AS TEXT) AS sub_location_id,
    CAST(d.device_id AS TEXT) AS device_id,
    CAST(d.device_type_id AS TEXT) AS device_type_id,
    d.name AS device_name,
    CAST(s.sensor_id AS TEXT) AS sensor_id,
    CAST(s.sensor_type_id AS TEXT) AS sensor_type_id,
    s.name AS sensor_name
FROM locations AS l
LEFT JOIN sub_locations AS sl ON l.location_id = sl.location_id
LEFT JOIN devices AS d ON sl.sub_location_id = d.sub_location_id
LEFT JOIN sensors AS s
    ON d.device_id = s.device_id
    AND (
        LOWER(d.name) NOT LIKE 'cuarto%'
        OR LOWER(s.name) = 'temperatura'
        OR LOWER(s.name) LIKE 'resistencia%'
    )
WHERE UPPER(CAST(d.device_type_id AS TEXT)) IN ({device_types})
ORDER BY l.street ASC";

/// Catalog read from the equipment database.
pub struct SqlCatalogSource {
    db: Arc<DatabaseConnection>,
}

impl SqlCatalogSource {
    #[must_use]
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Catalog query restricted to the known device types, with its bind values.
    #[must_use]
    pub fn statement() -> Statement {
        let placeholders = (1..=DeviceType::ALL.len())
            .map(|i| format!("${i}"))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = CATALOG_QUERY.replace("{device_types}", &placeholders);
        let values: Vec<Value> = DeviceType::ALL.iter().map(|t| t.id().into()).collect();

        Statement::from_sql_and_values(DbBackend::Postgres, sql, values)
    }
}

#[async_trait]
impl CatalogSource for SqlCatalogSource {
    async fn fetch_catalog(&self) -> AppResult<Vec<CatalogEntry>> {
        let rows = CatalogRow::find_by_statement(Self::statement())
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Catalog(format!("Catalog query failed: {e}")))?;

        let total = rows.len();
        let entries: Vec<CatalogEntry> = rows
            .into_iter()
            .filter_map(CatalogRow::into_entry)
            .collect();

        tracing::info!(
            rows = total,
            sensors = entries.len(),
            "Fetched equipment catalog"
        );

        Ok(entries)
    }
}
