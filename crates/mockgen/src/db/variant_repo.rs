//! Variant repository for the mockup columns of the `variants` table.
//!
//! Catalog data (names, prices, images) lives elsewhere; this table only
//! tracks what the mockup pipeline reads and writes.

use chrono::Utc;
use rusqlite::{params, Row};

use super::{Database, DatabaseError};
use crate::detect::PrintArea;

/// A raw variant row from the database.
#[derive(Debug, Clone)]
pub struct VariantRow {
    pub variant_id: i64,
    pub product_id: Option<i64>,
    pub mockup_template_url: Option<String>,
    /// JSON-encoded [`PrintArea`].
    pub mockup_print_area: Option<String>,
    pub print_area_source: Option<String>,
    pub updated_at: String,
}

impl VariantRow {
    fn from_row(row: &Row<'_>) -> Result<Self, rusqlite::Error> {
        Ok(Self {
            variant_id: row.get("variant_id")?,
            product_id: row.get("product_id")?,
            mockup_template_url: row.get("mockup_template_url")?,
            mockup_print_area: row.get("mockup_print_area")?,
            print_area_source: row.get("print_area_source")?,
            updated_at: row.get("updated_at")?,
        })
    }

    /// Decodes the stored print area.
    pub fn print_area(&self) -> Result<Option<PrintArea>, DatabaseError> {
        self.mockup_print_area
            .as_deref()
            .map(|json| {
                serde_json::from_str(json).map_err(|e| DatabaseError::Json {
                    column: "mockup_print_area",
                    source: e,
                })
            })
            .transpose()
    }
}

/// How a stored print area was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AreaSource {
    Detected,
    Fallback,
}

impl AreaSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            AreaSource::Detected => "detected",
            AreaSource::Fallback => "fallback",
        }
    }
}

fn now() -> String {
    Utc::now().to_rfc3339()
}

/// Builds the "needs a mockup" condition shared by discovery and counting.
fn pending_condition(
    invalid_url_patterns: &[String],
) -> (String, Vec<Box<dyn rusqlite::types::ToSql>>) {
    let mut alternatives = vec![
        "mockup_template_url IS NULL".to_string(),
        "TRIM(mockup_template_url) = ''".to_string(),
    ];
    let mut param_values: Vec<Box<dyn rusqlite::types::ToSql>> = Vec::new();

    for pattern in invalid_url_patterns {
        param_values.push(Box::new(pattern.clone()));
        alternatives.push(format!(
            "instr(mockup_template_url, ?{}) > 0",
            param_values.len()
        ));
    }

    (format!("({})", alternatives.join(" OR ")), param_values)
}

/// Inserts a variant, or fills in its product id if it already exists.
pub fn upsert(
    db: &Database,
    variant_id: i64,
    product_id: Option<i64>,
) -> Result<(), DatabaseError> {
    db.with_conn(|conn| {
        conn.execute(
            "INSERT INTO variants (variant_id, product_id, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(variant_id) DO UPDATE SET
               product_id = COALESCE(excluded.product_id, variants.product_id),
               updated_at = excluded.updated_at",
            params![variant_id, product_id, now()],
        )?;
        Ok(())
    })
}

/// Finds a variant by id.
pub fn find(db: &Database, variant_id: i64) -> Result<Option<VariantRow>, DatabaseError> {
    db.with_conn(|conn| {
        let mut stmt = conn.prepare("SELECT * FROM variants WHERE variant_id = ?1")?;
        let mut rows = stmt.query_map(params![variant_id], VariantRow::from_row)?;
        match rows.next() {
            Some(Ok(row)) => Ok(Some(row)),
            Some(Err(e)) => Err(DatabaseError::Sqlite(e)),
            None => Ok(None),
        }
    })
}

/// Returns every variant whose template URL is missing or matches one of
/// `invalid_url_patterns`, ordered by variant id.
pub fn discover(
    db: &Database,
    invalid_url_patterns: &[String],
) -> Result<Vec<VariantRow>, DatabaseError> {
    db.with_conn(|conn| {
        let (condition, param_values) = pending_condition(invalid_url_patterns);
        let sql = format!(
            "SELECT * FROM variants WHERE {} ORDER BY variant_id",
            condition
        );

        let params_ref: Vec<&dyn rusqlite::types::ToSql> =
            param_values.iter().map(|p| p.as_ref()).collect();
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params_ref.as_slice(), VariantRow::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    })
}

/// Counts variants with a positive id that still need a mockup.
pub fn count_pending(
    db: &Database,
    invalid_url_patterns: &[String],
) -> Result<u64, DatabaseError> {
    db.with_conn(|conn| {
        let (condition, param_values) = pending_condition(invalid_url_patterns);
        let sql = format!(
            "SELECT COUNT(*) FROM variants WHERE variant_id > 0 AND {}",
            condition
        );

        let params_ref: Vec<&dyn rusqlite::types::ToSql> =
            param_values.iter().map(|p| p.as_ref()).collect();
        let count: u64 = conn.query_row(&sql, params_ref.as_slice(), |r| r.get(0))?;
        Ok(count)
    })
}

/// Records the product a variant belongs to.
pub fn set_product_id(
    db: &Database,
    variant_id: i64,
    product_id: i64,
) -> Result<(), DatabaseError> {
    db.with_conn(|conn| {
        conn.execute(
            "UPDATE variants SET product_id = ?2, updated_at = ?3 WHERE variant_id = ?1",
            params![variant_id, product_id, now()],
        )?;
        Ok(())
    })
}

/// Stores the rendered template URL and print area for a variant.
pub fn save_mockup(
    db: &Database,
    variant_id: i64,
    template_url: &str,
    area: &PrintArea,
    source: AreaSource,
) -> Result<(), DatabaseError> {
    let area_json = serde_json::to_string(area).map_err(|e| DatabaseError::Json {
        column: "mockup_print_area",
        source: e,
    })?;

    db.with_conn(|conn| {
        conn.execute(
            "UPDATE variants SET mockup_template_url = ?2, mockup_print_area = ?3,
             print_area_source = ?4, updated_at = ?5
             WHERE variant_id = ?1",
            params![variant_id, template_url, area_json, source.as_str(), now()],
        )?;
        Ok(())
    })
}
