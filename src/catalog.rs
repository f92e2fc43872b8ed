//! Catalog repository
//!
//! Read operations over the perfume catalog: original fragrances and the
//! clone entries referencing them. Catalog rows are written by an external
//! importer; from here they are read-only.

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};

use crate::connection::StoreConn;
use crate::value::{Row, SqlValue};

/// Compact original entry (listing and random-pick queries).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OriginalSummary {
    pub id: String,
    pub brand: Option<String>,
    pub name: Option<String>,
}

/// Full original entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OriginalRecord {
    pub id: String,
    pub brand: Option<String>,
    pub name: Option<String>,
    pub price_eur: Option<f64>,
    pub url: Option<String>,
}

/// Compact clone entry used by the search index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CloneSummary {
    pub brand: Option<String>,
    pub name: Option<String>,
    pub original_id: Option<String>,
}

/// Full clone entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CloneRecord {
    pub id: String,
    pub original_id: Option<String>,
    pub brand: Option<String>,
    pub name: Option<String>,
    pub price_eur: Option<f64>,
    pub url: Option<String>,
    pub notes: Option<String>,
    pub saved_amount: Option<f64>,
}

/// Repository for catalog read operations.
pub struct CatalogRepository<'a> {
    conn: &'a mut StoreConn,
}

impl<'a> CatalogRepository<'a> {
    pub fn new(conn: &'a mut StoreConn) -> Self {
        Self { conn }
    }

    /// All originals in database-determined order.
    pub fn fetch_all_originals(&mut self) -> Result<Vec<OriginalSummary>> {
        let rows = self
            .conn
            .query("SELECT id, brand, name FROM OriginalPerfume", &[])?;
        rows.iter().map(original_summary_from_row).collect()
    }

    /// All clone entries, shaped for the search index.
    pub fn fetch_clones_for_search(&mut self) -> Result<Vec<CloneSummary>> {
        let rows = self
            .conn
            .query("SELECT brand, name, original_id FROM CopyPerfume", &[])?;
        Ok(rows
            .iter()
            .map(|row| CloneSummary {
                brand: row.text("brand"),
                name: row.text("name"),
                original_id: row.text("original_id"),
            })
            .collect())
    }

    /// Look up one original; `None` when the id is unknown.
    pub fn fetch_original_by_id(&mut self, original_id: &str) -> Result<Option<OriginalRecord>> {
        let row = self.conn.query_opt(
            "SELECT id, brand, name, price_eur, url FROM OriginalPerfume WHERE id = %s",
            &[SqlValue::Text(original_id.to_string())],
        )?;
        row.map(|row| {
            Ok(OriginalRecord {
                id: required_text(&row, "id")?,
                brand: row.text("brand"),
                name: row.text("name"),
                price_eur: row.f64("price_eur"),
                url: row.text("url"),
            })
        })
        .transpose()
    }

    /// All clones referencing the given original.
    pub fn get_copies_by_original_id(&mut self, original_id: &str) -> Result<Vec<CloneRecord>> {
        let rows = self.conn.query(
            "SELECT id, original_id, brand, name, price_eur, url, notes, saved_amount \
             FROM CopyPerfume WHERE original_id = %s",
            &[SqlValue::Text(original_id.to_string())],
        )?;
        rows.iter()
            .map(|row| {
                Ok(CloneRecord {
                    id: required_text(row, "id")?,
                    original_id: row.text("original_id"),
                    brand: row.text("brand"),
                    name: row.text("name"),
                    price_eur: row.f64("price_eur"),
                    url: row.text("url"),
                    notes: row.text("notes"),
                    saved_amount: row.f64("saved_amount"),
                })
            })
            .collect()
    }

    /// Originals ranked by clone count, descending, capped at `limit`
    /// (conventionally 10). Originals without clones are excluded by the
    /// inner join.
    ///
    /// Returns the raw rows (`brand`, `name`, `clone_count`) rather than a
    /// typed record; downstream consumers of this legacy shape address
    /// columns by name.
    pub fn fetch_popular_originals(&mut self, limit: i64) -> Result<Vec<Row>> {
        self.conn.query(
            "SELECT o.brand, o.name, COUNT(c.id) AS clone_count \
             FROM OriginalPerfume o \
             JOIN CopyPerfume c ON o.id = c.original_id \
             GROUP BY o.id, o.brand, o.name \
             ORDER BY clone_count DESC \
             LIMIT %s",
            &[SqlValue::Integer(limit)],
        )
    }

    /// One uniformly random original; `None` when the catalog is empty.
    pub fn fetch_random_original(&mut self) -> Result<Option<OriginalSummary>> {
        let row = self.conn.query_opt(
            "SELECT id, brand, name FROM OriginalPerfume ORDER BY RANDOM() LIMIT 1",
            &[],
        )?;
        row.as_ref().map(original_summary_from_row).transpose()
    }
}

fn original_summary_from_row(row: &Row) -> Result<OriginalSummary> {
    Ok(OriginalSummary {
        id: required_text(row, "id")?,
        brand: row.text("brand"),
        name: row.text("name"),
    })
}

fn required_text(row: &Row, column: &str) -> Result<String> {
    row.text(column)
        .ok_or_else(|| anyhow!("Column '{}' missing or null", column))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::init_if_not_exists;

    fn setup_store() -> StoreConn {
        let mut conn = StoreConn::open_in_memory().unwrap();
        init_if_not_exists(&mut conn).unwrap();
        conn
    }

    fn insert_original(conn: &mut StoreConn, id: &str, brand: &str, name: &str, price: f64) {
        conn.execute(
            "INSERT INTO OriginalPerfume (id, brand, name, price_eur, url) \
             VALUES (%s, %s, %s, %s, %s)",
            &[
                SqlValue::Text(id.to_string()),
                SqlValue::Text(brand.to_string()),
                SqlValue::Text(name.to_string()),
                SqlValue::Float(price),
                SqlValue::Text(format!("https://example.com/{id}")),
            ],
        )
        .unwrap();
    }

    fn insert_copy(conn: &mut StoreConn, id: &str, original_id: &str, name: &str) {
        conn.execute(
            "INSERT INTO CopyPerfume (id, original_id, brand, name, price_eur, url, notes, saved_amount) \
             VALUES (%s, %s, %s, %s, %s, %s, %s, %s)",
            &[
                SqlValue::Text(id.to_string()),
                SqlValue::Text(original_id.to_string()),
                SqlValue::Text("CloneHouse".to_string()),
                SqlValue::Text(name.to_string()),
                SqlValue::Float(19.99),
                SqlValue::Null,
                SqlValue::Null,
                SqlValue::Float(110.0),
            ],
        )
        .unwrap();
    }

    #[test]
    fn test_fetch_all_originals() {
        let mut conn = setup_store();
        insert_original(&mut conn, "chanel-no5", "Chanel", "No 5", 129.99);
        insert_original(&mut conn, "dior-sauvage", "Dior", "Sauvage", 99.5);

        let originals = CatalogRepository::new(&mut conn).fetch_all_originals().unwrap();
        assert_eq!(originals.len(), 2);
        assert!(originals.iter().any(|o| o.id == "chanel-no5"));
        assert!(originals
            .iter()
            .any(|o| o.brand.as_deref() == Some("Dior") && o.name.as_deref() == Some("Sauvage")));
    }

    #[test]
    fn test_fetch_clones_for_search() {
        let mut conn = setup_store();
        insert_original(&mut conn, "chanel-no5", "Chanel", "No 5", 129.99);
        insert_copy(&mut conn, "clone-1", "chanel-no5", "Nr. Five");

        let clones = CatalogRepository::new(&mut conn).fetch_clones_for_search().unwrap();
        assert_eq!(clones.len(), 1);
        assert_eq!(clones[0].name.as_deref(), Some("Nr. Five"));
        assert_eq!(clones[0].original_id.as_deref(), Some("chanel-no5"));
    }

    #[test]
    fn test_fetch_original_by_id() {
        let mut conn = setup_store();
        insert_original(&mut conn, "chanel-no5", "Chanel", "No 5", 129.99);

        let mut repo = CatalogRepository::new(&mut conn);
        let found = repo.fetch_original_by_id("chanel-no5").unwrap();
        let record = found.unwrap();
        assert_eq!(record.brand.as_deref(), Some("Chanel"));
        assert_eq!(record.price_eur, Some(129.99));
        assert_eq!(record.url.as_deref(), Some("https://example.com/chanel-no5"));

        let missing = repo.fetch_original_by_id("nope").unwrap();
        assert!(missing.is_none());
    }

    #[test]
    fn test_get_copies_by_original_id() {
        let mut conn = setup_store();
        insert_original(&mut conn, "chanel-no5", "Chanel", "No 5", 129.99);
        insert_copy(&mut conn, "clone-1", "chanel-no5", "Nr. Five");
        insert_copy(&mut conn, "clone-2", "chanel-no5", "Cinq");

        let copies = CatalogRepository::new(&mut conn)
            .get_copies_by_original_id("chanel-no5")
            .unwrap();
        assert_eq!(copies.len(), 2);
        assert!(copies.iter().all(|c| c.original_id.as_deref() == Some("chanel-no5")));
        assert_eq!(copies[0].saved_amount, Some(110.0));
        // Columns inserted as NULL stay absent.
        assert!(copies[0].url.is_none());
    }

    #[test]
    fn test_fetch_popular_originals_orders_by_clone_count() {
        let mut conn = setup_store();
        insert_original(&mut conn, "chanel-no5", "Chanel", "No 5", 129.99);
        insert_original(&mut conn, "dior-sauvage", "Dior", "Sauvage", 99.5);
        insert_original(&mut conn, "lonely", "Nobody", "Unclone", 50.0);
        for i in 0..3 {
            insert_copy(&mut conn, &format!("c5-{i}"), "chanel-no5", "Five-ish");
        }
        insert_copy(&mut conn, "ds-0", "dior-sauvage", "Savage");

        let mut repo = CatalogRepository::new(&mut conn);
        let rows = repo.fetch_popular_originals(10).unwrap();
        // The clone-less original is excluded by the join.
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].text("brand"), Some("Chanel".to_string()));
        assert_eq!(rows[0].i64("clone_count"), Some(3));
        assert_eq!(rows[1].i64("clone_count"), Some(1));

        let capped = repo.fetch_popular_originals(1).unwrap();
        assert_eq!(capped.len(), 1);
        assert_eq!(capped[0].i64("clone_count"), Some(3));
    }

    #[test]
    fn test_fetch_random_original_empty() {
        let mut conn = setup_store();
        let random = CatalogRepository::new(&mut conn).fetch_random_original().unwrap();
        assert!(random.is_none());
    }

    #[test]
    fn test_fetch_random_original_single() {
        let mut conn = setup_store();
        insert_original(&mut conn, "chanel-no5", "Chanel", "No 5", 129.99);

        let random = CatalogRepository::new(&mut conn).fetch_random_original().unwrap();
        assert_eq!(random.unwrap().id, "chanel-no5");
    }

    #[test]
    fn test_records_serialize() {
        let record = OriginalRecord {
            id: "chanel-no5".to_string(),
            brand: Some("Chanel".to_string()),
            name: Some("No 5".to_string()),
            price_eur: Some(129.99),
            url: None,
        };
        let json = serde_json::to_string(&record).unwrap();
        assert!(json.contains("\"chanel-no5\""));
        assert!(json.contains("\"price_eur\":129.99"));
    }
}
