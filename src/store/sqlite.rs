use crate::core::{Amc, Category, MutualFund, NavRecord};
use crate::store::NavStore;
use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use std::path::Path;
use tracing::debug;

const CREATE_NAV_HISTORY_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS nav_history(
        code varchar(8),
        nav_date date,
        nav integer,
        repurchase_price integer,
        sale_price integer
    )
"#;

const CREATE_NAV_HISTORY_INDEX: &str = r#"
    CREATE UNIQUE INDEX IF NOT EXISTS nav_history_code_date
    ON nav_history(code, nav_date)
"#;

const CREATE_MUTUAL_FUND_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS mutual_funds(
        code varchar(8) PRIMARY KEY,
        amc_id integer,
        category_id integer,
        name varchar(200),
        isin_growth varchar(20),
        isin_dividend_payout varchar(20),
        isin_dividend_reinvestment varchar(20)
    )
"#;

const CREATE_AMC_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS amc(
        id INTEGER PRIMARY KEY,
        name varchar(100)
    )
"#;

const CREATE_FUND_CATEGORIES_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS fund_categories(
        id INTEGER PRIMARY KEY,
        category varchar(200)
    )
"#;

/// SQLite backed store.
#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Opens the database at `path`, creating the file if missing.
    pub async fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }

        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .with_context(|| format!("Failed to open database: {}", path.display()))?;
        debug!("Opened database at {}", path.display());
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[async_trait]
impl NavStore for SqliteStore {
    async fn create_schema(&self) -> Result<()> {
        for statement in [
            CREATE_NAV_HISTORY_TABLE,
            CREATE_NAV_HISTORY_INDEX,
            CREATE_MUTUAL_FUND_TABLE,
            CREATE_AMC_TABLE,
            CREATE_FUND_CATEGORIES_TABLE,
        ] {
            sqlx::query(statement)
                .execute(&self.pool)
                .await
                .context("Failed to create schema")?;
        }
        Ok(())
    }

    async fn insert_nav_history(&self, records: &[NavRecord]) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        for record in records {
            sqlx::query(
                "INSERT OR REPLACE INTO nav_history(code, nav_date, nav, repurchase_price, sale_price)
                 VALUES (?, ?, ?, ?, ?)",
            )
            .bind(&record.code)
            .bind(record.date)
            .bind(record.nav)
            .bind(record.repurchase_price)
            .bind(record.sale_price)
            .execute(&mut *tx)
            .await
            .with_context(|| format!("Failed to insert NAV record: {record}"))?;
        }
        tx.commit().await?;
        debug!("Inserted {} rows into nav_history", records.len());
        Ok(())
    }

    async fn insert_funds(&self, funds: &[MutualFund]) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        for fund in funds {
            sqlx::query(
                "INSERT OR REPLACE INTO mutual_funds(code, amc_id, category_id, name,
                 isin_growth, isin_dividend_payout, isin_dividend_reinvestment)
                 VALUES (?, ?, ?, ?, ?, ?, ?)",
            )
            .bind(&fund.code)
            .bind(fund.amc_id)
            .bind(fund.category_id)
            .bind(&fund.name)
            .bind(&fund.isin_growth)
            .bind(&fund.isin_dividend_payout)
            .bind(&fund.isin_dividend_reinvestment)
            .execute(&mut *tx)
            .await
            .with_context(|| format!("Failed to insert fund: {}", fund.code))?;
        }
        tx.commit().await?;
        debug!("Inserted {} rows into mutual_funds", funds.len());
        Ok(())
    }

    async fn insert_amcs(&self, amcs: &[Amc]) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        for amc in amcs {
            sqlx::query("INSERT OR REPLACE INTO amc(id, name) VALUES (?, ?)")
                .bind(amc.id)
                .bind(&amc.name)
                .execute(&mut *tx)
                .await
                .with_context(|| format!("Failed to insert AMC: {}", amc.name))?;
        }
        tx.commit().await?;
        debug!("Inserted {} rows into amc", amcs.len());
        Ok(())
    }

    async fn insert_categories(&self, categories: &[Category]) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        for category in categories {
            sqlx::query("INSERT OR REPLACE INTO fund_categories(id, category) VALUES (?, ?)")
                .bind(category.id)
                .bind(&category.category)
                .execute(&mut *tx)
                .await
                .with_context(|| format!("Failed to insert category: {}", category.category))?;
        }
        tx.commit().await?;
        debug!("Inserted {} rows into fund_categories", categories.len());
        Ok(())
    }

    async fn existing_amcs(&self) -> Result<Vec<Amc>> {
        let rows: Vec<(i64, String)> = sqlx::query_as("SELECT id, name FROM amc ORDER BY id")
            .fetch_all(&self.pool)
            .await
            .context("Failed to read AMCs")?;
        Ok(rows
            .into_iter()
            .map(|(id, name)| Amc { id, name })
            .collect())
    }

    async fn existing_categories(&self) -> Result<Vec<Category>> {
        let rows: Vec<(i64, String)> =
            sqlx::query_as("SELECT id, category FROM fund_categories ORDER BY id")
                .fetch_all(&self.pool)
                .await
                .context("Failed to read fund categories")?;
        Ok(rows
            .into_iter()
            .map(|(id, category)| Category { id, category })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use sqlx::Row;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_schema_is_idempotent() {
        let dir = tempdir().unwrap();
        let store = SqliteStore::open(dir.path().join("mfdb.sqlite3"))
            .await
            .unwrap();
        store.create_schema().await.unwrap();
        store.create_schema().await.unwrap();

        let tables: Vec<String> =
            sqlx::query_scalar("SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name")
                .fetch_all(store.pool())
                .await
                .unwrap();
        assert_eq!(
            tables,
            vec!["amc", "fund_categories", "mutual_funds", "nav_history"]
        );
    }

    #[tokio::test]
    async fn test_insert_and_read_back() {
        let dir = tempdir().unwrap();
        let store = SqliteStore::open(dir.path().join("nested").join("mfdb.sqlite3"))
            .await
            .unwrap();
        store.create_schema().await.unwrap();

        let record = NavRecord {
            code: "101".to_string(),
            fund: "Fund A".to_string(),
            isin1: None,
            isin2: None,
            nav: Some(100000),
            repurchase_price: Some(100500),
            sale_price: None,
            date: NaiveDate::from_ymd_opt(2024, 1, 5).unwrap(),
        };
        store.insert_nav_history(&[record.clone()]).await.unwrap();
        store
            .insert_nav_history(&[NavRecord {
                nav: Some(100100),
                ..record
            }])
            .await
            .unwrap();

        let row = sqlx::query(
            "SELECT code, nav_date, nav, repurchase_price, sale_price FROM nav_history",
        )
        .fetch_one(store.pool())
        .await
        .unwrap();
        assert_eq!(row.get::<String, _>("code"), "101");
        assert_eq!(
            row.get::<NaiveDate, _>("nav_date"),
            NaiveDate::from_ymd_opt(2024, 1, 5).unwrap()
        );
        assert_eq!(row.get::<Option<i64>, _>("nav"), Some(100100));
        assert_eq!(row.get::<Option<i64>, _>("repurchase_price"), Some(100500));
        assert_eq!(row.get::<Option<i64>, _>("sale_price"), None);

        let fund = MutualFund {
            code: "101".to_string(),
            amc_id: Some(1),
            category_id: None,
            name: "Fund A".to_string(),
            isin_growth: Some("INF000A01011".to_string()),
            isin_dividend_payout: Some("INF000A01011".to_string()),
            isin_dividend_reinvestment: None,
        };
        store.insert_funds(&[fund.clone()]).await.unwrap();
        let renamed = MutualFund {
            name: "Fund A Renamed".to_string(),
            ..fund
        };
        store.insert_funds(&[renamed]).await.unwrap();

        let rows = sqlx::query("SELECT name, amc_id, category_id FROM mutual_funds")
            .fetch_all(store.pool())
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get::<String, _>("name"), "Fund A Renamed");
        assert_eq!(rows[0].get::<Option<i64>, _>("amc_id"), Some(1));
        assert_eq!(rows[0].get::<Option<i64>, _>("category_id"), None);

        store
            .insert_amcs(&[
                Amc {
                    id: 1,
                    name: "ABC Mutual Fund".to_string(),
                },
                Amc {
                    id: 2,
                    name: "XYZ Mutual Fund".to_string(),
                },
            ])
            .await
            .unwrap();
        store
            .insert_categories(&[Category {
                id: 1,
                category: "Open Ended Schemes".to_string(),
            }])
            .await
            .unwrap();

        let amcs: Vec<(i64, String)> = sqlx::query_as("SELECT id, name FROM amc ORDER BY id")
            .fetch_all(store.pool())
            .await
            .unwrap();
        assert_eq!(
            amcs,
            vec![
                (1, "ABC Mutual Fund".to_string()),
                (2, "XYZ Mutual Fund".to_string())
            ]
        );
        let category: (i64, String) = sqlx::query_as("SELECT id, category FROM fund_categories")
            .fetch_one(store.pool())
            .await
            .unwrap();
        assert_eq!(category, (1, "Open Ended Schemes".to_string()));

        let existing = store.existing_amcs().await.unwrap();
        assert_eq!(existing.len(), 2);
        assert_eq!(existing[1].name, "XYZ Mutual Fund");
        assert_eq!(
            store.existing_categories().await.unwrap()[0].category,
            "Open Ended Schemes"
        );
    }
}
