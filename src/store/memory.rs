use crate::core::{Amc, Category, MutualFund, NavRecord};
use crate::store::NavStore;
use anyhow::Result;
use async_trait::async_trait;
use std::collections::BTreeMap;
use tokio::sync::Mutex;
use tracing::debug;

#[derive(Default)]
struct Tables {
    schema_created: bool,
    nav_history: Vec<NavRecord>,
    funds: BTreeMap<String, MutualFund>,
    amcs: BTreeMap<i64, Amc>,
    categories: BTreeMap<i64, Category>,
}

/// In-process store keeping every table in memory.
///
/// Snapshot tables are keyed like their SQL counterparts so repeated inserts
/// replace rows instead of duplicating them.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn schema_created(&self) -> bool {
        self.inner.lock().await.schema_created
    }

    pub async fn nav_history(&self) -> Vec<NavRecord> {
        self.inner.lock().await.nav_history.clone()
    }

    pub async fn funds(&self) -> Vec<MutualFund> {
        self.inner.lock().await.funds.values().cloned().collect()
    }

    pub async fn amcs(&self) -> Vec<Amc> {
        self.inner.lock().await.amcs.values().cloned().collect()
    }

    pub async fn categories(&self) -> Vec<Category> {
        self.inner.lock().await.categories.values().cloned().collect()
    }
}

#[async_trait]
impl NavStore for MemoryStore {
    async fn create_schema(&self) -> Result<()> {
        self.inner.lock().await.schema_created = true;
        Ok(())
    }

    async fn insert_nav_history(&self, records: &[NavRecord]) -> Result<()> {
        let mut tables = self.inner.lock().await;
        for record in records {
            match tables
                .nav_history
                .iter_mut()
                .find(|r| r.code == record.code && r.date == record.date)
            {
                Some(existing) => *existing = record.clone(),
                None => tables.nav_history.push(record.clone()),
            }
        }
        debug!("Stored {} NAV records in memory", records.len());
        Ok(())
    }

    async fn insert_funds(&self, funds: &[MutualFund]) -> Result<()> {
        let mut tables = self.inner.lock().await;
        for fund in funds {
            tables.funds.insert(fund.code.clone(), fund.clone());
        }
        Ok(())
    }

    async fn insert_amcs(&self, amcs: &[Amc]) -> Result<()> {
        let mut tables = self.inner.lock().await;
        for amc in amcs {
            tables.amcs.insert(amc.id, amc.clone());
        }
        Ok(())
    }

    async fn insert_categories(&self, categories: &[Category]) -> Result<()> {
        let mut tables = self.inner.lock().await;
        for category in categories {
            tables.categories.insert(category.id, category.clone());
        }
        Ok(())
    }

    async fn existing_amcs(&self) -> Result<Vec<Amc>> {
        Ok(self.amcs().await)
    }

    async fn existing_categories(&self) -> Result<Vec<Category>> {
        Ok(self.categories().await)
    }
}
