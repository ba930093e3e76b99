pub mod memory;
pub mod sqlite;

use crate::core::{Amc, Category, MutualFund, NavRecord};
use anyhow::Result;
use async_trait::async_trait;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

/// Destination for the tables produced by a load.
///
/// Every insert call is applied in a single transaction. Rows are keyed so a
/// later load over the same store replaces them: quotations by scheme code and
/// date, funds by code, AMCs and categories by id.
#[async_trait]
pub trait NavStore: Send + Sync {
    /// Creates the `nav_history`, `mutual_funds`, `amc` and `fund_categories`
    /// tables if they do not exist yet.
    async fn create_schema(&self) -> Result<()>;

    async fn insert_nav_history(&self, records: &[NavRecord]) -> Result<()>;

    async fn insert_funds(&self, funds: &[MutualFund]) -> Result<()>;

    async fn insert_amcs(&self, amcs: &[Amc]) -> Result<()>;

    async fn insert_categories(&self, categories: &[Category]) -> Result<()>;

    /// AMCs written by earlier loads, used to keep their ids stable.
    async fn existing_amcs(&self) -> Result<Vec<Amc>>;

    async fn existing_categories(&self) -> Result<Vec<Category>>;
}
