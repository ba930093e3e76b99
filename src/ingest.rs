//! Loads NAV bulletins from disk into a [`NavStore`]

use crate::cli::ui;
use crate::config::AppConfig;
use crate::core::batch::try_chunked;
use crate::core::{NavParser, ParseError};
use crate::source::{NavLines, list_nav_files};
use crate::store::NavStore;
use anyhow::{Context, Result};
use chrono::NaiveDate;
use comfy_table::Cell;
use indicatif::ProgressBar;
use tracing::{debug, info};

/// Row counts written by a load.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct LoadReport {
    pub files: usize,
    pub records: usize,
    pub batches: usize,
    pub funds: usize,
    pub amcs: usize,
    pub categories: usize,
    pub first_date: Option<NaiveDate>,
    pub last_date: Option<NaiveDate>,
    /// Set when `max_batches` stopped the load before the input ran out.
    pub truncated: bool,
}

impl LoadReport {
    fn observe_date(&mut self, date: NaiveDate) {
        self.first_date = Some(self.first_date.map_or(date, |d| d.min(date)));
        self.last_date = Some(self.last_date.map_or(date, |d| d.max(date)));
    }

    pub fn display_as_table(&self) -> String {
        let mut table = ui::new_styled_table();
        table.set_header(vec![ui::header_cell("Table"), ui::header_cell("Rows")]);
        table.add_row(vec![Cell::new("nav_history"), ui::count_cell(self.records)]);
        table.add_row(vec![Cell::new("mutual_funds"), ui::count_cell(self.funds)]);
        table.add_row(vec![Cell::new("amc"), ui::count_cell(self.amcs)]);
        table.add_row(vec![
            Cell::new("fund_categories"),
            ui::count_cell(self.categories),
        ]);
        table.add_row(vec![
            Cell::new("first quotation"),
            ui::format_optional_cell(self.first_date, |d| d.to_string()),
        ]);
        table.add_row(vec![
            Cell::new("last quotation"),
            ui::format_optional_cell(self.last_date, |d| d.to_string()),
        ]);

        let mut output = format!(
            "{}\n\n",
            ui::style_text("NAV load summary", ui::StyleType::Title)
        );
        output.push_str(&table.to_string());
        output.push_str(&format!(
            "\n\n{} {}",
            ui::style_text("Files read:", ui::StyleType::TotalLabel),
            ui::style_text(&self.files.to_string(), ui::StyleType::TotalValue)
        ));
        let mut batches = format!("{} batches written", self.batches);
        if self.truncated {
            batches.push_str(", stopped at the batch limit");
        }
        output.push_str(&format!(
            "\n{}",
            ui::style_text(&batches, ui::StyleType::Subtle)
        ));
        output
    }
}

/// Parses every bulletin under `config.data_dir` and writes the four tables.
///
/// NAV records are written in batches of `config.batch_size` while the files
/// are still being read; the fund, AMC and category snapshots are written once
/// the record stream ends. The first parse error aborts the load before the
/// snapshots are written.
///
/// AMCs and categories already in the store keep their ids, so loading into
/// an existing database refreshes it.
pub async fn load(config: &AppConfig, store: &dyn NavStore, pb: &ProgressBar) -> Result<LoadReport> {
    config.validate()?;
    store.create_schema().await?;

    let files = list_nav_files(&config.data_dir)?;
    info!(
        "Loading {} NAV files from {}",
        files.len(),
        config.data_dir.display()
    );

    let mut report = LoadReport {
        files: files.len(),
        ..LoadReport::default()
    };
    let mut parser = NavParser::with_policy(config.number_policy());
    parser.seed(
        store.existing_amcs().await?,
        store.existing_categories().await?,
    );
    let max_batches = config.max_batches.unwrap_or(usize::MAX);

    pb.set_message("Loading NAV history...");
    let mut batches = try_chunked(parser.try_parse(NavLines::open(files)), config.batch_size);
    while report.batches < max_batches {
        let Some(batch) = batches.next() else {
            break;
        };
        let batch = match batch {
            Ok(batch) => batch,
            Err(e) => return Err(locate(e, batches.get_ref().source())),
        };
        store
            .insert_nav_history(&batch)
            .await
            .context("Failed to write NAV history")?;

        for record in &batch {
            report.observe_date(record.date);
        }
        report.records += batch.len();
        report.batches += 1;
        pb.inc(batch.len() as u64);
        debug!(
            "Wrote batch {} ({} records so far)",
            report.batches, report.records
        );
    }
    report.truncated = report.batches == max_batches && batches.get_mut().has_remaining_input();
    if report.truncated {
        info!("Stopped after {} batches", max_batches);
    }

    pb.set_message("Writing fund snapshots...");
    let funds = parser.funds_sorted();
    for batch in funds.chunks(config.batch_size) {
        store
            .insert_funds(batch)
            .await
            .context("Failed to write mutual funds")?;
    }
    let amcs = parser.amcs_sorted();
    store.insert_amcs(&amcs).await.context("Failed to write AMCs")?;
    let categories = parser.categories_sorted();
    store
        .insert_categories(&categories)
        .await
        .context("Failed to write fund categories")?;

    report.funds = funds.len();
    report.amcs = amcs.len();
    report.categories = categories.len();
    pb.finish_and_clear();

    info!(
        "Loaded {} NAV records for {} funds, {} AMCs and {} categories",
        report.records, report.funds, report.amcs, report.categories
    );
    Ok(report)
}

/// Names the file and the line within it that stopped the load.
fn locate(err: ParseError, lines: &NavLines) -> anyhow::Error {
    let context = match (lines.current_path(), &err) {
        (Some(path), ParseError::Record { .. }) => format!(
            "Failed to parse {} at line {}",
            path.display(),
            lines.current_line()
        ),
        (Some(path), ParseError::Io(_)) => format!("Failed to read {}", path.display()),
        (None, _) => "Failed to parse NAV files".to_string(),
    };
    anyhow::Error::new(err).context(context)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Amc;
    use crate::store::MemoryStore;
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    const DAY_ONE: &str = "\
Scheme Code;Scheme Name;ISIN Div Payout/ISIN Growth;ISIN Div Reinvestment;Net Asset Value;Repurchase Price;Sale Price;Date

Open Ended Schemes(Debt Scheme - Banking and PSU Fund)

ABC Mutual Fund

101;ABC Banking Fund - Growth;INF000A01011;;10.00;10.05;9.95;01-Jan-2024
102;ABC Banking Fund - IDCW;INF000A01029;INF000A01037;12.50;;;01-Jan-2024
";

    const DAY_TWO: &str = "\
Scheme Code;Scheme Name;ISIN Div Payout/ISIN Growth;ISIN Div Reinvestment;Net Asset Value;Repurchase Price;Sale Price;Date

Open Ended Schemes(Debt Scheme - Banking and PSU Fund)

ABC Mutual Fund

101;ABC Banking & PSU Fund - Growth;INF000A01011;;10.10;;;02-Jan-2024

XYZ Mutual Fund

201;XYZ Liquid Fund;INF000X01015;;1,001.2345;;;02-Jan-2024
";

    fn write_bulletins(dir: &Path) {
        fs::write(dir.join("nav_2024-01-02.txt"), DAY_TWO).unwrap();
        fs::write(dir.join("nav_2024-01-01.txt"), DAY_ONE).unwrap();
    }

    fn config_for(dir: &Path) -> AppConfig {
        AppConfig {
            data_dir: dir.to_path_buf(),
            batch_size: 2,
            ..AppConfig::default()
        }
    }

    #[tokio::test]
    async fn test_load_writes_all_tables() {
        let dir = TempDir::new().unwrap();
        write_bulletins(dir.path());
        let store = MemoryStore::new();

        let report = load(&config_for(dir.path()), &store, &ProgressBar::hidden())
            .await
            .unwrap();

        assert_eq!(report.files, 2);
        assert_eq!(report.records, 4);
        assert_eq!(report.batches, 2);
        assert_eq!((report.funds, report.amcs, report.categories), (3, 2, 1));
        assert_eq!(report.first_date, NaiveDate::from_ymd_opt(2024, 1, 1));
        assert_eq!(report.last_date, NaiveDate::from_ymd_opt(2024, 1, 2));

        assert!(store.schema_created().await);
        let history = store.nav_history().await;
        let codes: Vec<_> = history.iter().map(|r| r.code.as_str()).collect();
        assert_eq!(codes, vec!["101", "102", "101", "201"]);
        assert_eq!(history[0].date, NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());

        let funds = store.funds().await;
        assert_eq!(funds[0].code, "101");
        assert_eq!(funds[0].name, "ABC Banking & PSU Fund - Growth");
        assert_eq!(funds[2].code, "201");
        assert_eq!(funds[2].amc_id, Some(2));
        assert_eq!(funds[2].category_id, Some(1));

        let amcs = store.amcs().await;
        assert_eq!(amcs[0].name, "ABC Mutual Fund");
        assert_eq!(amcs[1].name, "XYZ Mutual Fund");
    }

    #[tokio::test]
    async fn test_max_batches_limits_history() {
        let dir = TempDir::new().unwrap();
        write_bulletins(dir.path());
        let store = MemoryStore::new();
        let config = AppConfig {
            max_batches: Some(1),
            ..config_for(dir.path())
        };

        let report = load(&config, &store, &ProgressBar::hidden()).await.unwrap();

        assert_eq!(report.batches, 1);
        assert_eq!(report.records, 2);
        assert!(report.truncated);
        assert_eq!(store.nav_history().await.len(), 2);
        // Only the lines consumed by the first batch contribute snapshots
        assert_eq!(report.funds, 2);
        assert_eq!(report.amcs, 1);
    }

    #[tokio::test]
    async fn test_limit_reached_with_input_exhausted_is_not_truncated() {
        let dir = TempDir::new().unwrap();
        write_bulletins(dir.path());
        let store = MemoryStore::new();
        let config = AppConfig {
            max_batches: Some(2),
            ..config_for(dir.path())
        };

        let report = load(&config, &store, &ProgressBar::hidden()).await.unwrap();

        assert_eq!(report.batches, 2);
        assert_eq!(report.records, 4);
        assert!(!report.truncated);
        assert!(!report.display_as_table().contains("batch limit"));
    }

    #[tokio::test]
    async fn test_parse_error_aborts_before_snapshots() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("nav_2024-01-01.txt"),
            "ABC Mutual Fund\n101;Fund A;;;10;;;01-Jan-2024\n102;Fund B;;;10;;;not-a-date\n",
        )
        .unwrap();
        let store = MemoryStore::new();

        let err = load(&config_for(dir.path()), &store, &ProgressBar::hidden())
            .await
            .unwrap_err();

        assert!(err.to_string().starts_with("Failed to parse"));
        assert!(err.to_string().ends_with("nav_2024-01-01.txt at line 3"));
        assert!(store.nav_history().await.is_empty());
        assert!(store.funds().await.is_empty());
    }

    #[tokio::test]
    async fn test_parse_error_names_file_and_line() {
        let dir = TempDir::new().unwrap();
        write_bulletins(dir.path());
        fs::write(
            dir.path().join("nav_2024-01-03.txt"),
            "XYZ Mutual Fund\n201;XYZ Liquid Fund;;;1,001.2345\n",
        )
        .unwrap();
        let store = MemoryStore::new();

        let err = load(&config_for(dir.path()), &store, &ProgressBar::hidden())
            .await
            .unwrap_err();

        // Line 2 of the third file, not its position across all files
        assert!(
            err.to_string().ends_with("nav_2024-01-03.txt at line 2"),
            "{err}"
        );
        assert!(matches!(
            err.downcast_ref::<ParseError>(),
            Some(ParseError::Record { line: 21, .. })
        ));
    }

    #[tokio::test]
    async fn test_reload_keeps_ids_and_replaces_history() {
        let dir = TempDir::new().unwrap();
        write_bulletins(dir.path());
        let store = MemoryStore::new();
        store
            .insert_amcs(&[Amc {
                id: 7,
                name: "XYZ Mutual Fund".to_string(),
            }])
            .await
            .unwrap();

        let config = config_for(dir.path());
        load(&config, &store, &ProgressBar::hidden()).await.unwrap();
        let report = load(&config, &store, &ProgressBar::hidden()).await.unwrap();

        assert_eq!(report.records, 4);
        assert_eq!(store.nav_history().await.len(), 4);
        let funds = store.funds().await;
        assert_eq!(funds[0].amc_id, Some(8));
        assert_eq!(funds[2].amc_id, Some(7));
        let amcs = store.amcs().await;
        assert_eq!(amcs.len(), 2);
        assert_eq!((amcs[0].id, amcs[0].name.as_str()), (7, "XYZ Mutual Fund"));
        assert_eq!((amcs[1].id, amcs[1].name.as_str()), (8, "ABC Mutual Fund"));
    }

    #[tokio::test]
    async fn test_empty_directory_loads_nothing() {
        let dir = TempDir::new().unwrap();
        let store = MemoryStore::new();

        let report = load(&config_for(dir.path()), &store, &ProgressBar::hidden())
            .await
            .unwrap();

        assert_eq!(report, LoadReport::default());
        assert!(store.schema_created().await);
    }

    #[test]
    fn test_report_table_lists_tables() {
        let report = LoadReport {
            files: 2,
            records: 5,
            batches: 3,
            funds: 3,
            amcs: 2,
            categories: 1,
            first_date: NaiveDate::from_ymd_opt(2024, 1, 1),
            last_date: None,
            truncated: true,
        };
        let output = report.display_as_table();
        for name in [
            "nav_history",
            "mutual_funds",
            "amc",
            "fund_categories",
            "2024-01-01",
            "N/A",
            "stopped at the batch limit",
        ] {
            assert!(output.contains(name), "missing {name} in {output}");
        }
    }
}
