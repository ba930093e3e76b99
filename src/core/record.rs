//! Typed records decoded from a NAV bulletin

use crate::core::error::RecordError;
use crate::core::line::FIELD_SEPARATOR;
use crate::core::money::{NumberPolicy, decode_amount, to_decimal};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// Number of `;` separated fields in a data line.
pub const FIELD_COUNT: usize = 8;

/// Format of the quotation date column, e.g. `05-Jan-2024`.
pub const DATE_FORMAT: &str = "%d-%b-%Y";

/// One quotation of a scheme on a given date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavRecord {
    pub code: String,
    pub fund: String,
    pub isin1: Option<String>,
    pub isin2: Option<String>,
    pub nav: Option<i64>,
    pub repurchase_price: Option<i64>,
    pub sale_price: Option<i64>,
    pub date: NaiveDate,
}

/// Latest known description of a scheme.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MutualFund {
    pub code: String,
    pub amc_id: Option<i64>,
    pub category_id: Option<i64>,
    pub name: String,
    pub isin_growth: Option<String>,
    pub isin_dividend_payout: Option<String>,
    pub isin_dividend_reinvestment: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Amc {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: i64,
    pub category: String,
}

impl NavRecord {
    /// Decodes a line already classified as a data record.
    pub fn from_line(line: &str, policy: NumberPolicy) -> Result<Self, RecordError> {
        let fields: Vec<&str> = line.split(FIELD_SEPARATOR).map(str::trim).collect();
        let [code, fund, isin1, isin2, nav, repurchase, sale, date] = fields[..] else {
            return Err(RecordError::MalformedLine {
                expected: FIELD_COUNT,
                found: fields.len(),
                line: line.trim_end().to_string(),
            });
        };

        Ok(NavRecord {
            code: code.to_string(),
            fund: fund.to_string(),
            isin1: non_empty(isin1),
            isin2: non_empty(isin2),
            nav: decode_amount(nav, policy)?,
            repurchase_price: decode_amount(repurchase, policy)?,
            sale_price: decode_amount(sale, policy)?,
            date: parse_date(date)?,
        })
    }
}

impl Display for NavRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let nav = self
            .nav
            .map_or("N/A".to_string(), |v| to_decimal(v).to_string());
        write!(f, "{} {} @ {} ({})", self.code, self.fund, nav, self.date)
    }
}

impl MutualFund {
    /// Builds the fund snapshot for a record under the current AMC and category.
    ///
    /// The bulletin column `ISIN Div Payout/ISIN Growth` carries a single ISIN
    /// that is either the growth or the payout variant, so it populates both.
    pub fn from_record(record: &NavRecord, amc_id: Option<i64>, category_id: Option<i64>) -> Self {
        MutualFund {
            code: record.code.clone(),
            amc_id,
            category_id,
            name: record.fund.clone(),
            isin_growth: record.isin1.clone(),
            isin_dividend_payout: record.isin1.clone(),
            isin_dividend_reinvestment: record.isin2.clone(),
        }
    }
}

fn non_empty(field: &str) -> Option<String> {
    if field.is_empty() {
        None
    } else {
        Some(field.to_string())
    }
}

fn parse_date(raw: &str) -> Result<NaiveDate, RecordError> {
    NaiveDate::parse_from_str(raw, DATE_FORMAT).map_err(|source| RecordError::MalformedDate {
        raw: raw.to_string(),
        source,
    })
}
