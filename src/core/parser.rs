//! Stateful parser for AMFI NAV bulletins.
//!
//! A bulletin is a flat list of lines where AMC and category announcements
//! set the context for the data lines that follow:
//!
//! ```text
//! Scheme Code;Scheme Name;ISIN Div Payout/ISIN Growth;ISIN Div Reinvestment;Net Asset Value;Repurchase Price;Sale Price;Date
//!
//! Open Ended Schemes(Debt Scheme - Banking and PSU Fund)
//!
//! Aditya Birla Sun Life Mutual Fund
//!
//! 119551;Aditya Birla Sun Life Banking & PSU Debt Fund;INF209KA12Z1;INF209KA13Z9;101.6596;;;05-Jan-2024
//! ```
//!
//! [`NavParser::parse`] yields the quotations lazily while collecting the
//! funds, AMCs and categories it discovers along the way.

use crate::core::error::ParseError;
use crate::core::line::{LineKind, classify};
use crate::core::money::NumberPolicy;
use crate::core::record::{Amc, Category, MutualFund, NavRecord};
use std::collections::HashMap;
use std::io;
use tracing::debug;

#[derive(Debug, Default)]
pub struct NavParser {
    policy: NumberPolicy,
    funds: HashMap<String, MutualFund>,
    amcs: HashMap<String, Amc>,
    categories: HashMap<String, Category>,
    amc_id_seq: i64,
    category_id_seq: i64,
}

impl NavParser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_policy(policy: NumberPolicy) -> Self {
        Self {
            policy,
            ..Self::default()
        }
    }

    /// Registers AMCs and categories known from earlier runs.
    ///
    /// Announcements matching a known name resolve to its id, and new names
    /// are numbered after the highest known id.
    pub fn seed(&mut self, amcs: Vec<Amc>, categories: Vec<Category>) {
        for amc in amcs {
            self.amc_id_seq = self.amc_id_seq.max(amc.id);
            self.amcs.insert(amc.name.clone(), amc);
        }
        for category in categories {
            self.category_id_seq = self.category_id_seq.max(category.id);
            self.categories.insert(category.category.clone(), category);
        }
    }

    /// Returns a lazy iterator of records over an infallible line source.
    pub fn parse<I, L>(&mut self, lines: I) -> Records<'_, impl Iterator<Item = io::Result<L>>>
    where
        I: IntoIterator<Item = L>,
        L: AsRef<str>,
    {
        self.try_parse(lines.into_iter().map(Ok))
    }

    /// Returns a lazy iterator of records over a line source that may fail,
    /// such as lines read from disk.
    pub fn try_parse<I, L>(&mut self, lines: I) -> Records<'_, I::IntoIter>
    where
        I: IntoIterator<Item = io::Result<L>>,
        L: AsRef<str>,
    {
        Records {
            parser: self,
            lines: lines.into_iter(),
            pending: None,
            line_no: 0,
            current_amc_id: None,
            current_category_id: None,
        }
    }

    /// Funds seen so far, keyed by scheme code.
    ///
    /// Complete only once the record iterator has been drained.
    pub fn funds(&self) -> &HashMap<String, MutualFund> {
        &self.funds
    }

    pub fn amcs(&self) -> &HashMap<String, Amc> {
        &self.amcs
    }

    pub fn categories(&self) -> &HashMap<String, Category> {
        &self.categories
    }

    pub fn funds_sorted(&self) -> Vec<MutualFund> {
        let mut funds: Vec<_> = self.funds.values().cloned().collect();
        funds.sort_by(|a, b| a.code.cmp(&b.code));
        funds
    }

    pub fn amcs_sorted(&self) -> Vec<Amc> {
        let mut amcs: Vec<_> = self.amcs.values().cloned().collect();
        amcs.sort_by_key(|a| a.id);
        amcs
    }

    pub fn categories_sorted(&self) -> Vec<Category> {
        let mut categories: Vec<_> = self.categories.values().cloned().collect();
        categories.sort_by_key(|c| c.id);
        categories
    }

    /// Consumes the parser, handing over the fund, AMC and category maps.
    pub fn into_parts(
        self,
    ) -> (
        HashMap<String, MutualFund>,
        HashMap<String, Amc>,
        HashMap<String, Category>,
    ) {
        (self.funds, self.amcs, self.categories)
    }

    fn resolve_amc(&mut self, name: &str) -> i64 {
        if let Some(amc) = self.amcs.get(name) {
            return amc.id;
        }
        self.amc_id_seq += 1;
        let id = self.amc_id_seq;
        debug!(id, amc = name, "Discovered AMC");
        self.amcs.insert(
            name.to_string(),
            Amc {
                id,
                name: name.to_string(),
            },
        );
        id
    }

    fn resolve_category(&mut self, category: &str) -> i64 {
        if let Some(existing) = self.categories.get(category) {
            return existing.id;
        }
        self.category_id_seq += 1;
        let id = self.category_id_seq;
        debug!(id, category, "Discovered fund category");
        self.categories.insert(
            category.to_string(),
            Category {
                id,
                category: category.to_string(),
            },
        );
        id
    }
}

/// Pull-based record stream produced by [`NavParser::parse`].
///
/// Holds the parser mutably for its whole lifetime so a parser is only ever
/// driven by one traversal at a time.
pub struct Records<'p, I: Iterator> {
    parser: &'p mut NavParser,
    lines: I,
    pending: Option<I::Item>,
    line_no: usize,
    current_amc_id: Option<i64>,
    current_category_id: Option<i64>,
}

impl<I: Iterator> Records<'_, I> {
    /// Number of lines consumed so far.
    pub fn lines_read(&self) -> usize {
        self.line_no
    }

    /// The underlying line source.
    pub fn source(&self) -> &I {
        &self.lines
    }

    fn next_line(&mut self) -> Option<I::Item> {
        self.pending.take().or_else(|| self.lines.next())
    }
}

impl<I, L> Records<'_, I>
where
    I: Iterator<Item = io::Result<L>>,
    L: AsRef<str>,
{
    /// Returns true when lines other than blanks and headers remain.
    ///
    /// Skipped lines are consumed; the first remaining line is kept for the
    /// next call to `next`, so no record or announcement is processed.
    pub fn has_remaining_input(&mut self) -> bool {
        while let Some(item) = self.next_line() {
            let skippable = matches!(
                &item,
                Ok(line) if matches!(
                    classify(line.as_ref()),
                    LineKind::BlankLine | LineKind::HeaderLine
                )
            );
            if !skippable {
                self.pending = Some(item);
                return true;
            }
            self.line_no += 1;
        }
        false
    }
}

impl<I, L> Iterator for Records<'_, I>
where
    I: Iterator<Item = io::Result<L>>,
    L: AsRef<str>,
{
    type Item = Result<NavRecord, ParseError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let line = match self.next_line()? {
                Ok(line) => line,
                Err(e) => return Some(Err(ParseError::Io(e))),
            };
            self.line_no += 1;
            let line = line.as_ref();

            match classify(line) {
                LineKind::BlankLine | LineKind::HeaderLine => continue,
                LineKind::CategoryAnnouncement => {
                    self.current_category_id = Some(self.parser.resolve_category(line.trim()));
                }
                LineKind::AmcAnnouncement => {
                    self.current_amc_id = Some(self.parser.resolve_amc(line.trim()));
                }
                LineKind::DataRecord => {
                    let record = match NavRecord::from_line(line, self.parser.policy) {
                        Ok(record) => record,
                        Err(source) => {
                            return Some(Err(ParseError::Record {
                                line: self.line_no,
                                source,
                            }));
                        }
                    };
                    let fund = MutualFund::from_record(
                        &record,
                        self.current_amc_id,
                        self.current_category_id,
                    );
                    self.parser.funds.insert(fund.code.clone(), fund);
                    return Some(Ok(record));
                }
            }
        }
    }
}
