//! Classification of raw bulletin lines

/// Substring identifying the column header row of a bulletin.
pub const HEADER_MARKER: &str = "Scheme Code;Scheme Name";

/// Substring identifying a fund category announcement, e.g. `Open Ended Schemes(Debt Scheme - Banking and PSU Fund)`.
pub const CATEGORY_MARKER: &str = "Schemes";

pub const FIELD_SEPARATOR: char = ';';

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    DataRecord,
    HeaderLine,
    BlankLine,
    CategoryAnnouncement,
    AmcAnnouncement,
}

/// Classifies a single line of a bulletin.
///
/// Header detection runs before record detection since the header row also
/// carries the field separator. Anything left over names an AMC.
pub fn classify(line: &str) -> LineKind {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        LineKind::BlankLine
    } else if line.contains(HEADER_MARKER) {
        LineKind::HeaderLine
    } else if line.contains(FIELD_SEPARATOR) {
        LineKind::DataRecord
    } else if trimmed.contains(CATEGORY_MARKER) {
        LineKind::CategoryAnnouncement
    } else {
        LineKind::AmcAnnouncement
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_lines() {
        for line in ["", " ", "\t", "   \r\n", "\n"] {
            assert_eq!(classify(line), LineKind::BlankLine, "{line:?}");
        }
    }

    #[test]
    fn test_header_wins_over_record() {
        let header = "Scheme Code;Scheme Name;ISIN Div Payout/ISIN Growth;ISIN Div Reinvestment;Net Asset Value;Repurchase Price;Sale Price;Date";
        assert_eq!(classify(header), LineKind::HeaderLine);
    }

    #[test]
    fn test_data_record() {
        let line = "119551;Aditya Birla Sun Life Banking & PSU Debt Fund;INF209KA12Z1;INF209KA13Z9;101.6596;101.6596;101.6596;05-Jan-2024\n";
        assert_eq!(classify(line), LineKind::DataRecord);
    }

    #[test]
    fn test_category_announcement() {
        assert_eq!(
            classify("Open Ended Schemes(Debt Scheme - Banking and PSU Fund)"),
            LineKind::CategoryAnnouncement
        );
        assert_eq!(
            classify("  Close Ended Schemes  \r\n"),
            LineKind::CategoryAnnouncement
        );
    }

    #[test]
    fn test_amc_is_catch_all() {
        assert_eq!(
            classify("Aditya Birla Sun Life Mutual Fund"),
            LineKind::AmcAnnouncement
        );
        // Marker matching is case sensitive
        assert_eq!(classify("open ended schemes"), LineKind::AmcAnnouncement);
    }
}
