//! 全事件のレコードを出力テーブルにまとめる
//!
//! 氏名分割の元列はテーブル全体で1つに決めるので、レコード単位ではなく全件まとめて処理する。

use std::collections::HashSet;

use tracing::warn;

use super::pages::CASE_NUMBER_FIELD;
use super::reconcile::ATTORNEY_PREFIX;
use super::types::{CanonicalRecord, ResultTable};

/// 出力列（この順で並べる）
pub const OUTPUT_COLUMNS: [&str; 12] = [
    "Property Address",
    "Property City",
    "Property State",
    "Property Zip",
    "Mailing Address",
    "Mailing City",
    "Mailing State",
    "Mailing zip",
    "Phone Number",
    "First Name",
    "Last Name",
    "Probate Open Date",
];

/// テーブル全体の列名変更
pub const TABLE_RENAMES: &[(&str, &str)] = &[
    ("Decedent Street", "Property Address"),
    ("Street", "Mailing Address"),
    ("City", "Mailing City"),
    ("State", "Mailing State"),
    ("Zip", "Mailing zip"),
    ("Date Opened", "Probate Open Date"),
];

/// 氏名分割の元列（先にある方を優先）
pub const NAME_SOURCES: [&str; 2] = ["Estate Fiduciaries Name", "Fiduciary_1_Name"];

#[derive(Debug, Clone, Default)]
pub struct Finalized {
    pub table: ResultTable,
    /// 出力列のうち存在しなかったもの
    pub missing_columns: Vec<String>,
}

/// "Last, First Middle" を (Last, First) に分ける
///
/// カンマが無ければ全体を姓、空なら両方空。
pub fn split_name(full: &str) -> (String, String) {
    match full.split_once(',') {
        Some((last, rest)) => (
            last.trim().to_string(),
            rest.split_whitespace().next().unwrap_or_default().to_string(),
        ),
        None => (full.trim().to_string(), String::new()),
    }
}

fn present_columns(records: &[CanonicalRecord]) -> HashSet<String> {
    records
        .iter()
        .flat_map(|r| r.keys().map(str::to_string))
        .collect()
}

pub fn finalize(mut records: Vec<CanonicalRecord>, keep_case_number: bool) -> Finalized {
    if records.is_empty() {
        return Finalized::default();
    }

    let columns = present_columns(&records);
    let name_source = NAME_SOURCES
        .iter()
        .copied()
        .find(|c| columns.contains(*c));

    for record in &mut records {
        let full = name_source
            .and_then(|c| record.get(c))
            .unwrap_or_default()
            .to_string();
        let (last, first) = split_name(&full);
        record.insert("Last Name", last);
        record.insert("First Name", first);

        for (from, to) in TABLE_RENAMES {
            if let Some(value) = record.remove(from) {
                record.insert(*to, value);
            }
        }
    }

    let columns = present_columns(&records);
    let (mut kept, missing): (Vec<String>, Vec<String>) = OUTPUT_COLUMNS
        .iter()
        .map(|c| c.to_string())
        .partition(|c| columns.contains(c));

    if !missing.is_empty() {
        warn!("出力列が結果にありません: {}", missing.join(", "));
    }

    if keep_case_number && columns.contains(CASE_NUMBER_FIELD) {
        kept.push(CASE_NUMBER_FIELD.to_string());
    }

    let mut attorney: Vec<String> = columns
        .iter()
        .filter(|c| c.starts_with(ATTORNEY_PREFIX))
        .cloned()
        .collect();
    attorney.sort();
    kept.extend(attorney);

    let rows = records
        .iter()
        .map(|record| {
            kept.iter()
                .map(|c| record.get(c).unwrap_or_default().to_string())
                .collect()
        })
        .collect();

    Finalized {
        table: ResultTable::new(kept, rows),
        missing_columns: missing,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn record(pairs: &[(&str, &str)]) -> CanonicalRecord {
        let mut r = CanonicalRecord::new();
        for (k, v) in pairs {
            r.insert(*k, *v);
        }
        r
    }

    fn merged_record() -> CanonicalRecord {
        record(&[
            ("Case Number / Suffix", "612001"),
            ("Decedent Street", "1 ELM ST"),
            ("Property City", "COLUMBUS"),
            ("Property State", "OH"),
            ("Property Zip", "43215"),
            ("Date Opened", "01/02/2024"),
            ("Estate Fiduciaries Name", "Smith, John Robert"),
            ("Street", "9 OAK AVE"),
            ("City", "DAYTON"),
            ("State", "OH"),
            ("Zip", "45402"),
            ("Phone Number", "614-555-0100"),
            ("Attorney_Name", "DOE, JANE"),
            ("Attorney_Bar Number", "0042"),
            ("Fiduciary_1_Name", "Other, Person"),
        ])
    }

    #[test]
    fn test_split_name() {
        assert_eq!(
            split_name("Smith, John Robert"),
            ("Smith".to_string(), "John".to_string())
        );
        assert_eq!(split_name("Smith"), ("Smith".to_string(), String::new()));
        assert_eq!(split_name(""), (String::new(), String::new()));
        assert_eq!(split_name("Smith,"), ("Smith".to_string(), String::new()));
    }

    #[test]
    fn test_finalize_full_record() {
        let out = finalize(vec![merged_record()], true);
        let table = out.table;

        let mut expected: Vec<String> = OUTPUT_COLUMNS.iter().map(|c| c.to_string()).collect();
        expected.push("Case Number / Suffix".into());
        expected.push("Attorney_Bar Number".into());
        expected.push("Attorney_Name".into());
        assert_eq!(table.columns(), expected.as_slice());
        assert!(out.missing_columns.is_empty());

        assert_eq!(table.value(0, "Property Address"), Some("1 ELM ST"));
        assert_eq!(table.value(0, "Mailing Address"), Some("9 OAK AVE"));
        assert_eq!(table.value(0, "Mailing City"), Some("DAYTON"));
        assert_eq!(table.value(0, "Mailing zip"), Some("45402"));
        assert_eq!(table.value(0, "Probate Open Date"), Some("01/02/2024"));
        assert_eq!(table.value(0, "Last Name"), Some("Smith"));
        assert_eq!(table.value(0, "First Name"), Some("John"));
        assert_eq!(table.column_index("Fiduciary_1_Name"), None);
    }

    #[test]
    fn test_finalize_projection_keeps_declared_order() {
        let mut partial = merged_record();
        partial.remove("Phone Number");
        partial.remove("Zip");

        let out = finalize(vec![partial], false);
        let fixed: Vec<&str> = out
            .table
            .columns()
            .iter()
            .map(String::as_str)
            .filter(|c| OUTPUT_COLUMNS.contains(c))
            .collect();
        let expected: Vec<&str> = OUTPUT_COLUMNS
            .iter()
            .copied()
            .filter(|c| *c != "Phone Number" && *c != "Mailing zip")
            .collect();
        assert_eq!(fixed, expected);
        assert_eq!(
            out.missing_columns,
            vec!["Mailing zip".to_string(), "Phone Number".to_string()]
        );
        assert_eq!(out.table.column_index("Case Number / Suffix"), None);
    }

    #[test]
    fn test_finalize_falls_back_to_roster_name() {
        let mut r = merged_record();
        r.remove("Estate Fiduciaries Name");
        let out = finalize(vec![r, record(&[("Decedent Street", "2 PINE ST")])], true);

        assert_eq!(out.table.value(0, "Last Name"), Some("Other"));
        assert_eq!(out.table.value(0, "First Name"), Some("Person"));
        assert_eq!(out.table.value(1, "Last Name"), Some(""));
        assert_eq!(out.table.value(1, "Mailing City"), Some(""));
        assert_eq!(out.table.value(1, "Attorney_Name"), Some(""));
    }

    #[test]
    fn test_finalize_empty() {
        let out = finalize(Vec::new(), true);
        assert!(out.table.is_empty());
        assert!(out.table.columns().is_empty());
        assert!(out.missing_columns.is_empty());
    }
}
