//! 出力テーブルのCSV化

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use tracing::info;

use crate::error::ScraperError;
use crate::probate::ResultTable;

/// `<prefix>_<YYYYMMDD>.csv`
pub fn file_name(prefix: &str, date: NaiveDate) -> String {
    format!("{}_{}.csv", prefix, date.format("%Y%m%d"))
}

/// UTF-8、先頭行が列名のCSV（列が無ければ空）
pub fn to_csv_bytes(table: &ResultTable) -> Result<Vec<u8>, ScraperError> {
    if table.columns().is_empty() {
        return Ok(Vec::new());
    }

    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(table.columns())?;
    for row in table.rows() {
        writer.write_record(row)?;
    }
    writer
        .into_inner()
        .map_err(|e| ScraperError::FileIO(e.into_error()))
}

/// エンコード済みCSVをディレクトリに書き出してパスを返す
pub fn save_csv(content: &[u8], dir: &Path, file_name: &str) -> Result<PathBuf, ScraperError> {
    std::fs::create_dir_all(dir)?;
    let path = dir.join(file_name);
    std::fs::write(&path, content)?;
    info!("CSVを保存: {:?} ({} bytes)", path, content.len());
    Ok(path)
}
