//! CSV fixtures shaped like the production data file

use std::path::{Path, PathBuf};

use stock_screener::data::Dataset;

pub const HEADER: &str = "Ticker,Company Name,Price,YTarget,PE Ratio TTM,PE Forward,ROE,ROA,Dividend Paid,PE_Score,ROE_Score,ROA_Score,Dividend_Score";

/// Five stocks; XOM has no PE so it never passes a filter
pub const SAMPLE_ROWS: &[&str] = &[
    "2222.SR,Saudi Arabian Oil Co,27.5,33,15.2,14.1,25.3,14.8,1.96,0.72,0.81,0.77,0.64",
    "1120.SR,Al Rajhi Bank,88,102,19.8,17.5,21.7,2.3,2.4,0.55,0.74,0.21,0.58",
    "AAPL,Apple Inc,190,215,29.4,27.8,147.2,27.5,0.96,0.31,0.99,0.93,0.22",
    "MSFT,Microsoft Corp,410,460,35.1,31.2,38.5,18.1,3.0,0.22,0.87,0.81,0.35",
    "XOM,Exxon Mobil Corp,110,,,11.2,18.1,9.4,3.8,0.61,0.59,0.42,0.71",
];

pub fn sample_csv() -> String {
    csv_with_rows(SAMPLE_ROWS)
}

pub fn csv_with_rows(rows: &[&str]) -> String {
    let mut out = String::from(HEADER);
    for row in rows {
        out.push('\n');
        out.push_str(row);
    }
    out.push('\n');
    out
}

pub fn sample_dataset() -> Dataset {
    Dataset::from_reader(sample_csv().as_bytes()).expect("fixture CSV should load")
}

/// Write `contents` to `name` inside `dir` and return the path
pub fn write_csv_file(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, contents).expect("failed to write fixture CSV");
    path
}
