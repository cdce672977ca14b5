use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use chrono::{Local, NaiveDate};
use getset::CopyGetters;
use log::{debug, info, warn};
use rust_decimal::Decimal;
use serde::Deserialize;
use thiserror::Error;

use crate::reporting::ledger::ContractLedger;
use crate::reporting::record::ContractRecord;

/// Columns every load must provide, by normalized name. The reporting
/// queries read all of them, so a source missing any cannot produce a
/// usable report and the load fails up front.
const REQUIRED_COLUMNS: [&str; 14] = [
    "No",
    "No Kontrak",
    "KPPN",
    "Satker",
    "Nama Supplier",
    "Total Nilai Kontrak",
    "Nilai Kontrak yang Sudah Dibayarkan",
    "Pengisian",
    "Belanja_Pembayaran",
    "Potongan_Pembayaran",
    "Penihilan",
    "Saldo",
    "Tgl Kontrak",
    "Tanggal Akhir Pemberian Kesempatan",
];

/// Date formats seen in RPATA exports, tried in order.
const DATE_FORMATS: [&str; 5] = [
    "%Y-%m-%d",
    "%Y-%m-%d %H:%M:%S",
    "%d-%m-%Y",
    "%d/%m/%Y",
    "%Y/%m/%d",
];

/// Failure to produce a ledger at all. Per-cell problems never land here;
/// the cleaning rules absorb them.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("cannot read source: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed source: {0}")]
    Csv(#[from] csv::Error),
    #[error("missing required column: {0}")]
    MissingColumn(&'static str),
}

/// One source row as read, before cleaning. Every field is optional so a
/// sparse or ragged row still deserializes; the cleaning pass decides what
/// each missing or malformed cell becomes.
#[derive(Debug, Deserialize)]
struct RawContractRow {
    #[serde(rename = "No", default)]
    id: Option<String>,
    #[serde(rename = "No Kontrak", default)]
    contract_number: Option<String>,
    #[serde(rename = "KPPN", default)]
    office: Option<String>,
    #[serde(rename = "Satker", default)]
    org_unit: Option<String>,
    #[serde(rename = "Nama Supplier", default)]
    supplier_name: Option<String>,
    #[serde(rename = "Total Nilai Kontrak", default)]
    total_value: Option<String>,
    #[serde(rename = "Nilai Kontrak yang Sudah Dibayarkan", default)]
    paid_value: Option<String>,
    #[serde(rename = "Pengisian", default)]
    reserved: Option<String>,
    #[serde(rename = "Belanja_Pembayaran", default)]
    spent: Option<String>,
    #[serde(rename = "Potongan_Pembayaran", default)]
    deductions: Option<String>,
    #[serde(rename = "Penihilan", default)]
    written_off: Option<String>,
    #[serde(rename = "Saldo", default)]
    balance: Option<String>,
    #[serde(rename = "Tgl Kontrak", default)]
    contract_date: Option<String>,
    #[serde(rename = "Tanggal Akhir Pemberian Kesempatan", default)]
    opportunity_deadline: Option<String>,
}

impl RawContractRow {
    fn clean(self, today: NaiveDate, coerced: &mut u64) -> ContractRecord {
        let opportunity_deadline =
            clean_date(self.opportunity_deadline.as_deref(), "Tanggal Akhir Pemberian Kesempatan");
        ContractRecord {
            id: clean_id(self.id.as_deref()),
            contract_number: self.contract_number.unwrap_or_default(),
            office: self.office.unwrap_or_default(),
            org_unit: self.org_unit.unwrap_or_default(),
            supplier_name: self.supplier_name.unwrap_or_default(),
            total_value: clean_currency(self.total_value.as_deref(), "Total Nilai Kontrak", coerced),
            paid_value: clean_currency(
                self.paid_value.as_deref(),
                "Nilai Kontrak yang Sudah Dibayarkan",
                coerced,
            ),
            reserved: clean_currency(self.reserved.as_deref(), "Pengisian", coerced),
            spent: clean_currency(self.spent.as_deref(), "Belanja_Pembayaran", coerced),
            deductions: clean_currency(self.deductions.as_deref(), "Potongan_Pembayaran", coerced),
            written_off: clean_currency(self.written_off.as_deref(), "Penihilan", coerced),
            balance: clean_currency(self.balance.as_deref(), "Saldo", coerced),
            contract_date: clean_date(self.contract_date.as_deref(), "Tgl Kontrak"),
            days_remaining: opportunity_deadline
                .map(|deadline| deadline.signed_duration_since(today).num_days()),
            opportunity_deadline,
        }
    }
}

/// Collapse embedded line breaks and stray whitespace in a header cell, and
/// fold every known "No Kontrak" variant onto the canonical name.
fn normalize_header(header: &str) -> String {
    let collapsed = header.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.contains("No Kontrak") {
        "No Kontrak".to_string()
    } else {
        collapsed
    }
}

/// Parse an Indonesian currency cell: `"Rp 1.234.567,50"` becomes
/// `1234567.50`. A lone dash or an empty cell is an explicit zero. `None`
/// means the cell held something unrecognizable; the caller decides what
/// that becomes.
fn parse_rupiah(cell: &str) -> Option<Decimal> {
    let cleaned = cell.replace("Rp", "").replace('.', "").replace(',', ".");
    let cleaned = cleaned.trim();
    if cleaned.is_empty() || cleaned == "-" {
        return Some(Decimal::ZERO);
    }
    cleaned.parse().ok()
}

fn parse_date(cell: &str) -> Option<NaiveDate> {
    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(cell, format).ok())
}

fn clean_currency(cell: Option<&str>, column: &str, coerced: &mut u64) -> Decimal {
    let cell = cell.unwrap_or("");
    match parse_rupiah(cell) {
        Some(value) => value,
        None => {
            *coerced += 1;
            debug!("coerced unparsable {} cell to zero, raw={:?}", column, cell);
            Decimal::ZERO
        }
    }
}

fn clean_date(cell: Option<&str>, column: &str) -> Option<NaiveDate> {
    let cell = cell.unwrap_or("").trim();
    if cell.is_empty() || cell == "-" {
        return None;
    }
    match parse_date(cell) {
        Some(date) => Some(date),
        None => {
            debug!("dropped unparsable {} cell, raw={:?}", column, cell);
            None
        }
    }
}

fn clean_id(cell: Option<&str>) -> u32 {
    let cell = cell.unwrap_or("").trim();
    match cell.parse() {
        Ok(id) => id,
        Err(_) => {
            if !cell.is_empty() {
                debug!("coerced unparsable No cell to zero, raw={:?}", cell);
            }
            0
        }
    }
}

/// Read and clean a full ledger from `reader`, deriving day counts against
/// `today`. The caller owns the choice of clock, which keeps repeated loads
/// in tests deterministic.
pub fn read_ledger<R: Read>(reader: R, today: NaiveDate) -> Result<ContractLedger, LoadError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader);

    let normalized: Vec<String> = csv_reader.headers()?.iter().map(normalize_header).collect();
    for column in REQUIRED_COLUMNS {
        if !normalized.iter().any(|header| header.as_str() == column) {
            return Err(LoadError::MissingColumn(column));
        }
    }
    csv_reader.set_headers(csv::StringRecord::from(normalized));

    let mut records = Vec::new();
    let mut coerced = 0u64;
    for row in csv_reader.deserialize::<RawContractRow>() {
        records.push(row?.clean(today, &mut coerced));
    }

    if coerced > 0 {
        warn!("coerced {} unparsable monetary cells to zero", coerced);
    }
    Ok(ContractLedger::new(records, coerced))
}

/// Load a ledger from a file, deriving day counts against the current date.
pub fn load_ledger(path: impl AsRef<Path>) -> Result<ContractLedger, LoadError> {
    let path = path.as_ref();
    let file = File::open(path)?;
    let ledger = read_ledger(file, Local::now().date_naive())?;
    info!("loaded {} contracts from {}", ledger.len(), path.display());
    Ok(ledger)
}

/// Memoized loader for one reporting session. Entries are keyed by source
/// path and dropped when the file's modification time changes or on
/// explicit request, so repeated report renders never re-read an unchanged
/// source.
#[derive(Default, CopyGetters)]
pub struct LedgerCache {
    entries: HashMap<PathBuf, CacheEntry>,
    /// How many times a source was actually read and parsed, as opposed to
    /// served from cache.
    #[getset(get_copy = "pub")]
    source_reads: u64,
}

struct CacheEntry {
    modified: Option<SystemTime>,
    ledger: ContractLedger,
}

impl LedgerCache {
    pub fn new() -> LedgerCache {
        LedgerCache::default()
    }

    /// Return the ledger for `path`, re-reading the source only when it is
    /// not cached yet or its modification time no longer matches.
    pub fn load(&mut self, path: impl AsRef<Path>) -> Result<&ContractLedger, LoadError> {
        let path = path.as_ref();
        let modified = std::fs::metadata(path)?.modified().ok();

        let hit = self
            .entries
            .get(path)
            .is_some_and(|entry| entry.modified == modified);
        if hit {
            debug!("cache hit for {}", path.display());
        } else {
            let ledger = load_ledger(path)?;
            self.source_reads += 1;
            self.entries
                .insert(path.to_path_buf(), CacheEntry { modified, ledger });
        }

        // Present by construction: either a hit or just inserted.
        Ok(&self.entries[path].ledger)
    }

    /// Drop the cached entry for `path`; the next load re-reads the source.
    pub fn invalidate(&mut self, path: impl AsRef<Path>) {
        self.entries.remove(path.as_ref());
    }

    /// Drop every cached entry.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, SystemTime};

    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;

    const DATA: &str = "\
No,\"No Kontrak\n(Unik)\",KPPN,Satker,Nama Supplier,Total Nilai Kontrak,Nilai Kontrak yang Sudah Dibayarkan,Pengisian,Belanja_Pembayaran,Potongan_Pembayaran,Penihilan,Saldo,Tgl Kontrak,Tanggal Akhir Pemberian Kesempatan
1,KTR-001,A100,Dinas PU,PT Alpha,\"Rp 1.000.000,50\",Rp 400.000,Rp 600.000,Rp 250.000,Rp 0,-,\"Rp 350.000,50\",2025-03-01,2025-09-05
2,KTR-002,B200,Dinas Kesehatan,CV Beta,not-a-number,-,Rp 100.000,Rp 0,-,-,Rp 100.000,15/02/2025,
3,KTR-003,A100,Dinas PU,PT Alpha,Rp 2.000.000,Rp 2.000.000,Rp 0,Rp 0,-,-,-,2025-01-20,2025-08-20
";

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 8, 26).unwrap()
    }

    #[test]
    fn test_parse_rupiah_formats() {
        assert_eq!(parse_rupiah("Rp 1.234.567,50"), Some(dec!(1234567.50)));
        assert_eq!(parse_rupiah("1.234.567,50"), Some(dec!(1234567.50)));
        assert_eq!(parse_rupiah("Rp 0"), Some(dec!(0)));
        assert_eq!(parse_rupiah("-"), Some(dec!(0)));
        assert_eq!(parse_rupiah(""), Some(dec!(0)));
        assert_eq!(parse_rupiah("-250,75"), Some(dec!(-250.75)));
        assert_eq!(parse_rupiah("tidak ada"), None);
    }

    #[test]
    fn test_normalize_header() {
        assert_eq!(normalize_header("No Kontrak\n(Unik)"), "No Kontrak");
        assert_eq!(normalize_header("  No Kontrak "), "No Kontrak");
        assert_eq!(
            normalize_header("Tanggal Akhir\nPemberian Kesempatan"),
            "Tanggal Akhir Pemberian Kesempatan"
        );
        assert_eq!(normalize_header("KPPN"), "KPPN");
    }

    #[test]
    fn test_parse_date_formats() {
        let expected = NaiveDate::from_ymd_opt(2025, 2, 15).unwrap();
        assert_eq!(parse_date("2025-02-15"), Some(expected));
        assert_eq!(parse_date("15-02-2025"), Some(expected));
        assert_eq!(parse_date("15/02/2025"), Some(expected));
        assert_eq!(parse_date("2025/02/15"), Some(expected));
        assert_eq!(parse_date("2025-02-15 00:00:00"), Some(expected));
        assert_eq!(parse_date("bukan tanggal"), None);
    }

    #[test]
    fn test_read_ledger_cleans_and_derives() {
        let ledger = read_ledger(DATA.as_bytes(), today()).unwrap();
        assert_eq!(ledger.len(), 3);
        assert_eq!(ledger.coerced_cells(), 1);

        let first = &ledger.records()[0];
        assert_eq!(first.contract_number(), "KTR-001");
        assert_eq!(first.total_value(), dec!(1000000.50));
        assert_eq!(first.balance(), dec!(350000.50));
        assert_eq!(first.days_remaining(), Some(10));

        let second = &ledger.records()[1];
        assert_eq!(second.total_value(), dec!(0));
        assert_eq!(
            second.contract_date(),
            Some(NaiveDate::from_ymd_opt(2025, 2, 15).unwrap())
        );
        assert_eq!(second.opportunity_deadline(), None);
        assert_eq!(second.days_remaining(), None);

        let third = &ledger.records()[2];
        assert_eq!(third.days_remaining(), Some(-6));
        assert_eq!(third.balance(), dec!(0));
    }

    #[test]
    fn test_record_serializes_with_canonical_headers() {
        let ledger = read_ledger(DATA.as_bytes(), today()).unwrap();
        let mut out = Vec::new();
        {
            let mut writer = csv::WriterBuilder::new().from_writer(&mut out);
            writer.serialize(&ledger.records()[0]).unwrap();
            writer.flush().unwrap();
        }
        let out = String::from_utf8(out).unwrap();
        assert!(out.starts_with("No,No Kontrak,KPPN,Satker,Nama Supplier,"));
    }

    #[test]
    fn test_read_ledger_missing_column_fails() {
        let data = "No,KPPN\n1,A100\n";
        match read_ledger(data.as_bytes(), today()) {
            Err(LoadError::MissingColumn(column)) => assert_eq!(column, "No Kontrak"),
            other => panic!("expected missing column error, got {:?}", other),
        }
    }

    #[test]
    fn test_load_ledger_missing_file_fails() {
        let missing = Path::new("tests/fixtures/tidak-ada.csv");
        assert!(matches!(load_ledger(missing), Err(LoadError::Io(_))));
    }

    #[test]
    fn test_cache_rereads_only_on_invalidation_or_mtime_change() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dataset.csv");
        std::fs::write(&path, DATA).unwrap();

        let mut cache = LedgerCache::new();
        let first = cache.load(&path).unwrap().records().to_vec();
        let second = cache.load(&path).unwrap().records().to_vec();
        assert_eq!(cache.source_reads(), 1);
        assert_eq!(first, second);

        cache.invalidate(&path);
        cache.load(&path).unwrap();
        assert_eq!(cache.source_reads(), 2);

        let file = std::fs::OpenOptions::new().append(true).open(&path).unwrap();
        file.set_modified(SystemTime::now() + Duration::from_secs(10))
            .unwrap();
        cache.load(&path).unwrap();
        assert_eq!(cache.source_reads(), 3);
        cache.load(&path).unwrap();
        assert_eq!(cache.source_reads(), 3);

        cache.clear();
        cache.load(&path).unwrap();
        assert_eq!(cache.source_reads(), 4);
    }
}
