//! CSV file data adapter.
//!
//! Reads the three credit extracts (borrowers, portfolio stock, grants) from
//! headered CSV files. Columns are located by header name, case-insensitively,
//! so column order does not matter. Files whose header uses `;` are read with
//! that delimiter and pt-BR numbers (`1.234,5`); `,`-delimited files take
//! plain numbers (`1234.5`). A number in the other convention is malformed.
//!
//! A row that cannot be parsed is logged and counted, never fatal.

use crate::domain::error::SabiaError;
use crate::domain::period::{parse_month, parse_quarter, Quarter};
use crate::domain::record::{BorrowerRecord, GrantRecord, StockRecord};
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::{DataPort, LoadOutcome};
use csv::StringRecord;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

pub const DEFAULT_BORROWERS_FILE: &str = "tomadores.csv";
pub const DEFAULT_STOCK_FILE: &str = "estoque.csv";
pub const DEFAULT_GRANTS_FILE: &str = "concessao.csv";

const MONTH: &str = "MES";
const QUARTER: &str = "TRIMESTRE";
const SIZE: &str = "PORTE";
const GENDER: &str = "SEXO";
const REGION: &str = "REGIAO";
const STATE: &str = "UF";
const ORIGIN: &str = "ORIGEM";
const MODALITY: &str = "MODALIDADE";
const BORROWERS: &str = "QTDE_EMPRESAS_TOMADORAS";
const BALANCE: &str = "SALDO_CARTEIRA_CREDITO";
const DELINQUENT: &str = "SALDO_INADIMPLENCIA";
const OPERATIONS: &str = "QTD_OPERACOES";
const RATE_NUMERATOR: &str = "NUM_TAXA_POND";
const RATE_DENOMINATOR: &str = "DEN_TAXA_POND";
const GRANTED: &str = "CONCESSAO";

pub struct CsvAdapter {
    borrowers_path: PathBuf,
    stock_path: PathBuf,
    grants_path: PathBuf,
}

impl CsvAdapter {
    /// Adapter over `dir` using the default file names.
    pub fn new(dir: PathBuf) -> Self {
        Self::with_files(dir, DEFAULT_BORROWERS_FILE, DEFAULT_STOCK_FILE, DEFAULT_GRANTS_FILE)
    }

    pub fn with_files(dir: PathBuf, borrowers: &str, stock: &str, grants: &str) -> Self {
        Self {
            borrowers_path: dir.join(borrowers),
            stock_path: dir.join(stock),
            grants_path: dir.join(grants),
        }
    }

    /// Builds the adapter from the `[data]` section. `dir_override` takes
    /// precedence over `[data] dir`.
    pub fn from_config(
        config: &dyn ConfigPort,
        dir_override: Option<&Path>,
    ) -> Result<Self, SabiaError> {
        let dir = match dir_override {
            Some(dir) => dir.to_path_buf(),
            None => config
                .get_string("data", "dir")
                .filter(|d| !d.trim().is_empty())
                .map(PathBuf::from)
                .ok_or_else(|| SabiaError::ConfigMissing {
                    section: "data".into(),
                    key: "dir".into(),
                })?,
        };
        let file = |key: &str, default: &str| {
            config
                .get_string("data", key)
                .filter(|f| !f.trim().is_empty())
                .unwrap_or_else(|| default.to_string())
        };
        Ok(Self::with_files(
            dir,
            &file("borrowers_file", DEFAULT_BORROWERS_FILE),
            &file("stock_file", DEFAULT_STOCK_FILE),
            &file("grants_file", DEFAULT_GRANTS_FILE),
        ))
    }

    pub fn paths(&self) -> [&Path; 3] {
        [&self.borrowers_path, &self.stock_path, &self.grants_path]
    }
}

impl DataPort for CsvAdapter {
    fn load_borrowers(&self) -> Result<LoadOutcome<BorrowerRecord>, SabiaError> {
        load(&self.borrowers_path, &[BORROWERS], |row| {
            Ok(BorrowerRecord {
                quarter: row.quarter()?,
                size: row.text(SIZE)?,
                gender: row.text(GENDER)?,
                region: row.text(REGION)?,
                state: row.text(STATE)?,
                borrowers: row.amount(BORROWERS)?,
            })
        })
    }

    fn load_stock(&self) -> Result<LoadOutcome<StockRecord>, SabiaError> {
        let required = [BALANCE, DELINQUENT, OPERATIONS, RATE_NUMERATOR, RATE_DENOMINATOR];
        load(&self.stock_path, &required, |row| {
            Ok(StockRecord {
                quarter: row.quarter()?,
                size: row.text(SIZE)?,
                gender: row.text(GENDER)?,
                region: row.text(REGION)?,
                state: row.text(STATE)?,
                origin: row.text(ORIGIN)?,
                modality: row.text(MODALITY)?,
                balance: row.amount(BALANCE)?,
                delinquent: row.amount(DELINQUENT)?,
                operations: row.amount(OPERATIONS)?,
                rate_numerator: row.amount(RATE_NUMERATOR)?,
                rate_denominator: row.amount(RATE_DENOMINATOR)?,
            })
        })
    }

    fn load_grants(&self) -> Result<LoadOutcome<GrantRecord>, SabiaError> {
        load(&self.grants_path, &[GRANTED], |row| {
            Ok(GrantRecord {
                quarter: row.quarter()?,
                size: row.text(SIZE)?,
                gender: row.text(GENDER)?,
                region: row.text(REGION)?,
                state: row.text(STATE)?,
                origin: row.text(ORIGIN)?,
                modality: row.text(MODALITY)?,
                granted: row.amount(GRANTED)?,
            })
        })
    }
}

/// Header name (uppercased) to column index.
struct Columns(HashMap<String, usize>);

impl Columns {
    fn from_headers(headers: &StringRecord) -> Self {
        Self(
            headers
                .iter()
                .enumerate()
                .map(|(i, h)| (h.trim().trim_start_matches('\u{feff}').to_uppercase(), i))
                .collect(),
        )
    }

    fn index(&self, name: &str) -> Option<usize> {
        self.0.get(name).copied()
    }
}

/// Number convention of one file, fixed by its delimiter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumberFormat {
    /// `1234.5`, no digit grouping.
    Plain,
    /// `1.234,5`, `.` groups thousands and `,` marks decimals.
    Brazilian,
}

impl NumberFormat {
    fn for_delimiter(delimiter: u8) -> Self {
        if delimiter == b';' {
            NumberFormat::Brazilian
        } else {
            NumberFormat::Plain
        }
    }
}

struct Row<'a> {
    record: &'a StringRecord,
    columns: &'a Columns,
    numbers: NumberFormat,
}

impl Row<'_> {
    fn cell(&self, name: &str) -> Option<&str> {
        self.columns
            .index(name)
            .and_then(|i| self.record.get(i))
            .map(str::trim)
    }

    /// Categorical cell. An absent column reads as empty; a row too short to
    /// reach a present column is malformed.
    fn text(&self, name: &str) -> Result<String, String> {
        match self.columns.index(name) {
            None => Ok(String::new()),
            Some(_) => self
                .cell(name)
                .map(str::to_string)
                .ok_or_else(|| format!("missing {name}")),
        }
    }

    fn amount(&self, name: &str) -> Result<f64, String> {
        let raw = self
            .cell(name)
            .filter(|v| !v.is_empty())
            .ok_or_else(|| format!("missing {name}"))?;
        let value = parse_decimal(raw, self.numbers).ok_or_else(|| format!("invalid {name} '{raw}'"))?;
        if value < 0.0 {
            return Err(format!("negative {name} '{raw}'"));
        }
        Ok(value)
    }

    /// Month column wins over the quarter column when both are present.
    fn quarter(&self) -> Result<Quarter, String> {
        if let Some(month) = self.cell(MONTH).filter(|v| !v.is_empty()) {
            return parse_month(month).map_err(|e| e.to_string());
        }
        if let Some(quarter) = self.cell(QUARTER).filter(|v| !v.is_empty()) {
            return parse_quarter(quarter).map_err(|e| e.to_string());
        }
        Err(format!("missing {MONTH}/{QUARTER}"))
    }
}

/// Parses one numeric cell in `format`. Grouping that is not in thousands,
/// or separators in the wrong convention, give `None`.
pub fn parse_decimal(raw: &str, format: NumberFormat) -> Option<f64> {
    let s = raw.trim();
    let normalised = match format {
        NumberFormat::Plain if s.contains(',') => return None,
        NumberFormat::Plain => s.to_string(),
        NumberFormat::Brazilian => {
            let (integer, fraction) = match s.split_once(',') {
                Some((integer, fraction)) => (integer, Some(fraction)),
                None => (s, None),
            };
            let digits = ungroup(integer)?;
            match fraction {
                Some(f) if !f.is_empty() && f.bytes().all(|b| b.is_ascii_digit()) => {
                    format!("{digits}.{f}")
                }
                Some(_) => return None,
                None => digits,
            }
        }
    };
    normalised.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Strips `.` thousands separators, checking every group after the first
/// has exactly three digits.
fn ungroup(integer: &str) -> Option<String> {
    let (sign, body) = match integer.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", integer),
    };
    let all_digits = |g: &str| !g.is_empty() && g.bytes().all(|b| b.is_ascii_digit());
    let mut groups = body.split('.');
    let first = groups.next()?;
    let rest: Vec<&str> = groups.collect();
    let grouped_ok = rest.is_empty() || first.len() <= 3;
    let valid = all_digits(first) && grouped_ok && rest.iter().all(|g| g.len() == 3 && all_digits(g));
    valid.then(|| format!("{sign}{}", body.replace('.', "")))
}

fn delimiter(content: &str) -> u8 {
    let header = content.lines().next().unwrap_or_default();
    if header.contains(';') { b';' } else { b',' }
}

fn load<T, F>(path: &Path, required: &[&str], parse: F) -> Result<LoadOutcome<T>, SabiaError>
where
    F: Fn(&Row<'_>) -> Result<T, String>,
{
    let content = fs::read_to_string(path).map_err(|e| SabiaError::DataLoad {
        reason: format!("failed to read {}: {}", path.display(), e),
    })?;

    let delimiter = delimiter(&content);
    let numbers = NumberFormat::for_delimiter(delimiter);
    let mut rdr = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .from_reader(content.as_bytes());

    let headers = rdr.headers().map_err(|e| SabiaError::DataLoad {
        reason: format!("failed to read header of {}: {}", path.display(), e),
    })?;
    let columns = Columns::from_headers(headers);

    let missing: Vec<&str> = required
        .iter()
        .copied()
        .filter(|name| columns.index(name).is_none())
        .collect();
    if !missing.is_empty() {
        return Err(SabiaError::DataLoad {
            reason: format!("{} is missing columns: {}", path.display(), missing.join(", ")),
        });
    }
    if columns.index(MONTH).is_none() && columns.index(QUARTER).is_none() {
        return Err(SabiaError::DataLoad {
            reason: format!("{} has neither {MONTH} nor {QUARTER}", path.display()),
        });
    }

    let mut outcome = LoadOutcome::default();
    for result in rdr.records() {
        let parsed = result.map_err(|e| e.to_string()).and_then(|record| {
            let line = record.position().map(|p| p.line()).unwrap_or_default();
            parse(&Row {
                record: &record,
                columns: &columns,
                numbers,
            })
            .map_err(|reason| format!("line {line}: {reason}"))
        });
        match parsed {
            Ok(row) => outcome.rows.push(row),
            Err(reason) => {
                warn!(file = %path.display(), %reason, "skipping malformed row");
                outcome.skipped += 1;
            }
        }
    }

    info!(
        file = %path.display(),
        loaded = outcome.rows.len(),
        skipped = outcome.skipped,
        "loaded rows"
    );
    Ok(outcome)
}
