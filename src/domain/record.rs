//! Row-level credit records and the in-memory row store.

use crate::domain::error::SabiaError;
use crate::domain::period::Quarter;
use std::fmt;
use std::str::FromStr;

/// Categorical dimension a row can be filtered or grouped by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Dimension {
    /// Business size tier (`PORTE`).
    Size,
    /// `SEXO`
    Gender,
    /// Macro-region (`REGIAO`).
    Region,
    /// State code (`UF`).
    State,
    /// Funding origin (`ORIGEM`).
    Origin,
    /// Credit modality (`MODALIDADE`).
    Modality,
}

impl Dimension {
    pub const ALL: [Dimension; 6] = [
        Dimension::Size,
        Dimension::Gender,
        Dimension::Region,
        Dimension::State,
        Dimension::Origin,
        Dimension::Modality,
    ];

    /// Key used in config files and on the command line.
    pub fn key(&self) -> &'static str {
        match self {
            Dimension::Size => "porte",
            Dimension::Gender => "sexo",
            Dimension::Region => "regiao",
            Dimension::State => "uf",
            Dimension::Origin => "origem",
            Dimension::Modality => "modalidade",
        }
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for Dimension {
    type Err = SabiaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "porte" | "size" => Ok(Dimension::Size),
            "sexo" | "gender" => Ok(Dimension::Gender),
            "regiao" | "região" | "region" => Ok(Dimension::Region),
            "uf" | "state" => Ok(Dimension::State),
            "origem" | "origin" => Ok(Dimension::Origin),
            "modalidade" | "modality" => Ok(Dimension::Modality),
            _ => Err(SabiaError::UnknownDimension {
                name: s.to_string(),
            }),
        }
    }
}

/// Access shared by every record kind: its quarter and its categorical values.
///
/// `None` means the record does not carry that dimension at all (borrower
/// records have no origin or modality).
pub trait Dimensioned {
    fn quarter(&self) -> Quarter;
    fn dimension(&self, dimension: Dimension) -> Option<&str>;
}

/// Unique-borrower count for one month and one categorical cell.
#[derive(Debug, Clone, PartialEq)]
pub struct BorrowerRecord {
    pub quarter: Quarter,
    pub size: String,
    pub gender: String,
    pub region: String,
    pub state: String,
    pub borrowers: f64,
}

/// Outstanding portfolio snapshot for one month and one categorical cell.
#[derive(Debug, Clone, PartialEq)]
pub struct StockRecord {
    pub quarter: Quarter,
    pub size: String,
    pub gender: String,
    pub region: String,
    pub state: String,
    pub origin: String,
    pub modality: String,
    pub balance: f64,
    pub delinquent: f64,
    pub operations: f64,
    pub rate_numerator: f64,
    pub rate_denominator: f64,
}

/// New credit granted in one quarter for one categorical cell.
#[derive(Debug, Clone, PartialEq)]
pub struct GrantRecord {
    pub quarter: Quarter,
    pub size: String,
    pub gender: String,
    pub region: String,
    pub state: String,
    pub origin: String,
    pub modality: String,
    pub granted: f64,
}

fn non_empty(value: &str) -> Option<&str> {
    if value.is_empty() { None } else { Some(value) }
}

impl Dimensioned for BorrowerRecord {
    fn quarter(&self) -> Quarter {
        self.quarter
    }

    fn dimension(&self, dimension: Dimension) -> Option<&str> {
        match dimension {
            Dimension::Size => non_empty(&self.size),
            Dimension::Gender => non_empty(&self.gender),
            Dimension::Region => non_empty(&self.region),
            Dimension::State => non_empty(&self.state),
            Dimension::Origin | Dimension::Modality => None,
        }
    }
}

impl Dimensioned for StockRecord {
    fn quarter(&self) -> Quarter {
        self.quarter
    }

    fn dimension(&self, dimension: Dimension) -> Option<&str> {
        match dimension {
            Dimension::Size => non_empty(&self.size),
            Dimension::Gender => non_empty(&self.gender),
            Dimension::Region => non_empty(&self.region),
            Dimension::State => non_empty(&self.state),
            Dimension::Origin => non_empty(&self.origin),
            Dimension::Modality => non_empty(&self.modality),
        }
    }
}

impl Dimensioned for GrantRecord {
    fn quarter(&self) -> Quarter {
        self.quarter
    }

    fn dimension(&self, dimension: Dimension) -> Option<&str> {
        match dimension {
            Dimension::Size => non_empty(&self.size),
            Dimension::Gender => non_empty(&self.gender),
            Dimension::Region => non_empty(&self.region),
            Dimension::State => non_empty(&self.state),
            Dimension::Origin => non_empty(&self.origin),
            Dimension::Modality => non_empty(&self.modality),
        }
    }
}

/// The three record collections the engine works on.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RowStore {
    pub borrowers: Vec<BorrowerRecord>,
    pub stock: Vec<StockRecord>,
    pub grants: Vec<GrantRecord>,
}

impl RowStore {
    pub fn new(
        borrowers: Vec<BorrowerRecord>,
        stock: Vec<StockRecord>,
        grants: Vec<GrantRecord>,
    ) -> Self {
        Self {
            borrowers,
            stock,
            grants,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.borrowers.is_empty() && self.stock.is_empty() && self.grants.is_empty()
    }

    pub fn row_count(&self) -> usize {
        self.borrowers.len() + self.stock.len() + self.grants.len()
    }

    /// Distinct values of `dimension` across all three collections, sorted.
    pub fn distinct_values(&self, dimension: Dimension) -> Vec<String> {
        let mut values: std::collections::BTreeSet<&str> = std::collections::BTreeSet::new();
        values.extend(self.borrowers.iter().filter_map(|r| r.dimension(dimension)));
        values.extend(self.stock.iter().filter_map(|r| r.dimension(dimension)));
        values.extend(self.grants.iter().filter_map(|r| r.dimension(dimension)));
        values.into_iter().map(str::to_string).collect()
    }
}
