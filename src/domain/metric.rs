//! Metric identities and their presentation kinds.

use crate::domain::error::SabiaError;
use std::fmt;
use std::str::FromStr;

/// A dashboard metric computed per quarter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MetricKey {
    Borrowers,
    Operations,
    Granted,
    Balance,
    Delinquent,
    InterestRate,
    DelinquencyRate,
}

/// Which row collection a metric is computed from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    Borrowers,
    Stock,
    Grants,
}

/// How a metric's values are rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricKind {
    Count,
    Currency,
    Percentage,
}

/// How a change between two values of a metric is expressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeltaKind {
    /// `(current - previous) / previous * 100`
    Relative,
    /// `current - previous`
    PercentagePoints,
}

impl MetricKey {
    pub const ALL: [MetricKey; 7] = [
        MetricKey::Borrowers,
        MetricKey::Operations,
        MetricKey::Granted,
        MetricKey::Balance,
        MetricKey::Delinquent,
        MetricKey::InterestRate,
        MetricKey::DelinquencyRate,
    ];

    /// Metrics with an additive, never-undefined quarterly total.
    pub const PRIMARY: [MetricKey; 5] = [
        MetricKey::Borrowers,
        MetricKey::Operations,
        MetricKey::Granted,
        MetricKey::Balance,
        MetricKey::Delinquent,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            MetricKey::Borrowers => "tomadores",
            MetricKey::Operations => "operacoes",
            MetricKey::Granted => "concessao",
            MetricKey::Balance => "saldo",
            MetricKey::Delinquent => "inadimplencia",
            MetricKey::InterestRate => "taxaJuros",
            MetricKey::DelinquencyRate => "inadRate",
        }
    }

    pub fn source(&self) -> Source {
        match self {
            MetricKey::Borrowers => Source::Borrowers,
            MetricKey::Granted => Source::Grants,
            MetricKey::Operations
            | MetricKey::Balance
            | MetricKey::Delinquent
            | MetricKey::InterestRate
            | MetricKey::DelinquencyRate => Source::Stock,
        }
    }

    pub fn kind(&self) -> MetricKind {
        match self {
            MetricKey::Borrowers | MetricKey::Operations => MetricKind::Count,
            MetricKey::Granted | MetricKey::Balance | MetricKey::Delinquent => MetricKind::Currency,
            MetricKey::InterestRate | MetricKey::DelinquencyRate => MetricKind::Percentage,
        }
    }

    pub fn is_rate(&self) -> bool {
        self.kind() == MetricKind::Percentage
    }

    pub fn delta_kind(&self) -> DeltaKind {
        if self.is_rate() {
            DeltaKind::PercentagePoints
        } else {
            DeltaKind::Relative
        }
    }
}

impl DeltaKind {
    /// Change from `previous` to `current`, in percent for relative deltas and
    /// in percentage points for rate ratios. Undefined when either side is, or
    /// when a relative change would divide by zero.
    pub fn delta(&self, current: Option<f64>, previous: Option<f64>) -> Option<f64> {
        let (current, previous) = (current?, previous?);
        match self {
            DeltaKind::Relative if previous == 0.0 => None,
            DeltaKind::Relative => Some((current - previous) / previous * 100.0),
            DeltaKind::PercentagePoints => Some((current - previous) * 100.0),
        }
    }

    /// Change from the value `periods_back` before the last one to the last
    /// one. Undefined when the series is too short.
    pub fn delta_back(&self, values: &[Option<f64>], periods_back: usize) -> Option<f64> {
        let last = values.len().checked_sub(1)?;
        let previous = last.checked_sub(periods_back)?;
        self.delta(values[last], values[previous])
    }
}

impl fmt::Display for MetricKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for MetricKey {
    type Err = SabiaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "tomadores" | "borrowers" => Ok(MetricKey::Borrowers),
            "operacoes" | "operações" | "operations" => Ok(MetricKey::Operations),
            "concessao" | "concessão" | "granted" => Ok(MetricKey::Granted),
            "saldo" | "balance" => Ok(MetricKey::Balance),
            "inadimplencia" | "inadimplência" | "delinquent" => Ok(MetricKey::Delinquent),
            "taxajuros" | "interest_rate" | "interest" => Ok(MetricKey::InterestRate),
            "inadrate" | "delinquency_rate" => Ok(MetricKey::DelinquencyRate),
            _ => Err(SabiaError::UnknownMetric {
                name: s.to_string(),
            }),
        }
    }
}
