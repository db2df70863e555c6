//! Fastener descriptors such as `(6) 10HDG (0.148" x 3" HDG 10d Common)`.
//!
//! Candidates carry these as display text. Parsing turns them into a typed count plus a
//! [`FastenerKey`] so that equivalent wordings (`3"` vs `3in`, `1 1/2"` vs `1.5"`) merge
//! when a job list is totalled.

mod parser;

use serde::Serialize;
use std::fmt;

use crate::workflows::normalizer::normalize_token;

pub use parser::parse;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LengthUnit {
    Inch,
    Millimetre,
}

impl LengthUnit {
    pub const fn suffix(self) -> &'static str {
        match self {
            Self::Inch => "\"",
            Self::Millimetre => "mm",
        }
    }
}

/// A length held in thousandths of its unit so it can be hashed and ordered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(into = "DimensionRepr")]
pub struct Dimension {
    thousandths: u32,
    unit: LengthUnit,
}

impl Dimension {
    pub fn new(value: f64, unit: LengthUnit) -> Option<Self> {
        if !value.is_finite() || value <= 0.0 {
            return None;
        }
        let thousandths = (value * 1000.0).round();
        if thousandths > f64::from(u32::MAX) {
            return None;
        }
        Some(Self {
            thousandths: thousandths as u32,
            unit,
        })
    }

    pub fn value(&self) -> f64 {
        f64::from(self.thousandths) / 1000.0
    }

    pub fn unit(&self) -> LengthUnit {
        self.unit
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let whole = self.thousandths / 1000;
        let fraction = self.thousandths % 1000;
        if fraction == 0 {
            write!(f, "{whole}{}", self.unit.suffix())
        } else {
            let digits = format!("{fraction:03}");
            write!(f, "{whole}.{}{}", digits.trim_end_matches('0'), self.unit.suffix())
        }
    }
}

#[derive(Serialize)]
struct DimensionRepr {
    value: f64,
    unit: LengthUnit,
}

impl From<Dimension> for DimensionRepr {
    fn from(dimension: Dimension) -> Self {
        Self {
            value: dimension.value(),
            unit: dimension.unit,
        }
    }
}

/// Normalized identity of a fastener, used as the aggregation key.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct FastenerKey {
    pub spec_code: String,
    pub diameter: Dimension,
    pub length: Dimension,
    pub finish: String,
}

impl fmt::Display for FastenerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({} x {}", self.spec_code, self.diameter, self.length)?;
        if !self.finish.is_empty() {
            write!(f, " {}", self.finish)?;
        }
        f.write_str(")")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FastenerDescriptor {
    pub count: u32,
    pub spec_code: String,
    pub diameter: Dimension,
    pub length: Dimension,
    pub finish: String,
    /// Text as supplied by the catalog, kept for display.
    pub raw: String,
}

impl FastenerDescriptor {
    pub fn key(&self) -> FastenerKey {
        FastenerKey {
            spec_code: normalize_token(&self.spec_code),
            diameter: self.diameter,
            length: self.length,
            finish: normalize_token(&self.finish),
        }
    }
}

/// Canonical notation; parsing it yields the same key and count.
impl fmt::Display for FastenerDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({}) {} ({} x {}",
            self.count, self.spec_code, self.diameter, self.length
        )?;
        if !self.finish.is_empty() {
            write!(f, " {}", self.finish)?;
        }
        f.write_str(")")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ParseFailureKind {
    Empty,
    MissingCount,
    MissingSpecCode,
    MissingDimensions,
    InvalidDimensions,
}

impl ParseFailureKind {
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Empty => "descriptor is empty",
            Self::MissingCount => "no leading (count)",
            Self::MissingSpecCode => "no fastener code",
            Self::MissingDimensions => "no (diameter x length) clause",
            Self::InvalidDimensions => "unreadable diameter or length",
        }
    }
}

/// Descriptor text that could not be decomposed. Callers show `raw` unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[error("unparsed fastener descriptor '{raw}': {}", kind.label())]
pub struct FastenerParseFailure {
    pub raw: String,
    /// Leading count when it could still be read, otherwise 0.
    pub recovered_count: u32,
    pub kind: ParseFailureKind,
}
