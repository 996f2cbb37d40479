//! RData - the tagged union of R runtime values.
//!
//! This module contains:
//! - `RData`: the closed variant set of the R value space under comparison
//! - `RType`: the runtime type tag (what `typeof` reports)
//! - `Logical`: R's tri-state logical element
//! - the distinguished NA-double bit pattern, distinct from ordinary NaN

use super::RValue;

/// R's NA_real_ payload: an IEEE-754 quiet NaN with 1954 in the low word.
/// This is how the reference implementation distinguishes "missing" from
/// "not a number" at the bit level.
pub const NA_REAL_BITS: u64 = 0x7FF0_0000_0000_07A2;

/// The distinguished NA double.
pub fn na_real() -> f64 {
    f64::from_bits(NA_REAL_BITS)
}

/// True only for the NA payload. An ordinary NaN is NOT NA-real: the two
/// are different runtime states and every comparison must keep them apart.
pub fn is_na_real(x: f64) -> bool {
    x.to_bits() == NA_REAL_BITS
}

/// Tri-state logical element: `TRUE`, `FALSE`, `NA`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Logical {
    True,
    False,
    Na,
}

impl Logical {
    pub fn from_option(v: Option<bool>) -> Self {
        match v {
            Some(true) => Logical::True,
            Some(false) => Logical::False,
            None => Logical::Na,
        }
    }

    pub fn as_option(self) -> Option<bool> {
        match self {
            Logical::True => Some(true),
            Logical::False => Some(false),
            Logical::Na => None,
        }
    }

    pub fn is_na(self) -> bool {
        matches!(self, Logical::Na)
    }
}

/// A complex element. Either component may carry the NA-double payload.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Complex {
    pub re: f64,
    pub im: f64,
}

impl Complex {
    pub fn new(re: f64, im: f64) -> Self {
        Self { re, im }
    }

    pub fn is_na(&self) -> bool {
        is_na_real(self.re) || is_na_real(self.im)
    }
}

/// Opaque reference to a closure. The oracle never inspects closures;
/// two references compare equal only when their tokens match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ClosureRef(pub u64);

/// The main tagged union for R values under comparison.
#[derive(Debug, Clone, PartialEq)]
pub enum RData {
    Null,
    Logical(Vec<Logical>),
    Int(Vec<Option<i32>>),
    Double(Vec<f64>),
    Complex(Vec<Complex>),
    Character(Vec<Option<String>>),
    Raw(Vec<u8>),
    List(Vec<RValue>),
    Closure(ClosureRef),
}

impl RData {
    /// Number of top-level elements.
    pub fn len(&self) -> usize {
        match self {
            RData::Null => 0,
            RData::Logical(v) => v.len(),
            RData::Int(v) => v.len(),
            RData::Double(v) => v.len(),
            RData::Complex(v) => v.len(),
            RData::Character(v) => v.len(),
            RData::Raw(v) => v.len(),
            RData::List(v) => v.len(),
            RData::Closure(_) => 1,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The runtime type tag of this value.
    pub fn rtype(&self) -> RType {
        match self {
            RData::Null => RType::Null,
            RData::Logical(_) => RType::Logical,
            RData::Int(_) => RType::Integer,
            RData::Double(_) => RType::Double,
            RData::Complex(_) => RType::Complex,
            RData::Character(_) => RType::Character,
            RData::Raw(_) => RType::Raw,
            RData::List(_) => RType::List,
            RData::Closure(_) => RType::Closure,
        }
    }
}

/// Runtime type tag, independent of the `class` attribute. `typeof` and
/// S3 dispatch are separate axes and must never be conflated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum RType {
    Null,
    Logical,
    Integer,
    Double,
    Complex,
    Character,
    Raw,
    List,
    Closure,
}

impl RType {
    /// The name `typeof()` reports for this tag.
    pub fn name(&self) -> &'static str {
        match self {
            RType::Null => "NULL",
            RType::Logical => "logical",
            RType::Integer => "integer",
            RType::Double => "double",
            RType::Complex => "complex",
            RType::Character => "character",
            RType::Raw => "raw",
            RType::List => "list",
            RType::Closure => "closure",
        }
    }
}
