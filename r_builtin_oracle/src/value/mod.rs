//! RValue - the R runtime value model the oracle compares.
//!
//! An `RValue` is a tagged data payload plus an attribute map. Values are
//! constructed from evaluation results and never mutated afterwards: the
//! builder-style `with_*` methods consume and return, and the attribute
//! invariants (`names` length, `dim` product) are enforced at construction
//! so the comparator can rely on them.

mod attributes;
mod data;

pub use attributes::{AttributeError, Attributes};
pub use data::{is_na_real, na_real, Complex, ClosureRef, Logical, RData, RType, NA_REAL_BITS};

/// An R value: data payload plus attributes.
#[derive(Debug, Clone, PartialEq)]
pub struct RValue {
    pub data: RData,
    pub attrs: Attributes,
}

impl RValue {
    pub fn new(data: RData) -> Self {
        Self {
            data,
            attrs: Attributes::new(),
        }
    }

    // ==================== constructors ====================

    pub fn null() -> Self {
        Self::new(RData::Null)
    }

    pub fn logical(v: Vec<Logical>) -> Self {
        Self::new(RData::Logical(v))
    }

    pub fn logical1(v: Option<bool>) -> Self {
        Self::logical(vec![Logical::from_option(v)])
    }

    pub fn int(v: Vec<Option<i32>>) -> Self {
        Self::new(RData::Int(v))
    }

    pub fn int1(v: i32) -> Self {
        Self::int(vec![Some(v)])
    }

    pub fn dbl(v: Vec<f64>) -> Self {
        Self::new(RData::Double(v))
    }

    pub fn dbl1(v: f64) -> Self {
        Self::dbl(vec![v])
    }

    pub fn complex(v: Vec<Complex>) -> Self {
        Self::new(RData::Complex(v))
    }

    pub fn complex1(re: f64, im: f64) -> Self {
        Self::complex(vec![Complex::new(re, im)])
    }

    pub fn character(v: Vec<Option<String>>) -> Self {
        Self::new(RData::Character(v))
    }

    pub fn string(s: impl Into<String>) -> Self {
        Self::character(vec![Some(s.into())])
    }

    /// Character vector from plain strs, no NAs.
    pub fn strings(v: &[&str]) -> Self {
        Self::character(v.iter().map(|s| Some((*s).to_string())).collect())
    }

    pub fn raw(v: Vec<u8>) -> Self {
        Self::new(RData::Raw(v))
    }

    pub fn list(v: Vec<RValue>) -> Self {
        Self::new(RData::List(v))
    }

    pub fn closure(token: u64) -> Self {
        Self::new(RData::Closure(ClosureRef(token)))
    }

    // ==================== accessors ====================

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn rtype(&self) -> RType {
        self.data.rtype()
    }

    pub fn is_null(&self) -> bool {
        matches!(self.data, RData::Null)
    }

    pub fn attr(&self, name: &str) -> Option<&RValue> {
        self.attrs.get(name)
    }

    /// The `dim` attribute as plain usizes, if present.
    pub fn dim(&self) -> Option<Vec<usize>> {
        match &self.attr("dim")?.data {
            RData::Int(entries) => entries
                .iter()
                .map(|e| match e {
                    Some(n) if *n >= 0 => Some(*n as usize),
                    _ => None,
                })
                .collect(),
            _ => None,
        }
    }

    // ==================== attribute construction ====================

    /// Attach an attribute, enforcing the `names`/`dim`/`dimnames`
    /// invariants. A NULL value removes the attribute, as in R.
    pub fn with_attr(
        mut self,
        name: impl Into<String>,
        value: RValue,
    ) -> Result<Self, AttributeError> {
        let name = name.into();
        if value.is_null() {
            self.attrs.remove(&name);
            return Ok(self);
        }
        match name.as_str() {
            "names" => {
                let RData::Character(elems) = &value.data else {
                    return Err(AttributeError::NamesType);
                };
                if elems.len() != self.len() {
                    return Err(AttributeError::NamesLength {
                        expected: self.len(),
                        actual: elems.len(),
                    });
                }
            }
            "dim" => {
                let RData::Int(entries) = &value.data else {
                    return Err(AttributeError::DimType);
                };
                let mut product: usize = 1;
                for entry in entries {
                    match entry {
                        Some(n) if *n >= 0 => product *= *n as usize,
                        _ => return Err(AttributeError::DimEntry),
                    }
                }
                if product != self.len() {
                    return Err(AttributeError::DimProduct {
                        product,
                        len: self.len(),
                    });
                }
            }
            "dimnames" => {
                if !matches!(value.data, RData::List(_)) {
                    return Err(AttributeError::DimnamesType);
                }
            }
            _ => {}
        }
        self.attrs.set(name, value);
        Ok(self)
    }

    /// Attach a `class` attribute. Order is significant: it is the S3
    /// dispatch chain.
    pub fn with_class(mut self, classes: &[&str]) -> Self {
        self.attrs.set("class", RValue::strings(classes));
        self
    }

    /// The dispatch chain: the explicit `class` attribute when present,
    /// otherwise the implicit class derived from the data tag and `dim`.
    pub fn class_vector(&self) -> Vec<String> {
        if let Some(class) = self.attr("class") {
            if let RData::Character(elems) = &class.data {
                return elems
                    .iter()
                    .map(|e| e.clone().unwrap_or_default())
                    .collect();
            }
        }
        self.implicit_class()
    }

    fn implicit_class(&self) -> Vec<String> {
        if let Some(dim) = self.dim() {
            if dim.len() == 2 {
                return vec!["matrix".to_string(), "array".to_string()];
            }
            if !dim.is_empty() {
                return vec!["array".to_string()];
            }
        }
        let name = match self.rtype() {
            RType::Null => "NULL",
            RType::Logical => "logical",
            RType::Integer => "integer",
            RType::Double => "numeric",
            RType::Complex => "complex",
            RType::Character => "character",
            RType::Raw => "raw",
            RType::List => "list",
            RType::Closure => "function",
        };
        vec![name.to_string()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_length_enforced() {
        let err = RValue::int(vec![Some(1), Some(2)])
            .with_attr("names", RValue::strings(&["a"]))
            .unwrap_err();
        assert_eq!(
            err,
            AttributeError::NamesLength {
                expected: 2,
                actual: 1
            }
        );
    }

    #[test]
    fn test_dim_product_enforced() {
        let v = RValue::int(vec![Some(1), Some(2), Some(3)]);
        let err = v
            .clone()
            .with_attr("dim", RValue::int(vec![Some(2), Some(2)]))
            .unwrap_err();
        assert!(matches!(err, AttributeError::DimProduct { .. }));
        let ok = v.with_attr("dim", RValue::int(vec![Some(3), Some(1)]));
        assert!(ok.is_ok());
    }

    #[test]
    fn test_negative_dim_rejected() {
        let err = RValue::int(vec![Some(1)])
            .with_attr("dim", RValue::int(vec![Some(-1)]))
            .unwrap_err();
        assert_eq!(err, AttributeError::DimEntry);
    }

    #[test]
    fn test_null_attr_removes() {
        let v = RValue::int1(1).with_class(&["foo"]);
        let v = v.with_attr("class", RValue::null()).unwrap();
        assert!(v.attr("class").is_none());
    }

    #[test]
    fn test_implicit_class() {
        assert_eq!(RValue::int1(1).class_vector(), vec!["integer"]);
        assert_eq!(RValue::dbl1(1.0).class_vector(), vec!["numeric"]);
        assert_eq!(RValue::complex(vec![]).class_vector(), vec!["complex"]);
        let m = RValue::int(vec![Some(1), Some(2)])
            .with_attr("dim", RValue::int(vec![Some(1), Some(2)]))
            .unwrap();
        assert_eq!(m.class_vector(), vec!["matrix", "array"]);
    }

    #[test]
    fn test_explicit_class_wins() {
        let v = RValue::int1(10).with_class(&["a", "b"]);
        assert_eq!(v.class_vector(), vec!["a", "b"]);
        // The runtime tag is untouched: class and typeof are separate axes.
        assert_eq!(v.rtype(), RType::Integer);
    }
}
