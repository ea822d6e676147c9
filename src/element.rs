//! Element kinds, scalar values and the promotion order between them.

use std::fmt;
use std::str::FromStr;

use crate::{ArrayError, Result};

/// The element kind of an array.
///
/// The derived ordering is the promotion order: `Logical < Integer < Double`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ElementKind {
    Logical,
    Integer,
    Double,
}

impl ElementKind {
    /// Common kind of two operands.
    #[inline]
    pub fn promote(self, other: ElementKind) -> ElementKind {
        self.max(other)
    }

    /// Kind produced by arithmetic on this kind. Logicals never survive arithmetic.
    #[inline]
    pub fn arithmetic(self) -> ElementKind {
        match self {
            ElementKind::Logical => ElementKind::Integer,
            kind => kind,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ElementKind::Logical => "logical",
            ElementKind::Integer => "integer",
            ElementKind::Double => "double",
        }
    }
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ElementKind {
    type Err = ArrayError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "logical" | "bool" | "boolean" => Ok(ElementKind::Logical),
            "integer" | "int" => Ok(ElementKind::Integer),
            "double" | "numeric" | "float" => Ok(ElementKind::Double),
            other => Err(ArrayError::UnknownType(other.to_string())),
        }
    }
}

/// Types that can be stored in an array.
pub trait Element: Copy + PartialEq + PartialOrd + Default + fmt::Debug + 'static {
    const KIND: ElementKind;

    fn into_scalar(self) -> Scalar;

    /// Widening conversion used for double-valued operations.
    fn to_f64(self) -> f64;

    /// Truth value used when casting to logical.
    fn is_truthy(self) -> bool;
}

impl Element for bool {
    const KIND: ElementKind = ElementKind::Logical;

    fn into_scalar(self) -> Scalar {
        Scalar::Logical(self)
    }

    fn to_f64(self) -> f64 {
        if self {
            1.0
        } else {
            0.0
        }
    }

    fn is_truthy(self) -> bool {
        self
    }
}

impl Element for i32 {
    const KIND: ElementKind = ElementKind::Integer;

    fn into_scalar(self) -> Scalar {
        Scalar::Integer(self)
    }

    fn to_f64(self) -> f64 {
        self as f64
    }

    fn is_truthy(self) -> bool {
        self != 0
    }
}

impl Element for f64 {
    const KIND: ElementKind = ElementKind::Double;

    fn into_scalar(self) -> Scalar {
        Scalar::Double(self)
    }

    fn to_f64(self) -> f64 {
        self
    }

    fn is_truthy(self) -> bool {
        self != 0.0
    }
}

/// Exact double to integer conversion: the value must be integral and in range.
pub(crate) fn double_to_integer(v: f64) -> Option<i32> {
    if v.fract() != 0.0 {
        return None;
    }
    num_traits::cast::<f64, i32>(v)
}

/// Exact numeric to logical conversion: only 0 and 1 are accepted.
pub(crate) fn double_to_logical(v: f64) -> Option<bool> {
    if v == 0.0 {
        Some(false)
    } else if v == 1.0 {
        Some(true)
    } else {
        None
    }
}

/// A single value of any element kind.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Scalar {
    Logical(bool),
    Integer(i32),
    Double(f64),
}

impl Scalar {
    pub fn kind(&self) -> ElementKind {
        match self {
            Scalar::Logical(_) => ElementKind::Logical,
            Scalar::Integer(_) => ElementKind::Integer,
            Scalar::Double(_) => ElementKind::Double,
        }
    }

    /// Convert to `kind` without losing information.
    ///
    /// Widening always succeeds. Narrowing succeeds only when the value is
    /// representable (an integral double, or 0/1 for logical).
    pub fn cast(self, kind: ElementKind) -> Result<Scalar> {
        let mismatch = || ArrayError::TypeMismatch(self.kind(), kind);
        let out = match (self, kind) {
            (s, k) if s.kind() == k => s,
            (Scalar::Logical(b), ElementKind::Integer) => Scalar::Integer(b as i32),
            (Scalar::Logical(b), ElementKind::Double) => Scalar::Double(b.to_f64()),
            (Scalar::Integer(i), ElementKind::Double) => Scalar::Double(i as f64),
            (Scalar::Integer(i), ElementKind::Logical) => {
                Scalar::Logical(double_to_logical(i as f64).ok_or_else(mismatch)?)
            }
            (Scalar::Double(d), ElementKind::Integer) => {
                Scalar::Integer(double_to_integer(d).ok_or_else(mismatch)?)
            }
            (Scalar::Double(d), ElementKind::Logical) => {
                Scalar::Logical(double_to_logical(d).ok_or_else(mismatch)?)
            }
            (s, _) => s,
        };
        Ok(out)
    }
}

/// A borrowed slice of elements of any kind, handed to custom reducers.
#[derive(Debug, Clone, Copy)]
pub enum ElementSlice<'a> {
    Logical(&'a [bool]),
    Integer(&'a [i32]),
    Double(&'a [f64]),
}

impl<'a> ElementSlice<'a> {
    pub fn kind(&self) -> ElementKind {
        match self {
            ElementSlice::Logical(_) => ElementKind::Logical,
            ElementSlice::Integer(_) => ElementKind::Integer,
            ElementSlice::Double(_) => ElementKind::Double,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            ElementSlice::Logical(s) => s.len(),
            ElementSlice::Integer(s) => s.len(),
            ElementSlice::Double(s) => s.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Wraps a typed slice into [`ElementSlice`].
pub(crate) trait AsElementSlice: Element {
    fn as_element_slice(slice: &[Self]) -> ElementSlice<'_>;
}

impl AsElementSlice for bool {
    fn as_element_slice(slice: &[bool]) -> ElementSlice<'_> {
        ElementSlice::Logical(slice)
    }
}

impl AsElementSlice for i32 {
    fn as_element_slice(slice: &[i32]) -> ElementSlice<'_> {
        ElementSlice::Integer(slice)
    }
}

impl AsElementSlice for f64 {
    fn as_element_slice(slice: &[f64]) -> ElementSlice<'_> {
        ElementSlice::Double(slice)
    }
}
