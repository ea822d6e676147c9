//! Dense column-major storage and the kind-tagged [`Array`].

use std::borrow::Cow;

use crate::dim_names::DimNames;
use crate::element::{double_to_integer, double_to_logical, Element, ElementKind, Scalar};
use crate::shape::{element_count, ensure_rank, try_element_count};
use crate::{ArrayError, Result};

// ============================================================================
// NdArray
// ============================================================================

/// Owned dense array in column-major order.
#[derive(Debug, Clone, PartialEq)]
pub struct NdArray<T> {
    data: Vec<T>,
    dims: Vec<usize>,
}

impl<T> NdArray<T> {
    /// Wrap column-major `data` with shape `dims`.
    ///
    /// # Errors
    /// - [`ArrayError::SizeMismatch`] if `data.len()` is not the product of `dims`
    /// - [`ArrayError::ShapeOverflow`] if that product does not fit in `usize`
    pub fn from_vec(data: Vec<T>, dims: &[usize]) -> Result<Self> {
        ensure_rank(dims.len())?;
        let expected = try_element_count(dims)?;
        if data.len() != expected {
            return Err(ArrayError::SizeMismatch(expected, data.len()));
        }
        Ok(Self {
            data,
            dims: dims.to_vec(),
        })
    }

    #[inline]
    pub fn dims(&self) -> &[usize] {
        &self.dims
    }

    #[inline]
    pub fn ndim(&self) -> usize {
        self.dims.len()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    #[inline]
    pub fn data(&self) -> &[T] {
        &self.data
    }

    #[inline]
    pub fn data_mut(&mut self) -> &mut [T] {
        &mut self.data
    }

    pub fn into_vec(self) -> Vec<T> {
        self.data
    }

    /// Same storage under a new shape. Caller guarantees equal element counts.
    pub(crate) fn with_dims(self, dims: Vec<usize>) -> Self {
        debug_assert_eq!(element_count(&dims), self.data.len());
        Self {
            data: self.data,
            dims,
        }
    }

    fn linear_index(&self, indices: &[usize]) -> usize {
        assert_eq!(indices.len(), self.dims.len(), "wrong number of indices");
        let mut idx = 0usize;
        let mut stride = 1usize;
        for (i, (&index, &dim)) in indices.iter().zip(&self.dims).enumerate() {
            assert!(
                index < dim,
                "index {} out of bounds for axis {} of size {}",
                index,
                i,
                dim
            );
            idx += index * stride;
            stride *= dim;
        }
        idx
    }
}

impl<T: Copy> NdArray<T> {
    /// Array of shape `dims` with every element set to `value`.
    pub fn full(dims: &[usize], value: T) -> Result<Self> {
        ensure_rank(dims.len())?;
        Ok(Self {
            data: vec![value; try_element_count(dims)?],
            dims: dims.to_vec(),
        })
    }

    /// Array with values produced by a function of the multi-index.
    ///
    /// The function is called with indices in column-major iteration order.
    pub fn from_fn_col_major(dims: &[usize], mut f: impl FnMut(&[usize]) -> T) -> Result<Self> {
        ensure_rank(dims.len())?;
        let total = try_element_count(dims)?;
        let rank = dims.len();
        let mut data = Vec::with_capacity(total);
        let mut idx = vec![0usize; rank];
        for _ in 0..total {
            data.push(f(&idx));
            for d in 0..rank {
                idx[d] += 1;
                if idx[d] < dims[d] {
                    break;
                }
                idx[d] = 0;
            }
        }
        Ok(Self {
            data,
            dims: dims.to_vec(),
        })
    }

    /// Get an element by multi-dimensional index.
    pub fn get(&self, indices: &[usize]) -> T {
        self.data[self.linear_index(indices)]
    }

    pub fn map<U>(&self, f: impl FnMut(T) -> U) -> NdArray<U> {
        NdArray {
            data: self.data.iter().copied().map(f).collect(),
            dims: self.dims.clone(),
        }
    }

    pub fn try_map<U>(&self, f: impl FnMut(T) -> Result<U>) -> Result<NdArray<U>> {
        Ok(NdArray {
            data: self
                .data
                .iter()
                .copied()
                .map(f)
                .collect::<Result<Vec<U>>>()?,
            dims: self.dims.clone(),
        })
    }
}

// ============================================================================
// ArrayData
// ============================================================================

/// Typed storage tagged by element kind.
#[derive(Debug, Clone, PartialEq)]
pub enum ArrayData {
    Logical(NdArray<bool>),
    Integer(NdArray<i32>),
    Double(NdArray<f64>),
}

/// Run `$body` with `$arr` bound to the typed array inside an [`ArrayData`].
macro_rules! dispatch_array {
    ($data:expr, $arr:ident => $body:expr) => {
        match $data {
            $crate::array::ArrayData::Logical($arr) => $body,
            $crate::array::ArrayData::Integer($arr) => $body,
            $crate::array::ArrayData::Double($arr) => $body,
        }
    };
}
pub(crate) use dispatch_array;

impl ArrayData {
    pub fn kind(&self) -> ElementKind {
        match self {
            ArrayData::Logical(_) => ElementKind::Logical,
            ArrayData::Integer(_) => ElementKind::Integer,
            ArrayData::Double(_) => ElementKind::Double,
        }
    }

    pub fn dims(&self) -> &[usize] {
        dispatch_array!(self, a => a.dims())
    }

    pub fn len(&self) -> usize {
        dispatch_array!(self, a => a.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Element at a multi-index.
    pub fn get(&self, indices: &[usize]) -> Scalar {
        dispatch_array!(self, a => a.get(indices).into_scalar())
    }

    /// Same storage under a new shape. Caller guarantees equal element counts.
    pub(crate) fn with_dims(self, dims: Vec<usize>) -> ArrayData {
        match self {
            ArrayData::Logical(a) => ArrayData::Logical(a.with_dims(dims)),
            ArrayData::Integer(a) => ArrayData::Integer(a.with_dims(dims)),
            ArrayData::Double(a) => ArrayData::Double(a.with_dims(dims)),
        }
    }

    /// Convert to `kind` without losing information.
    ///
    /// Widening (`Logical -> Integer -> Double`) always succeeds. Narrowing
    /// succeeds only if every element is representable in `kind`; otherwise
    /// fails with [`ArrayError::TypeMismatch`]. Borrows when no conversion is needed.
    pub fn cast(&self, kind: ElementKind) -> Result<Cow<'_, ArrayData>> {
        let from = self.kind();
        if from == kind {
            return Ok(Cow::Borrowed(self));
        }
        let mismatch = || ArrayError::TypeMismatch(from, kind);
        let out = match (self, kind) {
            (ArrayData::Logical(a), ElementKind::Integer) => {
                ArrayData::Integer(a.map(|b| b as i32))
            }
            (ArrayData::Logical(a), ElementKind::Double) => {
                ArrayData::Double(a.map(Element::to_f64))
            }
            (ArrayData::Integer(a), ElementKind::Double) => {
                ArrayData::Double(a.map(Element::to_f64))
            }
            (ArrayData::Integer(a), ElementKind::Logical) => ArrayData::Logical(
                a.try_map(|i| double_to_logical(i as f64).ok_or_else(mismatch))?,
            ),
            (ArrayData::Double(a), ElementKind::Integer) => {
                ArrayData::Integer(a.try_map(|d| double_to_integer(d).ok_or_else(mismatch))?)
            }
            (ArrayData::Double(a), ElementKind::Logical) => {
                ArrayData::Logical(a.try_map(|d| double_to_logical(d).ok_or_else(mismatch))?)
            }
            (data, _) => data.clone(),
        };
        Ok(Cow::Owned(out))
    }

    /// Truth value of every element (non-zero is true, NaN is true).
    pub(crate) fn to_logical(&self) -> Cow<'_, NdArray<bool>> {
        match self {
            ArrayData::Logical(a) => Cow::Borrowed(a),
            ArrayData::Integer(a) => Cow::Owned(a.map(Element::is_truthy)),
            ArrayData::Double(a) => Cow::Owned(a.map(Element::is_truthy)),
        }
    }

    /// Assemble an array of `kind` from scalars already cast to that kind.
    pub(crate) fn from_scalars(
        kind: ElementKind,
        dims: &[usize],
        values: Vec<Scalar>,
    ) -> Result<ArrayData> {
        fn collect<T>(
            values: Vec<Scalar>,
            kind: ElementKind,
            pick: impl Fn(Scalar) -> Option<T>,
        ) -> Result<Vec<T>> {
            values
                .into_iter()
                .map(|s| pick(s).ok_or(ArrayError::TypeMismatch(s.kind(), kind)))
                .collect()
        }
        let data = match kind {
            ElementKind::Logical => ArrayData::Logical(NdArray::from_vec(
                collect(values, kind, |s| match s {
                    Scalar::Logical(b) => Some(b),
                    _ => None,
                })?,
                dims,
            )?),
            ElementKind::Integer => ArrayData::Integer(NdArray::from_vec(
                collect(values, kind, |s| match s {
                    Scalar::Integer(i) => Some(i),
                    _ => None,
                })?,
                dims,
            )?),
            ElementKind::Double => ArrayData::Double(NdArray::from_vec(
                collect(values, kind, |s| match s {
                    Scalar::Double(d) => Some(d),
                    _ => None,
                })?,
                dims,
            )?),
        };
        Ok(data)
    }
}

/// Element types with a slot in [`ArrayData`].
pub(crate) trait Stored: Element {
    fn unwrap_data(data: &ArrayData) -> Option<&NdArray<Self>>;
    fn wrap(array: NdArray<Self>) -> ArrayData;
}

macro_rules! impl_stored {
    ($t:ty, $variant:ident) => {
        impl Stored for $t {
            #[inline]
            fn unwrap_data(data: &ArrayData) -> Option<&NdArray<$t>> {
                match data {
                    ArrayData::$variant(a) => Some(a),
                    _ => None,
                }
            }

            #[inline]
            fn wrap(array: NdArray<$t>) -> ArrayData {
                ArrayData::$variant(array)
            }
        }
    };
}

impl_stored!(bool, Logical);
impl_stored!(i32, Integer);
impl_stored!(f64, Double);

/// The typed array inside `data`, which must already hold `T`.
pub(crate) fn typed<T: Stored>(data: &ArrayData) -> Result<&NdArray<T>> {
    T::unwrap_data(data).ok_or(ArrayError::TypeMismatch(data.kind(), T::KIND))
}

impl From<NdArray<bool>> for ArrayData {
    fn from(a: NdArray<bool>) -> Self {
        ArrayData::Logical(a)
    }
}

impl From<NdArray<i32>> for ArrayData {
    fn from(a: NdArray<i32>) -> Self {
        ArrayData::Integer(a)
    }
}

impl From<NdArray<f64>> for ArrayData {
    fn from(a: NdArray<f64>) -> Self {
        ArrayData::Double(a)
    }
}

// ============================================================================
// Array
// ============================================================================

/// An array of any element kind with its dimension names.
#[derive(Debug, Clone, PartialEq)]
pub struct Array {
    data: ArrayData,
    dim_names: DimNames,
}

impl Array {
    /// Array without dimension names.
    pub fn new(data: impl Into<ArrayData>) -> Self {
        let data = data.into();
        let dim_names = DimNames::empty(data.dims().len());
        Self { data, dim_names }
    }

    /// Array from column-major data and a shape.
    pub fn from_vec<T>(data: Vec<T>, dims: &[usize]) -> Result<Self>
    where
        NdArray<T>: Into<ArrayData>,
    {
        Ok(Self::new(NdArray::from_vec(data, dims)?))
    }

    /// Attach dimension names.
    ///
    /// # Errors
    /// [`ArrayError::SizeMismatch`] if the names do not match the shape.
    pub fn with_dim_names(mut self, dim_names: DimNames) -> Result<Self> {
        dim_names.validate(self.dims())?;
        self.dim_names = dim_names;
        Ok(self)
    }

    pub(crate) fn from_parts(data: ArrayData, dim_names: DimNames) -> Self {
        debug_assert_eq!(data.dims().len(), dim_names.rank());
        Self { data, dim_names }
    }

    #[inline]
    pub fn data(&self) -> &ArrayData {
        &self.data
    }

    pub fn into_data(self) -> ArrayData {
        self.data
    }

    #[inline]
    pub fn dim_names(&self) -> &DimNames {
        &self.dim_names
    }

    #[inline]
    pub fn kind(&self) -> ElementKind {
        self.data.kind()
    }

    #[inline]
    pub fn dims(&self) -> &[usize] {
        self.data.dims()
    }

    #[inline]
    pub fn ndim(&self) -> usize {
        self.dims().len()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn get(&self, indices: &[usize]) -> Scalar {
        self.data.get(indices)
    }

    pub fn as_logical(&self) -> Option<&[bool]> {
        match &self.data {
            ArrayData::Logical(a) => Some(a.data()),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<&[i32]> {
        match &self.data {
            ArrayData::Integer(a) => Some(a.data()),
            _ => None,
        }
    }

    pub fn as_double(&self) -> Option<&[f64]> {
        match &self.data {
            ArrayData::Double(a) => Some(a.data()),
            _ => None,
        }
    }
}

impl<T> From<NdArray<T>> for Array
where
    NdArray<T>: Into<ArrayData>,
{
    fn from(a: NdArray<T>) -> Self {
        Array::new(a)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_vec_size_mismatch() {
        let err = NdArray::from_vec(vec![1.0, 2.0, 3.0], &[2, 2]).unwrap_err();
        assert!(matches!(err, ArrayError::SizeMismatch(4, 3)));
    }

    #[test]
    fn test_constructors_reject_overflowing_shapes() {
        assert!(matches!(
            NdArray::full(&[usize::MAX, 2], 1.0),
            Err(ArrayError::ShapeOverflow(_))
        ));
        assert!(matches!(
            NdArray::<i32>::from_vec(vec![], &[1 << 63, 2]),
            Err(ArrayError::ShapeOverflow(_))
        ));
        let empty = NdArray::<f64>::from_vec(vec![], &[usize::MAX, 2, 0]).unwrap();
        assert!(empty.is_empty());
        assert_eq!(empty.dims(), &[usize::MAX, 2, 0]);
    }

    #[test]
    fn test_col_major_get() {
        let a = NdArray::from_vec(vec![1, 2, 3, 4, 5, 6], &[2, 3]).unwrap();
        assert_eq!(a.get(&[0, 0]), 1);
        assert_eq!(a.get(&[1, 0]), 2);
        assert_eq!(a.get(&[0, 1]), 3);
        assert_eq!(a.get(&[1, 2]), 6);
    }

    #[test]
    fn test_from_fn_col_major() {
        let a = NdArray::from_fn_col_major(&[2, 3], |idx| (idx[0] * 10 + idx[1]) as i32).unwrap();
        assert_eq!(a.data(), &[0, 10, 1, 11, 2, 12]);
    }

    #[test]
    fn test_rank_zero_holds_one_element() {
        let a = NdArray::full(&[], 4.5).unwrap();
        assert_eq!(a.len(), 1);
        assert_eq!(a.get(&[]), 4.5);
    }

    #[test]
    fn test_rank_too_large() {
        let dims = vec![1usize; crate::MAX_RANK + 1];
        assert!(matches!(
            NdArray::full(&dims, 0i32),
            Err(ArrayError::RankTooLarge(_))
        ));
    }

    #[test]
    fn test_cast_widening_borrows_same_kind() {
        let data = ArrayData::Logical(NdArray::from_vec(vec![true, false], &[2]).unwrap());
        assert!(matches!(data.cast(ElementKind::Logical).unwrap(), Cow::Borrowed(_)));
        let ints = data.cast(ElementKind::Integer).unwrap();
        let expected = ArrayData::Integer(NdArray::from_vec(vec![1, 0], &[2]).unwrap());
        assert_eq!(ints.as_ref(), &expected);
    }

    #[test]
    fn test_cast_narrowing_exact() {
        let data = ArrayData::Double(NdArray::from_vec(vec![1.0, 2.0], &[2]).unwrap());
        let ints = data.cast(ElementKind::Integer).unwrap();
        assert_eq!(ints.kind(), ElementKind::Integer);

        let lossy = ArrayData::Double(NdArray::from_vec(vec![1.5], &[1]).unwrap());
        assert!(matches!(
            lossy.cast(ElementKind::Integer),
            Err(ArrayError::TypeMismatch(ElementKind::Double, ElementKind::Integer))
        ));
    }

    #[test]
    fn test_typed_checks_kind() {
        let data = ArrayData::Integer(NdArray::from_vec(vec![1, 2], &[2]).unwrap());
        assert_eq!(typed::<i32>(&data).unwrap().data(), &[1, 2]);
        assert!(matches!(
            typed::<f64>(&data),
            Err(ArrayError::TypeMismatch(ElementKind::Integer, ElementKind::Double))
        ));
    }

    #[test]
    fn test_with_dim_names_validates() {
        let a = Array::from_vec(vec![1.0, 2.0, 3.0], &[3]).unwrap();
        let names = DimNames::new(vec![Some(vec!["a".into(), "b".into()])], None).unwrap();
        assert!(matches!(
            a.with_dim_names(names),
            Err(ArrayError::SizeMismatch(3, 2))
        ));
    }
}
