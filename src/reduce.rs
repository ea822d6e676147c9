//! Axis reductions.
//!
//! Reduced axes are kept with size 1, so the result has the rank of the input
//! and broadcasts back against it. Each output element is produced from one
//! slice gathered in column-major order over the reduced axes.

use std::fmt;
use std::str::FromStr;

use log::debug;

use crate::array::{dispatch_array, typed, Array, ArrayData, NdArray, Stored};
use crate::dim_names::reshape_names;
use crate::element::{AsElementSlice, ElementKind, ElementSlice, Scalar};
use crate::kernel::for_each_index;
use crate::ops::{nan_max, nan_min, narrow, op_registry};
use crate::shape::{col_major_strides, element_count};
use crate::{ArrayError, Result};

op_registry! {
    /// Built-in reductions.
    pub enum ReducerOp {
        Sum => "sum",
        Prod => "prod",
        Mean => "mean",
        Max => "max",
        Min => "min",
        Any => "any",
        All => "all",
    }
}

/// Mark the reduced axes. `None` reduces every axis.
fn resolve_axes(axes: Option<&[usize]>, rank: usize) -> Result<Vec<bool>> {
    match axes {
        None => Ok(vec![true; rank]),
        Some(axes) => {
            let mut reduced = vec![false; rank];
            for &axis in axes {
                if axis >= rank {
                    return Err(ArrayError::InvalidAxis { axis, rank });
                }
                reduced[axis] = true;
            }
            Ok(reduced)
        }
    }
}

/// Apply `f` to every slice along the reduced axes.
fn reduce_slices<T, U, F>(array: &NdArray<T>, reduced: &[bool], mut f: F) -> Result<NdArray<U>>
where
    T: Copy,
    F: FnMut(&[T]) -> Result<U>,
{
    let dims = array.dims();
    let strides = col_major_strides(dims);
    let out_dims: Vec<usize> = dims
        .iter()
        .zip(reduced)
        .map(|(&d, &r)| if r { 1 } else { d })
        .collect();
    let (inner_dims, inner_strides): (Vec<usize>, Vec<isize>) = dims
        .iter()
        .zip(&strides)
        .zip(reduced)
        .filter(|&(_, &r)| r)
        .map(|((&d, &s), _)| (d, s))
        .unzip();

    let data = array.data();
    let mut slice = Vec::with_capacity(element_count(&inner_dims));
    let mut out = Vec::with_capacity(element_count(&out_dims));
    for_each_index(&out_dims, |idx| {
        let base: isize = idx.iter().zip(&strides).map(|(&i, &s)| i as isize * s).sum();
        slice.clear();
        for_each_index(&inner_dims, |inner| {
            let offset: isize = inner
                .iter()
                .zip(&inner_strides)
                .map(|(&i, &s)| i as isize * s)
                .sum();
            slice.push(data[(base + offset) as usize]);
            Ok(())
        })?;
        out.push(f(&slice)?);
        Ok(())
    })?;
    NdArray::from_vec(out, &out_dims)
}

fn extremum_int(op: ReducerOp, slice: &[i32]) -> Result<i32> {
    let found = match op {
        ReducerOp::Max => slice.iter().copied().max(),
        _ => slice.iter().copied().min(),
    };
    found.ok_or(ArrayError::EmptyReduction { op: op.name() })
}

fn extremum_double(op: ReducerOp, slice: &[f64]) -> f64 {
    match op {
        ReducerOp::Max => slice.iter().copied().fold(f64::NEG_INFINITY, nan_max),
        _ => slice.iter().copied().fold(f64::INFINITY, nan_min),
    }
}

/// Reduce `x` along `axes` with a built-in reduction.
///
/// Result kinds:
/// - `sum`: integer for logical/integer input, double otherwise
/// - `prod`, `mean`: double
/// - `max`, `min`: the input kind, logical promoted to integer
/// - `any`, `all`: logical
///
/// # Errors
/// - [`ArrayError::InvalidAxis`] for an axis outside the rank
/// - [`ArrayError::IntegerOverflow`] if an integer sum leaves `i32`
/// - [`ArrayError::EmptyReduction`] for `max`/`min` of an empty integer slice
pub fn reducer(op: ReducerOp, x: &Array, axes: Option<&[usize]>) -> Result<Array> {
    let reduced = resolve_axes(axes, x.ndim())?;
    debug!(
        "reducer {}: {} {:?} over {:?}",
        op,
        x.kind(),
        x.dims(),
        axes
    );
    let data = match op {
        ReducerOp::Sum | ReducerOp::Max | ReducerOp::Min => match x.data() {
            ArrayData::Double(a) => ArrayData::Double(reduce_slices(a, &reduced, |s| {
                Ok(match op {
                    ReducerOp::Sum => s.iter().sum(),
                    _ => extremum_double(op, s),
                })
            })?),
            other => {
                let ints = other.cast(ElementKind::Integer)?;
                ArrayData::Integer(reduce_slices(typed::<i32>(&ints)?, &reduced, |s| match op {
                    ReducerOp::Sum => narrow(s.iter().map(|&v| v as i64).sum()),
                    _ => extremum_int(op, s),
                })?)
            }
        },
        ReducerOp::Prod | ReducerOp::Mean => {
            let doubles = x.data().cast(ElementKind::Double)?;
            ArrayData::Double(reduce_slices(typed::<f64>(&doubles)?, &reduced, |s| {
                Ok(match op {
                    ReducerOp::Prod => s.iter().product(),
                    _ => s.iter().sum::<f64>() / s.len() as f64,
                })
            })?)
        }
        ReducerOp::Any | ReducerOp::All => {
            let truth = x.data().to_logical();
            ArrayData::Logical(reduce_slices(truth.as_ref(), &reduced, |s| {
                Ok(match op {
                    ReducerOp::Any => s.iter().any(|&b| b),
                    _ => s.iter().all(|&b| b),
                })
            })?)
        }
    };
    let names = reshape_names(x.dim_names(), data.dims());
    Ok(Array::from_parts(data, names))
}

fn custom_slices<T, F>(
    array: &NdArray<T>,
    reduced: &[bool],
    f: &mut F,
    result_type: ElementKind,
) -> Result<NdArray<Scalar>>
where
    T: Stored + AsElementSlice,
    F: FnMut(ElementSlice<'_>) -> Scalar,
{
    reduce_slices(array, reduced, |s| f(T::as_element_slice(s)).cast(result_type))
}

/// Reduce `x` along `axes` with a caller-supplied function.
///
/// `f` receives each slice along the reduced axes in column-major order and
/// returns one scalar, which is cast to `result_type`. The order in which
/// slices are visited is unspecified.
///
/// # Errors
/// [`ArrayError::TypeMismatch`] if a returned scalar cannot be represented
/// in `result_type`.
pub fn custom_reducer<F>(
    x: &Array,
    mut f: F,
    axes: Option<&[usize]>,
    result_type: ElementKind,
) -> Result<Array>
where
    F: FnMut(ElementSlice<'_>) -> Scalar,
{
    let reduced = resolve_axes(axes, x.ndim())?;
    debug!(
        "custom_reducer: {} {:?} over {:?} -> {}",
        x.kind(),
        x.dims(),
        axes,
        result_type
    );
    let scalars = dispatch_array!(x.data(), a => custom_slices(a, &reduced, &mut f, result_type))?;
    let dims = scalars.dims().to_vec();
    let data = ArrayData::from_scalars(result_type, &dims, scalars.into_vec())?;
    let names = reshape_names(x.dim_names(), &dims);
    Ok(Array::from_parts(data, names))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dim_names::DimNames;
    use approx::assert_relative_eq;

    fn matrix() -> Array {
        // [[1, 3, 5], [2, 4, 6]]
        Array::from_vec(vec![1, 2, 3, 4, 5, 6], &[2, 3]).unwrap()
    }

    #[test]
    fn test_sum_over_axis_keeps_rank() {
        let rows = reducer(ReducerOp::Sum, &matrix(), Some(&[1][..])).unwrap();
        assert_eq!(rows.dims(), &[2, 1]);
        assert_eq!(rows.as_integer().unwrap(), &[9, 12]);

        let cols = reducer(ReducerOp::Sum, &matrix(), Some(&[0][..])).unwrap();
        assert_eq!(cols.dims(), &[1, 3]);
        assert_eq!(cols.as_integer().unwrap(), &[3, 7, 11]);
    }

    #[test]
    fn test_reduce_all_axes() {
        let total = reducer(ReducerOp::Sum, &matrix(), None).unwrap();
        assert_eq!(total.dims(), &[1, 1]);
        assert_eq!(total.as_integer().unwrap(), &[21]);

        let mean = reducer(ReducerOp::Mean, &matrix(), None).unwrap();
        assert_relative_eq!(mean.as_double().unwrap()[0], 3.5);
    }

    #[test]
    fn test_sum_logical_counts() {
        let x = Array::from_vec(vec![true, false, true], &[3]).unwrap();
        let out = reducer(ReducerOp::Sum, &x, None).unwrap();
        assert_eq!(out.kind(), ElementKind::Integer);
        assert_eq!(out.as_integer().unwrap(), &[2]);
    }

    #[test]
    fn test_sum_overflow() {
        let x = Array::from_vec(vec![i32::MAX, 1], &[2]).unwrap();
        assert!(matches!(
            reducer(ReducerOp::Sum, &x, None),
            Err(ArrayError::IntegerOverflow)
        ));
    }

    #[test]
    fn test_max_min_empty() {
        let ints = Array::from_vec(Vec::<i32>::new(), &[0, 2]).unwrap();
        assert!(matches!(
            reducer(ReducerOp::Max, &ints, Some(&[0][..])),
            Err(ArrayError::EmptyReduction { op: "max" })
        ));
        let doubles = Array::from_vec(Vec::<f64>::new(), &[0, 2]).unwrap();
        let out = reducer(ReducerOp::Min, &doubles, Some(&[0][..])).unwrap();
        assert_eq!(out.as_double().unwrap(), &[f64::INFINITY, f64::INFINITY]);
    }

    #[test]
    fn test_reduce_empty_integer() {
        let ints = Array::from_vec(Vec::<i32>::new(), &[0, 2]).unwrap();
        let sums = reducer(ReducerOp::Sum, &ints, Some(&[0][..])).unwrap();
        assert_eq!(sums.kind(), ElementKind::Integer);
        assert_eq!(sums.dims(), &[1, 2]);
        assert_eq!(sums.as_integer().unwrap(), &[0, 0]);

        let kept = reducer(ReducerOp::Sum, &ints, Some(&[1][..])).unwrap();
        assert_eq!(kept.dims(), &[0, 1]);
        assert!(kept.is_empty());

        let all = reducer(ReducerOp::All, &ints, Some(&[0][..])).unwrap();
        assert_eq!(all.as_logical().unwrap(), &[true, true]);
        let total = reducer(ReducerOp::Sum, &ints, None).unwrap();
        assert_eq!(total.as_integer().unwrap(), &[0]);
    }

    #[test]
    fn test_prod_any_all() {
        let prod = reducer(ReducerOp::Prod, &matrix(), Some(&[0][..])).unwrap();
        assert_eq!(prod.as_double().unwrap(), &[2.0, 12.0, 30.0]);

        let x = Array::from_vec(vec![0.0, 1.0, 0.0, 0.0], &[2, 2]).unwrap();
        let any = reducer(ReducerOp::Any, &x, Some(&[0][..])).unwrap();
        assert_eq!(any.as_logical().unwrap(), &[true, false]);
        let all = reducer(ReducerOp::All, &x, None).unwrap();
        assert_eq!(all.as_logical().unwrap(), &[false]);
    }

    #[test]
    fn test_invalid_axis() {
        assert!(matches!(
            reducer(ReducerOp::Sum, &matrix(), Some(&[2][..])),
            Err(ArrayError::InvalidAxis { axis: 2, rank: 2 })
        ));
    }

    #[test]
    fn test_reduced_axis_drops_labels() {
        let names = DimNames::new(
            vec![
                Some(vec!["a".into(), "b".into()]),
                Some(vec!["x".into(), "y".into(), "z".into()]),
            ],
            Some(vec!["rows".into(), "cols".into()]),
        )
        .unwrap();
        let x = matrix().with_dim_names(names).unwrap();
        let out = reducer(ReducerOp::Max, &x, Some(&[1][..])).unwrap();
        assert_eq!(out.as_integer().unwrap(), &[5, 6]);
        assert!(out.dim_names().axis(0).is_some());
        assert!(out.dim_names().axis(1).is_none());
        assert_eq!(out.dim_names().meta_name(1), Some("cols"));
    }

    #[test]
    fn test_custom_reducer_sees_slices() {
        let out = custom_reducer(
            &matrix(),
            |slice| match slice {
                ElementSlice::Integer(s) => Scalar::Integer(s[s.len() - 1] - s[0]),
                _ => Scalar::Integer(-1),
            },
            Some(&[1][..]),
            ElementKind::Double,
        )
        .unwrap();
        assert_eq!(out.kind(), ElementKind::Double);
        assert_eq!(out.dims(), &[2, 1]);
        assert_eq!(out.as_double().unwrap(), &[4.0, 4.0]);
    }

    #[test]
    fn test_custom_reducer_lossy_result() {
        let x = Array::from_vec(vec![1.0, 2.0], &[2]).unwrap();
        let err = custom_reducer(
            &x,
            |slice| Scalar::Double(slice.len() as f64 / 4.0),
            None,
            "integer".parse().unwrap(),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            ArrayError::TypeMismatch(ElementKind::Double, ElementKind::Integer)
        ));
    }

    #[test]
    fn test_reducer_from_name() {
        assert_eq!("mean".parse::<ReducerOp>().unwrap(), ReducerOp::Mean);
        assert!(matches!(
            "median".parse::<ReducerOp>(),
            Err(ArrayError::UnknownOperation(_))
        ));
    }
}
