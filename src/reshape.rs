//! Shape changes that keep the column-major data order.

use log::debug;

use crate::array::Array;
use crate::dim_names::reshape_names;
use crate::shape::{ensure_rank, try_element_count};
use crate::{ArrayError, Result};

/// Reinterpret `x` with shape `new_dims`.
///
/// The data is not moved: element `k` in column-major order stays element `k`.
/// Labels survive only on axes whose size is unchanged.
///
/// # Errors
/// - [`ArrayError::SizeMismatch`] if the element count would change
/// - [`ArrayError::ShapeOverflow`] if `new_dims` has no representable element count
pub fn reshape(x: &Array, new_dims: &[usize]) -> Result<Array> {
    ensure_rank(new_dims.len())?;
    let expected = try_element_count(new_dims)?;
    if expected != x.len() {
        return Err(ArrayError::SizeMismatch(x.len(), expected));
    }
    debug!("reshape {:?} -> {:?}", x.dims(), new_dims);
    let names = reshape_names(x.dim_names(), new_dims);
    let data = x.data().clone().with_dims(new_dims.to_vec());
    Ok(Array::from_parts(data, names))
}

/// Drop size-1 axes.
///
/// With `axes = None` every size-1 axis is dropped; otherwise exactly the
/// listed axes are, and each must have size 1.
///
/// # Errors
/// - [`ArrayError::InvalidAxis`] for an axis outside the rank
/// - [`ArrayError::NonUnitAxis`] if a listed axis is not size 1
pub fn squeeze(x: &Array, axes: Option<&[usize]>) -> Result<Array> {
    let dims = x.dims();
    let rank = dims.len();
    let mut drop: Vec<usize> = match axes {
        None => (0..rank).filter(|&i| dims[i] == 1).collect(),
        Some(axes) => {
            for &axis in axes {
                if axis >= rank {
                    return Err(ArrayError::InvalidAxis { axis, rank });
                }
                if dims[axis] != 1 {
                    return Err(ArrayError::NonUnitAxis {
                        axis,
                        size: dims[axis],
                    });
                }
            }
            axes.to_vec()
        }
    };
    drop.sort_unstable();
    drop.dedup();

    let new_dims: Vec<usize> = (0..rank)
        .filter(|i| drop.binary_search(i).is_err())
        .map(|i| dims[i])
        .collect();
    let names = x.dim_names().remove_axes(&drop);
    let data = x.data().clone().with_dims(new_dims);
    Ok(Array::from_parts(data, names))
}

/// Insert a size-1 axis at position `axis` (`0..=rank`).
///
/// # Errors
/// [`ArrayError::InvalidAxis`] if `axis > rank`.
pub fn expand_dims(x: &Array, axis: usize) -> Result<Array> {
    let rank = x.ndim();
    if axis > rank {
        return Err(ArrayError::InvalidAxis { axis, rank });
    }
    ensure_rank(rank + 1)?;
    let mut new_dims = x.dims().to_vec();
    new_dims.insert(axis, 1);
    let names = x.dim_names().insert_axis(axis);
    let data = x.data().clone().with_dims(new_dims);
    Ok(Array::from_parts(data, names))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::construct::ones;
    use crate::dim_names::DimNames;
    use crate::element::Scalar;

    fn labelled() -> Array {
        let names = DimNames::new(
            vec![
                Some(vec!["a".into(), "b".into(), "c".into()]),
                Some(vec!["x".into(), "y".into()]),
            ],
            Some(vec!["rows".into(), "cols".into()]),
        )
        .unwrap();
        Array::from_vec(vec![1, 2, 3, 4, 5, 6], &[3, 2])
            .unwrap()
            .with_dim_names(names)
            .unwrap()
    }

    #[test]
    fn test_reshape_identity() {
        let x = labelled();
        assert_eq!(reshape(&x, x.dims()).unwrap(), x);
    }

    #[test]
    fn test_reshape_keeps_order() {
        let out = reshape(&labelled(), &[2, 3]).unwrap();
        assert_eq!(out.as_integer().unwrap(), &[1, 2, 3, 4, 5, 6]);
        assert_eq!(out.get(&[1, 1]), Scalar::Integer(4));
        assert!(out.dim_names().axis(0).is_none());
        assert_eq!(out.dim_names().meta_name(1), Some("cols"));
    }

    #[test]
    fn test_reshape_size_mismatch() {
        assert!(matches!(
            reshape(&labelled(), &[4]),
            Err(ArrayError::SizeMismatch(6, 4))
        ));
    }

    #[test]
    fn test_reshape_empty_with_huge_axis() {
        let empty = Array::from_vec(Vec::<f64>::new(), &[0]).unwrap();
        let out = reshape(&empty, &[usize::MAX, 2, 0]).unwrap();
        assert_eq!(out.dims(), &[usize::MAX, 2, 0]);
        assert!(out.is_empty());
    }

    #[test]
    fn test_reshape_overflowing_shape() {
        assert!(matches!(
            reshape(&labelled(), &[usize::MAX, 2]),
            Err(ArrayError::ShapeOverflow(_))
        ));
    }

    #[test]
    fn test_squeeze_all_unit_axes() {
        let x = ones(&[1, 3, 1, 2]).unwrap();
        let out = squeeze(&x, None).unwrap();
        assert_eq!(out.dims(), &[3, 2]);
        assert_eq!(out.dim_names().rank(), 2);
    }

    #[test]
    fn test_squeeze_listed_axes() {
        let x = ones(&[1, 3, 1]).unwrap();
        assert_eq!(squeeze(&x, Some(&[2][..])).unwrap().dims(), &[1, 3]);
        assert!(matches!(
            squeeze(&x, Some(&[1][..])),
            Err(ArrayError::NonUnitAxis { axis: 1, size: 3 })
        ));
        assert!(matches!(
            squeeze(&x, Some(&[3][..])),
            Err(ArrayError::InvalidAxis { axis: 3, rank: 3 })
        ));
    }

    #[test]
    fn test_expand_dims() {
        let x = labelled();
        let out = expand_dims(&x, 1).unwrap();
        assert_eq!(out.dims(), &[3, 1, 2]);
        assert_eq!(out.dim_names().axis(2).unwrap()[1], "y");
        assert_eq!(out.dim_names().meta_name(1), Some(""));

        let last = expand_dims(&x, 2).unwrap();
        assert_eq!(last.dims(), &[3, 2, 1]);
        assert!(matches!(
            expand_dims(&x, 3),
            Err(ArrayError::InvalidAxis { axis: 3, rank: 2 })
        ));
    }

    #[test]
    fn test_expand_then_squeeze_round_trips() {
        let x = labelled();
        let out = squeeze(&expand_dims(&x, 0).unwrap(), Some(&[0][..])).unwrap();
        assert_eq!(out, x);
    }
}
