//! Shape algebra: broadcasting, rank padding and broadcastability checks.
//!
//! Shapes are aligned from the first axis. When ranks differ, the shorter
//! shape gains size-1 axes after its last axis. Under column-major storage
//! those extra axes are the slowest-varying ones, so padding never moves data.

use crate::{ArrayError, Result, MAX_RANK};

/// Total number of elements of a shape already known to be addressable.
///
/// The empty shape holds one element. Use [`try_element_count`] for shapes
/// coming from callers.
#[inline]
pub fn element_count(dims: &[usize]) -> usize {
    if dims.contains(&0) {
        return 0;
    }
    dims.iter().product()
}

/// Total number of elements of `dims`, checked against `usize` overflow.
///
/// Any axis of size 0 makes the count 0, whatever the other axes hold.
///
/// # Errors
/// [`ArrayError::ShapeOverflow`] if the product does not fit in `usize`.
pub fn try_element_count(dims: &[usize]) -> Result<usize> {
    if dims.contains(&0) {
        return Ok(0);
    }
    dims.iter()
        .try_fold(1usize, |acc, &d| acc.checked_mul(d))
        .ok_or_else(|| ArrayError::ShapeOverflow(dims.to_vec()))
}

/// Compute column-major strides (first index varies fastest).
pub fn col_major_strides(dims: &[usize]) -> Vec<isize> {
    let rank = dims.len();
    if rank == 0 {
        return vec![];
    }
    let mut strides = vec![1isize; rank];
    for i in 1..rank {
        strides[i] = strides[i - 1] * dims[i - 1] as isize;
    }
    strides
}

pub(crate) fn ensure_rank(rank: usize) -> Result<()> {
    if rank > MAX_RANK {
        return Err(ArrayError::RankTooLarge(rank));
    }
    Ok(())
}

/// Compute the common broadcast shape of two shapes.
///
/// Per axis:
/// - equal sizes are kept
/// - a size of 1 takes the other side's size
/// - a size of 0 makes the axis empty
///
/// Any other combination fails with [`ArrayError::IncompatibleShape`].
pub fn broadcast_shape(a: &[usize], b: &[usize]) -> Result<Vec<usize>> {
    let rank = a.len().max(b.len());
    let mut out = Vec::with_capacity(rank);
    for i in 0..rank {
        let a_dim = a.get(i).copied().unwrap_or(1);
        let b_dim = b.get(i).copied().unwrap_or(1);
        let dim = if a_dim == b_dim {
            a_dim
        } else if a_dim == 1 {
            b_dim
        } else if b_dim == 1 {
            a_dim
        } else if a_dim == 0 || b_dim == 0 {
            0
        } else {
            return Err(ArrayError::IncompatibleShape(a.to_vec(), b.to_vec()));
        };
        out.push(dim);
    }
    Ok(out)
}

/// Compute a common broadcast shape across any number of shapes.
pub fn broadcast_shapes(dims_list: &[&[usize]]) -> Result<Vec<usize>> {
    let mut out: Vec<usize> = Vec::new();
    for dims in dims_list {
        out = broadcast_shape(&out, dims)?;
    }
    Ok(out)
}

/// Pad `dims` with trailing size-1 axes up to `target_rank`.
///
/// Never truncates; use [`shrink_rank`] for that.
pub fn pad_rank(dims: &[usize], target_rank: usize) -> Result<Vec<usize>> {
    if target_rank < dims.len() {
        return Err(ArrayError::RankMismatch(dims.len(), target_rank));
    }
    let mut out = dims.to_vec();
    out.resize(target_rank, 1);
    Ok(out)
}

/// Drop trailing axes down to `target_rank`. Every dropped axis must have size 1.
pub fn shrink_rank(dims: &[usize], target_rank: usize) -> Result<Vec<usize>> {
    if target_rank > dims.len() {
        return Err(ArrayError::RankMismatch(dims.len(), target_rank));
    }
    if dims[target_rank..].iter().any(|&d| d != 1) {
        return Err(ArrayError::RankMismatch(dims.len(), target_rank));
    }
    Ok(dims[..target_rank].to_vec())
}

/// Check that a value of shape `source` can be written into a region of shape `target`.
///
/// Per axis the sizes must be equal, or `source` must be 1, or `target` must be 0.
/// Writing through a view whose source shape fails this check would read past
/// the source, so every write path runs it first.
pub fn validate_broadcastable(source: &[usize], target: &[usize]) -> Result<()> {
    if source.len() != target.len() {
        return Err(ArrayError::NonBroadcastable(source.to_vec(), target.to_vec()));
    }
    let ok = source
        .iter()
        .zip(target.iter())
        .all(|(&s, &t)| s == t || s == 1 || t == 0);
    if !ok {
        return Err(ArrayError::NonBroadcastable(source.to_vec(), target.to_vec()));
    }
    Ok(())
}
