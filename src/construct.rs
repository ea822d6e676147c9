//! Array constructors.

use crate::array::{Array, NdArray};
use crate::{ArrayError, Result};

/// Double array of shape `dims` filled with 1.
pub fn ones(dims: &[usize]) -> Result<Array> {
    Ok(Array::new(NdArray::full(dims, 1.0)?))
}

/// Double array of shape `dims` filled with 0.
pub fn zeros(dims: &[usize]) -> Result<Array> {
    Ok(Array::new(NdArray::full(dims, 0.0)?))
}

/// Double array with ones on the `k`-th diagonal of the first two axes.
///
/// An element is 1 where `index[1] - index[0] == k`, so `k > 0` selects a
/// superdiagonal and `k < 0` a subdiagonal. Further axes repeat the pattern.
///
/// # Errors
/// [`ArrayError::RankMismatch`] if `dims` has fewer than two axes.
pub fn eye(dims: &[usize], k: isize) -> Result<Array> {
    if dims.len() < 2 {
        return Err(ArrayError::RankMismatch(dims.len(), 2));
    }
    let data = NdArray::from_fn_col_major(dims, |idx| {
        if idx[1] as isize - idx[0] as isize == k {
            1.0
        } else {
            0.0
        }
    })?;
    Ok(Array::new(data))
}

/// Square `n x n` version of [`eye`].
pub fn eye_square(n: usize, k: isize) -> Result<Array> {
    eye(&[n, n], k)
}
