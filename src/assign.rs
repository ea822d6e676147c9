//! Subset reads and copy-on-write subset assignment.
//!
//! Both paths pick a [`ViewStrategy`] from the indexer: regular selections get
//! a strided view, anything else a dynamic one. Assignment writes into a
//! private copy of the target and only after the value is known to broadcast
//! into the selected region.

use log::debug;

use crate::array::{dispatch_array, Array, ArrayData, NdArray, Stored};
use crate::index::Indexer;
use crate::kernel::{collect, copy_into};
use crate::shape::{col_major_strides, shrink_rank, validate_broadcastable};
use crate::view::{
    broadcasting_view, dynamic_view, dynamic_view_mut, strided_view, strided_view_mut,
    StridedView, ViewLayout, ViewStrategy, WriteView,
};
use crate::{ArrayError, Result};

/// View of `value` at exactly `rank` axes.
///
/// Lower ranks gain trailing size-1 axes; higher ranks must only carry
/// trailing size-1 axes, which are dropped.
fn value_view<T>(value: &NdArray<T>, rank: usize) -> Result<StridedView<'_, T>> {
    if value.ndim() <= rank {
        return broadcasting_view(value, rank);
    }
    let dims = shrink_rank(value.dims(), rank)?;
    StridedView::new(value.data(), &dims, &col_major_strides(&dims), 0)
}

/// Check the value against the view, then copy it in.
fn write_through<T, D>(dest: &mut D, value: &StridedView<'_, T>) -> Result<()>
where
    T: Copy,
    D: WriteView<T>,
{
    validate_broadcastable(value.dims(), dest.dims())?;
    let src = value.broadcast(dest.dims())?;
    copy_into(dest, &src)
}

fn assign_typed<T: Copy>(
    target: &mut NdArray<T>,
    indexer: &Indexer,
    value: &NdArray<T>,
) -> Result<()> {
    let value = value_view(value, target.ndim())?;
    let strategy = ViewStrategy::select(indexer);
    debug!(
        "subset_assign: {:?} view of {:?}, value {:?}",
        strategy,
        target.dims(),
        value.dims()
    );
    match strategy {
        ViewStrategy::Strided => write_through(&mut strided_view_mut(target, indexer)?, &value),
        ViewStrategy::Dynamic => write_through(&mut dynamic_view_mut(target, indexer)?, &value),
    }
}

/// Return a copy of `x` with the region selected by `indexer` replaced by `value`.
///
/// `value` is cast to the kind of `x` and broadcast into the selected region.
/// If any axis selects nothing, `x` is returned unchanged. Dimension names of
/// `x` are kept.
///
/// # Errors
/// - [`ArrayError::RankMismatch`] if the indexer rank differs from the rank of `x`
/// - [`ArrayError::TypeMismatch`] if `value` cannot be cast without loss
/// - [`ArrayError::IndexOutOfBounds`] for a position outside its axis
/// - [`ArrayError::NonBroadcastable`] if `value` does not fit the selected region
pub fn subset_assign(x: &Array, indexer: &Indexer, value: &Array) -> Result<Array> {
    indexer.check_rank(x.ndim())?;
    if indexer.has_empty_selection(x.dims()) {
        debug!("subset_assign: empty selection on {:?}, no-op", x.dims());
        return Ok(x.clone());
    }

    let value = value.data().cast(x.kind())?;
    let mut out = x.data().clone();
    match (&mut out, value.as_ref()) {
        (ArrayData::Logical(t), ArrayData::Logical(v)) => assign_typed(t, indexer, v)?,
        (ArrayData::Integer(t), ArrayData::Integer(v)) => assign_typed(t, indexer, v)?,
        (ArrayData::Double(t), ArrayData::Double(v)) => assign_typed(t, indexer, v)?,
        (t, v) => return Err(ArrayError::TypeMismatch(t.kind(), v.kind())),
    }
    Ok(Array::from_parts(out, x.dim_names().clone()))
}

fn gather<T: Stored>(array: &NdArray<T>, indexer: &Indexer) -> Result<ArrayData> {
    let strategy = ViewStrategy::select(indexer);
    debug!("subset: {:?} view of {:?}", strategy, array.dims());
    let (values, dims) = match strategy {
        ViewStrategy::Strided => {
            let view = strided_view(array, indexer)?;
            (collect(&view)?, view.dims().to_vec())
        }
        ViewStrategy::Dynamic => {
            let view = dynamic_view(array, indexer)?;
            (collect(&view)?, view.dims().to_vec())
        }
    };
    Ok(T::wrap(NdArray::from_vec(values, &dims)?))
}

/// Gather the region of `x` selected by `indexer` into a new array.
///
/// Selected axes keep their rank; labels are gathered along with the data.
pub fn subset(x: &Array, indexer: &Indexer) -> Result<Array> {
    indexer.check_rank(x.ndim())?;
    let data = dispatch_array!(x.data(), a => gather(a, indexer))?;
    let positions = indexer
        .axes()
        .iter()
        .zip(x.dims())
        .enumerate()
        .map(|(axis, (index, &dim))| index.resolve(axis, dim))
        .collect::<Result<Vec<_>>>()?;
    Ok(Array::from_parts(data, x.dim_names().select(&positions)))
}
