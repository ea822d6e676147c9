//! Iteration engine shared by the elementwise, reduction and assignment paths.
//!
//! Everything walks in column-major order: axis 0 is the inner run, the
//! remaining axes advance like an odometer. Strided operands are traversed by
//! offset arithmetic; dynamic views go through [`ReadView`] / [`WriteView`].

use crate::shape::element_count;
use crate::view::{ReadView, StridedView, ViewLayout, WriteView};
use crate::{ArrayError, Result};

pub(crate) fn ensure_same_shape(a: &[usize], b: &[usize]) -> Result<()> {
    if a != b {
        return Err(ArrayError::IncompatibleShape(a.to_vec(), b.to_vec()));
    }
    Ok(())
}

/// Iterate over inner runs, calling `f(offsets, run_len, inner_strides)`.
///
/// `offsets[k]` is the storage offset of the first element of the run in
/// operand `k`, starting from `base[k]`. The run walks axis 0.
pub(crate) fn for_each_inner_run<F>(
    dims: &[usize],
    strides_list: &[&[isize]],
    base: &[isize],
    mut f: F,
) -> Result<()>
where
    F: FnMut(&[isize], usize, &[isize]) -> Result<()>,
{
    debug_assert_eq!(strides_list.len(), base.len());
    if dims.contains(&0) {
        return Ok(());
    }
    let rank = dims.len();
    let mut offsets = base.to_vec();
    if rank == 0 {
        return f(&offsets, 1, &[]);
    }

    let inner_len = dims[0];
    let inner_strides: Vec<isize> = strides_list.iter().map(|s| s[0]).collect();
    let mut idx = vec![0usize; rank];
    loop {
        f(&offsets, inner_len, &inner_strides)?;

        // Advance the outer odometer (axes 1..).
        let mut axis = 1;
        loop {
            if axis == rank {
                return Ok(());
            }
            idx[axis] += 1;
            for (offset, strides) in offsets.iter_mut().zip(strides_list) {
                *offset += strides[axis];
            }
            if idx[axis] < dims[axis] {
                break;
            }
            for (offset, strides) in offsets.iter_mut().zip(strides_list) {
                *offset -= dims[axis] as isize * strides[axis];
            }
            idx[axis] = 0;
            axis += 1;
        }
    }
}

/// Call `f` with every multi-index of `dims` in column-major order.
pub(crate) fn for_each_index<F>(dims: &[usize], mut f: F) -> Result<()>
where
    F: FnMut(&[usize]) -> Result<()>,
{
    let total = element_count(dims);
    let rank = dims.len();
    let mut idx = vec![0usize; rank];
    for _ in 0..total {
        f(&idx)?;
        for d in 0..rank {
            idx[d] += 1;
            if idx[d] < dims[d] {
                break;
            }
            idx[d] = 0;
        }
    }
    Ok(())
}

/// Copy `src` into `dest` element by element. Shapes must agree.
pub(crate) fn copy_into<T, D, S>(dest: &mut D, src: &S) -> Result<()>
where
    T: Copy,
    D: WriteView<T> + ?Sized,
    S: ReadView<T> + ?Sized,
{
    ensure_same_shape(dest.dims(), src.dims())?;
    let dims = dest.dims().to_vec();
    let src_data = src.storage();
    for_each_index(&dims, |idx| {
        let value = src_data[src.offset_of(idx)];
        let offset = dest.offset_of(idx);
        dest.storage_mut()[offset] = value;
        Ok(())
    })
}

/// Gather a view into a contiguous column-major buffer.
pub(crate) fn collect<T, V>(view: &V) -> Result<Vec<T>>
where
    T: Copy,
    V: ReadView<T> + ?Sized,
{
    let mut out = Vec::with_capacity(view.len());
    let data = view.storage();
    for_each_index(view.dims(), |idx| {
        out.push(data[view.offset_of(idx)]);
        Ok(())
    })?;
    Ok(out)
}

/// Map one strided operand into a contiguous column-major buffer.
pub(crate) fn map1<A, U, F>(a: &StridedView<'_, A>, mut f: F) -> Result<Vec<U>>
where
    A: Copy,
    F: FnMut(A) -> Result<U>,
{
    if a.is_contiguous() {
        return a.data()[..a.len()].iter().map(|&x| f(x)).collect();
    }
    let mut out = Vec::with_capacity(a.len());
    let data = a.data();
    for_each_inner_run(a.dims(), &[a.strides()], &[a.offset()], |offsets, len, strides| {
        let mut pa = offsets[0];
        for _ in 0..len {
            out.push(f(data[pa as usize])?);
            pa += strides[0];
        }
        Ok(())
    })?;
    Ok(out)
}

/// Map two strided operands of the same shape into a contiguous buffer.
pub(crate) fn zip_map2<A, B, U, F>(
    a: &StridedView<'_, A>,
    b: &StridedView<'_, B>,
    mut f: F,
) -> Result<Vec<U>>
where
    A: Copy,
    B: Copy,
    F: FnMut(A, B) -> Result<U>,
{
    ensure_same_shape(a.dims(), b.dims())?;
    if a.is_contiguous() && b.is_contiguous() {
        let n = a.len();
        return a.data()[..n]
            .iter()
            .zip(&b.data()[..n])
            .map(|(&x, &y)| f(x, y))
            .collect();
    }
    let mut out = Vec::with_capacity(a.len());
    let (da, db) = (a.data(), b.data());
    for_each_inner_run(
        a.dims(),
        &[a.strides(), b.strides()],
        &[a.offset(), b.offset()],
        |offsets, len, strides| {
            let (mut pa, mut pb) = (offsets[0], offsets[1]);
            for _ in 0..len {
                out.push(f(da[pa as usize], db[pb as usize])?);
                pa += strides[0];
                pb += strides[1];
            }
            Ok(())
        },
    )?;
    Ok(out)
}

/// Map three strided operands of the same shape into a contiguous buffer.
pub(crate) fn zip_map3<A, B, C, U, F>(
    a: &StridedView<'_, A>,
    b: &StridedView<'_, B>,
    c: &StridedView<'_, C>,
    mut f: F,
) -> Result<Vec<U>>
where
    A: Copy,
    B: Copy,
    C: Copy,
    F: FnMut(A, B, C) -> Result<U>,
{
    ensure_same_shape(a.dims(), b.dims())?;
    ensure_same_shape(a.dims(), c.dims())?;
    let mut out = Vec::with_capacity(a.len());
    let (da, db, dc) = (a.data(), b.data(), c.data());
    for_each_inner_run(
        a.dims(),
        &[a.strides(), b.strides(), c.strides()],
        &[a.offset(), b.offset(), c.offset()],
        |offsets, len, strides| {
            let (mut pa, mut pb, mut pc) = (offsets[0], offsets[1], offsets[2]);
            for _ in 0..len {
                out.push(f(da[pa as usize], db[pb as usize], dc[pc as usize])?);
                pa += strides[0];
                pb += strides[1];
                pc += strides[2];
            }
            Ok(())
        },
    )?;
    Ok(out)
}
