//! Borrowed views over array storage.
//!
//! - [`StridedView`] / [`StridedViewMut`]: dims, strides and an offset. Built in
//!   O(rank) from regular selections and used for broadcasting (stride 0).
//! - [`DynamicView`] / [`DynamicViewMut`]: an explicit position list per axis,
//!   for arbitrary ("fancy") selections.
//!
//! Views borrow the array they reinterpret and are consumed inside the
//! operation that built them. All four implement [`ViewLayout`]; the read and
//! write halves are [`ReadView`] and [`WriteView`].

use std::sync::Arc;

use log::trace;

use crate::array::NdArray;
use crate::index::Indexer;
use crate::shape::{col_major_strides, element_count, pad_rank};
use crate::{ArrayError, Result};

// ============================================================================
// Traits
// ============================================================================

/// Shape and addressing of a view.
pub trait ViewLayout {
    fn dims(&self) -> &[usize];

    /// Position in the backing storage of the element at `indices`.
    fn offset_of(&self, indices: &[usize]) -> usize;

    #[inline]
    fn ndim(&self) -> usize {
        self.dims().len()
    }

    #[inline]
    fn len(&self) -> usize {
        element_count(self.dims())
    }

    #[inline]
    fn is_empty(&self) -> bool {
        self.dims().contains(&0)
    }
}

/// A view that can be read.
pub trait ReadView<T: Copy>: ViewLayout {
    fn storage(&self) -> &[T];

    fn get(&self, indices: &[usize]) -> T {
        check_indices(self.dims(), indices);
        self.storage()[self.offset_of(indices)]
    }
}

/// A view that can be written.
pub trait WriteView<T: Copy>: ViewLayout {
    fn storage_mut(&mut self) -> &mut [T];

    fn set(&mut self, indices: &[usize], value: T) {
        check_indices(self.dims(), indices);
        let offset = self.offset_of(indices);
        self.storage_mut()[offset] = value;
    }
}

fn check_indices(dims: &[usize], indices: &[usize]) {
    assert_eq!(indices.len(), dims.len(), "wrong number of indices");
    for (i, (&index, &dim)) in indices.iter().zip(dims).enumerate() {
        assert!(
            index < dim,
            "index {} out of bounds for dim {} of size {}",
            index,
            i,
            dim
        );
    }
}

// ============================================================================
// Validation helpers
// ============================================================================

/// Validate that all accessed offsets stay within `[0, len)`.
fn validate_bounds(len: usize, dims: &[usize], strides: &[isize], offset: isize) -> Result<()> {
    if dims.len() != strides.len() {
        return Err(ArrayError::StrideLengthMismatch);
    }
    // Empty view - no access needed
    if dims.iter().any(|&d| d == 0) {
        return Ok(());
    }
    let mut min_offset = offset;
    let mut max_offset = offset;
    for (&dim, &stride) in dims.iter().zip(strides.iter()) {
        if dim > 1 {
            let end = stride
                .checked_mul(dim as isize - 1)
                .ok_or(ArrayError::OffsetOverflow)?;
            if end >= 0 {
                max_offset = max_offset
                    .checked_add(end)
                    .ok_or(ArrayError::OffsetOverflow)?;
            } else {
                min_offset = min_offset
                    .checked_add(end)
                    .ok_or(ArrayError::OffsetOverflow)?;
            }
        }
    }
    if min_offset < 0 || max_offset < 0 {
        return Err(ArrayError::OffsetOverflow);
    }
    if max_offset as usize >= len {
        return Err(ArrayError::OffsetOverflow);
    }
    Ok(())
}

#[inline]
fn strided_offset(offset: isize, strides: &[isize], indices: &[usize]) -> usize {
    let mut idx = offset;
    for (&index, &stride) in indices.iter().zip(strides) {
        idx += index as isize * stride;
    }
    idx as usize
}

/// Per-axis strides for broadcasting `dims` up to `target_dims`.
///
/// Size-1 axes get stride 0; an empty target axis accepts any source size.
fn broadcast_strides(
    dims: &[usize],
    strides: &[isize],
    target_dims: &[usize],
) -> Result<Vec<isize>> {
    if dims.len() != target_dims.len() {
        return Err(ArrayError::RankMismatch(dims.len(), target_dims.len()));
    }
    let mut out = Vec::with_capacity(dims.len());
    for i in 0..dims.len() {
        if dims[i] == target_dims[i] || target_dims[i] == 0 {
            out.push(strides[i]);
        } else if dims[i] == 1 {
            out.push(0);
        } else {
            return Err(ArrayError::NonBroadcastable(
                dims.to_vec(),
                target_dims.to_vec(),
            ));
        }
    }
    Ok(out)
}

// ============================================================================
// StridedView
// ============================================================================

/// Dynamic-rank immutable strided view.
pub struct StridedView<'a, T> {
    data: &'a [T],
    dims: Arc<[usize]>,
    strides: Arc<[isize]>,
    offset: isize,
}

impl<T> Clone for StridedView<'_, T> {
    fn clone(&self) -> Self {
        Self {
            data: self.data,
            dims: self.dims.clone(),
            strides: self.strides.clone(),
            offset: self.offset,
        }
    }
}

impl<T> std::fmt::Debug for StridedView<'_, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StridedView")
            .field("dims", &self.dims)
            .field("strides", &self.strides)
            .field("offset", &self.offset)
            .finish()
    }
}

impl<'a, T> StridedView<'a, T> {
    /// Create a new immutable strided view from a borrowed slice.
    ///
    /// # Errors
    /// [`ArrayError::OffsetOverflow`] if the view would reach outside `data`.
    pub fn new(data: &'a [T], dims: &[usize], strides: &[isize], offset: isize) -> Result<Self> {
        validate_bounds(data.len(), dims, strides, offset)?;
        Ok(Self {
            data,
            dims: Arc::from(dims),
            strides: Arc::from(strides),
            offset,
        })
    }

    #[inline]
    pub fn strides(&self) -> &[isize] {
        &self.strides
    }

    #[inline]
    pub fn offset(&self) -> isize {
        self.offset
    }

    #[inline]
    pub fn data(&self) -> &'a [T] {
        self.data
    }

    /// True if the view walks `data[..len]` in column-major order.
    pub fn is_contiguous(&self) -> bool {
        if self.offset != 0 {
            return false;
        }
        let mut expected = 1isize;
        for (&dim, &stride) in self.dims.iter().zip(self.strides.iter()) {
            if dim <= 1 {
                continue;
            }
            if stride != expected {
                return false;
            }
            expected *= dim as isize;
        }
        true
    }

    /// Broadcast this view to a target shape of the same rank.
    ///
    /// Size-1 dimensions are expanded with stride 0. A target size of 0 accepts
    /// any source size.
    pub fn broadcast(&self, target_dims: &[usize]) -> Result<StridedView<'a, T>> {
        let strides = broadcast_strides(&self.dims, &self.strides, target_dims)?;
        Ok(StridedView {
            data: self.data,
            dims: Arc::from(target_dims),
            strides: Arc::from(strides),
            offset: self.offset,
        })
    }

    /// Permute dimensions: output axis `i` is input axis `perm[i]`.
    pub fn permute(&self, perm: &[usize]) -> Result<StridedView<'a, T>> {
        let rank = self.dims.len();
        if perm.len() != rank {
            return Err(ArrayError::RankMismatch(perm.len(), rank));
        }
        let mut seen = vec![false; rank];
        for &p in perm {
            if p >= rank || seen[p] {
                return Err(ArrayError::InvalidAxis { axis: p, rank });
            }
            seen[p] = true;
        }
        let new_dims: Vec<usize> = perm.iter().map(|&p| self.dims[p]).collect();
        let new_strides: Vec<isize> = perm.iter().map(|&p| self.strides[p]).collect();
        Ok(StridedView {
            data: self.data,
            dims: Arc::from(new_dims),
            strides: Arc::from(new_strides),
            offset: self.offset,
        })
    }

    /// Walk `axis` backwards.
    pub fn reverse_axis(&self, axis: usize) -> Result<StridedView<'a, T>> {
        let rank = self.dims.len();
        if axis >= rank {
            return Err(ArrayError::InvalidAxis { axis, rank });
        }
        let mut strides = self.strides.to_vec();
        let mut offset = self.offset;
        if self.dims[axis] > 0 {
            offset += (self.dims[axis] as isize - 1) * strides[axis];
        }
        strides[axis] = -strides[axis];
        Ok(StridedView {
            data: self.data,
            dims: self.dims.clone(),
            strides: Arc::from(strides),
            offset,
        })
    }
}

impl<T> ViewLayout for StridedView<'_, T> {
    #[inline]
    fn dims(&self) -> &[usize] {
        &self.dims
    }

    #[inline]
    fn offset_of(&self, indices: &[usize]) -> usize {
        strided_offset(self.offset, &self.strides, indices)
    }
}

impl<T: Copy> ReadView<T> for StridedView<'_, T> {
    #[inline]
    fn storage(&self) -> &[T] {
        self.data
    }
}

// ============================================================================
// StridedViewMut
// ============================================================================

/// Dynamic-rank mutable strided view.
pub struct StridedViewMut<'a, T> {
    data: &'a mut [T],
    dims: Arc<[usize]>,
    strides: Arc<[isize]>,
    offset: isize,
}

impl<T> std::fmt::Debug for StridedViewMut<'_, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StridedViewMut")
            .field("dims", &self.dims)
            .field("strides", &self.strides)
            .field("offset", &self.offset)
            .finish()
    }
}

impl<'a, T> StridedViewMut<'a, T> {
    /// Create a new mutable strided view.
    pub fn new(
        data: &'a mut [T],
        dims: &[usize],
        strides: &[isize],
        offset: isize,
    ) -> Result<Self> {
        validate_bounds(data.len(), dims, strides, offset)?;
        Ok(Self {
            data,
            dims: Arc::from(dims),
            strides: Arc::from(strides),
            offset,
        })
    }

    #[inline]
    pub fn strides(&self) -> &[isize] {
        &self.strides
    }

    #[inline]
    pub fn offset(&self) -> isize {
        self.offset
    }

    /// Reborrow as an immutable view.
    pub fn as_view(&self) -> StridedView<'_, T> {
        StridedView {
            data: self.data,
            dims: self.dims.clone(),
            strides: self.strides.clone(),
            offset: self.offset,
        }
    }
}

impl<T> ViewLayout for StridedViewMut<'_, T> {
    #[inline]
    fn dims(&self) -> &[usize] {
        &self.dims
    }

    #[inline]
    fn offset_of(&self, indices: &[usize]) -> usize {
        strided_offset(self.offset, &self.strides, indices)
    }
}

impl<T: Copy> ReadView<T> for StridedViewMut<'_, T> {
    #[inline]
    fn storage(&self) -> &[T] {
        self.data
    }
}

impl<T: Copy> WriteView<T> for StridedViewMut<'_, T> {
    #[inline]
    fn storage_mut(&mut self) -> &mut [T] {
        self.data
    }
}

// ============================================================================
// DynamicView
// ============================================================================

/// View selecting an explicit list of positions on every axis.
#[derive(Debug)]
pub struct DynamicView<'a, T> {
    data: &'a [T],
    dims: Vec<usize>,
    positions: Vec<Vec<usize>>,
    strides: Vec<isize>,
}

/// Mutable counterpart of [`DynamicView`].
#[derive(Debug)]
pub struct DynamicViewMut<'a, T> {
    data: &'a mut [T],
    dims: Vec<usize>,
    positions: Vec<Vec<usize>>,
    strides: Vec<isize>,
}

#[inline]
fn dynamic_offset(positions: &[Vec<usize>], strides: &[isize], indices: &[usize]) -> usize {
    let mut idx = 0isize;
    for ((picked, &stride), &index) in positions.iter().zip(strides).zip(indices) {
        idx += picked[index] as isize * stride;
    }
    idx as usize
}

impl<T> ViewLayout for DynamicView<'_, T> {
    #[inline]
    fn dims(&self) -> &[usize] {
        &self.dims
    }

    #[inline]
    fn offset_of(&self, indices: &[usize]) -> usize {
        dynamic_offset(&self.positions, &self.strides, indices)
    }
}

impl<T: Copy> ReadView<T> for DynamicView<'_, T> {
    #[inline]
    fn storage(&self) -> &[T] {
        self.data
    }
}

impl<T> ViewLayout for DynamicViewMut<'_, T> {
    #[inline]
    fn dims(&self) -> &[usize] {
        &self.dims
    }

    #[inline]
    fn offset_of(&self, indices: &[usize]) -> usize {
        dynamic_offset(&self.positions, &self.strides, indices)
    }
}

impl<T: Copy> ReadView<T> for DynamicViewMut<'_, T> {
    #[inline]
    fn storage(&self) -> &[T] {
        self.data
    }
}

impl<T: Copy> WriteView<T> for DynamicViewMut<'_, T> {
    #[inline]
    fn storage_mut(&mut self) -> &mut [T] {
        self.data
    }
}

// ============================================================================
// Builders
// ============================================================================

/// Which kind of view an indexer needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewStrategy {
    /// Every axis is a regular range.
    Strided,
    /// Some axis needs an explicit position list.
    Dynamic,
}

impl ViewStrategy {
    /// Pick the strategy from the shape of the indexer alone.
    pub fn select(indexer: &Indexer) -> ViewStrategy {
        if indexer.axes().iter().all(|index| index.is_strided()) {
            ViewStrategy::Strided
        } else {
            ViewStrategy::Dynamic
        }
    }
}

/// View of `array` with trailing size-1 axes added up to `target_rank`.
///
/// The storage is reinterpreted, never copied.
pub fn broadcasting_view<T>(array: &NdArray<T>, target_rank: usize) -> Result<StridedView<'_, T>> {
    let dims = pad_rank(array.dims(), target_rank)?;
    let strides = col_major_strides(&dims);
    StridedView::new(array.data(), &dims, &strides, 0)
}

fn strided_layout(dims: &[usize], indexer: &Indexer) -> Result<(Vec<usize>, Vec<isize>, isize)> {
    indexer.check_rank(dims.len())?;
    let base = col_major_strides(dims);
    let mut out_dims = Vec::with_capacity(dims.len());
    let mut out_strides = Vec::with_capacity(dims.len());
    let mut offset = 0isize;
    for (axis, (index, &dim)) in indexer.axes().iter().zip(dims).enumerate() {
        let range = index
            .as_strided(dim)
            .ok_or(ArrayError::NotStridable { axis })?;
        range.validate(axis, dim)?;
        if range.len > 0 {
            offset += range.start as isize * base[axis];
        }
        out_dims.push(range.len);
        out_strides.push(range.step * base[axis]);
    }
    trace!(
        "strided layout: dims={:?} strides={:?} offset={}",
        out_dims,
        out_strides,
        offset
    );
    Ok((out_dims, out_strides, offset))
}

type DynamicLayout = (Vec<usize>, Vec<Vec<usize>>, Vec<isize>);

fn dynamic_layout(dims: &[usize], indexer: &Indexer) -> Result<DynamicLayout> {
    indexer.check_rank(dims.len())?;
    let positions = indexer
        .axes()
        .iter()
        .zip(dims)
        .enumerate()
        .map(|(axis, (index, &dim))| index.resolve(axis, dim))
        .collect::<Result<Vec<_>>>()?;
    let out_dims: Vec<usize> = positions.iter().map(Vec::len).collect();
    trace!(
        "dynamic layout: dims={:?} selected={}",
        out_dims,
        positions.iter().map(Vec::len).sum::<usize>()
    );
    Ok((out_dims, positions, col_major_strides(dims)))
}

/// Read-only strided view of the region selected by `indexer`.
///
/// # Errors
/// [`ArrayError::NotStridable`] if some axis is not a regular range.
pub fn strided_view<'a, T>(array: &'a NdArray<T>, indexer: &Indexer) -> Result<StridedView<'a, T>> {
    let (dims, strides, offset) = strided_layout(array.dims(), indexer)?;
    StridedView::new(array.data(), &dims, &strides, offset)
}

/// Writable strided view of the region selected by `indexer`.
pub fn strided_view_mut<'a, T>(
    array: &'a mut NdArray<T>,
    indexer: &Indexer,
) -> Result<StridedViewMut<'a, T>> {
    let (dims, strides, offset) = strided_layout(array.dims(), indexer)?;
    StridedViewMut::new(array.data_mut(), &dims, &strides, offset)
}

/// Read-only view of the positions selected by `indexer`.
pub fn dynamic_view<'a, T>(array: &'a NdArray<T>, indexer: &Indexer) -> Result<DynamicView<'a, T>> {
    let (dims, positions, strides) = dynamic_layout(array.dims(), indexer)?;
    Ok(DynamicView {
        data: array.data(),
        dims,
        positions,
        strides,
    })
}

/// Writable view of the positions selected by `indexer`.
pub fn dynamic_view_mut<'a, T>(
    array: &'a mut NdArray<T>,
    indexer: &Indexer,
) -> Result<DynamicViewMut<'a, T>> {
    let (dims, positions, strides) = dynamic_layout(array.dims(), indexer)?;
    Ok(DynamicViewMut {
        data: array.data_mut(),
        dims,
        positions,
        strides,
    })
}

// ============================================================================
// Tests
// ============================================================================
