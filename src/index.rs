//! Per-axis index selections used to build subset views.

use crate::{ArrayError, Result};

/// A regular range of positions: `start, start + step, ...` (`len` positions).
///
/// `step` may be negative to walk an axis backwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StridedRange {
    pub start: usize,
    pub len: usize,
    pub step: isize,
}

impl StridedRange {
    /// Range from `start` towards `end` (exclusive) with the given step.
    ///
    /// A negative step walks down from `start` while positions stay above `end`,
    /// so it can never reach position 0; use [`StridedRange::with_len`] for that.
    pub fn new(start: usize, end: usize, step: isize) -> Self {
        let len = if step > 0 && end > start {
            (end - start - 1) / step as usize + 1
        } else if step < 0 && start > end {
            (start - end - 1) / step.unsigned_abs() + 1
        } else {
            0
        };
        Self { start, len, step }
    }

    pub fn with_len(start: usize, len: usize, step: isize) -> Self {
        Self { start, len, step }
    }

    /// The `k`-th selected position. Only meaningful for validated ranges.
    #[inline]
    pub fn position(&self, k: usize) -> isize {
        self.start as isize + k as isize * self.step
    }

    fn checked_position(&self, k: usize) -> Option<isize> {
        let start = isize::try_from(self.start).ok()?;
        isize::try_from(k)
            .ok()?
            .checked_mul(self.step)?
            .checked_add(start)
    }

    /// Check that every position lies in `0..dim`.
    ///
    /// A zero step is only allowed when it selects a single position.
    pub(crate) fn validate(&self, axis: usize, dim: usize) -> Result<()> {
        if self.len == 0 {
            return Ok(());
        }
        if self.step == 0 && self.len > 1 {
            return Err(ArrayError::ZeroStride { dim: axis });
        }
        let out_of_bounds = |index: usize| ArrayError::IndexOutOfBounds {
            axis,
            index,
            len: dim,
        };
        if self.start >= dim {
            return Err(out_of_bounds(self.start));
        }
        let last = self
            .checked_position(self.len - 1)
            .ok_or(ArrayError::OffsetOverflow)?;
        if last < 0 || last as usize >= dim {
            return Err(out_of_bounds(last.max(0) as usize));
        }
        Ok(())
    }
}

/// Selection along a single axis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AxisIndex {
    /// Every position of the axis.
    All,
    /// Explicit positions, in order, repeats allowed.
    Positions(Vec<usize>),
    /// A regular range.
    Range(StridedRange),
}

impl AxisIndex {
    /// Number of positions selected on an axis of size `dim`.
    pub fn selected_len(&self, dim: usize) -> usize {
        match self {
            AxisIndex::All => dim,
            AxisIndex::Positions(positions) => positions.len(),
            AxisIndex::Range(range) => range.len,
        }
    }

    /// Whether this selection can be described by a start and a constant step.
    pub fn is_strided(&self) -> bool {
        match self {
            AxisIndex::All | AxisIndex::Range(_) => true,
            AxisIndex::Positions(_) => self.as_strided(0).is_some(),
        }
    }

    /// This selection as a regular range, if it is one.
    pub(crate) fn as_strided(&self, dim: usize) -> Option<StridedRange> {
        match self {
            AxisIndex::All => Some(StridedRange::with_len(0, dim, 1)),
            AxisIndex::Range(range) => Some(*range),
            AxisIndex::Positions(positions) => match positions.as_slice() {
                [] => Some(StridedRange::with_len(0, 0, 1)),
                [p] => Some(StridedRange::with_len(*p, 1, 1)),
                [p0, p1, rest @ ..] => {
                    let step = *p1 as isize - *p0 as isize;
                    if step == 0 {
                        return None;
                    }
                    let mut prev = *p1 as isize;
                    for &p in rest {
                        if p as isize - prev != step {
                            return None;
                        }
                        prev = p as isize;
                    }
                    Some(StridedRange::with_len(*p0, positions.len(), step))
                }
            },
        }
    }

    /// Explicit list of selected positions, bounds-checked against `dim`.
    pub(crate) fn resolve(&self, axis: usize, dim: usize) -> Result<Vec<usize>> {
        match self {
            AxisIndex::All => Ok((0..dim).collect()),
            AxisIndex::Positions(positions) => {
                if let Some(&index) = positions.iter().find(|&&p| p >= dim) {
                    return Err(ArrayError::IndexOutOfBounds {
                        axis,
                        index,
                        len: dim,
                    });
                }
                Ok(positions.clone())
            }
            AxisIndex::Range(range) => {
                range.validate(axis, dim)?;
                Ok((0..range.len).map(|k| range.position(k) as usize).collect())
            }
        }
    }
}

/// One [`AxisIndex`] per axis of the indexed array.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Indexer {
    axes: Vec<AxisIndex>,
}

impl Indexer {
    pub fn new(axes: Vec<AxisIndex>) -> Self {
        Self { axes }
    }

    /// Select everything on each of `rank` axes.
    pub fn all(rank: usize) -> Self {
        Self {
            axes: vec![AxisIndex::All; rank],
        }
    }

    #[inline]
    pub fn rank(&self) -> usize {
        self.axes.len()
    }

    #[inline]
    pub fn axes(&self) -> &[AxisIndex] {
        &self.axes
    }

    /// True if some axis selects nothing.
    pub fn has_empty_selection(&self, dims: &[usize]) -> bool {
        self.axes
            .iter()
            .zip(dims)
            .any(|(index, &dim)| index.selected_len(dim) == 0)
    }

    pub(crate) fn check_rank(&self, rank: usize) -> Result<()> {
        if self.axes.len() != rank {
            return Err(ArrayError::RankMismatch(self.axes.len(), rank));
        }
        Ok(())
    }
}

impl From<Vec<AxisIndex>> for Indexer {
    fn from(axes: Vec<AxisIndex>) -> Self {
        Self::new(axes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strided_range_len() {
        assert_eq!(StridedRange::new(0, 10, 2).len, 5);
        assert_eq!(StridedRange::new(1, 10, 3).len, 3);
        assert_eq!(StridedRange::new(5, 5, 1).len, 0);
        assert_eq!(StridedRange::new(9, 0, -3).len, 3);
    }

    #[test]
    fn test_strided_range_len_near_usize_max() {
        assert_eq!(StridedRange::new(0, usize::MAX, 2).len, usize::MAX / 2 + 1);
        assert_eq!(StridedRange::new(0, usize::MAX, 1).len, usize::MAX);
        assert_eq!(StridedRange::new(usize::MAX, 0, -1).len, usize::MAX);
        assert_eq!(StridedRange::new(usize::MAX - 1, usize::MAX, isize::MAX).len, 1);
    }

    #[test]
    fn test_strided_range_validate() {
        assert!(StridedRange::new(0, 10, 2).validate(0, 10).is_ok());
        assert!(matches!(
            StridedRange::with_len(0, 3, 0).validate(1, 4),
            Err(ArrayError::ZeroStride { dim: 1 })
        ));
        assert!(matches!(
            StridedRange::with_len(2, 3, 1).validate(0, 4),
            Err(ArrayError::IndexOutOfBounds { index: 4, .. })
        ));
        assert!(StridedRange::with_len(1, 3, -1).validate(0, 4).is_err());
        assert!(StridedRange::with_len(3, 4, -1).validate(0, 4).is_ok());
    }

    #[test]
    fn test_validate_huge_range_does_not_overflow() {
        assert!(matches!(
            StridedRange::with_len(0, 1 << 62, 4).validate(0, 4),
            Err(ArrayError::OffsetOverflow)
        ));
        assert!(matches!(
            StridedRange::with_len(usize::MAX, 1, 1).validate(0, 4),
            Err(ArrayError::IndexOutOfBounds {
                index: usize::MAX,
                ..
            })
        ));
        assert!(matches!(
            StridedRange::new(0, usize::MAX, 2).validate(2, 4),
            Err(ArrayError::OffsetOverflow)
        ));
    }

    #[test]
    fn test_zero_step_single_position() {
        assert!(StridedRange::with_len(2, 1, 0).validate(0, 4).is_ok());
        let range = AxisIndex::Range(StridedRange::with_len(2, 1, 0));
        assert_eq!(range.resolve(0, 4).unwrap(), vec![2]);
    }

    #[test]
    fn test_positions_detected_as_strided() {
        let regular = AxisIndex::Positions(vec![1, 3, 5]);
        assert_eq!(
            regular.as_strided(6),
            Some(StridedRange::with_len(1, 3, 2))
        );
        let descending = AxisIndex::Positions(vec![4, 2, 0]);
        assert_eq!(
            descending.as_strided(6),
            Some(StridedRange::with_len(4, 3, -2))
        );
        assert_eq!(AxisIndex::Positions(vec![0, 2, 3]).as_strided(6), None);
        assert_eq!(AxisIndex::Positions(vec![1, 1]).as_strided(6), None);
    }

    #[test]
    fn test_resolve_bounds() {
        assert_eq!(AxisIndex::All.resolve(0, 3).unwrap(), vec![0, 1, 2]);
        assert!(matches!(
            AxisIndex::Positions(vec![0, 3]).resolve(1, 3),
            Err(ArrayError::IndexOutOfBounds {
                axis: 1,
                index: 3,
                len: 3
            })
        ));
    }

    #[test]
    fn test_empty_selection() {
        let indexer = Indexer::new(vec![AxisIndex::All, AxisIndex::Positions(vec![])]);
        assert!(indexer.has_empty_selection(&[3, 3]));
        assert!(Indexer::all(2).has_empty_selection(&[3, 0]));
        assert!(!Indexer::all(2).has_empty_selection(&[3, 3]));
    }
}
