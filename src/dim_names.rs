//! Dimension names: per-axis labels plus optional per-axis meta names.
//!
//! Labels follow the shape. Whenever an axis changes size its labels are
//! dropped; meta names describe the axis itself and survive by position.

use crate::{ArrayError, Result};

/// Per-axis labels of an array.
///
/// `axes[i]` is either absent or holds exactly `dims[i]` labels. Meta names,
/// when present, hold one entry per axis (`""` for an unnamed axis).
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DimNames {
    axes: Vec<Option<Vec<String>>>,
    meta: Option<Vec<String>>,
}

impl DimNames {
    /// Names container of the given rank with every axis unlabeled.
    pub fn empty(rank: usize) -> Self {
        Self {
            axes: vec![None; rank],
            meta: None,
        }
    }

    /// Build from per-axis labels and optional meta names.
    ///
    /// # Errors
    /// [`ArrayError::SizeMismatch`] if `meta` does not hold one entry per axis.
    pub fn new(axes: Vec<Option<Vec<String>>>, meta: Option<Vec<String>>) -> Result<Self> {
        if let Some(meta) = &meta {
            if meta.len() != axes.len() {
                return Err(ArrayError::SizeMismatch(axes.len(), meta.len()));
            }
        }
        Ok(Self { axes, meta })
    }

    #[inline]
    pub fn rank(&self) -> usize {
        self.axes.len()
    }

    /// Labels of `axis`, if any.
    pub fn axis(&self, axis: usize) -> Option<&[String]> {
        self.axes.get(axis).and_then(|names| names.as_deref())
    }

    /// All meta names, if any.
    pub fn meta(&self) -> Option<&[String]> {
        self.meta.as_deref()
    }

    /// Meta name of `axis`, if any.
    pub fn meta_name(&self, axis: usize) -> Option<&str> {
        self.meta
            .as_ref()
            .and_then(|meta| meta.get(axis))
            .map(String::as_str)
    }

    /// True when no axis carries labels and there are no meta names.
    pub fn is_empty(&self) -> bool {
        self.meta.is_none() && self.axes.iter().all(Option::is_none)
    }

    /// Check the names against a shape.
    pub(crate) fn validate(&self, dims: &[usize]) -> Result<()> {
        if self.axes.len() != dims.len() {
            return Err(ArrayError::SizeMismatch(dims.len(), self.axes.len()));
        }
        for (names, &dim) in self.axes.iter().zip(dims) {
            if let Some(names) = names {
                if names.len() != dim {
                    return Err(ArrayError::SizeMismatch(dim, names.len()));
                }
            }
        }
        Ok(())
    }

    /// Names of the sub-array that gathers `positions[i]` along each axis.
    pub(crate) fn select(&self, positions: &[Vec<usize>]) -> DimNames {
        let axes = self
            .axes
            .iter()
            .zip(positions)
            .map(|(names, picked)| {
                names
                    .as_ref()
                    .map(|names| picked.iter().map(|&p| names[p].clone()).collect())
            })
            .collect();
        DimNames {
            axes,
            meta: self.meta.clone(),
        }
    }

    /// Insert an unlabeled axis at `axis`.
    pub(crate) fn insert_axis(&self, axis: usize) -> DimNames {
        let mut out = self.clone();
        out.axes.insert(axis, None);
        if let Some(meta) = &mut out.meta {
            meta.insert(axis, String::new());
        }
        out
    }

    /// Remove the given axes. `axes` must be sorted and unique.
    pub(crate) fn remove_axes(&self, axes: &[usize]) -> DimNames {
        let keep = |i: &usize| axes.binary_search(i).is_err();
        let new_axes = (0..self.rank())
            .filter(keep)
            .map(|i| self.axes[i].clone())
            .collect();
        let meta = self
            .meta
            .as_ref()
            .map(|meta| (0..self.rank()).filter(keep).map(|i| meta[i].clone()).collect());
        DimNames {
            axes: new_axes,
            meta,
        }
    }

    /// Reorder axes: output axis `i` takes input axis `perm[i]`.
    pub(crate) fn permute(&self, perm: &[usize]) -> DimNames {
        DimNames {
            axes: perm.iter().map(|&p| self.axes[p].clone()).collect(),
            meta: self
                .meta
                .as_ref()
                .map(|meta| perm.iter().map(|&p| meta[p].clone()).collect()),
        }
    }

    /// Reverse the labels of one axis.
    pub(crate) fn reverse_axis(&self, axis: usize) -> DimNames {
        let mut out = self.clone();
        if let Some(Some(names)) = out.axes.get_mut(axis) {
            names.reverse();
        }
        out
    }
}

/// Grow or shrink `old` to match `new_dims`.
///
/// - axes beyond the old rank are unlabeled
/// - axes beyond the new rank are dropped
/// - labels are kept only if their count still equals the axis size
/// - meta names are copied by position; new axes get `""`
pub fn reshape_names(old: &DimNames, new_dims: &[usize]) -> DimNames {
    let rank = new_dims.len();
    let mut axes = vec![None; rank];
    for (i, slot) in axes.iter_mut().enumerate() {
        if let Some(Some(names)) = old.axes.get(i) {
            if names.len() == new_dims[i] {
                *slot = Some(names.clone());
            }
        }
    }

    let meta = old.meta.as_ref().map(|old_meta| {
        let mut meta = vec![String::new(); rank];
        for (slot, name) in meta.iter_mut().zip(old_meta) {
            *slot = name.clone();
        }
        meta
    });

    DimNames { axes, meta }
}

fn coalesce_axis(a: &Option<Vec<String>>, b: &Option<Vec<String>>) -> Result<Option<Vec<String>>> {
    let a_len = a.as_ref().map_or(0, Vec::len);
    let b_len = b.as_ref().map_or(0, Vec::len);
    // Equal counts keep `a` without comparing content.
    if a_len == b_len || b_len == 0 {
        Ok(a.clone())
    } else if a_len == 0 {
        Ok(b.clone())
    } else {
        Err(ArrayError::SizeMismatch(a_len, b_len))
    }
}

/// Merge two names containers of the same rank, preferring `a`.
///
/// # Errors
/// [`ArrayError::SizeMismatch`] if the ranks differ, or if both sides label
/// an axis with different counts (impossible once both were reshaped to a
/// common shape with [`reshape_names`]).
pub fn coalesce_names(a: &DimNames, b: &DimNames) -> Result<DimNames> {
    if a.rank() != b.rank() {
        return Err(ArrayError::SizeMismatch(a.rank(), b.rank()));
    }
    let axes = a
        .axes
        .iter()
        .zip(&b.axes)
        .map(|(x, y)| coalesce_axis(x, y))
        .collect::<Result<Vec<_>>>()?;
    let meta = a.meta.clone().or_else(|| b.meta.clone());
    Ok(DimNames { axes, meta })
}

/// Names of the result of an elementwise operation with shape `common_dims`.
pub(crate) fn common_names(names: &[&DimNames], common_dims: &[usize]) -> Result<DimNames> {
    let mut out = DimNames::empty(common_dims.len());
    let mut first = true;
    for names in names {
        let reshaped = reshape_names(names, common_dims);
        out = if first {
            reshaped
        } else {
            coalesce_names(&out, &reshaped)?
        };
        first = false;
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(names: &[&str]) -> Option<Vec<String>> {
        Some(names.iter().map(|s| s.to_string()).collect())
    }

    fn meta(names: &[&str]) -> Option<Vec<String>> {
        labels(names)
    }

    #[test]
    fn test_new_rejects_short_meta() {
        let err = DimNames::new(vec![None, None], meta(&["rows"])).unwrap_err();
        assert!(matches!(err, ArrayError::SizeMismatch(2, 1)));
    }

    #[test]
    fn test_reshape_names_drops_axes_beyond_rank() {
        let names = DimNames::new(
            vec![labels(&["a", "b", "c"]), labels(&["x", "y"])],
            meta(&["rows", "cols"]),
        )
        .unwrap();
        let out = reshape_names(&names, &[3]);
        assert_eq!(out.rank(), 1);
        assert_eq!(out.axis(0).unwrap().len(), 3);
        assert_eq!(out.meta().unwrap(), &["rows".to_string()]);
    }

    #[test]
    fn test_reshape_names_drops_resized_axis() {
        let names = DimNames::new(vec![labels(&["a", "b", "c"]), labels(&["x", "y"])], None)
            .unwrap();
        let out = reshape_names(&names, &[3, 4]);
        assert!(out.axis(0).is_some());
        assert!(out.axis(1).is_none());
        assert!(out.meta().is_none());
    }

    #[test]
    fn test_reshape_names_grows_meta_with_empty() {
        let names = DimNames::new(vec![labels(&["a", "b"])], meta(&["rows"])).unwrap();
        let out = reshape_names(&names, &[2, 5, 1]);
        assert_eq!(out.rank(), 3);
        assert_eq!(out.meta_name(0), Some("rows"));
        assert_eq!(out.meta_name(1), Some(""));
        assert_eq!(out.meta_name(2), Some(""));
        assert!(out.axis(1).is_none());
    }

    #[test]
    fn test_coalesce_prefers_present_side() {
        let a = DimNames::new(vec![None, labels(&["x", "y"])], None).unwrap();
        let b = DimNames::new(vec![labels(&["a", "b"]), None], meta(&["r", "c"])).unwrap();
        let out = coalesce_names(&a, &b).unwrap();
        assert_eq!(out.axis(0).unwrap()[1], "b");
        assert_eq!(out.axis(1).unwrap()[0], "x");
        assert_eq!(out.meta_name(1), Some("c"));
    }

    #[test]
    fn test_coalesce_keeps_first_on_conflict() {
        let a = DimNames::new(vec![labels(&["a", "b"])], meta(&["left"])).unwrap();
        let b = DimNames::new(vec![labels(&["p", "q"])], meta(&["right"])).unwrap();
        let out = coalesce_names(&a, &b).unwrap();
        assert_eq!(out.axis(0).unwrap()[0], "a");
        assert_eq!(out.meta_name(0), Some("left"));
    }

    #[test]
    fn test_coalesce_rank_mismatch() {
        let a = DimNames::empty(2);
        let b = DimNames::empty(3);
        assert!(matches!(
            coalesce_names(&a, &b),
            Err(ArrayError::SizeMismatch(2, 3))
        ));
    }

    #[test]
    fn test_remove_and_insert_axes() {
        let names = DimNames::new(
            vec![labels(&["a"]), labels(&["x", "y"]), None],
            meta(&["r", "c", "d"]),
        )
        .unwrap();
        let removed = names.remove_axes(&[0, 2]);
        assert_eq!(removed.rank(), 1);
        assert_eq!(removed.meta_name(0), Some("c"));

        let inserted = removed.insert_axis(0);
        assert_eq!(inserted.rank(), 2);
        assert!(inserted.axis(0).is_none());
        assert_eq!(inserted.meta_name(0), Some(""));
        assert_eq!(inserted.axis(1).unwrap()[1], "y");
    }

    #[test]
    fn test_select_gathers_labels() {
        let names = DimNames::new(vec![labels(&["a", "b", "c"]), None], None).unwrap();
        let out = names.select(&[vec![2, 0], vec![0]]);
        assert_eq!(out.axis(0).unwrap(), &["c".to_string(), "a".to_string()]);
        assert!(out.axis(1).is_none());
    }
}
