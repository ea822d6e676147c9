//! Broadcasting n-dimensional arrays with dimension names.
//!
//! Arrays are dense, homogeneous and stored in column-major order (the first
//! axis varies fastest). Three element kinds are supported: [`ElementKind::Logical`]
//! (`bool`), [`ElementKind::Integer`] (`i32`) and [`ElementKind::Double`] (`f64`).
//!
//! # Core Types
//!
//! - [`Array`]: an array of any element kind together with its [`DimNames`]
//! - [`NdArray`]: typed column-major storage
//! - [`StridedView`] / [`StridedViewMut`]: zero-copy regular-stride views
//! - [`DynamicView`] / [`DynamicViewMut`]: views over arbitrary per-axis index lists
//!
//! # Operations
//!
//! ## Elementwise
//!
//! - [`binary_op`], [`trinary_op`], [`unary_op`], [`unary_op_one_arg`]: dispatch by
//!   operation enum. Operand kinds are promoted along `Logical < Integer < Double`
//!   and shapes are broadcast with [`broadcast_shape`].
//!
//! ## Reduction
//!
//! - [`reducer`]: built-in axis reductions (sum, prod, mean, ...)
//! - [`custom_reducer`]: reduce with a caller-supplied per-slice function
//!
//! ## Shape
//!
//! - [`reshape`], [`squeeze`], [`expand_dims`]
//! - [`ones`], [`zeros`], [`eye`], [`eye_square`]
//!
//! ## Subsetting
//!
//! - [`subset`]: gather a sub-array through a strided or dynamic view
//! - [`subset_assign`]: copy-on-write assignment through a writable view
//!
//! # Broadcasting
//!
//! Axes are aligned from the first axis. A lower-rank operand is padded with
//! size-1 axes after its last axis, which in column-major storage is a pure
//! relabeling of the same memory.
//!
//! ```rust
//! use rarray::{binary_op, ones, zeros, BinaryOp};
//!
//! let x = ones(&[2, 3]).unwrap();
//! let y = zeros(&[2, 1]).unwrap();
//! let out = binary_op(BinaryOp::Subtract, &x, &y).unwrap();
//! assert_eq!(out.dims(), &[2, 3]);
//! ```

mod array;
mod assign;
mod construct;
pub mod dim_names;
mod element;
pub mod index;
mod kernel;
mod ops;
mod reduce;
mod reshape;
pub mod shape;
pub mod view;

// ============================================================================
// Array types
// ============================================================================
pub use array::{Array, ArrayData, NdArray};
pub use element::{Element, ElementKind, ElementSlice, Scalar};

// ============================================================================
// Shape algebra and dimension names
// ============================================================================
pub use dim_names::{coalesce_names, reshape_names, DimNames};
pub use shape::{
    broadcast_shape, pad_rank, shrink_rank, try_element_count, validate_broadcastable,
};

// ============================================================================
// Indexing and views
// ============================================================================
pub use index::{AxisIndex, Indexer, StridedRange};
pub use view::{
    broadcasting_view, dynamic_view, dynamic_view_mut, strided_view, strided_view_mut,
    DynamicView, DynamicViewMut, ReadView, StridedView, StridedViewMut, ViewLayout,
    ViewStrategy, WriteView,
};

// ============================================================================
// Operations
// ============================================================================
pub use assign::{subset, subset_assign};
pub use construct::{eye, eye_square, ones, zeros};
pub use ops::{
    binary_op, trinary_op, unary_op, unary_op_one_arg, BinaryOp, OpArg, TrinaryOp, UnaryArgOp,
    UnaryOp,
};
pub use reduce::{custom_reducer, reducer, ReducerOp};
pub use reshape::{expand_dims, reshape, squeeze};

// ============================================================================
// Constants
// ============================================================================

/// Largest rank any array may have.
///
/// Constructors, [`reshape`] and [`expand_dims`] reject shapes beyond this.
pub const MAX_RANK: usize = 64;

// ============================================================================
// Error types
// ============================================================================

/// Errors that can occur during array operations.
#[derive(Debug, thiserror::Error)]
pub enum ArrayError {
    /// Two shapes cannot be broadcast to a common shape.
    #[error("incompatible shapes for broadcasting: {0:?} vs {1:?}")]
    IncompatibleShape(Vec<usize>, Vec<usize>),

    /// An assigned value cannot be broadcast into the target region.
    #[error("non-broadcastable dimensions: value {0:?} into target {1:?}")]
    NonBroadcastable(Vec<usize>, Vec<usize>),

    /// Array ranks do not match, or a rank change would drop a non-unit axis.
    #[error("rank mismatch: {0} vs {1}")]
    RankMismatch(usize, usize),

    /// Element counts or dimension-name container sizes do not match.
    #[error("size mismatch: {0} vs {1}")]
    SizeMismatch(usize, usize),

    /// An element kind name outside the supported set.
    #[error("unknown element type `{0}`")]
    UnknownType(String),

    /// An operation name outside the registry.
    #[error("unknown operation `{0}`")]
    UnknownOperation(String),

    /// Operand kinds disagree after promotion, or a cast would lose information.
    #[error("type mismatch: {0} vs {1}")]
    TypeMismatch(ElementKind, ElementKind),

    /// Squeezing an axis whose size is not 1.
    #[error("cannot squeeze axis {axis} of size {size}")]
    NonUnitAxis { axis: usize, size: usize },

    /// Invalid axis index for the given array rank.
    #[error("invalid axis {axis} for rank {rank}")]
    InvalidAxis { axis: usize, rank: usize },

    /// A selected position lies outside its axis.
    #[error("index {index} out of bounds for axis {axis} of size {len}")]
    IndexOutOfBounds { axis: usize, index: usize, len: usize },

    /// A strided view was requested for a selection that is not a regular range.
    #[error("selection on axis {axis} is not a regular range")]
    NotStridable { axis: usize },

    /// An operation received an argument of the wrong form.
    #[error("`{op}` expects {expected}")]
    InvalidArgument {
        op: &'static str,
        expected: &'static str,
    },

    /// Zero step is not allowed for a strided range.
    #[error("invalid step 0 for axis {dim}")]
    ZeroStride { dim: usize },

    /// Stride array length doesn't match dimensions.
    #[error("stride and dims length mismatch")]
    StrideLengthMismatch,

    /// A view would address memory outside its backing storage.
    #[error("offset overflow while computing view bounds")]
    OffsetOverflow,

    /// Integer arithmetic left the range of the integer element kind.
    #[error("integer overflow")]
    IntegerOverflow,

    /// Reducing an empty slice with an operation that has no identity.
    #[error("cannot compute `{op}` of an empty integer slice")]
    EmptyReduction { op: &'static str },

    /// The element count of a shape does not fit in `usize`.
    #[error("element count of shape {0:?} overflows usize")]
    ShapeOverflow(Vec<usize>),

    /// Rank exceeds [`MAX_RANK`].
    #[error("rank {0} exceeds MAX_RANK")]
    RankTooLarge(usize),
}

/// Result type for array operations.
pub type Result<T> = std::result::Result<T, ArrayError>;
