//! Elementwise operator dispatch.
//!
//! Every entry point resolves the result kind once, casts the operands,
//! broadcasts them to a common shape and hands monomorphized closures to the
//! strided kernel. Dimension names of the operands are merged with
//! [`common_names`].

use std::fmt;
use std::str::FromStr;

use log::debug;

use crate::array::{dispatch_array, typed, Array, ArrayData, NdArray, Stored};
use crate::dim_names::common_names;
use crate::element::ElementKind;
use crate::kernel::{map1, zip_map2, zip_map3};
use crate::shape::{broadcast_shape, broadcast_shapes, try_element_count};
use crate::view::{broadcasting_view, StridedView, ViewLayout};
use crate::{ArrayError, Result};

/// Declare a closed set of named operations with `name()`, `ALL` and `FromStr`.
macro_rules! op_registry {
    (
        $(#[$meta:meta])*
        pub enum $name:ident {
            $($(#[$vmeta:meta])* $variant:ident => $text:literal,)*
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $($(#[$vmeta])* $variant,)*
        }

        impl $name {
            /// Every operation in the registry.
            pub const ALL: &'static [$name] = &[$($name::$variant,)*];

            pub fn name(self) -> &'static str {
                match self {
                    $($name::$variant => $text,)*
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.name())
            }
        }

        impl FromStr for $name {
            type Err = ArrayError;

            fn from_str(s: &str) -> Result<Self> {
                match s {
                    $($text => Ok($name::$variant),)*
                    other => Err(ArrayError::UnknownOperation(other.to_string())),
                }
            }
        }
    };
}
pub(crate) use op_registry;

op_registry! {
    /// Binary elementwise operations.
    pub enum BinaryOp {
        Add => "add",
        Subtract => "subtract",
        Multiply => "multiply",
        Divide => "divide",
        Pow => "pow",
        Fmod => "fmod",
        Atan2 => "atan2",
        Hypot => "hypot",
        Maximum => "maximum",
        Minimum => "minimum",
        Greater => "greater",
        GreaterEqual => "greater_equal",
        Lesser => "lesser",
        LesserEqual => "lesser_equal",
        Equal => "equal",
        NotEqual => "not_equal",
        LogicalAnd => "logical_and",
        LogicalOr => "logical_or",
        LogicalXor => "logical_xor",
    }
}

op_registry! {
    /// Trinary elementwise operations.
    pub enum TrinaryOp {
        /// `clip(x, lo, hi)`
        Clip => "clip",
        /// `fma(x, y, z) = x * y + z`
        Fma => "fma",
        /// `if_else(cond, yes, no)`
        IfElse => "if_else",
    }
}

op_registry! {
    /// Unary elementwise operations.
    pub enum UnaryOp {
        Identity => "identity",
        Opposite => "opposite",
        Abs => "abs",
        Sign => "sign",
        Floor => "floor",
        Ceil => "ceil",
        Round => "round",
        Trunc => "trunc",
        Exp => "exp",
        Log => "log",
        Log2 => "log2",
        Log10 => "log10",
        Sqrt => "sqrt",
        Cbrt => "cbrt",
        Sin => "sin",
        Cos => "cos",
        Tan => "tan",
        LogicalNot => "logical_not",
        IsNan => "is_nan",
        IsFinite => "is_finite",
        IsInfinite => "is_infinite",
    }
}

op_registry! {
    /// Unary operations that take one extra argument.
    pub enum UnaryArgOp {
        /// Reverse one axis. Takes [`OpArg::Axis`].
        Flip => "flip",
        /// Permute axes. Takes [`OpArg::Permutation`].
        Transpose => "transpose",
        /// Round to a number of decimal digits. Takes [`OpArg::Digits`].
        RoundDigits => "round_digits",
    }
}

/// Extra argument of a [`UnaryArgOp`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OpArg {
    Axis(usize),
    Permutation(Vec<usize>),
    Digits(i32),
}

/// How a binary operation picks its result kind.
enum BinaryRule {
    /// Common kind, logical promoted to integer.
    Arithmetic,
    /// Always double.
    Double,
    /// Compared at the common kind, result logical.
    Compare,
    /// Operands as truth values, result logical.
    Logical,
}

impl BinaryOp {
    fn rule(self) -> BinaryRule {
        use BinaryOp::*;
        match self {
            Add | Subtract | Multiply | Maximum | Minimum => BinaryRule::Arithmetic,
            Divide | Pow | Fmod | Atan2 | Hypot => BinaryRule::Double,
            Greater | GreaterEqual | Lesser | LesserEqual | Equal | NotEqual => {
                BinaryRule::Compare
            }
            LogicalAnd | LogicalOr | LogicalXor => BinaryRule::Logical,
        }
    }

    /// Element kind of the result for operands of kinds `x` and `y`.
    pub fn result_kind(self, x: ElementKind, y: ElementKind) -> ElementKind {
        match self.rule() {
            BinaryRule::Arithmetic => x.promote(y).arithmetic(),
            BinaryRule::Double => ElementKind::Double,
            BinaryRule::Compare | BinaryRule::Logical => ElementKind::Logical,
        }
    }
}

// ============================================================================
// Helpers
// ============================================================================

fn broadcast_to<'a, T>(array: &'a NdArray<T>, dims: &[usize]) -> Result<StridedView<'a, T>> {
    broadcasting_view(array, dims.len())?.broadcast(dims)
}

fn zip2<A, B, U, F>(a: &NdArray<A>, b: &NdArray<B>, dims: &[usize], f: F) -> Result<NdArray<U>>
where
    A: Copy,
    B: Copy,
    F: FnMut(A, B) -> Result<U>,
{
    try_element_count(dims)?;
    let out = zip_map2(&broadcast_to(a, dims)?, &broadcast_to(b, dims)?, f)?;
    NdArray::from_vec(out, dims)
}

fn zip3<A, B, C, U, F>(
    a: &NdArray<A>,
    b: &NdArray<B>,
    c: &NdArray<C>,
    dims: &[usize],
    f: F,
) -> Result<NdArray<U>>
where
    A: Copy,
    B: Copy,
    C: Copy,
    F: FnMut(A, B, C) -> Result<U>,
{
    try_element_count(dims)?;
    let out = zip_map3(
        &broadcast_to(a, dims)?,
        &broadcast_to(b, dims)?,
        &broadcast_to(c, dims)?,
        f,
    )?;
    NdArray::from_vec(out, dims)
}

#[inline]
pub(crate) fn narrow(v: i64) -> Result<i32> {
    i32::try_from(v).map_err(|_| ArrayError::IntegerOverflow)
}

#[inline]
pub(crate) fn nan_max(a: f64, b: f64) -> f64 {
    if a.is_nan() || b.is_nan() {
        f64::NAN
    } else {
        a.max(b)
    }
}

#[inline]
pub(crate) fn nan_min(a: f64, b: f64) -> f64 {
    if a.is_nan() || b.is_nan() {
        f64::NAN
    } else {
        a.min(b)
    }
}

// ============================================================================
// Binary
// ============================================================================

/// Apply a binary operation with broadcasting.
///
/// # Errors
/// - [`ArrayError::IncompatibleShape`] if the shapes do not broadcast
/// - [`ArrayError::IntegerOverflow`] if an integer result leaves `i32`
pub fn binary_op(op: BinaryOp, x: &Array, y: &Array) -> Result<Array> {
    let dims = broadcast_shape(x.dims(), y.dims())?;
    let kind = op.result_kind(x.kind(), y.kind());
    debug!(
        "binary_op {}: {} {:?}, {} {:?} -> {} {:?}",
        op,
        x.kind(),
        x.dims(),
        y.kind(),
        y.dims(),
        kind,
        dims
    );
    let names = common_names(&[x.dim_names(), y.dim_names()], &dims)?;
    let data = match op.rule() {
        BinaryRule::Arithmetic => binary_arithmetic(op, kind, x.data(), y.data(), &dims)?,
        BinaryRule::Double => binary_double(op, x.data(), y.data(), &dims)?,
        BinaryRule::Compare => binary_compare(op, x.data(), y.data(), &dims)?,
        BinaryRule::Logical => binary_logical(op, x.data(), y.data(), &dims)?,
    };
    Ok(Array::from_parts(data, names))
}

fn binary_arithmetic(
    op: BinaryOp,
    kind: ElementKind,
    x: &ArrayData,
    y: &ArrayData,
    dims: &[usize],
) -> Result<ArrayData> {
    let xc = x.cast(kind)?;
    let yc = y.cast(kind)?;
    match kind {
        ElementKind::Double => {
            let f: fn(f64, f64) -> f64 = match op {
                BinaryOp::Add => |a, b| a + b,
                BinaryOp::Subtract => |a, b| a - b,
                BinaryOp::Multiply => |a, b| a * b,
                BinaryOp::Maximum => nan_max,
                BinaryOp::Minimum => nan_min,
                _ => return Err(ArrayError::UnknownOperation(op.name().to_string())),
            };
            let out = zip2(typed::<f64>(&xc)?, typed::<f64>(&yc)?, dims, |a, b| Ok(f(a, b)))?;
            Ok(ArrayData::Double(out))
        }
        _ => {
            let f: fn(i64, i64) -> Option<i64> = match op {
                BinaryOp::Add => i64::checked_add,
                BinaryOp::Subtract => i64::checked_sub,
                BinaryOp::Multiply => i64::checked_mul,
                BinaryOp::Maximum => |a, b| Some(a.max(b)),
                BinaryOp::Minimum => |a, b| Some(a.min(b)),
                _ => return Err(ArrayError::UnknownOperation(op.name().to_string())),
            };
            let out = zip2(typed::<i32>(&xc)?, typed::<i32>(&yc)?, dims, |a, b| {
                f(a as i64, b as i64)
                    .ok_or(ArrayError::IntegerOverflow)
                    .and_then(narrow)
            })?;
            Ok(ArrayData::Integer(out))
        }
    }
}

fn binary_double(op: BinaryOp, x: &ArrayData, y: &ArrayData, dims: &[usize]) -> Result<ArrayData> {
    let f: fn(f64, f64) -> f64 = match op {
        BinaryOp::Divide => |a, b| a / b,
        BinaryOp::Pow => f64::powf,
        BinaryOp::Fmod => |a, b| a % b,
        BinaryOp::Atan2 => f64::atan2,
        BinaryOp::Hypot => f64::hypot,
        _ => return Err(ArrayError::UnknownOperation(op.name().to_string())),
    };
    let xc = x.cast(ElementKind::Double)?;
    let yc = y.cast(ElementKind::Double)?;
    let out = zip2(typed::<f64>(&xc)?, typed::<f64>(&yc)?, dims, |a, b| Ok(f(a, b)))?;
    Ok(ArrayData::Double(out))
}

fn comparator<T: PartialOrd>(op: BinaryOp) -> Result<fn(&T, &T) -> bool> {
    let f: fn(&T, &T) -> bool = match op {
        BinaryOp::Greater => PartialOrd::gt,
        BinaryOp::GreaterEqual => PartialOrd::ge,
        BinaryOp::Lesser => PartialOrd::lt,
        BinaryOp::LesserEqual => PartialOrd::le,
        BinaryOp::Equal => PartialEq::eq,
        BinaryOp::NotEqual => PartialEq::ne,
        _ => return Err(ArrayError::UnknownOperation(op.name().to_string())),
    };
    Ok(f)
}

fn compare_typed<T: Stored>(
    op: BinaryOp,
    x: &ArrayData,
    y: &ArrayData,
    dims: &[usize],
) -> Result<NdArray<bool>> {
    let f = comparator::<T>(op)?;
    zip2(typed::<T>(x)?, typed::<T>(y)?, dims, |a, b| Ok(f(&a, &b)))
}

fn binary_compare(op: BinaryOp, x: &ArrayData, y: &ArrayData, dims: &[usize]) -> Result<ArrayData> {
    let kind = x.kind().promote(y.kind());
    let xc = x.cast(kind)?;
    let yc = y.cast(kind)?;
    let out = match kind {
        ElementKind::Logical => compare_typed::<bool>(op, &xc, &yc, dims)?,
        ElementKind::Integer => compare_typed::<i32>(op, &xc, &yc, dims)?,
        ElementKind::Double => compare_typed::<f64>(op, &xc, &yc, dims)?,
    };
    Ok(ArrayData::Logical(out))
}

fn binary_logical(op: BinaryOp, x: &ArrayData, y: &ArrayData, dims: &[usize]) -> Result<ArrayData> {
    let f: fn(bool, bool) -> bool = match op {
        BinaryOp::LogicalAnd => |a, b| a && b,
        BinaryOp::LogicalOr => |a, b| a || b,
        BinaryOp::LogicalXor => |a, b| a != b,
        _ => return Err(ArrayError::UnknownOperation(op.name().to_string())),
    };
    let xl = x.to_logical();
    let yl = y.to_logical();
    let out = zip2(xl.as_ref(), yl.as_ref(), dims, |a, b| Ok(f(a, b)))?;
    Ok(ArrayData::Logical(out))
}

// ============================================================================
// Trinary
// ============================================================================

/// Apply a trinary operation with broadcasting across all three operands.
///
/// For [`TrinaryOp::IfElse`] the first operand is read as truth values and the
/// result has the common kind of the other two.
pub fn trinary_op(op: TrinaryOp, x: &Array, y: &Array, z: &Array) -> Result<Array> {
    let dims = broadcast_shapes(&[x.dims(), y.dims(), z.dims()])?;
    let names = common_names(&[x.dim_names(), y.dim_names(), z.dim_names()], &dims)?;
    let data = match op {
        TrinaryOp::Clip | TrinaryOp::Fma => {
            let kind = x.kind().promote(y.kind()).promote(z.kind()).arithmetic();
            debug!("trinary_op {}: -> {} {:?}", op, kind, dims);
            let xc = x.data().cast(kind)?;
            let yc = y.data().cast(kind)?;
            let zc = z.data().cast(kind)?;
            match (op, kind) {
                (TrinaryOp::Clip, ElementKind::Double) => {
                    ArrayData::Double(clip_typed::<f64>(&xc, &yc, &zc, &dims)?)
                }
                (TrinaryOp::Clip, _) => {
                    ArrayData::Integer(clip_typed::<i32>(&xc, &yc, &zc, &dims)?)
                }
                (_, ElementKind::Double) => ArrayData::Double(zip3(
                    typed::<f64>(&xc)?,
                    typed::<f64>(&yc)?,
                    typed::<f64>(&zc)?,
                    &dims,
                    |a, b, c| Ok(a.mul_add(b, c)),
                )?),
                _ => ArrayData::Integer(zip3(
                    typed::<i32>(&xc)?,
                    typed::<i32>(&yc)?,
                    typed::<i32>(&zc)?,
                    &dims,
                    |a, b, c| narrow(a as i64 * b as i64 + c as i64),
                )?),
            }
        }
        TrinaryOp::IfElse => {
            let kind = y.kind().promote(z.kind());
            debug!("trinary_op {}: -> {} {:?}", op, kind, dims);
            let cond = x.data().to_logical();
            let (yc, zc) = (y.data().cast(kind)?, z.data().cast(kind)?);
            match kind {
                ElementKind::Logical => {
                    ArrayData::Logical(if_else_typed::<bool>(&cond, &yc, &zc, &dims)?)
                }
                ElementKind::Integer => {
                    ArrayData::Integer(if_else_typed::<i32>(&cond, &yc, &zc, &dims)?)
                }
                ElementKind::Double => {
                    ArrayData::Double(if_else_typed::<f64>(&cond, &yc, &zc, &dims)?)
                }
            }
        }
    };
    Ok(Array::from_parts(data, names))
}

fn clip_typed<T: Stored>(
    x: &ArrayData,
    lo: &ArrayData,
    hi: &ArrayData,
    dims: &[usize],
) -> Result<NdArray<T>> {
    zip3(typed::<T>(x)?, typed::<T>(lo)?, typed::<T>(hi)?, dims, |v, lo, hi| {
        Ok(if v < lo {
            lo
        } else if v > hi {
            hi
        } else {
            v
        })
    })
}

fn if_else_typed<T: Stored>(
    cond: &NdArray<bool>,
    yes: &ArrayData,
    no: &ArrayData,
    dims: &[usize],
) -> Result<NdArray<T>> {
    zip3(cond, typed::<T>(yes)?, typed::<T>(no)?, dims, |c, a, b| {
        Ok(if c { a } else { b })
    })
}

// ============================================================================
// Unary
// ============================================================================

fn double_unary(op: UnaryOp) -> Option<fn(f64) -> f64> {
    let f: fn(f64) -> f64 = match op {
        UnaryOp::Exp => f64::exp,
        UnaryOp::Log => f64::ln,
        UnaryOp::Log2 => f64::log2,
        UnaryOp::Log10 => f64::log10,
        UnaryOp::Sqrt => f64::sqrt,
        UnaryOp::Cbrt => f64::cbrt,
        UnaryOp::Sin => f64::sin,
        UnaryOp::Cos => f64::cos,
        UnaryOp::Tan => f64::tan,
        _ => return None,
    };
    Some(f)
}

fn sign_f64(v: f64) -> f64 {
    if v.is_nan() || v == 0.0 {
        v
    } else {
        v.signum()
    }
}

/// Apply a unary operation. Dimension names are preserved.
pub fn unary_op(op: UnaryOp, x: &Array) -> Result<Array> {
    debug!("unary_op {}: {} {:?}", op, x.kind(), x.dims());
    let data = match op {
        UnaryOp::Identity
        | UnaryOp::Opposite
        | UnaryOp::Abs
        | UnaryOp::Sign
        | UnaryOp::Floor
        | UnaryOp::Ceil
        | UnaryOp::Round
        | UnaryOp::Trunc => {
            let kind = x.kind().arithmetic();
            let xc = x.data().cast(kind)?;
            match kind {
                ElementKind::Double => {
                    let f: fn(f64) -> f64 = match op {
                        UnaryOp::Opposite => |v| -v,
                        UnaryOp::Abs => f64::abs,
                        UnaryOp::Sign => sign_f64,
                        UnaryOp::Floor => f64::floor,
                        UnaryOp::Ceil => f64::ceil,
                        UnaryOp::Round => f64::round,
                        UnaryOp::Trunc => f64::trunc,
                        _ => |v| v,
                    };
                    ArrayData::Double(typed::<f64>(&xc)?.map(f))
                }
                _ => {
                    let f: fn(i32) -> Option<i32> = match op {
                        UnaryOp::Opposite => i32::checked_neg,
                        UnaryOp::Abs => i32::checked_abs,
                        UnaryOp::Sign => |v| Some(v.signum()),
                        _ => Some,
                    };
                    ArrayData::Integer(
                        typed::<i32>(&xc)?.try_map(|v| f(v).ok_or(ArrayError::IntegerOverflow))?,
                    )
                }
            }
        }
        UnaryOp::LogicalNot => ArrayData::Logical(x.data().to_logical().map(|b| !b)),
        UnaryOp::IsNan | UnaryOp::IsFinite | UnaryOp::IsInfinite => {
            let f: fn(f64) -> bool = match op {
                UnaryOp::IsNan => f64::is_nan,
                UnaryOp::IsFinite => f64::is_finite,
                _ => f64::is_infinite,
            };
            let xc = x.data().cast(ElementKind::Double)?;
            ArrayData::Logical(typed::<f64>(&xc)?.map(f))
        }
        _ => {
            let f = double_unary(op)
                .ok_or_else(|| ArrayError::UnknownOperation(op.name().to_string()))?;
            let xc = x.data().cast(ElementKind::Double)?;
            ArrayData::Double(typed::<f64>(&xc)?.map(f))
        }
    };
    Ok(Array::from_parts(data, x.dim_names().clone()))
}

// ============================================================================
// Unary with one argument
// ============================================================================

fn materialize<T: Stored>(view: &StridedView<'_, T>) -> Result<ArrayData> {
    let out = map1(view, Ok)?;
    Ok(T::wrap(NdArray::from_vec(out, view.dims())?))
}

fn flip_data<T: Stored>(array: &NdArray<T>, axis: usize) -> Result<ArrayData> {
    materialize(&broadcasting_view(array, array.ndim())?.reverse_axis(axis)?)
}

fn transpose_data<T: Stored>(array: &NdArray<T>, perm: &[usize]) -> Result<ArrayData> {
    materialize(&broadcasting_view(array, array.ndim())?.permute(perm)?)
}

/// Apply a unary operation that takes one extra argument.
///
/// # Errors
/// - [`ArrayError::InvalidArgument`] if `arg` is the wrong form for `op`
/// - [`ArrayError::InvalidAxis`] for an out-of-range axis or a bad permutation
pub fn unary_op_one_arg(op: UnaryArgOp, x: &Array, arg: &OpArg) -> Result<Array> {
    debug!("unary_op_one_arg {}({:?}): {} {:?}", op, arg, x.kind(), x.dims());
    match (op, arg) {
        (UnaryArgOp::Flip, OpArg::Axis(axis)) => {
            let axis = *axis;
            let data = dispatch_array!(x.data(), a => flip_data(a, axis))?;
            Ok(Array::from_parts(data, x.dim_names().reverse_axis(axis)))
        }
        (UnaryArgOp::Transpose, OpArg::Permutation(perm)) => {
            let data = dispatch_array!(x.data(), a => transpose_data(a, perm))?;
            Ok(Array::from_parts(data, x.dim_names().permute(perm)))
        }
        (UnaryArgOp::RoundDigits, OpArg::Digits(digits)) => {
            let scale = 10f64.powi(*digits);
            let xc = x.data().cast(ElementKind::Double)?;
            let out = typed::<f64>(&xc)?.map(|v| {
                let scaled = v * scale;
                if scaled.is_finite() {
                    scaled.round() / scale
                } else {
                    v
                }
            });
            Ok(Array::from_parts(ArrayData::Double(out), x.dim_names().clone()))
        }
        (UnaryArgOp::Flip, _) => Err(ArrayError::InvalidArgument {
            op: op.name(),
            expected: "an axis",
        }),
        (UnaryArgOp::Transpose, _) => Err(ArrayError::InvalidArgument {
            op: op.name(),
            expected: "a permutation",
        }),
        (UnaryArgOp::RoundDigits, _) => Err(ArrayError::InvalidArgument {
            op: op.name(),
            expected: "a digit count",
        }),
    }
}
