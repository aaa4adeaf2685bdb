use num_traits::Float;

use alloc::vec::Vec;

/// Returns the index of the position closest to `target` in an ascending sequence
///
/// Bisects `[0, len - 1]` until the bounds are adjacent, then compares the distance of both
/// candidates. The lower candidate wins only when the upper one is strictly farther, so an
/// exact tie resolves to the upper index.
///
/// # Arguments
///
/// * `len` - Number of positions
/// * `at` - Accessor returning the key at a position
/// * `target` - The key to look for
///
/// # Returns
///
/// * `Option<usize>` - The nearest position, or `None` if `len` is zero
#[inline]
pub fn nearest_index<T: Float>(len: usize, at: impl Fn(usize) -> T, target: T) -> Option<usize> {
    if len == 0 {
        return None;
    }

    let (mut lo, mut hi) = (0, len - 1);
    loop {
        let mid = lo + (hi - lo) / 2;
        if mid == lo {
            let below = (at(lo) - target).abs();
            let above = (at(hi) - target).abs();
            return Some(if above > below { lo } else { hi });
        }

        let key = at(mid);
        if target < key {
            hi = mid;
        } else if target > key {
            lo = mid;
        } else {
            return Some(mid);
        }
    }
}

/// Returns the Euclidean norm of the element-wise difference of two sequences
///
/// # Arguments
///
/// * `a` - The first sequence
/// * `b` - The second sequence
///
/// # Returns
///
/// * `Option<T>` - The distance, or `None` if the lengths differ
#[inline]
pub fn euclidean<T: Float>(a: &[T], b: &[T]) -> Option<T> {
    if a.len() != b.len() {
        return None;
    }
    let sum = a
        .iter()
        .zip(b)
        .map(|(&x, &y)| (y - x) * (y - x))
        .fold(T::zero(), |acc, sq| acc + sq);
    Some(sum.sqrt())
}

/// Scales values to `(v - center) / scale`
#[inline]
pub fn z_normalize<T: Float>(values: impl Iterator<Item = T>, center: T, scale: T) -> Vec<T> {
    values.map(|v| (v - center) / scale).collect()
}

/// Returns the smallest value, ignoring NaN; `+inf` for an empty sequence
#[inline]
pub fn min_of<T: Float>(values: impl Iterator<Item = T>) -> T {
    values.fold(T::infinity(), T::min)
}

/// Returns the largest value, ignoring NaN; `-inf` for an empty sequence
#[inline]
pub fn max_of<T: Float>(values: impl Iterator<Item = T>) -> T {
    values.fold(T::neg_infinity(), T::max)
}
