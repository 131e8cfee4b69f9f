//! Debug assertion macros for lifecycle and drain invariants.
//!
//! Only active in debug builds; release builds compile them away.

// =============================================================================
// Finalization is only reachable from a pending end or abort
// =============================================================================

/// Assert that `finalize` was not called while the source is still accepting pushes.
///
/// **Invariant**: `finalize(reason) → state ∈ {EndRequested, AbortRequested, Finished}`
///
/// Used in: `Lifecycle::finalize()`
macro_rules! debug_assert_finalize_reachable {
    ($state:expr) => {
        debug_assert!(
            !matches!($state, $crate::state::State::Normal),
            "finalize called on a source that was never asked to end or abort"
        )
    };
}
pub(crate) use debug_assert_finalize_reachable;

// =============================================================================
// A finished source keeps a single terminal reason
// =============================================================================

/// Assert that a repeated finalization carries the reason already recorded.
///
/// **Invariant**: `Finished(a) ∧ finalize(b) → a == b`
///
/// Used in: `Lifecycle::finalize()`
macro_rules! debug_assert_same_reason {
    ($recorded:expr, $reason:expr) => {
        debug_assert!(
            $recorded == $reason,
            "source finished with {} but was finalized again with {}",
            $recorded,
            $reason
        )
    };
}
pub(crate) use debug_assert_same_reason;

// =============================================================================
// Nothing is left behind once finished
// =============================================================================

/// Assert that no item and no reader is still owned by the source when it finishes.
///
/// **Invariant**: `Finished → buffer.is_empty() ∧ readers.is_empty()`
///
/// Used in: `Pushable` drain, right before finalizing
macro_rules! debug_assert_fully_drained {
    ($buffered:expr, $waiting:expr) => {
        debug_assert!(
            $buffered == 0 && $waiting == 0,
            "finishing with {} buffered items and {} waiting readers",
            $buffered,
            $waiting
        )
    };
}
pub(crate) use debug_assert_fully_drained;
