//! The three Winograd transform stages.
//!
//! Each stage is a set of free functions over caller-provided flat slices;
//! none of them validates its inputs or allocates. The driver in
//! [`crate::conv`] performs the one-time checks and owns the stride
//! arithmetic that ties the stages together.

pub mod input;
pub mod input_channelwise;
pub mod output;
pub mod weights;

/// Traversal strategy for the input transform.
///
/// Both strategies write identical values; tensor-at-a-time reuses half of
/// the per-tile intermediate across a row of tiles and is the default.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputTransformStrategy {
    /// Row-of-tiles traversal with cross-tile intermediate reuse.
    TensorAtATime,
    /// Tile-at-a-time traversal, no cross-tile state.
    Channelwise,
}

pub use weights::transform_weights;
