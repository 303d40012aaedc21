//! Configuration-time error taxonomy.
//!
//! Only the driver boundary reports errors; the per-tile transform routines
//! trust their caller and have no error channel.

use thiserror::Error;

/// Errors detected when configuring or invoking a [`crate::conv::WinogradConv2d`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("input-channel mismatch: weights expect {kernel_channels}, input tensor has {input_channels}")]
    ChannelMismatch {
        kernel_channels: usize,
        input_channels: usize,
    },

    #[error("unsupported kernel size {n_rows}x{n_cols}: only 3x3 is supported")]
    UnsupportedKernelSize { n_rows: usize, n_cols: usize },

    #[error("{name} shape has a zero extent")]
    EmptyShape { name: &'static str },

    #[error("input of {n_rows}x{n_cols} is smaller than the 3x3 kernel under VALID padding")]
    InputTooSmall { n_rows: usize, n_cols: usize },

    #[error("{name} buffer too small: need {required} elements, got {actual}")]
    BufferTooSmall {
        name: &'static str,
        required: usize,
        actual: usize,
    },

    #[error("execute() called before transform_weights()")]
    WeightsNotReady,
}
