//! Storage-size and stride arithmetic for the three Winograd-domain buffers.
//!
//! The producer of each buffer and its consumer (the batched GEMM) must agree
//! exactly on these strides; every offset used by the transforms is derived
//! from the functions here rather than re-computed at call sites.

use crate::shape::{output_shape, tile_grid, KernelShape, PaddingType, Tensor4DShape, N_GEMMS};

/// Elements required for the transformed-weights (U) buffer.
pub fn weight_storage_size(n_output_channels: usize, n_input_channels: usize) -> usize {
    N_GEMMS * n_output_channels * n_input_channels
}

/// Elements required for the transformed-input (V) buffer.
pub fn input_storage_size(
    n_batches: usize,
    n_channels: usize,
    n_rows: usize,
    n_cols: usize,
    same_padding: bool,
) -> usize {
    // Tile counts are derived from the output extent implied by the padding.
    let (out_rows, out_cols) = if same_padding {
        (n_rows, n_cols)
    } else {
        (n_rows - 2, n_cols - 2)
    };
    let (tile_rows, tile_cols) = tile_grid(out_rows, out_cols);
    N_GEMMS * n_batches * tile_rows * tile_cols * n_channels
}

/// Elements required for the GEMM-output (M) workspace.
///
/// `n_rows`/`n_cols` are the *input* spatial extents; the output extent is
/// derived from the padding mode, mirroring [`input_storage_size`].
pub fn output_storage_size(
    n_batches: usize,
    n_rows: usize,
    n_cols: usize,
    n_output_channels: usize,
    same_padding: bool,
) -> usize {
    let (out_rows, out_cols) = if same_padding {
        (n_rows, n_cols)
    } else {
        (n_rows - 2, n_cols - 2)
    };
    let (tile_rows, tile_cols) = tile_grid(out_rows, out_cols);
    N_GEMMS * n_batches * tile_rows * tile_cols * n_output_channels
}

/// The three strides describing a Winograd-domain buffer layout.
///
/// Cells are laid out as `N_GEMMS` consecutive slabs of `matrix_stride`
/// elements. Within a slab, one row of `matrix_row_stride` contiguous
/// channels per tile, tiles in row-major `(tile_row, tile_col)` order, and
/// batches separated by `matrix_batch_stride`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatrixStrides {
    pub matrix_stride: usize,
    pub matrix_row_stride: usize,
    pub matrix_batch_stride: usize,
}

impl MatrixStrides {
    /// Strides of the transformed-input (V) buffer.
    pub fn for_input(
        kernel_shape: &KernelShape,
        input_shape: &Tensor4DShape,
        padding: PaddingType,
    ) -> Self {
        let out = output_shape(kernel_shape, input_shape, padding);
        let (tile_rows, tile_cols) = tile_grid(out.n_rows, out.n_cols);
        let k = kernel_shape.n_input_channels;
        MatrixStrides {
            matrix_stride: input_shape.n_batches * tile_rows * tile_cols * k,
            matrix_row_stride: k,
            matrix_batch_stride: tile_rows * tile_cols * k,
        }
    }

    /// Strides of the GEMM-output (M) workspace.
    pub fn for_output(
        kernel_shape: &KernelShape,
        input_shape: &Tensor4DShape,
        padding: PaddingType,
    ) -> Self {
        let out = output_shape(kernel_shape, input_shape, padding);
        let (tile_rows, tile_cols) = tile_grid(out.n_rows, out.n_cols);
        let n = kernel_shape.n_output_channels;
        MatrixStrides {
            matrix_stride: input_shape.n_batches * tile_rows * tile_cols * n,
            matrix_row_stride: n,
            matrix_batch_stride: tile_rows * tile_cols * n,
        }
    }

    /// Strides of the transformed-weights (U) buffer. One row per input
    /// channel, output channel contiguous; batches do not apply.
    pub fn for_weights(kernel_shape: &KernelShape) -> Self {
        MatrixStrides {
            matrix_stride: kernel_shape.n_input_channels * kernel_shape.n_output_channels,
            matrix_row_stride: kernel_shape.n_output_channels,
            matrix_batch_stride: 0,
        }
    }

    /// Flat offset of `(batch, tile_row, tile_col, cell, channel)` in a V or
    /// M buffer described by these strides.
    pub fn tile_offset(
        &self,
        batch: usize,
        tile_row: usize,
        tile_col: usize,
        tile_cols: usize,
        cell: usize,
        channel: usize,
    ) -> usize {
        cell * self.matrix_stride
            + batch * self.matrix_batch_stride
            + (tile_row * tile_cols + tile_col) * self.matrix_row_stride
            + channel
    }

    /// Flat offset of `(cell, input_channel, output_channel)` in a U buffer
    /// described by these strides.
    pub fn weight_offset(&self, cell: usize, input_channel: usize, output_channel: usize) -> usize {
        cell * self.matrix_stride + input_channel * self.matrix_row_stride + output_channel
    }
}
