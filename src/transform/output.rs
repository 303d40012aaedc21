//! Output transform: GEMM results (M domain) back to NHWC spatial output.
//!
//! Applies `Aᵗ M A` with `Aᵗ = [[1,1,1,0],[0,1,−1,−1]]` as closed-form
//! add/subtract chains, adds the per-channel bias, and writes each tile's
//! 2x2 output pixels. Pixels past the true output extent (when the extent is
//! odd) are discarded, never written.

use std::ops::Range;

use crate::shape::Tensor4DShape;
use crate::storage::MatrixStrides;

/// Transform the full M-domain workspace into the spatial output tensor.
///
/// `bias` holds one value per output channel; `None` means zero bias.
pub fn execute(
    matrix: &[f32],
    strides: &MatrixStrides,
    output: &mut [f32],
    output_shape: &Tensor4DShape,
    bias: Option<&[f32]>,
    tile_rows: usize,
    tile_cols: usize,
) {
    execute_rows(
        matrix, strides, output, output_shape, bias, tile_rows, tile_cols,
        0..tile_rows,
    );
}

/// Transform a window of tile rows, identically in every batch.
///
/// Disjoint ranges write disjoint regions of `output`, so an external
/// dispatcher may partition along this axis.
#[allow(clippy::too_many_arguments)]
pub fn execute_rows(
    matrix: &[f32],
    strides: &MatrixStrides,
    output: &mut [f32],
    output_shape: &Tensor4DShape,
    bias: Option<&[f32]>,
    tile_rows: usize,
    tile_cols: usize,
    row_range: Range<usize>,
) {
    let n_channels = output_shape.n_channels;
    let out_col_stride = n_channels;
    let out_row_stride = output_shape.n_cols * out_col_stride;
    let out_batch_stride = output_shape.n_rows * out_row_stride;

    for batch in 0..output_shape.n_batches {
        for tile_i in row_range.clone() {
            for tile_j in 0..tile_cols {
                let matrix_base = batch * strides.matrix_batch_stride
                    + (tile_i * tile_cols + tile_j) * strides.matrix_row_stride;
                let out_base =
                    batch * out_batch_stride + 2 * tile_i * out_row_stride + 2 * tile_j * out_col_stride;

                // Rows/cols of this tile that lie inside the output extent.
                let valid_rows = (output_shape.n_rows - 2 * tile_i).min(2);
                let valid_cols = (output_shape.n_cols - 2 * tile_j).min(2);

                let mut remaining = n_channels;
                let mut channel = 0usize;
                while remaining >= 4 {
                    process_tile::<4>(
                        &matrix[matrix_base + channel..], strides.matrix_stride,
                        bias.map(|b| &b[channel..]),
                        output, out_base + channel, out_row_stride, out_col_stride,
                        valid_rows, valid_cols,
                    );
                    remaining -= 4;
                    channel += 4;
                }
                while remaining >= 2 {
                    process_tile::<2>(
                        &matrix[matrix_base + channel..], strides.matrix_stride,
                        bias.map(|b| &b[channel..]),
                        output, out_base + channel, out_row_stride, out_col_stride,
                        valid_rows, valid_cols,
                    );
                    remaining -= 2;
                    channel += 2;
                }
                if remaining > 0 {
                    process_tile::<1>(
                        &matrix[matrix_base + channel..], strides.matrix_stride,
                        bias.map(|b| &b[channel..]),
                        output, out_base + channel, out_row_stride, out_col_stride,
                        valid_rows, valid_cols,
                    );
                }
            }
        }
    }
}

/// Inverse-transform one tile for a block of `CHANNELS` channels and write
/// the in-bounds output pixels.
#[allow(clippy::too_many_arguments)]
fn process_tile<const CHANNELS: usize>(
    matrix: &[f32],
    matrix_stride: usize,
    bias: Option<&[f32]>,
    output: &mut [f32],
    out_base: usize,
    out_row_stride: usize,
    out_col_stride: usize,
    valid_rows: usize,
    valid_cols: usize,
) {
    // Load the 4x4 cell block for these channels.
    let mut m = [[[0.0f32; CHANNELS]; 4]; 4];
    for (i, m_row) in m.iter_mut().enumerate() {
        for (j, m_cell) in m_row.iter_mut().enumerate() {
            let base = (i * 4 + j) * matrix_stride;
            m_cell.copy_from_slice(&matrix[base..base + CHANNELS]);
        }
    }

    let mut b = [0.0f32; CHANNELS];
    if let Some(bias) = bias {
        b.copy_from_slice(&bias[..CHANNELS]);
    }

    // Aᵗ M, then (Aᵗ M) A.
    let mut tmp = [[[0.0f32; CHANNELS]; 4]; 2];
    for j in 0..4 {
        for c in 0..CHANNELS {
            tmp[0][j][c] = m[0][j][c] + m[1][j][c] + m[2][j][c];
            tmp[1][j][c] = m[1][j][c] - m[2][j][c] - m[3][j][c];
        }
    }
    let mut out = [[[0.0f32; CHANNELS]; 2]; 2];
    for i in 0..2 {
        for c in 0..CHANNELS {
            out[i][0][c] = tmp[i][0][c] + tmp[i][1][c] + tmp[i][2][c] + b[c];
            out[i][1][c] = tmp[i][1][c] - tmp[i][2][c] - tmp[i][3][c] + b[c];
        }
    }

    // Only pixels inside the true output extent are written.
    for i in 0..valid_rows {
        for j in 0..valid_cols {
            let base = out_base + i * out_row_stride + j * out_col_stride;
            output[base..base + CHANNELS].copy_from_slice(&out[i][j]);
        }
    }
}
