//! Tensor-at-a-time input transform.
//!
//! Processes one row of tiles at a time, applying `Bᵗ x B` to each 4x4 input
//! patch as closed-form add/subtract chains. The padding decomposition picks
//! one specialised routine per (tile-row class, tile-column class): the first
//! tile row absorbs the top padding, the last absorbs the bottom padding, and
//! symmetrically for columns within [`process_tile_row`]. Horizontally
//! adjacent tiles overlap by two input columns, so the rightmost two columns
//! of the `Xᵗx` intermediate are carried over instead of recomputed.
//!
//! Channel blocks are processed 4, then 2, then 1 at a time; the block width
//! only changes vectorisation, never the values written.

use std::ops::Range;

use crate::shape::{PaddingType, Tensor4DShape};
use crate::storage::MatrixStrides;

/// Row-of-tiles routine, specialised per padding case and channel width.
type RowFn = fn(
    usize,      // number of tiles in the row
    &[f32],     // input, positioned at the row's first loadable element
    usize,      // input row stride
    usize,      // input col stride
    &mut [f32], // matrix, positioned at the row's first tile and channel
    usize,      // matrix stride (between the 16 cells)
    usize,      // matrix row stride (between tiles)
);

/// Whole-tensor routine, specialised per (padding mode, residual padding).
type TensorFn = fn(
    Range<usize>, // tile rows to process
    usize,        // total tile rows
    usize,        // tile cols
    usize,        // channels
    &[f32],       // input, positioned at the batch base
    usize,        // input row stride
    usize,        // input col stride
    &mut [f32],   // matrix, positioned at the batch base
    usize,        // matrix stride
    usize,        // matrix row stride
);

/// Transform a full input tensor into the Winograd domain.
pub fn execute(
    input: &[f32],
    input_shape: &Tensor4DShape,
    padding: PaddingType,
    tile_rows: usize,
    tile_cols: usize,
    matrix: &mut [f32],
    strides: &MatrixStrides,
) {
    execute_rows(
        input, input_shape, padding, tile_rows, tile_cols, matrix, strides,
        0..tile_rows,
    );
}

/// Transform a window of tile rows, identically in every batch.
///
/// Callers partitioning work across threads must pass disjoint ranges; each
/// range writes a disjoint set of tile slots in `matrix`.
#[allow(clippy::too_many_arguments)]
pub fn execute_rows(
    input: &[f32],
    input_shape: &Tensor4DShape,
    padding: PaddingType,
    tile_rows: usize,
    tile_cols: usize,
    matrix: &mut [f32],
    strides: &MatrixStrides,
    row_range: Range<usize>,
) {
    // Residual padding on the far edges, determined by mode and parity.
    let process: TensorFn = match padding {
        PaddingType::Valid => {
            match (input_shape.n_rows % 2, input_shape.n_cols % 2) {
                (0, 0) => process_tile_tensor::<false, 0, 0>,
                (0, 1) => process_tile_tensor::<false, 0, 1>,
                (1, 0) => process_tile_tensor::<false, 1, 0>,
                (1, 1) => process_tile_tensor::<false, 1, 1>,
                _ => unreachable!("uncovered VALID padding case"),
            }
        }
        PaddingType::Same => {
            match (1 + input_shape.n_rows % 2, 1 + input_shape.n_cols % 2) {
                (1, 1) => process_tile_tensor::<true, 1, 1>,
                (1, 2) => process_tile_tensor::<true, 1, 2>,
                (2, 1) => process_tile_tensor::<true, 2, 1>,
                (2, 2) => process_tile_tensor::<true, 2, 2>,
                _ => unreachable!("uncovered SAME padding case"),
            }
        }
    };

    let input_col_stride = input_shape.n_channels;
    let input_row_stride = input_shape.n_cols * input_col_stride;
    let batch_size = input_shape.n_rows * input_row_stride;

    for batch in 0..input_shape.n_batches {
        process(
            row_range.clone(),
            tile_rows,
            tile_cols,
            input_shape.n_channels,
            &input[batch * batch_size..],
            input_row_stride,
            input_col_stride,
            &mut matrix[batch * strides.matrix_batch_stride..],
            strides.matrix_stride,
            strides.matrix_row_stride,
        );
    }
}

/// Process the requested tile rows of one batch.
///
/// `SAME` selects the padding mode; `PAD_BOTTOM`/`PAD_RIGHT` are the residual
/// padding on the far edges. Each row class gets a table of routines indexed
/// by channel-block width {1, 2, 4}.
#[allow(clippy::too_many_arguments)]
fn process_tile_tensor<const SAME: bool, const PAD_BOTTOM: usize, const PAD_RIGHT: usize>(
    row_range: Range<usize>,
    tile_rows: usize,
    tile_cols: usize,
    n_channels: usize,
    input: &[f32],
    input_row_stride: usize,
    input_col_stride: usize,
    matrix: &mut [f32],
    matrix_stride: usize,
    matrix_row_stride: usize,
) {
    let top_row: [RowFn; 3] = if SAME {
        [
            process_tile_row::<1, 1, 0, PAD_RIGHT, 1>,
            process_tile_row::<1, 1, 0, PAD_RIGHT, 2>,
            process_tile_row::<1, 1, 0, PAD_RIGHT, 4>,
        ]
    } else {
        [
            process_tile_row::<0, 0, 0, PAD_RIGHT, 1>,
            process_tile_row::<0, 0, 0, PAD_RIGHT, 2>,
            process_tile_row::<0, 0, 0, PAD_RIGHT, 4>,
        ]
    };
    let middle_row: [RowFn; 3] = if SAME {
        [
            process_tile_row::<0, 1, 0, PAD_RIGHT, 1>,
            process_tile_row::<0, 1, 0, PAD_RIGHT, 2>,
            process_tile_row::<0, 1, 0, PAD_RIGHT, 4>,
        ]
    } else {
        top_row
    };
    let bottom_row: [RowFn; 3] = if SAME {
        [
            process_tile_row::<0, 1, PAD_BOTTOM, PAD_RIGHT, 1>,
            process_tile_row::<0, 1, PAD_BOTTOM, PAD_RIGHT, 2>,
            process_tile_row::<0, 1, PAD_BOTTOM, PAD_RIGHT, 4>,
        ]
    } else {
        [
            process_tile_row::<0, 0, PAD_BOTTOM, PAD_RIGHT, 1>,
            process_tile_row::<0, 0, PAD_BOTTOM, PAD_RIGHT, 2>,
            process_tile_row::<0, 0, PAD_BOTTOM, PAD_RIGHT, 4>,
        ]
    };
    // A single row of tiles takes both the top and bottom padding.
    let single_row: [RowFn; 3] = if SAME {
        [
            process_tile_row::<1, 1, PAD_BOTTOM, PAD_RIGHT, 1>,
            process_tile_row::<1, 1, PAD_BOTTOM, PAD_RIGHT, 2>,
            process_tile_row::<1, 1, PAD_BOTTOM, PAD_RIGHT, 4>,
        ]
    } else {
        bottom_row
    };

    // Input row at which a tile row's loads begin. Under SAME padding every
    // row of tiles after the first starts one input row earlier than 2*i.
    let row_base = |tile_i: usize| -> usize {
        if SAME && tile_i > 0 {
            2 * tile_i - 1
        } else {
            2 * tile_i
        }
    };

    for tile_i in row_range {
        let fns = if tile_rows == 1 {
            &single_row
        } else if tile_i == 0 {
            &top_row
        } else if tile_i == tile_rows - 1 {
            &bottom_row
        } else {
            &middle_row
        };

        let in_base = row_base(tile_i) * input_row_stride;
        let m_base = tile_i * tile_cols * matrix_row_stride;

        // Cover the channels with 4-wide, then 2-wide, then 1-wide blocks.
        let mut remaining = n_channels;
        let mut channel = 0usize;
        while remaining >= 4 {
            fns[2](
                tile_cols,
                &input[in_base + channel..],
                input_row_stride,
                input_col_stride,
                &mut matrix[m_base + channel..],
                matrix_stride,
                matrix_row_stride,
            );
            remaining -= 4;
            channel += 4;
        }
        while remaining >= 2 {
            fns[1](
                tile_cols,
                &input[in_base + channel..],
                input_row_stride,
                input_col_stride,
                &mut matrix[m_base + channel..],
                matrix_stride,
                matrix_row_stride,
            );
            remaining -= 2;
            channel += 2;
        }
        if remaining > 0 {
            fns[0](
                tile_cols,
                &input[in_base + channel..],
                input_row_stride,
                input_col_stride,
                &mut matrix[m_base + channel..],
                matrix_stride,
                matrix_row_stride,
            );
        }
    }
}

/// Process one row of tiles for a block of `CHANNELS` channels.
///
/// The first tile in the row takes `PAD_LEFT`, the last takes `PAD_RIGHT`.
/// For tiles after the first, only the two new input columns are loaded and
/// transformed; the other half of `Xᵗx` is carried over from the previous
/// tile (a copy of already-computed values, so the written results are
/// identical to the no-reuse computation).
fn process_tile_row<
    const PAD_TOP: usize,
    const PAD_LEFT: usize,
    const PAD_BOTTOM: usize,
    const PAD_RIGHT: usize,
    const CHANNELS: usize,
>(
    tile_n: usize,
    input: &[f32],
    input_row_stride: usize,
    input_col_stride: usize,
    matrix: &mut [f32],
    matrix_stride: usize,
    matrix_row_stride: usize,
) {
    let mut in_off = 0usize;
    let mut out_off = 0usize;

    // The patch x, the intermediate Xᵗx and the result U = Xᵗx X.
    let mut x = [[[0.0f32; CHANNELS]; 4]; 4];
    let mut xtx = [[[0.0f32; CHANNELS]; 4]; 4];
    let mut u = [[[0.0f32; CHANNELS]; 4]; 4];

    for tile_j in 0..tile_n {
        let tile_pad_left = if tile_j == 0 { PAD_LEFT } else { 0 };
        let tile_pad_right = if tile_j == tile_n - 1 { PAD_RIGHT } else { 0 };

        // Load the patch; after the first tile only the last two columns are
        // new. Padding cells are synthesised zeros, and offset the pointer
        // into the loaded region.
        let j_first = if tile_j == 0 { 0 } else { 2 };
        for i in 0..4 {
            for j in j_first..4 {
                if i < PAD_TOP
                    || 4 - PAD_BOTTOM <= i
                    || j < tile_pad_left
                    || 4 - tile_pad_right <= j
                {
                    x[i][j] = [0.0; CHANNELS];
                } else {
                    let row_offset = (i - PAD_TOP) * input_row_stride;
                    let col_offset = (j - tile_pad_left) * input_col_stride;
                    for c in 0..CHANNELS {
                        x[i][j][c] = input[in_off + row_offset + col_offset + c];
                    }
                }
            }
        }

        // Xᵗx, column by column. For tiles after the first, columns 0 and 1
        // are the previous tile's columns 2 and 3.
        if tile_j == 0 {
            for j in 0..4 {
                for c in 0..CHANNELS {
                    xtx[0][j][c] = x[0][j][c] - x[2][j][c];
                    xtx[1][j][c] = x[1][j][c] + x[2][j][c];
                    xtx[2][j][c] = x[2][j][c] - x[1][j][c];
                    xtx[3][j][c] = x[1][j][c] - x[3][j][c];
                }
            }
        } else {
            for i in 0..4 {
                for j in 0..2 {
                    xtx[i][j] = xtx[i][j + 2];
                }
            }
            for j in 2..4 {
                for c in 0..CHANNELS {
                    xtx[0][j][c] = x[0][j][c] - x[2][j][c];
                    xtx[1][j][c] = x[1][j][c] + x[2][j][c];
                    xtx[2][j][c] = x[2][j][c] - x[1][j][c];
                    xtx[3][j][c] = x[1][j][c] - x[3][j][c];
                }
            }
        }

        // U = (Xᵗx) X, the same combination along the rows.
        for i in 0..4 {
            for c in 0..CHANNELS {
                u[i][0][c] = xtx[i][0][c] - xtx[i][2][c];
                u[i][1][c] = xtx[i][1][c] + xtx[i][2][c];
                u[i][2][c] = xtx[i][2][c] - xtx[i][1][c];
                u[i][3][c] = xtx[i][1][c] - xtx[i][3][c];
            }
        }

        // Stripe the 16 coefficients across the cell slabs.
        for i in 0..4 {
            for j in 0..4 {
                let cell_base = out_off + (i * 4 + j) * matrix_stride;
                matrix[cell_base..cell_base + CHANNELS].copy_from_slice(&u[i][j]);
            }
        }

        // The left padding offsets the first advance by one column.
        in_off += input_col_stride * if tile_j == 0 && PAD_LEFT > 0 { 1 } else { 2 };
        out_off += matrix_row_stride;
    }
}
