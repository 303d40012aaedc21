//! Tile-at-a-time input transform.
//!
//! Independent traversal strategy to [`super::input`]: each tile is loaded,
//! transformed and stored before moving on, with no state carried between
//! tiles. Simpler, and the output must be identical to the tensor-at-a-time
//! strategy; the tests hold the two against each other.

use crate::shape::{PaddingType, Tensor4DShape};
use crate::storage::MatrixStrides;

/// Single-tile routine, specialised per padding case.
type TileFn = fn(
    usize,      // channels
    &[f32],     // input, positioned at the tile's first loadable element
    usize,      // input row stride
    usize,      // input col stride
    &mut [f32], // matrix, positioned at the tile's slot
    usize,      // matrix stride (between the 16 cells)
);

/// Transform a full input tensor, one tile at a time.
pub fn execute(
    input: &[f32],
    input_shape: &Tensor4DShape,
    padding: PaddingType,
    tile_rows: usize,
    tile_cols: usize,
    matrix: &mut [f32],
    strides: &MatrixStrides,
) {
    let n_channels = input_shape.n_channels;
    let input_col_stride = n_channels;
    let input_row_stride = input_shape.n_cols * input_col_stride;
    let same = padding.is_same();

    let (pad_top, pad_left) = if same { (1, 1) } else { (0, 0) };
    let pad_bottom = input_shape.n_rows % 2 + if same { 1 } else { 0 };
    let pad_right = input_shape.n_cols % 2 + if same { 1 } else { 0 };

    // One routine per (tile-row class, tile-col class): first/middle/last.
    // A grid with a single row (or column) of tiles folds both edge paddings
    // into class 0.
    let row_pads = |class: usize| -> (usize, usize) {
        (
            if class == 0 { pad_top } else { 0 },
            if class == 2 || (class == 0 && tile_rows == 1) { pad_bottom } else { 0 },
        )
    };
    let col_pads = |class: usize| -> (usize, usize) {
        (
            if class == 0 { pad_left } else { 0 },
            if class == 2 || (class == 0 && tile_cols == 1) { pad_right } else { 0 },
        )
    };
    let mut fs = [[select_tile_fn(0, 0, 0, 0); 3]; 3];
    for (ri, fs_row) in fs.iter_mut().enumerate() {
        let (pt, pb) = row_pads(ri);
        for (ci, f) in fs_row.iter_mut().enumerate() {
            let (pl, pr) = col_pads(ci);
            *f = select_tile_fn(pt, pl, pb, pr);
        }
    }

    let batch_size = input_shape.n_rows * input_row_stride;
    for batch in 0..input_shape.n_batches {
        let input_batch = &input[batch * batch_size..];

        for tile_i in 0..tile_rows {
            // Rows of tiles after the first start one input row earlier
            // under SAME padding.
            let row_offset = if tile_i == 0 || !same { 0 } else { 1 };
            let in_row = (2 * tile_i - row_offset) * input_row_stride;
            let fs_i = if tile_i == 0 {
                0
            } else if tile_i < tile_rows - 1 {
                1
            } else {
                2
            };

            for tile_j in 0..tile_cols {
                let col_offset = if tile_j == 0 || !same { 0 } else { 1 };
                let in_col = (2 * tile_j - col_offset) * input_col_stride;
                let fs_j = if tile_j == 0 {
                    0
                } else if tile_j < tile_cols - 1 {
                    1
                } else {
                    2
                };

                let matrix_base = batch * strides.matrix_batch_stride
                    + (tile_i * tile_cols + tile_j) * strides.matrix_row_stride;
                fs[fs_i][fs_j](
                    n_channels,
                    &input_batch[in_row + in_col..],
                    input_row_stride,
                    input_col_stride,
                    &mut matrix[matrix_base..],
                    strides.matrix_stride,
                );
            }
        }
    }
}

/// Resolve the monomorphised tile routine for a padding combination.
///
/// Top/left padding is at most one row/column; bottom/right up to two under
/// SAME padding. Anything else is an uncovered case and a hard failure,
/// never a silent wrong answer.
fn select_tile_fn(pt: usize, pl: usize, pb: usize, pr: usize) -> TileFn {
    match (pt, pl, pb, pr) {
        (0, 0, 0, 0) => process_tile::<0, 0, 0, 0>,
        (0, 0, 0, 1) => process_tile::<0, 0, 0, 1>,
        (0, 0, 0, 2) => process_tile::<0, 0, 0, 2>,
        (0, 0, 1, 0) => process_tile::<0, 0, 1, 0>,
        (0, 0, 1, 1) => process_tile::<0, 0, 1, 1>,
        (0, 0, 1, 2) => process_tile::<0, 0, 1, 2>,
        (0, 0, 2, 0) => process_tile::<0, 0, 2, 0>,
        (0, 0, 2, 1) => process_tile::<0, 0, 2, 1>,
        (0, 0, 2, 2) => process_tile::<0, 0, 2, 2>,
        (0, 1, 0, 0) => process_tile::<0, 1, 0, 0>,
        (0, 1, 0, 1) => process_tile::<0, 1, 0, 1>,
        (0, 1, 0, 2) => process_tile::<0, 1, 0, 2>,
        (0, 1, 1, 0) => process_tile::<0, 1, 1, 0>,
        (0, 1, 1, 1) => process_tile::<0, 1, 1, 1>,
        (0, 1, 1, 2) => process_tile::<0, 1, 1, 2>,
        (0, 1, 2, 0) => process_tile::<0, 1, 2, 0>,
        (0, 1, 2, 1) => process_tile::<0, 1, 2, 1>,
        (0, 1, 2, 2) => process_tile::<0, 1, 2, 2>,
        (1, 0, 0, 0) => process_tile::<1, 0, 0, 0>,
        (1, 0, 0, 1) => process_tile::<1, 0, 0, 1>,
        (1, 0, 0, 2) => process_tile::<1, 0, 0, 2>,
        (1, 0, 1, 0) => process_tile::<1, 0, 1, 0>,
        (1, 0, 1, 1) => process_tile::<1, 0, 1, 1>,
        (1, 0, 1, 2) => process_tile::<1, 0, 1, 2>,
        (1, 0, 2, 0) => process_tile::<1, 0, 2, 0>,
        (1, 0, 2, 1) => process_tile::<1, 0, 2, 1>,
        (1, 0, 2, 2) => process_tile::<1, 0, 2, 2>,
        (1, 1, 0, 0) => process_tile::<1, 1, 0, 0>,
        (1, 1, 0, 1) => process_tile::<1, 1, 0, 1>,
        (1, 1, 0, 2) => process_tile::<1, 1, 0, 2>,
        (1, 1, 1, 0) => process_tile::<1, 1, 1, 0>,
        (1, 1, 1, 1) => process_tile::<1, 1, 1, 1>,
        (1, 1, 1, 2) => process_tile::<1, 1, 1, 2>,
        (1, 1, 2, 0) => process_tile::<1, 1, 2, 0>,
        (1, 1, 2, 1) => process_tile::<1, 1, 2, 1>,
        (1, 1, 2, 2) => process_tile::<1, 1, 2, 2>,
        _ => panic!("uncovered padding case ({pt}, {pl}, {pb}, {pr})"),
    }
}

/// Transform one tile across all channels, 4, then 2, then 1 at a time.
fn process_tile<const PT: usize, const PL: usize, const PB: usize, const PR: usize>(
    n_channels: usize,
    input: &[f32],
    input_row_stride: usize,
    input_col_stride: usize,
    matrix: &mut [f32],
    matrix_stride: usize,
) {
    let mut remaining = n_channels;
    let mut in_off = 0usize;
    let mut out_off = 0usize;

    process_channel_block::<PT, PL, PB, PR, 4>(
        &mut remaining, &mut in_off, &mut out_off,
        input, input_row_stride, input_col_stride, matrix, matrix_stride,
    );
    process_channel_block::<PT, PL, PB, PR, 2>(
        &mut remaining, &mut in_off, &mut out_off,
        input, input_row_stride, input_col_stride, matrix, matrix_stride,
    );
    process_channel_block::<PT, PL, PB, PR, 1>(
        &mut remaining, &mut in_off, &mut out_off,
        input, input_row_stride, input_col_stride, matrix, matrix_stride,
    );
}

/// Consume channels in blocks of `CHANNELS`, updating the caller's cursors.
#[allow(clippy::too_many_arguments)]
fn process_channel_block<
    const PT: usize,
    const PL: usize,
    const PB: usize,
    const PR: usize,
    const CHANNELS: usize,
>(
    remaining: &mut usize,
    in_off: &mut usize,
    out_off: &mut usize,
    input: &[f32],
    input_row_stride: usize,
    input_col_stride: usize,
    matrix: &mut [f32],
    matrix_stride: usize,
) {
    // Zeroed once; padding cells stay zero for every channel.
    let mut x = [[0.0f32; 4]; 4];
    let mut xtx = [[0.0f32; 4]; 4];
    let mut u = [[0.0f32; 4]; 4];

    while *remaining >= CHANNELS {
        for _ in 0..CHANNELS {
            // Load the non-padded portion of the patch.
            for (i, cell_i) in (PT..4 - PB).enumerate() {
                for (j, cell_j) in (PL..4 - PR).enumerate() {
                    x[cell_i][cell_j] =
                        input[*in_off + i * input_row_stride + j * input_col_stride];
                }
            }

            for j in 0..4 {
                xtx[0][j] = x[0][j] - x[2][j];
                xtx[1][j] = x[1][j] + x[2][j];
                xtx[2][j] = x[2][j] - x[1][j];
                xtx[3][j] = x[1][j] - x[3][j];
            }
            for i in 0..4 {
                u[i][0] = xtx[i][0] - xtx[i][2];
                u[i][1] = xtx[i][1] + xtx[i][2];
                u[i][2] = xtx[i][2] - xtx[i][1];
                u[i][3] = xtx[i][1] - xtx[i][3];
            }

            for i in 0..4 {
                for j in 0..4 {
                    matrix[*out_off + (i * 4 + j) * matrix_stride] = u[i][j];
                }
            }

            *in_off += 1;
            *out_off += 1;
        }
        *remaining -= CHANNELS;
    }
}
