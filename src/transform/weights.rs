//! Weight transform: spatial-domain 3x3 filters into the Winograd (U) domain.
//!
//! Computes `G K Gᵗ` with `G = [[1,0,0],[½,½,½],[½,−½,½],[0,0,1]]`, expressed
//! as closed-form tap combinations rather than a matrix multiply.

use crate::storage::MatrixStrides;

/// Transform a full filter bank.
///
/// `weights_hwio` is laid out rows × cols × input-channels × output-channels.
/// Each of the 16 resulting coefficients lands in its own `matrix_stride`
/// slab of `matrix`, at row `input_channel` (stride `matrix_row_stride`) and
/// column `output_channel`.
///
/// No validation is performed here; the driver checks buffer lengths once.
pub fn transform_weights(
    weights_hwio: &[f32],
    n_output_channels: usize,
    n_input_channels: usize,
    matrix: &mut [f32],
    strides: &MatrixStrides,
) {
    // Strides within the spatial weight tensor.
    let col_stride = n_input_channels * n_output_channels;
    let row_stride = 3 * col_stride;

    for ic in 0..n_input_channels {
        for oc in 0..n_output_channels {
            // Load the nine taps for this (input, output) channel pair.
            let mut w = [[0.0f32; 3]; 3];
            for (r, w_row) in w.iter_mut().enumerate() {
                for (c, tap) in w_row.iter_mut().enumerate() {
                    *tap = weights_hwio[r * row_stride + c * col_stride + ic * n_output_channels + oc];
                }
            }

            // Ww = G w: rows 0 and 3 pass through, rows 1 and 2 are the
            // half-sum/half-difference combinations.
            let mut ww = [[0.0f32; 3]; 4];
            for j in 0..3 {
                ww[0][j] = w[0][j];
                ww[1][j] = (w[0][j] + w[1][j] + w[2][j]) * 0.5;
                ww[2][j] = (w[0][j] - w[1][j] + w[2][j]) * 0.5;
                ww[3][j] = w[2][j];
            }

            // U = Ww Gᵗ: the same combination along the other axis.
            for (i, ww_row) in ww.iter().enumerate() {
                let u = [
                    ww_row[0],
                    (ww_row[0] + ww_row[1] + ww_row[2]) * 0.5,
                    (ww_row[0] - ww_row[1] + ww_row[2]) * 0.5,
                    ww_row[2],
                ];
                for (j, &coeff) in u.iter().enumerate() {
                    matrix[strides.weight_offset(i * 4 + j, ic, oc)] = coeff;
                }
            }
        }
    }
}
