//! Naive direct convolution (oracle for the Winograd pipeline).
//!
//! Plain nested loops over NHWC slices with explicit zero-padding; no tiling,
//! no transform, no fast paths. Every optimised path in this crate is tested
//! against this.

use crate::shape::{output_shape, KernelShape, PaddingType, Tensor4DShape};

/// Direct 3x3 convolution, stride 1, NHWC activations and HWIO weights.
///
/// `bias` holds one value per output channel; `None` means zero bias.
/// `output` must hold `output_shape(kernel_shape, input_shape, padding).size()`
/// elements.
pub fn conv2d_reference(
    input: &[f32],
    input_shape: &Tensor4DShape,
    weights_hwio: &[f32],
    kernel_shape: &KernelShape,
    bias: Option<&[f32]>,
    padding: PaddingType,
    output: &mut [f32],
) {
    let out = output_shape(kernel_shape, input_shape, padding);
    let k = kernel_shape.n_input_channels;
    let n = kernel_shape.n_output_channels;

    // SAME places one row/column of zeros before the first input row/column.
    let pad = if padding.is_same() { 1isize } else { 0 };

    for batch in 0..out.n_batches {
        let in_base = batch * input_shape.n_rows * input_shape.n_cols * k;
        let out_base = batch * out.n_rows * out.n_cols * n;

        for r in 0..out.n_rows {
            for c in 0..out.n_cols {
                for oc in 0..n {
                    let mut sum = match bias {
                        Some(b) => b[oc],
                        None => 0.0,
                    };
                    for kr in 0..3 {
                        for kc in 0..3 {
                            let ir = r as isize + kr as isize - pad;
                            let ic = c as isize + kc as isize - pad;
                            if ir < 0
                                || ir >= input_shape.n_rows as isize
                                || ic < 0
                                || ic >= input_shape.n_cols as isize
                            {
                                continue;
                            }
                            let in_idx = in_base
                                + (ir as usize * input_shape.n_cols + ic as usize) * k;
                            let w_base = ((kr * 3 + kc) * k) * n + oc;
                            for icc in 0..k {
                                sum += input[in_idx + icc] * weights_hwio[w_base + icc * n];
                            }
                        }
                    }
                    output[out_base + (r * out.n_cols + c) * n + oc] = sum;
                }
            }
        }
    }
}
