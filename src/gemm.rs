//! Reference batched GEMM over the 16 transform-domain cells.
//!
//! The transform engine only requires *some* GEMM honouring the stride
//! contract of [`crate::storage::MatrixStrides`]; this module is the bundled
//! default. Each cell is an independent `C = A·B` with `A` the transformed
//! input (M×K), `B` the transformed weights (K×N) and `C` the output
//! workspace (M×N), where `M = n_batches · tile_rows · tile_cols`. Cells own
//! disjoint `matrix_stride`-sized slabs of `c`, so they run in parallel.

use log::trace;
use rayon::prelude::*;

use crate::simd;

/// Run `n_gemms` independent matrix multiplications.
///
/// `a`/`b`/`c` hold `n_gemms` matrices each, separated by their respective
/// `matrix_stride`; rows within a matrix are separated by the row strides.
/// Batch regions of the V/M buffers are contiguous runs of rows, so a single
/// M×K view covers all batches.
#[allow(clippy::too_many_arguments)]
pub fn batched_gemm(
    n_gemms: usize,
    m: usize,
    k: usize,
    n: usize,
    a: &[f32],
    a_matrix_stride: usize,
    a_row_stride: usize,
    b: &[f32],
    b_matrix_stride: usize,
    b_row_stride: usize,
    c: &mut [f32],
    c_matrix_stride: usize,
    c_row_stride: usize,
) {
    trace!("batched gemm: {n_gemms} cells, M={m} K={k} N={n}");
    c.par_chunks_mut(c_matrix_stride)
        .take(n_gemms)
        .enumerate()
        .for_each(|(cell, c_cell)| {
            gemm_single(
                m,
                k,
                n,
                &a[cell * a_matrix_stride..],
                a_row_stride,
                &b[cell * b_matrix_stride..],
                b_row_stride,
                c_cell,
                c_row_stride,
            );
        });
}

/// One cell: C = A·B, accumulated row by row with the axpy micro-kernel.
#[allow(clippy::too_many_arguments)]
fn gemm_single(
    m: usize,
    k: usize,
    n: usize,
    a: &[f32],
    a_row_stride: usize,
    b: &[f32],
    b_row_stride: usize,
    c: &mut [f32],
    c_row_stride: usize,
) {
    for i in 0..m {
        let c_row = i * c_row_stride;
        c[c_row..c_row + n].fill(0.0);
        let a_row = i * a_row_stride;
        for p in 0..k {
            simd::axpy_f32(c, c_row, b, p * b_row_stride, a[a_row + p], n);
        }
    }
}
