//! SIMD micro-kernels with NEON acceleration and scalar fallbacks.
//!
//! The transform stages themselves lean on fixed-width channel blocks for
//! auto-vectorisation; the explicit intrinsics live here, in the GEMM inner
//! loop.

// ── FP32 AXPY: c[c_off..] += a_val * b[b_off..] ──

#[cfg(all(target_arch = "aarch64", feature = "simd"))]
pub fn axpy_f32(c: &mut [f32], c_off: usize, b: &[f32], b_off: usize, a_val: f32, len: usize) {
    use core::arch::aarch64::*;
    let mut j = 0usize;
    unsafe {
        let a_vec = vdupq_n_f32(a_val);
        while j + 4 <= len {
            let b_vec = vld1q_f32(b.as_ptr().add(b_off + j));
            let c_vec = vld1q_f32(c.as_ptr().add(c_off + j));
            let r = vfmaq_f32(c_vec, a_vec, b_vec);
            vst1q_f32(c.as_mut_ptr().add(c_off + j), r);
            j += 4;
        }
    }
    // scalar tail
    while j < len {
        c[c_off + j] += a_val * b[b_off + j];
        j += 1;
    }
}

#[cfg(not(all(target_arch = "aarch64", feature = "simd")))]
pub fn axpy_f32(c: &mut [f32], c_off: usize, b: &[f32], b_off: usize, a_val: f32, len: usize) {
    for j in 0..len {
        c[c_off + j] += a_val * b[b_off + j];
    }
}
