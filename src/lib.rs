//! Winograd F(2x2, 3x3) convolution transforms for NHWC tensors.
//!
//! This crate implements the fast-convolution pipeline for 3x3 kernels at
//! stride 1: weights and 4x4 input patches are mapped into a 16-cell
//! transform domain, the convolution collapses into 16 independent matrix
//! multiplications, and an output transform maps each product back to a
//! 2x2 pixel block. All tensors are flat `&[f32]` slices; the caller
//! allocates the three transform-domain workspaces using the sizes the
//! driver reports.
//!
//! # Example
//!
//! ```no_run
//! use winoconv::{KernelShape, PaddingType, Tensor4DShape, WinogradConv2d};
//!
//! let kernel = KernelShape { n_output_channels: 4, n_rows: 3, n_cols: 3, n_input_channels: 3 };
//! let input = Tensor4DShape { n_batches: 1, n_rows: 9, n_cols: 9, n_channels: 3 };
//! let mut conv = WinogradConv2d::configure(kernel, input, PaddingType::Valid).unwrap();
//!
//! let weights = vec![0.0f32; kernel.size()];
//! let activations = vec![0.0f32; input.size()];
//! let mut u = vec![0.0f32; conv.weight_matrix_len()];
//! let mut v = vec![0.0f32; conv.input_matrix_len()];
//! let mut m = vec![0.0f32; conv.output_matrix_len()];
//! let mut output = vec![0.0f32; conv.output_shape().size()];
//!
//! conv.transform_weights(&weights, &mut u).unwrap();
//! conv.execute(&activations, &u, &mut v, &mut m, None, &mut output).unwrap();
//! ```

/// Configure-once driver tying the stages together.
pub mod conv;
/// Error type for configuration and buffer checks.
pub mod error;
/// Reference batched GEMM over the 16 transform cells.
pub mod gemm;
/// Direct-convolution oracle used by the tests and benches.
pub mod reference;
/// Shape types, tile-grid math and the output-shape rule.
pub mod shape;
/// Workspace sizing and the transform-domain stride contract.
pub mod storage;
/// The weight, input and output transforms.
pub mod transform;

mod simd;

pub use conv::WinogradConv2d;
pub use error::ConfigError;
pub use shape::{KernelShape, PaddingType, Tensor4DShape};
pub use storage::MatrixStrides;
pub use transform::InputTransformStrategy;
