//! Logical shapes for the convolution: filter bank, NHWC activation tensors
//! and the padding mode that ties them together.

/// Shape of a convolution filter bank.
///
/// Spatial-domain weights are expected in HWIO order: rows, then columns,
/// then input channels, with the output channel fastest-varying.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KernelShape {
    pub n_output_channels: usize,
    pub n_rows: usize,
    pub n_cols: usize,
    pub n_input_channels: usize,
}

impl KernelShape {
    /// Total number of weight elements.
    pub fn size(&self) -> usize {
        self.n_output_channels * self.n_rows * self.n_cols * self.n_input_channels
    }
}

/// Shape of an activation tensor in NHWC order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tensor4DShape {
    pub n_batches: usize,
    pub n_rows: usize,
    pub n_cols: usize,
    pub n_channels: usize,
}

impl Tensor4DShape {
    /// Total number of elements.
    pub fn size(&self) -> usize {
        self.n_batches * self.n_rows * self.n_cols * self.n_channels
    }
}

/// Selects how the input is logically zero-padded before tiling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaddingType {
    /// Pad so the output spatial extent matches the input extent.
    Same,
    /// No padding; the output shrinks by `kernel_size - 1` per axis.
    Valid,
}

impl PaddingType {
    pub fn is_same(&self) -> bool {
        matches!(self, PaddingType::Same)
    }
}

/// Output tile edge for the F(2x2, 3x3) configuration.
pub const OUTPUT_TILE_SIZE: usize = 2;
/// Kernel edge for the F(2x2, 3x3) configuration.
pub const KERNEL_SIZE: usize = 3;
/// Input patch edge consumed per tile: `OUTPUT_TILE_SIZE + KERNEL_SIZE - 1`.
pub const INNER_TILE_SIZE: usize = 4;
/// Number of transform-domain cells, and hence of independent GEMMs.
pub const N_GEMMS: usize = INNER_TILE_SIZE * INNER_TILE_SIZE;

/// Integer ceiling division.
pub(crate) fn iceildiv(a: usize, b: usize) -> usize {
    (a + b - 1) / b
}

/// Spatial shape of the convolution output for the given input and padding.
pub fn output_shape(
    kernel_shape: &KernelShape,
    input_shape: &Tensor4DShape,
    padding: PaddingType,
) -> Tensor4DShape {
    Tensor4DShape {
        n_batches: input_shape.n_batches,
        n_rows: match padding {
            PaddingType::Same => input_shape.n_rows,
            PaddingType::Valid => input_shape.n_rows - (KERNEL_SIZE - 1),
        },
        n_cols: match padding {
            PaddingType::Same => input_shape.n_cols,
            PaddingType::Valid => input_shape.n_cols - (KERNEL_SIZE - 1),
        },
        n_channels: kernel_shape.n_output_channels,
    }
}

/// Number of `(tile_rows, tile_cols)` output tiles covering the given output
/// extent.
pub fn tile_grid(output_rows: usize, output_cols: usize) -> (usize, usize) {
    (
        iceildiv(output_rows, OUTPUT_TILE_SIZE),
        iceildiv(output_cols, OUTPUT_TILE_SIZE),
    )
}
