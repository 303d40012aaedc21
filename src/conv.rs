//! Convolution driver: owns the stride arithmetic and sequences the stages.
//!
//! `WinogradConv2d` is configure-once, execute-many. It owns no tensor
//! memory: weights, activations, bias and the three Winograd-domain
//! workspaces are caller-allocated slices, length-checked once per call at
//! this boundary and then handed to the check-free transform routines.
//!
//! State machine: `configure` → (`transform_weights`, once weights are
//! known) → `execute` any number of times. Re-running `transform_weights`
//! is only needed when the weights change; the driver does not cache or
//! compare weight contents.

use std::ops::Range;

use log::debug;

use crate::error::ConfigError;
use crate::gemm;
use crate::shape::{self, KernelShape, PaddingType, Tensor4DShape, KERNEL_SIZE, N_GEMMS};
use crate::storage::{
    input_storage_size, output_storage_size, weight_storage_size, MatrixStrides,
};
use crate::transform::{self, InputTransformStrategy};

/// Driver for one F(2x2, 3x3) convolution configuration.
#[derive(Debug, Clone)]
pub struct WinogradConv2d {
    kernel_shape: KernelShape,
    input_shape: Tensor4DShape,
    padding: PaddingType,
    output_shape: Tensor4DShape,
    tile_rows: usize,
    tile_cols: usize,
    input_strides: MatrixStrides,
    output_strides: MatrixStrides,
    weight_strides: MatrixStrides,
    strategy: InputTransformStrategy,
    weights_ready: bool,
}

impl WinogradConv2d {
    /// Validate the shapes and fix the tile grid and buffer strides.
    pub fn configure(
        kernel_shape: KernelShape,
        input_shape: Tensor4DShape,
        padding: PaddingType,
    ) -> Result<Self, ConfigError> {
        if kernel_shape.n_rows != KERNEL_SIZE || kernel_shape.n_cols != KERNEL_SIZE {
            return Err(ConfigError::UnsupportedKernelSize {
                n_rows: kernel_shape.n_rows,
                n_cols: kernel_shape.n_cols,
            });
        }
        if kernel_shape.size() == 0 {
            return Err(ConfigError::EmptyShape { name: "kernel" });
        }
        if input_shape.size() == 0 {
            return Err(ConfigError::EmptyShape { name: "input" });
        }
        if kernel_shape.n_input_channels != input_shape.n_channels {
            return Err(ConfigError::ChannelMismatch {
                kernel_channels: kernel_shape.n_input_channels,
                input_channels: input_shape.n_channels,
            });
        }
        if padding == PaddingType::Valid
            && (input_shape.n_rows < KERNEL_SIZE || input_shape.n_cols < KERNEL_SIZE)
        {
            return Err(ConfigError::InputTooSmall {
                n_rows: input_shape.n_rows,
                n_cols: input_shape.n_cols,
            });
        }

        let output_shape = shape::output_shape(&kernel_shape, &input_shape, padding);
        let (tile_rows, tile_cols) = shape::tile_grid(output_shape.n_rows, output_shape.n_cols);
        let input_strides = MatrixStrides::for_input(&kernel_shape, &input_shape, padding);
        let output_strides = MatrixStrides::for_output(&kernel_shape, &input_shape, padding);
        let weight_strides = MatrixStrides::for_weights(&kernel_shape);

        debug!(
            "configured winograd conv: output {}x{}x{}x{}, tiles {}x{}, \
             V stride {}, M stride {}, U stride {}",
            output_shape.n_batches,
            output_shape.n_rows,
            output_shape.n_cols,
            output_shape.n_channels,
            tile_rows,
            tile_cols,
            input_strides.matrix_stride,
            output_strides.matrix_stride,
            weight_strides.matrix_stride,
        );

        Ok(WinogradConv2d {
            kernel_shape,
            input_shape,
            padding,
            output_shape,
            tile_rows,
            tile_cols,
            input_strides,
            output_strides,
            weight_strides,
            strategy: InputTransformStrategy::TensorAtATime,
            weights_ready: false,
        })
    }

    /// Select the input-transform traversal strategy.
    pub fn with_strategy(mut self, strategy: InputTransformStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn output_shape(&self) -> &Tensor4DShape {
        &self.output_shape
    }

    pub fn tile_rows(&self) -> usize {
        self.tile_rows
    }

    pub fn tile_cols(&self) -> usize {
        self.tile_cols
    }

    pub fn input_matrix_strides(&self) -> &MatrixStrides {
        &self.input_strides
    }

    pub fn output_matrix_strides(&self) -> &MatrixStrides {
        &self.output_strides
    }

    pub fn weight_matrix_strides(&self) -> &MatrixStrides {
        &self.weight_strides
    }

    /// Required element count of the transformed-weights (U) buffer.
    pub fn weight_matrix_len(&self) -> usize {
        weight_storage_size(
            self.kernel_shape.n_output_channels,
            self.kernel_shape.n_input_channels,
        )
    }

    /// Required element count of the transformed-input (V) buffer.
    pub fn input_matrix_len(&self) -> usize {
        input_storage_size(
            self.input_shape.n_batches,
            self.input_shape.n_channels,
            self.input_shape.n_rows,
            self.input_shape.n_cols,
            self.padding.is_same(),
        )
    }

    /// Required element count of the GEMM-output (M) workspace.
    pub fn output_matrix_len(&self) -> usize {
        output_storage_size(
            self.input_shape.n_batches,
            self.input_shape.n_rows,
            self.input_shape.n_cols,
            self.kernel_shape.n_output_channels,
            self.padding.is_same(),
        )
    }

    /// Transform spatial HWIO weights into the U buffer (Configured → Ready).
    pub fn transform_weights(
        &mut self,
        weights_hwio: &[f32],
        u: &mut [f32],
    ) -> Result<(), ConfigError> {
        check_len("weights", weights_hwio.len(), self.kernel_shape.size())?;
        check_len("weight matrix", u.len(), self.weight_matrix_len())?;

        debug!(
            "transforming weights: {} output x {} input channels",
            self.kernel_shape.n_output_channels, self.kernel_shape.n_input_channels
        );
        transform::weights::transform_weights(
            weights_hwio,
            self.kernel_shape.n_output_channels,
            self.kernel_shape.n_input_channels,
            u,
            &self.weight_strides,
        );
        self.weights_ready = true;
        Ok(())
    }

    /// Transform the input tensor into the V buffer.
    pub fn transform_input(&self, input: &[f32], v: &mut [f32]) -> Result<(), ConfigError> {
        check_len("input", input.len(), self.input_shape.size())?;
        check_len("input matrix", v.len(), self.input_matrix_len())?;
        self.transform_input_rows(input, v, 0..self.tile_rows);
        Ok(())
    }

    /// Transform a window of tile rows of the input. Disjoint windows write
    /// disjoint tile slots, so an external dispatcher may partition along
    /// this axis. The channelwise strategy has no windowed form and always
    /// processes the full tensor. Buffer lengths are the caller's
    /// responsibility here.
    pub fn transform_input_rows(&self, input: &[f32], v: &mut [f32], rows: Range<usize>) {
        match self.strategy {
            InputTransformStrategy::TensorAtATime => transform::input::execute_rows(
                input,
                &self.input_shape,
                self.padding,
                self.tile_rows,
                self.tile_cols,
                v,
                &self.input_strides,
                rows,
            ),
            InputTransformStrategy::Channelwise => transform::input_channelwise::execute(
                input,
                &self.input_shape,
                self.padding,
                self.tile_rows,
                self.tile_cols,
                v,
                &self.input_strides,
            ),
        }
    }

    /// Run the 16 cell GEMMs: `M_cell = V_cell · U_cell`.
    pub fn run_gemms(&self, u: &[f32], v: &[f32], m: &mut [f32]) -> Result<(), ConfigError> {
        check_len("weight matrix", u.len(), self.weight_matrix_len())?;
        check_len("input matrix", v.len(), self.input_matrix_len())?;
        check_len("output matrix", m.len(), self.output_matrix_len())?;

        gemm::batched_gemm(
            N_GEMMS,
            self.input_shape.n_batches * self.tile_rows * self.tile_cols,
            self.kernel_shape.n_input_channels,
            self.kernel_shape.n_output_channels,
            v,
            self.input_strides.matrix_stride,
            self.input_strides.matrix_row_stride,
            u,
            self.weight_strides.matrix_stride,
            self.weight_strides.matrix_row_stride,
            m,
            self.output_strides.matrix_stride,
            self.output_strides.matrix_row_stride,
        );
        Ok(())
    }

    /// Transform the M workspace into the spatial output, adding bias.
    pub fn transform_output(
        &self,
        m: &[f32],
        bias: Option<&[f32]>,
        output: &mut [f32],
    ) -> Result<(), ConfigError> {
        check_len("output matrix", m.len(), self.output_matrix_len())?;
        check_len("output", output.len(), self.output_shape.size())?;
        if let Some(b) = bias {
            check_len("bias", b.len(), self.kernel_shape.n_output_channels)?;
        }
        self.transform_output_rows(m, bias, output, 0..self.tile_rows);
        Ok(())
    }

    /// Output-transform a window of tile rows; same partitioning contract as
    /// [`Self::transform_input_rows`].
    pub fn transform_output_rows(
        &self,
        m: &[f32],
        bias: Option<&[f32]>,
        output: &mut [f32],
        rows: Range<usize>,
    ) {
        transform::output::execute_rows(
            m,
            &self.output_strides,
            output,
            &self.output_shape,
            bias,
            self.tile_rows,
            self.tile_cols,
            rows,
        );
    }

    /// Full pipeline for one input: input-transform, 16 GEMMs, output
    /// transform. `transform_weights` must have been called first.
    pub fn execute(
        &self,
        input: &[f32],
        u: &[f32],
        v: &mut [f32],
        m: &mut [f32],
        bias: Option<&[f32]>,
        output: &mut [f32],
    ) -> Result<(), ConfigError> {
        if !self.weights_ready {
            return Err(ConfigError::WeightsNotReady);
        }
        self.transform_input(input, v)?;
        self.run_gemms(u, v, m)?;
        self.transform_output(m, bias, output)
    }
}

fn check_len(name: &'static str, actual: usize, required: usize) -> Result<(), ConfigError> {
    if actual < required {
        return Err(ConfigError::BufferTooSmall {
            name,
            required,
            actual,
        });
    }
    Ok(())
}
