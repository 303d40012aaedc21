use winoconv::shape::{output_shape, tile_grid};
use winoconv::storage::{input_storage_size, output_storage_size, weight_storage_size};
use winoconv::{KernelShape, MatrixStrides, PaddingType, Tensor4DShape, WinogradConv2d};

/// Fill a flat vec with deterministic values based on index.
fn fill_deterministic(data: &mut [f32]) {
    for (i, v) in data.iter_mut().enumerate() {
        *v = ((i as f32) * 0.1 + 0.05).sin();
    }
}

// The reference configuration: 1x9x9x3 input, 4 filters of 3x3x3, VALID.
#[test]
fn test_reference_configuration_sizes() {
    let kernel = KernelShape { n_output_channels: 4, n_rows: 3, n_cols: 3, n_input_channels: 3 };
    let input = Tensor4DShape { n_batches: 1, n_rows: 9, n_cols: 9, n_channels: 3 };

    let out = output_shape(&kernel, &input, PaddingType::Valid);
    assert_eq!(out.n_rows, 7);
    assert_eq!(out.n_cols, 7);
    assert_eq!(out.n_channels, 4);

    let (tile_rows, tile_cols) = tile_grid(out.n_rows, out.n_cols);
    assert_eq!(tile_rows, 4);
    assert_eq!(tile_cols, 4);

    assert_eq!(input_storage_size(1, 3, 9, 9, false), 768);
    assert_eq!(weight_storage_size(4, 3), 192);
    assert_eq!(output_storage_size(1, 9, 9, 4, false), 1024);

    let conv = WinogradConv2d::configure(kernel, input, PaddingType::Valid).unwrap();
    assert_eq!(conv.input_matrix_len(), 768);
    assert_eq!(conv.weight_matrix_len(), 192);
    assert_eq!(conv.output_matrix_len(), 1024);
    assert_eq!(conv.tile_rows(), 4);
    assert_eq!(conv.tile_cols(), 4);
}

#[test]
fn test_same_padding_sizes() {
    let kernel = KernelShape { n_output_channels: 4, n_rows: 3, n_cols: 3, n_input_channels: 3 };
    let input = Tensor4DShape { n_batches: 2, n_rows: 9, n_cols: 9, n_channels: 3 };

    let out = output_shape(&kernel, &input, PaddingType::Same);
    assert_eq!((out.n_rows, out.n_cols), (9, 9));
    let (tile_rows, tile_cols) = tile_grid(out.n_rows, out.n_cols);
    assert_eq!((tile_rows, tile_cols), (5, 5));

    assert_eq!(input_storage_size(2, 3, 9, 9, true), 16 * 2 * 5 * 5 * 3);
    assert_eq!(output_storage_size(2, 9, 9, 4, true), 16 * 2 * 5 * 5 * 4);
}

// The stride accessors and the offset helpers must agree with the documented
// layout: 16 cell slabs, batches inside a slab, one row per tile, channels
// contiguous.
#[test]
fn test_matrix_stride_contract() {
    let kernel = KernelShape { n_output_channels: 4, n_rows: 3, n_cols: 3, n_input_channels: 3 };
    let input = Tensor4DShape { n_batches: 2, n_rows: 9, n_cols: 9, n_channels: 3 };

    let v = MatrixStrides::for_input(&kernel, &input, PaddingType::Valid);
    assert_eq!(v.matrix_stride, 2 * 4 * 4 * 3);
    assert_eq!(v.matrix_row_stride, 3);
    assert_eq!(v.matrix_batch_stride, 4 * 4 * 3);

    let m = MatrixStrides::for_output(&kernel, &input, PaddingType::Valid);
    assert_eq!(m.matrix_stride, 2 * 4 * 4 * 4);
    assert_eq!(m.matrix_row_stride, 4);
    assert_eq!(m.matrix_batch_stride, 4 * 4 * 4);

    let u = MatrixStrides::for_weights(&kernel);
    assert_eq!(u.matrix_stride, 3 * 4);
    assert_eq!(u.matrix_row_stride, 4);

    // (batch, tile_row, tile_col, cell, channel) decomposition.
    assert_eq!(v.tile_offset(0, 0, 0, 4, 0, 0), 0);
    assert_eq!(v.tile_offset(0, 0, 0, 4, 0, 2), 2);
    assert_eq!(v.tile_offset(0, 0, 1, 4, 0, 0), 3);
    assert_eq!(v.tile_offset(0, 1, 0, 4, 0, 0), 4 * 3);
    assert_eq!(v.tile_offset(1, 0, 0, 4, 0, 0), 4 * 4 * 3);
    assert_eq!(v.tile_offset(0, 0, 0, 4, 1, 0), 2 * 4 * 4 * 3);
    assert_eq!(
        v.tile_offset(1, 3, 2, 4, 15, 2),
        15 * (2 * 4 * 4 * 3) + 4 * 4 * 3 + (3 * 4 + 2) * 3 + 2
    );

    assert_eq!(u.weight_offset(0, 0, 0), 0);
    assert_eq!(u.weight_offset(0, 1, 0), 4);
    assert_eq!(u.weight_offset(0, 0, 3), 3);
    assert_eq!(u.weight_offset(15, 2, 3), 15 * 12 + 2 * 4 + 3);
}

// Odd output extents leave a partial final tile; output positions past the
// extent must never be touched. Runs on a buffer with a sentinel tail to
// catch writes past the logical output.
#[test]
fn test_boundary_pixels_not_written() {
    let kernel = KernelShape { n_output_channels: 2, n_rows: 3, n_cols: 3, n_input_channels: 2 };
    let input_shape = Tensor4DShape { n_batches: 1, n_rows: 9, n_cols: 9, n_channels: 2 };
    let mut conv = WinogradConv2d::configure(kernel, input_shape, PaddingType::Valid).unwrap();

    let mut input = vec![0.0f32; input_shape.size()];
    let mut weights = vec![0.0f32; kernel.size()];
    fill_deterministic(&mut input);
    fill_deterministic(&mut weights);

    let mut u = vec![0.0f32; conv.weight_matrix_len()];
    let mut v = vec![0.0f32; conv.input_matrix_len()];
    let mut m = vec![0.0f32; conv.output_matrix_len()];
    conv.transform_weights(&weights, &mut u).unwrap();

    const SENTINEL: f32 = -12345.0;
    let out_len = conv.output_shape().size();
    let mut output = vec![SENTINEL; out_len + 64];
    conv.execute(&input, &u, &mut v, &mut m, None, &mut output).unwrap();

    for (i, value) in output.iter().enumerate() {
        if i < out_len {
            assert!(*value != SENTINEL, "output element {i} never written");
        } else {
            assert!(*value == SENTINEL, "element {i} past the output extent was written");
        }
    }
}

// Every transform must stay within exactly-sized buffers; an overrun would
// panic on the slice bounds.
#[test]
fn test_exact_size_buffers_suffice() {
    for (rows, cols, padding) in [
        (9, 9, PaddingType::Valid),
        (8, 8, PaddingType::Valid),
        (9, 9, PaddingType::Same),
        (8, 8, PaddingType::Same),
        (3, 3, PaddingType::Valid),
        (1, 1, PaddingType::Same),
    ] {
        let kernel = KernelShape { n_output_channels: 3, n_rows: 3, n_cols: 3, n_input_channels: 5 };
        let input_shape = Tensor4DShape { n_batches: 2, n_rows: rows, n_cols: cols, n_channels: 5 };
        let mut conv = WinogradConv2d::configure(kernel, input_shape, padding).unwrap();

        let mut input = vec![0.0f32; input_shape.size()];
        let mut weights = vec![0.0f32; kernel.size()];
        fill_deterministic(&mut input);
        fill_deterministic(&mut weights);

        let mut u = vec![0.0f32; conv.weight_matrix_len()];
        let mut v = vec![0.0f32; conv.input_matrix_len()];
        let mut m = vec![0.0f32; conv.output_matrix_len()];
        let mut output = vec![0.0f32; conv.output_shape().size()];

        conv.transform_weights(&weights, &mut u).unwrap();
        conv.execute(&input, &u, &mut v, &mut m, None, &mut output).unwrap();
    }
}

// Windowed entry points: processing the tile rows in two halves must produce
// the same buffers as one full pass.
#[test]
fn test_windowed_transforms_match_full_pass() {
    let kernel = KernelShape { n_output_channels: 3, n_rows: 3, n_cols: 3, n_input_channels: 4 };
    let input_shape = Tensor4DShape { n_batches: 2, n_rows: 9, n_cols: 9, n_channels: 4 };
    let mut conv = WinogradConv2d::configure(kernel, input_shape, PaddingType::Same).unwrap();

    let mut input = vec![0.0f32; input_shape.size()];
    let mut weights = vec![0.0f32; kernel.size()];
    let mut bias = vec![0.0f32; 3];
    fill_deterministic(&mut input);
    fill_deterministic(&mut weights);
    fill_deterministic(&mut bias);

    let mut u = vec![0.0f32; conv.weight_matrix_len()];
    conv.transform_weights(&weights, &mut u).unwrap();

    let mut v_full = vec![0.0f32; conv.input_matrix_len()];
    conv.transform_input(&input, &mut v_full).unwrap();

    let mut v_split = vec![0.0f32; conv.input_matrix_len()];
    let mid = conv.tile_rows() / 2;
    conv.transform_input_rows(&input, &mut v_split, 0..mid);
    conv.transform_input_rows(&input, &mut v_split, mid..conv.tile_rows());
    assert_eq!(v_full, v_split);

    let mut m = vec![0.0f32; conv.output_matrix_len()];
    conv.run_gemms(&u, &v_full, &mut m).unwrap();

    let mut out_full = vec![0.0f32; conv.output_shape().size()];
    conv.transform_output(&m, Some(&bias), &mut out_full).unwrap();

    let mut out_split = vec![0.0f32; conv.output_shape().size()];
    conv.transform_output_rows(&m, Some(&bias), &mut out_split, 0..mid);
    conv.transform_output_rows(&m, Some(&bias), &mut out_split, mid..conv.tile_rows());
    assert_eq!(out_full, out_split);
}
