use gru_rs::device::HostDevice;
use gru_rs::error::OpError;
use gru_rs::ops::{Gru, Operator, MAX_SEQ_SUM};
use gru_rs::params::GruParam;
use gru_rs::tensor::{Shape, TensorDescriptor};

fn packed_param(bias_len: usize, num_direction: usize) -> GruParam {
    GruParam::new(TensorDescriptor::vector(bias_len))
        .packed(true)
        .with_direction(num_direction)
}

fn fixed_param(bias_len: usize, num_direction: usize) -> GruParam {
    GruParam::new(TensorDescriptor::vector(bias_len))
        .packed(false)
        .with_direction(num_direction)
}

#[test]
fn packed_without_input_uses_capacity() {
    let mut gru = Gru::<HostDevice>::new();
    let mut output = TensorDescriptor::default();

    gru.compute_output_shape(&[], &mut [&mut output], &packed_param(300, 1))
        .unwrap();

    assert_eq!(MAX_SEQ_SUM, 1000);
    assert_eq!(output.shape(), Shape::new(1000, 100, 1, 1));
}

#[test]
fn packed_without_input_ignores_bias_for_leading_extent() {
    let mut gru = Gru::<HostDevice>::new();
    for (bias_len, direction) in [(3, 1), (600, 2), (96, 1)] {
        let mut output = TensorDescriptor::default();
        gru.compute_output_shape(&[], &mut [&mut output], &packed_param(bias_len, direction))
            .unwrap();
        assert_eq!(output.num(), MAX_SEQ_SUM);
        assert_eq!(output.channel(), bias_len / 3 * direction);
        assert_eq!((output.height(), output.width()), (1, 1));
    }
}

#[test]
fn packed_with_input_keeps_sequence_sum() {
    let mut gru = Gru::<HostDevice>::new();
    let input = TensorDescriptor::nchw(200, 64, 1, 1);
    let mut output = TensorDescriptor::default();

    gru.compute_output_shape(&[&input], &mut [&mut output], &packed_param(600, 2))
        .unwrap();

    assert_eq!(output.shape(), Shape::new(200, 400, 1, 1));
}

#[test]
fn packed_at_capacity_is_accepted() {
    let mut gru = Gru::<HostDevice>::new();
    let input = TensorDescriptor::nchw(MAX_SEQ_SUM, 8, 1, 1);
    let mut output = TensorDescriptor::default();

    gru.compute_output_shape(&[&input], &mut [&mut output], &packed_param(30, 1))
        .unwrap();

    assert_eq!(output.shape(), Shape::new(MAX_SEQ_SUM, 10, 1, 1));
}

#[test]
fn packed_over_capacity_fails_without_mutating_output() {
    let mut gru = Gru::<HostDevice>::new();
    let input = TensorDescriptor::nchw(1500, 64, 1, 1);
    let mut output = TensorDescriptor::nchw(7, 7, 7, 7);

    let err = gru
        .compute_output_shape(&[&input], &mut [&mut output], &packed_param(300, 1))
        .expect_err("sequence sum above capacity must fail");

    assert!(matches!(err, OpError::InvalidShape(_)), "got {err:?}");
    assert_eq!(output.shape(), Shape::new(7, 7, 7, 7));
}

#[test]
fn invalid_direction_or_bias_fails_without_mutating_output() {
    let input = TensorDescriptor::nchw(1, 30, 16, 64);
    let cases = [
        (packed_param(300, 0), None),
        (packed_param(300, 3), None),
        (packed_param(301, 1), None),
        (packed_param(6, usize::MAX), None),
        (packed_param(300, 3), Some(&input)),
        (fixed_param(301, 2), Some(&input)),
    ];

    for (param, input) in cases {
        let mut gru = Gru::<HostDevice>::new();
        let mut output = TensorDescriptor::nchw(7, 7, 7, 7);
        let inputs: Vec<&TensorDescriptor> = input.into_iter().collect();

        let err = gru
            .compute_output_shape(&inputs, &mut [&mut output], &param)
            .expect_err("parameter bundle must be rejected");

        assert!(matches!(err, OpError::InvalidParam(_)), "got {err:?}");
        assert_eq!(output.shape(), Shape::new(7, 7, 7, 7));
        assert!(!gru.core().is_shape_ready());
    }
}

#[test]
fn fixed_batch_reinterprets_trailing_axes() {
    let mut gru = Gru::<HostDevice>::new();
    let input = TensorDescriptor::nchw(1, 30, 16, 64);
    let mut output = TensorDescriptor::default();

    gru.compute_output_shape(&[&input], &mut [&mut output], &fixed_param(300, 1))
        .unwrap();

    assert_eq!(output.shape(), Shape::new(1, 30, 16, 100));
}

#[test]
fn fixed_batch_output_follows_input_axes() {
    let mut gru = Gru::<HostDevice>::new();
    for (dims, bias_len, direction) in [
        ([4, 5, 6, 7], 9, 2),
        ([1, 1, 1, 1], 3, 1),
        ([2, 12, 3, 40], 48, 2),
    ] {
        let input = TensorDescriptor::nchw(dims[0], dims[1], dims[2], dims[3]);
        let mut output = TensorDescriptor::default();
        gru.compute_output_shape(&[&input], &mut [&mut output], &fixed_param(bias_len, direction))
            .unwrap();
        assert_eq!(
            output.shape(),
            Shape::new(1, dims[1], dims[2], bias_len / 3 * direction)
        );
    }
}

#[test]
fn fixed_batch_requires_input() {
    let mut gru = Gru::<HostDevice>::new();
    let mut output = TensorDescriptor::default();

    let err = gru
        .compute_output_shape(&[], &mut [&mut output], &fixed_param(300, 1))
        .expect_err("fixed-batch inference needs an input");
    assert!(matches!(err, OpError::InvalidShape(_)));
}

#[test]
fn missing_output_is_rejected() {
    let mut gru = Gru::<HostDevice>::new();

    let err = gru
        .compute_output_shape(&[], &mut [], &packed_param(300, 1))
        .expect_err("an output descriptor is required");
    assert!(matches!(err, OpError::InvalidShape(_)));
}

#[test]
fn inference_is_idempotent() {
    let mut gru = Gru::<HostDevice>::new();
    let input = TensorDescriptor::nchw(120, 32, 1, 1);
    let param = packed_param(96, 2);
    let mut first = TensorDescriptor::default();
    let mut second = TensorDescriptor::default();

    gru.compute_output_shape(&[&input], &mut [&mut first], &param)
        .unwrap();
    gru.compute_output_shape(&[&input], &mut [&mut second], &param)
        .unwrap();

    assert_eq!(first, second);
}

#[test]
fn inference_keeps_output_dtype_and_layout() {
    let mut gru = Gru::<HostDevice>::new();
    let mut output = TensorDescriptor::nchw(1, 1, 1, 1).with_dtype(gru_rs::DType::F16);

    gru.compute_output_shape(&[], &mut [&mut output], &packed_param(30, 1))
        .unwrap();

    assert_eq!(output.dtype(), gru_rs::DType::F16);
    assert_eq!(output.layout(), gru_rs::Layout::Nchw);
}
