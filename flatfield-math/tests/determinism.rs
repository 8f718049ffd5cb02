use flatfield_math::{divide, multiply, Fixed, FixedBuffer, FP32_FWL, FP32_NAN};

// Determinism tests for Q24.8 conversions and ops.
// Every value here is exactly representable in binary, so the expected
// words are independent of platform rounding.

#[test]
fn test_q248_determinism_rationals() {
    let q: i32 = 1 << 8; // FP32_FWL = 8

    let vals: [f64; 11] = [
        0.0, 1.0, -1.0, 0.5, -0.5, 0.25, -0.25, 1.25, -1.25, 82000.0, -8388607.0,
    ];

    let expected: Vec<i32> = vec![
        0,
        q,
        -q,
        q / 2,
        -q / 2,
        q / 4,
        -q / 4,
        q + q / 4,
        -q - q / 4,
        82000 * q,
        -8388607 * q,
    ];

    let buf = FixedBuffer::from_f64(&vals);
    assert_eq!(buf.data, expected, "Q24.8 encoding mismatch");
    assert_eq!(buf.to_f64(), vals.to_vec());
}

#[test]
fn test_q248_add_sub_mul_div_determinism() {
    let q: i32 = 1 << 8;

    // a = [1.25, -0.75], b = [0.25, 0.5]
    let a = FixedBuffer::from_f64(&[1.25, -0.75]);
    let b = FixedBuffer::from_f64(&[0.25, 0.5]);

    let add = a.add(&b).expect("add");
    assert_eq!(add.data, vec![(3 * q) / 2, -q / 4], "add determinism");

    let sub = a.sub(&b).expect("sub");
    assert_eq!(sub.data, vec![q, -q - q / 4], "sub determinism");

    let x = Fixed::from_f64(1.25).value().unwrap();
    let half = Fixed::from_f64(0.5).value().unwrap();
    assert_eq!(multiply(x, half, FP32_FWL).to_raw(), (q + q / 4) / 2);
    assert_eq!(divide(x, half, FP32_FWL).to_raw(), 2 * q + q / 2);
}

#[test]
fn test_sentinel_survives_buffer_roundtrip() {
    let buf = FixedBuffer { data: vec![FP32_NAN, 256] };
    let out = buf.to_f64();
    assert!(out[0].is_nan());
    assert_eq!(out[1], 1.0);
    assert_eq!(FixedBuffer::from_f64(&out).data, buf.data);
}
