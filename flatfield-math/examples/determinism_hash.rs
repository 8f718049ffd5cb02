use flatfield_math::{divide, multiply, Fixed, FixedBuffer, FP32_FWL};

fn main() {
    let vals: Vec<f64> = vec![
        0.0, 1.0, -1.0, 0.5, -0.5, 0.25, -0.25, 0.75, -0.75, 1.25, -1.25, 100.0, -128.0,
    ];
    let buf = FixedBuffer::from_f64(&vals);

    // Mix in multiply/divide so the digest covers the kernel, not just encoding.
    let third = Fixed::from_int(3).value().unwrap_or(Fixed::ONE);
    let mut words = buf.data.clone();
    for &w in &buf.data {
        let v = Fixed::from_raw(w).unwrap_or(Fixed::ZERO);
        words.push(multiply(v, third, FP32_FWL).to_raw());
        words.push(divide(v, third, FP32_FWL).to_raw());
    }

    let mut bytes = Vec::with_capacity(words.len() * 4);
    for v in &words { bytes.extend_from_slice(&v.to_le_bytes()); }
    let digest = sha256(&bytes);
    println!("Q248_HASH {}", digest);
}

fn sha256(data: &[u8]) -> String {
    use sha2::{Digest, Sha256};
    let mut hasher = Sha256::new();
    hasher.update(data);
    let out = hasher.finalize();
    hex::encode(out)
}
