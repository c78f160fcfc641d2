/// Returns the L2 norm, accumulated in f64.
pub fn l2_norm(v: &[f32]) -> f64 {
    v.iter().map(|&x| (x as f64) * (x as f64)).sum::<f64>().sqrt()
}

/// Normalizes a vector to unit length in-place. Zero vectors are left as is.
pub fn l2_normalize(v: &mut [f32]) {
    let norm = l2_norm(v);
    if norm > 0.0 {
        let scale = (1.0 / norm) as f32;
        for x in v.iter_mut() {
            *x *= scale;
        }
    }
}

/// Averages equally sized vectors and L2-normalizes the mean.
///
/// Returns `None` for an empty input, mixed lengths, or a zero mean.
pub fn mean_normalized(vectors: &[Vec<f32>]) -> Option<Vec<f32>> {
    let first = vectors.first()?;
    let dim = first.len();
    if dim == 0 || vectors.iter().any(|v| v.len() != dim) {
        return None;
    }

    let mut sum = vec![0.0f64; dim];
    for v in vectors {
        for (acc, &x) in sum.iter_mut().zip(v) {
            *acc += x as f64;
        }
    }
    let n = vectors.len() as f64;
    let mut mean: Vec<f32> = sum.into_iter().map(|s| (s / n) as f32).collect();

    if l2_norm(&mean) == 0.0 {
        return None;
    }
    l2_normalize(&mut mean);
    Some(mean)
}
