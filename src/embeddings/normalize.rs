// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

/// Euclidean length of a vector
pub fn l2_norm(vector: &[f32]) -> f32 {
    vector.iter().map(|x| x * x).sum::<f32>().sqrt()
}

/// Scales a vector to unit L2 length in place. Zero vectors are left as is.
pub fn l2_normalize(vector: &mut [f32]) {
    let norm = l2_norm(vector);
    if norm > 0.0 {
        for value in vector.iter_mut() {
            *value /= norm;
        }
    }
}
