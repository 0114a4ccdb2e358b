use pgvector::Vector;

/// Euclidean (L2) distance between two embeddings.
///
/// Matches pgvector's `<->` operator so in-process ranking agrees with the
/// database. Vectors of different lengths are infinitely far apart.
pub fn euclidean_distance(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return f32::INFINITY;
    }

    a.iter()
        .zip(b)
        .map(|(x, y)| {
            let d = x - y;
            d * d
        })
        .sum::<f32>()
        .sqrt()
}

/// Convert a raw embedding into the pgvector column type.
pub fn to_pg_vector(embedding: &[f32]) -> Vector {
    Vector::from(embedding.to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distance_of_identical_vectors_is_zero() {
        let v = [0.25, -1.0, 3.5];
        assert_eq!(euclidean_distance(&v, &v), 0.0);
    }

    #[test]
    fn test_distance_three_four_five() {
        assert_eq!(euclidean_distance(&[0.0, 0.0], &[3.0, 4.0]), 5.0);
    }

    #[test]
    fn test_mismatched_lengths_are_infinitely_far() {
        assert!(euclidean_distance(&[1.0], &[1.0, 2.0]).is_infinite());
    }

    #[test]
    fn test_pg_vector_preserves_values() {
        let vector = to_pg_vector(&[0.5, 1.5]);
        assert_eq!(vector.as_slice(), &[0.5, 1.5]);
    }
}
