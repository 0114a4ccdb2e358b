use super::anchors::Anchors;
use super::categories::Category;
use crate::common::euclidean_distance;

/// Nearest anchor by Euclidean distance.
///
/// Ties resolve to the earlier category in declaration order. With no anchors
/// the post is `Uncategorized`.
pub fn classify(post_vector: &[f32], anchors: &Anchors) -> Category {
    let mut best: Option<(Category, f32)> = None;

    for (category, anchor) in anchors.iter() {
        let distance = euclidean_distance(post_vector, anchor);
        match best {
            Some((_, best_distance)) if distance >= best_distance => {}
            _ => best = Some((category, distance)),
        }
    }

    best.map(|(category, _)| category)
        .unwrap_or(Category::Uncategorized)
}
