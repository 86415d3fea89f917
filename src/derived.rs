//! Derived attributes
//!
//! Pure functions over a `Cat`. None of them fail on a well-formed cat;
//! they return `None` when there is nothing to derive.

use crate::models::{BestImage, Cat, Friendliness};

/// Representative friendliness across all rated sightings.
///
/// Lower median: ratings are sorted ascending and the element at
/// `(n - 1) / 2` is taken, so `[2, 4]` yields `2`, never an average.
pub fn friendliness(cat: &Cat) -> Option<Friendliness> {
    let mut ratings: Vec<Friendliness> = cat
        .sightings()
        .iter()
        .filter_map(|s| s.friendliness)
        .collect();
    if ratings.is_empty() {
        return None;
    }
    ratings.sort_unstable();
    Some(ratings[(ratings.len() - 1) / 2])
}

/// Label for `friendliness(cat)`
pub fn friendliness_label(cat: &Cat) -> Option<&'static str> {
    friendliness(cat).map(|rating| rating.label())
}

/// The best-image pointer a cat should carry.
///
/// An explicit pointer always wins. Otherwise the first image of the first
/// sighting is used, if there is one.
pub fn resolve_best_image(cat: &Cat) -> Option<BestImage> {
    if let Some(best) = cat.best_image() {
        return Some(best);
    }
    cat.sightings()
        .first()
        .filter(|s| s.has_images())
        .map(|_| BestImage::new(0, 0))
}

/// URL the best-image pointer refers to
pub fn best_image_url(cat: &Cat) -> Option<&str> {
    let best = cat.best_image()?;
    cat.sightings()
        .get(best.sighting)?
        .image_urls
        .get(best.image)
        .map(String::as_str)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CatId, CatSighting};
    use crate::values::{timestamp_from_unix, LatLng};

    fn sighting(rating: Option<u8>, images: &[&str]) -> CatSighting {
        let s = CatSighting::new(
            LatLng::new(0.0, 0.0).unwrap(),
            timestamp_from_unix(0).unwrap(),
        )
        .with_images(images.iter().copied());
        match rating {
            Some(r) => s.with_friendliness(Friendliness::try_from(r).unwrap()),
            None => s,
        }
    }

    fn cat_with(sightings: Vec<CatSighting>) -> Cat {
        let mut cat = Cat::new(CatId(1), "Tom", "Black");
        for s in sightings {
            cat.add_sighting(s);
        }
        cat
    }

    fn rating_of(cat: &Cat) -> Option<u8> {
        friendliness(cat).map(|f| f.value())
    }

    #[test]
    fn test_lower_median_on_even_count() {
        let cat = cat_with(vec![sighting(Some(4), &[]), sighting(Some(2), &[])]);
        assert_eq!(rating_of(&cat), Some(2));
    }

    #[test]
    fn test_median_single_and_odd() {
        assert_eq!(rating_of(&cat_with(vec![sighting(Some(5), &[])])), Some(5));

        let cat = cat_with(vec![
            sighting(Some(1), &[]),
            sighting(Some(5), &[]),
            sighting(Some(3), &[]),
        ]);
        assert_eq!(rating_of(&cat), Some(3));
    }

    #[test]
    fn test_unrated_sightings_are_ignored() {
        assert_eq!(rating_of(&cat_with(vec![])), None);
        assert_eq!(rating_of(&cat_with(vec![sighting(None, &[])])), None);

        let cat = cat_with(vec![sighting(None, &[]), sighting(Some(4), &[])]);
        assert_eq!(rating_of(&cat), Some(4));
        assert_eq!(friendliness_label(&cat), Some("Curious"));
    }

    #[test]
    fn test_label_absent_without_ratings() {
        assert_eq!(friendliness_label(&cat_with(vec![sighting(None, &[])])), None);
    }

    #[test]
    fn test_best_image_fallback_uses_first_sighting_only() {
        let cat = cat_with(vec![sighting(None, &["a.jpg"])]);
        assert_eq!(resolve_best_image(&cat), Some(BestImage::new(0, 0)));

        let cat = cat_with(vec![sighting(None, &[]), sighting(None, &["b.jpg"])]);
        assert_eq!(resolve_best_image(&cat), None);
    }

    #[test]
    fn test_explicit_best_image_wins() {
        let mut cat = cat_with(vec![
            sighting(None, &["a.jpg"]),
            sighting(None, &["b.jpg", "c.jpg", "d.jpg"]),
        ]);
        cat.set_best_image(Some(BestImage::new(1, 2))).unwrap();
        assert_eq!(resolve_best_image(&cat), Some(BestImage::new(1, 2)));
        assert_eq!(best_image_url(&cat), Some("d.jpg"));
    }

    #[test]
    fn test_best_image_url_absent_without_pointer() {
        let cat = cat_with(vec![sighting(None, &["a.jpg"])]);
        assert_eq!(best_image_url(&cat), None);
    }
}
