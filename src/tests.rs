//! End-to-end Tests
//!
//! Backend JSON in, map markers and derived attributes out, JSON back.

#[cfg(test)]
mod tests {
    use crate::testing::{MarkerEvent, RecordingSurface};
    use crate::{
        best_image_url, friendliness, friendliness_label, serialize_cat, BestImage, CatError,
        CatStore, MapLayer, PresentationConfig,
    };
    use serde_json::{json, Value};

    fn scenario_record(best_image: Value) -> Value {
        json!({
            "id": 12,
            "name": "Smudge",
            "colour": "Black",
            "markings": "",
            "collar": "blue",
            "description": "Friendly once fed",
            "best_image": best_image,
            "sightings": [
                {
                    "pos": [48.85, 2.35],
                    "who": "lou",
                    "when": 1_700_000_000,
                    "image_urls": ["front.jpg", "side.jpg"],
                    "friendliness": 3,
                    "notes": "Came when called"
                },
                {
                    "pos": [48.86, 2.36],
                    "who": null,
                    "when": 1_700_086_400,
                    "image_urls": [],
                    "friendliness": 5,
                    "notes": null
                }
            ]
        })
    }

    fn layer() -> MapLayer<RecordingSurface> {
        MapLayer::new(RecordingSurface::default(), PresentationConfig::default())
    }

    #[test]
    fn test_two_sighting_scenario() {
        let mut layer = layer();
        let mut cat = layer.load_cat(&scenario_record(Value::Null)).unwrap();

        assert_eq!(friendliness(&cat).map(|f| f.value()), Some(3));
        assert_eq!(friendliness_label(&cat), Some("Indifferent"));
        assert_eq!(cat.best_image(), Some(BestImage::new(0, 0)));
        assert_eq!(best_image_url(&cat), Some("front.jpg"));
        assert!(cat.markings.is_none());
        assert_eq!(layer.marker_count(), 2);

        layer.select_all(&mut cat);
        for marker in 0..2 {
            assert_eq!(
                layer.surface().current_icon(marker).as_deref(),
                Some("/catmap/catmeow_highlight.png")
            );
        }
        assert_eq!(layer.surface().open_popups(), 2);

        layer.deselect_all(&mut cat);
        assert_eq!(layer.surface().open_popups(), 0);

        let saved = serialize_cat(&cat);
        assert_eq!(saved["best_image"], json!([0, 0]));
        assert_eq!(saved["markings"], Value::Null);
        assert!(saved.get("selected").is_none());
    }

    #[test]
    fn test_explicit_best_image_survives_load_and_save() {
        let mut record = scenario_record(json!([1, 2]));
        record["sightings"][1]["image_urls"] = json!(["a.jpg", "b.jpg", "c.jpg"]);

        let mut layer = layer();
        let cat = layer.load_cat(&record).unwrap();
        assert_eq!(cat.best_image(), Some(BestImage::new(1, 2)));
        assert_eq!(best_image_url(&cat), Some("c.jpg"));

        let reloaded = layer.load_cat(&serialize_cat(&cat)).unwrap();
        assert_eq!(reloaded, cat);
    }

    #[test]
    fn test_best_image_pointing_past_images_fails_at_load() {
        let mut layer = layer();
        let result = layer.load_cat(&scenario_record(json!([1, 0])));
        assert!(matches!(
            result,
            Err(CatError::MalformedRecord { ref path, .. }) if path == "best_image"
        ));
        assert_eq!(layer.marker_count(), 0);
    }

    #[test]
    fn test_popup_content_reflects_cat() {
        let mut layer = layer();
        layer.load_cat(&scenario_record(Value::Null)).unwrap();

        let content = layer
            .surface()
            .events_for(0)
            .into_iter()
            .find_map(|e| match e {
                MarkerEvent::Content(html) => Some(html),
                _ => None,
            })
            .unwrap();
        assert!(content.contains("<h3>Smudge</h3>"));
        assert!(content.contains("collar: blue"));
        assert!(content.contains("Indifferent"));
        assert!(content.contains("Seen 2023-11-14 22:13 UTC by lou"));
        assert!(content.contains("<p>Came when called</p>"));
    }

    #[test]
    fn test_batch_round_trip_through_store() {
        let mut layer = layer();
        let mut store = CatStore::new();
        let mut second = scenario_record(Value::Null);
        second["id"] = json!(13);

        store
            .load_batch(&json!([scenario_record(Value::Null), second]), &mut layer)
            .unwrap();
        let saved: Vec<Value> = store.iter().map(serialize_cat).collect();

        let mut other_layer = self::layer();
        let mut reloaded = CatStore::new();
        let report = reloaded
            .load_batch(&Value::Array(saved), &mut other_layer)
            .unwrap();

        assert!(report.skipped.is_empty());
        for cat in store.iter() {
            assert_eq!(reloaded.get(cat.id()), Some(cat));
        }
    }
}
