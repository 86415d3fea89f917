//! Wire Format
//!
//! JSON records exchanged with the backend, and the validator that turns
//! them into `Cat` values. Every field is checked and normalised explicitly;
//! a record either yields a complete `Cat` or a `MalformedRecord` error
//! naming the offending field.

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::error::{CatError, Result};
use crate::models::{non_blank, BestImage, Cat, CatId, CatSighting, Friendliness};
use crate::values::{kind_of, parse_timestamp, unix_seconds, LatLng};

/// Cat record as sent by the backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatRecord {
    pub id: u32,
    pub name: String,
    pub colour: String,
    pub markings: Option<String>,
    pub collar: Option<String>,
    pub description: Option<String>,
    pub best_image: Option<(usize, usize)>,
    pub sightings: Vec<SightingRecord>,
}

/// Sighting record as sent by the backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SightingRecord {
    /// `[lat, lng]`
    pub pos: (f64, f64),
    pub who: Option<String>,
    /// Unix seconds
    pub when: i64,
    #[serde(default)]
    pub image_urls: Vec<String>,
    pub friendliness: Option<u8>,
    pub notes: Option<String>,
}

// ========================
// Deserialization
// ========================

/// Build a `Cat` from a backend JSON value
pub fn deserialize_cat(value: &Value) -> Result<Cat> {
    let obj = as_object(value, "")?;

    let id = required_u32(obj, "id", "id")?;
    let mut cat = Cat::new(
        CatId(id),
        required_str(obj, "name", "name")?,
        required_str(obj, "colour", "colour")?,
    );
    cat.markings = non_blank(optional_str(obj, "markings", "markings")?);
    cat.collar = non_blank(optional_str(obj, "collar", "collar")?);
    cat.description = non_blank(optional_str(obj, "description", "description")?);

    let sightings = match obj.get("sightings") {
        Some(Value::Array(items)) => items
            .iter()
            .enumerate()
            .map(|(i, item)| deserialize_sighting(item, &format!("sightings[{}]", i)))
            .collect::<Result<Vec<_>>>()?,
        Some(other) => {
            return Err(CatError::malformed(
                "sightings",
                format!("expected an array, found {}", kind_of(other)),
            ))
        }
        None => return Err(CatError::malformed("sightings", "missing field")),
    };

    let best_image = optional_best_image(obj)?;
    if let Some(best) = best_image {
        let in_bounds = sightings
            .get(best.sighting)
            .is_some_and(|s| best.image < s.image_urls.len());
        if !in_bounds {
            return Err(CatError::malformed(
                "best_image",
                format!(
                    "[{}, {}] does not point at an existing image",
                    best.sighting, best.image
                ),
            ));
        }
    }

    let cat = Cat::assemble(cat, sightings, best_image)?;
    log::debug!(
        "loaded cat {} with {} sightings",
        cat.id(),
        cat.sightings().len()
    );
    Ok(cat)
}

/// Parse and validate a JSON string
pub fn cat_from_str(json: &str) -> Result<Cat> {
    let value: Value = serde_json::from_str(json)
        .map_err(|e| CatError::malformed("", format!("invalid JSON: {}", e)))?;
    deserialize_cat(&value)
}

/// Validate a typed record the same way a JSON value is validated
pub fn cat_from_record(record: &CatRecord) -> Result<Cat> {
    deserialize_cat(&json!(record))
}

/// Parse the backend's cat id listing
pub fn parse_cat_list(value: &Value) -> Result<Vec<CatId>> {
    let items = value.as_array().ok_or_else(|| {
        CatError::malformed("", format!("expected an array, found {}", kind_of(value)))
    })?;
    items
        .iter()
        .enumerate()
        .map(|(i, item)| to_u32(item, &format!("[{}]", i)).map(CatId))
        .collect()
}

fn deserialize_sighting(value: &Value, path: &str) -> Result<CatSighting> {
    let obj = as_object(value, path)?;

    let pos_path = format!("{}.pos", path);
    let position = match obj.get("pos") {
        Some(Value::Array(pair)) if pair.len() == 2 => {
            let lat = to_f64(&pair[0], &format!("{}[0]", pos_path))?;
            let lng = to_f64(&pair[1], &format!("{}[1]", pos_path))?;
            LatLng::new(lat, lng).map_err(|e| CatError::malformed(&pos_path, e.to_string()))?
        }
        Some(_) => {
            return Err(CatError::malformed(
                pos_path,
                "expected a two-element [lat, lng] array",
            ))
        }
        None => return Err(CatError::malformed(pos_path, "missing field")),
    };

    let when_path = format!("{}.when", path);
    let observed_at = match obj.get("when") {
        Some(v) => parse_timestamp(v).map_err(|reason| CatError::malformed(&when_path, reason))?,
        None => return Err(CatError::malformed(when_path, "missing field")),
    };

    let urls_path = format!("{}.image_urls", path);
    let image_urls = match obj.get("image_urls") {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(items)) => items
            .iter()
            .enumerate()
            .map(|(i, item)| match item {
                Value::String(s) => Ok(s.clone()),
                other => Err(CatError::malformed(
                    format!("{}[{}]", urls_path, i),
                    format!("expected a string, found {}", kind_of(other)),
                )),
            })
            .collect::<Result<Vec<_>>>()?,
        Some(other) => {
            return Err(CatError::malformed(
                urls_path,
                format!("expected an array, found {}", kind_of(other)),
            ))
        }
    };

    let rating_path = format!("{}.friendliness", path);
    let friendliness = match obj.get("friendliness") {
        None | Some(Value::Null) => None,
        Some(v) => {
            let raw = v
                .as_u64()
                .and_then(|n| u8::try_from(n).ok())
                .ok_or_else(|| {
                    CatError::malformed(&rating_path, format!("expected an integer 1..=5, found {}", v))
                })?;
            Some(Friendliness::try_from(raw).map_err(|_| {
                CatError::malformed(&rating_path, format!("{} is outside 1..=5", raw))
            })?)
        }
    };

    Ok(CatSighting {
        position,
        observer: non_blank(optional_str(obj, "who", &format!("{}.who", path))?),
        observed_at,
        image_urls,
        friendliness,
        notes: non_blank(optional_str(obj, "notes", &format!("{}.notes", path))?),
    })
}

fn optional_best_image(obj: &Map<String, Value>) -> Result<Option<BestImage>> {
    match obj.get("best_image") {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Array(pair)) if pair.len() == 2 => {
            let sighting = to_index(&pair[0], "best_image[0]")?;
            let image = to_index(&pair[1], "best_image[1]")?;
            Ok(Some(BestImage::new(sighting, image)))
        }
        Some(_) => Err(CatError::malformed(
            "best_image",
            "expected null or a two-element [sighting, image] array",
        )),
    }
}

fn as_object<'a>(value: &'a Value, path: &str) -> Result<&'a Map<String, Value>> {
    value.as_object().ok_or_else(|| {
        CatError::malformed(path, format!("expected an object, found {}", kind_of(value)))
    })
}

fn required_str(obj: &Map<String, Value>, key: &str, path: &str) -> Result<String> {
    optional_str(obj, key, path)?.ok_or_else(|| CatError::malformed(path, "missing field"))
}

fn optional_str(obj: &Map<String, Value>, key: &str, path: &str) -> Result<Option<String>> {
    match obj.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(other) => Err(CatError::malformed(
            path,
            format!("expected a string, found {}", kind_of(other)),
        )),
    }
}

fn required_u32(obj: &Map<String, Value>, key: &str, path: &str) -> Result<u32> {
    match obj.get(key) {
        Some(v) => to_u32(v, path),
        None => Err(CatError::malformed(path, "missing field")),
    }
}

fn to_u32(value: &Value, path: &str) -> Result<u32> {
    value
        .as_u64()
        .and_then(|n| u32::try_from(n).ok())
        .ok_or_else(|| CatError::malformed(path, format!("expected an unsigned integer, found {}", value)))
}

fn to_index(value: &Value, path: &str) -> Result<usize> {
    value
        .as_u64()
        .and_then(|n| usize::try_from(n).ok())
        .ok_or_else(|| CatError::malformed(path, format!("expected an index, found {}", value)))
}

fn to_f64(value: &Value, path: &str) -> Result<f64> {
    value
        .as_f64()
        .ok_or_else(|| CatError::malformed(path, format!("expected a number, found {}", kind_of(value))))
}

// ========================
// Serialization
// ========================

/// Typed record for a cat; timestamps become whole Unix seconds
pub fn cat_to_record(cat: &Cat) -> CatRecord {
    CatRecord {
        id: cat.id().0,
        name: cat.name.clone(),
        colour: cat.colour.clone(),
        markings: cat.markings.clone(),
        collar: cat.collar.clone(),
        description: cat.description.clone(),
        best_image: cat.best_image().map(|b| (b.sighting, b.image)),
        sightings: cat
            .sightings()
            .iter()
            .map(|s| SightingRecord {
                pos: (s.position.lat(), s.position.lng()),
                who: s.observer.clone(),
                when: unix_seconds(&s.observed_at),
                image_urls: s.image_urls.clone(),
                friendliness: s.friendliness.map(|f| f.value()),
                notes: s.notes.clone(),
            })
            .collect(),
    }
}

/// JSON value for a cat, ready to send to the backend
pub fn serialize_cat(cat: &Cat) -> Value {
    json!(cat_to_record(cat))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::derived;
    use crate::values::timestamp_from_unix;

    fn record() -> Value {
        json!({
            "id": 3,
            "name": "Biscuit",
            "colour": "White",
            "markings": "tabby",
            "collar": null,
            "description": "Lives by the bakery",
            "best_image": null,
            "sightings": [
                {
                    "pos": [51.5, -0.12],
                    "who": "ana",
                    "when": 1_700_000_000,
                    "image_urls": ["a.jpg", "b.jpg"],
                    "friendliness": 3,
                    "notes": null
                },
                {
                    "pos": [51.6, -0.13],
                    "who": null,
                    "when": 1_700_000_500,
                    "image_urls": [],
                    "friendliness": null,
                    "notes": "  "
                }
            ]
        })
    }

    fn with_field(mut value: Value, key: &str, field: Value) -> Value {
        value[key] = field;
        value
    }

    fn malformed_path(result: Result<Cat>) -> String {
        match result {
            Err(CatError::MalformedRecord { path, .. }) => path,
            other => panic!("expected MalformedRecord, got {:?}", other),
        }
    }

    #[test]
    fn test_deserialize_full_record() {
        let cat = deserialize_cat(&record()).unwrap();
        assert_eq!(cat.id(), CatId(3));
        assert_eq!(cat.name, "Biscuit");
        assert_eq!(cat.markings.as_deref(), Some("tabby"));
        assert!(cat.collar.is_none());
        assert_eq!(cat.sightings().len(), 2);

        let first = &cat.sightings()[0];
        assert_eq!(first.position.as_pair(), [51.5, -0.12]);
        assert_eq!(first.observer.as_deref(), Some("ana"));
        assert_eq!(first.observed_at, timestamp_from_unix(1_700_000_000).unwrap());
        assert_eq!(first.friendliness.map(|f| f.value()), Some(3));

        let second = &cat.sightings()[1];
        assert!(second.observer.is_none());
        assert!(second.notes.is_none());
        assert!(!cat.is_selected());
    }

    #[test]
    fn test_markings_normalisation() {
        let cat = deserialize_cat(&with_field(record(), "markings", json!(""))).unwrap();
        assert!(cat.markings.is_none());

        let cat = deserialize_cat(&with_field(record(), "markings", Value::Null)).unwrap();
        assert!(cat.markings.is_none());

        let mut missing = record();
        missing.as_object_mut().unwrap().remove("markings");
        assert!(deserialize_cat(&missing).unwrap().markings.is_none());

        let cat = deserialize_cat(&with_field(record(), "collar", json!("red, with bell"))).unwrap();
        assert_eq!(cat.collar.as_deref(), Some("red, with bell"));
    }

    #[test]
    fn test_description_may_be_absent() {
        let cat = deserialize_cat(&with_field(record(), "description", Value::Null)).unwrap();
        assert!(cat.description.is_none());

        let cat = deserialize_cat(&with_field(record(), "description", json!(""))).unwrap();
        assert!(cat.description.is_none());
    }

    #[test]
    fn test_best_image_fallback_on_load() {
        let cat = deserialize_cat(&record()).unwrap();
        assert_eq!(cat.best_image(), Some(BestImage::new(0, 0)));
        assert_eq!(derived::best_image_url(&cat), Some("a.jpg"));
    }

    #[test]
    fn test_explicit_best_image_is_kept() {
        let cat = deserialize_cat(&with_field(record(), "best_image", json!([0, 1]))).unwrap();
        assert_eq!(cat.best_image(), Some(BestImage::new(0, 1)));
    }

    #[test]
    fn test_out_of_bounds_best_image_rejected_at_load() {
        let path = malformed_path(deserialize_cat(&with_field(record(), "best_image", json!([1, 0]))));
        assert_eq!(path, "best_image");

        let path = malformed_path(deserialize_cat(&with_field(record(), "best_image", json!([5, 0]))));
        assert_eq!(path, "best_image");

        let path = malformed_path(deserialize_cat(&with_field(record(), "best_image", json!([-1, 0]))));
        assert_eq!(path, "best_image[0]");
    }

    #[test]
    fn test_bad_position_names_field() {
        let mut value = record();
        value["sightings"][1]["pos"] = json!(["north", 0.0]);
        assert_eq!(malformed_path(deserialize_cat(&value)), "sightings[1].pos[0]");

        let mut value = record();
        value["sightings"][0]["pos"] = json!([95.0, 0.0]);
        assert_eq!(malformed_path(deserialize_cat(&value)), "sightings[0].pos");

        let mut value = record();
        value["sightings"][0]["pos"] = json!([1.0]);
        assert_eq!(malformed_path(deserialize_cat(&value)), "sightings[0].pos");
    }

    #[test]
    fn test_bad_timestamp_names_field() {
        let mut value = record();
        value["sightings"][1]["when"] = json!("last tuesday");
        assert_eq!(malformed_path(deserialize_cat(&value)), "sightings[1].when");
    }

    #[test]
    fn test_rfc3339_timestamp_accepted() {
        let mut value = record();
        value["sightings"][0]["when"] = json!("2023-11-14T22:13:20Z");
        let cat = deserialize_cat(&value).unwrap();
        assert_eq!(unix_seconds(&cat.sightings()[0].observed_at), 1_700_000_000);
    }

    #[test]
    fn test_friendliness_out_of_range_rejected() {
        let mut value = record();
        value["sightings"][0]["friendliness"] = json!(6);
        assert_eq!(malformed_path(deserialize_cat(&value)), "sightings[0].friendliness");

        let mut value = record();
        value["sightings"][0]["friendliness"] = json!(2.5);
        assert_eq!(malformed_path(deserialize_cat(&value)), "sightings[0].friendliness");
    }

    #[test]
    fn test_wrong_shapes_rejected() {
        assert_eq!(malformed_path(deserialize_cat(&json!([1, 2]))), "");
        assert_eq!(malformed_path(deserialize_cat(&with_field(record(), "id", json!("3")))), "id");
        assert_eq!(
            malformed_path(deserialize_cat(&with_field(record(), "sightings", json!({})))),
            "sightings"
        );

        let mut missing_name = record();
        missing_name.as_object_mut().unwrap().remove("name");
        assert_eq!(malformed_path(deserialize_cat(&missing_name)), "name");
    }

    #[test]
    fn test_zero_sightings_tolerated() {
        let cat = deserialize_cat(&with_field(record(), "sightings", json!([]))).unwrap();
        assert!(cat.sightings().is_empty());
        assert!(cat.best_image().is_none());
    }

    #[test]
    fn test_round_trip() {
        let cat = deserialize_cat(&with_field(record(), "best_image", json!([0, 1]))).unwrap();
        let again = deserialize_cat(&serialize_cat(&cat)).unwrap();
        assert_eq!(cat, again);
    }

    #[test]
    fn test_round_trip_drops_sub_seconds() {
        let mut value = record();
        value["sightings"][0]["when"] = json!(1_700_000_000.75);
        let cat = deserialize_cat(&value).unwrap();
        let wire = serialize_cat(&cat);
        assert_eq!(wire["sightings"][0]["when"], json!(1_700_000_000));

        let again = deserialize_cat(&wire).unwrap();
        assert_eq!(
            again.sightings()[0].observed_at,
            timestamp_from_unix(1_700_000_000).unwrap()
        );
    }

    #[test]
    fn test_serialized_shape() {
        let cat = deserialize_cat(&record()).unwrap();
        let wire = serialize_cat(&cat);
        assert_eq!(wire["best_image"], json!([0, 0]));
        assert_eq!(wire["collar"], Value::Null);
        assert_eq!(wire["sightings"][0]["pos"], json!([51.5, -0.12]));
        assert_eq!(wire["sightings"][1]["notes"], Value::Null);
        assert_eq!(wire["sightings"][1]["friendliness"], Value::Null);
    }

    #[test]
    fn test_cat_from_str_reports_bad_json() {
        assert!(matches!(
            cat_from_str("{not json"),
            Err(CatError::MalformedRecord { .. })
        ));
    }

    #[test]
    fn test_parse_cat_list() {
        assert_eq!(
            parse_cat_list(&json!([1, 4, 9])).unwrap(),
            vec![CatId(1), CatId(4), CatId(9)]
        );
        assert!(parse_cat_list(&json!([1, "x"])).is_err());
    }
}
