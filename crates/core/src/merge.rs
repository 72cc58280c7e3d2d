//! Deep-merge of partial JSON updates and upload URL placement.
//!
//! Objects merge key by key. Arrays and scalars are atomic: a patch value
//! replaces whatever the base held at that location. Upload placements run
//! after the merge, so a stored file always wins over a textual URL sent at
//! the same path.

use serde_json::{Map, Value};

use crate::error::CoreError;
use crate::path::{DocPath, PathSegment};

/// Merge `patch` into `base`, returning a new tree. Inputs are untouched.
pub fn deep_merge(base: &Value, patch: Option<&Value>) -> Value {
    let Some(patch) = patch else {
        return base.clone();
    };
    match (base, patch) {
        (Value::Object(base_map), Value::Object(patch_map)) => {
            Value::Object(merge_objects(base_map, patch_map))
        }
        _ => patch.clone(),
    }
}

fn merge_objects(base: &Map<String, Value>, patch: &Map<String, Value>) -> Map<String, Value> {
    let mut out = base.clone();
    for (key, patch_value) in patch {
        let merged = match (out.get(key), patch_value) {
            (Some(Value::Object(base_child)), Value::Object(patch_child)) => {
                Value::Object(merge_objects(base_child, patch_child))
            }
            _ => patch_value.clone(),
        };
        out.insert(key.clone(), merged);
    }
    out
}

/// Write each URL at its path, in order. Missing levels become objects.
pub fn resolve_uploads(
    mut document: Value,
    placements: &[(DocPath, String)],
) -> Result<Value, CoreError> {
    for (path, url) in placements {
        set_at_path(&mut document, path, Value::String(url.clone()))?;
    }
    Ok(document)
}

/// Set `value` at `path`, creating intermediate objects as needed.
pub fn set_at_path(root: &mut Value, path: &DocPath, value: Value) -> Result<(), CoreError> {
    if root.is_null() {
        *root = Value::Object(Map::new());
    }
    let segments = path.segments();
    let (leaf, parents) = segments
        .split_last()
        .ok_or_else(|| CoreError::InvalidPath("path has no segments".into()))?;

    let mut cur = root;
    for (depth, segment) in parents.iter().enumerate() {
        cur = step_into(cur, segment, path, depth)?;
    }
    assign(cur, leaf, value, path, parents.len())
}

fn conflict(path: &DocPath, segment: usize) -> CoreError {
    CoreError::PathConflict {
        path: path.to_string(),
        segment,
    }
}

fn step_into<'a>(
    cur: &'a mut Value,
    segment: &PathSegment,
    path: &DocPath,
    depth: usize,
) -> Result<&'a mut Value, CoreError> {
    match (cur, segment) {
        (Value::Array(items), PathSegment::Index(idx)) => {
            let child = items.get_mut(*idx).ok_or_else(|| conflict(path, depth))?;
            if child.is_null() {
                *child = Value::Object(Map::new());
            }
            Ok(child)
        }
        (Value::Object(map), segment) => {
            let child = map
                .entry(segment.as_key())
                .or_insert_with(|| Value::Object(Map::new()));
            if child.is_null() {
                *child = Value::Object(Map::new());
            }
            Ok(child)
        }
        _ => Err(conflict(path, depth)),
    }
}

fn assign(
    cur: &mut Value,
    leaf: &PathSegment,
    value: Value,
    path: &DocPath,
    depth: usize,
) -> Result<(), CoreError> {
    match (cur, leaf) {
        (Value::Array(items), PathSegment::Index(idx)) => {
            let slot = items.get_mut(*idx).ok_or_else(|| conflict(path, depth))?;
            *slot = value;
            Ok(())
        }
        (Value::Object(map), leaf) => {
            map.insert(leaf.as_key(), value);
            Ok(())
        }
        _ => Err(conflict(path, depth)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn path(s: &str) -> DocPath {
        DocPath::parse(s).unwrap()
    }

    #[test]
    fn empty_patch_is_identity() {
        let doc = json!({"a": {"b": 1}, "list": [1, 2], "s": "x"});
        assert_eq!(deep_merge(&doc, Some(&json!({}))), doc);
        assert_eq!(deep_merge(&doc, None), doc);
    }

    #[test]
    fn nested_overwrite_preserves_siblings() {
        let base = json!({"a": {"b": 1, "c": 2}});
        let merged = deep_merge(&base, Some(&json!({"a": {"b": 5}})));
        assert_eq!(merged, json!({"a": {"b": 5, "c": 2}}));
    }

    #[test]
    fn arrays_are_replaced_wholesale() {
        let base = json!({"a": [1, 2, 3]});
        let merged = deep_merge(&base, Some(&json!({"a": [9]})));
        assert_eq!(merged, json!({"a": [9]}));
    }

    #[test]
    fn null_overwrites_but_keeps_key() {
        let base = json!({"a": {"b": 1}, "keep": true});
        let merged = deep_merge(&base, Some(&json!({"a": null})));
        assert_eq!(merged, json!({"a": null, "keep": true}));
        assert!(merged.as_object().unwrap().contains_key("a"));
    }

    #[test]
    fn scalar_patch_replaces_composite_base() {
        assert_eq!(deep_merge(&json!({"a": 1}), Some(&json!("text"))), json!("text"));
        assert_eq!(deep_merge(&json!("old"), Some(&json!({"a": 1}))), json!({"a": 1}));
        assert_eq!(deep_merge(&Value::Null, Some(&json!({"a": 1}))), json!({"a": 1}));
    }

    #[test]
    fn object_patch_over_scalar_field_replaces() {
        let base = json!({"a": "flat"});
        let merged = deep_merge(&base, Some(&json!({"a": {"b": 1}})));
        assert_eq!(merged, json!({"a": {"b": 1}}));
    }

    #[test]
    fn merge_does_not_mutate_inputs() {
        let base = json!({"a": {"b": 1}});
        let patch = json!({"a": {"c": 2}});
        let _ = deep_merge(&base, Some(&patch));
        assert_eq!(base, json!({"a": {"b": 1}}));
        assert_eq!(patch, json!({"a": {"c": 2}}));
    }

    #[test]
    fn upload_overrides_textual_url() {
        let doc = json!({"img": "old"});
        let out = resolve_uploads(doc, &[(path("img"), "https://x/new".into())]).unwrap();
        assert_eq!(out, json!({"img": "https://x/new"}));
    }

    #[test]
    fn upload_creates_missing_objects() {
        let out = resolve_uploads(json!({}), &[(path("hero.media.image"), "u".into())]).unwrap();
        assert_eq!(out, json!({"hero": {"media": {"image": "u"}}}));
    }

    #[test]
    fn upload_descends_into_existing_array() {
        let doc = json!({"gallery": [{"image": "a", "alt": "first"}, {"image": "b"}]});
        let out = resolve_uploads(doc, &[(path("gallery.0.image"), "u".into())]).unwrap();
        assert_eq!(
            out,
            json!({"gallery": [{"image": "u", "alt": "first"}, {"image": "b"}]})
        );
    }

    #[test]
    fn numeric_segment_on_missing_level_creates_object_not_array() {
        let out = resolve_uploads(json!({}), &[(path("gallery.0.image"), "u".into())]).unwrap();
        assert_eq!(out, json!({"gallery": {"0": {"image": "u"}}}));
    }

    #[test]
    fn zero_padded_segment_keeps_its_key() {
        let doc = json!({"codes": {"007": "old"}});
        let out = resolve_uploads(doc, &[(path("codes.007"), "u".into())]).unwrap();
        assert_eq!(out, json!({"codes": {"007": "u"}}));
    }

    #[test]
    fn later_placement_wins_on_collision() {
        let placements = vec![(path("img"), "first".into()), (path("img"), "second".into())];
        let out = resolve_uploads(json!({}), &placements).unwrap();
        assert_eq!(out, json!({"img": "second"}));
    }

    #[test]
    fn traversing_scalar_is_a_conflict() {
        let err = resolve_uploads(json!({"a": "text"}), &[(path("a.b"), "u".into())]).unwrap_err();
        assert!(matches!(err, CoreError::PathConflict { segment: 1, .. }));
    }

    #[test]
    fn index_past_array_end_is_a_conflict() {
        let err = resolve_uploads(json!({"g": [{}]}), &[(path("g.4.image"), "u".into())])
            .unwrap_err();
        assert!(matches!(err, CoreError::PathConflict { segment: 1, .. }));
    }

    #[test]
    fn null_intermediate_is_replaced_by_object() {
        let out = resolve_uploads(json!({"a": null}), &[(path("a.b"), "u".into())]).unwrap();
        assert_eq!(out, json!({"a": {"b": "u"}}));
    }
}
