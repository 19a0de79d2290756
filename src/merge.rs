use serde_json::{Map, Value};

/// Deep-merge `overlay` on top of `base`.
///
/// If both sides have an object for the same key, recurse. An explicit `null`
/// in the overlay takes the value found at the same position in `zero` (the
/// field's default), or stays `null` when `zero` has nothing there.
/// Otherwise, `overlay`'s value wins.
pub fn deep_merge(
    mut base: Map<String, Value>,
    overlay: Map<String, Value>,
    zero: Option<&Map<String, Value>>,
) -> Map<String, Value> {
    for (key, overlay_val) in overlay {
        let zero_val = zero.and_then(|z| z.get(&key));
        match (base.remove(&key), overlay_val) {
            (Some(Value::Object(base_obj)), Value::Object(overlay_obj)) => {
                let zero_obj = zero_val.and_then(Value::as_object);
                base.insert(key, Value::Object(deep_merge(base_obj, overlay_obj, zero_obj)));
            }
            (_, Value::Null) => {
                base.insert(key, zero_val.cloned().unwrap_or(Value::Null));
            }
            (_, overlay_val) => {
                base.insert(key, overlay_val);
            }
        }
    }
    base
}
