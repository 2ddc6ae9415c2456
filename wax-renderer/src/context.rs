//! Render-data composition.
//!
//! Every render sees three views of its data:
//!
//! | View      | Source                                              |
//! |-----------|-----------------------------------------------------|
//! | top level | shared context, then per-call data on top           |
//! | `global`  | `options.data.global` if given, else shared context |
//! | `local`   | `options.data.local` if given, else per-call data   |
//!
//! Each view also carries `_parent`, a copy of the shared context, which no
//! caller-supplied key can shadow.

use serde_json::{Map, Value};

use wax_core::{Namespace, RenderOptions};

/// Key the shared-context back-reference is stored under.
pub const PARENT_KEY: &str = "_parent";

/// Build the top-level data and the private render options for one call.
pub fn compose(
    shared: &Namespace<Value>,
    data: &Value,
    options: &RenderOptions,
) -> (Value, RenderOptions) {
    let shared_map: Map<String, Value> = shared
        .iter()
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();
    let parent = Value::Object(shared_map.clone());
    let call_map = as_map(data);

    let mut top = shared_map.clone();
    top.extend(call_map.clone());

    let mut private = options.data.clone().unwrap_or_default();
    let global = view(private.get("global"), &shared_map);
    let local = view(private.get("local"), &call_map);
    private.insert("global".to_string(), with_parent(global, &parent));
    private.insert("local".to_string(), with_parent(local, &parent));

    let mut options = options.clone();
    options.data = Some(private);
    (with_parent(top, &parent), options)
}

/// An explicit object wins; `null` or absence falls back; other values are empty.
fn view(explicit: Option<&Value>, fallback: &Map<String, Value>) -> Map<String, Value> {
    match explicit {
        Some(Value::Object(map)) => map.clone(),
        Some(Value::Null) | None => fallback.clone(),
        Some(_) => Map::new(),
    }
}

fn as_map(data: &Value) -> Map<String, Value> {
    match data {
        Value::Object(map) => map.clone(),
        _ => Map::new(),
    }
}

fn with_parent(mut map: Map<String, Value>, parent: &Value) -> Value {
    map.insert(PARENT_KEY.to_string(), parent.clone());
    Value::Object(map)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn shared() -> Namespace<Value> {
        Namespace::from([
            ("site".to_string(), json!("S")),
            ("title".to_string(), json!("shared")),
        ])
    }

    #[test]
    fn per_call_data_wins_at_top_level() {
        let (top, _) = compose(&shared(), &json!({ "title": "T" }), &RenderOptions::default());
        assert_eq!(top["title"], json!("T"));
        assert_eq!(top["site"], json!("S"));
        assert_eq!(top["_parent"], json!({ "site": "S", "title": "shared" }));
    }

    #[test]
    fn default_views_fall_back_to_shared_and_call_data() {
        let (_, opts) = compose(&shared(), &json!({ "title": "T" }), &RenderOptions::default());
        let private = opts.data.expect("private data");
        assert_eq!(private["global"]["site"], json!("S"));
        assert_eq!(private["global"]["_parent"]["site"], json!("S"));
        assert_eq!(private["local"]["title"], json!("T"));
        assert!(private["local"].get("site").is_none());
        assert_eq!(private["local"]["_parent"]["site"], json!("S"));
    }

    #[test]
    fn explicit_views_replace_defaults_but_keep_parent() {
        let opts = RenderOptions::default()
            .with_data("global", json!({ "g": 1, "_parent": "spoofed" }))
            .with_data("local", json!({ "l": 2 }))
            .with_data("extra", json!(true));
        let (_, opts) = compose(&shared(), &json!({ "title": "T" }), &opts);
        let private = opts.data.expect("private data");
        assert_eq!(private["global"]["g"], json!(1));
        assert!(private["global"].get("site").is_none());
        assert_eq!(private["global"]["_parent"]["site"], json!("S"));
        assert_eq!(private["local"]["l"], json!(2));
        assert_eq!(private["extra"], json!(true));
    }

    #[test]
    fn parent_cannot_be_shadowed_by_call_data() {
        let (top, _) = compose(&shared(), &json!({ "_parent": 1 }), &RenderOptions::default());
        assert_eq!(top["_parent"]["site"], json!("S"));
    }

    #[test]
    fn non_object_call_data_contributes_nothing() {
        let (top, opts) = compose(&shared(), &Value::Null, &RenderOptions::default());
        assert_eq!(top["site"], json!("S"));
        assert_eq!(opts.data.expect("private")["local"], json!({ "_parent": { "site": "S", "title": "shared" } }));
    }
}
