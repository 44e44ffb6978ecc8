//! JSON tree helpers shared by loading, the secret scan and unused-key
//! detection.

use serde_json::{Map, Value};

/// A scalar in the merged tree, addressed by its RFC 6901 pointer.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Leaf<'a> {
    pub pointer: &'a str,
    pub value: &'a Value,
}

/// Owned pointer list plus borrowed values, in map-key order.
pub(crate) struct Leaves<'a> {
    items: Vec<(String, &'a Value)>,
}

impl<'a> Leaves<'a> {
    pub fn of(root: &'a Value) -> Self {
        let mut items = Vec::new();
        walk(root, String::new(), &mut items);
        Self { items }
    }

    pub fn iter(&self) -> impl Iterator<Item = Leaf<'_>> {
        self.items.iter().map(|(p, v)| Leaf {
            pointer: p.as_str(),
            value: *v,
        })
    }
}

fn walk<'a>(v: &'a Value, at: String, out: &mut Vec<(String, &'a Value)>) {
    match v {
        Value::Object(map) => {
            for (key, child) in map {
                walk(child, format!("{at}/{}", escape(key)), out);
            }
        }
        Value::Array(items) => {
            for (i, child) in items.iter().enumerate() {
                walk(child, format!("{at}/{i}"), out);
            }
        }
        _ => {
            let pointer = if at.is_empty() { "/".to_string() } else { at };
            out.push((pointer, v));
        }
    }
}

fn escape(token: &str) -> String {
    token.replace('~', "~0").replace('/', "~1")
}

/// Overlay `layer` onto `base`. Objects merge key by key; anything else
/// (arrays included) replaces what was there.
pub(crate) fn overlay(base: &mut Value, layer: Value) {
    match (base, layer) {
        (Value::Object(dst), Value::Object(src)) => merge_maps(dst, src),
        (slot, other) => *slot = other,
    }
}

fn merge_maps(dst: &mut Map<String, Value>, src: Map<String, Value>) {
    for (key, incoming) in src {
        match dst.get_mut(&key) {
            Some(existing) => overlay(existing, incoming),
            None => {
                dst.insert(key, incoming);
            }
        }
    }
}
