//! Key resolution: which document entry a field reads from, and where it
//! writes to.
//!
//! A path wins over aliases. Aliases are tried in declared order and the
//! first present key wins, including a key whose value is `null`. When a
//! field ignores key case, a second pass repeats the alias scan comparing
//! case-insensitively against the object's keys in insertion order.
use serde_json::{Map, Value};
use tracing::trace;

use crate::document::{insert_path, navigate};
use crate::shape::FieldSpec;

/// Resolve the node a field reads from. `node` is normally an object; any
/// other node resolves to `None`.
pub fn resolve<'a>(node: &'a Value, field: &FieldSpec) -> Option<&'a Value> {
    if let Some(path) = field.path() {
        let found = navigate(node, path);
        trace!(field = field.name(), path, found = found.is_some(), "resolved path");
        return found;
    }
    let found = resolve_keys(node.as_object()?, &field.keys, field.ignore_key_case);
    trace!(field = field.name(), found = found.is_some(), "resolved keys");
    found
}

pub fn resolve_keys<'a>(
    obj: &'a Map<String, Value>,
    keys: &[String],
    ignore_case: bool,
) -> Option<&'a Value> {
    if let Some(v) = keys.iter().find_map(|k| obj.get(k)) {
        return Some(v);
    }
    if !ignore_case {
        return None;
    }
    keys.iter().find_map(|k| {
        let k = k.to_lowercase();
        obj.iter().find(|(ok, _)| ok.to_lowercase() == k).map(|(_, v)| v)
    })
}

/// Write an encoded field value at its path or encode key.
pub fn write(obj: &mut Map<String, Value>, field: &FieldSpec, value: Value) {
    match field.path() {
        Some(path) => insert_path(obj, path, value),
        None => {
            obj.insert(field.encode_key().to_string(), value);
        }
    }
}

/// Struct-level policy turning declared field names into wire keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Deserialize)]
pub enum KeyStyle {
    #[serde(rename = "snake_case")]
    SnakeCase,
    #[serde(rename = "SCREAMING_SNAKE_CASE")]
    ScreamingSnakeCase,
    #[serde(rename = "kebab-case")]
    KebabCase,
    #[serde(rename = "camelCase")]
    CamelCase,
    #[serde(rename = "PascalCase")]
    PascalCase,
    #[serde(rename = "lowercase")]
    Lowercase,
    #[serde(rename = "UPPERCASE")]
    Uppercase,
}

impl KeyStyle {
    pub fn apply(self, name: &str) -> String {
        let words = split_words(name);
        match self {
            KeyStyle::SnakeCase => join_lower(&words, "_"),
            KeyStyle::KebabCase => join_lower(&words, "-"),
            KeyStyle::ScreamingSnakeCase => join_lower(&words, "_").to_uppercase(),
            KeyStyle::Lowercase => words.concat().to_lowercase(),
            KeyStyle::Uppercase => words.concat().to_uppercase(),
            KeyStyle::PascalCase => words.iter().map(|w| capitalize(w)).collect(),
            KeyStyle::CamelCase => {
                let mut out = String::new();
                for (i, w) in words.iter().enumerate() {
                    if i == 0 {
                        out.push_str(&w.to_lowercase())
                    } else {
                        out.push_str(&capitalize(w))
                    }
                }
                out
            }
        }
    }
}

fn join_lower(words: &[String], sep: &str) -> String {
    words.iter().map(|w| w.to_lowercase()).collect::<Vec<_>>().join(sep)
}

fn capitalize(w: &str) -> String {
    let lower = w.to_lowercase();
    let mut chars = lower.chars();
    match chars.next() {
        Some(c) => c.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Split an identifier into words on `_`, `-`, spaces, and case changes.
/// Acronyms stay together: `HTTPServerURL` → `HTTP`, `Server`, `URL`.
fn split_words(name: &str) -> Vec<String> {
    let chars: Vec<char> = name.chars().collect();
    let mut words = Vec::new();
    let mut cur = String::new();
    for (i, &c) in chars.iter().enumerate() {
        if matches!(c, '_' | '-' | ' ' | '.') {
            if !cur.is_empty() {
                words.push(std::mem::take(&mut cur));
            }
            continue;
        }
        if c.is_uppercase() && !cur.is_empty() {
            let prev = chars[i - 1];
            let next_lower = chars.get(i + 1).is_some_and(|n| n.is_lowercase());
            if prev.is_lowercase() || prev.is_ascii_digit() || (prev.is_uppercase() && next_lower) {
                words.push(std::mem::take(&mut cur));
            }
        }
        cur.push(c);
    }
    if !cur.is_empty() {
        words.push(cur);
    }
    words
}

// ------------------------------- Tests ------------------------------------ //

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::Ty;
    use serde_json::json;

    fn field(b: crate::shape::FieldSpecBuilder) -> FieldSpec {
        b.build().unwrap()
    }

    #[test]
    fn first_alias_wins() {
        let f = field(FieldSpec::builder("name", Ty::String).keys(["A", "B"]));
        let doc = json!({"B": "from b", "A": "from a"});
        assert_eq!(resolve(&doc, &f), Some(&json!("from a")));
        let doc = json!({"B": "from b"});
        assert_eq!(resolve(&doc, &f), Some(&json!("from b")));
    }

    #[test]
    fn null_counts_as_present() {
        let f = field(FieldSpec::builder("name", Ty::String).keys(["A", "B"]));
        let doc = json!({"A": null, "B": "b"});
        assert_eq!(resolve(&doc, &f), Some(&Value::Null));
    }

    #[test]
    fn path_beats_keys() {
        let f = field(FieldSpec::builder("city", Ty::String).key("city").path("address.city"));
        let doc = json!({"city": "top", "address": {"city": "nested"}});
        assert_eq!(resolve(&doc, &f), Some(&json!("nested")));
        assert_eq!(resolve(&json!({"city": "top"}), &f), None);
    }

    #[test]
    fn case_insensitive_pass_runs_after_exact() {
        let f = field(
            FieldSpec::builder("id", Ty::String).keys(["userId", "uid"]).ignore_key_case(),
        );
        assert_eq!(resolve(&json!({"USERID": 1, "uid": 2}), &f), Some(&json!(2)));
        assert_eq!(resolve(&json!({"UserID": 1, "UID": 2}), &f), Some(&json!(1)));

        let strict = field(FieldSpec::builder("id", Ty::String).key("userId"));
        assert_eq!(resolve(&json!({"UserID": 1}), &strict), None);
    }

    #[test]
    fn non_objects_resolve_to_none() {
        let f = field(FieldSpec::builder("x", Ty::Any));
        assert_eq!(resolve(&json!([1, 2]), &f), None);
    }

    #[test]
    fn write_uses_path_or_first_key() {
        let mut obj = Map::new();
        write(&mut obj, &field(FieldSpec::builder("a", Ty::Any).keys(["A", "B"])), json!(1));
        write(&mut obj, &field(FieldSpec::builder("c", Ty::Any).path("x.y.c")), json!(2));
        let d = field(FieldSpec::builder("d", Ty::Any).key("D").encode_key("dd"));
        write(&mut obj, &d, json!(3));
        assert_eq!(Value::Object(obj), json!({"A": 1, "x": {"y": {"c": 2}}, "dd": 3}));
    }

    #[test]
    fn key_styles() {
        assert_eq!(KeyStyle::SnakeCase.apply("userName"), "user_name");
        assert_eq!(KeyStyle::SnakeCase.apply("HTTPServerURL"), "http_server_url");
        assert_eq!(KeyStyle::KebabCase.apply("user_name"), "user-name");
        assert_eq!(KeyStyle::ScreamingSnakeCase.apply("maxRetries2"), "MAX_RETRIES2");
        assert_eq!(KeyStyle::CamelCase.apply("user_name"), "userName");
        assert_eq!(KeyStyle::PascalCase.apply("user-name"), "UserName");
        assert_eq!(KeyStyle::Lowercase.apply("userName"), "username");
        assert_eq!(KeyStyle::Uppercase.apply("user_name"), "USERNAME");
    }
}
