//! Enum case selection and tag encoding.
//!
//! Cases are scanned in declaration order and the first case with any
//! matching matcher wins; overlapping matchers are resolved by that order.
//!
//! What a scalar matcher is compared against depends on the enum's form:
//!
//! - no associated values anywhere: the document node itself (`"youtube"`, `10`);
//! - external tagging with payloads: the keys of the document object
//!   (`{"vimeo": {...}}`), the payload being the value under the key;
//! - internal tagging: the value under the tag key (`{"type": "vimeo", ...}`),
//!   the payload being the whole object.
//!
//! Path matchers always look at the whole document and take their payload
//! from it.
use serde_json::{Map, Value};
use tracing::debug;

use crate::coerce::{lenient_f64, lenient_i64, strict_bool};
use crate::document::{insert_path, navigate, scalar_text};
use crate::error::DecodeError;
use crate::shape::case::{in_bounds, str_bound};
use crate::shape::{CaseMatcher, CaseSpec, EnumSpec, Tagging};

/// Pick the case for `node` and the node its payload is read from.
pub fn select_case<'s, 'd>(
    node: &'d Value,
    spec: &'s EnumSpec,
) -> Result<(&'s CaseSpec, &'d Value), DecodeError> {
    for case in &spec.cases {
        if let Some(location) = match_case(node, case, spec) {
            debug!(enum_name = %spec.name, case = %case.name, "selected case");
            return Ok((case, location));
        }
    }
    Err(DecodeError::NoMatchingCase { enum_name: spec.name.clone() })
}

fn match_case<'d>(node: &'d Value, case: &CaseSpec, spec: &EnumSpec) -> Option<&'d Value> {
    if let Some(path) = case.path_matcher() {
        return path_matches(node, path).then_some(node);
    }
    match &spec.tagging {
        Tagging::Internal { key } => {
            let tag = node.as_object()?.get(key)?;
            case.matchers.iter().any(|m| scalar_matches(m, tag)).then_some(node)
        }
        Tagging::External if !spec.has_payload => {
            case.matchers.iter().any(|m| scalar_matches(m, node)).then_some(node)
        }
        Tagging::External => case.matchers.iter().find_map(|m| match (m, node) {
            (CaseMatcher::String(tag), Value::Object(obj)) => obj.get(tag),
            // payload-less case written as a bare tag
            (CaseMatcher::String(tag), Value::String(s)) if !case.has_payload() && s == tag => {
                Some(node)
            }
            _ => None,
        }),
    }
}

/// `"a.b.tag"` matches when `a.b` holds a scalar whose text is `tag`.
pub fn path_matches(node: &Value, path: &str) -> bool {
    let Some((prefix, literal)) = path.rsplit_once('.') else {
        return false;
    };
    navigate(node, prefix).and_then(scalar_text).is_some_and(|t| t == literal)
}

pub fn scalar_matches(m: &CaseMatcher, node: &Value) -> bool {
    match m {
        CaseMatcher::Bool(b) => strict_bool(node) == Some(*b),
        CaseMatcher::Int(i) => lenient_i64(node) == Some(*i),
        CaseMatcher::IntRange(lo, hi) => {
            lenient_i64(node).is_some_and(|x| in_bounds(&x, lo.as_ref(), hi.as_ref()))
        }
        CaseMatcher::Double(d) => lenient_f64(node) == Some(d.0),
        CaseMatcher::DoubleRange(lo, hi) => lenient_f64(node)
            .is_some_and(|x| in_bounds(&ordered_float::OrderedFloat(x), lo.as_ref(), hi.as_ref())),
        CaseMatcher::String(s) => node.as_str() == Some(s.as_str()),
        CaseMatcher::StringRange(lo, hi) => {
            node.as_str().is_some_and(|x| in_bounds(x, str_bound(lo), str_bound(hi)))
        }
        CaseMatcher::PathValue(_) => false,
    }
}

/// Wrap an encoded payload with the case's canonical discriminant.
pub fn encode_tag(case: &CaseSpec, spec: &EnumSpec, payload: Map<String, Value>) -> Value {
    if let Some(path) = case.path_matcher() {
        let mut out = payload;
        if let Some((prefix, literal)) = path.rsplit_once('.') {
            insert_path(&mut out, prefix, Value::String(literal.to_string()));
        }
        return Value::Object(out);
    }
    // first matcher is canonical; build rejects matchers without a value
    let tag = case.matchers.first().and_then(CaseMatcher::canonical).unwrap_or(Value::Null);
    match &spec.tagging {
        Tagging::Internal { key } => {
            let mut out = Map::new();
            out.insert(key.clone(), tag);
            for (k, v) in payload {
                out.entry(k).or_insert(v);
            }
            Value::Object(out)
        }
        Tagging::External if !spec.has_payload => tag,
        Tagging::External => {
            let key = match tag {
                Value::String(s) => s,
                other => other.to_string(),
            };
            let mut out = Map::new();
            out.insert(key, Value::Object(payload));
            Value::Object(out)
        }
    }
}

// ------------------------------- Tests ------------------------------------ //

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::Ty;
    use crate::shape::{Param, ValueSpec};
    use serde_json::json;

    fn bare(cases: Vec<CaseSpec>) -> EnumSpec {
        EnumSpec::builder("Level").cases(cases).build_enum().unwrap()
    }

    fn case(name: &str, ms: impl IntoIterator<Item = CaseMatcher>) -> CaseSpec {
        CaseSpec::builder(name).matchers(ms).build().unwrap()
    }

    fn selected(node: Value, spec: &EnumSpec) -> Option<String> {
        select_case(&node, spec).ok().map(|(c, _)| c.name.clone())
    }

    #[test]
    fn int_range_boundaries() {
        let spec = bare(vec![case("mid", [CaseMatcher::int_range(10..=20)])]);
        for x in [10, 15, 20] {
            assert_eq!(selected(json!(x), &spec).as_deref(), Some("mid"), "{x}");
        }
        for x in [9, 21] {
            assert_eq!(selected(json!(x), &spec), None, "{x}");
        }
        let open = bare(vec![case("low", [CaseMatcher::int_range(10..20)])]);
        assert_eq!(selected(json!(20), &open), None);
        assert_eq!(selected(json!(19), &open).as_deref(), Some("low"));
    }

    #[test]
    fn earlier_case_wins_on_overlap() {
        let spec = bare(vec![
            case("teen", [CaseMatcher::int_range(13..=19)]),
            case("young", [CaseMatcher::int_range(0..=25)]),
        ]);
        for _ in 0..3 {
            assert_eq!(selected(json!(15), &spec).as_deref(), Some("teen"));
        }
        assert_eq!(selected(json!(22), &spec).as_deref(), Some("young"));
    }

    #[test]
    fn matchers_within_a_case_are_ored() {
        let spec = bare(vec![
            case("on", [CaseMatcher::Bool(true), CaseMatcher::Int(1), CaseMatcher::string("yes")]),
            case("ratio", [CaseMatcher::double_range(0.0..1.0)]),
            case("alpha", [CaseMatcher::string_range("a"..="m")]),
        ]);
        assert_eq!(selected(json!(true), &spec).as_deref(), Some("on"));
        assert_eq!(selected(json!(1), &spec).as_deref(), Some("on"));
        assert_eq!(selected(json!("yes"), &spec).as_deref(), Some("on"));
        assert_eq!(selected(json!(0.25), &spec).as_deref(), Some("ratio"));
        assert_eq!(selected(json!("kiwi"), &spec).as_deref(), Some("alpha"));
        assert_eq!(selected(json!("zebra"), &spec), None);
        assert!(matches!(
            select_case(&json!(null), &spec),
            Err(DecodeError::NoMatchingCase { ref enum_name }) if enum_name == "Level"
        ));
    }

    #[test]
    fn path_tag_matching() {
        assert!(path_matches(&json!({"type": {"middle": "youtube"}}), "type.middle.youtube"));
        assert!(!path_matches(&json!({"type": {"middle": "vimeo"}}), "type.middle.youtube"));
        assert!(!path_matches(&json!({"type": "youtube"}), "type.middle.youtube"));
        assert!(path_matches(&json!({"v": {"n": 10}}), "v.n.10"));
    }

    #[test]
    fn external_tag_reads_payload_under_key() {
        let spec = EnumSpec::builder("Video")
            .case(CaseSpec::unit("youtube").unwrap())
            .case(
                CaseSpec::builder("vimeo")
                    .param(Param::labeled("id", Ty::String))
                    .value(ValueSpec::label("id", ["ID"]))
                    .build()
                    .unwrap(),
            )
            .build_enum()
            .unwrap();
        let doc = json!({"vimeo": {"ID": "1"}});
        let (c, loc) = select_case(&doc, &spec).unwrap();
        assert_eq!(c.name, "vimeo");
        assert_eq!(loc, &json!({"ID": "1"}));
        assert_eq!(selected(json!("youtube"), &spec).as_deref(), Some("youtube"));
        assert_eq!(selected(json!("vimeo"), &spec), None);
    }

    #[test]
    fn encode_tags() {
        let spec = bare(vec![
            case("mid", [CaseMatcher::int_range(10..=20)]),
            CaseSpec::unit("hi").unwrap(),
        ]);
        assert_eq!(encode_tag(&spec.cases[0], &spec, Map::new()), json!(10));
        assert_eq!(encode_tag(&spec.cases[1], &spec, Map::new()), json!("hi"));

        let path = bare(vec![case("yt", [CaseMatcher::path("type.middle.youtube")])]);
        assert_eq!(
            encode_tag(&path.cases[0], &path, Map::new()),
            json!({"type": {"middle": "youtube"}})
        );
    }
}
