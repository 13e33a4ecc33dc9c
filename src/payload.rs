//! Associated-value extraction for a selected enum case.
use serde_json::{Map, Value};

use crate::error::DecodeError;
use crate::field::{decode_field, encode_field};
use crate::keys::resolve_keys;
use crate::shape::CaseSpec;
use crate::value::{TypedValue, Variant};

/// Decode the payload of `case` from `location`, in positional order.
///
/// Each position is resolved with the same first-alias-wins rule as struct
/// fields and decoded with the same fallback and coercion rules. A location
/// that is not an object behaves as an empty object.
pub fn extract_payload(
    location: &Value,
    case: &CaseSpec,
) -> Result<Vec<(Option<String>, TypedValue)>, DecodeError> {
    let empty = Map::new();
    let obj = location.as_object().unwrap_or(&empty);

    let mut out = Vec::with_capacity(case.positions.len());
    for pos in &case.positions {
        let field = &pos.field;
        let value = if pos.bound {
            let node = resolve_keys(obj, &field.keys, field.ignore_key_case);
            decode_field(node, field).map_err(|e| match e {
                DecodeError::MissingRequiredField { .. } => DecodeError::MissingAssociatedValue {
                    case: case.name.clone(),
                    slot: pos.slot.to_string(),
                },
                other => other,
            })?
        } else {
            field.fallback().ok_or_else(|| DecodeError::MissingAssociatedValue {
                case: case.name.clone(),
                slot: pos.slot.to_string(),
            })?
        };
        out.push((pos.label.clone(), value));
    }
    Ok(out)
}

/// Write the payload of `variant` as an object keyed by each position's
/// first alias. Positions without keys are left out.
pub fn encode_payload(variant: &Variant, case: &CaseSpec) -> Map<String, Value> {
    let mut out = Map::new();
    for (i, pos) in case.positions.iter().enumerate() {
        if !pos.bound {
            continue;
        }
        let value = match &pos.label {
            Some(l) => variant.field(l).or_else(|| variant.at(i)),
            None => variant.at(i),
        };
        let value = value.cloned().unwrap_or(TypedValue::None);
        if let Some(node) = encode_field(&value, &pos.field) {
            out.insert(pos.field.encode_key().to_string(), node);
        }
    }
    out
}

// ------------------------------- Tests ------------------------------------ //

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::Ty;
    use crate::shape::{Param, ValueSpec};
    use serde_json::json;

    fn vimeo() -> CaseSpec {
        CaseSpec::builder("vimeo")
            .params([
                Param::labeled("id", Ty::String),
                Param::labeled("duration", Ty::Number).with_default(33.0),
                Param::positional(Ty::Integer),
            ])
            .values([ValueSpec::label("id", ["ID", "Id"]), ValueSpec::index(2, ["minutes"])])
            .build()
            .unwrap()
    }

    #[test]
    fn binds_labels_defaults_and_indices() {
        let doc = json!({"ID": "234961067", "minutes": 999999});
        let values = extract_payload(&doc, &vimeo()).unwrap();
        assert_eq!(
            values,
            vec![
                (Some("id".to_string()), TypedValue::from("234961067")),
                (Some("duration".to_string()), TypedValue::Float(33.0)),
                (None, TypedValue::Int(999999)),
            ]
        );
    }

    #[test]
    fn second_alias_and_explicit_values() {
        let doc = json!({"Id": "x", "duration": 12, "minutes": "3"});
        let values = extract_payload(&doc, &vimeo()).unwrap();
        assert_eq!(values[0].1, TypedValue::from("x"));
        assert_eq!(values[1].1, TypedValue::Float(12.0));
        assert_eq!(values[2].1, TypedValue::Int(3));
    }

    #[test]
    fn missing_value_names_the_slot() {
        let err = extract_payload(&json!({"ID": "x"}), &vimeo()).unwrap_err();
        let slot = "#2".to_string();
        assert_eq!(err, DecodeError::MissingAssociatedValue { case: "vimeo".into(), slot });

        let err = extract_payload(&json!(null), &vimeo()).unwrap_err();
        let slot = "`id`".to_string();
        assert_eq!(err, DecodeError::MissingAssociatedValue { case: "vimeo".into(), slot });
    }

    #[test]
    fn unbound_positions_use_their_default() {
        let c = CaseSpec::builder("clip")
            .param(Param::positional(Ty::Integer).with_default(7_i64))
            .build()
            .unwrap();
        let values = extract_payload(&json!({"_0": 1}), &c).unwrap();
        assert_eq!(values, vec![(None, TypedValue::Int(7))]);
    }

    #[test]
    fn unbound_position_without_default_fails_on_decode() {
        let c = CaseSpec::builder("clip")
            .param(Param::labeled("id", Ty::String))
            .param(Param::positional(Ty::Integer))
            .build()
            .unwrap();
        let err = extract_payload(&json!({"id": "a", "_1": 4}), &c).unwrap_err();
        let slot = "#1".to_string();
        assert_eq!(err, DecodeError::MissingAssociatedValue { case: "clip".into(), slot });
    }

    #[test]
    fn encode_writes_first_alias() {
        let v = Variant::unit("vimeo")
            .with(Some("id"), "abc")
            .with(Some("duration"), 33.0)
            .with(None, 5_i64);
        assert_eq!(
            Value::Object(encode_payload(&v, &vimeo())),
            json!({"ID": "abc", "duration": 33.0, "minutes": 5})
        );
    }
}
