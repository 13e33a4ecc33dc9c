use std::sync::Arc;

use json_keyed::{
    CaseMatcher, CaseSpec, ConfigError, DecodeError, EnumSpec, FieldSpec, Param, StructSpec, Ty,
    TypeSpec, TypedValue, ValueSpec, Variant, decode, encode,
};
use serde_json::json;

fn video() -> Arc<TypeSpec> {
    EnumSpec::builder("Video")
        .case(CaseSpec::unit("youtube").unwrap())
        .case(
            CaseSpec::builder("vimeo")
                .params([
                    Param::labeled("id", Ty::String),
                    Param::labeled("duration", Ty::Number).with_default(33.0),
                    Param::positional(Ty::Integer),
                ])
                .values([ValueSpec::label("id", ["ID", "Id"]), ValueSpec::index(2, ["minutes"])])
                .build()
                .unwrap(),
        )
        .case(
            CaseSpec::builder("tiktok")
                .matcher(CaseMatcher::path("type.middle.tiktok"))
                .param(Param::labeled("url", Ty::String))
                .build()
                .unwrap(),
        )
        .build()
        .unwrap()
        .into_shared()
}

fn feed() -> TypeSpec {
    StructSpec::builder("Feed")
        .field(FieldSpec::builder("title", Ty::String).keys(["title", "name"]).build().unwrap())
        .field(
            FieldSpec::builder("owner", Ty::nullable(Ty::String))
                .key("owner")
                .path("meta.owner")
                .build()
                .unwrap(),
        )
        .field(
            FieldSpec::builder("videos", Ty::list(Ty::shape(video())))
                .compact()
                .build()
                .unwrap(),
        )
        .build()
        .unwrap()
}

#[test]
fn vimeo_binds_labels_defaults_and_indices() {
    let v = decode(&json!({"vimeo": {"ID": "234961067", "minutes": 999999}}), &video()).unwrap();
    assert_eq!(
        v,
        TypedValue::Variant(
            Variant::unit("vimeo")
                .with(Some("id"), "234961067")
                .with(Some("duration"), 33.0)
                .with(None, 999999_i64)
        )
    );
}

#[test]
fn path_tag_selects_on_the_literal() {
    let spec = video();
    let v = decode(&json!({"type": {"middle": "tiktok"}, "url": "https://t.k/1"}), &spec).unwrap();
    let variant = v.as_variant().unwrap();
    assert_eq!(variant.case, "tiktok");
    assert_eq!(variant.field("url"), Some(&TypedValue::from("https://t.k/1")));

    let err = decode(&json!({"type": {"middle": "vimeo"}, "url": "x"}), &spec).unwrap_err();
    assert_eq!(err, DecodeError::NoMatchingCase { enum_name: "Video".into() });
}

#[test]
fn feed_alias_path_and_compact_rules() {
    let doc = json!({
        "title": "A",
        "name": "B",
        "owner": "ignored",
        "meta": {"owner": "kim"},
        "videos": ["youtube", {"vimeo": {"Id": "7", "minutes": "12"}}]
    });
    let v = decode(&doc, &feed()).unwrap();
    let r = v.as_record().unwrap();
    assert_eq!(r.get("title"), Some(&TypedValue::from("A")));
    assert_eq!(r.get("owner"), Some(&TypedValue::from("kim")));
    let TypedValue::List(videos) = r.get("videos").unwrap() else {
        panic!("videos");
    };
    assert_eq!(videos[0], TypedValue::case("youtube"));
    assert_eq!(videos[1].as_variant().unwrap().at(2), Some(&TypedValue::Int(12)));

    for bad in [json!(null), json!("nope"), json!({"a": 1})] {
        let v = decode(&json!({"title": "t", "videos": bad}), &feed()).unwrap();
        assert_eq!(v.as_record().unwrap().get("videos"), Some(&TypedValue::List(vec![])));
    }
}

#[test]
fn feed_round_trips() {
    let spec = feed();
    let doc = json!({
        "name": "clips",
        "videos": [
            {"vimeo": {"ID": "1", "duration": 5, "minutes": 2}},
            {"type": {"middle": "tiktok"}, "url": "u"},
            {"youtube": {}}
        ]
    });
    let v = decode(&doc, &spec).unwrap();
    let encoded = encode(&v, &spec);
    assert_eq!(
        encoded,
        json!({
            "title": "clips",
            "videos": [
                {"vimeo": {"ID": "1", "duration": 5.0, "minutes": 2}},
                {"type": {"middle": "tiktok"}, "url": "u"},
                {"youtube": {}}
            ]
        })
    );
    assert_eq!(decode(&encoded, &spec).unwrap(), v);
}

#[test]
fn path_matcher_must_stand_alone() {
    let err = CaseSpec::builder("tiktok")
        .matcher(CaseMatcher::path("type.middle.tiktok"))
        .matcher(CaseMatcher::string("tiktok"))
        .build()
        .unwrap_err();
    assert!(matches!(err, ConfigError::AmbiguousConfiguration(_)));
}

#[test]
fn specs_are_shared_across_threads() {
    let spec = Arc::new(feed());
    let handles = (0..4)
        .map(|i| {
            let spec = spec.clone();
            std::thread::spawn(move || {
                let doc = json!({"title": format!("t{i}"), "videos": ["youtube"]});
                decode(&doc, &spec).map(|v| encode(&v, &spec))
            })
        })
        .collect::<Vec<_>>();
    for (i, h) in handles.into_iter().enumerate() {
        let doc = h.join().unwrap().unwrap();
        assert_eq!(doc["title"], json!(format!("t{i}")));
    }
}
