use super::*;

#[test]
fn parses_generated_script_shape() {
    let json = r#"{
        "script": "Meet Acme. Get Acme today!",
        "scenes": [
            { "text": "Meet Acme", "duration": 2.5, "narration": "vo/01.mp3" },
            { "text": "Get Acme today!", "duration": 5 }
        ]
    }"#;
    let def = ScriptDef::from_reader(json.as_bytes()).unwrap();
    assert_eq!(def.scenes.len(), 2);
    assert_eq!(def.scenes[0].narration.as_deref(), Some("vo/01.mp3"));
    assert_eq!(def.scenes[1].duration, 5.0);
    assert!(def.scenes[1].narration.is_none());
}

#[test]
fn rejects_unknown_fields() {
    let json = r#"{ "scenes": [{ "text": "x", "duration": 1, "voice": "alloy" }] }"#;
    let err = ScriptDef::from_reader(json.as_bytes()).unwrap_err();
    assert!(matches!(err, ReelError::Serde(_)));
}

#[test]
fn missing_file_is_validation_error() {
    let err = ScriptDef::from_path("does/not/exist.json").unwrap_err();
    assert!(matches!(err, ReelError::Validation(_)));
}

#[test]
fn normalize_path_slash_normalization() {
    assert_eq!(normalize_rel_path("a/b.mp3").unwrap(), "a/b.mp3");
    assert_eq!(normalize_rel_path("a\\b.mp3").unwrap(), "a/b.mp3");
    assert_eq!(normalize_rel_path("./a//b.mp3").unwrap(), "a/b.mp3");
    assert!(normalize_rel_path("../x.mp3").is_err());
    assert!(normalize_rel_path("/abs.mp3").is_err());
    assert!(normalize_rel_path("./").is_err());
}

#[test]
fn to_timeline_validates_durations() {
    let ok = ScriptDef {
        script: None,
        scenes: vec![SceneDef {
            text: "Meet Acme".to_owned(),
            duration: 2.0,
            narration: Some("vo/01.mp3".to_owned()),
        }],
    };
    let timeline = ok.to_timeline().unwrap();
    assert_eq!(timeline.len(), 1);
    assert!(timeline.scene(0).unwrap().narration().is_none());

    let bad = ScriptDef {
        script: None,
        scenes: vec![SceneDef {
            text: "x".to_owned(),
            duration: -1.0,
            narration: None,
        }],
    };
    assert!(matches!(bad.to_timeline(), Err(ReelError::InvalidScene(_))));
}
