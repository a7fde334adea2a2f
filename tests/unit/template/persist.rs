use serde_json::json;

use super::*;
use crate::param::kinds::{ColorKind, NumberKind, RegionKind};
use crate::template::catalog::Registry;
use crate::{Color, Region};

fn doc() -> serde_json::Value {
    json!({
        "name": "poster",
        "width": 64,
        "height": 32,
        "modules": [
            {
                "type": "Solid",
                "displayName": "Header",
                "inputs": {
                    "Background": "#FF000080",
                    "Location": { "x": 10, "y": 20, "width": 100, "height": 50 }
                },
                "effects": [
                    { "name": "Opacity", "displayName": null, "inputs": { "Opacity": 50 } }
                ]
            },
            {
                "type": "Brush",
                "displayName": null,
                "inputs": { "Size": 3, "Mode": "Erase" },
                "effects": []
            }
        ]
    })
}

fn def() -> TemplateDef {
    serde_json::from_value(doc()).unwrap()
}

#[test]
fn loads_modules_effects_and_values_in_order() {
    let registry = Registry::with_builtins();
    let t = Template::from_def(&def(), &registry).unwrap();
    assert_eq!(t.name(), "poster");
    assert_eq!((t.canvas().width, t.canvas().height), (64, 32));

    let header = t.module(0).unwrap();
    assert_eq!(header.display_name(), "Header");
    let inputs = header.layer().inputs();
    assert_eq!(
        inputs.value::<RegionKind>(t.params(), "Location"),
        Some(Region::new(10, 20, 100, 50))
    );
    assert_eq!(
        inputs.value::<ColorKind>(t.params(), "Background"),
        Some(Color::rgba(255, 0, 0, 0x80))
    );
    let fade = &header.effects()[0];
    assert_eq!(fade.owner(), Some(header.id()));
    assert_eq!(
        fade.layer().inputs().value::<NumberKind>(t.params(), "Opacity"),
        Some(50.0)
    );

    let brush = t.module(1).unwrap();
    assert_eq!(brush.type_name(), "Brush");
    assert_eq!(brush.display_name(), "Brush");
}

#[test]
fn save_then_load_is_stable() {
    let registry = Registry::with_builtins();
    let t = Template::from_def(&def(), &registry).unwrap();
    let saved = t.to_def();
    let reloaded = Template::from_def(&saved, &registry).unwrap();
    assert_eq!(reloaded.to_def(), saved);

    let json = serde_json::to_value(&saved).unwrap();
    assert_eq!(json["modules"][0]["type"], "Solid");
    assert_eq!(json["modules"][0]["effects"][0]["name"], "Opacity");
    assert_eq!(json["modules"][0]["effects"][0]["displayName"], serde_json::Value::Null);
    assert_eq!(json["modules"][1]["inputs"]["Mode"], "Erase");
    // Strokes were never drawn: absent values persist as null.
    assert_eq!(json["modules"][1]["inputs"]["Strokes"], serde_json::Value::Null);
}

#[test]
fn loaded_values_beat_defaults() {
    let registry = Registry::with_builtins();
    let t = Template::from_def(&def(), &registry).unwrap();
    let brush = t.module(1).unwrap();
    let id = brush.layer().inputs().id("Size").unwrap();
    let size = t.params().get::<NumberKind>(id).unwrap();
    assert!(size.is_loaded());
    assert_eq!(size.get_value(), Some(3.0));
}

#[test]
fn unknown_module_type_fails_the_whole_load() {
    let registry = Registry::with_builtins();
    let mut doc = doc();
    doc["modules"][1]["type"] = json!("Hologram");
    let def: TemplateDef = serde_json::from_value(doc).unwrap();
    let err = Template::from_def(&def, &registry).unwrap_err();
    assert!(matches!(
        &err,
        ComposerError::MissingType { kind: LayerKind::Module, name } if name == "Hologram"
    ));
    assert!(err.to_string().contains("\"Hologram\""));
}

#[test]
fn unknown_effect_type_is_named() {
    let registry = Registry::with_builtins();
    let mut doc = doc();
    doc["modules"][0]["effects"][0]["name"] = json!("Sparkle");
    let def: TemplateDef = serde_json::from_value(doc).unwrap();
    let err = Template::from_def(&def, &registry).unwrap_err();
    assert_eq!(err.to_string(), "template uses effect \"Sparkle\" which is missing");
}

#[test]
fn bad_input_value_is_a_serde_error() {
    let registry = Registry::with_builtins();
    let mut doc = doc();
    doc["modules"][0]["inputs"]["Background"] = json!(17);
    let def: TemplateDef = serde_json::from_value(doc).unwrap();
    let err = Template::from_def(&def, &registry).unwrap_err();
    assert!(matches!(err, ComposerError::Serde(_)));
}

#[test]
fn optional_fields_default() {
    let def = TemplateDef::from_json_str(
        r#"{ "name": "bare", "width": 8, "height": 8, "modules": [ { "type": "Solid" } ] }"#,
    )
    .unwrap();
    assert_eq!(def.modules[0].display_name, None);
    assert!(def.modules[0].inputs.is_empty());
    assert!(def.modules[0].effects.is_empty());
    assert!(TemplateDef::from_json_str("{").is_err());
}

#[test]
fn zero_sized_canvas_is_rejected() {
    let registry = Registry::with_builtins();
    let mut def = def();
    def.width = 0;
    assert!(Template::from_def(&def, &registry).is_err());
}
