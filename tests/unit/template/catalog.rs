use super::*;
use crate::foundation::core::Canvas;

#[test]
fn builtins_are_registered() {
    let r = Registry::with_builtins();
    assert_eq!(r.module_types(), ["Solid", "Brush", "Image", "Banner", "Text"]);
    assert_eq!(r.effect_types(), ["Opacity", "Blur", "DropShadow"]);

    let mut table = ParamTable::new();
    for name in r.module_types() {
        let m = r.create_module(name, &mut table).unwrap().unwrap();
        assert_eq!(m.type_name(), name);
    }
    for name in r.effect_types() {
        let e = r.create_effect(name, &mut table).unwrap().unwrap();
        assert_eq!(e.type_name(), name);
    }
    assert!(r.create_module("Nope", &mut table).unwrap().is_none());
    assert!(r.create_effect("Nope", &mut table).unwrap().is_none());
}

#[test]
fn registering_replaces_by_name() {
    let mut r = Registry::empty();
    r.register_module("Box", |t| Module::new(Box::new(Solid::default()), t));
    r.register_module("Box", |t| Module::new(Box::new(Brush::default()), t));
    assert_eq!(r.module_types(), ["Box"]);
    let mut table = ParamTable::new();
    let m = r.create_module("Box", &mut table).unwrap().unwrap();
    assert!(m.layer().inputs().contains("Strokes"));
}

#[test]
fn template_store_round_trip() {
    let r = Registry::with_builtins();
    let mut t = Template::new("card", Canvas::new(16, 16).unwrap());
    let m = r.create_module("Solid", t.params_mut()).unwrap().unwrap();
    t.push_module(m);

    r.save_template(&t).unwrap();
    assert_eq!(r.list_templates(), ["card"]);
    let loaded = r.load_template("card").unwrap().unwrap();
    assert_eq!(loaded.to_def(), t.to_def());

    assert!(r.load_template("missing").unwrap().is_none());
    assert!(r.remove_template("card").unwrap());
    assert!(!r.remove_template("card").unwrap());
    assert!(r.list_templates().is_empty());
}

#[test]
fn unnamed_templates_are_not_saved() {
    let r = Registry::with_builtins();
    let t = Template::new("  ", Canvas::new(4, 4).unwrap());
    assert!(r.save_template(&t).is_err());
}

#[test]
fn insert_def_validates_first() {
    let r = Registry::with_builtins();
    let bad = TemplateDef {
        name: "bad".into(),
        width: 4,
        height: 4,
        modules: vec![crate::template::persist::ModuleDef {
            type_name: "Ghost".into(),
            display_name: None,
            inputs: Default::default(),
            effects: Vec::new(),
        }],
    };
    assert!(r.insert_def(&bad).is_err());
    assert!(r.list_templates().is_empty());
}
