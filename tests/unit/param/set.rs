use super::*;
use crate::foundation::core::{Color, Region};
use crate::param::kinds::{ColorKind, NumberKind, RegionKind};

fn solid_inputs(table: &mut ParamTable) -> ParameterSet {
    let mut set = ParameterSet::new();
    set.declare(
        table,
        "Background",
        Parameter::new("Background", ColorKind).with_order(1),
    )
    .unwrap();
    set.declare(
        table,
        "Location",
        Parameter::new("Location", RegionKind).with_order(0),
    )
    .unwrap();
    set
}

#[test]
fn names_are_unique() {
    let mut table = ParamTable::new();
    let mut set = solid_inputs(&mut table);
    let err = set
        .declare(&mut table, "Location", Parameter::new("Location", RegionKind))
        .unwrap_err();
    assert!(err.to_string().contains("duplicate"));
    assert_eq!(set.len(), 2);
    assert_eq!(table.len(), 2);
}

#[test]
fn iteration_is_insertion_order_and_sorted_is_by_order() {
    let mut table = ParamTable::new();
    let mut set = solid_inputs(&mut table);
    set.declare(&mut table, "Extra", Parameter::new("Extra", NumberKind::integer()))
        .unwrap();

    let names: Vec<&str> = set.iter().map(|(n, _)| n).collect();
    assert_eq!(names, ["Background", "Location", "Extra"]);

    let sorted: Vec<&str> = set.sorted(&table).into_iter().map(|(n, _)| n).collect();
    assert_eq!(sorted, ["Extra", "Location", "Background"]);
}

#[test]
fn typed_lookup_checks_kind() {
    let mut table = ParamTable::new();
    let set = solid_inputs(&mut table);
    assert!(set.get::<ColorKind>(&table, "Background").is_some());
    assert!(set.get::<RegionKind>(&table, "Background").is_none());
    assert!(set.get::<ColorKind>(&table, "Nope").is_none());
}

#[test]
fn require_skips_on_absent_or_invalid() {
    let mut table = ParamTable::new();
    let mut set = solid_inputs(&mut table);
    set.declare(
        &mut table,
        "Size",
        Parameter::new("Size", NumberKind::integer().at_least(1.0)),
    )
    .unwrap();

    assert!(matches!(
        set.require::<NumberKind>(&table, "Missing"),
        Err(RenderAbort::Skip(_))
    ));
    assert!(matches!(
        set.require::<NumberKind>(&table, "Size"),
        Err(RenderAbort::Skip(_))
    ));
    set.get_mut::<NumberKind>(&mut table, "Size")
        .unwrap()
        .set_value(3.0);
    assert_eq!(set.require::<NumberKind>(&table, "Size").unwrap(), 3.0);
}

#[test]
fn copy_from_shares_the_same_parameter() {
    let mut table = ParamTable::new();
    let child = solid_inputs(&mut table);
    let mut composite = ParameterSet::new();
    composite
        .copy_from(&mut table, &child, &["Background", "Location"])
        .unwrap();

    composite
        .get_mut::<RegionKind>(&mut table, "Location")
        .unwrap()
        .set_value(Region::new(1, 2, 3, 4));
    assert_eq!(
        child.value::<RegionKind>(&table, "Location"),
        Some(Region::new(1, 2, 3, 4))
    );
    assert_eq!(composite.id("Location"), child.id("Location"));
    assert_eq!(table.ref_count(child.id("Location").unwrap()), 2);
}

#[test]
fn copy_from_renamed_and_missing_source() {
    let mut table = ParamTable::new();
    let child = solid_inputs(&mut table);
    let mut composite = ParameterSet::new();
    composite
        .copy_from_renamed(&mut table, &child, &[("Background", "Fill")])
        .unwrap();
    assert_eq!(composite.id("Fill"), child.id("Background"));
    assert!(composite.copy_from(&mut table, &child, &["Nope"]).is_err());
}

#[test]
fn release_frees_only_unshared_entries() {
    let mut table = ParamTable::new();
    let mut child = solid_inputs(&mut table);
    let mut composite = ParameterSet::new();
    composite
        .copy_from(&mut table, &child, &["Location"])
        .unwrap();
    let location = child.id("Location").unwrap();

    child.release_all(&mut table);
    assert!(child.is_empty());
    assert_eq!(table.len(), 1);
    assert!(table.contains(location));

    composite.release_all(&mut table);
    assert!(table.is_empty());
}

#[test]
fn serialize_then_deserialize_into_fresh_set() {
    let mut table = ParamTable::new();
    let set = solid_inputs(&mut table);
    set.get_mut::<ColorKind>(&mut table, "Background")
        .unwrap()
        .set_value(Color::rgba(10, 20, 30, 255));
    // Location left at its zero default.
    let json = set.serialize(&table);
    assert_eq!(json["Background"], serde_json::json!("#0A141EFF"));

    let mut table2 = ParamTable::new();
    let set2 = solid_inputs(&mut table2);
    set2.deserialize(&mut table2, &json).unwrap();
    assert_eq!(
        set2.value::<ColorKind>(&table2, "Background"),
        Some(Color::rgba(10, 20, 30, 255))
    );
    assert!(set2.slot(&table2, "Location").unwrap().is_loaded());
    assert_eq!(set2.serialize(&table2), json);
}

#[test]
fn validity_and_user_inputs() {
    let mut table = ParamTable::new();
    let set = solid_inputs(&mut table);
    assert!(set.is_valid(&table));
    assert_eq!(set.user_inputs(&table), 2);
    set.get_mut::<RegionKind>(&mut table, "Location")
        .unwrap()
        .edit(|h| h.x = "left".to_owned());
    assert!(!set.is_valid(&table));
}
