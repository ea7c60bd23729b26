//! Unit tests for argument decode strategies.

use std::any::Any;

use rstest::rstest;
use shuttle_wire::{
    Base95LongConverter, BinaryWire, JsonWire, LongConverter, ValueOut, WireIn, WireObject,
    WireOut,
};

use super::*;
use crate::contract::NumericConversion;

#[derive(Debug, Default, PartialEq)]
struct Point {
    x: i32,
    y: i32,
}

impl WireObject for Point {
    fn read_fields(&mut self, input: &mut dyn ValueIn) -> Result<(), WireError> {
        self.x = input.int32()?;
        self.y = input.int32()?;
        Ok(())
    }

    fn write_fields(&self, out: &mut dyn ValueOut) {
        out.int32(self.x);
        out.int32(self.y);
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

fn decode_one(plan: &ArgumentPlan, input: &mut dyn ValueIn, slot: &mut Value, cell: &ConverterCell) {
    let mut scratch = String::new();
    plan.decode(0, input, slot, cell, &mut scratch)
        .expect("decode argument");
}

// ---------------------------------------------------------------------------
// Strategy selection
// ---------------------------------------------------------------------------

#[rstest]
#[case::binary_long(WireType::Binary, Parameter::int64("id").converted(NumericConversion::base95()), false)]
#[case::json_long(WireType::Json, Parameter::int64("id").converted(NumericConversion::base95()), true)]
#[case::json_width_mismatch(WireType::Json, Parameter::int32("id").converted(NumericConversion::base95()), false)]
#[case::json_hex_int(WireType::Json, Parameter::int32("id").converted(NumericConversion::hex()), true)]
#[case::json_untagged(WireType::Json, Parameter::int64("id"), false)]
fn conversion_applies_only_to_textual_matching_width(
    #[case] wire_type: WireType,
    #[case] parameter: Parameter,
    #[case] converted: bool,
) {
    assert_eq!(
        Decode::for_parameter(&parameter, wire_type).is_converted(),
        converted
    );
}

// ---------------------------------------------------------------------------
// Decoding
// ---------------------------------------------------------------------------

#[test]
fn converted_long_matches_converter_parse() {
    let plan = ArgumentPlan::new(
        &[Parameter::int64("id").converted(NumericConversion::base95())],
        WireType::Json,
    );
    let mut wire = JsonWire::new();
    wire.write_named("op", &mut |out| out.text("abc"));
    let mut reader = wire.reader();
    reader.read_event(&mut String::new()).expect("header");

    let mut slot = Value::Unset;
    let cell = ConverterCell::default();
    decode_one(&plan, reader.value_in(), &mut slot, &cell);

    let expected = Base95LongConverter.parse("abc").expect("parse");
    assert_eq!(slot.as_int64(), Some(expected));
}

#[test]
fn binary_wire_decodes_tagged_long_directly() {
    let plan = ArgumentPlan::new(
        &[Parameter::int64("id").converted(NumericConversion::base95())],
        WireType::Binary,
    );
    let mut wire = BinaryWire::new();
    wire.write_named("op", &mut |out| out.int64(12_345));
    let mut reader = wire.reader();
    reader.read_event(&mut String::new()).expect("header");

    let mut slot = Value::Unset;
    let cell = ConverterCell::default();
    decode_one(&plan, reader.value_in(), &mut slot, &cell);

    assert_eq!(slot.as_int64(), Some(12_345));
    assert!(cell.long.get().is_none(), "converter must not be built");
}

#[test]
fn text_slot_is_overwritten_in_place() {
    let plan = ArgumentPlan::new(&[Parameter::text("name")], WireType::Binary);
    let mut wire = BinaryWire::new();
    wire.write_named("op", &mut |out| out.text("second"));
    let mut reader = wire.reader();
    reader.read_event(&mut String::new()).expect("header");

    let mut slot = Value::Text(String::from("first and longer"));
    decode_one(&plan, reader.value_in(), &mut slot, &ConverterCell::default());
    assert_eq!(slot.as_text(), Some("second"));
}

#[test]
fn recyclable_object_is_populated_in_place() {
    let plan = ArgumentPlan::new(
        &[Parameter::object("point", ObjectType::of::<Point>())],
        WireType::Binary,
    );
    let mut wire = BinaryWire::new();
    wire.write_named("op", &mut |out| out.object(&Point { x: 3, y: 4 }));
    let mut reader = wire.reader();
    reader.read_event(&mut String::new()).expect("header");

    let mut slot = Value::Object(Some(Box::new(Point { x: 1, y: 1 })));
    let before = slot.as_object::<Point>().map(std::ptr::from_ref);
    decode_one(&plan, reader.value_in(), &mut slot, &ConverterCell::default());

    assert_eq!(slot.as_object::<Point>(), Some(&Point { x: 3, y: 4 }));
    assert_eq!(slot.as_object::<Point>().map(std::ptr::from_ref), before);
}

#[test]
fn single_use_object_is_freshly_allocated() {
    let plan = ArgumentPlan::new(
        &[Parameter::object("point", ObjectType::of::<Point>().single_use())],
        WireType::Json,
    );
    let mut wire = JsonWire::new();
    wire.write_named("op", &mut |out| out.object(&Point { x: -1, y: 8 }));
    let mut reader = wire.reader();
    reader.read_event(&mut String::new()).expect("header");

    let mut slot = Value::Object(Some(Box::new(Point { x: 0, y: 0 })));
    decode_one(&plan, reader.value_in(), &mut slot, &ConverterCell::default());
    assert_eq!(slot.as_object::<Point>(), Some(&Point { x: -1, y: 8 }));
}

#[test]
fn wrong_wire_kind_is_rejected() {
    let plan = ArgumentPlan::new(&[Parameter::bool("flag")], WireType::Binary);
    let mut wire = BinaryWire::new();
    wire.write_named("op", &mut |out| out.int32(1));
    let mut reader = wire.reader();
    reader.read_event(&mut String::new()).expect("header");

    let mut slot = Value::Unset;
    let err = plan
        .decode(0, reader.value_in(), &mut slot, &ConverterCell::default(), &mut String::new())
        .expect_err("int is not a bool");
    assert!(matches!(err, WireError::UnexpectedCode { expected: "bool", .. }));
}
