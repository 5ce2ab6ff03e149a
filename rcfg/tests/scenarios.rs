//! End-to-end parse scenarios, one per case enumerated in the spec this
//! crate implements. Placed in `tests/` rather than inline, matching how
//! the teacher crate keeps its own file-driven, higher-level tests
//! (`bxmlrs-bin`'s `test_apks`) separate from the unit tests living
//! beside each module.
use anyhow::Result;
use rcfg::{ConfigData, DialectSettings, Kind};

#[test]
fn null_literal_is_root() {
    let mut data = ConfigData::new();
    rcfg::parse("null", &mut data, &DialectSettings::default()).unwrap();
    assert_eq!(data.kind(data.root()), Kind::Null);
}

#[test]
fn typo_in_false_literal_reports_precise_location() {
    let mut data = ConfigData::new();
    let err = rcfg::parse("\n\nfulse", &mut data, &DialectSettings::default()).unwrap_err();
    assert_eq!(err.to_string(), "3: Expected `a`, saw `u`");
}

#[test]
fn negative_exponent_number() -> Result<()> {
    let mut data = ConfigData::new();
    rcfg::parse("-3.14e-1", &mut data, &DialectSettings::default())?;
    let n = data.to_number(data.root()).expect("root should be a number");
    assert!((n - (-0.314)).abs() < 1e-7);
    Ok(())
}

#[test]
fn array_of_five_numbers_with_loose_spacing() -> Result<()> {
    let mut data = ConfigData::new();
    rcfg::parse(
        "[1,2, 3 ,4 , 5 ]",
        &mut data,
        &DialectSettings::default(),
    )?;
    let arr = data.root();
    assert_eq!(data.array_len(arr), 5);
    for i in 0..5 {
        let item = data.array_item(arr, i);
        assert_eq!(data.to_number(item), Some((i + 1) as f64));
    }
    Ok(())
}

#[test]
fn object_with_name_and_age() -> Result<()> {
    let mut data = ConfigData::new();
    rcfg::parse(
        "{\"name\" : \"Niklas\", \"age\" : 41}",
        &mut data,
        &DialectSettings::default(),
    )?;
    let obj = data.root();
    assert_eq!(data.to_str(data.object_lookup(obj, "name")), Some("Niklas"));
    assert_eq!(data.to_number(data.object_lookup(obj, "age")), Some(41.0));
    assert_eq!(data.to_str(data.object_key_loc(obj, 1)), Some("age"));
    Ok(())
}

#[test]
fn unicode_escapes_encode_each_codeunit_independently() -> Result<()> {
    let mut data = ConfigData::new();
    rcfg::parse(
        "\"\\u00e4\\u6176\"",
        &mut data,
        &DialectSettings::default(),
    )?;
    let s = data.to_str(data.root()).expect("root should be a string");
    // U+00E4 is 2 UTF-8 bytes, U+6176 is 3 (it's above U+07FF): 5 total.
    assert_eq!(s.as_bytes().len(), 5);
    assert_eq!(s, "\u{e4}\u{6176}");
    Ok(())
}

#[test]
fn five_dialect_flags_combine_for_a_config_style_document() -> Result<()> {
    let mut data = ConfigData::new();
    let settings = DialectSettings {
        unquoted_keys: true,
        c_comments: true,
        implicit_root_object: true,
        optional_commas: true,
        equals_for_colon: true,
        ..DialectSettings::default()
    };
    rcfg::parse("// c\na=10 b=20", &mut data, &settings)?;
    let obj = data.root();
    assert_eq!(data.kind(obj), Kind::Object);
    assert_eq!(data.to_number(data.object_lookup(obj, "a")), Some(10.0));
    assert_eq!(data.to_number(data.object_lookup(obj, "b")), Some(20.0));
    Ok(())
}

#[test]
fn python_multiline_string_keeps_embedded_quote() -> Result<()> {
    let mut data = ConfigData::new();
    let settings = DialectSettings {
        python_multiline_strings: true,
        ..DialectSettings::default()
    };
    rcfg::parse("\"\"\" Bla \" Bla \"\"\"", &mut data, &settings)?;
    assert_eq!(data.to_str(data.root()), Some(" Bla \" Bla "));
    Ok(())
}

#[test]
fn empty_input_with_implicit_root_object_yields_empty_object() -> Result<()> {
    let mut data = ConfigData::new();
    let settings = DialectSettings {
        implicit_root_object: true,
        ..DialectSettings::default()
    };
    rcfg::parse("", &mut data, &settings)?;
    assert_eq!(data.kind(data.root()), Kind::Object);
    assert_eq!(data.object_len(data.root()), 0);
    Ok(())
}

#[test]
fn sixteen_bit_to_thirty_two_bit_slot_transition_preserves_symbols() -> Result<()> {
    // Force the embedded string table past the 64 KiB boundary that
    // flips its slot width, and confirm every string interned before the
    // flip is still readable afterward.
    let mut data = ConfigData::with_capacity(1024, 4096);
    let mut values = Vec::new();
    for i in 0..20_000 {
        let s = format!("value-{i}-padding-for-arena-growth");
        let loc = data.add_string(&s);
        values.push((s, loc));
    }
    assert!(data.total_bytes() as usize > 65536);
    for (s, loc) in &values {
        assert_eq!(data.to_str(*loc), Some(s.as_str()));
    }
    Ok(())
}
