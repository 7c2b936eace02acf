use super::*;

#[test]
fn parses_hex_forms() {
    assert_eq!(parse_hex("#FFFFFF").unwrap(), Rgba8::WHITE);
    assert_eq!(parse_hex("000000").unwrap(), Rgba8::BLACK);
    assert_eq!(parse_hex("#ff000080").unwrap(), Rgba8::new(255, 0, 0, 128));
    assert_eq!(parse_hex("#0f0").unwrap(), Rgba8::opaque(0, 255, 0));
}

#[test]
fn rejects_bad_hex() {
    assert!(parse_hex("#12345").is_err());
    assert!(parse_hex("#GGGGGG").is_err());
    assert!(parse_hex("#ÿÿÿ").is_err());
}

#[test]
fn serde_accepts_strings_and_arrays() {
    let c: Rgba8 = serde_json::from_str("\"#FF0000\"").unwrap();
    assert_eq!(c, Rgba8::opaque(255, 0, 0));

    let c: Rgba8 = serde_json::from_str("[1, 2, 3]").unwrap();
    assert_eq!(c, Rgba8::opaque(1, 2, 3));

    let c: Rgba8 = serde_json::from_str("[1, 2, 3, 4]").unwrap();
    assert_eq!(c, Rgba8::new(1, 2, 3, 4));

    assert!(serde_json::from_str::<Rgba8>("[1, 2]").is_err());
}

#[test]
fn serializes_as_hex() {
    assert_eq!(
        serde_json::to_string(&Rgba8::opaque(255, 0, 16)).unwrap(),
        "\"#FF0010\""
    );
    assert_eq!(to_hex(Rgba8::new(0, 0, 0, 0)), "#00000000");
}
