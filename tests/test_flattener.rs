use gprs_rust::gprs_common_rs::flatten::Flattener;
use gprs_rust::gprs_common_rs::packet::core::exceptions::SchemaContractError;
use gprs_rust::gprs_common_rs::packet::models::{FieldTree, FlatReport, ReportValue, Scalar};
use rand::Rng;

fn command(reference: u64, code: u64, data: FieldTree) -> FieldTree {
    FieldTree::new()
        .with_uint("type", 2)
        .with_uint("ref", reference)
        .with_tree("type_class", FieldTree::new().with_uint("code", code).with_tree("data", data))
}

fn data_keys(report: &FlatReport) -> Vec<String> {
    report.data.as_ref().map(|d| d.keys().cloned().collect()).unwrap_or_default()
}

#[test]
fn test_header_only_report() {
    let tree = FieldTree::new().with_uint("type", 2).with_uint("ref", 9);
    let report = Flattener::new().flatten(&tree).unwrap();

    assert_eq!(report.keys(), vec!["ref", "type"]);
    assert_eq!(report.to_json().unwrap(), r#"{"ref":9,"type":2}"#);
}

#[test]
fn test_code_without_data() {
    let tree = FieldTree::new()
        .with_uint("type", 2)
        .with_uint("ref", 1)
        .with_tree("type_class", FieldTree::new().with_uint("code", 42));
    let report = Flattener::new().flatten(&tree).unwrap();

    assert_eq!(report.keys(), vec!["ref", "type", "code"]);
    assert!(report.data.is_none());
}

#[test]
fn test_relay_bitmap_expansion() {
    // 反転後 presence=[T,F,T,F] value=[T,F,F,F]
    let data = FieldTree::new()
        .with_bits("relay_presence_bits", &[false, true, false, true])
        .with_bits("relay_value_bits", &[false, false, false, true])
        .with_uint("port", 80);
    let report = Flattener::new().flatten(&command(3, 7, data)).unwrap();

    assert_eq!(data_keys(&report), vec!["relay_1", "relay_3", "port"]);
    assert_eq!(report.data_value("relay_1"), Some(&ReportValue::Bool(true)));
    assert_eq!(report.data_value("relay_3"), Some(&ReportValue::Bool(false)));
}

#[test]
fn test_hidden_and_renamed_fields() {
    let data = FieldTree::new()
        .with_uint("_spare", 0)
        .with_bool("has_gps", true)
        .with_bits("status_bits", &[true, false])
        .with_bytes("ip_address_bytes", &[10, 0, 0, 254])
        .with_text("label", "north gate");
    let report = Flattener::new().flatten(&command(1, 3, data)).unwrap();

    assert_eq!(data_keys(&report), vec!["ip_address", "label"]);
    assert_eq!(report.data_value("ip_address"), Some(&ReportValue::Text("10.0.0.254".into())));
    assert_eq!(
        report.to_json().unwrap(),
        r#"{"ref":1,"type":2,"code":3,"data":{"ip_address":"10.0.0.254","label":"north gate"}}"#
    );
}

#[test]
fn test_list_values_follow_reversed_presence() {
    let data = FieldTree::new()
        .with_bits("analog_presence_bits", &[true, false, false])
        .with_list("analog_value_bits", vec![Scalar::UInt(10), Scalar::UInt(20), Scalar::UInt(30)]);
    let report = Flattener::new().flatten(&command(1, 2, data)).unwrap();

    // 最後の presence ビットが先頭になる
    assert_eq!(data_keys(&report), vec!["analog_3"]);
    assert_eq!(report.data_value("analog_3"), Some(&ReportValue::UInt(10)));
}

#[test]
fn test_contract_violations() {
    let flattener = Flattener::new();

    let missing_ref = FieldTree::new().with_uint("type", 2);
    assert_eq!(flattener.flatten(&missing_ref).unwrap_err(), SchemaContractError::MissingField("ref".into()));

    let lonely = FieldTree::new().with_bits("relay_presence_bits", &[true]);
    assert!(matches!(
        flattener.flatten(&command(1, 1, lonely)).unwrap_err(),
        SchemaContractError::MissingValueBits { .. }
    ));

    let uneven = FieldTree::new()
        .with_bits("relay_presence_bits", &[true, true])
        .with_bits("relay_value_bits", &[true]);
    assert!(matches!(
        flattener.flatten(&command(1, 1, uneven)).unwrap_err(),
        SchemaContractError::BitmapLengthMismatch { presence_len: 2, value_len: 1, .. }
    ));
}

#[test]
fn test_flatten_is_repeatable() {
    let data = FieldTree::new()
        .with_bits("input_presence_bits", &[true, true, false, true])
        .with_bits("input_value_bits", &[false, true, true, false])
        .with_uint("ext_voltage", 12000);
    let tree = command(4, 2, data);
    let flattener = Flattener::new();

    let first = flattener.flatten(&tree).unwrap();
    let second = flattener.flatten(&tree).unwrap();
    assert_eq!(first, second);
    assert_eq!(first.to_json().unwrap(), second.to_json().unwrap());
}

#[test]
fn test_random_bitmaps_emit_one_key_per_set_bit() {
    let mut rng = rand::thread_rng();
    let flattener = Flattener::new();

    for _ in 0..200 {
        let len = rng.gen_range(1..=16);
        let presence: Vec<bool> = (0..len).map(|_| rng.gen_bool(0.5)).collect();
        let values: Vec<bool> = (0..len).map(|_| rng.gen_bool(0.5)).collect();
        let data = FieldTree::new()
            .with_bits("output_presence_bits", &presence)
            .with_bits("output_value_bits", &values);

        let report = flattener.flatten(&command(1, 2, data)).unwrap();
        let keys = data_keys(&report);

        assert_eq!(keys.len(), presence.iter().filter(|b| **b).count());
        for key in &keys {
            let index: usize = key.trim_start_matches("output_").parse().unwrap();
            assert!(index >= 1 && index <= len);
            // 反転後の位置 index-1 は元の位置 len-index
            assert!(presence[len - index]);
            assert_eq!(report.data_value(key), Some(&ReportValue::Bool(values[len - index])));
        }
    }
}
