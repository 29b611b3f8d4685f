use gf_harness::helpers::*;
use gf_harness::{ComponentBench, ComponentReport, OracleVerdict};
use gf_types::ConfigDocument;

#[test]
fn report_lists_stages_box_and_checks() {
    let spec = baseplate_with(2.0, 2.0, |bp| bp.weighted = true);
    let mut bench = ComponentBench::section();
    bench.build("plate", spec).unwrap();
    let text = bench.text_report("plate").unwrap();

    assert!(text.starts_with("=== Gridfinity Component Report ==="));
    assert!(text.contains("Component: baseplate \"plate\" (gf_baseplate_2x2_weighted)"), "{text}");
    assert!(text.contains("\"receptacles\" x4"));
    assert!(text.contains("\"weight-pockets\""));
    assert!(text.contains("tool prisms offset off a coplanar face"));
    assert!(text.contains("83.50 x 83.50"));
    assert!(text.contains("Oracle Results (5/5 passed)"));
    assert!(text.contains("Warnings: none"));
}

#[test]
fn report_shows_fillet_outcomes() {
    let mut bench = ComponentBench::section();
    bench.build("bin", bin(1.0, 1.0, 3.0)).unwrap();
    let text = bench.text_report("bin").unwrap();
    assert!(text.contains("Fillets:"));
    assert!(text.contains("compartment-corners: applied"));
    assert!(!text.contains("SKIPPED"));
}

#[test]
fn report_carries_document_warnings() {
    let doc = ConfigDocument::from_json_str(
        r#"{ "kind": "bin", "size": { "length_u": 1, "width_u": 1 }, "scoop": true }"#,
    )
    .unwrap();
    let mut bench = ComponentBench::section();
    bench.build_document("typo", &doc).unwrap();
    let text = bench.text_report("typo").unwrap();
    assert!(text.contains("Warnings (1):"));
    assert!(text.contains("unknown configuration key `scoop`"));
}

#[test]
fn failing_verdicts_are_marked() {
    let mut bench = ComponentBench::section();
    let report = bench.build("bin", bin(1.0, 1.0, 3.0)).unwrap().clone();
    let verdicts = vec![OracleVerdict {
        oracle_name: "volume".to_string(),
        passed: false,
        detail: "volume 1.000 mm^3, expected 2.000".to_string(),
        value: Some(1.0),
    }];
    let r = ComponentReport::from_build("bin", &report, verdicts);
    let text = r.to_string();
    assert!(text.contains("Oracle Results (0/1 passed)"));
    assert!(text.contains("[FAIL] volume: volume 1.000 mm^3"));
    assert_eq!(r.stage_entries[0].feature, "shell");
    assert!(r.stage_entries[0].delta > 0.0);
}

#[test]
fn json_report_nests_build_and_checks() {
    let mut bench = ComponentBench::section();
    bench.build("bin", bin(1.0, 1.0, 3.0)).unwrap();
    let json = bench.json_report("bin").unwrap();
    assert_eq!(json["passed"], true);
    assert_eq!(json["report"]["filename"], "gf_bin_1x1x3");
    assert_eq!(json["checks"].as_array().unwrap().len(), 5);
    assert_eq!(json["checks"][0]["oracle_name"], "validity");
}
