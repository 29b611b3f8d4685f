use gf_format::{
    load_component, save_component, ComponentMetadata, LoadError, SaveError, FORMAT_ID,
    FORMAT_VERSION,
};
use gf_kernel::{KernelIntrospect, SectionKernel};
use gf_types::{BaseplateSpec, BinSpec, ComponentSpec, Dividers, HoleSpec, LipStyle};
use serde_json::{json, Value};

// ── Helpers ──────────────────────────────────────────────────────────────

fn sample_bin() -> ComponentSpec {
    let mut bin = BinSpec::new(3.0, 2.0, 6.0);
    bin.dividers = Dividers {
        length_count: 2,
        width_count: 0,
    };
    bin.scoops = true;
    bin.holes = Some(HoleSpec::magnet());
    ComponentSpec::Bin(bin)
}

fn sample_plate() -> ComponentSpec {
    let mut bp = BaseplateSpec::fit_to_drawer([300.0, 200.0], [-1.0, 0.0]);
    bp.screw_holes = true;
    ComponentSpec::Baseplate(bp)
}

fn envelope(version: u32, component: Value) -> String {
    json!({
        "format": FORMAT_ID,
        "version": version,
        "metadata": {
            "name": "legacy",
            "created": "2024-03-01T10:00:00Z",
            "modified": "2024-03-02T10:00:00Z"
        },
        "component": component
    })
    .to_string()
}

// ── Save ─────────────────────────────────────────────────────────────────

#[test]
fn save_writes_the_envelope() {
    let json = save_component(&sample_bin(), &ComponentMetadata::new("tools")).unwrap();
    let v: Value = serde_json::from_str(&json).unwrap();
    assert_eq!(v["format"], FORMAT_ID);
    assert_eq!(v["version"], FORMAT_VERSION);
    assert_eq!(v["metadata"]["name"], "tools");
    assert_eq!(v["component"]["kind"], "bin");
    assert_eq!(v["component"]["dividers"]["length_count"], 2);
    assert!(v["metadata"].get("notes").is_none());
}

#[test]
fn save_refuses_out_of_range_specs() {
    let mut bin = BinSpec::new(2.0, 2.0, 3.0);
    bin.wall_thickness = 9.0;
    let err = save_component(&ComponentSpec::Bin(bin), &ComponentMetadata::new("bad")).unwrap_err();
    assert!(matches!(err, SaveError::Invalid(_)));
}

// ── Load ─────────────────────────────────────────────────────────────────

#[test]
fn round_trip_bin() {
    let meta = ComponentMetadata::new("tools");
    let spec = sample_bin();
    let loaded = load_component(&save_component(&spec, &meta).unwrap()).unwrap();
    assert_eq!(loaded.document.spec, spec);
    assert!(loaded.document.warnings.is_empty());
    assert_eq!(loaded.metadata, meta);
    assert_eq!(loaded.source_version, FORMAT_VERSION);
}

#[test]
fn round_trip_drawer_fit_plate() {
    let spec = sample_plate();
    let json = save_component(&spec, &ComponentMetadata::new("drawer")).unwrap();
    assert_eq!(load_component(&json).unwrap().document.spec, spec);
}

#[test]
fn load_rejects_unknown_format() {
    let json = json!({
        "format": "something-else",
        "version": 1,
        "metadata": { "name": "x", "created": "2024-03-01T10:00:00Z", "modified": "2024-03-01T10:00:00Z" },
        "component": { "kind": "bin" }
    })
    .to_string();
    assert!(matches!(load_component(&json), Err(LoadError::UnknownFormat(f)) if f == "something-else"));
}

#[test]
fn load_rejects_future_version() {
    let json = envelope(FORMAT_VERSION + 1, json!({ "kind": "bin" }));
    assert_eq!(
        load_component(&json).unwrap_err(),
        LoadError::FutureVersion {
            file_version: FORMAT_VERSION + 1,
            supported_version: FORMAT_VERSION,
        }
    );
}

#[test]
fn load_rejects_invalid_json() {
    assert!(matches!(load_component("{ not json"), Err(LoadError::Parse(_))));
}

#[test]
fn load_rejects_invalid_component() {
    let json = envelope(2, json!({ "kind": "bin", "wall_thickness": 0.1 }));
    assert!(matches!(load_component(&json), Err(LoadError::Invalid(_))));
}

#[test]
fn unknown_keys_come_back_as_warnings() {
    let json = envelope(2, json!({ "kind": "bin", "scoop": true }));
    let loaded = load_component(&json).unwrap();
    assert_eq!(loaded.document.warnings.len(), 1);
}

// ── Migration ────────────────────────────────────────────────────────────

#[test]
fn version_one_bin_migrates() {
    let json = envelope(
        1,
        json!({
            "kind": "bin",
            "size": { "length_u": 2, "width_u": 1 },
            "no_lip": true,
            "holes": true
        }),
    );
    let loaded = load_component(&json).unwrap();
    assert_eq!(loaded.source_version, 1);
    let ComponentSpec::Bin(bin) = loaded.document.spec else {
        panic!("expected a bin");
    };
    assert_eq!(bin.lip, LipStyle::None);
    assert_eq!(bin.holes, Some(HoleSpec::magnet()));
    assert!(loaded.document.warnings.is_empty());
}

#[test]
fn migrated_document_saves_as_current() {
    let json = envelope(1, json!({ "kind": "baseplate", "size": { "length_u": 2, "width_u": 2 }, "holes": false }));
    let loaded = load_component(&json).unwrap();
    let resaved = save_component(&loaded.document.spec, &loaded.metadata).unwrap();
    let again = load_component(&resaved).unwrap();
    assert_eq!(again.source_version, FORMAT_VERSION);
    assert_eq!(again.document.spec, loaded.document.spec);
}

// ── Load then build ──────────────────────────────────────────────────────

#[test]
fn loaded_document_builds() {
    let json = save_component(&sample_bin(), &ComponentMetadata::new("tools")).unwrap();
    let loaded = load_component(&json).unwrap();
    let mut k = SectionKernel::new();
    let out = gf_engine::build(&loaded.document, &mut k).unwrap();
    assert!(k.check_validity(&out.solid).unwrap().is_valid());
    assert!(out.report.stage("scoops").is_some());
}
