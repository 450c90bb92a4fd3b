//! End-to-end tests of the generic backend and of backend selection.

use regforge_codegen::{generate, GenError, Generated, ToDiagnostic};
use regforge_config::{load_config_from_str, Backend, RegforgeConfig};
use regforge_diagnostics::DiagnosticSink;
use regforge_ir::{check_widths, Statement};
use regforge_tree::{load_map_from_str, RegMap};

const MAP: &str = r#"{
    "name": "Periph", "bus": "wb-32-be", "word_size": 4, "size": 64, "sel_bits": 2, "blk_bits": 4,
    "elements": [
      {"kind": "reg", "name": "ctrl", "access": "rw", "width": 8, "address": 4,
       "fields": [{"name": "en", "lo": 0}, {"name": "mode", "lo": 4, "hi": 7, "preset": 2}]},
      {"kind": "reg", "name": "status", "access": "ro", "width": 32, "address": 0,
       "fields": [{"lo": 0, "hi": 31}]},
      {"kind": "block", "name": "Timer", "address": 32, "size": 16, "blk_bits": 4,
       "elements": [
         {"kind": "reg", "name": "load", "access": "wo", "width": 32, "address": 0,
          "x_hdl": {"write-strobe": true}, "fields": [{"lo": 0, "hi": 31}]},
         {"kind": "reg", "name": "value", "access": "ro", "width": 64, "nwords": 2,
          "address": 8, "fields": [{"lo": 0, "hi": 63}]}
       ]},
      {"kind": "array", "name": "ram", "address": 48, "size": 16, "sel_bits": 2,
       "elements": [{"kind": "reg", "name": "d", "access": "rw", "width": 32,
                     "fields": [{"lo": 0, "hi": 31}]}]}
    ]}"#;

fn map() -> RegMap {
    load_map_from_str(MAP).unwrap()
}

fn gen_with(config: &RegforgeConfig) -> Result<Generated, GenError> {
    generate(&map(), config, &DiagnosticSink::new())
}

#[test]
fn generic_backend_by_default() {
    let g = gen_with(&RegforgeConfig::default()).unwrap();
    assert_eq!(g.backend, Backend::Generic);
    assert_eq!(g.module.name, "Periph");
    for port in [
        "wb_adr_i",
        "periph_ctrl_en_o",
        "periph_ctrl_mode_o",
        "periph_status_i",
        "periph_timer_load_o",
        "periph_timer_load_wr_o",
        "periph_timer_value_i",
        "periph_ram_adr_o",
        "periph_ram_dat_i",
        "periph_ram_dat_o",
        "periph_ram_wr_o",
    ] {
        assert!(g.module.port(port).is_some(), "missing {port}");
    }
    assert_eq!(g.module.port("wb_adr_i").unwrap().width, Some(6));
    assert!(check_widths(&g.module).is_empty());
}

#[test]
fn both_processes_are_clocked_and_reset() {
    let g = gen_with(&RegforgeConfig::default()).unwrap();
    let procs: Vec<_> = g
        .module
        .stmts
        .iter()
        .filter_map(|s| match s {
            Statement::Sync { name, reset, .. } => Some((name.as_str(), reset.is_some())),
            _ => None,
        })
        .collect();
    assert_eq!(procs, [("wb_write", true), ("wb_read", true)]);
}

#[test]
fn annotations_cover_every_field() {
    let m = map();
    let g = generate(&m, &RegforgeConfig::default(), &DiagnosticSink::new()).unwrap();
    for (id, node) in m.iter() {
        if m.field(id).is_none() {
            continue;
        }
        assert!(
            g.annotations.fields.contains(id),
            "no handles for {}",
            node.name
        );
    }
    assert_eq!(g.annotations.arrays.len(), 1);
}

#[test]
fn backend_override_selects_regctrl() {
    let config = load_config_from_str("[generate]\nbackend = \"regctrl\"\n").unwrap();
    let g = gen_with(&config).unwrap();
    assert_eq!(g.backend, Backend::Regctrl);
    assert_eq!(g.module.name, "RegCtrl_Periph");
    assert!(g.module.port("VMEAddr").is_some());
    assert!(check_widths(&g.module).is_empty());
}

#[test]
fn module_name_override() {
    let config = load_config_from_str("[generate]\nmodule = \"periph_regs\"\n").unwrap();
    let g = gen_with(&config).unwrap();
    assert_eq!(g.module.name, "periph_regs");
}

#[test]
fn generation_is_repeatable() {
    let m = map();
    let config = RegforgeConfig::default();
    let a = generate(&m, &config, &DiagnosticSink::new()).unwrap();
    let b = generate(&m, &config, &DiagnosticSink::new()).unwrap();
    assert_eq!(a, b);
}

#[test]
fn output_serializes_to_json() {
    let g = gen_with(&RegforgeConfig::default()).unwrap();
    let json = serde_json::to_string(&g).unwrap();
    let back: Generated = serde_json::from_str(&json).unwrap();
    assert_eq!(back, g);
}

#[test]
fn fatal_errors_carry_code_and_path() {
    let m = load_map_from_str(
        r#"{"name": "Bad", "bus": "wb-32-be", "word_size": 4, "size": 4, "blk_bits": 2,
            "elements": [
              {"kind": "reg", "name": "st", "access": "ro", "width": 32, "address": 0,
               "x_hdl": {"type": "reg"}, "fields": [{"lo": 0, "hi": 31}]}
            ]}"#,
    )
    .unwrap();
    let err = generate(&m, &RegforgeConfig::default(), &DiagnosticSink::new()).unwrap_err();
    assert!(matches!(err, GenError::StorageNotAllowed { .. }));
    let diag = err.to_diagnostic();
    assert_eq!(diag.code.to_string(), "E202");
    assert_eq!(diag.location.as_deref(), Some("Bad.st"));
}
