//! End-to-end tests of the multiplexed control backend.

use regforge_codegen::{generate, GenError, Generated};
use regforge_config::{Backend, RegforgeConfig};
use regforge_diagnostics::{DiagnosticSink, Severity};
use regforge_ir::{check_widths, Choice, Expr, PortDirection, SignalId, Statement};
use regforge_tree::load_map_from_str;

fn run(json: &str) -> (Result<Generated, GenError>, DiagnosticSink) {
    let map = load_map_from_str(json).unwrap();
    let sink = DiagnosticSink::new();
    let res = generate(&map, &RegforgeConfig::default(), &sink);
    (res, sink)
}

fn gen(json: &str) -> Generated {
    let (res, _) = run(json);
    res.unwrap()
}

fn sig(g: &Generated, name: &str) -> SignalId {
    g.module
        .find_signal(name)
        .unwrap_or_else(|| panic!("no signal {name}"))
}

/// Value of the top-level assignment to `name`.
fn driver<'a>(g: &'a Generated, name: &str) -> &'a Expr {
    let target = Expr::sig(sig(g, name));
    g.module
        .stmts
        .iter()
        .find_map(|s| match s {
            Statement::Assign { target: t, value } if *t == target => Some(value),
            _ => None,
        })
        .unwrap_or_else(|| panic!("{name} is not driven"))
}

fn process<'a>(g: &'a Generated, name: &str) -> &'a Statement {
    g.module
        .stmts
        .iter()
        .find(|s| match s {
            Statement::Comb { name: n, .. } | Statement::Sync { name: n, .. } => n == name,
            _ => false,
        })
        .unwrap_or_else(|| panic!("no process {name}"))
}

fn has_process(g: &Generated, name: &str) -> bool {
    g.module.stmts.iter().any(|s| match s {
        Statement::Comb { name: n, .. } | Statement::Sync { name: n, .. } => n == name,
        _ => false,
    })
}

fn tap(g: &Generated, line: &str, depth: u32) -> Expr {
    Expr::sig(sig(g, line)).index(depth)
}

const CTRL_STATUS: &str = r#"{
    "name": "Dev", "bus": "cern-be-vme-32", "word_size": 4, "size": 16, "blk_bits": 4,
    "elements": [
      {"kind": "reg", "name": "ctrl", "access": "wo", "width": 32, "address": 0,
       "fields": [{"lo": 0, "hi": 31}]},
      {"kind": "reg", "name": "status", "access": "ro", "width": 16, "address": 4,
       "fields": [{"name": "busy", "lo": 0}, {"name": "count", "lo": 4, "hi": 11}]}
    ]}"#;

#[test]
fn module_shape() {
    let g = gen(CTRL_STATUS);
    assert_eq!(g.backend, Backend::Regctrl);
    assert_eq!(g.module.name, "RegCtrl_Dev");
    assert_eq!(g.module.libraries, ["CommonVisual"]);
    assert_eq!(g.module.deps, ["MemMap_Dev"]);
    let names: Vec<_> = g.module.ports.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(
        names,
        [
            "Clk",
            "Rst",
            "VMEAddr",
            "VMERdData",
            "VMEWrData",
            "VMERdMem",
            "VMEWrMem",
            "VMERdDone",
            "VMEWrDone",
            "ctrl",
            "status_busy",
            "status_count",
        ]
    );
    let addr = g.module.port("VMEAddr").unwrap();
    assert_eq!((addr.width, addr.lo), (Some(2), 2));
    assert_eq!(g.module.port("ctrl").unwrap().direction, PortDirection::Output);
    let count = g.module.port("status_count").unwrap();
    assert_eq!(count.direction, PortDirection::Input);
    assert_eq!((count.width, count.lo), (Some(8), 4));
    assert_eq!(g.module.port("status_busy").unwrap().width, None);
    assert!(check_widths(&g.module).is_empty());
}

#[test]
fn pipeline_depth_with_control_and_status() {
    let g = gen(CTRL_STATUS);
    assert_eq!(
        driver(&g, "RegWrDone"),
        &tap(&g, "Loc_VMEWrMem", 1).and(Expr::sig(sig(&g, "CRegWrOK")))
    );
    assert_eq!(
        driver(&g, "RegRdDone"),
        &tap(&g, "Loc_VMERdMem", 2).and(Expr::sig(sig(&g, "RegRdOK")))
    );
    assert!(has_process(&g, "CRegRdMux_DFF"));
    assert!(has_process(&g, "RegRdMux_DFF"));
}

#[test]
fn read_only_area_has_single_stage() {
    let g = gen(
        r#"{"name": "Ro", "bus": "cern-be-vme-32", "word_size": 4, "size": 8, "blk_bits": 3,
            "elements": [
              {"kind": "reg", "name": "a", "access": "ro", "width": 32, "address": 0,
               "fields": [{"lo": 0, "hi": 31}]},
              {"kind": "reg", "name": "b", "access": "cst", "width": 32, "address": 4,
               "fields": [{"lo": 0, "hi": 31, "preset": 7}]}
            ]}"#,
    );
    assert_eq!(
        driver(&g, "RegWrDone"),
        &tap(&g, "Loc_VMEWrMem", 0).and(Expr::sig(sig(&g, "CRegWrOK")))
    );
    assert_eq!(
        driver(&g, "RegRdDone"),
        &tap(&g, "Loc_VMERdMem", 1).and(Expr::sig(sig(&g, "RegRdOK")))
    );
    assert!(!has_process(&g, "WrSelDec"));
    assert_eq!(driver(&g, "CRegRdOK"), &Expr::sig(sig(&g, "Loc_CRegRdOK")));
    // Constants have no ports and drive the live value from the preset.
    assert!(g.module.port("b").is_none());
    assert_eq!(driver(&g, "Loc_b"), &Expr::konst(7, 32));
    assert!(g.module.components.is_empty());
    assert!(check_widths(&g.module).is_empty());
}

#[test]
fn write_only_area_skips_register_read_mux() {
    let g = gen(
        r#"{"name": "Wo", "bus": "cern-be-vme-32", "word_size": 4, "size": 8, "blk_bits": 3,
            "elements": [
              {"kind": "reg", "name": "go", "access": "wo", "width": 32, "address": 0,
               "fields": [{"lo": 0, "hi": 31}]}
            ]}"#,
    );
    assert_eq!(
        driver(&g, "RegRdDone"),
        &tap(&g, "Loc_VMERdMem", 1).and(Expr::sig(sig(&g, "RegRdOK")))
    );
    assert!(!has_process(&g, "RegRdMux"));
    assert_eq!(driver(&g, "RegRdData"), &Expr::sig(sig(&g, "Loc_RegRdData")));
}

#[test]
fn control_register_instance() {
    let g = gen(CTRL_STATUS);
    let inst = g
        .module
        .stmts
        .iter()
        .find_map(|s| match s {
            Statement::Instance(i) => Some(i),
            _ => None,
        })
        .unwrap();
    assert_eq!(inst.name, "Reg_ctrl");
    assert_eq!(inst.template, "CtrlRegN");
    assert_eq!(inst.params, [("N".to_string(), 32)]);
    let conn = |port: &str| &inst.conns.iter().find(|(p, _)| p == port).unwrap().1;
    assert_eq!(conn("CRegSel"), &Expr::sig(sig(&g, "WrSel_ctrl")));
    assert_eq!(conn("AutoClrMsk"), &Expr::named("C_ACM_ctrl", 32));
    assert_eq!(conn("Preset"), &Expr::named("C_PSM_ctrl", 32));
    assert_eq!(conn("CReg"), &Expr::sig(sig(&g, "Loc_ctrl")));
    assert_eq!(g.module.components.len(), 1);
    assert_eq!(g.module.components[0].name, "CtrlRegN");
    // The writable field output follows the live value.
    assert_eq!(driver(&g, "ctrl"), &Expr::sig(sig(&g, "Loc_ctrl")));
}

#[test]
fn read_only_gaps_come_from_preset_mask() {
    let g = gen(CTRL_STATUS);
    let loc = Expr::sig(sig(&g, "Loc_status"));
    let psm = Expr::named("C_PSM_status", 16);
    let assigns: Vec<_> = g
        .module
        .stmts
        .iter()
        .filter_map(|s| match s {
            Statement::Assign { target, value } => Some((target.clone(), value.clone())),
            _ => None,
        })
        .collect();
    assert!(assigns.contains(&(loc.clone().slice(12, 4), psm.clone().slice(12, 4))));
    assert!(assigns.contains(&(loc.clone().slice(1, 3), psm.slice(1, 3))));
    assert!(assigns.contains(&(
        loc.clone().slice(4, 8),
        Expr::sig(sig(&g, "status_count"))
    )));
    assert!(assigns.contains(&(loc.index(0), Expr::sig(sig(&g, "status_busy")))));
}

#[test]
fn write_select_decoder() {
    let g = gen(CTRL_STATUS);
    let Statement::Comb { stmts, .. } = process(&g, "WrSelDec") else {
        panic!("WrSelDec is not combinational");
    };
    let wrsel = Expr::sig(sig(&g, "WrSel_ctrl"));
    assert_eq!(stmts[0], Statement::assign(wrsel.clone(), Expr::zero()));
    let Statement::Switch { subject, choices } = &stmts[1] else {
        panic!("expected a switch");
    };
    assert_eq!(subject, &Expr::sig(sig(&g, "VMEAddr")).slice(2, 2));
    assert_eq!(choices.len(), 2);
    let Choice::Value { value, stmts } = &choices[0] else {
        panic!("expected a labelled case");
    };
    assert_eq!(value, &Expr::konst(0, 2));
    assert_eq!(stmts[0], Statement::assign(wrsel, Expr::one()));
    assert!(matches!(choices[1], Choice::Default { .. }));
}

#[test]
fn multi_word_register_gets_one_instance_per_word() {
    let g = gen(
        r#"{"name": "Wide", "bus": "cern-be-vme-16", "word_size": 2, "size": 8, "blk_bits": 3,
            "elements": [
              {"kind": "reg", "name": "cnt", "access": "rw", "width": 32, "nwords": 2,
               "address": 0, "fields": [{"lo": 0, "hi": 31}]}
            ]}"#,
    );
    let insts: Vec<_> = g
        .module
        .stmts
        .iter()
        .filter_map(|s| match s {
            Statement::Instance(i) => Some(i.name.as_str()),
            _ => None,
        })
        .collect();
    assert_eq!(insts, ["Reg_cnt_1", "Reg_cnt_0"]);
    let Statement::Comb { stmts, .. } = process(&g, "CRegRdMux") else {
        panic!("CRegRdMux is not combinational");
    };
    let Statement::Switch { choices, .. } = &stmts[0] else {
        panic!("expected a switch");
    };
    let loc = Expr::sig(sig(&g, "Loc_cnt"));
    // Word 1 holds the high half and sits at the lower address.
    let Choice::Value { value, stmts } = &choices[0] else {
        panic!("expected a labelled case");
    };
    assert_eq!(value, &Expr::konst(0, 2));
    assert_eq!(
        stmts[0],
        Statement::assign(Expr::sig(sig(&g, "Loc_CRegRdData")), loc.slice(16, 16))
    );
    assert!(check_widths(&g.module).is_empty());
}

#[test]
fn rmw_register_takes_double_width_data() {
    let g = gen(
        r#"{"name": "Rmw", "bus": "cern-be-vme-32", "word_size": 4, "size": 8, "blk_bits": 3,
            "elements": [
              {"kind": "reg", "name": "bits", "access": "rw", "width": 16, "address": 0,
               "x_gena": {"type": "rmw"}, "fields": [{"lo": 0, "hi": 15}]}
            ]}"#,
    );
    assert_eq!(g.module.components[0].name, "RMWReg");
    let inst = g
        .module
        .stmts
        .iter()
        .find_map(|s| match s {
            Statement::Instance(i) => Some(i),
            _ => None,
        })
        .unwrap();
    assert_eq!(inst.template, "RMWReg");
    assert_eq!(inst.conns[0].1, Expr::sig(sig(&g, "VMEWrData")));
    assert!(check_widths(&g.module).is_empty());
}

#[test]
fn rmw_register_too_wide_is_fatal() {
    let (res, _) = run(
        r#"{"name": "Rmw", "bus": "cern-be-vme-32", "word_size": 4, "size": 8, "blk_bits": 3,
            "elements": [
              {"kind": "reg", "name": "bits", "access": "rw", "width": 32, "address": 0,
               "x_gena": {"type": "rmw"}, "fields": [{"lo": 0, "hi": 31}]}
            ]}"#,
    );
    assert!(matches!(
        res,
        Err(GenError::RmwTooWide { needed: 64, word_bits: 32, .. })
    ));
}

#[test]
fn unknown_register_type_is_fatal() {
    let (res, _) = run(
        r#"{"name": "T", "bus": "cern-be-vme-32", "word_size": 4, "size": 8, "blk_bits": 3,
            "elements": [
              {"kind": "reg", "name": "r", "access": "rw", "width": 32, "address": 0,
               "x_gena": {"type": "fifo"}, "fields": [{"lo": 0, "hi": 31}]}
            ]}"#,
    );
    let err = res.unwrap_err();
    assert!(matches!(err, GenError::Template { .. }));
    assert_eq!(err.path(), Some("T.r"));
}

const WITH_MEMORIES: &str = r#"{
    "name": "Mem", "bus": "cern-be-vme-32", "word_size": 4, "bus_error": true, "size": 64,
    "sel_bits": 2, "blk_bits": 4,
    "elements": [
      {"kind": "reg", "name": "r", "access": "rw", "width": 32, "address": 0,
       "fields": [{"lo": 0, "hi": 31}]},
      {"kind": "array", "name": "buf", "address": 32, "size": 16, "sel_bits": 2,
       "elements": [{"kind": "reg", "name": "d", "access": "ro", "width": 16,
                     "fields": [{"lo": 0, "hi": 15}]}]},
      {"kind": "array", "name": "cmd", "address": 48, "size": 12, "sel_bits": 2,
       "elements": [{"kind": "reg", "name": "c", "access": "wo", "width": 32,
                     "fields": [{"lo": 0, "hi": 31}]}]}
    ]}"#;

#[test]
fn memory_ports_and_assignments() {
    let g = gen(WITH_MEMORIES);
    for port in [
        "buf_Sel",
        "buf_Addr",
        "buf_RdData",
        "buf_RdMem",
        "buf_RdDone",
        "cmd_WrData",
        "cmd_WrMem",
        "cmd_WrDone",
        "VMERdError",
        "VMEWrError",
    ] {
        assert!(g.module.port(port).is_some(), "missing {port}");
    }
    assert!(g.module.port("buf_WrData").is_none());
    assert!(g.module.port("cmd_RdData").is_none());
    assert_eq!(
        driver(&g, "buf_Addr"),
        &Expr::sig(sig(&g, "VMEAddr")).slice(2, 2)
    );
    assert_eq!(
        driver(&g, "buf_RdMem"),
        &Expr::sig(sig(&g, "Sel_buf")).and(Expr::sig(sig(&g, "VMERdMem")))
    );
    assert_eq!(
        driver(&g, "cmd_WrData"),
        &Expr::sig(sig(&g, "VMEWrData"))
    );
    assert!(check_widths(&g.module).is_empty());
}

#[test]
fn memory_read_mux_compares_word_range() {
    let g = gen(WITH_MEMORIES);
    let Statement::Comb { stmts, .. } = process(&g, "MemRdMux") else {
        panic!("MemRdMux is not combinational");
    };
    assert_eq!(
        stmts[0],
        Statement::assign(Expr::sig(sig(&g, "Sel_buf")), Expr::zero())
    );
    let Statement::If {
        condition,
        then_stmts,
        else_stmts,
    } = &stmts[1]
    else {
        panic!("expected an if chain");
    };
    let word = Expr::sig(sig(&g, "VMEAddr")).slice(2, 4);
    assert_eq!(
        condition,
        &word
            .clone()
            .ge(Expr::konst(8, 4))
            .and(word.le(Expr::konst(11, 4)))
    );
    assert_eq!(
        then_stmts[1],
        Statement::assign(
            Expr::sig(sig(&g, "Loc_MemRdData")),
            Expr::sig(sig(&g, "buf_RdData")).zext(32)
        )
    );
    // Reading the write-only memory terminates with an error on the raw strobe.
    let Statement::If {
        then_stmts: cmd, else_stmts: rest, ..
    } = &else_stmts[0]
    else {
        panic!("expected a second branch");
    };
    assert!(cmd.contains(&Statement::assign(
        Expr::sig(sig(&g, "Loc_MemRdError")),
        tap(&g, "Loc_VMERdMem", 0)
    )));
    // Everything else falls through to the register path.
    assert!(rest.contains(&Statement::assign(
        Expr::sig(sig(&g, "Loc_MemRdDone")),
        Expr::sig(sig(&g, "RegRdDone"))
    )));
}

#[test]
fn memory_only_area_completes_on_the_raw_strobe() {
    let g = gen(
        r#"{"name": "Buf", "bus": "cern-be-vme-32", "word_size": 4, "size": 32,
            "sel_bits": 1, "blk_bits": 4,
            "elements": [
              {"kind": "array", "name": "ram", "address": 16, "size": 16, "sel_bits": 2,
               "elements": [{"kind": "reg", "name": "d", "access": "rw", "width": 32,
                             "fields": [{"lo": 0, "hi": 31}]}]}
            ]}"#,
    );
    assert_eq!(
        driver(&g, "RegRdDone"),
        &tap(&g, "Loc_VMERdMem", 0).and(Expr::sig(sig(&g, "RegRdOK")))
    );
    assert_eq!(
        driver(&g, "RegWrDone"),
        &tap(&g, "Loc_VMEWrMem", 0).and(Expr::sig(sig(&g, "CRegWrOK")))
    );
    assert_eq!(driver(&g, "Loc_CRegWrOK"), &Expr::zero());
    assert!(!has_process(&g, "CRegRdMux_DFF"));
    assert!(!has_process(&g, "RegRdMux_DFF"));
    assert!(has_process(&g, "MemRdMux_DFF"));
    assert!(has_process(&g, "MemWrMux_DFF"));
    assert!(check_widths(&g.module).is_empty());
}

#[test]
fn bus_error_outputs_follow_area_errors() {
    let g = gen(WITH_MEMORIES);
    assert_eq!(driver(&g, "VMERdError"), &Expr::sig(sig(&g, "RdError")));
    assert_eq!(
        driver(&g, "RegRdError"),
        &tap(&g, "Loc_VMERdMem", 1).and(Expr::sig(sig(&g, "RegRdOK")).not())
    );
}

#[test]
fn nested_block_is_guarded_and_selected() {
    let g = gen(
        r#"{"name": "Top", "bus": "cern-be-vme-32", "word_size": 4, "size": 64,
            "sel_bits": 2, "blk_bits": 4,
            "elements": [
              {"kind": "reg", "name": "r", "access": "ro", "width": 32, "address": 4,
               "fields": [{"lo": 0, "hi": 31}]},
              {"kind": "block", "name": "sub", "address": 32, "size": 16, "blk_bits": 4,
               "elements": [
                 {"kind": "reg", "name": "s", "access": "rw", "width": 16, "address": 0,
                  "fields": [{"lo": 0, "hi": 15}]}
               ]}
            ]}"#,
    );
    assert!(g.module.port("sub_s").is_some());
    assert!(has_process(&g, "sub_WrSelDec"));
    let hit = Expr::sig(sig(&g, "VMEAddr"))
        .slice(4, 2)
        .equals(Expr::konst(2, 2));
    let Statement::Comb { stmts, .. } = process(&g, "sub_WrSelDec") else {
        panic!("sub_WrSelDec is not combinational");
    };
    assert!(stmts
        .iter()
        .any(|s| matches!(s, Statement::If { condition, .. } if *condition == hit)));
    let Statement::Comb { stmts, .. } = process(&g, "AreaMux") else {
        panic!("AreaMux is not combinational");
    };
    let Statement::If {
        condition,
        then_stmts,
        ..
    } = &stmts[0]
    else {
        panic!("expected the child selection");
    };
    assert_eq!(condition, &hit);
    assert_eq!(
        then_stmts[0],
        Statement::assign(
            Expr::sig(sig(&g, "RdData")),
            Expr::sig(sig(&g, "sub_RdData"))
        )
    );
    assert!(check_widths(&g.module).is_empty());
}

#[test]
fn constant_without_preset_warns() {
    let (res, sink) = run(
        r#"{"name": "C", "bus": "cern-be-vme-32", "word_size": 4, "size": 8, "blk_bits": 3,
            "elements": [
              {"kind": "reg", "name": "id", "access": "cst", "width": 32, "address": 0,
               "fields": [{"lo": 0, "hi": 31}]}
            ]}"#,
    );
    assert!(res.is_ok());
    let diags = sink.diagnostics();
    assert_eq!(diags.len(), 1);
    assert_eq!(diags[0].severity, Severity::Warning);
}

#[test]
fn generation_is_repeatable() {
    let map = load_map_from_str(WITH_MEMORIES).unwrap();
    let config = RegforgeConfig::default();
    let a = generate(&map, &config, &DiagnosticSink::new()).unwrap();
    let b = generate(&map, &config, &DiagnosticSink::new()).unwrap();
    assert_eq!(a, b);
}

#[test]
fn single_word_map_needs_no_address_decoding() {
    let g = gen(
        r#"{"name": "One", "bus": "cern-be-vme-32", "word_size": 4, "size": 4, "blk_bits": 2,
            "elements": [
              {"kind": "reg", "name": "ctrl", "access": "rw", "width": 32, "address": 0,
               "fields": [{"lo": 0, "hi": 31}]}
            ]}"#,
    );
    assert_eq!(g.module.port("VMEAddr").unwrap().width, Some(1));
    let Statement::Comb { stmts, .. } = process(&g, "WrSelDec") else {
        panic!("WrSelDec is not combinational");
    };
    assert!(!stmts.iter().any(|s| matches!(s, Statement::Switch { .. })));
    assert!(stmts.contains(&Statement::assign(
        Expr::sig(sig(&g, "WrSel_ctrl")),
        Expr::one()
    )));
    assert!(check_widths(&g.module).is_empty());
}

#[test]
fn misaligned_block_is_fatal() {
    let (res, _) = run(
        r#"{"name": "Mis", "bus": "cern-be-vme-32", "word_size": 4, "size": 32, "blk_bits": 5,
            "elements": [
              {"kind": "block", "name": "sub", "address": 8, "size": 16, "blk_bits": 4,
               "elements": [
                 {"kind": "reg", "name": "s", "access": "ro", "width": 32, "address": 0,
                  "fields": [{"lo": 0, "hi": 31}]}
               ]}
            ]}"#,
    );
    let err = res.unwrap_err();
    assert!(matches!(err, GenError::Area { address: 8, size: 16, .. }));
    assert_eq!(err.path(), Some("Mis.sub"));
}
