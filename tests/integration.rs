//! End-to-end tests for the backend core
//!
//! These drive a small two-procedure program through CFG construction,
//! liveness and register allocation using only the public API.

use std::collections::HashSet;

use mjc_backend::compiler::{
    BinOpKind, ControlFlowGraph, IrProgram, LivenessInfo, MethodEntry, ObjectLayout,
    ObjectLayoutManager, Operand, Quad, SymbolId, SymbolKind, SymbolTable,
};
use mjc_backend::{AllocConfig, CompileError, SpillPolicy, allocate_program};

struct Fixture {
    program: IrProgram,
    counter: SymbolId,
    this: SymbolId,
    count: SymbolId,
    main_locals: Vec<SymbolId>,
}

fn label(name: &str) -> Quad {
    Quad::Label {
        name: name.to_string(),
        entry: None,
    }
}

/// class Counter { int count; int inc(int n) { count = count + n; return count; } }
/// main: fills an array in a loop, sums it and hands the sum to Counter.inc
fn make_counter_program() -> Fixture {
    let mut symbols = SymbolTable::new();
    let inc = symbols.declare("Counter.inc", SymbolKind::Method);
    let main = symbols.declare("main", SymbolKind::Method);
    let this = symbols.declare("this", SymbolKind::Receiver);
    let counter = symbols.declare_class("Counter", None);
    let count = symbols.declare_field("count", counter);
    let n = symbols.declare("n", SymbolKind::Param);
    let t0 = symbols.declare("t0", SymbolKind::Temp);
    let i = symbols.declare("i", SymbolKind::Local);
    let s = symbols.declare("s", SymbolKind::Local);
    let arr = symbols.declare("arr", SymbolKind::Local);
    let obj = symbols.declare("obj", SymbolKind::Local);
    let r = symbols.declare("r", SymbolKind::Local);
    let t1 = symbols.declare("t1", SymbolKind::Temp);
    let t2 = symbols.declare("t2", SymbolKind::Temp);

    let quads = vec![
        Quad::Label {
            name: "Counter.inc".into(),
            entry: Some(MethodEntry {
                method: inc,
                params: vec![n],
                receiver: Some(this),
            }),
        },
        Quad::Assign {
            op: BinOpKind::Add,
            dst: t0,
            lhs: Operand::Symbol(count),
            rhs: Operand::Symbol(n),
        },
        Quad::Copy {
            dst: count,
            src: Operand::Symbol(t0),
        },
        Quad::Return {
            val: Some(Operand::Symbol(count)),
        },
        Quad::Label {
            name: "main".into(),
            entry: Some(MethodEntry {
                method: main,
                params: vec![],
                receiver: None,
            }),
        },
        Quad::Copy {
            dst: i,
            src: Operand::Const(0),
        },
        Quad::Copy {
            dst: s,
            src: Operand::Const(0),
        },
        Quad::NewArray {
            dst: arr,
            len: Operand::Const(10),
        },
        label("L_head"),
        Quad::Assign {
            op: BinOpKind::Lt,
            dst: t1,
            lhs: Operand::Symbol(i),
            rhs: Operand::Const(10),
        },
        Quad::CondJump {
            cond: Operand::Symbol(t1),
            target: "L_done".into(),
        },
        Quad::ArrayAssign {
            array: arr,
            index: Operand::Symbol(i),
            value: Operand::Symbol(i),
        },
        Quad::ArrayLookup {
            dst: t2,
            array: arr,
            index: Operand::Symbol(i),
        },
        Quad::Assign {
            op: BinOpKind::Add,
            dst: s,
            lhs: Operand::Symbol(s),
            rhs: Operand::Symbol(t2),
        },
        Quad::Assign {
            op: BinOpKind::Add,
            dst: i,
            lhs: Operand::Symbol(i),
            rhs: Operand::Const(1),
        },
        Quad::Jump {
            target: "L_head".into(),
        },
        label("L_done"),
        Quad::NewObject {
            dst: obj,
            class: "Counter".into(),
        },
        Quad::Param {
            arg: Operand::Symbol(obj),
        },
        Quad::Param {
            arg: Operand::Symbol(s),
        },
        Quad::Call {
            dst: Some(r),
            method: inc,
            arg_count: 2,
        },
        Quad::Return {
            val: Some(Operand::Symbol(r)),
        },
    ];

    Fixture {
        program: IrProgram::new(symbols, quads),
        counter,
        this,
        count,
        main_locals: vec![i, s, arr, obj, r, t1, t2],
    }
}

#[test]
fn test_allocate_whole_program() {
    let fixture = make_counter_program();
    let layout = ObjectLayoutManager::from_symbols(&fixture.program.symbols).unwrap();
    let config = AllocConfig::default();

    let allocation = allocate_program(&fixture.program, &layout, &config).unwrap();
    assert_eq!(allocation.procedures.len(), 2);
    assert_eq!(allocation.procedures[0].name, "Counter.inc");
    assert_eq!(allocation.procedures[1].name, "main");

    for procedure in &allocation.procedures {
        assert!(procedure.result.is_complete());
        assert!(
            procedure
                .result
                .coloring
                .values()
                .all(|&c| c < config.registers)
        );
    }

    let main = allocation.procedure("main").unwrap();
    for sym in &fixture.main_locals {
        assert!(main.result.color_of(*sym).is_some(), "{} has no color", sym);
    }

    let inc = allocation.procedure("Counter.inc").unwrap();
    assert_ne!(
        inc.result.color_of(fixture.this),
        inc.result.color_of(fixture.count),
        "receiver must survive every field access"
    );
    assert_eq!(allocation.color_of(fixture.this), inc.result.color_of(fixture.this));
    assert_eq!(
        allocation.coloring().len(),
        allocation
            .procedures
            .iter()
            .map(|p| p.result.coloring.len())
            .sum::<usize>()
    );
}

#[test]
fn test_simultaneously_live_symbols_get_distinct_registers() {
    let fixture = make_counter_program();
    let layout = ObjectLayoutManager::from_symbols(&fixture.program.symbols).unwrap();
    let allocation = allocate_program(&fixture.program, &layout, &AllocConfig::new(4)).unwrap();
    let coloring = allocation.coloring();

    let cfgs = ControlFlowGraph::build_program(&fixture.program).unwrap();
    for cfg in &cfgs {
        let liveness = LivenessInfo::compute(cfg);
        assert_eq!(liveness.check_fixpoint(cfg), None);

        for live in liveness.live_in.values().chain(liveness.live_out.values()) {
            let colors: HashSet<usize> = live.iter().map(|s| coloring[s]).collect();
            assert_eq!(colors.len(), live.len(), "live set {:?} shares a register", live);
        }
    }
}

#[test]
fn test_loop_state_stays_live_around_back_edge() {
    let fixture = make_counter_program();
    let cfgs = ControlFlowGraph::build_program(&fixture.program).unwrap();
    let main = &cfgs[1];

    let header = main
        .blocks
        .iter()
        .find(|b| b.label() == Some("L_head"))
        .unwrap();
    let liveness = LivenessInfo::compute(main);
    for sym in &fixture.main_locals[..3] {
        assert!(liveness.is_live_in(header.id, *sym));
        assert!(liveness.is_live_out(header.id, *sym));
    }
}

#[test]
fn test_register_pressure_failure_names_procedure() {
    let fixture = make_counter_program();
    let layout = ObjectLayoutManager::from_symbols(&fixture.program.symbols).unwrap();

    let err = allocate_program(&fixture.program, &layout, &AllocConfig::new(2)).unwrap_err();
    match &err {
        CompileError::RegisterSpill { procedure, .. } => assert_eq!(procedure, "main"),
        other => panic!("expected a register spill, got {other:?}"),
    }
    assert!(!err.is_internal());
    assert!(err.to_string().contains("main"));
}

#[test]
fn test_malformed_ir_is_internal_error() {
    let mut fixture = make_counter_program();
    fixture.program.quads.push(Quad::Jump {
        target: "L_missing".into(),
    });
    let layout = ObjectLayoutManager::from_symbols(&fixture.program.symbols).unwrap();

    let err = allocate_program(&fixture.program, &layout, &AllocConfig::default()).unwrap_err();
    assert!(matches!(err, CompileError::MissingProcedureEntry { index: 22 }));
    assert!(err.is_internal());
}

#[test]
fn test_config_from_json() {
    let fixture = make_counter_program();
    let layout = ObjectLayoutManager::from_symbols(&fixture.program.symbols).unwrap();

    let config: AllocConfig =
        serde_json::from_str(r#"{"registers": 4, "spill_policy": "lowest_cost"}"#).unwrap();
    assert_eq!(config.spill_policy, SpillPolicy::LowestCost);

    let allocation = allocate_program(&fixture.program, &layout, &config).unwrap();
    assert_eq!(allocation.procedures.len(), 2);

    let json = serde_json::to_string(&config).unwrap();
    let back: AllocConfig = serde_json::from_str(&json).unwrap();
    assert_eq!(back, config);
}

#[test]
fn test_pinned_receiver_still_allocates() {
    let fixture = make_counter_program();
    let layout = ObjectLayoutManager::from_symbols(&fixture.program.symbols).unwrap();
    let config = AllocConfig::new(4).with_pinned_receiver(true);

    let allocation = allocate_program(&fixture.program, &layout, &config).unwrap();
    let inc = allocation.procedure("Counter.inc").unwrap();
    let this_color = inc.result.color_of(fixture.this).unwrap();
    for (sym, color) in &inc.result.coloring {
        if *sym != fixture.this {
            assert_ne!(*color, this_color);
        }
    }
}

#[test]
fn test_layout_of_counter_class() {
    let fixture = make_counter_program();
    let layout = ObjectLayoutManager::from_symbols(&fixture.program.symbols).unwrap();

    assert_eq!(layout.field_offset(fixture.count), Some(0));
    assert_eq!(layout.class_size(fixture.counter), Some(4));
    assert!(layout.is_instance_field(fixture.count));
    assert!(!layout.is_instance_field(fixture.this));
}
