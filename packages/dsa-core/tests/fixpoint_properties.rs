//! Property-based tests for the context-sensitive fixpoint
//!
//! Small random modules (globals, stores, loads, geps, memcpy, recursive
//! and arity-mismatched calls) must all reach a consistent fixpoint:
//! - Termination: `run_on_module` returns, under both worklist orders
//! - Consistency: the post-condition check finds nothing, and no
//!   propagation ever has to be repeated
//! - Mapper soundness: a function-and-injective simulation decides NONE

use dsa_core::features::dsa::application::decide_propagation;
use dsa_core::features::dsa::SimulationMapper;
use dsa_core::{
    CallGraph, ContextSensitiveAnalysis, DsaCallSite, DsaConfig, FunctionId, GlobalAnalysis,
    GlobalGraphs, Module, PropagationKind, ValueId, WorklistOrder,
};
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum OpShape {
    Alloca,
    Heap,
    Gep(usize, u32),
    Load(usize),
    Store(usize, usize),
    MemCopy(usize, usize),
    Call(usize, Vec<usize>),
}

#[derive(Debug, Clone)]
struct FunctionShape {
    arity: usize,
    ops: Vec<OpShape>,
    ret: Option<usize>,
}

#[derive(Debug, Clone)]
struct ProgramShape {
    globals: usize,
    functions: Vec<FunctionShape>,
}

fn op() -> impl Strategy<Value = OpShape> {
    let v = 0usize..16;
    prop_oneof![
        1 => Just(OpShape::Alloca),
        1 => Just(OpShape::Heap),
        2 => (v.clone(), 0u32..4).prop_map(|(b, o)| OpShape::Gep(b, o * 8)),
        2 => v.clone().prop_map(OpShape::Load),
        3 => (v.clone(), v.clone()).prop_map(|(x, p)| OpShape::Store(x, p)),
        1 => (v.clone(), v.clone()).prop_map(|(d, s)| OpShape::MemCopy(d, s)),
        3 => (0usize..4, prop::collection::vec(v, 0..4)).prop_map(|(c, a)| OpShape::Call(c, a)),
    ]
}

fn function() -> impl Strategy<Value = FunctionShape> {
    (
        0usize..3,
        prop::collection::vec(op(), 0..8),
        prop::option::of(0usize..16),
    )
        .prop_map(|(arity, ops, ret)| FunctionShape { arity, ops, ret })
}

fn program() -> impl Strategy<Value = ProgramShape> {
    (1usize..3, prop::collection::vec(function(), 1..4))
        .prop_map(|(globals, functions)| ProgramShape { globals, functions })
}

/// Operand indices wrap around the values defined so far
fn build(program: &ProgramShape) -> Module {
    let mut m = Module::new("random");
    let globals: Vec<ValueId> = (0..program.globals)
        .map(|i| m.add_global(format!("G{i}")))
        .collect();
    let fs: Vec<FunctionId> = program
        .functions
        .iter()
        .enumerate()
        .map(|(i, f)| m.add_function(format!("f{i}"), f.arity))
        .collect();

    for (f, shape) in fs.iter().copied().zip(&program.functions) {
        let mut pool: Vec<ValueId> = (0..shape.arity).map(|i| m.param(f, i)).collect();
        pool.extend(globals.iter().copied());
        let pick = |pool: &[ValueId], i: usize| pool[i % pool.len()];

        for op in &shape.ops {
            match op {
                OpShape::Alloca => pool.push(m.alloca(f, format!("a{}", pool.len()))),
                OpShape::Heap => pool.push(m.heap_alloc(f, format!("h{}", pool.len()))),
                OpShape::Gep(b, o) => {
                    let base = pick(&pool, *b);
                    pool.push(m.gep(f, base, *o));
                }
                OpShape::Load(p) => {
                    let ptr = pick(&pool, *p);
                    pool.push(m.load(f, ptr));
                }
                OpShape::Store(x, p) => {
                    let (value, ptr) = (pick(&pool, *x), pick(&pool, *p));
                    m.store(f, value, ptr);
                }
                OpShape::MemCopy(d, s) => {
                    let (dst, src) = (pick(&pool, *d), pick(&pool, *s));
                    m.memcpy(f, dst, src);
                }
                OpShape::Call(c, args) => {
                    let callee = fs[c % fs.len()];
                    let args = args.iter().map(|a| pick(&pool, *a)).collect();
                    pool.push(m.call(f, callee, args));
                }
            }
        }
        let ret = shape.ret.map(|i| pick(&pool, i));
        m.ret(f, ret);
    }
    m
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(96))]

    #[test]
    fn prop_context_sensitive_reaches_fixpoint(shape in program()) {
        let m = build(&shape);
        let cg = CallGraph::new(&m);

        for order in [WorklistOrder::Lifo, WorklistOrder::Fifo] {
            let out = ContextSensitiveAnalysis::new(DsaConfig::default().worklist_order(order))
                .run_on_module(&m, &cg)
                .unwrap();

            // Invariant: the fixpoint is consistent and never re-propagates
            prop_assert!(out.failures.is_empty(), "{:?}: {:?}", order, out.failures);
            prop_assert_eq!(out.stats.repeated, 0);

            // Invariant: an injective simulation needs no propagation
            for (caller, record) in cg.all_calls() {
                let cs = DsaCallSite::new(&m, record.instruction).unwrap();
                let Some(callee) = cs.callee().filter(|_| cs.is_resolvable()) else {
                    continue;
                };
                let callee_g = out.get_graph(callee).unwrap();
                let caller_g = out.get_graph(caller).unwrap();
                if let Some(sm) = SimulationMapper::for_call_site(&cs, callee_g, caller_g) {
                    if sm.is_function() && sm.is_injective() {
                        prop_assert_eq!(
                            decide_propagation(&cs, callee_g, caller_g),
                            PropagationKind::None
                        );
                    }
                }
            }
        }
    }
}
