//! Program fixtures
//!
//! Small modules exercising recursion, globals and aliasing at call sites.

use dsa_core::{FunctionId, Module, ValueId};

/// `f` and `g` call each other; `g` returns `&G` and `f` stores into it
pub struct RecursiveGlobal {
    pub module: Module,
    pub f: FunctionId,
    pub g: FunctionId,
    pub main: FunctionId,
    pub global: ValueId,
    /// `%r = call g(p)` inside `f`
    pub call_g: ValueId,
}

pub fn fixture_recursive_global() -> RecursiveGlobal {
    let mut m = Module::new("recursive_global");
    let global = m.add_global("G");
    let f = m.add_function("f", 1);
    let g = m.add_function("g", 1);
    let main = m.add_function("main", 0);

    let p = m.param(f, 0);
    let call_g = m.call(f, g, vec![p]);
    let x = m.alloca(f, "x");
    m.store(f, x, call_g);
    m.ret(f, None);

    let q = m.param(g, 0);
    m.call(g, f, vec![q]);
    m.ret(g, Some(global));

    let a = m.alloca(main, "a");
    m.call(main, f, vec![a]);
    m.ret(main, None);

    RecursiveGlobal {
        module: m,
        f,
        g,
        main,
        global,
        call_g,
    }
}

/// `set(p, q)` stores a fresh object into each argument; `one` passes the
/// same object twice, `two` passes distinct ones
pub struct AliasingCallers {
    pub module: Module,
    pub set: FunctionId,
    pub one: FunctionId,
    pub two: FunctionId,
    pub y: ValueId,
    pub z: ValueId,
}

pub fn fixture_aliasing_callers() -> AliasingCallers {
    let mut m = Module::new("aliasing_callers");
    let set = m.add_function("set", 2);
    let one = m.add_function("one", 0);
    let two = m.add_function("two", 0);
    let main = m.add_function("main", 0);

    let p = m.param(set, 0);
    let q = m.param(set, 1);
    let s = m.alloca(set, "s");
    let t = m.alloca(set, "t");
    m.store(set, s, p);
    m.store(set, t, q);
    m.ret(set, None);

    let x = m.alloca(one, "x");
    m.call(one, set, vec![x, x]);
    m.ret(one, None);

    let y = m.alloca(two, "y");
    let z = m.alloca(two, "z");
    m.call(two, set, vec![y, z]);
    m.ret(two, None);

    m.call(main, one, vec![]);
    m.call(main, two, vec![]);
    m.ret(main, None);

    AliasingCallers {
        module: m,
        set,
        one,
        two,
        y,
        z,
    }
}

/// `f0 -> f1 -> ... -> f{n-1}` forwarding one pointer; the last one stores
/// a heap object into it
pub fn fixture_chain(n: usize) -> Module {
    let mut m = Module::new("chain");
    let fs: Vec<FunctionId> = (0..n).map(|i| m.add_function(format!("f{i}"), 1)).collect();
    for w in fs.windows(2) {
        let p = m.param(w[0], 0);
        m.call(w[0], w[1], vec![p]);
        m.ret(w[0], None);
    }
    if let Some(&last) = fs.last() {
        let p = m.param(last, 0);
        let h = m.heap_alloc(last, "h");
        m.store(last, h, p);
        m.ret(last, None);
    }

    let main = m.add_function("main", 0);
    let a = m.alloca(main, "a");
    let b = m.alloca(main, "b");
    if let Some(&first) = fs.first() {
        m.call(main, first, vec![a]);
        m.call(main, first, vec![b]);
    }
    m.ret(main, None);
    m
}

/// `f2(p, q)` returns `q`, stores `q` at `q+8` and a heap object into `p`;
/// `f1(a, b)` stores `b+16` into `b`, then calls `r = f2(b)` and
/// `f2(r, b+16)`. Each round of propagation between the two call sites
/// shifts the self-referencing node by another 16 bytes.
pub fn fixture_shifting_cycle() -> Module {
    let mut m = Module::new("shifting_cycle");
    let f2 = m.add_function("f2", 2);
    let p = m.param(f2, 0);
    let q = m.param(f2, 1);
    m.ret(f2, Some(q));
    let q8 = m.gep(f2, q, 8);
    m.store(f2, q, q8);
    let h = m.heap_alloc(f2, "h");
    m.store(f2, h, p);

    let f1 = m.add_function("f1", 2);
    let b = m.param(f1, 1);
    let c = m.gep(f1, b, 16);
    m.store(f1, c, b);
    let r = m.call(f1, f2, vec![b]);
    m.call(f1, f2, vec![r, c]);
    m.ret(f1, None);
    m
}
