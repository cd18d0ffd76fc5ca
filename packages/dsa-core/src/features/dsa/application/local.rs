//! Local (intraprocedural) graph construction
//!
//! Flow-insensitive: every instruction of the function contributes its
//! unification constraints, in program order, to one graph. Calls are not
//! resolved here; they only get cells for the call result and arguments.

use crate::errors::DsaResult;
use crate::features::dsa::domain::Graph;
use crate::features::dsa::ports::LocalGraphBuilder;
use crate::shared::models::{Callee, FunctionId, Instruction, Module, Op};

/// Unification-based local analysis
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalAnalysis;

impl LocalAnalysis {
    pub fn new() -> Self {
        Self
    }

    fn visit(&self, f: FunctionId, inst: &Instruction, g: &mut Graph) {
        match &inst.op {
            Op::Alloca | Op::HeapAlloc => {
                let cell = g.mk_cell(inst.id);
                let node = g.node_mut(cell.node());
                if inst.op == Op::Alloca {
                    node.flags_mut().alloca = true;
                } else {
                    node.flags_mut().heap = true;
                }
                node.add_alloc_site(inst.id);
            }
            Op::Copy { src } => {
                let dst = g.mk_cell(inst.id);
                let src = g.mk_cell(*src);
                g.unify(dst, src);
            }
            Op::Gep { base, offset } => {
                let dst = g.mk_cell(inst.id);
                let base = g.mk_cell(*base);
                g.unify(dst, base.shifted(*offset));
            }
            Op::Load { ptr } => {
                let ptr = g.mk_cell(*ptr);
                g.node_mut(ptr.node()).flags_mut().read = true;
                let target = g.link_or_create(ptr);
                let dst = g.mk_cell(inst.id);
                g.unify(dst, target);
            }
            Op::Store { value, ptr } => {
                let ptr = g.mk_cell(*ptr);
                g.node_mut(ptr.node()).flags_mut().modified = true;
                let value = g.mk_cell(*value);
                g.add_link(ptr, value);
            }
            Op::MemCopy { dst, src } => {
                let dst = g.mk_cell(*dst);
                let src = g.mk_cell(*src);
                g.node_mut(dst.node()).flags_mut().modified = true;
                g.node_mut(src.node()).flags_mut().read = true;
                g.unify(dst, src);
            }
            Op::MemSet { dst } => {
                let dst = g.mk_cell(*dst);
                g.node_mut(dst.node()).flags_mut().modified = true;
            }
            Op::Phi { incoming } => {
                let dst = g.mk_cell(inst.id);
                for v in incoming {
                    let src = g.mk_cell(*v);
                    g.unify(dst, src);
                }
            }
            Op::Call { callee, args } => {
                g.mk_cell(inst.id);
                for arg in args {
                    g.mk_cell(*arg);
                }
                if let Callee::Indirect(target) = callee {
                    g.mk_cell(*target);
                }
            }
            Op::Return { value } => {
                if let Some(v) = value {
                    let ret = g.mk_ret_cell(f);
                    let cell = g.mk_cell(*v);
                    g.unify(ret, cell);
                }
            }
        }
    }
}

impl LocalGraphBuilder for LocalAnalysis {
    fn build_into(&self, module: &Module, f: FunctionId, graph: &mut Graph) -> DsaResult<()> {
        let function = module.try_function(f)?;
        for &param in &function.params {
            graph.mk_cell(param);
        }
        for inst in module.body(f) {
            self.visit(f, inst, graph);
        }
        tracing::trace!(function = %function.name, nodes = graph.num_nodes(), "local graph");
        Ok(())
    }
}
