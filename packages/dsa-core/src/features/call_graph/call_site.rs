//! Call-site view used by the global analyses

use crate::errors::{DsaError, DsaResult};
use crate::shared::models::{Callee, FunctionId, Module, Op, ValueId};

/// A call instruction together with its caller, callee and argument lists
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DsaCallSite {
    caller: FunctionId,
    instruction: ValueId,
    callee: Option<FunctionId>,
    callee_defined: bool,
    inline_asm: bool,
    actuals: Vec<ValueId>,
    formals: Vec<ValueId>,
}

impl DsaCallSite {
    /// View of the call instruction `instruction`
    ///
    /// Fails with `UnknownValue` if `instruction` is not a call of `module`.
    pub fn new(module: &Module, instruction: ValueId) -> DsaResult<Self> {
        let inst = module.try_instruction(instruction)?;
        let (callee, actuals) = match &inst.op {
            Op::Call { callee, args } => (callee, args.clone()),
            _ => return Err(DsaError::UnknownValue(instruction)),
        };

        let (callee, inline_asm) = match callee {
            Callee::Direct(f) => (Some(*f), false),
            Callee::Indirect(_) => (None, false),
            Callee::InlineAsm => (None, true),
        };
        let (callee_defined, formals) = match callee {
            Some(f) => {
                let function = module.try_function(f)?;
                (function.has_body(), function.params.clone())
            }
            None => (false, Vec::new()),
        };

        Ok(Self {
            caller: inst.function,
            instruction,
            callee,
            callee_defined,
            inline_asm,
            actuals,
            formals,
        })
    }

    pub fn caller(&self) -> FunctionId {
        self.caller
    }

    pub fn instruction(&self) -> ValueId {
        self.instruction
    }

    /// Statically known callee
    pub fn callee(&self) -> Option<FunctionId> {
        self.callee
    }

    pub fn is_inline_asm(&self) -> bool {
        self.inline_asm
    }

    pub fn is_indirect(&self) -> bool {
        self.callee.is_none() && !self.inline_asm
    }

    /// Direct call to a function with a body: the only call sites the
    /// global analyses resolve
    pub fn is_resolvable(&self) -> bool {
        !self.inline_asm && self.callee.is_some() && self.callee_defined
    }

    pub fn actuals(&self) -> &[ValueId] {
        &self.actuals
    }

    pub fn formals(&self) -> &[ValueId] {
        &self.formals
    }

    /// `(actual, formal)` pairs, truncated to the shorter list
    pub fn arg_pairs(&self) -> impl Iterator<Item = (ValueId, ValueId)> + '_ {
        self.actuals.iter().copied().zip(self.formals.iter().copied())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direct_call_site() {
        let mut m = Module::new("m");
        let f = m.add_function("f", 0);
        let g = m.add_function("g", 2);
        m.ret(g, None);
        let a = m.alloca(f, "a");
        let b = m.alloca(f, "b");
        let extra = m.alloca(f, "extra");
        let c = m.call(f, g, vec![a, b, extra]);

        let cs = DsaCallSite::new(&m, c).unwrap();
        assert_eq!(cs.caller(), f);
        assert_eq!(cs.callee(), Some(g));
        assert!(cs.is_resolvable());

        let pairs: Vec<_> = cs.arg_pairs().collect();
        assert_eq!(pairs, vec![(a, m.param(g, 0)), (b, m.param(g, 1))]);
    }

    #[test]
    fn test_unresolvable_call_sites() {
        let mut m = Module::new("m");
        let f = m.add_function("f", 1);
        let decl = m.add_function("malloc_like", 0);
        let fp = m.param(f, 0);
        let to_decl = m.call(f, decl, vec![]);
        let indirect = m.call_indirect(f, fp, vec![]);
        let asm = m.inline_asm(f, vec![]);

        let to_decl = DsaCallSite::new(&m, to_decl).unwrap();
        assert!(!to_decl.is_resolvable());
        assert_eq!(to_decl.callee(), Some(decl));

        let indirect = DsaCallSite::new(&m, indirect).unwrap();
        assert!(indirect.is_indirect());
        assert!(!indirect.is_resolvable());

        let asm = DsaCallSite::new(&m, asm).unwrap();
        assert!(asm.is_inline_asm());
        assert!(!asm.is_indirect());
    }

    #[test]
    fn test_non_call_rejected() {
        let mut m = Module::new("m");
        let f = m.add_function("f", 0);
        let x = m.alloca(f, "x");
        assert!(matches!(
            DsaCallSite::new(&m, x),
            Err(DsaError::UnknownValue(v)) if v == x
        ));
    }
}
