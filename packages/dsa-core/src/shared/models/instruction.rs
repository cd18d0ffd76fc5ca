//! Instruction set of the program model
//!
//! Only the operations that move pointers are modeled. Every value is
//! treated as pointer-typed.

use super::ids::{FunctionId, ValueId};
use serde::{Deserialize, Serialize};

/// Call target
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Callee {
    /// Statically known function
    Direct(FunctionId),
    /// Call through a function pointer (never resolved)
    Indirect(ValueId),
    /// Inline assembly pseudo-call
    InlineAsm,
}

/// Instruction operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Op {
    /// Stack allocation: result points to a fresh object
    Alloca,
    /// Heap allocation (malloc-like)
    HeapAlloc,
    /// `result = src` (casts, moves)
    Copy { src: ValueId },
    /// `result = &base[offset]` in bytes
    Gep { base: ValueId, offset: u32 },
    /// `result = *ptr`
    Load { ptr: ValueId },
    /// `*ptr = value`
    Store { value: ValueId, ptr: ValueId },
    /// `memcpy(dst, src, _)`
    MemCopy { dst: ValueId, src: ValueId },
    /// `memset(dst, _, _)`
    MemSet { dst: ValueId },
    /// `result = phi/select(incoming...)`
    Phi { incoming: Vec<ValueId> },
    /// `result = callee(args...)`
    Call { callee: Callee, args: Vec<ValueId> },
    /// `return value`
    Return { value: Option<ValueId> },
}

impl Op {
    /// Whether this is a call (including indirect calls and inline asm)
    #[inline]
    pub fn is_call(&self) -> bool {
        matches!(self, Op::Call { .. })
    }

    /// Whether this instruction allocates a fresh object
    #[inline]
    pub fn is_allocation(&self) -> bool {
        matches!(self, Op::Alloca | Op::HeapAlloc)
    }
}

/// An instruction; its id doubles as the id of the value it defines
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Instruction {
    pub id: ValueId,
    pub function: FunctionId,
    pub name: Option<String>,
    pub op: Op,
}

impl Instruction {
    /// Direct callee, if this is a call with a static target
    pub fn called_function(&self) -> Option<FunctionId> {
        match &self.op {
            Op::Call {
                callee: Callee::Direct(f),
                ..
            } => Some(*f),
            _ => None,
        }
    }

    /// Whether this is an inline-asm pseudo-call
    pub fn is_inline_asm(&self) -> bool {
        matches!(
            self.op,
            Op::Call {
                callee: Callee::InlineAsm,
                ..
            }
        )
    }
}
