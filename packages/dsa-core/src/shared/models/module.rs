//! Program model: a module of globals and functions
//!
//! Stands in for the host compiler IR. The analyses only read it; all
//! mutation goes through the builder methods below.
//!
//! # Example
//! ```
//! use dsa_core::shared::models::Module;
//!
//! let mut m = Module::new("demo");
//! let g = m.add_global("G");
//! let f = m.add_function("f", 1);
//! let p = m.param(f, 0);
//! m.store(f, p, g);
//! m.ret(f, None);
//! assert!(m.function(f).has_body());
//! ```

use super::ids::{FunctionId, ValueClass, ValueId};
use super::instruction::{Callee, Instruction, Op};
use crate::errors::{DsaError, DsaResult};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

/// A global variable
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Global {
    pub id: ValueId,
    pub name: String,
}

/// A formal parameter
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Argument {
    pub id: ValueId,
    pub function: FunctionId,
    pub position: usize,
}

/// A function; without instructions it is a declaration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Function {
    pub id: FunctionId,
    pub name: String,
    pub params: Vec<ValueId>,
    pub body: Vec<ValueId>,
}

impl Function {
    /// Declarations and empty bodies are never analyzed
    #[inline]
    pub fn has_body(&self) -> bool {
        !self.body.is_empty()
    }
}

/// A whole program
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Module {
    name: String,
    globals: Vec<Global>,
    arguments: Vec<Argument>,
    instructions: Vec<Instruction>,
    functions: Vec<Function>,
    #[serde(skip)]
    by_name: FxHashMap<String, FunctionId>,
}

impl Module {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Builder API
    // ═══════════════════════════════════════════════════════════════════════

    pub fn add_global(&mut self, name: impl Into<String>) -> ValueId {
        let id = ValueId::new(ValueClass::Global, self.globals.len() as u32);
        self.globals.push(Global {
            id,
            name: name.into(),
        });
        id
    }

    /// Add a function with `arity` formals; it stays a declaration until an
    /// instruction is pushed into it
    pub fn add_function(&mut self, name: impl Into<String>, arity: usize) -> FunctionId {
        let id = FunctionId(self.functions.len() as u32);
        let params = (0..arity)
            .map(|position| {
                let arg = ValueId::new(ValueClass::Argument, self.arguments.len() as u32);
                self.arguments.push(Argument {
                    id: arg,
                    function: id,
                    position,
                });
                arg
            })
            .collect();
        let name = name.into();
        self.by_name.insert(name.clone(), id);
        self.functions.push(Function {
            id,
            name,
            params,
            body: Vec::new(),
        });
        id
    }

    /// Append an instruction to `f`
    pub fn push(&mut self, f: FunctionId, op: Op) -> ValueId {
        self.push_inst(f, None, op)
    }

    /// Append a named instruction to `f`
    pub fn push_named(&mut self, f: FunctionId, name: impl Into<String>, op: Op) -> ValueId {
        self.push_inst(f, Some(name.into()), op)
    }

    fn push_inst(&mut self, f: FunctionId, name: Option<String>, op: Op) -> ValueId {
        let id = ValueId::new(ValueClass::Instruction, self.instructions.len() as u32);
        self.instructions.push(Instruction {
            id,
            function: f,
            name,
            op,
        });
        self.functions[f.index()].body.push(id);
        id
    }

    pub fn alloca(&mut self, f: FunctionId, name: impl Into<String>) -> ValueId {
        self.push_named(f, name, Op::Alloca)
    }

    pub fn heap_alloc(&mut self, f: FunctionId, name: impl Into<String>) -> ValueId {
        self.push_named(f, name, Op::HeapAlloc)
    }

    pub fn copy(&mut self, f: FunctionId, src: ValueId) -> ValueId {
        self.push(f, Op::Copy { src })
    }

    pub fn gep(&mut self, f: FunctionId, base: ValueId, offset: u32) -> ValueId {
        self.push(f, Op::Gep { base, offset })
    }

    pub fn load(&mut self, f: FunctionId, ptr: ValueId) -> ValueId {
        self.push(f, Op::Load { ptr })
    }

    /// `*ptr = value`
    pub fn store(&mut self, f: FunctionId, value: ValueId, ptr: ValueId) -> ValueId {
        self.push(f, Op::Store { value, ptr })
    }

    pub fn memcpy(&mut self, f: FunctionId, dst: ValueId, src: ValueId) -> ValueId {
        self.push(f, Op::MemCopy { dst, src })
    }

    pub fn memset(&mut self, f: FunctionId, dst: ValueId) -> ValueId {
        self.push(f, Op::MemSet { dst })
    }

    pub fn phi(&mut self, f: FunctionId, incoming: Vec<ValueId>) -> ValueId {
        self.push(f, Op::Phi { incoming })
    }

    pub fn call(&mut self, f: FunctionId, callee: FunctionId, args: Vec<ValueId>) -> ValueId {
        self.push(
            f,
            Op::Call {
                callee: Callee::Direct(callee),
                args,
            },
        )
    }

    pub fn call_indirect(&mut self, f: FunctionId, target: ValueId, args: Vec<ValueId>) -> ValueId {
        self.push(
            f,
            Op::Call {
                callee: Callee::Indirect(target),
                args,
            },
        )
    }

    pub fn inline_asm(&mut self, f: FunctionId, args: Vec<ValueId>) -> ValueId {
        self.push(
            f,
            Op::Call {
                callee: Callee::InlineAsm,
                args,
            },
        )
    }

    pub fn ret(&mut self, f: FunctionId, value: Option<ValueId>) -> ValueId {
        self.push(f, Op::Return { value })
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Query API
    // ═══════════════════════════════════════════════════════════════════════

    /// Function by id; ids are only minted by this module
    pub fn function(&self, id: FunctionId) -> &Function {
        &self.functions[id.index()]
    }

    pub fn try_function(&self, id: FunctionId) -> DsaResult<&Function> {
        self.functions
            .get(id.index())
            .ok_or(DsaError::UnknownFunction(id))
    }

    pub fn function_by_name(&self, name: &str) -> Option<FunctionId> {
        self.by_name.get(name).copied().or_else(|| {
            self.functions
                .iter()
                .find(|f| f.name == name)
                .map(|f| f.id)
        })
    }

    pub fn functions(&self) -> impl Iterator<Item = &Function> {
        self.functions.iter()
    }

    pub fn num_functions(&self) -> usize {
        self.functions.len()
    }

    pub fn globals(&self) -> impl Iterator<Item = &Global> {
        self.globals.iter()
    }

    /// Formal parameter `position` of `f`
    pub fn param(&self, f: FunctionId, position: usize) -> ValueId {
        self.functions[f.index()].params[position]
    }

    pub fn instruction(&self, id: ValueId) -> Option<&Instruction> {
        if id.is_instruction() {
            self.instructions.get(id.index())
        } else {
            None
        }
    }

    pub fn try_instruction(&self, id: ValueId) -> DsaResult<&Instruction> {
        self.instruction(id).ok_or(DsaError::UnknownValue(id))
    }

    /// Instructions of `f` in program order
    pub fn body(&self, f: FunctionId) -> impl Iterator<Item = &Instruction> {
        self.functions[f.index()]
            .body
            .iter()
            .map(move |id| &self.instructions[id.index()])
    }

    /// Display name of a location: `@G`, `%name`, `f.arg0` or the raw id
    pub fn value_name(&self, id: ValueId) -> String {
        match id.class() {
            ValueClass::Global => self
                .globals
                .get(id.index())
                .map(|g| format!("@{}", g.name))
                .unwrap_or_else(|| id.to_string()),
            ValueClass::Argument => self
                .arguments
                .get(id.index())
                .map(|a| format!("{}.arg{}", self.functions[a.function.index()].name, a.position))
                .unwrap_or_else(|| id.to_string()),
            ValueClass::Instruction => match self.instructions.get(id.index()) {
                Some(Instruction {
                    name: Some(name), ..
                }) => format!("%{}", name),
                _ => id.to_string(),
            },
        }
    }

    /// Whether `id` has a user-given name
    pub fn has_name(&self, id: ValueId) -> bool {
        match id.class() {
            ValueClass::Global => true,
            ValueClass::Argument => false,
            ValueClass::Instruction => self
                .instructions
                .get(id.index())
                .map_or(false, |i| i.name.is_some()),
        }
    }
}
