//! Shared models

mod ids;
mod instruction;
mod module;

pub use ids::{FunctionId, ValueClass, ValueId};
pub use instruction::{Callee, Instruction, Op};
pub use module::{Argument, Function, Global, Module};
