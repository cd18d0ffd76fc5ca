//! Program location identifiers
//!
//! Ids are plain indices handed out by [`Module`](super::Module). A
//! [`ValueId`] carries its location class so that a graph can separate
//! global locations from locals without consulting the module.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Index of a function in its module
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FunctionId(pub u32);

impl FunctionId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for FunctionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "fn#{}", self.0)
    }
}

/// Class of a program location
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ValueClass {
    /// Global variable (shared-name memory)
    Global,
    /// Formal parameter
    Argument,
    /// Instruction result, including call instructions
    Instruction,
}

/// A program location: global, formal parameter or instruction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ValueId {
    class: ValueClass,
    index: u32,
}

impl ValueId {
    #[inline]
    pub fn new(class: ValueClass, index: u32) -> Self {
        Self { class, index }
    }

    #[inline]
    pub fn class(self) -> ValueClass {
        self.class
    }

    #[inline]
    pub fn index(self) -> usize {
        self.index as usize
    }

    #[inline]
    pub fn is_global(self) -> bool {
        self.class == ValueClass::Global
    }

    #[inline]
    pub fn is_argument(self) -> bool {
        self.class == ValueClass::Argument
    }

    #[inline]
    pub fn is_instruction(self) -> bool {
        self.class == ValueClass::Instruction
    }
}

impl fmt::Display for ValueId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.class {
            ValueClass::Global => write!(f, "global#{}", self.index),
            ValueClass::Argument => write!(f, "arg#{}", self.index),
            ValueClass::Instruction => write!(f, "inst#{}", self.index),
        }
    }
}
