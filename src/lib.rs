//! Code generation core for the Rill language.
//!
//! Lowers a parsed program tree into an LLVM module, which can then be
//! written out as bitcode for an external native compiler to consume, dumped
//! in textual form for inspection, or run directly in process through a JIT.
//! Scanning and parsing live in front of this crate, and object emission and
//! linking live behind it; neither is handled here.

use std::path::PathBuf;

use thiserror::Error;

use crate::{
    ast::{BinaryOperatorKind, NodeId},
    intern::Symbol,
    ty::Ty,
};

pub mod ast;
pub mod codegen;
pub mod intern;
pub mod ty;

pub use crate::codegen::{CodegenContext, FinalizeOptions, ModulePhase};

#[derive(Error, Debug)]
pub enum CodegenError {
    /// Reading a variable that was never assigned in the active scope.
    /// Fatal: lowering stops at the first occurrence.
    #[error("undeclared variable `{name}`")]
    UndeclaredVariable { name: Symbol, node: NodeId },

    /// Calling a function that is not registered in the module's function
    /// table
    #[error("no such function `{name}`")]
    UnknownFunction { name: Symbol, node: NodeId },

    #[error("`{name}` takes {expected} argument(s) but {found} were supplied")]
    ArityMismatch {
        name: Symbol,
        expected: usize,
        found: usize,
        node: NodeId,
    },

    /// Arithmetic between an integer and a double operand. No implicit
    /// promotion is performed.
    #[error("mismatched operand types for `{operator}` (`{lhs}` vs `{rhs}`)")]
    MixedOperands {
        operator: BinaryOperatorKind,
        lhs: Ty,
        rhs: Ty,
        node: NodeId,
    },

    /// A void expression (a print call) used where a value is required
    #[error("expression produces no value")]
    VoidOperand { node: NodeId },

    /// An operation was invoked out of order in the module lifecycle, e.g.
    /// lowering before the builtins are registered, or finalizing twice
    #[error("module is in phase `{actual}`, expected `{expected}`")]
    Phase {
        expected: ModulePhase,
        actual: ModulePhase,
    },

    #[error("module failed verification: {0}")]
    Verify(String),

    #[error("failed to write bitcode to `{}`", .path.display())]
    Bitcode { path: PathBuf },

    #[error("failed to set up the execution engine: {0}")]
    Engine(String),

    #[error(transparent)]
    Builder(#[from] inkwell::builder::BuilderError),
}

impl CodegenError {
    /// The tree node the diagnostic refers to, when there is one
    pub fn node(&self) -> Option<NodeId> {
        match self {
            Self::UndeclaredVariable { node, .. }
            | Self::UnknownFunction { node, .. }
            | Self::ArityMismatch { node, .. }
            | Self::MixedOperands { node, .. }
            | Self::VoidOperand { node } => Some(*node),
            Self::Phase { .. } | Self::Verify(_) | Self::Bitcode { .. } | Self::Engine(_)
            | Self::Builder(_) => None,
        }
    }
}

/// One shot pipeline: registers the builtins, lowers the program into a
/// fresh module, and finalizes it. The returned context can still be
/// inspected or [run](CodegenContext::run).
pub fn compile_program<'ctx>(
    context: &'ctx inkwell::context::Context,
    module_name: &str,
    program: &ast::Block,
    options: FinalizeOptions<'_>,
) -> Result<CodegenContext<'ctx>, CodegenError> {
    let mut codegen = CodegenContext::new(context, module_name);

    codegen.declare_builtins()?;
    codegen.generate(program)?;
    codegen.finalize(options)?;

    Ok(codegen)
}
