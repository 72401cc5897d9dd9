//! Lowering of the program tree into an LLVM module.
//!
//! The context owns exactly one output module and a stack of scope frames.
//! A frame is pushed around every generated function body and released when
//! that body is finished, so the stack is never empty while a lowering call
//! is in progress. The module moves through a strictly ordered lifecycle:
//! `Empty -> BuiltinsRegistered -> EntryGenerating -> Finalized`, and any
//! operation invoked in the wrong phase is rejected with
//! [`CodegenError::Phase`](crate::CodegenError::Phase).

use std::path::Path;

use hashbrown::HashMap;
use inkwell::{
    OptimizationLevel,
    basic_block::BasicBlock,
    builder::Builder,
    context::Context,
    module::Module,
    targets::{InitializationConfig, Target},
    values::{BasicValueEnum, FunctionValue, GenericValue, PointerValue},
};

use crate::{CodegenError, ast, intern::Symbol, ty::Ty};

pub mod builtins;
pub mod expr;
pub mod pretty_print;

/// Symbol name of the synthesized program entry function
pub const ENTRY_FUNCTION_NAME: &str = "main";

/// Where the output module is in its lifecycle. Phases only ever move
/// forward, one step at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum ModulePhase {
    Empty,
    BuiltinsRegistered,
    EntryGenerating,
    Finalized,
}

/// One lexical emission context: the insertion point for generated
/// instructions, the most recent statement value, and the variables bound so
/// far.
struct ScopeFrame<'ctx> {
    /// Instruction insertion target for code generated within this frame
    block: BasicBlock<'ctx>,
    /// Value produced by the most recently lowered statement, if any
    result: Option<BasicValueEnum<'ctx>>,
    /// Variable name -> stack slot. Append-only: once a name is bound it
    /// keeps the same slot for the frame's lifetime.
    locals: HashMap<Symbol, StorageSlot<'ctx>>,
}

/// Stack storage backing a variable binding
#[derive(Clone, Copy)]
pub(crate) struct StorageSlot<'ctx> {
    pub ptr: PointerValue<'ctx>,
    pub ty: Ty,
}

/// Controls what [`CodegenContext::finalize`] emits besides the in-memory
/// module.
#[derive(Debug, Default, Clone, Copy)]
pub struct FinalizeOptions<'a> {
    /// Write the module out as LLVM bitcode at this path
    pub bitcode_path: Option<&'a Path>,
    /// Print a human readable listing of the module to stdout
    pub dump_module: bool,
}

pub struct CodegenContext<'ctx> {
    context: &'ctx Context,
    module: Module<'ctx>,
    builder: Builder<'ctx>,
    frames: Vec<ScopeFrame<'ctx>>,
    entry_function: Option<FunctionValue<'ctx>>,
    phase: ModulePhase,
}

impl<'ctx> CodegenContext<'ctx> {
    pub fn new(context: &'ctx Context, module_name: &str) -> Self {
        Self {
            context,
            module: context.create_module(module_name),
            builder: context.create_builder(),
            frames: Vec::new(),
            entry_function: None,
            phase: ModulePhase::Empty,
        }
    }

    pub fn module(&self) -> &Module<'ctx> {
        &self.module
    }

    pub fn phase(&self) -> ModulePhase {
        self.phase
    }

    fn expect_phase(&self, expected: ModulePhase) -> Result<(), CodegenError> {
        if self.phase == expected {
            Ok(())
        } else {
            Err(CodegenError::Phase {
                expected,
                actual: self.phase,
            })
        }
    }

    /* Scope stack */

    fn push_frame(&mut self, block: BasicBlock<'ctx>) {
        self.builder.position_at_end(block);
        self.frames.push(ScopeFrame {
            block,
            result: None,
            locals: HashMap::new(),
        });
    }

    fn pop_frame(&mut self) {
        self.frames
            .pop()
            .expect("Popped a scope frame without a matching push");

        if let Some(frame) = self.frames.last() {
            self.builder.position_at_end(frame.block);
        }
    }

    fn frame(&self) -> &ScopeFrame<'ctx> {
        self.frames
            .last()
            .expect("The scope stack should never be empty while lowering is in progress")
    }

    fn frame_mut(&mut self) -> &mut ScopeFrame<'ctx> {
        self.frames
            .last_mut()
            .expect("The scope stack should never be empty while lowering is in progress")
    }

    fn lookup_local(&self, name: Symbol) -> Option<StorageSlot<'ctx>> {
        self.frame().locals.get(&name).copied()
    }

    fn bind_local(&mut self, name: Symbol, slot: StorageSlot<'ctx>) {
        self.frame_mut().locals.insert(name, slot);
    }

    fn set_result(&mut self, value: Option<BasicValueEnum<'ctx>>) {
        self.frame_mut().result = value;
    }

    fn result(&self) -> Option<BasicValueEnum<'ctx>> {
        self.frame().result
    }

    /* Entry point assembly */

    /// Wraps the top level statements in a synthesized entry function and
    /// lowers them into it.
    ///
    /// On failure the partially generated entry function is left without a
    /// terminator, which guarantees the module can never pass
    /// [`finalize`](Self::finalize).
    pub fn generate(&mut self, program: &ast::Block) -> Result<(), CodegenError> {
        self.expect_phase(ModulePhase::BuiltinsRegistered)?;
        self.phase = ModulePhase::EntryGenerating;

        let fn_type = self.context.void_type().fn_type(&[], false);
        let function = self.module.add_function(ENTRY_FUNCTION_NAME, fn_type, None);
        let entry = self.context.append_basic_block(function, "entry");

        self.push_frame(entry);
        let lowered = self.gen_entry_body(program);
        // The frame is released on the error path too; push/pop stay
        // balanced no matter how lowering exits
        self.pop_frame();

        lowered?;
        self.entry_function = Some(function);

        Ok(())
    }

    fn gen_entry_body(&mut self, program: &ast::Block) -> Result<(), CodegenError> {
        self.gen_block(program)?;
        self.builder.build_return(None)?;

        Ok(())
    }

    /// Checks the finished module and writes it out as requested.
    ///
    /// Verification runs before anything is emitted, so a module left broken
    /// by a failed [`generate`](Self::generate) is rejected here instead of
    /// being persisted. Finalizing a second time is rejected.
    pub fn finalize(&mut self, options: FinalizeOptions<'_>) -> Result<(), CodegenError> {
        self.expect_phase(ModulePhase::EntryGenerating)?;

        self.module
            .verify()
            .map_err(|message| CodegenError::Verify(message.to_string()))?;

        if options.dump_module {
            pretty_print::print_module(&self.module);
        }

        if let Some(path) = options.bitcode_path {
            if !self.module.write_bitcode_to_path(path) {
                return Err(CodegenError::Bitcode {
                    path: path.to_path_buf(),
                });
            }
        }

        self.phase = ModulePhase::Finalized;

        Ok(())
    }

    /// Runs the entry function in process through an LLVM JIT and returns
    /// whatever it produced.
    ///
    /// LLVM permits one execution engine per module, so this is a single
    /// shot operation; a second call reports [`CodegenError::Engine`].
    pub fn run(&self) -> Result<GenericValue<'ctx>, CodegenError> {
        self.expect_phase(ModulePhase::Finalized)?;

        let function = self
            .entry_function
            .expect("A finalized module always has an entry function");

        Target::initialize_native(&InitializationConfig::default())
            .map_err(CodegenError::Engine)?;

        let engine = self
            .module
            .create_jit_execution_engine(OptimizationLevel::None)
            .map_err(|message| CodegenError::Engine(message.to_string()))?;

        Ok(unsafe { engine.run_function(function, &[]) })
    }
}
