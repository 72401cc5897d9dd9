//! Runtime support functions synthesized into every module.
//!
//! The platform's formatted output primitive (`printf`) is declared as an
//! external foreign function, and a `print` wrapper is built around it so the
//! language's print statement resolves with a plain name lookup against the
//! module's function table.

use inkwell::{AddressSpace, module::Linkage, values::FunctionValue};

use crate::{
    CodegenError,
    codegen::{CodegenContext, ModulePhase},
    ty::Ty,
};

/// Name the print wrapper is registered under
pub const PRINT_FUNCTION_NAME: &str = "print";

const PRINTF_SYMBOL: &str = "printf";

/// Format applied to every printed value
const INT_FORMAT: &str = "%d\n";

impl<'ctx> CodegenContext<'ctx> {
    /// Registers the runtime support functions. Happens exactly once, before
    /// any of the program tree is visited.
    pub fn declare_builtins(&mut self) -> Result<(), CodegenError> {
        self.expect_phase(ModulePhase::Empty)?;

        let printf = self.declare_printf();
        self.synthesize_print(printf)?;

        self.phase = ModulePhase::BuiltinsRegistered;

        Ok(())
    }

    /// `i32 (ptr, ...)`, resolved against the platform C library at link (or
    /// JIT) time
    fn declare_printf(&self) -> FunctionValue<'ctx> {
        let ptr_type = self.context.ptr_type(AddressSpace::default());
        let fn_type = self.context.i32_type().fn_type(&[ptr_type.into()], true);

        self.module
            .add_function(PRINTF_SYMBOL, fn_type, Some(Linkage::External))
    }

    /// Builds the `print` wrapper: one formatted write of its single integer
    /// argument, through a private read-only copy of the format string.
    fn synthesize_print(&mut self, printf: FunctionValue<'ctx>) -> Result<(), CodegenError> {
        let param_type = Ty::DEFAULT.llvm_type(self.context);
        let fn_type = self.context.void_type().fn_type(&[param_type.into()], false);
        let function =
            self.module
                .add_function(PRINT_FUNCTION_NAME, fn_type, Some(Linkage::Internal));
        let entry = self.context.append_basic_block(function, "entry");

        self.push_frame(entry);
        let emitted = self.emit_print_body(function, printf);
        self.pop_frame();

        emitted
    }

    fn emit_print_body(
        &mut self,
        function: FunctionValue<'ctx>,
        printf: FunctionValue<'ctx>,
    ) -> Result<(), CodegenError> {
        let format = self
            .builder
            .build_global_string_ptr(INT_FORMAT, ".fmt.int")?;

        let argument = function
            .get_first_param()
            .expect("The print wrapper should have exactly one parameter");
        argument.into_int_value().set_name("value");

        self.builder.build_call(
            printf,
            &[format.as_pointer_value().into(), argument.into()],
            "",
        )?;
        self.builder.build_return(None)?;

        Ok(())
    }
}
