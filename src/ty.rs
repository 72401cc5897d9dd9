use inkwell::{context::Context, types::BasicTypeEnum, values::BasicValueEnum};

/// Primitive value types the code generator knows how to lower
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum Ty {
    /// 64 bit signed integer
    Int,
    /// 64 bit IEEE-754 float
    Double,
}

impl Ty {
    /// Storage type given to a variable on its declaring assignment. The
    /// right hand side is never consulted for this decision.
    pub const DEFAULT: Self = Self::Int;

    pub fn llvm_type<'ctx>(self, context: &'ctx Context) -> BasicTypeEnum<'ctx> {
        match self {
            Self::Int => context.i64_type().into(),
            Self::Double => context.f64_type().into(),
        }
    }

    /// The primitive type of an emitted value, if it has one
    pub fn of_value(value: &BasicValueEnum) -> Option<Self> {
        match value {
            BasicValueEnum::IntValue(_) => Some(Self::Int),
            BasicValueEnum::FloatValue(_) => Some(Self::Double),
            _ => None,
        }
    }
}
