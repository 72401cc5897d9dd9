//! Per node kind lowering rules.
//!
//! One deterministic emission rule per tree node kind. Rules that produce a
//! value return it; pure statements return `None`. Operand and argument
//! evaluation order is strictly left to right and is observable by the
//! program, so the recursion order here is part of the contract.

use inkwell::values::{BasicMetadataValueEnum, BasicValueEnum};

use crate::{
    CodegenError,
    ast::{BinaryOperatorKind, Block, Identifier, Node, NodeKind},
    codegen::{CodegenContext, StorageSlot},
    ty::Ty,
};

impl<'ctx> CodegenContext<'ctx> {
    pub(crate) fn gen_node(
        &mut self,
        node: &Node,
    ) -> Result<Option<BasicValueEnum<'ctx>>, CodegenError> {
        match &node.kind {
            NodeKind::IntegerLiteral(value) => Ok(Some(
                self.context.i64_type().const_int(*value as u64, true).into(),
            )),
            NodeKind::DoubleLiteral(value) => {
                Ok(Some(self.context.f64_type().const_float(*value).into()))
            }
            NodeKind::Identifier(identifier) => self.gen_identifier(identifier).map(Some),
            NodeKind::Binary { operator, lhs, rhs } => {
                self.gen_binary(node, *operator, lhs, rhs).map(Some)
            }
            NodeKind::Assignment { target, value } => {
                self.gen_assignment(target, value).map(Some)
            }
            NodeKind::PrintCall { callee, arguments } => self.gen_call(node, callee, arguments),
            NodeKind::Block(block) => self.gen_block(block),
        }
    }

    /// Lowers a node in value position
    fn gen_value(&mut self, node: &Node) -> Result<BasicValueEnum<'ctx>, CodegenError> {
        self.gen_node(node)?
            .ok_or(CodegenError::VoidOperand { node: node.id })
    }

    /// A variable read: a load from the name's storage slot
    fn gen_identifier(
        &mut self,
        identifier: &Identifier,
    ) -> Result<BasicValueEnum<'ctx>, CodegenError> {
        let Some(slot) = self.lookup_local(identifier.symbol) else {
            return Err(CodegenError::UndeclaredVariable {
                name: identifier.symbol,
                node: identifier.id,
            });
        };

        let value = self.builder.build_load(
            slot.ty.llvm_type(self.context),
            slot.ptr,
            identifier.symbol.value(),
        )?;

        Ok(value)
    }

    fn gen_binary(
        &mut self,
        node: &Node,
        operator: BinaryOperatorKind,
        lhs: &Node,
        rhs: &Node,
    ) -> Result<BasicValueEnum<'ctx>, CodegenError> {
        let lhs_value = self.gen_value(lhs)?;
        let rhs_value = self.gen_value(rhs)?;
        let name = operator.to_string();

        let value: BasicValueEnum<'ctx> = match (lhs_value, rhs_value) {
            (BasicValueEnum::IntValue(lhs), BasicValueEnum::IntValue(rhs)) => match operator {
                BinaryOperatorKind::Add => self.builder.build_int_add(lhs, rhs, &name)?.into(),
                BinaryOperatorKind::Subtract => {
                    self.builder.build_int_sub(lhs, rhs, &name)?.into()
                }
                BinaryOperatorKind::Multiply => {
                    self.builder.build_int_mul(lhs, rhs, &name)?.into()
                }
                BinaryOperatorKind::Divide => {
                    self.builder.build_int_signed_div(lhs, rhs, &name)?.into()
                }
            },
            (BasicValueEnum::FloatValue(lhs), BasicValueEnum::FloatValue(rhs)) => match operator {
                BinaryOperatorKind::Add => self.builder.build_float_add(lhs, rhs, &name)?.into(),
                BinaryOperatorKind::Subtract => {
                    self.builder.build_float_sub(lhs, rhs, &name)?.into()
                }
                BinaryOperatorKind::Multiply => {
                    self.builder.build_float_mul(lhs, rhs, &name)?.into()
                }
                BinaryOperatorKind::Divide => {
                    self.builder.build_float_div(lhs, rhs, &name)?.into()
                }
            },
            (lhs_value, rhs_value) => {
                let (Some(lhs), Some(rhs)) =
                    (Ty::of_value(&lhs_value), Ty::of_value(&rhs_value))
                else {
                    unreachable!("Arithmetic operands are always int or double");
                };

                return Err(CodegenError::MixedOperands {
                    operator,
                    lhs,
                    rhs,
                    node: node.id,
                });
            }
        };

        Ok(value)
    }

    /// The first assignment to a name doubles as its declaration: storage of
    /// the default type is allocated and the name is bound to it before the
    /// right hand side is lowered. Re-assignment reuses the original slot.
    fn gen_assignment(
        &mut self,
        target: &Identifier,
        value: &Node,
    ) -> Result<BasicValueEnum<'ctx>, CodegenError> {
        let slot = match self.lookup_local(target.symbol) {
            Some(slot) => slot,
            None => {
                let ty = Ty::DEFAULT;
                let ptr = self
                    .builder
                    .build_alloca(ty.llvm_type(self.context), target.symbol.value())?;
                let slot = StorageSlot { ptr, ty };

                self.bind_local(target.symbol, slot);

                slot
            }
        };

        let stored = self.gen_value(value)?;
        self.builder.build_store(slot.ptr, stored)?;

        Ok(stored)
    }

    /// Resolves the callee against the module's function table, lowers the
    /// arguments left to right, and emits the call.
    fn gen_call(
        &mut self,
        node: &Node,
        callee: &Identifier,
        arguments: &[Node],
    ) -> Result<Option<BasicValueEnum<'ctx>>, CodegenError> {
        let Some(function) = self.module.get_function(callee.symbol.value()) else {
            return Err(CodegenError::UnknownFunction {
                name: callee.symbol,
                node: callee.id,
            });
        };

        let mut args: Vec<BasicMetadataValueEnum<'ctx>> = Vec::with_capacity(arguments.len());
        for argument in arguments {
            args.push(self.gen_value(argument)?.into());
        }

        let expected = function.count_params() as usize;
        if args.len() != expected {
            return Err(CodegenError::ArityMismatch {
                name: callee.symbol,
                expected,
                found: args.len(),
                node: node.id,
            });
        }

        let call = self.builder.build_call(function, &args, "")?;

        Ok(call.try_as_basic_value().left())
    }

    /// Statements run in order; the block's value is its last statement's.
    /// An empty block produces nothing.
    pub(crate) fn gen_block(
        &mut self,
        block: &Block,
    ) -> Result<Option<BasicValueEnum<'ctx>>, CodegenError> {
        self.set_result(None);

        for statement in &block.statements {
            let value = self.gen_node(statement)?;
            self.set_result(value);
        }

        Ok(self.result())
    }
}
