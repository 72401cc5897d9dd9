use inkwell::context::Context;
use rillc::{
    CodegenContext, CodegenError, FinalizeOptions, ModulePhase,
    ast::{BinaryOperatorKind, Block, Identifier, Node, NodeId, NodeKind},
    compile_program,
    intern::Symbol,
    ty::Ty,
};

// ── Tree construction helpers ────────────────────────────────────────────
// Ids are explicit here so the tests can check which node a diagnostic
// points at.

fn node(id: u32, kind: NodeKind) -> Node {
    Node { id: NodeId(id), kind }
}

fn ident(id: u32, name: &str) -> Identifier {
    Identifier {
        id: NodeId(id),
        symbol: Symbol::new(name),
    }
}

fn block(id: u32, statements: Vec<Node>) -> Block {
    Block {
        id: NodeId(id),
        statements,
    }
}

fn lower_err(program: &Block) -> CodegenError {
    let context = Context::create();

    compile_program(&context, "main", program, FinalizeOptions::default())
        .err()
        .expect("lowering should fail")
}

// ── Semantic error detection ─────────────────────────────────────────────

#[test]
fn reading_an_undeclared_variable_is_fatal() {
    // y = x + 2 with `x` never assigned
    let program = block(
        0,
        vec![node(
            1,
            NodeKind::Assignment {
                target: ident(2, "y"),
                value: Box::new(node(
                    3,
                    NodeKind::Binary {
                        operator: BinaryOperatorKind::Add,
                        lhs: Box::new(node(4, NodeKind::Identifier(ident(5, "x")))),
                        rhs: Box::new(node(6, NodeKind::IntegerLiteral(2))),
                    },
                )),
            },
        )],
    );

    let error = lower_err(&program);

    assert!(
        matches!(
            &error,
            CodegenError::UndeclaredVariable { name, .. } if name.value() == "x"
        ),
        "{error}"
    );
    assert_eq!(error.node(), Some(NodeId(5)));
}

#[test]
fn calling_an_unregistered_function_is_fatal() {
    let program = block(
        0,
        vec![node(
            1,
            NodeKind::PrintCall {
                callee: ident(2, "echo"),
                arguments: vec![node(3, NodeKind::IntegerLiteral(1))],
            },
        )],
    );

    let error = lower_err(&program);

    assert!(
        matches!(
            &error,
            CodegenError::UnknownFunction { name, .. } if name.value() == "echo"
        ),
        "{error}"
    );
    assert_eq!(error.node(), Some(NodeId(2)));
}

#[test]
fn call_argument_count_is_checked() {
    let program = block(
        0,
        vec![node(
            1,
            NodeKind::PrintCall {
                callee: ident(2, "print"),
                arguments: vec![
                    node(3, NodeKind::IntegerLiteral(1)),
                    node(4, NodeKind::IntegerLiteral(2)),
                ],
            },
        )],
    );

    let error = lower_err(&program);

    assert!(
        matches!(
            error,
            CodegenError::ArityMismatch {
                expected: 1,
                found: 2,
                ..
            }
        ),
        "{error}"
    );
    assert_eq!(error.node(), Some(NodeId(1)));
}

#[test]
fn mixed_operand_types_are_rejected() {
    // x = 1; y = x + 2.5
    let program = block(
        0,
        vec![
            node(
                1,
                NodeKind::Assignment {
                    target: ident(2, "x"),
                    value: Box::new(node(3, NodeKind::IntegerLiteral(1))),
                },
            ),
            node(
                4,
                NodeKind::Assignment {
                    target: ident(5, "y"),
                    value: Box::new(node(
                        6,
                        NodeKind::Binary {
                            operator: BinaryOperatorKind::Add,
                            lhs: Box::new(node(7, NodeKind::Identifier(ident(8, "x")))),
                            rhs: Box::new(node(9, NodeKind::DoubleLiteral(2.5))),
                        },
                    )),
                },
            ),
        ],
    );

    let error = lower_err(&program);

    assert!(
        matches!(
            error,
            CodegenError::MixedOperands {
                lhs: Ty::Int,
                rhs: Ty::Double,
                ..
            }
        ),
        "{error}"
    );
    assert_eq!(error.node(), Some(NodeId(6)));
}

#[test]
fn void_expressions_are_rejected_in_value_position() {
    // x = print(5)
    let program = block(
        0,
        vec![node(
            1,
            NodeKind::Assignment {
                target: ident(2, "x"),
                value: Box::new(node(
                    3,
                    NodeKind::PrintCall {
                        callee: ident(4, "print"),
                        arguments: vec![node(5, NodeKind::IntegerLiteral(5))],
                    },
                )),
            },
        )],
    );

    let error = lower_err(&program);

    assert!(matches!(error, CodegenError::VoidOperand { .. }), "{error}");
    assert_eq!(error.node(), Some(NodeId(3)));
}

// ── Lifecycle misuse ─────────────────────────────────────────────────────

#[test]
fn lowering_before_builtins_is_rejected() {
    let context = Context::create();
    let mut codegen = CodegenContext::new(&context, "main");

    let error = codegen.generate(&block(0, vec![])).unwrap_err();

    assert!(
        matches!(
            error,
            CodegenError::Phase {
                expected: ModulePhase::BuiltinsRegistered,
                actual: ModulePhase::Empty,
            }
        ),
        "{error}"
    );
}

#[test]
fn builtins_cannot_be_registered_twice() {
    let context = Context::create();
    let mut codegen = CodegenContext::new(&context, "main");

    codegen.declare_builtins().unwrap();
    let error = codegen.declare_builtins().unwrap_err();

    assert!(
        matches!(
            error,
            CodegenError::Phase {
                expected: ModulePhase::Empty,
                actual: ModulePhase::BuiltinsRegistered,
            }
        ),
        "{error}"
    );
}

#[test]
fn a_failed_lowering_cannot_be_finalized() {
    let context = Context::create();
    let mut codegen = CodegenContext::new(&context, "main");

    codegen.declare_builtins().unwrap();

    // Undeclared read leaves the entry function without a terminator
    let program = block(
        0,
        vec![node(1, NodeKind::Identifier(ident(2, "missing")))],
    );
    codegen.generate(&program).unwrap_err();

    let error = codegen.finalize(FinalizeOptions::default()).unwrap_err();
    assert!(matches!(error, CodegenError::Verify(_)), "{error}");
}
