//! Lanes VM - data-parallel expression interpreter
//!
//! Evaluates a compiled [`ByteCode`] program once per instance over a batch
//! of instances. Values live in [`Vec4f`](lanes_simd::Vec4f) registers, four
//! instances per register; a temp register spans as many registers as the
//! batch has groups of four. Inputs and outputs are strided byte streams
//! owned by the caller, and programs may call native functions registered on
//! the engine.
//!
//! ```
//! use lanes_vm::{BinaryOp, ByteCodeBuilder, ExpressionVm, InputStream, OutputStream};
//!
//! let mut builder = ByteCodeBuilder::new();
//! builder.load(0, "x").binary_const(BinaryOp::Mul, 0, 2.0, 0).store("y", 0);
//! let program = builder.build();
//!
//! let x = [1.0, 2.0, 3.0, 4.0, 5.0];
//! let mut y = [0.0; 5];
//! let inputs = [InputStream::from_f32("x", &x)];
//! let mut outputs = [OutputStream::from_f32("y", &mut y)];
//!
//! let mut vm = ExpressionVm::new();
//! vm.execute(&program, &inputs, &mut outputs, 5, &()).unwrap();
//! assert_eq!(y, [2.0, 4.0, 6.0, 8.0, 10.0]);
//! ```

pub mod builder;
pub mod error;
pub mod executor;
pub mod functions;
pub mod handlers;
pub mod opcode;
pub mod operand;
pub mod parallel;
pub mod program;
pub mod registry;
pub mod state;
pub mod stream;

pub use lanes_simd;

pub use builder::ByteCodeBuilder;
pub use error::{ExecutionError, SlotKind};
pub use executor::ExpressionVm;
pub use functions::{Arity, ExpressionFn, FunctionEntry, FunctionTable, GlobalData};
pub use opcode::{BinaryOp, Instruction, OpCode, UnaryOp};
pub use operand::Operand;
pub use parallel::{ChunkConfig, optimal_chunk_size};
pub use program::ByteCode;
pub use stream::{InputStream, OutputStream, StreamDataType};
