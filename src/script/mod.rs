//! VM script assembly.
//!
//! Transactions carry VM code rather than a typed call format: native
//! contract calls, signature programs and address derivation all go
//! through the push-based script encoding in this module.

pub mod builder;
pub mod native;
pub mod opcode;
pub mod program;

pub use builder::ScriptBuilder;
pub use native::{native_invoke_script, NativeParam};
pub use opcode::OpCode;
pub use program::ProgramInfo;
