//! Small helpers shared across modules.

pub mod tool_call_assembler;

pub use tool_call_assembler::ToolCallAssembler;
