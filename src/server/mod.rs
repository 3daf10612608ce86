//! Invocation surface - MCP stdio server
//!
//! Translates tool calls into candidate objects and renders Result/Summary
//! values back to the caller. Expected failures (validation, duplicate id,
//! store faults) come back as tool output, never as transport errors.

pub mod mcp;

pub use mcp::McpService;
