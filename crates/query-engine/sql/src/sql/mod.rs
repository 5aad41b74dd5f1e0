//! The SQL AST, helpers to build it, and its conversion to text.

pub mod ast;
pub mod convert;
pub mod helpers;
pub mod string;
