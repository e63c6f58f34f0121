// file: src/parser/mod.rs
// description: python source parsing module exports
// reference: internal module structure

pub mod docstring;
pub mod python;
pub mod signature;

pub use docstring::clean_docstring;
pub use python::PythonParser;
