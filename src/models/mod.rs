// file: src/models/mod.rs
// description: data models module exports
// reference: internal module structure

pub mod source_unit;
pub mod summary;

pub use source_unit::{
    ClassDecl, FunctionDecl, ParamInfo, ParamKind, ParseError, ParseErrorKind, SourceUnit,
    module_name,
};
pub use summary::{DeclKind, DiscoveryError, ModuleEntry, Summary, UndocumentedItem};
