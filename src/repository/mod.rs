// file: src/repository/mod.rs
// description: Repository acquisition and discovery module exports
// reference: Internal module structure

pub mod clone;
pub mod resolver;
pub mod scanner;
pub mod workspace;

pub use clone::{GitCli, RepositoryCloner};
pub use resolver::{AcquireOptions, Locator, WorkspaceResolver};
pub use scanner::{Discovery, FileScanner, ScannedFile};
pub use workspace::{Origin, Workspace};
