//! # walklint-core
//!
//! Core engine for walking syntax trees with pluggable checks.
//!
//! This crate provides:
//!
//! - [`SyntaxTree`] and [`SyntaxNode`], an arena tree with a fixed
//!   [`SyntaxKind`] taxonomy
//! - the [`Check`] trait, implemented by every rule
//! - [`TreeWalker`], which dispatches nodes to interested checks depth-first
//! - [`QueryEngine`], an XPath-like query language over syntax trees
//! - [`FilterSet`], composable violation suppressions
//! - [`Checker`] for running many files and collecting an [`AuditReport`]
//!
//! ## Example
//!
//! ```
//! use walklint_core::{
//!     Check, CheckContext, CheckDescriptor, CheckResult, Checker, KindSet, SourceUnit,
//!     SyntaxKind, SyntaxNode, TreeBuilder,
//! };
//!
//! #[derive(Default)]
//! struct NoNew;
//!
//! impl Check for NoNew {
//!     fn name(&self) -> &'static str { "no-new" }
//!
//!     fn acceptable_kinds(&self) -> KindSet {
//!         KindSet::of(&[SyntaxKind::LiteralNew])
//!     }
//!
//!     fn enter_node(&mut self, node: SyntaxNode<'_>, ctx: &mut CheckContext<'_>) -> CheckResult {
//!         ctx.log(node, "Instantiation is not allowed.");
//!         Ok(())
//!     }
//! }
//!
//! let mut b = TreeBuilder::new();
//! b.start(SyntaxKind::CompilationUnit, "", 1, 0);
//! b.leaf(SyntaxKind::LiteralNew, "new", 3, 8);
//! b.finish();
//! let tree = b.build().unwrap();
//!
//! let checker = Checker::builder()
//!     .check(CheckDescriptor::of::<NoNew>())
//!     .build()
//!     .unwrap();
//! let report = checker.run(&[SourceUnit::parsed("Foo.java", tree)]);
//! assert_eq!(report.violations().count(), 1);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod ast;
mod check;
mod checker;
mod context;
mod dispatch;
mod kind;
mod types;
mod walker;

pub mod config;
pub mod filter;
pub mod loader;
pub mod query;
pub mod registry;

pub use ast::{NodeDto, NodeId, ParseFailure, SyntaxNode, SyntaxTree, TreeBuilder, TreeError};
pub use check::{Check, CheckDescriptor, CheckError, CheckFactory, CheckResult};
pub use checker::{Checker, CheckerBuilder, SourceUnit};
pub use config::{Config, ConfigError};
pub use context::CheckContext;
pub use dispatch::{register, DispatchTable, RegistrationError};
pub use filter::{
    AuditEvent, FileFilters, FilterElement, FilterError, FilterSet, NearbyElement, NearbySpec,
};
pub use kind::{KindSet, SyntaxKind, UnknownKind};
pub use loader::{load, LoadError, LoadedConfig};
pub use query::{CompiledQuery, EngineOptions, QueryEngine, QueryError};
pub use registry::{CheckOptions, CheckRegistry, RegistryError};
pub use types::{AuditReport, FileReport, Location, Severity, Violation};
pub use walker::{Cancellation, FileFailure, Phase, TreeWalker, WalkSession, WalkState};
