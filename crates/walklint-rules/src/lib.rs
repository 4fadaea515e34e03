//! # walklint-rules
//!
//! Built-in checks for walklint.
//!
//! ## Available Checks
//!
//! | Name | Kinds | Description |
//! |------|-------|-------------|
//! | `illegal-instantiation` | `LITERAL_NEW` | Forbids `new C(..)` for configured classes |
//! | `return-count` | `METHOD_DEF`, `CTOR_DEF`, `LAMBDA`, `LITERAL_RETURN` | Limits returns per scope |
//! | `nested-if-depth` | `LITERAL_IF` | Limits nesting of `if` statements |
//! | `outer-type-number` | `CLASS_DEF`, `INTERFACE_DEF`, `ENUM_DEF`, `RECORD_DEF`, `ANNOTATION_DEF` | Limits top-level types per file |
//!
//! ## Usage
//!
//! ```
//! use walklint_core::{load, Config};
//! use walklint_rules::builtin_registry;
//!
//! let config = Config::parse(r#"
//! preset = "recommended"
//!
//! [[checks]]
//! name = "illegal-instantiation"
//! options = { classes = ["java.lang.Boolean"] }
//! "#).unwrap();
//!
//! let checker = load(&config, &builtin_registry())
//!     .unwrap()
//!     .into_builder()
//!     .build()
//!     .unwrap();
//! assert_eq!(checker.check_count(), 4);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod illegal_instantiation;
mod nested_if_depth;
mod outer_type_number;
mod presets;
mod return_count;

#[cfg(test)]
mod testing;

pub use illegal_instantiation::{IllegalInstantiation, IllegalInstantiationOptions};
pub use nested_if_depth::{NestedIfDepth, NestedIfDepthOptions};
pub use outer_type_number::{OuterTypeNumber, OuterTypeNumberOptions};
pub use presets::{all_checks, builtin_registry, recommended_checks, Preset};
pub use return_count::{ReturnCount, ReturnCountOptions};

/// Re-export core types for convenience.
pub use walklint_core::{Check, Severity, Violation};
