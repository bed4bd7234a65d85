#![warn(missing_docs)]
#![doc = include_str!("../README.md")]

mod tracing_macros;

mod reflect;
pub use reflect::*;

mod spec;
pub use spec::*;

mod schema_set;
pub use schema_set::SchemaSet;

mod location;
pub use location::{Position, SourceLocation, SourceMap, Span};

mod container;

mod walker;
pub use walker::{SchemaWalker, Scope};

mod error;
pub use error::*;
