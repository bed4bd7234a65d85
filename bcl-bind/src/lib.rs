#![warn(missing_docs)]
#![forbid(unsafe_code)]
#![doc = include_str!("../README.md")]

mod event;
pub use event::{AttributeValue, Event, Ident};

mod binder;
pub use binder::{Binder, BinderOptions, bind_events};

mod error;
pub use error::{BindError, BindErrorKind};

mod suggest;
