#![warn(missing_docs)]
#![forbid(unsafe_code)]
#![doc = include_str!("../README.md")]

mod descriptor;
pub use descriptor::{DescriptorPool, FieldDescriptor, FieldKind, MessageDescriptor, ScalarType};

mod message;
pub use message::{DynMessage, DynValue};

mod container;
pub use container::{DynArray, DynContainer, DynField, DynScalar};
