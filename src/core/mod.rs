// Presentation core: predicates, formatters and descriptor tables

pub mod descriptors;
pub mod filters;
pub mod formatters;

// Re-export commonly used types
pub use descriptors::{Describe, Descriptor, DescriptorTable};
pub use filters::{apply, count, AllOf, FieldMatch, Predicate, ReadTab, Readable, Searchable, SearchText, Selection};
