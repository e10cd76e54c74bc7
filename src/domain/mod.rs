/// Domain layer: configuration, resource naming and credential types.
/// Nothing here performs I/O.
pub mod entities;
pub mod value_objects;
