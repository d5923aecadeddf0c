//! Infrastructure adapters for the identity resolver.

pub mod upstream;
