//! Value object trait: equality by value, not identity.

/// Marker trait for value objects.
///
/// Value objects are **immutable** and **compared by value**. A value object is
/// only ever constructed through a validating constructor, so holding one is
/// proof that the wrapped value satisfies its invariants (e.g. a `Score` is
/// always within 1..=10, a `Username` is never the reserved `"me"`).
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}
