//! Database object catalog used to resolve completion expectations.
//!
//! The catalog is an immutable snapshot of [`Entry`] values. Refreshing it
//! means building a new [`Catalog`] and swapping it into a [`CatalogHandle`];
//! readers holding the previous `Arc` keep a consistent view.
crate::reexport!(object_type);
crate::reexport!(entry);
crate::reexport!(snapshot);
crate::reexport!(introspect);
