//! Completion engine: grammar-driven keyword resolution, catalog lookups and
//! the per-statement matchers that tie them together.
crate::reexport!(item);
crate::reexport!(kwd);
crate::reexport!(with_kwds);
crate::reexport!(with_kwds_tests, test);
crate::reexport!(expected);
crate::reexport!(tabular);
crate::reexport!(column_like);
crate::reexport!(func_args);
crate::reexport!(join);
crate::reexport!(live);
crate::reexport!(matcher);
crate::reexport!(postprocess);
crate::reexport!(engine);
crate::reexport!(engine_tests, test);
pub(crate) mod matchers;
