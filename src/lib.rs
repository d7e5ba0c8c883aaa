//! Context-aware statement completion for PostgreSQL.
//!
//! Given an in-progress statement and a caret offset, [`complete`] works out
//! which construct is being typed and returns ranked [`CompletionItem`]s
//! drawn from a [`Catalog`] snapshot.
//!
//! ```no_run
//! use pgcomplete::*;
//!
//! # async fn demo() {
//! let catalog = Catalog::new([Entry::table("public", "users", vec![], vec![])]);
//! let items = complete("SELECT * FROM use", 17, &catalog, None).await;
//! assert!(items.iter().any(|i| i.label == "users"));
//! # }
//! ```
reexport!(testing, test);
reexport!(config);
reexport!(error);
reexport!(sql);
reexport!(catalog);
reexport!(completion);
#[allow(unused_imports)]
pub(crate) use tracing::{debug, error, info, span, trace, warn};

#[macro_export]
macro_rules! reexport {
    ($module:ident) => {
        $crate::reexport!($module, false);
    };
    ($module:ident, test) => {
        $crate::reexport!($module, true);
    };
    ($module:ident, $is_test:literal) => {
        #[cfg_attr($is_test, cfg(test))]
        pub mod $module;
        #[cfg_attr($is_test, cfg(test))]
        #[allow(unused_imports)]
        #[allow(ambiguous_glob_reexports)]
        pub use $module::*;
    };
}
