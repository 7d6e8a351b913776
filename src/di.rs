//! Compile-time dependency injection.
//!
//! Services never reach for globals. The [`Context`](crate::context::Context) is built
//! once from configuration, and each service is assembled from it through `FromRef`:
//!
//! - `#[derive(Context)]` on the root makes each field type extractable.
//! - `#[derive(FromContext)]` on a service resolves every field from the root, so
//!   services compose (a `GraphBuilder` holds a `TemporalEnhancer`, which holds a
//!   `FreshnessScorer`, all resolved from the same context).
//!
//! ```ignore
//! let ctx = Context::from_config(config)?;
//! let categorizer = ctx.resolve::<HybridCategorizer>();
//! ```

/// Extracts a value from a reference to `T`.
pub trait FromRef<T> {
    fn from_ref(input: &T) -> Self;
}

/// Any `Clone` type can be extracted from itself.
impl<T: Clone> FromRef<T> for T {
    fn from_ref(input: &T) -> Self {
        input.clone()
    }
}

pub use di_macros::{Context, FromContext};
