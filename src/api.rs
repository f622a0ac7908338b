//! Data proxy: single-page fetches, cursor-paginated sweeps and the five-resource aggregate.

pub mod aggregate;
pub mod page;
pub mod pagination;

pub use aggregate::*;
pub use page::*;
pub use pagination::*;
