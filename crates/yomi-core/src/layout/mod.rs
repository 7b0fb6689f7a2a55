//! Layout analysis: element filtering, table grids, word aggregation and
//! reading order.

pub mod aggregate;
pub mod filter;
pub mod graph;
pub mod reading_order;
pub mod table;
pub mod union_find;

pub use aggregate::{Aggregation, Aggregator, ClaimSet, Owner};
pub use filter::{FilteredLayout, LayoutFilter, element_hierarchy};
pub use graph::{Family, Node, RelationGraph};
pub use reading_order::{Policy, reading_order, traverse};
pub use table::{TableGridBuilder, reconstruct_cells};
pub use union_find::UnionFind;
