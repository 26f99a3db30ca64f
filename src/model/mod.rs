//! Graph-embedding models scored over adjacency edges.

mod line;

pub use line::{Line, LineOrder, LineTables};
