//! Output formats
//!
//! - [`treeviz`]: a one-line-per-element view of a syntax tree, used in snapshots and by the
//!   `synkit tree` command
//! - [`detokenizer`]: token streams back to source text

pub mod detokenizer;
pub mod treeviz;

pub use detokenizer::detokenize;
pub use treeviz::{to_treeviz_str, to_treeviz_str_with, TreevizOptions};
