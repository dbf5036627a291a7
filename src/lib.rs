//! # Dynamic GBWT: an incrementally updatable Graph BWT
//!
//! The GBWT is a run-length encoded FM-index storing paths as sequences of node
//! identifiers. This crate implements the dynamic variant used for index
//! construction: sequences can be inserted into an existing index in batches,
//! and entire indexes can be merged, without rebuilding from scratch.
//! It is based on the [Simple-SDS](https://github.com/jltsiren/simple-sds) library.
//!
//! The two main structures are:
//!
//! * [`DynamicGBWT`]: a mutable index supporting insertion, merging, searches,
//!   and sample-based locate queries.
//! * [`GBWT`]: the compressed immutable index sharing the same serialization
//!   format, used for queries and as a merge source.
//!
//! [`GBWTBuilder`] wraps the dynamic index with a double-buffered front-end
//! that runs insertions on a background thread while the caller buffers the
//! next batch.
//!
//! # References
//!
//! Jouni Sirén, Erik Garrison, Adam M. Novak, Benedict Paten, and Richard Durbin: **Haplotype-aware graph indexes**.\
//! Bioinformatics 36(2):400-407, 2020.
//! DOI: [10.1093/bioinformatics/btz575](https://doi.org/10.1093/bioinformatics/btz575)
//!
//! # Examples
//!
//! ```
//! use dynamic_gbwt::{DynamicGBWT, ENDMARKER};
//!
//! // Two paths sharing a common prefix.
//! let mut index = DynamicGBWT::new();
//! index.insert(&[2, 3, 4, ENDMARKER, 2, 3, 5, ENDMARKER]);
//! assert_eq!(index.sequences(), 2);
//! assert_eq!(index.len(), 8);
//!
//! // Extract the second path.
//! let path: Vec<usize> = index.sequence(1).collect();
//! assert_eq!(path, vec![2, 3, 5]);
//!
//! // Both paths visit node 3.
//! let state = index.find(3).unwrap();
//! assert_eq!(index.locate(&state), vec![0, 1]);
//! ```

pub mod builder;
pub mod bwt;
pub mod dynamic;
pub mod gbwt;
pub mod headers;
pub mod record;
pub mod samples;
pub mod support;

//-----------------------------------------------------------------------------

pub use crate::builder::GBWTBuilder;
pub use crate::dynamic::DynamicGBWT;
pub use crate::gbwt::{GBWT, SearchState};

//-----------------------------------------------------------------------------

/// Node identifier `0` is used for technical purposes and does not exist in the graph.
///
/// Every sequence stored in the index ends with an endmarker.
pub const ENDMARKER: usize = 0;

//-----------------------------------------------------------------------------
