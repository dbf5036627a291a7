//! GBWT: A run-length encoded FM-index storing paths as sequences of node identifiers.
//!
//! This is the compressed immutable representation. It shares the serialization
//! format with [`DynamicGBWT`], so an index built with the dynamic structure can
//! be written to disk, loaded as a [`GBWT`], and queried or merged into another
//! dynamic index.
//!
//! The GBWT was originally described in:
//!
//! > Sirén, Garrison, Novak, Paten, Durbin: **Haplotype-aware graph indexes**.
//! > Bioinformatics, 2020. DOI: [10.1093/bioinformatics/btz575](https://doi.org/10.1093/bioinformatics/btz575)

use crate::ENDMARKER;
use crate::bwt::{BWT, BWTBuilder, Record};
use crate::dynamic::DynamicGBWT;
use crate::headers::{Header, GBWTPayload};
use crate::samples::DASamples;

use simple_sds::serialize::Serialize;

use std::io::{Error, ErrorKind};
use std::iter::FusedIterator;
use std::ops::Range;
use std::io;


//-----------------------------------------------------------------------------

/// The compressed GBWT index storing a collection of paths space-efficiently.
///
/// The GBWT stores integer sequences.
/// Each integer is assumed to be a node identifier, and each sequence is interpreted as a path in a graph.
/// If the index is not bidirectional, GBWT node and sequence identifiers correspond directly to node and path identifiers in the original graph.
///
/// In a bidirectional index, each node (path) in the original graph becomes two nodes (sequences) in the GBWT: one for the forward orientation and one for the reverse orientation.
/// A reverse path visits the other orientation of each node on the path in reverse order.
/// See [`crate::support`] for functions mapping between the identifiers used by the GBWT and the graph.
///
/// # Examples
///
/// ```
/// use dynamic_gbwt::{DynamicGBWT, GBWT, ENDMARKER};
///
/// let mut dynamic = DynamicGBWT::new();
/// dynamic.insert(&[2, 3, 4, ENDMARKER, 2, 3, 5, ENDMARKER]);
/// let index = GBWT::from(&dynamic);
///
/// // Statistics.
/// assert_eq!(index.len(), 8);
/// assert_eq!(index.sequences(), 2);
/// assert_eq!(index.alphabet_size(), 6);
///
/// // Search for subpath (3, 4).
/// let state = index.find(3).unwrap();
/// let state = index.extend(&state, 4).unwrap();
/// assert_eq!(state.node, 4);
/// assert_eq!(state.len(), 1);
///
/// // Extract the first path.
/// let path: Vec<usize> = index.sequence(0).collect();
/// assert_eq!(path, vec![2, 3, 4]);
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GBWT {
    header: Header<GBWTPayload>,
    bwt: BWT,
    samples: DASamples,
    endmarker: Vec<(usize, usize)>,
}

/// Index statistics.
impl GBWT {
    /// Returns the total length of the sequences in the index.
    #[inline]
    pub fn len(&self) -> usize {
        self.header.payload().size
    }

    /// Returns `true` if the index is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the number of sequences in the index.
    #[inline]
    pub fn sequences(&self) -> usize {
        self.header.payload().sequences
    }

    /// Returns the size of the alphabet.
    #[inline]
    pub fn alphabet_size(&self) -> usize {
        self.header.payload().alphabet_size
    }

    /// Returns the alphabet offset for the effective alphabet.
    #[inline]
    pub fn alphabet_offset(&self) -> usize {
        self.header.payload().offset
    }

    /// Returns the size of the effective alphabet.
    #[inline]
    pub fn effective_size(&self) -> usize {
        self.alphabet_size() - self.alphabet_offset()
    }

    /// Returns the smallest node identifier in the effective alphabet.
    #[inline]
    pub fn first_node(&self) -> usize {
        self.alphabet_offset() + 1
    }

    // Converts node id to record id. The endmarker record is always the first one.
    #[inline]
    fn node_to_record(&self, i: usize) -> usize {
        if i == ENDMARKER { 0 } else { i - self.alphabet_offset() }
    }

    /// Returns `true` if node identifier `id` is in the effective alphabet.
    #[inline]
    pub fn has_node(&self, id: usize) -> bool {
        id > self.alphabet_offset() && id < self.alphabet_size()
    }

    /// Returns `true` if the GBWT index is bidirectional.
    #[inline]
    pub fn is_bidirectional(&self) -> bool {
        self.header.is_set(GBWTPayload::FLAG_BIDIRECTIONAL)
    }

    // Returns the record for the given node, including the endmarker.
    pub(crate) fn record(&self, node: usize) -> Option<Record> {
        if node != ENDMARKER && !self.has_node(node) {
            return None;
        }
        self.bwt.record(self.node_to_record(node))
    }
}

//-----------------------------------------------------------------------------

/// Sequence navigation.
impl GBWT {
    /// Returns the first position in sequence `id`, or [`None`] if no such sequence exists.
    ///
    /// The return value is a pair (node identifier, offset in node).
    pub fn start(&self, id: usize) -> Option<(usize, usize)> {
        if id < self.endmarker.len() {
            Some(self.endmarker[id])
        } else {
            None
        }
    }

    /// Follows the sequence forward and returns the next position, or [`None`] if no such position exists.
    ///
    /// The argument and the return value are pairs (node identifier, offset in node).
    pub fn forward(&self, pos: (usize, usize)) -> Option<(usize, usize)> {
        // This also catches the endmarker.
        if pos.0 < self.first_node() {
            return None;
        }
        if let Some(record) = self.bwt.record(self.node_to_record(pos.0)) {
            return record.lf(pos.1);
        }
        None
    }

    /// Returns an iterator over sequence `id`.
    ///
    /// The iterator will be empty if no such sequence exists.
    pub fn sequence(&self, id: usize) -> SequenceIter {
        SequenceIter {
            parent: self,
            next: self.start(id).filter(|pos| pos.0 != ENDMARKER),
        }
    }
}

//-----------------------------------------------------------------------------

/// Subpath search.
impl GBWT {
    /// Returns a search state for all occurrences of the given node, or [`None`] if no such node exists.
    pub fn find(&self, node: usize) -> Option<SearchState> {
        // This also catches the endmarker.
        if node < self.first_node() {
            return None;
        }
        if let Some(record) = self.bwt.record(self.node_to_record(node)) {
            return Some(SearchState {
                node: node,
                range: 0..record.len(),
            });
        }
        None
    }

    /// Extends the search by the given node forward and returns the new search state, or [`None`] if no such extensions exist.
    ///
    /// Assume that the current search state corresponds to a set of substring occurrences ending with the same node.
    /// This method takes all of those substrings that continue with the given node, extends them with that node, and returns the new search state.
    ///
    /// # Arguments
    ///
    /// * `state`: A search state corresponding to a set of substring occurrences.
    /// * `node`: Node to extend the substrings with.
    pub fn extend(&self, state: &SearchState, node: usize) -> Option<SearchState> {
        // This also catches the endmarker.
        if node < self.first_node() {
            return None;
        }
        if let Some(record) = self.bwt.record(self.node_to_record(state.node)) {
            if let Some(range) = record.follow(&state.range, node) {
                return Some(SearchState {
                    node: node,
                    range: range,
                })
            }
        }
        None
    }
}

//-----------------------------------------------------------------------------

impl Serialize for GBWT {
    fn serialize_header<T: io::Write>(&self, writer: &mut T) -> io::Result<()> {
        self.header.serialize(writer)
    }

    fn serialize_body<T: io::Write>(&self, writer: &mut T) -> io::Result<()> {
        self.bwt.serialize(writer)?;
        self.samples.serialize(writer)?;
        Ok(())
    }

    fn load<T: io::Read>(reader: &mut T) -> io::Result<Self> {
        let header = Header::<GBWTPayload>::load(reader)?;
        if let Err(msg) = header.validate() {
            return Err(Error::new(ErrorKind::InvalidData, msg));
        }

        let bwt = BWT::load(reader)?;
        let effective = header.payload().alphabet_size - header.payload().offset;
        if bwt.len() != effective {
            return Err(Error::new(ErrorKind::InvalidData, "GBWT: BWT record count / alphabet size mismatch"));
        }

        let samples = DASamples::load(reader)?;

        // Decompress the endmarker, as the record can be poorly compressible.
        let endmarker = match bwt.record(ENDMARKER) {
            Some(record) => record.decompress(),
            None => Vec::new(),
        };

        Ok(GBWT {
            header: header,
            bwt: bwt,
            samples: samples,
            endmarker: endmarker,
        })
    }

    fn size_in_elements(&self) -> usize {
        self.header.size_in_elements() + self.bwt.size_in_elements() + self.samples.size_in_elements()
    }
}

impl From<&DynamicGBWT> for GBWT {
    fn from(source: &DynamicGBWT) -> Self {
        let mut builder = BWTBuilder::new();
        for record in source.as_ref().iter() {
            builder.append(&record.outgoing, &record.body);
        }
        let bwt = BWT::from(builder);
        let endmarker = match bwt.record(ENDMARKER) {
            Some(record) => record.decompress(),
            None => Vec::new(),
        };
        GBWT {
            header: *source.header(),
            bwt: bwt,
            samples: DASamples::from(source.as_ref()),
            endmarker: endmarker,
        }
    }
}

//-----------------------------------------------------------------------------

/// A state of unidirectional search in [`GBWT`] and [`DynamicGBWT`].
///
/// The state consists of the last matched GBWT node identifier and an offset range in that node.
/// This information is equivalent to a BWT range in a normal FM-index.
///
/// Note that because `SearchState` contains a [`Range`], which does not implement [`Copy`], states must often be passed by reference.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SearchState {
    /// GBWT node identifier for the last matched node.
    pub node: usize,
    /// Offset range in the node.
    pub range: Range<usize>,
}

impl SearchState {
    /// Returns the number of matching substring occurrences (the length of the offset range).
    #[inline]
    pub fn len(&self) -> usize {
        self.range.len()
    }

    /// Returns `true` if there are no matching substring occurrences.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.range.is_empty()
    }
}

//-----------------------------------------------------------------------------

/// An iterator over a sequence in [`GBWT`].
///
/// The type of `Item` is [`usize`].
///
/// # Examples
///
/// ```
/// use dynamic_gbwt::{DynamicGBWT, GBWT, ENDMARKER};
///
/// let mut dynamic = DynamicGBWT::new();
/// dynamic.insert(&[10, 11, 13, ENDMARKER]);
/// let index = GBWT::from(&dynamic);
///
/// let path: Vec<usize> = index.sequence(0).collect();
/// assert_eq!(path, vec![10, 11, 13]);
/// ```
#[derive(Clone, Debug)]
pub struct SequenceIter<'a> {
    parent: &'a GBWT,
    // The next position.
    next: Option<(usize, usize)>,
}

impl<'a> Iterator for SequenceIter<'a> {
    type Item = usize;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(pos) = self.next {
            self.next = self.parent.forward(pos);
            return Some(pos.0);
        } else {
            return None;
        }
    }
}

impl<'a> FusedIterator for SequenceIter<'a> {}

//-----------------------------------------------------------------------------
