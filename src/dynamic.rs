//! Dynamic GBWT structures for index construction.
//!
//! [`DynamicGBWT`] stores each node record in a directly mutable form, which
//! makes it possible to insert new sequences into an existing index and to
//! merge entire indexes without rebuilding from scratch. The index answers
//! the same queries as the compressed [`GBWT`] and additionally supports
//! sample-based locate queries.
//!
//! Insertion processes all sequences of a batch simultaneously. Each
//! iteration extends every remaining sequence by one node, keeping the
//! sequences sorted by their positions in the BWT so that the relative order
//! of the inserted positions is always correct.
//!
//! # Examples
//!
//! ```
//! use dynamic_gbwt::{DynamicGBWT, ENDMARKER};
//!
//! let mut index = DynamicGBWT::new();
//! index.insert(&[2, 3, 4, ENDMARKER]);
//! index.insert(&[2, 3, 5, ENDMARKER]);
//! assert_eq!(index.sequences(), 2);
//!
//! // Node 3 is visited by both sequences.
//! assert_eq!(index.count(3), 2);
//! let state = index.find(3).unwrap();
//! assert_eq!(index.locate(&state), vec![0, 1]);
//! ```

use crate::ENDMARKER;
use crate::bwt::{BWT, BWTBuilder};
use crate::builder::GBWTBuilder;
use crate::gbwt::{GBWT, SearchState};
use crate::headers::{Header, GBWTPayload};
use crate::record::{DynamicRecord, RunMerger};
use crate::samples::DASamples;

use simple_sds::serialize::Serialize;

use std::io::{Error, ErrorKind};
use std::iter::FusedIterator;
use std::{cmp, io, mem};


//-----------------------------------------------------------------------------

/// The dynamic GBWT index storing a collection of paths in a mutable form.
///
/// New sequences are appended with [`DynamicGBWT::insert`] or through a
/// [`GBWTBuilder`], and entire indexes are absorbed with [`DynamicGBWT::merge`]
/// and [`DynamicGBWT::merge_dynamic`]. Sequence identifiers are assigned in
/// insertion order, starting from the current number of sequences. Sequences
/// cannot be removed.
///
/// The serialization format is the same as for [`GBWT`].
///
/// # Examples
///
/// ```
/// use dynamic_gbwt::{DynamicGBWT, ENDMARKER};
///
/// let mut index = DynamicGBWT::new();
/// index.insert(&[2, 3, ENDMARKER, 4, 5, ENDMARKER]);
///
/// assert_eq!(index.len(), 6);
/// assert_eq!(index.sequences(), 2);
/// assert_eq!(index.alphabet_size(), 6);
/// assert_eq!(index.alphabet_offset(), 1);
///
/// let path: Vec<usize> = index.sequence(1).collect();
/// assert_eq!(path, vec![4, 5]);
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DynamicGBWT {
    header: Header<GBWTPayload>,
    bwt: Vec<DynamicRecord>,
}

/// Index statistics.
impl DynamicGBWT {
    /// The distance between sequence identifier samples along each sequence.
    ///
    /// Every sequence is also sampled at the position before its endmarker,
    /// which guarantees that locate queries terminate.
    pub const SAMPLE_INTERVAL: usize = 1024;

    /// File extension for serialized indexes.
    pub const EXTENSION: &'static str = ".gbwt";

    /// Creates an empty index.
    pub fn new() -> Self {
        DynamicGBWT::default()
    }

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
    fn comp(&self, node: usize) -> usize {
        if node == ENDMARKER { 0 } else { node - self.alphabet_offset() }
    }

    /// Returns `true` if node identifier `id` is in the effective alphabet.
    #[inline]
    pub fn has_node(&self, id: usize) -> bool {
        id > self.alphabet_offset() && id < self.alphabet_size()
    }

    /// Returns the number of BWT positions in the record of the given node.
    ///
    /// For the endmarker, this is the number of sequences in the index.
    pub fn count(&self, node: usize) -> usize {
        if node == ENDMARKER {
            if self.bwt.is_empty() { 0 } else { self.bwt[0].len() }
        } else if self.has_node(node) {
            self.record(node).len()
        } else {
            0
        }
    }

    /// Returns the total number of runs in the record bodies.
    pub fn runs(&self) -> usize {
        self.bwt.iter().map(|record| record.runs()).sum()
    }

    /// Returns the total number of sequence identifier samples.
    pub fn samples(&self) -> usize {
        self.bwt.iter().map(|record| record.samples()).sum()
    }

    /// Returns the record for the given node.
    ///
    /// # Panics
    ///
    /// May panic if the node is neither the endmarker nor in the effective alphabet.
    #[inline]
    pub fn record(&self, node: usize) -> &DynamicRecord {
        &self.bwt[self.comp(node)]
    }

    pub(crate) fn header(&self) -> &Header<GBWTPayload> {
        &self.header
    }
}

impl AsRef<[DynamicRecord]> for DynamicGBWT {
    #[inline]
    fn as_ref(&self) -> &[DynamicRecord] {
        &self.bwt
    }
}

//-----------------------------------------------------------------------------

/// Sequence navigation and subpath search.
impl DynamicGBWT {
    /// Returns the first position in sequence `id`, or [`None`] if no such sequence exists.
    ///
    /// The return value is a pair (node identifier, offset in node).
    pub fn start(&self, id: usize) -> Option<(usize, usize)> {
        if self.bwt.is_empty() {
            return None;
        }
        let endmarker = &self.bwt[0];
        let node = endmarker.successor_at(id)?;
        let offset = endmarker.rank_at(id)?;
        Some((node, offset))
    }

    /// Follows the sequence forward and returns the next position, or [`None`] if no such position exists.
    ///
    /// The argument and the return value are pairs (node identifier, offset in node).
    pub fn forward(&self, pos: (usize, usize)) -> Option<(usize, usize)> {
        // This also catches the endmarker.
        if !self.has_node(pos.0) {
            return None;
        }
        self.record(pos.0).lf(pos.1)
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

    /// Returns a search state for all occurrences of the given node, or [`None`] if no such node exists.
    pub fn find(&self, node: usize) -> Option<SearchState> {
        if !self.has_node(node) {
            return None;
        }
        let record = self.record(node);
        if record.is_empty() {
            return None;
        }
        Some(SearchState {
            node: node,
            range: 0..record.len(),
        })
    }

    /// Extends the search by the given node forward and returns the new search state, or [`None`] if no such extensions exist.
    ///
    /// # Arguments
    ///
    /// * `state`: A search state corresponding to a set of substring occurrences.
    /// * `node`: Node to extend the substrings with.
    pub fn extend(&self, state: &SearchState, node: usize) -> Option<SearchState> {
        if !self.has_node(node) || !self.has_node(state.node) {
            return None;
        }
        let range = self.record(state.node).follow(&state.range, node)?;
        Some(SearchState {
            node: node,
            range: range,
        })
    }
}

//-----------------------------------------------------------------------------

/// Locate queries.
impl DynamicGBWT {
    /// Returns the sequence identifier at the given position, or [`None`] if the position is not sampled.
    ///
    /// The argument is a pair (node identifier, offset in node).
    pub fn try_locate(&self, pos: (usize, usize)) -> Option<usize> {
        if pos.0 != ENDMARKER && !self.has_node(pos.0) {
            return None;
        }
        self.record(pos.0).sample_at(pos.1)
    }

    /// Returns the identifiers of the sequences with BWT positions in the given search state.
    ///
    /// The result is sorted and contains no duplicates.
    /// Each position is followed forward until a sampled position is found.
    /// Termination is guaranteed, because every sequence is sampled at the position
    /// before its endmarker.
    ///
    /// # Examples
    ///
    /// ```
    /// use dynamic_gbwt::{DynamicGBWT, SearchState, ENDMARKER};
    ///
    /// let mut index = DynamicGBWT::new();
    /// index.insert(&[2, 3, 4, ENDMARKER, 2, 3, 5, ENDMARKER]);
    ///
    /// let state = SearchState { node: 2, range: 0..2 };
    /// assert_eq!(index.locate(&state), vec![0, 1]);
    /// ```
    pub fn locate(&self, state: &SearchState) -> Vec<usize> {
        let mut result: Vec<usize> = Vec::new();
        if !self.has_node(state.node) || state.range.end > self.record(state.node).len() {
            return result;
        }

        // One active position per offset in the range.
        let mut positions: Vec<(usize, usize)> = state.range.clone().map(|offset| (state.node, offset)).collect();

        // Continue with LF until a sample has been found for every position.
        while !positions.is_empty() {
            let mut tail = 0;
            let mut curr = usize::MAX;
            let mut record = &self.bwt[0];
            let mut sample_index = 0;
            let mut lf_start = 0;
            let mut lf_result = (0, 0);
            let mut lf_end = 0;
            for i in 0..positions.len() {
                let (node, offset) = positions[i];
                if node != curr {
                    curr = node;
                    record = self.record(curr);
                    sample_index = record.next_sample(offset);
                    lf_start = offset;
                    let (value, run_end) = record.run_lf(offset).unwrap();
                    lf_result = value; lf_end = run_end;
                }
                while sample_index < record.samples() && record.ids[sample_index].0 < offset {
                    sample_index += 1;
                }
                if sample_index < record.samples() && record.ids[sample_index].0 == offset {
                    result.push(record.ids[sample_index].1);
                } else {
                    if offset > lf_end {
                        lf_start = offset;
                        let (value, run_end) = record.run_lf(offset).unwrap();
                        lf_result = value; lf_end = run_end;
                    }
                    positions[tail] = (lf_result.0, lf_result.1 + (offset - lf_start));
                    tail += 1;
                }
            }
            positions.truncate(tail);
            positions.sort_unstable();
        }

        result.sort_unstable();
        result.dedup();
        result
    }
}

//-----------------------------------------------------------------------------

/// Structural operations.
impl DynamicGBWT {
    // Changes the alphabet offset and/or increases the alphabet size, moving the
    // existing records to their new positions in the record array.
    fn resize(&mut self, new_offset: usize, new_sigma: usize) {
        // Do not set the new offset, if we already have a smaller real offset or
        // the new offset is not a real one.
        let mut new_offset = new_offset;
        let mut new_sigma = new_sigma;
        if (self.alphabet_size() > 1 && new_offset > self.alphabet_offset()) || new_sigma <= 1 {
            new_offset = self.alphabet_offset();
        }
        if self.alphabet_size() > new_sigma {
            new_sigma = self.alphabet_size();
        }
        if new_offset > 0 {
            assert!(new_offset < new_sigma, "DynamicGBWT: Cannot set offset {} with alphabet size {}", new_offset, new_sigma);
        }

        if new_offset != self.alphabet_offset() || new_sigma != self.alphabet_size() {
            let old_offset = self.alphabet_offset();
            let old_effective = self.effective_size();
            let mut new_bwt: Vec<DynamicRecord> = vec![DynamicRecord::new(); new_sigma - new_offset];
            if old_effective > 0 {
                mem::swap(&mut new_bwt[0], &mut self.bwt[0]);
            }
            for comp in 1..old_effective {
                mem::swap(&mut new_bwt[comp + old_offset - new_offset], &mut self.bwt[comp]);
            }
            self.bwt = new_bwt;
            self.header.payload_mut().offset = new_offset;
            self.header.payload_mut().alphabet_size = new_sigma;
        }
    }

    // Sorts the outgoing edges in all records, as required by the serialization format.
    pub(crate) fn recode(&mut self) {
        for record in self.bwt.iter_mut() {
            record.recode();
        }
    }
}

//-----------------------------------------------------------------------------

/// Insertion and merging.
impl DynamicGBWT {
    /// Inserts one or more sequences into the index as a single batch.
    ///
    /// The text must be a concatenation of sequences, each of which ends with an
    /// endmarker. The new sequences receive identifiers starting from
    /// [`DynamicGBWT::sequences`] in the order of their starting positions.
    /// An empty text is a no-op.
    ///
    /// # Panics
    ///
    /// Panics if a non-empty text does not end with an endmarker.
    pub fn insert(&mut self, text: &[usize]) {
        if text.is_empty() {
            return;
        }
        insert_batch(self, text, self.sequences());
        self.recode();
    }

    /// Inserts the sequences from the text into the index in batches of at most
    /// `batch_size` nodes, using a [`GBWTBuilder`].
    ///
    /// The text is interpreted as in [`DynamicGBWT::insert`], except that a
    /// possible final sequence without an endmarker is also accepted.
    /// If `both_orientations` is set, the reverse orientation of each sequence is
    /// inserted as well (see [`crate::support::reverse_path`]).
    /// Batch size `0` inserts everything in a single batch.
    pub fn insert_batched(&mut self, text: &[usize], batch_size: usize, both_orientations: bool) {
        if text.is_empty() {
            return;
        }
        let batch_size = if batch_size == 0 { text.len() } else { batch_size };

        let mut builder = GBWTBuilder::new(batch_size);
        builder.swap_index(self);
        let mut sequence: Vec<usize> = Vec::new();
        for &node in text {
            if node == ENDMARKER {
                builder.insert(&sequence, both_orientations);
                sequence.clear();
            } else {
                sequence.push(node);
            }
        }
        if !sequence.is_empty() {
            builder.insert(&sequence, both_orientations);
        }
        builder.finish();
        builder.swap_index(self);
    }

    /// Inserts the sequences from the compressed index into this index.
    ///
    /// The sequences are inserted in batches of at most `batch_size` sequences,
    /// in the order of their identifiers in the source. Batch size `0` inserts
    /// everything in a single batch.
    pub fn merge(&mut self, source: &GBWT, batch_size: usize) {
        if source.is_empty() {
            return;
        }
        let batch_size = if batch_size == 0 { source.sequences() } else { batch_size };
        self.resize(source.alphabet_offset(), source.alphabet_size());

        let mut source_id = 0;
        while source_id < source.sequences() {
            let limit = cmp::min(source_id + batch_size, source.sequences());
            let mut seqs: Vec<Sequence> = Vec::with_capacity(limit - source_id);
            while source_id < limit {
                let (first, _) = source.start(source_id).unwrap();
                seqs.push(Sequence::from_source(first, self.sequences(), source_id));
                self.header.payload_mut().sequences += 1;
                source_id += 1;
            }
            insert_sequences(self, &mut seqs, source);
        }

        self.recode();
    }

    /// Inserts the sequences from the other dynamic index into this index.
    ///
    /// The sequences are inserted in batches of at most `batch_size` sequences,
    /// in the order of their identifiers in the source. Batch size `0` inserts
    /// everything in a single batch.
    pub fn merge_dynamic(&mut self, source: &DynamicGBWT, batch_size: usize) {
        if source.is_empty() {
            return;
        }
        let batch_size = if batch_size == 0 { source.sequences() } else { batch_size };
        self.resize(source.alphabet_offset(), source.alphabet_size());

        let endmarker = source.record(ENDMARKER);
        let mut runs = endmarker.body.iter();
        let mut run: Option<(usize, usize)> = runs.next().copied();
        let mut run_offset = 0;
        let mut source_id = 0;
        while source_id < source.sequences() {
            let limit = cmp::min(source_id + batch_size, source.sequences());
            let mut seqs: Vec<Sequence> = Vec::with_capacity(limit - source_id);
            while source_id < limit {
                let (rank, len) = run.unwrap();
                if run_offset >= len {
                    run = runs.next().copied();
                    run_offset = 0;
                    continue;
                }
                seqs.push(Sequence::from_source(endmarker.successor(rank), self.sequences(), source_id));
                self.header.payload_mut().sequences += 1;
                source_id += 1;
                run_offset += 1;
            }
            insert_sequences(self, &mut seqs, source);
        }

        self.recode();
    }
}

//-----------------------------------------------------------------------------

impl Serialize for DynamicGBWT {
    fn serialize_header<T: io::Write>(&self, writer: &mut T) -> io::Result<()> {
        self.header.serialize(writer)
    }

    fn serialize_body<T: io::Write>(&self, writer: &mut T) -> io::Result<()> {
        let mut builder = BWTBuilder::new();
        for record in self.bwt.iter() {
            builder.append(&record.outgoing, &record.body);
        }
        let bwt = BWT::from(builder);
        bwt.serialize(writer)?;

        let samples = DASamples::from(self.bwt.as_slice());
        samples.serialize(writer)?;
        Ok(())
    }

    fn load<T: io::Read>(reader: &mut T) -> io::Result<Self> {
        let header = Header::<GBWTPayload>::load(reader)?;
        if let Err(msg) = header.validate() {
            return Err(Error::new(ErrorKind::InvalidData, msg));
        }

        // Read and decompress the BWT.
        let bwt = BWT::load(reader)?;
        let effective = header.payload().alphabet_size - header.payload().offset;
        if bwt.len() != effective {
            return Err(Error::new(ErrorKind::InvalidData, "DynamicGBWT: BWT record count / alphabet size mismatch"));
        }
        let mut records: Vec<DynamicRecord> = vec![DynamicRecord::new(); effective];
        let mut total_size = 0;
        for comp in 0..effective {
            if let Some(source) = bwt.record(comp) {
                let record = &mut records[comp];
                for rank in 0..source.outdegree() {
                    record.outgoing.push((source.successor(rank), source.offset(rank)));
                }
                for (rank, len) in source.run_iter() {
                    record.body.push((rank, len));
                    record.body_size += len;
                }
                total_size += record.body_size;
            }
        }
        if total_size != header.payload().size {
            return Err(Error::new(ErrorKind::InvalidData, "DynamicGBWT: BWT length / header size mismatch"));
        }

        // Read and attach the samples.
        let samples = DASamples::load(reader)?;
        for (comp, offset, id) in samples.iter() {
            if comp >= records.len() || offset >= records[comp].body_size {
                return Err(Error::new(ErrorKind::InvalidData, "DynamicGBWT: Sample at an invalid position"));
            }
            records[comp].ids.push((offset, id));
        }

        // Rebuild the incoming edges.
        let offset = header.payload().offset;
        for comp in 0..effective {
            let mut counts: Vec<usize> = vec![0; records[comp].outdegree()];
            for &(rank, len) in records[comp].body.iter() {
                counts[rank] += len;
            }
            let node = if comp == 0 { ENDMARKER } else { comp + offset };
            let edges: Vec<(usize, usize)> = records[comp].outgoing.iter()
                .map(|edge| edge.0)
                .zip(counts)
                .collect();
            for (successor, count) in edges {
                if successor != ENDMARKER {
                    records[successor - offset].add_incoming((node, count));
                }
            }
        }

        Ok(DynamicGBWT {
            header: header,
            bwt: records,
        })
    }

    fn size_in_elements(&self) -> usize {
        let mut builder = BWTBuilder::new();
        for record in self.bwt.iter() {
            builder.append(&record.outgoing, &record.body);
        }
        let bwt = BWT::from(builder);
        let samples = DASamples::from(self.bwt.as_slice());
        self.header.size_in_elements() + bwt.size_in_elements() + samples.size_in_elements()
    }
}

//-----------------------------------------------------------------------------

// A cursor for one sequence being inserted. `curr` is the node whose record
// currently holds the cursor, `next` is the node inserted during this
// iteration, `offset` is the position in the record of `curr` where the next
// symbol is inserted, and `pos` is the position of the sequence in the source.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
struct Sequence {
    id: usize,
    pos: usize,
    curr: usize,
    next: usize,
    offset: usize,
}

impl Sequence {
    // Creates a sequence cursor for a text starting at the given position.
    // The initial offset places the sequence at position `id` in the endmarker record.
    fn from_text(text: &[usize], start: usize, id: usize) -> Self {
        Sequence {
            id: id,
            pos: start,
            curr: ENDMARKER,
            next: text[start],
            offset: id,
        }
    }

    // Creates a sequence cursor for sequence `source_id` of a source index with
    // the given first node.
    fn from_source(first: usize, id: usize, source_id: usize) -> Self {
        Sequence {
            id: id,
            pos: source_id,
            curr: ENDMARKER,
            next: first,
            offset: id,
        }
    }
}

//-----------------------------------------------------------------------------

// A source of sequences for the insertion algorithm. `next_positions` computes
// the position of each sequence in the record of its `next` node, assuming that
// the sequences are sorted by `(curr, offset)`. `advance` moves each sequence
// one node forward, assuming that the sequences are sorted by `(next, curr, offset)`.
trait InsertionSource {
    fn next_positions(&self, seqs: &mut [Sequence]);
    fn advance(&self, seqs: &mut [Sequence]);
}

impl InsertionSource for [usize] {
    fn next_positions(&self, seqs: &mut [Sequence]) {
        for seq in seqs.iter_mut() {
            seq.pos += 1;
        }
    }

    fn advance(&self, seqs: &mut [Sequence]) {
        for seq in seqs.iter_mut() {
            seq.curr = seq.next;
            seq.next = self[seq.pos];
        }
    }
}

impl InsertionSource for GBWT {
    fn next_positions(&self, seqs: &mut [Sequence]) {
        let mut i = 0;
        while i < seqs.len() {
            let curr = seqs[i].curr;
            let record = self.record(curr).unwrap();
            while i < seqs.len() && seqs[i].curr == curr {
                seqs[i].pos = record.rank_at(seqs[i].pos).unwrap();
                i += 1;
            }
        }
    }

    fn advance(&self, seqs: &mut [Sequence]) {
        let mut i = 0;
        while i < seqs.len() {
            let curr = seqs[i].next;
            let record = self.record(curr).unwrap();
            while i < seqs.len() && seqs[i].next == curr {
                seqs[i].curr = curr;
                seqs[i].next = record.successor_at(seqs[i].pos).unwrap();
                i += 1;
            }
        }
    }
}

impl InsertionSource for DynamicGBWT {
    fn next_positions(&self, seqs: &mut [Sequence]) {
        let mut i = 0;
        while i < seqs.len() {
            let curr = seqs[i].curr;
            let record = self.record(curr);
            while i < seqs.len() && seqs[i].curr == curr {
                seqs[i].pos = record.rank_at(seqs[i].pos).unwrap();
                i += 1;
            }
        }
    }

    fn advance(&self, seqs: &mut [Sequence]) {
        let mut i = 0;
        while i < seqs.len() {
            let curr = seqs[i].next;
            let record = self.record(curr);
            while i < seqs.len() && seqs[i].next == curr {
                seqs[i].curr = curr;
                seqs[i].next = record.successor_at(seqs[i].pos).unwrap();
                i += 1;
            }
        }
    }
}

//-----------------------------------------------------------------------------

// Support functions for index construction.
impl DynamicGBWT {
    // Process ranges of sequences sharing the same 'curr' node.
    // - Add the outgoing edge (curr, next) if necessary.
    // - Add sample (offset, id) if iteration % SAMPLE_INTERVAL == 0 or next == ENDMARKER.
    // - Insert the 'next' node into position 'offset' in the body.
    // - Set 'offset' to rank(next) within the record.
    // - Update the predecessor count of 'curr' in the incoming edges of 'next'.
    //
    // We do not maintain incoming edges to the endmarker, because it can be expensive
    // and because searching with the endmarker does not work in a multi-string BWT.
    fn update_records(&mut self, seqs: &mut [Sequence], iteration: usize) {
        let mut i = 0;
        while i < seqs.len() {
            let curr = seqs[i].curr;
            let comp = self.comp(curr);
            let mut new_body = RunMerger::new(self.bwt[comp].outdegree());
            let mut new_samples: Vec<(usize, usize)> = Vec::new();
            let mut run_iter = mem::take(&mut self.bwt[comp].body).into_iter();
            let mut run = run_iter.next();
            let mut sample_iter = mem::take(&mut self.bwt[comp].ids).into_iter();
            let mut sample = sample_iter.next();
            let mut insert_count = 0;
            while i < seqs.len() && seqs[i].curr == curr {
                let next = seqs[i].next;
                let outrank = match self.bwt[comp].edge_to(next) {
                    Some(rank) => rank,
                    None => {
                        // Add the edge (curr, next).
                        let rank = self.bwt[comp].outdegree();
                        self.bwt[comp].outgoing.push((next, 0));
                        new_body.add_edge();
                        rank
                    },
                };
                // Add old runs until 'offset', splitting the last run if necessary.
                while new_body.size() < seqs[i].offset {
                    let (rank, len) = run.unwrap();
                    let needed = seqs[i].offset - new_body.size();
                    if len <= needed {
                        new_body.insert_run((rank, len));
                        run = run_iter.next();
                    } else {
                        new_body.insert_run((rank, needed));
                        run = Some((rank, len - needed));
                    }
                }
                // Add old samples until 'offset'.
                while let Some((sample_offset, sample_id)) = sample {
                    if sample_offset + insert_count >= seqs[i].offset {
                        break;
                    }
                    new_samples.push((sample_offset + insert_count, sample_id));
                    sample = sample_iter.next();
                }
                // Sample the sequence id.
                if iteration % Self::SAMPLE_INTERVAL == 0 || next == ENDMARKER {
                    new_samples.push((seqs[i].offset, seqs[i].id));
                }
                seqs[i].offset = new_body.count(outrank); // rank(next) within the record.
                new_body.insert(outrank);
                insert_count += 1;
                if next != ENDMARKER {
                    let next_comp = self.comp(next);
                    self.bwt[next_comp].increment(curr);
                }
                i += 1;
            }
            // Add the rest of the old body.
            while let Some(r) = run {
                new_body.insert_run(r);
                run = run_iter.next();
            }
            // Add the rest of the old samples.
            while let Some((sample_offset, sample_id)) = sample {
                new_samples.push((sample_offset + insert_count, sample_id));
                sample = sample_iter.next();
            }
            new_body.flush();
            let record = &mut self.bwt[comp];
            record.body = mem::take(&mut new_body.runs);
            record.body_size = new_body.total_size;
            record.ids = new_samples;
        }
        self.header.payload_mut().size += seqs.len();
    }

    // Rebuild the edge offsets in the outgoing edges to each 'next' node. The offsets
    // will be valid after the insertions in the next iteration.
    //
    // Then add the rebuilt edge offsets to sequence offsets, which have been
    // rank(next) within the current record until now.
    fn rebuild_offsets(&mut self, seqs: &mut [Sequence]) {
        let mut next = self.alphabet_size();
        for i in 0..seqs.len() {
            if seqs[i].next == next {
                continue;
            }
            next = seqs[i].next;
            let incoming = self.record(next).incoming.clone();
            let mut offset = 0;
            for (from, count) in incoming {
                let comp = self.comp(from);
                let predecessor = &mut self.bwt[comp];
                let rank = predecessor.edge_to(next).unwrap();
                predecessor.outgoing[rank].1 = offset;
                offset += count;
            }
        }

        for seq in seqs.iter_mut() {
            let current = self.record(seq.curr);
            seq.offset += current.offset(current.edge_to(seq.next).unwrap());
        }
    }
}

// Sort the sequences for the next iteration and remove the ones that have reached
// the endmarker. Note that sorting by (next, curr, offset) now is equivalent to
// sorting by (curr, offset) in the next iteration.
fn sort_sequences(seqs: &mut Vec<Sequence>) {
    seqs.sort_by_key(|seq| (seq.next, seq.curr, seq.offset));
    let head = seqs.iter().take_while(|seq| seq.next == ENDMARKER).count();
    if head > 0 {
        seqs.drain(..head);
    }
}

// Insert the sequences from the source to the GBWT. Maintains an invariant that
// the sequences are sorted by (curr, offset). Returns the number of iterations.
fn insert_sequences<S: InsertionSource + ?Sized>(gbwt: &mut DynamicGBWT, seqs: &mut Vec<Sequence>, source: &S) -> usize {
    let mut iteration = 0;
    loop {
        iteration += 1;
        gbwt.update_records(seqs, iteration); // Insert the next nodes into the GBWT.
        source.next_positions(seqs); // Determine the next position for each sequence.
        sort_sequences(seqs); // Sort for the next iteration and remove the ones that have finished.
        if seqs.is_empty() {
            return iteration;
        }
        gbwt.rebuild_offsets(seqs); // Rebuild offsets in outgoing edges and sequences.
        source.advance(seqs); // Move the sequences to the next position.
    }
}

// Insert a batch of sequences with ids starting from 'start_id'. The ids are
// assigned from the number of sequences in the index, which the callers keep
// equal to 'start_id'.
pub(crate) fn insert_batch(index: &mut DynamicGBWT, text: &[usize], start_id: usize) {
    if text.is_empty() {
        return;
    }
    assert!(*text.last().unwrap() == ENDMARKER, "insert_batch: The text must end with an endmarker");
    debug_assert_eq!(start_id, index.sequences(), "insert_batch: Batch start id does not match the number of sequences");

    // Find the start of each sequence and initialize the sequence cursors at the
    // endmarker node. Increase alphabet size and decrease offset if necessary.
    let mut min_node = if index.is_empty() { usize::MAX } else { index.alphabet_offset() + 1 };
    let mut max_node = if index.is_empty() { 0 } else { index.alphabet_size() - 1 };
    let mut seqs: Vec<Sequence> = Vec::new();
    let mut seq_start = true;
    for i in 0..text.len() {
        if seq_start {
            seqs.push(Sequence::from_text(text, i, index.sequences()));
            index.header.payload_mut().sequences += 1;
            seq_start = false;
        }
        if text[i] == ENDMARKER {
            seq_start = true;
        } else {
            min_node = cmp::min(min_node, text[i]);
        }
        max_node = cmp::max(max_node, text[i]);
    }
    if max_node == 0 {
        min_node = 1; // No real nodes, setting offset to 0.
    }
    index.resize(min_node - 1, max_node + 1);

    insert_sequences(index, &mut seqs, text);
}

//-----------------------------------------------------------------------------

/// An iterator over a sequence in [`DynamicGBWT`].
///
/// The type of `Item` is [`usize`].
///
/// # Examples
///
/// ```
/// use dynamic_gbwt::{DynamicGBWT, ENDMARKER};
///
/// let mut index = DynamicGBWT::new();
/// index.insert(&[21, 22, 24, ENDMARKER]);
///
/// let path: Vec<usize> = index.sequence(0).collect();
/// assert_eq!(path, vec![21, 22, 24]);
/// ```
#[derive(Clone, Debug)]
pub struct SequenceIter<'a> {
    parent: &'a DynamicGBWT,
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
