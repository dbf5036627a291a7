//! A buffered construction interface for the dynamic GBWT.
//!
//! [`GBWTBuilder`] accepts one sequence at a time and collects them into a
//! node buffer. When the buffer fills up, the batch is inserted into the index
//! on a background thread while the caller fills the next buffer.

use crate::ENDMARKER;
use crate::dynamic::{DynamicGBWT, insert_batch};
use crate::support;

use std::mem;
use std::thread::JoinHandle;
use std::thread;


//-----------------------------------------------------------------------------

/// A double-buffered batch inserter for building a [`DynamicGBWT`].
///
/// The builder owns the index and two node buffers of equal capacity. At any
/// moment, either the caller owns the input buffer and the worker thread owns
/// the index and the construction buffer, or the worker is idle and the builder
/// owns everything. The buffers and the index are handed over by moving them
/// into and out of the worker, so the two threads never share data.
///
/// Sequence identifiers are assigned in the order in which the sequences are
/// inserted into the builder, across all batches.
///
/// # Examples
///
/// ```
/// use dynamic_gbwt::{DynamicGBWT, GBWTBuilder};
///
/// let mut builder = GBWTBuilder::new(1024);
/// builder.insert(&[2, 3, 4], false);
/// builder.insert(&[2, 3, 5], false);
/// builder.finish();
///
/// let mut index = DynamicGBWT::new();
/// builder.swap_index(&mut index);
/// assert_eq!(index.sequences(), 2);
/// assert_eq!(index.len(), 8);
/// ```
pub struct GBWTBuilder {
    // The index is `None` exactly when the worker owns it.
    index: Option<DynamicGBWT>,
    input_buffer: Vec<usize>,
    construction_buffer: Vec<usize>,
    buffer_size: usize,
    inserted_sequences: usize,
    batch_sequences: usize,
    worker: Option<JoinHandle<(DynamicGBWT, Vec<usize>)>>,
}

impl GBWTBuilder {
    /// Creates a new builder with an empty index.
    ///
    /// # Arguments
    ///
    /// * `buffer_size`: Buffer capacity in nodes, including the endmarkers.
    pub fn new(buffer_size: usize) -> Self {
        GBWTBuilder {
            index: Some(DynamicGBWT::new()),
            input_buffer: Vec::with_capacity(buffer_size),
            construction_buffer: Vec::with_capacity(buffer_size),
            buffer_size: buffer_size,
            inserted_sequences: 0,
            batch_sequences: 0,
            worker: None,
        }
    }

    /// Swaps the index in the builder with the given index.
    ///
    /// This is used for extending an existing index and for getting the final
    /// index out of the builder. Call before the first insertion or after
    /// [`GBWTBuilder::finish`]; a running worker is joined first.
    pub fn swap_index(&mut self, another: &mut DynamicGBWT) {
        self.join_worker();
        mem::swap(self.index.as_mut().unwrap(), another);
        self.inserted_sequences = self.index.as_ref().unwrap().sequences();
    }

    /// Inserts a new sequence into the current batch, flushing the batch first if necessary.
    ///
    /// If `both_orientations` is set, the reverse orientation of the sequence is
    /// inserted as well (see [`support::reverse_path`]).
    /// Returns `false` and reports on stderr if the sequence does not fit into an
    /// empty buffer; other sequences are unaffected.
    pub fn insert(&mut self, sequence: &[usize], both_orientations: bool) -> bool {
        let mut space_required = sequence.len() + 1;
        if both_orientations {
            space_required *= 2;
        }
        if space_required > self.buffer_size {
            eprintln!("GBWTBuilder::insert(): Sequence is too long for the buffer, skipping");
            return false;
        }

        // Flush the buffer if necessary.
        if self.input_buffer.len() + space_required > self.buffer_size {
            self.flush();
        }

        // Forward orientation.
        self.input_buffer.extend_from_slice(sequence);
        self.input_buffer.push(ENDMARKER);
        self.batch_sequences += 1;

        // Reverse orientation.
        if both_orientations {
            self.input_buffer.extend(support::reverse_path(sequence));
            self.input_buffer.push(ENDMARKER);
            self.batch_sequences += 1;
        }

        true
    }

    /// Starts the insertion of the current batch and clears the input buffer.
    ///
    /// Blocks until the previous batch has been inserted.
    pub fn flush(&mut self) {
        // Wait for the construction thread to finish.
        self.join_worker();

        // Swap the input buffer and the construction buffer.
        mem::swap(&mut self.input_buffer, &mut self.construction_buffer);
        self.input_buffer.clear();

        // Launch a new construction thread if necessary.
        if !self.construction_buffer.is_empty() {
            let mut index = self.index.take().unwrap();
            let batch = mem::take(&mut self.construction_buffer);
            let start_id = self.inserted_sequences;
            self.inserted_sequences += self.batch_sequences;
            self.batch_sequences = 0;
            self.worker = Some(thread::spawn(move || {
                insert_batch(&mut index, &batch, start_id);
                (index, batch)
            }));
        }
    }

    /// Finishes the construction.
    ///
    /// Flushes the remaining sequences, waits for the worker to finish, and sorts
    /// the outgoing edges in the index. The index can then be retrieved with
    /// [`GBWTBuilder::swap_index`].
    pub fn finish(&mut self) {
        // Flush the buffer if necessary.
        self.flush();

        // Wait for the construction thread to finish.
        self.join_worker();

        // Finally recode the index to make it serializable.
        self.index.as_mut().unwrap().recode();
    }

    // Waits for the worker to finish and takes back the index and the buffer.
    fn join_worker(&mut self) {
        if let Some(handle) = self.worker.take() {
            let (index, mut buffer) = handle.join().unwrap();
            buffer.clear();
            self.index = Some(index);
            self.construction_buffer = buffer;
        }
    }
}

impl Drop for GBWTBuilder {
    fn drop(&mut self) {
        // Wait for the construction thread to finish.
        self.join_worker();
    }
}

//-----------------------------------------------------------------------------
