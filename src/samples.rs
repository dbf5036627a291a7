//! Compressed document array samples.
//!
//! [`DASamples`] stores the sequence identifier samples of all records in a
//! compressed form for serialization. The global BWT offset of each sample is
//! marked in a sparse bit vector, another sparse bit vector marks the records
//! that contain samples, and a third one marks the starting offsets of those
//! records. The sample values are stored in an integer vector.

use crate::record::DynamicRecord;

use simple_sds::int_vector::IntVector;
use simple_sds::ops::{Vector, Access, Push, BitVec, Select};
use simple_sds::sparse_vector::{SparseVector, SparseBuilder};
use simple_sds::serialize::Serialize;
use simple_sds::bits;

use std::convert::TryFrom;
use std::io::{Error, ErrorKind};
use std::iter::FusedIterator;
use std::{cmp, io};


//-----------------------------------------------------------------------------

/// Sequence identifier samples for all records, in a compressed form.
///
/// # Examples
///
/// ```
/// use dynamic_gbwt::{DynamicGBWT, ENDMARKER};
/// use dynamic_gbwt::samples::DASamples;
///
/// let mut index = DynamicGBWT::new();
/// index.insert(&[2, 3, ENDMARKER, 4, 5, ENDMARKER]);
///
/// let samples = DASamples::from(index.as_ref());
/// assert_eq!(samples.len(), 2);
/// let decompressed: Vec<(usize, usize, usize)> = samples.iter().collect();
/// assert_eq!(decompressed, vec![(2, 0, 0), (4, 0, 1)]);
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DASamples {
    // Records that contain samples, over `0..records`.
    records: SparseVector,
    // Starting offsets of the sampled records, over `0..total_size`.
    ranges: SparseVector,
    // Sampled offsets, over `0..total_size`.
    offsets: SparseVector,
    // Sample values in offset order.
    ids: IntVector,
}

impl DASamples {
    /// Returns the number of samples.
    #[inline]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Returns `true` if there are no samples.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the number of records that contain samples.
    #[inline]
    pub fn sampled_records(&self) -> usize {
        self.records.count_ones()
    }

    /// Returns an iterator over the samples as (record id, record offset, sequence id).
    pub fn iter(&self) -> SampleIter {
        SampleIter {
            parent: self,
            next: 0,
            record_rank: 0,
        }
    }
}

impl From<&[DynamicRecord]> for DASamples {
    fn from(bwt: &[DynamicRecord]) -> Self {
        let total_size: usize = bwt.iter().map(|record| record.len()).sum();
        let sampled_records = bwt.iter().filter(|record| record.samples() > 0).count();
        let sample_count: usize = bwt.iter().map(|record| record.samples()).sum();

        let mut records = SparseBuilder::new(bwt.len(), sampled_records).unwrap();
        let mut ranges = SparseBuilder::new(total_size, sampled_records).unwrap();
        let mut offsets = SparseBuilder::new(total_size, sample_count).unwrap();
        let mut max_id = 0;
        let mut start = 0;
        for (comp, record) in bwt.iter().enumerate() {
            if record.samples() > 0 {
                unsafe {
                    records.set_unchecked(comp);
                    ranges.set_unchecked(start);
                }
                for &(offset, id) in record.ids.iter() {
                    unsafe { offsets.set_unchecked(start + offset); }
                    max_id = cmp::max(max_id, id);
                }
            }
            start += record.len();
        }

        let mut ids = IntVector::new(bits::bit_len(cmp::max(max_id, 1) as u64)).unwrap();
        for record in bwt.iter() {
            for &(_, id) in record.ids.iter() {
                ids.push(id as u64);
            }
        }

        DASamples {
            records: SparseVector::try_from(records).unwrap(),
            ranges: SparseVector::try_from(ranges).unwrap(),
            offsets: SparseVector::try_from(offsets).unwrap(),
            ids: ids,
        }
    }
}

impl Serialize for DASamples {
    fn serialize_header<T: io::Write>(&self, _: &mut T) -> io::Result<()> {
        Ok(())
    }

    fn serialize_body<T: io::Write>(&self, writer: &mut T) -> io::Result<()> {
        self.records.serialize(writer)?;
        self.ranges.serialize(writer)?;
        self.offsets.serialize(writer)?;
        self.ids.serialize(writer)?;
        Ok(())
    }

    fn load<T: io::Read>(reader: &mut T) -> io::Result<Self> {
        let records = SparseVector::load(reader)?;
        let ranges = SparseVector::load(reader)?;
        let offsets = SparseVector::load(reader)?;
        let ids = IntVector::load(reader)?;
        if ranges.count_ones() != records.count_ones() {
            return Err(Error::new(ErrorKind::InvalidData, "DASamples: Record / range count mismatch"));
        }
        if ids.len() != offsets.count_ones() {
            return Err(Error::new(ErrorKind::InvalidData, "DASamples: Offset / sample count mismatch"));
        }
        if ranges.len() != offsets.len() {
            return Err(Error::new(ErrorKind::InvalidData, "DASamples: Range / offset universe mismatch"));
        }
        Ok(DASamples {
            records: records,
            ranges: ranges,
            offsets: offsets,
            ids: ids,
        })
    }

    fn size_in_elements(&self) -> usize {
        self.records.size_in_elements() + self.ranges.size_in_elements() + self.offsets.size_in_elements() + self.ids.size_in_elements()
    }
}

//-----------------------------------------------------------------------------

/// A read-only iterator over [`DASamples`].
///
/// The type of `Item` is `(`[`usize`]`, `[`usize`]`, `[`usize`]`)`, interpreted as
/// (record id, record offset, sequence id). The samples are visited in record order.
#[derive(Clone, Debug)]
pub struct SampleIter<'a> {
    parent: &'a DASamples,
    // The first sample we have not visited.
    next: usize,
    // Rank of the sampled record containing the previous sample.
    record_rank: usize,
}

impl<'a> Iterator for SampleIter<'a> {
    type Item = (usize, usize, usize);

    fn next(&mut self) -> Option<Self::Item> {
        if self.next >= self.parent.len() {
            return None;
        }
        let (_, offset) = self.parent.offsets.select_iter(self.next).next().unwrap();

        // Advance to the sampled record containing the offset.
        while self.record_rank + 1 < self.parent.sampled_records() {
            let (_, next_start) = self.parent.ranges.select_iter(self.record_rank + 1).next().unwrap();
            if next_start <= offset {
                self.record_rank += 1;
            } else {
                break;
            }
        }

        let (_, comp) = self.parent.records.select_iter(self.record_rank).next().unwrap();
        let (_, start) = self.parent.ranges.select_iter(self.record_rank).next().unwrap();
        let id = self.parent.ids.get(self.next) as usize;
        self.next += 1;
        Some((comp, offset - start, id))
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.parent.len() - self.next;
        (remaining, Some(remaining))
    }
}

impl<'a> ExactSizeIterator for SampleIter<'a> {}

impl<'a> FusedIterator for SampleIter<'a> {}

//-----------------------------------------------------------------------------
