use super::*;

use simple_sds::bits;

use rand::Rng;
use rand::rngs::ThreadRng;

//-----------------------------------------------------------------------------

#[test]
fn node_encoding() {
    for id in 0..8 {
        let forward = encode_node(id, false);
        let reverse = encode_node(id, true);
        assert_ne!(forward, reverse, "Node {} has the same encoding in both orientations", id);
        assert_eq!(node_id(forward), id, "Invalid node id for node {} (forward)", id);
        assert_eq!(node_id(reverse), id, "Invalid node id for node {} (reverse)", id);
        assert!(!node_is_reverse(forward), "Node {} (forward) is reverse", id);
        assert!(node_is_reverse(reverse), "Node {} (reverse) is not reverse", id);
        assert_eq!(flip_node(forward), reverse, "Invalid flip for node {} (forward)", id);
        assert_eq!(flip_node(reverse), forward, "Invalid flip for node {} (reverse)", id);
    }
}

#[test]
fn path_encoding() {
    for id in 0..8 {
        let forward = encode_path(id, false);
        let reverse = encode_path(id, true);
        assert_ne!(forward, reverse, "Path {} has the same encoding in both orientations", id);
        assert_eq!(path_id(forward), id, "Invalid path id for path {} (forward)", id);
        assert_eq!(path_id(reverse), id, "Invalid path id for path {} (reverse)", id);
        assert!(!path_is_reverse(forward), "Path {} (forward) is reverse", id);
        assert!(path_is_reverse(reverse), "Path {} (reverse) is not reverse", id);
        assert_eq!(flip_path(forward), reverse, "Invalid flip for path {} (forward)", id);
        assert_eq!(flip_path(reverse), forward, "Invalid flip for path {} (reverse)", id);
    }
}

#[test]
fn reverse_paths() {
    let empty: Vec<usize> = Vec::new();
    assert_eq!(reverse_path(&empty), empty, "Invalid reverse path for an empty path");

    let path = vec![
        encode_node(1, false),
        encode_node(2, true),
        encode_node(4, false),
    ];
    let truth = vec![
        encode_node(4, true),
        encode_node(2, false),
        encode_node(1, true),
    ];
    assert_eq!(reverse_path(&path), truth, "Invalid reverse path");
    assert_eq!(reverse_path(&truth), path, "Reversing a path twice is not an identity");
}

#[test]
fn range_intersection() {
    assert_eq!(intersect(&(0..4), &(2..6)), 2..4, "Invalid overlapping intersection");
    assert_eq!(intersect(&(2..6), &(0..4)), 2..4, "Intersection is not symmetric");
    assert_eq!(intersect(&(0..2), &(2..4)).len(), 0, "Invalid adjacent intersection");
    assert_eq!(intersect(&(0..2), &(4..6)).len(), 0, "Invalid disjoint intersection");
    assert_eq!(intersect(&(0..6), &(2..4)), 2..4, "Invalid nested intersection");
}

//-----------------------------------------------------------------------------

// Generate a random value, with the width (almost) geometrically distributed (p = 0.5) in blocks of `w` bits.
fn generate_value(rng: &mut ThreadRng, w: usize) -> usize {
    let len = (rng.gen::<usize>() | 1).leading_zeros() as usize; // 0 to 63
    let width = cmp::min((len + 1) * w, bits::WORD_BITS);
    let mask = bits::low_set(width) as usize;
    rng.gen::<usize>() & mask
}

// Generate `n` random values, with the widths (almost) geometrically distributed (p = 0.5) in blocks of `w` bits.
fn generate_values(n: usize, w: usize) -> Vec<usize> {
    let mut result = Vec::with_capacity(n);
    let mut rng = rand::thread_rng();
    for _ in 0..n {
        result.push(generate_value(&mut rng, w));
    }
    result
}

#[test]
fn random_byte_code() {
    let values = generate_values(647, 4);
    let mut encoder = ByteCode::new();
    assert_eq!(encoder.len(), 0, "Newly created encoder contains bytes");
    assert!(encoder.is_empty(), "Newly created encoder is not empty");
    for value in values.iter() {
        encoder.write(*value);
    }
    assert!(encoder.len() >= values.len(), "The encoding is shorter than the number of values");
    assert!(!encoder.is_empty(), "The encoding is empty");

    let mut iter = ByteCodeIter::new(encoder.as_ref());
    assert_eq!(iter.offset(), 0, "Newly created iterator is not at offset 0");
    let mut i = 0;
    while let Some(value) = iter.next() {
        assert!(i < values.len(), "Too many values from the iterator");
        assert_eq!(value, values[i], "Invalid value {}", i);
        i += 1;
    }
    assert_eq!(i, values.len(), "Too few values from the iterator");
    assert_eq!(iter.offset(), encoder.len(), "Iterator did not consume all bytes");
}

//-----------------------------------------------------------------------------

// Generate `n` random runs from an alphabet of size `sigma`.
// The widths of run lengths are (almost) geometrically distributed (p = 0.5) in blocks of `w` bits.
fn generate_runs(n: usize, sigma: usize, w: usize) -> Vec<(usize, usize)> {
    let sigma = if sigma == 0 { usize::MAX } else { sigma };
    let mut result = Vec::with_capacity(n);
    let mut rng = rand::thread_rng();
    for _ in 0..n {
        let c: usize = rng.gen_range(0..sigma);
        let len = generate_value(&mut rng, w) + 1;
        result.push((c, len));
    }
    result
}

fn encode_runs(encoder: &mut RLE, runs: &[(usize, usize)], name: &str) {
    assert_eq!(encoder.len(), 0, "[{}]: Newly created encoder contains runs", name);
    assert!(encoder.is_empty(), "[{}]: Newly created encoder is not empty", name);
    for (c, len) in runs.iter() {
        encoder.write(*c, *len);
    }
    assert!(encoder.len() >= runs.len(), "[{}]: The encoding is shorter than the number of runs", name);
    assert!(!encoder.is_empty(), "[{}]: The encoding is empty", name);
}

fn check_runs(encoder: &RLE, truth: &[(usize, usize)], sigma: usize, name: &str) {
    let mut iter = RLEIter::with_sigma(encoder.as_ref(), sigma);
    assert_eq!(iter.offset(), 0, "[{}]: Newly created iterator is not at offset 0", name);
    let mut i = 0;
    while let Some(run) = iter.next() {
        assert!(i < truth.len(), "[{}]: Too many runs from the iterator", name);
        assert_eq!(run, truth[i], "[{}]: Invalid run {}", name, i);
        i += 1;
    }
    assert_eq!(i, truth.len(), "[{}]: Too few runs from the iterator", name);
    assert_eq!(iter.offset(), encoder.len(), "[{}]: Iterator did not consume all bytes", name);
}

fn test_rle(n: usize, sigma: usize, name: &str) {
    let runs = generate_runs(n, sigma, 4);
    let mut encoder = RLE::with_sigma(sigma);
    encode_runs(&mut encoder, &runs, name);
    check_runs(&encoder, &runs, sigma, name);
}

fn add_run(encoder: &mut RLE, truth: &mut Vec<(usize, usize)>, len: usize, bytes: usize, name: &str) {
    let old_len = encoder.len();
    encoder.write(encoder.sigma() - 1, len);
    truth.push((encoder.sigma() - 1, len));
    assert_eq!(encoder.len() - old_len, bytes, "[{}]: Run of length {} not encoded using {} byte(s)", name, len, bytes);
}

fn test_threshold(sigma: usize, name: &str) {
    let (_, threshold) = RLE::sanitize(sigma);
    let mut encoder = RLE::with_sigma(sigma);
    let mut truth: Vec<(usize, usize)> = Vec::new();
    if threshold > 1 {
        add_run(&mut encoder, &mut truth, threshold - 1, 1, name);
    }
    if threshold > 0 {
        add_run(&mut encoder, &mut truth, threshold, 2, name);
    }
    check_runs(&encoder, &truth, sigma, name);
}

#[test]
fn runs_with_sigma() {
    test_rle(591, 4, "sigma == 4");
    test_rle(366, 254, "sigma == 254");
    test_rle(421, 255, "sigma == 255");
    test_rle(283, 14901, "sigma == 14901");
    test_rle(330, 0, "sigma == 0");
}

#[test]
fn run_length_thresholds() {
    test_threshold(1, "sigma == 1");
    test_threshold(4, "sigma == 4");
    test_threshold(5, "sigma == 5");
    test_threshold(128, "sigma == 128");
    test_threshold(129, "sigma == 129");
    test_threshold(254, "sigma == 254");
}

#[test]
fn gbwt_record() {
    // Original data for the record.
    let sigma = 4;
    let edges: Vec<(usize, usize)> = vec![(0, 0), (13, 7), (22, 1), (44, 0)];
    let runs = generate_runs(8, sigma, 4);

    // Encode the record.
    let mut encoder = RLE::with_sigma(sigma);
    encoder.write_int(sigma);
    let mut prev = 0;
    for (node, offset) in edges.iter() {
        encoder.write_int(*node - prev); encoder.write_int(*offset);
        prev = *node;
    }
    for (c, len) in runs.iter() {
        encoder.write(*c, *len);
    }

    // Decompress the record.
    let mut iter = RLEIter::with_sigma(encoder.as_ref(), sigma);
    assert_eq!(iter.offset(), 0, "Newly created iterator is not at offset 0");
    assert_eq!(iter.int(), Some(sigma), "Invalid alphabet size in the record");
    let mut prev = 0;
    for i in 0..sigma {
        let node = iter.int().unwrap() + prev;
        assert_eq!(node, edges[i].0, "Invalid successor node {}", i);
        prev = node;
        assert_eq!(iter.int(), Some(edges[i].1), "Invalid record offset for edge {}", i);
    }
    let mut decoded: Vec<(usize, usize)> = Vec::new();
    while let Some(run) = iter.next() {
        decoded.push(run);
    }
    assert_eq!(decoded.len(), runs.len(), "Invalid number of runs");
    for i in 0..decoded.len() {
        assert_eq!(decoded[i], runs[i], "Invalid run {}", i);
    }
    assert_eq!(iter.offset(), encoder.len(), "Iterator did not consume all bytes");
}

//-----------------------------------------------------------------------------
