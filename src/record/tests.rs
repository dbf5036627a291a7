use super::*;

//-----------------------------------------------------------------------------

// Record for a node with two successors: positions 0..2 go to node 5,
// position 2 to node 3, and positions 3..5 back to node 5.
fn create_record() -> DynamicRecord {
    DynamicRecord {
        body_size: 5,
        outgoing: vec![(5, 2), (3, 0)],
        body: vec![(0, 2), (1, 1), (0, 2)],
        incoming: vec![(2, 3), (4, 2)],
        ids: vec![(1, 7), (4, 3)],
    }
}

#[test]
fn empty_record() {
    let record = DynamicRecord::new();
    assert_eq!(record.len(), 0, "Newly created record has non-zero length");
    assert!(record.is_empty(), "Newly created record is not empty");
    assert_eq!(record.outdegree(), 0, "Newly created record has outgoing edges");
    assert_eq!(record.indegree(), 0, "Newly created record has incoming edges");
    assert_eq!(record.runs(), 0, "Newly created record has runs");
    assert_eq!(record.samples(), 0, "Newly created record has samples");
    assert_eq!(record.lf(0), None, "Got an lf() result from an empty record");
    assert_eq!(record.edge_to(3), None, "Got an edge from an empty record");
}

#[test]
fn statistics() {
    let record = create_record();
    assert_eq!(record.len(), 5, "Invalid record length");
    assert!(!record.is_empty(), "Invalid emptiness");
    assert_eq!(record.outdegree(), 2, "Invalid outdegree");
    assert_eq!(record.indegree(), 2, "Invalid indegree");
    assert_eq!(record.runs(), 3, "Invalid number of runs");
    assert_eq!(record.samples(), 2, "Invalid number of samples");
}

#[test]
fn edges() {
    let record = create_record();
    assert_eq!(record.successor(0), 5, "Invalid successor 0");
    assert_eq!(record.offset(0), 2, "Invalid offset 0");
    assert_eq!(record.successor(1), 3, "Invalid successor 1");
    assert_eq!(record.offset(1), 0, "Invalid offset 1");
    assert_eq!(record.edge_to(5), Some(0), "Invalid edge to node 5");
    assert_eq!(record.edge_to(3), Some(1), "Invalid edge to node 3");
    assert_eq!(record.edge_to(4), None, "Got an edge to node 4");
}

#[test]
fn incoming_edges() {
    let mut record = create_record();
    record.increment(2);
    assert_eq!(record.incoming, vec![(2, 4), (4, 2)], "Invalid counts after incrementing an existing edge");
    record.increment(3);
    assert_eq!(record.incoming, vec![(2, 4), (3, 1), (4, 2)], "New incoming edge was not sorted correctly");
    record.add_incoming((1, 5));
    assert_eq!(record.incoming, vec![(1, 5), (2, 4), (3, 1), (4, 2)], "Added incoming edge was not sorted correctly");
}

#[test]
fn record_lf() {
    let record = create_record();
    let truth: Vec<(usize, usize)> = vec![(5, 2), (5, 3), (3, 0), (5, 4), (5, 5)];
    for i in 0..record.len() {
        assert_eq!(record.lf(i), Some(truth[i]), "Invalid lf({})", i);
        assert_eq!(record.rank_at(i), Some(truth[i].1), "Invalid rank_at({})", i);
        assert_eq!(record.successor_at(i), Some(truth[i].0), "Invalid successor_at({})", i);
    }
    assert_eq!(record.lf(record.len()), None, "Got an lf() result past the end");
    assert_eq!(record.rank_at(record.len()), None, "Got a rank_at() result past the end");
}

#[test]
fn record_run_lf() {
    let record = create_record();
    // (result, last offset in the same run)
    let truth: Vec<((usize, usize), usize)> = vec![
        ((5, 2), 1), ((5, 3), 1),
        ((3, 0), 2),
        ((5, 4), 4), ((5, 5), 4),
    ];
    for i in 0..record.len() {
        assert_eq!(record.run_lf(i), Some(truth[i]), "Invalid run_lf({})", i);
    }
    assert_eq!(record.run_lf(record.len()), None, "Got a run_lf() result past the end");
}

#[test]
fn lf_at_endmarker() {
    let record = DynamicRecord {
        body_size: 2,
        outgoing: vec![(ENDMARKER, 0), (4, 1)],
        body: vec![(1, 1), (0, 1)],
        incoming: vec![(3, 2)],
        ids: vec![(1, 0)],
    };
    assert_eq!(record.lf(0), Some((4, 1)), "Invalid lf() to a real node");
    assert_eq!(record.lf(1), None, "Got an lf() result through the endmarker");
    assert_eq!(record.rank_at(1), Some(0), "Invalid rank_at() at the endmarker");
    assert_eq!(record.successor_at(1), Some(ENDMARKER), "Invalid successor_at() at the endmarker");
}

#[test]
fn record_follow() {
    let record = create_record();
    assert_eq!(record.follow(&(0..5), 5), Some(2..6), "Invalid follow() over the full range");
    assert_eq!(record.follow(&(0..5), 3), Some(0..1), "Invalid follow() to the middle run");
    assert_eq!(record.follow(&(1..4), 5), Some(3..5), "Invalid follow() over a partial range");
    assert_eq!(record.follow(&(2..3), 5), None, "Got a follow() result from a non-matching range");
    assert_eq!(record.follow(&(0..0), 5), None, "Got a follow() result from an empty range");
    assert_eq!(record.follow(&(0..5), 7), None, "Got a follow() result to a nonexistent node");
    assert_eq!(record.follow(&(0..5), ENDMARKER), None, "Got a follow() result to the endmarker");
}

#[test]
fn samples() {
    let record = create_record();
    assert_eq!(record.next_sample(0), 0, "Invalid first sample at offset 0");
    assert_eq!(record.next_sample(1), 0, "Invalid first sample at offset 1");
    assert_eq!(record.next_sample(2), 1, "Invalid first sample at offset 2");
    assert_eq!(record.next_sample(5), 2, "Invalid first sample past the end");
    assert_eq!(record.sample_at(1), Some(7), "Invalid sample at offset 1");
    assert_eq!(record.sample_at(4), Some(3), "Invalid sample at offset 4");
    assert_eq!(record.sample_at(0), None, "Got a sample at an unsampled offset");
}

#[test]
fn recode_record() {
    let mut record = create_record();
    record.recode();
    assert_eq!(record.outgoing, vec![(3, 0), (5, 2)], "Outgoing edges were not sorted");
    assert_eq!(record.body, vec![(1, 2), (0, 1), (1, 2)], "Ranks in the body were not remapped");
    assert_eq!(record.len(), 5, "Record length changed in recode()");

    // The queries must give the same results after recoding.
    let truth: Vec<(usize, usize)> = vec![(5, 2), (5, 3), (3, 0), (5, 4), (5, 5)];
    for i in 0..record.len() {
        assert_eq!(record.lf(i), Some(truth[i]), "Invalid lf({}) after recode()", i);
    }

    // Recoding a sorted record is a no-op.
    let copy = record.clone();
    record.recode();
    assert_eq!(record, copy, "Recoding a sorted record changed it");
}

//-----------------------------------------------------------------------------

#[test]
fn empty_merger() {
    let mut merger = RunMerger::new(0);
    merger.flush();
    assert_eq!(merger.size(), 0, "Empty merger has non-zero size");
    assert_eq!(merger.runs(), 0, "Empty merger contains runs");
}

#[test]
fn merger_coalesces_runs() {
    let mut merger = RunMerger::new(3);
    merger.insert(0);
    merger.insert(0);
    merger.insert_run((1, 3));
    merger.insert(1);
    merger.insert(2);
    merger.insert_run((0, 2));
    merger.flush();

    assert_eq!(merger.size(), 9, "Invalid total size");
    assert_eq!(merger.runs, vec![(0, 2), (1, 4), (2, 1), (0, 2)], "Adjacent runs were not coalesced");
    assert_eq!(merger.count(0), 4, "Invalid count for rank 0");
    assert_eq!(merger.count(1), 4, "Invalid count for rank 1");
    assert_eq!(merger.count(2), 1, "Invalid count for rank 2");
}

#[test]
fn merger_add_edge() {
    let mut merger = RunMerger::new(1);
    merger.insert(0);
    merger.add_edge();
    merger.insert(1);
    merger.flush();
    assert_eq!(merger.count(1), 1, "Invalid count for an added rank");
    assert_eq!(merger.runs, vec![(0, 1), (1, 1)], "Invalid runs after adding an edge");
}

//-----------------------------------------------------------------------------
