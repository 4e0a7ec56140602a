//! End-to-end behavior of the vector store through its public API.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use ruvector_core::{
    BatchInsert, DistanceMetric, EventKind, FilterClause, FilterCondition, FilterOperator,
    GraphMatch, HybridQuery, Metadata, ResultSource, RuVectorConfig, RuVectorError, SearchQuery,
    StoreEvent, VectorEntry, VectorStore,
};
use serde_json::json;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};

fn make_store(dims: usize, metric: DistanceMetric) -> VectorStore {
    let store = VectorStore::with_seed(RuVectorConfig::new(dims).with_metric(metric), 1234);
    store.initialize().unwrap();
    store
}

fn make_entry(id: &str, vector: Vec<f32>) -> VectorEntry {
    VectorEntry::with_id(id, vector, Metadata::new())
}

fn result_ids(results: &[ruvector_core::SearchResult]) -> Vec<&str> {
    results.iter().map(|r| r.id.as_str()).collect()
}

fn random_vectors(n: usize, dims: usize, seed: u64) -> Vec<Vec<f32>> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..n)
        .map(|_| (0..dims).map(|_| rng.gen_range(-1.0f32..1.0)).collect())
        .collect()
}

// ── scenarios ──

#[test]
fn scenario_a_cosine_top_two() {
    let store = make_store(4, DistanceMetric::Cosine);
    store.insert(make_entry("x", vec![1.0, 0.0, 0.0, 0.0])).unwrap();
    store.insert(make_entry("y", vec![0.0, 1.0, 0.0, 0.0])).unwrap();
    store.insert(make_entry("z", vec![1.0, 0.0, 0.0, 0.001])).unwrap();

    let results = store
        .search(&SearchQuery::new(vec![1.0, 0.0, 0.0, 0.0], 2))
        .unwrap();
    assert_eq!(result_ids(&results), vec!["x", "z"]);
    assert!((results[0].score - 1.0).abs() < 1e-6);
}

#[test]
fn scenario_b_batch_skips_repeated_ids() {
    let store = make_store(4, DistanceMetric::Euclidean);
    let entries: Vec<VectorEntry> = (0..100)
        .map(|i| {
            // The last ten ids repeat the first ten
            let n = if i >= 90 { i - 90 } else { i };
            make_entry(&format!("doc-{n}"), vec![i as f32, 1.0, 0.0, 0.0])
        })
        .collect();

    let result = store
        .batch_insert(BatchInsert::new(entries).skip_duplicates(true))
        .unwrap();
    assert_eq!(result.inserted_count, 90);
    assert_eq!(result.skipped_count, 10);
    assert!(result.errors.is_empty());
    assert_eq!(store.size(), 90);
    // Skipped entries leave the first version in place
    assert_eq!(store.get("doc-3").unwrap().unwrap().vector[0], 3.0);
    store.validate().unwrap();
}

#[test]
fn scenario_c_entry_point_deletion() {
    let store = make_store(2, DistanceMetric::Euclidean);
    for (i, id) in ["a", "b", "c", "d", "e"].iter().enumerate() {
        store.insert(make_entry(id, vec![i as f32, (i * i) as f32])).unwrap();
    }
    let before = store.get_stats().index_stats.entry_point.unwrap();
    assert!(store.delete(&before).unwrap());

    let after = store.get_stats().index_stats.entry_point.unwrap();
    assert_ne!(after, before);
    assert!(store.has(&after));
    assert_eq!(store.size(), 4);
    store.validate().unwrap();
}

#[test]
fn scenario_d_min_score_excludes_everything() {
    let store = make_store(2, DistanceMetric::Euclidean);
    store.insert(make_entry("only", vec![1.0, 0.0])).unwrap();

    let best = store.search(&SearchQuery::new(vec![0.0, 0.0], 1)).unwrap();
    assert!((best[0].score - 0.5).abs() < 1e-6);

    let results = store
        .search(&SearchQuery::new(vec![0.0, 0.0], 5).with_min_score(0.99))
        .unwrap();
    assert!(results.is_empty());
}

// ── properties ──

#[test]
fn round_trip_preserves_entries() {
    let store = make_store(3, DistanceMetric::Manhattan);
    let mut metadata = Metadata::new();
    metadata.insert("title".into(), json!("Attention Is All You Need"));
    metadata.insert("year".into(), json!(2017));
    metadata.insert("tags".into(), json!(["nlp", {"kind": "paper"}]));
    let entry = VectorEntry::with_id("paper", vec![0.25, -1.5, 3.0], metadata);

    store.insert(entry.clone()).unwrap();
    assert_eq!(store.get("paper").unwrap(), Some(entry));
}

#[test]
fn generated_ids_are_unique() {
    let store = make_store(2, DistanceMetric::Cosine);
    let ids: HashSet<String> = (0..20)
        .map(|i| {
            let entry = VectorEntry::new(vec![1.0, i as f32], Metadata::new());
            let id = entry.id.clone();
            store.insert(entry).unwrap();
            id
        })
        .collect();
    assert_eq!(ids.len(), 20);
    assert_eq!(store.size(), 20);
}

#[test]
fn deletion_is_complete() {
    let store = make_store(8, DistanceMetric::Euclidean);
    for (i, v) in random_vectors(200, 8, 5).into_iter().enumerate() {
        store.insert(make_entry(&format!("v{i}"), v)).unwrap();
    }
    for i in (0..200).step_by(4) {
        let id = format!("v{i}");
        assert!(store.delete(&id).unwrap());
        assert!(!store.has(&id));
    }
    // validate() rejects any link to a freed slot
    store.validate().unwrap();
    assert_eq!(store.size(), 150);

    let results = store
        .search(&SearchQuery::new(random_vectors(1, 8, 99).remove(0), 150))
        .unwrap();
    assert!(results.iter().all(|r| {
        let n: usize = r.id[1..].parse().unwrap();
        n % 4 != 0
    }));
}

#[test]
fn dimension_mismatch_leaves_store_unchanged() {
    let store = make_store(4, DistanceMetric::Cosine);
    store.insert(make_entry("a", vec![1.0, 0.0, 0.0, 0.0])).unwrap();
    let before = store.get_stats();

    let err = store.insert(make_entry("b", vec![1.0, 0.0])).unwrap_err();
    assert_eq!(
        err,
        RuVectorError::DimensionMismatch {
            expected: 4,
            actual: 2
        }
    );
    let err = store.insert(make_entry("a", vec![0.0; 5])).unwrap_err();
    assert!(matches!(err, RuVectorError::DimensionMismatch { actual: 5, .. }));
    assert!(store.search(&SearchQuery::new(vec![1.0; 3], 1)).is_err());

    assert_eq!(store.size(), 1);
    assert!(!store.has("b"));
    assert_eq!(store.get("a").unwrap().unwrap().vector, vec![1.0, 0.0, 0.0, 0.0]);
    assert_eq!(store.get_stats().last_updated, before.last_updated);
}

#[test]
fn empty_store_behavior() {
    let store = make_store(3, DistanceMetric::Cosine);
    assert!(store
        .search(&SearchQuery::new(vec![1.0, 0.0, 0.0], 10))
        .unwrap()
        .is_empty());
    assert_eq!(store.get_stats().total_vectors, 0);
    assert!(store.get_all_ids().is_empty());

    store.insert(make_entry("a", vec![1.0, 0.0, 0.0])).unwrap();
    store.clear().unwrap();
    assert_eq!(store.size(), 0);
    assert!(store.get_stats().index_stats.entry_point.is_none());
    assert!(store
        .search(&SearchQuery::new(vec![1.0, 0.0, 0.0], 10))
        .unwrap()
        .is_empty());
    store.validate().unwrap();
}

#[test]
fn recall_against_brute_force() {
    let dims = 16;
    let store = make_store(dims, DistanceMetric::Euclidean);
    let data = random_vectors(1000, dims, 42);
    for (i, v) in data.iter().enumerate() {
        store.insert(make_entry(&format!("v{i}"), v.clone())).unwrap();
    }

    let k = 10;
    let queries = random_vectors(50, dims, 7);
    let mut hits = 0;
    for q in &queries {
        let mut exact: Vec<(f32, usize)> = data
            .iter()
            .enumerate()
            .map(|(i, v)| (DistanceMetric::Euclidean.distance(q, v).unwrap(), i))
            .collect();
        exact.sort_by(|a, b| a.0.total_cmp(&b.0));
        let truth: HashSet<String> = exact[..k].iter().map(|&(_, i)| format!("v{i}")).collect();

        let found = store.search(&SearchQuery::new(q.clone(), k)).unwrap();
        hits += found.iter().filter(|r| truth.contains(&r.id)).count();
    }
    let recall = hits as f64 / (k * queries.len()) as f64;
    assert!(recall >= 0.9, "recall@10 = {recall:.3}");
}

fn assert_self_search(store: &VectorStore, data: &[Vec<f32>], live: impl Fn(usize) -> bool) {
    for (i, v) in data.iter().enumerate() {
        let found = store.search(&SearchQuery::new(v.clone(), 1)).unwrap();
        if live(i) {
            assert_eq!(result_ids(&found), vec![format!("v{i}").as_str()]);
        } else {
            assert!(found.iter().all(|r| r.id != format!("v{i}")));
        }
    }
}

#[test]
fn small_m_graphs_stay_fully_reachable() {
    // With efSearch above the store size, search covers everything reachable
    // from the entry point, so a vector missing itself means it was cut off
    let dims = 8;
    let data = random_vectors(500, dims, 99);
    for m in [2, 4] {
        let config = RuVectorConfig::new(dims)
            .with_metric(DistanceMetric::Euclidean)
            .with_hnsw_params(m, 64, 1024);
        let store = VectorStore::with_seed(config, 1);
        store.initialize().unwrap();
        for (i, v) in data.iter().enumerate() {
            store.insert(make_entry(&format!("v{i}"), v.clone())).unwrap();
        }
        store.validate().unwrap();
        assert_self_search(&store, &data, |_| true);

        for i in (0..data.len()).step_by(3) {
            assert!(store.delete(&format!("v{i}")).unwrap());
        }
        store.validate().unwrap();
        assert_self_search(&store, &data, |i| i % 3 != 0);
    }
}

#[test]
fn structured_conditions_filter_results() {
    let store = make_store(2, DistanceMetric::Euclidean);
    for i in 0..40 {
        let mut metadata = Metadata::new();
        metadata.insert("year".into(), json!(2000 + i));
        metadata.insert("lang".into(), json!(if i % 2 == 0 { "en" } else { "de" }));
        store
            .insert(VectorEntry::with_id(format!("d{i:02}"), vec![i as f32, 0.0], metadata))
            .unwrap();
    }
    let conditions = FilterClause {
        must: vec![FilterCondition::new("year", FilterOperator::Gte, json!(2030))],
        must_not: vec![FilterCondition::new("lang", FilterOperator::Eq, json!("de"))],
    };
    let results = store
        .search(&SearchQuery::new(vec![0.0, 0.0], 3).with_conditions(conditions))
        .unwrap();
    assert_eq!(result_ids(&results), vec!["d30", "d32", "d34"]);
}

// ── hybrid & events ──

#[test]
fn hybrid_reciprocal_rank_marks_sources() {
    let store = make_store(2, DistanceMetric::Euclidean);
    for (i, id) in ["a", "b", "c"].iter().enumerate() {
        store.insert(make_entry(id, vec![i as f32, 0.0])).unwrap();
    }
    let backend = |_: &serde_json::Value| -> ruvector_core::Result<Vec<GraphMatch>> {
        Ok(vec![GraphMatch::new("b", 0.9), GraphMatch::new("external", 0.8)])
    };
    let query = HybridQuery::new(vec![0.0, 0.0], 4)
        .with_merge(ruvector_core::MergeStrategy::ReciprocalRank);
    let results = store.hybrid_search(&query, Some(&backend)).unwrap();

    assert_eq!(results[0].id, "b");
    assert_eq!(results[0].source, ResultSource::Both);
    let external = results.iter().find(|r| r.id == "external").unwrap();
    assert_eq!(external.source, ResultSource::Graph);
    assert!(results.windows(2).all(|w| w[0].score >= w[1].score));
}

#[test]
fn listeners_may_write_back() {
    let store = make_store(2, DistanceMetric::Euclidean);
    let writer = store.clone();
    store.on(EventKind::Delete, move |event| {
        if let StoreEvent::Delete { id } = event {
            // Record a tombstone entry; the write lock is already released
            let tombstone = format!("deleted-{id}");
            writer.insert(make_entry(&tombstone, vec![0.0, 0.0])).unwrap();
        }
    });
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    store.on(EventKind::Insert, move |event| {
        sink.lock().unwrap().push(event.clone());
    });

    store.insert(make_entry("a", vec![1.0, 1.0])).unwrap();
    store.delete("a").unwrap();

    assert!(store.has("deleted-a"));
    assert_eq!(
        *seen.lock().unwrap(),
        vec![
            StoreEvent::Insert { id: "a".into() },
            StoreEvent::Insert { id: "deleted-a".into() },
        ]
    );
}

#[test]
fn concurrent_readers_and_writer() {
    let store = make_store(4, DistanceMetric::Cosine);
    let vectors = random_vectors(400, 4, 3);
    let writer = {
        let store = store.clone();
        let vectors = vectors.clone();
        std::thread::spawn(move || {
            for (i, v) in vectors.into_iter().enumerate() {
                store.insert(make_entry(&format!("w{i}"), v)).unwrap();
            }
        })
    };
    let readers: Vec<_> = (0..4)
        .map(|t| {
            let store = store.clone();
            std::thread::spawn(move || {
                for q in random_vectors(50, 4, 100 + t) {
                    let results = store.search(&SearchQuery::new(q, 5)).unwrap();
                    assert!(results.len() <= 5);
                }
            })
        })
        .collect();
    writer.join().unwrap();
    for r in readers {
        r.join().unwrap();
    }
    assert_eq!(store.size(), 400);
    store.validate().unwrap();
}
