//! HNSW benchmark on synthetic data.
//! Measures build rate, Recall@10 against brute force, and QPS.
//!
//! Usage: cargo bench --bench hnsw_recall

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use ruvector_core::{
    BatchInsert, DistanceMetric, Metadata, RuVectorConfig, SearchQuery, VectorEntry, VectorStore,
};
use std::collections::HashSet;
use std::time::Instant;

const NUM_VECTORS: usize = 10_000;
const NUM_QUERIES: usize = 500;
const DIM: usize = 32;
const K: usize = 10;

fn random_vectors(n: usize, seed: u64) -> Vec<Vec<f32>> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..n)
        .map(|_| (0..DIM).map(|_| rng.gen_range(-1.0f32..1.0)).collect())
        .collect()
}

fn ground_truth(data: &[Vec<f32>], queries: &[Vec<f32>], metric: DistanceMetric) -> Vec<HashSet<usize>> {
    queries
        .iter()
        .map(|q| {
            let mut scored: Vec<(f32, usize)> = data
                .iter()
                .enumerate()
                .map(|(i, v)| (metric.distance(q, v).unwrap_or(f32::MAX), i))
                .collect();
            scored.sort_by(|a, b| a.0.total_cmp(&b.0));
            scored.iter().take(K).map(|&(_, i)| i).collect()
        })
        .collect()
}

fn main() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();

    println!("=== HNSW Benchmark: {NUM_VECTORS} x {DIM}d uniform, cosine ===");
    println!();

    let metric = DistanceMetric::Cosine;
    let data = random_vectors(NUM_VECTORS, 1);
    let queries = random_vectors(NUM_QUERIES, 2);

    print!("Computing ground truth...");
    let t0 = Instant::now();
    let truth = ground_truth(&data, &queries, metric);
    println!(" {:.2}s", t0.elapsed().as_secs_f64());

    println!();
    println!("  ef_search | Build (vec/s) | Recall@10 |    QPS    | Avg latency");
    println!("  ----------+---------------+-----------+-----------+------------");

    for ef in [16, 32, 64, 128, 256] {
        let config = RuVectorConfig::new(DIM)
            .with_metric(metric)
            .with_hnsw_params(16, 200, ef);
        let store = VectorStore::with_seed(config, 42);
        if let Err(e) = store.initialize() {
            eprintln!("invalid config: {e}");
            return;
        }

        let entries: Vec<VectorEntry> = data
            .iter()
            .enumerate()
            .map(|(i, v)| VectorEntry::with_id(i.to_string(), v.clone(), Metadata::new()))
            .collect();
        let t0 = Instant::now();
        let inserted = match store.batch_insert(BatchInsert::new(entries)) {
            Ok(result) => result.inserted_count,
            Err(e) => {
                eprintln!("batch insert failed: {e}");
                return;
            }
        };
        let build_rate = inserted as f64 / t0.elapsed().as_secs_f64();

        // Warm up
        for q in queries.iter().take(10) {
            let _ = store.search(&SearchQuery::new(q.clone(), K));
        }

        let t0 = Instant::now();
        let mut found = 0usize;
        for (q, expected) in queries.iter().zip(&truth) {
            let results = store.search(&SearchQuery::new(q.clone(), K)).unwrap_or_default();
            found += results
                .iter()
                .filter_map(|r| r.id.parse::<usize>().ok())
                .filter(|i| expected.contains(i))
                .count();
        }
        let elapsed = t0.elapsed();

        let recall = found as f64 / (K * NUM_QUERIES) as f64;
        let qps = NUM_QUERIES as f64 / elapsed.as_secs_f64();
        let avg_latency_us = elapsed.as_micros() as f64 / NUM_QUERIES as f64;
        println!(
            "  {:>9} | {:>13.0} | {:.4}    | {:>9.1} | {:.0} us",
            ef, build_rate, recall, qps, avg_latency_us
        );

        if ef == 64 {
            let stats = store.get_stats();
            println!(
                "            levels={} avg_connections={:.2} memory={:.1} MiB",
                stats.index_stats.levels,
                stats.index_stats.avg_connections,
                stats.memory_usage as f64 / (1024.0 * 1024.0)
            );
        }
    }

    println!();
    println!("=== Benchmark complete ===");
}
