//! Lightweight search profiling using thread-local counters
//!
//! Enable with environment variable: ISOLATION_PROFILE=1
//! Tournament games run on rayon workers, so each worker accumulates locally and
//! calls `merge_thread_local` when its game finishes.

use std::cell::RefCell;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::OnceLock;
use std::time::Instant;

thread_local! {
    static MOVE_GEN_TIME: RefCell<u64> = const { RefCell::new(0) };
    static MOVE_GEN_COUNT: RefCell<usize> = const { RefCell::new(0) };

    static EVAL_TIME: RefCell<u64> = const { RefCell::new(0) };
    static EVAL_COUNT: RefCell<usize> = const { RefCell::new(0) };

    static FLOOD_FILL_TIME: RefCell<u64> = const { RefCell::new(0) };
    static FLOOD_FILL_COUNT: RefCell<usize> = const { RefCell::new(0) };

    static APPLY_MOVE_TIME: RefCell<u64> = const { RefCell::new(0) };
    static APPLY_MOVE_COUNT: RefCell<usize> = const { RefCell::new(0) };

    static SEARCH_NODES: RefCell<usize> = const { RefCell::new(0) };
    static ALPHA_BETA_CUTOFFS: RefCell<usize> = const { RefCell::new(0) };

    static CACHE_LOOKUPS: RefCell<usize> = const { RefCell::new(0) };
    static CACHE_HITS: RefCell<usize> = const { RefCell::new(0) };
}

static GLOBAL_MOVE_GEN_TIME: AtomicU64 = AtomicU64::new(0);
static GLOBAL_MOVE_GEN_COUNT: AtomicUsize = AtomicUsize::new(0);
static GLOBAL_EVAL_TIME: AtomicU64 = AtomicU64::new(0);
static GLOBAL_EVAL_COUNT: AtomicUsize = AtomicUsize::new(0);
static GLOBAL_FLOOD_FILL_TIME: AtomicU64 = AtomicU64::new(0);
static GLOBAL_FLOOD_FILL_COUNT: AtomicUsize = AtomicUsize::new(0);
static GLOBAL_APPLY_MOVE_TIME: AtomicU64 = AtomicU64::new(0);
static GLOBAL_APPLY_MOVE_COUNT: AtomicUsize = AtomicUsize::new(0);
static GLOBAL_SEARCH_NODES: AtomicUsize = AtomicUsize::new(0);
static GLOBAL_ALPHA_BETA_CUTOFFS: AtomicUsize = AtomicUsize::new(0);
static GLOBAL_CACHE_LOOKUPS: AtomicUsize = AtomicUsize::new(0);
static GLOBAL_CACHE_HITS: AtomicUsize = AtomicUsize::new(0);

#[inline]
pub fn is_profiling_enabled() -> bool {
    static ENABLED: OnceLock<bool> = OnceLock::new();
    *ENABLED.get_or_init(|| std::env::var("ISOLATION_PROFILE").is_ok())
}

pub struct ProfileGuard {
    start: Instant,
    category: &'static str,
}

impl ProfileGuard {
    pub fn new(category: &'static str) -> Option<Self> {
        if is_profiling_enabled() {
            Some(ProfileGuard {
                start: Instant::now(),
                category,
            })
        } else {
            None
        }
    }
}

impl Drop for ProfileGuard {
    fn drop(&mut self) {
        let elapsed_ns = self.start.elapsed().as_nanos() as u64;

        let (time, count) = match self.category {
            "move_gen" => (&MOVE_GEN_TIME, &MOVE_GEN_COUNT),
            "eval" => (&EVAL_TIME, &EVAL_COUNT),
            "flood_fill" => (&FLOOD_FILL_TIME, &FLOOD_FILL_COUNT),
            "apply_move" => (&APPLY_MOVE_TIME, &APPLY_MOVE_COUNT),
            _ => return,
        };
        time.with(|t| *t.borrow_mut() += elapsed_ns);
        count.with(|c| *c.borrow_mut() += 1);
    }
}

#[inline]
pub fn record_search_node() {
    if is_profiling_enabled() {
        SEARCH_NODES.with(|c| *c.borrow_mut() += 1);
    }
}

#[inline]
pub fn record_alpha_beta_cutoff() {
    if is_profiling_enabled() {
        ALPHA_BETA_CUTOFFS.with(|c| *c.borrow_mut() += 1);
    }
}

#[inline]
pub fn record_cache_lookup(hit: bool) {
    if is_profiling_enabled() {
        CACHE_LOOKUPS.with(|c| *c.borrow_mut() += 1);
        if hit {
            CACHE_HITS.with(|c| *c.borrow_mut() += 1);
        }
    }
}

fn drain_u64(local: &'static std::thread::LocalKey<RefCell<u64>>, global: &AtomicU64) {
    local.with(|t| {
        global.fetch_add(*t.borrow(), Ordering::Relaxed);
        *t.borrow_mut() = 0;
    });
}

fn drain_usize(local: &'static std::thread::LocalKey<RefCell<usize>>, global: &AtomicUsize) {
    local.with(|c| {
        global.fetch_add(*c.borrow(), Ordering::Relaxed);
        *c.borrow_mut() = 0;
    });
}

pub fn merge_thread_local() {
    if !is_profiling_enabled() {
        return;
    }

    drain_u64(&MOVE_GEN_TIME, &GLOBAL_MOVE_GEN_TIME);
    drain_usize(&MOVE_GEN_COUNT, &GLOBAL_MOVE_GEN_COUNT);
    drain_u64(&EVAL_TIME, &GLOBAL_EVAL_TIME);
    drain_usize(&EVAL_COUNT, &GLOBAL_EVAL_COUNT);
    drain_u64(&FLOOD_FILL_TIME, &GLOBAL_FLOOD_FILL_TIME);
    drain_usize(&FLOOD_FILL_COUNT, &GLOBAL_FLOOD_FILL_COUNT);
    drain_u64(&APPLY_MOVE_TIME, &GLOBAL_APPLY_MOVE_TIME);
    drain_usize(&APPLY_MOVE_COUNT, &GLOBAL_APPLY_MOVE_COUNT);
    drain_usize(&SEARCH_NODES, &GLOBAL_SEARCH_NODES);
    drain_usize(&ALPHA_BETA_CUTOFFS, &GLOBAL_ALPHA_BETA_CUTOFFS);
    drain_usize(&CACHE_LOOKUPS, &GLOBAL_CACHE_LOOKUPS);
    drain_usize(&CACHE_HITS, &GLOBAL_CACHE_HITS);
}

fn print_timed(label: &str, time: &AtomicU64, count: &AtomicUsize, total_ns: u64) {
    let time_ns = time.load(Ordering::Relaxed);
    let calls = count.load(Ordering::Relaxed);
    let ms = time_ns as f64 / 1_000_000.0;
    let pct = if total_ns > 0 { 100.0 * time_ns as f64 / total_ns as f64 } else { 0.0 };
    let avg_us = if calls > 0 { time_ns as f64 / (calls * 1000) as f64 } else { 0.0 };

    eprintln!("{}:", label);
    eprintln!("  Time:     {:.2}ms ({:.1}%)", ms, pct);
    eprintln!("  Calls:    {}", calls);
    eprintln!("  Avg:      {:.2}µs/call\n", avg_us);
}

pub fn print_report(total_time_ms: u64) {
    if !is_profiling_enabled() {
        return;
    }

    // Worker times are summed, so percentages can exceed 100% under rayon
    let total_ns = total_time_ms * 1_000_000;

    eprintln!("\n═══════════════════════════════════════════════════════════");
    eprintln!("                 PERFORMANCE PROFILE");
    eprintln!("═══════════════════════════════════════════════════════════");
    eprintln!("Total Time: {}ms\n", total_time_ms);

    print_timed("Move Generation", &GLOBAL_MOVE_GEN_TIME, &GLOBAL_MOVE_GEN_COUNT, total_ns);
    print_timed("Evaluation", &GLOBAL_EVAL_TIME, &GLOBAL_EVAL_COUNT, total_ns);
    print_timed("Flood Fill", &GLOBAL_FLOOD_FILL_TIME, &GLOBAL_FLOOD_FILL_COUNT, total_ns);
    print_timed("Apply Move", &GLOBAL_APPLY_MOVE_TIME, &GLOBAL_APPLY_MOVE_COUNT, total_ns);

    let nodes = GLOBAL_SEARCH_NODES.load(Ordering::Relaxed);
    let cutoffs = GLOBAL_ALPHA_BETA_CUTOFFS.load(Ordering::Relaxed);
    let cutoff_rate = if nodes > 0 { 100.0 * cutoffs as f64 / nodes as f64 } else { 0.0 };

    eprintln!("Search:");
    eprintln!("  Nodes:      {}", nodes);
    eprintln!("  Cutoffs:    {} ({:.1}% of nodes)\n", cutoffs, cutoff_rate);

    let lookups = GLOBAL_CACHE_LOOKUPS.load(Ordering::Relaxed);
    let hits = GLOBAL_CACHE_HITS.load(Ordering::Relaxed);
    let hit_rate = if lookups > 0 { 100.0 * hits as f64 / lookups as f64 } else { 0.0 };

    eprintln!("Symmetry Cache:");
    eprintln!("  Lookups:    {}", lookups);
    eprintln!("  Hits:       {} ({:.1}%)\n", hits, hit_rate);

    eprintln!("═══════════════════════════════════════════════════════════\n");
}

pub fn reset() {
    for counter in [
        &GLOBAL_MOVE_GEN_TIME,
        &GLOBAL_EVAL_TIME,
        &GLOBAL_FLOOD_FILL_TIME,
        &GLOBAL_APPLY_MOVE_TIME,
    ] {
        counter.store(0, Ordering::Relaxed);
    }
    for counter in [
        &GLOBAL_MOVE_GEN_COUNT,
        &GLOBAL_EVAL_COUNT,
        &GLOBAL_FLOOD_FILL_COUNT,
        &GLOBAL_APPLY_MOVE_COUNT,
        &GLOBAL_SEARCH_NODES,
        &GLOBAL_ALPHA_BETA_CUTOFFS,
        &GLOBAL_CACHE_LOOKUPS,
        &GLOBAL_CACHE_HITS,
    ] {
        counter.store(0, Ordering::Relaxed);
    }
}

#[macro_export]
macro_rules! profile {
    ($category:expr, $code:block) => {{
        let _guard = $crate::simple_profiler::ProfileGuard::new($category);
        $code
    }};
}
