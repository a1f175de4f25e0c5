//! Hand-rolled worker pool for embarrassingly parallel fitness evaluation
//! (spec.md §5: "population-based and hybrid algorithms MAY internally use a
//! worker pool sized to available hardware parallelism").
//!
//! Grounded on the teacher's `bab.rs` worker loop, which spawns a fixed
//! number of `std::thread`s sharing a mutex-guarded work queue rather than
//! depending on `rayon`. This is a simpler instance of the same idiom: a
//! scoped, one-shot parallel map instead of a long-lived Branch-and-Bound
//! worker loop, since fitness evaluation has no further branching to push
//! back onto a shared queue.

use std::sync::Mutex;

/// Evaluate `f` over every item in `items` using `num_threads` worker
/// threads, preserving input order in the result. `catalog` data referenced
/// by `f` is read-only and safely shared across threads (spec.md §5: "no
/// shared mutable state, catalog is read-only").
pub fn parallel_map<T, R, F>(items: Vec<T>, num_threads: usize, f: F) -> Vec<R>
where
    T: Send,
    R: Send,
    F: Fn(&T) -> R + Send + Sync,
{
    let num_threads = num_threads.max(1).min(items.len().max(1));
    if items.is_empty() {
        return Vec::new();
    }
    if num_threads <= 1 {
        return items.iter().map(|item| f(item)).collect();
    }

    let next_index = Mutex::new(0usize);
    let mut results: Vec<Option<R>> = (0..items.len()).map(|_| None).collect();
    let results_mutex = Mutex::new(&mut results);
    let items_ref = &items;
    let f_ref = &f;
    let next_index_ref = &next_index;

    std::thread::scope(|scope| {
        for _ in 0..num_threads {
            scope.spawn(move || loop {
                let index = {
                    let mut guard = next_index_ref.lock().unwrap();
                    if *guard >= items_ref.len() {
                        break;
                    }
                    let i = *guard;
                    *guard += 1;
                    i
                };
                let value = f_ref(&items_ref[index]);
                results_mutex.lock().unwrap()[index] = Some(value);
            });
        }
    });

    results.into_iter().map(|r| r.unwrap()).collect()
}

/// Default worker count, sized from hardware parallelism exactly as the
/// teacher's `main.rs` defaults `num_threads` to `num_cpus::get()`.
pub fn default_num_threads() -> usize {
    num_cpus::get().max(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parallel_map_preserves_order() {
        let items: Vec<u32> = (0..50).collect();
        let results = parallel_map(items, 4, |x| x * 2);
        let expected: Vec<u32> = (0..50).map(|x| x * 2).collect();
        assert_eq!(results, expected);
    }

    #[test]
    fn parallel_map_handles_empty_input() {
        let results: Vec<u32> = parallel_map(Vec::<u32>::new(), 4, |x| *x);
        assert!(results.is_empty());
    }

    #[test]
    fn parallel_map_single_thread_matches_sequential() {
        let items: Vec<u32> = (0..10).collect();
        let results = parallel_map(items, 1, |x| x + 1);
        assert_eq!(results, (1..11).collect::<Vec<u32>>());
    }
}
