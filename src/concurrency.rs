//! Data-parallel helpers on top of crossbeam's scoped threads. A slice is
//! split into contiguous chunks, one per worker, and results always come back
//! in slice order whatever the thread count.

use crossbeam::thread;
use std::panic;

/// Number of workers actually spawned for `items` elements.
pub fn num_workers(requested: usize, items: usize) -> usize {
    requested.max(1).min(items.max(1))
}

fn chunk_len(items: usize, workers: usize) -> usize {
    ((items + workers - 1) / workers).max(1)
}

/// Maps `f` over `items`, passing each element's index. The output has one
/// entry per input in the same order.
pub fn map_chunked<T, U, F>(items: &[T], num_threads: usize, f: F) -> Vec<U>
where
    T: Sync,
    U: Send,
    F: Fn(usize, &T) -> U + Sync,
{
    let workers = num_workers(num_threads, items.len());
    if workers == 1 {
        return items.iter().enumerate().map(|(i, item)| f(i, item)).collect();
    }

    let chunk_len = chunk_len(items.len(), workers);
    let f = &f;

    thread::scope(|s| {
        let handles: Vec<thread::ScopedJoinHandle<Vec<U>>> = items
            .chunks(chunk_len)
            .enumerate()
            .map(|(chunk_i, chunk)| {
                s.spawn(move |_| {
                    let chunk_start = chunk_i * chunk_len;
                    chunk
                        .iter()
                        .enumerate()
                        .map(|(j, item)| f(chunk_start + j, item))
                        .collect::<Vec<U>>()
                })
            })
            .collect();

        // join in spawn order to keep the output ordered
        let mut mapped = Vec::with_capacity(items.len());
        for handle in handles {
            let mut chunk_data = handle.join().unwrap_or_else(|e| panic::resume_unwind(e));
            mapped.append(&mut chunk_data);
        }
        mapped
    })
    .unwrap_or_else(|e| panic::resume_unwind(e))
}

/// Runs `f` on every element in place. Each worker only touches its own
/// chunk. A worker stops at its first error and the error from the earliest
/// chunk is returned.
pub fn try_for_each_chunked<T, E, F>(items: &mut [T], num_threads: usize, f: F) -> Result<(), E>
where
    T: Send,
    E: Send,
    F: Fn(usize, &mut T) -> Result<(), E> + Sync,
{
    let workers = num_workers(num_threads, items.len());
    if workers == 1 {
        for (i, item) in items.iter_mut().enumerate() {
            f(i, item)?;
        }
        return Ok(());
    }

    let chunk_len = chunk_len(items.len(), workers);
    let f = &f;

    thread::scope(|s| {
        let handles: Vec<thread::ScopedJoinHandle<Result<(), E>>> = items
            .chunks_mut(chunk_len)
            .enumerate()
            .map(|(chunk_i, chunk)| {
                s.spawn(move |_| -> Result<(), E> {
                    let chunk_start = chunk_i * chunk_len;
                    for (j, item) in chunk.iter_mut().enumerate() {
                        f(chunk_start + j, item)?;
                    }
                    Ok(())
                })
            })
            .collect();

        let mut outcome = Ok(());
        for handle in handles {
            let chunk_result = handle.join().unwrap_or_else(|e| panic::resume_unwind(e));
            if outcome.is_ok() {
                outcome = chunk_result;
            }
        }
        outcome
    })
    .unwrap_or_else(|e| panic::resume_unwind(e))
}
