//! Background tessellation worker.
//!
//! One thread turns immutable raw-sample snapshots into immutable vertex
//! batches so the UI thread stays free for rendering. Handoff is message
//! passing in both directions; each job carries the stroke generation so
//! consumers can discard results that arrive after the stroke ended.

use crate::tessellate::StrokeGeometryBuilder;
use crate::vertex::Vertex;
use crossbeam_channel::{Receiver, Sender, TryRecvError};
use inkflow_core::input::RawSample;
use std::thread::JoinHandle;

/// A tessellation request: full snapshot of the in-progress stroke.
#[derive(Debug, Clone)]
pub struct TessellationJob {
    /// Stroke generation at submission time.
    pub generation: u64,
    pub samples: Vec<RawSample>,
    pub width: f64,
    pub color: [f32; 4],
}

/// The vertices for one job, tagged with its generation.
#[derive(Debug, Clone)]
pub struct TessellationResult {
    pub generation: u64,
    pub vertices: Vec<Vertex>,
}

/// Handle to the tessellation thread.
///
/// Since each job snapshots the whole stroke, only the newest job matters:
/// the worker drains its queue before tessellating, and consumers keep only
/// the last pending result.
pub struct TessellationWorker {
    jobs: Option<Sender<TessellationJob>>,
    results: Receiver<TessellationResult>,
    handle: Option<JoinHandle<()>>,
}

impl TessellationWorker {
    pub fn spawn() -> Self {
        let (job_tx, job_rx) = crossbeam_channel::unbounded::<TessellationJob>();
        let (result_tx, result_rx) = crossbeam_channel::unbounded::<TessellationResult>();

        let handle = std::thread::Builder::new()
            .name("ink-tessellation".to_string())
            .spawn(move || run(&job_rx, &result_tx))
            .expect("failed to spawn tessellation worker");

        Self {
            jobs: Some(job_tx),
            results: result_rx,
            handle: Some(handle),
        }
    }

    /// Queue a job. Never blocks; a dead worker is logged, not fatal, since
    /// the active layer merely stops updating until the stroke commits.
    pub fn submit(&self, job: TessellationJob) {
        if let Some(jobs) = &self.jobs {
            if jobs.send(job).is_err() {
                log::warn!("tessellation worker is gone, dropping job");
            }
        }
    }

    /// Newest pending result, if any. Never blocks.
    pub fn poll_latest(&self) -> Option<TessellationResult> {
        let mut latest = None;
        loop {
            match self.results.try_recv() {
                Ok(result) => latest = Some(result),
                Err(TryRecvError::Empty | TryRecvError::Disconnected) => return latest,
            }
        }
    }

    /// Block for the next result. Test support.
    #[doc(hidden)]
    pub fn recv_timeout(&self, timeout: std::time::Duration) -> Option<TessellationResult> {
        self.results.recv_timeout(timeout).ok()
    }
}

impl Drop for TessellationWorker {
    fn drop(&mut self) {
        // Closing the job channel ends the worker loop.
        self.jobs.take();
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                log::error!("tessellation worker panicked");
            }
        }
    }
}

fn run(jobs: &Receiver<TessellationJob>, results: &Sender<TessellationResult>) {
    log::debug!("tessellation worker up");
    while let Ok(mut job) = jobs.recv() {
        // Drain to the newest snapshot; intermediate ones are superseded.
        while let Ok(newer) = jobs.try_recv() {
            job = newer;
        }

        let builder = StrokeGeometryBuilder::new(job.width, job.color);
        let result = TessellationResult {
            generation: job.generation,
            vertices: builder.build_ribbon_pressured(&job.samples),
        };
        if results.send(result).is_err() {
            break;
        }
    }
    log::debug!("tessellation worker down");
}

#[cfg(test)]
mod tests {
    use super::*;
    use kurbo::Point;
    use std::time::Duration;

    const TIMEOUT: Duration = Duration::from_secs(5);

    fn job(generation: u64, n: usize) -> TessellationJob {
        TessellationJob {
            generation,
            samples: (0..n)
                .map(|i| RawSample::new(Point::new(i as f64 * 4.0, 0.0), i as u64 * 16, 1.0))
                .collect(),
            width: 3.0,
            color: [1.0, 1.0, 1.0, 1.0],
        }
    }

    #[test]
    fn test_job_roundtrip() {
        let worker = TessellationWorker::spawn();
        worker.submit(job(7, 5));

        let result = worker.recv_timeout(TIMEOUT).expect("worker produced no result");
        assert_eq!(result.generation, 7);
        assert_eq!(result.vertices.len(), 10);
    }

    #[test]
    fn test_results_tagged_with_generation() {
        let worker = TessellationWorker::spawn();
        for generation in 1..=3 {
            worker.submit(job(generation, 4));
            let result = worker.recv_timeout(TIMEOUT).unwrap();
            assert_eq!(result.generation, generation);
        }
    }

    #[test]
    fn test_newest_generation_wins() {
        let worker = TessellationWorker::spawn();
        worker.submit(job(1, 2));
        worker.submit(job(2, 3));
        worker.submit(job(3, 4));

        // Wait until the newest generation has come through, then poll.
        let mut newest = None;
        for _ in 0..3 {
            match worker.recv_timeout(TIMEOUT) {
                Some(result) => {
                    let done = result.generation == 3;
                    newest = Some(result);
                    if done {
                        break;
                    }
                }
                None => break,
            }
        }
        let newest = newest.expect("no result arrived");
        assert_eq!(newest.generation, 3);
        assert_eq!(newest.vertices.len(), 8);
    }

    #[test]
    fn test_drop_joins_worker() {
        let worker = TessellationWorker::spawn();
        worker.submit(job(1, 2));
        drop(worker);
    }
}
