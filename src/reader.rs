//! Dedicated-worker request queue for static image decoding
//!
//! One long-lived worker thread per reader drains a multi-producer queue in
//! FIFO order, one request at a time, so completion order always equals
//! submission order. Results land either in a per-request completion sink or
//! in the pollable result store.

use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use parking_lot::{Condvar, Mutex};

use crate::config::ImportConfig;
use crate::error::ImportError;
use crate::pipeline::ImportPipeline;
use crate::raw_image::RawImage;
use crate::transform::TransformParams;

/// Where a request's encoded bytes come from. Exactly one source, enforced
/// by construction.
#[derive(Debug)]
pub enum ImageSource {
    File(PathBuf),
    Bytes(Vec<u8>),
}

impl ImageSource {
    /// Filename for disk sources, empty for in-memory buffers.
    pub fn identifier(&self) -> String {
        match self {
            ImageSource::File(path) => path.display().to_string(),
            ImageSource::Bytes(_) => String::new(),
        }
    }
}

/// One decode request. Move-only; owned by the queue while pending and by
/// the worker while processing.
#[derive(Debug)]
pub struct ReadRequest {
    pub source: ImageSource,
    pub transform: TransformParams,
    /// Deliver flattened RGBA8 pixels instead of the raw buffer.
    pub pixels_only: bool,
}

impl ReadRequest {
    pub fn from_file(path: impl Into<PathBuf>) -> Self {
        Self {
            source: ImageSource::File(path.into()),
            transform: TransformParams::default(),
            pixels_only: false,
        }
    }

    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self {
            source: ImageSource::Bytes(bytes),
            transform: TransformParams::default(),
            pixels_only: false,
        }
    }

    pub fn with_transform(mut self, transform: TransformParams) -> Self {
        self.transform = transform;
        self
    }

    pub fn pixels_only(mut self) -> Self {
        self.pixels_only = true;
        self
    }
}

/// Successful payload of a finished request.
#[derive(Debug)]
pub enum ImagePayload {
    Raw(RawImage),
    Pixels {
        width: u32,
        height: u32,
        rgba: Vec<u8>,
    },
}

/// Terminal result of one request: either a payload or an error, never both,
/// never neither.
#[derive(Debug)]
pub struct ImageReadResult {
    /// Filename for disk sources, empty otherwise.
    pub source: String,
    pub outcome: Result<ImagePayload, ImportError>,
}

/// Invoked exactly once with the terminal result of a request, from the
/// worker thread. Callers needing a specific delivery context capture a
/// channel sender here. Cancelled requests drop the sink uninvoked.
pub type CompletionSink = Box<dyn FnOnce(ImageReadResult) + Send + 'static>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitMode {
    /// Run the pipeline inline on the calling thread and return the result
    /// directly. No queueing, no handoff.
    Sync,
    /// Enqueue and return immediately; completion is delivered later.
    Async,
}

struct QueuedRequest {
    request: ReadRequest,
    sink: Option<CompletionSink>,
    generation: u64,
}

struct ReaderState {
    queue: VecDeque<QueuedRequest>,
    results: VecDeque<ImageReadResult>,
    in_flight: bool,
    stop: bool,
    /// Bumped by `cancel_all`; results from an older generation are
    /// discarded on arrival instead of delivered.
    generation: u64,
}

struct Shared {
    state: Mutex<ReaderState>,
    work: Condvar,
    done: Condvar,
    pipeline: ImportPipeline,
}

/// Asynchronous image reader with at-most-one-request-in-flight semantics.
pub struct ImageReader {
    shared: Arc<Shared>,
    worker: Option<JoinHandle<()>>,
}

impl ImageReader {
    pub fn new(config: ImportConfig) -> Self {
        let shared = Arc::new(Shared {
            state: Mutex::new(ReaderState {
                queue: VecDeque::new(),
                results: VecDeque::new(),
                in_flight: false,
                stop: false,
                generation: 0,
            }),
            work: Condvar::new(),
            done: Condvar::new(),
            pipeline: ImportPipeline::new(config),
        });

        let worker = {
            let shared = Arc::clone(&shared);
            thread::Builder::new()
                .name("rawimage-reader".into())
                .spawn(move || worker_loop(&shared))
                .expect("failed to spawn reader thread")
        };

        Self {
            shared,
            worker: Some(worker),
        }
    }

    /// Submits a request. `Sync` blocks the calling thread and returns
    /// `Some(result)`; `Async` enqueues, wakes the worker and returns `None`.
    pub fn submit(&self, request: ReadRequest, mode: SubmitMode) -> Option<ImageReadResult> {
        match mode {
            SubmitMode::Sync => Some(process_request(&self.shared.pipeline, request)),
            SubmitMode::Async => {
                self.enqueue(request, None);
                None
            }
        }
    }

    /// Async submission with a per-request completion sink instead of the
    /// result store.
    pub fn submit_with(
        &self,
        request: ReadRequest,
        sink: impl FnOnce(ImageReadResult) + Send + 'static,
    ) {
        self.enqueue(request, Some(Box::new(sink)));
    }

    fn enqueue(&self, request: ReadRequest, sink: Option<CompletionSink>) {
        let mut state = self.shared.state.lock();
        if state.stop {
            log::warn!("request submitted to a stopped reader, dropping");
            return;
        }
        let generation = state.generation;
        state.queue.push_back(QueuedRequest {
            request,
            sink,
            generation,
        });
        drop(state);
        self.shared.work.notify_one();
    }

    /// Pops the oldest undelivered result, if any. Results come out in
    /// submission order.
    pub fn take_result(&self) -> Option<ImageReadResult> {
        self.shared.state.lock().results.pop_front()
    }

    /// Discards all queued, not-yet-started requests. A request already
    /// mid-processing finishes and its result is discarded on arrival.
    pub fn cancel_all(&self) {
        let mut state = self.shared.state.lock();
        let dropped = state.queue.len();
        state.queue.clear();
        state.generation += 1;
        drop(state);
        // waiters may already be satisfied now that the queue is empty
        self.shared.done.notify_all();
        if dropped > 0 {
            log::debug!("cancelled {dropped} queued requests");
        }
    }

    /// True iff the queue is empty and nothing is mid-processing.
    pub fn is_work_completed(&self) -> bool {
        let state = self.shared.state.lock();
        state.queue.is_empty() && !state.in_flight
    }

    /// Blocks until every queued request has been processed and delivered.
    pub fn block_till_all_requests_finished(&self) {
        let mut state = self.shared.state.lock();
        while !state.queue.is_empty() || state.in_flight {
            self.shared.done.wait(&mut state);
        }
    }

    /// Graceful shutdown: the in-flight request (if any) finishes and its
    /// result is discarded; queued requests are dropped unprocessed.
    pub fn shutdown(&mut self) {
        {
            let mut state = self.shared.state.lock();
            if state.stop {
                return;
            }
            state.stop = true;
            state.queue.clear();
        }
        self.shared.work.notify_one();

        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                log::error!("reader worker thread panicked");
            }
        }
        self.shared.done.notify_all();
    }
}

impl Drop for ImageReader {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn worker_loop(shared: &Shared) {
    log::debug!("reader worker started");

    loop {
        let job = {
            let mut state = shared.state.lock();
            loop {
                if state.stop {
                    log::debug!("reader worker stopping");
                    return;
                }
                if let Some(job) = state.queue.pop_front() {
                    state.in_flight = true;
                    break job;
                }
                shared.work.wait(&mut state);
            }
        };

        let result = process_request(&shared.pipeline, job.request);

        // Decide delivery under the lock, deliver outside it: the store must
        // never be held across a slow consumer callback.
        let sink = {
            let mut state = shared.state.lock();
            if state.stop || job.generation != state.generation {
                log::debug!("discarding result of a cancelled request");
                None
            } else {
                match job.sink {
                    Some(sink) => Some(sink),
                    None => {
                        state.results.push_back(result);
                        state.in_flight = false;
                        shared.done.notify_all();
                        continue;
                    }
                }
            }
        };

        if let Some(sink) = sink {
            sink(result);
        }

        let mut state = shared.state.lock();
        state.in_flight = false;
        drop(state);
        shared.done.notify_all();
    }
}

/// Runs one request through the pipeline and folds any failure into the
/// result. Decode errors never cross this boundary as panics.
fn process_request(pipeline: &ImportPipeline, request: ReadRequest) -> ImageReadResult {
    let source = request.source.identifier();
    let pixels_only = request.pixels_only || request.transform.pixels_only;

    let decoded = match &request.source {
        ImageSource::File(path) => pipeline.import_file(path, &request.transform),
        ImageSource::Bytes(bytes) => pipeline.import_bytes(bytes, &request.transform),
    };

    let outcome = decoded.map(|raw| {
        if pixels_only {
            ImagePayload::Pixels {
                width: raw.width(),
                height: raw.height(),
                rgba: raw.to_rgba8_pixels(),
            }
        } else {
            ImagePayload::Raw(raw)
        }
    });

    if let Err(e) = &outcome {
        log::warn!("failed to import image '{source}': {e}");
    }

    ImageReadResult { source, outcome }
}
