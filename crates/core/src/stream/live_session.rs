//! Live-stream state machine.
//!
//! Two states: `Idle` (no stream) and `Streaming` (frames arriving).
//! `start` transitions Idle→Streaming; `stop`, a source failure, or the
//! receiver going away transitions back to Idle. Each frame runs the
//! processor to completion before the next is pulled; no buffering,
//! smoothing, or cross-frame state.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;

use crossbeam_channel::{Receiver, Sender};

use crate::shared::frame::Frame;
use crate::stream::frame_source::FrameSource;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StreamState {
    Idle,
    Streaming,
}

pub enum LiveEvent {
    /// A processed (annotated) frame.
    Frame(Frame),
    /// A per-frame processing failure; the stream keeps running.
    Error(String),
    /// The stream ended (stop requested, source failed, or receiver gone).
    Stopped,
}

/// Per-frame detect-and-draw callback. Runs on the stream worker thread.
pub type FrameProcessor =
    Box<dyn FnMut(Frame) -> Result<Frame, Box<dyn std::error::Error>> + Send>;

pub struct LiveSession {
    stop: Arc<AtomicBool>,
    streaming: Arc<AtomicBool>,
    join: Option<JoinHandle<()>>,
}

impl LiveSession {
    /// Connect the source and begin streaming on a worker thread.
    ///
    /// Connection failures are synchronous: the session never enters
    /// `Streaming`, so callers can fall back to a placeholder.
    pub fn start(
        mut source: Box<dyn FrameSource>,
        mut processor: FrameProcessor,
    ) -> Result<(Self, Receiver<LiveEvent>), Box<dyn std::error::Error>> {
        source.connect()?;

        let (tx, rx) = crossbeam_channel::unbounded::<LiveEvent>();
        let stop = Arc::new(AtomicBool::new(false));
        let streaming = Arc::new(AtomicBool::new(true));

        let stop_worker = stop.clone();
        let streaming_worker = streaming.clone();
        let join = std::thread::spawn(move || {
            run_stream(source.as_mut(), &mut processor, &tx, &stop_worker);
            source.close();
            streaming_worker.store(false, Ordering::SeqCst);
            let _ = tx.send(LiveEvent::Stopped);
        });

        Ok((
            Self {
                stop,
                streaming,
                join: Some(join),
            },
            rx,
        ))
    }

    pub fn state(&self) -> StreamState {
        if self.streaming.load(Ordering::SeqCst) {
            StreamState::Streaming
        } else {
            StreamState::Idle
        }
    }

    /// Request the stream to end and wait for the worker to finish.
    pub fn stop(mut self) {
        self.stop.store(true, Ordering::SeqCst);
        if let Some(join) = self.join.take() {
            let _ = join.join();
        }
    }
}

impl Drop for LiveSession {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::SeqCst);
        if let Some(join) = self.join.take() {
            let _ = join.join();
        }
    }
}

fn run_stream(
    source: &mut dyn FrameSource,
    processor: &mut FrameProcessor,
    tx: &Sender<LiveEvent>,
    stop: &AtomicBool,
) {
    while !stop.load(Ordering::SeqCst) {
        let frame = match source.next_frame() {
            Ok(frame) => frame,
            Err(err) => {
                // Transport failure ends the stream
                log::warn!("stream source failed: {err}");
                let _ = tx.send(LiveEvent::Error(err.to_string()));
                return;
            }
        };

        match processor(frame) {
            Ok(annotated) => {
                if tx.send(LiveEvent::Frame(annotated)).is_err() {
                    // Receiver went away: nobody is watching
                    return;
                }
            }
            Err(err) => {
                // Detection failure is not fatal; the next frame may succeed
                if tx.send(LiveEvent::Error(err.to_string())).is_err() {
                    return;
                }
            }
        }
    }
}
