//! Draws received points as a polyline and writes the image when done.

use crate::canvas::Canvas;
use crate::error::Result;
use crate::point::Point;
use std::path::PathBuf;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Drawing progress for one client session.
pub struct Sketch {
    canvas: Canvas,
    last: Option<Point>,
    segments: u64,
}

impl Sketch {
    pub fn new(canvas: Canvas) -> Self {
        Sketch {
            canvas,
            last: None,
            segments: 0,
        }
    }

    /// Connect `point` to the previous one, if any, and remember it.
    pub fn add(&mut self, point: Point) {
        if let Some(last) = self.last {
            self.canvas.line(last, point);
            self.segments += 1;
        }
        self.last = Some(point);
    }

    #[cfg(test)]
    pub fn canvas(&self) -> &Canvas {
        &self.canvas
    }
}

/// Consume `points` until the channel closes or `cancel` fires, then save
/// the canvas to `output`.
pub async fn sketch(
    mut sketch: Sketch,
    mut points: mpsc::Receiver<Point>,
    output: PathBuf,
    cancel: CancellationToken,
) -> Result<()> {
    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                debug!("Sketch cancelled");
                break;
            }
            point = points.recv() => match point {
                Some(point) => sketch.add(point),
                None => {
                    info!("Channel closed");
                    break;
                }
            },
        }
    }

    info!(output = %output.display(), segments = sketch.segments, "Saving sketch");
    let canvas = sketch.canvas;
    tokio::task::spawn_blocking(move || canvas.save(&output)).await??;
    Ok(())
}
