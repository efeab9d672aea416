//! Running the pipeline from async code.
//!
//! Decoding and quantisation are CPU-bound, so [`run_in_background`] moves
//! the whole pipeline onto Tokio's blocking pool and hands back a
//! [`GifFuture`]. Requires the `async` feature.
//!
//! # Example
//!
//! ```no_run
//! use gif_maker::{ExportOptions, GifMakerError, TransformParameters, run_in_background};
//!
//! # async fn example() -> Result<(), GifMakerError> {
//! let bytes = std::fs::read("input.mp4")?;
//! let gif = run_in_background(bytes, TransformParameters::new(), ExportOptions::new()).await?;
//! gif.save("output.gif")?;
//! # Ok(())
//! # }
//! ```

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use tokio::task::JoinHandle;

use crate::configuration::ExportOptions;
use crate::encoder::GifArtifact;
use crate::error::GifMakerError;
use crate::parameters::TransformParameters;
use crate::pipeline::run_with_options;

/// A pipeline run on a blocking worker thread.
///
/// Dropping the future does not stop the worker; attach a
/// [`CancellationToken`](crate::CancellationToken) to the options for that.
/// A worker that panics resolves to [`GifMakerError::Cancelled`].
pub struct GifFuture {
    handle: JoinHandle<Result<GifArtifact, GifMakerError>>,
}

impl Future for GifFuture {
    type Output = Result<GifArtifact, GifMakerError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.handle)
            .poll(cx)
            .map(|result| result.unwrap_or_else(|_| Err(GifMakerError::Cancelled)))
    }
}

/// Spawn [`run_with_options`] on Tokio's blocking pool.
///
/// Must be called from within a Tokio runtime.
pub fn run_in_background(
    video_bytes: Vec<u8>,
    params: TransformParameters,
    options: ExportOptions,
) -> GifFuture {
    let handle =
        tokio::task::spawn_blocking(move || run_with_options(&video_bytes, &params, &options));
    GifFuture { handle }
}
