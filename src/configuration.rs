//! Operational settings for a pipeline run.
//!
//! [`ExportOptions`] carries the progress callback, cancellation token,
//! encoder tuning and temporary-file location through
//! [`run_with_options`](crate::run_with_options) and
//! [`export`](crate::export), keeping [`TransformParameters`](crate::TransformParameters)
//! limited to what the user sees.
//!
//! # Example
//!
//! ```
//! use gif_maker::{CancellationToken, ExportOptions, GifOptions};
//!
//! let token = CancellationToken::new();
//! let options = ExportOptions::new()
//!     .with_cancellation(token.clone())
//!     .with_batch_size(10)
//!     .with_gif_options(GifOptions::new().with_quantizer_speed(20));
//! ```

use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::encoder::GifOptions;
use crate::error::GifMakerError;
use crate::progress::{CancellationToken, NoOpProgress, ProgressCallback};

/// Settings for a pipeline run that do not change the output.
///
/// A default-constructed value reports nothing, never cancels, and spools
/// uploads into the system temporary directory.
#[derive(Clone)]
pub struct ExportOptions {
    pub(crate) progress: Arc<dyn ProgressCallback>,
    pub(crate) cancellation: Option<CancellationToken>,
    pub(crate) batch_size: u64,
    pub(crate) gif: GifOptions,
    pub(crate) temp_dir: Option<PathBuf>,
}

impl Debug for ExportOptions {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("ExportOptions")
            .field("has_cancellation", &self.cancellation.is_some())
            .field("batch_size", &self.batch_size)
            .field("gif", &self.gif)
            .field("temp_dir", &self.temp_dir)
            .finish_non_exhaustive()
    }
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl ExportOptions {
    /// Create options with default settings.
    pub fn new() -> Self {
        Self {
            progress: Arc::new(NoOpProgress),
            cancellation: None,
            batch_size: 1,
            gif: GifOptions::default(),
            temp_dir: None,
        }
    }

    /// Attach a progress callback.
    #[must_use]
    pub fn with_progress(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress = callback;
        self
    }

    /// Attach a cancellation token.
    ///
    /// A cancelled run returns [`GifMakerError::Cancelled`] and produces no
    /// artifact.
    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }

    /// Report progress every `size` frames. Clamped to at least 1.
    #[must_use]
    pub fn with_batch_size(mut self, size: u64) -> Self {
        self.batch_size = size.max(1);
        self
    }

    /// Set GIF encoder tuning.
    #[must_use]
    pub fn with_gif_options(mut self, options: GifOptions) -> Self {
        self.gif = options;
        self
    }

    /// Spool uploaded bytes into `dir` instead of the system temp directory.
    #[must_use]
    pub fn with_temp_dir<P: AsRef<Path>>(mut self, dir: P) -> Self {
        self.temp_dir = Some(dir.as_ref().to_path_buf());
        self
    }

    /// Fail with [`GifMakerError::Cancelled`] if cancellation was requested.
    pub(crate) fn check_cancelled(&self) -> Result<(), GifMakerError> {
        if self
            .cancellation
            .as_ref()
            .is_some_and(|token| token.is_cancelled())
        {
            return Err(GifMakerError::Cancelled);
        }
        Ok(())
    }
}
