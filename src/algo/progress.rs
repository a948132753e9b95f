//! Progress reporting for iterative algorithms.
//!
//! # Example
//!
//! ```
//! use coral::algo::progress::Progress;
//! use coral::algo::smooth::{explicit_smooth_with_progress, SmoothOptions};
//! use coral::prelude::*;
//! use nalgebra::Point3;
//!
//! let vertices = vec![
//!     Point3::new(0.0, 0.0, 0.0),
//!     Point3::new(1.0, 0.0, 0.0),
//!     Point3::new(0.5, 1.0, 0.0),
//! ];
//! let mut mesh: HalfEdgeMesh = build_from_triangles(&vertices, &[[0, 1, 2]]).unwrap();
//!
//! let progress = Progress::new(|current, total, message| {
//!     println!("[{}/{}] {}", current, total, message);
//! });
//! let options = SmoothOptions::default().with_iterations(3);
//! explicit_smooth_with_progress(&mut mesh, &options, &progress).unwrap();
//! ```

/// A callback receiving `(current, total, message)` updates.
///
/// `current` counts completed steps, starting at 0; a final report with
/// `current == total` marks completion.
pub struct Progress {
    callback: Box<dyn Fn(usize, usize, &str) + Send + Sync>,
}

impl Progress {
    /// Create a new progress reporter with the given callback.
    pub fn new<F>(callback: F) -> Self
    where
        F: Fn(usize, usize, &str) + Send + Sync + 'static,
    {
        Self {
            callback: Box::new(callback),
        }
    }

    /// Report progress.
    #[inline]
    pub fn report(&self, current: usize, total: usize, message: &str) {
        (self.callback)(current, total, message);
    }

    /// A reporter that discards all updates.
    pub fn none() -> Self {
        Self::new(|_, _, _| {})
    }
}

impl Default for Progress {
    fn default() -> Self {
        Self::none()
    }
}

impl std::fmt::Debug for Progress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Progress").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[test]
    fn test_report_forwards() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let progress = Progress::new(move |c, t, m| sink.lock().unwrap().push((c, t, m.to_string())));

        progress.report(1, 4, "step");
        Progress::none().report(2, 4, "ignored");

        assert_eq!(*seen.lock().unwrap(), vec![(1, 4, "step".to_string())]);
    }
}
