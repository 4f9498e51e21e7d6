//! Progress reporting and cooperative cancellation.

/// Progress callback: `(fraction, message) -> keep_going`.
pub type ProgressFn<'a> = dyn FnMut(f64, Option<&str>) -> bool + 'a;

/// Wraps an optional caller callback. Returning `false` from the callback
/// requests cancellation; the request is latched.
pub struct Progress<'a> {
    callback: Option<Box<ProgressFn<'a>>>,
    last: f64,
    cancelled: bool,
}

impl<'a> Progress<'a> {
    /// No callback; never cancels.
    pub fn none() -> Self {
        Self {
            callback: None,
            last: 0.0,
            cancelled: false,
        }
    }

    pub fn new<F>(callback: F) -> Self
    where
        F: FnMut(f64, Option<&str>) -> bool + 'a,
    {
        Self {
            callback: Some(Box::new(callback)),
            last: 0.0,
            cancelled: false,
        }
    }

    /// Report `fraction`. Values below the last reported one are raised to
    /// it. Returns `false` once cancellation has been requested.
    pub fn report(&mut self, fraction: f64, message: Option<&str>) -> bool {
        let fraction = fraction.max(self.last);
        self.last = fraction;
        if let Some(cb) = self.callback.as_mut() {
            if !cb(fraction, message) {
                self.cancelled = true;
            }
        }
        !self.cancelled
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled
    }

    pub fn last_fraction(&self) -> f64 {
        self.last
    }
}

impl Default for Progress<'_> {
    fn default() -> Self {
        Self::none()
    }
}

impl std::fmt::Debug for Progress<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Progress")
            .field("has_callback", &self.callback.is_some())
            .field("last", &self.last)
            .field("cancelled", &self.cancelled)
            .finish()
    }
}
