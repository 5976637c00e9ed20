//! Scroll progress and play-head smoothing.
//!
//! Progress spans from the container's top reaching the viewport top to its
//! bottom reaching the viewport bottom. The play-head does not jump to the
//! new position; a [`ScrubController`] eases it there over a lag window.

use crate::easing::{lerp, Ease};

/// Normalise a scroll offset to [0, 1]. Containers that cannot scroll
/// report zero.
pub fn scroll_progress(scroll_top: f32, scroll_height: f32, client_height: f32) -> f32 {
    let range = scroll_height - client_height;
    if range <= 0.0 {
        return 0.0;
    }
    (scroll_top / range).clamp(0.0, 1.0)
}

/// Eases the play-head towards its target. Each new target restarts the
/// catch-up from wherever the head currently is.
#[derive(Debug, Clone)]
pub struct ScrubController {
    lag: f32,
    ease: Ease,
    from: f32,
    to: f32,
    elapsed: f32,
    head: f32,
}

impl ScrubController {
    pub fn new(lag: f32, ease: Ease) -> Self {
        Self {
            lag: lag.max(0.0),
            ease,
            from: 0.0,
            to: 0.0,
            elapsed: 0.0,
            head: 0.0,
        }
    }

    pub fn head(&self) -> f32 {
        self.head
    }

    pub fn target(&self) -> f32 {
        self.to
    }

    pub fn is_settled(&self) -> bool {
        self.head == self.to
    }

    pub fn set_target(&mut self, target: f32) {
        if target == self.to {
            return;
        }
        self.from = self.head;
        self.to = target;
        self.elapsed = 0.0;
        if self.lag == 0.0 {
            self.head = target;
        }
    }

    /// Jump straight to `head` with no catch-up.
    pub fn snap(&mut self, head: f32) {
        self.from = head;
        self.to = head;
        self.head = head;
        self.elapsed = 0.0;
    }

    /// Advance by `dt` seconds and return the new head.
    pub fn advance(&mut self, dt: f32) -> f32 {
        if self.lag == 0.0 || self.is_settled() {
            self.head = self.to;
            return self.head;
        }
        self.elapsed = (self.elapsed + dt.max(0.0)).min(self.lag);
        let t = self.elapsed / self.lag;
        self.head = if t >= 1.0 {
            self.to
        } else {
            lerp(self.from, self.to, self.ease.apply(t))
        };
        self.head
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_range() {
        assert_eq!(scroll_progress(0.0, 3000.0, 1000.0), 0.0);
        assert_eq!(scroll_progress(1000.0, 3000.0, 1000.0), 0.5);
        assert_eq!(scroll_progress(2000.0, 3000.0, 1000.0), 1.0);
        // Overscroll clamps
        assert_eq!(scroll_progress(2500.0, 3000.0, 1000.0), 1.0);
        assert_eq!(scroll_progress(-50.0, 3000.0, 1000.0), 0.0);
    }

    #[test]
    fn test_progress_unscrollable() {
        assert_eq!(scroll_progress(10.0, 800.0, 800.0), 0.0);
        assert_eq!(scroll_progress(10.0, 600.0, 800.0), 0.0);
    }

    #[test]
    fn test_zero_lag_snaps() {
        let mut scrub = ScrubController::new(0.0, Ease::Power3Out);
        scrub.set_target(2.0);
        assert_eq!(scrub.head(), 2.0);
        assert_eq!(scrub.advance(0.016), 2.0);
    }

    #[test]
    fn test_lag_reaches_target_after_window() {
        let mut scrub = ScrubController::new(1.0, Ease::Power3Out);
        scrub.set_target(4.0);

        let first = scrub.advance(0.1);
        assert!(first > 0.0 && first < 4.0);

        for _ in 0..20 {
            scrub.advance(0.1);
        }
        assert_eq!(scrub.head(), 4.0);
        assert!(scrub.is_settled());
    }

    #[test]
    fn test_retarget_starts_from_current_head() {
        let mut scrub = ScrubController::new(1.0, Ease::Linear);
        scrub.set_target(10.0);
        scrub.advance(0.5);
        assert_eq!(scrub.head(), 5.0);

        // Scroll back up mid catch-up
        scrub.set_target(0.0);
        scrub.advance(0.5);
        assert_eq!(scrub.head(), 2.5);
    }

    #[test]
    fn test_snap() {
        let mut scrub = ScrubController::new(1.0, Ease::Linear);
        scrub.set_target(3.0);
        scrub.snap(1.0);
        assert_eq!(scrub.advance(0.5), 1.0);
        assert_eq!(scrub.target(), 1.0);
    }
}
