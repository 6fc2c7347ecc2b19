const WINDOW_LENGTH: usize = 3;

/// A fixed length history of outgoing queue depths used to detect a congested network.
///
/// One sample is pushed per statistics tick and the oldest is discarded.  Degradation
/// is only signalled when the depth has risen across every adjacent pair in the window,
/// so a queue that is merely large (but stable) or briefly spikes never trips it.
pub struct BackpressureWindow {
    samples: Vec<usize>,
}

impl BackpressureWindow {
    pub fn new() -> BackpressureWindow {
        BackpressureWindow {
            samples: Vec::with_capacity(WINDOW_LENGTH),
        }
    }

    /// Records the latest queue depth and reports whether the window now shows a
    /// strictly increasing trend
    pub fn push(&mut self, queue_depth: usize) -> bool {
        if self.samples.len() == WINDOW_LENGTH {
            self.samples.remove(0);
        }

        self.samples.push(queue_depth);
        if self.samples.len() < WINDOW_LENGTH {
            return false;
        }

        self.samples
            .windows(2)
            .all(|pair| pair[1] > pair[0])
    }

    pub fn reset(&mut self) {
        self.samples.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strictly_increasing_window_signals_degradation() {
        let mut window = BackpressureWindow::new();
        assert_eq!(window.push(100), false, "Window not full yet");
        assert_eq!(window.push(200), false, "Window not full yet");
        assert_eq!(window.push(300), true, "Expected degradation signal");
    }

    #[test]
    fn flat_queue_does_not_signal() {
        let mut window = BackpressureWindow::new();
        window.push(500);
        window.push(500);
        assert_eq!(window.push(500), false, "Flat depth should not signal");
    }

    #[test]
    fn single_dip_resets_the_trend() {
        let mut window = BackpressureWindow::new();
        window.push(100);
        window.push(200);
        assert_eq!(window.push(150), false, "Dip should not signal");
        assert_eq!(window.push(200), false, "Dip still inside the window");
        assert_eq!(window.push(250), true, "Trend re-established");
    }

    #[test]
    fn idle_queue_never_signals() {
        let mut window = BackpressureWindow::new();
        for _ in 0..10 {
            assert_eq!(window.push(0), false, "Idle queue should never signal");
        }
    }

    #[test]
    fn reset_empties_the_history() {
        let mut window = BackpressureWindow::new();
        window.push(100);
        window.push(200);
        window.reset();
        assert_eq!(window.push(300), false, "History should have been discarded");
    }
}
