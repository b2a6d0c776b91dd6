use rvb_gameplay::protocol::SocialOut;
use std::collections::VecDeque;

/// Buffer for the high-frequency social channel.
///
/// Gestures never touch the game state machine; they pool here and the
/// run-loop flushes them as one batch per tick. The buffer is bounded and
/// drops its oldest entries rather than ever blocking the loop.
#[derive(Debug)]
pub struct SocialHub {
    queue: VecDeque<SocialOut>,
    cap: usize,
}

impl Default for SocialHub {
    fn default() -> Self {
        Self::new(rvb_core::SOCIAL_OUTBOX_CAP)
    }
}

impl SocialHub {
    pub fn new(cap: usize) -> Self {
        assert!(cap > 0);
        Self {
            queue: VecDeque::with_capacity(cap),
            cap,
        }
    }
    pub fn push(&mut self, event: SocialOut) {
        if self.queue.len() == self.cap {
            self.queue.pop_front();
        }
        self.queue.push_back(event);
    }
    pub fn drain(&mut self) -> Vec<SocialOut> {
        self.queue.drain(..).collect()
    }
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rvb_gameplay::protocol::SocialGesture;

    fn gesture(seat: usize) -> SocialOut {
        SocialOut {
            seat,
            gesture: SocialGesture {
                r#type: "WAVE".to_string(),
                target_seat: None,
            },
        }
    }

    #[test]
    fn overflow_drops_oldest() {
        let mut hub = SocialHub::new(2);
        hub.push(gesture(0));
        hub.push(gesture(1));
        hub.push(gesture(2));
        let drained = hub.drain();
        assert_eq!(drained.len(), 2);
        assert_eq!(drained[0].seat, 1);
        assert_eq!(drained[1].seat, 2);
        assert!(hub.is_empty());
    }
}
