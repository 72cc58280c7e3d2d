use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub text: String,
    pub expires_at: Instant,
}

/// Handle for the notice that was current when it was posted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NoticeTicket(u64);

/// Holds at most one transient message. A new post supersedes the old one,
/// and expiring a superseded ticket does nothing.
#[derive(Debug, Clone)]
pub struct NoticeBoard {
    current: Option<(NoticeTicket, Notice)>,
    next_ticket: u64,
    duration: Duration,
}

impl NoticeBoard {
    pub fn new(duration: Duration) -> Self {
        Self {
            current: None,
            next_ticket: 0,
            duration,
        }
    }

    pub fn post(&mut self, kind: NoticeKind, text: impl Into<String>) -> NoticeTicket {
        self.post_at(kind, text, Instant::now())
    }

    pub fn post_at(&mut self, kind: NoticeKind, text: impl Into<String>, now: Instant) -> NoticeTicket {
        self.next_ticket += 1;
        let ticket = NoticeTicket(self.next_ticket);
        let notice = Notice {
            kind,
            text: text.into(),
            expires_at: now + self.duration,
        };
        self.current = Some((ticket, notice));
        ticket
    }

    pub fn current(&self) -> Option<&Notice> {
        self.current.as_ref().map(|(_, notice)| notice)
    }

    /// Clear the notice only if `ticket` is still the current one.
    pub fn expire(&mut self, ticket: NoticeTicket) -> bool {
        if matches!(&self.current, Some((current, _)) if *current == ticket) {
            self.current = None;
            return true;
        }
        false
    }

    pub fn expire_due(&mut self, now: Instant) -> bool {
        if matches!(&self.current, Some((_, notice)) if notice.expires_at <= now) {
            self.current = None;
            return true;
        }
        false
    }

    pub fn clear(&mut self) {
        self.current = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stale_ticket_does_not_clear_newer_notice() {
        let mut board = NoticeBoard::new(Duration::from_secs(3));
        let first = board.post(NoticeKind::Success, "saved");
        let second = board.post(NoticeKind::Error, "failed");
        assert!(!board.expire(first));
        assert_eq!(board.current().map(|n| n.text.as_str()), Some("failed"));
        assert!(board.expire(second));
        assert!(board.current().is_none());
    }

    #[test]
    fn expires_after_duration() {
        let mut board = NoticeBoard::new(Duration::from_secs(3));
        let now = Instant::now();
        board.post_at(NoticeKind::Success, "saved", now);
        assert!(!board.expire_due(now + Duration::from_secs(2)));
        assert!(board.expire_due(now + Duration::from_secs(3)));
        assert!(board.current().is_none());
    }
}
