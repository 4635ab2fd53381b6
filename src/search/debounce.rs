use std::time::{Duration, Instant};

/// Trailing-edge debounce driven by an explicit clock.
///
/// Every [`push`](Self::push) restarts the quiet period and replaces the pending value, so only
/// the last input of a burst is released by [`poll`](Self::poll).
#[derive(Debug, Clone)]
pub struct Debouncer<T> {
  delay: Duration,
  pending: Option<(Instant, T)>,
}

impl<T> Debouncer<T> {
  pub fn new(delay: Duration) -> Self {
    Self {
      delay,
      pending: None,
    }
  }

  pub fn delay(&self) -> Duration {
    self.delay
  }

  pub fn push(&mut self, now: Instant, value: T) {
    self.pending = Some((now + self.delay, value));
  }

  /// When the pending value becomes due, if any.
  pub fn deadline(&self) -> Option<Instant> {
    self.pending.as_ref().map(|(deadline, _)| *deadline)
  }

  pub fn is_pending(&self) -> bool {
    self.pending.is_some()
  }

  /// Release the pending value once its quiet period has elapsed.
  pub fn poll(&mut self, now: Instant) -> Option<T> {
    match self.deadline() {
      Some(deadline) if now >= deadline => self.pending.take().map(|(_, value)| value),
      _ => None,
    }
  }

  pub fn cancel(&mut self) {
    self.pending = None;
  }
}
