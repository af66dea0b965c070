//! Countdown over debug artifact URLs, one per host re-invocation.

/// Position of the iterator within one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DebugState {
  /// No request has been started.
  #[default]
  Idle,
  /// URLs remain; `cursor` counts the URLs not yet consumed.
  Emitting {
    /// One past the index of the URL most recently yielded.
    cursor: usize,
  },
  /// Every URL has been yielded.
  Exhausted,
}

/// Result of a pull after the first URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pull {
  /// URL to publish, when one remains.
  pub url: Option<String>,
  /// Whether the host should invoke the tag body again.
  pub more: bool,
}

/// Hands out URLs from the tail of a reversed artifact list towards its head.
///
/// The compiler reverses the debug artifact list, so counting down from the end surfaces
/// the artifacts in page order.
#[derive(Debug, Clone, Default)]
pub struct DebugIterator {
  urls: Vec<String>,
  state: DebugState,
}

impl DebugIterator {
  /// Idle iterator.
  pub fn new() -> Self {
    Self::default()
  }

  /// Current state.
  pub fn state(&self) -> DebugState {
    self.state
  }

  /// Begin a request and return the first URL to publish.
  ///
  /// Any previous request is discarded.
  pub fn start(&mut self, urls: Vec<String>) -> Option<&str> {
    let cursor = urls.len();
    self.urls = urls;
    if cursor == 0 {
      self.state = DebugState::Exhausted;
      return None;
    }

    self.state = DebugState::Emitting { cursor };
    Some(self.urls[cursor - 1].as_str())
  }

  /// Advance past the URL yielded last.
  ///
  /// The cursor is decremented first; the URL for the new cursor is returned while it is
  /// positive, and `more` reports whether it still is.
  pub fn pull(&mut self) -> Pull {
    let DebugState::Emitting { cursor } = self.state else {
      return Pull {
        url: None,
        more: false,
      };
    };

    let cursor = cursor - 1;
    if cursor > 0 {
      self.state = DebugState::Emitting { cursor };
      Pull {
        url: Some(self.urls[cursor - 1].clone()),
        more: true,
      }
    } else {
      self.state = DebugState::Exhausted;
      Pull {
        url: None,
        more: false,
      }
    }
  }

  /// Drop the current request and return to [`DebugState::Idle`].
  pub fn reset(&mut self) {
    self.urls.clear();
    self.state = DebugState::Idle;
  }
}
