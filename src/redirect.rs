use http::StatusCode;
/// A type that controls the policy on how to handle the following of
/// redirects.
///
/// - `limited` follows up to the given number of hops in a chain.
/// - `none` disables all redirect behavior, so the caller observes the
///   exact first response.
#[derive(Clone, Debug, PartialEq)]
pub enum Policy {
  /// follow up to this many hops
  Limit(usize),
  /// never follow
  None,
}

/// A type that holds information on the next request and previous requests
/// in a redirect chain.
#[derive(Clone, Debug, PartialEq)]
pub struct Attempt<'a> {
  status: StatusCode,
  next: &'a http::Uri,
  previous: &'a [http::Uri],
}

/// An action to perform when a redirect status code is found.
#[derive(Clone, Debug, PartialEq)]
pub enum Action {
  /// Follow
  Follow,
  /// Stop
  Stop,
}

impl Policy {
  /// Create a `Policy` with a maximum number of redirects.
  pub fn limited(max: usize) -> Self {
    Policy::Limit(max)
  }
  /// Create a `Policy` that does not follow any redirect.
  pub fn none() -> Self {
    Policy::None
  }
  /// Evaluate this policy against a redirect attempt.
  pub fn redirect(&self, attempt: Attempt) -> Action {
    match self {
      Policy::Limit(max) => {
        if attempt.previous.len() >= *max {
          attempt.stop()
        } else {
          attempt.follow()
        }
      }
      Policy::None => attempt.stop(),
    }
  }

  pub(crate) fn check(&self, status: StatusCode, next: &http::Uri, previous: &[http::Uri]) -> Action {
    self.redirect(Attempt {
      status,
      next,
      previous,
    })
  }
}

impl Default for Policy {
  fn default() -> Policy {
    Policy::limited(10)
  }
}

impl<'a> Attempt<'a> {
  /// Get the type of redirect.
  pub fn status(&self) -> StatusCode {
    self.status
  }
  /// Get the next URL to redirect to.
  pub fn url(&self) -> &http::Uri {
    self.next
  }
  /// Get the list of previous URLs already requested in this chain.
  pub fn previous(&self) -> &[http::Uri] {
    self.previous
  }
  /// Returns an action meaning the client should follow the next URL.
  pub fn follow(self) -> Action {
    Action::Follow
  }
  /// Returns an action meaning the client should not follow the next URL.
  ///
  /// The 30x response is returned as the `Ok` result.
  pub fn stop(self) -> Action {
    Action::Stop
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn none_always_stops() {
    let next = http::Uri::from_static("http://a.test/next");
    let action = Policy::none().check(StatusCode::FOUND, &next, &[]);
    assert_eq!(action, Action::Stop);
  }

  #[test]
  fn limit_stops_after_max_hops() {
    let next = http::Uri::from_static("http://a.test/next");
    let previous = vec![http::Uri::from_static("http://a.test/1")];
    let policy = Policy::limited(1);
    assert_eq!(policy.check(StatusCode::FOUND, &next, &[]), Action::Follow);
    assert_eq!(policy.check(StatusCode::FOUND, &next, &previous), Action::Stop);
  }
}
