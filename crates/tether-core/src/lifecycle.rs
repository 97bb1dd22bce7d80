//! Read-time classification of bindings.

use crate::binding::Binding;
use crate::error::Error;
use crate::event::{LifecycleEvent, Opcode};
use crate::settings::BindingSettings;
use crate::short_id::ShortId;
use crate::target::non_empty;
use jiff::Timestamp;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Active,
    /// `now` is strictly after the expiration date.
    Expired,
    /// The counter is strictly above the max-access count.
    Exhausted,
}

impl Binding {
    /// Classifies the binding at `now`. Expiration is checked first.
    ///
    /// The counter is compared with a strict `>`: with a limit of `n` and a
    /// counter that includes the current read, the `n`th read is still
    /// active and the `n + 1`th is exhausted.
    pub fn state_at(&self, now: Timestamp) -> LifecycleState {
        if self.expire_at.is_some_and(|expire_at| now > expire_at) {
            return LifecycleState::Expired;
        }
        if self.max_access.is_some_and(|max| max > 0 && self.counter > max) {
            return LifecycleState::Exhausted;
        }
        LifecycleState::Active
    }
}

/// Where a read should send the reader, and why.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Redirect {
    pub id: ShortId,
    pub state: LifecycleState,
    /// The redirect target. Only `None` for expired or exhausted bindings
    /// when neither the binding nor the settings name a fallback.
    pub target: Option<String>,
}

impl Redirect {
    pub fn is_active(&self) -> bool {
        self.state == LifecycleState::Active
    }

    /// `UrlExpired` or `UrlExhausted` for the terminal states.
    ///
    /// These accompany the target; they do not replace it.
    pub fn error(&self) -> Option<Error> {
        match self.state {
            LifecycleState::Active => None,
            LifecycleState::Expired => Some(Error::UrlExpired),
            LifecycleState::Exhausted => Some(Error::UrlExhausted),
        }
    }

    /// The event a read with this outcome emits.
    pub fn event(&self) -> LifecycleEvent {
        let opcode = match self.state {
            LifecycleState::Active => Opcode::Get,
            LifecycleState::Expired => Opcode::Expired,
            LifecycleState::Exhausted => Opcode::Exhausted,
        };
        let event = LifecycleEvent::new(self.id.clone(), opcode);
        match self.error() {
            Some(error) => event.with_error(error),
            None => event,
        }
    }
}

/// Picks the redirect for `binding` at `now`.
///
/// Fallbacks resolve binding first, then settings; an empty URL counts as
/// unset at both levels.
pub fn evaluate(binding: Binding, now: Timestamp, settings: &BindingSettings) -> Redirect {
    let state = binding.state_at(now);
    let target = match state {
        LifecycleState::Active => Some(binding.url),
        LifecycleState::Expired => non_empty(binding.expired_url)
            .or_else(|| non_empty(settings.expired_redirect_url.clone())),
        LifecycleState::Exhausted => non_empty(binding.exhausted_url)
            .or_else(|| non_empty(settings.exhausted_redirect_url.clone())),
    };

    Redirect {
        id: binding.id,
        state,
        target,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jiff::SignedDuration;

    fn now() -> Timestamp {
        Timestamp::from_second(1_700_000_000).unwrap()
    }

    fn binding() -> Binding {
        Binding {
            id: ShortId::new_unchecked("abc123"),
            url: "https://example.com".to_string(),
            bound_at: now() - SignedDuration::from_hours(1),
            expire_at: None,
            max_access: None,
            counter: 0,
            expired_url: None,
            exhausted_url: None,
        }
    }

    fn settings() -> BindingSettings {
        BindingSettings::builder()
            .expired_redirect_url("https://example.com/expired")
            .exhausted_redirect_url("https://example.com/exhausted")
            .build()
    }

    #[test]
    fn unlimited_binding_is_active() {
        let mut b = binding();
        b.counter = 1_000_000;

        let redirect = evaluate(b, now(), &settings());
        assert!(redirect.is_active());
        assert_eq!(redirect.target.as_deref(), Some("https://example.com"));
        assert_eq!(redirect.error(), None);
    }

    #[test]
    fn counter_equal_to_limit_is_active() {
        let mut b = binding();
        b.max_access = Some(3);
        b.counter = 3;

        assert_eq!(b.state_at(now()), LifecycleState::Active);
    }

    #[test]
    fn counter_above_limit_is_exhausted() {
        let mut b = binding();
        b.max_access = Some(3);
        b.counter = 4;

        let redirect = evaluate(b, now(), &settings());
        assert_eq!(redirect.state, LifecycleState::Exhausted);
        assert_eq!(
            redirect.target.as_deref(),
            Some("https://example.com/exhausted")
        );
        assert_eq!(redirect.error(), Some(Error::UrlExhausted));
    }

    #[test]
    fn expiration_instant_itself_is_still_active() {
        let mut b = binding();
        b.expire_at = Some(now());

        assert_eq!(b.state_at(now()), LifecycleState::Active);
    }

    #[test]
    fn past_expiration_uses_binding_fallback_first() {
        let mut b = binding();
        b.expire_at = Some(now() - SignedDuration::from_secs(1));
        b.expired_url = Some("https://example.com/mine".to_string());

        let redirect = evaluate(b, now(), &settings());
        assert_eq!(redirect.state, LifecycleState::Expired);
        assert_eq!(redirect.target.as_deref(), Some("https://example.com/mine"));
        assert_eq!(redirect.error(), Some(Error::UrlExpired));
    }

    #[test]
    fn past_expiration_falls_back_to_settings() {
        let mut b = binding();
        b.expire_at = Some(now() - SignedDuration::from_secs(1));
        b.expired_url = Some(String::new());

        let redirect = evaluate(b, now(), &settings());
        assert_eq!(
            redirect.target.as_deref(),
            Some("https://example.com/expired")
        );
    }

    #[test]
    fn no_fallback_anywhere_means_no_target() {
        let mut b = binding();
        b.expire_at = Some(now() - SignedDuration::from_secs(1));

        let redirect = evaluate(b, now(), &BindingSettings::default());
        assert_eq!(redirect.state, LifecycleState::Expired);
        assert_eq!(redirect.target, None);
    }

    #[test]
    fn expiration_takes_precedence_over_exhaustion() {
        let mut b = binding();
        b.expire_at = Some(now() - SignedDuration::from_secs(1));
        b.max_access = Some(1);
        b.counter = 10;

        let redirect = evaluate(b, now(), &settings());
        assert_eq!(redirect.state, LifecycleState::Expired);
    }

    #[test]
    fn events_follow_state() {
        let mut b = binding();
        b.max_access = Some(1);

        b.counter = 1;
        let active = evaluate(b.clone(), now(), &settings()).event();
        assert_eq!(active.opcode, Opcode::Get);
        assert_eq!(active.error, None);

        b.counter = 2;
        let exhausted = evaluate(b.clone(), now(), &settings()).event();
        assert_eq!(exhausted.opcode, Opcode::Exhausted);
        assert_eq!(exhausted.error, Some(Error::UrlExhausted));

        b.expire_at = Some(now() - SignedDuration::from_secs(1));
        let expired = evaluate(b, now(), &settings()).event();
        assert_eq!(expired.opcode, Opcode::Expired);
        assert_eq!(expired.error, Some(Error::UrlExpired));
        assert_eq!(expired.id.as_str(), "abc123");
    }
}
