use serde::Serialize;

use crate::{constants::DEFAULT_STEP_MINUTES, schema::CocktailSummary};

/// Countdown length of one step, kept in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StepDuration(u32);

impl StepDuration {
    /// A zero or overflowing duration falls back to the default step length.
    pub fn from_minutes(minutes: u32) -> Self {
        match minutes.checked_mul(60) {
            None | Some(0) => Self::default(),
            Some(seconds) => Self(seconds),
        }
    }

    /// Accepts fractional minutes; anything non-numeric or non-positive falls back to the default.
    pub fn parse(minutes: &str) -> Self {
        match minutes.trim().parse::<f64>() {
            Ok(minutes) if minutes.is_finite() && minutes > 0. => {
                Self(((minutes * 60.).round() as u32).max(1))
            }
            _ => {
                log::debug!("> Invalid step duration {minutes:?}, using default");
                Self::default()
            }
        }
    }

    pub fn seconds(&self) -> u32 {
        self.0
    }
}

impl Default for StepDuration {
    fn default() -> Self {
        Self(DEFAULT_STEP_MINUTES * 60)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SessionState {
    Idle,
    Running,
    Paused,
    Completed,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SessionEvent {
    StepChanged { recipe: CocktailSummary, index: usize },
    Tick { remaining: u32 },
    Completed,
}

/// Step-through preparation of an ordered sequence of cocktails.
///
/// Transitions return the events they produce; scheduling the tick is left to the caller.
#[derive(Debug, Clone)]
pub struct GuidedSession {
    sequence: Vec<CocktailSummary>,
    index: usize,
    configured: StepDuration,
    remaining: u32,
    state: SessionState,
}

impl Default for GuidedSession {
    fn default() -> Self {
        Self {
            sequence: vec![],
            index: 0,
            configured: StepDuration::default(),
            remaining: StepDuration::default().seconds(),
            state: SessionState::Idle,
        }
    }
}

impl GuidedSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    pub fn configured(&self) -> StepDuration {
        self.configured
    }

    pub fn len(&self) -> usize {
        self.sequence.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sequence.is_empty()
    }

    pub fn current(&self) -> Option<&CocktailSummary> {
        match self.state {
            SessionState::Running | SessionState::Paused => self.sequence.get(self.index),
            _ => None,
        }
    }

    fn is_active(&self) -> bool {
        matches!(self.state, SessionState::Running | SessionState::Paused)
    }

    fn enter_step(&mut self, index: usize) -> Vec<SessionEvent> {
        self.index = index;
        self.remaining = self.configured.seconds();
        self.state = SessionState::Running;

        match self.sequence.get(index) {
            Some(recipe) => vec![
                SessionEvent::StepChanged {
                    recipe: recipe.clone(),
                    index,
                },
                SessionEvent::Tick {
                    remaining: self.remaining,
                },
            ],
            None => vec![],
        }
    }

    pub fn start(&mut self, sequence: Vec<CocktailSummary>, duration: StepDuration) -> Vec<SessionEvent> {
        if sequence.is_empty() {
            log::debug!("> Ignoring start with an empty sequence");
            return vec![];
        }

        self.sequence = sequence;
        self.configured = duration;
        self.enter_step(0)
    }

    /// One second elapsed. The countdown rests at zero, it never advances the step.
    pub fn tick(&mut self) -> Option<SessionEvent> {
        if self.state != SessionState::Running || self.remaining == 0 {
            return None;
        }

        self.remaining -= 1;
        Some(SessionEvent::Tick {
            remaining: self.remaining,
        })
    }

    pub fn pause(&mut self) -> bool {
        if self.state != SessionState::Running {
            return false;
        }
        self.state = SessionState::Paused;
        true
    }

    pub fn resume(&mut self) -> bool {
        if self.state != SessionState::Paused {
            return false;
        }
        self.state = SessionState::Running;
        true
    }

    /// Replaces the step length and restarts the countdown; index and pause state are kept.
    pub fn set_duration(&mut self, duration: StepDuration) -> Vec<SessionEvent> {
        self.configured = duration;
        self.remaining = duration.seconds();

        vec![SessionEvent::Tick {
            remaining: self.remaining,
        }]
    }

    pub fn restart(&mut self) -> Vec<SessionEvent> {
        if !self.is_active() {
            return vec![];
        }
        self.remaining = self.configured.seconds();

        vec![SessionEvent::Tick {
            remaining: self.remaining,
        }]
    }

    pub fn next(&mut self) -> Vec<SessionEvent> {
        if !self.is_active() {
            return vec![];
        }

        match self.index + 1 < self.sequence.len() {
            true => self.enter_step(self.index + 1),
            false => self.close(),
        }
    }

    pub fn prev(&mut self) -> Vec<SessionEvent> {
        if !self.is_active() || self.index == 0 {
            return vec![];
        }
        self.enter_step(self.index - 1)
    }

    pub fn close(&mut self) -> Vec<SessionEvent> {
        if self.state == SessionState::Completed {
            return vec![];
        }
        self.state = SessionState::Completed;
        vec![SessionEvent::Completed]
    }

    pub fn cancel(&mut self) -> Vec<SessionEvent> {
        self.close()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::tests::summary;

    fn sequence() -> Vec<CocktailSummary> {
        vec![
            summary(1, "Mojito", &[], &[]),
            summary(2, "Piña Colada", &[], &[]),
            summary(3, "Margarita", &[], &[]),
        ]
    }

    fn started() -> GuidedSession {
        let mut session = GuidedSession::new();
        session.start(sequence(), StepDuration::default());
        session
    }

    #[test]
    fn durations_are_minutes_with_a_two_minute_fallback() {
        assert_eq!(StepDuration::default().seconds(), 120);
        assert_eq!(StepDuration::from_minutes(5).seconds(), 300);
        assert_eq!(StepDuration::from_minutes(0).seconds(), 120);
        assert_eq!(StepDuration::from_minutes(80_000_000).seconds(), 120);
        assert_eq!(StepDuration::parse("3").seconds(), 180);
        assert_eq!(StepDuration::parse("2.5").seconds(), 150);
        assert_eq!(StepDuration::parse("abc").seconds(), 120);
        assert_eq!(StepDuration::parse("-4").seconds(), 120);
        assert_eq!(StepDuration::parse("").seconds(), 120);
    }

    #[test]
    fn start_enters_first_step_running() {
        let mut session = GuidedSession::new();
        let events = session.start(sequence(), StepDuration::from_minutes(3));

        assert_eq!(session.state(), SessionState::Running);
        assert_eq!(session.index(), 0);
        assert_eq!(session.remaining(), 180);
        assert!(matches!(events[0], SessionEvent::StepChanged { index: 0, .. }));
    }

    #[test]
    fn empty_sequence_is_ignored() {
        let mut session = GuidedSession::new();

        assert!(session.start(vec![], StepDuration::default()).is_empty());
        assert_eq!(session.state(), SessionState::Idle);
        assert!(session.next().is_empty());
    }

    #[test]
    fn next_walks_to_the_end_then_completes() {
        let mut session = started();

        for _ in 0..session.len() - 1 {
            session.tick();
            session.next();
            assert_eq!(session.remaining(), 120);
        }
        assert_eq!(session.index(), 2);
        assert_eq!(session.state(), SessionState::Running);

        assert_eq!(session.next(), vec![SessionEvent::Completed]);
        assert_eq!(session.state(), SessionState::Completed);
        assert!(session.current().is_none());
    }

    #[test]
    fn prev_is_a_no_op_on_the_first_step() {
        let mut session = started();
        session.tick();

        assert!(session.prev().is_empty());
        assert_eq!(session.remaining(), 119);

        session.next();
        session.pause();
        session.prev();
        assert_eq!(session.index(), 0);
        assert_eq!(session.state(), SessionState::Running);
    }

    #[test]
    fn pause_freezes_the_countdown() {
        let mut session = started();
        session.tick();
        session.tick();

        assert!(session.pause());
        assert!(session.tick().is_none());
        assert!(session.resume());
        assert_eq!(session.remaining(), 118);
        assert!(!session.resume());
    }

    #[test]
    fn countdown_rests_at_zero() {
        let mut session = GuidedSession::new();
        session.start(sequence(), StepDuration::parse("0.02"));
        assert_eq!(session.remaining(), 1);

        assert_eq!(session.tick(), Some(SessionEvent::Tick { remaining: 0 }));
        assert!(session.tick().is_none());
        assert_eq!(session.index(), 0);
        assert_eq!(session.state(), SessionState::Running);
    }

    #[test]
    fn set_duration_resets_in_any_state() {
        let mut session = started();
        session.tick();
        session.pause();

        session.set_duration(StepDuration::from_minutes(5));
        assert_eq!(session.remaining(), 300);
        assert_eq!(session.state(), SessionState::Paused);

        session.close();
        session.set_duration(StepDuration::from_minutes(5));
        assert_eq!(session.remaining(), 300);
    }

    #[test]
    fn restart_restores_the_configured_duration() {
        let mut session = started();
        session.tick();
        session.pause();

        session.restart();
        assert_eq!(session.remaining(), 120);
        assert_eq!(session.state(), SessionState::Paused);
    }

    #[test]
    fn close_completes_from_any_state_once() {
        let mut session = GuidedSession::new();
        assert_eq!(session.close(), vec![SessionEvent::Completed]);

        let mut session = started();
        session.pause();
        assert_eq!(session.cancel(), vec![SessionEvent::Completed]);
        assert!(session.close().is_empty());
    }
}
