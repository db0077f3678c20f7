use std::{
    sync::{Arc, Mutex, MutexGuard},
    time::Duration,
};

use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use super::{
    guided::{GuidedSession, SessionEvent, SessionState, StepDuration},
    queue::PreparationQueue,
    task::PeriodicTask,
};
use crate::{config::Config, schema::CocktailSummary};

const TICK_PERIOD: Duration = Duration::from_secs(1);

/// Session state plus the generation of the ticker allowed to advance it.
struct Shared {
    session: GuidedSession,
    generation: u64,
}

fn lock(shared: &Mutex<Shared>) -> MutexGuard<'_, Shared> {
    shared.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn emit(sender: &UnboundedSender<SessionEvent>, events: Vec<SessionEvent>) {
    for event in events {
        if sender.send(event).is_err() {
            log::trace!("> Session event receiver dropped");
            return;
        }
    }
}

/// Drives a [`GuidedSession`] in real time.
///
/// Owns at most one ticking task, cancelled before every transition that
/// resets or ends the countdown. Every transition also bumps the generation
/// under the session lock, so a tick already waiting on the lock when its task
/// is aborted finds a newer generation and does nothing.
pub struct GuidedSessionController {
    shared: Arc<Mutex<Shared>>,
    ticker: Option<PeriodicTask>,
    default_duration: StepDuration,
    events: UnboundedSender<SessionEvent>,
}

impl GuidedSessionController {
    pub fn new(default_duration: StepDuration) -> (Self, UnboundedReceiver<SessionEvent>) {
        let (events, receiver) = mpsc::unbounded_channel();

        let controller = Self {
            shared: Arc::new(Mutex::new(Shared {
                session: GuidedSession::new(),
                generation: 0,
            })),
            ticker: None,
            default_duration,
            events,
        };

        (controller, receiver)
    }

    pub fn from_config(config: &Config) -> (Self, UnboundedReceiver<SessionEvent>) {
        Self::new(StepDuration::from_minutes(config.step_minutes))
    }

    pub fn state(&self) -> SessionState {
        lock(&self.shared).session.state()
    }

    pub fn index(&self) -> usize {
        lock(&self.shared).session.index()
    }

    pub fn remaining(&self) -> u32 {
        lock(&self.shared).session.remaining()
    }

    pub fn current(&self) -> Option<CocktailSummary> {
        lock(&self.shared).session.current().cloned()
    }

    pub fn is_ticking(&self) -> bool {
        self.ticker.as_ref().is_some_and(|ticker| !ticker.is_finished())
    }

    fn cancel_ticker(&mut self) {
        if let Some(ticker) = self.ticker.take() {
            ticker.cancel();
        }
    }

    fn schedule(&mut self) {
        self.cancel_ticker();

        let generation = {
            let mut shared = lock(&self.shared);
            if shared.session.state() != SessionState::Running {
                return;
            }
            shared.generation += 1;
            shared.generation
        };

        let shared = self.shared.clone();
        let events = self.events.clone();

        self.ticker = Some(PeriodicTask::spawn(TICK_PERIOD, move || {
            let mut shared = lock(&shared);
            if shared.generation != generation {
                return false;
            }

            match shared.session.tick() {
                Some(event) => {
                    let remaining = shared.session.remaining();
                    emit(&events, vec![event]);
                    remaining > 0
                }
                None => false,
            }
        }));
    }

    fn transition<F>(&mut self, f: F)
    where
        F: FnOnce(&mut GuidedSession) -> Vec<SessionEvent>,
    {
        self.cancel_ticker();
        let events = {
            let mut shared = lock(&self.shared);
            shared.generation += 1;
            f(&mut shared.session)
        };
        emit(&self.events, events);
        self.schedule();
    }

    pub fn start(&mut self, sequence: Vec<CocktailSummary>, duration: Option<StepDuration>) {
        let duration = duration.unwrap_or(self.default_duration);
        self.transition(|session| session.start(sequence, duration));
    }

    pub fn start_queue(&mut self, queue: PreparationQueue, duration: Option<StepDuration>) {
        self.start(queue.into_sequence(), duration);
    }

    pub fn pause(&mut self) {
        let paused = {
            let mut shared = lock(&self.shared);
            let paused = shared.session.pause();
            if paused {
                shared.generation += 1;
            }
            paused
        };
        if paused {
            self.cancel_ticker();
        }
    }

    pub fn resume(&mut self) {
        let resumed = lock(&self.shared).session.resume();
        if resumed {
            self.schedule();
        }
    }

    /// Pause when running, resume when paused.
    pub fn toggle_pause(&mut self) {
        match self.state() {
            SessionState::Running => self.pause(),
            SessionState::Paused => self.resume(),
            _ => (),
        }
    }

    pub fn set_duration(&mut self, duration: StepDuration) {
        self.transition(|session| session.set_duration(duration));
    }

    pub fn restart(&mut self) {
        self.transition(|session| session.restart());
    }

    pub fn next(&mut self) {
        self.transition(|session| session.next());
    }

    pub fn prev(&mut self) {
        self.transition(|session| session.prev());
    }

    pub fn close(&mut self) {
        self.transition(|session| session.close());
    }

    pub fn cancel(&mut self) {
        self.close();
    }
}
