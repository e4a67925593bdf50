use crate::hub::error::{HubError, HubResult};
use crate::hub::types::{HubEvent, HubState};
use parking_lot::RwLock;
use tokio::sync::watch;

/// Hub lifecycle: `Disabled -> Enabled -> Active`, and back
pub struct HubStateMachine {
    state: RwLock<HubState>,
    watch_tx: watch::Sender<HubState>,
}

impl Default for HubStateMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl HubStateMachine {
    pub fn new() -> Self {
        let (watch_tx, _) = watch::channel(HubState::Disabled);

        Self {
            state: RwLock::new(HubState::Disabled),
            watch_tx,
        }
    }

    /// Get current state
    pub fn current_state(&self) -> HubState {
        *self.state.read()
    }

    /// Receiver notified on every successful transition
    pub fn subscribe(&self) -> watch::Receiver<HubState> {
        self.watch_tx.subscribe()
    }

    /// Transition state based on event
    ///
    /// Rejected events leave the state untouched.
    pub fn transition(&self, event: HubEvent) -> HubResult<HubState> {
        let mut state = self.state.write();

        let new_state = match (*state, event) {
            (HubState::Disabled, HubEvent::Enable) => HubState::Enabled,

            // Enabling twice is harmless
            (HubState::Enabled | HubState::Active, HubEvent::Enable) => *state,

            (_, HubEvent::Disable) => HubState::Disabled,

            (HubState::Enabled | HubState::Active, HubEvent::Activate) => HubState::Active,

            (HubState::Active | HubState::Enabled, HubEvent::Deactivate) => HubState::Enabled,

            // Invalid transition
            (current, event) => {
                return Err(HubError::InvalidStateTransition {
                    state: current,
                    event,
                });
            }
        };

        *state = new_state;
        self.watch_tx.send_replace(new_state);
        Ok(new_state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_machine_creation() {
        let sm = HubStateMachine::new();
        assert_eq!(sm.current_state(), HubState::Disabled);
    }

    #[test]
    fn test_full_lifecycle() {
        let sm = HubStateMachine::new();

        assert_eq!(sm.transition(HubEvent::Enable).unwrap(), HubState::Enabled);
        assert_eq!(sm.transition(HubEvent::Activate).unwrap(), HubState::Active);
        assert_eq!(sm.transition(HubEvent::Deactivate).unwrap(), HubState::Enabled);
        assert_eq!(sm.transition(HubEvent::Disable).unwrap(), HubState::Disabled);
    }

    #[test]
    fn test_activate_while_disabled_fails() {
        let sm = HubStateMachine::new();

        let result = sm.transition(HubEvent::Activate);

        assert!(matches!(
            result,
            Err(HubError::InvalidStateTransition {
                state: HubState::Disabled,
                event: HubEvent::Activate
            })
        ));
        assert_eq!(sm.current_state(), HubState::Disabled);
    }

    #[test]
    fn test_deactivate_while_disabled_fails() {
        let sm = HubStateMachine::new();
        assert!(sm.transition(HubEvent::Deactivate).is_err());
    }

    #[test]
    fn test_disable_from_any_state() {
        let sm = HubStateMachine::new();
        assert_eq!(sm.transition(HubEvent::Disable).unwrap(), HubState::Disabled);

        sm.transition(HubEvent::Enable).unwrap();
        sm.transition(HubEvent::Activate).unwrap();
        assert_eq!(sm.transition(HubEvent::Disable).unwrap(), HubState::Disabled);
    }

    #[test]
    fn test_subscribers_see_transitions() {
        let sm = HubStateMachine::new();
        let mut rx = sm.subscribe();

        sm.transition(HubEvent::Enable).unwrap();
        assert!(rx.has_changed().unwrap());
        assert_eq!(*rx.borrow_and_update(), HubState::Enabled);

        let _ = sm.transition(HubEvent::Deactivate);
        sm.transition(HubEvent::Activate).unwrap();
        assert_eq!(*rx.borrow_and_update(), HubState::Active);
    }
}
