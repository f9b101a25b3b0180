//! Hysteresis state machine driving station hops.
//!
//! Consumes classifier labels from the bus and decides when to switch the
//! tuned station. A single contrary label only enters a patience state; the
//! station flips after two consecutive same-direction labels, which damps
//! classifier noise at the cost of one extra window of latency per switch.

use crate::classify::Label;
use crate::control::tuner::Tuner;
use crate::protocol::StateMessage;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// States of the hysteresis control loop.
///
/// Wire names (`primary`, `patience1`, `secondary`, `patience2`) are the
/// stable contract on the state channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ControlState {
    /// Tuned to the primary station, no ad suspected.
    #[serde(rename = "primary")]
    Primary,
    /// One ad label seen on primary; still tuned to primary.
    #[serde(rename = "patience1")]
    PatienceFromPrimary,
    /// Tuned to the secondary station while the primary plays ads.
    #[serde(rename = "secondary")]
    Secondary,
    /// One ad label seen on secondary; still tuned to secondary.
    #[serde(rename = "patience2")]
    PatienceFromSecondary,
}

impl ControlState {
    /// The wire name of this state, as it appears in state messages.
    pub fn as_wire(&self) -> &'static str {
        match self {
            ControlState::Primary => "primary",
            ControlState::PatienceFromPrimary => "patience1",
            ControlState::Secondary => "secondary",
            ControlState::PatienceFromSecondary => "patience2",
        }
    }

    /// Returns true when this state targets the primary station.
    pub fn targets_primary(&self) -> bool {
        matches!(
            self,
            ControlState::Primary | ControlState::PatienceFromPrimary
        )
    }
}

impl std::fmt::Display for ControlState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_wire())
    }
}

/// The closed transition table of the hysteresis loop.
///
/// Pure and total: every `(state, label)` pair maps to exactly one next
/// state, pairs not driving a transition are explicit identities. No clock,
/// no randomness.
pub fn transition(state: ControlState, label: Label) -> ControlState {
    use ControlState::*;
    match (state, label) {
        (Primary, Label::Ad) => PatienceFromPrimary,
        (PatienceFromPrimary, Label::Ad) => Secondary,
        (Secondary, Label::Ad) => PatienceFromSecondary,
        (PatienceFromSecondary, Label::Ad) => Primary,
        (PatienceFromPrimary, Label::Song) => Primary,
        (PatienceFromSecondary, Label::Song) => Secondary,
        // Confirmed states stay put on a confirming label.
        (Primary, Label::Song) => Primary,
        (Secondary, Label::Song) => Secondary,
    }
}

/// The two stations the machine steers between, in Hz.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Stations {
    pub primary: f64,
    pub secondary: f64,
}

impl Stations {
    /// The station a given control state targets.
    pub fn for_state(&self, state: ControlState) -> f64 {
        if state.targets_primary() {
            self.primary
        } else {
            self.secondary
        }
    }
}

/// Outcome of feeding one label to the machine, when anything changed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transition {
    pub from: ControlState,
    pub to: ControlState,
    /// Station targeted after the transition.
    pub station: f64,
    /// True when the target station itself changed, not just the state.
    pub station_changed: bool,
}

/// Hysteresis state machine over the configured station pair.
///
/// Owns the live [`ControlState`]; nothing else mutates it.
pub struct StateMachine {
    state: ControlState,
    stations: Stations,
}

impl StateMachine {
    /// Creates a machine in the initial `Primary` state.
    pub fn new(stations: Stations) -> Self {
        Self {
            state: ControlState::Primary,
            stations,
        }
    }

    /// Current control state.
    pub fn state(&self) -> ControlState {
        self.state
    }

    /// Station currently targeted.
    pub fn station(&self) -> f64 {
        self.stations.for_state(self.state)
    }

    /// Feeds one label through the transition table.
    ///
    /// Returns `Some` when the state (and possibly the station) changed,
    /// `None` on an identity transition. Same-state relabels are no-ops and
    /// must not be re-broadcast.
    pub fn apply(&mut self, label: Label) -> Option<Transition> {
        let from = self.state;
        let to = transition(from, label);
        if to == from {
            return None;
        }

        let old_station = self.stations.for_state(from);
        let station = self.stations.for_state(to);
        self.state = to;

        Some(Transition {
            from,
            to,
            station,
            station_changed: station != old_station,
        })
    }

    /// Applies a transition's side effects: announce the new state on the
    /// state channel payload and retune when the station changed.
    ///
    /// Retune failures are logged, never rolled back; the control state
    /// reflects the intended station, not the confirmed one.
    pub fn execute(&self, t: &Transition, tuner: &Arc<dyn Tuner>) -> StateMessage {
        if t.station_changed {
            if let Err(e) = tuner.retune(t.station) {
                eprintln!("[FSM] retune to {:.3} MHz failed: {e}", t.station / 1e6);
            }
        }
        StateMessage {
            state: t.to,
            station: t.station,
        }
    }
}
