//! The constraint index the search queries.

use crate::clock::{Clock, ClockEdge, ClockId, ClockUncertainties};
use crate::exception::{
    ExceptionId, ExceptionKind, ExceptionPath, ExceptionPt, ExceptionState,
};
use crate::io_delay::{InputDelay, InputDelayId, OutputDelay};
use crate::variables::Variables;
use chronos_common::{ContentHash, Delay, EarlyLate, Ident, MinMax, RiseFall};
use chronos_network::{InstanceId, PinId};
use std::collections::{HashMap, HashSet};

/// The timing constraint index.
///
/// Populated by an external constraint reader; queried by the levelizer
/// (disables, case analysis), the forward search (clocks, input delays,
/// exception states), and the path-end visitor (output delays, check
/// margins, multicycle counts, path groups).
#[derive(Clone, Debug)]
pub struct Sdc {
    /// Analysis-mode switches.
    pub variables: Variables,
    clocks: Vec<Clock>,
    pin_clocks: HashMap<PinId, Vec<ClockId>>,
    input_delays: Vec<InputDelay>,
    pin_input_delays: HashMap<PinId, Vec<InputDelayId>>,
    ref_pin_input_delays: HashMap<PinId, Vec<InputDelayId>>,
    output_delays: Vec<OutputDelay>,
    pin_output_delays: HashMap<PinId, Vec<usize>>,
    exceptions: Vec<ExceptionPath>,
    filter: Option<ExceptionId>,
    disabled_pins: HashSet<PinId>,
    disabled_edges: HashSet<(PinId, PinId)>,
    case_values: HashMap<PinId, bool>,
    propagated_pins: HashSet<PinId>,
    pin_clock_latencies: HashMap<PinId, [[Delay; 2]; 2]>,
    pin_uncertainties: HashMap<PinId, ClockUncertainties>,
    port_ext_caps: HashMap<PinId, f32>,
    clk_stop_pins: HashSet<PinId>,
    default_arrival_clock: Option<ClockEdge>,
    // Derate scalars indexed by [early/late]; clock and data paths derate
    // independently.
    data_derates: [f32; 2],
    clock_derates: [f32; 2],
}

impl Default for Sdc {
    fn default() -> Self {
        Self::new()
    }
}

impl Sdc {
    /// Creates an empty constraint index. Derates start at unity.
    pub fn new() -> Self {
        Self {
            variables: Variables::default(),
            clocks: Vec::new(),
            pin_clocks: HashMap::new(),
            input_delays: Vec::new(),
            pin_input_delays: HashMap::new(),
            ref_pin_input_delays: HashMap::new(),
            output_delays: Vec::new(),
            pin_output_delays: HashMap::new(),
            exceptions: Vec::new(),
            filter: None,
            disabled_pins: HashSet::new(),
            disabled_edges: HashSet::new(),
            case_values: HashMap::new(),
            propagated_pins: HashSet::new(),
            pin_clock_latencies: HashMap::new(),
            pin_uncertainties: HashMap::new(),
            port_ext_caps: HashMap::new(),
            clk_stop_pins: HashSet::new(),
            default_arrival_clock: None,
            data_derates: [1.0; 2],
            clock_derates: [1.0; 2],
        }
    }

    // ---- clocks ----------------------------------------------------------

    /// Declares a clock.
    pub fn make_clock(&mut self, name: Ident, period: Delay) -> ClockId {
        let id = ClockId::from_raw(self.clocks.len() as u32);
        self.clocks.push(Clock::new(name, period));
        id
    }

    /// The clock record.
    pub fn clock(&self, id: ClockId) -> &Clock {
        &self.clocks[id.as_raw() as usize]
    }

    /// The mutable clock record.
    pub fn clock_mut(&mut self, id: ClockId) -> &mut Clock {
        &mut self.clocks[id.as_raw() as usize]
    }

    /// All declared clocks.
    pub fn clocks(&self) -> impl Iterator<Item = (ClockId, &Clock)> {
        self.clocks
            .iter()
            .enumerate()
            .map(|(i, c)| (ClockId::from_raw(i as u32), c))
    }

    /// Finds a clock by name.
    pub fn find_clock(&self, name: Ident) -> Option<ClockId> {
        self.clocks()
            .find(|(_, c)| c.name == name)
            .map(|(id, _)| id)
    }

    /// Attaches a clock-tree leaf pin to a clock.
    pub fn add_clock_pin(&mut self, clock: ClockId, pin: PinId) {
        self.clock_mut(clock).leaf_pins.push(pin);
        self.pin_clocks.entry(pin).or_default().push(clock);
    }

    /// The `(clock, rf)` edge.
    pub fn clock_edge(&self, clock: ClockId, rf: RiseFall) -> ClockEdge {
        ClockEdge { clock, rf }
    }

    /// The time of a clock edge within its period.
    pub fn clock_edge_time(&self, edge: ClockEdge) -> Delay {
        self.clock(edge.clock).edge_time(edge.rf)
    }

    /// Returns `true` when a declared clock arrives at `pin`.
    pub fn is_leaf_pin_clock(&self, pin: PinId) -> bool {
        self.pin_clocks.contains_key(&pin)
    }

    /// The clocks arriving at `pin`.
    pub fn leaf_pin_clocks(&self, pin: PinId) -> Option<&Vec<ClockId>> {
        self.pin_clocks.get(&pin)
    }

    /// Marks `pin` as having a propagated clock.
    pub fn set_propagated_clock_pin(&mut self, pin: PinId) {
        self.propagated_pins.insert(pin);
    }

    /// Returns `true` when `pin` carries `set_propagated_clock`.
    pub fn is_propagated_clock(&self, pin: PinId) -> bool {
        self.propagated_pins.contains(&pin)
    }

    /// Source insertion delay of `clk`.
    pub fn clock_insertion(
        &self,
        clk: ClockId,
        rf: RiseFall,
        min_max: MinMax,
        _early_late: EarlyLate,
    ) -> Delay {
        self.clock(clk).insertion(rf, min_max)
    }

    /// Ideal-mode network latency of `clk`.
    pub fn clock_latency(&self, clk: ClockId, rf: RiseFall, min_max: MinMax) -> Delay {
        self.clock(clk).latency(rf, min_max)
    }

    /// Pin-level clock latency override, which takes precedence over the
    /// clock's own latency and stops propagation.
    pub fn clock_latency_pin(
        &self,
        pin: PinId,
        rf: RiseFall,
        min_max: MinMax,
    ) -> Option<Delay> {
        self.pin_clock_latencies
            .get(&pin)
            .map(|t| t[rf.index()][min_max.index()])
    }

    /// Sets a pin-level clock latency on all transitions and sides.
    pub fn set_clock_latency_pin(&mut self, pin: PinId, latency: Delay) {
        self.pin_clock_latencies.insert(pin, [[latency; 2]; 2]);
    }

    /// Pin-level clock uncertainties.
    pub fn clock_uncertainties_pin(&self, pin: PinId) -> Option<&ClockUncertainties> {
        self.pin_uncertainties.get(&pin)
    }

    /// Sets pin-level clock uncertainties.
    pub fn set_clock_uncertainties_pin(&mut self, pin: PinId, u: ClockUncertainties) {
        self.pin_uncertainties.insert(pin, u);
    }

    /// Marks `pin` as a clock-propagation stop.
    pub fn set_clk_stop_propagation(&mut self, pin: PinId) {
        self.clk_stop_pins.insert(pin);
    }

    /// Returns `true` when clock propagation stops at `pin`.
    pub fn clk_stop_propagation(&self, pin: PinId) -> bool {
        self.clk_stop_pins.contains(&pin)
    }

    /// The default arrival clock edge for unconstrained inputs.
    pub fn default_arrival_clock_edge(&self) -> Option<ClockEdge> {
        self.default_arrival_clock
    }

    /// Sets the default arrival clock edge.
    pub fn set_default_arrival_clock_edge(&mut self, edge: ClockEdge) {
        self.default_arrival_clock = Some(edge);
    }

    // ---- I/O delays ------------------------------------------------------

    /// Adds an input delay constraint.
    pub fn make_input_delay(&mut self, delay: InputDelay) -> InputDelayId {
        let id = InputDelayId::from_raw(self.input_delays.len() as u32);
        self.pin_input_delays.entry(delay.pin).or_default().push(id);
        if let Some(ref_pin) = delay.ref_pin {
            self.ref_pin_input_delays
                .entry(ref_pin)
                .or_default()
                .push(id);
        }
        self.input_delays.push(delay);
        id
    }

    /// The input delay record.
    pub fn input_delay(&self, id: InputDelayId) -> &InputDelay {
        &self.input_delays[id.as_raw() as usize]
    }

    /// Returns `true` when `pin` has any input delay.
    pub fn has_input_delay(&self, pin: PinId) -> bool {
        self.pin_input_delays.contains_key(&pin)
    }

    /// The input delays on `pin`.
    pub fn input_delays_on(&self, pin: PinId) -> &[InputDelayId] {
        self.pin_input_delays
            .get(&pin)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    /// The input delays whose `-reference_pin` is `ref_pin`.
    pub fn ref_pin_input_delays(&self, ref_pin: PinId) -> &[InputDelayId] {
        self.ref_pin_input_delays
            .get(&ref_pin)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    /// Adds an output delay constraint.
    pub fn make_output_delay(&mut self, delay: OutputDelay) {
        self.pin_output_delays
            .entry(delay.pin)
            .or_default()
            .push(self.output_delays.len());
        self.output_delays.push(delay);
    }

    /// The output delays on `pin`.
    pub fn output_delays_on(&self, pin: PinId) -> Vec<&OutputDelay> {
        self.pin_output_delays
            .get(&pin)
            .map(|v| v.iter().map(|&i| &self.output_delays[i]).collect())
            .unwrap_or_default()
    }

    /// Returns `true` when `pin` terminates constrained paths (an output
    /// delay or a path-delay `-to`).
    pub fn is_constrained_end(&self, pin: PinId, instance: InstanceId) -> bool {
        if self.pin_output_delays.contains_key(&pin) {
            return true;
        }
        self.exceptions.iter().any(|e| {
            matches!(e.kind, ExceptionKind::PathDelay { .. })
                && e.to.as_ref().is_some_and(|to| {
                    to.matches_pin(pin, instance, RiseFall::Rise)
                        || to.matches_pin(pin, instance, RiseFall::Fall)
                })
        })
    }

    // ---- exceptions ------------------------------------------------------

    /// Adds an exception and returns its ID.
    pub fn make_exception(&mut self, exception: ExceptionPath) -> ExceptionId {
        let id = ExceptionId::from_raw(self.exceptions.len() as u32);
        if exception.kind == ExceptionKind::Filter {
            self.filter = Some(id);
        }
        self.exceptions.push(exception);
        id
    }

    /// The exception record.
    pub fn exception(&self, id: ExceptionId) -> &ExceptionPath {
        &self.exceptions[id.as_raw() as usize]
    }

    /// The active report filter, if any.
    pub fn filter(&self) -> Option<ExceptionId> {
        self.filter
    }

    /// Drops the report filter exception.
    pub fn clear_filter(&mut self) {
        if let Some(id) = self.filter.take() {
            // The slot stays; the filter no longer matches anything.
            self.exceptions[id.as_raw() as usize].kind = ExceptionKind::GroupPath {
                name: Ident::from_raw(u32::MAX),
            };
            self.exceptions[id.as_raw() as usize].from = Some(ExceptionPt::default());
        }
    }

    /// Exception states seeded for an arrival starting at `(pin, rf)` with
    /// clock `clk`. Returns `None` when a false path blocks the arrival
    /// outright (matched -from with nothing further to match).
    pub fn exception_from_states(
        &self,
        pin: PinId,
        instance: InstanceId,
        rf: RiseFall,
        clk: Option<ClockId>,
        min_max: MinMax,
    ) -> Option<Vec<ExceptionState>> {
        let mut states = Vec::new();
        for (i, exception) in self.exceptions.iter().enumerate() {
            if !exception.matches_min_max(min_max) {
                continue;
            }
            let Some(from) = &exception.from else {
                continue;
            };
            if from.matches_pin(pin, instance, rf) || from.matches_clock(clk) {
                let id = ExceptionId::from_raw(i as u32);
                let state = ExceptionState::start(id);
                if exception.thrus.is_empty()
                    && exception.to.is_none()
                    && matches!(exception.kind, ExceptionKind::FalsePath)
                {
                    return None;
                }
                states.push(state);
            }
        }
        Some(states)
    }

    /// Exception states seeded for clock-tree pins: only `-from` false
    /// paths apply on the clock network.
    pub fn exception_from_clk_states(
        &self,
        pin: PinId,
        instance: InstanceId,
        rf: RiseFall,
        clk: ClockId,
        min_max: MinMax,
    ) -> Vec<ExceptionState> {
        let mut states = Vec::new();
        for (i, exception) in self.exceptions.iter().enumerate() {
            if !exception.matches_min_max(min_max)
                || !matches!(exception.kind, ExceptionKind::FalsePath)
            {
                continue;
            }
            let Some(from) = &exception.from else {
                continue;
            };
            if from.matches_pin(pin, instance, rf) || from.matches_clock(Some(clk)) {
                states.push(ExceptionState::start(ExceptionId::from_raw(i as u32)));
            }
        }
        states
    }

    /// Exception states that begin on an edge into `(to_pin, to_rf)`:
    /// exceptions with no `-from` whose first `-thru` matches there.
    pub fn exception_thru_states(
        &self,
        to_pin: PinId,
        to_instance: InstanceId,
        to_rf: RiseFall,
        min_max: MinMax,
    ) -> Vec<ExceptionState> {
        let mut states = Vec::new();
        for (i, exception) in self.exceptions.iter().enumerate() {
            if !exception.matches_min_max(min_max) || exception.from.is_some() {
                continue;
            }
            if let Some(first) = exception.thrus.first() {
                if first.matches_pin(to_pin, to_instance, to_rf) {
                    states.push(ExceptionState {
                        exception: ExceptionId::from_raw(i as u32),
                        next_thru: 1,
                    });
                }
            }
        }
        states
    }

    /// Returns `true` when `state`'s pending `-thru` matches the edge
    /// destination.
    pub fn state_matches_next_thru(
        &self,
        state: ExceptionState,
        to_pin: PinId,
        to_instance: InstanceId,
        to_rf: RiseFall,
    ) -> bool {
        let exception = self.exception(state.exception);
        exception
            .thrus
            .get(state.next_thru as usize)
            .is_some_and(|thru| thru.matches_pin(to_pin, to_instance, to_rf))
    }

    /// Returns `true` when `state` has traversed all of its `-thru` sets.
    pub fn state_thrus_complete(&self, state: ExceptionState) -> bool {
        state.next_thru as usize >= self.exception(state.exception).thrus.len()
    }

    /// Returns `true` when `state` completes its exception at
    /// `(pin, rf)`: all `-thru`s traversed and the `-to` (if any) matched.
    pub fn state_is_complete_to(
        &self,
        state: ExceptionState,
        pin: PinId,
        instance: InstanceId,
        rf: RiseFall,
        clk: Option<ClockId>,
    ) -> bool {
        if !self.state_thrus_complete(state) {
            return false;
        }
        match &self.exception(state.exception).to {
            Some(to) => to.matches_pin(pin, instance, rf) || to.matches_clock(clk),
            None => true,
        }
    }

    /// The completed exceptions among `states` at an endpoint, sorted by
    /// descending priority.
    pub fn complete_exceptions_to(
        &self,
        states: &[ExceptionState],
        pin: PinId,
        instance: InstanceId,
        rf: RiseFall,
        clk: Option<ClockId>,
        min_max: MinMax,
    ) -> Vec<ExceptionId> {
        let mut complete: Vec<ExceptionId> = states
            .iter()
            .filter(|&&s| {
                self.exception(s.exception).matches_min_max(min_max)
                    && self.state_is_complete_to(s, pin, instance, rf, clk)
            })
            .map(|s| s.exception)
            .collect();
        complete.sort_by_key(|&id| std::cmp::Reverse(self.exception(id).priority()));
        complete
    }

    /// Returns `true` when any path-delay exception starts at `pin`.
    pub fn is_path_delay_from(&self, pin: PinId, instance: InstanceId) -> bool {
        self.exceptions.iter().any(|e| {
            matches!(e.kind, ExceptionKind::PathDelay { .. })
                && e.from.as_ref().is_some_and(|from| {
                    from.matches_pin(pin, instance, RiseFall::Rise)
                        || from.matches_pin(pin, instance, RiseFall::Fall)
                })
        })
    }

    // ---- disables, case analysis, derating -------------------------------

    /// Disables all timing through `pin`.
    pub fn set_disable_pin(&mut self, pin: PinId) {
        self.disabled_pins.insert(pin);
    }

    /// Returns `true` when timing through `pin` is disabled.
    pub fn is_disabled_pin(&self, pin: PinId) -> bool {
        self.disabled_pins.contains(&pin)
    }

    /// Disables the timing edges from `from_pin` to `to_pin`.
    pub fn set_disable_edge(&mut self, from_pin: PinId, to_pin: PinId) {
        self.disabled_edges.insert((from_pin, to_pin));
    }

    /// Returns `true` when the `(from_pin, to_pin)` edges are disabled.
    pub fn is_disabled_edge(&self, from_pin: PinId, to_pin: PinId) -> bool {
        self.disabled_edges.contains(&(from_pin, to_pin))
    }

    /// Forces a constant logic value on `pin` (case analysis).
    pub fn set_case_value(&mut self, pin: PinId, value: bool) {
        self.case_values.insert(pin, value);
    }

    /// The case-analysis constant on `pin`, if any.
    pub fn case_value(&self, pin: PinId) -> Option<bool> {
        self.case_values.get(&pin).copied()
    }

    /// Sets the derate scalar for clock or data paths on one early/late
    /// side.
    pub fn set_timing_derate(&mut self, is_clock: bool, early_late: EarlyLate, derate: f32) {
        if is_clock {
            self.clock_derates[early_late.index()] = derate;
        } else {
            self.data_derates[early_late.index()] = derate;
        }
    }

    /// The derate scalar applied to an arc delay.
    pub fn derate(&self, is_clock: bool, early_late: EarlyLate) -> f32 {
        if is_clock {
            self.clock_derates[early_late.index()]
        } else {
            self.data_derates[early_late.index()]
        }
    }

    /// External capacitance annotated on a top-level port.
    pub fn port_ext_cap(&self, pin: PinId) -> Option<f32> {
        self.port_ext_caps.get(&pin).copied()
    }

    /// Sets the external capacitance of a top-level port.
    pub fn set_port_ext_cap(&mut self, pin: PinId, cap: f32) {
        self.port_ext_caps.insert(pin, cap);
    }

    /// A fingerprint of the constraint state, for detecting SDC swaps
    /// during incremental analysis.
    pub fn fingerprint(&self) -> ContentHash {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&(self.clocks.len() as u64).to_le_bytes());
        for clock in &self.clocks {
            bytes.extend_from_slice(&clock.period.to_le_bytes());
            bytes.extend_from_slice(&(clock.leaf_pins.len() as u64).to_le_bytes());
        }
        bytes.extend_from_slice(&(self.input_delays.len() as u64).to_le_bytes());
        bytes.extend_from_slice(&(self.output_delays.len() as u64).to_le_bytes());
        bytes.extend_from_slice(&(self.exceptions.len() as u64).to_le_bytes());
        bytes.extend_from_slice(&(self.disabled_pins.len() as u64).to_le_bytes());
        ContentHash::from_bytes(&bytes)
    }
}
