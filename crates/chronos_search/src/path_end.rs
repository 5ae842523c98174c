//! Path ends: endpoint arrivals combined with their constraints.
//!
//! An endpoint's surviving arrivals are combined with every applicable
//! target-clock arrival to form [`PathEnd`]s: timing checks (setup/hold
//! with multicycle counts, uncertainty, and CRPR), output delays,
//! completed path-delay exceptions, gated-clock checks, and unconstrained
//! ends. Exceptions on the arrival's tag decide whether an end is
//! reported and which path group reports it.

use crate::crpr::CheckCrpr;
use crate::path::PathRef;
use crate::search::{Search, SearchCtx};
use chronos_common::{Delay, Ident, MinMax, RiseFall};
use chronos_graph::{Graph, TimingRole, VertexId};
use chronos_sdc::{ClockEdge, ClockId, ExceptionKind, Sdc};

/// The named set a path end is reported in.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum PathGroup {
    /// A `group_path -name` group.
    Named(Ident),
    /// The capture clock's group.
    Clock(ClockId),
    /// Asynchronous set/clear paths.
    AsyncDefault,
    /// Path-delay (`set_max_delay`/`set_min_delay`) ends.
    PathDelay,
    /// Gated-clock check ends.
    GatedClockDefault,
    /// Unconstrained ends.
    Unconstrained,
    /// Everything else.
    Default,
}

impl PathGroup {
    /// The group's report name.
    pub fn name(&self, sdc: &Sdc, interner: &chronos_common::Interner) -> String {
        match self {
            PathGroup::Named(name) => interner.resolve(*name).to_string(),
            PathGroup::Clock(clock) => interner.resolve(sdc.clock(*clock).name).to_string(),
            PathGroup::AsyncDefault => "**async_default**".to_string(),
            PathGroup::PathDelay => "**path_delay**".to_string(),
            PathGroup::GatedClockDefault => "**clock_gating_default**".to_string(),
            PathGroup::Unconstrained => "**unconstrained**".to_string(),
            PathGroup::Default => "**default**".to_string(),
        }
    }
}

/// What kind of constraint terminates the path.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum PathEndKind {
    /// A setup or hold check.
    Check,
    /// A `set_output_delay` constraint.
    OutputDelay,
    /// A completed `set_max_delay`/`set_min_delay` exception.
    PathDelay,
    /// A gated-clock check (enable vs. clock).
    GatedClock,
    /// No constraint terminates here.
    Unconstrained,
}

/// One endpoint arrival combined with one applicable constraint.
#[derive(Clone, Copy, Debug)]
pub struct PathEnd {
    /// The constraint kind.
    pub kind: PathEndKind,
    /// The endpoint arrival.
    pub path: PathRef,
    /// The analysis side of the data path.
    pub min_max: MinMax,
    /// The required time the constraint imposes.
    pub required: Delay,
    /// The check margin (setup/hold value), when applicable.
    pub margin: Delay,
    /// The CRPR credit applied.
    pub crpr: Delay,
    /// The capture clock edge, when clock-relative.
    pub tgt_clk_edge: Option<ClockEdge>,
    /// The capture clock path used, when any.
    pub tgt_clk_path: Option<PathRef>,
    /// The reporting group.
    pub group: PathGroup,
}

impl PathEnd {
    /// The endpoint arrival time.
    pub fn arrival(&self, search: &Search) -> Delay {
        search
            .paths
            .path(self.path)
            .map(|p| p.arrival)
            .unwrap_or(0.0)
    }

    /// Slack: `required − arrival` for max (setup), `arrival − required`
    /// for min (hold). Negative is a violation.
    pub fn slack(&self, search: &Search) -> Delay {
        let arrival = self.arrival(search);
        match self.min_max {
            MinMax::Max => self.required - arrival,
            MinMax::Min => arrival - self.required,
        }
    }

    /// Returns `true` for unconstrained ends.
    pub fn is_unconstrained(&self) -> bool {
        self.kind == PathEndKind::Unconstrained
    }
}

// Multicycle adjustment to the capture edge: setup captures
// `setup_mult` periods after launch (default 1); hold holds
// `hold_mult` periods after launch (default one period before the setup
// capture).
fn mcp_adjust(
    period: Delay,
    min_max: MinMax,
    setup_mult: Option<u32>,
    hold_mult: Option<u32>,
) -> Delay {
    match min_max {
        MinMax::Max => period * setup_mult.unwrap_or(1) as f32,
        MinMax::Min => match hold_mult {
            Some(mult) => period * mult as f32,
            None => period * setup_mult.unwrap_or(1).saturating_sub(1) as f32,
        },
    }
}

/// Visits every path end of `vertex`.
pub fn visit_path_ends(
    search: &Search,
    graph: &Graph,
    ctx: &SearchCtx<'_>,
    vertex: VertexId,
    visitor: &mut dyn FnMut(&PathEnd),
) {
    let sdc = ctx.sdc;
    let pin = graph.vertex(vertex).pin;
    let instance = ctx.network.pin(pin).instance;

    for (index, path) in search.paths.paths(vertex).iter().enumerate() {
        let tag = search.tag(path.tag);
        if tag.is_clk {
            continue;
        }
        let path_ref = PathRef {
            vertex,
            index: index as u32,
        };
        let min_max = tag.min_max;
        let mut constrained = false;

        // Completed path-delay exceptions end paths anywhere.
        let complete =
            sdc.complete_exceptions_to(&tag.states, pin, instance, tag.rf, None, min_max);
        let mut killed_by_false_path = false;
        let mut group_override = None;
        for &exception_id in &complete {
            match &sdc.exception(exception_id).kind {
                ExceptionKind::FalsePath | ExceptionKind::Loop => {
                    killed_by_false_path = true;
                    break;
                }
                ExceptionKind::PathDelay {
                    min_max: delay_min_max,
                    delay,
                    ignore_clk_latency,
                } => {
                    if *delay_min_max == min_max {
                        let clk_info = search.clk_info(tag.clk_info);
                        let launch = if *ignore_clk_latency {
                            0.0
                        } else {
                            clk_info.clk_edge_time(sdc)
                        };
                        let end = PathEnd {
                            kind: PathEndKind::PathDelay,
                            path: path_ref,
                            min_max,
                            required: launch + delay,
                            margin: 0.0,
                            crpr: 0.0,
                            tgt_clk_edge: None,
                            tgt_clk_path: None,
                            group: PathGroup::PathDelay,
                        };
                        visitor(&end);
                        constrained = true;
                    }
                }
                ExceptionKind::GroupPath { name } => {
                    group_override = Some(PathGroup::Named(*name));
                }
                _ => {}
            }
        }
        if killed_by_false_path {
            continue;
        }

        // Timing-check ends.
        if graph.vertex(vertex).has_checks {
            visit_check_ends(
                search,
                graph,
                ctx,
                vertex,
                path_ref,
                &tag,
                group_override,
                &mut constrained,
                visitor,
            );
        }

        // Output-delay ends.
        for output_delay in sdc.output_delays_on(pin) {
            let Some(delay) = output_delay.delays.value(tag.rf, min_max) else {
                continue;
            };
            let (required, tgt_clk_edge, group) = match output_delay.clk_edge {
                Some(edge) => {
                    let period = sdc.clock(edge.clock).period;
                    let edge_time = sdc.clock_edge_time(edge);
                    let required = match min_max {
                        MinMax::Max => edge_time + period - delay,
                        MinMax::Min => edge_time + delay,
                    };
                    (required, Some(edge), PathGroup::Clock(edge.clock))
                }
                None => {
                    let required = match min_max {
                        MinMax::Max => -delay,
                        MinMax::Min => delay,
                    };
                    (required, None, PathGroup::Default)
                }
            };
            let end = PathEnd {
                kind: PathEndKind::OutputDelay,
                path: path_ref,
                min_max,
                required,
                margin: delay,
                crpr: 0.0,
                tgt_clk_edge,
                tgt_clk_path: None,
                group: group_override.unwrap_or(group),
            };
            visitor(&end);
            constrained = true;
        }

        // Gated-clock check: a data arrival on a pin feeding the clock
        // network races the clock arrivals on the same pin.
        if sdc.variables.gated_clk_checks_enabled
            && graph.vertex(vertex).has_downstream_clk_pin
        {
            for (clk_index, clk_path) in search.paths.paths(vertex).iter().enumerate() {
                let clk_tag = search.tag(clk_path.tag);
                if !clk_tag.is_clk
                    || clk_tag.min_max != min_max.opposite()
                    || clk_tag.scene != tag.scene
                {
                    continue;
                }
                let clk_info = search.clk_info(clk_tag.clk_info);
                let Some(edge) = clk_info.clk_edge else {
                    continue;
                };
                let period = sdc.clock(edge.clock).period;
                let adjust = mcp_adjust(period, min_max, None, None);
                let required = clk_path.arrival + adjust;
                let end = PathEnd {
                    kind: PathEndKind::GatedClock,
                    path: path_ref,
                    min_max,
                    required,
                    margin: 0.0,
                    crpr: 0.0,
                    tgt_clk_edge: Some(edge),
                    tgt_clk_path: Some(PathRef {
                        vertex,
                        index: clk_index as u32,
                    }),
                    group: PathGroup::GatedClockDefault,
                };
                visitor(&end);
                constrained = true;
            }
        }

        if !constrained && sdc.variables.unconstrained_paths {
            let end = PathEnd {
                kind: PathEndKind::Unconstrained,
                path: path_ref,
                min_max,
                required: min_max.opposite().init_value(),
                margin: 0.0,
                crpr: 0.0,
                tgt_clk_edge: None,
                tgt_clk_path: None,
                group: PathGroup::Unconstrained,
            };
            visitor(&end);
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn visit_check_ends(
    search: &Search,
    graph: &Graph,
    ctx: &SearchCtx<'_>,
    vertex: VertexId,
    path_ref: PathRef,
    tag: &crate::tag::Tag,
    group_override: Option<PathGroup>,
    constrained: &mut bool,
    visitor: &mut dyn FnMut(&PathEnd),
) {
    let sdc = ctx.sdc;
    let pin = graph.vertex(vertex).pin;
    let instance = ctx.network.pin(pin).instance;
    let min_max = tag.min_max;
    let Some(path) = search.paths.path(path_ref) else {
        return;
    };
    let crpr_check = CheckCrpr {
        search,
        graph,
        sdc,
    };

    for edge in graph.in_edges(vertex) {
        let e = graph.edge(edge);
        let check_side = match e.role {
            TimingRole::SetupCheck => MinMax::Max,
            TimingRole::HoldCheck => MinMax::Min,
            _ => continue,
        };
        if e.is_disabled_constraint || check_side != min_max {
            continue;
        }
        let clk_vertex = e.from;
        let corner = ctx.mode.scenes[tag.scene].corner;
        for (arc_index, arc) in e.arcs.iter().enumerate() {
            if arc.to_rf != tag.rf {
                continue;
            }
            let clk_rf: RiseFall = arc.from_rf;
            let margin = graph.arc_delay(edge, arc_index, corner, check_side);

            for (clk_index, clk_path) in search.paths.paths(clk_vertex).iter().enumerate() {
                let clk_tag = search.tag(clk_path.tag);
                // Setup checks capture with the early clock, hold checks
                // with the late one.
                if !clk_tag.is_clk
                    || clk_tag.rf != clk_rf
                    || clk_tag.scene != tag.scene
                    || clk_tag.min_max != min_max.opposite()
                {
                    continue;
                }
                let clk_info = search.clk_info(clk_tag.clk_info);
                let Some(tgt_edge) = clk_info.clk_edge else {
                    continue;
                };
                let tgt_clk = tgt_edge.clock;
                let period = sdc.clock(tgt_clk).period;

                // Exceptions completing at this endpoint against the
                // capture clock.
                let complete = sdc.complete_exceptions_to(
                    &tag.states,
                    pin,
                    instance,
                    tag.rf,
                    Some(tgt_clk),
                    min_max,
                );
                let mut setup_mult = None;
                let mut hold_mult = None;
                // Asynchronous set/clear launches report apart from the
                // capture clock's group.
                let is_async = path
                    .prev_edge
                    .map(|e| graph.edge(e).role == TimingRole::RegSetClr)
                    .unwrap_or(false);
                let default_group = if is_async {
                    PathGroup::AsyncDefault
                } else {
                    PathGroup::Clock(tgt_clk)
                };
                let mut group = group_override.unwrap_or(default_group);
                let mut skip = false;
                for &exception_id in &complete {
                    match &sdc.exception(exception_id).kind {
                        ExceptionKind::FalsePath | ExceptionKind::Loop => {
                            skip = true;
                            break;
                        }
                        // A matching path delay replaces the check.
                        ExceptionKind::PathDelay {
                            min_max: delay_min_max,
                            ..
                        } => {
                            if *delay_min_max == min_max {
                                skip = true;
                                break;
                            }
                        }
                        ExceptionKind::MulticyclePath { setup, hold } => {
                            if setup_mult.is_none() && hold_mult.is_none() {
                                setup_mult = *setup;
                                hold_mult = *hold;
                            }
                        }
                        ExceptionKind::GroupPath { name } => {
                            if group_override.is_none() {
                                group = PathGroup::Named(*name);
                            }
                        }
                        _ => {}
                    }
                }
                if skip {
                    continue;
                }

                let adjust = mcp_adjust(period, min_max, setup_mult, hold_mult);
                let tgt_clk_path = PathRef {
                    vertex: clk_vertex,
                    index: clk_index as u32,
                };
                let (crpr, _crpr_pin) = crpr_check.check_crpr(path, tgt_clk_path);
                let uncertainty = clk_info
                    .uncertainties
                    .map(|u| u.value(min_max))
                    .unwrap_or(0.0);
                // Ideal clocks capture at their modeled time; propagated
                // clocks at the traced arrival.
                let capture = search.clk_path_arrival(sdc, clk_path, &clk_info);
                let required = match min_max {
                    MinMax::Max => capture + adjust - margin - uncertainty + crpr,
                    MinMax::Min => capture + adjust + margin + uncertainty - crpr,
                };
                let end = PathEnd {
                    kind: PathEndKind::Check,
                    path: path_ref,
                    min_max,
                    required,
                    margin,
                    crpr,
                    tgt_clk_edge: Some(tgt_edge),
                    tgt_clk_path: Some(tgt_clk_path),
                    group,
                };
                visitor(&end);
                *constrained = true;
            }
        }
    }
}
