//! Multi-vehicle routing solver.
//!
//! Cheapest-insertion construction followed by first-improvement local
//! search (2-opt, relocate, swap). Cost is the total tour distance plus a
//! span penalty on the gap between the longest and shortest tours. The
//! per-vehicle distance cap is a hard constraint: a move that breaks it is
//! never applied, and a stop that cannot be inserted anywhere makes the whole
//! solve fail with [`PlannerError::Infeasible`].

use jiff::{SignedDuration, Timestamp};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{PlannerError, Result};
use crate::matrix::{Distance, DistanceMatrix};
use crate::scenario::{Scenario, DEPOT};

/// Objective value: distance plus weighted span, in distance units.
pub type Cost = i64;

/// Largest accepted span coefficient.
pub const MAX_SPAN_COEFFICIENT: i64 = 1_000_000;

/// Which tours the span penalty compares.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpanScope {
    /// Every vehicle, unused ones counting as zero. The penalty then pushes
    /// work onto idle vehicles.
    #[default]
    Fleet,
    /// Only vehicles with at least one stop. Consolidating onto fewer
    /// vehicles is never penalized.
    UsedVehicles,
}

#[derive(Debug, Clone)]
pub struct SolveOptions {
    /// Number of vehicles available; every vehicle gets a route.
    pub vehicle_count: usize,
    /// Hard cap on each vehicle's tour distance.
    pub max_distance_per_vehicle: Distance,
    /// Weight for the spread between the longest and shortest tour.
    pub span_coefficient: i64,
    pub span_scope: SpanScope,
    /// Maximum number of local search passes.
    pub iteration_budget: usize,
    /// Optional wall-clock limit for construction and local search together.
    pub time_limit: Option<SignedDuration>,
}

impl Default for SolveOptions {
    fn default() -> Self {
        Self {
            vehicle_count: 1,
            max_distance_per_vehicle: 100_000,
            span_coefficient: 100,
            span_scope: SpanScope::Fleet,
            iteration_budget: 100,
            time_limit: None,
        }
    }
}

impl SolveOptions {
    pub fn new(vehicle_count: usize, max_distance_per_vehicle: Distance) -> Self {
        Self {
            vehicle_count,
            max_distance_per_vehicle,
            ..Self::default()
        }
    }

    /// Options carrying the scenario's fleet size and cap.
    pub fn for_scenario(scenario: &Scenario) -> Self {
        Self::new(scenario.vehicle_count(), scenario.max_distance_per_vehicle())
    }

    pub fn with_span_coefficient(mut self, span_coefficient: i64) -> Self {
        self.span_coefficient = span_coefficient;
        self
    }

    pub fn with_span_scope(mut self, span_scope: SpanScope) -> Self {
        self.span_scope = span_scope;
        self
    }

    pub fn with_iteration_budget(mut self, iteration_budget: usize) -> Self {
        self.iteration_budget = iteration_budget;
        self
    }

    pub fn with_time_limit(mut self, time_limit: SignedDuration) -> Self {
        self.time_limit = Some(time_limit);
        self
    }

    fn validate(&self) -> Result<()> {
        if self.vehicle_count == 0 {
            return Err(PlannerError::invalid("vehicle count must be at least 1"));
        }
        if self.max_distance_per_vehicle <= 0 {
            return Err(PlannerError::invalid(format!(
                "max distance per vehicle must be positive, got {}",
                self.max_distance_per_vehicle
            )));
        }
        if !(0..=MAX_SPAN_COEFFICIENT).contains(&self.span_coefficient) {
            return Err(PlannerError::invalid(format!(
                "span coefficient must be in [0, {MAX_SPAN_COEFFICIENT}], got {}",
                self.span_coefficient
            )));
        }
        if matches!(self.time_limit, Some(limit) if limit.is_negative()) {
            return Err(PlannerError::invalid("time limit must not be negative"));
        }
        Ok(())
    }
}

/// One directed hop within a route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Leg {
    pub from: usize,
    pub to: usize,
    pub distance: Distance,
}

/// A vehicle's closed tour.
///
/// `visits` holds customer indices only; the depot is implicit at both ends.
/// An unused vehicle keeps a zero-length route: no visits, no legs, distance 0.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Route {
    pub vehicle: usize,
    pub visits: Vec<usize>,
    pub legs: Vec<Leg>,
    pub distance: Distance,
}

impl Route {
    pub fn new(vehicle: usize, visits: Vec<usize>, matrix: &DistanceMatrix) -> Self {
        let legs: Vec<Leg> = if visits.is_empty() {
            Vec::new()
        } else {
            std::iter::once(DEPOT)
                .chain(visits.iter().copied())
                .zip(visits.iter().copied().chain(std::iter::once(DEPOT)))
                .map(|(from, to)| Leg {
                    from,
                    to,
                    distance: matrix.get(from, to),
                })
                .collect()
        };
        let distance = legs.iter().map(|leg| leg.distance).sum();

        Self {
            vehicle,
            visits,
            legs,
            distance,
        }
    }

    pub fn is_used(&self) -> bool {
        !self.visits.is_empty()
    }

    /// Full stop sequence from depot back to depot; empty for an unused vehicle.
    pub fn path(&self) -> Vec<usize> {
        if !self.is_used() {
            return Vec::new();
        }
        let mut path = Vec::with_capacity(self.visits.len() + 2);
        path.push(DEPOT);
        path.extend_from_slice(&self.visits);
        path.push(DEPOT);
        path
    }
}

/// Routes for every vehicle, indexed by vehicle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Solution {
    pub routes: Vec<Route>,
    pub total_distance: Distance,
    pub cost: Cost,
}

impl Solution {
    fn from_tours(tours: &Tours<'_>) -> Self {
        let routes: Vec<Route> = tours
            .visits
            .iter()
            .enumerate()
            .map(|(vehicle, visits)| Route::new(vehicle, visits.clone(), tours.matrix))
            .collect();

        Self {
            total_distance: routes.iter().map(|route| route.distance).sum(),
            cost: tours.cost(),
            routes,
        }
    }

    pub fn vehicles_used(&self) -> usize {
        self.routes.iter().filter(|route| route.is_used()).count()
    }

    /// Longest minus shortest route distance within `scope`.
    pub fn span(&self, scope: SpanScope) -> Distance {
        let compared = self
            .routes
            .iter()
            .filter(|route| scope == SpanScope::Fleet || route.is_used())
            .map(|route| route.distance);
        match (compared.clone().max(), compared.min()) {
            (Some(max), Some(min)) => max - min,
            _ => 0,
        }
    }
}

/// Solve the routing problem described by `matrix` (depot at index 0).
pub fn solve(matrix: &DistanceMatrix, options: &SolveOptions) -> Result<Solution> {
    options.validate()?;
    if matrix.size() == 0 {
        return Err(PlannerError::invalid("distance matrix must contain the depot"));
    }

    let deadline = Deadline::new(options.time_limit);
    let cap = options.max_distance_per_vehicle;
    check_cost_range(matrix, options)?;

    // A stop whose round trip alone exceeds the cap cannot be served by anyone.
    let unreachable: Vec<usize> = (1..matrix.size())
        .filter(|&stop| matrix.get(DEPOT, stop) + matrix.get(stop, DEPOT) > cap)
        .collect();
    if !unreachable.is_empty() {
        debug!(?unreachable, cap, "stops beyond round-trip cap");
        return Err(PlannerError::Infeasible {
            unserved: unreachable,
        });
    }

    let mut tours = Tours::new(matrix, options.vehicle_count, options.span_coefficient, options.span_scope);
    construct(&mut tours, cap, &deadline)?;
    let constructed_cost = tours.cost();

    let passes = local_search(&mut tours, cap, options.iteration_budget, &deadline);

    let solution = Solution::from_tours(&tours);
    info!(
        customers = matrix.customer_count(),
        vehicles_used = solution.vehicles_used(),
        total_distance = solution.total_distance,
        constructed_cost,
        cost = solution.cost,
        passes,
        "routing solved"
    );
    Ok(solution)
}

/// Every cost the search computes stays below `cap * (vehicles + coefficient)`
/// and every candidate tour below `max entry * (size + 1)`. Reject inputs where
/// those bounds, or their sum, do not fit in an `i64`.
fn check_cost_range(matrix: &DistanceMatrix, options: &SolveOptions) -> Result<()> {
    let cost_bound = i64::try_from(options.vehicle_count)
        .ok()
        .and_then(|vehicles| vehicles.checked_add(options.span_coefficient))
        .and_then(|factor| options.max_distance_per_vehicle.checked_mul(factor));
    let tour_bound = i64::try_from(matrix.size() + 1)
        .ok()
        .and_then(|legs| matrix.max_entry().checked_mul(legs));

    match cost_bound.zip(tour_bound) {
        Some((cost, tour)) if cost.checked_add(tour).is_some() => Ok(()),
        _ => Err(PlannerError::NumericDegenerate(format!(
            "costs overflow with cap {} over {} vehicles, span coefficient {} and distances up to {}",
            options.max_distance_per_vehicle,
            options.vehicle_count,
            options.span_coefficient,
            matrix.max_entry()
        ))),
    }
}

/// Optional wall-clock limit measured from the start of a solve.
#[derive(Debug, Clone, Copy)]
struct Deadline {
    started: Timestamp,
    limit: Option<SignedDuration>,
}

impl Deadline {
    fn new(limit: Option<SignedDuration>) -> Self {
        Self {
            started: Timestamp::now(),
            limit,
        }
    }

    fn expired(&self) -> bool {
        self.limit
            .is_some_and(|limit| Timestamp::now().duration_since(self.started) > limit)
    }
}

/// Working state: per-vehicle visit lists and their cached tour lengths.
#[derive(Debug, Clone)]
struct Tours<'a> {
    matrix: &'a DistanceMatrix,
    visits: Vec<Vec<usize>>,
    lengths: Vec<Distance>,
    span_coefficient: i64,
    span_scope: SpanScope,
}

impl<'a> Tours<'a> {
    fn new(matrix: &'a DistanceMatrix, vehicle_count: usize, span_coefficient: i64, span_scope: SpanScope) -> Self {
        Self {
            matrix,
            visits: vec![Vec::new(); vehicle_count],
            lengths: vec![0; vehicle_count],
            span_coefficient,
            span_scope,
        }
    }

    fn cost(&self) -> Cost {
        self.cost_with(&[])
    }

    /// Cost of the solution with some vehicles' tours replaced by candidates.
    fn cost_with(&self, candidates: &[(usize, &[usize], Distance)]) -> Cost {
        let mut total: Cost = 0;
        let mut longest: Option<Distance> = None;
        let mut shortest: Option<Distance> = None;

        for vehicle in 0..self.visits.len() {
            let (used, length) = match candidates.iter().find(|(v, _, _)| *v == vehicle) {
                Some((_, visits, length)) => (!visits.is_empty(), *length),
                None => (!self.visits[vehicle].is_empty(), self.lengths[vehicle]),
            };
            total += length;
            if used || self.span_scope == SpanScope::Fleet {
                longest = Some(longest.map_or(length, |l| l.max(length)));
                shortest = Some(shortest.map_or(length, |s| s.min(length)));
            }
        }

        match (longest, shortest) {
            (Some(longest), Some(shortest)) => total + self.span_coefficient * (longest - shortest),
            _ => total,
        }
    }

    fn set(&mut self, vehicle: usize, visits: Vec<usize>) {
        self.lengths[vehicle] = tour_length(self.matrix, &visits);
        self.visits[vehicle] = visits;
    }
}

/// Length of the closed tour depot -> visits -> depot.
fn tour_length(matrix: &DistanceMatrix, visits: &[usize]) -> Distance {
    let Some((&first, &last)) = visits.first().zip(visits.last()) else {
        return 0;
    };
    let inner: Distance = visits.windows(2).map(|pair| matrix.get(pair[0], pair[1])).sum();
    matrix.get(DEPOT, first) + inner + matrix.get(last, DEPOT)
}

/// Extra distance from inserting `stop` before position `position` of `visits`.
fn insertion_delta(matrix: &DistanceMatrix, visits: &[usize], position: usize, stop: usize) -> Distance {
    let prev = if position == 0 { DEPOT } else { visits[position - 1] };
    let next = visits.get(position).copied().unwrap_or(DEPOT);
    matrix.get(prev, stop) + matrix.get(stop, next) - matrix.get(prev, next)
}

#[derive(Debug, Clone, Copy)]
struct Insertion {
    stop: usize,
    vehicle: usize,
    position: usize,
    length: Distance,
    cost: Cost,
}

/// Cheapest insertion: repeatedly place the unserved stop whose feasible
/// insertion raises the total cost the least.
///
/// Candidates are scanned in (stop, vehicle, position) order and only a
/// strictly cheaper one replaces the incumbent, so ties go to the lowest stop
/// index, then the lowest vehicle, then the earliest position.
///
/// Once the deadline passes, the remaining stops are placed by
/// [`finish_greedily`] instead of the full scan.
fn construct(tours: &mut Tours<'_>, cap: Distance, deadline: &Deadline) -> Result<()> {
    let matrix = tours.matrix;
    let mut unserved: Vec<usize> = (1..matrix.size()).collect();

    while !unserved.is_empty() {
        if deadline.expired() {
            debug!(remaining = unserved.len(), "time limit hit during construction");
            return finish_greedily(tours, cap, unserved);
        }

        let mut best: Option<Insertion> = None;

        for &stop in &unserved {
            for vehicle in 0..tours.visits.len() {
                let visits = &tours.visits[vehicle];
                for position in 0..=visits.len() {
                    let length = tours.lengths[vehicle] + insertion_delta(matrix, visits, position, stop);
                    if length > cap {
                        continue;
                    }

                    let cost = tours.cost_with(&[(vehicle, std::slice::from_ref(&stop), length)]);
                    if best.is_none_or(|incumbent| cost < incumbent.cost) {
                        best = Some(Insertion {
                            stop,
                            vehicle,
                            position,
                            length,
                            cost,
                        });
                    }
                }
            }
        }

        let Some(insertion) = best else {
            debug!(?unserved, "construction stalled under distance cap");
            return Err(PlannerError::Infeasible { unserved });
        };

        tours.visits[insertion.vehicle].insert(insertion.position, insertion.stop);
        tours.lengths[insertion.vehicle] = insertion.length;
        unserved.retain(|&stop| stop != insertion.stop);
    }

    Ok(())
}

/// Place stops in the given order, each on the vehicle whose cheapest
/// feasible position gives the lowest cost. One pass over the stops, with no
/// re-scan of the others after each insertion.
fn finish_greedily(tours: &mut Tours<'_>, cap: Distance, stops: Vec<usize>) -> Result<()> {
    let matrix = tours.matrix;
    let mut stalled = Vec::new();

    for stop in stops {
        let mut best: Option<Insertion> = None;

        for vehicle in 0..tours.visits.len() {
            let visits = &tours.visits[vehicle];
            let Some((position, length)) = (0..=visits.len())
                .map(|position| (position, tours.lengths[vehicle] + insertion_delta(matrix, visits, position, stop)))
                .filter(|&(_, length)| length <= cap)
                .min_by_key(|&(_, length)| length)
            else {
                continue;
            };

            let cost = tours.cost_with(&[(vehicle, std::slice::from_ref(&stop), length)]);
            if best.is_none_or(|incumbent| cost < incumbent.cost) {
                best = Some(Insertion {
                    stop,
                    vehicle,
                    position,
                    length,
                    cost,
                });
            }
        }

        match best {
            Some(insertion) => {
                tours.visits[insertion.vehicle].insert(insertion.position, insertion.stop);
                tours.lengths[insertion.vehicle] = insertion.length;
            }
            None => stalled.push(stop),
        }
    }

    if stalled.is_empty() {
        Ok(())
    } else {
        debug!(?stalled, "greedy completion stalled under distance cap");
        Err(PlannerError::Infeasible { unserved: stalled })
    }
}

// ============================================================================
// Local Search Operators
// ============================================================================

/// 2-opt: reverse a segment within a route.
/// Returns true if an improvement was made.
fn two_opt_improve(tours: &mut Tours<'_>, cap: Distance) -> bool {
    let current_cost = tours.cost();

    for vehicle in 0..tours.visits.len() {
        let n = tours.visits[vehicle].len();
        if n < 2 {
            continue;
        }

        for i in 0..n - 1 {
            for j in i + 1..n {
                let mut candidate = tours.visits[vehicle].clone();
                candidate[i..=j].reverse();

                let length = tour_length(tours.matrix, &candidate);
                if length > cap {
                    continue;
                }

                if tours.cost_with(&[(vehicle, candidate.as_slice(), length)]) < current_cost {
                    tours.set(vehicle, candidate);
                    return true;
                }
            }
        }
    }

    false
}

/// Relocate: move a stop to another position in its own route or into
/// another route.
/// Returns true if an improvement was made.
fn relocate_improve(tours: &mut Tours<'_>, cap: Distance) -> bool {
    let current_cost = tours.cost();
    let vehicle_count = tours.visits.len();

    for from in 0..vehicle_count {
        for index in 0..tours.visits[from].len() {
            let stop = tours.visits[from][index];

            for to in 0..vehicle_count {
                if from == to {
                    let mut candidate = tours.visits[from].clone();
                    candidate.remove(index);
                    for position in 0..=candidate.len() {
                        // Reinserting at the original slot is a no-op.
                        if position == index {
                            continue;
                        }
                        let mut moved = candidate.clone();
                        moved.insert(position, stop);

                        let length = tour_length(tours.matrix, &moved);
                        if length > cap {
                            continue;
                        }
                        if tours.cost_with(&[(from, moved.as_slice(), length)]) < current_cost {
                            tours.set(from, moved);
                            return true;
                        }
                    }
                    continue;
                }

                let mut from_candidate = tours.visits[from].clone();
                from_candidate.remove(index);
                let from_length = tour_length(tours.matrix, &from_candidate);
                if from_length > cap {
                    continue;
                }

                for position in 0..=tours.visits[to].len() {
                    let mut to_candidate = tours.visits[to].clone();
                    to_candidate.insert(position, stop);

                    let to_length = tour_length(tours.matrix, &to_candidate);
                    if to_length > cap {
                        continue;
                    }

                    let cost = tours.cost_with(&[
                        (from, from_candidate.as_slice(), from_length),
                        (to, to_candidate.as_slice(), to_length),
                    ]);
                    if cost < current_cost {
                        tours.set(from, from_candidate);
                        tours.set(to, to_candidate);
                        return true;
                    }
                }
            }
        }
    }

    false
}

/// Swap: exchange two stops, within one route or across two routes.
/// Returns true if an improvement was made.
fn swap_improve(tours: &mut Tours<'_>, cap: Distance) -> bool {
    let current_cost = tours.cost();
    let vehicle_count = tours.visits.len();

    for a in 0..vehicle_count {
        for b in a..vehicle_count {
            for i in 0..tours.visits[a].len() {
                let start = if a == b { i + 1 } else { 0 };
                for j in start..tours.visits[b].len() {
                    if a == b {
                        let mut candidate = tours.visits[a].clone();
                        candidate.swap(i, j);

                        let length = tour_length(tours.matrix, &candidate);
                        if length > cap {
                            continue;
                        }
                        if tours.cost_with(&[(a, candidate.as_slice(), length)]) < current_cost {
                            tours.set(a, candidate);
                            return true;
                        }
                        continue;
                    }

                    let mut a_candidate = tours.visits[a].clone();
                    let mut b_candidate = tours.visits[b].clone();
                    std::mem::swap(&mut a_candidate[i], &mut b_candidate[j]);

                    let a_length = tour_length(tours.matrix, &a_candidate);
                    let b_length = tour_length(tours.matrix, &b_candidate);
                    if a_length > cap || b_length > cap {
                        continue;
                    }

                    let cost = tours.cost_with(&[
                        (a, a_candidate.as_slice(), a_length),
                        (b, b_candidate.as_slice(), b_length),
                    ]);
                    if cost < current_cost {
                        tours.set(a, a_candidate);
                        tours.set(b, b_candidate);
                        return true;
                    }
                }
            }
        }
    }

    false
}

/// Run local search until no pass improves, the iteration budget is spent,
/// or the time limit elapses. Returns the number of passes run.
fn local_search(tours: &mut Tours<'_>, cap: Distance, iteration_budget: usize, deadline: &Deadline) -> usize {
    let mut passes = 0;

    for _ in 0..iteration_budget {
        if deadline.expired() {
            debug!(passes, "local search stopped by time limit");
            break;
        }

        passes += 1;
        let mut improved = false;

        if two_opt_improve(tours, cap) {
            improved = true;
        }
        if relocate_improve(tours, cap) {
            improved = true;
        }
        if swap_improve(tours, cap) {
            improved = true;
        }

        debug!(pass = passes, cost = tours.cost(), improved, "local search pass");
        if !improved {
            break;
        }
    }

    passes
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Stops on a line east of the depot at the given distances.
    fn line_matrix(positions: &[Distance]) -> DistanceMatrix {
        let all: Vec<Distance> = std::iter::once(0).chain(positions.iter().copied()).collect();
        let rows = all
            .iter()
            .map(|a| all.iter().map(|b| (a - b).abs()).collect())
            .collect();
        DistanceMatrix::from_rows(rows).unwrap()
    }

    #[test]
    fn test_tour_length_and_insertion_delta() {
        let matrix = line_matrix(&[10, 20, 30]);
        assert_eq!(tour_length(&matrix, &[]), 0);
        assert_eq!(tour_length(&matrix, &[1, 2, 3]), 60);
        assert_eq!(tour_length(&matrix, &[3, 1, 2]), 80);
        assert_eq!(insertion_delta(&matrix, &[1, 3], 1, 2), 0);
        assert_eq!(insertion_delta(&matrix, &[], 0, 2), 40);
    }

    #[test]
    fn test_cost_penalizes_span_between_used_tours() {
        let matrix = line_matrix(&[10, 30]);
        let mut tours = Tours::new(&matrix, 3, 2, SpanScope::UsedVehicles);
        tours.set(0, vec![1]);
        tours.set(1, vec![2]);
        // 20 + 60 distance, span (60 - 20) * 2; the empty third tour is ignored
        assert_eq!(tours.cost(), 80 + 80);
    }

    #[test]
    fn test_fleet_span_counts_idle_vehicles() {
        let matrix = line_matrix(&[10, 30]);
        let mut tours = Tours::new(&matrix, 3, 2, SpanScope::Fleet);
        tours.set(0, vec![1]);
        tours.set(1, vec![2]);
        // The idle third vehicle pulls the minimum down to zero
        assert_eq!(tours.cost(), 80 + 60 * 2);
    }

    #[test]
    fn test_construction_tie_breaks_on_lowest_index() {
        // Two stops equally far from the depot and each other
        let matrix = DistanceMatrix::from_rows(vec![
            vec![0, 10, 10],
            vec![10, 0, 10],
            vec![10, 10, 0],
        ])
        .unwrap();
        let mut tours = Tours::new(&matrix, 2, 0, SpanScope::Fleet);
        construct(&mut tours, 1_000, &Deadline::new(None)).unwrap();
        // Both positions cost the same for stop 2; the earliest wins
        assert_eq!(tours.visits[0], vec![2, 1]);
        assert!(tours.visits[1].is_empty());
    }

    #[test]
    fn test_construction_reports_stalled_stops() {
        // Each stop fits alone (round trip 80) but not together (120)
        let matrix = DistanceMatrix::from_rows(vec![
            vec![0, 40, 40],
            vec![40, 0, 40],
            vec![40, 40, 0],
        ])
        .unwrap();
        let mut tours = Tours::new(&matrix, 1, 0, SpanScope::Fleet);
        let result = construct(&mut tours, 100, &Deadline::new(None));
        match result {
            Err(PlannerError::Infeasible { unserved }) => assert_eq!(unserved, vec![2]),
            other => panic!("expected infeasible, got {other:?}"),
        }
    }

    #[test]
    fn test_two_opt_untangles_route() {
        let matrix = line_matrix(&[10, 20, 30, 40]);
        let mut tours = Tours::new(&matrix, 1, 0, SpanScope::Fleet);
        tours.set(0, vec![1, 3, 2, 4]);
        assert_eq!(tours.cost(), 100);

        assert!(two_opt_improve(&mut tours, 1_000));
        assert_eq!(tours.visits[0], vec![1, 2, 3, 4]);
        assert_eq!(tours.cost(), 80);
    }

    #[test]
    fn test_relocate_merges_colocated_stops() {
        // All stops share one spot, so a second vehicle only adds a round trip
        let matrix = line_matrix(&[10, 10, 10, 10]);
        let mut tours = Tours::new(&matrix, 2, 10, SpanScope::UsedVehicles);
        tours.set(0, vec![1, 2, 3]);
        tours.set(1, vec![4]);
        assert_eq!(tours.cost(), 40);

        assert!(relocate_improve(&mut tours, 1_000));
        assert_eq!(tours.cost(), 20);
        assert!(tours.visits.iter().any(|visits| visits.is_empty()));
    }

    #[test]
    fn test_swap_exchanges_between_routes() {
        // Stops 1 and 2 sit west, 3 and 4 east; start with crossed assignments
        let coords: [Distance; 5] = [0, -10, -12, 10, 12];
        let rows = coords
            .iter()
            .map(|a| coords.iter().map(|b| (a - b).abs()).collect())
            .collect();
        let matrix = DistanceMatrix::from_rows(rows).unwrap();
        let mut tours = Tours::new(&matrix, 2, 0, SpanScope::Fleet);
        tours.set(0, vec![1, 3]);
        tours.set(1, vec![2, 4]);
        let before = tours.cost();

        assert!(swap_improve(&mut tours, 1_000));
        assert!(tours.cost() < before);
    }

    #[test]
    fn test_cap_blocks_merging_tours() {
        // Serving both stops in one tour saves 5 but needs 35
        let matrix = DistanceMatrix::from_rows(vec![
            vec![0, 10, 10],
            vec![10, 0, 15],
            vec![10, 15, 0],
        ])
        .unwrap();

        let mut capped = Tours::new(&matrix, 2, 0, SpanScope::Fleet);
        capped.set(0, vec![1]);
        capped.set(1, vec![2]);
        assert!(!relocate_improve(&mut capped, 30));
        assert!(!swap_improve(&mut capped, 30));

        let mut loose = capped.clone();
        assert!(relocate_improve(&mut loose, 35));
        assert_eq!(loose.cost(), 35);
        assert_eq!(loose.lengths.iter().filter(|&&length| length > 0).count(), 1);
    }

    #[test]
    fn test_invalid_options_rejected() {
        let matrix = line_matrix(&[10]);
        let zero_vehicles = SolveOptions::new(0, 100);
        assert!(matches!(
            solve(&matrix, &zero_vehicles),
            Err(PlannerError::InvalidConfiguration(_))
        ));

        let negative_span = SolveOptions::new(1, 100).with_span_coefficient(-1);
        assert!(solve(&matrix, &negative_span).is_err());

        let zero_cap = SolveOptions::new(1, 0);
        assert!(solve(&matrix, &zero_cap).is_err());
    }

    #[test]
    fn test_oversized_span_coefficient_rejected() {
        let matrix = line_matrix(&[10, 20]);
        let options = SolveOptions::new(2, 50_000).with_span_coefficient(i64::MAX / 2);
        assert!(matches!(
            solve(&matrix, &options),
            Err(PlannerError::InvalidConfiguration(_))
        ));

        let largest = SolveOptions::new(2, 50_000).with_span_coefficient(MAX_SPAN_COEFFICIENT);
        assert!(solve(&matrix, &largest).is_ok());
    }

    #[test]
    fn test_cost_overflow_is_numeric_degenerate() {
        let matrix = line_matrix(&[10, 20]);
        let huge_cap = SolveOptions::new(2, i64::MAX / 4).with_span_coefficient(MAX_SPAN_COEFFICIENT);
        assert!(matches!(
            solve(&matrix, &huge_cap),
            Err(PlannerError::NumericDegenerate(_))
        ));

        let far = DistanceMatrix::from_rows(vec![vec![0, i64::MAX / 2], vec![i64::MAX / 2, 0]]).unwrap();
        assert!(matches!(
            solve(&far, &SolveOptions::new(1, 1_000)),
            Err(PlannerError::NumericDegenerate(_))
        ));
    }

    #[test]
    fn test_expired_deadline_finishes_construction_greedily() {
        let matrix = line_matrix(&[10, 20, 30, 40]);
        let mut tours = Tours::new(&matrix, 2, 1, SpanScope::Fleet);
        let expired = Deadline::new(Some(SignedDuration::from_nanos(-1)));
        assert!(expired.expired());

        construct(&mut tours, 1_000, &expired).unwrap();
        let mut served: Vec<usize> = tours.visits.concat();
        served.sort_unstable();
        assert_eq!(served, vec![1, 2, 3, 4]);
        for (visits, &length) in tours.visits.iter().zip(&tours.lengths) {
            assert_eq!(tour_length(&matrix, visits), length);
        }
    }

    #[test]
    fn test_greedy_completion_reports_stalled_stops() {
        let matrix = DistanceMatrix::from_rows(vec![
            vec![0, 40, 40],
            vec![40, 0, 40],
            vec![40, 40, 0],
        ])
        .unwrap();
        let mut tours = Tours::new(&matrix, 1, 0, SpanScope::Fleet);
        match finish_greedily(&mut tours, 100, vec![1, 2]) {
            Err(PlannerError::Infeasible { unserved }) => assert_eq!(unserved, vec![2]),
            other => panic!("expected infeasible, got {other:?}"),
        }
    }

    #[test]
    fn test_route_legs_close_the_tour() {
        let matrix = line_matrix(&[10, 20]);
        let route = Route::new(0, vec![2, 1], &matrix);
        assert_eq!(route.path(), vec![0, 2, 1, 0]);
        assert_eq!(
            route.legs.iter().map(|leg| leg.distance).collect::<Vec<_>>(),
            vec![20, 10, 10]
        );
        assert_eq!(route.distance, 40);

        let unused = Route::new(1, Vec::new(), &matrix);
        assert!(!unused.is_used());
        assert!(unused.legs.is_empty());
        assert!(unused.path().is_empty());
        assert_eq!(unused.distance, 0);
    }
}
