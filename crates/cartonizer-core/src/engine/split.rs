use super::normalize::NormalizedItem;
use super::select::{candidate_order, select, weighted_score, EPSILON};
use super::*;
use std::cmp::Ordering;
use tracing::{debug, trace};

/// Consecutive units of one input item. Groups take runs in bulk, so the
/// work grows with the number of packages rather than the number of units.
#[derive(Debug, Clone, Copy)]
struct Run {
    /// Index into the normalized item list
    source: usize,
    count: u32,
    unit_volume: f64,
    unit_weight: f64,
}

impl Run {
    fn volume(&self) -> f64 {
        self.unit_volume * f64::from(self.count)
    }

    fn weight(&self) -> f64 {
        self.unit_weight * f64::from(self.count)
    }

    /// Splits `count` units off the front of the run.
    fn take(&mut self, count: u32) -> Run {
        self.count -= count;
        Run { count, ..*self }
    }
}

/// Units bound for the same package.
#[derive(Debug, Clone, Default)]
struct Group {
    /// Unit counts per source item, in placement order
    members: Vec<(usize, u32)>,
    volume: f64,
    weight: f64,
}

impl Group {
    fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    fn add(&mut self, run: Run) {
        self.volume += run.volume();
        self.weight += run.weight();
        match self.members.last_mut() {
            Some(last) if last.0 == run.source => last.1 += run.count,
            _ => self.members.push((run.source, run.count)),
        }
    }

    /// Folds the members back into one normalized record per source item.
    fn to_items(&self, normalized: &[NormalizedItem]) -> Vec<NormalizedItem> {
        let mut counts = vec![0u32; normalized.len()];
        for &(source, count) in &self.members {
            counts[source] += count;
        }
        normalized
            .iter()
            .zip(counts)
            .filter(|(_, count)| *count > 0)
            .map(|(item, count)| item.with_quantity(count))
            .collect()
    }
}

/// Capacity of a single package.
#[derive(Debug, Clone, Copy)]
struct Limits {
    weight: f64,
    volume: f64,
}

impl Limits {
    fn weight_room(&self, group: &Group, run: &Run) -> u32 {
        units_within(self.weight, group.weight, run.unit_weight)
    }

    fn volume_room(&self, group: &Group, run: &Run) -> u32 {
        units_within(self.volume, group.volume, run.unit_volume)
    }

    /// Units of `run` the group can still take under both limits.
    fn room(&self, group: &Group, run: &Run) -> u32 {
        self.weight_room(group, run).min(self.volume_room(group, run))
    }
}

/// Whole units of size `per_unit` that fit in what is left of `limit`.
fn units_within(limit: f64, used: f64, per_unit: f64) -> u32 {
    // Float-to-int `as` saturates: negative room is 0, huge room is u32::MAX.
    ((limit - used + EPSILON) / per_unit).floor() as u32
}

/// Progress of one splitting attempt.
#[derive(Debug)]
enum SplitState {
    Idle,
    GroupingByStrategy,
    PerGroupSelection(Vec<Group>),
    Assembling(Vec<PackageRecommendation>),
    Done(MultiPackageResult),
    Failed,
}

/// Partitions items into packages under one strategy. Each group is solved
/// independently; a group no container accepts fails the whole attempt.
pub(super) struct Splitter<'a> {
    items: &'a [Item],
    normalized: &'a [NormalizedItem],
    containers: &'a [Container],
    params: &'a Parameters,
    strategy: SplittingStrategy,
}

impl<'a> Splitter<'a> {
    pub fn new(
        items: &'a [Item],
        normalized: &'a [NormalizedItem],
        containers: &'a [Container],
        params: &'a Parameters,
        strategy: SplittingStrategy,
    ) -> Self {
        Self {
            items,
            normalized,
            containers,
            params,
            strategy,
        }
    }

    /// Drives the state machine to `Done` or `Failed`.
    pub fn run(&self) -> Option<MultiPackageResult> {
        let mut state = SplitState::Idle;
        loop {
            trace!(strategy = %self.strategy, ?state, "splitter step");
            state = match state {
                SplitState::Idle => SplitState::GroupingByStrategy,
                SplitState::GroupingByStrategy => match self.group() {
                    Some(groups) => SplitState::PerGroupSelection(groups),
                    None => SplitState::Failed,
                },
                SplitState::PerGroupSelection(groups) => match self.select_per_group(&groups) {
                    Some(packages) => SplitState::Assembling(packages),
                    None => SplitState::Failed,
                },
                SplitState::Assembling(packages) => SplitState::Done(self.assemble(packages)),
                SplitState::Done(result) => return Some(result),
                SplitState::Failed => return None,
            };
        }
    }

    fn limits(&self) -> Option<Limits> {
        let candidates = candidate_order(self.containers, self.params);
        let largest = candidates.last()?;
        let heaviest = candidates
            .iter()
            .map(|c| c.max_weight)
            .fold(0.0, f64::max);

        Some(Limits {
            weight: self.params.max_package_weight.min(heaviest),
            volume: largest.volume() * self.params.packing_efficiency / 100.0,
        })
    }

    fn runs(&self) -> Vec<Run> {
        self.normalized
            .iter()
            .enumerate()
            .map(|(source, item)| Run {
                source,
                count: item.quantity,
                unit_volume: item.unit_volume,
                unit_weight: item.unit_weight,
            })
            .collect()
    }

    /// Returns `None` when there is nothing to split against or the strategy
    /// leaves everything in one group.
    fn group(&self) -> Option<Vec<Group>> {
        let limits = self.limits()?;
        let runs = self.runs();

        let groups = match self.strategy {
            SplittingStrategy::Weight => by_weight(runs, limits),
            SplittingStrategy::Volume => by_volume(runs, limits),
            SplittingStrategy::Hybrid => by_weight_and_volume(runs, limits),
            SplittingStrategy::Category => self.by_category(runs, limits),
            SplittingStrategy::Fragility => self.by_fragility(runs, limits),
        };

        if groups.len() < 2 {
            debug!(strategy = %self.strategy, "strategy produced a single group");
            return None;
        }
        Some(groups)
    }

    fn category(&self, run: &Run) -> Option<&'a str> {
        self.items[self.normalized[run.source].index]
            .category
            .as_deref()
    }

    fn is_fragile(&self, run: &Run) -> bool {
        self.items[self.normalized[run.source].index].is_fragile()
    }

    /// Same-category units travel together; oversized categories are split
    /// under both limits.
    fn by_category(&self, runs: Vec<Run>, limits: Limits) -> Vec<Group> {
        let mut categories: Vec<(Option<&str>, Vec<Run>)> = Vec::new();
        for run in runs {
            let key = self.category(&run);
            match categories.iter().position(|(k, _)| *k == key) {
                Some(pos) => categories[pos].1.push(run),
                None => categories.push((key, vec![run])),
            }
        }

        categories
            .into_iter()
            .flat_map(|(_, members)| {
                let volume: f64 = members.iter().map(Run::volume).sum();
                let weight: f64 = members.iter().map(Run::weight).sum();
                if volume > limits.volume || weight > limits.weight {
                    by_capacity(members, limits)
                } else {
                    let mut group = Group::default();
                    members.into_iter().for_each(|run| group.add(run));
                    vec![group]
                }
            })
            .collect()
    }

    /// Fragile units are packed apart from everything else.
    fn by_fragility(&self, runs: Vec<Run>, limits: Limits) -> Vec<Group> {
        let (fragile, sturdy): (Vec<Run>, Vec<Run>) =
            runs.into_iter().partition(|run| self.is_fragile(run));

        let mut groups = by_capacity(fragile, limits);
        groups.extend(by_capacity(sturdy, limits));
        groups
    }

    fn select_per_group(&self, groups: &[Group]) -> Option<Vec<PackageRecommendation>> {
        groups
            .iter()
            .enumerate()
            .map(|(n, group)| {
                let group_items = group.to_items(self.normalized);
                let Some(result) = select(&group_items, self.containers, self.params, false)
                else {
                    debug!(
                        strategy = %self.strategy,
                        group = n,
                        weight = group.weight,
                        volume = group.volume,
                        "no container accepts group"
                    );
                    return None;
                };

                Some(PackageRecommendation {
                    container: result.recommended_container,
                    assigned_items: group_items
                        .iter()
                        .map(|item| AssignedItem {
                            item: self.items[item.index].clone(),
                            quantity: item.quantity,
                        })
                        .collect(),
                    utilization: result.utilization,
                    package_weight: result.total_weight,
                    package_volume: result.total_volume,
                    dimensional_weight: result.dimensional_weight,
                    billable_weight: result.billable_weight,
                    confidence: result.confidence,
                })
            })
            .collect()
    }

    fn assemble(&self, packages: Vec<PackageRecommendation>) -> MultiPackageResult {
        let total_weight: f64 = packages.iter().map(|p| p.package_weight).sum();
        let total_volume: f64 = packages.iter().map(|p| p.package_volume).sum();
        let total_cost: f64 = packages.iter().map(|p| p.container.cost).sum();
        let total_billable_weight: f64 = packages.iter().map(|p| p.billable_weight).sum();
        // The weakest package bounds the whole plan.
        let confidence = packages
            .iter()
            .map(|p| p.confidence)
            .fold(confidence::MAX_CONFIDENCE, f64::min);

        MultiPackageResult {
            total_packages: packages.len() as u32,
            packages,
            total_weight,
            total_volume,
            total_cost,
            total_billable_weight,
            splitting_strategy: self.strategy,
            optimization_objective: self.params.optimization_objective,
            confidence,
        }
    }
}

fn by_weight(mut runs: Vec<Run>, limits: Limits) -> Vec<Group> {
    runs.sort_by(|a, b| heavier_first(a, b).then_with(|| larger_first(a, b)));
    first_fit(runs, |group, run| limits.weight_room(group, run))
}

fn by_volume(mut runs: Vec<Run>, limits: Limits) -> Vec<Group> {
    runs.sort_by(|a, b| larger_first(a, b).then_with(|| heavier_first(a, b)));
    first_fit(runs, |group, run| limits.volume_room(group, run))
}

/// First-fit decreasing by volume, honouring the weight cap as well.
fn by_capacity(mut runs: Vec<Run>, limits: Limits) -> Vec<Group> {
    runs.sort_by(|a, b| larger_first(a, b).then_with(|| heavier_first(a, b)));
    first_fit(runs, |group, run| limits.room(group, run))
}

/// Closes the open group as soon as the next unit would break either limit.
fn by_weight_and_volume(mut runs: Vec<Run>, limits: Limits) -> Vec<Group> {
    runs.sort_by(|a, b| larger_first(a, b).then_with(|| heavier_first(a, b)));

    let mut groups: Vec<Group> = Vec::new();
    let mut open = Group::default();
    for mut run in runs {
        while run.count > 0 {
            let room = limits.room(&open, &run);
            if room == 0 && !open.is_empty() {
                groups.push(std::mem::take(&mut open));
                continue;
            }
            open.add(run.take(room.clamp(1, run.count)));
        }
    }
    if !open.is_empty() {
        groups.push(open);
    }
    groups
}

/// Places each run into the first groups with room, opening new groups when
/// none is left. A unit too large for any group still gets one of its own.
fn first_fit(runs: Vec<Run>, room: impl Fn(&Group, &Run) -> u32) -> Vec<Group> {
    let mut groups: Vec<Group> = Vec::new();
    for mut run in runs {
        // Groups only grow, so a group with no room for this run stays full.
        let mut cursor = 0;
        while run.count > 0 {
            while cursor < groups.len() && room(&groups[cursor], &run) == 0 {
                cursor += 1;
            }
            if cursor == groups.len() {
                groups.push(Group::default());
            }
            let take = room(&groups[cursor], &run).clamp(1, run.count);
            groups[cursor].add(run.take(take));
        }
    }
    groups
}

fn heavier_first(a: &Run, b: &Run) -> Ordering {
    b.unit_weight
        .total_cmp(&a.unit_weight)
        .then_with(|| a.source.cmp(&b.source))
}

fn larger_first(a: &Run, b: &Run) -> Ordering {
    b.unit_volume
        .total_cmp(&a.unit_volume)
        .then_with(|| a.source.cmp(&b.source))
}

/// Runs one pinned strategy, or every strategy and picks the plan the
/// objective prefers.
pub(super) fn split(
    items: &[Item],
    normalized: &[NormalizedItem],
    containers: &[Container],
    params: &Parameters,
    strategy: Option<SplittingStrategy>,
) -> Option<MultiPackageResult> {
    let strategies: Vec<SplittingStrategy> = match strategy {
        Some(strategy) => vec![strategy],
        None => SplittingStrategy::ALL.to_vec(),
    };

    let plans: Vec<MultiPackageResult> = strategies
        .into_iter()
        .filter_map(|strategy| {
            let plan = Splitter::new(items, normalized, containers, params, strategy).run();
            debug!(
                %strategy,
                packages = ?plan.as_ref().map(|p| p.total_packages),
                "splitting attempt finished"
            );
            plan
        })
        .collect();

    choose_plan(plans, params.optimization_objective)
}

/// Picks among successful plans. Ties keep the earlier strategy.
fn choose_plan(
    plans: Vec<MultiPackageResult>,
    objective: OptimizationObjective,
) -> Option<MultiPackageResult> {
    let fewest_packages = |a: &MultiPackageResult, b: &MultiPackageResult| {
        a.total_packages.cmp(&b.total_packages)
    };
    let cheapest = |a: &MultiPackageResult, b: &MultiPackageResult| {
        a.total_cost.total_cmp(&b.total_cost)
    };
    let most_confident = |a: &MultiPackageResult, b: &MultiPackageResult| {
        b.confidence.total_cmp(&a.confidence)
    };

    match objective {
        OptimizationObjective::MinimizePackages => plans.into_iter().min_by(|a, b| {
            fewest_packages(a, b)
                .then_with(|| cheapest(a, b))
                .then_with(|| most_confident(a, b))
        }),
        OptimizationObjective::MinimizeCost => plans.into_iter().min_by(|a, b| {
            cheapest(a, b)
                .then_with(|| fewest_packages(a, b))
                .then_with(|| most_confident(a, b))
        }),
        OptimizationObjective::Balanced => {
            let max_packages = plans.iter().map(|p| p.total_packages).max().unwrap_or(0);
            let max_cost = plans.iter().map(|p| p.total_cost).fold(0.0, f64::max);
            let score = |plan: &MultiPackageResult| {
                let packages = if max_packages > 0 {
                    f64::from(plan.total_packages) / f64::from(max_packages)
                } else {
                    0.0
                };
                let cost = if max_cost > 0.0 {
                    plan.total_cost / max_cost
                } else {
                    0.0
                };
                weighted_score(&[(packages, 0.5), (cost, 0.5)])
            };
            plans.into_iter().min_by(|a, b| {
                score(a)
                    .total_cmp(&score(b))
                    .then_with(|| fewest_packages(a, b))
                    .then_with(|| most_confident(a, b))
            })
        }
    }
}
