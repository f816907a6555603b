// Copyright (c) 2026 Graphcore Ltd. All rights reserved.

//! Waste accounting over a run.
//!
//! Counts are kept in ordered maps and only ever added to, so the result of
//! a run does not depend on the order neurons were recorded in or on how
//! partial accumulators were merged.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use spur_engine::types::{CoreId, NeuronId};

use crate::resolver::TargetSet;
use crate::routing::{RouteOutcome, StrategyKind};

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct WasteAccumulator {
    /// Non-zero waste per source neuron.
    per_neuron: BTreeMap<NeuronId, usize>,

    /// Wasted deliveries received by each core.
    per_core: BTreeMap<CoreId, usize>,

    routed: usize,
    silent: usize,
    skipped: usize,
    target_deliveries: usize,
    valid_messages: usize,
    unmapped_targets: usize,
}

impl WasteAccumulator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add the outcome of routing one source neuron.
    pub fn record(&mut self, targets: &TargetSet, outcome: &RouteOutcome) {
        self.routed += 1;
        self.target_deliveries += targets.len();
        self.valid_messages += targets.valid_messages();
        self.unmapped_targets += targets.unmapped_targets;

        if outcome.waste() > 0 {
            *self.per_neuron.entry(outcome.source).or_default() += outcome.waste();
        }
        for core in &outcome.wasted {
            *self.per_core.entry(*core).or_default() += 1;
        }
    }

    /// A neuron fired without reaching any other core.
    pub fn record_silent(&mut self) {
        self.silent += 1;
    }

    /// A neuron could not be routed.
    pub fn record_skipped(&mut self) {
        self.skipped += 1;
    }

    /// Add all counts from `other`.
    pub fn merge(&mut self, other: &WasteAccumulator) {
        for (neuron, waste) in &other.per_neuron {
            *self.per_neuron.entry(*neuron).or_default() += waste;
        }
        for (core, waste) in &other.per_core {
            *self.per_core.entry(*core).or_default() += waste;
        }
        self.routed += other.routed;
        self.silent += other.silent;
        self.skipped += other.skipped;
        self.target_deliveries += other.target_deliveries;
        self.valid_messages += other.valid_messages;
        self.unmapped_targets += other.unmapped_targets;
    }

    #[must_use]
    pub fn total_waste(&self) -> usize {
        self.per_neuron.values().sum()
    }

    #[must_use]
    pub fn neuron_waste(&self, neuron: NeuronId) -> usize {
        self.per_neuron.get(&neuron).copied().unwrap_or(0)
    }

    #[must_use]
    pub fn core_waste(&self, core: CoreId) -> usize {
        self.per_core.get(&core).copied().unwrap_or(0)
    }

    #[must_use]
    pub fn routed(&self) -> usize {
        self.routed
    }

    #[must_use]
    pub fn silent(&self) -> usize {
        self.silent
    }

    #[must_use]
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    #[must_use]
    pub fn valid_messages(&self) -> usize {
        self.valid_messages
    }

    /// Freeze the counts into a report.
    #[must_use]
    pub fn report(&self, strategy: StrategyKind) -> WasteReport {
        let total_waste = self.total_waste();
        let waste_percentage = (self.valid_messages > 0)
            .then(|| total_waste as f64 / self.valid_messages as f64 * 100.0);
        WasteReport {
            strategy,
            total_waste,
            valid_messages: self.valid_messages,
            waste_percentage,
            target_deliveries: self.target_deliveries,
            routed_neurons: self.routed,
            silent_neurons: self.silent,
            skipped_neurons: self.skipped,
            unmapped_targets: self.unmapped_targets,
            per_neuron: self.per_neuron.clone(),
            per_core: self.per_core.clone(),
        }
    }
}

/// The waste measured in one run.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct WasteReport {
    pub strategy: StrategyKind,
    pub total_waste: usize,

    /// Neuron-level deliveries that had to cross cores.
    pub valid_messages: usize,

    /// `100 * total_waste / valid_messages`, absent without valid messages.
    pub waste_percentage: Option<f64>,

    /// Core-level deliveries to actual targets.
    pub target_deliveries: usize,

    pub routed_neurons: usize,
    pub silent_neurons: usize,
    pub skipped_neurons: usize,
    pub unmapped_targets: usize,

    /// Non-zero entries only.
    pub per_neuron: BTreeMap<NeuronId, usize>,

    /// Non-zero entries only.
    pub per_core: BTreeMap<CoreId, usize>,
}

impl fmt::Display for WasteReport {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(
            f,
            "==== {} Routing Waste Report ====",
            self.strategy.report_title()
        )?;
        writeln!(f, "Total illegal deliveries (waste): {}", self.total_waste)?;
        writeln!(f, "Total valid messages: {}", self.valid_messages)?;
        match self.waste_percentage {
            Some(percentage) => writeln!(f, "Waste percentage: {percentage:.2}%")?,
            None => writeln!(f, "Waste percentage: n/a")?,
        }
        writeln!(f, "Target core deliveries: {}", self.target_deliveries)?;
        writeln!(
            f,
            "Neurons routed: {}, silent: {}, skipped: {}",
            self.routed_neurons, self.silent_neurons, self.skipped_neurons
        )?;
        writeln!(f, "Unmapped targets ignored: {}", self.unmapped_targets)?;

        writeln!(f, "Per-neuron waste (non-zero only):")?;
        for (neuron, waste) in &self.per_neuron {
            writeln!(f, "  Neuron {neuron}: {waste}")?;
        }
        writeln!(f, "Per-core waste (non-zero only):")?;
        for (core, waste) in &self.per_core {
            writeln!(f, "  Core {core}: {waste}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use spur_engine::topology::NodeRef;

    use super::*;
    use crate::routing::Broadcast;

    fn routed(source: NeuronId, targets: &[CoreId], wasted: &[CoreId]) -> (TargetSet, RouteOutcome) {
        let target_set = TargetSet {
            source,
            source_core: 0,
            neurons_by_core: targets.iter().map(|c| (*c, vec![*c, *c + 100])).collect(),
            unmapped_targets: 1,
        };
        let outcome = RouteOutcome {
            source,
            broadcast: Broadcast::Lca { lca: NodeRef(0) },
            delivered: Vec::new(),
            wasted: wasted.to_vec(),
        };
        (target_set, outcome)
    }

    fn accumulate(records: &[(TargetSet, RouteOutcome)]) -> WasteAccumulator {
        let mut acc = WasteAccumulator::new();
        for (targets, outcome) in records {
            acc.record(targets, outcome);
        }
        acc
    }

    #[test]
    fn counts_non_zero_only() {
        let acc = accumulate(&[routed(2, &[1], &[3, 4]), routed(5, &[3], &[])]);
        assert_eq!(acc.total_waste(), 2);
        assert_eq!(acc.neuron_waste(2), 2);
        assert_eq!(acc.neuron_waste(5), 0);
        assert_eq!(acc.core_waste(3), 1);

        let report = acc.report(StrategyKind::Lca);
        assert_eq!(report.per_neuron, BTreeMap::from([(2, 2)]));
        assert_eq!(report.per_core, BTreeMap::from([(3, 1), (4, 1)]));
        assert_eq!(report.routed_neurons, 2);
        assert_eq!(report.valid_messages, 4);
        assert_eq!(report.unmapped_targets, 2);
        assert_eq!(report.waste_percentage, Some(50.0));
    }

    #[test]
    fn repeated_core_counts_each_delivery() {
        let acc = accumulate(&[routed(0, &[2], &[1, 0, 1])]);
        assert_eq!(acc.total_waste(), 3);
        assert_eq!(acc.core_waste(1), 2);
    }

    #[test]
    fn merge_is_order_independent() {
        let records = [
            routed(0, &[1], &[2]),
            routed(1, &[2, 3], &[0, 1]),
            routed(4, &[1], &[2, 3]),
        ];

        let forward = accumulate(&records);
        let mut reversed = records.to_vec();
        reversed.reverse();
        assert_eq!(accumulate(&reversed), forward);

        let mut merged = accumulate(&records[2..]);
        merged.record_silent();
        let mut head = accumulate(&records[..2]);
        head.record_skipped();
        merged.merge(&head);

        let mut expected = forward.clone();
        expected.record_silent();
        expected.record_skipped();
        assert_eq!(merged, expected);
    }

    #[test]
    fn text_report() {
        let mut acc = accumulate(&[routed(0, &[1], &[2, 3]), routed(3, &[1], &[2])]);
        acc.record_silent();
        let text = acc.report(StrategyKind::Mask).to_string();
        assert_eq!(
            text,
            "==== HBS Routing Waste Report ====\n\
             Total illegal deliveries (waste): 3\n\
             Total valid messages: 4\n\
             Waste percentage: 75.00%\n\
             Target core deliveries: 2\n\
             Neurons routed: 2, silent: 1, skipped: 0\n\
             Unmapped targets ignored: 2\n\
             Per-neuron waste (non-zero only):\n  \
             Neuron 0: 2\n  \
             Neuron 3: 1\n\
             Per-core waste (non-zero only):\n  \
             Core 2: 2\n  \
             Core 3: 1\n"
        );
    }

    #[test]
    fn empty_report() {
        let report = WasteAccumulator::new().report(StrategyKind::Lca);
        assert_eq!(report.total_waste, 0);
        assert_eq!(report.waste_percentage, None);
        assert!(report.to_string().contains("Waste percentage: n/a"));
    }
}
