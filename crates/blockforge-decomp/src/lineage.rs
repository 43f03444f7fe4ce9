//! Provenance of a decomposition: ancestors, detector chain and per-step
//! statistics.

use std::fmt;

use crate::partial::PartialDecomposition;

/// How much of a decomposition was supplied by the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UserGiven {
    #[default]
    Not,
    Partial,
    Complete,
    /// Complete after the user's open constraints were moved to master.
    CompletedConssToMaster,
}

/// Identifies the detector that produced a refinement step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetectorRef {
    pub name: String,
    pub chain_char: char,
}

impl DetectorRef {
    pub fn new(name: impl Into<String>, chain_char: char) -> Self {
        Self {
            name: name.into(),
            chain_char,
        }
    }
}

impl Default for DetectorRef {
    fn default() -> Self {
        Self::new("unknown", '?')
    }
}

impl fmt::Display for DetectorRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.chain_char)
    }
}

/// Statistics of one refinement step.
///
/// Fractions are relative to the number of variables or constraints of
/// the index space.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LineageStep {
    pub detector: DetectorRef,
    pub clock_seconds: f64,
    pub pct_vars_to_block: f64,
    pub pct_vars_to_border: f64,
    pub pct_vars_from_open: f64,
    pub pct_conss_to_block: f64,
    pub pct_conss_to_border: f64,
    pub pct_conss_from_open: f64,
    pub n_new_blocks: usize,
    pub used_classifier: Option<String>,
}

/// Ancestry and detector history of one decomposition.
#[derive(Debug, Clone, Default)]
pub struct Lineage {
    ancestors: Vec<usize>,
    steps: Vec<LineageStep>,
    user_given: UserGiven,
    finished_by_finisher: bool,
    selected: bool,
}

impl Lineage {
    /// Ancestor ids, oldest first.
    pub fn ancestors(&self) -> &[usize] {
        &self.ancestors
    }

    pub fn steps(&self) -> &[LineageStep] {
        &self.steps
    }

    pub fn add_ancestor_id(&mut self, id: usize) {
        self.ancestors.push(id);
    }

    /// Starts a new step attributed to `detector`.
    pub fn add_detector_chain_info(&mut self, detector: DetectorRef) {
        self.steps.push(LineageStep {
            detector,
            ..LineageStep::default()
        });
    }

    fn current_step(&mut self) -> &mut LineageStep {
        if self.steps.is_empty() {
            self.steps.push(LineageStep::default());
        }
        let last = self.steps.len() - 1;
        &mut self.steps[last]
    }

    pub fn add_clock_time(&mut self, seconds: f64) {
        self.current_step().clock_seconds += seconds;
    }

    pub fn add_pct_vars_to_block(&mut self, pct: f64) {
        self.current_step().pct_vars_to_block = pct;
    }

    pub fn add_pct_vars_to_border(&mut self, pct: f64) {
        self.current_step().pct_vars_to_border = pct;
    }

    pub fn add_pct_vars_from_open(&mut self, pct: f64) {
        self.current_step().pct_vars_from_open = pct;
    }

    pub fn add_pct_conss_to_block(&mut self, pct: f64) {
        self.current_step().pct_conss_to_block = pct;
    }

    pub fn add_pct_conss_to_border(&mut self, pct: f64) {
        self.current_step().pct_conss_to_border = pct;
    }

    pub fn add_pct_conss_from_open(&mut self, pct: f64) {
        self.current_step().pct_conss_from_open = pct;
    }

    pub fn add_n_new_blocks(&mut self, n: usize) {
        self.current_step().n_new_blocks = n;
    }

    pub fn add_used_classifier(&mut self, classifier: impl Into<String>) {
        self.current_step().used_classifier = Some(classifier.into());
    }

    /// Chain characters of every step, in order.
    pub fn detector_chain_string(&self) -> String {
        self.steps.iter().map(|s| s.detector.chain_char).collect()
    }

    /// True if a step was attributed to the detector called `name`.
    pub fn is_propagated_by(&self, name: &str) -> bool {
        self.steps.iter().any(|s| s.detector.name == name)
    }

    /// Total clock time over all steps.
    pub fn total_clock_seconds(&self) -> f64 {
        self.steps.iter().map(|s| s.clock_seconds).sum()
    }

    pub fn user_given(&self) -> UserGiven {
        self.user_given
    }

    pub fn set_user_given(&mut self, user_given: UserGiven) {
        self.user_given = user_given;
    }

    pub fn is_finished_by_finisher(&self) -> bool {
        self.finished_by_finisher
    }

    pub fn set_finished_by_finisher(&mut self, finished: bool) {
        self.finished_by_finisher = finished;
    }

    pub fn is_selected(&self) -> bool {
        self.selected
    }

    pub fn set_selected(&mut self, selected: bool) {
        self.selected = selected;
    }
}

fn fraction(delta: isize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        delta as f64 / total as f64
    }
}

impl PartialDecomposition<'_> {
    /// Records on the current lineage step how far this decomposition moved
    /// away from `ancestor`.
    pub fn record_transition_from(&mut self, ancestor: &PartialDecomposition<'_>) {
        let n_vars = self.n_vars();
        let n_conss = self.n_conss();
        let block_vars = |d: &PartialDecomposition<'_>| {
            d.vars_for_blocks.iter().map(Vec::len).sum::<usize>() as isize
        };
        let border_vars = |d: &PartialDecomposition<'_>| {
            (d.n_master_vars() + d.n_linking_vars() + d.n_total_stairlinking_vars()) as isize
        };
        let block_conss = |d: &PartialDecomposition<'_>| {
            d.conss_for_blocks.iter().map(Vec::len).sum::<usize>() as isize
        };

        let pct_vars_to_block = fraction(block_vars(self) - block_vars(ancestor), n_vars);
        let pct_vars_to_border = fraction(border_vars(self) - border_vars(ancestor), n_vars);
        let pct_vars_from_open = fraction(
            ancestor.n_open_vars() as isize - self.n_open_vars() as isize,
            n_vars,
        );
        let pct_conss_to_block = fraction(block_conss(self) - block_conss(ancestor), n_conss);
        let pct_conss_to_border = fraction(
            self.n_master_conss() as isize - ancestor.n_master_conss() as isize,
            n_conss,
        );
        let pct_conss_from_open = fraction(
            ancestor.n_open_conss() as isize - self.n_open_conss() as isize,
            n_conss,
        );
        let n_new_blocks = self.n_blocks.saturating_sub(ancestor.n_blocks);

        let lineage = &mut self.lineage;
        lineage.add_pct_vars_to_block(pct_vars_to_block);
        lineage.add_pct_vars_to_border(pct_vars_to_border);
        lineage.add_pct_vars_from_open(pct_vars_from_open);
        lineage.add_pct_conss_to_block(pct_conss_to_block);
        lineage.add_pct_conss_to_border(pct_conss_to_border);
        lineage.add_pct_conss_from_open(pct_conss_from_open);
        lineage.add_n_new_blocks(n_new_blocks);
    }
}
