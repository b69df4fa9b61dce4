//! Execution plan: the loaded data trees flattened into an ordered case list.

use super::report::{CaseReport, Outcome};
use crate::config::CaseConfig;
use crate::data::Dir;
use super::FrameworkError;
use crate::runtime::{
    run_case, ActiveContext, CleanerTable, ContextError, ContextNode, LabelFilter, PresetterTable,
    Runtime,
};
use std::time::{Duration, Instant};

pub(crate) struct PlannedCase {
    /// Indexes into [`Plan::nodes`], outermost context first.
    path: Vec<usize>,
    breadcrumb: Vec<String>,
    case: CaseConfig,
    selected: bool,
}

/// Every context node of the run and every case, in execution order.
///
/// Within a directory, case files run first, then subdirectories, both in
/// name order.
#[derive(Default)]
pub(crate) struct Plan {
    nodes: Vec<ContextNode>,
    cases: Vec<PlannedCase>,
}

impl Plan {
    pub(crate) fn build(dirs: &[Dir], filter: &LabelFilter) -> Self {
        let mut plan = Plan::default();
        for dir in dirs {
            plan.add_dir(dir, filter, &mut Vec::new(), &mut Vec::new());
        }
        plan
    }

    fn add_dir(
        &mut self,
        dir: &Dir,
        filter: &LabelFilter,
        path: &mut Vec<usize>,
        breadcrumb: &mut Vec<String>,
    ) {
        let summary = dir.summary();
        self.nodes.push(ContextNode::new(
            summary.clone(),
            dir.context.clone(),
            selected_cases(dir, filter),
        ));
        path.push(self.nodes.len() - 1);
        breadcrumb.push(summary);

        for file in &dir.files {
            let mut crumbs = breadcrumb.clone();
            crumbs.push(file.summary());
            self.cases.push(PlannedCase {
                path: path.clone(),
                breadcrumb: crumbs,
                case: file.case.clone(),
                selected: filter.selects(&file.case.labels),
            });
        }
        for child in &dir.dirs {
            self.add_dir(child, filter, path, breadcrumb);
        }

        path.pop();
        breadcrumb.pop();
    }

    /// Checks every context's presetter and cleaner names before anything
    /// is sent.
    pub(crate) fn check_collaborators(
        &self,
        presetters: &PresetterTable,
        cleaners: &CleanerTable,
    ) -> Result<(), FrameworkError> {
        for node in &self.nodes {
            node.check_collaborators(presetters, cleaners)
                .map_err(|source| FrameworkError::Collaborator {
                    context: node.summary().to_string(),
                    source,
                })?;
        }
        Ok(())
    }

    pub(crate) fn len(&self) -> usize {
        self.cases.len()
    }

    /// Runs every case in order and reports each one.
    pub(crate) async fn execute(&self, root: &ActiveContext, rt: &Runtime<'_>) -> Vec<CaseReport> {
        let mut reports = Vec::with_capacity(self.cases.len());
        for planned in &self.cases {
            let name = planned.breadcrumb.join(" / ");
            if !planned.selected {
                log::info!("skipping {}", name);
                reports.push(CaseReport {
                    breadcrumb: planned.breadcrumb.clone(),
                    outcome: Outcome::Skipped,
                    duration: Duration::ZERO,
                });
                continue;
            }

            log::info!("running {}", name);
            let started = Instant::now();
            let outcome = match self.run(planned, root, rt).await {
                Ok(()) => Outcome::Passed,
                Err(e) => {
                    log::warn!("{} failed: {}", name, e);
                    Outcome::Failed(e.to_string())
                }
            };
            reports.push(CaseReport {
                breadcrumb: planned.breadcrumb.clone(),
                outcome,
                duration: started.elapsed(),
            });
        }
        reports
    }

    /// Activates the case's contexts outermost first, runs it, then finishes
    /// every context on its path innermost first, whatever happened before.
    async fn run(
        &self,
        planned: &PlannedCase,
        root: &ActiveContext,
        rt: &Runtime<'_>,
    ) -> Result<(), ContextError> {
        let mut active = root.clone();
        let mut activated = 0;
        let mut result = Ok(());
        for &index in &planned.path {
            match self.nodes[index].activate(&active, rt).await {
                Ok(next) => {
                    active = next;
                    activated += 1;
                }
                Err(e) => {
                    result = Err(e);
                    break;
                }
            }
        }
        if result.is_ok() {
            result = run_case(&planned.case, &active, rt).await.map(|_| ());
        }

        for (depth, &index) in planned.path.iter().enumerate().rev() {
            let finished = self.nodes[index].finish_case(depth < activated, rt).await;
            result = result.and(finished);
        }
        result
    }
}

fn selected_cases(dir: &Dir, filter: &LabelFilter) -> usize {
    let here = dir
        .files
        .iter()
        .filter(|f| filter.selects(&f.case.labels))
        .count();
    here + dir.dirs.iter().map(|d| selected_cases(d, filter)).sum::<usize>()
}
