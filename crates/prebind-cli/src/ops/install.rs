//! The install pass: rewire every claimed consumer of a project.
//!
//! Consumers are processed one at a time in project order. A failure is
//! reported and counted, then the pass moves on to the next consumer.
//! Consumers whose private copy would also be loaded by other packages are
//! skipped with a warning.

use std::time::Instant;

use prebind_core::rewrite::{self, GeneratedFile, Outcome, RewriteContext, RewriteError};
use prebind_core::{Project, ProjectError, Reporter};

use super::error::error_chain;
use super::{Context, InstallError};

pub const SECTION: &str = "Native dependency resolution";

/// Counts of one install pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InstallSummary {
    pub mutated: usize,
    pub planned: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl InstallSummary {
    pub fn is_clean(&self) -> bool {
        self.failed == 0
    }
}

pub async fn install(
    ctx: &Context,
    project: &Project,
    dry_run: bool,
) -> Result<InstallSummary, InstallError> {
    let start = Instant::now();
    let reporter: &dyn Reporter = ctx.reporter.as_ref();
    reporter.section(SECTION);

    for (locator, location) in project.duplicates() {
        reporter.warning(&format!(
            "{locator} is also installed at {}, that copy is left untouched",
            location.display()
        ));
    }

    let strategies = rewrite::strategies(&ctx.config)?;
    let rctx = RewriteContext {
        project,
        env: &ctx.env,
        reporter,
        dry_run,
    };

    let mut summary = InstallSummary::default();
    for package in project.packages() {
        let Some((strategy, target)) = strategies.iter().find_map(|strategy| {
            strategy
                .claim(package, &ctx.env, reporter)
                .map(|target| (strategy, target))
        }) else {
            continue;
        };

        match rewrite::mutate_package(rctx, package, &target, strategy.as_ref()).await {
            Ok(Outcome::Mutated(_)) => summary.mutated += 1,
            Ok(Outcome::Planned(mutation)) => {
                for GeneratedFile { path, .. } in &mutation.files {
                    reporter.info(&format!(
                        "  would write {}",
                        mutation.target_location.join(path).display()
                    ));
                }
                summary.planned += 1;
            }
            Ok(Outcome::Skipped) => summary.skipped += 1,
            Err(e @ (RewriteError::NoPrebuild(_) | RewriteError::MissingFile { .. })) => {
                reporter.error(&e.to_string());
                summary.failed += 1;
            }
            Err(RewriteError::Project(e @ ProjectError::SharedLocation { .. })) => {
                reporter.warning(&e.to_string());
                summary.skipped += 1;
            }
            Err(e) => {
                reporter.info(&format!(
                    "Couldn't mutate node-gyp-build for {}",
                    package.locator
                ));
                tracing::error!("{}", error_chain(&e));
                summary.failed += 1;
            }
        }
    }

    let elapsed = start.elapsed().as_secs_f64();
    if dry_run {
        reporter.summary(summary.planned, "planned", elapsed);
    } else {
        reporter.summary(summary.mutated, "mutated", elapsed);
    }
    if summary.skipped > 0 || summary.failed > 0 {
        reporter.warning(&format!(
            "{} skipped, {} failed",
            summary.skipped, summary.failed
        ));
    }
    Ok(summary)
}
