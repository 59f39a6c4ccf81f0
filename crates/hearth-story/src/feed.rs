//! Replay and projection as one pipeline
//!
//! [`Feed`] keeps the directory, the activity log and the stories of one
//! operation log together. Operations the replay engine skips never reach
//! aggregation, so a malformed record costs its own story and nothing else.
//! Errors that do surface are projection defects.

use hearth_core::{HearthResult, Operation};
use hearth_ledger::{MemberDirectory, ReplayEngine, ReplayReport};
use tracing::debug;

use crate::activity::ActivityLog;
use crate::projector::StoryProjector;
use crate::story::Story;

/// A replayed directory and the story feed projected from it
#[derive(Debug, Clone, Default)]
pub struct Feed {
    directory: MemberDirectory,
    report: ReplayReport,
    activities: ActivityLog,
    stories: Vec<Story>,
}

impl Feed {
    /// Replay `operations` and project the stories of everything replay kept
    pub fn build(
        operations: &[Operation],
        engine: &ReplayEngine,
        projector: &StoryProjector,
    ) -> HearthResult<Self> {
        let mut feed = Self::default();
        feed.extend(operations, engine, projector)?;
        Ok(feed)
    }

    /// Append a batch: replay it onto the directory, aggregate what replay
    /// kept, then reproject.
    ///
    /// On `Err` the replayed directory and report already include the batch;
    /// the stories are those of the previous batch.
    pub fn extend(
        &mut self,
        operations: &[Operation],
        engine: &ReplayEngine,
        projector: &StoryProjector,
    ) -> HearthResult<()> {
        let batch = engine.extend_with_report(&mut self.directory, operations);
        let mut activities = self.activities.clone();
        activities.extend_validated(operations, &batch)?;
        self.report.merge(batch);

        let stories = projector.project(activities.activities(), &self.directory)?;
        debug!(
            stories = stories.len(),
            skipped = self.report.skipped.len(),
            "feed updated"
        );
        self.activities = activities;
        self.stories = stories;
        Ok(())
    }

    pub fn directory(&self) -> &MemberDirectory {
        &self.directory
    }

    /// Every replay batch folded so far
    pub fn report(&self) -> &ReplayReport {
        &self.report
    }

    pub fn activities(&self) -> &ActivityLog {
        &self.activities
    }

    /// Stories, ordered by each story's first operation
    pub fn stories(&self) -> &[Story] {
        &self.stories
    }
}
