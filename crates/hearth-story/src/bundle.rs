//! Basic-income bundling state
//!
//! While projecting, at most one bundle is open. Mints falling within the
//! window of the bundle's first mint are merged into the bundle's story;
//! the first mint outside it closes the bundle and opens a new one.

use bigdecimal::BigDecimal;
use chrono::{DateTime, Duration, Utc};

use crate::story::StoryId;

/// The open basic-income bundle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BundleState {
    pub bundle_id: StoryId,
    /// Position of the bundle's story in the output
    pub story_index: usize,
    pub running_total: BigDecimal,
    pub first_timestamp: DateTime<Utc>,
}

impl BundleState {
    pub fn open(
        bundle_id: StoryId,
        story_index: usize,
        amount: BigDecimal,
        first_timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            bundle_id,
            story_index,
            running_total: amount,
            first_timestamp,
        }
    }

    /// Whether a mint at `at` still belongs to this bundle. The window end is
    /// inclusive.
    pub fn accepts(&self, at: DateTime<Utc>, window: Duration) -> bool {
        at.signed_duration_since(self.first_timestamp) <= window
    }

    /// Fold a mint amount into the running total
    pub fn absorb(&mut self, amount: &BigDecimal) {
        self.running_total = &self.running_total + amount;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::story::StoryKind;
    use hearth_core::fixtures::at_minutes;
    use hearth_core::OperationId;

    fn bundle() -> BundleState {
        BundleState::open(
            StoryId::derive(StoryKind::MintBasicIncome, &[OperationId::from("m1")]),
            0,
            BigDecimal::from(10),
            at_minutes(0),
        )
    }

    #[test]
    fn test_window_is_inclusive() {
        let bundle = bundle();
        let window = Duration::hours(3);
        assert!(bundle.accepts(at_minutes(0), window));
        assert!(bundle.accepts(at_minutes(180), window));
        assert!(!bundle.accepts(at_minutes(181), window));
    }

    #[test]
    fn test_absorb() {
        let mut bundle = bundle();
        bundle.absorb(&BigDecimal::from(5));
        assert_eq!(bundle.running_total, BigDecimal::from(15));
    }
}
