// ── Filter view ──
//
// Stateless predicate over the registry: a category filter plus a
// mutually-exclusive tri-state id comparison against a numeric threshold.
// Selecting an active comparison deselects it; selecting any comparison
// clears the other two. The Monitor snapshots the whole state for undo
// before every committed change.

use serde::{Deserialize, Serialize};

use crate::model::{Category, Entity};

/// The three exclusive id comparisons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Comparison {
    LessThan,
    GreaterThan,
    EqualTo,
}

impl Comparison {
    fn holds(self, id: u32, threshold: u32) -> bool {
        match self {
            Self::LessThan => id < threshold,
            Self::GreaterThan => id > threshold,
            Self::EqualTo => id == threshold,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct FilterState {
    /// `None` means all categories.
    pub category: Option<Category>,
    /// Id threshold for the comparison. Zero disables the numeric filter
    /// even when a comparison is selected.
    pub threshold: u32,
    /// At most one comparison active at a time.
    pub comparison: Option<Comparison>,
}

impl FilterState {
    /// Select a comparison with toggle-off and mutual-exclusivity
    /// semantics: re-selecting the active one clears it, selecting any
    /// other replaces it.
    pub fn select_comparison(&mut self, comparison: Comparison) {
        if self.comparison == Some(comparison) {
            self.comparison = None;
        } else {
            self.comparison = Some(comparison);
        }
    }

    pub fn set_category(&mut self, category: Option<Category>) {
        self.category = category;
    }

    pub fn set_threshold(&mut self, threshold: u32) {
        self.threshold = threshold;
    }

    /// Reset to the pass-everything state.
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    pub fn is_default(&self) -> bool {
        *self == Self::default()
    }

    /// Category must match, and the id comparison must hold when one is
    /// active with a nonzero threshold.
    pub fn matches(&self, entity: &Entity) -> bool {
        let category_ok = self.category.is_none_or(|c| entity.category == c);

        let id_ok = match self.comparison {
            Some(cmp) if self.threshold > 0 => cmp.holds(entity.id.get(), self.threshold),
            _ => true,
        };

        category_ok && id_ok
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use crate::model::EntityId;

    fn entity(n: u32) -> Entity {
        Entity::synthesized(EntityId::new(n).unwrap(), 60.0, Utc::now())
    }

    #[test]
    fn comparisons_are_mutually_exclusive() {
        let mut f = FilterState::default();
        f.select_comparison(Comparison::LessThan);
        f.select_comparison(Comparison::GreaterThan);
        assert_eq!(f.comparison, Some(Comparison::GreaterThan));
    }

    #[test]
    fn reselecting_toggles_off() {
        let mut f = FilterState::default();
        f.select_comparison(Comparison::EqualTo);
        f.select_comparison(Comparison::EqualTo);
        assert_eq!(f.comparison, None);
    }

    #[test]
    fn zero_threshold_disables_numeric_filter() {
        let mut f = FilterState::default();
        f.select_comparison(Comparison::LessThan);
        // threshold still 0: everything passes.
        assert!(f.matches(&entity(99)));

        f.set_threshold(5);
        assert!(f.matches(&entity(3)));
        assert!(!f.matches(&entity(99)));
    }

    #[test]
    fn category_and_comparison_combine() {
        let mut f = FilterState::default();
        f.set_category(Some(Category::Web)); // ids 1, 4, 7 mod 10
        f.set_threshold(5);
        f.select_comparison(Comparison::GreaterThan);

        assert!(f.matches(&entity(7)));
        assert!(!f.matches(&entity(4))); // Web but id <= 5
        assert!(!f.matches(&entity(8))); // id > 5 but Database
    }

    #[test]
    fn clear_restores_default() {
        let mut f = FilterState::default();
        f.set_category(Some(Category::File));
        f.set_threshold(3);
        f.select_comparison(Comparison::EqualTo);
        f.clear();
        assert!(f.is_default());
        assert!(f.matches(&entity(1)));
    }
}
