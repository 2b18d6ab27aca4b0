//! Strategy record selecting how runner events map onto report-tree nodes.

use crate::client::ItemType;

/// Reporting-mode strategy of a [`Reporter`].
///
/// All modes share one state machine; a mode only selects which node type a
/// feature and a scenario map to, whether steps become child items or
/// inline log lines, and whether a synthetic root container is created once
/// per launch and reused as every feature's parent.
///
/// [`Reporter`]: super::Reporter
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ReportingMode {
    /// Node type a feature maps to.
    pub feature_item_type: ItemType,

    /// Node type a scenario maps to.
    pub scenario_item_type: ItemType,

    /// Whether steps are rendered as inline log lines instead of child
    /// items.
    pub inline_steps: bool,

    /// Name of the synthetic root container, when one is used.
    pub synthetic_root: Option<&'static str>,
}

impl ReportingMode {
    /// Three-level tree: feature → scenario → step, hooks as dedicated
    /// before/after items.
    #[must_use]
    pub const fn three_level() -> Self {
        Self {
            feature_item_type: ItemType::Suite,
            scenario_item_type: ItemType::Scenario,
            inline_steps: false,
            synthetic_root: None,
        }
    }

    /// Two-level tree: feature → scenario, steps and hooks reported as log
    /// lines of the scenario.
    #[must_use]
    pub const fn two_level() -> Self {
        Self {
            feature_item_type: ItemType::Test,
            scenario_item_type: ItemType::Step,
            inline_steps: true,
            synthetic_root: None,
        }
    }

    /// Two-level tree under a synthetic "Root User Story" container, for
    /// services that cannot attach test containers directly to a launch.
    #[must_use]
    pub const fn two_level_rooted() -> Self {
        Self {
            feature_item_type: ItemType::Test,
            scenario_item_type: ItemType::Step,
            inline_steps: true,
            synthetic_root: Some("Root User Story"),
        }
    }
}

impl Default for ReportingMode {
    fn default() -> Self {
        Self::three_level()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn variants_differ_only_in_the_strategy_fields() {
        let three = ReportingMode::three_level();
        assert_eq!(three.feature_item_type, ItemType::Suite);
        assert_eq!(three.scenario_item_type, ItemType::Scenario);
        assert!(!three.inline_steps);
        assert_eq!(three.synthetic_root, None);

        let two = ReportingMode::two_level();
        assert_eq!(two.feature_item_type, ItemType::Test);
        assert_eq!(two.scenario_item_type, ItemType::Step);
        assert!(two.inline_steps);
        assert_eq!(two.synthetic_root, None);

        let rooted = ReportingMode::two_level_rooted();
        assert_eq!(rooted.synthetic_root, Some("Root User Story"));
        assert_eq!(rooted.feature_item_type, ItemType::Test);
    }
}
