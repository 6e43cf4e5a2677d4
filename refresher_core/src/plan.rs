//! Volume-to-duration computation for one dispense.
//!
//! This is the only arithmetic in the controller and it is deliberately a
//! pure function so it can be tested (and benchmarked) without pumps: for
//! each ingredient, `ounces = ratio * volume` and `seconds = ounces /
//! flow_rate`. Timing is open-loop; there is no flow feedback to correct
//! against.

use crate::recipe::{INGREDIENT_COUNT, PUMP_COUNT, Recipe, WATER_INDEX};

/// Per-pump run durations (and the ounce breakdown behind them) for a
/// single (recipe, volume) order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DispensePlan {
    /// Ounces per ingredient, water included for diagnostics.
    pub ounces: [f32; INGREDIENT_COUNT],
    /// Seconds per physical pump. A zero entry means that pump is skipped.
    pub pump_seconds: [f32; PUMP_COUNT],
}

impl DispensePlan {
    /// Total wall-clock time of the sequential run.
    pub fn total_seconds(&self) -> f32 {
        self.pump_seconds
            .iter()
            .filter(|s| s.is_finite() && **s > 0.0)
            .sum()
    }
}

/// Compute run durations for `recipe` at `volume_oz` finished ounces.
///
/// No clamping or rounding beyond f32; a ratio of 0 yields a 0-second
/// entry. Water ounces are computed but never become a duration.
pub fn plan_dispense(recipe: &Recipe, volume_oz: f32, flow_rate_oz_per_s: f32) -> DispensePlan {
    let mut ounces = [0.0f32; INGREDIENT_COUNT];
    for (oz, ratio) in ounces.iter_mut().zip(recipe.ratios.iter()) {
        *oz = ratio * volume_oz;
    }
    let mut pump_seconds = [0.0f32; PUMP_COUNT];
    for (secs, oz) in pump_seconds.iter_mut().zip(ounces.iter()) {
        *secs = oz / flow_rate_oz_per_s;
    }
    debug_assert!(WATER_INDEX >= PUMP_COUNT, "water must not map to a pump");
    DispensePlan {
        ounces,
        pump_seconds,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recipe(ratios: [f32; INGREDIENT_COUNT]) -> Recipe {
        Recipe {
            name: "test".into(),
            ratios,
        }
    }

    #[test]
    fn grande_lemonade_runs_pumps_one_and_four() {
        // 16 oz at 0.5 concentrate ratio and 2.5 oz/s: 8 oz -> 3.2 s.
        let plan = plan_dispense(&recipe([0.5, 0.0, 0.0, 0.5, 0.0]), 16.0, 2.5);
        assert!((plan.pump_seconds[0] - 3.2).abs() < 1e-6);
        assert_eq!(plan.pump_seconds[1], 0.0);
        assert_eq!(plan.pump_seconds[2], 0.0);
        assert!((plan.pump_seconds[3] - 3.2).abs() < 1e-6);
    }

    #[test]
    fn water_is_reported_but_never_timed() {
        let plan = plan_dispense(&recipe([0.0, 0.0, 0.0, 0.0, 1.0]), 12.0, 2.5);
        assert_eq!(plan.ounces[WATER_INDEX], 12.0);
        assert_eq!(plan.pump_seconds, [0.0; PUMP_COUNT]);
        assert_eq!(plan.total_seconds(), 0.0);
    }

    #[test]
    fn total_ignores_zero_entries() {
        let plan = plan_dispense(&recipe([0.25, 0.0, 0.25, 0.0, 0.0]), 20.0, 2.5);
        assert!((plan.total_seconds() - 4.0).abs() < 1e-6);
    }
}
