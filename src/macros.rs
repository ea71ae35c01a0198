//! Macro percentages for ring charts and labels.
//!
//! Independently rounding three percentages does not keep their sum at 100
//! (33.4/33.3/33.3 rounds to 33/33/33). [`reconcile_macro_percentages`]
//! applies the largest-remainder method so ring segments always close.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::models::{
    FoodEntry, MacroAllocation, MacroPercentages, CARBS_KCAL_PER_GRAM, FAT_KCAL_PER_GRAM,
    PROTEIN_KCAL_PER_GRAM,
};

/// Upper bound on a single exact percentage before rounding.
const MAX_EXACT_PERCENT: f64 = 1e12;

/// Round three macro gram amounts to integer percentages of
/// `total_calories` that sum to exactly 100.
///
/// A `total_calories` of zero, below zero or non-finite is floored to 1.
/// When every macro contributes zero calories the result is `(0, 0, 0)`:
/// there is nothing to apportion, so the sum is 0 rather than 100.
///
/// The correction always forces the sum to 100. If `total_calories` is not
/// the macro-calorie sum, the exact percentages legitimately add up to
/// something else; use [`percentages_of_target`] for those labels.
///
/// Equal remainders keep protein, carbs, fat order.
pub fn reconcile_macro_percentages(
    protein_g: f64,
    carbs_g: f64,
    fat_g: f64,
    total_calories: f64,
) -> MacroPercentages {
    let total = if total_calories.is_finite() && total_calories > 0.0 {
        total_calories
    } else {
        debug!(total_calories, "non-positive calorie total, flooring to 1");
        1.0
    };

    let exact = [
        protein_g.max(0.0) * PROTEIN_KCAL_PER_GRAM / total * 100.0,
        carbs_g.max(0.0) * CARBS_KCAL_PER_GRAM / total * 100.0,
        fat_g.max(0.0) * FAT_KCAL_PER_GRAM / total * 100.0,
    ];
    if exact.iter().all(|e| *e == 0.0) {
        return MacroPercentages::default();
    }

    // Caps absurd inputs (huge grams over a floored total) so the integer
    // sum cannot overflow.
    let exact = exact.map(|e| e.min(MAX_EXACT_PERCENT));
    let mut rounded = exact.map(|e| e.round() as i64);
    let difference = 100 - rounded.iter().sum::<i64>();

    if difference != 0 {
        let remainder = |i: usize| exact[i] - rounded[i] as f64;
        let mut order = [0usize, 1, 2];
        // sort_by is stable, so ties keep protein, carbs, fat order.
        if difference > 0 {
            order.sort_by(|&a, &b| remainder(b).total_cmp(&remainder(a)));
        } else {
            order.sort_by(|&a, &b| remainder(a).total_cmp(&remainder(b)));
        }
        distribute(&mut rounded, order, difference);
        debug!(difference, ?rounded, "reconciled macro percentages");
    }

    // Non-negative and summing to 100, so each fits in i32.
    MacroPercentages {
        protein: rounded[0] as i32,
        carbs: rounded[1] as i32,
        fat: rounded[2] as i32,
    }
}

/// Spread `difference` one point at a time over `order`, cycling, without
/// taking any macro below zero.
///
/// Whole rounds are applied in bulk, so the cost does not grow with
/// `difference`. A negative step skips macros already at zero; the rounded
/// sum exceeds 100 in that case, so some macro can always absorb it.
fn distribute(rounded: &mut [i64; 3], order: [usize; 3], difference: i64) {
    let step = difference.signum();
    let mut remaining = difference.abs();

    while remaining > 0 {
        let eligible: Vec<usize> = order
            .iter()
            .copied()
            .filter(|&i| step > 0 || rounded[i] > 0)
            .collect();
        if eligible.is_empty() {
            break;
        }
        let count = eligible.len() as i64;

        let mut rounds = remaining / count;
        if step < 0 {
            // Stop when the smallest eligible macro reaches zero so the
            // next pass drops it.
            let floor = eligible.iter().map(|&i| rounded[i]).min().unwrap_or(0);
            rounds = rounds.min(floor);
        }

        if rounds > 0 {
            for &i in &eligible {
                rounded[i] += step * rounds;
            }
            remaining -= rounds * count;
        } else {
            for &i in eligible.iter().take(remaining as usize) {
                rounded[i] += step;
            }
            remaining = 0;
        }
    }
}

/// Rounded share of the calorie target each macro covers, without any
/// correction. These may sum to more or less than 100.
pub fn percentages_of_target(allocation: &MacroAllocation) -> MacroPercentages {
    let target = if allocation.calorie_target > 0.0 {
        allocation.calorie_target
    } else {
        1.0
    };
    let pct = |kcal: f64| (kcal.max(0.0) / target * 100.0).round() as i32;
    MacroPercentages {
        protein: pct(allocation.protein_calories()),
        carbs: pct(allocation.carbs_calories()),
        fat: pct(allocation.fat_calories()),
    }
}

impl MacroAllocation {
    /// Ring chart split of this allocation's own macro calories.
    pub fn ring_percentages(&self) -> MacroPercentages {
        reconcile_macro_percentages(self.protein_g, self.carbs_g, self.fat_g, self.macro_calories())
    }
}

/// Totals for one day of logged food.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DailyIntake {
    pub calories: f64,
    pub protein_g: f64,
    pub carbs_g: f64,
    pub fat_g: f64,
}

/// Consumed / target fractions. 1.0 means the target is met exactly.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct IntakeProgress {
    pub calories: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
}

impl DailyIntake {
    /// Sum the entries that have not been deleted.
    pub fn from_entries<'a>(entries: impl IntoIterator<Item = &'a FoodEntry>) -> Self {
        entries
            .into_iter()
            .filter(|e| !e.deleted)
            .fold(Self::default(), |acc, e| Self {
                calories: acc.calories + e.calories,
                protein_g: acc.protein_g + e.protein,
                carbs_g: acc.carbs_g + e.carbs,
                fat_g: acc.fat_g + e.fat,
            })
    }

    /// Progress against `target`. A zero target yields 0 for that macro.
    pub fn progress(&self, target: &MacroAllocation) -> IntakeProgress {
        let frac = |consumed: f64, goal: f64| {
            if goal > 0.0 {
                consumed / goal
            } else {
                0.0
            }
        };
        IntakeProgress {
            calories: frac(self.calories, target.calorie_target),
            protein: frac(self.protein_g, target.protein_g),
            carbs: frac(self.carbs_g, target.carbs_g),
            fat: frac(self.fat_g, target.fat_g),
        }
    }

    /// Ring chart split of what was eaten, by macro calories.
    pub fn ring_percentages(&self) -> MacroPercentages {
        MacroAllocation::new(self.protein_g, self.carbs_g, self.fat_g, self.calories)
            .ring_percentages()
    }
}
