use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// kcal per gram of protein.
pub const PROTEIN_KCAL_PER_GRAM: f64 = 4.0;
/// kcal per gram of carbohydrate.
pub const CARBS_KCAL_PER_GRAM: f64 = 4.0;
/// kcal per gram of fat.
pub const FAT_KCAL_PER_GRAM: f64 = 9.0;

/// A day's macro targets (or intake) together with a calorie target.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MacroAllocation {
    /// Protein (g)
    pub protein_g: f64,
    /// Carbs (g)
    pub carbs_g: f64,
    /// Fat (g)
    pub fat_g: f64,
    /// Calories (kcal)
    pub calorie_target: f64,
}

impl MacroAllocation {
    pub fn new(protein_g: f64, carbs_g: f64, fat_g: f64, calorie_target: f64) -> Self {
        Self {
            protein_g,
            carbs_g,
            fat_g,
            calorie_target,
        }
    }

    pub fn protein_calories(&self) -> f64 {
        self.protein_g * PROTEIN_KCAL_PER_GRAM
    }

    pub fn carbs_calories(&self) -> f64 {
        self.carbs_g * CARBS_KCAL_PER_GRAM
    }

    pub fn fat_calories(&self) -> f64 {
        self.fat_g * FAT_KCAL_PER_GRAM
    }

    /// Sum of the three macro calorie contributions.
    pub fn macro_calories(&self) -> f64 {
        self.protein_calories() + self.carbs_calories() + self.fat_calories()
    }
}

/// Integer macro percentages, in protein/carbs/fat order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MacroPercentages {
    pub protein: i32,
    pub carbs: i32,
    pub fat: i32,
}

impl MacroPercentages {
    pub fn total(&self) -> i32 {
        self.protein + self.carbs + self.fat
    }

    /// Percentages as fractions of 1.0, the form ring charts consume.
    pub fn as_fractions(&self) -> (f64, f64, f64) {
        (
            f64::from(self.protein) / 100.0,
            f64::from(self.carbs) / 100.0,
            f64::from(self.fat) / 100.0,
        )
    }

    pub fn as_tuple(&self) -> (i32, i32, i32) {
        (self.protein, self.carbs, self.fat)
    }
}

/// Body metrics and vitals that get a chart screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricKind {
    Height,
    Weight,
    BodyFat,
    Water,
    RestingHeartRate,
}

impl MetricKind {
    pub fn unit(&self) -> &'static str {
        match self {
            Self::Height => "cm",
            Self::Weight => "kg",
            Self::BodyFat => "%",
            Self::Water => "ml",
            Self::RestingHeartRate => "bpm",
        }
    }
}

impl std::fmt::Display for MetricKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Height => write!(f, "height"),
            Self::Weight => write!(f, "weight"),
            Self::BodyFat => write!(f, "body_fat"),
            Self::Water => write!(f, "water"),
            Self::RestingHeartRate => write!(f, "resting_heart_rate"),
        }
    }
}

/// A sample as it arrives from the data service, before timestamp parsing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawSample {
    pub id: String,
    /// Timestamp string, usually RFC 3339
    pub date: String,
    /// Numeric value; the service sometimes sends numbers as strings
    pub value: serde_json::Value,
}

/// One measurement of a metric. Immutable once fetched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeSeriesSample {
    /// Server-assigned id, used for deletion
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub value: f64,
}

impl TimeSeriesSample {
    pub fn new(id: impl Into<String>, timestamp: DateTime<Utc>, value: f64) -> Self {
        Self {
            id: id.into(),
            timestamp,
            value,
        }
    }
}

/// A chart point: the start of a bucket and the mean of its samples.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeriesPoint {
    pub bucket_start: DateTime<Utc>,
    pub value: f64,
}

/// Chart-ready points, ascending by bucket start.
pub type BucketedSeries = Vec<SeriesPoint>;

/// Macro/calorie goals from the user's plan.
///
/// Each list is indexed Monday..Sunday. A list shorter than seven entries
/// repeats its last value; an empty list means no target.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MacroGoals {
    pub calories: Vec<f64>,
    pub protein: Vec<f64>,
    pub carbs: Vec<f64>,
    pub fat: Vec<f64>,
}

impl MacroGoals {
    /// The targets that apply on `date`.
    pub fn allocation_for(&self, date: NaiveDate) -> MacroAllocation {
        let day = date.weekday().num_days_from_monday() as usize;
        let pick = |values: &[f64]| -> f64 {
            values
                .get(day)
                .or_else(|| values.last())
                .copied()
                .unwrap_or(0.0)
        };
        MacroAllocation {
            protein_g: pick(&self.protein),
            carbs_g: pick(&self.carbs),
            fat_g: pick(&self.fat),
            calorie_target: pick(&self.calories),
        }
    }
}

/// An individual food log entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FoodEntry {
    pub date: NaiveDate,
    pub entry_id: String,
    pub name: Option<String>,
    /// Calories (kcal)
    pub calories: f64,
    /// Protein (g)
    pub protein: f64,
    /// Carbs (g)
    pub carbs: f64,
    /// Fat (g)
    pub fat: f64,
    #[serde(default)]
    pub deleted: bool,
}
