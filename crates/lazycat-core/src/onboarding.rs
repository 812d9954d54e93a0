//! First-run questionnaire and the rule table that turns the answers into
//! starting work/rest durations.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ValidationError;

pub const MIN_SITTING_HOURS: f64 = 2.0;
pub const MAX_SITTING_HOURS: f64 = 12.0;
pub const DEFAULT_SITTING_HOURS: f64 = 8.0;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkType {
    BusinessSales,
    SoftwareDevelopment,
    CreativeDesign,
    PhysicalLabor,
    /// Free-text answer.
    Custom(String),
}

impl WorkType {
    /// Stable identifier used in storage and on the command line.
    pub fn as_key(&self) -> &str {
        match self {
            WorkType::BusinessSales => "business_sales",
            WorkType::SoftwareDevelopment => "software_development",
            WorkType::CreativeDesign => "creative_design",
            WorkType::PhysicalLabor => "physical_labor",
            WorkType::Custom(text) => text,
        }
    }

    /// Any unrecognized text becomes `Custom`.
    pub fn from_key(key: &str) -> Self {
        match key {
            "business_sales" => WorkType::BusinessSales,
            "software_development" => WorkType::SoftwareDevelopment,
            "creative_design" => WorkType::CreativeDesign,
            "physical_labor" => WorkType::PhysicalLabor,
            other => WorkType::Custom(other.to_string()),
        }
    }
}

impl FromStr for WorkType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(ValidationError::InvalidValue {
                field: "work_type".into(),
                message: "must not be empty".into(),
            });
        }
        Ok(WorkType::from_key(s))
    }
}

macro_rules! keyed_enum {
    ($name:ident, $field:literal { $($variant:ident => $key:literal),+ $(,)? }) => {
        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_key(self) -> &'static str {
                match self {
                    $($name::$variant => $key),+
                }
            }
        }

        impl FromStr for $name {
            type Err = ValidationError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.trim() {
                    $($key => Ok($name::$variant),)+
                    other => Err(ValidationError::InvalidValue {
                        field: $field.into(),
                        message: format!(
                            "unknown option '{other}', expected one of: {}",
                            [$($key),+].join(", ")
                        ),
                    }),
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_key())
            }
        }
    };
}

/// How often the user currently takes a break.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RestFrequency {
    Irregular,
    AboutHourly,
    AboutTwoHours,
    HalfDay,
    Rarely,
}

keyed_enum!(RestFrequency, "rest_frequency" {
    Irregular => "irregular",
    AboutHourly => "about_hourly",
    AboutTwoHours => "about_two_hours",
    HalfDay => "half_day",
    Rarely => "rarely",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FitnessHabit {
    Daily,
    FewTimesWeekly,
    Occasionally,
    Rarely,
}

keyed_enum!(FitnessHabit, "fitness_habit" {
    Daily => "daily",
    FewTimesWeekly => "few_times_weekly",
    Occasionally => "occasionally",
    Rarely => "rarely",
});

/// Answers collected during onboarding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OnboardingProfile {
    pub work_type: WorkType,
    /// Hours spent sitting per day, 2.0 ..= 12.0.
    pub sitting_hours: f64,
    pub rest_frequency: RestFrequency,
    pub fitness_habit: FitnessHabit,
}

impl Default for OnboardingProfile {
    fn default() -> Self {
        Self {
            work_type: WorkType::BusinessSales,
            sitting_hours: DEFAULT_SITTING_HOURS,
            rest_frequency: RestFrequency::Irregular,
            fitness_habit: FitnessHabit::Daily,
        }
    }
}

impl OnboardingProfile {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !(MIN_SITTING_HOURS..=MAX_SITTING_HOURS).contains(&self.sitting_hours) {
            return Err(ValidationError::InvalidValue {
                field: "sitting_hours".into(),
                message: format!(
                    "{} is outside {MIN_SITTING_HOURS}..={MAX_SITTING_HOURS}",
                    self.sitting_hours
                ),
            });
        }
        Ok(())
    }
}

/// Suggested starting durations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recommendation {
    pub work_minutes: u32,
    pub rest_minutes: u32,
}

struct Rule {
    matches: fn(&OnboardingProfile) -> bool,
    work_minutes: u32,
    rest_minutes: u32,
}

/// Evaluated top to bottom; the first match wins.
const RULES: &[Rule] = &[
    Rule {
        matches: |p| {
            p.work_type == WorkType::BusinessSales
                && p.sitting_hours > 8.0
                && p.rest_frequency == RestFrequency::Rarely
        },
        work_minutes: 45,
        rest_minutes: 10,
    },
    Rule {
        matches: |p| p.work_type == WorkType::SoftwareDevelopment && p.sitting_hours > 6.0,
        work_minutes: 50,
        rest_minutes: 8,
    },
    Rule {
        matches: |p| {
            p.work_type == WorkType::CreativeDesign
                && p.rest_frequency == RestFrequency::AboutHourly
        },
        work_minutes: 60,
        rest_minutes: 15,
    },
    Rule {
        matches: |p| p.work_type == WorkType::PhysicalLabor,
        work_minutes: 60,
        rest_minutes: 15,
    },
    Rule {
        matches: |p| p.fitness_habit == FitnessHabit::Daily,
        work_minutes: 55,
        rest_minutes: 10,
    },
    Rule {
        matches: |p| p.fitness_habit == FitnessHabit::Rarely,
        work_minutes: 40,
        rest_minutes: 12,
    },
];

const FALLBACK: Recommendation = Recommendation {
    work_minutes: 50,
    rest_minutes: 10,
};

pub fn recommend(profile: &OnboardingProfile) -> Recommendation {
    RULES
        .iter()
        .find(|rule| (rule.matches)(profile))
        .map(|rule| Recommendation {
            work_minutes: rule.work_minutes,
            rest_minutes: rule.rest_minutes,
        })
        .unwrap_or(FALLBACK)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(
        work_type: WorkType,
        sitting_hours: f64,
        rest_frequency: RestFrequency,
        fitness_habit: FitnessHabit,
    ) -> OnboardingProfile {
        OnboardingProfile {
            work_type,
            sitting_hours,
            rest_frequency,
            fitness_habit,
        }
    }

    fn rec(work_minutes: u32, rest_minutes: u32) -> Recommendation {
        Recommendation {
            work_minutes,
            rest_minutes,
        }
    }

    #[test]
    fn sales_sitting_long_without_breaks() {
        let p = profile(WorkType::BusinessSales, 9.0, RestFrequency::Rarely, FitnessHabit::Occasionally);
        assert_eq!(recommend(&p), rec(45, 10));
    }

    #[test]
    fn sales_boundary_falls_through() {
        // Exactly 8 hours does not satisfy "> 8".
        let p = profile(WorkType::BusinessSales, 8.0, RestFrequency::Rarely, FitnessHabit::Occasionally);
        assert_eq!(recommend(&p), rec(50, 10));
    }

    #[test]
    fn developer_rule() {
        let p = profile(WorkType::SoftwareDevelopment, 6.5, RestFrequency::Irregular, FitnessHabit::Daily);
        assert_eq!(recommend(&p), rec(50, 8));
    }

    #[test]
    fn designer_rule() {
        let p = profile(WorkType::CreativeDesign, 4.0, RestFrequency::AboutHourly, FitnessHabit::Rarely);
        assert_eq!(recommend(&p), rec(60, 15));
    }

    #[test]
    fn physical_labor_rule() {
        let p = profile(WorkType::PhysicalLabor, 2.0, RestFrequency::HalfDay, FitnessHabit::Rarely);
        assert_eq!(recommend(&p), rec(60, 15));
    }

    #[test]
    fn fitness_rules_apply_after_work_type_rules() {
        let p = profile(WorkType::Custom("nurse".into()), 5.0, RestFrequency::Irregular, FitnessHabit::Daily);
        assert_eq!(recommend(&p), rec(55, 10));
        let p = profile(WorkType::Custom("nurse".into()), 5.0, RestFrequency::Irregular, FitnessHabit::Rarely);
        assert_eq!(recommend(&p), rec(40, 12));
        let p = profile(WorkType::Custom("nurse".into()), 5.0, RestFrequency::Irregular, FitnessHabit::FewTimesWeekly);
        assert_eq!(recommend(&p), rec(50, 10));
    }

    #[test]
    fn keys_parse_back() {
        for freq in RestFrequency::ALL {
            assert_eq!(freq.as_key().parse::<RestFrequency>().unwrap(), *freq);
        }
        for habit in FitnessHabit::ALL {
            assert_eq!(habit.as_key().parse::<FitnessHabit>().unwrap(), *habit);
        }
        assert_eq!(WorkType::from_key("physical_labor"), WorkType::PhysicalLabor);
        assert_eq!(WorkType::from_key("nurse"), WorkType::Custom("nurse".into()));
        assert!("sometimes".parse::<RestFrequency>().is_err());
        assert!("  ".parse::<WorkType>().is_err());
    }

    #[test]
    fn sitting_hours_are_bounded() {
        let mut p = OnboardingProfile::default();
        assert!(p.validate().is_ok());
        p.sitting_hours = 13.0;
        assert!(p.validate().is_err());
    }
}
