use clap::Args;
use lazycat_core::onboarding::{
    self, FitnessHabit, OnboardingProfile, RestFrequency, WorkType, DEFAULT_SITTING_HOURS,
};
use serde_json::json;

use crate::session;

#[derive(Args)]
pub struct OnboardArgs {
    /// business_sales, software_development, creative_design, physical_labor,
    /// or any other text for a custom answer
    #[arg(long, default_value = "business_sales")]
    work_type: WorkType,
    /// Hours spent sitting per day (2-12)
    #[arg(long, default_value_t = DEFAULT_SITTING_HOURS)]
    sitting_hours: f64,
    /// irregular, about_hourly, about_two_hours, half_day or rarely
    #[arg(long, default_value = "irregular")]
    rest_frequency: RestFrequency,
    /// daily, few_times_weekly, occasionally or rarely
    #[arg(long, default_value = "daily")]
    fitness_habit: FitnessHabit,
    /// Save the recommendation and finish onboarding
    #[arg(long)]
    accept: bool,
}

pub fn run(args: OnboardArgs) -> Result<(), Box<dyn std::error::Error>> {
    let profile = OnboardingProfile {
        work_type: args.work_type,
        sitting_hours: args.sitting_hours,
        rest_frequency: args.rest_frequency,
        fitness_habit: args.fitness_habit,
    };
    profile.validate()?;
    let recommendation = onboarding::recommend(&profile);

    if args.accept {
        let mut settings = session::open_settings()?;
        let mut prefs = settings.load();
        prefs.work_minutes = recommendation.work_minutes;
        prefs.rest_minutes = recommendation.rest_minutes;
        settings.complete_onboarding(&prefs, Some(&profile))?;
        tracing::info!(
            work_minutes = prefs.work_minutes,
            rest_minutes = prefs.rest_minutes,
            "onboarding saved"
        );
    }

    let output = json!({
        "profile": profile,
        "recommendation": recommendation,
        "accepted": args.accept,
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
