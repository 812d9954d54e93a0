use clap::Subcommand;

use crate::session;

#[derive(Subcommand)]
pub enum PrefsAction {
    /// Print current preferences as JSON
    Show,
    /// Change one preference
    Set {
        /// work_minutes, rest_minutes, sound_enabled, vibration_enabled,
        /// music_enabled, music_volume or dark_mode
        field: String,
        /// New value (dark_mode: system, on or off)
        value: String,
    },
    /// Restore defaults (music volume is kept)
    Reset,
}

pub fn run(action: PrefsAction) -> Result<(), Box<dyn std::error::Error>> {
    let mut settings = session::open_settings()?;
    let mut prefs = settings.load();

    match action {
        PrefsAction::Show => {}
        PrefsAction::Set { field, value } => {
            prefs.set_field(&field, &value)?;
            settings.save(&prefs)?;
        }
        PrefsAction::Reset => {
            prefs.reset_to_defaults();
            settings.save(&prefs)?;
        }
    }
    println!("{}", serde_json::to_string_pretty(&prefs)?);
    Ok(())
}
