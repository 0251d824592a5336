use clap::Subcommand;
use focusguard_core::Settings;

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Print every setting as JSON
    Show,
    /// Print one setting by wire-name key (e.g. focusMinutes)
    Get { key: String },
    /// Set one setting; numeric values are clamped, site lists normalized
    Set { key: String, value: String },
}

pub fn run(action: ConfigAction) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        ConfigAction::Show => {
            let settings = Settings::load_or_default();
            println!("{}", serde_json::to_string_pretty(&settings)?);
        }
        ConfigAction::Get { key } => {
            let settings = Settings::load_or_default();
            match settings.get(&key) {
                Some(value) => println!("{value}"),
                None => return Err(format!("unknown settings key: {key}").into()),
            }
        }
        ConfigAction::Set { key, value } => {
            let mut settings = Settings::load()?;
            settings.set(&key, &value)?;
            settings.save()?;
            println!(
                "{}",
                settings.get(&key).unwrap_or_else(|| "null".to_string())
            );
        }
    }
    Ok(())
}
