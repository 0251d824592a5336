use clap::Subcommand;
use focusguard_core::storage::normalize_host;
use focusguard_core::{Command, SettingsPatch};

#[derive(Subcommand)]
pub enum SitesAction {
    /// Print the blocked-site list
    List,
    /// Add a hostname (scheme and www. prefix are stripped)
    Add { host: String },
    /// Remove a hostname
    Remove { host: String },
}

pub fn run(action: SitesAction) -> Result<(), Box<dyn std::error::Error>> {
    let mut service = super::open_service()?;

    let sites = match action {
        SitesAction::List => service.settings().blocked_sites.clone(),
        SitesAction::Add { host } => {
            let Some(host) = normalize_host(&host) else {
                return Err(format!("not a usable hostname: {host}").into());
            };
            let mut sites = service.settings().blocked_sites.clone();
            if !sites.contains(&host) {
                sites.push(host);
            }
            update_sites(&mut service, sites)
        }
        SitesAction::Remove { host } => {
            let Some(host) = normalize_host(&host) else {
                return Err(format!("not a usable hostname: {host}").into());
            };
            let mut sites = service.settings().blocked_sites.clone();
            sites.retain(|s| *s != host);
            update_sites(&mut service, sites)
        }
    };

    println!("{}", serde_json::to_string_pretty(&sites)?);
    Ok(())
}

fn update_sites(
    service: &mut focusguard_core::TimerService,
    sites: Vec<String>,
) -> Vec<String> {
    service.dispatch(Command::UpdateSettings {
        settings: SettingsPatch {
            blocked_sites: Some(sites),
            ..Default::default()
        },
    });
    service.settings().blocked_sites.clone()
}
