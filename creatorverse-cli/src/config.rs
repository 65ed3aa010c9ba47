use clap::Args;
use colored::Colorize;
use creatorverse_lib::{Result, repository::config::CoreConfig};
use tracing::info;

#[derive(Args, Debug, Clone, Default)]
pub struct ConfigArgs {
    /// Base URL of the hosted project
    #[arg(long)]
    supabase_url: Option<String>,
    /// Public API key sent with every request
    #[arg(long)]
    anon_key: Option<String>,
}

/// Print the stored connection settings, or update them when any flag is given.
pub fn run(args: &ConfigArgs) -> Result<()> {
    let path = CoreConfig::path()?;
    let mut cfg = CoreConfig::load_from(&path)?;

    if !apply(&mut cfg, args) {
        println!("{} {}", "Config file:".bold(), path.display());
        println!("{} {}", "Supabase URL:".bold(), show(cfg.supabase_url.as_deref()));
        println!("{} {}", "Anon key:".bold(), show(cfg.anon_key.as_deref().map(|_| "(set)")));
        return Ok(());
    }

    cfg.save()?;
    info!("Saved configuration to {}", path.display());
    println!("{}", "Configuration saved".green());

    Ok(())
}

/// Copy the given flags into `cfg`. Returns whether anything was given.
fn apply(cfg: &mut CoreConfig, args: &ConfigArgs) -> bool {
    if let Some(url) = &args.supabase_url {
        cfg.supabase_url = Some(url.trim().to_string());
    }
    if let Some(key) = &args.anon_key {
        cfg.anon_key = Some(key.trim().to_string());
    }

    args.supabase_url.is_some() || args.anon_key.is_some()
}

fn show(value: Option<&str>) -> String {
    value.map_or_else(|| "not set".dimmed().to_string(), str::to_string)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_no_flags_leaves_config_alone() {
        let mut cfg = CoreConfig::default();

        assert!(!apply(&mut cfg, &ConfigArgs::default()));
        assert_eq!(cfg, CoreConfig::default());
    }

    #[test]
    fn test_flags_are_applied() {
        let mut cfg = CoreConfig {
            anon_key: Some("old".into()),
            ..Default::default()
        };
        let args = ConfigArgs {
            supabase_url: Some(" https://abcd.supabase.co ".into()),
            anon_key: None,
        };

        assert!(apply(&mut cfg, &args));
        assert_eq!(cfg.supabase_url.as_deref(), Some("https://abcd.supabase.co"));
        assert_eq!(cfg.anon_key.as_deref(), Some("old"));
    }
}
