use clap::Subcommand;
use focuscall_core::Config;

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Get a config value
    Get {
        /// Config key (e.g. "audio.music_volume", "session.total_rounds")
        key: String,
    },
    /// Set a config value
    Set {
        /// Config key
        key: String,
        /// New value ("" clears an asset path)
        value: String,
    },
    /// List all config values
    List {
        /// One `key = value` line per setting instead of JSON
        #[arg(long)]
        flat: bool,
    },
    /// Reset config to defaults
    Reset,
}

pub fn run(action: ConfigAction) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        ConfigAction::Get { key } => {
            let config = Config::load()?;
            match config.get(&key) {
                Some(value) => println!("{value}"),
                None => {
                    eprintln!("unknown key: {key}");
                    std::process::exit(1);
                }
            }
        }
        ConfigAction::Set { key, value } => {
            let mut config = Config::load()?;
            config.set(&key, &value)?;
            // Refuse to persist values the session would reject later.
            config.session_config()?;
            config.background_settings()?;
            config.save()?;
            println!("ok");
        }
        ConfigAction::List { flat } => {
            let config = Config::load()?;
            if flat {
                for (key, value) in config.list() {
                    println!("{key} = {value}");
                }
            } else {
                println!("{}", serde_json::to_string_pretty(&config)?);
            }
        }
        ConfigAction::Reset => {
            let config = Config::default();
            config.save()?;
            println!("config reset to defaults");
        }
    }
    Ok(())
}
