//! The `config` module loads client settings.
//!
//! Sources, lowest precedence first: built-in defaults, `config/default.*`
//! (optional), then `FEEDSYNC__SECTION__KEY` environment variables. A `.env`
//! file in the working directory is loaded into the environment first.

mod settings;

use config::{Config, ConfigError, Environment, File};

pub use settings::{
    DispatchSettings, FeedSettings, LoggingSettings, PartialSettings, ServerSettings, Settings,
};

/// Loads the configuration from the default file and environment variables
/// and merges it with default values.
pub fn load_config() -> Result<Settings, ConfigError> {
    let _ = dotenvy::dotenv();

    let builder = Config::builder()
        .add_source(File::with_name("config/default").required(false))
        .add_source(
            Environment::with_prefix("FEEDSYNC")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

    let config = builder.build()?;
    let partial: PartialSettings = config.try_deserialize()?;

    Ok(Settings::merge(partial))
}
