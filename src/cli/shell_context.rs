//! Shared runtime state for CLI interactions and command execution.

use std::{path::PathBuf, sync::Arc, time::Duration};

use dialoguer::{theme::ColorfulTheme, Confirm};
use strsim::levenshtein;
use subtrack_config::{Config, ConfigManager};
use subtrack_core::{
    Clock, DisplaySettings, IconCache, IconProbe, RateCache, RateProvider, SubscriptionStore,
    SystemClock,
};
use subtrack_storage_json::JsonFileStore;
use tracing::debug;

use crate::{
    errors::{AppError, CliError},
    net::{HttpIconProbe, HttpRateProvider},
    utils::paths,
};

use super::{
    commands,
    core::{CommandError, CommandResult, LoopControl},
    io as cli_io,
    output::{self, OutputPreferences},
    registry::{CommandEntry, CommandRegistry},
};

const ICON_PROBE_TIMEOUT_SECS: u64 = 5;
const SUGGESTION_DISTANCE: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CliMode {
    Interactive,
    Script,
}

/// External collaborators, swappable so tests stay offline.
pub struct Services {
    pub clock: Arc<dyn Clock>,
    pub rate_provider: Box<dyn RateProvider>,
    pub icon_probe: Option<Box<dyn IconProbe>>,
}

pub struct ShellContext {
    pub mode: CliMode,
    pub registry: CommandRegistry,
    pub theme: ColorfulTheme,
    pub clock: Arc<dyn Clock>,
    pub storage: Arc<JsonFileStore>,
    pub store: SubscriptionStore,
    pub settings: DisplaySettings,
    pub rates: RateCache,
    pub icons: IconCache,
    pub config_manager: ConfigManager,
    pub config: Config,
    pub base_dir: PathBuf,
}

impl ShellContext {
    /// Builds the production context rooted at [`paths::base_dir`].
    pub fn new(mode: CliMode) -> Result<Self, CliError> {
        let base_dir = paths::base_dir();
        let config_manager = ConfigManager::with_base_dir(base_dir.clone())?;
        let config = config_manager.load()?;
        let timeout = Duration::from_secs(config.request_timeout_secs);
        let rate_provider = HttpRateProvider::new(config.rates_endpoint.clone(), timeout)
            .map_err(AppError::from)?;
        let icon_probe: Option<Box<dyn IconProbe>> = if config.fetch_icons {
            let probe = HttpIconProbe::new(Duration::from_secs(ICON_PROBE_TIMEOUT_SECS))
                .map_err(AppError::from)?;
            Some(Box::new(probe))
        } else {
            None
        };
        let services = Services {
            clock: Arc::new(SystemClock),
            rate_provider: Box::new(rate_provider),
            icon_probe,
        };
        Self::assemble(mode, base_dir, config_manager, config, services)
    }

    /// Builds a context rooted at `base_dir` around the given collaborators.
    pub fn with_services(
        mode: CliMode,
        base_dir: PathBuf,
        services: Services,
    ) -> Result<Self, CliError> {
        let config_manager = ConfigManager::with_base_dir(base_dir.clone())?;
        let config = config_manager.load()?;
        Self::assemble(mode, base_dir, config_manager, config, services)
    }

    fn assemble(
        mode: CliMode,
        base_dir: PathBuf,
        config_manager: ConfigManager,
        config: Config,
        services: Services,
    ) -> Result<Self, CliError> {
        apply_output_config(&config);

        let storage = Arc::new(JsonFileStore::new(config.resolve_data_dir(&base_dir))?);
        let store = SubscriptionStore::load(storage.clone(), services.clock.clone())?;
        let settings = DisplaySettings::load(storage.clone());
        let rates = RateCache::new(
            storage.clone(),
            services.rate_provider,
            services.clock.clone(),
        );
        let icons = IconCache::new(
            storage.clone(),
            services.icon_probe,
            services.clock.clone(),
        );

        let mut registry = CommandRegistry::new();
        commands::register_all(&mut registry);
        debug!(
            data_dir = %storage.root().display(),
            subscriptions = store.len(),
            "shell context ready"
        );

        Ok(Self {
            mode,
            registry,
            theme: ColorfulTheme::default(),
            clock: services.clock,
            storage,
            store,
            settings,
            rates,
            icons,
            config_manager,
            config,
            base_dir,
        })
    }

    pub fn prompt(&self) -> String {
        format!("subtrack ({})> ", self.store.len())
    }

    /// Names and aliases, for tab completion.
    pub fn command_words(&self) -> Vec<&'static str> {
        self.registry.words().collect()
    }

    pub(crate) fn command(&self, word: &str) -> Option<&CommandEntry> {
        self.registry.resolve(word)
    }

    pub(crate) fn can_prompt(&self) -> bool {
        self.mode == CliMode::Interactive
    }

    /// Asks for confirmation in interactive mode; script mode proceeds.
    pub(crate) fn confirm(&self, prompt: &str) -> Result<bool, CommandError> {
        if !self.can_prompt() {
            return Ok(true);
        }
        cli_io::confirm_action(&self.theme, prompt, false)
    }

    pub(crate) fn dispatch(
        &mut self,
        command: &str,
        raw: &str,
        args: &[&str],
    ) -> Result<LoopControl, CommandError> {
        if let Some(handler) = self.registry.resolve(command).map(|entry| entry.handler) {
            match handler(self, args) {
                Ok(()) => Ok(LoopControl::Continue),
                Err(CommandError::ExitRequested) => Ok(LoopControl::Exit),
                Err(err) => Err(err),
            }
        } else {
            self.suggest_command(raw);
            Ok(LoopControl::Continue)
        }
    }

    #[cfg(test)]
    pub(crate) fn process_line(&mut self, line: &str) -> Result<LoopControl, CommandError> {
        crate::cli::shell::run_line(self, line)
    }

    pub(crate) fn suggest_command(&self, input: &str) {
        cli_io::print_warning(format!(
            "Unknown command `{}`. Type `help` to see available commands.",
            input
        ));

        let needle = input.to_lowercase();
        let best = self
            .registry
            .words()
            .map(|word| (levenshtein(word, &needle), word))
            .min_by_key(|(distance, _)| *distance);

        if let Some((distance, name)) = best {
            if distance <= SUGGESTION_DISTANCE {
                cli_io::print_info(format!("Did you mean `{}`?", name));
            }
        }
    }

    pub(crate) fn confirm_exit(&self) -> Result<bool, CliError> {
        if self.mode == CliMode::Script {
            return Ok(true);
        }
        Confirm::with_theme(&self.theme)
            .with_prompt("Exit shell?")
            .default(true)
            .interact()
            .map_err(CliError::from)
    }

    pub(crate) fn report_error(&self, err: CommandError) {
        match err {
            CommandError::ExitRequested => {}
            CommandError::InvalidArguments(message) => {
                cli_io::print_error(message);
                cli_io::print_hint("Use `help <command>` for usage details.");
            }
            other => cli_io::print_error(other),
        }
    }

    pub(crate) fn persist_config(&mut self) -> CommandResult {
        self.config_manager.save(&self.config)?;
        apply_output_config(&self.config);
        Ok(())
    }
}

fn apply_output_config(config: &Config) {
    output::set_preferences(OutputPreferences {
        color_enabled: config.ui_color_enabled,
    });
}
