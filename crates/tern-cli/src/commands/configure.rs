use anyhow::Result;
use console::style;
use tern::providers::configs::ProviderConfig;
use tern::settings::{ProviderEntry, Settings, Theme};
use tern::store::SettingsStore;

pub async fn handle_configure() -> Result<()> {
    cliclack::intro(style(" configure-tern ").on_cyan().black())?;

    let store = SettingsStore::new()?;
    let mut settings = match store.load() {
        Ok(settings) => settings,
        Err(err) => {
            let _ = cliclack::log::warning(format!(
                "Could not read saved settings ({}), starting from the defaults",
                err
            ));
            Settings::default()
        }
    };

    let current = settings.active_provider().map(|entry| entry.id.clone());
    let provider_id = cliclack::select("Which provider should we chat with?")
        .initial_value(current.as_deref().unwrap_or("openai"))
        .items(&[
            ("openai", "OpenAI", "GPT-4o etc"),
            ("anthropic", "Anthropic", "Claude models"),
            ("ollama", "Ollama", "Local open source models"),
        ])
        .interact()?;

    // Start from the saved entry when there is one so a re-run keeps
    // whatever the user does not retype.
    let mut config = settings
        .provider(provider_id)
        .map(|entry| entry.config.clone())
        .unwrap_or_else(|| stock_config(provider_id));

    if matches!(
        config,
        ProviderConfig::OpenAi { .. } | ProviderConfig::Anthropic { .. }
    ) {
        let has_key = config.api_key().is_some();
        let prompt = if has_key {
            "Enter a new API key (leave blank to keep the saved one):"
        } else {
            "Enter the API key for this provider:"
        };
        let key: String = cliclack::password(prompt).mask('▪').interact()?;
        let key = key.trim();

        if !key.is_empty() {
            match &mut config {
                ProviderConfig::OpenAi { api_key, .. }
                | ProviderConfig::Anthropic { api_key, .. } => *api_key = Some(key.to_string()),
                ProviderConfig::Ollama { .. } => {}
            }
        } else if has_key {
            let _ = cliclack::log::info("Keeping the saved API key");
        }
    }

    let model: String = cliclack::input("Enter a model from that provider:")
        .default_input(config.model())
        .interact()?;
    match &mut config {
        ProviderConfig::OpenAi { model: m, .. }
        | ProviderConfig::Anthropic { model: m, .. }
        | ProviderConfig::Ollama { model: m, .. } => *m = model,
    }

    let theme = cliclack::select("Pick a theme:")
        .initial_value(match settings.theme {
            Theme::Light => "light",
            Theme::Dark => "dark",
        })
        .items(&[("dark", "Dark", ""), ("light", "Light", "")])
        .interact()?;
    settings.theme = if theme == "light" {
        Theme::Light
    } else {
        Theme::Dark
    };

    settings.add_provider(ProviderEntry {
        id: provider_id.to_string(),
        name: display_name(provider_id).to_string(),
        config,
        active: true,
    });

    settings.validate()?;
    store.save(&settings)?;
    cliclack::outro(format!("Settings saved to: {}", store.path().display()))?;

    Ok(())
}

fn stock_config(provider_id: &str) -> ProviderConfig {
    match provider_id {
        "anthropic" => ProviderConfig::anthropic(),
        "ollama" => ProviderConfig::ollama(),
        _ => ProviderConfig::openai(),
    }
}

fn display_name(provider_id: &str) -> &'static str {
    match provider_id {
        "anthropic" => "Anthropic",
        "ollama" => "Ollama",
        _ => "OpenAI",
    }
}
