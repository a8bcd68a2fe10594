//! Runs one CLI command against the popup and settings controllers.
//!
//! Page commands load the page into an in-process tab so the page session,
//! the popup and storage behave as they would in a browser.

use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;

use chrono::Utc;
use pagemagic_ai::CssService;
use pagemagic_common::{PageMagicError, ScopeKey, ScopeKind};
use pagemagic_page::{HtmlDocument, PageChannel, TabRegistry};
use pagemagic_storage::{format_size, Storage};
use tracing::debug;

use crate::cli::{ClearTarget, Command, PageArgs, ScopeArg, SettingsCommand, SitesCommand};
use crate::popup::{PopupController, Status, TabInfo};
use crate::settings::{format_cost, ModelLine, SettingsController};

const EMPTY_PAGE: &str = "<html><head></head><body></body></html>";

pub struct App {
    storage: Storage,
    service: Arc<CssService>,
}

/// A page loaded in its own tab with a popup opened on it.
struct OpenPage {
    registry: Arc<TabRegistry<HtmlDocument>>,
    tab: u32,
    popup: PopupController,
}

impl App {
    pub fn new(storage: Storage, service: Arc<CssService>) -> Self {
        Self { storage, service }
    }

    pub async fn run(&self, command: Command) -> Result<ExitCode, PageMagicError> {
        match command {
            Command::Apply { page, out, prompt } => {
                let mut open = self.open(&page).await?;
                let status = open.popup.submit_prompt(&prompt.join(" ")).await;
                if !status.is_error() {
                    if let Some(out) = out {
                        write_page(&open, &out).await?;
                    }
                }
                Ok(report(&status))
            }
            Command::Render { page, out } => {
                let open = self.open(&page).await?;
                match out {
                    Some(out) => write_page(&open, &out).await?,
                    None => println!("{}", open.registry.page_html(open.tab).await?),
                }
                Ok(ExitCode::SUCCESS)
            }
            Command::History { page } => {
                let open = self.open(&page).await?;
                self.print_history(&open).await?;
                Ok(ExitCode::SUCCESS)
            }
            Command::Toggle { page, id } => {
                let mut open = self.open(&page).await?;
                Ok(report(&open.popup.toggle_entry(&id).await))
            }
            Command::Edit { page, id } => {
                let mut open = self.open(&page).await?;
                let status = open.popup.edit_entry(&id).await;
                let code = report(&status);
                if let Some(draft) = open.popup.take_prompt_draft() {
                    println!("{draft}");
                }
                Ok(code)
            }
            Command::Remove { page, id } => {
                let mut open = self.open(&page).await?;
                Ok(report(&open.popup.remove_entry(&id).await))
            }
            Command::ToggleAll { page } => {
                let mut open = self.open(&page).await?;
                Ok(report(&open.popup.toggle_all().await))
            }
            Command::RemoveAll { page } => {
                let mut open = self.open(&page).await?;
                Ok(report(&open.popup.remove_all().await))
            }
            Command::Scope { page, scope } => {
                let mut open = self.open(&page).await?;
                let status = open.popup.set_domain_wide(scope == ScopeArg::Domain).await;
                Ok(report(&status))
            }
            Command::Settings { action } => self.settings(action).await,
            Command::Usage { date } => {
                let date = date.unwrap_or_else(|| Utc::now().date_naive());
                let usage = self.controller().usage_report(date).await?;

                println!(
                    "{date}: {} ({} requests)",
                    format_cost(usage.daily.total_cost),
                    usage.daily.requests
                );
                print_lines(&usage.daily_lines());
                println!(
                    "total: {} ({} requests)",
                    format_cost(usage.total.total_cost),
                    usage.total.total_requests
                );
                print_lines(&usage.total_lines());
                Ok(ExitCode::SUCCESS)
            }
            Command::Stats => {
                let stats = self.controller().storage_stats().await?;
                println!("CSS entries:     {}", stats.css_keys);
                println!("History entries: {}", stats.history_keys);
                println!("Domains:         {}", stats.domains);
                println!("Storage used:    {}", format_size(stats.total_bytes));
                Ok(ExitCode::SUCCESS)
            }
            Command::Sites { action } => self.sites(action).await,
            Command::Clear { target } => {
                let controller = self.controller();
                let status = match target {
                    ClearTarget::Css => controller.clear_css_data().await,
                    ClearTarget::Usage => controller.clear_usage_data().await,
                    ClearTarget::All => controller.factory_reset().await,
                };
                Ok(report(&status))
            }
        }
    }

    async fn settings(&self, action: SettingsCommand) -> Result<ExitCode, PageMagicError> {
        let controller = self.controller();
        match action {
            SettingsCommand::Show => {
                let settings = controller.load_settings().await?;
                println!(
                    "API key: {}",
                    settings.masked_api_key().unwrap_or_else(|| "(not set)".into())
                );
                println!(
                    "Model:   {}",
                    settings.selected_model.as_deref().unwrap_or("(not set)")
                );
                Ok(ExitCode::SUCCESS)
            }
            SettingsCommand::SetKey { key } => Ok(report(&controller.set_api_key(&key).await)),
            SettingsCommand::SetModel { model } => Ok(report(&controller.set_model(&model).await)),
            SettingsCommand::Models => {
                let choice = controller.load_models().await?;
                if choice.models.is_empty() {
                    return Ok(report(&Status::error(
                        "No (free) models found. Check the API key or network.",
                    )));
                }
                for model in &choice.models {
                    let marker = if choice.selected.as_deref() == Some(model.id.as_str()) {
                        '*'
                    } else {
                        ' '
                    };
                    println!("{marker} {}  {}", model.id, model.display_name);
                }
                Ok(ExitCode::SUCCESS)
            }
            SettingsCommand::Test { key, model } => {
                let saved = controller.load_settings().await?;
                let key = key.or(saved.api_key).unwrap_or_default();
                let model = model.or(saved.selected_model).unwrap_or_default();
                Ok(report(&controller.test_connection(&key, &model).await))
            }
        }
    }

    async fn sites(&self, action: SitesCommand) -> Result<ExitCode, PageMagicError> {
        let controller = self.controller();
        match action {
            SitesCommand::List => {
                let sites = controller.sites().await?;
                if sites.is_empty() {
                    println!("No customized sites.");
                }
                for site in sites {
                    println!(
                        "{:<8} {:<14} {:>3} changes  {}",
                        if site.enabled { "enabled" } else { "disabled" },
                        site.scope.kind().label(),
                        site.entries,
                        site.scope.display_url()
                    );
                }
                Ok(ExitCode::SUCCESS)
            }
            SitesCommand::Toggle { url, domain } => {
                let scope = ScopeKey::parse_url(&url, ScopeKind::from_domain_wide(domain))?;
                Ok(report(&controller.toggle_site(&scope).await))
            }
            SitesCommand::Delete { url, domain } => {
                let scope = ScopeKey::parse_url(&url, ScopeKind::from_domain_wide(domain))?;
                Ok(report(&controller.delete_site(&scope).await))
            }
        }
    }

    fn controller(&self) -> SettingsController {
        SettingsController::new(self.storage.clone(), self.service.clone())
    }

    async fn open(&self, page: &PageArgs) -> Result<OpenPage, PageMagicError> {
        let html = match &page.html {
            Some(path) => read_page(path).await?,
            None => EMPTY_PAGE.to_string(),
        };

        let registry = Arc::new(TabRegistry::new(self.storage.clone()));
        let tab = registry.open(&page.url, HtmlDocument::new(html)).await?;
        let url = registry.tab_url(tab).await?;

        let mut popup = PopupController::new(
            self.storage.clone(),
            self.service.clone(),
            registry.clone(),
        );
        popup.load_state(TabInfo { id: tab, url }).await?;
        debug!(tab, url = %page.url, "page opened");

        Ok(OpenPage {
            registry,
            tab,
            popup,
        })
    }

    async fn print_history(&self, open: &OpenPage) -> Result<(), PageMagicError> {
        let entries = open.popup.history().await?;
        let scope = ScopeKind::from_domain_wide(open.popup.session().domain_wide);
        println!("Scope: {}", scope.label());
        if entries.is_empty() {
            println!("No changes yet.");
        }
        for (n, entry) in entries.iter().enumerate() {
            let state = if entry.disabled { "off" } else { "on " };
            println!("{:>2}. [{state}] {}  {}", n + 1, entry.id, entry.prompt);
        }
        Ok(())
    }
}

async fn read_page(path: &Path) -> Result<String, PageMagicError> {
    Ok(tokio::fs::read_to_string(path).await?)
}

async fn write_page(open: &OpenPage, out: &Path) -> Result<(), PageMagicError> {
    let html = open.registry.page_html(open.tab).await?;
    tokio::fs::write(out, html).await?;
    println!("Wrote {}", out.display());
    Ok(())
}

fn print_lines(lines: &[ModelLine]) {
    for line in lines {
        println!("  {}", line.render());
    }
}

/// Print a final status; errors make the exit code non-zero.
fn report(status: &Status) -> ExitCode {
    if status.is_error() {
        eprintln!("{status}");
        ExitCode::FAILURE
    } else {
        println!("{status}");
        ExitCode::SUCCESS
    }
}
