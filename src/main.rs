//! TechServe - Main entry point
//!
//! Terminal front end for the order wizard and the status tracker.

use anyhow::{Context, Result};
use std::path::Path;
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

use techserve::cli::{Cli, Commands};
use techserve::{
    AppConfig, CatalogSnapshot, HttpOrderService, MemoryBackend, OrderDraft, OrderNumber,
    OrderService, OrderStatusView, OrderSummary, OrderTracker, OrderWizard,
};

/// Initialize tracing with `info` as the default level
fn init_logger() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Main application entry point
fn main() -> Result<()> {
    init_logger();
    info!("TechServe starting up");

    let cli = Cli::parse_args();
    debug!("CLI arguments parsed");

    if let Commands::ValidateConfig { path } = &cli.command {
        validate_config(path);
        return Ok(());
    }

    let config = AppConfig::load_or_default(cli.config.as_deref())?;
    let service = build_service(&config, cli.offline)?;

    match cli.command {
        Commands::Catalog => print_catalog(service.as_ref()),
        Commands::Order { draft } => run_order(service.as_ref(), &config, &draft, cli.dry_run),
        Commands::Track { email, phone } => track_orders(service.as_ref(), &email, &phone),
        Commands::Show { order_number } => show_order(service.as_ref(), &order_number),
        // Handled before the configuration is loaded
        Commands::ValidateConfig { .. } => Ok(()),
    }
}

fn validate_config(path: &Path) {
    info!("Validating configuration file: {:?}", path);
    match AppConfig::load_from_file(path) {
        Ok(config) => match config.validate() {
            Ok(()) => {
                info!("Configuration validation successful");
                println!("✓ Configuration file is valid: {:?}", path);
            }
            Err(e) => {
                error!("Configuration validation failed: {}", e);
                eprintln!("✗ Configuration validation failed: {}", e);
                std::process::exit(1);
            }
        },
        Err(e) => {
            error!("Failed to load configuration file: {}", e);
            eprintln!("✗ Failed to load configuration file: {:#}", e);
            std::process::exit(1);
        }
    }
}

fn build_service(config: &AppConfig, offline: bool) -> Result<Box<dyn OrderService>> {
    if offline {
        info!("Using the seeded in-memory backend");
        return Ok(Box::new(MemoryBackend::seeded(
            config.pricing,
            config.addon_pricing,
        )));
    }

    info!("Using order API at {}", config.api_base_url);
    let service = HttpOrderService::new(config.api_base_url.as_str(), config.request_timeout())
        .context("Failed to create the order API client")?;
    Ok(Box::new(service))
}

fn print_catalog(service: &dyn OrderService) -> Result<()> {
    let catalog = CatalogSnapshot::from_records(
        service
            .load_catalog()
            .context("Failed to load operating systems")?,
    );

    if catalog.is_empty() {
        println!("No operating systems are currently available.");
        return Ok(());
    }

    for os in catalog.systems() {
        println!("[{}] {} ({})", os.id, os.name, os.kind);
        for version in os.selectable_versions() {
            println!("    [{}] {}", version.id, version.name);
        }
    }
    Ok(())
}

fn run_order(
    service: &dyn OrderService,
    config: &AppConfig,
    draft_path: &Path,
    dry_run: bool,
) -> Result<()> {
    let draft = OrderDraft::load_from_file(draft_path)
        .with_context(|| format!("Failed to load order draft {:?}", draft_path))?;
    let mut wizard =
        OrderWizard::load(service, config).context("Failed to load operating systems")?;

    let applied = draft.apply(&mut wizard);
    println!("Selection: {}", wizard.live_preview());
    if let Err(e) = applied {
        anyhow::bail!("Order stopped at step {}: {}", wizard.current_step(), e);
    }

    if let Some(summary) =
        OrderSummary::compute(wizard.catalog(), wizard.selection(), wizard.prices())
    {
        println!();
        print!("{}", summary.render(wizard.currency()));
    }

    if dry_run {
        let ticket = wizard.begin_submission()?;
        info!("[DRY RUN] Order {} not submitted", ticket.request().order_number);
        println!();
        println!("{}", serde_json::to_string_pretty(ticket.request())?);
        return Ok(());
    }

    let created = wizard.submit(service)?;
    if let Some(notice) = wizard.take_notice() {
        println!();
        println!("{}", notice.message);
    }
    debug!("Order stored with id {}", created.order_id);
    Ok(())
}

fn track_orders(service: &dyn OrderService, email: &str, phone: &str) -> Result<()> {
    let mut tracker = OrderTracker::new();
    let views = tracker.track(service, email, phone)?;

    if views.is_empty() {
        println!("No orders found for these details.");
        return Ok(());
    }
    for view in &views {
        print_status(view);
    }
    Ok(())
}

fn show_order(service: &dyn OrderService, order_number: &str) -> Result<()> {
    let order_number = OrderNumber::parse(order_number)?;
    let record = service
        .get_order(&order_number)
        .with_context(|| format!("Failed to look up order {}", order_number))?;

    print_status(&OrderStatusView::from(&record));
    println!("Customer:   {} <{}>", record.customer_name, record.customer_email);
    for addon in &record.addons {
        println!("Add-on:     {} ({})", addon.addon_type.label(), addon.price);
    }
    Ok(())
}

fn print_status(view: &OrderStatusView) {
    println!("{}  [{}]", view.order_number, view.badge);
    println!("Type:       {}", view.type_label);
    println!("OS:         {}", view.os_text);
    println!("Progress:   {}%", view.progress_percent);
    println!("Placed:     {}", view.created_at.format("%Y-%m-%d %H:%M"));
    println!("Updated:    {}", view.updated_at.format("%Y-%m-%d %H:%M"));
    println!();
}
