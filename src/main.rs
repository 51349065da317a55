use std::path::Path;
use std::sync::Arc;

use dream_flow::biorhythm::BiorhythmWizard;
use dream_flow::capabilities::StaticPermission;
use dream_flow::cli::{DemoStoreFront, Terminal};
use dream_flow::config::FlowConfig;
use dream_flow::flow::{FlowDeps, FlowOutcome};
use dream_flow::onboarding::{OnboardingProfile, OnboardingWizard, needs_onboarding};
use dream_flow::paywall::{Paywall, PurchaseOutcome};
use dream_flow::store::{KeyValueStore, LibSqlStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let config = FlowConfig::from_env();
    config.validate()?;

    eprintln!("🌙 Dream Flow v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Database: {}", config.db_path);
    eprintln!("   Enter answers, a blank line to continue, /back or /quit.\n");

    let store: Arc<dyn KeyValueStore> = Arc::new(
        LibSqlStore::new_local(Path::new(&config.db_path))
            .await
            .unwrap_or_else(|e| {
                eprintln!("Error: Failed to open database at {}: {}", config.db_path, e);
                std::process::exit(1);
            }),
    );

    let mut terminal = Terminal::new();

    // ── Onboarding + paywall ────────────────────────────────────────────
    let profile = if needs_onboarding(store.as_ref()).await {
        let deps = FlowDeps::new(store.clone()).with_permission(Arc::new(StaticPermission(true)));
        let controller = OnboardingWizard::controller(&config, deps)?;
        let outcome = terminal.run_flow(&controller).await?;
        controller.flush().await;
        let Some(outcome) = outcome else {
            return Ok(());
        };
        let profile = outcome.profile().cloned().unwrap_or_default();
        show_paywall(&mut terminal, &config, store.clone(), &profile).await?;
        profile
    } else {
        OnboardingProfile::load(store.as_ref())
            .await?
            .unwrap_or_default()
    };

    println!("\nHi, {}.", profile.name);

    // ── Biorhythm ───────────────────────────────────────────────────────
    let controller = BiorhythmWizard::controller(&config, FlowDeps::new(store.clone()))?;
    if BiorhythmWizard::prefill_from(&controller, store.as_ref()).await? {
        eprintln!("   (birth date remembered from last time)");
    }

    let outcome = terminal.run_flow(&controller).await?;
    controller.flush().await;
    if let Some(FlowOutcome::Scored(result)) = outcome {
        println!("\nYour biorhythm: {}/9", result.score);
        println!("\n{}", result.narrative_meaning);
        println!("\nToday: {}", result.daily_impact);
        println!("\nTry this: {}\n", result.recommendations);
    }

    controller.dispose();
    Ok(())
}

async fn show_paywall(
    terminal: &mut Terminal,
    config: &FlowConfig,
    store: Arc<dyn KeyValueStore>,
    profile: &OnboardingProfile,
) -> anyhow::Result<()> {
    let paywall = Paywall::new(
        Arc::new(DemoStoreFront::new(&config.paywall_products)),
        store,
    );

    let offer = match paywall.load_offer(&config.paywall_products).await {
        Ok(offer) if !offer.is_empty() => offer,
        Ok(_) => return Ok(()),
        Err(e) => {
            eprintln!("   {}", e.user_message());
            return Ok(());
        }
    };

    println!("\n{}, unlock your full dream journal:", profile.name);
    for (i, product) in offer.iter().enumerate() {
        println!("    {}. {} ({} / {})", i + 1, product.title, product.price_label, product.period);
    }

    loop {
        let Some(line) = terminal.ask("plan number, blank to skip").await? else {
            return Ok(());
        };
        let line = line.trim();
        if line.is_empty() {
            return Ok(());
        }
        let Some(product) = line
            .parse::<usize>()
            .ok()
            .and_then(|n| n.checked_sub(1))
            .and_then(|i| offer.get(i))
        else {
            eprintln!("   Pick a number from 1 to {}", offer.len());
            continue;
        };

        match paywall.buy(&product.id).await {
            Ok(PurchaseOutcome::Purchased) => {
                println!("   Thanks! Premium is active.");
                return Ok(());
            }
            Ok(PurchaseOutcome::Declined) => return Ok(()),
            Err(e) => {
                eprintln!("   {}", e.user_message());
                if !e.is_retryable() {
                    return Ok(());
                }
            }
        }
    }
}

