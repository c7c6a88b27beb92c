//! keepin shell binary entry point.
//!
//! The composition root: builds the stores, gateways, and session controller,
//! and drives them from the command line the way the mobile shells drive them
//! from their UI layers.

mod router;

use anyhow::Context;
use app_config::{init_logging, Config, Paths};
use clap::{Parser, Subcommand, ValueEnum};
use consent_store::ConsentLedger;
use credential_store::{FileStorage, ProviderKind, TokenStore};
use router::PhaseRouter;
use session_engine::{
    AppleGateway, ApplicationPhase, BackendSessionGateway, HttpBackendGateway,
    IdentityProviderGateway, KakaoGateway, LoginOrchestrator, SessionController,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

/// keepin: session shell for the client core.
#[derive(Parser, Debug)]
#[command(name = "keepin")]
#[command(about = "Session and sign-in shell for the keepin client core")]
struct Args {
    /// Base directory for runtime files. Defaults to ~/.keepin.
    #[arg(long, env = "KEEPIN_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Reconcile stored tokens and report the resulting phase
    Status,
    /// Sign in with a provider (drives the browser sign-in flow)
    Login {
        #[arg(value_enum)]
        provider: ProviderArg,
    },
    /// Clear the stored session
    Logout,
    /// Fetch the signed-in account's profile from the backend
    Profile,
    /// Apply a UI-originated phase event after reconciliation
    Advance {
        #[arg(value_enum)]
        event: AdvanceEvent,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum ProviderArg {
    Kakao,
    Apple,
}

impl From<ProviderArg> for ProviderKind {
    fn from(arg: ProviderArg) -> Self {
        match arg {
            ProviderArg::Kakao => ProviderKind::Kakao,
            ProviderArg::Apple => ProviderKind::Apple,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum AdvanceEvent {
    /// Terms agreed on the consent sheet
    Consent,
    /// Contact import finished
    ImportDone,
    /// Contact import skipped
    ImportSkip,
    /// Contact frequency setup finished
    FrequencyDone,
    /// Back from frequency setup to contact import
    FrequencyBack,
}

/// Everything the shell wires together at startup.
struct Shell {
    controller: Arc<SessionController>,
    orchestrator: LoginOrchestrator,
    backend: Arc<HttpBackendGateway>,
}

fn build_shell(paths: &Paths, config: &Config) -> anyhow::Result<Shell> {
    let tokens = Arc::new(TokenStore::new(Box::new(
        FileStorage::open(paths.credentials_file()).context("opening credential store")?,
    )));
    let consent = Arc::new(ConsentLedger::open(paths.consent_file()).context("opening consent ledger")?);

    let kakao: Arc<dyn IdentityProviderGateway> = Arc::new(KakaoGateway::new(
        config.kakao_app_key.clone(),
        config.callback_port,
    ));
    let apple: Arc<dyn IdentityProviderGateway> = Arc::new(AppleGateway::new(
        config.apple_client_id.clone(),
        config.callback_port,
    ));
    let backend = Arc::new(HttpBackendGateway::new(config.backend_base_url.clone()));

    let gateways = vec![kakao, apple];

    let controller = Arc::new(SessionController::new(
        tokens.clone(),
        consent,
        gateways.clone(),
        backend.clone(),
    ));

    let orchestrator =
        LoginOrchestrator::new(controller.clone(), tokens, gateways, backend.clone());

    Ok(Shell {
        controller,
        orchestrator,
        backend,
    })
}

fn report(phase: ApplicationPhase) {
    let screen = PhaseRouter::screen_for(phase);
    println!("phase: {:?}", phase);
    println!("screen: {}", screen.as_str());
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let paths = match args.data_dir {
        Some(dir) => Paths::with_base_dir(dir),
        None => Paths::new().context("resolving data directory")?,
    };
    paths.ensure_dirs()?;

    let config = Config::load(&paths)?;
    let log_level = args.log_level.as_deref().unwrap_or(&config.log_level);
    init_logging(log_level);

    info!(base_dir = %paths.base_dir().display(), "keepin shell starting");

    let shell = build_shell(&paths, &config)?;

    match args.command {
        Command::Status => {
            let phase = shell.controller.bootstrap().await?;
            report(phase);
            if let Some(account) = shell.controller.current_account() {
                println!("account: {} ({})", account.display_name, account.id);
            }
        }
        Command::Login { provider } => {
            let report_result = shell.orchestrator.login(provider.into()).await?;
            println!(
                "signed in as {} ({})",
                report_result.account.display_name, report_result.account.id
            );
            report(report_result.phase);
        }
        Command::Logout => {
            shell.controller.logout()?;
            report(shell.controller.current_phase());
        }
        Command::Profile => {
            let phase = shell.controller.bootstrap().await?;
            let account = shell
                .controller
                .current_account()
                .ok_or_else(|| anyhow::anyhow!("not signed in (phase {:?})", phase))?;
            let profile = shell.backend.fetch_profile(&account.access_token).await?;
            println!("member: {} ({})", profile.nickname, profile.member_id);
            if let Some(image) = profile.profile_image_url {
                println!("image: {}", image);
            }
        }
        Command::Advance { event } => {
            shell.controller.bootstrap().await?;
            let phase = match event {
                AdvanceEvent::Consent => shell.controller.complete_consent()?,
                AdvanceEvent::ImportDone => shell.controller.complete_onboarding_import()?,
                AdvanceEvent::ImportSkip => shell.controller.skip_onboarding_import()?,
                AdvanceEvent::FrequencyDone => shell.controller.complete_onboarding_frequency()?,
                AdvanceEvent::FrequencyBack => shell.controller.onboarding_frequency_back()?,
            };
            report(phase);
        }
    }

    Ok(())
}
