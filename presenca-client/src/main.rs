//! presenca-client - attendance check-in client
//!
//! Command-line front end for the Presença backend: login, registration,
//! QR code scanning and manual check-in, certificates, and admin reports.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use presenca_client::build_info;
use presenca_client::client::{AttendanceClient, BackendClient, SessionToken, TokenStore};
use presenca_client::scan::{
    ChannelCamera, CheckInEngine, IntervalScheduler, KeyboardWedgeCamera, Outcome,
    PassthroughDecoder, Resolution, ScanSession, TickOutcome,
};
use presenca_client::services::certificate::INCOMPLETE_MESSAGE;
use presenca_client::services::report::CHART_WIDTH;
use presenca_client::services::{
    render_chart, AccountService, CertificateOutcome, CertificateService, Registration,
    ReportService,
};
use presenca_client::{ClientConfig, ConfigOverrides};
use presenca_common::api::ExportFormat;
use presenca_common::config::{resolve_config_path, write_toml_config, TomlConfig};
use presenca_common::time::SystemClock;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "presenca-client")]
#[command(about = "Attendance check-in client for the Presença backend")]
#[command(version)]
struct Args {
    /// Configuration file (default: <config dir>/presenca/presenca.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Backend base URL, e.g. https://host:3000
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// Folder holding the session token
    #[arg(long, global = true)]
    root_folder: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Log in with a CPF and store the session token
    Login { cpf: String },

    /// Delete the stored session token
    Logout,

    /// Create an account
    Register {
        #[arg(long)]
        nome: String,
        #[arg(long)]
        cpf: String,
        #[arg(long)]
        area: String,
        #[arg(long)]
        congregacao: String,
        #[arg(long)]
        email: String,
    },

    /// Show the logged-in user's profile
    Profile,

    /// Show a user by id
    User { id: String },

    /// Save the logged-in user's QR code as PNG
    Qrcode {
        #[arg(long, default_value = "qrcode.png")]
        out: PathBuf,
    },

    /// Scan codes from a keyboard-wedge scanner on stdin
    Scan {
        /// Stop after the first resolved code
        #[arg(long)]
        once: bool,
    },

    /// Register attendance for a typed code
    CheckIn { code: String },

    /// Save the attendance certificate as PNG
    Certificate {
        #[arg(long, default_value = "certificado.png")]
        out: PathBuf,
    },

    /// Grant admin rights to a user (admin)
    Promote { cpf: String },

    /// Show the attendance report (admin)
    Report,

    /// Download the user list (admin)
    Export {
        /// pdf or xlsx
        format: ExportFormat,
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Write a configuration file with default values
    InitConfig {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

fn startup_subscriber() -> impl tracing::Subscriber + Send + Sync {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .finish()
}

fn init_tracing(config: &ClientConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match &config.logging.file {
        Some(path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Cannot open log file {}", path.display()))?;
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(false)
                .with_writer(std::sync::Mutex::new(file))
                .init();
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let overrides = ConfigOverrides {
        config_path: args.config.clone(),
        base_url: args.base_url.clone(),
        root_folder: args.root_folder.clone(),
    };
    // Config loading logs (missing file, root folder source) go to stderr
    // until the configured subscriber is installed
    let config = tracing::subscriber::with_default(startup_subscriber(), || {
        ClientConfig::load(&overrides)
    })
    .context("Invalid configuration")?;

    init_tracing(&config)?;

    info!("Starting {}", build_info::identity());
    debug!(
        config = ?config.config_path,
        base_url = %config.base_url,
        root_folder = %config.root_folder.display(),
        "Configuration resolved"
    );

    let backend = BackendClient::new(&config.base_url, config.request_timeout)?;
    let tokens = TokenStore::new(config.root_folder());
    let accounts = AccountService::new(backend.clone(), tokens.clone());

    match args.command {
        Command::Login { cpf } => {
            let outcome = accounts.login(&cpf).await?;
            match outcome.nome {
                Some(nome) => println!("Login realizado com sucesso. Bem-vindo(a), {}!", nome),
                None => println!("Login realizado com sucesso."),
            }
            if outcome.is_admin {
                println!("Perfil: administrador");
            }
        }

        Command::Logout => {
            if accounts.logout()? {
                println!("Sessão encerrada.");
            } else {
                println!("Nenhuma sessão ativa.");
            }
        }

        Command::Register {
            nome,
            cpf,
            area,
            congregacao,
            email,
        } => {
            let form = Registration {
                nome,
                cpf,
                area,
                congregacao,
                email,
            };
            accounts.register(&form).await?;
            println!("Cadastro realizado com sucesso!");
        }

        Command::Profile => {
            let profile = accounts.profile().await?;
            print_profile(&profile);
        }

        Command::User { id } => {
            let profile = accounts.user(&id).await?;
            print_profile(&profile);
        }

        Command::Qrcode { out } => {
            let profile = accounts.generate_qr_code(&out).await?;
            println!("QR Code de {} salvo em {}", profile.nome, out.display());
        }

        Command::Scan { once } => {
            let engine = build_engine(&config, &backend, tokens.load()?);
            run_scan(&config, engine, once).await?;
        }

        Command::CheckIn { code } => {
            let engine = build_engine(&config, &backend, tokens.load()?);
            let resolution = check_in(engine, &code).await?;
            if !resolution.is_success() {
                bail!(resolution.message);
            }
            print_resolution(&resolution);
        }

        Command::Certificate { out } => {
            let token = accounts.token()?;
            match CertificateService::new(backend).generate(&token, &out).await? {
                CertificateOutcome::Incomplete(_) => println!("{}", INCOMPLETE_MESSAGE),
                CertificateOutcome::Saved(path) => {
                    println!("Certificado salvo em {}", path.display())
                }
            }
        }

        Command::Promote { cpf } => {
            let message = accounts.promote(&cpf).await?;
            println!("{}", message);
        }

        Command::Report => {
            let token = accounts.token()?;
            let report = ReportService::new(backend).fetch(&token).await?;
            println!("Relatório de Presença");
            print!("{}", render_chart(&report, CHART_WIDTH));
        }

        Command::Export { format, out } => {
            let token = accounts.token()?;
            let path = ReportService::new(backend)
                .export(&token, format, out.as_deref())
                .await?;
            println!("Arquivo salvo em {}", path.display());
        }

        Command::InitConfig { force } => init_config(&overrides, force)?,
    }

    Ok(())
}

fn build_engine(
    config: &ClientConfig,
    backend: &BackendClient,
    token: Option<SessionToken>,
) -> CheckInEngine {
    let client = AttendanceClient::new(Arc::new(backend.clone()), config.retry);
    CheckInEngine::new(client, Arc::new(SystemClock), config.windows, token)
}

/// Interactive scanning: one resolution per scanned line, then wait for the
/// operator to scan again (Enter) or quit (`q` or end of input)
async fn run_scan(config: &ClientConfig, engine: CheckInEngine, once: bool) -> Result<()> {
    let mut session = ScanSession::new(
        KeyboardWedgeCamera::stdin(),
        Box::new(PassthroughDecoder),
        Box::new(IntervalScheduler::new(config.tick_interval)),
        engine,
    );

    if let Err(e) = session.start().await {
        bail!(
            "{} ({})",
            session.last_status_message().unwrap_or_default(),
            e
        );
    }
    println!("Aponte o leitor para o QR Code...");

    loop {
        match session.run().await {
            TickOutcome::Resolved(resolution) => {
                print_resolution(&resolution);
                if once {
                    break;
                }

                println!("Pressione Enter para escanear novamente ou 'q' para sair.");
                match session.camera_mut().read_control_line().await? {
                    Some(line) if !line.trim().eq_ignore_ascii_case("q") => {
                        session.rearm();
                        println!("Aponte o leitor para o QR Code...");
                    }
                    _ => break,
                }
            }
            TickOutcome::CameraEnded | TickOutcome::Stopped | TickOutcome::Inactive => break,
            TickOutcome::Idle => {}
        }
    }

    session.close();
    Ok(())
}

/// Manual entry through a session whose camera never delivers frames
async fn check_in(engine: CheckInEngine, code: &str) -> Result<Resolution> {
    let (mut handle, camera) = ChannelCamera::channel(1);
    handle.grant();

    let mut session = ScanSession::new(
        camera,
        Box::new(PassthroughDecoder),
        Box::new(IntervalScheduler::new(std::time::Duration::from_millis(1))),
        engine,
    );
    session.start().await?;

    let outcome = session.submit_manual(code).await;
    session.close();

    match outcome {
        TickOutcome::Resolved(resolution) => Ok(resolution),
        TickOutcome::Idle => bail!("Nenhum código informado."),
        other => bail!("Check-in did not resolve: {:?}", other),
    }
}

fn init_config(overrides: &ConfigOverrides, force: bool) -> Result<()> {
    let path = resolve_config_path(overrides.config_path.as_deref())
        .context("No configuration directory available; pass --config")?;

    if path.exists() && !force {
        bail!(
            "{} already exists (use --force to overwrite)",
            path.display()
        );
    }

    write_toml_config(&TomlConfig::default(), &path)?;
    println!("Configuração padrão gravada em {}", path.display());
    Ok(())
}

fn print_profile(profile: &presenca_common::api::UserProfile) {
    println!("Nome:  {}", profile.nome);
    match presenca_common::cpf::validate(&profile.cpf) {
        Ok(cpf) => println!("CPF:   {}", cpf.formatted()),
        Err(_) => println!("CPF:   {}", profile.cpf),
    }
    println!("Email: {}", profile.email.as_deref().unwrap_or("-"));
}

fn print_resolution(resolution: &Resolution) {
    let marker = match resolution.outcome {
        Outcome::Success => "✓",
        Outcome::Warning => "!",
        Outcome::Error => "✗",
    };
    println!("{} {}", marker, resolution.message);
}
