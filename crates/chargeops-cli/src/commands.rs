//! Subcommand handlers

use crate::output;
use crate::{EntityAction, ListArgs};
use anyhow::{Context as _, Result};
use chargeops_client::{
    ApiClient, Authenticator, ClientError, CredentialProvider, DashboardLoader, FileCredentials,
    MutationDispatcher, Poller, Registration, Screen,
};
use chargeops_core::{ChargerCommand, Config, EntityKind, FieldValue, Record, RecordId, Role};
use chargeops_view::{
    ChargerStats, Direction, FeedbackStats, ListView, Selection, SortSpec, ToastKind,
    TransactionStats, UserStats,
};
use chrono::Utc;
use secrecy::{Secret, SecretString};
use serde_json::json;
use std::io::{BufRead, Write};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Field whose assigned value is never type-inferred
const PASSWORD_FIELD: &str = "password";

/// Shared state for one invocation
pub struct Context {
    pub config: Config,
    api: ApiClient,
    credentials: Arc<FileCredentials>,
    json: bool,
}

impl Context {
    pub fn new(config: Config, json: bool) -> Result<Self> {
        let credentials = Arc::new(
            FileCredentials::open(&config.session.token_file).with_context(|| {
                format!(
                    "Failed to read session file {}",
                    config.session.token_file.display()
                )
            })?,
        );
        let api = ApiClient::new(&config, credentials.clone())?;
        Ok(Self {
            config,
            api,
            credentials,
            json,
        })
    }

    fn open(&self, kind: EntityKind) -> Screen {
        Screen::open(kind, &self.config.view)
    }

    async fn loaded(&self, kind: EntityKind) -> Result<Screen> {
        let mut screen = self.open(kind);
        screen.load(&self.api).await?;
        Ok(screen)
    }

    /// Drop a stored token the server no longer accepts
    pub fn forget_session(&self) {
        match self.credentials.clear() {
            Ok(()) => info!("Cleared rejected session"),
            Err(e) => warn!(error = %e, "Failed to clear session"),
        }
    }
}

pub async fn login(ctx: &Context, email: &str, password: Option<String>) -> Result<()> {
    let password = secret_or_prompt(password)?;
    let session = Authenticator::new(ctx.api.clone())
        .login(email, &password)
        .await?;

    if ctx.json {
        return output::print_json(&json!({
            "user_id": session.user_id,
            "role": session.role,
            "expires_at": session.expires_at,
        }));
    }
    let role = session.role.map_or("unknown", Role::as_str);
    println!("Logged in as user {} ({role})", session.user_id);
    Ok(())
}

pub fn logout(ctx: &Context) -> Result<()> {
    Authenticator::new(ctx.api.clone()).logout()?;
    println!("Logged out");
    Ok(())
}

pub async fn register(
    ctx: &Context,
    name: String,
    email: String,
    password: Option<String>,
    car_type: Option<String>,
) -> Result<()> {
    let registration = Registration {
        name,
        email,
        password: secret_or_prompt(password)?,
        car_type,
    };
    let created = Authenticator::new(ctx.api.clone())
        .register(&registration)
        .await?;

    match created {
        Some(record) if ctx.json => output::print_json(&record),
        Some(record) => {
            println!("Account created");
            print!("{}", output::render_record(&record));
            Ok(())
        }
        None => {
            println!("Account created");
            Ok(())
        }
    }
}

pub fn whoami(ctx: &Context) -> Result<()> {
    let session = Authenticator::new(ctx.api.clone()).session(Utc::now())?;
    if ctx.json {
        return output::print_json(&json!({
            "user_id": session.user_id,
            "role": session.role,
            "expires_at": session.expires_at,
        }));
    }

    println!("User id  {}", session.user_id);
    println!("Role     {}", session.role.map_or("unknown", Role::as_str));
    if let Some(expires_at) = session.expires_at {
        println!("Expires  {}", expires_at.to_rfc3339());
    }
    Ok(())
}

pub async fn dashboard(ctx: &Context) -> Result<()> {
    let snapshot = DashboardLoader::new(ctx.api.clone())
        .load(Utc::now())
        .await?;
    if ctx.json {
        return output::print_json(&snapshot);
    }

    print!("{}", output::render_stats("Users", &snapshot.users)?);
    print!("{}", output::render_stats("Charging points", &snapshot.chargers)?);
    print!("{}", output::render_stats("Feedback", &snapshot.feedback)?);
    for kind in &snapshot.degraded {
        eprintln!("Warning: {} could not be loaded and is shown as empty", kind.label());
    }
    Ok(())
}

pub async fn entity(ctx: &Context, kind: EntityKind, action: EntityAction) -> Result<()> {
    match action {
        EntityAction::List(args) => list(ctx, kind, &args).await,
        EntityAction::Show { id } => {
            let record = ctx.api.get(kind, &RecordId::from(id)).await?;
            if ctx.json {
                output::print_json(&record)
            } else {
                print!("{}", output::render_record(&record));
                Ok(())
            }
        }
        EntityAction::Create { set } => {
            let dispatcher = MutationDispatcher::new(ctx.api.clone());
            let mut screen = ctx.open(kind);
            let result = dispatcher.create(&mut screen, assignments(&set)).await;
            print_toasts(&mut screen);
            if let Some(record) = result? {
                show_written(ctx, &record)?;
            }
            Ok(())
        }
        EntityAction::Update { id, set } => {
            let id = RecordId::from(id);
            let dispatcher = MutationDispatcher::new(ctx.api.clone());
            let mut screen = ctx.open(kind);
            let mut record = ctx.api.get(kind, &id).await?;
            screen.view_mut().upsert(record.clone());
            for (field, value) in assignments(&set).fields() {
                record.set(field, value.clone());
            }

            let result = dispatcher.update(&mut screen, record).await;
            print_toasts(&mut screen);
            show_written(ctx, &result?)
        }
        EntityAction::Delete { id } => {
            let dispatcher = MutationDispatcher::new(ctx.api.clone());
            let mut screen = ctx.open(kind);
            let result = dispatcher.delete(&mut screen, &RecordId::from(id)).await;
            print_toasts(&mut screen);
            Ok(result?)
        }
    }
}

async fn list(ctx: &Context, kind: EntityKind, args: &ListArgs) -> Result<()> {
    let mut screen = ctx.loaded(kind).await?;
    apply_list_args(screen.view_mut(), args)?;

    if args.stats {
        return print_stats(kind, screen.view().collection(), ctx.json);
    }
    print_page(screen.view(), ctx.json)
}

pub async fn toggle(ctx: &Context, id: String) -> Result<()> {
    let dispatcher = MutationDispatcher::new(ctx.api.clone());
    let mut screen = ctx.loaded(EntityKind::Charger).await?;
    let result = dispatcher
        .toggle_enabled(&mut screen, &RecordId::from(id))
        .await;
    print_toasts(&mut screen);
    show_written(ctx, &result?)
}

pub async fn command(ctx: &Context, id: String, command: ChargerCommand) -> Result<()> {
    let dispatcher = MutationDispatcher::new(ctx.api.clone());
    let mut screen = ctx.open(EntityKind::Charger);
    let result = dispatcher
        .command(&mut screen, &RecordId::from(id), command)
        .await;
    print_toasts(&mut screen);
    Ok(result?)
}

/// Refresh the charger list on an interval until Ctrl+C
pub async fn watch(ctx: &Context, interval: Option<u64>, args: &ListArgs) -> Result<()> {
    let mut screen = ctx.loaded(EntityKind::Charger).await?;
    apply_list_args(screen.view_mut(), args)?;
    print_page(screen.view(), ctx.json)?;

    let interval = interval.map_or_else(|| ctx.config.polling.charger_interval(), Duration::from_secs);
    let api = ctx.api.clone();
    let (poller, mut events) = Poller::spawn(interval, screen.lifetime().child_token(), move || {
        let api = api.clone();
        async move { api.list(EntityKind::Charger).await }
    });
    info!(interval_secs = interval.as_secs(), "Watching charging points, press Ctrl+C to stop");

    let outcome = loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Received shutdown signal");
                break Ok(());
            }
            event = events.recv() => {
                let Some(event) = event else {
                    break Ok(());
                };
                match screen.apply(event) {
                    Ok(()) => {
                        if let Err(e) = print_page(screen.view(), ctx.json) {
                            break Err(e);
                        }
                    }
                    Err(e) if e.requires_login() => break Err(e.into()),
                    Err(e) => eprintln!("Refresh failed: {}", e.user_message()),
                }
            }
        }
    };

    screen.close();
    let stats = poller.shutdown().await;
    info!(
        ticks = stats.ticks,
        fetches = stats.fetches,
        skipped = stats.skipped,
        failures = stats.failures,
        "Stopped watching"
    );
    outcome
}

pub fn config(config: &Config, show: bool, validate: bool) -> Result<()> {
    if validate {
        config.validate()?;
        println!("Configuration is valid");
    }

    if show || !validate {
        let rendered = toml::to_string_pretty(config).context("Failed to render configuration")?;
        println!("{rendered}");
    }
    Ok(())
}

/// Build a record from `FIELD=VALUE` pairs
fn assignments(pairs: &[(String, String)]) -> Record {
    pairs
        .iter()
        .map(|(field, raw)| {
            let value = if field == PASSWORD_FIELD {
                FieldValue::Text(raw.clone())
            } else {
                FieldValue::infer(raw)
            };
            (field.clone(), value)
        })
        .collect()
}

fn apply_list_args(view: &mut ListView, args: &ListArgs) -> Result<()> {
    if let Some(term) = &args.search {
        view.set_term(term.as_str());
    }
    for (field, value) in &args.filters {
        view.select(field, Selection::parse(value))?;
    }

    let field = args.sort.clone().unwrap_or_else(|| view.sort().field.clone());
    let direction = args.direction.unwrap_or(if args.sort.is_some() {
        Direction::Ascending
    } else {
        view.sort().direction
    });
    if args.sort.is_some() || args.direction.is_some() {
        view.set_sort(match direction {
            Direction::Ascending => SortSpec::ascending(field),
            Direction::Descending => SortSpec::descending(field),
        });
    }

    if args.page > 1 {
        view.go_to(args.page)?;
    }
    Ok(())
}

fn print_page(view: &ListView, json: bool) -> Result<()> {
    let page = view.page();
    if json {
        return output::print_json(&json!({ "rows": page.rows, "page": page.info }));
    }
    print!("{}", output::render_table(view.screen().columns, &page.rows));
    println!("{}", output::page_footer(&page.info));
    Ok(())
}

fn print_stats(kind: EntityKind, records: &[Record], json: bool) -> Result<()> {
    let heading = kind.label();
    let rendered = match kind {
        EntityKind::User => stats_output(heading, &UserStats::compute(records, Utc::now()), json)?,
        EntityKind::Charger => stats_output(heading, &ChargerStats::compute(records), json)?,
        EntityKind::Feedback => stats_output(heading, &FeedbackStats::compute(records), json)?,
        EntityKind::Transaction => {
            stats_output(heading, &TransactionStats::compute(records), json)?
        }
    };
    print!("{rendered}");
    Ok(())
}

fn stats_output<T: serde::Serialize>(heading: &str, stats: &T, json: bool) -> Result<String> {
    if json {
        return Ok(format!("{}\n", serde_json::to_string_pretty(stats)?));
    }
    output::render_stats(heading, stats)
}

fn show_written(ctx: &Context, record: &Record) -> Result<()> {
    if ctx.json {
        output::print_json(record)
    } else {
        print!("{}", output::render_record(record));
        Ok(())
    }
}

/// Print success notices; errors surface through the returned result
fn print_toasts(screen: &mut Screen) {
    for toast in screen.toasts_mut().drain() {
        if toast.kind != ToastKind::Error {
            eprintln!("{}", toast.message);
        }
    }
}

fn secret_or_prompt(value: Option<String>) -> Result<SecretString> {
    if let Some(value) = value {
        return Ok(Secret::new(value));
    }

    eprint!("Password: ");
    std::io::stderr().flush()?;
    let mut line = String::new();
    std::io::stdin().lock().read_line(&mut line)?;
    let password = line.trim_end_matches(['\r', '\n']).to_string();
    if password.is_empty() {
        return Err(ClientError::validation("password", "Password is required").into());
    }
    Ok(Secret::new(password))
}
