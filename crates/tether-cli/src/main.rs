mod cli;

use crate::cli::{Cli, Command, StorageBackendArg};
use anyhow::{bail, Context};
use clap::Parser;
use jiff::Timestamp;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use tether_binder::BinderService;
use tether_core::{
    BindRequest, Binding, BindingSettings, BindingStore, Enforcement, EventSink, ShortId,
};
use tether_events::{EventQueue, TracingHandler, DEFAULT_CAPACITY};
use tether_generator::{IdGenerator, RandomGenerator};
use tether_redirector::RedirectorService;
use tether_storage::{InMemoryStore, MySqlStore};
use tracing::{debug, info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    tether_telemetry::init(cli.log_format.into())?;

    let settings = cli.settings.to_settings();
    settings.validate().context("invalid settings")?;

    info!(storage_backend = %cli.storage, "starting tether");

    match cli.storage {
        StorageBackendArg::InMemory => {
            run(cli.command, InMemoryStore::new(), settings, cli.base_url).await
        }
        StorageBackendArg::Mysql => {
            let mysql_dsn = cli
                .mysql_dsn
                .context("mysql dsn is required when storage backend is mysql")?;
            let store = MySqlStore::connect(&mysql_dsn).await?;
            store.ensure_schema().await?;
            run(cli.command, store, settings, cli.base_url).await
        }
    }
}

async fn run<S: BindingStore>(
    command: Command,
    store: S,
    settings: BindingSettings,
    base_url: Option<String>,
) -> anyhow::Result<()> {
    let store = Arc::new(store);
    let (events, worker) = EventQueue::spawn(DEFAULT_CAPACITY, TracingHandler);
    let binder = BinderService::new(
        Arc::clone(&store),
        RandomGenerator::new(),
        events.clone(),
        settings.clone(),
    );
    let redirector = RedirectorService::new(store, events, settings);

    let mut stdout = std::io::stdout().lock();
    let outcome = execute(
        command,
        &binder,
        &redirector,
        base_url.as_deref(),
        &mut stdout,
    )
    .await;

    // The worker stops once the last queue handle is gone.
    drop(binder);
    drop(redirector);
    let stats = worker.stats();
    worker.join().await;
    debug!(
        handled = stats.handled(),
        failed = stats.failed(),
        dropped = stats.dropped(),
        "events delivered"
    );
    outcome
}

async fn execute<S, G, E, W>(
    command: Command,
    binder: &BinderService<Arc<S>, G, E>,
    redirector: &RedirectorService<Arc<S>, E>,
    base_url: Option<&str>,
    out: &mut W,
) -> anyhow::Result<()>
where
    S: BindingStore,
    G: IdGenerator,
    E: EventSink,
    W: Write,
{
    match command {
        Command::Bind {
            url,
            id,
            ttl,
            expire_at,
            max_access,
            expired_url,
            exhausted_url,
            relaxed,
        } => {
            let request = BindRequest {
                url,
                id,
                ttl,
                expire_at,
                max_access,
                expired_url,
                exhausted_url,
            };
            let enforcement = if relaxed {
                Enforcement::RELAXED
            } else {
                Enforcement::STRICT
            };
            let id = binder.bind(request, enforcement, Timestamp::now()).await?;
            match base_url {
                Some(base) => writeln!(out, "{}", id.to_url(base))?,
                None => writeln!(out, "{id}")?,
            }
        }
        Command::Resolve { id } => {
            let redirect = redirector.resolve_redirect(&parse_id(&id)).await?;
            let reason = redirect.error();
            match (redirect.target, reason) {
                (Some(target), None) => writeln!(out, "{target}")?,
                (Some(target), Some(reason)) => {
                    warn!(id = %redirect.id, reason = %reason, "redirecting to fallback");
                    writeln!(out, "{target}")?;
                }
                (None, Some(reason)) => {
                    return Err(reason).with_context(|| format!("{id} has no fallback url"));
                }
                (None, None) => bail!("{id} resolved to nothing"),
            }
        }
        Command::Peek { id } => {
            let binding = redirector.peek(&parse_id(&id)).await?;
            write_binding(out, &binding)?;
        }
        Command::Unbind { id } => {
            binder.unbind(&parse_id(&id)).await?;
            writeln!(out, "unbound {id}")?;
        }
        Command::Import { file } => {
            let imported = import_file(binder, &file).await?;
            writeln!(out, "imported {imported} records from {}", file.display())?;
        }
    }
    Ok(())
}

fn parse_id(raw: &str) -> ShortId {
    ShortId::new_unchecked(raw.trim())
}

async fn import_file<S, G, E>(
    binder: &BinderService<Arc<S>, G, E>,
    path: &Path,
) -> anyhow::Result<usize>
where
    S: BindingStore,
    G: IdGenerator,
    E: EventSink,
{
    let reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("failed to open {}", path.display()))?;

    let records = reader.into_records().map(|record| {
        record.map(|record| record.iter().map(str::to_string).collect::<Vec<_>>())
    });
    Ok(binder.import_records(records, Timestamp::now()).await?)
}

fn write_binding<W: Write>(out: &mut W, binding: &Binding) -> std::io::Result<()> {
    fn or_unset<T: ToString>(value: Option<T>) -> String {
        value.map_or_else(|| "-".to_string(), |v| v.to_string())
    }

    writeln!(out, "id:            {}", binding.id)?;
    writeln!(out, "url:           {}", binding.url)?;
    writeln!(out, "bound_at:      {}", binding.bound_at)?;
    writeln!(out, "expire_at:     {}", or_unset(binding.expire_at))?;
    writeln!(out, "max_access:    {}", or_unset(binding.max_access))?;
    writeln!(out, "counter:       {}", binding.counter)?;
    writeln!(out, "expired_url:   {}", or_unset(binding.expired_url.as_deref()))?;
    writeln!(out, "exhausted_url: {}", or_unset(binding.exhausted_url.as_deref()))?;
    Ok(())
}
