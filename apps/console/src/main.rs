use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use client_core::{
    config::load_settings, EntityKindConfig, EntityListController, ListEvent, NoticeLevel,
};
use serde_json::Value;
use shared::{
    domain::{Crop, Customer, Employee, Fruit, Supplier},
    record::{Record, RecordId},
};
use tokio::sync::broadcast;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(about = "List and edit records held by a collection service")]
struct Args {
    /// Overrides `server_url` from client.toml / APP__SERVER_URL.
    #[arg(long)]
    server_url: Option<String>,
    #[arg(long, value_enum, default_value_t = Kind::Employees)]
    kind: Kind,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Kind {
    Employees,
    Customers,
    Suppliers,
    Crops,
    Fruits,
}

#[derive(Subcommand, Debug)]
enum Command {
    List {
        #[arg(long)]
        search: Option<String>,
        #[arg(long)]
        status: Option<String>,
        /// Any other filter dimension, as `name=value`.
        #[arg(long = "filter", value_parser = parse_pair)]
        filters: Vec<(String, String)>,
        #[arg(long, default_value_t = 1)]
        page: usize,
        #[arg(long)]
        page_size: Option<usize>,
    },
    Create {
        /// `field=value`; `field=null` sends an explicit null.
        #[arg(long = "field", value_parser = parse_pair)]
        fields: Vec<(String, String)>,
    },
    Update {
        id: String,
        #[arg(long = "field", value_parser = parse_pair)]
        fields: Vec<(String, String)>,
    },
    Toggle {
        id: String,
    },
    Delete {
        id: String,
    },
}

fn parse_pair(raw: &str) -> Result<(String, String), String> {
    raw.split_once('=')
        .map(|(name, value)| (name.trim().to_string(), value.to_string()))
        .filter(|(name, _)| !name.is_empty())
        .ok_or_else(|| format!("expected name=value, got `{raw}`"))
}

fn field_value(raw: &str) -> Value {
    if raw == "null" {
        Value::Null
    } else {
        Value::String(raw.to_string())
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
    let args = Args::parse();

    let mut settings = load_settings();
    if let Some(url) = args.server_url {
        settings.server_url = url;
    }

    match args.kind {
        Kind::Employees => {
            run::<Employee>(EntityKindConfig::employees(), &settings, args.command).await
        }
        Kind::Customers => {
            run::<Customer>(EntityKindConfig::customers(), &settings, args.command).await
        }
        Kind::Suppliers => {
            run::<Supplier>(EntityKindConfig::suppliers(), &settings, args.command).await
        }
        Kind::Crops => run::<Crop>(EntityKindConfig::crops(), &settings, args.command).await,
        Kind::Fruits => run::<Fruit>(EntityKindConfig::fruits(), &settings, args.command).await,
    }
}

async fn run<E: Record>(
    config: EntityKindConfig,
    settings: &client_core::config::ClientSettings,
    command: Command,
) -> Result<()> {
    let controller = EntityListController::<E>::over_http(config, settings)
        .context("failed to set up the collection client")?;
    let mut events = controller.subscribe_events();

    let loaded = controller.refresh().await;
    print_events(&mut events);
    loaded.context("initial load failed")?;

    let outcome = match command {
        Command::List {
            search,
            status,
            filters,
            page,
            page_size,
        } => {
            if let Some(page_size) = page_size {
                controller.set_page_size(page_size).await?;
            }
            let named = [("search", search), ("status", status)];
            for (dimension, value) in named
                .into_iter()
                .filter_map(|(name, value)| value.map(|v| (name.to_string(), v)))
                .chain(filters)
            {
                controller.set_filter(&dimension, &value).await?;
            }
            controller.set_page(page).await?;
            print_view(&controller)?;
            Ok(())
        }
        Command::Create { fields } => {
            controller.open_create()?;
            for (field, value) in fields {
                controller.set_draft_field(&field, field_value(&value))?;
            }
            controller.save().await
        }
        Command::Update { id, fields } => {
            let id = RecordId::from(id.as_str());
            controller.seek(&id).await?;
            controller.open_edit(&id)?;
            for (field, value) in fields {
                controller.set_draft_field(&field, field_value(&value))?;
            }
            controller.save().await
        }
        Command::Toggle { id } => {
            let id = RecordId::from(id.as_str());
            controller.seek(&id).await?;
            controller.toggle_status(&id).await
        }
        Command::Delete { id } => {
            let id = RecordId::from(id.as_str());
            controller.seek(&id).await?;
            controller.request_delete(&id)?;
            controller.confirm_delete().await
        }
    };
    print_events(&mut events);
    Ok(outcome?)
}

fn print_view<E: Record>(controller: &EntityListController<E>) -> Result<()> {
    let view = controller.view();
    for record in &view.items {
        println!("{}", serde_json::to_string(record)?);
    }
    println!(
        "page {}/{} ({} {} records)",
        view.page,
        view.page_count.max(1),
        view.total,
        controller.config().label
    );
    Ok(())
}

fn print_events(events: &mut broadcast::Receiver<ListEvent>) {
    let mut lines = EventLines::default();
    while let Ok(event) = events.try_recv() {
        match lines.describe(event) {
            Some(Line::Out(line)) => println!("{line}"),
            Some(Line::Err(line)) => eprintln!("{line}"),
            None => {}
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
enum Line {
    Out(String),
    Err(String),
}

/// Turns events into console lines. An editor opening only counts as a
/// reopen when it follows a close, i.e. a save that came back failed.
#[derive(Default)]
struct EventLines {
    closed: bool,
}

impl EventLines {
    fn describe(&mut self, event: ListEvent) -> Option<Line> {
        match event {
            ListEvent::Notice(notice) => Some(match notice.level {
                NoticeLevel::Success => Line::Out(format!("ok: {}", notice.message)),
                NoticeLevel::Error => Line::Err(format!("error: {}", notice.message)),
            }),
            ListEvent::DeleteConflict { message, detail } => Some(Line::Err(match detail {
                Some(detail) => format!("cannot delete: {message} ({detail})"),
                None => format!("cannot delete: {message}"),
            })),
            ListEvent::EditorClosed => {
                self.closed = true;
                None
            }
            ListEvent::EditorOpened { draft, .. } => {
                let reopened = std::mem::take(&mut self.closed);
                if !reopened {
                    return None;
                }
                let draft = serde_json::to_string(&draft).ok()?;
                Some(Line::Err(format!("editor reopened with {draft}")))
            }
            ListEvent::UnsavedDraft { pending } => {
                let payload = serde_json::to_string(&pending.payload).ok()?;
                Some(Line::Err(match pending.target_id {
                    Some(id) => format!("unsaved changes for {id}: {payload}"),
                    None => format!("unsaved new record: {payload}"),
                }))
            }
            ListEvent::Loading(_) | ListEvent::CollectionReplaced { .. } => None,
        }
    }
}

#[cfg(test)]
#[path = "tests/main_tests.rs"]
mod tests;
