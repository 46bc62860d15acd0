use std::io::Write as _;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, bail, Context};
use chrono::{TimeZone, Utc};
use lumora_channels::{EventDispatcher, MessageBus};
use lumora_core::{
    file_page_url, Config, EngineAction, EngineEvent, EngineRequest, EngineResponse, ExportFormat,
    HighlightColor, HighlightRecord, Notice, NoticeLevel, Paths,
};
use lumora_dom::{parse_document, to_html, Document};
use lumora_engine::{marker, HighlightEngine};
use lumora_storage::{FileHighlightStore, SettingsStore};

async fn load_engine(paths: &Paths, file: &Path) -> anyhow::Result<HighlightEngine> {
    let html = std::fs::read_to_string(file)
        .with_context(|| format!("failed to read {}", file.display()))?;
    let page_url = file_page_url(file).ok_or_else(|| anyhow!("cannot derive a page URL"))?;
    let settings = if paths.settings_file().exists() {
        SettingsStore::new(paths.clone()).load()
    } else {
        // first run: seed user settings from the config defaults
        let config = Config::load(&paths.config_file())?;
        let mut settings = lumora_core::Settings::default();
        settings.current_color = config.default_color;
        SettingsStore::new(paths.clone()).save(&settings)?;
        settings
    };
    let store = Arc::new(FileHighlightStore::new(paths.clone()));

    Ok(HighlightEngine::new(parse_document(&html), &page_url)
        .with_settings(settings)
        .with_persistence(store))
}

fn write_back(doc: &Document, file: &Path, out: Option<&Path>) -> anyhow::Result<()> {
    let target = out.unwrap_or(file);
    std::fs::write(target, to_html(doc))
        .with_context(|| format!("failed to write {}", target.display()))?;
    println!("Wrote {}", target.display());
    Ok(())
}

fn parse_color(s: &str) -> anyhow::Result<HighlightColor> {
    HighlightColor::from_str(s).ok_or_else(|| {
        anyhow!(
            "unknown color '{}', expected one of: {}",
            s,
            HighlightColor::all()
                .iter()
                .map(|c| c.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        )
    })
}

fn parse_format(s: &str) -> anyhow::Result<ExportFormat> {
    match s {
        "json" => Ok(ExportFormat::Json),
        "text" | "txt" => Ok(ExportFormat::Text),
        other => bail!("unknown format '{}', expected json or text", other),
    }
}

fn print_notice(notice: Option<&Notice>) {
    if let Some(n) = notice {
        let tag = match n.level {
            NoticeLevel::Info => "info",
            NoticeLevel::Success => "ok",
            NoticeLevel::Warning => "warning",
            NoticeLevel::Error => "error",
        };
        println!("[{}] {}", tag, n.message);
    }
}

fn print_records(records: &[HighlightRecord], doc: Option<&Document>) {
    if records.is_empty() {
        println!("No highlights.");
        return;
    }
    for record in records {
        let rendered = match doc {
            Some(d) => {
                if marker::find_marker(d, &record.id).is_some() {
                    "✓"
                } else {
                    "✗"
                }
            }
            None => "·",
        };
        let when = Utc
            .timestamp_millis_opt(record.created_at)
            .single()
            .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_default();
        let preview = if record.text.chars().count() > 60 {
            let cut: String = record.text.chars().take(60).collect();
            format!("{}…", cut)
        } else {
            record.text.clone()
        };
        println!(
            "{} {}  [{}] {} ({})",
            rendered,
            record.id,
            record.color.as_str(),
            preview,
            when
        );
    }
}

fn print_response(response: &EngineResponse) {
    print_notice(response.notice.as_ref());
    if let Some(payload) = &response.payload {
        println!("{}", payload);
    }
    if let Some(highlights) = &response.highlights {
        print_records(highlights, None);
    }
}

pub async fn highlight(
    paths: &Paths,
    file: &Path,
    text: &str,
    color: Option<&str>,
    out: Option<&Path>,
) -> anyhow::Result<()> {
    let color = color.map(parse_color).transpose()?;
    let mut engine = load_engine(paths, file).await?;
    engine.init().await;

    let response = engine
        .handle(EngineAction::HighlightSelectedText {
            text: text.to_string(),
            color,
        })
        .await;
    print_notice(response.notice.as_ref());
    if !response.success {
        bail!("text not found on page: {:?}", text);
    }
    if let Some(record) = response.highlights.as_deref().and_then(|h| h.last()) {
        println!("Created {}", record.id);
    }
    write_back(engine.doc(), file, out)
}

pub async fn restore(paths: &Paths, file: &Path, out: Option<&Path>) -> anyhow::Result<()> {
    let mut engine = load_engine(paths, file).await?;
    let report = engine.init().await;
    println!(
        "Restored {} highlight(s), {} unresolved",
        report.restored, report.unresolved
    );
    write_back(engine.doc(), file, out)
}

pub async fn list(paths: &Paths, file: &Path) -> anyhow::Result<()> {
    let mut engine = load_engine(paths, file).await?;
    engine.init().await;
    print_records(engine.records(), Some(engine.doc()));
    Ok(())
}

pub async fn remove(
    paths: &Paths,
    file: &Path,
    id: &str,
    out: Option<&Path>,
) -> anyhow::Result<()> {
    let mut engine = load_engine(paths, file).await?;
    engine.init().await;

    let response = engine
        .handle(EngineAction::RemoveHighlight { id: id.to_string() })
        .await;
    print_notice(response.notice.as_ref());
    if !response.success {
        bail!("no highlight with id {}", id);
    }
    write_back(engine.doc(), file, out)
}

pub async fn clear(paths: &Paths, file: &Path, yes: bool, out: Option<&Path>) -> anyhow::Result<()> {
    let mut engine = load_engine(paths, file).await?;
    engine.init().await;

    if engine.records().is_empty() {
        println!("No highlights to clear.");
        return Ok(());
    }
    if !yes && !confirm(&format!(
        "Clear all {} highlight(s) on this page? This cannot be undone.",
        engine.records().len()
    ))? {
        println!("Aborted.");
        return Ok(());
    }

    let response = engine.handle(EngineAction::ClearAllHighlights).await;
    print_notice(response.notice.as_ref());
    write_back(engine.doc(), file, out)
}

pub async fn jump(paths: &Paths, file: &Path, id: &str, out: Option<&Path>) -> anyhow::Result<()> {
    let mut engine = load_engine(paths, file).await?;
    engine.init().await;

    let response = engine
        .handle(EngineAction::JumpToHighlight { id: id.to_string() })
        .await;
    print_notice(response.notice.as_ref());
    if !response.success {
        bail!("highlight {} is not rendered on this page", id);
    }
    println!("Flashed {}", id);
    write_back(engine.doc(), file, out)
}

pub async fn edit(
    paths: &Paths,
    file: &Path,
    id: &str,
    text: &str,
) -> anyhow::Result<()> {
    let mut engine = load_engine(paths, file).await?;
    engine.init().await;

    if !engine.edit(id, text).await {
        bail!("no highlight with id {} (or the new text is empty)", id);
    }
    println!("Updated {}", id);
    Ok(())
}

pub async fn copy(paths: &Paths, file: &Path) -> anyhow::Result<()> {
    let mut engine = load_engine(paths, file).await?;
    engine.init().await;

    let response = engine.handle(EngineAction::CopyHighlights).await;
    if let Some(payload) = response.payload {
        println!("{}", payload);
    }
    Ok(())
}

pub async fn export(
    paths: &Paths,
    file: &Path,
    format: &str,
    output: Option<&Path>,
) -> anyhow::Result<()> {
    let format = parse_format(format)?;
    let mut engine = load_engine(paths, file).await?;
    engine.init().await;

    let response = engine
        .handle(EngineAction::ExportAllHighlights {
            format: Some(format),
        })
        .await;
    let payload = response
        .payload
        .ok_or_else(|| anyhow!("export produced no output"))?;
    match output {
        Some(target) => {
            std::fs::write(target, payload)
                .with_context(|| format!("failed to write {}", target.display()))?;
            println!("Exported to {}", target.display());
        }
        None => println!("{}", payload),
    }
    Ok(())
}

pub async fn prune(paths: &Paths, days: Option<i64>) -> anyhow::Result<()> {
    let config = Config::load(&paths.config_file())?;
    let days = days.unwrap_or(config.retention_days);
    let store = FileHighlightStore::new(paths.clone());
    let report = store.prune_older_than(days).await?;
    println!(
        "Pruned {} highlight(s) across {} page(s) (older than {} days)",
        report.highlights_removed, report.pages_pruned, days
    );
    Ok(())
}

pub fn settings_show(paths: &Paths) -> anyhow::Result<()> {
    let settings = SettingsStore::new(paths.clone()).load();
    println!("currentColor:      {}", settings.current_color.as_str());
    println!("autoSave:          {}", settings.auto_save);
    println!("showNotifications: {}", settings.show_notifications);
    Ok(())
}

pub fn settings_set(
    paths: &Paths,
    color: Option<&str>,
    auto_save: Option<bool>,
    notifications: Option<bool>,
) -> anyhow::Result<()> {
    let store = SettingsStore::new(paths.clone());
    let mut settings = store.load();
    if let Some(color) = color {
        settings.current_color = parse_color(color)?;
    }
    if let Some(auto_save) = auto_save {
        settings.auto_save = auto_save;
    }
    if let Some(notifications) = notifications {
        settings.show_notifications = notifications;
    }
    store.save(&settings)?;
    settings_show(paths)
}

/// Interactive mode: the REPL is a trigger surface pushing requests over
/// the bus; a spawned engine task consumes them, and change events fan out
/// through the dispatcher like a popup listening for updates.
pub async fn session(paths: &Paths, file: &Path) -> anyhow::Result<()> {
    let config = Config::load(&paths.config_file())?;
    let bus = MessageBus::new(config.bus_buffer);
    let MessageBus {
        request_tx,
        mut request_rx,
        event_tx,
        event_rx,
    } = bus;

    let mut engine = load_engine(paths, file).await?.with_events(event_tx.clone());
    let report = engine.init().await;
    println!(
        "Loaded {}: restored {}, unresolved {}",
        file.display(),
        report.restored,
        report.unresolved
    );

    let mut dispatcher = EventDispatcher::new();
    let mut updates = dispatcher.subscribe(16);
    tokio::spawn(dispatcher.run(event_rx));
    tokio::spawn(async move {
        while let Some(event) = updates.recv().await {
            match event {
                EngineEvent::HighlightsUpdated { highlights, .. } => {
                    println!("  · highlights changed ({} total)", highlights.len());
                }
            }
        }
    });

    let engine_task = tokio::spawn(async move {
        while let Some(request) = request_rx.recv().await {
            let response = engine.handle(request.action).await;
            print_response(&response);
        }
        engine
    });

    println!("Commands: highlight <text> | remove <id> | jump <id> | list | clear | copy | export [json|text] | quit");
    let stdin = std::io::stdin();
    loop {
        print!("> ");
        std::io::stdout().flush()?;
        let mut line = String::new();
        if stdin.read_line(&mut line)? == 0 {
            break;
        }
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let (command, rest) = line.split_once(' ').unwrap_or((line, ""));
        let rest = rest.trim();

        let action = match command {
            "quit" | "exit" => break,
            "highlight" if !rest.is_empty() => EngineAction::HighlightSelectedText {
                text: rest.to_string(),
                color: None,
            },
            "remove" if !rest.is_empty() => EngineAction::RemoveHighlight {
                id: rest.to_string(),
            },
            "jump" if !rest.is_empty() => EngineAction::JumpToHighlight {
                id: rest.to_string(),
            },
            "list" => EngineAction::GetHighlights,
            "clear" => {
                if !confirm("Clear all highlights on this page? This cannot be undone.")? {
                    continue;
                }
                EngineAction::ClearAllHighlights
            }
            "copy" => EngineAction::CopyHighlights,
            "export" => {
                let format = if rest.is_empty() {
                    None
                } else {
                    match parse_format(rest) {
                        Ok(f) => Some(f),
                        Err(e) => {
                            println!("{}", e);
                            continue;
                        }
                    }
                };
                EngineAction::ExportAllHighlights { format }
            }
            _ => {
                println!("Unknown command: {}", line);
                continue;
            }
        };

        if request_tx
            .send(EngineRequest::popup(action))
            .await
            .is_err()
        {
            break;
        }
        // let the engine task print before the next prompt
        tokio::time::sleep(Duration::from_millis(50)).await;
    }

    drop(request_tx);
    let engine = engine_task.await?;
    write_back(engine.doc(), file, None)?;
    Ok(())
}

fn confirm(prompt: &str) -> anyhow::Result<bool> {
    print!("{} [y/N] ", prompt);
    std::io::stdout().flush()?;
    let mut answer = String::new();
    std::io::stdin().read_line(&mut answer)?;
    Ok(matches!(answer.trim(), "y" | "Y" | "yes"))
}
