use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;
use template::{
    resolve_drop_position, section_at_fraction, section_layout, BoundingBox, CanvasViewport,
    EditorCommand, EditorStore, SectionId, Template,
};
use tracing::{info, warn};
use uuid::Uuid;

mod config;
mod library;

use config::Config;
use library::TemplateLibrary;

#[derive(Parser)]
#[command(name = "trendzo")]
#[command(about = "Trendzo template editor CLI - headless template editing")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Template directory (overrides TRENDZO_TEMPLATE_DIR)
    #[arg(short, long, global = true)]
    dir: Option<PathBuf>,

    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(clap::Args, Clone, Copy)]
struct CanvasArgs {
    /// Canvas left edge on screen, in pixels
    #[arg(long, default_value = "0", allow_hyphen_values = true)]
    left: f64,

    /// Canvas top edge on screen, in pixels
    #[arg(long, default_value = "0", allow_hyphen_values = true)]
    top: f64,

    /// Canvas zoom factor (defaults to TRENDZO_DEFAULT_ZOOM)
    #[arg(long)]
    zoom: Option<f64>,
}

impl CanvasArgs {
    fn viewport(&self, default_zoom: f64) -> Result<CanvasViewport> {
        let bbox = BoundingBox::new(self.left, self.top, 0.0, 0.0);
        Ok(CanvasViewport::new(bbox, self.zoom.unwrap_or(default_zoom))?)
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Create a template with intro, hook, body and call-to-action sections
    New {
        name: String,

        /// Create without sections
        #[arg(long)]
        empty: bool,

        /// Overwrite an existing template
        #[arg(long)]
        force: bool,
    },

    /// List templates in the template directory
    List,

    /// Show a template's sections and timeline layout
    Show {
        name: String,

        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// List the drag palette grouped by category
    Palette,

    /// Convert a screen position to template coordinates
    ResolveDrop {
        #[arg(allow_hyphen_values = true)]
        client_x: f64,
        #[arg(allow_hyphen_values = true)]
        client_y: f64,

        #[command(flatten)]
        canvas: CanvasArgs,
    },

    /// Find the section under a click at a fraction (0..1) of the timeline
    ResolveClick { name: String, fraction: f64 },

    /// Drop a palette item onto a section
    Drop {
        name: String,

        /// Section index or id
        #[arg(short, long)]
        section: String,

        /// Drag payload JSON, e.g. {"id":"heading","type":"text"}; or a palette id
        #[arg(short, long)]
        payload: String,

        #[arg(allow_hyphen_values = true)]
        client_x: f64,
        #[arg(allow_hyphen_values = true)]
        client_y: f64,

        #[command(flatten)]
        canvas: CanvasArgs,
    },

    /// Apply an editor command given as JSON
    Apply { name: String, command: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::fmt().with_max_level(level).init();

    let config = Config::load();
    let dir = cli.dir.clone().unwrap_or_else(|| config.template_dir.clone());
    let mut library = TemplateLibrary::new(dir, config.cache_ttl);

    match cli.command {
        Commands::New { name, empty, force } => new_command(&mut library, name, empty, force).await,
        Commands::List => list_command(&library).await,
        Commands::Show { name, json } => show_command(&mut library, name, json).await,
        Commands::Palette => palette_command(),
        Commands::ResolveDrop {
            client_x,
            client_y,
            canvas,
        } => resolve_drop_command(client_x, client_y, canvas, &config),
        Commands::ResolveClick { name, fraction } => {
            resolve_click_command(&mut library, name, fraction).await
        }
        Commands::Drop {
            name,
            section,
            payload,
            client_x,
            client_y,
            canvas,
        } => {
            drop_command(
                &mut library,
                &config,
                name,
                section,
                payload,
                (client_x, client_y),
                canvas,
            )
            .await
        }
        Commands::Apply { name, command } => apply_command(&mut library, name, command).await,
    }
}

async fn new_command(
    library: &mut TemplateLibrary,
    name: String,
    empty: bool,
    force: bool,
) -> Result<()> {
    if library.exists(&name).await? && !force {
        bail!("template {name:?} already exists (use --force to overwrite)");
    }
    let template = if empty {
        Template::new(&name)
    } else {
        Template::with_default_sections(&name)
    };
    let path = library.save(&name, &template).await?;
    info!("Created template {} at {:?}", template.id, path);
    println!("{}", template.id);
    Ok(())
}

async fn list_command(library: &TemplateLibrary) -> Result<()> {
    let names = library.list().await?;
    if names.is_empty() {
        warn!("No templates in {:?}", library.dir());
    }
    for name in names {
        println!("{name}");
    }
    Ok(())
}

#[derive(Serialize)]
struct SectionRow {
    index: usize,
    id: SectionId,
    name: String,
    start_time: f64,
    duration: f64,
    offset_percent: f64,
    width_percent: f64,
    elements: usize,
}

fn section_rows(template: &Template) -> Vec<SectionRow> {
    template
        .sections
        .iter()
        .zip(section_layout(&template.sections))
        .enumerate()
        .map(|(index, (section, layout))| SectionRow {
            index,
            id: section.id,
            name: section.display_name().to_string(),
            start_time: section.start_time,
            duration: section.duration,
            offset_percent: layout.offset_percent,
            width_percent: layout.width_percent,
            elements: section.elements.len(),
        })
        .collect()
}

async fn show_command(library: &mut TemplateLibrary, name: String, json: bool) -> Result<()> {
    let template = library.load(&name).await?;
    let rows = section_rows(&template);
    if json {
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }

    println!(
        "{} ({}) - {:.2}s, updated {}",
        template.name,
        template.id,
        template.total_duration(),
        template.updated_at
    );
    for row in rows {
        println!(
            "  [{}] {:<16} {:>7.2}s +{:<7.2}s {:>6.2}% @ {:>6.2}%  {} element(s)  {}",
            row.index,
            row.name,
            row.start_time,
            row.duration,
            row.width_percent,
            row.offset_percent,
            row.elements,
            row.id
        );
    }
    Ok(())
}

fn palette_command() -> Result<()> {
    let registry = template::DragSourceRegistry::stock();
    for category in registry.categories() {
        println!("{category}:");
        for item in registry.by_category(category) {
            println!(
                "  {:<10} {:<10} {}x{}  {}",
                item.id,
                item.label,
                item.default_size.width,
                item.default_size.height,
                item.payload().encode()
            );
        }
    }
    Ok(())
}

fn resolve_drop_command(
    client_x: f64,
    client_y: f64,
    canvas: CanvasArgs,
    config: &Config,
) -> Result<()> {
    let viewport = canvas.viewport(config.default_zoom)?;
    let point = resolve_drop_position(client_x, client_y, &viewport.bounding_box, viewport.zoom)?;
    println!("{}", serde_json::to_string(&point)?);
    Ok(())
}

async fn resolve_click_command(
    library: &mut TemplateLibrary,
    name: String,
    fraction: f64,
) -> Result<()> {
    let template = library.load(&name).await?;
    match section_at_fraction(&template.sections, fraction) {
        Some(idx) => {
            let section = &template.sections[idx];
            println!("{} {} {}", idx, section.id, section.display_name());
        }
        None => {
            warn!("No section at {fraction} of {name:?}");
            bail!("no section at fraction {fraction}");
        }
    }
    Ok(())
}

fn parse_section(template: &Template, raw: &str) -> Result<SectionId> {
    if let Ok(index) = raw.parse::<usize>() {
        return template
            .sections
            .get(index)
            .map(|s| s.id)
            .with_context(|| format!("section index {index} out of range"));
    }
    let uuid = Uuid::parse_str(raw).with_context(|| format!("invalid section {raw:?}"))?;
    Ok(SectionId(uuid))
}

async fn drop_command(
    library: &mut TemplateLibrary,
    config: &Config,
    name: String,
    section: String,
    payload: String,
    (client_x, client_y): (f64, f64),
    canvas: CanvasArgs,
) -> Result<()> {
    let template = library.load(&name).await?;
    let section_id = parse_section(&template, &section)?;
    let mut store = EditorStore::new(template);
    store.set_viewport(canvas.viewport(config.default_zoom)?)?;

    // A bare palette id is shorthand for its payload.
    let payload = if payload.trim_start().starts_with('{') {
        payload
    } else {
        store
            .palette()
            .payload_for(&payload)
            .with_context(|| format!("unknown palette item {payload:?}"))?
            .encode()
    };

    let element_id = store
        .drop_element(&payload, section_id, client_x, client_y)
        .with_context(|| format!("dropping onto section {section_id}"))?;
    let template = store.into_template();
    library.save(&name, &template).await?;

    if let Some((_, element)) = template.find_element(element_id) {
        info!(
            "Dropped {} at ({}, {})",
            element.kind.type_name(),
            element.position.x,
            element.position.y
        );
    }
    println!("{element_id}");
    Ok(())
}

async fn apply_command(library: &mut TemplateLibrary, name: String, command: String) -> Result<()> {
    let command: EditorCommand =
        serde_json::from_str(&command).context("parsing editor command")?;
    let label = command.name();
    let mut store = EditorStore::new(library.load(&name).await?);
    store
        .apply(command)
        .with_context(|| format!("applying {label}"))?;
    library.save(&name, store.template()).await?;
    info!("Applied {label} to {name:?}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_section_by_index_or_id() {
        let template = Template::with_default_sections("demo");
        assert_eq!(
            parse_section(&template, "2").unwrap(),
            template.sections[2].id
        );
        let id = template.sections[3].id;
        assert_eq!(parse_section(&template, &id.to_string()).unwrap(), id);
        assert!(parse_section(&template, "9").is_err());
        assert!(parse_section(&template, "hook").is_err());
    }

    #[test]
    fn test_section_rows_cover_timeline() {
        let template = Template::with_default_sections("demo");
        let rows = section_rows(&template);
        assert_eq!(rows.len(), 4);
        assert_eq!(rows[0].width_percent, 10.0);
        assert_eq!(rows[3].offset_percent, 75.0);
        assert_eq!(rows[3].name, "Call to action");
    }

    #[test]
    fn test_cli_parses_negative_coordinates() {
        let cli = Cli::try_parse_from([
            "trendzo",
            "resolve-drop",
            "-20",
            "15",
            "--left",
            "-40",
            "--zoom",
            "2",
        ])
        .unwrap();
        match cli.command {
            Commands::ResolveDrop {
                client_x,
                client_y,
                canvas,
            } => {
                assert_eq!((client_x, client_y), (-20.0, 15.0));
                let viewport = canvas.viewport(1.0).unwrap();
                assert_eq!(viewport.resolve(client_x, client_y).unwrap().x, 10.0);
            }
            _ => panic!("expected resolve-drop"),
        }
    }
}
