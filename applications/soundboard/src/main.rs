/// Soundboard - command line front end
use clap::{Parser, Subcommand};
use soundboard::{SoundSelection, Soundboard, SoundboardConfig};
use soundboard_core::{
    sort_sounds, CategoryId, Sound, SoundId, SoundboardStore, DEFAULT_CATEGORY_COLOR,
};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "soundboard")]
#[command(about = "Organise and play sound clips", long_about = None)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List categories
    Categories,
    /// List sounds
    Sounds {
        /// Only sounds of this category
        #[arg(long)]
        category: Option<String>,
        /// Only sounds whose name contains this term
        #[arg(long)]
        search: Option<String>,
    },
    /// Create a category
    AddCategory {
        name: String,
        /// Background colour as hex ARGB, e.g. FF3F51B5
        #[arg(long)]
        color: Option<String>,
    },
    /// Delete a category and its sounds
    DeleteCategory { id: String },
    /// Move a category one step up
    MoveUp { id: String },
    /// Move a category one step down
    MoveDown { id: String },
    /// Import audio files into a category
    Import {
        category: String,
        #[arg(required = true)]
        files: Vec<PathBuf>,
        /// Also import files whose content is already stored
        #[arg(long)]
        include_duplicates: bool,
    },
    /// Import new files from the configured folder
    AutoImport,
    /// Delete unreferenced sound files and the import cache
    Clean,
    /// Reset every play count to zero
    ResetPlayCounts,
    /// Play a sound until it finishes
    Play { id: String },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "soundboard=info,soundboard_playback=info,soundboard_importer=info,soundboard_storage=warn".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let config = SoundboardConfig::load(cli.config.as_deref())?;
    let soundboard = Soundboard::open(&config).await?;

    match cli.command {
        Commands::Categories => list_categories(&soundboard).await?,
        Commands::Sounds { category, search } => {
            list_sounds(&soundboard, category.map(CategoryId::new), search.as_deref()).await?;
        }
        Commands::AddCategory { name, color } => {
            let color = match color {
                Some(color) => u32::from_str_radix(color.trim_start_matches('#'), 16)
                    .map_err(|e| anyhow::anyhow!("Invalid colour {color}: {e}"))?,
                None => DEFAULT_CATEGORY_COLOR,
            };
            let category = soundboard.create_category(&name, color).await?;
            println!("{}", category.id);
        }
        Commands::DeleteCategory { id } => {
            soundboard.delete_category(&CategoryId::new(id)).await?;
        }
        Commands::MoveUp { id } => {
            if !soundboard.move_category_up(&CategoryId::new(id)).await? {
                println!("Category is already first");
            }
        }
        Commands::MoveDown { id } => {
            if !soundboard.move_category_down(&CategoryId::new(id)).await? {
                println!("Category is already last");
            }
        }
        Commands::Import {
            category,
            files,
            include_duplicates,
        } => import(&soundboard, &CategoryId::new(category), files, include_duplicates).await?,
        Commands::AutoImport => auto_import(&soundboard, &config).await?,
        Commands::Clean => {
            let removed = soundboard.clean().await?;
            println!("Removed {removed} files");
        }
        Commands::ResetPlayCounts => soundboard.reset_play_counts().await?,
        Commands::Play { id } => play(soundboard, &config, &SoundId::new(id)).await?,
    }

    Ok(())
}

async fn list_categories(soundboard: &Soundboard) -> anyhow::Result<()> {
    for category in soundboard.categories().await? {
        println!(
            "{}\t{}\t{:08X}{}",
            category.id,
            category.name,
            category.background_color,
            if category.collapsed { "\tcollapsed" } else { "" }
        );
    }
    Ok(())
}

async fn list_sounds(
    soundboard: &Soundboard,
    category: Option<CategoryId>,
    search: Option<&str>,
) -> anyhow::Result<()> {
    let mut selection = SoundSelection::new();
    selection.set_search_term(search);

    for cat in soundboard.categories().await? {
        if category.as_ref().is_some_and(|id| *id != cat.id) {
            continue;
        }

        let mut sounds = soundboard.store().sounds_by_category(&cat.id).await?;
        sort_sounds(&mut sounds, cat.sorting_key, cat.sort_ascending);
        let visible = selection.visible(&sounds);
        if visible.is_empty() {
            continue;
        }

        println!("{}", cat.name);
        for sound in &visible {
            print_sound(sound);
        }
    }
    Ok(())
}

fn print_sound(sound: &Sound) {
    let length = sound
        .duration
        .map_or_else(|| "-".to_string(), |d| format!("{:.1}s", d.as_secs_f32()));
    println!(
        "  {}\t{}\t{}\tplayed {}",
        sound.id, sound.name, length, sound.play_count
    );
}

async fn import(
    soundboard: &Soundboard,
    category: &CategoryId,
    files: Vec<PathBuf>,
    include_duplicates: bool,
) -> anyhow::Result<()> {
    let batch = soundboard.prepare_import(files).await?;
    for failure in &batch.errors {
        eprintln!("{}: {}", failure.path.display(), failure.message);
    }
    let duplicates = batch.duplicate_count();

    let sounds = soundboard
        .commit_import(batch, category, include_duplicates, None)
        .await?;
    println!("Imported {} sounds", sounds.len());
    if duplicates > 0 && !include_duplicates {
        println!("Skipped {duplicates} duplicates");
    }
    Ok(())
}

async fn auto_import(soundboard: &Soundboard, config: &SoundboardConfig) -> anyhow::Result<()> {
    let Some(dir) = &config.import.auto_import_directory else {
        anyhow::bail!("No auto import directory configured");
    };
    let category = config.import.auto_import_category_id.clone().map(CategoryId::new);

    let report = soundboard.auto_import(dir, category.as_ref()).await?;
    println!(
        "Imported {} sounds, skipped {} already stored",
        report.imported.len(),
        report.skipped
    );
    Ok(())
}

#[cfg(feature = "desktop")]
async fn play(soundboard: Soundboard, config: &SoundboardConfig, id: &SoundId) -> anyhow::Result<()> {
    use soundboard_playback::{desktop::CpalBackend, PlaybackState, PlayerRegistry};

    let sound = soundboard.sound(id).await?;
    let registry = PlayerRegistry::new(
        std::sync::Arc::clone(soundboard.store()),
        config.playback_config(),
        CpalBackend::new,
    )?;
    let mut notifications = registry.notifications();
    let soundboard = soundboard.with_players(registry);

    let player = soundboard.press_sound(&sound)?;
    let mut state = player.subscribe_state();
    let mut started = false;

    loop {
        tokio::select! {
            changed = state.changed() => {
                if changed.is_err() {
                    break;
                }
                match *state.borrow_and_update() {
                    PlaybackState::Playing => started = true,
                    PlaybackState::Stopped | PlaybackState::Paused if started => break,
                    PlaybackState::Error => break,
                    _ => {}
                }
            }
            Ok(notification) = notifications.recv() => {
                anyhow::bail!("{}", notification.message());
            }
            _ = tokio::signal::ctrl_c() => {
                soundboard.stop_all();
                break;
            }
        }
    }

    player.flush().await;
    Ok(())
}

#[cfg(not(feature = "desktop"))]
async fn play(_soundboard: Soundboard, _config: &SoundboardConfig, id: &SoundId) -> anyhow::Result<()> {
    anyhow::bail!("Cannot play {id}: no audio backend compiled in (build with --features desktop)")
}
