//! # Stage Soak
//!
//! Drives a `VideoMemory` through thousands of frames of seeded sprite
//! churn while a second thread reads the display latch, then prints the
//! allocator status screen.
//!
//! ## Usage
//!
//! ```bash
//! RUST_LOG=vram=debug stage_soak --frames 3600 --seed 7 --config vram.toml
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use vram::vram_core::{
    BgmapHandle, BgmapRequest, CharSetHandle, CharSetPolicy, ObjectAttributes, ParamMode, TextOverlay,
    VramResult,
};
use vram::vram_shared::constants::TILE_BYTES;
use vram::vram_shared::{ContentId, ContentLibrary, OwnerId};
use vram::{VideoMemory, VramConfig};

/// Distinct sprite kinds in the content library.
const CONTENT_KINDS: u32 = 32;
/// Texture content ids start here.
const TEXTURE_CONTENT_BASE: u32 = 1000;
/// Live sprites at most.
const MAX_SPRITES: usize = 48;
/// Animation frames per charset.
const ANIMATION_FRAMES: usize = 2;
/// Frames between status lines.
const STATUS_INTERVAL: u64 = 600;

/// One on-screen sprite and everything it holds in VRAM.
struct Sprite {
    owner: OwnerId,
    charset: CharSetHandle,
    char_index: usize,
    animated: bool,
    segment: usize,
    objects: usize,
    x: i16,
    y: i16,
    has_param_table: bool,
    texture: Option<BgmapHandle>,
}

const fn tiles_for(kind: u32) -> usize {
    1 + (kind as usize * 7) % 16
}

const fn texture_size(kind: u32) -> (usize, usize) {
    (4 + kind as usize % 8, 3 + kind as usize % 6)
}

fn build_library() -> ContentLibrary {
    let mut library = ContentLibrary::new();
    for kind in 0..CONTENT_KINDS {
        let tiles = tiles_for(kind);
        let bytes = tiles * ANIMATION_FRAMES * TILE_BYTES;
        library.insert_tiles(ContentId::new(kind), (0..bytes).map(|i| (i as u32 ^ kind) as u8).collect::<Vec<u8>>());

        let (cols, rows) = texture_size(kind);
        let cells: Vec<u16> = (0..cols * rows).map(|cell| (cell % tiles) as u16).collect();
        library.insert_cells(ContentId::new(TEXTURE_CONTENT_BASE + kind), cells);
    }
    library
}

fn write_objects(vram: &mut VideoMemory, sprite: &Sprite) -> VramResult<()> {
    for index in 0..sprite.objects {
        let attributes = ObjectAttributes::new(
            sprite.x + 8 * index as i16,
            0,
            sprite.y,
            (sprite.char_index + index) as u16,
            0,
        );
        let result = vram.objects_mut().write_object(sprite.segment, sprite.owner, index, &attributes);
        vram.check(result)?;
    }
    Ok(())
}

fn spawn(vram: &mut VideoMemory, library: &ContentLibrary, rng: &mut StdRng, owner: OwnerId) -> VramResult<Sprite> {
    let kind = rng.gen_range(0..CONTENT_KINDS);
    let tiles = tiles_for(kind);
    let animated = kind % 3 == 0;
    let policy = if animated { CharSetPolicy::SharedAnimated } else { CharSetPolicy::Exclusive };

    let result = vram.charsets_mut().allocate(ContentId::new(kind), tiles, policy);
    let allocation = vram.check(result)?;
    if allocation.needs_write {
        let result = vram.charsets_mut().write(allocation.handle, library);
        vram.check(result)?;
    }
    let char_index = vram.charsets().char_index(allocation.handle).unwrap_or(0);

    let objects = tiles.min(8);
    let result = vram.objects_mut().get_container(objects, Some(rng.gen_range(-32..=32)));
    let segment = vram.check(result)?;
    let result = vram.objects_mut().add_object(segment, owner, objects);
    vram.check(result)?;

    let has_param_table = rng.gen_bool(0.3);
    if has_param_table {
        let result = vram.params_mut().allocate(owner, rng.gen_range(4..=16), ParamMode::HBias);
        vram.check(result)?;
    }

    // Textures index into the charset, so only shared charsets get one
    let mut texture = None;
    if animated && rng.gen_bool(0.5) {
        let (cols, rows) = texture_size(kind);
        let request =
            BgmapRequest::new(ContentId::new(TEXTURE_CONTENT_BASE + kind), cols, rows).with_palette((kind % 4) as u8);
        let result = vram.bgmaps_mut().register_texture(&request);
        let registration = vram.check(result)?;
        // A cached region may have been written against an older charset
        if registration.reused {
            let result = vram.bgmaps_mut().rewrite(registration.handle, char_index, library);
            vram.check(result)?;
        } else if registration.needs_write {
            let result = vram.bgmaps_mut().write(registration.handle, char_index, library);
            vram.check(result)?;
        }
        texture = Some(registration.handle);
    }

    let sprite = Sprite {
        owner,
        charset: allocation.handle,
        char_index,
        animated,
        segment,
        objects,
        x: rng.gen_range(0..376),
        y: rng.gen_range(0..216),
        has_param_table,
        texture,
    };
    write_objects(vram, &sprite)?;
    Ok(sprite)
}

fn despawn(vram: &mut VideoMemory, sprites: &mut Vec<Sprite>, index: usize) -> VramResult<()> {
    let sprite = sprites.swap_remove(index);
    vram.charsets_mut().free(sprite.charset);
    if sprite.has_param_table {
        vram.params_mut().free(sprite.owner);
    }
    if let Some(texture) = sprite.texture {
        vram.bgmaps_mut().remove_texture(texture);
    }

    let relocations = vram.objects_mut().remove_object(sprite.segment, sprite.owner);
    for relocation in relocations {
        if let Some(moved) = sprites.iter().find(|other| other.owner == relocation.owner) {
            debug!(owner = moved.owner.raw(), from = relocation.from, to = relocation.to, "sprite objects moved");
            write_objects(vram, moved)?;
        }
    }
    Ok(())
}

fn run_frame(
    vram: &mut VideoMemory,
    library: &ContentLibrary,
    rng: &mut StdRng,
    sprites: &mut Vec<Sprite>,
    next_owner: &mut u32,
) -> VramResult<()> {
    if sprites.len() < MAX_SPRITES && rng.gen_bool(0.6) {
        let owner = OwnerId::new(*next_owner);
        *next_owner += 1;
        sprites.push(spawn(vram, library, rng, owner)?);
    }

    if !sprites.is_empty() && rng.gen_bool(0.45) {
        let index = rng.gen_range(0..sprites.len());
        despawn(vram, sprites, index)?;
    }

    if vram.frame() % 8 == 0 {
        let frame = (vram.frame() / 8) as usize % ANIMATION_FRAMES;
        for sprite in sprites.iter().filter(|sprite| sprite.animated) {
            let result = vram.charsets_mut().set_frame(sprite.charset, frame, library);
            vram.check(result)?;
        }
    }

    if let Some(relocation) = vram.charsets_mut().defragment_step() {
        let Some(char_index) = vram.charsets().char_index(relocation.handle) else {
            return Ok(());
        };
        for sprite in sprites.iter_mut().filter(|sprite| sprite.charset == relocation.handle) {
            sprite.char_index = char_index;
            write_objects(vram, sprite)?;
            if let Some(texture) = sprite.texture {
                let result = vram.bgmaps_mut().rewrite(texture, char_index, library);
                vram.check(result)?;
            }
        }
        debug!(from = relocation.from, to = relocation.to, "charset moved down");
    }

    Ok(())
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    println!("╔══════════════════════════════════════════════════════════════════╗");
    println!("║         VRAM STAGE SOAK                                          ║");
    println!("║         SEEDED SPRITE CHURN                                      ║");
    println!("╚══════════════════════════════════════════════════════════════════╝");
    println!();

    // Parse command line arguments (simple parsing, no external deps)
    let args: Vec<String> = std::env::args().collect();
    let mut frames = 3600u64;
    let mut seed = 0x5EED_u64;
    let mut config_path: Option<String> = None;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--frames" | "-f" => {
                if i + 1 < args.len() {
                    frames = args[i + 1].parse().unwrap_or(3600);
                    i += 1;
                }
            }
            "--seed" | "-s" => {
                if i + 1 < args.len() {
                    seed = args[i + 1].parse().unwrap_or(0x5EED);
                    i += 1;
                }
            }
            "--config" | "-c" => {
                if i + 1 < args.len() {
                    config_path = Some(args[i + 1].clone());
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Usage: stage_soak [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -f, --frames <NUM>         Frames to run (default: 3600)");
                println!("  -s, --seed <NUM>           Churn seed (default: 24301)");
                println!("  -c, --config <PATH>        VRAM layout TOML (default: built-in)");
                println!("  -h, --help                 Show this help");
                return;
            }
            other => warn!(argument = other, "ignoring unknown argument"),
        }
        i += 1;
    }

    let config = match &config_path {
        Some(path) => match VramConfig::load(path) {
            Ok(config) => config,
            Err(err) => {
                eprintln!("{err}");
                std::process::exit(2);
            }
        },
        None => VramConfig::default(),
    };

    println!("┌─ CONFIGURATION ─────────────────────────────────────────────────┐");
    println!("│ Frames:             {frames}");
    println!("│ Seed:               {seed}");
    println!("│ Param Segments:     {}", config.param_table_segments);
    println!("│ Texture Segments:   {}", config.texture_segments());
    println!("└──────────────────────────────────────────────────────────────────┘");
    println!();

    let mut vram = match VideoMemory::new(&config) {
        Ok(vram) => vram,
        Err(err) => {
            eprintln!("video memory setup failed: {err}");
            std::process::exit(2);
        }
    };

    let stop = Arc::new(AtomicBool::new(false));
    let viewer = {
        let reader = vram.display();
        let stop = Arc::clone(&stop);
        thread::spawn(move || {
            let mut observed = 0u64;
            let mut last = 0u64;
            while !stop.load(Ordering::Relaxed) {
                let frame = reader.frame();
                if frame != last {
                    observed += 1;
                    last = frame;
                }
                thread::sleep(Duration::from_micros(200));
            }
            observed
        })
    };

    let library = build_library();
    let mut rng = StdRng::seed_from_u64(seed);
    let mut sprites: Vec<Sprite> = Vec::with_capacity(MAX_SPRITES);
    let mut next_owner = 1u32;
    let mut relocations = 0u64;
    let mut holes_closed = 0u64;
    let start = Instant::now();

    for _ in 0..frames {
        if let Err(err) = run_frame(&mut vram, &library, &mut rng, &mut sprites, &mut next_owner) {
            if vram.is_halted() {
                break;
            }
            warn!(%err, "frame logic failed");
        }

        let report = vram.end_frame();
        relocations += u64::from(report.relocated());
        holes_closed += u64::from(report.hole_closed());

        if report.frame % STATUS_INTERVAL == 0 {
            info!(
                frame = report.frame,
                sprites = sprites.len(),
                tiles = report.tiles_used,
                bgmap_regions = report.bgmap_regions,
                param_used = report.param_used,
                objects = report.objects_used,
                "soak status"
            );
        }
    }

    stop.store(true, Ordering::Relaxed);
    let observed = viewer.join().unwrap_or(0);

    if vram.is_halted() {
        println!("{}", vram.overlay().render());
        std::process::exit(1);
    }

    let mut overlay = TextOverlay::default();
    #[cfg(feature = "debug_overlay")]
    vram.print_status(&mut overlay);
    println!("{}", overlay.render());

    println!("┌─ SOAK COMPLETE ─────────────────────────────────────────────────");
    println!("│ Frames:             {}", vram.frame());
    println!("│ Elapsed:            {:.2}s", start.elapsed().as_secs_f64());
    println!("│ Live Sprites:       {}", sprites.len());
    println!("│ Param Relocations:  {relocations}");
    println!("│ Holes Closed:       {holes_closed}");
    println!("│ Frames Observed:    {observed}");
    println!("└─────────────────────────────────────────────────────────────────");
}
