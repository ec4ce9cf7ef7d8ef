use clap::Parser;
use emu_core::logging::{LogConfig, LogLevel};
use emu_gui::audio::Beeper;
use emu_gui::keymap;
use emu_gui::library;
use emu_gui::options::{Command, Options};
use emu_gui::profiles::ProfileStore;
use emu_gui::save_state;
use emu_gui::session::{Session, HEIGHT, WIDTH};
use minifb::{Key, KeyRepeat, ScaleMode, Window, WindowOptions};
use std::error::Error;
use std::time::{Duration, Instant};

const FRAME_TIME: Duration = Duration::from_millis(16);

fn pressed(window: &Window, key: Key) -> bool {
    window.is_key_pressed(key, KeyRepeat::No)
}

fn save_store(store: &ProfileStore) {
    if let Err(e) = store.save() {
        log::warn!("Failed to save profiles: {}", e);
    }
}

fn open_rom(
    session: &mut Session,
    store: &mut ProfileStore,
    path: &str,
) -> Result<(), Box<dyn Error>> {
    let data = std::fs::read(path)?;
    let profile = store.profile_for_rom(path);
    session.open(path, &data, profile, &save_state::default_saves_dir())?;

    store.last_rom_path = Some(path.to_string());
    save_store(store);
    println!("Loaded {} with profile {}", path, session.profile().name);
    Ok(())
}

fn run(
    store: &mut ProfileStore,
    rom: Option<String>,
    profile: Option<String>,
) -> Result<(), Box<dyn Error>> {
    let rom_path = rom.or_else(|| store.last_rom_path.clone());
    if let (Some(path), Some(name)) = (&rom_path, &profile) {
        store.assign_profile(path, name)?;
    }

    let mut session = Session::new(store.profile_for_rom(""));
    if let Some(path) = &rom_path {
        if let Err(e) = open_rom(&mut session, store, path) {
            eprintln!("Failed to load {}: {}", path, e);
        }
    }

    let mut title = session.title();
    let mut window = Window::new(
        &title,
        WIDTH,
        HEIGHT,
        WindowOptions {
            resize: true,
            scale_mode: ScaleMode::AspectRatioStretch,
            ..WindowOptions::default()
        },
    )?;

    let beeper = match Beeper::new() {
        Ok(b) => Some(b),
        Err(e) => {
            eprintln!("Warning: Failed to initialize audio: {}. Sound is disabled.", e);
            None
        }
    };

    let mut show_help = false;
    let mut last_frame = Instant::now();
    let mut last_tick = Instant::now();

    while window.is_open() && !window.is_key_down(Key::Escape) {
        let held = window.get_keys();
        let ctrl = keymap::ctrl_held(&held);

        if pressed(&window, Key::F1) {
            show_help = !show_help;
        }

        if session.loaded() {
            if ctrl && pressed(&window, Key::R) {
                session.reset();
            }
            if ctrl && pressed(&window, Key::P) {
                session.toggle_pause();
            }
            if ctrl && pressed(&window, Key::S) {
                session.quick_save();
            }
            if ctrl && pressed(&window, Key::L) {
                session.quick_load();
            }
            if ctrl && pressed(&window, Key::F) {
                session.toggle_favorite(store);
                save_store(store);
            }
            if pressed(&window, Key::F5) {
                session.save_slot();
            }
            if pressed(&window, Key::F6) {
                session.next_slot();
            }
            if pressed(&window, Key::F7) {
                session.load_slot();
            }
            session.set_keys(&keymap::keypad_state(&held));
        }

        let now = Instant::now();
        session.advance(now - last_tick);
        last_tick = now;

        if let Some(beeper) = &beeper {
            beeper.set_active(session.sound_on());
        }

        if session.title() != title {
            title = session.title();
            window.set_title(&title);
        }

        let buffer = session.present(show_help);
        window.update_with_buffer(&buffer, WIDTH, HEIGHT)?;

        let frame_dt = last_frame.elapsed();
        if frame_dt < FRAME_TIME {
            std::thread::sleep(FRAME_TIME - frame_dt);
        }
        last_frame = Instant::now();
    }

    Ok(())
}

fn execute(store: &mut ProfileStore, command: Command) -> Result<(), Box<dyn Error>> {
    match command {
        Command::Profiles => {
            for p in store.profiles() {
                println!(
                    "{:<16} bg {} fg {} ips {:>4}  decay {:<5} audio {:<5} rainbow {}",
                    p.name,
                    p.bg_color,
                    p.fg_color,
                    p.ips,
                    p.decay_enabled,
                    p.audio_enabled,
                    p.rainbow_enabled
                );
            }
        }
        Command::Library { dir } => {
            let lib = library::scan(&dir, store)
                .map_err(|e| format!("cannot read library {}: {}", dir.display(), e))?;
            print!("{}", library::render(&lib, store));
        }
        Command::Favorite { rom } => {
            let favorite = store.toggle_favorite(&rom);
            store.save()?;
            println!(
                "{} {} favorites",
                rom,
                if favorite { "added to" } else { "removed from" }
            );
        }
        Command::DeleteProfile { name } => {
            store.delete_profile(&name)?;
            store.save()?;
            println!("Deleted profile {}", name);
        }
        Command::SaveProfile(args) => {
            store.save_profile(args.to_profile())?;
            store.save()?;
            println!("Saved profile {}", args.name.trim());
        }
    }
    Ok(())
}

fn main() {
    env_logger::init();
    let opts = Options::parse();

    // Core categories stay quiet unless asked for
    if let Some(name) = opts.log_level.as_deref() {
        match LogLevel::from_str(name) {
            Some(level) => LogConfig::global().set_global_level(level),
            None => eprintln!("Warning: unknown log level {:?}", name),
        }
    }

    let mut store = ProfileStore::load();
    let result = match opts.command {
        Some(command) => execute(&mut store, command),
        None => run(&mut store, opts.rom, opts.profile),
    };
    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
