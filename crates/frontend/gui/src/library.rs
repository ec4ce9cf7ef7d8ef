//! ROM library listing
//!
//! A library root holds one sub-folder per category, each with `.ch8` files.

use crate::profiles::ProfileStore;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

pub const DEFAULT_LIBRARY_DIR: &str = "ROMS";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Category {
    pub name: String,
    pub roms: Vec<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Library {
    /// Favourites that still exist on disk
    pub favorites: Vec<PathBuf>,
    pub categories: Vec<Category>,
}

fn is_program(path: &Path) -> bool {
    path.is_file()
        && path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.eq_ignore_ascii_case("ch8"))
            .unwrap_or(false)
}

fn sorted_entries(dir: &Path) -> io::Result<Vec<PathBuf>> {
    let mut entries = fs::read_dir(dir)?
        .filter_map(|e| e.ok().map(|e| e.path()))
        .collect::<Vec<_>>();
    entries.sort();
    Ok(entries)
}

/// Scan `root`. Empty categories are left out; a missing root is an error.
pub fn scan(root: &Path, store: &ProfileStore) -> io::Result<Library> {
    let mut categories = Vec::new();
    for dir in sorted_entries(root)?.into_iter().filter(|p| p.is_dir()) {
        let roms = sorted_entries(&dir)?
            .into_iter()
            .filter(|p| is_program(p))
            .collect::<Vec<_>>();
        if roms.is_empty() {
            continue;
        }
        let name = dir
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        categories.push(Category { name, roms });
    }

    let favorites = store
        .favorites()
        .map(PathBuf::from)
        .filter(|p| p.is_file())
        .collect();

    Ok(Library {
        favorites,
        categories,
    })
}

/// Text listing with each ROM's profile
pub fn render(library: &Library, store: &ProfileStore) -> String {
    let line = |path: &Path| {
        let key = path.to_string_lossy();
        let star = if store.is_favorite(&key) { "*" } else { " " };
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| key.to_string());
        format!(
            "  {} {:<32} [{}]\n",
            star,
            name,
            store.profile_for_rom(&key).name
        )
    };

    let mut out = String::new();
    if !library.favorites.is_empty() {
        out.push_str("Favorites\n");
        for path in &library.favorites {
            out.push_str(&line(path));
        }
    }
    for category in &library.categories {
        out.push_str(&category.name);
        out.push('\n');
        for path in &category.roms {
            out.push_str(&line(path));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_library(name: &str) -> PathBuf {
        let root = std::env::temp_dir().join(name);
        let _ = fs::remove_dir_all(&root);
        fs::create_dir_all(root.join("games")).unwrap();
        fs::create_dir_all(root.join("demos")).unwrap();
        fs::create_dir_all(root.join("empty")).unwrap();
        fs::write(root.join("games/tetris.ch8"), [0x00, 0xE0]).unwrap();
        fs::write(root.join("games/pong.ch8"), [0x00, 0xE0]).unwrap();
        fs::write(root.join("games/readme.txt"), "").unwrap();
        fs::write(root.join("demos/maze.CH8"), [0x00, 0xE0]).unwrap();
        fs::write(root.join("loose.ch8"), [0x00, 0xE0]).unwrap();
        root
    }

    #[test]
    fn test_scan_categories() {
        let root = make_library("hemu8_test_library_scan");
        let library = scan(&root, &ProfileStore::default()).unwrap();

        let names: Vec<_> = library.categories.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, ["demos", "games"]);
        assert_eq!(
            library.categories[1].roms,
            [root.join("games/pong.ch8"), root.join("games/tetris.ch8")]
        );
        assert!(library.favorites.is_empty());

        fs::remove_dir_all(&root).unwrap();
    }

    #[test]
    fn test_favorites_listed_first() {
        let root = make_library("hemu8_test_library_favs");
        let tetris = root.join("games/tetris.ch8");
        let mut store = ProfileStore::default();
        store.toggle_favorite(&tetris.to_string_lossy());
        store.toggle_favorite("/no/such/file.ch8");

        let library = scan(&root, &store).unwrap();
        assert_eq!(library.favorites, [tetris]);

        let text = render(&library, &store);
        assert!(text.starts_with("Favorites\n  * tetris.ch8"), "{}", text);
        assert!(text.contains("pong.ch8"));
        assert!(text.contains("[Default]"));

        fs::remove_dir_all(&root).unwrap();
    }

    #[test]
    fn test_missing_root() {
        let root = std::env::temp_dir().join("hemu8_test_library_missing");
        let _ = fs::remove_dir_all(&root);
        assert!(scan(&root, &ProfileStore::default()).is_err());
    }
}
