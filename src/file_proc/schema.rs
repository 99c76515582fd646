use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use super::classify::CATEGORIES;

/// A destination folder the organize job is allowed to create and fill,
/// with the standard subfolders bootstrapped beneath it on request.
#[derive(Debug)]
pub struct DestinationFolder {
    pub name: &'static str,
    pub subfolders: &'static [&'static str],
}

pub static DESTINATIONS: &[DestinationFolder] = &[
    DestinationFolder {
        name: "Career",
        subfolders: &["Clients", "General_Docs", "Resources"],
    },
    DestinationFolder {
        name: "Teaching",
        subfolders: &["Clients", "General_Docs", "Resources"],
    },
    DestinationFolder {
        name: "Coaching",
        subfolders: &["Clients", "Templates", "Resources"],
    },
    DestinationFolder {
        name: "Brand",
        subfolders: &["Assets", "Pitch", "Strategy"],
    },
    DestinationFolder {
        name: "Workspace",
        subfolders: &["Projects", "Snippets"],
    },
    DestinationFolder {
        name: "Archive",
        subfolders: &["Resources"],
    },
];

/// Creates the destination tree beneath `root`: every keyword destination,
/// every category folder, and (optionally) the standard subfolders. Returns
/// the paths that were ensured, creation being idempotent.
pub fn ensure_destination_tree(root: &Path, create_subfolders: bool) -> io::Result<Vec<PathBuf>> {
    let mut ensured = Vec::new();

    for destination in DESTINATIONS {
        let path = root.join(destination.name);
        fs::create_dir_all(&path)?;
        ensured.push(path.clone());

        if create_subfolders {
            for subfolder in destination.subfolders {
                let sub = path.join(subfolder);
                fs::create_dir_all(&sub)?;
                ensured.push(sub);
            }
        }
    }

    for category in CATEGORIES {
        let path = root.join(category.folder);
        fs::create_dir_all(&path)?;
        ensured.push(path);
    }
    let other = root.join("Other");
    fs::create_dir_all(&other)?;
    ensured.push(other);

    Ok(ensured)
}

/// Top-level directories under `root` that are neither part of the schema
/// nor hidden. Listing only; deleting anything found here is a separate,
/// explicitly confirmed action.
pub fn find_unauthorized_folders(root: &Path) -> io::Result<Vec<PathBuf>> {
    let mut unauthorized = Vec::new();

    for entry in fs::read_dir(root)? {
        let entry = entry?;
        if !entry.file_type()?.is_dir() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        if name.starts_with('.') || is_schema_folder(&name) {
            continue;
        }
        unauthorized.push(entry.path());
    }

    unauthorized.sort();
    Ok(unauthorized)
}

fn is_schema_folder(name: &str) -> bool {
    DESTINATIONS.iter().any(|d| d.name == name)
        || CATEGORIES.iter().any(|c| c.folder == name)
        || name == "Other"
}
