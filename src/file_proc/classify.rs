use std::path::Path;

use ahash::AHashMap;
use lazy_static::lazy_static;

/// A file-type category and the folder it maps to when no keyword rule
/// claims the file first. Extensions are lowercase with the leading dot.
#[derive(Debug)]
pub struct Category {
    pub name: &'static str,
    pub extensions: &'static [&'static str],
    pub folder: &'static str,
}

pub static CATEGORIES: &[Category] = &[
    Category {
        name: "Documents",
        extensions: &[".pdf", ".doc", ".docx", ".txt", ".rtf", ".odt"],
        folder: "Documents",
    },
    Category {
        name: "Spreadsheets",
        extensions: &[".xls", ".xlsx", ".csv", ".ods"],
        folder: "Spreadsheets",
    },
    Category {
        name: "Presentations",
        extensions: &[".ppt", ".pptx", ".odp"],
        folder: "Presentations",
    },
    Category {
        name: "Images",
        extensions: &[".jpg", ".jpeg", ".png", ".gif", ".bmp", ".svg", ".ico", ".webp"],
        folder: "Images",
    },
    Category {
        name: "Videos",
        extensions: &[".mp4", ".avi", ".mkv", ".mov", ".wmv", ".flv", ".webm"],
        folder: "Videos",
    },
    Category {
        name: "Audio",
        extensions: &[".mp3", ".wav", ".flac", ".aac", ".ogg", ".m4a"],
        folder: "Audio",
    },
    Category {
        name: "Code",
        extensions: &[
            ".py", ".js", ".html", ".css", ".json", ".xml", ".java", ".cpp", ".c", ".h", ".rs",
            ".sh", ".bat",
        ],
        folder: "Code",
    },
    Category {
        name: "Archives",
        extensions: &[".zip", ".rar", ".7z", ".tar", ".gz", ".bz2"],
        folder: "Archives",
    },
    Category {
        name: "Executables",
        extensions: &[".exe", ".dll", ".so", ".app", ".msi"],
        folder: "Executables",
    },
    Category {
        name: "Databases",
        extensions: &[".db", ".sqlite", ".mdb", ".sql"],
        folder: "Databases",
    },
];

static OTHER: Category = Category {
    name: "Other",
    extensions: &[],
    folder: "Other",
};

lazy_static! {
    static ref EXTENSION_INDEX: AHashMap<&'static str, &'static Category> = {
        let mut index = AHashMap::new();
        for category in CATEGORIES {
            for ext in category.extensions {
                index.insert(*ext, category);
            }
        }
        index
    };
}

/// Filename-keyword routing rule. Rules are ordered; the first whose keyword
/// appears in the lowercased file stem wins.
#[derive(Debug)]
pub struct KeywordRule {
    pub keywords: &'static [&'static str],
    pub destination: &'static str,
    pub rationale: &'static str,
}

pub static KEYWORD_RULES: &[KeywordRule] = &[
    KeywordRule {
        keywords: &["cv", "resume", "linkedin", "outplacement"],
        destination: "Career",
        rationale: "contains career/CV keywords",
    },
    KeywordRule {
        keywords: &["esl", "english", "lesson", "student"],
        destination: "Teaching",
        rationale: "contains teaching keywords",
    },
    KeywordRule {
        keywords: &["coach", "session", "client"],
        destination: "Coaching",
        rationale: "contains coaching keywords",
    },
    KeywordRule {
        keywords: &["brand", "pitch", "logo"],
        destination: "Brand",
        rationale: "contains brand keywords",
    },
];

/// Code that no keyword rule claimed still gets routed away from the generic
/// category folder, into the working code tree.
pub const CODE_DESTINATION: &str = "Workspace";

#[derive(Debug)]
pub struct ClassificationResult {
    pub category: &'static Category,
    pub destination: String,
    pub rationale: String,
}

/// Pure extension lookup; anything unmapped lands in the Other catch-all.
/// The extension is matched case-insensitively and includes the leading dot.
pub fn classify(extension: &str) -> &'static Category {
    let ext = extension.to_ascii_lowercase();
    EXTENSION_INDEX.get(ext.as_str()).copied().unwrap_or(&OTHER)
}

pub fn classify_path(path: &Path) -> &'static Category {
    classify(&extension_of(path))
}

/// Category plus destination folder for an organize pass. With keyword
/// routing enabled the filename rules are consulted first (first match
/// wins); otherwise, and as the fallback, the category's generic folder is
/// the destination. Reads nothing but the file name.
pub fn classify_for_organize(path: &Path, keyword_routing: bool) -> ClassificationResult {
    let category = classify_path(path);

    if keyword_routing {
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().to_lowercase())
            .unwrap_or_default();

        for rule in KEYWORD_RULES {
            if rule.keywords.iter().any(|k| stem.contains(k)) {
                return ClassificationResult {
                    category,
                    destination: rule.destination.to_string(),
                    rationale: rule.rationale.to_string(),
                };
            }
        }

        if category.name == "Code" {
            return ClassificationResult {
                category,
                destination: CODE_DESTINATION.to_string(),
                rationale: "code file belongs in the workspace".to_string(),
            };
        }
    }

    ClassificationResult {
        category,
        destination: category.folder.to_string(),
        rationale: format!("extension maps to {}", category.name),
    }
}

fn extension_of(path: &Path) -> String {
    match path.extension() {
        Some(ext) => format!(".{}", ext.to_string_lossy().to_lowercase()),
        None => String::new(),
    }
}

/// Allow-list check shared by the extract and consolidate jobs. The list is
/// expected lowercase with leading dots; see `normalize_extensions`.
pub fn matches_extension(path: &Path, allow_list: &[String]) -> bool {
    let ext = extension_of(path);
    !ext.is_empty() && allow_list.iter().any(|allowed| allowed == &ext)
}

/// Lowercases and re-dots a configured extension list so user input like
/// "PY" or "py" still matches.
pub fn normalize_extensions(raw: &[String]) -> Vec<String> {
    raw.iter()
        .map(|ext| {
            let ext = ext.trim().to_lowercase();
            if ext.starts_with('.') {
                ext
            } else {
                format!(".{}", ext)
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn known_extensions_map_to_their_category() {
        assert_eq!(classify(".pdf").name, "Documents");
        assert_eq!(classify(".xlsx").name, "Spreadsheets");
        assert_eq!(classify(".py").name, "Code");
        assert_eq!(classify(".zip").name, "Archives");
    }

    #[test]
    fn extension_matching_is_case_insensitive() {
        assert_eq!(classify(".PDF").name, "Documents");
        assert_eq!(classify(".Jpg").name, "Images");
    }

    #[test]
    fn unmapped_extensions_fall_into_other() {
        assert_eq!(classify(".xyz").name, "Other");
        assert_eq!(classify("").name, "Other");
    }

    #[test]
    fn resume_routes_to_career_destination() {
        let result = classify_for_organize(&PathBuf::from("my_resume_2024.docx"), true);
        assert_eq!(result.category.name, "Documents");
        assert_eq!(result.destination, "Career");
        assert_eq!(result.rationale, "contains career/CV keywords");
    }

    #[test]
    fn first_matching_rule_wins() {
        // "resume" (career rule) and "client" (coaching rule) both match;
        // the career rule is listed first.
        let result = classify_for_organize(&PathBuf::from("resume_for_client.docx"), true);
        assert_eq!(result.destination, "Career");
    }

    #[test]
    fn code_without_keywords_routes_to_workspace() {
        let result = classify_for_organize(&PathBuf::from("deploy_tool.py"), true);
        assert_eq!(result.destination, CODE_DESTINATION);
    }

    #[test]
    fn no_keyword_match_falls_back_to_category_folder() {
        let result = classify_for_organize(&PathBuf::from("holiday_photo.jpg"), true);
        assert_eq!(result.destination, "Images");
    }

    #[test]
    fn routing_disabled_always_uses_category_folder() {
        let result = classify_for_organize(&PathBuf::from("my_resume_2024.docx"), false);
        assert_eq!(result.destination, "Documents");
    }

    #[test]
    fn allow_list_matching() {
        let exts = normalize_extensions(&["py".to_string(), ".TXT".to_string()]);
        assert!(matches_extension(&PathBuf::from("src/app.py"), &exts));
        assert!(matches_extension(&PathBuf::from("notes.txt"), &exts));
        assert!(!matches_extension(&PathBuf::from("image.png"), &exts));
        assert!(!matches_extension(&PathBuf::from("Makefile"), &exts));
    }
}
