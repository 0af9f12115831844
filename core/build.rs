use std::collections::HashSet;
use std::env;
use std::fmt::Write;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

#[derive(Deserialize)]
struct CatalogFile {
    sections: Vec<SectionEntry>,
}

#[derive(Deserialize)]
struct SectionEntry {
    id: String,
    title: String,
    directory: String,
    #[serde(default)]
    fallback: Vec<String>,
}

fn main() {
    let manifest_dir = PathBuf::from(env::var("CARGO_MANIFEST_DIR").expect("missing CARGO_MANIFEST_DIR"));
    let workspace_root = manifest_dir.parent().unwrap_or(&manifest_dir);
    let env_path = workspace_root.join(".env");
    let env_local_path = workspace_root.join(".env.local");

    let _ = dotenvy::from_filename(&env_local_path);
    let _ = dotenvy::from_filename(&env_path);

    println!("cargo:rerun-if-env-changed=FOLIO_SECTIONS_PATH");
    println!("cargo:rerun-if-changed={}", env_path.display());
    println!("cargo:rerun-if-changed={}", env_local_path.display());

    let catalog_path = resolve_catalog_path(workspace_root);
    println!("cargo:rerun-if-changed={}", catalog_path.display());

    let contents = fs::read_to_string(&catalog_path).unwrap_or_else(|err| {
        panic!(
            "failed to read section catalog at {}: {err}",
            catalog_path.display()
        )
    });

    let catalog: CatalogFile = toml::from_str(&contents).unwrap_or_else(|err| {
        panic!(
            "failed to parse section catalog at {}: {err}",
            catalog_path.display()
        )
    });

    if catalog.sections.is_empty() {
        panic!("section catalog {} has no entries", catalog_path.display());
    }

    validate_entries(&catalog.sections, &catalog_path);

    let mut output = String::new();
    writeln!(&mut output, "pub const SECTIONS: &[SectionConfig] = &[").unwrap();
    for entry in &catalog.sections {
        writeln!(&mut output, "    SectionConfig {{").unwrap();
        writeln!(&mut output, "        id: {},", rust_string(entry.id.trim())).unwrap();
        writeln!(&mut output, "        title: {},", rust_string(entry.title.trim())).unwrap();
        writeln!(
            &mut output,
            "        directory: {},",
            rust_string(normalize_directory(&entry.directory))
        )
        .unwrap();
        writeln!(&mut output, "    }},").unwrap();
    }
    writeln!(&mut output, "];").unwrap();
    writeln!(&mut output).unwrap();

    writeln!(
        &mut output,
        "pub const FALLBACK_LISTINGS: &[FallbackListing] = &["
    )
    .unwrap();
    for entry in catalog.sections.iter().filter(|entry| !entry.fallback.is_empty()) {
        let files = entry
            .fallback
            .iter()
            .map(|file| rust_string(file.trim()))
            .collect::<Vec<_>>()
            .join(", ");
        writeln!(&mut output, "    FallbackListing {{").unwrap();
        writeln!(
            &mut output,
            "        directory: {},",
            rust_string(normalize_directory(&entry.directory))
        )
        .unwrap();
        writeln!(&mut output, "        files: &[{files}],").unwrap();
        writeln!(&mut output, "    }},").unwrap();
    }
    writeln!(&mut output, "];").unwrap();

    let out_dir = PathBuf::from(env::var("OUT_DIR").expect("missing OUT_DIR"));
    let out_path = out_dir.join("section_catalog.rs");
    fs::write(&out_path, output).unwrap_or_else(|err| {
        panic!("failed to write {}: {err}", out_path.display())
    });
}

fn resolve_catalog_path(workspace_root: &Path) -> PathBuf {
    let env_value = env::var("FOLIO_SECTIONS_PATH").ok();
    let raw_path = match env_value {
        Some(value) if !value.trim().is_empty() => PathBuf::from(value),
        _ => workspace_root.join("content/sections.toml"),
    };
    if raw_path.is_relative() {
        workspace_root.join(raw_path)
    } else {
        raw_path
    }
}

fn rust_string(value: &str) -> String {
    format!("{:?}", value)
}

fn normalize_directory(value: &str) -> &str {
    value.trim().trim_end_matches('/')
}

fn validate_entries(entries: &[SectionEntry], catalog_path: &Path) {
    let mut ids = HashSet::new();
    let mut directories = HashSet::new();

    for entry in entries {
        if entry.id.trim().is_empty() {
            panic!("section id cannot be empty in {}", catalog_path.display());
        }
        if entry.title.trim().is_empty() {
            panic!(
                "section '{}' title cannot be empty in {}",
                entry.id,
                catalog_path.display()
            );
        }
        let directory = normalize_directory(&entry.directory);
        if directory.is_empty() {
            panic!(
                "section '{}' directory cannot be empty in {}",
                entry.id,
                catalog_path.display()
            );
        }
        if directory.starts_with("http://") || directory.starts_with("https://") {
            panic!(
                "section '{}' directory cannot be a URL in {}",
                entry.id,
                catalog_path.display()
            );
        }
        for file in &entry.fallback {
            let file = file.trim();
            if file.is_empty() || file.starts_with('/') || file.contains("://") {
                panic!(
                    "section '{}' has invalid fallback file '{}' in {}",
                    entry.id,
                    file,
                    catalog_path.display()
                );
            }
            if !file.ends_with(".html") {
                panic!(
                    "section '{}' fallback file '{}' must be an .html fragment in {}",
                    entry.id,
                    file,
                    catalog_path.display()
                );
            }
        }
        if !ids.insert(entry.id.trim().to_string()) {
            panic!(
                "duplicate section id '{}' in {}",
                entry.id,
                catalog_path.display()
            );
        }
        if !directories.insert(directory.to_string()) {
            panic!(
                "duplicate section directory '{}' in {}",
                directory,
                catalog_path.display()
            );
        }
    }
}
