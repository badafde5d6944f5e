#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
//! Browser boundary lint - keeps web bindings out of the behaviors.
//!
//! The behaviors in src/app/ only see the page through the traits in
//! src/host/mod.rs. That is what lets them run natively against the
//! in-memory host. Any direct use of the browser bindings belongs in
//! src/host/web.rs.
//!
//! Run with: cargo test --test browser_boundary_lint

use std::fs;
use std::path::Path;
use walkdir::WalkDir;

const BROWSER_CRATES: &[&str] = &["web_sys", "js_sys", "wasm_bindgen", "serde_wasm_bindgen"];

/// The only file allowed to touch the browser
const WEB_HOST: &str = "src/host/web.rs";

fn rust_sources() -> Vec<String> {
    WalkDir::new("src")
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.path().extension().is_some_and(|ext| ext == "rs"))
        .map(|e| e.path().to_string_lossy().replace('\\', "/"))
        .collect()
}

#[test]
fn browser_bindings_stay_in_web_host() {
    let mut violations = Vec::new();

    for path in rust_sources() {
        if path == WEB_HOST {
            continue;
        }
        let content = fs::read_to_string(&path).expect("read source file");
        for (line_no, line) in content.lines().enumerate() {
            let trimmed = line.trim();
            if trimmed.starts_with("//") {
                continue;
            }
            for krate in BROWSER_CRATES {
                if trimmed.contains(&format!("{}::", krate)) {
                    violations.push(format!("{}:{}: {}", path, line_no + 1, trimmed));
                }
            }
        }
    }

    assert!(
        violations.is_empty(),
        "\n\nBrowser bindings used outside {}:\n{}\n\n\
         Add a method to a host trait in src/host/mod.rs instead.\n",
        WEB_HOST,
        violations.join("\n")
    );
}

#[test]
fn web_host_is_wasm_only() {
    let host = fs::read_to_string("src/host/mod.rs").expect("read src/host/mod.rs");

    assert!(
        host.contains("#[cfg(target_arch = \"wasm32\")]\npub mod web;"),
        "src/host/mod.rs must gate `pub mod web` behind target_arch = \"wasm32\""
    );
}

#[test]
fn web_host_exists() {
    assert!(Path::new(WEB_HOST).exists(), "{} is missing", WEB_HOST);
}
