//! Build script for storefront crate.
//!
//! Computes a content hash of the stylesheet so templates can cache-bust it
//! with a query string.

use std::env;
use std::fs;
use std::path::Path;

use sha2::{Digest, Sha256};

fn main() {
    hash_css();
}

/// Hash main.css.
///
/// Sets `CSS_HASH` environment variable for use with `env!("CSS_HASH")`.
fn hash_css() {
    let manifest_dir =
        env::var("CARGO_MANIFEST_DIR").expect("CARGO_MANIFEST_DIR must be set by Cargo");
    let css_path = Path::new(&manifest_dir).join("static/css/main.css");

    // Tell Cargo to rerun if main.css changes
    println!("cargo:rerun-if-changed={}", css_path.display());

    let content = match fs::read(&css_path) {
        Ok(content) => content,
        Err(e) => {
            println!("cargo:warning=Could not read main.css: {e}");
            println!("cargo:rustc-env=CSS_HASH=");
            return;
        }
    };

    // First 8 hex chars of SHA256
    let hash = format!("{:x}", Sha256::digest(&content));
    let short_hash = hash.get(..8).unwrap_or(&hash);

    println!("cargo:rustc-env=CSS_HASH={short_hash}");
}
