use std::env;
use std::fs;
use std::path::PathBuf;

// Embeds the repository's config.toml as the built-in default layer.
fn main() {
    let manifest_dir =
        PathBuf::from(env::var("CARGO_MANIFEST_DIR").expect("CARGO_MANIFEST_DIR not set"));
    let config_path = manifest_dir.join("config.toml");
    println!("cargo:rerun-if-changed={}", config_path.display());

    let defaults = fs::read_to_string(&config_path).expect("Failed to read config.toml");

    let out_dir = PathBuf::from(env::var("OUT_DIR").expect("OUT_DIR not set"));
    fs::write(
        out_dir.join("default_config.rs"),
        format!("pub const DEFAULT_CONFIG: &str = r#\"{defaults}\"#;"),
    )
    .expect("Failed to write embedded default config");
}
