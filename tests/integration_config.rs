//! Configuration loading and override precedence

use std::fs;
use tempfile::TempDir;
use vialy::cli::{Cli, Commands};
use vialy::Config;

fn temp_config_file(contents: &str) -> (TempDir, String) {
    let dir = TempDir::new().expect("failed to create tempdir");
    let path = dir.path().join("config.yaml");
    fs::write(&path, contents).expect("failed to write config file");
    (dir, path.to_string_lossy().to_string())
}

#[test]
fn test_load_from_file() {
    let (_dir, path) = temp_config_file(
        r#"
provider:
  type: ollama
retrieval:
  top_k: 7
"#,
    );

    let config = Config::load(&path, &Cli::default()).unwrap();
    assert_eq!(config.provider.provider_type, "ollama");
    assert_eq!(config.retrieval.top_k, 7);
    assert!(config.validate().is_ok());
}

#[test]
fn test_load_missing_file_uses_defaults() {
    let config = Config::load("/no/such/config.yaml", &Cli::default()).unwrap();
    assert_eq!(config.provider.provider_type, "gemini");
    assert!(config.validate().is_ok());
}

#[test]
fn test_load_invalid_yaml_is_error() {
    let (_dir, path) = temp_config_file("provider: [not: valid");
    assert!(Config::load(&path, &Cli::default()).is_err());
}

#[test]
fn test_cli_provider_override_wins_over_file() {
    let (_dir, path) = temp_config_file(
        r#"
provider:
  type: gemini
"#,
    );

    let cli = Cli {
        command: Commands::Ask {
            query: "pregunta".to_string(),
            owner: "u".to_string(),
            session: None,
            provider: Some("ollama".to_string()),
            fast: false,
        },
        ..Cli::default()
    };

    let config = Config::load(&path, &cli).unwrap();
    assert_eq!(config.provider.provider_type, "ollama");
}

#[test]
fn test_cli_fast_flag_enables_fast_mode() {
    let (_dir, path) = temp_config_file("{}");

    let cli = Cli {
        command: Commands::Chat {
            owner: "u".to_string(),
            session: None,
            provider: None,
            fast: true,
        },
        ..Cli::default()
    };

    let config = Config::load(&path, &cli).unwrap();
    assert!(config.pipeline.fast_mode);
}

#[test]
fn test_cli_storage_path_override() {
    let (_dir, path) = temp_config_file("{}");

    let cli = Cli {
        storage_path: Some("/tmp/elsewhere.db".to_string()),
        ..Cli::default()
    };

    let config = Config::load(&path, &cli).unwrap();
    assert_eq!(config.session.db_path.as_deref(), Some("/tmp/elsewhere.db"));
}
