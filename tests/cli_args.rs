//! Integration tests for command-line handling
//!
//! Runs the compiled binary for flags that exit before the server starts.

use std::process::Command;

/// Helper to run the binary with given args and a clean configuration environment
fn run_cli(args: &[&str]) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_profile-edge"))
        .args(args)
        .env_remove("GITHUB_TOKEN")
        .env_remove("CACHE_BACKEND")
        .env_remove("CORS_ALLOW_ORIGIN")
        .output()
        .expect("Failed to execute profile-edge")
}

#[test]
fn test_help_flag_exits_successfully() {
    let output = run_cli(&["--help"]);
    assert!(output.status.success(), "Expected --help to exit successfully");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("profile-edge"), "Help should mention the binary");
    assert!(stdout.contains("--github-token"), "Help should mention --github-token");
    assert!(stdout.contains("--cache-backend"), "Help should mention --cache-backend");
}

#[test]
fn test_version_flag_exits_successfully() {
    let output = run_cli(&["--version"]);
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_missing_token_prints_error_and_exits() {
    let output = run_cli(&[]);
    assert!(!output.status.success(), "Expected missing token to fail");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("github-token") || stderr.contains("GITHUB_TOKEN"),
        "Should name the missing token: {}",
        stderr
    );
}

#[test]
fn test_invalid_cache_backend_is_rejected() {
    let output = run_cli(&["--github-token", "t", "--cache-backend", "memcached"]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("memcached"), "Should echo the bad value: {}", stderr);
}

#[test]
fn test_blank_token_is_rejected_before_binding() {
    let output = run_cli(&["--github-token", "  ", "--cache-backend", "none"]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("GITHUB_TOKEN must not be empty"), "{}", stderr);
}

#[cfg(test)]
mod unit_tests {
    //! Unit tests for configuration parsing that don't require running the binary

    use clap::Parser;
    use profile_edge::cache::CacheBackend;
    use profile_edge::cli::{Cli, CliError, ServerConfig};

    #[test]
    fn test_cli_requires_token() {
        let result = Cli::try_parse_from(["profile-edge", "--github-token"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_memory_backend() {
        let cli = Cli::parse_from(["profile-edge", "--github-token", "t", "--cache-backend", "memory"]);
        assert_eq!(cli.cache_backend, CacheBackend::Memory);
    }

    #[test]
    fn test_server_config_keeps_custom_api_url() {
        let cli = Cli::parse_from([
            "profile-edge",
            "--github-token",
            "t",
            "--github-api-url",
            "http://127.0.0.1:9000",
        ]);
        let config = ServerConfig::from_cli(&cli).unwrap();
        assert_eq!(config.github_api_url, "http://127.0.0.1:9000");
    }

    #[test]
    fn test_server_config_custom_origin() {
        let cli = Cli::parse_from([
            "profile-edge",
            "--github-token",
            "t",
            "--allow-origin",
            "http://localhost:3000",
        ]);
        let config = ServerConfig::from_cli(&cli).unwrap();
        assert_eq!(config.allow_origin, "http://localhost:3000");
    }

    #[test]
    fn test_server_config_error_message() {
        let cli = Cli::parse_from(["profile-edge", "--github-token", ""]);
        let err = ServerConfig::from_cli(&cli).unwrap_err();
        assert!(matches!(err, CliError::EmptyToken));
        assert!(err.to_string().contains("GITHUB_TOKEN"));
    }
}
