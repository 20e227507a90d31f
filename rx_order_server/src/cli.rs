use std::{env, env::VarError};

/// There's no real CLI for the server. Any argument prints the help text and the current configuration.
pub fn handle_command_line_args() -> bool {
    let has_cli_args = env::args().count() > 1;
    if has_cli_args {
        display_readme();
        display_envs();
    }
    has_cli_args
}

fn display_readme() {
    const README: &str = include_str!("./cli-help.txt");
    println!("\n{README}\n");
}

fn display_envs() {
    // Be explicit about which envars to print, so as to avoid accidentally exposing secrets
    const DISPLAY_ENVS: [&str; 20] = [
        "RUST_LOG",
        "RXO_HOST",
        "RXO_PORT",
        "RXO_DATABASE_URL",
        "RXO_DB_MAX_CONNECTIONS",
        "RXO_BOOKING_URL",
        "RXO_BOOKING_USER_AGENT",
        "RXO_BOOKING_TIMEOUT",
        "RXO_STATE_NEW",
        "RXO_STATE_CONFIRMED",
        "RXO_STATE_COMPLETED",
        "RXO_STATE_CANCELED",
        "RXO_POLL_INTERVAL",
        "RXO_POLL_CONCURRENCY",
        "RXO_REMINDER_INTERVAL",
        "RXO_REMINDER_THRESHOLD",
        "RXO_NOTIFIER_URL",
        "RXO_PUSH_MAX_ATTEMPTS",
        "RXO_PUSH_INITIAL_BACKOFF_MS",
        "RXO_PUSH_MAX_BACKOFF_MS",
    ];

    println!("Current environment values (EXCLUDING variables that contain secrets):");
    DISPLAY_ENVS.iter().for_each(|&name| {
        let val = match env::var(name) {
            Ok(s) => s,
            Err(VarError::NotPresent) => "Not set".into(),
            Err(VarError::NotUnicode(s)) => format!("Invalid value: {}", s.to_string_lossy()),
        };
        println!("  {name:<35} {val:<15}");
    })
}
