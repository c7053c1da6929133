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
    // Secrets are never printed
    const DISPLAY_ENVS: [&str; 9] = [
        "RUST_LOG",
        "HOOD_HOST",
        "HOOD_PORT",
        "HOOD_DATABASE_URL",
        "HOOD_JWT_EXPIRY_DAYS",
        "HOOD_SEED_ON_STARTUP",
        "RAZORPAY_KEY_ID",
        "RAZORPAY_API_URL",
        "RAZORPAY_TIMEOUT_SECS",
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
