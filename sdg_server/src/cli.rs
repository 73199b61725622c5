use std::{env, env::VarError};

/// The server takes no arguments. Any argument at all prints the help text and the current configuration.
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
    // Hash keys and IVs are deliberately left off this list
    const DISPLAY_ENVS: [&str; 14] = [
        "RUST_LOG",
        "SDG_HOST",
        "SDG_PORT",
        "SDG_DATABASE_URL",
        "SDG_BASE_URL",
        "SDG_ECPAY_MERCHANT_ID",
        "SDG_ECPAY_ACTION_URL",
        "SDG_OPAY_MERCHANT_ID",
        "SDG_OPAY_ACTION_URL",
        "SDG_TRADE_TZ_OFFSET_HOURS",
        "SDG_USE_X_FORWARDED_FOR",
        "SDG_USE_FORWARDED",
        "SDG_ALERT_BUFFER_SIZE",
        "SDG_KEEP_ALIVE_SECS",
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
