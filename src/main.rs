//! bosprobe - BOS upload/download diagnosis

use bosprobe::{app::App, cli::{sanitize_command_line, Cli}, registry};
use clap::Parser;
use std::process;

/// Exit code after Ctrl+C
const EXIT_INTERRUPTED: i32 = 130;

#[tokio::main]
async fn main() {
    // Set up better panic handling
    std::panic::set_hook(Box::new(|panic_info| {
        registry::cleanup_all();
        eprintln!("Application panic: {}", panic_info);
        process::exit(1);
    }));

    let args: Vec<String> = std::env::args().collect();
    let command_line = sanitize_command_line(&args);
    let cli = Cli::parse();
    let use_color = cli.use_colors();

    let app = match App::new(cli) {
        Ok(app) => app,
        Err(e) => {
            eprintln!("{}", e.format_for_console(use_color));
            process::exit(e.exit_code());
        }
    };

    let code = tokio::select! {
        result = app.run(&command_line) => match result {
            Ok(code) => code,
            Err(e) => {
                eprintln!("{}", e.format_for_console(use_color));
                e.exit_code()
            }
        },
        Ok(()) = tokio::signal::ctrl_c() => {
            let released = registry::cleanup_all();
            eprintln!("\nInterrupted, released {} resource(s)", released);
            EXIT_INTERRUPTED
        }
    };

    process::exit(code);
}
