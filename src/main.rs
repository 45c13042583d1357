use clap::Parser;
use todo_lanes::cli::commands::Cli;
use todo_lanes::io::config_io::read_config;
use todo_lanes::logging;

fn main() {
    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let root = cli
        .root()
        .ok_or("cannot locate the home directory, pass --dir")?;
    let config = read_config(&root)?;

    let env_filter = std::env::var("RUST_LOG").ok();
    let configured = cli.log_level.as_deref().or(config.log.level.as_deref());
    let directive = logging::filter_directive(env_filter.as_deref(), configured);
    logging::init(&root, directive.as_deref())?;

    todo_lanes::tui::run(&root, cli.mode.as_deref(), &config)?;
    Ok(())
}
