mod api;
mod app;
mod cli;
mod client;
mod config;
mod dashboard;
mod db;
mod domain;
mod logging;
mod reconcile;
mod store;
#[cfg(test)]
mod test_support;

fn main() {
    if let Err(err) = run() {
        eprintln!("error: {}", err);
        std::process::exit(1);
    }
}

fn print_json(value: &impl serde::Serialize) {
    println!(
        "{}",
        serde_json::to_string_pretty(value).expect("json serialization should work")
    );
}

fn run() -> Result<(), app::AppError> {
    use clap::Parser;
    use cli::Commands;

    let cli = cli::Cli::parse();
    let verbosity = match cli.command {
        Commands::Serve(_) => cli.verbose.saturating_add(1),
        _ => cli.verbose,
    };
    logging::init(verbosity);

    let config_path = cli.config.as_deref();
    let load_config = || config::FileConfig::load(config_path);

    match cli.command {
        Commands::Serve(args) => app::run_serve(&load_config()?, cli.db, &args)?,
        Commands::Dash(args) => app::run_dash(&load_config()?, &args)?,
        Commands::Ls(args) => {
            let persons = app::run_list(&load_config()?, &args)?;
            if args.json {
                print_json(&persons);
            } else {
                print!(
                    "{}",
                    dashboard::view::render_table(&persons, &dashboard::view::Palette::auto())
                );
            }
        }
        Commands::Completions(args) => {
            let mut cmd = cli::styled_command();
            clap_complete::generate(args.shell, &mut cmd, "roster", &mut std::io::stdout());
        }
    }

    Ok(())
}
