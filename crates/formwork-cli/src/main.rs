mod cli;
mod commands;

use clap::ArgMatches;
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let matches = cli::build_cli().get_matches();
    let result = match matches.subcommand() {
        Some(("check", m)) => commands::check::run(file(m)),
        Some(("graph", m)) => commands::graph::run(file(m), step(m)),
        Some(("topo", m)) => commands::topo::run(file(m), step(m)),
        Some(("eval", m)) => {
            let answers = m
                .get_many::<String>("answer")
                .map(|values| values.cloned().collect())
                .unwrap_or_default();
            commands::eval::run(file(m), step(m), answers)
        }
        _ => unreachable!("clap should have caught this"),
    };

    if let Err(err) = result {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}

fn file(matches: &ArgMatches) -> &str {
    matches
        .get_one::<String>("file")
        .expect("required argument")
        .as_str()
}

fn step(matches: &ArgMatches) -> Option<&str> {
    matches.get_one::<String>("step").map(String::as_str)
}
