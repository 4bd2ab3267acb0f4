//! Argument definitions.

use clap::{Arg, ArgAction, Command};

pub fn build_cli() -> Command {
    let file = Arg::new("file")
        .help("Journey definition file (JSON)")
        .required(true);
    let step = Arg::new("step")
        .long("step")
        .help("Step path; defaults to the first step");

    Command::new("formwork")
        .about("Declarative form journey engine")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(
            Command::new("check")
                .about("Compile a journey and report diagnostics")
                .arg(file.clone()),
        )
        .subcommand(
            Command::new("graph")
                .about("Dump a step's dependency graph")
                .arg(file.clone())
                .arg(step.clone()),
        )
        .subcommand(
            Command::new("topo")
                .about("Print a step's topological evaluation order")
                .arg(file.clone())
                .arg(step.clone()),
        )
        .subcommand(
            Command::new("eval")
                .about("Evaluate a step against seeded answers")
                .arg(file)
                .arg(step)
                .arg(
                    Arg::new("answer")
                        .long("answer")
                        .action(ArgAction::Append)
                        .value_name("CODE=VALUE")
                        .help("Seed an answer; VALUE parses as JSON, else as a string"),
                ),
        )
}
