use crate::CLAP_STYLING;
use clap::{arg, command};

fn report_args(cmd: clap::Command) -> clap::Command {
    cmd.arg(
        arg!(-f --"format" <FORMAT>)
            .required(false)
            .help("Report format: text, json, markdown")
            .value_parser(["text", "json", "markdown", "md"])
            .default_value("text"),
    )
    .arg(
        arg!(-o --"output" <PATH>)
            .required(false)
            .help("Save report to file (default: display to screen)"),
    )
}

pub(crate) fn command_argument_builder() -> clap::Command {
    clap::Command::new("skein")
        .version(env!("CARGO_PKG_VERSION"))
        .bin_name("skein")
        .styles(CLAP_STYLING)
        .arg(arg!(-q --"quiet" "Suppress banner and non-essential output").global(true))
        .arg(arg!(-v --"verbose" "Log traversal decisions at debug level").global(true))
        .subcommand_required(false)
        .subcommand(report_args(
            command!("crawl")
                .about(
                    "Crawl outward from one or more roots, fetching every reachable node \
                once within the depth budget.",
                )
                .arg(
                    arg!(-r --"root" <ROOT>)
                        .required(false)
                        .help("The node to start from (a URL, or a node id with --graph)")
                        .conflicts_with("hosts-file"),
                )
                .arg(
                    arg!(-H --"hosts-file" <PATH>)
                        .required(false)
                        .help("Path to a newline-delimited file of roots to crawl")
                        .value_parser(clap::value_parser!(std::path::PathBuf))
                        .conflicts_with("root"),
                )
                .arg(
                    arg!(-d --"depth" <DEPTH>)
                        .required(false)
                        .help("Depth budget; 1 fetches only the root")
                        .value_parser(clap::value_parser!(usize))
                        .default_value("3"),
                )
                .arg(
                    arg!(-g --"graph" <PATH>)
                        .required(false)
                        .help("Crawl a JSON graph file instead of the network"),
                )
                .arg(
                    arg!(--"max-in-flight" <NUM_FETCHES>)
                        .required(false)
                        .help("Maximum concurrent fetches (0 = unbounded)")
                        .value_parser(clap::value_parser!(usize))
                        .default_value("0"),
                )
                .arg(
                    arg!(--"timeout" <SECONDS>)
                        .required(false)
                        .help("HTTP request timeout in seconds")
                        .value_parser(clap::value_parser!(u64).range(1..))
                        .default_value("10"),
                )
                .arg(
                    arg!(--"follow-external")
                        .required(false)
                        .help("Follow links that leave the page's host")
                        .action(clap::ArgAction::SetTrue)
                        .conflicts_with("graph"),
                ),
        ))
        .subcommand(report_args(
            command!("demo")
                .about("Crawl the built-in golang.org sample graph")
                .arg(
                    arg!(-d --"depth" <DEPTH>)
                        .required(false)
                        .help("Depth budget")
                        .value_parser(clap::value_parser!(usize))
                        .default_value("4"),
                ),
        ))
}
