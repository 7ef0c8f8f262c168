use crate::CLAP_STYLING;
use clap::{arg, command};
use url::Url;

pub(crate) fn command_argument_builder() -> clap::Command {
    clap::Command::new("apiscout")
        .version(env!("CARGO_PKG_VERSION"))
        .bin_name("apiscout")
        .styles(CLAP_STYLING)
        .arg(arg!(-q --"quiet" "Suppress banner and non-essential output").required(false))
        .subcommand_required(false)
        .subcommand(
            command!("init")
                .about("Initializes the apiscout config directory and scan history database")
                .arg(
                    arg!([PATH])
                        .required(false)
                        .help("Location for the apiscout config directory")
                        .default_value("~/.config/apiscout/"),
                )
                .arg(
                    arg!(-f - -"force")
                        .help("Forces the overwriting of any existing database or config file")
                        .required(false),
                ),
        )
        .subcommand(
            command!("scan")
                .about(
                    "Crawl one or more bank developer portals and inventory the PSD2 APIs \
                they describe.",
                )
                .arg(
                    arg!(-u --"url" <URL>)
                        .required(false)
                        .help("The site URL to scan")
                        .value_parser(clap::value_parser!(Url))
                        .conflicts_with("hosts-file"),
                )
                .arg(
                    arg!(-H --"hosts-file" <PATH>)
                        .required(false)
                        .help("Path to a newline-delimited file of site URLs to scan")
                        .value_parser(clap::value_parser!(std::path::PathBuf))
                        .conflicts_with("url"),
                )
                .arg(
                    arg!(-c --"config" <PATH>)
                        .required(false)
                        .help("JSON scan configuration (urls, keywords, options)")
                        .value_parser(clap::value_parser!(std::path::PathBuf)),
                )
                .arg(
                    arg!(-d --"depth" <DEPTH>)
                        .required(false)
                        .help("Maximum link depth from each seed URL")
                        .value_parser(clap::value_parser!(usize)),
                )
                .arg(
                    arg!(-p --"max-pages" <PAGES>)
                        .required(false)
                        .help("Page budget per site")
                        .value_parser(clap::value_parser!(usize)),
                )
                .arg(
                    arg!(--"timeout" <SECONDS>)
                        .required(false)
                        .help("Per-request timeout in seconds")
                        .value_parser(clap::value_parser!(u64)),
                )
                .arg(
                    arg!(--"wait" <MILLIS>)
                        .required(false)
                        .help("Delay between page fetches in milliseconds")
                        .value_parser(clap::value_parser!(u64)),
                )
                .arg(
                    arg!(--"proxy" <PREFIX>)
                        .required(false)
                        .help("Fetch relay prefix tried after the direct request fails"),
                )
                .arg(
                    arg!(-o --"output" <PATH>)
                        .required(false)
                        .help("Save report to file (default: display to screen)")
                        .value_parser(clap::value_parser!(std::path::PathBuf)),
                )
                .arg(
                    arg!(-f --"format" <FORMAT>)
                        .required(false)
                        .help("Report format: text, json, csv")
                        .value_parser(["text", "json", "csv"])
                        .default_value("text"),
                )
                .arg(
                    arg!(--"inventory" <PATH>)
                        .required(false)
                        .help("Inventory JSON file to merge results into")
                        .value_parser(clap::value_parser!(std::path::PathBuf)),
                )
                .arg(
                    arg!(--"log-file" <PATH>)
                        .required(false)
                        .help("Write the scan log JSON to this path")
                        .value_parser(clap::value_parser!(std::path::PathBuf)),
                )
                .arg(
                    arg!(--"db" <PATH>)
                        .required(false)
                        .help("Record results in this scan history database")
                        .value_parser(clap::value_parser!(std::path::PathBuf)),
                ),
        )
        .subcommand(
            command!("export")
                .about("Export a stored API inventory as JSON or CSV")
                .arg(
                    arg!(--"db" <PATH>)
                        .required(false)
                        .help("Scan history database to export from")
                        .value_parser(clap::value_parser!(std::path::PathBuf))
                        .conflicts_with("inventory"),
                )
                .arg(
                    arg!(--"inventory" <PATH>)
                        .required(false)
                        .help("Inventory JSON file to export from")
                        .value_parser(clap::value_parser!(std::path::PathBuf))
                        .conflicts_with("db"),
                )
                .arg(
                    arg!(-f --"format" <FORMAT>)
                        .required(false)
                        .help("Export format: json, csv")
                        .value_parser(["json", "csv"])
                        .default_value("json"),
                )
                .arg(
                    arg!(-o --"output" <PATH>)
                        .required(true)
                        .help("File to write the export to")
                        .value_parser(clap::value_parser!(std::path::PathBuf)),
                ),
        )
}
