use apiscout_core::config::ScanConfig;
use apiscout_core::data::Database;
use apiscout_core::discover::{execute_discovery, DiscoveryOptions, DiscoveryOutcome};
use apiscout_core::inventory::Inventory;
use apiscout_core::report::{
    generate_csv_export, generate_json_export, generate_json_report, generate_text_report,
    save_report, ReportFormat,
};
use apiscout_scanner::FetchStrategy;
use clap::ArgMatches;
use colored::Colorize;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use url::Url;

const DEFAULT_DB_NAME: &str = "apiscout.db";
const DEFAULT_CONFIG_NAME: &str = "scan_config.json";

// Helper functions for the scan handler

/// Load URLs from either a file or a single URL argument
pub fn load_urls_from_source(
    url: Option<&Url>,
    hosts_file: Option<&PathBuf>,
) -> Result<Vec<String>, String> {
    if let Some(hosts_file_path) = hosts_file {
        load_urls_from_file(hosts_file_path)
    } else if let Some(url) = url {
        Ok(vec![url.as_str().to_string()])
    } else {
        Err("Either --url, --hosts-file or --config must be provided".to_string())
    }
}

/// Load and parse URLs from a file
pub fn load_urls_from_file(path: &PathBuf) -> Result<Vec<String>, String> {
    let content = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read hosts file {}: {}", path.display(), e))?;

    let urls: Vec<String> = content
        .lines()
        .filter(|line| !line.trim().is_empty())
        .filter_map(|line| parse_url_line(line.trim()))
        .collect();

    if urls.is_empty() {
        return Err(format!("No valid URLs found in {}", path.display()));
    }

    Ok(urls)
}

/// Parse a single line as a URL, trying to add https:// if needed
pub fn parse_url_line(line: &str) -> Option<String> {
    // Try to parse as-is
    if Url::parse(line).is_ok() {
        return Some(line.to_string());
    }

    // Bank portals live behind TLS; default to https
    let with_scheme = format!("https://{}", line);
    if Url::parse(&with_scheme).is_ok() {
        return Some(with_scheme);
    }

    eprintln!("[!] Skipping invalid URL '{}'", line);
    None
}

fn print_divider() {
    println!("{}", "═".repeat(60).bright_blue().bold());
}

fn print_prompt(msg: &str) -> String {
    print!("{} ", msg.bright_cyan().bold());
    io::stdout().flush().unwrap();
    let mut response = String::new();
    io::stdin().read_line(&mut response).unwrap();
    response.trim().to_lowercase()
}

pub fn handle_init(args: &ArgMatches) {
    print_divider();
    println!("{}", "  APISCOUT INITIALIZATION".bright_white().bold());
    print_divider();
    println!();

    let config_dir = args.get_one::<String>("PATH").unwrap();
    let force = args.get_flag("force");
    let expanded_config_dir = shellexpand::tilde(config_dir);
    let config_dir = Path::new(expanded_config_dir.as_ref());
    let db_path = config_dir.join(DEFAULT_DB_NAME);
    let config_path = config_dir.join(DEFAULT_CONFIG_NAME);

    println!(
        "{} Target: {}",
        "→".blue(),
        config_dir.display().to_string().bright_white()
    );
    println!();

    if (db_path.exists() || config_path.exists()) && !force {
        println!("{}", "⚠ WARNING".yellow().bold());
        println!("An apiscout installation already exists:");
        if config_path.exists() {
            println!(
                "  {} {}",
                "•".yellow(),
                config_path.display().to_string().bright_white()
            );
        }
        if db_path.exists() {
            println!(
                "  {} {}",
                "•".yellow(),
                db_path.display().to_string().bright_white()
            );
        }
        println!();

        let response = print_prompt("Overwrite existing files? [y/N]:");
        println!();

        if response != "y" && response != "yes" {
            println!("{} Initialization cancelled.", "✗".red().bold());
            return;
        }
    }

    fs::create_dir_all(config_dir).expect("Failed to create config directory");
    println!(
        "{} Config directory: {}",
        "✓".green().bold(),
        config_dir.display().to_string().bright_white()
    );

    // A template config the user can fill their seed URLs into
    let template = ScanConfig::default();
    template
        .save(&config_path)
        .expect("Failed to write config template");
    println!(
        "{} Config template: {}",
        "✓".green().bold(),
        config_path.display().to_string().bright_white()
    );

    if Database::exists(&db_path) {
        Database::drop(&db_path);
        println!("{} Existing database removed", "→".yellow().bold());
    }
    Database::new(&db_path).expect("Failed to create database");
    println!(
        "{} Database: {}",
        "✓".green().bold(),
        db_path.display().to_string().bright_white()
    );

    println!();
    print_divider();
    println!("{}", "  INITIALIZATION COMPLETE".green().bold());
    print_divider();
    println!();
}

pub async fn handle_scan(sub_matches: &ArgMatches) {
    // Initialize tracing for logging
    tracing_subscriber::fmt::init();

    let url = sub_matches.get_one::<Url>("url");
    let hosts_file = sub_matches.get_one::<PathBuf>("hosts-file");
    let config_file = sub_matches.get_one::<PathBuf>("config");

    let config = match config_file {
        Some(path) => match ScanConfig::load(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("✗ {}", e);
                std::process::exit(1);
            }
        },
        None => ScanConfig::default(),
    };

    // CLI sources win over config file URLs
    let urls = if url.is_some() || hosts_file.is_some() {
        match load_urls_from_source(url, hosts_file) {
            Ok(urls) => urls,
            Err(e) => {
                eprintln!("✗ {}", e);
                std::process::exit(1);
            }
        }
    } else if !config.urls.is_empty() {
        config
            .urls
            .iter()
            .filter_map(|line| parse_url_line(line.trim()))
            .collect()
    } else {
        eprintln!("✗ No URLs to scan: pass --url, --hosts-file or a config with urls");
        std::process::exit(1);
    };

    // Explicit flags override config options
    let max_depth = *sub_matches
        .get_one::<usize>("depth")
        .unwrap_or(&config.options.max_depth);
    let max_pages = *sub_matches
        .get_one::<usize>("max-pages")
        .unwrap_or(&config.options.max_pages_per_site);
    let timeout_secs = *sub_matches
        .get_one::<u64>("timeout")
        .unwrap_or(&config.options.timeout);
    let wait_ms = *sub_matches
        .get_one::<u64>("wait")
        .unwrap_or(&config.options.wait_time);

    let mut fetch_strategies = vec![FetchStrategy::Direct];
    if let Some(prefix) = sub_matches.get_one::<String>("proxy") {
        fetch_strategies.push(FetchStrategy::Proxy(prefix.clone()));
    }

    println!("\n🔎 Scanning {} site(s)", urls.len());
    println!("Max depth: {}", max_depth);
    println!("Max pages per site: {}", max_pages);
    println!("Timeout: {}s\n", timeout_secs);

    let options = DiscoveryOptions {
        urls,
        max_depth,
        max_pages,
        timeout_secs,
        wait_ms,
        extra_keywords: config.keywords.clone(),
        fetch_strategies,
        show_progress_bars: true,
    };

    let progress_callback = Arc::new(|msg: String| {
        println!("{}", msg);
    });

    let DiscoveryOutcome { report, log } =
        match execute_discovery(options, Some(progress_callback), None).await {
            Ok(outcome) => outcome,
            Err(e) => {
                eprintln!("✗ Scan failed: {}", e);
                std::process::exit(1);
            }
        };

    println!("\n✓ Scan complete: {} APIs found\n", report.total_apis_found);

    // Merge into the inventory file when one was requested
    if let Some(inventory_path) = sub_matches.get_one::<PathBuf>("inventory") {
        let mut inventory = if inventory_path.exists() {
            match Inventory::load(inventory_path) {
                Ok(inventory) => inventory,
                Err(e) => {
                    eprintln!("✗ Failed to load inventory: {}", e);
                    std::process::exit(1);
                }
            }
        } else {
            Inventory::new()
        };
        inventory.absorb(report.scan_results.clone(), report.apis.clone());
        if let Err(e) = inventory.save(inventory_path) {
            eprintln!("✗ Failed to save inventory: {}", e);
            std::process::exit(1);
        }
        println!(
            "✓ Inventory updated: {} ({} APIs)",
            inventory_path.display(),
            inventory.total_apis
        );
    }

    if let Some(log_path) = sub_matches.get_one::<PathBuf>("log-file") {
        if let Err(e) = log.save(log_path) {
            eprintln!("✗ Failed to save scan log: {}", e);
        } else {
            println!("✓ Scan log written: {}", log_path.display());
        }
    }

    if let Some(db_path) = sub_matches.get_one::<PathBuf>("db") {
        record_scan_history(db_path, &report);
    }

    let format = sub_matches
        .get_one::<String>("format")
        .and_then(|f| ReportFormat::from_str(f))
        .unwrap_or(ReportFormat::Text);

    let rendered = match format {
        ReportFormat::Text => generate_text_report(&report),
        ReportFormat::Json => match generate_json_report(&report) {
            Ok(json) => json,
            Err(e) => {
                eprintln!("✗ Failed to render JSON report: {}", e);
                std::process::exit(1);
            }
        },
        ReportFormat::Csv => generate_csv_export(&report.apis),
    };

    match sub_matches.get_one::<PathBuf>("output") {
        Some(path) => {
            if let Err(e) = save_report(&rendered, path) {
                eprintln!("✗ Failed to save report: {}", e);
                std::process::exit(1);
            }
            println!("✓ Report saved: {}", path.display());
        }
        None => print!("{}", rendered),
    }
}

fn record_scan_history(db_path: &Path, report: &apiscout_core::discover::DiscoveryReport) {
    let db = match Database::new(db_path) {
        Ok(db) => db,
        Err(e) => {
            eprintln!("✗ Failed to open database {}: {}", db_path.display(), e);
            return;
        }
    };

    let seed_urls: Vec<&str> = report.scan_results.iter().map(|r| r.url.as_str()).collect();
    let seed_json = serde_json::to_string(&seed_urls).unwrap_or_else(|_| "[]".to_string());

    let session = match db.create_session(&seed_json) {
        Ok(session) => session,
        Err(e) => {
            eprintln!("✗ Failed to create scan session: {}", e);
            return;
        }
    };

    let mut failed = false;
    for result in &report.scan_results {
        if let Err(e) = db.insert_site_scan(&session, result) {
            eprintln!("✗ Failed to record site scan: {}", e);
            failed = true;
        }
    }
    for record in &report.apis {
        if let Err(e) = db.upsert_record(&session, record) {
            eprintln!("✗ Failed to record API: {}", e);
            failed = true;
        }
    }

    let finish = if failed {
        db.fail_session(&session)
    } else {
        db.complete_session(&session)
    };
    if let Err(e) = finish {
        eprintln!("✗ Failed to close scan session: {}", e);
        return;
    }

    println!("✓ Scan history recorded: {}", db_path.display());
}

pub fn handle_export(sub_matches: &ArgMatches) {
    let db_path = sub_matches.get_one::<PathBuf>("db");
    let inventory_path = sub_matches.get_one::<PathBuf>("inventory");
    let output = sub_matches.get_one::<PathBuf>("output").unwrap();

    let records = if let Some(db_path) = db_path {
        if !Database::exists(db_path) {
            eprintln!("✗ No database at {}", db_path.display());
            std::process::exit(1);
        }
        match Database::new(db_path).and_then(|db| db.get_records()) {
            Ok(records) => records,
            Err(e) => {
                eprintln!("✗ Failed to read database: {}", e);
                std::process::exit(1);
            }
        }
    } else if let Some(inventory_path) = inventory_path {
        match Inventory::load(inventory_path) {
            Ok(inventory) => inventory.apis,
            Err(e) => {
                eprintln!("✗ Failed to load inventory: {}", e);
                std::process::exit(1);
            }
        }
    } else {
        eprintln!("✗ Either --db or --inventory must be provided");
        std::process::exit(1);
    };

    let format = sub_matches
        .get_one::<String>("format")
        .and_then(|f| ReportFormat::from_str(f))
        .unwrap_or(ReportFormat::Json);

    let rendered = match format {
        ReportFormat::Csv => generate_csv_export(&records),
        _ => match generate_json_export(&records) {
            Ok(json) => json,
            Err(e) => {
                eprintln!("✗ Failed to render export: {}", e);
                std::process::exit(1);
            }
        },
    };

    if let Err(e) = save_report(&rendered, output) {
        eprintln!("✗ Failed to write export: {}", e);
        std::process::exit(1);
    }

    println!(
        "✓ Exported {} record(s) to {}",
        records.len(),
        output.display()
    );
}
