use clap::Parser;
use std::path::PathBuf;
use storefront_e2e::{Config, Step};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(name = "storefront-e2e")]
#[command(about = "Run storefront end-to-end scenarios")]
#[command(version)]
struct Cli {
    /// Scenario file to run
    config: PathBuf,

    /// Run in headless mode (overrides config)
    #[arg(long)]
    headless: bool,

    /// Set a parameter (can be used multiple times)
    #[arg(short = 'P', long = "param", value_name = "KEY=VALUE")]
    params: Vec<String>,

    /// Verbose output (-v for info, -vv for debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Parse the scenario and print its plan instead of opening a browser
    #[arg(long)]
    check: bool,

    /// Quiet mode (only errors)
    #[arg(short, long)]
    quiet: bool,
}

#[tokio::main]
async fn main() -> storefront_e2e::Result<()> {
    let cli = Cli::parse();

    let level = if cli.quiet {
        Level::ERROR
    } else {
        match cli.verbose {
            0 => Level::WARN,
            1 => Level::INFO,
            _ => Level::DEBUG,
        }
    };

    FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .init();

    // CLI params first, then the environment (BASE_URL and friends)
    let params = storefront_e2e::Params::from_args(&cli.params)?.with_env();
    let mut config = Config::load_with_params(&cli.config, &params)?;

    if cli.check {
        print_plan(&config);
        return Ok(());
    }

    if cli.headless {
        config.browser.headless = true;
    }

    println!("{} against {}", config.name, config.storefront.base_url);

    let mut runner = storefront_e2e::Runner::launch(&config.browser).await?;
    let result = runner.run(&config).await?;

    println!();
    if result.success {
        println!("✓ Success");
    } else {
        println!("✗ Failed");
        if let Some(ref error) = result.error {
            println!("  Error: {}", error);
        }
        if let Some(ref observed) = result.observed {
            println!("  Prices seen: {}", observed);
        }
    }
    println!("  Steps: {}/{}", result.steps_executed, config.steps.len());
    println!("  Duration: {}ms", result.duration_ms);
    if result.retries > 0 {
        println!("  Retries: {}", result.retries);
    }

    runner.close().await?;

    if !result.success {
        std::process::exit(1);
    }

    Ok(())
}

/// What `--check` shows: the target store, each step in order and how a
/// failure would be handled.
fn print_plan(config: &Config) {
    println!("{} against {}", config.name, config.storefront.base_url);
    for (i, step) in config.steps.iter().enumerate() {
        match step {
            Step::SelectCategory(c) => println!("  {:>2}. {} {}", i + 1, step.name(), c.name),
            _ => println!("  {:>2}. {}", i + 1, step.name()),
        }
    }

    let mut names: Vec<_> = config.params.keys().collect();
    names.sort();
    for name in names {
        let def = &config.params[name];
        let tag = match (&def.default, def.required) {
            (Some(default), _) => format!("default {:?}", default),
            (None, true) => "required".to_string(),
            (None, false) => "optional".to_string(),
        };
        println!(
            "  ${{{}}} {}{}",
            name,
            tag,
            def.description
                .as_deref()
                .map(|d| format!(", {}", d))
                .unwrap_or_default()
        );
    }

    if let Some(on_failure) = &config.on_failure {
        if let Some(retry) = &on_failure.retry {
            println!(
                "  on failure: {} attempt(s), {}ms apart, each in a fresh session",
                retry.attempts, retry.delay_ms
            );
        }
        if let Some(path) = &on_failure.screenshot {
            println!("  on failure: screenshot to {}", path);
        }
    }
}
