//! Effective configuration view: `ccask config`.

use anyhow::Result;
use console::style;

use ccask::config::Config;
use ccask::telemetry::WORKER_LOG_FILE_NAME;

pub fn cmd_config(config: &Config) -> Result<()> {
    println!();
    println!("{}", style("ccask Configuration").bold());
    println!("===================");
    println!();

    let config_path = config.config_path();
    if config.from_file {
        println!("Config file: {}", config_path.display());
    } else {
        println!("No config.toml found at {}", config_path.display());
        println!("Using defaults with environment overrides.");
    }
    println!();

    println!("Effective values:");
    println!("  data_dir        = \"{}\"", config.data_dir.display());
    println!("  store_file      = \"{}\"", config.store_file.display());
    println!("  answers_dir     = \"{}\"", config.answers_dir.display());
    println!("  generator_cmd   = \"{}\"", config.generator_cmd);
    println!("  worker_cmd      = \"{}\"", config.worker_cmd.display());
    println!("  prompt_template = {:?}", config.prompt_template);
    println!();
    println!("Logs:");
    println!("  diagnostics     = \"{}\"", config.log_file.display());
    println!(
        "  worker          = \"{}\"",
        config.worker_log_dir.join(WORKER_LOG_FILE_NAME).display()
    );
    println!();
    Ok(())
}
