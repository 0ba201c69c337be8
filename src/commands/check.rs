//! Check command implementation.
//!
//! Verifies that /proc can be read and the effective config is valid.

use std::fs;

use stressmon::config::{validate_effective_config, Config};
use stressmon::process::{collect_proc_entries, read_status};
use stressmon::system::ProcRoot;

/// Validates system requirements and configuration
pub fn command_check(config: &Config) -> anyhow::Result<bool> {
    println!("stressmon - System Check");
    println!("========================");

    let root = ProcRoot::default();
    let mut all_ok = true;

    println!("\nChecking /proc filesystem...");
    if !root.path().exists() {
        println!("   [FAIL] /proc filesystem not found");
        all_ok = false;
    } else {
        println!("   [OK]   /proc filesystem accessible");

        match root.read_cpu_stat() {
            Ok(_) => println!("   [OK]   /proc/stat readable"),
            Err(e) => {
                println!("   [FAIL] {}", e);
                all_ok = false;
            }
        }
        match root.read_memory_info() {
            Ok(mem) => println!("   [OK]   memory total {} MB", mem.total_bytes / 1024 / 1024),
            Err(e) => {
                println!("   [FAIL] {}", e);
                all_ok = false;
            }
        }

        let entries = collect_proc_entries(&root);
        if entries.is_empty() {
            println!("   [FAIL] Cannot read any process entries from /proc");
            all_ok = false;
        } else {
            println!("   [OK]   Can read {} process entries", entries.len());
        }

        let own = root.join(std::process::id().to_string());
        match read_status(&own) {
            Ok(status) => println!("   [OK]   own status readable (RSS {} KB)", status.rss_bytes / 1024),
            Err(e) => {
                println!("   [FAIL] own status unreadable: {}", e);
                all_ok = false;
            }
        }
    }

    println!("\nChecking configuration...");
    match validate_effective_config(config) {
        Ok(()) => {
            let sample = config.sample_config();
            println!("   [OK]   Configuration is valid");
            println!(
                "          cpu>{}% mem>{}% samples={} interval={}s top_n={}",
                sample.cpu_threshold,
                sample.mem_threshold,
                sample.samples,
                sample.interval_sec,
                config.top_n()
            );
        }
        Err(e) => {
            println!("   [FAIL] Configuration invalid: {}", e);
            all_ok = false;
        }
    }

    println!("\nChecking report directory...");
    let dir = config.report_dir();
    match fs::metadata(&dir) {
        Ok(meta) if meta.permissions().readonly() => {
            println!("   [FAIL] {} is read-only", dir.display());
            all_ok = false;
        }
        Ok(_) => println!("   [OK]   {} exists", dir.display()),
        Err(_) => println!("   [OK]   {} will be created on first run", dir.display()),
    }

    println!("\nSummary:");
    if all_ok {
        println!("   All checks passed - system is ready");
    } else {
        println!("   Some checks failed - please review the output above");
    }
    Ok(all_ok)
}
