//! Generate testdata command implementation.
//!
//! Generates synthetic replay frames for `--test-data-file`.

use anyhow::Context;
use chrono::Utc;
use rand::Rng;
use std::fs;
use std::path::PathBuf;
use tracing::debug;

use stressmon::source::{SystemReading, TestData, TestFrame, TestProcess};

const NAMES: &[&str] = &[
    "chrome", "code", "slack", "teams", "zoom", "firefox", "node", "python3", "java",
    "postgres", "dockerd", "rust-analyzer", "spotify", "steam", "obs", "gnome-shell",
];

const USERS: &[&str] = &["root", "alice", "bob"];

/// Load shape of one synthetic process across all frames.
#[derive(Debug, Clone, Copy)]
enum Profile {
    Idle,
    SteadyCpu,
    SpikyCpu,
    MemoryHog,
}

#[derive(Debug, Clone)]
struct Template {
    pid: u32,
    name: String,
    user: String,
    profile: Profile,
    base_mem: f64,
}

fn pick_profile(rng: &mut impl Rng) -> Profile {
    match rng.gen_range(0..10) {
        0 => Profile::SteadyCpu,
        1 | 2 => Profile::SpikyCpu,
        3 => Profile::MemoryHog,
        _ => Profile::Idle,
    }
}

fn generate_process(rng: &mut impl Rng, template: &Template) -> TestProcess {
    let cpu_percent: f64 = match template.profile {
        Profile::Idle => rng.gen_range(0.0..3.0),
        Profile::SteadyCpu => rng.gen_range(60.0..95.0),
        Profile::SpikyCpu => {
            if rng.gen_bool(0.3) {
                rng.gen_range(55.0..90.0)
            } else {
                rng.gen_range(1.0..15.0)
            }
        }
        Profile::MemoryHog => rng.gen_range(2.0..20.0),
    };
    let mem_percent = (template.base_mem + rng.gen_range(-0.5..0.5)).max(0.0);

    TestProcess {
        pid: template.pid,
        name: Some(template.name.clone()),
        user: Some(template.user.clone()),
        cpu_percent,
        mem_percent,
        unreadable: template.user == "root" && rng.gen_bool(0.1),
    }
}

/// Builds `frames` ticks of `processes` synthetic processes each.
pub fn generate_test_data(rng: &mut impl Rng, frames: usize, processes: usize) -> TestData {
    let templates: Vec<Template> = (0..processes)
        .map(|i| {
            let profile = pick_profile(rng);
            let base_mem = match profile {
                Profile::MemoryHog => rng.gen_range(12.0..30.0),
                _ => rng.gen_range(0.1..4.0),
            };
            Template {
                pid: 1000 + i as u32,
                name: NAMES[i % NAMES.len()].to_string(),
                user: USERS[rng.gen_range(0..USERS.len())].to_string(),
                profile,
                base_mem,
            }
        })
        .collect();

    let frames = (0..frames.max(1))
        .map(|_| {
            let processes: Vec<TestProcess> =
                templates.iter().map(|t| generate_process(rng, t)).collect();
            TestFrame {
                system: SystemReading {
                    cpu_percent: rng.gen_range(10.0..90.0),
                    mem_percent: rng.gen_range(30.0..90.0),
                },
                processes,
            }
        })
        .collect();

    TestData {
        version: "1.0".to_string(),
        generated_at: Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string(),
        frames,
    }
}

/// Generates synthetic test data JSON file for testing purposes.
pub fn command_generate_testdata(
    output: PathBuf,
    frames: usize,
    processes: usize,
) -> anyhow::Result<()> {
    debug!(
        "Generating test data: frames={}, processes={}, output={}",
        frames,
        processes,
        output.display()
    );

    let test_data = generate_test_data(&mut rand::thread_rng(), frames, processes);

    let json_content = serde_json::to_string_pretty(&test_data)?;
    fs::write(&output, &json_content)
        .with_context(|| format!("Failed to write {}", output.display()))?;

    println!(
        "Generated test data: {} frames x {} processes in {}",
        test_data.frames.len(),
        processes,
        output.display()
    );

    Ok(())
}
