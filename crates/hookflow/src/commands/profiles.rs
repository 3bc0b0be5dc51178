use colored::Colorize;
use hookflow_core::BackendProfile;
use std::path::Path;
use std::time::Duration;

pub fn handle(config: Option<&Path>, budget_secs: Option<u64>) -> anyhow::Result<()> {
    let registry = hookflow_config::load_registry(config)?;
    let budget = budget_secs.map(Duration::from_secs);

    println!("{}", "Backend profiles".bold());
    let mut over_budget = 0;
    for profile in registry.iter() {
        if print_profile(profile, budget) {
            over_budget += 1;
        }
    }

    if over_budget > 0 {
        println!();
        println!(
            "{}",
            format!("⚠ {} profile(s) can wait longer than the budget", over_budget).yellow()
        );
    }
    Ok(())
}

/// Print one profile; returns true when it can exceed `budget`
fn print_profile(profile: &BackendProfile, budget: Option<Duration>) -> bool {
    println!();
    println!("  {}", profile.kind.as_str().cyan());

    let Some(poll) = profile.poll else {
        println!("    polling: {}", "none (synchronous)".dimmed());
        return false;
    };

    println!("    base unit: {:?}", poll.base_unit);
    println!("    ceiling: {}", poll.ceiling);
    if let Some(deadline) = poll.deadline {
        println!("    deadline: {:?}", deadline);
    }
    println!("    success: {}", profile.success_states.join(", ").green());
    let failure = if profile.failure_states.is_empty() {
        "(none)".dimmed().to_string()
    } else {
        profile.failure_states.join(", ").red().to_string()
    };
    println!("    failure: {}", failure);

    let max_wait = poll.max_wait();
    match budget {
        Some(budget) if max_wait > budget => {
            println!(
                "    worst-case wait: {}",
                format!("{:?} (exceeds budget {:?})", max_wait, budget).yellow()
            );
            true
        }
        _ => {
            println!("    worst-case wait: {:?}", max_wait);
            false
        }
    }
}
