use chrono::{NaiveDate, Utc};

use crate::commands::{build_runtime, load_config, open_database, CommandResult};
use frontdesk_core::config::LoadOptions;
use frontdesk_db::{SeedSchedule, SqlPracticeStore};

pub const DEFAULT_SEED_DAYS: u32 = 28;

/// Seeds the standard weekday schedule from `start` (the practice reference
/// date, or today) for `days` calendar days.
pub fn run(options: &LoadOptions, start: Option<NaiveDate>, days: u32) -> CommandResult {
    if days == 0 {
        return CommandResult::failure("seed", "invalid_arguments", "--days must be at least 1", 2);
    }
    let config = match load_config("seed", options) {
        Ok(config) => config,
        Err(failure) => return failure,
    };
    let runtime = match build_runtime("seed") {
        Ok(runtime) => runtime,
        Err(failure) => return failure,
    };

    let start = start
        .or(config.practice.reference_date)
        .unwrap_or_else(|| Utc::now().date_naive());
    let schedule = SeedSchedule::standard(start, days);

    let result = runtime.block_on(async {
        let pool = open_database(&config).await?;
        let store = SqlPracticeStore::new(pool.clone());
        let outcome = schedule
            .apply(&store)
            .await
            .map_err(|error| ("seed_execution", error.to_string(), 6u8));
        pool.close().await;
        outcome
    });

    match result {
        Ok(seeded) => {
            let message = format!(
                "seeded {} new days ({} slots) from {start}; {} days already present",
                seeded.days_added, seeded.slots_added, seeded.days_skipped
            );
            CommandResult::success_with_data("seed", message, serde_json::to_value(&seeded).ok())
        }
        Err((error_class, message, exit_code)) => {
            CommandResult::failure("seed", error_class, message, exit_code)
        }
    }
}

#[cfg(test)]
mod tests {
    use frontdesk_core::config::LoadOptions;

    use super::run;

    #[test]
    fn zero_days_is_rejected_before_touching_the_database() {
        let result = run(&LoadOptions::default(), None, 0);
        assert_eq!(result.exit_code, 2);
        assert!(result.output.contains("invalid_arguments"));
    }
}
