use std::sync::Arc;

use crate::commands::{build_runtime, load_config, open_database, CommandResult};
use frontdesk_agent::{
    AgentRuntime, BookingDesk, DeskSettings, InMemoryConversationStore, SystemClock, TurnReply,
};
use frontdesk_core::config::LoadOptions;
use frontdesk_db::SqlPracticeStore;

/// Runs one conversational turn against the configured database and reports
/// the per-action results.
pub fn run(options: &LoadOptions, conversation_id: &str, text: &str) -> CommandResult {
    let config = match load_config("dispatch", options) {
        Ok(config) => config,
        Err(failure) => return failure,
    };
    let runtime = match build_runtime("dispatch") {
        Ok(runtime) => runtime,
        Err(failure) => return failure,
    };

    let result = runtime.block_on(async {
        let pool = open_database(&config).await?;
        let desk = BookingDesk::new(
            Arc::new(SqlPracticeStore::new(pool.clone())),
            Arc::new(SystemClock),
            DeskSettings::from_config(&config),
        );
        let agent = AgentRuntime::new(
            Arc::new(desk),
            Arc::new(InMemoryConversationStore::new(config.session.idle_timeout())),
            config.practice.phone.clone(),
        );

        let reply = agent.respond(conversation_id, text).await;
        pool.close().await;
        Ok::<TurnReply, crate::commands::StepError>(reply)
    });

    match result {
        Ok(TurnReply::Completed(outcome)) => {
            let message = format!("turn completed with {} action(s)", outcome.results.len());
            CommandResult::success_with_data("dispatch", message, serde_json::to_value(&outcome).ok())
        }
        Ok(TurnReply::Degraded { correlation_id, message }) => CommandResult::failure(
            "dispatch",
            "service_unavailable",
            format!("{message} (ref {correlation_id})"),
            7,
        ),
        Err((error_class, message, exit_code)) => {
            CommandResult::failure("dispatch", error_class, message, exit_code)
        }
    }
}
