pub mod commands;

use crate::cli::commands::{Commands, SessionAction};
use crate::config::AppConfig;
use crate::db::{get_connection, service::DbService};

pub async fn run_cli(command: Commands, config_path: String) {
    let config = AppConfig::load(&config_path).expect("Failed to load config");

    match command {
        Commands::Serve => {
            panic!("Serve command should be intercepted by main.rs to boot actix-web");
        }
        Commands::Session { action } => {
            let pool = get_connection(&config.database).expect("DB error");
            let conn = pool.lock().unwrap();

            match action {
                SessionAction::List { owner } => {
                    match DbService::list_sessions(&conn, &owner) {
                        Ok(sessions) => {
                            if sessions.is_empty() {
                                println!("No sessions found for {}.", owner);
                            } else {
                                println!("{:<38} | {:<20} | {}", "ID", "Updated At", "Name");
                                println!("{:-<38}-+-{:-<20}-+-{:-<20}", "", "", "");
                                for s in sessions {
                                    println!("{:<38} | {:<20} | {}", s.id.to_string(), s.updated_at, s.name);
                                }
                            }
                        }
                        Err(e) => eprintln!("Error: {}", e),
                    }
                }
                SessionAction::Show { owner, id } => {
                    let session = match DbService::get_session(&conn, &owner, id) {
                        Ok(Some(s)) => s,
                        Ok(None) => { eprintln!("Session {} not found.", id); return; }
                        Err(e) => { eprintln!("Error: {}", e); return; }
                    };

                    println!("Session: {} ({})", session.display_name(), session.id);
                    println!("Level:   {}", session.learning_level.as_str());
                    if !session.study_plan.is_empty() {
                        println!("Plan:");
                        for (i, topic) in session.study_plan.iter().enumerate() {
                            let marker = if session.current_topic_index == Some(i) { ">" } else { " " };
                            println!(" {} [{:?}] {}", marker, topic.status, topic.name);
                        }
                    }
                    println!("---");
                    for entry in &session.transcript {
                        println!("[{}]: {}", entry.role.to_uppercase(), entry.content);
                    }
                }
                SessionAction::Delete { owner, id } => {
                    match DbService::delete_session(&conn, &owner, id) {
                        Ok(_) => println!("Deleted session {}", id),
                        Err(e) => eprintln!("Error: {}", e),
                    }
                }
                SessionAction::Export { owner, id, path } => {
                    let session = match DbService::get_session(&conn, &owner, id) {
                        Ok(Some(s)) => s,
                        _ => { eprintln!("Session {} not found.", id); return; }
                    };

                    let export_path = path.unwrap_or_else(|| format!("session_{}.txt", id));
                    match std::fs::write(&export_path, session.export_text()) {
                        Ok(_) => println!("Session exported successfully to: {}", export_path),
                        Err(e) => eprintln!("Failed to write {}: {}", export_path, e),
                    }
                }
            }
        }
    }
}
