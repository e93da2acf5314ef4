//! Command handlers for the Vialy CLI
//!
//! One handler per subcommand. `ask` and `chat` build the full pipeline;
//! the maintenance commands (`status`, `info`, `clear`) only need the
//! session manager and deliberately skip provider construction, so they
//! work without an API key.

use crate::assistant::{Assistant, AskResponse};
use crate::config::Config;
use crate::error::Result;
use crate::session::SessionManager;
use crate::storage::SqliteStore;
use colored::Colorize;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use std::sync::Arc;

/// Answer a single question and print the structured response
pub async fn run_ask(
    config: Config,
    query: String,
    owner: String,
    session: Option<String>,
) -> Result<()> {
    let assistant = Assistant::from_config(&config)?;
    let response = assistant.ask(&query, &owner, session.as_deref()).await?;
    print_response(&response);
    Ok(())
}

/// Interactive chat loop over one session
pub async fn run_chat(config: Config, owner: String, session: Option<String>) -> Result<()> {
    let assistant = Assistant::from_config(&config)?;
    let mut session_id = session;

    println!(
        "{}",
        "Vialy - asistente del Código Nacional de Tránsito".bold()
    );
    println!("{}", "Escribe tu pregunta, o /help para ver comandos.\n".dimmed());

    let mut rl = DefaultEditor::new()?;

    loop {
        match rl.readline("vialy> ") {
            Ok(line) => {
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    continue;
                }

                rl.add_history_entry(trimmed)?;

                match trimmed {
                    "/exit" | "/quit" => break,
                    "/help" => {
                        print_help();
                        continue;
                    }
                    "/status" => {
                        let status = assistant.status()?;
                        println!(
                            "sesiones activas: {} · respuestas en cache: {}\n",
                            status.active_sessions, status.cache_entries
                        );
                        continue;
                    }
                    "/clear" => {
                        match &session_id {
                            Some(id) => {
                                if assistant.clear_history(id)? {
                                    println!("{}\n", "Historial eliminado.".yellow());
                                } else {
                                    println!("{}\n", "Sesión no encontrada.".yellow());
                                }
                                session_id = None;
                            }
                            None => println!("{}\n", "No hay sesión activa.".yellow()),
                        }
                        continue;
                    }
                    _ => {}
                }

                match assistant.ask(trimmed, &owner, session_id.as_deref()).await {
                    Ok(response) => {
                        session_id = Some(response.session_id.clone());
                        print_response(&response);
                    }
                    Err(e) => eprintln!("{} {}\n", "error:".red().bold(), e),
                }
            }
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
            Err(e) => return Err(e.into()),
        }
    }

    println!("{}", "Hasta luego.".dimmed());
    Ok(())
}

/// Print aggregate service state
pub fn run_status(config: &Config) -> Result<()> {
    let sessions = open_session_manager(config)?;
    let removed = sessions.cleanup_expired()?;
    if removed > 0 {
        println!("{} sesiones expiradas eliminadas", removed);
    }
    println!("sesiones activas: {}", sessions.active_session_count()?);
    Ok(())
}

/// Print one session's details
pub fn run_info(config: &Config, session: &str) -> Result<()> {
    let sessions = open_session_manager(config)?;
    match sessions.session_info(session)? {
        Some(info) => {
            println!("sesión:     {}", info.session_id);
            println!("usuario:    {}", info.owner_id);
            println!("estado:     {}", info.status.as_str());
            println!("inicio:     {}", info.started_at.to_rfc3339());
            println!("actividad:  {}", info.last_activity_at.to_rfc3339());
            println!("mensajes:   {}", info.message_count);
        }
        None => println!("{}", "Sesión no encontrada.".yellow()),
    }
    Ok(())
}

/// Delete a session's history
pub fn run_clear(config: &Config, session: &str) -> Result<()> {
    let sessions = open_session_manager(config)?;
    if sessions.clear_history(session)? {
        println!("Historial de {} eliminado.", session);
    } else {
        println!("{}", "Sesión no encontrada.".yellow());
    }
    Ok(())
}

fn open_session_manager(config: &Config) -> Result<SessionManager> {
    let store = Arc::new(match &config.session.db_path {
        Some(path) => SqliteStore::new_with_path(path)?,
        None => SqliteStore::new()?,
    });
    Ok(SessionManager::new(
        store,
        config.session.max_history,
        config.session.timeout_hours,
    ))
}

fn print_response(response: &AskResponse) {
    println!("\n{}", response.answer);

    if !response.sources.is_empty() {
        println!("\n{}", "Fuentes:".bold());
        for source in &response.sources {
            let page = source
                .page
                .map(|p| format!(" (pág. {})", p))
                .unwrap_or_default();
            println!("  - {}{}", source.file.cyan(), page);
        }
    }

    println!(
        "\n{} {} · {} {} · {} {}\n",
        "sesión:".dimmed(),
        response.session_id,
        "categoría:".dimmed(),
        response.category.display_name(),
        "intención:".dimmed(),
        response.intent.code()
    );
}

fn print_help() {
    println!("Comandos disponibles:");
    println!("  /status   estado del servicio");
    println!("  /clear    elimina el historial de la sesión actual");
    println!("  /help     esta ayuda");
    println!("  /exit     salir\n");
}
