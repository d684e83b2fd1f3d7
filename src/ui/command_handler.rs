//! Command Handler module for parsing and dispatching terminal input

use tracing::debug;

use crate::controller::{CaptureMode, Controller, Screen};
use crate::errors::AppError;
use crate::food_model::StagedField;
use crate::inventory::ConsumptionOutcome;
use crate::localization::{get_localization_manager, t_args_lang, t_lang};

/// A parsed terminal command
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Help,
    Quit,
    /// Show the current screen again
    Show,
    Scan(CaptureMode),
    ManualAdd,
    Snap,
    DropPhoto(usize),
    Done,
    Close,
    Retry,
    Set(StagedField, String),
    Confirm,
    Back,
    AddAnyway,
    RemoveLine(usize),
    /// Inventory position (0-based) and remaining percentage
    Eat(usize, i32),
    Discard(usize),
    Recipes,
    DismissError,
    Language(String),
}

/// What the input loop should do next
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// Parse one input line; errors are localization keys
pub fn parse_command(input: &str) -> Result<Command, &'static str> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Ok(Command::Show);
    }

    let mut parts = trimmed.splitn(2, char::is_whitespace);
    let verb = parts.next().unwrap_or_default().to_lowercase();
    let rest = parts.next().unwrap_or_default().trim();

    match verb.as_str() {
        "help" | "?" => Ok(Command::Help),
        "quit" | "exit" | "q" => Ok(Command::Quit),
        "show" | "list" | "ls" => Ok(Command::Show),
        "scan" => Ok(Command::Scan(CaptureMode::Add)),
        "shop" => Ok(Command::Scan(CaptureMode::Shop)),
        "receipt" => Ok(Command::Scan(CaptureMode::Receipt)),
        "new" | "manual" => Ok(Command::ManualAdd),
        "snap" | "photo" => Ok(Command::Snap),
        "drop" => parse_position(rest).map(Command::DropPhoto),
        "done" | "send" => Ok(Command::Done),
        "close" => Ok(Command::Close),
        "retry" => Ok(Command::Retry),
        "set" => parse_set(rest),
        "confirm" | "save" | "yes" => Ok(Command::Confirm),
        "back" | "cancel" => Ok(Command::Back),
        "add" => Ok(Command::AddAnyway),
        "remove" | "rm" => parse_position(rest).map(Command::RemoveLine),
        "eat" | "use" => parse_eat(rest),
        "discard" | "toss" => parse_position(rest).map(Command::Discard),
        "recipes" | "cook" => Ok(Command::Recipes),
        "ok" | "dismiss" => Ok(Command::DismissError),
        "lang" => {
            if rest.is_empty() {
                Err("command-missing-argument")
            } else {
                Ok(Command::Language(rest.to_lowercase()))
            }
        }
        _ => Err("command-unknown"),
    }
}

/// 1-based position typed by the user, returned 0-based
fn parse_position(input: &str) -> Result<usize, &'static str> {
    if input.is_empty() {
        return Err("command-missing-argument");
    }
    match input.parse::<usize>() {
        Ok(n) if n >= 1 => Ok(n - 1),
        _ => Err("command-invalid-number"),
    }
}

fn parse_set(input: &str) -> Result<Command, &'static str> {
    let mut parts = input.splitn(2, char::is_whitespace);
    let field = parts.next().unwrap_or_default();
    let value = parts.next().unwrap_or_default().trim();
    if field.is_empty() {
        return Err("command-missing-argument");
    }
    let field = StagedField::parse(field).ok_or("command-unknown-field")?;
    Ok(Command::Set(field, value.to_string()))
}

fn parse_eat(input: &str) -> Result<Command, &'static str> {
    let mut parts = input.split_whitespace();
    let position = parse_position(parts.next().unwrap_or_default())?;
    let percentage = parts
        .next()
        .ok_or("command-missing-argument")?
        .trim_end_matches('%')
        .parse::<i32>()
        .map_err(|_| "command-invalid-number")?;
    Ok(Command::Eat(position, percentage))
}

/// Resolve an inventory position to an item id
fn item_id_at(controller: &Controller, position: usize) -> Result<String, AppError> {
    controller
        .store()
        .items()
        .get(position)
        .map(|item| item.id.clone())
        .ok_or_else(|| AppError::InvalidInput(format!("item {} does not exist", position + 1)))
}

/// Apply a command to the controller, returning a status line to print (if any).
///
/// Every failure, including the ones the controller never saw (bad positions,
/// unknown languages), ends up in the controller's error slot and is rendered
/// with the screen until dismissed.
pub async fn handle_command(
    controller: &mut Controller,
    command: Command,
) -> (Flow, Option<String>) {
    debug!(?command, screen = controller.screen().name(), "Handling command");
    let lang = controller.language().to_string();

    let result: Result<Option<String>, AppError> = match command {
        Command::Help => Ok(Some(t_lang("help-text", &lang))),
        Command::Quit => {
            controller.close_capture();
            return (Flow::Quit, Some(t_lang("goodbye", &lang)));
        }
        Command::Show => Ok(None),
        Command::Scan(mode) => controller.open_capture(mode).map(|_| None),
        Command::ManualAdd => controller.start_manual_add().map(|_| None),
        Command::Snap => controller.capture_frame().map(|count| {
            let count = count.to_string();
            Some(t_args_lang("capture-snapped", &[("count", &count)], &lang))
        }),
        Command::DropPhoto(index) => controller.remove_frame(index).map(|_| None),
        Command::Done => controller.finish_capture().await.map(|_| None),
        Command::Close => {
            controller.close_capture();
            Ok(None)
        }
        Command::Retry => controller.retry_camera().map(|_| None),
        Command::Set(field, value) => controller.edit_staged(field, &value).map(|_| None),
        Command::Confirm => {
            if matches!(controller.screen(), Screen::ReceiptReview(_)) {
                controller.confirm_receipt().map(|count| {
                    let count = count.to_string();
                    Some(t_args_lang("receipt-added", &[("count", &count)], &lang))
                })
            } else {
                controller
                    .confirm_add()
                    .map(|_| Some(t_lang("item-added", &lang)))
            }
        }
        Command::Back => {
            controller.back_to_inventory();
            Ok(None)
        }
        Command::AddAnyway => controller.add_scanned_anyway().map(|_| None),
        Command::RemoveLine(index) => controller.remove_receipt_line(index).map(|_| None),
        Command::Eat(position, percentage) => match item_id_at(controller, position) {
            Ok(id) => controller
                .set_consumption(&id, percentage)
                .map(|outcome| match outcome {
                    ConsumptionOutcome::Removed => Some(t_lang("item-finished", &lang)),
                    ConsumptionOutcome::Updated(_) => None,
                }),
            Err(e) => Err(e),
        },
        Command::Discard(position) => match item_id_at(controller, position) {
            Ok(id) => controller
                .discard(&id)
                .map(|_| Some(t_lang("item-discarded", &lang))),
            Err(e) => Err(e),
        },
        Command::Recipes => controller.request_recipes().await.map(|_| None),
        Command::DismissError => {
            controller.dismiss_error();
            Ok(None)
        }
        Command::Language(code) => {
            let supported = get_localization_manager()
                .map(|manager| manager.supports(&code))
                .unwrap_or(false);
            if supported {
                controller.set_language(code);
                Ok(None)
            } else {
                Err(AppError::InvalidInput(format!("unsupported language: {code}")))
            }
        }
    };

    match result {
        Ok(status) => (Flow::Continue, status),
        Err(e) => {
            debug!(error = %e, "Command failed");
            // The newest failure always wins over an undismissed older one
            controller.report_error(e);
            (Flow::Continue, None)
        }
    }
}

/// Whether a command waits on the recognition service
pub fn is_slow(command: &Command) -> bool {
    matches!(command, Command::Done | Command::Recipes)
}
