//! # Terminal Front End
//!
//! A line-oriented interface over the [`Controller`]: every input line is
//! parsed into a [`Command`], applied, and the current screen is printed
//! again. Recipe pictures arriving in the background redraw the recipes
//! screen as they land.

pub mod command_handler;
pub mod renderer;

use anyhow::Result;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, info};

use crate::controller::{Controller, Screen};
use crate::localization::t_lang;

// Re-export the handler API
pub use command_handler::{handle_command, is_slow, parse_command, Command, Flow};
pub use renderer::render;

/// Run the interactive loop until `quit` or end of input
pub async fn run(mut controller: Controller) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    println!("{}\n", t_lang("welcome", controller.language()));
    println!("{}", render(&controller));

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else {
                    info!("Input closed, shutting down");
                    controller.close_capture();
                    break;
                };

                let command = match parse_command(&line) {
                    Ok(command) => command,
                    Err(key) => {
                        println!("{}", t_lang(key, controller.language()));
                        continue;
                    }
                };

                if is_slow(&command) {
                    println!("{}", renderer::format_loading(controller.language()));
                }

                let (flow, status) = handle_command(&mut controller, command).await;
                if let Some(status) = status {
                    println!("{status}");
                }
                if flow == Flow::Quit {
                    break;
                }

                controller.drain_image_updates();
                println!("\n{}", render(&controller));
            }
            Some(update) = controller.next_image_update() => {
                let index = update.index;
                if controller.apply_image_update(update)
                    && matches!(controller.screen(), Screen::Recipes(_))
                {
                    debug!(index, "Recipe picture arrived, redrawing");
                    println!("\n{}", render(&controller));
                }
            }
        }
    }

    Ok(())
}
