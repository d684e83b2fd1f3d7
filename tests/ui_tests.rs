//! # Terminal Front End Tests
//!
//! Drives the controller through typed commands and checks what the
//! renderer prints.

mod support;

use smart_fridge::controller::Screen;
use smart_fridge::food_model::Category;
use smart_fridge::ui::{handle_command, parse_command, render, Flow};
use support::{day, food, harness};

async fn run(h: &mut support::Harness, line: &str) -> Option<String> {
    let command = parse_command(line).expect("valid command");
    let (flow, status) = handle_command(&mut h.controller, command).await;
    assert_eq!(flow, Flow::Continue);
    status
}

#[tokio::test]
async fn test_inventory_lists_items_with_positions() {
    let mut h = harness(&[
        food("a", "Yogurt", Category::Dairy, Some(day(2024, 5, 1))),
        food("b", "Ham", Category::Meat, Some(day(2024, 4, 28))),
    ]);
    let screen = render(&h.controller);
    assert!(screen.contains("1. 🥛 Yogurt 100%"));
    assert!(screen.contains("expires today"));
    assert!(screen.contains("2. 🥩 Ham"));
    assert!(screen.contains("Expired (3 days ago)"));

    run(&mut h, "lang zh").await;
    assert!(render(&h.controller).contains("我的冰箱"));
}

#[tokio::test]
async fn test_eat_and_discard_by_position() {
    let mut h = harness(&[
        food("a", "Butter", Category::Dairy, None),
        food("b", "Ham", Category::Meat, None),
    ]);

    assert_eq!(run(&mut h, "eat 1 30%").await, None);
    assert_eq!(h.controller.store().get("a").map(|i| i.percentage), Some(30));

    let status = run(&mut h, "discard 2").await.expect("status line");
    assert!(status.contains("discarded"));
    assert_eq!(h.controller.store().len(), 1);

    // Position past the end is rendered as an error
    assert_eq!(run(&mut h, "eat 5 10").await, None);
    let screen = render(&h.controller);
    assert!(screen.contains("not accepted (item 5 does not exist)"));
}

#[tokio::test]
async fn test_manual_add_through_commands() {
    let mut h = harness(&[]);
    run(&mut h, "new").await;
    run(&mut h, "set name Soy Sauce").await;
    run(&mut h, "set category condiment").await;
    run(&mut h, "set expires 2025-01-01").await;

    let form = render(&h.controller);
    assert!(form.contains("Soy Sauce"));
    assert!(form.contains("2025-01-01"));

    let status = run(&mut h, "confirm").await.expect("status line");
    assert!(status.contains("added"));
    assert_eq!(h.controller.screen(), &Screen::Inventory);
    assert_eq!(h.controller.store().items()[0].category, Category::Condiment);
}

#[tokio::test]
async fn test_controller_errors_render_until_dismissed() {
    let mut h = harness(&[]);
    run(&mut h, "recipes").await;
    let screen = render(&h.controller);
    assert!(screen.contains("Add some food before asking for recipes."));
    assert!(screen.contains("Type \"ok\" to dismiss."));

    run(&mut h, "ok").await;
    assert!(!render(&h.controller).contains("Add some food"));
}

#[tokio::test]
async fn test_newer_failure_replaces_undismissed_error() {
    let mut h = harness(&[food("a", "Butter", Category::Dairy, None)]);
    run(&mut h, "discard 1").await;
    run(&mut h, "recipes").await;
    assert!(render(&h.controller).contains("Add some food before asking for recipes."));

    // Neither failure below reaches the controller's own actions
    run(&mut h, "eat 5 10").await;
    let screen = render(&h.controller);
    assert!(screen.contains("item 5 does not exist"));
    assert!(!screen.contains("Add some food"));

    run(&mut h, "lang fr").await;
    let screen = render(&h.controller);
    assert!(screen.contains("unsupported language: fr"));
    assert!(!screen.contains("item 5 does not exist"));

    run(&mut h, "ok").await;
    assert!(h.controller.error().is_none());
}

#[tokio::test]
async fn test_overlay_blocks_inventory_commands() {
    let mut h = harness(&[food("a", "Butter", Category::Dairy, None)]);
    run(&mut h, "scan").await;
    run(&mut h, "eat 1 0").await;
    run(&mut h, "new").await;

    assert_eq!(h.controller.store().len(), 1);
    assert_eq!(h.controller.screen(), &Screen::Inventory);
    let screen = render(&h.controller);
    assert!(screen.contains("That action is not available here."));
    assert!(screen.contains("Photos taken: 0"));
}

#[tokio::test]
async fn test_capture_overlay_renders_photo_count() {
    let mut h = harness(&[]);
    run(&mut h, "scan").await;
    let status = run(&mut h, "snap").await.expect("status line");
    assert!(status.contains("Photo 1"));
    assert!(render(&h.controller).contains("Photos taken: 1"));

    run(&mut h, "close").await;
    assert!(h.controller.overlay().is_none());
}

#[tokio::test]
async fn test_quit_releases_camera() {
    let mut h = harness(&[]);
    run(&mut h, "scan").await;
    let command = parse_command("quit").expect("valid command");
    let (flow, _) = handle_command(&mut h.controller, command).await;
    assert_eq!(flow, Flow::Quit);
    assert!(h.controller.overlay().is_none());
}
