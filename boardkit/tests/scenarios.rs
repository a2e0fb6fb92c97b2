//! End-to-end scenarios: drag gesture to intent to optimistic mutation to
//! remote store, including rollback.

use boardkit::drag::{InputSource, PointerInput, PointerPhase, Rect};
use boardkit::types::{CardId, ListId};
use boardkit::{
    Board, BoardActions, Card, DragConfig, DragController, DragEvent, DragIntent, DropTargets,
    InMemoryStore, List, OptimisticEngine,
};
use std::sync::Arc;
use std::time::Duration;

fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("boardkit=trace")
        .with_test_writer()
        .try_init();
}

fn two_lists() -> Board {
    Board::new("Scenario")
        .with_id("b1")
        .with_list(List::new("b1", "A").with_id("A"))
        .with_list(List::new("b1", "B").with_id("B"))
}

fn setup(board: Board) -> (BoardActions, Arc<InMemoryStore>) {
    let store = Arc::new(InMemoryStore::new(board.clone()));
    let engine = OptimisticEngine::new(board, store.clone());
    (BoardActions::new(engine), store)
}

fn list_order(board: &Board) -> Vec<(String, i64)> {
    board
        .lists
        .iter()
        .map(|l| (l.id.to_string(), l.position))
        .collect()
}

/// Column layout for the drag surface: 200px columns, 40px headers, 50px cards
fn layout(board: &Board) -> DropTargets {
    let mut targets = DropTargets::new();
    for (li, list) in board.lists.iter().enumerate() {
        let x = li as f64 * 200.0;
        targets.register_list(list.id.clone(), li, Rect::new(x, 0.0, 200.0, 40.0));
        targets.register_list_body(
            list.id.clone(),
            list.cards.len(),
            Rect::new(x, 40.0, 200.0, 400.0),
        );
        for (ci, card) in list.cards.iter().enumerate() {
            let y = 40.0 + ci as f64 * 50.0;
            targets.register_card(card.id.clone(), list.id.clone(), ci, Rect::new(x, y, 200.0, 50.0));
        }
    }
    targets
}

fn intent_of(events: &[DragEvent]) -> Option<DragIntent> {
    events.iter().find_map(|e| match e {
        DragEvent::Dropped(intent) => Some(intent.clone()),
        _ => None,
    })
}

#[tokio::test]
async fn test_reorder_lists_commits() {
    init_logging();
    let (actions, store) = setup(two_lists());

    let handle = actions.reorder_lists(&ListId::from("A"), 1).unwrap();
    let expected = vec![("B".to_string(), 0), ("A".to_string(), 1)];
    assert_eq!(list_order(&actions.current()), expected);

    assert!(handle.settled().await.is_committed());
    assert_eq!(list_order(&actions.current()), expected);
    assert_eq!(list_order(&store.snapshot()), expected);
}

#[tokio::test]
async fn test_reorder_lists_rolls_back_on_failure() {
    init_logging();
    let (actions, store) = setup(two_lists());
    let before = actions.current();
    store.fail_next(1);

    let handle = actions.reorder_lists(&ListId::from("A"), 1).unwrap();
    assert_eq!(actions.current().lists[0].id, ListId::from("B"));

    assert!(handle.settled().await.is_rolled_back());
    assert_eq!(actions.current(), before);
    assert_eq!(
        list_order(&actions.current()),
        vec![("A".to_string(), 0), ("B".to_string(), 1)]
    );
    let notes = actions.engine().notifications().active();
    assert_eq!(notes.len(), 1);
    assert!(notes[0].message.starts_with("Could not move the list"));
}

#[tokio::test]
async fn test_move_card_into_empty_list() {
    init_logging();
    let board = Board::new("Scenario")
        .with_id("b1")
        .with_list(
            List::new("b1", "L1")
                .with_id("L1")
                .with_card(Card::new("L1", "c1").with_id("c1"))
                .with_card(Card::new("L1", "c2").with_id("c2"))
                .with_card(Card::new("L1", "c3").with_id("c3")),
        )
        .with_list(List::new("b1", "L2").with_id("L2"));
    let (actions, store) = setup(board);

    let handle = actions
        .move_card(&CardId::from("c1"), &ListId::from("L2"), Some(0))
        .unwrap();

    let check = |board: &Board| {
        let l1 = board.find_list(&ListId::from("L1")).unwrap();
        let l2 = board.find_list(&ListId::from("L2")).unwrap();
        let l1_cards: Vec<(String, i64)> = l1
            .cards
            .iter()
            .map(|c| (c.id.to_string(), c.position))
            .collect();
        assert_eq!(l1_cards, vec![("c2".to_string(), 0), ("c3".to_string(), 1)]);
        assert_eq!(l2.cards.len(), 1);
        assert_eq!(l2.cards[0].id, CardId::from("c1"));
        assert_eq!(l2.cards[0].position, 0);
        assert_eq!(l2.cards[0].list_id, ListId::from("L2"));
    };

    check(&actions.current());
    assert!(handle.settled().await.is_committed());
    check(&actions.current());
    check(&store.snapshot());
}

#[tokio::test]
async fn test_touch_scroll_never_drags() {
    init_logging();
    let board = Board::new("Scenario").with_id("b1").with_list(
        List::new("b1", "L1")
            .with_id("L1")
            .with_card(Card::new("L1", "c1").with_id("c1"))
            .with_card(Card::new("L1", "c2").with_id("c2")),
    );
    let targets = layout(&board);
    let mut controller = DragController::new(DragConfig::default());

    let mut events = controller.handle(
        &PointerInput::touch(PointerPhase::Down, 50.0, 60.0, 0),
        &targets,
    );
    events.extend(controller.handle(
        &PointerInput::touch(PointerPhase::Move, 50.0, 85.0, 120),
        &targets,
    ));
    events.extend(controller.tick(Duration::from_millis(600), &targets));
    events.extend(controller.handle(
        &PointerInput::touch(PointerPhase::Move, 50.0, 140.0, 650),
        &targets,
    ));
    events.extend(controller.handle(
        &PointerInput::touch(PointerPhase::Up, 50.0, 140.0, 700),
        &targets,
    ));

    assert!(events.contains(&DragEvent::Scroll));
    assert!(!events
        .iter()
        .any(|e| matches!(e, DragEvent::Started { .. } | DragEvent::Dropped(_))));
    assert!(!controller.suppress_scroll());
}

#[tokio::test]
async fn test_mouse_and_touch_drags_produce_same_board() {
    init_logging();
    let board = Board::new("Scenario")
        .with_id("b1")
        .with_list(
            List::new("b1", "L1")
                .with_id("L1")
                .with_card(Card::new("L1", "c1").with_id("c1"))
                .with_card(Card::new("L1", "c2").with_id("c2")),
        )
        .with_list(List::new("b1", "L2").with_id("L2"));
    let targets = layout(&board);

    let drag = |source: InputSource| {
        let mut controller = DragController::new(DragConfig::default());
        let mut events = Vec::new();
        let steps = [
            (PointerPhase::Down, 50.0, 60.0, 0),
            (PointerPhase::Move, 250.0, 60.0, 600),
            (PointerPhase::Up, 250.0, 60.0, 650),
        ];
        for (phase, x, y, at) in steps {
            if source == InputSource::Touch && phase == PointerPhase::Move {
                events.extend(controller.tick(Duration::from_millis(550), &targets));
            }
            events.extend(controller.handle(&PointerInput::new(phase, source, x, y, at), &targets));
        }
        intent_of(&events)
    };

    let mouse = drag(InputSource::Mouse);
    let touch = drag(InputSource::Touch);
    assert_eq!(mouse, touch);
    let intent = mouse.unwrap();
    assert_eq!(
        intent,
        DragIntent::MoveCard {
            card_id: "c1".into(),
            from_list: "L1".into(),
            to_list: "L2".into(),
            index: 0,
        }
    );

    let (actions, store) = setup(board);
    assert!(actions
        .apply_intent(&intent)
        .unwrap()
        .settled()
        .await
        .is_committed());
    let remote = store.snapshot();
    assert_eq!(remote.find_list(&ListId::from("L2")).unwrap().cards.len(), 1);
    assert!(remote.check_invariants().is_empty());
}

#[tokio::test]
async fn test_published_board_equals_transform_output() {
    init_logging();
    let board = two_lists();
    let (actions, _store) = setup(board.clone());
    let engine = actions.engine();

    let expected = boardkit::reorder::reorder_lists(&board, &ListId::from("B"), 0);
    let handle = engine.execute(
        |b| boardkit::reorder::reorder_lists(b, &ListId::from("B"), 0),
        async { Ok(()) },
    );
    assert_eq!(engine.current(), expected);
    handle.settled().await;
    assert_eq!(engine.current(), expected);
}

#[tokio::test(start_paused = true)]
async fn test_slow_store_keeps_optimistic_state_until_failure() {
    init_logging();
    let board = two_lists();
    let store = Arc::new(InMemoryStore::new(board.clone()).with_latency(Duration::from_secs(2)));
    let engine = OptimisticEngine::new(board.clone(), store.clone());
    let actions = BoardActions::new(engine);
    store.set_offline(true);

    let handle = actions.rename_list(&ListId::from("A"), "Alpha").unwrap();
    tokio::time::sleep(Duration::from_secs(1)).await;
    assert_eq!(actions.current().lists[0].title, "Alpha");
    assert_eq!(actions.engine().in_flight(), 1);

    assert!(handle.settled().await.is_rolled_back());
    assert_eq!(actions.current(), board);
    assert_eq!(actions.engine().in_flight(), 0);
}
