//! End-to-end scenarios against the simulated host

use dock_fuzz::driver::Driver;
use dock_fuzz::testing::FakeDriver;
use dock_fuzz::{
    assert_docked_in, assert_hidden, assert_same_frame, assert_visible, AddDockWidgetParams,
    CancellationToken, DockHost, Fuzzer, FuzzerConfig, InitialLayout, Location, Operation, OperationError,
    OperationKind, OperationWeights, ReplayLog, SimulatedDockHost, StepOutcome,
};

fn a_visible_b_hidden() -> FakeDriver {
    FakeDriver::from_layout(
        &InitialLayout::new()
            .main_window("main")
            .dock_widget("A", true)
            .dock_widget("B", false),
    )
}

#[tokio::test]
async fn test_add_save_close_restore_cycle() {
    let mut driver = a_visible_b_hidden();
    // A starts floating; docking relative to it needs A docked in "main"
    Operation::add_dock_widget(AddDockWidgetParams::new("main", "A", Location::OnTop))
        .execute(&mut driver)
        .await
        .unwrap();

    // B docks left of A and becomes visible
    let mut add = Operation::add_dock_widget(
        AddDockWidgetParams::new("main", "B", Location::OnLeft).relative_to("A"),
    );
    add.execute(&mut driver).await.unwrap();
    assert_eq!(add.description(), "AddDockWidget B-[hidden] to left, relative to A");
    assert_visible!(driver.host(), "B");
    assert_docked_in!(driver.host(), "B", "main");
    let placement = driver.host().placement_of("B").unwrap().clone();
    assert_eq!(placement.location, Some(Location::OnLeft));
    assert_eq!(placement.relative_to.as_deref(), Some("A"));

    Operation::save_layout().execute(&mut driver).await.unwrap();
    let saved = driver.last_saved_layout().unwrap().to_vec();
    assert!(!saved.is_empty());

    Operation::close("A").execute(&mut driver).await.unwrap();
    assert_hidden!(driver.host(), "A");

    Operation::restore_layout()
        .execute(&mut driver)
        .await
        .unwrap();
    assert_visible!(driver.host(), "A");
    assert_docked_in!(driver.host(), "A", "main");
    assert_eq!(driver.host().placement_of("B"), Some(&placement));
    assert_eq!(driver.host().serialize_layout(), saved);
}

#[tokio::test]
async fn test_close_tears_down_empty_floating_window() {
    let mut driver = a_visible_b_hidden();
    let window = driver.host().dock_widget("A").unwrap().window.unwrap();

    Operation::close("A").execute(&mut driver).await.unwrap();

    assert!(!driver.host().window_exists(window));
    assert_eq!(driver.host().floating_window_count(), 0);
}

#[tokio::test]
async fn test_tab_exclusion() {
    // A and its tab sibling C float in one window, B floats in another
    let mut driver = FakeDriver::from_layout(
        &InitialLayout::new()
            .main_window("main")
            .dock_widget("A", true)
            .dock_widget("C", true)
            .dock_widget("B", true),
    );
    driver.host_mut().add_dock_widget_as_tab("A", "C").unwrap();
    driver.host_mut().process_events().await;
    assert_same_frame!(driver.host(), "A", "C");

    let mut op = Operation::new(OperationKind::AddDockWidgetAsTab).unwrap();
    op.generate_random_params(&mut driver);
    let params = op.params_to_map();
    assert_eq!(params["dockWidgetName"], "A");
    assert_eq!(params["dockWidgetToAddName"], "B");

    op.execute(&mut driver).await.unwrap();
    assert_same_frame!(driver.host(), "A", "B");
    assert_eq!(driver.host().frame_members("A"), vec!["A", "C", "B"]);
}

#[tokio::test]
async fn test_restore_with_nothing_saved() {
    let mut driver = a_visible_b_hidden();
    let before = driver.host().serialize_layout();

    let outcome = Operation::restore_layout()
        .execute(&mut driver)
        .await
        .unwrap();

    assert_eq!(outcome, StepOutcome::Executed);
    assert_eq!(driver.host().serialize_layout(), before);
}

#[tokio::test]
async fn test_malformed_log_executes_nothing() {
    let driver = a_visible_b_hidden();
    let before = driver.host().serialize_layout();

    let record = serde_json::json!({ "type": 1, "comment": "Closing A" });
    assert!(Operation::from_map(record.as_object().unwrap()).is_none());

    let record = serde_json::json!({ "type": 2, "params": {} });
    let op = Operation::from_map(record.as_object().unwrap()).unwrap();
    assert!(!op.has_params());

    assert_eq!(driver.host().serialize_layout(), before);
}

#[tokio::test]
async fn test_replay_stale_name_fails_loudly() {
    let mut log = ReplayLog::new(
        InitialLayout::new()
            .main_window("MyMainWindow-0")
            .dock_widget("DockWidget-0", true),
    );
    log.push(&Operation::close("DockWidget-7"));

    let mut fuzzer = Fuzzer::new(SimulatedDockHost::new(), FuzzerConfig::default());
    let failure = fuzzer
        .replay(&log, &CancellationToken::new())
        .await
        .unwrap_err();

    assert_eq!(failure.step, 0);
    assert!(matches!(failure.error, OperationError::UnknownDockWidget(ref name) if name == "DockWidget-7"));
}

#[tokio::test]
async fn test_dumped_run_replays_from_disk() {
    let dir = tempfile::tempdir().unwrap();
    let cancel = CancellationToken::new();

    let config = FuzzerConfig::default()
        .with_seed(2024)
        .with_operations_per_test(80)
        .with_weights(
            OperationWeights::default()
                .with(OperationKind::SaveLayout, 0)
                .with(OperationKind::RestoreLayout, 0),
        );
    let mut fuzzer = Fuzzer::new(SimulatedDockHost::new(), config);
    let report = fuzzer.run_test(&cancel).await.unwrap();

    let mut log = report.log.clone();
    log.final_layout = Some(fuzzer.host().serialize_layout());
    let path = dir.path().join("run.json");
    log.save(&path).unwrap();

    let loaded = ReplayLog::load(&path).unwrap();
    let mut replayer = Fuzzer::new(SimulatedDockHost::new(), FuzzerConfig::default());
    replayer.replay(&loaded, &cancel).await.unwrap();

    assert_eq!(
        Some(replayer.host().serialize_layout()),
        loaded.final_layout
    );
}
