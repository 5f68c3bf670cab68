use super::*;

fn coordinator() -> (LoadingCoordinator, broadcast::Receiver<ListEvent>) {
    let (events, rx) = broadcast::channel(32);
    (LoadingCoordinator::new(events), rx)
}

fn busy_flags(rx: &mut broadcast::Receiver<ListEvent>) -> Vec<bool> {
    let mut flags = Vec::new();
    while let Ok(event) = rx.try_recv() {
        if let ListEvent::Loading(state) = event {
            flags.push(state.busy);
        }
    }
    flags
}

#[test]
fn single_operation_sets_and_clears_the_indicator() {
    let (loading, mut rx) = coordinator();
    {
        let _guard = loading.begin("Saving employee...");
        assert_eq!(
            loading.state(),
            LoadingState {
                busy: true,
                message: "Saving employee...".into()
            }
        );
    }
    assert_eq!(loading.state(), LoadingState::default());
    assert_eq!(busy_flags(&mut rx), vec![true, false]);
}

#[test]
fn nested_operation_keeps_busy_and_restores_the_outer_message() {
    let (loading, mut rx) = coordinator();
    let outer = loading.begin("Saving employee...");
    {
        let _inner = loading.begin("Loading employee list...");
        assert_eq!(loading.state().message, "Loading employee list...");
    }
    assert!(loading.state().busy);
    assert_eq!(loading.state().message, "Saving employee...");
    drop(outer);

    assert_eq!(busy_flags(&mut rx), vec![true, true, true, false]);
}

#[test]
fn guards_released_out_of_order_still_end_idle() {
    let (loading, _rx) = coordinator();
    let first = loading.begin("first");
    let second = loading.begin("second");
    drop(first);
    assert_eq!(loading.state().message, "second");
    drop(second);
    assert!(!loading.state().busy);
}

#[test]
fn update_replaces_only_its_own_message() {
    let (loading, _rx) = coordinator();
    let guard = loading.begin("Saving...");
    guard.update("Saving (2/2)...");
    assert_eq!(loading.state().message, "Saving (2/2)...");
}
