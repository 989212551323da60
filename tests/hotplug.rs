mod common;

use common::{sample, MockPoll, MockPush};
use padstate::controller::{
    Channel, PadIdentity, PadSource, PadState, PadStateStore, RepeatPolicy, UpdateKind,
};
use std::sync::Arc;
use std::thread;

#[test]
fn test_connect_press_release_disconnect_scenario() {
    let backend = MockPush::default();
    let mut source = PadSource::push(backend.clone(), RepeatPolicy::default()).unwrap();
    let store = Arc::clone(source.store().unwrap());

    let pad = source.refresh();
    assert!(!pad.enabled);
    assert_eq!(pad.identity, PadIdentity::NONE);

    backend.with(|cb| (cb.on_connect)(PadIdentity(0xABC)));
    assert!(source.refresh().enabled);

    let presses = [true, true, false];
    let mut on = Vec::new();
    let mut release = Vec::new();
    for pressed in presses {
        let raw = if pressed {
            sample(0xABC, &[Channel::A])
        } else {
            sample(0xABC, &[])
        };
        backend.with(|cb| (cb.on_update)(&raw, UpdateKind::PadState));
        let pad = source.refresh();
        on.push(pad.button(Channel::A).on());
        release.push(pad.button(Channel::A).release());
    }
    assert_eq!(on, vec![true, false, false]);
    assert_eq!(release, vec![false, false, true]);

    backend.with(|cb| (cb.on_disconnect)(PadIdentity(0xABC)));
    assert!(!source.refresh().enabled);
    assert!(store.check_hash(PadIdentity(0xABC)));

    backend.with(|cb| (cb.on_disconnect)(PadIdentity(0xDEF)));
    assert!(!source.refresh().enabled);
    assert!(store.check_hash(PadIdentity(0xABC)));
}

#[test]
fn test_stale_disconnect_after_reconnect_is_ignored() {
    let store = Arc::new(PadStateStore::new());
    let mut callbacks = store.callbacks();

    (callbacks.on_connect)(PadIdentity(1));
    (callbacks.on_connect)(PadIdentity(2));
    (callbacks.on_update)(&sample(2, &[Channel::B]), UpdateKind::PadState);
    (callbacks.on_disconnect)(PadIdentity(1));

    let mut pad = PadState::default();
    store.fetch(&mut pad);
    assert!(pad.enabled);
    assert!(pad.button(Channel::B).pressed());
    assert!(store.check_hash(PadIdentity(2)));
    assert!(!store.check_hash(PadIdentity(1)));
}

#[test]
fn test_edge_history_survives_same_device_reconnect() {
    let store = Arc::new(PadStateStore::new());
    let mut pad = PadState::default();

    store.on_connect(PadIdentity(7));
    store.publish(&sample(7, &[Channel::D]), UpdateKind::PadState);
    store.fetch(&mut pad);
    assert!(pad.button(Channel::D).on());

    store.on_disconnect(PadIdentity(7));
    store.on_connect(PadIdentity(7));
    store.publish(&sample(7, &[Channel::D]), UpdateKind::PadState);

    // the consumer never saw the gap, the press is not new
    store.fetch(&mut pad);
    assert!(pad.button(Channel::D).pressed());
    assert!(!pad.button(Channel::D).on());
}

#[test]
fn test_replacement_device_gets_its_own_press_edge() {
    let store = Arc::new(PadStateStore::new());
    let mut pad = PadState::default();

    store.on_connect(PadIdentity(0xA));
    store.publish(&sample(0xA, &[Channel::A]), UpdateKind::PadState);
    store.fetch(&mut pad);
    assert!(pad.button(Channel::A).on());

    // the consumer misses the disconnect frame
    store.on_disconnect(PadIdentity(0xA));
    store.on_connect(PadIdentity(0xB));
    store.publish(&sample(0xB, &[Channel::A]), UpdateKind::PadState);

    store.fetch(&mut pad);
    assert_eq!(pad.identity, PadIdentity(0xB));
    assert!(pad.button(Channel::A).pressed());
    assert!(pad.button(Channel::A).on());
}

#[test]
fn test_poll_slot_swapping_device_resets_edges() {
    let port = MockPoll {
        samples: vec![sample(1, &[Channel::Down]), sample(2, &[Channel::Down])],
        polled: 0,
    };
    let mut source = PadSource::poll(port, 0, RepeatPolicy::default());
    assert!(source.refresh().button(Channel::Down).on());

    let pad = source.refresh();
    assert_eq!(pad.identity, PadIdentity(2));
    assert!(pad.button(Channel::Down).on());
}

#[test]
fn test_callbacks_from_backend_thread() {
    let backend = MockPush::default();
    let mut source = PadSource::push(backend.clone(), RepeatPolicy::default()).unwrap();

    let driver = {
        let backend = backend.clone();
        thread::spawn(move || {
            backend.with(|cb| {
                (cb.on_connect)(PadIdentity(0x55));
                (cb.on_update)(&sample(0x55, &[Channel::Menu]), UpdateKind::PadState);
            });
        })
    };
    driver.join().unwrap();

    let pad = source.refresh();
    assert!(pad.enabled);
    assert!(pad.button(Channel::Menu).on());
}

#[test]
fn test_failed_registration_falls_back_to_polling() {
    let err = PadSource::push(MockPush::failing(), RepeatPolicy::default());
    assert!(err.is_err());

    let port = MockPoll {
        samples: vec![sample(3, &[Channel::Up]), sample(3, &[Channel::Up])],
        polled: 0,
    };
    let mut source = PadSource::poll(port, 0, RepeatPolicy::default());
    assert_eq!(source.mode(), "poll");
    assert!(source.refresh().button(Channel::Up).on());
    assert!(!source.refresh().button(Channel::Up).on());

    let pad = source.refresh();
    assert!(!pad.enabled);
    assert!(pad.button(Channel::Up).release());
}

#[test]
fn test_motion_updates_share_the_slot() {
    let store = Arc::new(PadStateStore::new());
    store.on_connect(PadIdentity(9));

    let mut full = sample(9, &[Channel::C]);
    store.publish(&full, UpdateKind::PadState);
    for step in 0..5 {
        full.rotation = [step as f32, 0.0, 0.0];
        store.publish(&full, UpdateKind::Motion);
    }

    let mut pad = PadState::default();
    store.fetch(&mut pad);
    assert_eq!(pad.rotation, [4.0, 0.0, 0.0]);
    assert!(pad.button(Channel::C).on());
}
