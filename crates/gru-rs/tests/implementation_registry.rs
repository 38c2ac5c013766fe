use gru_rs::device::HostDevice;
use gru_rs::error::OpError;
use gru_rs::ops::{Gru, ImplKind, ImplementationRegistry, Operator, SelectionState};

#[test]
fn registration_is_monotonic_and_ordered() {
    let mut gru = Gru::<HostDevice>::new();
    let sequence = [
        ImplKind::Generic,
        ImplKind::Vendor,
        ImplKind::Generic,
        ImplKind::Vendor,
        ImplKind::Vendor,
    ];

    for (count, kind) in sequence.iter().enumerate() {
        gru.register_implementation(*kind).unwrap();
        assert_eq!(gru.candidate_count(), count + 1);
    }

    assert_eq!(gru.implementation_kinds(), sequence.to_vec());
}

#[test]
fn same_kind_registers_independent_candidates() {
    let mut gru = Gru::<HostDevice>::new();
    gru.register_implementation(ImplKind::Vendor).unwrap();
    gru.register_implementation(ImplKind::Vendor).unwrap();

    assert_eq!(
        gru.implementation_kinds(),
        vec![ImplKind::Vendor, ImplKind::Vendor]
    );
    let names: Vec<_> = gru
        .core()
        .registry()
        .iter()
        .map(|candidate| candidate.name())
        .collect();
    assert_eq!(names, vec!["vendor_gru", "vendor_gru"]);
}

#[test]
fn unsupported_kind_is_rejected_without_registering() {
    let mut gru = Gru::<HostDevice>::new();
    gru.register_implementation(ImplKind::Generic).unwrap();

    let err = gru
        .register_implementation(ImplKind::Reference)
        .expect_err("gru does not ship a reference kernel");

    assert_eq!(err, OpError::UnsupportedImplementation(ImplKind::Reference));
    assert_eq!(gru.implementation_kinds(), vec![ImplKind::Generic]);
}

#[test]
fn state_moves_from_unregistered_to_ready() {
    let mut gru = Gru::<HostDevice>::new();
    assert_eq!(gru.state(), SelectionState::Unregistered);
    assert!(gru.active_implementation().is_none());

    gru.register_implementation(ImplKind::Vendor).unwrap();
    assert_eq!(gru.state(), SelectionState::ReadyToSelect);
    assert!(gru.active_implementation().is_none());
}

#[test]
fn registry_switching_active_clears_initialized_flag() {
    let mut registry: ImplementationRegistry<str> = ImplementationRegistry::new();
    registry.register("first".into());
    registry.register("second".into());

    registry.set_active(0);
    registry.mark_initialized();
    registry.set_active(0);
    assert!(registry.is_initialized(), "reselecting the same candidate keeps init");

    registry.set_active(1);
    assert!(!registry.is_initialized());
    assert_eq!(registry.active(), Some("second"));
    assert_eq!(registry.position(|name| name == "first"), Some(0));
}

#[test]
fn registry_rejects_out_of_range_active_index() {
    let mut registry: ImplementationRegistry<str> = ImplementationRegistry::new();
    registry.register("only".into());
    assert_eq!(registry.set_active(1), None);
    assert_eq!(registry.active_index(), None);

    assert_eq!(registry.set_active(0), Some("only"));
    registry.mark_initialized();
    assert_eq!(registry.set_active(7), None);
    assert_eq!(registry.active_index(), Some(0));
    assert!(registry.is_initialized());
}
