//! C6 lifecycle: open/close/shutdown and the slot-reuse and growth behavior
//! of the registry itself, through the public API.

use subpool::prelude::*;

fn init_logger() {
    let _ = pretty_env_logger::try_init();
}

#[test]
fn open_many_pools_and_close_them_in_any_order() {
    init_logger();
    let mut registry = Registry::init().unwrap();
    let a = registry.open(100, Policy::BestFit).unwrap().unwrap();
    let b = registry.open(200, Policy::FirstFit).unwrap().unwrap();
    let c = registry.open(300, Policy::BestFit).unwrap().unwrap();
    assert_eq!(registry.open_count(), 3);

    registry.close(b).unwrap();
    registry.close(a).unwrap();
    registry.close(c).unwrap();
    assert_eq!(registry.open_count(), 0);
}

#[test]
fn registry_grows_past_default_capacity() {
    init_logger();
    let mut registry = Registry::init().unwrap();
    let mut ids = Vec::new();
    for _ in 0..30 {
        ids.push(registry.open(16, Policy::BestFit).unwrap().unwrap());
    }
    assert_eq!(registry.open_count(), 30);
    for id in ids {
        registry.close(id).unwrap();
    }
    assert_eq!(registry.open_count(), 0);
}

#[test]
fn close_rejects_pool_with_live_allocation() {
    init_logger();
    let mut registry = Registry::init().unwrap();
    let id = registry.open(64, Policy::BestFit).unwrap().unwrap();
    let alloc = registry.get_mut(id).unwrap().allocate(32).unwrap();
    assert_eq!(registry.close(id), Err(Error::NotFreed));
    registry.get_mut(id).unwrap().free(alloc).unwrap();
    assert_eq!(registry.close(id), Ok(()));
}

#[test]
fn shutdown_retires_the_registry() {
    init_logger();
    let mut registry = Registry::init().unwrap();
    let id = registry.open(64, Policy::BestFit).unwrap().unwrap();
    registry.shutdown();
    assert!(registry.get(id).is_none());
    assert_eq!(
        registry.open(64, Policy::BestFit),
        Err(Error::AlreadyInitialized)
    );
}

#[test]
fn options_override_initial_capacity() {
    let mut registry =
        Registry::init_with_options(RegistryOptions { initial_capacity: 1, ..Default::default() })
            .unwrap();
    let a = registry.open(8, Policy::BestFit).unwrap().unwrap();
    let b = registry.open(8, Policy::BestFit).unwrap().unwrap();
    assert_ne!(a, b);
}
