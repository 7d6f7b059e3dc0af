//! Module handles are created and destroyed on the reader's affinity thread.

mod common;

use std::thread;

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_handles_live_on_affinity_thread() {
    let (reader, module) = common::create_reader();
    let affinity = reader.affinity_thread_id();

    for _ in 0..3 {
        reader.power_on().await.unwrap();
        reader.start_inventory(0).await.unwrap();
        reader.power_off().await.unwrap();
    }

    let created = module.creation_threads();
    let dropped = module.drop_threads();
    assert_eq!(created.len(), 3);
    assert_eq!(created, dropped);
    assert!(created.iter().all(|id| *id == affinity));
    assert_ne!(affinity, thread::current().id());
}

#[tokio::test]
async fn test_failed_power_on_drops_on_affinity_thread() {
    use uhf_hardware::mock::{Failure, Primitive};

    let (reader, module) = common::create_reader();
    module.fail(Primitive::PowerOn, Failure::Error("no answer".into()));

    assert_eq!(reader.power_on().await.unwrap_err().code(), "POWER_ERROR");
    assert_eq!(module.drop_threads(), vec![reader.affinity_thread_id()]);
    assert_eq!(module.live_count(), 0);
}

#[tokio::test]
async fn test_affinity_thread_name() {
    let config = common::test_config().with_affinity_thread_name("m118-uhf");
    let (reader, _module) = common::create_reader_with(config);

    assert_eq!(reader.config().affinity_thread_name, "m118-uhf");
}
