//! End-to-end routing through `OutputRouter`.

use std::path::Path;
use std::thread;
use std::time::{Duration, Instant};

use assert_matches::assert_matches;
use fileroute_core::{Model, ResourceConfig, ResourceConfigBuilder, RoutingError};
use fileroute_output::{
    CloseOutcome, Content, OutputRouter, ResourceServices, Session, is_staging_file_name,
};

fn router(configs: impl IntoIterator<Item = ResourceConfig>) -> OutputRouter {
    OutputRouter::from_configs(configs, ResourceServices::default()).unwrap()
}

fn orders(root: &Path) -> ResourceConfigBuilder {
    ResourceConfig::builder("orders")
        .file_name_pattern("item-${itemId}.xml")
        .destination_directory_pattern(format!("{}/out-${{orderId}}", root.display()))
        .high_water_mark(-1)
}

fn session(order: &str, item: &str) -> Session {
    Session::new(
        [("orderId", order), ("itemId", item)]
            .into_iter()
            .collect::<Model>(),
    )
}

fn staging_files(dir: &Path) -> Vec<String> {
    std::fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .filter(|name| is_staging_file_name(name))
        .collect()
}

#[test]
fn publishes_under_rendered_name() {
    let tmp = tempfile::tempdir().unwrap();
    let router = router([orders(tmp.path()).build().unwrap()]);
    let mut session = session("1", "9");

    router
        .write(&mut session, "orders", &Content::from("hello"))
        .unwrap();
    let outcome = router.visit_end(&mut session, "orders").unwrap();

    let out = tmp.path().join("out-1");
    assert_eq!(outcome, CloseOutcome::Published(out.join("item-9.xml")));
    assert_eq!(std::fs::read_to_string(out.join("item-9.xml")).unwrap(), "hello");
    assert!(staging_files(&out).is_empty());
}

#[test]
fn nested_destination_is_created() {
    let tmp = tempfile::tempdir().unwrap();
    let config = orders(tmp.path())
        .destination_directory_pattern(format!("{}/a/b/${{orderId}}", tmp.path().display()))
        .build()
        .unwrap();
    let router = router([config]);
    let mut session = session("7", "1");

    router.write(&mut session, "orders", &Content::from("x")).unwrap();
    let _ = router.visit_end(&mut session, "orders").unwrap();

    assert!(tmp.path().join("a/b/7/item-1.xml").is_file());
}

#[test]
fn collision_leaves_staging_file_behind() {
    let tmp = tempfile::tempdir().unwrap();
    let out = tmp.path().join("out-1");
    std::fs::create_dir_all(&out).unwrap();
    std::fs::write(out.join("item-9.xml"), "first").unwrap();

    let router = router([orders(tmp.path()).build().unwrap()]);
    let mut session = session("1", "9");
    router
        .write(&mut session, "orders", &Content::from("second"))
        .unwrap();

    let err = router.visit_end(&mut session, "orders").unwrap_err();
    assert_matches!(err.as_routing(), Some(RoutingError::AlreadyExists { .. }));
    assert_eq!(std::fs::read_to_string(out.join("item-9.xml")).unwrap(), "first");
    assert_eq!(staging_files(&out).len(), 1);
}

#[test]
fn append_mode_grows_one_file() {
    let tmp = tempfile::tempdir().unwrap();
    let config = orders(tmp.path())
        .file_name_pattern("all.csv")
        .append(true)
        .build()
        .unwrap();
    let router = router([config]);
    let out = tmp.path().join("out-1");

    for line in ["a\n", "b\n", "c\n"] {
        let mut session = session("1", "9");
        router
            .write(&mut session, "orders", &Content::from(line))
            .unwrap();
        assert!(staging_files(&out).is_empty());
        assert_matches!(
            router.visit_end(&mut session, "orders").unwrap(),
            CloseOutcome::Appended(_)
        );
        let _ = router.end_session(&mut session).unwrap();
    }

    assert_eq!(std::fs::read_to_string(out.join("all.csv")).unwrap(), "a\nb\nc\n");
}

#[test]
fn journal_lists_every_publish_in_order() {
    let tmp = tempfile::tempdir().unwrap();
    let config = orders(tmp.path())
        .list_file_name_pattern("items-${orderId}.lst")
        .build()
        .unwrap();
    let router = router([config]);
    let mut session = session("1", "1");

    for item in ["1", "2", "3"] {
        let _ = session.model_mut().insert("itemId", item);
        router.write(&mut session, "orders", &Content::from(item)).unwrap();
        let _ = router.visit_end(&mut session, "orders").unwrap();
    }
    let _ = router.end_session(&mut session).unwrap();

    let out = tmp.path().join("out-1");
    let list = out.join("items-1.lst");
    assert_eq!(session.list_files(), [list.clone()]);

    let content = std::fs::read_to_string(&list).unwrap();
    let lines: Vec<&str> = content.lines().collect();
    let expected: Vec<String> = ["1", "2", "3"]
        .iter()
        .map(|i| out.join(format!("item-{i}.xml")).display().to_string())
        .collect();
    assert_eq!(lines, expected);
}

#[test]
fn admission_times_out_at_high_water_mark() {
    let tmp = tempfile::tempdir().unwrap();
    let out = tmp.path().join("out-1");
    std::fs::create_dir_all(&out).unwrap();
    std::fs::write(out.join("item-1.xml"), "").unwrap();
    std::fs::write(out.join("item-2.xml"), "").unwrap();
    std::fs::write(out.join("unrelated.txt"), "").unwrap();

    let config = orders(tmp.path())
        .high_water_mark(2)
        .high_water_mark_timeout(Duration::from_millis(100))
        .high_water_mark_poll_frequency(Duration::from_millis(10))
        .build()
        .unwrap();
    let router = router([config]);
    let mut session = session("1", "3");

    let start = Instant::now();
    let err = router
        .write(&mut session, "orders", &Content::from("x"))
        .unwrap_err();

    assert!(start.elapsed() >= Duration::from_millis(100));
    assert_matches!(
        err.as_routing(),
        Some(RoutingError::AdmissionTimeout { high_water_mark: 2, .. })
    );
    assert!(!session.is_open("orders"));
    assert!(staging_files(&out).is_empty());
}

#[test]
fn admission_proceeds_once_files_drain() {
    let tmp = tempfile::tempdir().unwrap();
    let out = tmp.path().join("out-1");
    std::fs::create_dir_all(&out).unwrap();
    std::fs::write(out.join("item-1.xml"), "").unwrap();

    let config = orders(tmp.path())
        .high_water_mark(1)
        .high_water_mark_timeout(Duration::from_secs(10))
        .high_water_mark_poll_frequency(Duration::from_millis(10))
        .build()
        .unwrap();
    let router = router([config]);
    let mut session = session("1", "2");

    let consumer = {
        let file = out.join("item-1.xml");
        thread::spawn(move || {
            thread::sleep(Duration::from_millis(50));
            std::fs::remove_file(file).unwrap();
        })
    };

    router.write(&mut session, "orders", &Content::from("x")).unwrap();
    consumer.join().unwrap();
    assert!(session.is_open("orders"));
}

#[test]
fn cancelling_admission_wait_opens_stream() {
    let tmp = tempfile::tempdir().unwrap();
    let out = tmp.path().join("out-1");
    std::fs::create_dir_all(&out).unwrap();
    std::fs::write(out.join("item-1.xml"), "").unwrap();

    let config = orders(tmp.path())
        .high_water_mark(1)
        .high_water_mark_timeout(Duration::from_secs(30))
        .high_water_mark_poll_frequency(Duration::from_secs(10))
        .build()
        .unwrap();
    let router = router([config]);
    let mut session = session("1", "2");

    let cancel = session.cancel_handle();
    let canceller = thread::spawn(move || {
        thread::sleep(Duration::from_millis(50));
        cancel.cancel();
    });

    let start = Instant::now();
    router.write(&mut session, "orders", &Content::from("x")).unwrap();
    canceller.join().unwrap();

    assert!(start.elapsed() < Duration::from_secs(10));
    assert!(session.staging_path("orders").is_some());
}

#[test]
fn close_condition_defers_until_true() {
    let tmp = tempfile::tempdir().unwrap();
    let config = orders(tmp.path())
        .close_on_condition("batch.last == true")
        .build()
        .unwrap();
    let router = router([config]);
    let mut session = session("1", "9");
    let _ = session
        .model_mut()
        .insert("batch", serde_json::json!({"last": false}));

    router.write(&mut session, "orders", &Content::from("a")).unwrap();
    assert_eq!(
        router.visit_end(&mut session, "orders").unwrap(),
        CloseOutcome::Deferred
    );
    assert!(!tmp.path().join("out-1/item-9.xml").exists());

    router.write(&mut session, "orders", &Content::from("b")).unwrap();
    let _ = session
        .model_mut()
        .insert("batch", serde_json::json!({"last": true}));
    assert_matches!(
        router.visit_end(&mut session, "orders").unwrap(),
        CloseOutcome::Published(_)
    );
    assert_eq!(
        std::fs::read_to_string(tmp.path().join("out-1/item-9.xml")).unwrap(),
        "ab"
    );
}

#[test]
fn session_end_publishes_open_streams() {
    let tmp = tempfile::tempdir().unwrap();
    let config = orders(tmp.path()).close_on_condition("false").build().unwrap();
    let router = router([config]);
    let mut session = session("1", "9");

    router
        .write(&mut session, "orders", &Content::from(serde_json::json!({"id": 9})))
        .unwrap();
    assert_eq!(
        router.visit_end(&mut session, "orders").unwrap(),
        CloseOutcome::Deferred
    );

    let published = router.end_session(&mut session).unwrap();
    let target = tmp.path().join("out-1/item-9.xml");
    assert_eq!(published, [target.clone()]);
    assert_eq!(std::fs::read_to_string(target).unwrap(), r#"{"id":9}"#);
    assert!(!session.is_open("orders"));
}

#[test]
fn unknown_resource_is_rejected() {
    let tmp = tempfile::tempdir().unwrap();
    let router = router([orders(tmp.path()).build().unwrap()]);
    let err = router
        .visit_end(&mut session("1", "9"), "invoices")
        .unwrap_err();
    assert_matches!(err.as_routing(), Some(RoutingError::UnknownResource { .. }));
}

#[test]
fn concurrent_sessions_share_destination() {
    let tmp = tempfile::tempdir().unwrap();
    let router = router([orders(tmp.path()).build().unwrap()]);

    thread::scope(|scope| {
        for item in 0..8 {
            let router = &router;
            let _ = scope.spawn(move || {
                let mut session = session("1", &item.to_string());
                router
                    .write(&mut session, "orders", &Content::from(format!("item {item}")))
                    .unwrap();
                let _ = router.visit_end(&mut session, "orders").unwrap();
            });
        }
    });

    let out = tmp.path().join("out-1");
    for item in 0..8 {
        assert_eq!(
            std::fs::read_to_string(out.join(format!("item-{item}.xml"))).unwrap(),
            format!("item {item}")
        );
    }
    assert!(staging_files(&out).is_empty());
}
