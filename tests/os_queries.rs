//! Smoke checks for the host and process queries.

use std::io::ErrorKind;

use vigilis::os;

#[test]
fn hrtime_moves_forward() {
    let a = os::hrtime();
    std::thread::sleep(std::time::Duration::from_millis(5));
    let b = os::hrtime();

    assert!(b > a, "monotonic time must advance across a sleep");
}

#[cfg(target_os = "linux")]
#[test]
fn memory_figures_are_coherent() {
    let total = os::total_memory().expect("total_memory failed");
    let free = os::free_memory().expect("free_memory failed");

    assert!(total > 0);
    assert!(free <= total);
}

#[cfg(target_os = "linux")]
#[test]
fn uptime_is_positive() {
    let uptime = os::uptime().expect("uptime failed");
    assert!(!uptime.is_zero());
}

#[test]
fn loadavg_reports_three_samples() {
    let avg = os::loadavg().expect("loadavg failed");
    assert!(avg.iter().all(|sample| *sample >= 0.0));
}

#[test]
fn resident_set_memory_is_positive() {
    let rss = os::resident_set_memory().expect("resident_set_memory failed");
    assert!(rss > 0);
}

#[test]
fn cpu_info_is_explicitly_unsupported() {
    let err = os::cpu_info().expect_err("the platform reports no per-CPU data");
    assert_eq!(err.kind(), ErrorKind::Unsupported);
}

#[test]
fn set_process_title_is_explicitly_unsupported() {
    let err = os::set_process_title("renamed").expect_err("title changes are unsupported");
    assert_eq!(err.kind(), ErrorKind::Unsupported);
}

#[test]
fn setup_args_captures_the_title() {
    let args = os::setup_args(vec!["vigilisd".to_string(), "--verbose".to_string()]);

    assert_eq!(args.len(), 2, "arguments must pass through unchanged");
    assert_eq!(os::process_title(), "vigilisd");
}

#[test]
fn interface_addresses_name_every_entry() {
    let addresses = os::interface_addresses().expect("getifaddrs failed");

    for entry in &addresses {
        assert!(!entry.name.is_empty());
    }
}
