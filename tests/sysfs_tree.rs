use std::time::Duration;

use gpiowatch::{
    errors::{ConfigError, Error},
    EdgeType, LogicLevel, Pin, Sysfs, Watcher,
};
use tempdir::TempDir;

/// Build a directory that looks like `/sys/class/gpio` with `pins` exported.
fn fake_gpio_class(pins: &[u32]) -> anyhow::Result<TempDir> {
    let dir = TempDir::new("gpiowatch")?;

    std::fs::write(dir.path().join("export"), "")?;
    std::fs::write(dir.path().join("unexport"), "")?;

    for pin in pins {
        let base = dir.path().join(format!("gpio{pin}"));
        std::fs::create_dir(&base)?;

        for file in ["direction", "edge", "active_low"] {
            std::fs::write(base.join(file), "")?;
        }

        std::fs::write(base.join("value"), "0")?;
    }

    Ok(dir)
}

fn watcher(dir: &TempDir) -> anyhow::Result<Watcher> {
    let sysfs = Sysfs::new()
        .with_root(dir.path())
        .with_settle(Duration::ZERO);

    Ok(Watcher::builder()
        .with_sysfs(sysfs)
        .with_wait_timeout(Duration::from_millis(10))
        .with_idle_interval(Duration::from_millis(5))
        .build()?)
}

fn read(dir: &TempDir, file: &str) -> anyhow::Result<String> {
    Ok(std::fs::read_to_string(dir.path().join(file))?)
}

#[test]
fn add_pin_configures_the_line() -> anyhow::Result<()> {
    let dir = fake_gpio_class(&[22])?;
    let watcher = watcher(&dir)?;

    watcher.add_pin(Pin(22), EdgeType::Falling, LogicLevel::ActiveLow)?;

    assert_eq!(read(&dir, "export")?, "22");
    assert_eq!(read(&dir, "gpio22/direction")?, "in");
    assert_eq!(read(&dir, "gpio22/edge")?, "falling");
    assert_eq!(read(&dir, "gpio22/active_low")?, "1");

    watcher.remove_pin(Pin(22))?;
    watcher.shutdown()?;

    Ok(())
}

#[test]
fn configuration_failure_is_reported_to_the_caller() -> anyhow::Result<()> {
    let dir = fake_gpio_class(&[])?;
    let watcher = watcher(&dir)?;

    let err = watcher
        .add_pin(Pin(27), EdgeType::Rising, LogicLevel::ActiveHigh)
        .unwrap_err();

    match err {
        Error::Configure {
            pin,
            source: ConfigError::Open { path, .. },
        } => {
            assert_eq!(pin, Pin(27));
            assert!(path.ends_with("gpio27/direction"));
        }
        other => panic!("unexpected error {other}"),
    }

    // the loop is unaffected
    assert!(!watcher.is_closed());
    watcher.shutdown()?;

    Ok(())
}

#[test]
fn add_pin_after_close_is_refused() -> anyhow::Result<()> {
    let dir = fake_gpio_class(&[4])?;
    let watcher = watcher(&dir)?;
    let handle = watcher.handle();

    watcher.shutdown()?;

    assert!(matches!(
        handle.add_pin(Pin(4), EdgeType::Rising, LogicLevel::ActiveHigh),
        Err(Error::Closed)
    ));
    assert!(!handle.close());

    Ok(())
}
