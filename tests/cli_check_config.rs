use assert_cmd::prelude::*;
use color_eyre::Result;
use std::io::Write;
use std::process::Command;

#[test]
fn test_check_config_prints_effective_config() -> Result<()> {
    let mut file = tempfile::NamedTempFile::new()?;
    writeln!(
        file,
        r#"
listen = "127.0.0.1:9090"
default_provider = "ec2"

[providers]
ec2 = "ec2"

[seed.ec2]
uuid = "i-1234"
"#
    )?;

    let output = Command::cargo_bin("arestor")?
        .arg("check-config")
        .arg("--config")
        .arg(file.path())
        .output()?;

    assert!(
        output.status.success(),
        "check-config failed. Stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let stdout_str = String::from_utf8_lossy(&output.stdout);
    assert!(stdout_str.contains("listen = \"127.0.0.1:9090\""), "Missing listen address");
    assert!(stdout_str.contains("default_provider = \"ec2\""), "Missing default provider");
    assert!(stdout_str.contains("uuid = \"i-1234\""), "Missing seed value");

    Ok(())
}

#[test]
fn test_check_config_rejects_invalid_config() -> Result<()> {
    let mut file = tempfile::NamedTempFile::new()?;
    writeln!(file, "default_provider = \"digitalocean\"\n[providers]\nec2 = \"ec2\"")?;

    let output = Command::cargo_bin("arestor")?
        .arg("check-config")
        .arg("--config")
        .arg(file.path())
        .output()?;

    assert!(!output.status.success(), "check-config accepted an invalid config");
    let stderr_str = String::from_utf8_lossy(&output.stderr);
    assert!(stderr_str.contains("not mounted"), "Missing validation message: {}", stderr_str);

    Ok(())
}

#[test]
fn test_help_lists_commands() -> Result<()> {
    let output = Command::cargo_bin("arestor")?.arg("--help").output()?;
    assert!(output.status.success());

    let stdout_str = String::from_utf8_lossy(&output.stdout);
    assert!(stdout_str.contains("Usage: arestor [OPTIONS] [COMMAND]"), "Missing usage text");
    assert!(stdout_str.contains("serve"), "Missing serve command");
    assert!(stdout_str.contains("check-config"), "Missing check-config command");

    Ok(())
}
