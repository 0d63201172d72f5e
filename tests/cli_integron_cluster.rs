use assert_cmd::Command;
use predicates::prelude::*;

#[test]
fn command_cluster() -> anyhow::Result<()> {
    let mut cmd = Command::cargo_bin("integron")?;
    let output = cmd
        .arg("cluster")
        .arg("tests/integron/attc_table.res")
        .arg("--size")
        .arg("20000")
        .arg("--name")
        .arg("ACBA.007.P01_13")
        .output()?;
    let stdout = String::from_utf8(output.stdout)?;

    assert_eq!(stdout.lines().count(), 4);
    assert!(stdout.starts_with("array\tID_replicon\tpos_beg"));
    assert!(stdout.contains("1\tACBA.007.P01_13\t1500\t1550\t1\t1.200e-05\tattc_4"));
    assert!(stdout.contains("1\tACBA.007.P01_13\t1600\t1665\t1\t3.400e-03\tattc_4"));
    assert!(stdout.contains("2\tACBA.007.P01_13\t15000\t15060\t-1\t2.100e-04\tattc_4"));
    // the weaker strand of the palindrome is gone
    assert!(!stdout.contains("5.000e-03"));

    Ok(())
}

#[test]
fn command_cluster_palindromes() -> anyhow::Result<()> {
    let mut cmd = Command::cargo_bin("integron")?;
    let output = cmd
        .arg("cluster")
        .arg("tests/integron/attc_table.res")
        .arg("--size")
        .arg("20000")
        .arg("--name")
        .arg("ACBA.007.P01_13")
        .arg("--keep-palindromes")
        .arg("--linear")
        .output()?;
    let stdout = String::from_utf8(output.stdout)?;

    assert_eq!(stdout.lines().count(), 5);
    assert!(stdout.contains("2\tACBA.007.P01_13\t1500\t1550\t-1\t5.000e-03\tattc_4"));
    assert!(stdout.contains("3\tACBA.007.P01_13\t15000\t15060\t-1"));

    Ok(())
}

#[test]
fn command_cluster_small_distance() -> anyhow::Result<()> {
    let mut cmd = Command::cargo_bin("integron")?;
    let output = cmd
        .arg("cluster")
        .arg("tests/integron/attc_table.res")
        .arg("--size")
        .arg("20000")
        .arg("--name")
        .arg("ACBA.007.P01_13")
        .arg("-d")
        .arg("50")
        .output()?;
    let stdout = String::from_utf8(output.stdout)?;

    // 1500 and 1600 are 100 bp apart
    assert!(stdout.contains("2\tACBA.007.P01_13\t1600\t1665"));

    Ok(())
}

#[test]
fn command_cluster_several_replicons() -> anyhow::Result<()> {
    let mut cmd = Command::cargo_bin("integron")?;
    cmd.arg("cluster")
        .arg("tests/integron/attc_table.res")
        .arg("--size")
        .arg("20000");
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("several replicons"));

    Ok(())
}

#[test]
fn command_cluster_missing_input() -> anyhow::Result<()> {
    let mut cmd = Command::cargo_bin("integron")?;
    cmd.arg("cluster")
        .arg("tests/integron/not_here.res")
        .arg("--size")
        .arg("20000");
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("can't find the input file"));

    Ok(())
}
