mod common;

use predicates::prelude::PredicateBooleanExt;
use predicates::str::contains;
use std::fs;

use common::{offline_home, script_cli};

#[test]
fn script_mode_adds_lists_and_summarizes() {
    let home = offline_home();
    let input = "\
add Netflix 10 usd monthly --category streaming
add \"Cloud Drive\" 120 usd yearly --category software
add Gym 5 usd monthly --category fitness
list
summary
exit
";

    script_cli(&home)
        .write_stdin(input)
        .assert()
        .success()
        .stdout(contains("Added `Netflix`"))
        .stdout(contains("Cloud Drive"))
        .stdout(contains("$25.00"))
        .stdout(contains("$300.00"));
}

#[test]
fn subscriptions_survive_a_restart() {
    let home = offline_home();
    script_cli(&home)
        .write_stdin("add Spotify 9.99 eur monthly\n")
        .assert()
        .success();

    assert!(home.join("data").join("subscriptions.json").exists());

    script_cli(&home)
        .write_stdin("list\nshow spotify\n")
        .assert()
        .success()
        .stdout(contains("Spotify"))
        .stdout(contains("€9.99"));
}

#[test]
fn unknown_command_suggests_nearest_name() {
    let home = offline_home();
    script_cli(&home)
        .write_stdin("sumary\n")
        .assert()
        .success()
        .stdout(contains("Unknown command `sumary`"))
        .stdout(contains("Did you mean `summary`?"));
}

#[test]
fn invalid_input_is_reported_and_the_shell_continues() {
    let home = offline_home();
    script_cli(&home)
        .write_stdin("add Gym -5 usd monthly\nadd Gym 5 chf monthly\nlist\n")
        .assert()
        .success()
        .stderr(contains("price must be a positive number"))
        .stderr(contains("unknown currency `chf`"))
        .stdout(contains("No subscriptions yet"));
}

#[test]
fn unreachable_rate_service_falls_back_to_defaults() {
    let home = offline_home();
    script_cli(&home)
        .write_stdin("add Deezer 9.2 eur monthly\nsummary\nrates\n")
        .assert()
        .success()
        .stdout(contains("$10.00"))
        .stdout(contains("built-in defaults"));
}

#[test]
fn display_currency_changes_summary_symbol() {
    let home = offline_home();
    script_cli(&home)
        .write_stdin("currency gbp\nadd Times 20 gbp monthly\nsummary\n")
        .assert()
        .success()
        .stdout(contains("£20.00"))
        .stdout(contains("£240.00"));

    script_cli(&home)
        .write_stdin("currency\n")
        .assert()
        .success()
        .stdout(contains("Display currency: GBP"));
}

#[test]
fn export_writes_csv_file() {
    let home = offline_home();
    let target = home.join("export.csv");
    let input = format!(
        "add \"Acme, Pro\" 12.5 usd monthly\nexport csv \"{}\"\n",
        target.display()
    );

    script_cli(&home)
        .write_stdin(input)
        .assert()
        .success()
        .stdout(contains("Exported 1 subscription(s)"));

    let csv = std::fs::read_to_string(&target).unwrap();
    assert!(csv.starts_with("name,price,billing cycle,category,status,renewal date\n"));
    assert!(csv.contains("\"Acme, Pro\",12.50,Monthly,Other,Active,"));
}

#[test]
fn exit_stops_reading_commands() {
    let home = offline_home();
    script_cli(&home)
        .write_stdin("exit\nadd Late 1 usd monthly\n")
        .assert()
        .success()
        .stdout(contains("Added").not());

    script_cli(&home)
        .write_stdin("delete missing --yes\nclear --yes\nlist\n")
        .assert()
        .success()
        .stderr(contains("Subscription not found: missing"))
        .stdout(contains("No subscriptions yet"));
}

#[test]
fn data_files_with_timestamp_ids_stay_usable() {
    let home = offline_home();
    let data = home.join("data");
    fs::create_dir_all(&data).expect("create data dir");
    fs::write(
        data.join("subscriptions.json"),
        r#"[{"id":1712345678901,"name":"Netflix","price":15.49,"currency":"USD",
            "billingCycle":"monthly","category":"streaming",
            "startDate":"2024-04-05T00:00:00.000Z","renewalDate":"2024-05-05T00:00:00.000Z",
            "status":"active","createdAt":"2024-04-05T18:54:38.901Z",
            "updatedAt":"2024-04-05T18:54:38.901Z"}]"#,
    )
    .expect("seed data file");

    script_cli(&home)
        .write_stdin("show 1712345678901\ndelete 17123456 --yes\nlist\n")
        .assert()
        .success()
        .stdout(contains("$15.49"))
        .stdout(contains("Deleted `Netflix`"))
        .stdout(contains("No subscriptions yet"));
}
