use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;

fn shelfscan(data_dir: &Path) -> Command {
    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("shelfscan");
    cmd.env_remove("SHELFSCAN_DATA_DIR")
        .env_remove("RUST_LOG")
        .arg("--data-dir")
        .arg(data_dir);
    cmd
}

fn add_book(data_dir: &Path, args: &[&str]) -> String {
    let output = shelfscan(data_dir)
        .args(["book", "add"])
        .args(args)
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    String::from_utf8(output).expect("utf-8 stdout").trim().to_owned()
}

#[test]
fn rust_log_debug_emits_debug_line_to_stderr() {
    let temp = tempfile::tempdir().expect("tempdir");
    shelfscan(temp.path())
        .env("RUST_LOG", "debug")
        .args(["shelf", "list"])
        .assert()
        .success()
        .stderr(predicate::str::contains("parsed cli"));
}

#[test]
fn verbose_flag_enables_debug_without_rust_log() {
    let temp = tempfile::tempdir().expect("tempdir");
    shelfscan(temp.path())
        .args(["-v", "shelf", "list"])
        .assert()
        .success()
        .stderr(predicate::str::contains("catalog loaded"));

    shelfscan(temp.path())
        .args(["shelf", "list"])
        .assert()
        .success()
        .stderr(predicate::str::contains("catalog loaded").not());
}

#[test]
fn added_books_are_listed_newest_first_and_searchable() {
    let temp = tempfile::tempdir().expect("tempdir");
    let sefiller = add_book(
        temp.path(),
        &["--title", "Sefiller", "--author", "Victor Hugo"],
    );
    add_book(
        temp.path(),
        &[
            "--title",
            "Anna Karenina",
            "--author",
            "Leo Tolstoy",
            "--shelf",
            "shelf-2",
        ],
    );

    shelfscan(temp.path())
        .args(["book", "list"])
        .assert()
        .success()
        .stdout(predicate::str::is_match(r"(?s)Anna Karenina.*\n.*Sefiller").expect("regex"));

    shelfscan(temp.path())
        .args(["book", "list", "--search", "HUGO"])
        .assert()
        .success()
        .stdout(predicate::str::contains(format!(
            "{sefiller}\tSefiller\tVictor Hugo\tOther\tBilly Left - Shelf 1"
        )))
        .stdout(predicate::str::contains("Anna Karenina").not());

    shelfscan(temp.path())
        .args(["book", "list", "--shelf", "shelf-2", "--json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"shelfId\": \"shelf-2\""))
        .stdout(predicate::str::contains("Sefiller").not());
}

#[test]
fn book_without_title_is_rejected() {
    let temp = tempfile::tempdir().expect("tempdir");
    shelfscan(temp.path())
        .args(["book", "add", "--author", "Nobody"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("book title is required"));
}

#[test]
fn edit_changes_fields_and_keeps_the_rest() {
    let temp = tempfile::tempdir().expect("tempdir");
    let id = add_book(temp.path(), &["--title", "Dune", "--author", "Herbert"]);

    shelfscan(temp.path())
        .args(["book", "edit", &id, "--year", "1965", "--genre", "Science Fiction"])
        .assert()
        .success()
        .stdout(predicate::str::contains(format!("updated {id} (Dune)")));

    shelfscan(temp.path())
        .args(["book", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "\tDune\tHerbert\tScience Fiction\tBilly Left - Shelf 1",
        ));

    shelfscan(temp.path())
        .args(["book", "edit", &id])
        .assert()
        .failure()
        .stderr(predicate::str::contains("nothing to update"));
}

#[test]
fn occupied_shelf_is_kept_with_a_warning() {
    let temp = tempfile::tempdir().expect("tempdir");
    let id = add_book(temp.path(), &["--title", "Dune", "--shelf", "shelf-3"]);

    shelfscan(temp.path())
        .args(["shelf", "rm", "shelf-3"])
        .assert()
        .success()
        .stderr(predicate::str::contains("still holds 1 book(s)"));

    shelfscan(temp.path())
        .args(["book", "rm", &id])
        .assert()
        .success();

    shelfscan(temp.path())
        .args(["shelf", "rm", "shelf-3"])
        .assert()
        .success()
        .stdout(predicate::str::contains("removed shelf-3"));

    shelfscan(temp.path())
        .args(["shelf", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("shelf-3").not());
}

#[test]
fn shelves_can_be_added_and_reordered() {
    let temp = tempfile::tempdir().expect("tempdir");
    shelfscan(temp.path())
        .args(["shelf", "move", "shelf-1", "up"])
        .assert()
        .success()
        .stderr(predicate::str::contains("already at the edge"));

    shelfscan(temp.path())
        .args(["shelf", "add", "--name", "Attic"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("shelf-"));

    shelfscan(temp.path())
        .args(["shelf", "add", "--name", "  "])
        .assert()
        .failure()
        .stderr(predicate::str::contains("shelf name must not be empty"));

    shelfscan(temp.path())
        .args(["shelf", "move", "shelf-1", "down"])
        .assert()
        .success();

    shelfscan(temp.path())
        .args(["shelf", "list"])
        .assert()
        .success()
        .stdout(
            predicate::str::is_match(r"(?s)^shelf-2\t.*\nshelf-1\t.*\nshelf-3\t.*\nshelf-\w+\tAttic")
                .expect("regex"),
        );
}

#[test]
fn shelf_edit_renames_and_keeps_unset_fields() {
    let temp = tempfile::tempdir().expect("tempdir");
    shelfscan(temp.path())
        .args(["shelf", "edit", "shelf-2", "--name", "Hallway"])
        .assert()
        .success()
        .stdout("updated shelf-2 (Hallway)\n");

    shelfscan(temp.path())
        .args(["shelf", "edit", "shelf-2", "--description", " by the door "])
        .assert()
        .success();

    let raw = std::fs::read_to_string(temp.path().join("library_shelves.json"))
        .expect("read shelves");
    let shelves: serde_json::Value = serde_json::from_str(&raw).expect("parse shelves");
    assert_eq!(shelves[1]["id"], "shelf-2");
    assert_eq!(shelves[1]["name"], "Hallway");
    assert_eq!(shelves[1]["description"], "by the door");

    shelfscan(temp.path())
        .args(["shelf", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("shelf-2\tHallway\t0 book(s)"));

    shelfscan(temp.path())
        .args(["shelf", "edit", "missing", "--name", "X"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("shelf not found: missing"));
}

#[test]
fn export_writes_bom_prefixed_csv() {
    let temp = tempfile::tempdir().expect("tempdir");
    let data_dir = temp.path().join("data");
    add_book(
        &data_dir,
        &[
            "--title",
            "The \"Best\" Book",
            "--author",
            "Anon",
            "--publisher",
            "YKY",
            "--year",
            "2001",
            "--isbn",
            "123",
            "--shelf",
            "shelf-2",
        ],
    );
    add_book(&data_dir, &["--title", "Elsewhere", "--shelf", "shelf-3"]);

    let out = temp.path().join("out").join("books.csv");
    shelfscan(&data_dir)
        .args(["export", "--shelf", "shelf-2", "--out"])
        .arg(&out)
        .assert()
        .success();

    let csv = std::fs::read_to_string(&out).expect("read export");
    let mut lines = csv.lines();
    assert_eq!(
        lines.next(),
        Some("\u{feff}Title,Author,Publisher,Year,Genre,ISBN,Shelf,Added")
    );
    let row = lines.next().expect("book row");
    assert!(
        row.starts_with(
            r#""The ""Best"" Book","Anon","YKY","2001","Other","123","Billy Left - Shelf 2","#
        ),
        "{row}"
    );
    assert!(lines.next().is_none());

    shelfscan(&data_dir)
        .args(["export", "--out"])
        .arg(&out)
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));

    shelfscan(&data_dir)
        .args(["export", "--force", "--out"])
        .arg(&out)
        .assert()
        .success();
    let csv = std::fs::read_to_string(&out).expect("read export");
    assert_eq!(csv.lines().count(), 3);
}

#[test]
fn stats_report_totals() {
    let temp = tempfile::tempdir().expect("tempdir");
    add_book(
        temp.path(),
        &["--title", "Dune", "--author", "Herbert", "--genre", "Science Fiction"],
    );
    add_book(temp.path(), &["--title", "Children of Dune", "--author", "Herbert"]);

    let output = shelfscan(temp.path())
        .args(["stats", "--json"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let stats: serde_json::Value = serde_json::from_slice(&output).expect("stats json");
    assert_eq!(stats["total_books"], 2);
    assert_eq!(stats["total_shelves"], 3);
    assert_eq!(stats["shelves"][0]["books"], 2);

    shelfscan(temp.path())
        .arg("stats")
        .assert()
        .success()
        .stdout(predicate::str::contains("authors\tHerbert\n"));
}

#[test]
fn data_dir_falls_back_to_environment() {
    let temp = tempfile::tempdir().expect("tempdir");
    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("shelfscan");
    cmd.env("SHELFSCAN_DATA_DIR", temp.path())
        .args(["book", "add", "--title", "Dune"])
        .assert()
        .success();

    assert!(temp.path().join("library_books.json").is_file());
}
