mod test_support;

use serde_json::json;
use test_support::{request_err, request_ok, spawn_sidecar, temp_dir};

#[test]
fn calendar_section_defaults_patches_and_persists() {
    let workspace = temp_dir("boletin-setup-calendar");
    let (mut child, mut stdin, mut reader) = spawn_sidecar();
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );

    let defaults = request_ok(&mut stdin, &mut reader, "2", "setup.get", json!({}));
    assert_eq!(
        defaults["calendar"],
        json!({ "term1StartMonth": 3, "term2StartMonth": 7, "term3StartMonth": 11 })
    );

    let term = request_ok(
        &mut stdin,
        &mut reader,
        "3",
        "grades.currentTerm",
        json!({ "date": "2025-07-01" }),
    );
    assert_eq!(term["term"], json!(2));
    let term = request_ok(
        &mut stdin,
        &mut reader,
        "4",
        "grades.currentTerm",
        json!({ "date": "2026-02-20" }),
    );
    assert_eq!(term["term"], json!(3));

    assert_eq!(
        request_err(
            &mut stdin,
            &mut reader,
            "5",
            "setup.update",
            json!({ "section": "calendar", "patch": { "term2StartMonth": 2 } })
        ),
        "bad_params"
    );
    assert_eq!(
        request_err(
            &mut stdin,
            &mut reader,
            "6",
            "setup.update",
            json!({ "section": "printing", "patch": {} })
        ),
        "bad_params"
    );

    let updated = request_ok(
        &mut stdin,
        &mut reader,
        "7",
        "setup.update",
        json!({ "section": "calendar", "patch": { "term2StartMonth": 8 } }),
    );
    assert_eq!(updated["calendar"]["term2StartMonth"], json!(8));

    let term = request_ok(
        &mut stdin,
        &mut reader,
        "8",
        "grades.currentTerm",
        json!({ "date": "2025-07-01" }),
    );
    assert_eq!(term["term"], json!(1));

    assert_eq!(
        request_err(
            &mut stdin,
            &mut reader,
            "9",
            "grades.currentTerm",
            json!({ "date": "01/07/2025" })
        ),
        "bad_params"
    );

    drop(stdin);
    let _ = child.wait();

    // A fresh process sees the saved section.
    let (_child, mut stdin, mut reader) = spawn_sidecar();
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "10",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );
    let reloaded = request_ok(&mut stdin, &mut reader, "11", "setup.get", json!({}));
    assert_eq!(reloaded["calendar"]["term2StartMonth"], json!(8));
}
