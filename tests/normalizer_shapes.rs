use serde_json::json;

use school_portal::models::{
    AttendanceRecord, AttendanceStatus, Child, EnrollmentStatus, ExamResult, FeeDetails, Period,
    Profile,
};
use school_portal::normalize::{self, shapes};

#[test]
fn parent_profile_reads_the_same_from_every_envelope() {
    let entity = json!({
        "_id": "par-1",
        "name": "Anil Mehta",
        "occupation": "Engineer",
        "children": [{ "_id": 17, "name": "Aarav", "className": "4", "section": "A" }]
    });
    let bodies = [
        entity.clone(),
        json!({ "data": entity.clone() }),
        json!({ "data": { "parent": entity.clone() } }),
        json!({ "success": true, "parent": entity.clone() }),
    ];

    let profiles: Vec<Profile> = bodies
        .iter()
        .map(|body| normalize::extract_as(body, shapes::PARENT).unwrap())
        .collect();

    for profile in &profiles {
        assert_eq!(profile, &profiles[0]);
    }
    assert_eq!(profiles[0].name, "Anil Mehta");
    assert_eq!(profiles[0].children[0].id, "17");
    assert_eq!(profiles[0].children[0].class_label(), "4 - A");
}

#[test]
fn list_payloads_accept_nested_flat_and_bare_arrays() {
    let items = json!([
        { "_id": "r1", "examName": "Unit Test", "overallPercentage": "72.5" },
        { "_id": "r2", "examName": "Mid Term", "overallPercentage": 88 }
    ]);
    for body in [
        json!({ "data": { "data": items.clone() } }),
        json!({ "data": items.clone() }),
        items.clone(),
    ] {
        let results: Vec<ExamResult> = normalize::extract_items(&body, shapes::LIST);
        assert_eq!(results.len(), 2);
        assert_eq!(results[1].exam_name, "Mid Term");
    }
}

#[test]
fn malformed_items_are_skipped_not_fatal() {
    let body = json!({ "data": { "attendance": [
        { "date": "2025-03-03", "status": "PRESENT" },
        "garbage",
        { "date": "2025-03-04", "status": "LATE" }
    ] } });
    let records: Vec<AttendanceRecord> = normalize::extract_items(&body, shapes::ATTENDANCE);
    assert_eq!(records.len(), 2);
}

#[test]
fn missing_payload_yields_nothing() {
    let body = json!({ "success": false, "message": "Unauthorized" });
    assert!(normalize::extract_list(&body, shapes::PAYMENTS).is_empty());
    assert!(normalize::extract_object(&body, shapes::FEES).is_empty());
}

#[test]
fn null_fields_read_as_defaults() {
    let body = json!({ "data": { "parent": {
        "_id": "par-1",
        "name": "Anil Mehta",
        "phone": null,
        "occupation": null,
        "children": [{ "_id": "c-a", "name": "Aarav", "section": null, "status": null, "rollNumber": null }]
    } } });
    let profile: Profile = normalize::extract_entity(&body, shapes::PARENT).unwrap();
    assert_eq!(profile.id, "par-1");
    assert_eq!(profile.phone, "");
    assert_eq!(profile.children.len(), 1);

    let child: &Child = &profile.children[0];
    assert_eq!(child.section, "");
    assert_eq!(child.status, EnrollmentStatus::Registered);

    let nulled_children = json!({ "data": { "parent": { "_id": "par-2", "name": "Solo", "children": null } } });
    let solo: Profile = normalize::extract_entity(&nulled_children, shapes::PARENT).unwrap();
    assert_eq!(solo.name, "Solo");
    assert!(solo.children.is_empty());
}

#[test]
fn records_with_null_optionals_are_kept() {
    let body = json!({ "data": { "attendance": [
        { "date": "2025-03-03", "status": "PRESENT", "remarks": null, "markedBy": null },
        { "date": "2025-03-04", "status": "ABSENT", "remarks": "Fever" }
    ] } });
    let records: Vec<AttendanceRecord> = normalize::extract_items(&body, shapes::ATTENDANCE);
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].status, AttendanceStatus::Present);
    assert_eq!(records[0].remarks, "");

    let periods: Vec<Period> = normalize::extract_items(
        &json!([{ "periodNumber": 1, "subject": "Maths", "isBreak": null, "teacher": null }]),
        shapes::LIST,
    );
    assert_eq!(periods.len(), 1);
    assert!(!periods[0].is_break);
}

#[test]
fn flat_fee_details_are_found_under_data() {
    let body = json!({ "data": { "totalFee": 10000, "paidAmount": 6000, "pendingAmount": 4000 } });
    let details: FeeDetails = normalize::extract_entity(&body, shapes::FEES).unwrap();
    assert_eq!(details.pending_amount, 4000.0);
}
