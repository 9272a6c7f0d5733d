//! Scenarios for the Activities CRUD API.
//!
//! One parameterized set replaces per-deployment copies: the configured
//! conventions decide the id type assertions, the dueDate payload shape,
//! and the status code the deployment answers on create.

use serde_json::{Value, json};

use crate::config::{DueDateFormat, IdFormat, RunConfig};
use crate::http::RequestSpec;
use crate::scenario::{Extraction, Scenario};
use crate::testing::{Assertion, JsonKind};

fn id_kind(config: &RunConfig) -> JsonKind {
    match config.id_format {
        IdFormat::Number => JsonKind::Number,
        IdFormat::String => JsonKind::String,
    }
}

fn due_date_kind(config: &RunConfig) -> JsonKind {
    match config.due_date_format {
        DueDateFormat::Iso8601 => JsonKind::String,
        DueDateFormat::Unix => JsonKind::Number,
    }
}

fn due_date_sample(config: &RunConfig) -> Value {
    match config.due_date_format {
        DueDateFormat::Iso8601 => json!("2025-06-15T10:00:00.000Z"),
        DueDateFormat::Unix => json!(1748891012),
    }
}

/// The numeric-id deployment answers 200 on create, the string-id one 201.
fn created_status(config: &RunConfig) -> u16 {
    match config.id_format {
        IdFormat::Number => 200,
        IdFormat::String => 201,
    }
}

fn missing_id_body(config: &RunConfig, id: u64) -> Value {
    match config.id_format {
        IdFormat::Number => json!(id),
        IdFormat::String => json!(id.to_string()),
    }
}

pub fn scenarios(config: &RunConfig) -> Vec<Scenario> {
    vec![
        collection_shape(config),
        create_read_delete(config),
        update_round_trip(config),
        update_missing(config),
        delete_missing(),
        read_missing(),
        read_invalid_id(),
    ]
}

fn collection_shape(config: &RunConfig) -> Scenario {
    Scenario::new("activities collection shape").check(
        "list activities",
        RequestSpec::get("activities"),
        vec![
            Assertion::StatusEquals(200),
            Assertion::HeaderContains("content-type".into(), "application/json".into()),
            Assertion::BodyIsArray,
            Assertion::ArrayMinLength(1),
            Assertion::ArrayAllUnique("/id".into()),
            Assertion::ArrayAllHaveProperty("id".into()),
            Assertion::ArrayAllHaveProperty("title".into()),
            Assertion::ArrayAllHaveProperty("dueDate".into()),
            Assertion::ArrayAllHaveProperty("completed".into()),
            Assertion::ArrayAllPropertyTypeEquals("id".into(), id_kind(config)),
            Assertion::ArrayAllPropertyTypeEquals("title".into(), JsonKind::String),
            Assertion::ArrayAllPropertyTypeEquals("dueDate".into(), due_date_kind(config)),
            Assertion::ArrayAllPropertyTypeEquals("completed".into(), JsonKind::Boolean),
            Assertion::ArrayAllPropertyValueEquals("completed".into(), json!(false)),
        ],
    )
}

fn create_read_delete(config: &RunConfig) -> Scenario {
    let title = "Activity created by testman";

    // Only the string-id deployment echoes the deleted entity; the numeric
    // one answers 200 with an empty body.
    let mut delete_assertions = vec![Assertion::StatusEquals(200)];
    if config.id_format == IdFormat::String {
        delete_assertions.push(Assertion::PropertyValueEquals("title".into(), json!(title)));
    }

    Scenario::new("activity create/read/delete lifecycle")
        .check_extracting(
            "create activity",
            RequestSpec::post("activities").json_body(json!({
                "title": title,
                "dueDate": due_date_sample(config),
                "completed": false,
            })),
            vec![
                Assertion::StatusEquals(created_status(config)),
                Assertion::HasProperty("id".into()),
                Assertion::PropertyTypeEquals("id".into(), id_kind(config)),
                Assertion::PropertyTypeEquals("title".into(), JsonKind::String),
                Assertion::PropertyTypeEquals("completed".into(), JsonKind::Boolean),
                Assertion::PropertyValueEquals("title".into(), json!(title)),
                Assertion::PropertyValueEquals("completed".into(), json!(false)),
            ],
            vec![Extraction::new("activity_id", "/id")],
        )
        .check(
            "read created activity",
            RequestSpec::get("activities/{{activity_id}}"),
            vec![
                Assertion::StatusEquals(200),
                Assertion::PropertyTypeEquals("id".into(), id_kind(config)),
                Assertion::PropertyValueEquals("title".into(), json!(title)),
                Assertion::PropertyTypeEquals("completed".into(), JsonKind::Boolean),
            ],
        )
        .check(
            "delete created activity",
            RequestSpec::delete("activities/{{activity_id}}"),
            delete_assertions,
        )
        .check(
            "read deleted activity",
            RequestSpec::get("activities/{{activity_id}}"),
            vec![
                Assertion::StatusEquals(404),
                Assertion::BodyEquals(json!("Not found")),
            ],
        )
}

fn update_round_trip(config: &RunConfig) -> Scenario {
    let updated_title = "Activity title updated by testman";

    Scenario::new("activity update round trip")
        .setup(
            "create activity",
            RequestSpec::post("activities").json_body(json!({
                "title": "Original activity before update",
                "dueDate": due_date_sample(config),
                "completed": false,
            })),
            vec![Extraction::new("activity_id", "/id")],
        )
        .check(
            "update activity",
            RequestSpec::put("activities/{{activity_id}}").json_body(json!({
                "id": "{{activity_id}}",
                "title": updated_title,
                "dueDate": due_date_sample(config),
                "completed": false,
            })),
            vec![
                Assertion::StatusEquals(200),
                Assertion::HasProperty("id".into()),
                Assertion::PropertyTypeEquals("id".into(), id_kind(config)),
                Assertion::PropertyTypeEquals("dueDate".into(), due_date_kind(config)),
                Assertion::PropertyTypeEquals("completed".into(), JsonKind::Boolean),
                Assertion::PropertyValueEquals("title".into(), json!(updated_title)),
            ],
        )
        .check(
            "read updated activity",
            RequestSpec::get("activities/{{activity_id}}"),
            vec![
                Assertion::StatusEquals(200),
                Assertion::PropertyValueEquals("title".into(), json!(updated_title)),
            ],
        )
        .teardown("delete activity", RequestSpec::delete("activities/{{activity_id}}"))
}

fn update_missing(config: &RunConfig) -> Scenario {
    Scenario::new("update missing activity").check(
        "update nonexistent id",
        RequestSpec::put("activities/999999").json_body(json!({
            "id": missing_id_body(config, 999999),
            "title": "Title for nonexistent id",
            "dueDate": due_date_sample(config),
            "completed": false,
        })),
        vec![
            Assertion::StatusEquals(404),
            Assertion::BodyEquals(json!("Not found")),
        ],
    )
}

fn delete_missing() -> Scenario {
    Scenario::new("delete missing activity").check(
        "delete nonexistent id",
        RequestSpec::delete("activities/999"),
        vec![
            Assertion::StatusEquals(404),
            Assertion::BodyEquals(json!("Not found")),
        ],
    )
}

fn read_missing() -> Scenario {
    Scenario::new("read missing activity").check(
        "read nonexistent id",
        RequestSpec::get("activities/999"),
        vec![
            Assertion::StatusEquals(404),
            Assertion::BodyEquals(json!("Not found")),
        ],
    )
}

fn read_invalid_id() -> Scenario {
    Scenario::new("read invalid activity id").check(
        "read non-numeric id",
        RequestSpec::get("activities/abc"),
        vec![Assertion::StatusEquals(404)],
    )
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;
    use crate::scenario::StepKind;

    fn config(id_format: IdFormat, due_date_format: DueDateFormat) -> RunConfig {
        RunConfig {
            base_url: "https://api.example.com".to_string(),
            github_token: None,
            timeout_ms: 30_000,
            workers: 4,
            id_format,
            due_date_format,
            report_file: PathBuf::from("test-results.json"),
        }
    }

    #[test]
    fn conventions_flip_type_assertions() {
        let numeric = collection_shape(&config(IdFormat::Number, DueDateFormat::Iso8601));
        let stringly = collection_shape(&config(IdFormat::String, DueDateFormat::Unix));

        let kinds = |scenario: &Scenario| -> Vec<(String, JsonKind)> {
            let StepKind::Check { assertions, .. } = &scenario.steps[0].kind else {
                panic!("expected a check step");
            };
            assertions
                .iter()
                .filter_map(|assertion| match assertion {
                    Assertion::ArrayAllPropertyTypeEquals(path, kind) => {
                        Some((path.clone(), *kind))
                    }
                    _ => None,
                })
                .collect()
        };

        let numeric_kinds = kinds(&numeric);
        assert!(numeric_kinds.contains(&("id".to_string(), JsonKind::Number)));
        assert!(numeric_kinds.contains(&("dueDate".to_string(), JsonKind::String)));

        let stringly_kinds = kinds(&stringly);
        assert!(stringly_kinds.contains(&("id".to_string(), JsonKind::String)));
        assert!(stringly_kinds.contains(&("dueDate".to_string(), JsonKind::Number)));
    }

    #[test]
    fn created_status_follows_deployment_convention() {
        assert_eq!(created_status(&config(IdFormat::Number, DueDateFormat::Iso8601)), 200);
        assert_eq!(created_status(&config(IdFormat::String, DueDateFormat::Unix)), 201);
    }

    #[test]
    fn delete_echo_asserted_only_for_string_ids() {
        let delete_assertions = |config: &RunConfig| -> usize {
            let scenario = create_read_delete(config);
            let StepKind::Check { assertions, .. } = &scenario.steps[2].kind else {
                panic!("expected a check step");
            };
            assertions.len()
        };

        let numeric = delete_assertions(&config(IdFormat::Number, DueDateFormat::Iso8601));
        let stringly = delete_assertions(&config(IdFormat::String, DueDateFormat::Unix));
        assert_eq!(stringly, numeric + 1);
    }

    #[test]
    fn lifecycle_ends_reading_the_deleted_activity() {
        let scenario = create_read_delete(&config(IdFormat::Number, DueDateFormat::Iso8601));
        assert_eq!(scenario.steps.len(), 4);
        let last = scenario.steps.last().unwrap();
        let StepKind::Check { assertions, .. } = &last.kind else {
            panic!("expected a check step");
        };
        assert!(assertions.iter().any(|assertion| matches!(
            assertion,
            Assertion::BodyEquals(value) if value == &json!("Not found")
        )));
    }

    #[test]
    fn update_round_trip_cleans_up_in_teardown() {
        let scenario = update_round_trip(&config(IdFormat::String, DueDateFormat::Unix));
        assert!(matches!(scenario.steps.last().unwrap().kind, StepKind::Teardown));
    }
}
