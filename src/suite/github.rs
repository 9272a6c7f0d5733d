//! Scenarios for the GitHub REST API read endpoints.
//!
//! These target a different host than the configured base URL, so their
//! requests carry absolute URLs. The authenticated scenarios are only
//! emitted when a token is configured; the public-profile and
//! missing-credentials scenarios need none.

use serde_json::json;

use crate::config::RunConfig;
use crate::http::RequestSpec;
use crate::scenario::Scenario;
use crate::testing::{Assertion, JsonKind};

const GITHUB_API: &str = "https://api.github.com";
const GITHUB_ACCEPT: &str = "application/vnd.github.v3+json";

fn github_get(path: &str, token: Option<&str>) -> RequestSpec {
    let mut request =
        RequestSpec::get(format!("{GITHUB_API}/{path}")).header("accept", GITHUB_ACCEPT);
    if let Some(token) = token {
        request = request.header("authorization", format!("token {token}"));
    }
    request
}

pub fn scenarios(config: &RunConfig) -> Vec<Scenario> {
    let mut scenarios = Vec::new();

    if let Some(token) = config.github_token.as_deref() {
        scenarios.push(authenticated_user(token));
        scenarios.push(user_repos(token));
    }
    scenarios.push(public_user(config.github_token.as_deref()));
    scenarios.push(missing_credentials());

    scenarios
}

fn authenticated_user(token: &str) -> Scenario {
    Scenario::new("github authenticated user profile").check(
        "read own profile",
        github_get("user", Some(token)),
        vec![
            Assertion::StatusEquals(200),
            Assertion::HasProperty("login".into()),
            Assertion::PropertyTypeEquals("login".into(), JsonKind::String),
            Assertion::PropertyTypeEquals("id".into(), JsonKind::Number),
            Assertion::HasProperty("name".into()),
            Assertion::PropertyTypeEquals("name".into(), JsonKind::String),
            Assertion::HasProperty("public_repos".into()),
            Assertion::PropertyTypeEquals("public_repos".into(), JsonKind::Number),
        ],
    )
}

fn user_repos(token: &str) -> Scenario {
    // Element-wise assertions hold vacuously for an account with no
    // repositories.
    Scenario::new("github authenticated user repositories").check(
        "list own repositories",
        github_get("user/repos", Some(token)),
        vec![
            Assertion::StatusEquals(200),
            Assertion::BodyIsArray,
            Assertion::ArrayAllUnique("/id".into()),
            Assertion::ArrayAllPropertyTypeEquals("id".into(), JsonKind::Number),
            Assertion::ArrayAllPropertyTypeEquals("name".into(), JsonKind::String),
            Assertion::ArrayAllPropertyTypeEquals("full_name".into(), JsonKind::String),
            Assertion::ArrayAllPropertyTypeEquals("private".into(), JsonKind::Boolean),
            Assertion::ArrayAllHaveProperty("owner.login".into()),
        ],
    )
}

fn public_user(token: Option<&str>) -> Scenario {
    Scenario::new("github public user profile").check(
        "read octocat",
        github_get("users/octocat", token),
        vec![
            Assertion::StatusEquals(200),
            Assertion::PropertyValueEquals("login".into(), json!("octocat")),
            Assertion::HasProperty("id".into()),
        ],
    )
}

fn missing_credentials() -> Scenario {
    // The empty authorization override guarantees no credential reaches the
    // wire even if a default header carries one.
    Scenario::new("github missing credentials rejected").check(
        "read own profile without token",
        github_get("user", None).header("authorization", ""),
        vec![
            Assertion::StatusEquals(401),
            Assertion::PropertyValueEquals("message".into(), json!("Requires authentication")),
        ],
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn requests_use_absolute_urls() {
        let request = github_get("user", Some("abc"));
        assert!(request.path.starts_with("https://api.github.com/"));
        assert!(
            request
                .headers
                .iter()
                .any(|(key, value)| key == "authorization" && value == "token abc")
        );
    }

    #[test]
    fn missing_credentials_scenario_suppresses_authorization() {
        let scenario = missing_credentials();
        let request = &scenario.steps[0].request;
        assert!(
            request
                .headers
                .iter()
                .any(|(key, value)| key == "authorization" && value.is_empty())
        );
    }
}
