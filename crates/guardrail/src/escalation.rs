//! Human-escalation consistency phase

use planguard_common::Plan;
use tracing::warn;

use crate::error::{GuardrailError, GuardrailResult};

/// Names of scenarios that use `UNKNOWN_TEST_ID` without `needsHuman: true`
pub fn unflagged_scenarios(plan: &Plan) -> Vec<String> {
    plan.scenarios
        .iter()
        .filter(|s| !s.needs_human && s.references_unknown_test_id())
        .map(|s| s.name.clone())
        .collect()
}

/// Fail when a scenario uses the unknown-locator sentinel but is not escalated
pub fn check_human_escalation(plan: &Plan) -> GuardrailResult<()> {
    let unflagged = unflagged_scenarios(plan);
    if unflagged.is_empty() {
        return Ok(());
    }

    for name in &unflagged {
        warn!(scenario = %name, "UNKNOWN_TEST_ID used without needsHuman");
    }
    Err(GuardrailError::InconsistentHumanFlag(unflagged))
}

#[cfg(test)]
mod tests {
    use super::*;
    use planguard_common::{App, Scenario, Step, UNKNOWN_TEST_ID};

    fn plan(needs_human: bool, test_id: &str) -> Plan {
        Plan {
            app: App::Web,
            base_url: "https://example.test/".to_string(),
            feature: "Checkout".to_string(),
            scenarios: vec![Scenario {
                name: "Successful checkout".to_string(),
                needs_human,
                steps: vec![
                    Step::Goto {
                        url: "https://example.test/".to_string(),
                    },
                    Step::Click {
                        test_id: test_id.to_string(),
                    },
                ],
            }],
        }
    }

    #[test]
    fn test_unknown_id_requires_needs_human() {
        let err = check_human_escalation(&plan(false, UNKNOWN_TEST_ID)).unwrap_err();
        match err {
            GuardrailError::InconsistentHumanFlag(names) => {
                assert_eq!(names, vec!["Successful checkout".to_string()]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_flagged_scenario_passes() {
        assert!(check_human_escalation(&plan(true, UNKNOWN_TEST_ID)).is_ok());
    }

    #[test]
    fn test_known_ids_pass() {
        assert!(check_human_escalation(&plan(false, "checkout")).is_ok());
        assert!(check_human_escalation(&plan(true, "checkout")).is_ok());
    }
}
